//! 認証ストア
//!
//! 状態遷移:
//! ```text
//! Anonymous ──login/register──▶ Authenticating ──成功──▶ Authenticated
//!     ▲                              │                       │
//!     └──────────失敗────────────────┘◀──logout/無効なセッション┘
//! ```
//! トークンとユーザーは常に対で保持する（片方だけの状態は作らない）。

use crate::error::{Error, FieldErrors};
use crate::http::ApiClient;
use crate::models::{AuthPayload, Credentials, Registration, User};
use crate::observe::{Listeners, SubscriptionId};
use crate::storage::KeyValueStorage;
use crate::store::{error_message, Outcome};
use crate::validation::Validate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};

pub const TOKEN_KEY: &str = "token";
pub const AUTH_KEY: &str = "auth";

const LOGIN_FAILED: &str = "ログインに失敗しました";
const REGISTER_FAILED: &str = "登録に失敗しました";
const AUTH_CANCELLED: &str = "ログアウトされたため中断しました";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated(Session),
}

#[derive(Default)]
struct AuthInner {
    state: AuthState,
    error: Option<String>,
    field_errors: Option<FieldErrors>,
    /// ログイン開始・匿名化のたびに進む。await 前と値が違えば応答を捨てる。
    generation: u64,
}

/// 認証ストア（クローンは同じ状態を共有する）
#[derive(Clone)]
pub struct AuthStore {
    api: ApiClient,
    storage: Arc<dyn KeyValueStorage>,
    inner: Arc<Mutex<AuthInner>>,
    listeners: Listeners,
}

impl AuthStore {
    /// 永続化済みのセッションを読み込んで作成する
    ///
    /// 片方しか無い・壊れている場合は両方消して匿名状態から始める。
    pub fn new(api: ApiClient, storage: Arc<dyn KeyValueStorage>) -> Self {
        let store = Self {
            api,
            storage,
            inner: Arc::new(Mutex::new(AuthInner::default())),
            listeners: Listeners::default(),
        };
        store.rehydrate();
        store
    }

    fn rehydrate(&self) {
        let token = self.storage.get(TOKEN_KEY);
        let user = self.storage.get(AUTH_KEY);
        if token.is_none() && user.is_none() {
            return;
        }

        let restored = token.filter(|t| !t.is_empty()).zip(
            user.and_then(|raw| serde_json::from_str::<User>(&raw).ok())
                .filter(User::is_complete),
        );

        match restored {
            Some((token, user)) => {
                tracing::info!(user_id = user.id, "session restored");
                self.api.set_token(Some(token.clone()));
                self.with_inner(|inner| {
                    inner.state = AuthState::Authenticated(Session { token, user })
                });
            }
            None => {
                tracing::warn!("persisted session is incomplete, clearing");
                self.clear_persisted();
            }
        }
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut AuthInner) -> R) -> R {
        let result = {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut inner)
        };
        self.listeners.notify();
        result
    }

    fn read<R>(&self, f: impl FnOnce(&AuthInner) -> R) -> R {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&inner)
    }

    fn persist(&self, session: &Session) -> crate::Result<()> {
        let user = serde_json::to_string(&session.user)?;
        self.storage.set(TOKEN_KEY, &session.token)?;
        if let Err(e) = self.storage.set(AUTH_KEY, &user) {
            self.storage.remove(TOKEN_KEY);
            return Err(e);
        }
        Ok(())
    }

    fn clear_persisted(&self) {
        self.storage.remove(TOKEN_KEY);
        self.storage.remove(AUTH_KEY);
    }

    /// 匿名状態に戻す（メモリ・トークン・永続化をまとめて消す）
    fn reset(&self, error: Option<String>, field_errors: Option<FieldErrors>) {
        self.clear_persisted();
        self.api.set_token(None);
        self.with_inner(|inner| {
            inner.state = AuthState::Anonymous;
            inner.error = error;
            inner.field_errors = field_errors;
            inner.generation += 1;
        });
    }

    fn is_current(&self, generation: u64) -> bool {
        self.read(|inner| inner.generation == generation)
    }

    fn establish(&self, session: Session) -> Result<User, Error> {
        self.persist(&session)?;
        self.api.set_token(Some(session.token.clone()));
        let user = session.user.clone();
        self.with_inner(|inner| {
            inner.state = AuthState::Authenticated(session);
            inner.error = None;
            inner.field_errors = None;
        });
        tracing::info!(user_id = user.id, "authenticated");
        Ok(user)
    }

    /// ログイン・登録の共通処理
    async fn authenticate(&self, path: &str, body: Value, fallback: &str) -> Outcome<User> {
        let generation = self.with_inner(|inner| {
            inner.state = AuthState::Authenticating;
            inner.error = None;
            inner.field_errors = None;
            inner.generation += 1;
            inner.generation
        });

        let response = self.api.post::<AuthPayload>(path, body).await;

        if !self.is_current(generation) {
            tracing::debug!(path, "stale authentication response discarded");
            return Outcome::failed(AUTH_CANCELLED);
        }

        let failure = match response {
            Ok(response) if response.code == 200 => {
                let message = response.message();
                match response.data {
                    Some(AuthPayload {
                        token: Some(token),
                        user: Some(user),
                    }) if !token.is_empty() => {
                        return match self.establish(Session { token, user }) {
                            Ok(user) => Outcome::ok(message, Some(user)),
                            Err(e) => {
                                self.reset(Some(error_message(&e)), None);
                                Outcome::from_error(&e)
                            }
                        };
                    }
                    _ => Outcome::failed(message.unwrap_or_else(|| fallback.to_string())),
                }
            }
            Ok(response) => {
                Outcome::failed(response.message().unwrap_or_else(|| fallback.to_string()))
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "authentication failed");
                let mut outcome = Outcome::from_error(&e);
                if outcome.message.is_none() {
                    outcome.message = Some(fallback.to_string());
                }
                outcome
            }
        };

        self.reset(failure.message.clone(), failure.field_errors.clone());
        failure
    }

    pub async fn login(&self, credentials: Credentials) -> Outcome<User> {
        if let Err(e) = credentials.check() {
            let outcome = Outcome::from_error(&e);
            self.with_inner(|inner| {
                inner.error = outcome.message.clone();
                inner.field_errors = outcome.field_errors.clone();
            });
            return outcome;
        }
        let body = match serde_json::to_value(&credentials) {
            Ok(body) => body,
            Err(e) => return Outcome::from_error(&e.into()),
        };
        self.authenticate("/auth/login", body, LOGIN_FAILED).await
    }

    pub async fn register(&self, registration: Registration) -> Outcome<User> {
        if let Err(e) = registration.check() {
            let outcome = Outcome::from_error(&e);
            self.with_inner(|inner| {
                inner.error = outcome.message.clone();
                inner.field_errors = outcome.field_errors.clone();
            });
            return outcome;
        }
        let body = match serde_json::to_value(&registration) {
            Ok(body) => body,
            Err(e) => return Outcome::from_error(&e.into()),
        };
        self.authenticate("/auth/register", body, REGISTER_FAILED).await
    }

    /// ログアウト
    ///
    /// ローカルのセッションを先に破棄し、サーバへの通知は破棄前のトークンで行う。
    /// 通知の失敗は記録するだけで結果に影響しない。
    pub async fn logout(&self) {
        let token = self.token();
        self.reset(None, None);

        let Some(token) = token else {
            return;
        };
        let api = self.api.scoped(Some(token));
        if let Err(e) = api.post::<Value>("/auth/logout", Value::Null).await {
            tracing::warn!(error = %e, "remote logout failed");
        }
        tracing::info!("logged out");
    }

    /// 現在のユーザーをサーバに問い合わせて検証する
    ///
    /// 失敗・不完全なユーザーならセッションを破棄する。
    pub async fn get_user(&self) -> Option<User> {
        let token = self.token()?;
        let generation = self.read(|inner| inner.generation);

        let result = self
            .api
            .get::<User>("/auth/user", &[])
            .await
            .and_then(|response| response.into_data());

        if !self.is_current(generation) {
            tracing::debug!("stale user response discarded");
            return None;
        }

        match result {
            Ok(user) if user.is_complete() => {
                let session = Session { token, user };
                match self.establish(session) {
                    Ok(user) => Some(user),
                    Err(e) => {
                        self.reset(Some(error_message(&e)), None);
                        None
                    }
                }
            }
            Ok(_) => {
                tracing::warn!("server returned an incomplete user, clearing session");
                self.reset(None, None);
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "session validation failed");
                self.reset(Some(error_message(&e)), None);
                None
            }
        }
    }

    pub fn clear_error(&self) {
        self.with_inner(|inner| {
            inner.error = None;
            inner.field_errors = None;
        });
    }

    pub fn state(&self) -> AuthState {
        self.read(|inner| inner.state.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read(|inner| matches!(inner.state, AuthState::Authenticated(_)))
    }

    pub fn is_loading(&self) -> bool {
        self.read(|inner| inner.state == AuthState::Authenticating)
    }

    pub fn session(&self) -> Option<Session> {
        self.read(|inner| match &inner.state {
            AuthState::Authenticated(session) => Some(session.clone()),
            _ => None,
        })
    }

    pub fn user(&self) -> Option<User> {
        self.session().map(|s| s.user)
    }

    pub fn token(&self) -> Option<String> {
        self.session().map(|s| s.token)
    }

    pub fn error(&self) -> Option<String> {
        self.read(|inner| inner.error.clone())
    }

    pub fn field_errors(&self) -> Option<FieldErrors> {
        self.read(|inner| inner.field_errors.clone())
    }

    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::testing::{envelope, MockTransport};
    use serde_json::json;

    fn user_json() -> Value {
        json!({"id": 1, "name": "Admin", "email": "admin@example.com"})
    }

    fn setup(storage: &MemoryStorage) -> (MockTransport, ApiClient, AuthStore) {
        let mock = MockTransport::new();
        let api = ApiClient::new(mock.clone());
        let auth = AuthStore::new(api.clone(), Arc::new(storage.clone()));
        (mock, api, auth)
    }

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_login_success_persists_session() {
        let storage = MemoryStorage::new();
        let (mock, api, auth) = setup(&storage);
        mock.respond(
            "POST /auth/login",
            200,
            envelope(200, "ログインしました", json!({"token": "tok-1", "user": user_json()})),
        );

        let outcome = auth.login(credentials("admin@example.com", "password1")).await;

        assert!(outcome.success);
        assert!(auth.is_authenticated());
        assert_eq!(auth.token().as_deref(), Some("tok-1"));
        assert_eq!(api.token().as_deref(), Some("tok-1"));
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("tok-1"));
        assert!(storage.get(AUTH_KEY).unwrap().contains("admin@example.com"));
    }

    #[tokio::test]
    async fn test_invalid_credentials_leave_store_anonymous() {
        let storage = MemoryStorage::new();
        let (mock, api, auth) = setup(&storage);
        mock.respond(
            "POST /auth/login",
            200,
            envelope(401, "Invalid credentials", Value::Null),
        );

        let outcome = auth.login(credentials("bad", "x")).await;

        assert!(!outcome.success);
        assert!(!auth.is_authenticated());
        assert_eq!(auth.state(), AuthState::Anonymous);
        assert_eq!(auth.error().as_deref(), Some("Invalid credentials"));
        assert!(storage.get(TOKEN_KEY).is_none());
        assert!(storage.get(AUTH_KEY).is_none());
        assert!(api.token().is_none());
    }

    #[tokio::test]
    async fn test_token_without_user_is_a_failure() {
        let storage = MemoryStorage::new();
        let (mock, _, auth) = setup(&storage);
        mock.respond("POST /auth/login", 200, envelope(200, "", json!({"token": "tok"})));

        let outcome = auth.login(credentials("admin@example.com", "password1")).await;

        assert!(!outcome.success);
        assert!(auth.token().is_none());
        assert_eq!(auth.error().as_deref(), Some(LOGIN_FAILED));
        assert!(storage.keys().is_empty());
    }

    #[tokio::test]
    async fn test_network_error_degrades_to_anonymous() {
        let storage = MemoryStorage::new();
        let (mock, _, auth) = setup(&storage);
        mock.fail("POST /auth/login", "offline");

        let outcome = auth.login(credentials("admin@example.com", "password1")).await;

        assert!(!outcome.success);
        assert_eq!(auth.state(), AuthState::Anonymous);
        assert_eq!(auth.error().as_deref(), Some(LOGIN_FAILED));
    }

    #[tokio::test]
    async fn test_register_surfaces_field_errors() {
        let storage = MemoryStorage::new();
        let (mock, _, auth) = setup(&storage);
        mock.respond(
            "POST /auth/register",
            200,
            envelope(422, "入力内容を確認してください", json!({"email": ["既に使われています"]})),
        );

        let outcome = auth
            .register(Registration {
                name: "Admin".into(),
                email: "admin@example.com".into(),
                password: "password1".into(),
                password_confirmation: "password1".into(),
            })
            .await;

        assert!(!outcome.success);
        let errors = auth.field_errors().unwrap();
        assert_eq!(errors["email"], vec!["既に使われています".to_string()]);
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_register_validates_before_sending() {
        let storage = MemoryStorage::new();
        let (mock, _, auth) = setup(&storage);

        let outcome = auth
            .register(Registration {
                name: "Admin".into(),
                email: "admin".into(),
                password: "short".into(),
                password_confirmation: "short".into(),
            })
            .await;

        assert!(!outcome.success);
        let errors = outcome.field_errors.unwrap();
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("password"));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_remote_fails() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "tok-1").unwrap();
        storage.set(AUTH_KEY, &user_json().to_string()).unwrap();
        let (mock, api, auth) = setup(&storage);
        assert!(auth.is_authenticated());
        mock.fail("POST /auth/logout", "offline");

        auth.logout().await;

        assert_eq!(auth.state(), AuthState::Anonymous);
        assert!(storage.keys().is_empty());
        assert!(api.token().is_none());
        // サーバへの通知には破棄前のトークンを使う
        assert_eq!(mock.requests()[0].bearer.as_deref(), Some("tok-1"));
    }

    #[test]
    fn test_rehydrate_restores_complete_session() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "tok-9").unwrap();
        storage.set(AUTH_KEY, &user_json().to_string()).unwrap();

        let (_, api, auth) = setup(&storage);

        assert!(auth.is_authenticated());
        assert_eq!(auth.user().unwrap().email, "admin@example.com");
        assert_eq!(api.token().as_deref(), Some("tok-9"));
    }

    #[test]
    fn test_rehydrate_heals_partial_session() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "tok-9").unwrap();

        let (_, _, auth) = setup(&storage);

        assert!(!auth.is_authenticated());
        assert!(storage.keys().is_empty());
    }

    #[test]
    fn test_rehydrate_heals_malformed_user() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "tok-9").unwrap();
        storage.set(AUTH_KEY, r#"{"id": 0, "name": "", "email": ""}"#).unwrap();

        let (_, _, auth) = setup(&storage);

        assert!(!auth.is_authenticated());
        assert!(storage.get(TOKEN_KEY).is_none());
    }

    #[tokio::test]
    async fn test_get_user_failure_clears_session() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "tok-1").unwrap();
        storage.set(AUTH_KEY, &user_json().to_string()).unwrap();
        let (mock, _, auth) = setup(&storage);
        mock.respond("GET /auth/user", 401, envelope(401, "Unauthenticated", Value::Null));

        assert!(auth.get_user().await.is_none());
        assert!(!auth.is_authenticated());
        assert!(storage.keys().is_empty());
    }

    #[tokio::test]
    async fn test_get_user_refreshes_profile() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "tok-1").unwrap();
        storage.set(AUTH_KEY, &user_json().to_string()).unwrap();
        let (mock, _, auth) = setup(&storage);
        mock.respond(
            "GET /auth/user",
            200,
            envelope(200, "", json!({"id": 1, "name": "Renamed", "email": "admin@example.com"})),
        );

        let user = auth.get_user().await.unwrap();

        assert_eq!(user.name, "Renamed");
        assert!(storage.get(AUTH_KEY).unwrap().contains("Renamed"));
    }

    #[tokio::test]
    async fn test_login_resolving_after_logout_is_discarded() {
        let storage = MemoryStorage::new();
        let (mock, api, auth) = setup(&storage);
        let gate = mock.respond_gated(
            "POST /auth/login",
            200,
            envelope(200, "", json!({"token": "tok", "user": user_json()})),
        );

        let driver = async {
            tokio::task::yield_now().await;
            auth.logout().await;
            gate.send(()).unwrap();
        };
        let (outcome, _) = futures::join!(
            auth.login(credentials("admin@example.com", "password1")),
            driver
        );

        assert!(!outcome.success);
        assert_eq!(outcome.message.as_deref(), Some(AUTH_CANCELLED));
        assert_eq!(auth.state(), AuthState::Anonymous);
        assert!(storage.get(TOKEN_KEY).is_none());
        assert!(api.token().is_none());
    }

    #[tokio::test]
    async fn test_get_user_resolving_after_logout_is_discarded() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "tok-1").unwrap();
        storage.set(AUTH_KEY, &user_json().to_string()).unwrap();
        let (mock, api, auth) = setup(&storage);
        mock.respond("POST /auth/logout", 200, envelope(200, "", Value::Null));
        let gate = mock.respond_gated("GET /auth/user", 200, envelope(200, "", user_json()));

        let driver = async {
            tokio::task::yield_now().await;
            auth.logout().await;
            gate.send(()).unwrap();
        };
        let (user, _) = futures::join!(auth.get_user(), driver);

        assert!(user.is_none());
        assert!(!auth.is_authenticated());
        assert!(storage.keys().is_empty());
        assert!(api.token().is_none());
    }

    #[tokio::test]
    async fn test_get_user_without_session_sends_nothing() {
        let storage = MemoryStorage::new();
        let (mock, _, auth) = setup(&storage);

        assert!(auth.get_user().await.is_none());
        assert!(mock.requests().is_empty());
    }
}
