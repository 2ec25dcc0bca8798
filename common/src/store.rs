//! エンティティストア
//!
//! 1エンティティにつき1つ。現在ページ（`items`）と検索用の全件（`all_items`）、
//! 単体表示（`current`）を保持し、APIの結果をローカルの集合に反映する。
//!
//! ## 応答の競合
//! 読み込み系は `page` / `all` / `current` の枠ごとに世代番号を持つ。
//! 応答が返った時点で世代が進んでいれば、その応答は捨てる（後発の要求が勝つ）。
//!
//! ## 失敗時
//! 例外は操作の境界で捕捉し、`FetchStatus` / `Outcome` と `error` に変換する。
//! 読み込み失敗時も直前の `items` は残す。

use crate::error::{Error, FieldErrors};
use crate::http::ApiClient;
use crate::models::{Client, Entity, EntityId, Page, Pet};
use crate::observe::{Listeners, SubscriptionId};
use crate::validation::Validate;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// 件数不明のまま全件取得するときの上限
pub const FETCH_ALL_CEILING: u64 = 1000;

/// 同一IDの操作が進行中のときのメッセージ
pub const BUSY_MESSAGE: &str = "この項目は処理中です。完了までお待ちください。";

/// 読み込み系操作の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Applied,
    Failed(String),
    /// 後発の要求に追い越されたため破棄した
    Superseded,
}

impl FetchStatus {
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchStatus::Applied)
    }
}

/// 更新系操作の結果（呼び出し側は `success` で分岐する）
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T = ()> {
    pub success: bool,
    pub message: Option<String>,
    pub field_errors: Option<FieldErrors>,
    pub value: Option<T>,
}

impl<T> Outcome<T> {
    pub fn ok(message: Option<String>, value: Option<T>) -> Self {
        Self {
            success: true,
            message,
            field_errors: None,
            value,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            field_errors: None,
            value: None,
        }
    }

    pub fn from_error(error: &Error) -> Self {
        Self {
            success: false,
            message: error.user_message(),
            field_errors: error.field_errors().cloned(),
            value: None,
        }
    }
}

/// ストアに記録するエラー文言
pub(crate) fn error_message(error: &Error) -> String {
    error.user_message().unwrap_or_else(|| error.to_string())
}

#[derive(Debug, Default, Clone, Copy)]
struct Generations {
    page: u64,
    all: u64,
    current: u64,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Page,
    All,
    Current,
}

impl Generations {
    fn bump(&mut self, slot: Slot) -> u64 {
        let counter = match slot {
            Slot::Page => &mut self.page,
            Slot::All => &mut self.all,
            Slot::Current => &mut self.current,
        };
        *counter += 1;
        *counter
    }

    fn get(&self, slot: Slot) -> u64 {
        match slot {
            Slot::Page => self.page,
            Slot::All => self.all,
            Slot::Current => self.current,
        }
    }
}

struct StoreState<E> {
    items: Vec<E>,
    all_items: Vec<E>,
    total: Option<u64>,
    page: u32,
    page_size: u32,
    current: Option<E>,
    error: Option<String>,
    in_flight: usize,
    pending_ids: HashSet<EntityId>,
    generations: Generations,
}

/// 画面描画用のスナップショット
#[derive(Debug, Clone)]
pub struct StoreSnapshot<E> {
    pub items: Vec<E>,
    pub all_items: Vec<E>,
    pub total: Option<u64>,
    pub page: u32,
    pub page_size: u32,
    pub current: Option<E>,
    pub error: Option<String>,
    pub is_loading: bool,
}

/// エンティティストア（クローンは同じ状態を共有するハンドル）
#[derive(Clone)]
pub struct EntityStore<E: Entity> {
    api: ApiClient,
    state: Arc<Mutex<StoreState<E>>>,
    listeners: Listeners,
}

pub type ClientStore = EntityStore<Client>;
pub type PetStore = EntityStore<Pet>;

/// 生存中は `is_loading` を立てておく。どの経路で抜けても解除される。
struct LoadingGuard<'a, E: Entity> {
    store: &'a EntityStore<E>,
}

impl<'a, E: Entity> LoadingGuard<'a, E> {
    fn new(store: &'a EntityStore<E>) -> Self {
        store.update(|s| s.in_flight += 1);
        Self { store }
    }
}

impl<E: Entity> Drop for LoadingGuard<'_, E> {
    fn drop(&mut self) {
        self.store
            .update(|s| s.in_flight = s.in_flight.saturating_sub(1));
    }
}

/// 同一IDへの更新系操作の二重送信防止
struct PendingGuard<'a, E: Entity> {
    store: &'a EntityStore<E>,
    id: EntityId,
}

impl<'a, E: Entity> PendingGuard<'a, E> {
    fn claim(store: &'a EntityStore<E>, id: EntityId) -> Option<Self> {
        let claimed = store.update(|s| s.pending_ids.insert(id));
        claimed.then_some(Self { store, id })
    }
}

impl<E: Entity> Drop for PendingGuard<'_, E> {
    fn drop(&mut self) {
        let id = self.id;
        self.store.update(|s| {
            s.pending_ids.remove(&id);
        });
    }
}

impl<E: Entity> EntityStore<E> {
    pub fn new(api: ApiClient) -> Self {
        Self::with_page_size(api, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(api: ApiClient, page_size: u32) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(StoreState {
                items: Vec::new(),
                all_items: Vec::new(),
                total: None,
                page: 1,
                page_size: page_size.max(1),
                current: None,
                error: None,
                in_flight: 0,
                pending_ids: HashSet::new(),
                generations: Generations::default(),
            })),
            listeners: Listeners::default(),
        }
    }

    fn collection_path() -> String {
        format!("/{}", E::RESOURCE)
    }

    fn item_path(id: EntityId) -> String {
        format!("/{}/{}", E::RESOURCE, id)
    }

    /// 状態を変更してリスナーに通知する（ロックは通知前に解放）
    fn update<R>(&self, f: impl FnOnce(&mut StoreState<E>) -> R) -> R {
        let result = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut state)
        };
        self.listeners.notify();
        result
    }

    fn read<R>(&self, f: impl FnOnce(&StoreState<E>) -> R) -> R {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    fn begin(&self, slot: Slot) -> u64 {
        self.update(|s| s.generations.bump(slot))
    }

    fn record_error(&self, error: &Error) {
        let message = error_message(error);
        self.update(|s| s.error = Some(message));
    }

    // ========================
    // 読み込み
    // ========================

    /// 1ページ分を取得して `items` / `total` を置き換える
    pub async fn fetch_page(&self, page: u32, page_size: u32) -> FetchStatus {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let generation = self.begin(Slot::Page);
        let _loading = LoadingGuard::new(self);

        let result = self
            .api
            .get::<Page<E>>(
                &Self::collection_path(),
                &[("page", page.to_string()), ("per_page", page_size.to_string())],
            )
            .await
            .and_then(|response| response.into_data());

        self.update(|s| {
            if s.generations.get(Slot::Page) != generation {
                tracing::debug!(resource = E::RESOURCE, page, "stale page response discarded");
                return FetchStatus::Superseded;
            }
            match result {
                Ok(data) => {
                    s.page = data.applied_page(page);
                    let mut items = data.data;
                    items.truncate(page_size as usize);
                    s.items = items;
                    s.total = data.total;
                    s.page_size = page_size;
                    s.error = None;
                    FetchStatus::Applied
                }
                Err(e) => {
                    let message = error_message(&e);
                    tracing::warn!(resource = E::RESOURCE, page, error = %e, "page fetch failed");
                    s.error = Some(message.clone());
                    FetchStatus::Failed(message)
                }
            }
        })
    }

    /// 検索用に全件を取得する
    ///
    /// 1件だけのページで総件数を調べ、その件数をページサイズにして取り直す。
    pub async fn fetch_all(&self) -> FetchStatus {
        let generation = self.begin(Slot::All);
        let _loading = LoadingGuard::new(self);

        let result = self.load_all().await;

        self.update(|s| {
            if s.generations.get(Slot::All) != generation {
                tracing::debug!(resource = E::RESOURCE, "stale fetch-all response discarded");
                return FetchStatus::Superseded;
            }
            match result {
                Ok(items) => {
                    s.all_items = items;
                    s.error = None;
                    FetchStatus::Applied
                }
                Err(e) => {
                    let message = error_message(&e);
                    tracing::warn!(resource = E::RESOURCE, error = %e, "fetch-all failed");
                    s.error = Some(message.clone());
                    FetchStatus::Failed(message)
                }
            }
        })
    }

    async fn load_all(&self) -> crate::Result<Vec<E>> {
        let path = Self::collection_path();
        let head = self
            .api
            .get::<Page<E>>(&path, &[("page", "1".to_string()), ("per_page", "1".to_string())])
            .await?
            .into_data()?;

        let size = match head.total {
            Some(0) => return Ok(Vec::new()),
            Some(total) => total,
            None => FETCH_ALL_CEILING,
        };

        let page = self
            .api
            .get::<Page<E>>(&path, &[("page", "1".to_string()), ("per_page", size.to_string())])
            .await?
            .into_data()?;
        Ok(page.data)
    }

    /// 1件を `current` に取得する（`items` とは独立）
    pub async fn find_one(&self, id: EntityId) -> FetchStatus {
        let generation = self.begin(Slot::Current);
        let _loading = LoadingGuard::new(self);

        let result = self
            .api
            .get::<E>(&Self::item_path(id), &[])
            .await
            .and_then(|response| response.into_data());

        self.update(|s| {
            if s.generations.get(Slot::Current) != generation {
                return FetchStatus::Superseded;
            }
            match result {
                Ok(entity) => {
                    s.current = Some(entity);
                    s.error = None;
                    FetchStatus::Applied
                }
                Err(e) => {
                    let message = error_message(&e);
                    s.error = Some(message.clone());
                    FetchStatus::Failed(message)
                }
            }
        })
    }

    // ========================
    // 更新
    // ========================

    /// 新規作成
    ///
    /// 成功したら先頭に追加したうえで1ページ目を取り直す（件数とページ境界を
    /// サーバに合わせるため）。検証エラーなら送信しない。
    pub async fn create(&self, draft: E::Draft) -> Outcome<E> {
        if let Err(e) = draft.check() {
            return Outcome::from_error(&e);
        }
        let body = match serde_json::to_value(&draft) {
            Ok(body) => body,
            Err(e) => return Outcome::from_error(&e.into()),
        };

        let _loading = LoadingGuard::new(self);
        let result = self
            .api
            .post::<E>(&Self::collection_path(), body)
            .await
            .and_then(|response| {
                let message = response.message();
                response.into_data().map(|entity| (entity, message))
            });

        match result {
            Ok((created, message)) => {
                let page_size = self.update(|s| {
                    s.items.insert(0, created.clone());
                    s.items.truncate(s.page_size as usize);
                    s.error = None;
                    s.page_size
                });
                tracing::info!(resource = E::RESOURCE, id = created.id(), "created");
                self.fetch_page(1, page_size).await;
                Outcome::ok(message, Some(created))
            }
            Err(e) => {
                self.record_error(&e);
                Outcome::from_error(&e)
            }
        }
    }

    /// 部分更新（成功時はローカルにマージし、取り直さない）
    pub async fn update_item(&self, id: EntityId, patch: E::Patch) -> Outcome {
        let Some(_pending) = PendingGuard::claim(self, id) else {
            return Outcome::failed(BUSY_MESSAGE);
        };
        let body = match serde_json::to_value(&patch) {
            Ok(body) => body,
            Err(e) => return Outcome::from_error(&e.into()),
        };

        let _loading = LoadingGuard::new(self);
        match self.api.post::<Value>(&Self::item_path(id), body).await {
            Ok(response) => {
                self.update(|s| {
                    for item in s
                        .items
                        .iter_mut()
                        .chain(s.all_items.iter_mut())
                        .filter(|item| item.id() == id)
                    {
                        item.apply_patch(&patch);
                    }
                    if let Some(current) = s.current.as_mut().filter(|c| c.id() == id) {
                        current.apply_patch(&patch);
                    }
                    s.error = None;
                });
                Outcome::ok(response.message(), None)
            }
            Err(e) => {
                self.record_error(&e);
                Outcome::from_error(&e)
            }
        }
    }

    /// 削除（成功時はローカルから取り除く。存在しないIDなら何もしない）
    pub async fn delete(&self, id: EntityId) -> Outcome {
        let Some(_pending) = PendingGuard::claim(self, id) else {
            return Outcome::failed(BUSY_MESSAGE);
        };

        let _loading = LoadingGuard::new(self);
        match self.api.delete::<Value>(&Self::item_path(id)).await {
            Ok(response) => {
                self.update(|s| {
                    let before = s.items.len() + s.all_items.len();
                    s.items.retain(|item| item.id() != id);
                    s.all_items.retain(|item| item.id() != id);
                    if s.items.len() + s.all_items.len() != before {
                        s.total = s.total.map(|t| t.saturating_sub(1));
                    }
                    if s.current.as_ref().is_some_and(|c| c.id() == id) {
                        s.current = None;
                    }
                    s.error = None;
                });
                tracing::info!(resource = E::RESOURCE, id, "deleted");
                Outcome::ok(response.message(), None)
            }
            Err(e) => {
                self.record_error(&e);
                Outcome::from_error(&e)
            }
        }
    }

    // ========================
    // 制御
    // ========================

    /// 進行中の読み込みの結果をすべて破棄させる（タブ切替・画面破棄時）
    pub fn cancel_pending(&self) {
        self.update(|s| {
            s.generations.bump(Slot::Page);
            s.generations.bump(Slot::All);
            s.generations.bump(Slot::Current);
        });
    }

    /// 進行中のページ取得を無効化する（検索モードに入るとき）
    pub fn supersede_page_fetch(&self) {
        self.update(|s| {
            s.generations.bump(Slot::Page);
        });
    }

    /// 検索用の全件を破棄する（進行中の全件取得も無効化）
    pub fn discard_search_view(&self) {
        self.update(|s| {
            s.all_items.clear();
            s.generations.bump(Slot::All);
        });
    }

    pub fn clear_current(&self) {
        self.update(|s| {
            s.current = None;
            s.generations.bump(Slot::Current);
        });
    }

    pub fn clear_error(&self) {
        self.update(|s| s.error = None);
    }

    // ========================
    // 参照
    // ========================

    pub fn snapshot(&self) -> StoreSnapshot<E> {
        self.read(|s| StoreSnapshot {
            items: s.items.clone(),
            all_items: s.all_items.clone(),
            total: s.total,
            page: s.page,
            page_size: s.page_size,
            current: s.current.clone(),
            error: s.error.clone(),
            is_loading: s.in_flight > 0,
        })
    }

    pub fn items(&self) -> Vec<E> {
        self.read(|s| s.items.clone())
    }

    pub fn all_items(&self) -> Vec<E> {
        self.read(|s| s.all_items.clone())
    }

    pub fn total(&self) -> Option<u64> {
        self.read(|s| s.total)
    }

    pub fn page(&self) -> u32 {
        self.read(|s| s.page)
    }

    pub fn page_size(&self) -> u32 {
        self.read(|s| s.page_size)
    }

    pub fn current(&self) -> Option<E> {
        self.read(|s| s.current.clone())
    }

    pub fn error(&self) -> Option<String> {
        self.read(|s| s.error.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.read(|s| s.in_flight > 0)
    }

    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }
}
