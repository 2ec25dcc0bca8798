//! ダッシュボードの状態コンテナ
//!
//! 認証・各エンティティの一覧・トースト・モーダル・参照キャッシュをまとめて保持する。
//! グローバル変数は使わず、生成したものをUI（またはCLI）に渡して共有する。

use crate::auth::AuthStore;
use crate::cache::LookupCache;
use crate::http::ApiClient;
use crate::modal::ModalStack;
use crate::models::{Client, Entity, EntityId, Pet};
use crate::observe::{Listeners, SubscriptionId};
use crate::route::{DetailRoute, Tab};
use crate::search::{derive_page, DisplayPage, ListMode};
use crate::storage::KeyValueStorage;
use crate::store::{EntityStore, FetchStatus};
use crate::table::{SortConfig, TableRow};
use crate::toast::ToastQueue;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone)]
struct ListState {
    term: String,
    mode: ListMode,
    sort: SortConfig,
    /// 検索中のページ（サーバページング中はストアのページを使う）
    search_page: u32,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            term: String::new(),
            mode: ListMode::Paged,
            sort: SortConfig::default(),
            search_page: 1,
        }
    }
}

/// 1エンティティ分の一覧画面（検索語・ソート・ページ）
///
/// 変更通知はストアと同じリスナー集合に流す。
#[derive(Clone)]
pub struct ListView<E: Entity> {
    store: EntityStore<E>,
    state: Arc<Mutex<ListState>>,
}

impl<E: Entity> ListView<E> {
    pub fn new(store: EntityStore<E>) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(ListState::default())),
        }
    }

    pub fn store(&self) -> &EntityStore<E> {
        &self.store
    }

    fn update<R>(&self, f: impl FnOnce(&mut ListState) -> R) -> R {
        let result = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut state)
        };
        self.store.listeners().notify();
        result
    }

    fn read<R>(&self, f: impl FnOnce(&ListState) -> R) -> R {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// 1ページ目をサーバから取得する
    pub async fn load(&self) -> FetchStatus {
        self.store.fetch_page(1, self.store.page_size()).await
    }

    /// 検索語の変更
    ///
    /// 空 → 非空で全件取得（進行中のページ取得は破棄）、非空 → 空で全件を破棄して
    /// 1ページ目を取り直す。非空のまま語だけ変わった場合は手元の全件を絞り込むだけ。
    pub async fn set_search(&self, term: &str) -> FetchStatus {
        let next = ListMode::from_term(term);
        let previous = self.update(|s| {
            s.term = term.to_string();
            s.search_page = 1;
            std::mem::replace(&mut s.mode, next.clone())
        });

        match (previous.is_search(), next.is_search()) {
            (false, true) => {
                self.store.supersede_page_fetch();
                self.store.fetch_all().await
            }
            (true, false) => {
                self.store.discard_search_view();
                self.load().await
            }
            _ => FetchStatus::Applied,
        }
    }

    pub fn toggle_sort(&self, key: &str) {
        self.update(|s| s.sort.toggle(key));
    }

    /// ページ移動（サーバページング中は取得、検索中は手元で切り替え）
    pub async fn go_to_page(&self, page: u32) -> FetchStatus {
        let page = page.max(1);
        if self.mode().is_search() {
            self.update(|s| s.search_page = page);
            return FetchStatus::Applied;
        }
        self.store.fetch_page(page, self.store.page_size()).await
    }

    /// 現在のモードのまま取り直す
    pub async fn refresh(&self) -> FetchStatus {
        if self.mode().is_search() {
            self.store.fetch_all().await
        } else {
            let page = self.store.page();
            self.store.fetch_page(page, self.store.page_size()).await
        }
    }

    /// 検索語・ソート・ページを初期状態に戻す
    pub fn reset(&self) {
        let was_searching = self.update(|s| std::mem::take(s).mode.is_search());
        if was_searching {
            self.store.discard_search_view();
        }
    }

    pub fn term(&self) -> String {
        self.read(|s| s.term.clone())
    }

    pub fn mode(&self) -> ListMode {
        self.read(|s| s.mode.clone())
    }

    pub fn sort(&self) -> SortConfig {
        self.read(|s| s.sort.clone())
    }

    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.store.subscribe(listener)
    }
}

impl<E: Entity + TableRow> ListView<E> {
    /// 画面に出す1ページ分
    pub fn display(&self) -> DisplayPage<E> {
        let (mode, sort, page) = self.read(|s| (s.mode.clone(), s.sort.clone(), s.search_page));
        derive_page(&mode, &self.store.snapshot(), &sort, page)
    }
}

/// ダッシュボード全体の状態
///
/// `M` はモーダルの中身（UI側で定義する）。
#[derive(Clone)]
pub struct Dashboard<M = ()> {
    pub api: ApiClient,
    pub auth: AuthStore,
    pub clients: ListView<Client>,
    pub pets: ListView<Pet>,
    pub toasts: ToastQueue,
    pub modals: ModalStack<M>,
    pub lookups: LookupCache,
    route: Arc<Mutex<DetailRoute>>,
    listeners: Listeners,
}

impl<M: Clone> Dashboard<M> {
    pub fn new(api: ApiClient, storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            auth: AuthStore::new(api.clone(), storage.clone()),
            clients: ListView::new(EntityStore::new(api.clone())),
            pets: ListView::new(EntityStore::new(api.clone())),
            toasts: ToastQueue::new(),
            modals: ModalStack::new(),
            lookups: LookupCache::new(storage),
            route: Arc::new(Mutex::new(DetailRoute::default())),
            listeners: Listeners::default(),
            api,
        }
    }

    /// タイマー付きのトーストキューに差し替える
    pub fn with_toasts(mut self, toasts: ToastQueue) -> Self {
        self.toasts = toasts;
        self
    }

    pub fn route(&self) -> DetailRoute {
        *self.route.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn tab(&self) -> Tab {
        self.route().tab
    }

    fn set_route(&self, route: DetailRoute) {
        *self.route.lock().unwrap_or_else(PoisonError::into_inner) = route;
        self.listeners.notify();
    }

    fn cancel(&self, tab: Tab) {
        match tab {
            Tab::Clients => self.clients.store().cancel_pending(),
            Tab::Pets => self.pets.store().cancel_pending(),
        }
    }

    /// タブ切替
    ///
    /// 前のタブの未完了の読み込みを無効化し、新しいタブの検索語・ソート・ページを
    /// 初期化して1ページ目を取得する。
    pub async fn switch_tab(&self, tab: Tab) -> FetchStatus {
        let previous = self.tab();
        if previous == tab {
            self.set_route(DetailRoute::list(tab));
            return FetchStatus::Applied;
        }

        self.cancel(previous);
        self.set_route(DetailRoute::list(tab));
        tracing::debug!(from = previous.as_str(), to = tab.as_str(), "tab switched");

        match tab {
            Tab::Clients => {
                self.clients.reset();
                self.clients.load().await
            }
            Tab::Pets => {
                self.pets.reset();
                self.pets.load().await
            }
        }
    }

    /// 現在のタブで詳細を開く
    pub async fn open_detail(&self, id: EntityId) -> FetchStatus {
        let tab = self.tab();
        self.set_route(DetailRoute::detail(tab, id));
        match tab {
            Tab::Clients => self.clients.store().find_one(id).await,
            Tab::Pets => self.pets.store().find_one(id).await,
        }
    }

    pub fn close_detail(&self) {
        let tab = self.tab();
        self.set_route(DetailRoute::list(tab));
        match tab {
            Tab::Clients => self.clients.store().clear_current(),
            Tab::Pets => self.pets.store().clear_current(),
        }
    }

    /// URLクエリで指定された表示状態に移る
    pub async fn navigate(&self, route: DetailRoute) -> FetchStatus {
        let status = if route.tab != self.tab() {
            self.switch_tab(route.tab).await
        } else {
            FetchStatus::Applied
        };
        match route.id {
            Some(id) => self.open_detail(id).await,
            None => status,
        }
    }

    /// 保存済みセッションをサーバに確かめてから表示状態を復元する
    ///
    /// セッションが無い・無効だった場合は何も読み込まず `Superseded` を返す。
    pub async fn resume(&self, route: DetailRoute) -> FetchStatus {
        if self.auth.get_user().await.is_none() {
            tracing::debug!("no valid session to resume");
            return FetchStatus::Superseded;
        }
        self.navigate(route).await
    }

    /// ログアウト（開いているモーダルと未完了の読み込みも破棄する）
    pub async fn logout(&self) {
        self.modals.close_all();
        self.clients.store().cancel_pending();
        self.pets.store().cancel_pending();
        self.auth.logout().await;
    }

    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }
}
