//! メインアプリケーションコンポーネント
//!
//! 状態はすべて `petcare-common` の `Dashboard` が持つ。
//! ストアの変更通知で `Revision` を進め、それを読むクロージャが再描画される。

use crate::api::fetch::FetchTransport;
use crate::components::{
    header::Header,
    login_form::LoginForm,
    modal_host::ModalHost,
    panels::{ClientsPanel, PetsPanel},
    toast_host::ToastHost,
};
use crate::platform::{log_error, BrowserStorage, TimerScheduler};
use leptos::prelude::*;
use leptos::task::spawn_local;
use petcare_common::notify::report_fetch;
use petcare_common::{
    ApiClient, Client, Dashboard, DetailRoute, EntityId, FetchStatus, Pet, Tab, ToastQueue,
};
use std::future::Future;
use std::sync::Arc;

/// モーダルの中身
#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    /// `None` なら新規登録
    ClientForm(Option<Client>),
    PetForm(Option<Pet>),
    ConfirmDelete {
        tab: Tab,
        id: EntityId,
        label: String,
    },
}

pub type AppDashboard = Dashboard<Modal>;

/// ストアの変更回数
#[derive(Clone, Copy)]
pub struct Revision(RwSignal<u64>);

impl Revision {
    /// 呼び出し側のクロージャを変更通知に追従させる
    pub fn track(&self) {
        self.0.get();
    }

    fn bump(&self) {
        self.0.update(|r| *r = r.wrapping_add(1));
    }
}

pub fn use_dashboard() -> AppDashboard {
    expect_context::<AppDashboard>()
}

pub fn use_revision() -> Revision {
    expect_context::<Revision>()
}

/// 読み込みを非同期で走らせ、失敗はトーストで知らせる
pub fn spawn_fetch<F>(dashboard: &AppDashboard, task: F)
where
    F: Future<Output = FetchStatus> + 'static,
{
    let toasts = dashboard.toasts.clone();
    spawn_local(async move {
        let status = task.await;
        if let FetchStatus::Failed(message) = &status {
            log_error("fetch", message);
        }
        report_fetch(&toasts, &status);
    });
}

/// 現在のURLクエリ
pub fn current_route() -> DetailRoute {
    let query = web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default();
    DetailRoute::parse(&query)
}

/// 表示状態をURLに反映する（履歴に積む）
pub fn push_route(route: DetailRoute) {
    if current_route() == route {
        return;
    }
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Ok(history) = window.history() {
        let url = route.to_query();
        if let Err(e) = history.push_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(&url)) {
            log_error("history", &format!("{:?}", e));
        }
    }
}

/// URLに従ってタブ・詳細を開く
pub fn navigate_to(dashboard: &AppDashboard, route: DetailRoute) {
    let d = dashboard.clone();
    spawn_fetch(dashboard, async move { d.navigate(route).await });
}

/// メインアプリケーションコンポーネント
#[component]
pub fn App() -> impl IntoView {
    let dashboard: AppDashboard = Dashboard::new(
        ApiClient::new(FetchTransport::default()),
        Arc::new(BrowserStorage),
    )
    .with_toasts(ToastQueue::with_scheduler(Arc::new(TimerScheduler)));

    let revision = Revision(RwSignal::new(0));
    let bump = move || revision.bump();
    dashboard.auth.subscribe(bump);
    dashboard.clients.subscribe(bump);
    dashboard.pets.subscribe(bump);
    dashboard.toasts.listeners().subscribe(bump);
    dashboard.modals.listeners().subscribe(bump);
    dashboard.subscribe(bump);

    provide_context(dashboard.clone());
    provide_context(revision);

    // 保存済みセッションはサーバで確かめてからURLの表示状態を復元する
    if dashboard.auth.is_authenticated() {
        let d = dashboard.clone();
        let route = current_route();
        spawn_fetch(&dashboard, async move { d.resume(route).await });
    }

    // ブラウザの戻る・進む
    let _ = window_event_listener(leptos::ev::popstate, {
        let dashboard = dashboard.clone();
        move |_| {
            if dashboard.auth.is_authenticated() {
                navigate_to(&dashboard, current_route());
            }
        }
    });

    let is_authenticated = {
        let dashboard = dashboard.clone();
        move || {
            revision.track();
            dashboard.auth.is_authenticated()
        }
    };

    let tab = {
        let dashboard = dashboard.clone();
        move || {
            revision.track();
            dashboard.tab()
        }
    };

    let select_tab = {
        let dashboard = dashboard.clone();
        move |next: Tab| {
            let d = dashboard.clone();
            push_route(DetailRoute::list(next));
            spawn_fetch(&dashboard, async move { d.switch_tab(next).await });
        }
    };

    view! {
        <div class="container">
            <Show
                when=is_authenticated
                fallback=|| view! { <LoginForm /> }
            >
                <Header />

                <nav class="tabs">
                    {Tab::ALL
                        .into_iter()
                        .map(|t| {
                            let select_tab = select_tab.clone();
                            let tab = tab.clone();
                            view! {
                                <button
                                    class="tab"
                                    class:active=move || tab() == t
                                    on:click=move |_| select_tab(t)
                                >
                                    {t.label()}
                                </button>
                            }
                        })
                        .collect_view()}
                </nav>

                <Show
                    when={
                        let tab = tab.clone();
                        move || tab() == Tab::Clients
                    }
                    fallback=|| view! { <PetsPanel /> }
                >
                    <ClientsPanel />
                </Show>
            </Show>

            <ModalHost />
            <ToastHost />
        </div>
    }
}
