//! ヘッダーコンポーネント

use crate::app::{use_dashboard, use_revision};
use leptos::prelude::*;
use leptos::task::spawn_local;

#[component]
pub fn Header() -> impl IntoView {
    let dashboard = use_dashboard();
    let revision = use_revision();

    let user_name = {
        let dashboard = dashboard.clone();
        move || {
            revision.track();
            dashboard.auth.user().map(|u| u.name).unwrap_or_default()
        }
    };

    let on_logout = move |_| {
        let dashboard = dashboard.clone();
        spawn_local(async move {
            dashboard.logout().await;
            crate::app::push_route(Default::default());
        });
    };

    view! {
        <header class="header">
            <h1>"PetCare 管理画面"</h1>
            <div class="header-user">
                <span>{user_name}</span>
                <button class="btn btn-tertiary btn-small" on:click=on_logout>
                    "ログアウト"
                </button>
            </div>
        </header>
    }
}
