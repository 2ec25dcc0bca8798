//! トースト表示

use crate::app::{use_dashboard, use_revision};
use leptos::prelude::*;

#[component]
pub fn ToastHost() -> impl IntoView {
    let dashboard = use_dashboard();
    let revision = use_revision();

    let items = {
        let dashboard = dashboard.clone();
        move || {
            revision.track();
            dashboard.toasts.items()
        }
    };

    view! {
        <div class="toast-host">
            <For
                each=items
                key=|toast| toast.id
                children=move |toast| {
                    let toasts = dashboard.toasts.clone();
                    let id = toast.id;
                    let lines = toast
                        .message
                        .lines()
                        .into_iter()
                        .map(|line| view! { <p>{line.to_string()}</p> })
                        .collect_view();
                    view! {
                        <div class=format!("toast {}", toast.scheme.css_class())>
                            <div class="toast-header">
                                <strong>{toast.title.clone()}</strong>
                                <button class="toast-close" on:click=move |_| {
                                    toasts.remove(id);
                                }>
                                    "×"
                                </button>
                            </div>
                            <div class="toast-body">{lines}</div>
                        </div>
                    }
                }
            />
        </div>
    }
}
