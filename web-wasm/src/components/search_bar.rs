//! 検索バー

use leptos::prelude::*;

/// 入力確定（Enter・フォーカスアウト）で `on_search` を呼ぶ
#[component]
pub fn SearchBar<F>(
    term: Signal<String>,
    on_search: F,
) -> impl IntoView
where
    F: Fn(String) + 'static + Clone + Send + Sync,
{
    let on_clear = {
        let on_search = on_search.clone();
        move |_| on_search(String::new())
    };

    view! {
        <div class="search-bar">
            <input
                type="search"
                placeholder="名前・メール・電話で検索..."
                prop:value=move || term.get()
                on:change=move |ev| on_search(event_target_value(&ev))
            />
            <Show when=move || !term.get().trim().is_empty()>
                <button class="btn btn-tertiary btn-small" on:click=on_clear.clone()>
                    "クリア"
                </button>
            </Show>
        </div>
    }
}
