//! ページ送り

use leptos::prelude::*;

#[component]
pub fn Pagination<F>(
    page: Signal<u32>,
    page_count: Signal<u32>,
    total: Signal<u64>,
    on_page: F,
) -> impl IntoView
where
    F: Fn(u32) + 'static + Clone + Send + Sync,
{
    let on_prev = {
        let on_page = on_page.clone();
        move |_: leptos::ev::MouseEvent| on_page(page.get().saturating_sub(1).max(1))
    };
    let on_next = move |_: leptos::ev::MouseEvent| on_page(page.get() + 1);

    view! {
        <div class="pagination">
            <button
                class="btn btn-secondary btn-small"
                disabled=move || page.get() <= 1
                on:click=on_prev
            >
                "前へ"
            </button>
            <span class="pagination-info">
                {move || format!("{} / {} ページ（全{}件）", page.get(), page_count.get(), total.get())}
            </span>
            <button
                class="btn btn-secondary btn-small"
                disabled=move || page.get() >= page_count.get()
                on:click=on_next
            >
                "次へ"
            </button>
        </div>
    }
}
