use leptos::prelude::*;
use petcare_common::FieldErrors;

/// フィールド単位のエラー表示
#[component]
pub fn FieldError(errors: RwSignal<FieldErrors>, field: &'static str) -> impl IntoView {
    let messages = move || errors.with(|e| e.get(field).cloned().unwrap_or_default());

    view! {
        <Show when=move || !messages().is_empty()>
            <ul class="field-error">
                {move || {
                    messages()
                        .into_iter()
                        .map(|m| view! { <li>{m}</li> })
                        .collect_view()
                }}
            </ul>
        </Show>
    }
}
