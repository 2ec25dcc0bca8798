//! 飼い主の登録・編集フォーム

use crate::app::use_dashboard;
use crate::components::field_error::FieldError;
use leptos::prelude::*;
use leptos::task::spawn_local;
use petcare_common::notify::report_outcome;
use petcare_common::{Client, ClientDraft, ClientPatch, ClientStatus, FieldErrors};

fn optional(value: String) -> Option<String> {
    Some(value).filter(|v| !v.trim().is_empty())
}

#[component]
pub fn ClientForm(client: Option<Client>) -> impl IntoView {
    let dashboard = use_dashboard();
    let title = if client.is_some() { "飼い主の編集" } else { "飼い主の新規登録" };

    let field = |f: fn(&Client) -> String| RwSignal::new(client.as_ref().map(f).unwrap_or_default());
    let last_name = field(|c| c.last_name.clone());
    let first_name = field(|c| c.first_name.clone());
    let email = field(|c| c.email.clone());
    let phone = field(|c| c.phone.clone());
    let address = field(|c| c.address.clone().unwrap_or_default());
    let status = field(|c| c.status.as_str().to_string());
    let errors = RwSignal::new(FieldErrors::new());
    let submitting = RwSignal::new(false);

    let on_submit = {
        let dashboard = dashboard.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            if submitting.get_untracked() {
                return;
            }
            submitting.set(true);

            let dashboard = dashboard.clone();
            let editing = client.as_ref().map(|c| c.id);
            let status: ClientStatus = status.get_untracked().parse().unwrap_or_default();
            let (last, first, mail, tel, addr) = (
                last_name.get_untracked(),
                first_name.get_untracked(),
                email.get_untracked(),
                phone.get_untracked(),
                address.get_untracked(),
            );

            spawn_local(async move {
                let store = dashboard.clients.store();
                let (success, field_errors) = match editing {
                    Some(id) => {
                        let patch = ClientPatch {
                            first_name: Some(first),
                            last_name: Some(last),
                            email: Some(mail),
                            phone: Some(tel),
                            address: Some(optional(addr)),
                            status: Some(status),
                        };
                        let outcome = store.update_item(id, patch).await;
                        report_outcome(&dashboard.toasts, &outcome, "飼い主を更新しました");
                        (outcome.success, outcome.field_errors)
                    }
                    None => {
                        let draft = ClientDraft {
                            first_name: first,
                            last_name: last,
                            email: mail,
                            phone: tel,
                            address: optional(addr),
                            status,
                        };
                        let outcome = store.create(draft).await;
                        report_outcome(&dashboard.toasts, &outcome, "飼い主を登録しました");
                        (outcome.success, outcome.field_errors)
                    }
                };

                submitting.set(false);
                if success {
                    dashboard.modals.close();
                } else {
                    errors.set(field_errors.unwrap_or_default());
                }
            });
        }
    };

    let on_cancel = move |_| {
        dashboard.modals.close();
    };

    view! {
        <form class="entity-form" on:submit=on_submit>
            <h3>{title}</h3>

            <div class="form-row">
                <div class="form-group">
                    <label for="client-last-name">"姓"</label>
                    <input
                        id="client-last-name"
                        prop:value=move || last_name.get()
                        on:input=move |ev| last_name.set(event_target_value(&ev))
                    />
                    <FieldError errors=errors field="last_name" />
                </div>
                <div class="form-group">
                    <label for="client-first-name">"名"</label>
                    <input
                        id="client-first-name"
                        prop:value=move || first_name.get()
                        on:input=move |ev| first_name.set(event_target_value(&ev))
                    />
                    <FieldError errors=errors field="first_name" />
                </div>
            </div>

            <div class="form-group">
                <label for="client-email">"メールアドレス"</label>
                <input
                    type="email"
                    id="client-email"
                    prop:value=move || email.get()
                    on:input=move |ev| email.set(event_target_value(&ev))
                />
                <FieldError errors=errors field="email" />
            </div>

            <div class="form-group">
                <label for="client-phone">"電話番号"</label>
                <input
                    type="tel"
                    id="client-phone"
                    prop:value=move || phone.get()
                    on:input=move |ev| phone.set(event_target_value(&ev))
                />
                <FieldError errors=errors field="phone" />
            </div>

            <div class="form-group">
                <label for="client-address">"住所"</label>
                <input
                    id="client-address"
                    prop:value=move || address.get()
                    on:input=move |ev| address.set(event_target_value(&ev))
                />
            </div>

            <div class="form-group">
                <label for="client-status">"状態"</label>
                <select
                    id="client-status"
                    prop:value=move || status.get()
                    on:change=move |ev| status.set(event_target_value(&ev))
                >
                    {[ClientStatus::Active, ClientStatus::Inactive]
                        .into_iter()
                        .map(|s| view! { <option value=s.as_str()>{s.label()}</option> })
                        .collect_view()}
                </select>
            </div>

            <div class="form-actions">
                <button type="button" class="btn btn-tertiary" on:click=on_cancel>
                    "キャンセル"
                </button>
                <button type="submit" class="btn btn-primary" disabled=move || submitting.get()>
                    {move || if submitting.get() { "保存中..." } else { "保存" }}
                </button>
            </div>
        </form>
    }
}
