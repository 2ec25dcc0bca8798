//! モーダル表示（最上段のみ）

use crate::app::{push_route, use_dashboard, use_revision, Modal};
use crate::components::{client_form::ClientForm, pet_form::PetForm};
use leptos::prelude::*;
use leptos::task::spawn_local;
use petcare_common::notify::report_outcome;
use petcare_common::{DetailRoute, EntityId, Tab};

#[component]
pub fn ModalHost() -> impl IntoView {
    let dashboard = use_dashboard();
    let revision = use_revision();

    // 最上段が変わったときだけ描き直す（入力中のフォームを保つ）
    let top = Memo::new(move |_| {
        revision.track();
        dashboard.modals.top()
    });

    move || {
        top.get().map(|modal| {
            let body = match modal {
                Modal::ClientForm(client) => view! { <ClientForm client=client /> }.into_any(),
                Modal::PetForm(pet) => view! { <PetForm pet=pet /> }.into_any(),
                Modal::ConfirmDelete { tab, id, label } => {
                    view! { <ConfirmDelete tab=tab id=id label=label /> }.into_any()
                }
            };
            view! {
                <div class="modal-backdrop">
                    <div class="modal">{body}</div>
                </div>
            }
        })
    }
}

#[component]
fn ConfirmDelete(tab: Tab, id: EntityId, label: String) -> impl IntoView {
    let dashboard = use_dashboard();
    let deleting = RwSignal::new(false);

    let on_confirm = {
        let dashboard = dashboard.clone();
        move |_| {
            if deleting.get_untracked() {
                return;
            }
            deleting.set(true);
            let dashboard = dashboard.clone();
            spawn_local(async move {
                let outcome = match tab {
                    Tab::Clients => dashboard.clients.store().delete(id).await,
                    Tab::Pets => dashboard.pets.store().delete(id).await,
                };
                report_outcome(&dashboard.toasts, &outcome, "削除しました");
                deleting.set(false);
                dashboard.modals.close();

                // 表示中の詳細を消した場合は一覧に戻る
                if outcome.success && dashboard.route() == DetailRoute::detail(tab, id) {
                    dashboard.close_detail();
                    push_route(DetailRoute::list(tab));
                }
            });
        }
    };

    let on_cancel = move |_| {
        dashboard.modals.close();
    };

    view! {
        <div class="confirm-dialog">
            <h3>"削除の確認"</h3>
            <p>{format!("「{}」を削除しますか？この操作は取り消せません。", label)}</p>
            <div class="form-actions">
                <button type="button" class="btn btn-tertiary" on:click=on_cancel>
                    "キャンセル"
                </button>
                <button
                    type="button"
                    class="btn btn-danger"
                    disabled=move || deleting.get()
                    on:click=on_confirm
                >
                    {move || if deleting.get() { "削除中..." } else { "削除" }}
                </button>
            </div>
        </div>
    }
}
