//! タブごとの一覧・詳細パネル

use crate::api::fetch::DEFAULT_STORAGE_URL;
use crate::app::{push_route, spawn_fetch, use_dashboard, use_revision, AppDashboard, Modal};
use crate::components::{data_table::DataTable, pagination::Pagination, search_bar::SearchBar};
use leptos::prelude::*;
use petcare_common::files::certificate_url;
use petcare_common::models::{client_columns, pet_columns};
use petcare_common::{
    Client, Column, DetailRoute, Entity, EntityId, ListView, Pet, RowAction, Tab, TableRow,
};

fn with_actions(mut columns: Vec<Column>) -> Vec<Column> {
    columns.push(Column::actions("操作"));
    columns
}

/// 検索バー・テーブル・ページ送り
#[component]
fn ListSection<E, F>(list: ListView<E>, columns: Vec<Column>, on_action: F) -> impl IntoView
where
    E: Entity + TableRow,
    F: Fn(RowAction, E) + 'static + Clone + Send + Sync,
{
    let dashboard = use_dashboard();
    let revision = use_revision();

    let term = {
        let list = list.clone();
        Signal::derive(move || {
            revision.track();
            list.term()
        })
    };
    let on_search = {
        let list = list.clone();
        let dashboard = dashboard.clone();
        move |term: String| {
            let list = list.clone();
            spawn_fetch(&dashboard, async move { list.set_search(&term).await });
        }
    };

    let display = {
        let list = list.clone();
        move || {
            revision.track();
            list.display()
        }
    };
    let page = {
        let display = display.clone();
        Signal::derive(move || display().page)
    };
    let page_count = {
        let display = display.clone();
        Signal::derive(move || display().page_count)
    };
    let total = Signal::derive(move || display().total);
    let on_page = {
        let list = list.clone();
        move |page: u32| {
            let list = list.clone();
            spawn_fetch(&dashboard, async move { list.go_to_page(page).await });
        }
    };

    let last = columns.len().saturating_sub(1);

    view! {
        <div class="list-section">
            <SearchBar term=term on_search=on_search />
            <DataTable
                list=list
                columns=columns
                fixed_columns=vec![0, last]
                on_action=on_action
            />
            <Pagination page=page page_count=page_count total=total on_page=on_page />
        </div>
    }
}

/// 詳細を閉じて一覧に戻る
fn close_detail(dashboard: &AppDashboard) {
    dashboard.close_detail();
    push_route(DetailRoute::list(dashboard.tab()));
}

fn open_detail(dashboard: &AppDashboard, id: EntityId) {
    push_route(DetailRoute::detail(dashboard.tab(), id));
    let d = dashboard.clone();
    spawn_fetch(dashboard, async move { d.open_detail(id).await });
}

// ========================
// 飼い主
// ========================

#[component]
pub fn ClientsPanel() -> impl IntoView {
    let dashboard = use_dashboard();
    let revision = use_revision();

    let on_action = {
        let dashboard = dashboard.clone();
        move |action: RowAction, client: Client| match action {
            RowAction::View => open_detail(&dashboard, client.id),
            RowAction::Edit => {
                dashboard.modals.open(Modal::ClientForm(Some(client)));
            }
            RowAction::Delete => {
                dashboard.modals.open(Modal::ConfirmDelete {
                    tab: Tab::Clients,
                    id: client.id,
                    label: client.full_name(),
                });
            }
        }
    };

    let on_create = {
        let dashboard = dashboard.clone();
        move |_| {
            dashboard.modals.open(Modal::ClientForm(None));
        }
    };

    let current = {
        let dashboard = dashboard.clone();
        move || {
            revision.track();
            dashboard
                .route()
                .id
                .and(dashboard.clients.store().current())
        }
    };

    view! {
        <section class="panel">
            <div class="panel-header">
                <h2>"飼い主"</h2>
                <button class="btn btn-primary" on:click=on_create>"新規登録"</button>
            </div>

            {move || current().map(|client| view! { <ClientDetail client=client /> })}

            <ListSection
                list=dashboard.clients.clone()
                columns=with_actions(client_columns())
                on_action=on_action
            />
        </section>
    }
}

#[component]
fn ClientDetail(client: Client) -> impl IntoView {
    let dashboard = use_dashboard();

    view! {
        <div class="detail-card">
            <div class="detail-header">
                <h3>{format!("飼い主 #{} {}", client.id, client.full_name())}</h3>
                <button class="btn btn-tertiary btn-small" on:click=move |_| close_detail(&dashboard)>
                    "閉じる"
                </button>
            </div>
            <dl>
                <dt>"メール"</dt>
                <dd>{client.email.clone()}</dd>
                <dt>"電話"</dt>
                <dd>{client.phone.clone()}</dd>
                <dt>"住所"</dt>
                <dd>{client.address.clone().unwrap_or_else(|| "-".into())}</dd>
                <dt>"状態"</dt>
                <dd>{client.status.label()}</dd>
                <dt>"ペット数"</dt>
                <dd>{client.pets_count.map(|c| c.to_string()).unwrap_or_else(|| "-".into())}</dd>
            </dl>
        </div>
    }
}

// ========================
// ペット
// ========================

#[component]
pub fn PetsPanel() -> impl IntoView {
    let dashboard = use_dashboard();
    let revision = use_revision();

    let on_action = {
        let dashboard = dashboard.clone();
        move |action: RowAction, pet: Pet| match action {
            RowAction::View => open_detail(&dashboard, pet.id),
            RowAction::Edit => {
                dashboard.modals.open(Modal::PetForm(Some(pet)));
            }
            RowAction::Delete => {
                dashboard.modals.open(Modal::ConfirmDelete {
                    tab: Tab::Pets,
                    id: pet.id,
                    label: pet.name.clone(),
                });
            }
        }
    };

    let on_create = {
        let dashboard = dashboard.clone();
        move |_| {
            dashboard.modals.open(Modal::PetForm(None));
        }
    };

    let current = {
        let dashboard = dashboard.clone();
        move || {
            revision.track();
            dashboard.route().id.and(dashboard.pets.store().current())
        }
    };

    view! {
        <section class="panel">
            <div class="panel-header">
                <h2>"ペット"</h2>
                <button class="btn btn-primary" on:click=on_create>"新規登録"</button>
            </div>

            {move || current().map(|pet| view! { <PetDetail pet=pet /> })}

            <ListSection
                list=dashboard.pets.clone()
                columns=with_actions(pet_columns())
                on_action=on_action
            />
        </section>
    }
}

#[component]
fn PetDetail(pet: Pet) -> impl IntoView {
    let dashboard = use_dashboard();

    let vaccinations = pet
        .vaccinations
        .iter()
        .map(|vaccination| {
            let certificate = certificate_url(DEFAULT_STORAGE_URL, vaccination).map(|url| {
                view! {
                    <a href=url target="_blank" rel="noopener noreferrer">"証明書"</a>
                }
            });
            view! {
                <li>
                    {vaccination.summary()}
                    " "
                    {certificate}
                </li>
            }
        })
        .collect_view();

    view! {
        <div class="detail-card">
            <div class="detail-header">
                <h3>{format!("ペット #{} {}", pet.id, pet.name)}</h3>
                <button class="btn btn-tertiary btn-small" on:click=move |_| close_detail(&dashboard)>
                    "閉じる"
                </button>
            </div>
            <dl>
                <dt>"種類"</dt>
                <dd>{format!("{} / {}", pet.species, pet.breed.clone().unwrap_or_else(|| "-".into()))}</dd>
                <dt>"飼い主"</dt>
                <dd>{pet.owner_name.clone().unwrap_or_else(|| "-".into())}</dd>
                <dt>"生年月日"</dt>
                <dd>{pet.birth_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "-".into())}</dd>
                <dt>"体重"</dt>
                <dd>{pet.weight_kg.map(|w| format!("{:.1} kg", w)).unwrap_or_else(|| "-".into())}</dd>
                <dt>"状態"</dt>
                <dd>{pet.status.label()}</dd>
            </dl>
            <h4>"ワクチン"</h4>
            <ul class="vaccinations">{vaccinations}</ul>
        </div>
    }
}
