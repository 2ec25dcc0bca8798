//! ペットの登録・編集フォーム
//!
//! 品種の候補は種類ごとに参照データキャッシュから引く。

use crate::app::use_dashboard;
use crate::components::field_error::FieldError;
use crate::platform::log_error;
use chrono::NaiveDate;
use leptos::prelude::*;
use leptos::task::spawn_local;
use petcare_common::notify::report_outcome;
use petcare_common::{fetch_breeds, Breed, FieldErrors, Pet, PetDraft, PetPatch, PetStatus};

const SPECIES: [(&str, &str); 3] = [("dog", "犬"), ("cat", "猫"), ("other", "その他")];

fn optional(value: String) -> Option<String> {
    Some(value.trim().to_string()).filter(|v| !v.is_empty())
}

#[component]
pub fn PetForm(pet: Option<Pet>) -> impl IntoView {
    let dashboard = use_dashboard();
    let title = if pet.is_some() { "ペットの編集" } else { "ペットの新規登録" };
    let is_new = pet.is_none();

    let field = |f: fn(&Pet) -> String| RwSignal::new(pet.as_ref().map(f).unwrap_or_default());
    let client_id = field(|p| p.client_id.to_string());
    let name = field(|p| p.name.clone());
    let species = RwSignal::new(
        pet.as_ref()
            .map(|p| p.species.clone())
            .unwrap_or_else(|| SPECIES[0].0.to_string()),
    );
    let breed = field(|p| p.breed.clone().unwrap_or_default());
    let birth_date = field(|p| p.birth_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default());
    let weight = field(|p| p.weight_kg.map(|w| w.to_string()).unwrap_or_default());
    let status = field(|p| p.status.as_str().to_string());
    let errors = RwSignal::new(FieldErrors::new());
    let submitting = RwSignal::new(false);
    let breeds = RwSignal::new(Vec::<Breed>::new());

    // 種類が変わるたびに品種候補を取り直す
    Effect::new({
        let dashboard = dashboard.clone();
        move |_| {
            let species = species.get();
            let dashboard = dashboard.clone();
            spawn_local(async move {
                match fetch_breeds(&dashboard.api, &dashboard.lookups, &species).await {
                    Ok(list) => breeds.set(list),
                    Err(e) => {
                        log_error("breeds", &e.to_string());
                        breeds.set(Vec::new());
                    }
                }
            });
        }
    });

    let on_submit = {
        let dashboard = dashboard.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            if submitting.get_untracked() {
                return;
            }

            let mut local = FieldErrors::new();
            let birth = optional(birth_date.get_untracked());
            let birth = match birth.map(|b| NaiveDate::parse_from_str(&b, "%Y-%m-%d")) {
                Some(Ok(date)) => Some(date),
                Some(Err(_)) => {
                    local.insert("birth_date".into(), vec!["日付の形式が正しくありません".into()]);
                    None
                }
                None => None,
            };
            let weight_kg = match optional(weight.get_untracked()).map(|w| w.parse::<f64>()) {
                Some(Ok(w)) => Some(w),
                Some(Err(_)) => {
                    local.insert("weight_kg".into(), vec!["体重は数値で入力してください".into()]);
                    None
                }
                None => None,
            };
            let owner = client_id.get_untracked().trim().parse().unwrap_or_default();
            if !local.is_empty() {
                errors.set(local);
                return;
            }
            submitting.set(true);

            let dashboard = dashboard.clone();
            let editing = pet.as_ref().map(|p| p.id);
            let status: PetStatus = status.get_untracked().parse().unwrap_or_default();
            let (pet_name, pet_species, pet_breed) = (
                name.get_untracked(),
                species.get_untracked(),
                optional(breed.get_untracked()),
            );

            spawn_local(async move {
                let store = dashboard.pets.store();
                let (success, field_errors) = match editing {
                    Some(id) => {
                        let patch = PetPatch {
                            name: Some(pet_name),
                            species: Some(pet_species),
                            breed: Some(pet_breed),
                            birth_date: Some(birth),
                            weight_kg: Some(weight_kg),
                            status: Some(status),
                        };
                        let outcome = store.update_item(id, patch).await;
                        report_outcome(&dashboard.toasts, &outcome, "ペットを更新しました");
                        (outcome.success, outcome.field_errors)
                    }
                    None => {
                        let draft = PetDraft {
                            client_id: owner,
                            name: pet_name,
                            species: pet_species,
                            breed: pet_breed,
                            birth_date: birth,
                            weight_kg,
                            status,
                        };
                        let outcome = store.create(draft).await;
                        report_outcome(&dashboard.toasts, &outcome, "ペットを登録しました");
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

            <Show when=move || is_new>
                <div class="form-group">
                    <label for="pet-client-id">"飼い主ID"</label>
                    <input
                        type="number"
                        id="pet-client-id"
                        min="1"
                        prop:value=move || client_id.get()
                        on:input=move |ev| client_id.set(event_target_value(&ev))
                    />
                    <FieldError errors=errors field="client_id" />
                </div>
            </Show>

            <div class="form-group">
                <label for="pet-name">"名前"</label>
                <input
                    id="pet-name"
                    prop:value=move || name.get()
                    on:input=move |ev| name.set(event_target_value(&ev))
                />
                <FieldError errors=errors field="name" />
            </div>

            <div class="form-row">
                <div class="form-group">
                    <label for="pet-species">"種類"</label>
                    <select
                        id="pet-species"
                        prop:value=move || species.get()
                        on:change=move |ev| {
                            species.set(event_target_value(&ev));
                            breed.set(String::new());
                        }
                    >
                        {SPECIES
                            .into_iter()
                            .map(|(value, label)| view! { <option value=value>{label}</option> })
                            .collect_view()}
                    </select>
                    <FieldError errors=errors field="species" />
                </div>
                <div class="form-group">
                    <label for="pet-breed">"品種"</label>
                    <input
                        id="pet-breed"
                        list="pet-breed-options"
                        prop:value=move || breed.get()
                        on:input=move |ev| breed.set(event_target_value(&ev))
                    />
                    <datalist id="pet-breed-options">
                        {move || {
                            breeds
                                .get()
                                .into_iter()
                                .map(|b| view! { <option value=b.name /> })
                                .collect_view()
                        }}
                    </datalist>
                </div>
            </div>

            <div class="form-row">
                <div class="form-group">
                    <label for="pet-birth-date">"生年月日"</label>
                    <input
                        type="date"
                        id="pet-birth-date"
                        prop:value=move || birth_date.get()
                        on:input=move |ev| birth_date.set(event_target_value(&ev))
                    />
                    <FieldError errors=errors field="birth_date" />
                </div>
                <div class="form-group">
                    <label for="pet-weight">"体重 (kg)"</label>
                    <input
                        type="number"
                        id="pet-weight"
                        step="0.1"
                        min="0"
                        prop:value=move || weight.get()
                        on:input=move |ev| weight.set(event_target_value(&ev))
                    />
                    <FieldError errors=errors field="weight_kg" />
                </div>
            </div>

            <div class="form-group">
                <label for="pet-status">"状態"</label>
                <select
                    id="pet-status"
                    prop:value=move || status.get()
                    on:change=move |ev| status.set(event_target_value(&ev))
                >
                    {[PetStatus::Active, PetStatus::Deceased, PetStatus::Transferred]
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
