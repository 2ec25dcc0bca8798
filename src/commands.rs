//! サブコマンドの処理
//!
//! どのコマンドも `Dashboard` のストア経由でAPIを呼び、結果はトーストとして出力する。

use crate::cli::{ClientCommand, ListArgs, PetCommand};
use crate::config::Config;
use crate::error::{PetCareError, Result};
use crate::output;
use dialoguer::{Confirm, Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use petcare_common::files::certificate_url;
use petcare_common::models::{client_columns, pet_columns};
use petcare_common::notify::{report_fetch, report_outcome};
use petcare_common::table::{Column, TableRow};
use petcare_common::{
    fetch_breeds, ClientDraft, ClientPatch, Credentials, Dashboard, Entity, FetchStatus, ListView,
    PetDraft, PetPatch, Registration,
};
use std::future::Future;
use std::time::Duration;

/// 待ち時間の長い呼び出しをスピナー付きで実行する
pub async fn with_spinner<T>(message: &str, task: impl Future<Output = T>) -> T {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = task.await;
    spinner.finish_and_clear();
    result
}

fn require_login(dashboard: &Dashboard) -> Result<()> {
    if dashboard.auth.is_authenticated() {
        Ok(())
    } else {
        Err(PetCareError::NotAuthenticated)
    }
}

fn prompt_error(e: dialoguer::Error) -> PetCareError {
    PetCareError::InvalidInput(e.to_string())
}

/// 失敗した読み込みを通知してエラーにする
fn ensure_applied(dashboard: &Dashboard, status: FetchStatus) -> Result<()> {
    report_fetch(&dashboard.toasts, &status);
    output::flush_toasts(&dashboard.toasts);
    match status {
        FetchStatus::Failed(message) => Err(PetCareError::Operation(message)),
        FetchStatus::Applied | FetchStatus::Superseded => Ok(()),
    }
}

fn finish<T>(dashboard: &Dashboard, outcome: &petcare_common::Outcome<T>, done: &str) -> Result<()> {
    report_outcome(&dashboard.toasts, outcome, done);
    output::flush_toasts(&dashboard.toasts);
    if outcome.success {
        Ok(())
    } else {
        Err(PetCareError::Operation(
            outcome.message.clone().unwrap_or_default(),
        ))
    }
}

// ========================
// 認証
// ========================

pub async fn login(dashboard: &Dashboard, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => Input::<String>::new()
            .with_prompt("メールアドレス")
            .interact_text()
            .map_err(prompt_error)?,
    };
    let password = Password::new()
        .with_prompt("パスワード")
        .interact()
        .map_err(prompt_error)?;

    let outcome = with_spinner(
        "ログイン中...",
        dashboard.auth.login(Credentials { email, password }),
    )
    .await;
    finish(dashboard, &outcome, "ログインしました")?;

    if let Some(user) = outcome.value {
        println!("ようこそ、{} さん", user.name);
    }
    Ok(())
}

pub async fn register(dashboard: &Dashboard) -> Result<()> {
    let name = Input::<String>::new()
        .with_prompt("名前")
        .interact_text()
        .map_err(prompt_error)?;
    let email = Input::<String>::new()
        .with_prompt("メールアドレス")
        .interact_text()
        .map_err(prompt_error)?;
    let password = Password::new()
        .with_prompt("パスワード")
        .interact()
        .map_err(prompt_error)?;
    let password_confirmation = Password::new()
        .with_prompt("パスワード（確認）")
        .interact()
        .map_err(prompt_error)?;

    let outcome = with_spinner(
        "登録中...",
        dashboard.auth.register(Registration {
            name,
            email,
            password,
            password_confirmation,
        }),
    )
    .await;
    finish(dashboard, &outcome, "登録しました")
}

pub async fn logout(dashboard: &Dashboard) -> Result<()> {
    if !dashboard.auth.is_authenticated() {
        println!("ログインしていません");
        return Ok(());
    }
    dashboard.logout().await;
    println!("✔ ログアウトしました");
    Ok(())
}

pub async fn whoami(dashboard: &Dashboard) -> Result<()> {
    require_login(dashboard)?;
    match with_spinner("確認中...", dashboard.auth.get_user()).await {
        Some(user) => {
            println!("ユーザー: {} <{}>", user.name, user.email);
            if let Some(role) = user.role {
                println!("権限: {}", role);
            }
            Ok(())
        }
        None => Err(PetCareError::Operation(
            dashboard
                .auth
                .error()
                .unwrap_or_else(|| "セッションが無効です。再度ログインしてください".into()),
        )),
    }
}

// ========================
// 一覧
// ========================

async fn list<E: Entity + TableRow>(
    dashboard: &Dashboard,
    view: &ListView<E>,
    columns: &[Column],
    args: ListArgs,
) -> Result<()> {
    if let Some(key) = &args.sort {
        if !columns.iter().any(|c| &c.key == key && c.sortable) {
            return Err(PetCareError::InvalidInput(format!(
                "並べ替えできないカラムです: {}",
                key
            )));
        }
        view.toggle_sort(key);
        if args.desc {
            view.toggle_sort(key);
        }
    }

    let status = match args.search.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(term) => {
            let status = with_spinner("全件を取得中...", view.set_search(term)).await;
            if status.is_applied() {
                view.go_to_page(args.page).await
            } else {
                status
            }
        }
        None => {
            let page_size = args.per_page.unwrap_or_else(|| view.store().page_size());
            with_spinner("取得中...", view.store().fetch_page(args.page, page_size)).await
        }
    };
    ensure_applied(dashboard, status)?;

    let page = view.display();
    if page.rows.is_empty() {
        println!("該当するデータがありません");
    } else {
        println!("{}", output::render_table(columns, &page.rows));
    }
    println!("{}", output::page_footer(&page));
    Ok(())
}

// ========================
// 飼い主
// ========================

pub async fn clients(dashboard: &Dashboard, action: ClientCommand) -> Result<()> {
    require_login(dashboard)?;
    let store = dashboard.clients.store();

    match action {
        ClientCommand::List(args) => {
            list(dashboard, &dashboard.clients, &client_columns(), args).await
        }

        ClientCommand::Show { id } => {
            ensure_applied(dashboard, with_spinner("取得中...", store.find_one(id)).await)?;
            let client = store
                .current()
                .ok_or_else(|| PetCareError::NotFound(format!("飼い主 #{}", id)))?;
            println!("飼い主 #{}", client.id);
            println!("  氏名: {}", client.full_name());
            println!("  メール: {}", client.email);
            println!("  電話: {}", client.phone);
            println!("  住所: {}", client.address.as_deref().unwrap_or("-"));
            println!("  状態: {}", client.status.label());
            if let Some(count) = client.pets_count {
                println!("  ペット数: {}", count);
            }
            Ok(())
        }

        ClientCommand::Create { first_name, last_name, email, phone, address, status } => {
            let draft = ClientDraft { first_name, last_name, email, phone, address, status };
            let outcome = with_spinner("登録中...", store.create(draft)).await;
            finish(dashboard, &outcome, "飼い主を登録しました")?;
            if let Some(created) = outcome.value {
                println!("ID: {}", created.id);
            }
            Ok(())
        }

        ClientCommand::Update {
            id,
            first_name,
            last_name,
            email,
            phone,
            address,
            clear_address,
            status,
        } => {
            let patch = ClientPatch {
                first_name,
                last_name,
                email,
                phone,
                address: nullable(address, clear_address),
                status,
            };
            if patch.is_empty() {
                return Err(PetCareError::InvalidInput("更新する項目を指定してください".into()));
            }
            let outcome = with_spinner("更新中...", store.update_item(id, patch)).await;
            finish(dashboard, &outcome, "飼い主を更新しました")
        }

        ClientCommand::Delete { id, yes } => {
            if !yes && !confirm(&format!("飼い主 #{} を削除しますか？", id))? {
                println!("中止しました");
                return Ok(());
            }
            let outcome = with_spinner("削除中...", store.delete(id)).await;
            finish(dashboard, &outcome, "飼い主を削除しました")
        }
    }
}

// ========================
// ペット
// ========================

pub async fn pets(dashboard: &Dashboard, config: &Config, action: PetCommand) -> Result<()> {
    require_login(dashboard)?;
    let store = dashboard.pets.store();

    match action {
        PetCommand::List(args) => list(dashboard, &dashboard.pets, &pet_columns(), args).await,

        PetCommand::Show { id } => {
            ensure_applied(dashboard, with_spinner("取得中...", store.find_one(id)).await)?;
            let pet = store
                .current()
                .ok_or_else(|| PetCareError::NotFound(format!("ペット #{}", id)))?;
            println!("ペット #{}", pet.id);
            println!("  名前: {}", pet.name);
            println!("  種類: {} / {}", pet.species, pet.breed.as_deref().unwrap_or("-"));
            println!("  飼い主: {}", pet.owner_name.as_deref().unwrap_or("-"));
            if let Some(birth) = pet.birth_date {
                println!("  生年月日: {}", birth.format("%Y-%m-%d"));
            }
            if let Some(weight) = pet.weight_kg {
                println!("  体重: {:.1} kg", weight);
            }
            println!("  状態: {}", pet.status.label());
            if !pet.vaccinations.is_empty() {
                println!("  ワクチン:");
                for vaccination in &pet.vaccinations {
                    let due = vaccination
                        .next_due
                        .map(|d| format!(" 次回 {}", d.format("%Y-%m-%d")))
                        .unwrap_or_default();
                    println!("    - {}{}", vaccination.summary(), due);
                    if let Some(url) = certificate_url(&config.storage_url, vaccination) {
                        println!("      証明書: {}", url);
                    }
                }
            }
            Ok(())
        }

        PetCommand::Create { client_id, name, species, breed, birth_date, weight, status } => {
            let draft = PetDraft {
                client_id,
                name,
                species,
                breed,
                birth_date,
                weight_kg: weight,
                status,
            };
            let outcome = with_spinner("登録中...", store.create(draft)).await;
            finish(dashboard, &outcome, "ペットを登録しました")?;
            if let Some(created) = outcome.value {
                println!("ID: {}", created.id);
            }
            Ok(())
        }

        PetCommand::Update {
            id,
            name,
            species,
            breed,
            clear_breed,
            birth_date,
            clear_birth_date,
            weight,
            clear_weight,
            status,
        } => {
            let patch = PetPatch {
                name,
                species,
                breed: nullable(breed, clear_breed),
                birth_date: nullable(birth_date, clear_birth_date),
                weight_kg: nullable(weight, clear_weight),
                status,
            };
            if patch.is_empty() {
                return Err(PetCareError::InvalidInput("更新する項目を指定してください".into()));
            }
            let outcome = with_spinner("更新中...", store.update_item(id, patch)).await;
            finish(dashboard, &outcome, "ペットを更新しました")
        }

        PetCommand::Delete { id, yes } => {
            if !yes && !confirm(&format!("ペット #{} を削除しますか？", id))? {
                println!("中止しました");
                return Ok(());
            }
            let outcome = with_spinner("削除中...", store.delete(id)).await;
            finish(dashboard, &outcome, "ペットを削除しました")
        }
    }
}

/// `--clear-*` が付いていれば消去、値があれば設定、どちらも無ければ変更なし
fn nullable<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(prompt_error)
}

// ========================
// 参照データ
// ========================

pub async fn breeds(dashboard: &Dashboard, species: &str, refresh: bool) -> Result<()> {
    if refresh {
        dashboard.lookups.invalidate(&petcare_common::cache::breeds_key(species));
    }
    let breeds = with_spinner(
        "取得中...",
        fetch_breeds(&dashboard.api, &dashboard.lookups, species),
    )
    .await?;

    if breeds.is_empty() {
        println!("品種が登録されていません: {}", species);
    }
    for breed in breeds {
        println!("{:>4}  {}", breed.id, breed.name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullable_patch_value() {
        assert_eq!(nullable(Some("Tokyo".to_string()), false), Some(Some("Tokyo".to_string())));
        assert_eq!(nullable::<String>(None, true), Some(None));
        assert_eq!(nullable::<f64>(None, false), None);
    }
}
