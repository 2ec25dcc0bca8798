//! エンティティと入力フォームの型定義
//!
//! CLIとWeb(WASM)で共有される型:
//! - Client / Pet: 一覧・詳細に表示するエンティティ
//! - *Draft: 新規作成フォーム
//! - *Patch: 部分更新（指定したフィールドだけ送る）

use crate::error::FieldErrors;
use crate::table::{CellValue, Column, TableRow};
use crate::validation::{Checker, Validate};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Debug;

/// バックエンド採番の整数ID
pub type EntityId = i64;

/// ストアで扱えるエンティティ
pub trait Entity: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Draft: Serialize + Validate + Debug + Send + Sync;
    type Patch: Serialize + Debug + Send + Sync;

    /// APIのリソース名（`/clients` の `clients`）
    const RESOURCE: &'static str;

    fn id(&self) -> EntityId;

    /// 部分更新をローカルの値にマージする
    fn apply_patch(&mut self, patch: &Self::Patch);

    /// 検索対象の文字列フィールド
    fn search_fields(&self) -> Vec<String>;

    /// 検索語（小文字化済み）を含むか
    fn matches(&self, needle: &str) -> bool {
        self.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// ページ形式の結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(alias = "items")]
    pub data: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub current_page: Option<u32>,
}

impl<T> Page<T> {
    /// サーバが返したページ番号（無ければ要求したページ）
    pub fn applied_page(&self, requested: u32) -> u32 {
        self.current_page.filter(|p| *p >= 1).unwrap_or(requested)
    }
}

fn set<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

/// 値が `null` なら `Some(None)`（消去）、キーが無ければ `None`（変更なし）
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ============================================
// Client（飼い主）
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    #[default]
    Active,
    Inactive,
    #[serde(other)]
    Unknown,
}

impl ClientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Active => "active",
            ClientStatus::Inactive => "inactive",
            ClientStatus::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ClientStatus::Active => "利用中",
            ClientStatus::Inactive => "休止",
            ClientStatus::Unknown => "不明",
        }
    }
}

impl std::str::FromStr for ClientStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(ClientStatus::Active),
            "inactive" => Ok(ClientStatus::Inactive),
            _ => Err(format!("Unknown client status: {}. Use active or inactive", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: EntityId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub status: ClientStatus,
    /// 登録ペット数（一覧APIのみが返す）
    #[serde(default)]
    pub pets_count: Option<u32>,
    #[serde(default)]
    pub last_visit: Option<NaiveDate>,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub status: ClientStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// `Some(None)` で住所を消す
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub address: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ClientStatus>,
}

impl ClientPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Validate for ClientDraft {
    fn validate(&self) -> FieldErrors {
        let mut checker = Checker::new();
        checker.required("last_name", &self.last_name, "姓");
        checker.required("first_name", &self.first_name, "名");
        checker.email("email", &self.email);
        checker.required("phone", &self.phone, "電話番号");
        checker.finish()
    }
}

impl Entity for Client {
    type Draft = ClientDraft;
    type Patch = ClientPatch;

    const RESOURCE: &'static str = "clients";

    fn id(&self) -> EntityId {
        self.id
    }

    fn apply_patch(&mut self, patch: &ClientPatch) {
        set(&mut self.first_name, &patch.first_name);
        set(&mut self.last_name, &patch.last_name);
        set(&mut self.email, &patch.email);
        set(&mut self.phone, &patch.phone);
        set(&mut self.address, &patch.address);
        set(&mut self.status, &patch.status);
    }

    fn search_fields(&self) -> Vec<String> {
        vec![
            self.full_name(),
            self.email.clone(),
            self.phone.clone(),
            self.status.as_str().to_string(),
            self.status.label().to_string(),
        ]
    }
}

impl TableRow for Client {
    fn row_id(&self) -> EntityId {
        self.id
    }

    fn cell(&self, key: &str) -> CellValue {
        match key {
            "id" => CellValue::Number(self.id as f64),
            "name" => CellValue::text(self.full_name()),
            "first_name" => CellValue::text(&self.first_name),
            "last_name" => CellValue::text(&self.last_name),
            "email" => CellValue::opt_text(Some(self.email.as_str())),
            "phone" => CellValue::opt_text(Some(self.phone.as_str())),
            "contact" => CellValue::Contact {
                email: self.email.clone(),
                phone: self.phone.clone(),
            },
            "address" => CellValue::opt_text(self.address.as_deref()),
            "status" => CellValue::Status {
                code: self.status.as_str().into(),
                label: self.status.label().into(),
            },
            "pets_count" => CellValue::opt_number(self.pets_count),
            "last_visit" => CellValue::opt_date(self.last_visit),
            _ => CellValue::Null,
        }
    }
}

// ============================================
// Pet
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetStatus {
    #[default]
    Active,
    Deceased,
    Transferred,
    #[serde(other)]
    Unknown,
}

impl PetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PetStatus::Active => "active",
            PetStatus::Deceased => "deceased",
            PetStatus::Transferred => "transferred",
            PetStatus::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PetStatus::Active => "通院中",
            PetStatus::Deceased => "死亡",
            PetStatus::Transferred => "転院",
            PetStatus::Unknown => "不明",
        }
    }
}

impl std::str::FromStr for PetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(PetStatus::Active),
            "deceased" => Ok(PetStatus::Deceased),
            "transferred" => Ok(PetStatus::Transferred),
            _ => Err(format!(
                "Unknown pet status: {}. Use active, deceased, or transferred",
                s
            )),
        }
    }
}

/// ワクチン接種記録
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vaccination {
    pub id: EntityId,
    pub vaccine: String,
    #[serde(default)]
    pub administered_on: Option<NaiveDate>,
    #[serde(default)]
    pub next_due: Option<NaiveDate>,
    /// 証明書ファイル（ストレージ基準の相対パス）
    #[serde(default)]
    pub certificate_path: Option<String>,
}

impl Vaccination {
    pub fn summary(&self) -> String {
        match self.administered_on {
            Some(date) => format!("{} ({})", self.vaccine, date.format("%Y-%m-%d")),
            None => self.vaccine.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: EntityId,
    pub client_id: EntityId,
    pub name: String,
    pub species: String,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub status: PetStatus,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub vaccinations: Vec<Vaccination>,
    #[serde(default)]
    pub last_visit: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PetDraft {
    pub client_id: EntityId,
    pub name: String,
    pub species: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    pub status: PetStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PetPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub breed: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PetStatus>,
}

impl PetPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Validate for PetDraft {
    fn validate(&self) -> FieldErrors {
        let mut checker = Checker::new();
        if self.client_id <= 0 {
            checker.add("client_id", "飼い主を選択してください");
        }
        checker.required("name", &self.name, "名前");
        checker.required("species", &self.species, "種類");
        if let Some(weight) = self.weight_kg {
            if !(weight >= 0.0) {
                checker.add("weight_kg", "体重は0以上で入力してください");
            }
        }
        checker.finish()
    }
}

impl Entity for Pet {
    type Draft = PetDraft;
    type Patch = PetPatch;

    const RESOURCE: &'static str = "pets";

    fn id(&self) -> EntityId {
        self.id
    }

    fn apply_patch(&mut self, patch: &PetPatch) {
        set(&mut self.name, &patch.name);
        set(&mut self.species, &patch.species);
        set(&mut self.breed, &patch.breed);
        set(&mut self.birth_date, &patch.birth_date);
        set(&mut self.weight_kg, &patch.weight_kg);
        set(&mut self.status, &patch.status);
    }

    fn search_fields(&self) -> Vec<String> {
        let mut fields = vec![
            self.name.clone(),
            self.species.clone(),
            self.status.as_str().to_string(),
            self.status.label().to_string(),
        ];
        fields.extend(self.breed.clone());
        fields.extend(self.owner_name.clone());
        fields
    }
}

impl TableRow for Pet {
    fn row_id(&self) -> EntityId {
        self.id
    }

    fn cell(&self, key: &str) -> CellValue {
        match key {
            "id" => CellValue::Number(self.id as f64),
            "name" => CellValue::text(&self.name),
            "species" => CellValue::text(&self.species),
            "breed" => CellValue::opt_text(self.breed.as_deref()),
            "owner" => CellValue::opt_text(self.owner_name.as_deref()),
            "birth_date" => CellValue::opt_date(self.birth_date),
            "weight_kg" => CellValue::opt_number(self.weight_kg),
            "status" => CellValue::Status {
                code: self.status.as_str().into(),
                label: self.status.label().into(),
            },
            "vaccinations" => {
                CellValue::List(self.vaccinations.iter().map(Vaccination::summary).collect())
            }
            "last_visit" => CellValue::opt_date(self.last_visit),
            _ => CellValue::Null,
        }
    }
}

// ============================================
// 認証・参照データ
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl User {
    /// 永続化データの破損検知用
    pub fn is_complete(&self) -> bool {
        self.id > 0 && !self.email.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Validate for Credentials {
    fn validate(&self) -> FieldErrors {
        let mut checker = Checker::new();
        checker.required("email", &self.email, "メールアドレス");
        checker.required("password", &self.password, "パスワード");
        checker.finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

impl Validate for Registration {
    fn validate(&self) -> FieldErrors {
        let mut checker = Checker::new();
        checker.required("name", &self.name, "名前");
        checker.email("email", &self.email);
        if self.password.chars().count() < crate::validation::MIN_PASSWORD_LEN {
            checker.add(
                "password",
                &format!(
                    "パスワードは{}文字以上で入力してください",
                    crate::validation::MIN_PASSWORD_LEN
                ),
            );
        }
        if self.password != self.password_confirmation {
            checker.add("password_confirmation", "パスワードが一致しません");
        }
        checker.finish()
    }
}

/// ログイン・登録APIの `result`（どちらかが欠けていれば失敗扱い）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthPayload {
    #[serde(default, alias = "access_token")]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// 犬種・猫種などの参照データ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breed {
    pub id: EntityId,
    pub name: String,
    pub species: String,
}

// ============================================
// 一覧のカラム定義
// ============================================

pub fn client_columns() -> Vec<Column> {
    vec![
        Column::new("id", "ID"),
        Column::new("name", "氏名"),
        Column::new("contact", "連絡先"),
        Column::new("status", "状態"),
        Column::new("pets_count", "ペット数"),
        Column::new("last_visit", "最終来院"),
    ]
}

pub fn pet_columns() -> Vec<Column> {
    vec![
        Column::new("id", "ID"),
        Column::new("name", "名前"),
        Column::new("species", "種類"),
        Column::new("breed", "品種"),
        Column::new("owner", "飼い主"),
        Column::new("status", "状態"),
        Column::new("vaccinations", "ワクチン"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> Client {
        serde_json::from_value(json!({
            "id": 7,
            "first_name": "Taro",
            "last_name": "Yamada",
            "email": "taro@example.com",
            "phone": "090-1111-2222",
            "status": "active",
            "pets_count": 2,
            "last_visit": "2026-09-30"
        }))
        .unwrap()
    }

    #[test]
    fn test_client_deserialize_with_defaults() {
        let c: Client = serde_json::from_value(json!({
            "id": 1, "first_name": "Hanako", "last_name": "Sato"
        }))
        .unwrap();
        assert_eq!(c.status, ClientStatus::Active);
        assert!(c.email.is_empty());
        assert!(c.pets_count.is_none());
    }

    #[test]
    fn test_unknown_status_is_tolerated() {
        let c: Client = serde_json::from_value(json!({
            "id": 1, "first_name": "a", "last_name": "b", "status": "archived"
        }))
        .unwrap();
        assert_eq!(c.status, ClientStatus::Unknown);
    }

    #[test]
    fn test_client_patch_merges_only_given_fields() {
        let mut c = client();
        c.apply_patch(&ClientPatch {
            phone: Some("03-0000-0000".into()),
            status: Some(ClientStatus::Inactive),
            ..Default::default()
        });
        assert_eq!(c.phone, "03-0000-0000");
        assert_eq!(c.status, ClientStatus::Inactive);
        assert_eq!(c.email, "taro@example.com");
        assert_eq!(c.pets_count, Some(2));
    }

    #[test]
    fn test_patch_serializes_only_present_fields() {
        let patch = PetPatch {
            weight_kg: Some(Some(4.2)),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, json!({"weight_kg": 4.2}));
        assert!(!patch.is_empty());
        assert!(PetPatch::default().is_empty());
    }

    #[test]
    fn test_patch_can_clear_nullable_fields() {
        let mut c = client();
        c.address = Some("Tokyo".into());
        let patch = ClientPatch {
            address: Some(None),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({"address": null}));

        c.apply_patch(&patch);
        assert!(c.address.is_none());

        // 未指定のままなら変更しない
        c.address = Some("Osaka".into());
        c.apply_patch(&ClientPatch::default());
        assert_eq!(c.address.as_deref(), Some("Osaka"));
    }

    #[test]
    fn test_patch_null_deserializes_as_clear() {
        let patch: PetPatch = serde_json::from_value(json!({"breed": null, "weight_kg": 3.5})).unwrap();
        assert_eq!(patch.breed, Some(None));
        assert_eq!(patch.weight_kg, Some(Some(3.5)));
        assert_eq!(patch.birth_date, None);
    }

    #[test]
    fn test_page_applied_page_prefers_server_value() {
        let page: Page<Client> =
            serde_json::from_value(json!({"data": [], "total": 12, "current_page": 2})).unwrap();
        assert_eq!(page.applied_page(9), 2);

        let page: Page<Client> = serde_json::from_value(json!({"data": []})).unwrap();
        assert_eq!(page.applied_page(3), 3);
    }

    #[test]
    fn test_client_search_fields() {
        let c = client();
        assert!(c.matches("yamada"));
        assert!(c.matches("090-1111"));
        assert!(c.matches("active"));
        assert!(!c.matches("pochi"));
    }

    #[test]
    fn test_client_cells() {
        let c = client();
        assert_eq!(c.cell("name"), CellValue::text("Yamada Taro"));
        assert_eq!(c.cell("pets_count"), CellValue::Number(2.0));
        assert!(matches!(c.cell("status"), CellValue::Status { ref code, .. } if code == "active"));
        assert_eq!(c.cell("address"), CellValue::Null);
        assert_eq!(c.cell("nope"), CellValue::Null);
    }

    #[test]
    fn test_pet_cells_and_vaccinations() {
        let pet: Pet = serde_json::from_value(json!({
            "id": 3, "client_id": 7, "name": "Pochi", "species": "dog",
            "breed": "Shiba", "owner_name": "Yamada Taro",
            "vaccinations": [
                {"id": 1, "vaccine": "狂犬病", "administered_on": "2026-04-01"},
                {"id": 2, "vaccine": "混合ワクチン"}
            ]
        }))
        .unwrap();
        assert_eq!(
            pet.cell("vaccinations"),
            CellValue::List(vec!["狂犬病 (2026-04-01)".into(), "混合ワクチン".into()])
        );
        assert_eq!(pet.cell("weight_kg"), CellValue::Null);
        assert!(pet.matches("shiba"));
        assert!(pet.matches("yamada"));
    }

    #[test]
    fn test_client_draft_validation() {
        let draft = ClientDraft {
            first_name: "Taro".into(),
            last_name: "".into(),
            email: "not-an-email".into(),
            phone: "090".into(),
            ..Default::default()
        };
        let errors = draft.validate();
        assert!(errors.contains_key("last_name"));
        assert!(errors.contains_key("email"));
        assert!(!errors.contains_key("first_name"));
        assert!(draft.check().is_err());
    }

    #[test]
    fn test_pet_draft_rejects_negative_weight() {
        let draft = PetDraft {
            client_id: 1,
            name: "Tama".into(),
            species: "cat".into(),
            weight_kg: Some(-1.0),
            ..Default::default()
        };
        assert_eq!(draft.validate().keys().collect::<Vec<_>>(), vec!["weight_kg"]);
    }

    #[test]
    fn test_registration_validation() {
        let reg = Registration {
            name: "Admin".into(),
            email: "admin@example.com".into(),
            password: "short".into(),
            password_confirmation: "different".into(),
        };
        let errors = reg.validate();
        assert!(errors.contains_key("password"));
        assert!(errors.contains_key("password_confirmation"));
        assert!(!errors.contains_key("email"));
    }

    #[test]
    fn test_user_completeness() {
        let user = User { id: 1, name: "A".into(), email: "a@example.com".into(), role: None };
        assert!(user.is_complete());
        let broken = User { id: 0, ..user.clone() };
        assert!(!broken.is_complete());
    }

    #[test]
    fn test_page_accepts_items_alias() {
        let page: Page<Breed> = serde_json::from_value(json!({
            "items": [{"id": 1, "name": "Shiba", "species": "dog"}]
        }))
        .unwrap();
        assert_eq!(page.data.len(), 1);
        assert!(page.total.is_none());
    }
}
