//! 一覧・詳細の表示状態とURLクエリの相互変換（`?tab=pets&id=4`）

use crate::models::EntityId;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Clients,
    Pets,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Clients, Tab::Pets];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Clients => "clients",
            Tab::Pets => "pets",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Clients => "飼い主",
            Tab::Pets => "ペット",
        }
    }
}

impl std::str::FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clients" => Ok(Tab::Clients),
            "pets" => Ok(Tab::Pets),
            _ => Err(format!("Unknown tab: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DetailRoute {
    pub tab: Tab,
    /// 詳細表示中のエンティティ
    pub id: Option<EntityId>,
}

impl DetailRoute {
    pub fn list(tab: Tab) -> Self {
        Self { tab, id: None }
    }

    pub fn detail(tab: Tab, id: EntityId) -> Self {
        Self { tab, id: Some(id) }
    }

    /// クエリ文字列から復元する（先頭の `?` は有っても無くてもよい）
    ///
    /// 不明なタブや不正なIDは無視して既定値にする。
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut route = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "tab" => route.tab = value.parse().unwrap_or_default(),
                "id" => route.id = value.parse::<EntityId>().ok().filter(|id| *id > 0),
                _ => {}
            }
        }
        route
    }

    pub fn to_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.append_pair("tab", self.tab.as_str());
        if let Some(id) = self.id {
            serializer.append_pair("id", &id.to_string());
        }
        format!("?{}", serializer.finish())
    }
}
