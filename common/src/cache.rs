//! 参照データキャッシュ
//!
//! 犬種リストのような変更頻度の低いデータを永続ストレージに置き、
//! 再起動後も再取得を省く。エントリはバージョン付きで、
//! 形式が合わない・壊れているものは未キャッシュとして扱う。

use crate::error::Result;
use crate::http::ApiClient;
use crate::models::Breed;
use crate::storage::KeyValueStorage;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

const KEY_PREFIX: &str = "lookup:";

/// キャッシュエントリ
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    /// バージョン（互換性チェック用）
    version: u32,
    value: Value,
}

/// 参照データキャッシュ
#[derive(Clone)]
pub struct LookupCache {
    storage: Arc<dyn KeyValueStorage>,
}

impl LookupCache {
    const CURRENT_VERSION: u32 = 1;

    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    fn storage_key(key: &str) -> String {
        format!("{}{}", KEY_PREFIX, key)
    }

    /// キャッシュをルックアップ
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.storage.get(&Self::storage_key(key))?;
        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(key, error = %e, "corrupted lookup entry ignored");
                return None;
            }
        };
        if entry.version != Self::CURRENT_VERSION {
            tracing::debug!(key, version = entry.version, "lookup entry version mismatch");
            return None;
        }
        serde_json::from_value(entry.value).ok()
    }

    /// キャッシュに保存
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let entry = CacheEntry {
            version: Self::CURRENT_VERSION,
            value: serde_json::to_value(value)?,
        };
        self.storage
            .set(&Self::storage_key(key), &serde_json::to_string(&entry)?)
    }

    /// キャッシュにあれば返し、無ければ取得して保存する
    ///
    /// 保存の失敗は取得結果に影響しない。
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, loader: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }
        let value = loader().await?;
        if let Err(e) = self.put(key, &value) {
            tracing::warn!(key, error = %e, "failed to store lookup entry");
        }
        Ok(value)
    }

    pub fn invalidate(&self, key: &str) {
        self.storage.remove(&Self::storage_key(key));
    }

    /// 参照データだけを全削除（セッション等には触れない）
    pub fn invalidate_all(&self) {
        for key in self.storage.keys() {
            if key.starts_with(KEY_PREFIX) {
                self.storage.remove(&key);
            }
        }
    }
}

/// 品種リストのキャッシュキー
pub fn breeds_key(species: &str) -> String {
    format!("breeds:{}", species.trim().to_lowercase())
}

/// 種類ごとの犬種・猫種リスト（キャッシュ経由）
pub async fn fetch_breeds(api: &ApiClient, cache: &LookupCache, species: &str) -> Result<Vec<Breed>> {
    let key = breeds_key(species);
    let species = species.trim().to_lowercase();
    let query = [("species", species)];
    cache
        .get_or_fetch(&key, move || async move {
            let response = api.get::<Vec<Breed>>("/breeds", &query).await?;
            Ok(response.data.unwrap_or_default())
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::storage::MemoryStorage;
    use crate::testing::{envelope, MockTransport};
    use serde_json::json;

    fn cache(storage: &MemoryStorage) -> LookupCache {
        LookupCache::new(Arc::new(storage.clone()))
    }

    #[tokio::test]
    async fn test_breeds_fetched_once_then_served_from_storage() {
        let storage = MemoryStorage::new();
        let mock = MockTransport::new();
        mock.respond(
            "GET /breeds",
            200,
            envelope(200, "", json!([{"id": 1, "name": "Shiba", "species": "dog"}])),
        );
        let api = ApiClient::new(mock.clone());

        let first = fetch_breeds(&api, &cache(&storage), "Dog").await.unwrap();
        let second = fetch_breeds(&api, &cache(&storage), "dog").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(mock.count("GET /breeds"), 1);
        assert_eq!(mock.requests()[0].query, vec![("species".to_string(), "dog".to_string())]);
    }

    #[test]
    fn test_version_mismatch_is_a_miss() {
        let storage = MemoryStorage::new();
        storage
            .set("lookup:breeds:cat", r#"{"version": 0, "value": []}"#)
            .unwrap();
        let cache = cache(&storage);

        assert!(cache.get::<Vec<Breed>>("breeds:cat").is_none());
    }

    #[test]
    fn test_corrupted_entry_is_a_miss() {
        let storage = MemoryStorage::new();
        storage.set("lookup:breeds:cat", "{not json").unwrap();

        assert!(cache(&storage).get::<Vec<Breed>>("breeds:cat").is_none());
    }

    #[tokio::test]
    async fn test_loader_error_is_not_cached() {
        let storage = MemoryStorage::new();
        let cache = cache(&storage);

        let result: Result<Vec<Breed>> = cache
            .get_or_fetch("breeds:dog", || async { Err(Error::Network("offline".into())) })
            .await;

        assert!(result.is_err());
        assert!(storage.keys().is_empty());
    }

    #[test]
    fn test_invalidate_all_keeps_session_keys() {
        let storage = MemoryStorage::new();
        storage.set("token", "abc").unwrap();
        let cache = cache(&storage);
        cache.put("breeds:dog", &vec!["Shiba"]).unwrap();
        cache.put("breeds:cat", &vec!["Mike"]).unwrap();

        cache.invalidate("breeds:dog");
        assert!(cache.get::<Vec<String>>("breeds:dog").is_none());
        assert!(cache.get::<Vec<String>>("breeds:cat").is_some());

        cache.invalidate_all();
        assert_eq!(storage.keys(), vec!["token".to_string()]);
    }
}
