//! セッションファイル
//!
//! 認証トークンと参照データキャッシュを1つのJSONファイルに保存する。
//! 書き込みのたびにファイル全体を書き直す。

use crate::config::Config;
use crate::error::Result;
use petcare_common::KeyValueStorage;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

const SESSION_FILE_NAME: &str = "session.json";

pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// 読み込み（壊れたファイルは空として扱う）
    pub fn open(path: &Path) -> Self {
        let entries = std::fs::read_to_string(path)
            .ok()
            .and_then(|content| match serde_json::from_str(&content) {
                Ok(entries) => Some(entries),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "session file is corrupted, starting empty");
                    None
                }
            })
            .unwrap_or_default();

        Self {
            path: path.to_path_buf(),
            entries: Mutex::new(entries),
        }
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Config::config_dir()?.join(SESSION_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> petcare_common::Result<()> {
        let mut entries = self.entries();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
            .map_err(|e| petcare_common::Error::Storage(e.to_string()))
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries();
        if entries.remove(key).is_some() {
            if let Err(e) = self.flush(&entries) {
                tracing::warn!(key, error = %e, "failed to persist session removal");
            }
        }
    }

    fn keys(&self) -> Vec<String> {
        self.entries().keys().cloned().collect()
    }
}

