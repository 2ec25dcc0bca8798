//! ブラウザ側の実装（localStorage・タイマー・コンソール）

use gloo::storage::{LocalStorage, Storage};
use gloo::timers::callback::Timeout;
use petcare_common::{Error, KeyValueStorage, Result, Scheduler};
use std::time::Duration;

/// localStorage
pub struct BrowserStorage;

impl KeyValueStorage for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        LocalStorage::raw().get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|e| Error::Storage(format!("{:?}", e)))
    }

    fn remove(&self, key: &str) {
        let _ = LocalStorage::raw().remove_item(key);
    }

    fn keys(&self) -> Vec<String> {
        let storage = LocalStorage::raw();
        let length = storage.length().unwrap_or(0);
        (0..length)
            .filter_map(|i| storage.key(i).ok().flatten())
            .collect()
    }
}

/// トーストの自動消去用タイマー
pub struct TimerScheduler;

impl Scheduler for TimerScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send + 'static>) {
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        Timeout::new(millis, task).forget();
    }
}

pub fn log_error(context: &str, message: &str) {
    web_sys::console::error_1(&format!("[petcare] {}: {}", context, message).into());
}
