//! トースト通知キュー
//!
//! 追加順に並ぶ一時的なメッセージ。タイムアウト付きのものは
//! `Scheduler` 経由で自動的に取り除かれる。

use crate::observe::Listeners;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// 既定の表示時間
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// プロセス全体で一意なIDを払い出す
static NEXT_TOAST_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(u64);

impl std::fmt::Display for ToastId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "toast-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastScheme {
    Primary,
    Success,
    Danger,
    Warning,
}

impl ToastScheme {
    pub fn css_class(&self) -> &'static str {
        match self {
            ToastScheme::Primary => "toast-primary",
            ToastScheme::Success => "toast-success",
            ToastScheme::Danger => "toast-danger",
            ToastScheme::Warning => "toast-warning",
        }
    }
}

/// 単一文字列または複数行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToastMessage {
    Text(String),
    Lines(Vec<String>),
}

impl ToastMessage {
    /// どちらの形でも行の並びとして扱う
    pub fn lines(&self) -> Vec<&str> {
        match self {
            ToastMessage::Text(text) => vec![text.as_str()],
            ToastMessage::Lines(lines) => lines.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for ToastMessage {
    fn from(value: &str) -> Self {
        ToastMessage::Text(value.to_string())
    }
}

impl From<String> for ToastMessage {
    fn from(value: String) -> Self {
        ToastMessage::Text(value)
    }
}

impl From<Vec<String>> for ToastMessage {
    fn from(value: Vec<String>) -> Self {
        ToastMessage::Lines(value)
    }
}

/// キュー内のトースト
#[derive(Debug, Clone, PartialEq)]
pub struct ToastItem {
    pub id: ToastId,
    pub scheme: ToastScheme,
    pub title: String,
    pub message: ToastMessage,
    pub timeout: Option<Duration>,
}

/// 追加するトーストの内容
#[derive(Debug, Clone, PartialEq)]
pub struct ToastSpec {
    pub scheme: ToastScheme,
    pub title: String,
    pub message: ToastMessage,
    pub timeout: Option<Duration>,
}

impl ToastSpec {
    pub fn new(scheme: ToastScheme, title: &str, message: impl Into<ToastMessage>) -> Self {
        Self {
            scheme,
            title: title.to_string(),
            message: message.into(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    pub fn info(title: &str, message: impl Into<ToastMessage>) -> Self {
        Self::new(ToastScheme::Primary, title, message)
    }

    pub fn success(title: &str, message: impl Into<ToastMessage>) -> Self {
        Self::new(ToastScheme::Success, title, message)
    }

    pub fn danger(title: &str, message: impl Into<ToastMessage>) -> Self {
        Self::new(ToastScheme::Danger, title, message)
    }

    pub fn warning(title: &str, message: impl Into<ToastMessage>) -> Self {
        Self::new(ToastScheme::Warning, title, message)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// 手動で閉じるまで残す
    pub fn sticky(mut self) -> Self {
        self.timeout = None;
        self
    }
}

/// 遅延実行の手段（ブラウザではタイマー）
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send + 'static>);
}

#[derive(Clone, Default)]
pub struct ToastQueue {
    items: Arc<Mutex<Vec<ToastItem>>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    listeners: Listeners,
}

impl ToastQueue {
    /// 自動消去なし（CLIなど）
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scheduler(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            scheduler: Some(scheduler),
            ..Self::default()
        }
    }

    pub fn add(&self, spec: ToastSpec) -> ToastId {
        let id = ToastId(NEXT_TOAST_ID.fetch_add(1, Ordering::Relaxed));
        let timeout = spec.timeout;

        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ToastItem {
                id,
                scheme: spec.scheme,
                title: spec.title,
                message: spec.message,
                timeout,
            });
        self.listeners.notify();

        if let (Some(delay), Some(scheduler)) = (timeout, &self.scheduler) {
            let queue = self.clone();
            scheduler.schedule(delay, Box::new(move || {
                queue.remove(id);
            }));
        }

        id
    }

    /// 既に消えているIDなら何もしない
    pub fn remove(&self, id: ToastId) -> bool {
        let removed = {
            let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
            let before = items.len();
            items.retain(|item| item.id != id);
            items.len() != before
        };
        if removed {
            self.listeners.notify();
        }
        removed
    }

    pub fn clear(&self) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.listeners.notify();
    }

    /// 追加順のスナップショット
    pub fn items(&self) -> Vec<ToastItem> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 登録されたタスクを手動で実行するスケジューラ
    #[derive(Default)]
    struct ManualScheduler {
        tasks: Mutex<Vec<(Duration, Box<dyn FnOnce() + Send + 'static>)>>,
    }

    impl Scheduler for ManualScheduler {
        fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send + 'static>) {
            self.tasks.lock().unwrap().push((delay, task));
        }
    }

    impl ManualScheduler {
        fn run_all(&self) -> Vec<Duration> {
            let tasks: Vec<_> = self.tasks.lock().unwrap().drain(..).collect();
            tasks
                .into_iter()
                .map(|(delay, task)| {
                    task();
                    delay
                })
                .collect()
        }
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let queue = ToastQueue::new();
        let a = queue.add(ToastSpec::info("1", "first"));
        let b = queue.add(ToastSpec::success("2", "second"));
        let c = queue.add(ToastSpec::danger("3", "third"));

        let ids: Vec<ToastId> = queue.items().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![a, b, c]);
        assert!(a != b && b != c);
    }

    #[test]
    fn test_ids_unique_across_queues() {
        let q1 = ToastQueue::new();
        let q2 = ToastQueue::new();
        let a = q1.add(ToastSpec::info("a", "a"));
        let b = q2.add(ToastSpec::info("b", "b"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let queue = ToastQueue::new();
        let a = queue.add(ToastSpec::info("a", "a"));
        let b = queue.add(ToastSpec::info("b", "b"));

        assert!(queue.remove(a));
        let after_first = queue.items();
        assert!(!queue.remove(a));
        assert_eq!(queue.items(), after_first);
        assert_eq!(queue.items()[0].id, b);
    }

    #[test]
    fn test_timeout_schedules_removal() {
        let scheduler = Arc::new(ManualScheduler::default());
        let queue = ToastQueue::with_scheduler(scheduler.clone());

        let timed = queue.add(ToastSpec::warning("w", "expires").with_timeout(Duration::from_millis(1500)));
        let sticky = queue.add(ToastSpec::danger("d", "stays").sticky());
        assert_eq!(queue.len(), 2);

        let delays = scheduler.run_all();
        assert_eq!(delays, vec![Duration::from_millis(1500)]);
        assert_eq!(queue.items().iter().map(|t| t.id).collect::<Vec<_>>(), vec![sticky]);
        assert!(!queue.remove(timed));
    }

    #[test]
    fn test_expiry_after_manual_dismiss_is_noop() {
        let scheduler = Arc::new(ManualScheduler::default());
        let queue = ToastQueue::with_scheduler(scheduler.clone());
        let id = queue.add(ToastSpec::info("i", "x"));
        queue.remove(id);
        scheduler.run_all();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_message_shapes_render_uniformly() {
        let single: ToastMessage = "保存しました".into();
        let multi: ToastMessage = vec!["名前: 必須です".to_string(), "メール: 形式が不正".to_string()].into();
        assert_eq!(single.lines(), vec!["保存しました"]);
        assert_eq!(multi.lines().len(), 2);

        let json: ToastMessage = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(json, ToastMessage::Lines(vec!["a".into(), "b".into()]));
    }
}
