//! モーダルスタック
//!
//! 開いた順に積み、閉じるときは常に最上段を取り除く（LIFO）。
//! 表示されるのは最上段のみで、閉じると直前のモーダルが再び現れる。

use crate::observe::Listeners;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone)]
pub struct ModalStack<C> {
    entries: Arc<Mutex<Vec<C>>>,
    listeners: Listeners,
}

impl<C> Default for ModalStack<C> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            listeners: Listeners::default(),
        }
    }
}

impl<C: Clone> ModalStack<C> {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<C>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 積んだ後の段数を返す
    pub fn open(&self, content: C) -> usize {
        let depth = {
            let mut entries = self.entries();
            entries.push(content);
            entries.len()
        };
        self.listeners.notify();
        depth
    }

    /// 最上段を閉じる
    pub fn close(&self) -> Option<C> {
        let closed = self.entries().pop();
        if closed.is_some() {
            self.listeners.notify();
        }
        closed
    }

    /// 閉じた段数を返す
    pub fn close_all(&self) -> usize {
        let count = {
            let mut entries = self.entries();
            let count = entries.len();
            entries.clear();
            count
        };
        if count > 0 {
            self.listeners.notify();
        }
        count
    }

    pub fn top(&self) -> Option<C> {
        self.entries().last().cloned()
    }

    pub fn depth(&self) -> usize {
        self.entries().len()
    }

    pub fn is_open(&self) -> bool {
        self.depth() > 0
    }

    /// 開いた順のスナップショット
    pub fn entries_snapshot(&self) -> Vec<C> {
        self.entries().clone()
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }
}
