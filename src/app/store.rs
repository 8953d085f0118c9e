use tracing::debug;

use crate::filter::{matching_indices, FilterMode};
use crate::github::Thread;

/// 取得済みの全スレッドと、現在のフィルタで見えているサブセット
#[derive(Debug, Clone, Default)]
pub struct ThreadStore {
    threads: Vec<Thread>,
    /// `threads` へのインデックス（昇順）
    visible: Vec<usize>,
    mode: FilterMode,
}

impl ThreadStore {
    pub fn new(threads: Vec<Thread>, mode: FilterMode) -> Self {
        let visible = matching_indices(&threads, mode);
        Self {
            threads,
            visible,
            mode,
        }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// `index`番目の表示対象スレッド
    pub fn visible(&self, index: usize) -> Option<&Thread> {
        self.visible.get(index).and_then(|&i| self.threads.get(i))
    }

    pub fn visible_threads(&self) -> impl Iterator<Item = &Thread> {
        self.visible.iter().filter_map(|&i| self.threads.get(i))
    }

    /// Switch filter and recompute the visible subset. Returns the new visible count.
    pub fn set_mode(&mut self, mode: FilterMode) -> usize {
        self.mode = mode;
        self.visible = matching_indices(&self.threads, mode);
        debug!(%mode, visible = self.visible.len(), total = self.threads.len(), "filter applied");
        self.visible.len()
    }
}
