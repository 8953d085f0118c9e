//! スレッドの解決状態フィルタ
//!
//! `matching_indices` は元リストへのインデックスを返すので、
//! ブラウザ側は全スレッドを保持したまま表示対象だけを切り替えられる。

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::github::Thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    All,
    Unresolved,
    Resolved,
    /// Resolved with at most the opening comment (nobody replied)
    ResolvedNoReply,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid --status {0:?} (expected all|unresolved|resolved|resolved-no-reply)")]
pub struct ParseFilterModeError(pub String);

impl FilterMode {
    pub const ALL_MODES: [FilterMode; 4] = [
        FilterMode::All,
        FilterMode::Unresolved,
        FilterMode::Resolved,
        FilterMode::ResolvedNoReply,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterMode::All => "all",
            FilterMode::Unresolved => "unresolved",
            FilterMode::Resolved => "resolved",
            FilterMode::ResolvedNoReply => "resolved-no-reply",
        }
    }

    /// all → unresolved → resolved → resolved-no-reply → all
    pub fn next(self) -> Self {
        match self {
            FilterMode::All => FilterMode::Unresolved,
            FilterMode::Unresolved => FilterMode::Resolved,
            FilterMode::Resolved => FilterMode::ResolvedNoReply,
            FilterMode::ResolvedNoReply => FilterMode::All,
        }
    }

    pub fn matches(self, thread: &Thread) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Unresolved => !thread.is_resolved,
            FilterMode::Resolved => thread.is_resolved,
            FilterMode::ResolvedNoReply => thread.is_resolved && thread.comments().len() <= 1,
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = ParseFilterModeError;

    /// Case-insensitive; surrounding whitespace is ignored and an empty value means `all`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if normalized.is_empty() {
            return Ok(FilterMode::All);
        }
        FilterMode::ALL_MODES
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| ParseFilterModeError(s.to_string()))
    }
}

/// Threads matching `mode`, in their original order.
pub fn filter_threads(threads: &[Thread], mode: FilterMode) -> Vec<&Thread> {
    threads.iter().filter(|t| mode.matches(t)).collect()
}

/// Indices into `threads` of the threads matching `mode`, ascending.
pub fn matching_indices(threads: &[Thread], mode: FilterMode) -> Vec<usize> {
    if mode == FilterMode::All {
        return (0..threads.len()).collect();
    }
    threads
        .iter()
        .enumerate()
        .filter(|(_, t)| mode.matches(t))
        .map(|(i, _)| i)
        .collect()
}
