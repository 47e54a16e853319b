//! Playback history tracking
//!
//! Keeps the URLs a session has played, most recent last, for `previous`
//! navigation and for filtering already-played tracks out of an undone shuffle.

use std::collections::VecDeque;

/// Played URLs with bounded size
///
/// Once full, the oldest entry is discarded on every push.
#[derive(Debug, Clone)]
pub struct History {
    /// History buffer (most recent = back)
    urls: VecDeque<String>,

    /// Maximum history size
    max_size: usize,

    /// Pushes minus pops since the last clear; unaffected by eviction
    pushed: u64,
}

impl History {
    /// Create new history with specified maximum size
    ///
    /// A size below 2 is raised to 2 so `previous` stays possible.
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(2);
        Self {
            urls: VecDeque::with_capacity(max_size.min(256)),
            max_size,
            pushed: 0,
        }
    }

    /// Record a played URL
    pub fn push(&mut self, url: String) {
        if self.urls.len() >= self.max_size {
            self.urls.pop_front();
        }
        self.urls.push_back(url);
        self.pushed += 1;
    }

    /// Most recent URL (the one playing, while a track plays)
    pub fn last(&self) -> Option<&str> {
        self.urls.back().map(String::as_str)
    }

    /// Pop most recent URL
    pub fn pop(&mut self) -> Option<String> {
        let url = self.urls.pop_back()?;
        self.pushed = self.pushed.saturating_sub(1);
        Some(url)
    }

    /// Position marker for [`History::played_since`]
    pub fn mark(&self) -> u64 {
        self.pushed
    }

    /// URLs pushed after `mark` was taken, oldest first
    ///
    /// Entries already evicted by the size bound are not returned.
    pub fn played_since(&self, mark: u64) -> impl Iterator<Item = &str> {
        let newer = usize::try_from(self.pushed.saturating_sub(mark)).unwrap_or(usize::MAX);
        let skip = self.urls.len().saturating_sub(newer);
        self.urls.iter().skip(skip).map(String::as_str)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.iter().any(|u| u == url)
    }

    /// Copy of all URLs (oldest first)
    pub fn snapshot(&self) -> Vec<String> {
        self.urls.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn clear(&mut self) {
        self.urls.clear();
        self.pushed = 0;
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(100)
    }
}
