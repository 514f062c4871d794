//! Bounded, insertion-ordered memory of topics already delivered.

use std::collections::{HashSet, VecDeque};

use crate::ingest::types::{title_key, CandidateTopic};

pub const DEFAULT_HISTORY_CAP: usize = 100;

#[derive(Debug, Clone)]
pub struct SeenHistory {
    order: VecDeque<String>,
    keys: HashSet<String>,
    cap: usize,
}

impl Default for SeenHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAP)
    }
}

impl SeenHistory {
    /// `cap` of 0 is treated as 1.
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            order: VecDeque::with_capacity(cap.min(10_000)),
            keys: HashSet::with_capacity(cap.min(10_000)),
            cap,
        }
    }

    pub fn contains(&self, title: &str) -> bool {
        self.keys.contains(&title_key(title))
    }

    /// Topics whose case-folded title has not been seen. Does not mutate.
    pub fn filter_novel(&self, topics: &[CandidateTopic]) -> Vec<CandidateTopic> {
        topics
            .iter()
            .filter(|t| !self.keys.contains(&t.key()))
            .cloned()
            .collect()
    }

    /// Remember a delivered title. A title that is already present keeps its
    /// original position; otherwise the oldest entries are evicted while the
    /// history is over its cap.
    pub fn mark_seen(&mut self, title: &str) {
        let key = title_key(title);
        if !self.keys.insert(key.clone()) {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.cap {
            if let Some(oldest) = self.order.pop_front() {
                self.keys.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }
}
