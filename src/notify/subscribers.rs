// src/notify/subscribers.rs
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

/// In-memory set of chat ids that receive suggestions. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct SubscriberRegistry {
    inner: Arc<RwLock<BTreeSet<i64>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if already subscribed.
    pub fn add(&self, chat_id: i64) -> bool {
        self.inner
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(chat_id)
    }

    /// Returns false if not subscribed.
    pub fn remove(&self, chat_id: i64) -> bool {
        self.inner
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&chat_id)
    }

    pub fn contains(&self, chat_id: i64) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&chat_id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<i64> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .copied()
            .collect()
    }
}
