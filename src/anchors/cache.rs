//! Fallback timestamps for sessions that have no persisted opening stamp.

use crate::domain::{Coin, SessionKey, TimeMs};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

/// Keyed store of the last opening timestamp handed out per `(session, window, pivot)`.
pub trait OpeningTsCache: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Option<TimeMs>;
    fn set(&self, key: &str, ts: TimeMs);
}

/// Cache key in the form `session|window|pivot`.
pub fn opening_cache_key(session: &SessionKey, window: &str, pivot: &Coin) -> String {
    format!("{}|{}|{}", session, window, pivot)
}

/// Process-lifetime cache; share one instance through an `Arc`.
///
/// Entries are never evicted. Concurrent writers for the same key race and
/// the last write wins.
#[derive(Debug, Default)]
pub struct InMemoryOpeningTsCache {
    entries: RwLock<HashMap<String, TimeMs>>,
}

impl InMemoryOpeningTsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        match self.entries.write() {
            Ok(mut m) => m.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl OpeningTsCache for InMemoryOpeningTsCache {
    fn get(&self, key: &str) -> Option<TimeMs> {
        match self.entries.read() {
            Ok(m) => m.get(key).copied(),
            Err(poisoned) => poisoned.into_inner().get(key).copied(),
        }
    }

    fn set(&self, key: &str, ts: TimeMs) {
        match self.entries.write() {
            Ok(mut m) => {
                m.insert(key.to_string(), ts);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(key.to_string(), ts);
            }
        }
    }
}
