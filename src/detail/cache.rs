//! Time-bounded cache of consignment timelines.
//!
//! Entries are checked lazily on read: an entry older than the TTL is
//! treated as absent and is never returned. Nothing sweeps the map in the
//! background; [`DetailCache::purge_expired`] and an optional entry cap are
//! available for longer-lived owners.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::types::ActivityRecord;

/// How long a fetched timeline stays fresh
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    records: Arc<[ActivityRecord]>,
    fetched_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

#[derive(Debug, Clone)]
pub struct DetailCache {
    ttl: Duration,
    max_entries: Option<usize>,
    entries: HashMap<String, CacheEntry>,
}

impl Default for DetailCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl DetailCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            max_entries: None,
            entries: HashMap::new(),
        }
    }

    /// Cap the number of entries; the oldest entry is evicted to make room.
    pub fn with_max_entries(mut self, max_entries: Option<usize>) -> Self {
        self.max_entries = max_entries.map(|n| n.max(1));
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The records for `key` if they were fetched less than one TTL ago.
    pub fn get(&self, key: &str, now: Instant) -> Option<Arc<[ActivityRecord]>> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| Arc::clone(&entry.records))
    }

    /// When the entry for `key` stops being fresh, whether or not it already has.
    pub fn expires_at(&self, key: &str) -> Option<Instant> {
        self.entries.get(key).map(|entry| entry.fetched_at + self.ttl)
    }

    pub fn contains_fresh(&self, key: &str, now: Instant) -> bool {
        self.get(key, now).is_some()
    }

    /// Store `records` for `key` as fetched at `now`, replacing any entry.
    pub fn insert(&mut self, key: impl Into<String>, records: Vec<ActivityRecord>, now: Instant) {
        let key = key.into();
        if let Some(max) = self.max_entries
            && !self.entries.contains_key(&key)
            && self.entries.len() >= max
        {
            self.evict_oldest();
        }
        self.entries.insert(
            key,
            CacheEntry {
                records: records.into(),
                fetched_at: now,
            },
        );
    }

    /// Drop every entry that is no longer fresh. Returns how many were removed.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.is_fresh(now, ttl));
        before - self.entries.len()
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.fetched_at)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }

    /// Number of stored entries, fresh or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
