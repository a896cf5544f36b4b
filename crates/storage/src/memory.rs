//! In-process storage backed by a concurrent hash map

use dashmap::DashMap;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use stowage_core::{Error, FromParams, Result, Storage, StorageParams, KEY_PREFIX_PARAM};

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Value,
    inserted_at: Instant,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Memory storage
///
/// Recognized parameters: `key_prefix` (string) and `max_entries`
/// (positive integer, unbounded when absent; `0` is rejected).
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, MemoryEntry>,
    key_prefix: String,
    max_entries: Option<NonZeroUsize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(max_entries: NonZeroUsize) -> Self {
        Self {
            max_entries: Some(max_entries),
            ..Self::default()
        }
    }

    /// Number of stored entries, including ones that expired but were not
    /// yet purged
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            tracing::debug!(purged, "Purged expired memory entries");
        }
        purged
    }

    fn make_room(&self, incoming: &str) {
        let Some(max) = self.max_entries.map(NonZeroUsize::get) else {
            return;
        };
        if self.entries.contains_key(incoming) || self.entries.len() < max {
            return;
        }

        self.purge_expired();

        while self.entries.len() >= max {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().inserted_at)
                .map(|entry| entry.key().clone());
            match oldest {
                Some(key) => {
                    tracing::debug!(key = %key, "Evicting oldest memory entry");
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

impl FromParams for MemoryStorage {
    fn from_params(params: StorageParams) -> Result<Self> {
        let max_entries = match params.get_u64("max_entries")? {
            None => None,
            Some(n) => Some(
                NonZeroUsize::new(usize::try_from(n).unwrap_or(usize::MAX)).ok_or_else(|| {
                    Error::configuration("parameter 'max_entries' must be greater than zero")
                })?,
            ),
        };
        Ok(Self {
            entries: DashMap::new(),
            key_prefix: params
                .get_str(KEY_PREFIX_PARAM)?
                .unwrap_or_default()
                .to_string(),
            max_entries,
        })
    }
}

impl Storage for MemoryStorage {
    fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    fn set_key_prefix(&mut self, prefix: String) {
        self.key_prefix = prefix;
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        let full_key = self.prefixed_key(key)?;
        let now = Instant::now();

        match self.entries.get(&full_key) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
        }
        // The read guard must be gone before removing from the same shard
        self.entries
            .remove_if(&full_key, |_, entry| entry.is_expired(now));
        Ok(None)
    }

    fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        let full_key = self.prefixed_key(key)?;
        self.make_room(&full_key);

        let now = Instant::now();
        self.entries.insert(
            full_key,
            MemoryEntry {
                value,
                inserted_at: now,
                expires_at: ttl.and_then(|ttl| now.checked_add(ttl)),
            },
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let full_key = self.prefixed_key(key)?;
        let now = Instant::now();
        Ok(self
            .entries
            .remove(&full_key)
            .is_some_and(|(_, entry)| !entry.is_expired(now)))
    }

    fn clear(&self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}
