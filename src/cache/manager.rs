//! TTL cache over a persistent [`Storage`]
//!
//! Entries are stored as JSON `{ "data": .., "timestamp": <epoch ms> }` under
//! `prefix + key`. An entry is valid while `now - timestamp <= ttl`; expired
//! entries are deleted on read. Storage and parse faults are logged and the
//! cache behaves as if empty; nothing is propagated to callers.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::storage::Storage;
use crate::config::CacheConfig;

/// Serialized form of a cache entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached payload
    pub data: Value,
    /// When the payload was written, in epoch milliseconds
    pub timestamp: i64,
}

impl CacheEntry {
    /// Milliseconds since the entry was written, clamped at zero.
    pub fn age_ms(&self, now_ms: i64) -> u64 {
        now_ms.saturating_sub(self.timestamp).max(0) as u64
    }

    pub fn is_valid(&self, now_ms: i64, ttl: Duration) -> bool {
        u128::from(self.age_ms(now_ms)) <= ttl.as_millis()
    }
}

/// Source of the current time in epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Cache interface handed to [`crate::refresh::CachedFetcher`]
pub trait CacheProvider: Send + Sync {
    /// Valid data for `key`, or `None` if missing, expired or unreadable
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores `data` stamped with the current time; faults are only logged
    fn set(&self, key: &str, data: &Value);

    fn clear(&self, key: &str);

    /// Removes every entry under this cache's prefix
    fn clear_all(&self);
}

/// Namespaced TTL cache
pub struct TtlCache<S> {
    storage: S,
    clock: Arc<dyn Clock>,
    prefix: String,
    ttl: Duration,
}

impl<S: Storage> TtlCache<S> {
    /// Creates a cache with the configured prefix and TTL, using wall-clock time
    pub fn new(storage: S, config: &CacheConfig) -> Self {
        Self::with_clock(storage, config, Arc::new(SystemClock))
    }

    /// Creates a cache with a custom clock
    pub fn with_clock(storage: S, config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            prefix: config.prefix.clone(),
            ttl: config.ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Reads the raw entry regardless of expiry
    ///
    /// Returns `None` if the entry is missing or cannot be parsed.
    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        let full_key = self.namespaced(key);
        let raw = match self.storage.get_item(&full_key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = %full_key, error = %e, "cache read failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key = %full_key, error = %e, "corrupt cache entry");
                None
            }
        }
    }

    /// Logical keys (prefix stripped) currently held in storage
    pub fn keys(&self) -> Vec<String> {
        match self.storage.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter_map(|k| k.strip_prefix(&self.prefix).map(str::to_string))
                .collect(),
            Err(e) => {
                warn!(error = %e, "cache key listing failed");
                Vec::new()
            }
        }
    }

    fn remove(&self, full_key: &str) {
        if let Err(e) = self.storage.remove_item(full_key) {
            warn!(key = %full_key, error = %e, "cache delete failed");
        }
    }
}

impl<S: Storage> CacheProvider for TtlCache<S> {
    fn get(&self, key: &str) -> Option<Value> {
        let entry = self.entry(key)?;
        let now = self.clock.now_ms();

        if entry.is_valid(now, self.ttl) {
            debug!(key, age_ms = entry.age_ms(now), "cache hit");
            Some(entry.data)
        } else {
            debug!(key, age_ms = entry.age_ms(now), "cache entry expired");
            self.remove(&self.namespaced(key));
            None
        }
    }

    fn set(&self, key: &str, data: &Value) {
        let full_key = self.namespaced(key);
        let entry = CacheEntry {
            data: data.clone(),
            timestamp: self.clock.now_ms(),
        };

        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(e) => {
                warn!(key = %full_key, error = %e, "cache entry not serializable");
                return;
            }
        };

        match self.storage.set_item(&full_key, &json) {
            Ok(()) => debug!(key, "cache updated"),
            Err(e) => warn!(key = %full_key, error = %e, "cache write failed"),
        }
    }

    fn clear(&self, key: &str) {
        self.remove(&self.namespaced(key));
    }

    fn clear_all(&self) {
        let keys = match self.storage.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "cache key listing failed");
                return;
            }
        };

        for key in keys.iter().filter(|k| k.starts_with(&self.prefix)) {
            self.remove(key);
        }
    }
}
