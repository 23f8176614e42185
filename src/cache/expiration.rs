//! Per-tier cache expiration.
//!
//! Each tier cache has exactly one [`ExpirationManager`] owning that tier's
//! `request key -> last-touched` timestamps. Touches are recorded once per
//! successful cache population; staleness is never re-checked on the read
//! path. A periodic sweep removes entries over the policy's age limit, then
//! trims oldest-first down to the entry limit.
//!
//! A removal always deletes the cached entry before its timestamp, so the
//! two can never desynchronize: if the store rejects a removal, the
//! timestamp stays and the sweep aborts with the error (the next sweep
//! retries).
//!
//! Timestamps use `tokio::time::Instant`, which follows the runtime's
//! paused clock in tests.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::CacheError;
use crate::profile::CachePolicy;

use super::store::CacheStore;

// =============================================================================
// ExpirationManager
// =============================================================================

/// Tracks last-touched timestamps for one tier cache and evicts entries
/// exceeding the tier's [`CachePolicy`].
pub struct ExpirationManager {
    cache_name: String,
    policy: CachePolicy,
    timestamps: Mutex<HashMap<String, Instant>>,
}

impl ExpirationManager {
    /// Create a manager for the named cache under the given policy.
    pub fn new(cache_name: impl Into<String>, policy: CachePolicy) -> Self {
        Self {
            cache_name: cache_name.into(),
            policy,
            timestamps: Mutex::new(HashMap::new()),
        }
    }

    /// Name of the cache this manager owns timestamps for.
    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    /// The eviction policy in force.
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Record that the key was just (re)populated.
    ///
    /// Called exactly once per successful cache store. An aborted request
    /// never reaches this point, so the timestamp map stays consistent with
    /// the cache contents.
    pub async fn record_touch(&self, key: &str) {
        self.timestamps
            .lock()
            .await
            .insert(key.to_string(), Instant::now());
    }

    /// Number of keys currently tracked.
    pub async fn tracked(&self) -> usize {
        self.timestamps.lock().await.len()
    }

    /// Evict entries over the age limit, then trim oldest-first down to the
    /// entry limit. Returns how many entries were removed.
    pub async fn sweep<S: CacheStore>(
        &self,
        store: &S,
        handle: &S::Handle,
    ) -> Result<usize, CacheError> {
        let mut timestamps = self.timestamps.lock().await;
        let now = Instant::now();

        let mut doomed: Vec<(String, Instant)> = Vec::new();
        let mut live: Vec<(String, Instant)> = Vec::new();
        for (key, touched) in timestamps.iter() {
            if now.duration_since(*touched) > self.policy.max_age {
                doomed.push((key.clone(), *touched));
            } else {
                live.push((key.clone(), *touched));
            }
        }

        if live.len() > self.policy.max_entries {
            live.sort_by_key(|(_, touched)| *touched);
            let overflow = live.len() - self.policy.max_entries;
            doomed.extend(live.drain(..overflow));
        }

        let mut removed = 0;
        for (key, _) in doomed {
            // Entry first, timestamp second: a failed removal leaves the
            // timestamp for the next sweep.
            store.remove(handle, &key).await?;
            timestamps.remove(&key);
            removed += 1;
        }

        Ok(removed)
    }
}

// =============================================================================
// Tests
// =============================================================================
