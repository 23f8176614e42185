//! Process-wide tier cache context.
//!
//! [`TierCaches`] is constructed once at startup and handed to the
//! dispatcher and the sweep scheduler. It owns the cache store plus one
//! [`ExpirationManager`] per tier; nothing else holds per-tier eviction
//! state. Managers never touch another tier's timestamps.

use std::sync::Arc;

use crate::error::CacheError;
use crate::profile::ProfileTable;
use crate::tier::NetworkTier;

use super::expiration::ExpirationManager;
use super::store::CacheStore;

// =============================================================================
// TierCaches
// =============================================================================

/// The store and per-tier expiration managers, one of each per tier.
pub struct TierCaches<S: CacheStore> {
    store: Arc<S>,
    managers: [ExpirationManager; 4],
}

impl<S: CacheStore> TierCaches<S> {
    /// Build the per-tier context from the policy table.
    pub fn new(store: Arc<S>, table: &ProfileTable) -> Self {
        let managers = NetworkTier::ASCENDING
            .map(|tier| ExpirationManager::new(tier.cache_name(), table.policy_for(tier)));
        Self { store, managers }
    }

    /// The underlying cache store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The expiration manager owning the tier's timestamps.
    pub fn manager(&self, tier: NetworkTier) -> &ExpirationManager {
        &self.managers[tier.index()]
    }

    /// Open the tier's cache by its derived name.
    pub async fn open(&self, tier: NetworkTier) -> Result<S::Handle, CacheError> {
        self.store.open(&tier.cache_name()).await
    }

    /// Sweep a single tier.
    pub async fn sweep_tier(&self, tier: NetworkTier) -> Result<usize, CacheError> {
        let handle = self.open(tier).await?;
        self.manager(tier).sweep(self.store.as_ref(), &handle).await
    }

    /// Sweep every tier, isolating per-tier faults.
    ///
    /// A failing tier never prevents the remaining tiers from being swept;
    /// each tier's outcome is reported separately for the caller to log.
    pub async fn sweep_all(&self) -> Vec<(NetworkTier, Result<usize, CacheError>)> {
        let mut results = Vec::with_capacity(NetworkTier::ASCENDING.len());
        for tier in NetworkTier::ASCENDING {
            let result = self.sweep_tier(tier).await;
            results.push((tier, result));
        }
        results
    }
}

// =============================================================================
// Tests
// =============================================================================
