//! Periodic sweep scheduling.
//!
//! A single background task sweeps every tier on a fixed period. Sweep
//! failures are logged per tier and never stop the task or the other
//! tiers' sweeps.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::store::CacheStore;
use super::tiers::TierCaches;

/// Default period between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Run one sweep pass over all tiers, logging per-tier outcomes.
pub async fn sweep_once<S: CacheStore>(caches: &TierCaches<S>) {
    for (tier, result) in caches.sweep_all().await {
        match result {
            Ok(0) => {}
            Ok(removed) => debug!(tier = %tier, removed, "swept tier cache"),
            Err(e) => warn!(tier = %tier, error = %e, "tier sweep failed"),
        }
    }
}

/// Spawn the sweep task, ticking every `period`.
///
/// The first tick fires after one full period; the task runs until the
/// handle is dropped by process shutdown or aborted.
pub fn spawn_sweeper<S>(caches: Arc<TierCaches<S>>, period: Duration) -> JoinHandle<()>
where
    S: CacheStore + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval's first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            sweep_once(&caches).await;
        }
    })
}

// =============================================================================
// Tests
// =============================================================================
