//! Stepdown cache resolution.
//!
//! Given the ascending tier list and the caller's current tier, the
//! resolver walks tier caches from lowest to highest quality looking for a
//! hit before falling back to the network:
//!
//! ```text
//! for each tier, lowest -> highest:
//!     open tier cache, look up the request key
//!     hit                                   -> serve it
//!     miss, tiers remain, tier != current   -> keep walking
//!     miss, last tier or tier == current    -> fetch; 200 -> populate
//!                                              THIS tier; serve result
//! empty list -> fetch, serve verbatim, cache nothing
//! ```
//!
//! Two properties fall out of the walk and are load-bearing:
//!
//! - a hit is served as-is, with no freshness check; staleness is entirely
//!   the expiration managers' concern;
//! - a terminal miss populates the tier where the walk stopped, which can
//!   differ from the caller's tier when the list ends early.
//!
//! Concurrent resolves for one key may each fetch and each populate the
//! same tier; the last write wins. Nothing here serializes requests.

use std::sync::Arc;

use tracing::warn;

use crate::cache::{CacheStore, TierCaches};
use crate::error::MediatorError;
use crate::fetch::{Fetcher, ImageResponse};
use crate::tier::NetworkTier;

// =============================================================================
// Resolution Result
// =============================================================================

/// Where a resolved response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    /// Served out of the named tier's cache
    Cache(NetworkTier),

    /// Fetched from the network on this request
    Network,
}

impl std::fmt::Display for ServedFrom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServedFrom::Cache(tier) => f.write_str(tier.as_str()),
            ServedFrom::Network => f.write_str("network"),
        }
    }
}

/// A resolved response plus its provenance.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The response to hand back to the host
    pub response: ImageResponse,

    /// Which tier cache served it, or the network
    pub served_from: ServedFrom,
}

// =============================================================================
// StepdownResolver
// =============================================================================

/// Walks tier caches lowest-to-highest and falls back to the network.
pub struct StepdownResolver<S: CacheStore, F: Fetcher> {
    caches: Arc<TierCaches<S>>,
    fetcher: Arc<F>,
}

impl<S: CacheStore, F: Fetcher> StepdownResolver<S, F> {
    /// Create a resolver over the tier context and fetcher.
    pub fn new(caches: Arc<TierCaches<S>>, fetcher: Arc<F>) -> Self {
        Self { caches, fetcher }
    }

    /// The tier context this resolver reads across.
    pub fn caches(&self) -> &Arc<TierCaches<S>> {
        &self.caches
    }

    /// The network fetch boundary.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Resolve one request through the stepdown walk.
    ///
    /// * `tiers` - ordered tier list, lowest to highest quality
    /// * `current` - the caller's computed network tier
    /// * `request_key` - cache key: the original (un-rewritten) request URL
    /// * `rewritten_url` - what to fetch on a terminal miss
    ///
    /// # Errors
    ///
    /// A cache open or lookup failure is a hard failure for this request;
    /// there is no fallback to another tier's store. A transport-level
    /// fetch failure propagates unmodified, with no retry.
    pub async fn resolve(
        &self,
        tiers: &[NetworkTier],
        current: NetworkTier,
        request_key: &str,
        rewritten_url: &str,
    ) -> Result<Resolved, MediatorError> {
        let store = self.caches.store();

        for (idx, &tier) in tiers.iter().enumerate() {
            let handle = self.caches.open(tier).await?;

            if let Some(entry) = store.lookup(&handle, request_key).await? {
                // Served without re-validating freshness.
                return Ok(Resolved {
                    response: entry,
                    served_from: ServedFrom::Cache(tier),
                });
            }

            let exhausted = idx + 1 == tiers.len();
            if !exhausted && tier != current {
                continue;
            }

            // The walk stops here: reaching the caller's own tier (or the
            // end of the list) on a miss means lower tiers were already
            // checked and descending further would only warm caches nobody
            // asked for. Fetch fresh and populate the tier that ended the
            // walk.
            let response = self.fetcher.fetch(rewritten_url).await?;
            if response.is_cacheable() {
                match store.store(&handle, request_key, response.clone()).await {
                    Ok(()) => self.caches.manager(tier).record_touch(request_key).await,
                    Err(e) => {
                        // The response is still good; serve it and let a
                        // later request repopulate.
                        warn!(tier = %tier, error = %e, "cache population failed");
                    }
                }
            }
            return Ok(Resolved {
                response,
                served_from: ServedFrom::Network,
            });
        }

        // Exhausted an empty tier list: straight network fetch, uncached.
        let response = self.fetcher.fetch(rewritten_url).await?;
        Ok(Resolved {
            response,
            served_from: ServedFrom::Network,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
