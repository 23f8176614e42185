//! Quality profiles and cache policies per network tier.
//!
//! A [`QualityProfile`] is the set of transformation directives requested
//! from the origin image service for one tier: the compression quality plus
//! overlay directives that stamp the served quality onto the image. A
//! [`CachePolicy`] bounds how long and how many entries a tier cache may
//! hold.
//!
//! Both tables are immutable after startup. Lookups are total: every tier
//! has a profile and a policy, and overriding a tier never removes the
//! others.

use std::time::Duration;

use crate::tier::NetworkTier;

// =============================================================================
// Default Values
// =============================================================================

/// Default max age for the 4g tier cache (30 days).
pub const DEFAULT_MAX_AGE_4G: Duration = Duration::from_secs(2_592_000);

/// Default max age for all lower tier caches (7 days).
pub const DEFAULT_MAX_AGE_LOW: Duration = Duration::from_secs(604_800);

/// Default maximum number of entries per tier cache.
pub const DEFAULT_MAX_ENTRIES: usize = 500;

// =============================================================================
// QualityProfile
// =============================================================================

/// Ordered transformation directives for one tier.
///
/// Directives serialize as `key-value` segments joined by commas, in stored
/// order. Order is part of the wire contract: the origin consumes the first
/// quality directive it sees, and tests pin the serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QualityProfile {
    directives: Vec<(String, String)>,
}

impl QualityProfile {
    /// An empty profile (no directives).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a profile from `(directive, value)` pairs, preserving order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            directives: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Whether the profile carries no directives.
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// The directives in stored order.
    pub fn directives(&self) -> &[(String, String)] {
        &self.directives
    }

    /// Serialize as comma-joined `key-value` segments.
    pub fn serialize(&self) -> String {
        let segments: Vec<String> = self
            .directives
            .iter()
            .map(|(k, v)| format!("{k}-{v}"))
            .collect();
        segments.join(",")
    }

    /// The standard profile for a tier: compression quality plus an overlay
    /// stamping that quality onto the image.
    fn standard(quality: &str) -> Self {
        Self::from_pairs([
            ("q", quality),
            ("ot", quality),
            ("ots", "40"),
            ("otc", "FF00A0"),
            ("ox", "10"),
            ("oy", "10"),
        ])
    }
}

// =============================================================================
// CachePolicy
// =============================================================================

/// Eviction bounds for one tier cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Entries older than this are removed on sweep.
    pub max_age: Duration,

    /// At most this many entries survive a sweep (oldest removed first).
    pub max_entries: usize,
}

impl CachePolicy {
    /// Create a policy from explicit bounds.
    pub fn new(max_age: Duration, max_entries: usize) -> Self {
        Self {
            max_age,
            max_entries,
        }
    }
}

// =============================================================================
// ProfileTable
// =============================================================================

/// Per-tier quality profiles and cache policies.
///
/// Constructed once at startup. The default table mirrors the production
/// configuration: quality 40/50/70/90 for slow-2g/2g/3g/4g, 500 entries per
/// tier, 30-day retention on 4g and 7-day retention below it.
#[derive(Debug, Clone)]
pub struct ProfileTable {
    profiles: [QualityProfile; 4],
    policies: [CachePolicy; 4],
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self {
            profiles: [
                QualityProfile::standard("40"),
                QualityProfile::standard("50"),
                QualityProfile::standard("70"),
                QualityProfile::standard("90"),
            ],
            policies: [
                CachePolicy::new(DEFAULT_MAX_AGE_LOW, DEFAULT_MAX_ENTRIES),
                CachePolicy::new(DEFAULT_MAX_AGE_LOW, DEFAULT_MAX_ENTRIES),
                CachePolicy::new(DEFAULT_MAX_AGE_LOW, DEFAULT_MAX_ENTRIES),
                CachePolicy::new(DEFAULT_MAX_AGE_4G, DEFAULT_MAX_ENTRIES),
            ],
        }
    }
}

impl ProfileTable {
    /// Create the default table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one tier's profile, keeping the rest.
    pub fn with_profile(mut self, tier: NetworkTier, profile: QualityProfile) -> Self {
        self.profiles[tier.index()] = profile;
        self
    }

    /// Replace one tier's cache policy, keeping the rest.
    pub fn with_policy(mut self, tier: NetworkTier, policy: CachePolicy) -> Self {
        self.policies[tier.index()] = policy;
        self
    }

    /// The quality profile for a tier. Total: never fails.
    pub fn profile_for(&self, tier: NetworkTier) -> &QualityProfile {
        &self.profiles[tier.index()]
    }

    /// The cache policy for a tier. Total: never fails.
    pub fn policy_for(&self, tier: NetworkTier) -> CachePolicy {
        self.policies[tier.index()]
    }
}

// =============================================================================
// Tests
// =============================================================================
