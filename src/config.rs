//! Configuration management for imgtier.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `IMGTIER_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use imgtier::config::Config;
//!
//! // Parse from command line and environment
//! let config = Config::parse();
//!
//! println!("Listening on {}", config.bind_address());
//! println!("Mediating origins: {:?}", config.allowed_origins);
//! ```
//!
//! # Environment Variables
//!
//! All configuration options can be set via environment variables with the
//! `IMGTIER_` prefix:
//!
//! - `IMGTIER_HOST` - Server bind address (default: 0.0.0.0)
//! - `IMGTIER_PORT` - Server port (default: 3000)
//! - `IMGTIER_ALLOWED_ORIGINS` - Hostnames to mediate (comma-separated)
//! - `IMGTIER_ALLOWED_CONTEXTS` - Referring-page substrings to mediate
//! - `IMGTIER_IMAGE_EXTENSIONS` - Extensions classified as images
//! - `IMGTIER_DEFAULT_TIER` - Fallback network tier (default: 3g)
//! - `IMGTIER_MIN_DOWNLINK` - Downlink distrust threshold in Mbps
//! - `IMGTIER_SWEEP_INTERVAL` - Seconds between eviction sweeps
//! - `IMGTIER_FETCH_TIMEOUT` - Upstream fetch timeout in seconds
//! - `IMGTIER_TIER_POLICY` - Per-tier cache policy overrides
//! - `IMGTIER_TIER_PROFILE` - Per-tier quality profile overrides

use std::time::Duration;

use clap::Parser;

use crate::mediator::FilterConfig;
use crate::profile::{CachePolicy, ProfileTable, QualityProfile};
use crate::tier::NetworkTier;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default seconds between eviction sweeps.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Default upstream fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// CLI Arguments
// =============================================================================

/// imgtier - an adaptive image delivery proxy.
///
/// Rewrites eligible image requests to a quality tier matched to the
/// caller's network conditions and serves them through tiered caches with
/// step-down fallback.
#[derive(Parser, Debug, Clone)]
#[command(name = "imgtier")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "IMGTIER_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "IMGTIER_PORT")]
    pub port: u16,

    // =========================================================================
    // Eligibility Configuration
    // =========================================================================
    /// Hostnames whose images are mediated (comma-separated).
    #[arg(
        long,
        env = "IMGTIER_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = "ik.imagekit.io"
    )]
    pub allowed_origins: Vec<String>,

    /// Referring-page substrings that opt a page into mediation
    /// (comma-separated).
    #[arg(
        long,
        env = "IMGTIER_ALLOWED_CONTEXTS",
        value_delimiter = ',',
        default_value = "/demo/sw-opt-1,/demo/sw-opt-2"
    )]
    pub allowed_contexts: Vec<String>,

    /// File extensions classified as images (comma-separated).
    #[arg(
        long,
        env = "IMGTIER_IMAGE_EXTENSIONS",
        value_delimiter = ',',
        default_value = "png,jpg,jpeg,gif,webp"
    )]
    pub image_extensions: Vec<String>,

    // =========================================================================
    // Tier Configuration
    // =========================================================================
    /// Fallback tier for absent, unknown, or implausible network signals.
    #[arg(long, default_value = "3g", env = "IMGTIER_DEFAULT_TIER")]
    pub default_tier: String,

    /// Downlink (Mbps) below which an advertised 4g signal is distrusted.
    #[arg(long, default_value_t = 1.0, env = "IMGTIER_MIN_DOWNLINK")]
    pub min_downlink_mbps: f64,

    /// Per-tier cache policy override, as tier=max_age_secs:max_entries.
    ///
    /// May be given multiple times, e.g. --tier-policy 4g=2592000:500.
    #[arg(long, env = "IMGTIER_TIER_POLICY", value_delimiter = ' ')]
    pub tier_policy: Vec<String>,

    /// Per-tier quality profile override, as tier=key-value[,key-value...].
    ///
    /// May be given multiple times, e.g. --tier-profile 2g=q-50,ot-50.
    #[arg(long, env = "IMGTIER_TIER_PROFILE", value_delimiter = ' ')]
    pub tier_profile: Vec<String>,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Seconds between eviction sweeps across all tiers.
    #[arg(
        long,
        default_value_t = DEFAULT_SWEEP_INTERVAL_SECS,
        env = "IMGTIER_SWEEP_INTERVAL"
    )]
    pub sweep_interval_secs: u64,

    // =========================================================================
    // Upstream Configuration
    // =========================================================================
    /// Upstream fetch timeout in seconds.
    #[arg(
        long,
        default_value_t = DEFAULT_FETCH_TIMEOUT_SECS,
        env = "IMGTIER_FETCH_TIMEOUT"
    )]
    pub fetch_timeout_secs: u64,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "IMGTIER_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.allowed_origins.iter().all(|o| o.is_empty()) {
            return Err(
                "At least one mediated origin is required. \
                 Set --allowed-origins or IMGTIER_ALLOWED_ORIGINS"
                    .to_string(),
            );
        }

        self.default_tier
            .parse::<NetworkTier>()
            .map_err(|e| format!("Invalid default tier: {e}"))?;

        if self.sweep_interval_secs == 0 {
            return Err("sweep_interval_secs must be greater than 0".to_string());
        }
        if self.fetch_timeout_secs == 0 {
            return Err("fetch_timeout_secs must be greater than 0".to_string());
        }
        if !self.min_downlink_mbps.is_finite() || self.min_downlink_mbps < 0.0 {
            return Err("min_downlink_mbps must be a non-negative number".to_string());
        }

        for entry in &self.tier_policy {
            parse_tier_policy(entry)?;
        }
        for entry in &self.tier_profile {
            parse_tier_profile(entry)?;
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The sweep period as a duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// The upstream fetch timeout as a duration.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Build the per-tier profile/policy table, applying overrides.
    pub fn profile_table(&self) -> Result<ProfileTable, String> {
        let mut table = ProfileTable::default();
        for entry in &self.tier_policy {
            let (tier, policy) = parse_tier_policy(entry)?;
            table = table.with_policy(tier, policy);
        }
        for entry in &self.tier_profile {
            let (tier, profile) = parse_tier_profile(entry)?;
            table = table.with_profile(tier, profile);
        }
        Ok(table)
    }

    /// Build the eligibility/dispatch settings.
    pub fn filter_config(&self) -> Result<FilterConfig, String> {
        let default_tier = self
            .default_tier
            .parse::<NetworkTier>()
            .map_err(|e| format!("Invalid default tier: {e}"))?;

        Ok(FilterConfig::new()
            .with_allowed_origins(self.allowed_origins.clone())
            .with_allowed_contexts(self.allowed_contexts.clone())
            .with_image_extensions(self.image_extensions.clone())
            .with_default_tier(default_tier)
            .with_min_downlink(self.min_downlink_mbps))
    }
}

// =============================================================================
// Override Parsing
// =============================================================================

/// Parse a `tier=max_age_secs:max_entries` policy override.
fn parse_tier_policy(entry: &str) -> Result<(NetworkTier, CachePolicy), String> {
    let (tier, bounds) = entry
        .split_once('=')
        .ok_or_else(|| format!("Invalid tier policy '{entry}': expected tier=age:entries"))?;
    let tier = tier
        .parse::<NetworkTier>()
        .map_err(|e| format!("Invalid tier policy '{entry}': {e}"))?;

    let (age, entries) = bounds
        .split_once(':')
        .ok_or_else(|| format!("Invalid tier policy '{entry}': expected tier=age:entries"))?;
    let age: u64 = age
        .parse()
        .map_err(|_| format!("Invalid tier policy '{entry}': bad max age"))?;
    let entries: usize = entries
        .parse()
        .map_err(|_| format!("Invalid tier policy '{entry}': bad max entries"))?;

    Ok((tier, CachePolicy::new(Duration::from_secs(age), entries)))
}

/// Parse a `tier=key-value[,key-value...]` profile override.
fn parse_tier_profile(entry: &str) -> Result<(NetworkTier, QualityProfile), String> {
    let (tier, directives) = entry
        .split_once('=')
        .ok_or_else(|| format!("Invalid tier profile '{entry}': expected tier=key-value,..."))?;
    let tier = tier
        .parse::<NetworkTier>()
        .map_err(|e| format!("Invalid tier profile '{entry}': {e}"))?;

    let mut pairs = Vec::new();
    for segment in directives.split(',').filter(|s| !s.is_empty()) {
        let (key, value) = segment
            .split_once('-')
            .ok_or_else(|| format!("Invalid tier profile '{entry}': bad segment '{segment}'"))?;
        if key.is_empty() {
            return Err(format!(
                "Invalid tier profile '{entry}': bad segment '{segment}'"
            ));
        }
        pairs.push((key, value));
    }

    Ok((tier, QualityProfile::from_pairs(pairs)))
}

// =============================================================================
// Tests
// =============================================================================
