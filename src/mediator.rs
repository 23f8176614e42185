//! Request filtering and dispatch.
//!
//! The mediator sits at the host's interception boundary. For every
//! intercepted request it decides eligibility, computes the caller's
//! network tier, rewrites the URL for that tier's quality profile, and
//! hands the request to the stepdown resolver. Ineligible requests are a
//! [`Decision::PassThrough`], never an error: the host serves them exactly
//! as if this system did not exist.
//!
//! Eligibility gates, evaluated in order:
//!
//! 1. the request has a parseable URL;
//! 2. the referring page, when present, matches one of the allowed
//!    contexts (substring containment);
//! 3. the URL path or query names an image file extension;
//! 4. the URL host is in the origin allow-list.

use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::cache::{CacheStore, TierCaches};
use crate::error::MediatorError;
use crate::fetch::Fetcher;
use crate::profile::ProfileTable;
use crate::resolver::{Resolved, StepdownResolver};
use crate::tier::NetworkTier;
use crate::transform;

// =============================================================================
// Default Values
// =============================================================================

/// Default tier substituted for absent, unknown, or implausible signals.
pub const DEFAULT_FALLBACK_TIER: NetworkTier = NetworkTier::ThreeG;

/// Downlink (Mbps) below which an advertised `4g` signal is distrusted.
///
/// Throttled clients often still advertise `4g` while their measured
/// downlink is a fraction of a megabit; such requests get the default tier.
pub const DEFAULT_MIN_DOWNLINK_MBPS: f64 = 1.0;

/// Extensions classified as image URLs.
pub const DEFAULT_IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

// =============================================================================
// InterceptedRequest
// =============================================================================

/// One intercepted request as seen at the host boundary.
#[derive(Debug, Clone, Default)]
pub struct InterceptedRequest {
    /// The request URL
    pub url: String,

    /// The referring page, if any
    pub referrer: Option<String>,

    /// Advertised effective connection type (`slow-2g` .. `4g`), if any
    pub connection_type: Option<String>,

    /// Advertised downlink estimate in Mbps, if any
    pub downlink_mbps: Option<f64>,
}

impl InterceptedRequest {
    /// Create a request for a URL with no referrer or network signals.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Attach the referring page.
    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    /// Attach the advertised connection type.
    pub fn with_connection_type(mut self, connection_type: impl Into<String>) -> Self {
        self.connection_type = Some(connection_type.into());
        self
    }

    /// Attach the advertised downlink estimate.
    pub fn with_downlink(mut self, mbps: f64) -> Self {
        self.downlink_mbps = Some(mbps);
        self
    }
}

// =============================================================================
// FilterConfig
// =============================================================================

/// Eligibility and tier-computation settings.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Hostnames whose images are mediated
    pub allowed_origins: Vec<String>,

    /// Referring-page substrings that opt a page into mediation
    pub allowed_contexts: Vec<String>,

    /// File extensions classified as images
    pub image_extensions: Vec<String>,

    /// Tier substituted for absent, unknown, or implausible signals
    pub default_tier: NetworkTier,

    /// Downlink threshold below which an advertised `4g` is distrusted
    pub min_downlink_mbps: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["ik.imagekit.io".to_string()],
            allowed_contexts: vec!["/demo/sw-opt-1".to_string(), "/demo/sw-opt-2".to_string()],
            image_extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            default_tier: DEFAULT_FALLBACK_TIER,
            min_downlink_mbps: DEFAULT_MIN_DOWNLINK_MBPS,
        }
    }
}

impl FilterConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the origin allow-list.
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    /// Set the allowed referring contexts.
    pub fn with_allowed_contexts(mut self, contexts: Vec<String>) -> Self {
        self.allowed_contexts = contexts;
        self
    }

    /// Set the image extension list.
    pub fn with_image_extensions(mut self, extensions: Vec<String>) -> Self {
        self.image_extensions = extensions;
        self
    }

    /// Set the default fallback tier.
    pub fn with_default_tier(mut self, tier: NetworkTier) -> Self {
        self.default_tier = tier;
        self
    }

    /// Set the downlink distrust threshold.
    pub fn with_min_downlink(mut self, mbps: f64) -> Self {
        self.min_downlink_mbps = mbps;
        self
    }
}

// =============================================================================
// Decision
// =============================================================================

/// What the host should do with an intercepted request.
#[derive(Debug, Clone)]
pub enum Decision {
    /// Not ours: the host serves the request unmodified, with no cache
    /// interaction at all
    PassThrough,

    /// Serve this resolved response
    Serve(Resolved),
}

// =============================================================================
// Mediator
// =============================================================================

/// The filter/dispatcher in front of the stepdown resolver.
pub struct Mediator<S: CacheStore, F: Fetcher> {
    profiles: ProfileTable,
    filter: FilterConfig,
    resolver: StepdownResolver<S, F>,
}

impl<S: CacheStore, F: Fetcher> Mediator<S, F> {
    /// Build the mediator over an already-constructed tier context.
    pub fn new(
        profiles: ProfileTable,
        filter: FilterConfig,
        caches: Arc<TierCaches<S>>,
        fetcher: Arc<F>,
    ) -> Self {
        Self {
            profiles,
            filter,
            resolver: StepdownResolver::new(caches, fetcher),
        }
    }

    /// The tier context, shared with the sweep scheduler.
    pub fn caches(&self) -> &Arc<TierCaches<S>> {
        self.resolver.caches()
    }

    /// The network fetch boundary, shared with the host for pass-through
    /// requests.
    pub fn fetcher(&self) -> &F {
        self.resolver.fetcher()
    }

    /// Handle one intercepted request.
    ///
    /// Ineligible requests return [`Decision::PassThrough`] without touching
    /// any cache. Eligible requests run the full rewrite-and-stepdown path;
    /// cache and fetch failures propagate as [`MediatorError`].
    pub async fn intercept(
        &self,
        request: &InterceptedRequest,
    ) -> Result<Decision, MediatorError> {
        let Some(url) = self.eligible_url(request) else {
            return Ok(Decision::PassThrough);
        };

        let tier = self.compute_tier(request);
        let profile = self.profiles.profile_for(tier);
        let rewritten = transform::rewrite(&url, profile);
        debug!(%tier, url = %url, rewritten = %rewritten, "dispatching stepdown lookup");

        let resolved = self
            .resolver
            .resolve(&NetworkTier::ASCENDING, tier, url.as_str(), rewritten.as_str())
            .await?;
        Ok(Decision::Serve(resolved))
    }

    /// Apply the eligibility gates, returning the parsed URL when all pass.
    fn eligible_url(&self, request: &InterceptedRequest) -> Option<Url> {
        if request.url.is_empty() {
            return None;
        }
        let url = Url::parse(&request.url).ok()?;

        if let Some(referrer) = &request.referrer {
            let allowed = self
                .filter
                .allowed_contexts
                .iter()
                .any(|context| referrer.contains(context.as_str()));
            if !allowed {
                return None;
            }
        }

        if !self.matches_image_extension(&url) {
            return None;
        }

        let host = url.host_str()?;
        if !self.filter.allowed_origins.iter().any(|origin| origin == host) {
            return None;
        }

        Some(url)
    }

    fn matches_image_extension(&self, url: &Url) -> bool {
        self.filter.image_extensions.iter().any(|ext| {
            let marker = format!(".{ext}");
            url.path().contains(&marker)
                || url.query().is_some_and(|query| query.contains(&marker))
        })
    }

    /// Compute the caller's tier from its advertised signals.
    ///
    /// Absent or unknown signals fall back to the default tier, as does an
    /// advertised `4g` whose measured downlink is under the threshold.
    fn compute_tier(&self, request: &InterceptedRequest) -> NetworkTier {
        let advertised = request
            .connection_type
            .as_deref()
            .and_then(|raw| raw.parse::<NetworkTier>().ok());

        match advertised {
            None => self.filter.default_tier,
            Some(NetworkTier::FourG)
                if request
                    .downlink_mbps
                    .is_some_and(|mbps| mbps < self.filter.min_downlink_mbps) =>
            {
                self.filter.default_tier
            }
            Some(tier) => tier,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
