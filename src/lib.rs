//! # imgtier
//!
//! An adaptive image delivery proxy.
//!
//! This library mediates image fetches: eligible requests have their URLs
//! rewritten to ask the origin image service for a quality tier matched to
//! the caller's current network conditions, and are served through
//! quality-tiered caches with a "step-down" lookup that walks lower-quality
//! tiers before touching the network.
//!
//! ## Features
//!
//! - **Network-aware rewriting**: merges a per-tier quality profile into
//!   the origin's transform query parameter
//! - **Tiered caching**: one cache per network tier, populated where the
//!   stepdown walk stops
//! - **Policy-driven expiry**: per-tier age and entry limits enforced by a
//!   periodic sweep, never on the read path
//! - **Narrow host boundaries**: cache storage and network fetch live
//!   behind traits, so the core runs against in-memory fakes in tests
//! - **Built-in edge**: an Axum server mapping `Referer`/`ECT`/`Downlink`
//!   headers onto the interception boundary
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`tier`] - Network tier enumeration and ordering
//! - [`profile`] - Per-tier quality profiles and cache policies
//! - [`transform`] - Transform-parameter parsing and URL rewriting
//! - [`cache`] - Storage boundary, expiration managers, sweep scheduling
//! - [`fetch`] - Network fetch boundary
//! - [`resolver`] - The stepdown cache walk
//! - [`mediator`] - Request filtering and dispatch
//! - [`server`] - Axum-based HTTP edge
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use imgtier::{
//!     FilterConfig, HttpFetcher, InterceptedRequest, Mediator, MemoryCacheStore,
//!     ProfileTable, TierCaches,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let profiles = ProfileTable::default();
//!     let caches = Arc::new(TierCaches::new(Arc::new(MemoryCacheStore::new()), &profiles));
//!     let mediator = Mediator::new(
//!         profiles,
//!         FilterConfig::default(),
//!         caches,
//!         Arc::new(HttpFetcher::new()),
//!     );
//!
//!     let request = InterceptedRequest::new("https://ik.imagekit.io/demo/x.jpg")
//!         .with_connection_type("2g");
//!     let decision = mediator.intercept(&request).await;
//!     // Decision::Serve(..) or Decision::PassThrough
//!     let _ = decision;
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod mediator;
pub mod profile;
pub mod resolver;
pub mod server;
pub mod tier;
pub mod transform;

// Re-export commonly used types
pub use cache::{
    spawn_sweeper, sweep_once, CacheStore, ExpirationManager, MemoryCacheHandle, MemoryCacheStore,
    TierCaches, DEFAULT_SWEEP_INTERVAL,
};
pub use config::Config;
pub use error::{CacheError, FetchError, MediatorError};
pub use fetch::{Fetcher, HttpFetcher, ImageResponse};
pub use mediator::{
    Decision, FilterConfig, InterceptedRequest, Mediator, DEFAULT_FALLBACK_TIER,
    DEFAULT_IMAGE_EXTENSIONS, DEFAULT_MIN_DOWNLINK_MBPS,
};
pub use profile::{CachePolicy, ProfileTable, QualityProfile, DEFAULT_MAX_ENTRIES};
pub use resolver::{Resolved, ServedFrom, StepdownResolver};
pub use server::{create_router, AppState, RouterConfig, SERVED_FROM_HEADER};
pub use tier::{NetworkTier, UnknownTier, CACHE_NAME_PREFIX};
pub use transform::{rewrite, NO_CACHE_PARAM, NO_CACHE_VALUE, TRANSFORM_PARAM};
