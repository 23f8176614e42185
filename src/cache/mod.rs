//! Tier cache storage, expiration, and sweep scheduling.
//!
//! Each network tier maps to exactly one named cache and one expiration
//! manager. The pieces:
//!
//! - [`CacheStore`]: the host storage boundary (open / lookup / store /
//!   remove), with [`MemoryCacheStore`] as the in-process implementation
//! - [`ExpirationManager`]: per-tier timestamps plus age- and count-based
//!   eviction
//! - [`TierCaches`]: the process-wide context tying store and managers
//!   together, built once at startup
//! - [`spawn_sweeper`]: the periodic sweep task
//!
//! The resolver reads across tiers through [`TierCaches`]; everything else
//! touches exactly one tier at a time.

mod expiration;
mod store;
mod sweep;
mod tiers;

pub use expiration::ExpirationManager;
pub use store::{CacheStore, MemoryCacheHandle, MemoryCacheStore};
pub use sweep::{spawn_sweeper, sweep_once, DEFAULT_SWEEP_INTERVAL};
pub use tiers::TierCaches;
