use thiserror::Error;

/// Errors from the cache storage boundary.
///
/// An open failure is a hard failure for the request that needed that
/// cache; the resolver never falls back to a different tier's store.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The named cache could not be opened
    #[error("failed to open cache {name}: {message}")]
    Open { name: String, message: String },

    /// The storage backend failed during a lookup, store, or removal
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Transport-level failure from the network fetch boundary.
///
/// Non-2xx upstream responses are not errors; they are returned verbatim to
/// the caller and never cached.
#[derive(Debug, Clone, Error)]
#[error("upstream fetch failed for {url}: {message}")]
pub struct FetchError {
    pub url: String,
    pub message: String,
}

/// Errors surfaced to the host when a mediated request fails.
#[derive(Debug, Clone, Error)]
pub enum MediatorError {
    /// Cache storage failure
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// Network fetch failure, propagated unmodified (no retry, no
    /// substitute cached content)
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
}
