//! Network fetch boundary.
//!
//! The resolver and the edge talk to upstream origins through the
//! [`Fetcher`] trait so they stay testable with in-memory fakes. The
//! production implementation is [`HttpFetcher`], a thin wrapper over a
//! shared `reqwest` client.
//!
//! A non-2xx upstream response is not a fetch error: it is returned to the
//! caller verbatim (and never cached). Only transport-level failures map to
//! [`FetchError`].

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::error::FetchError;

// =============================================================================
// ImageResponse
// =============================================================================

/// An image response: fetched from upstream or served from a tier cache.
///
/// This is both the network-boundary result type and the cache entry type;
/// the resolver stores fetched responses as-is.
#[derive(Debug, Clone)]
pub struct ImageResponse {
    /// Upstream status code
    pub status: StatusCode,

    /// Upstream response headers
    pub headers: HeaderMap,

    /// Response body
    pub body: Bytes,
}

impl ImageResponse {
    /// Create a response from its parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a bare 200 response with the given body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Whether this response may be stored in a tier cache.
    ///
    /// Only a 200 exactly is cacheable; redirects, partials, and errors are
    /// passed through uncached.
    pub fn is_cacheable(&self) -> bool {
        self.status == StatusCode::OK
    }
}

// =============================================================================
// Fetcher
// =============================================================================

/// Abstraction over upstream HTTP fetching.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a URL from the network.
    ///
    /// Returns `Ok` for any upstream response regardless of status; `Err`
    /// only for transport failures (DNS, connect, timeout, body read).
    async fn fetch(&self, url: &str) -> Result<ImageResponse, FetchError>;
}

// =============================================================================
// HttpFetcher
// =============================================================================

/// `reqwest`-backed [`Fetcher`].
#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fetcher over a pre-configured client (timeouts, proxies).
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<ImageResponse, FetchError> {
        let transport = |e: reqwest::Error| FetchError {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(transport)?;

        Ok(ImageResponse::new(status, headers, body))
    }
}

// =============================================================================
// Tests
// =============================================================================
