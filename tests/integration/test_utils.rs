//! Test utilities for integration tests.
//!
//! This module provides tracking implementations of the cache storage and
//! network fetch boundaries, plus helpers to assemble a mediator and
//! router over them.

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use http::{header, HeaderMap, StatusCode};

use imgtier::cache::{CacheStore, MemoryCacheHandle, MemoryCacheStore, TierCaches};
use imgtier::error::{CacheError, FetchError};
use imgtier::fetch::{Fetcher, ImageResponse};
use imgtier::mediator::{FilterConfig, Mediator};
use imgtier::profile::ProfileTable;
use imgtier::server::{create_router, RouterConfig};

// =============================================================================
// Tracking Cache Store
// =============================================================================

/// An in-memory cache store that records the cache name of every lookup,
/// in order.
///
/// This is useful for verifying the stepdown walk and that ineligible
/// requests never touch a cache.
pub struct TrackingStore {
    inner: MemoryCacheStore,
    lookups: Mutex<Vec<String>>,
}

impl TrackingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryCacheStore::new(),
            lookups: Mutex::new(Vec::new()),
        }
    }

    /// Cache names looked up so far, in order.
    pub fn lookup_log(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl CacheStore for TrackingStore {
    type Handle = MemoryCacheHandle;

    async fn open(&self, name: &str) -> Result<Self::Handle, CacheError> {
        self.inner.open(name).await
    }

    async fn lookup(
        &self,
        handle: &Self::Handle,
        key: &str,
    ) -> Result<Option<ImageResponse>, CacheError> {
        self.lookups.lock().unwrap().push(handle.name().to_string());
        self.inner.lookup(handle, key).await
    }

    async fn store(
        &self,
        handle: &Self::Handle,
        key: &str,
        entry: ImageResponse,
    ) -> Result<(), CacheError> {
        self.inner.store(handle, key, entry).await
    }

    async fn remove(&self, handle: &Self::Handle, key: &str) -> Result<(), CacheError> {
        self.inner.remove(handle, key).await
    }
}

// =============================================================================
// Tracking Fetcher
// =============================================================================

/// A fetcher that returns a fixed response and records every fetched URL.
pub struct TrackingFetcher {
    status: StatusCode,
    body: Bytes,
    content_type: Option<&'static str>,
    fail: bool,
    calls: Mutex<Vec<String>>,
}

impl TrackingFetcher {
    /// Respond 200 with an `image/jpeg` body.
    pub fn ok() -> Self {
        Self {
            status: StatusCode::OK,
            body: Bytes::from_static(b"fresh-image-bytes"),
            content_type: Some("image/jpeg"),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Respond with the given status.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Fail every fetch at the transport level.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::ok()
        }
    }

    /// URLs fetched so far, in order.
    pub fn fetched_urls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for TrackingFetcher {
    async fn fetch(&self, url: &str) -> Result<ImageResponse, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.fail {
            return Err(FetchError {
                url: url.to_string(),
                message: "connection refused".to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        if let Some(content_type) = self.content_type {
            headers.insert(header::CONTENT_TYPE, content_type.parse().unwrap());
        }
        Ok(ImageResponse::new(self.status, headers, self.body.clone()))
    }
}

// =============================================================================
// Harness Assembly
// =============================================================================

/// A fully wired mediator over tracking boundaries.
pub struct TestHarness {
    pub store: Arc<TrackingStore>,
    pub fetcher: Arc<TrackingFetcher>,
    pub mediator: Arc<Mediator<TrackingStore, TrackingFetcher>>,
}

/// Build a harness with default profiles, default filter, and a 200
/// fetcher.
pub fn harness() -> TestHarness {
    harness_with(TrackingFetcher::ok(), ProfileTable::default())
}

/// Build a harness with a custom fetcher and profile table.
pub fn harness_with(fetcher: TrackingFetcher, table: ProfileTable) -> TestHarness {
    let store = Arc::new(TrackingStore::new());
    let fetcher = Arc::new(fetcher);
    let caches = Arc::new(TierCaches::new(Arc::clone(&store), &table));
    let mediator = Arc::new(Mediator::new(
        table,
        FilterConfig::default(),
        caches,
        Arc::clone(&fetcher),
    ));
    TestHarness {
        store,
        fetcher,
        mediator,
    }
}

/// Build a router over the harness's mediator, with tracing disabled.
pub fn router_of(harness: &TestHarness) -> Router {
    create_router(
        Arc::clone(&harness.mediator),
        RouterConfig::new().with_tracing(false),
    )
}
