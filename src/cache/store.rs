//! Cache storage boundary.
//!
//! Tier caches are owned by the host's storage subsystem; the core holds
//! only names and handles. The [`CacheStore`] trait is the narrow seam that
//! keeps the stepdown resolver and the expiration managers testable with
//! in-memory fakes.
//!
//! No eviction logic lives here. Entries are removed only by a tier's
//! expiration manager or by an explicit overwrite.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::CacheError;
use crate::fetch::ImageResponse;

// =============================================================================
// CacheStore Trait
// =============================================================================

/// Host-backed, name-addressed cache storage.
///
/// `open` is idempotent: concurrent opens of the same name must return
/// handles to the same underlying store.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Handle to one named cache.
    type Handle: Clone + Send + Sync + 'static;

    /// Open the named cache, creating it lazily on first use.
    async fn open(&self, name: &str) -> Result<Self::Handle, CacheError>;

    /// Look up an entry by request key.
    async fn lookup(
        &self,
        handle: &Self::Handle,
        key: &str,
    ) -> Result<Option<ImageResponse>, CacheError>;

    /// Store an entry under the request key, overwriting any previous one.
    async fn store(
        &self,
        handle: &Self::Handle,
        key: &str,
        entry: ImageResponse,
    ) -> Result<(), CacheError>;

    /// Remove the entry under the request key, if present.
    async fn remove(&self, handle: &Self::Handle, key: &str) -> Result<(), CacheError>;
}

// =============================================================================
// MemoryCacheStore
// =============================================================================

/// Process-memory [`CacheStore`] used by the edge binary and tests.
///
/// Caches are created lazily on first open and live for the process
/// lifetime. Handles are cheap clones of a shared inner map.
#[derive(Default)]
pub struct MemoryCacheStore {
    caches: RwLock<HashMap<String, MemoryCacheHandle>>,
}

/// Handle to one in-memory cache.
#[derive(Clone)]
pub struct MemoryCacheHandle {
    inner: Arc<MemoryCacheInner>,
}

struct MemoryCacheInner {
    name: String,
    entries: RwLock<HashMap<String, ImageResponse>>,
}

impl MemoryCacheStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryCacheHandle {
    /// Name of the cache this handle points at.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Number of entries currently held.
    pub async fn len(&self) -> usize {
        self.inner.entries.read().await.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.inner.entries.read().await.is_empty()
    }

    /// Whether an entry exists for the key.
    pub async fn contains(&self, key: &str) -> bool {
        self.inner.entries.read().await.contains_key(key)
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    type Handle = MemoryCacheHandle;

    async fn open(&self, name: &str) -> Result<Self::Handle, CacheError> {
        // Fast path: the cache already exists.
        {
            let caches = self.caches.read().await;
            if let Some(handle) = caches.get(name) {
                return Ok(handle.clone());
            }
        }

        let mut caches = self.caches.write().await;
        let handle = caches
            .entry(name.to_string())
            .or_insert_with(|| MemoryCacheHandle {
                inner: Arc::new(MemoryCacheInner {
                    name: name.to_string(),
                    entries: RwLock::new(HashMap::new()),
                }),
            })
            .clone();
        Ok(handle)
    }

    async fn lookup(
        &self,
        handle: &Self::Handle,
        key: &str,
    ) -> Result<Option<ImageResponse>, CacheError> {
        Ok(handle.inner.entries.read().await.get(key).cloned())
    }

    async fn store(
        &self,
        handle: &Self::Handle,
        key: &str,
        entry: ImageResponse,
    ) -> Result<(), CacheError> {
        handle
            .inner
            .entries
            .write()
            .await
            .insert(key.to_string(), entry);
        Ok(())
    }

    async fn remove(&self, handle: &Self::Handle, key: &str) -> Result<(), CacheError> {
        handle.inner.entries.write().await.remove(key);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
