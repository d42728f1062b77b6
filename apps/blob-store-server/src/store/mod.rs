//! Content Store
//!
//! Content-addressed storage with hash-keyed deduplication:
//! - Content is identified by the digest of its bytes
//! - Each unique digest is written to the backend exactly once
//! - Removal drops the index entry and the bytes together
//!
//! The hash -> record index lives in memory for the lifetime of the process.
//! Operations on the same hash are serialized through a per-hash lock:
//! `store` and `remove` take it exclusively, reads take it shared.
//! Aggregate queries (`len`, `stats`) take no per-hash lock, so the index
//! never lists a record whose bytes are being deleted: `remove` unlists
//! the record first and relists it only if the delete fails.

mod locks;
pub mod types;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::hasher::{HashAlgorithm, Hasher};
use crate::storage::{BackendError, BlobBackend, LocalBackend, MemoryBackend};

use locks::HashLocks;
pub use types::{ContentRecord, StoreError, StoreStats};

/// Name used when the suggested one sanitizes to nothing
pub const FALLBACK_FILE_NAME: &str = "blob";

// ============================================================================
// Content Store
// ============================================================================

/// Deduplicating content store
#[derive(Clone)]
pub struct ContentStore {
    inner: Arc<ContentStoreInner>,
}

struct ContentStoreInner {
    hasher: Hasher,

    /// Byte storage
    backend: Arc<dyn BlobBackend>,

    /// Content hash -> record
    index: RwLock<HashMap<String, ContentRecord>>,

    /// Serializes operations per hash
    locks: HashLocks,
}

impl ContentStore {
    /// Create a store over an arbitrary backend
    pub fn new(backend: Arc<dyn BlobBackend>, hasher: Hasher) -> Self {
        Self {
            inner: Arc::new(ContentStoreInner {
                hasher,
                backend,
                index: RwLock::new(HashMap::new()),
                locks: HashLocks::new(),
            }),
        }
    }

    /// Create with local filesystem storage
    pub fn with_local_storage(base_path: PathBuf, algorithm: HashAlgorithm) -> Self {
        Self::new(Arc::new(LocalBackend::new(base_path)), Hasher::new(algorithm))
    }

    /// Create with in-memory storage
    pub fn with_memory_storage(algorithm: HashAlgorithm) -> Self {
        Self::new(Arc::new(MemoryBackend::new()), Hasher::new(algorithm))
    }

    pub fn hasher(&self) -> &Hasher {
        &self.inner.hasher
    }

    pub fn backend_name(&self) -> &'static str {
        self.inner.backend.name()
    }

    // ========================================================================
    // Core Operations
    // ========================================================================

    /// Store `content` and return its hash.
    ///
    /// Content already in the index is not written again. New content is
    /// written to the backend before it is indexed, so a failed write leaves
    /// the index untouched.
    pub async fn store(&self, content: &[u8], suggested_name: &str) -> Result<String, StoreError> {
        let hash = self.inner.hasher.digest(content)?;

        let _guard = self.inner.locks.write(&hash).await;

        if let Some(existing) = self.inner.index.read().await.get(&hash) {
            tracing::debug!(
                hash = %hash,
                location = %existing.location,
                "Content already stored, skipping write"
            );
            return Ok(hash);
        }

        let file_name = sanitize_file_name(suggested_name);
        let location = location_for(&hash, &file_name);

        self.inner
            .backend
            .put(&location, content)
            .await
            .map_err(|source| StoreError::StorageWrite {
                location: location.clone(),
                source,
            })?;

        let record = ContentRecord {
            hash: hash.clone(),
            location,
            file_name,
            size: content.len() as u64,
            stored_at: Utc::now(),
        };

        tracing::info!(
            hash = %hash,
            location = %record.location,
            size = record.size,
            backend = self.inner.backend.name(),
            "Stored new content"
        );

        self.inner.index.write().await.insert(hash.clone(), record);

        Ok(hash)
    }

    /// Read the full content stored under `hash`
    pub async fn fetch(&self, hash: &str) -> Result<Vec<u8>, StoreError> {
        self.open(hash).await.map(|(_, data)| data)
    }

    /// Read the content stored under `hash` together with its record.
    ///
    /// Bytes that are missing or no longer hash to `hash` are reported as
    /// `StorageCorruption`. A backend that fails to answer at all is
    /// `StorageRead`.
    pub async fn open(&self, hash: &str) -> Result<(ContentRecord, Vec<u8>), StoreError> {
        let _guard = self.inner.locks.read(hash).await;

        let record = self
            .inner
            .index
            .read()
            .await
            .get(hash)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(hash.to_string()))?;

        let data = match self.inner.backend.get(&record.location).await {
            Ok(data) => data,
            Err(BackendError::NotFound(location)) => {
                return Err(StoreError::StorageCorruption {
                    hash: hash.to_string(),
                    reason: format!("backing bytes missing at {}", location),
                });
            }
            Err(source) => {
                return Err(StoreError::StorageRead {
                    location: record.location,
                    source,
                });
            }
        };

        if data.len() as u64 != record.size {
            return Err(StoreError::StorageCorruption {
                hash: hash.to_string(),
                reason: format!("expected {} bytes, found {}", record.size, data.len()),
            });
        }

        let actual = self.inner.hasher.digest_bytes(&data);
        if actual != record.hash {
            return Err(StoreError::StorageCorruption {
                hash: hash.to_string(),
                reason: format!("stored bytes hash to {}", actual),
            });
        }

        Ok((record, data))
    }

    /// Remove the content stored under `hash`.
    ///
    /// Returns `false` if nothing was stored under it. Bytes already gone
    /// from the backend do not block removal of the index entry. Any other
    /// delete failure puts the record back.
    pub async fn remove(&self, hash: &str) -> Result<bool, StoreError> {
        let _guard = self.inner.locks.write(hash).await;

        let Some(record) = self.inner.index.write().await.remove(hash) else {
            return Ok(false);
        };

        match self.inner.backend.delete(&record.location).await {
            Ok(()) => {}
            Err(BackendError::NotFound(location)) => {
                tracing::debug!(
                    hash = %hash,
                    location = %location,
                    "Backing bytes already gone, dropping index entry"
                );
            }
            Err(source) => {
                let location = record.location.clone();
                self.inner.index.write().await.insert(hash.to_string(), record);
                return Err(StoreError::StorageWrite { location, source });
            }
        }

        tracing::info!(hash = %hash, location = %record.location, "Removed content");

        Ok(true)
    }

    // ========================================================================
    // Index Queries
    // ========================================================================

    /// Look up the record for `hash` without touching the backend
    pub async fn stat(&self, hash: &str) -> Option<ContentRecord> {
        let _guard = self.inner.locks.read(hash).await;
        self.inner.index.read().await.get(hash).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.index.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.index.read().await.is_empty()
    }

    pub async fn stats(&self) -> StoreStats {
        let index = self.inner.index.read().await;
        StoreStats {
            records: index.len(),
            total_bytes: index.values().map(|r| r.size).sum(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Reduce a client-supplied name to a safe single path component
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '_',
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Backend location for content: namespaced by hash, so equal names with
/// different content never collide.
pub fn location_for(hash: &str, file_name: &str) -> String {
    let (prefix, rest) = hash.split_at(2.min(hash.len()));
    format!("{}/{}/{}", prefix, rest, file_name)
}

// ============================================================================
// Tests
// ============================================================================
