//! Storage backends for blob bytes
//!
//! Supports the local filesystem, an in-process memory map, and
//! S3-compatible object stores (MinIO, Cloudflare R2, AWS S3).
//!
//! Backends know nothing about hashes. They create, read and delete byte
//! blobs at opaque locations chosen by the content store.

mod local;
mod memory;
mod s3_client;

pub use local::LocalBackend;
pub use memory::MemoryBackend;
pub use s3_client::S3Backend;

/// Storage backend errors
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 SDK error: {0}")]
    Sdk(String),
}

/// Trait for blob storage backends
#[async_trait::async_trait]
pub trait BlobBackend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Write `data` at `location`, replacing nothing: the content store never
    /// reuses a location for different bytes.
    async fn put(&self, location: &str, data: &[u8]) -> Result<(), BackendError>;

    /// Read the full blob at `location`
    async fn get(&self, location: &str) -> Result<Vec<u8>, BackendError>;

    /// Delete the blob at `location`.
    ///
    /// Returns `BackendError::NotFound` when nothing was there, if the
    /// backend can tell.
    async fn delete(&self, location: &str) -> Result<(), BackendError>;
}
