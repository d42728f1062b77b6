//! Content store types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hasher::HashError;
use crate::storage::BackendError;

// ============================================================================
// Records
// ============================================================================

/// Index entry for one unique piece of content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    /// Content hash, the index key
    pub hash: String,

    /// Backend location of the bytes
    pub location: String,

    /// Sanitized name from the first upload
    pub file_name: String,

    /// Size in bytes
    pub size: u64,

    /// When the content was first stored
    pub stored_at: DateTime<Utc>,
}

/// Aggregate numbers over the index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub records: usize,
    pub total_bytes: u64,
}

// ============================================================================
// Error Types
// ============================================================================

/// Content store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Io(#[from] HashError),

    #[error("Storage write failed at {location}: {source}")]
    StorageWrite {
        location: String,
        #[source]
        source: BackendError,
    },

    #[error("Storage read failed at {location}: {source}")]
    StorageRead {
        location: String,
        #[source]
        source: BackendError,
    },

    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("Storage corruption for {hash}: {reason}")]
    StorageCorruption { hash: String, reason: String },
}
