//! In-memory storage
//!
//! Nothing survives the process. Counts writes so callers can check that
//! deduplicated content is written exactly once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use super::{BackendError, BlobBackend};

#[derive(Default)]
pub struct MemoryBackend {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    writes: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `put` calls so far
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of blobs currently held
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Sorted list of stored locations
    pub fn locations(&self) -> Vec<String> {
        let mut locations: Vec<String> = self.objects.read().keys().cloned().collect();
        locations.sort();
        locations
    }
}

#[async_trait::async_trait]
impl BlobBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn put(&self, location: &str, data: &[u8]) -> Result<(), BackendError> {
        self.objects
            .write()
            .insert(location.to_string(), data.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get(&self, location: &str) -> Result<Vec<u8>, BackendError> {
        self.objects
            .read()
            .get(location)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(location.to_string()))
    }

    async fn delete(&self, location: &str) -> Result<(), BackendError> {
        self.objects
            .write()
            .remove(location)
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound(location.to_string()))
    }
}
