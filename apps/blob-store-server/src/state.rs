//! Application state management

use std::sync::Arc;

use crate::config::{Config, StorageProvider};
use crate::hasher::Hasher;
use crate::storage::{BackendError, BlobBackend, LocalBackend, MemoryBackend, S3Backend};
use crate::store::ContentStore;

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Storage provider is s3 but no S3 settings were given")]
    MissingS3Config,

    #[error("Failed to initialize storage backend: {0}")]
    Backend(#[from] BackendError),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    store: ContentStore,
}

impl AppState {
    /// Wrap an existing store
    pub fn new(config: Config, store: ContentStore) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, store }),
        }
    }

    /// Build the storage backend and content store described by `config`
    pub async fn from_config(config: Config) -> Result<Self, StateError> {
        let backend: Arc<dyn BlobBackend> = match config.storage.provider {
            StorageProvider::Local => {
                tokio::fs::create_dir_all(&config.storage.root)
                    .await
                    .map_err(BackendError::from)?;
                Arc::new(LocalBackend::new(config.storage.root.clone()))
            }
            StorageProvider::Memory => Arc::new(MemoryBackend::new()),
            StorageProvider::S3 => {
                let s3 = config.storage.s3.as_ref().ok_or(StateError::MissingS3Config)?;
                Arc::new(S3Backend::connect(s3).await?)
            }
        };

        let store = ContentStore::new(backend, Hasher::new(config.hash_algorithm));
        Ok(Self::new(config, store))
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the content store
    pub fn store(&self) -> &ContentStore {
        &self.inner.store
    }
}
