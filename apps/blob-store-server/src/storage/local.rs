//! Local filesystem storage

use std::io;
use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use super::{BackendError, BlobBackend};

/// Blob storage rooted at a directory
pub struct LocalBackend {
    base_path: PathBuf,
}

impl LocalBackend {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Resolve a relative location under the base path.
    ///
    /// Absolute paths and `..` components are rejected so a location can
    /// never escape the root.
    fn resolve(&self, location: &str) -> Result<PathBuf, BackendError> {
        let relative = Path::new(location);
        let safe = !location.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));

        if !safe {
            return Err(BackendError::InvalidLocation(location.to_string()));
        }

        Ok(self.base_path.join(relative))
    }
}

fn not_found_or_io(location: &str, e: io::Error) -> BackendError {
    if e.kind() == io::ErrorKind::NotFound {
        BackendError::NotFound(location.to_string())
    } else {
        BackendError::Io(e)
    }
}

#[async_trait::async_trait]
impl BlobBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn put(&self, location: &str, data: &[u8]) -> Result<(), BackendError> {
        let path = self.resolve(location)?;
        let parent = path
            .parent()
            .ok_or_else(|| BackendError::InvalidLocation(location.to_string()))?;

        tokio::fs::create_dir_all(parent).await?;

        // Write to a sibling temp file and rename so readers never see a
        // partially written blob.
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp_path = parent.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        if let Err(e) = tokio::fs::write(&tmp_path, data).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        tracing::debug!(
            location = %location,
            size = data.len(),
            "Wrote blob to local storage"
        );

        Ok(())
    }

    async fn get(&self, location: &str) -> Result<Vec<u8>, BackendError> {
        let path = self.resolve(location)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| not_found_or_io(location, e))
    }

    async fn delete(&self, location: &str) -> Result<(), BackendError> {
        let path = self.resolve(location)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found_or_io(location, e))?;

        // Prune now-empty parents below the top-level shard directory,
        // which other locations share
        let mut dir = path.parent();
        while let Some(d) = dir {
            if d.parent() == Some(self.base_path.as_path())
                || d == self.base_path
                || tokio::fs::remove_dir(d).await.is_err()
            {
                break;
            }
            dir = d.parent();
        }

        Ok(())
    }
}
