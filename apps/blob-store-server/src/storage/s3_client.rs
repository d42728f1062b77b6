//! S3-compatible storage
//!
//! Wraps the AWS SDK for S3-compatible storage access. Blobs live under a
//! key prefix inside a single bucket.

use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};

use crate::config::S3Config;

use super::{BackendError, BlobBackend};

/// S3-backed blob storage
#[derive(Clone)]
pub struct S3Backend {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Backend {
    /// Create a new S3 backend from configuration
    pub async fn connect(config: &S3Config) -> Result<Self, BackendError> {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "blob-store-server",
        );

        let region = config
            .region
            .clone()
            .unwrap_or_else(|| "us-east-1".to_string());

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint)
            .region(Region::new(region))
            .credentials_provider(credentials)
            .force_path_style(true) // Required for MinIO and other S3-compatible services
            .build();

        let client = Client::from_conf(s3_config);

        let bucket = config.bucket.clone();
        match client.head_bucket().bucket(&bucket).send().await {
            Ok(_) => {
                tracing::info!(bucket = %bucket, "Connected to S3 bucket");
            }
            Err(e) => {
                tracing::warn!(
                    bucket = %bucket,
                    error = %e,
                    "Could not verify bucket, will attempt operations anyway"
                );
            }
        }

        Ok(Self {
            client,
            bucket,
            prefix: config.prefix.trim_end_matches('/').to_string(),
        })
    }

    fn object_key(&self, location: &str) -> String {
        if self.prefix.is_empty() {
            location.to_string()
        } else {
            format!("{}/{}", self.prefix, location)
        }
    }
}

#[async_trait::async_trait]
impl BlobBackend for S3Backend {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn put(&self, location: &str, data: &[u8]) -> Result<(), BackendError> {
        let key = self.object_key(location);
        let content_type = mime_guess::from_path(location)
            .first_or_octet_stream()
            .to_string();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|e| BackendError::Sdk(format!("Failed to put object {}: {}", key, e)))?;

        tracing::debug!(key = %key, size = data.len(), "Wrote blob to S3");
        Ok(())
    }

    async fn get(&self, location: &str) -> Result<Vec<u8>, BackendError> {
        let key = self.object_key(location);

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                let e = e.into_service_error();
                if e.is_no_such_key() {
                    BackendError::NotFound(key.clone())
                } else {
                    BackendError::Sdk(format!("Failed to get object {}: {}", key, e))
                }
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| BackendError::Sdk(format!("Failed to read object body {}: {}", key, e)))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn delete(&self, location: &str) -> Result<(), BackendError> {
        let key = self.object_key(location);

        // DeleteObject succeeds for missing keys, so probe first to report
        // NotFound like the other backends.
        self.client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                let e = e.into_service_error();
                if e.is_not_found() {
                    BackendError::NotFound(key.clone())
                } else {
                    BackendError::Sdk(format!("Failed to head object {}: {}", key, e))
                }
            })?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| BackendError::Sdk(format!("Failed to delete object {}: {}", key, e)))?;

        tracing::debug!(key = %key, "Deleted blob from S3");
        Ok(())
    }
}
