//! Configuration management for the blob store server

use std::env;
use std::path::PathBuf;

use serde::Deserialize;

use crate::hasher::HashAlgorithm;

/// Default request body limit: 64MB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub hash_algorithm: HashAlgorithm,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub provider: StorageProvider,
    /// Root directory for the local provider
    pub root: PathBuf,
    /// Required for the s3 provider
    pub s3: Option<S3Config>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    Local,
    Memory,
    S3,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: Option<String>,
    pub prefix: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            storage: StorageConfig {
                provider: StorageProvider::Local,
                root: PathBuf::from("./uploads"),
                s3: None,
            },
            hash_algorithm: HashAlgorithm::Sha1,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, falling back to defaults for
    /// anything unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let port = match lookup("SERVER_PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                key: "SERVER_PORT",
                value: v,
            })?,
            None => defaults.server.port,
        };

        let provider = match lookup("STORAGE_BACKEND") {
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "local" => StorageProvider::Local,
                "memory" => StorageProvider::Memory,
                "s3" => StorageProvider::S3,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "STORAGE_BACKEND",
                        value: v,
                    })
                }
            },
            None => defaults.storage.provider,
        };

        let s3 = if provider == StorageProvider::S3 {
            let require = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));
            Some(S3Config {
                endpoint: require("S3_ENDPOINT")?,
                bucket: require("S3_BUCKET")?,
                access_key: require("S3_ACCESS_KEY")?,
                secret_key: require("S3_SECRET_KEY")?,
                region: lookup("S3_REGION"),
                prefix: lookup("S3_PREFIX").unwrap_or_else(|| "blobs".to_string()),
            })
        } else {
            None
        };

        let hash_algorithm = match lookup("HASH_ALGORITHM") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                key: "HASH_ALGORITHM",
                value: v,
            })?,
            None => defaults.hash_algorithm,
        };

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                key: "MAX_UPLOAD_BYTES",
                value: v,
            })?,
            None => defaults.max_upload_bytes,
        };

        Ok(Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or(defaults.server.host),
                port,
            },
            storage: StorageConfig {
                provider,
                root: lookup("STORAGE_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.root),
                s3,
            },
            hash_algorithm,
            max_upload_bytes,
        })
    }
}
