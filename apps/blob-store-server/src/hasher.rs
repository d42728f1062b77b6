//! Content Hasher
//!
//! Computes the digest that identifies a piece of content. Input is consumed
//! in fixed-size chunks so memory use does not depend on input size.

use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Read buffer size. Only affects throughput, never the digest.
pub const CHUNK_SIZE: usize = 4096;

// ============================================================================
// Algorithm
// ============================================================================

/// Digest algorithm used to derive content hashes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-1, 40 hex characters
    #[default]
    Sha1,
    /// SHA-256, 64 hex characters
    Sha256,
}

impl HashAlgorithm {
    /// Length of the hex-encoded digest
    pub fn hex_len(self) -> usize {
        match self {
            Self::Sha1 => 40,
            Self::Sha256 => 64,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(Self::Sha1),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            other => Err(format!("unsupported hash algorithm: {}", other)),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Hashing failed because the content source could not be read
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("Failed to read content: {0}")]
    Io(#[from] io::Error),
}

// ============================================================================
// Hasher
// ============================================================================

/// Streaming content hasher
#[derive(Debug, Clone, Copy, Default)]
pub struct Hasher {
    algorithm: HashAlgorithm,
}

impl Hasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Digest everything readable from `reader`.
    ///
    /// The reader is consumed and dropped before returning, on success and on
    /// failure alike. A read error yields no hash at all.
    pub fn digest<R: Read>(&self, reader: R) -> Result<String, HashError> {
        match self.algorithm {
            HashAlgorithm::Sha1 => digest_reader::<Sha1, _>(reader),
            HashAlgorithm::Sha256 => digest_reader::<Sha256, _>(reader),
        }
    }

    /// Digest an in-memory buffer
    pub fn digest_bytes(&self, content: &[u8]) -> String {
        match self.algorithm {
            HashAlgorithm::Sha1 => digest_chunks::<Sha1>(content),
            HashAlgorithm::Sha256 => digest_chunks::<Sha256>(content),
        }
    }

    /// Whether `hash` has the shape of a digest from this hasher
    pub fn is_well_formed(&self, hash: &str) -> bool {
        hash.len() == self.algorithm.hex_len()
            && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

fn digest_reader<D: Digest, R: Read>(mut reader: R) -> Result<String, HashError> {
    let mut hasher = D::new();
    let mut buf = [0u8; CHUNK_SIZE];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

fn digest_chunks<D: Digest>(content: &[u8]) -> String {
    let mut hasher = D::new();
    for chunk in content.chunks(CHUNK_SIZE) {
        hasher.update(chunk);
    }
    hex::encode(hasher.finalize())
}

// ============================================================================
// Tests
// ============================================================================
