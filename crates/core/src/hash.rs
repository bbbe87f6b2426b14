//! BLAKE3 digests for content-addressed snapshot keys

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// 32-byte BLAKE3 digest
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Blake3Hash([u8; 32]);

impl Blake3Hash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex, used as a revision key
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<blake3::Hash> for Blake3Hash {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl fmt::Display for Blake3Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

pub fn hash_bytes(data: &[u8]) -> Blake3Hash {
    blake3::hash(data).into()
}

/// Digest of a file's content, memory-mapped and hashed on the rayon pool
pub fn hash_file(path: &Path) -> Result<Blake3Hash> {
    let mut hasher = blake3::Hasher::new();
    hasher
        .update_mmap_rayon(path)
        .with_context(|| format!("Failed to hash {}", path.display()))?;
    Ok(hasher.finalize().into())
}

/// Folds `(file key, content digest)` pairs into one snapshot digest
///
/// Pairs must be fed in a stable order; the result changes only when a path
/// or a file's content changes.
#[derive(Default)]
pub struct SnapshotHasher {
    inner: blake3::Hasher,
    files: usize,
}

impl SnapshotHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, key: &str, content: &Blake3Hash) {
        self.inner.update(key.as_bytes());
        self.inner.update(&[0]);
        self.inner.update(content.as_bytes());
        self.files += 1;
    }

    /// Number of files folded in so far
    pub fn files(&self) -> usize {
        self.files
    }

    pub fn finalize(self) -> Blake3Hash {
        self.inner.finalize().into()
    }
}
