//! Revision identity as produced by an archiver

use serde::{Deserialize, Serialize};

/// A single point in the project's history
///
/// Produced by an archiver and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// VCS-native or content-addressed key (commit hash, snapshot digest)
    pub key: String,
    pub author_name: String,
    pub author_email: String,
    pub message: String,
    /// Unix seconds
    pub timestamp: i64,
    /// Name of the archiver that produced this revision
    pub archiver: String,
}

impl Revision {
    /// First 7 characters of the key, as shown in tables
    pub fn short_key(&self) -> &str {
        let end = self.key.char_indices().nth(7).map_or(self.key.len(), |(i, _)| i);
        &self.key[..end]
    }

    /// First line of the message, truncated to `width` characters
    pub fn summary(&self, width: usize) -> String {
        let first = self.message.lines().next().unwrap_or("");
        first.chars().take(width).collect()
    }
}
