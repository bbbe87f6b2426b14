//! Filesystem archiver
//!
//! For projects without version control. The working tree has exactly one
//! revision at any time, keyed by a BLAKE3 digest over every discovered file
//! path and content hash, so each distinct content state is indexed once.

use crate::{Archiver, ArchiverError, Result};
use chrono::{DateTime, Utc};
use operators::{file_key, Targets};
use std::path::{Path, PathBuf};
use tm_core::{hash_file, AnalysisConfig, Revision, SnapshotHasher};

pub struct FilesystemArchiver {
    root: PathBuf,
    targets: Vec<PathBuf>,
    analysis: AnalysisConfig,
}

impl FilesystemArchiver {
    pub fn new(root: &Path, targets: Vec<PathBuf>, analysis: AnalysisConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            targets,
            analysis,
        }
    }

    /// Snapshot of the tree as it is now
    pub fn current(&self) -> Result<Revision> {
        let targets = Targets::discover(&self.root, &self.targets, &self.analysis)?;

        let mut hasher = SnapshotHasher::new();
        let mut newest: Option<DateTime<Utc>> = None;
        for rel in &targets.files {
            let path = self.root.join(rel);
            hasher.add_file(&file_key(rel), &hash_file(&path)?);

            let modified: DateTime<Utc> = std::fs::metadata(&path)?.modified()?.into();
            newest = Some(newest.map_or(modified, |n| n.max(modified)));
        }
        let files = hasher.files();
        let key = hasher.finalize().to_hex();

        Ok(Revision {
            key,
            author_name: std::env::var("USER").unwrap_or_else(|_| "local".to_string()),
            author_email: String::new(),
            message: format!("snapshot of {} files", files),
            timestamp: newest.unwrap_or_else(Utc::now).timestamp(),
            archiver: self.name().to_string(),
        })
    }
}

impl Archiver for FilesystemArchiver {
    fn name(&self) -> &str {
        "filesystem"
    }

    fn list_revisions(&self) -> Result<Vec<Revision>> {
        Ok(vec![self.current()?])
    }

    /// `HEAD`, `current`, or a prefix of the current key
    fn resolve(&self, reference: &str) -> Result<Revision> {
        let current = self.current()?;
        let matches = matches!(reference, "HEAD" | "current")
            || (!reference.is_empty() && current.key.starts_with(reference));
        if matches {
            Ok(current)
        } else {
            Err(ArchiverError::UnknownRevision(reference.to_string()))
        }
    }

    fn materialize(&self, revision: &Revision) -> Result<PathBuf> {
        let current = self.current()?;
        if current.key != revision.key {
            return Err(ArchiverError::Unavailable(revision.key.clone()));
        }
        Ok(self.root.clone())
    }
}
