//! Target discovery
//!
//! Walks a tree with the `ignore` crate so `.gitignore` rules apply, then
//! restricts the result to the configured target prefixes.

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tm_core::store::should_ignore;
use tm_core::AnalysisConfig;

/// Files to analyse, relative to `root`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Targets {
    pub root: PathBuf,
    /// Sorted, relative, never inside `.git`/`.tidemark`/`.jj`
    pub files: Vec<PathBuf>,
}

impl Targets {
    /// Walk `root` and collect every file under one of `prefixes`
    ///
    /// An empty prefix list selects the whole tree. Files above
    /// `config.max_file_bytes` are skipped.
    pub fn discover(root: &Path, prefixes: &[PathBuf], config: &AnalysisConfig) -> Result<Self> {
        let mut files = Vec::new();

        let walker = WalkBuilder::new(root)
            .hidden(false)
            .parents(false)
            .require_git(false)
            .filter_entry(|entry| entry.depth() == 0 || !should_ignore(Path::new(entry.file_name())))
            .build();

        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
            if !entry.file_type().map_or(false, |t| t.is_file()) {
                continue;
            }

            let rel = match entry.path().strip_prefix(root) {
                Ok(rel) => rel.to_path_buf(),
                Err(_) => continue,
            };
            if should_ignore(&rel) {
                continue;
            }
            if !prefixes.is_empty() && !prefixes.iter().any(|p| rel.starts_with(p)) {
                continue;
            }

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if size > config.max_file_bytes {
                tracing::debug!(path = %rel.display(), size, "skipping large file");
                continue;
            }
            files.push(rel);
        }

        files.sort();
        tracing::debug!(root = %root.display(), files = files.len(), "discovered targets");

        Ok(Self {
            root: root.to_path_buf(),
            files,
        })
    }

    /// Explicit file list (already relative to `root`)
    pub fn from_files(root: &Path, mut files: Vec<PathBuf>) -> Self {
        files.retain(|f| !should_ignore(f));
        files.sort();
        files.dedup();
        Self {
            root: root.to_path_buf(),
            files,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Key used for a file in operator outputs: relative, `/`-separated
pub fn file_key(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
