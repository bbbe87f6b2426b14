//! Archivers: version-control backends that enumerate and materialize revisions
//!
//! This crate provides:
//! - The `Archiver` contract
//! - `GitArchiver` (libgit2 via `git2`)
//! - `FilesystemArchiver` (content-addressed snapshots of the working tree)

pub mod filesystem;
pub mod git;

pub use filesystem::FilesystemArchiver;
pub use git::GitArchiver;

use std::path::{Path, PathBuf};
use thiserror::Error;
use tm_core::{Config, Revision};

/// Archiver errors
#[derive(Debug, Error)]
pub enum ArchiverError {
    /// The reference does not name a revision this archiver knows
    #[error("unknown revision '{0}'")]
    UnknownRevision(String),

    #[error("unknown archiver '{0}' (expected 'git' or 'filesystem')")]
    UnknownArchiver(String),

    #[error("{0} is not a git repository")]
    NotARepository(PathBuf),

    /// The revision is known but its content is no longer available
    #[error("revision {0} can no longer be materialized")]
    Unavailable(String),

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ArchiverError>;

/// A version-control backend
pub trait Archiver: Send {
    /// Name the revision index is keyed by
    fn name(&self) -> &str;

    /// Every revision, oldest to newest
    fn list_revisions(&self) -> Result<Vec<Revision>>;

    /// Resolve a user supplied reference (hash, branch, `HEAD`)
    fn resolve(&self, reference: &str) -> Result<Revision>;

    /// Make the revision's files available on disk and return their root
    fn materialize(&self, revision: &Revision) -> Result<PathBuf>;
}

/// Select an archiver by name
///
/// `checkout_dir` is the scratch directory archivers may materialize into.
pub fn resolve_archiver(name: &str, config: &Config, checkout_dir: &Path) -> Result<Box<dyn Archiver>> {
    match name {
        "git" => Ok(Box::new(GitArchiver::open(
            &config.path,
            checkout_dir,
            config.max_revisions,
            config.targets.clone(),
        )?)),
        "filesystem" => Ok(Box::new(FilesystemArchiver::new(
            &config.path,
            config.targets.clone(),
            config.analysis.clone(),
        ))),
        other => Err(ArchiverError::UnknownArchiver(other.to_string())),
    }
}
