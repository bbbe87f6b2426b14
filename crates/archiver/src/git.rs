//! Git archiver
//!
//! Enumerates commits reachable from HEAD and writes a commit's tree into a
//! scratch checkout directory. The user's working tree and index are never
//! touched.

use crate::{Archiver, ArchiverError, Result};
use git2::{Commit, ObjectType, Oid, Repository, Sort, TreeWalkMode, TreeWalkResult};
use std::path::{Path, PathBuf};
use tm_core::store::normalize_path;
use tm_core::Revision;

/// Symlink file mode in git trees
const MODE_SYMLINK: i32 = 0o120000;

pub struct GitArchiver {
    repo: Repository,
    checkout_dir: PathBuf,
    max_revisions: usize,
    /// Only paths under these prefixes are materialized; empty means all
    targets: Vec<PathBuf>,
}

impl GitArchiver {
    pub fn open(
        repo_path: &Path,
        checkout_dir: &Path,
        max_revisions: usize,
        targets: Vec<PathBuf>,
    ) -> Result<Self> {
        let repo = Repository::open(repo_path)
            .map_err(|_| ArchiverError::NotARepository(repo_path.to_path_buf()))?;
        Ok(Self {
            repo,
            checkout_dir: checkout_dir.to_path_buf(),
            max_revisions,
            targets,
        })
    }

    fn revision(&self, commit: &Commit) -> Revision {
        let author = commit.author();
        Revision {
            key: commit.id().to_string(),
            author_name: author.name().unwrap_or("").to_string(),
            author_email: author.email().unwrap_or("").to_string(),
            message: commit.message().unwrap_or("").trim_end().to_string(),
            timestamp: commit.time().seconds(),
            archiver: self.name().to_string(),
        }
    }

    fn wanted(&self, path: &Path) -> bool {
        self.targets.is_empty() || self.targets.iter().any(|t| path.starts_with(t))
    }
}

impl Archiver for GitArchiver {
    fn name(&self) -> &str {
        "git"
    }

    fn list_revisions(&self) -> Result<Vec<Revision>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        // Newest first from the walk; keep the newest N then flip
        let mut revisions = Vec::new();
        for oid in revwalk.take(self.max_revisions) {
            let commit = self.repo.find_commit(oid?)?;
            revisions.push(self.revision(&commit));
        }
        revisions.reverse();

        tracing::debug!(count = revisions.len(), "listed git revisions");
        Ok(revisions)
    }

    fn resolve(&self, reference: &str) -> Result<Revision> {
        let commit = self
            .repo
            .revparse_single(reference)
            .and_then(|object| object.peel_to_commit())
            .map_err(|_| ArchiverError::UnknownRevision(reference.to_string()))?;
        Ok(self.revision(&commit))
    }

    fn materialize(&self, revision: &Revision) -> Result<PathBuf> {
        let oid = Oid::from_str(&revision.key)
            .map_err(|_| ArchiverError::UnknownRevision(revision.key.clone()))?;
        let commit = self
            .repo
            .find_commit(oid)
            .map_err(|_| ArchiverError::UnknownRevision(revision.key.clone()))?;
        let tree = commit.tree()?;

        // 1. Collect blobs (the walk callback cannot propagate errors)
        let mut blobs: Vec<(String, Oid)> = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |dir, entry| {
            if entry.kind() == Some(ObjectType::Blob) && entry.filemode() != MODE_SYMLINK {
                if let Some(name) = entry.name() {
                    blobs.push((format!("{}{}", dir, name), entry.id()));
                }
            }
            TreeWalkResult::Ok
        })?;

        // 2. Reset the scratch directory
        if self.checkout_dir.exists() {
            std::fs::remove_dir_all(&self.checkout_dir)?;
        }
        std::fs::create_dir_all(&self.checkout_dir)?;

        // 3. Write every wanted blob
        let mut written = 0usize;
        for (path, oid) in blobs {
            let rel = normalize_path(Path::new(&path))?;
            if !self.wanted(&rel) {
                continue;
            }
            let blob = self.repo.find_blob(oid)?;
            let target = self.checkout_dir.join(&rel);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, blob.content())?;
            written += 1;
        }

        tracing::debug!(revision = %revision.short_key(), files = written, "materialized revision");
        Ok(self.checkout_dir.clone())
    }
}
