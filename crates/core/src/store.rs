//! Cache directory layout
//!
//! Manages the `.tidemark/` directory:
//! ```text
//! .tidemark/
//!   index.db/        revision index (sled)
//!   locks/
//!     build.lock
//!   checkout/        scratch tree for materialized revisions
//!   tmp/
//!   tidemark.log
//! ```

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Directories that never contain analysable sources
const PROTECTED_DIRS: &[&str] = &[".tidemark", ".git", ".jj", ".hg"];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no tidemark cache at {0}; run `tm build` first")]
    Missing(PathBuf),
}

/// Handle on an existing cache directory
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Create the cache directory structure (idempotent)
    pub fn init(cache_dir: &Path) -> Result<Self> {
        let store = Self {
            root: cache_dir.to_path_buf(),
        };
        for dir in [store.root.clone(), store.locks_dir(), store.checkout_dir(), store.tmp_dir()] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        tracing::debug!(cache = %cache_dir.display(), "initialized cache directory");
        Ok(store)
    }

    /// Open an existing cache directory
    pub fn open(cache_dir: &Path) -> Result<Self> {
        if !Self::exists(cache_dir) {
            return Err(StoreError::Missing(cache_dir.to_path_buf()).into());
        }
        Ok(Self {
            root: cache_dir.to_path_buf(),
        })
    }

    pub fn exists(cache_dir: &Path) -> bool {
        cache_dir.join("index.db").is_dir()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_dir(&self) -> PathBuf {
        self.root.join("index.db")
    }

    pub fn locks_dir(&self) -> PathBuf {
        self.root.join("locks")
    }

    pub fn checkout_dir(&self) -> PathBuf {
        self.root.join("checkout")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join("tidemark.log")
    }

    /// Delete the whole cache directory
    pub fn clean(self) -> Result<()> {
        std::fs::remove_dir_all(&self.root)
            .with_context(|| format!("Failed to remove {}", self.root.display()))
    }
}

/// Atomic write helper
///
/// Writes to a temporary file next to `target`, fsyncs it, then renames it
/// into place.
pub fn atomic_write(target: &Path, data: &[u8]) -> Result<()> {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)
        .with_context(|| format!("Failed to create {}", parent.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target)
        .with_context(|| format!("Failed to write {}", target.display()))?;
    Ok(())
}

/// Normalize a path for storage
///
/// - Converts to a relative path with `/` separators
/// - Rejects `..` and absolute paths
/// - Removes `./` prefixes
pub fn normalize_path(path: &Path) -> Result<PathBuf> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(
                part.to_str()
                    .with_context(|| format!("Non UTF-8 path: {}", path.display()))?
                    .to_string(),
            ),
            Component::CurDir => {}
            Component::ParentDir => anyhow::bail!("Path escapes the project root: {}", path.display()),
            Component::RootDir | Component::Prefix(_) => {
                anyhow::bail!("Path must be relative: {}", path.display())
            }
        }
    }
    Ok(PathBuf::from(parts.join("/")))
}

/// Check if a relative path lies in a protected directory
pub fn should_ignore(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(part) => PROTECTED_DIRS.iter().any(|d| part == *d),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_init_and_open() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let cache = temp_dir.path().join(".tidemark");

        assert!(Store::open(&cache).is_err());
        let store = Store::init(&cache)?;
        std::fs::create_dir_all(store.index_dir())?;

        assert!(store.locks_dir().is_dir());
        assert!(store.checkout_dir().is_dir());
        assert!(Store::exists(&cache));
        Store::open(&cache)?.clean()?;
        assert!(!cache.exists());
        Ok(())
    }

    #[test]
    fn test_missing_store_message() {
        let err = Store::open(Path::new("/nonexistent/.tidemark")).unwrap_err();
        assert!(err.to_string().contains("run `tm build` first"));
    }

    #[test]
    fn test_atomic_write() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let target = temp_dir.path().join("reports/out.json");

        atomic_write(&target, b"{\"issues\":[]}")?;
        assert_eq!(std::fs::read_to_string(&target)?, "{\"issues\":[]}");

        atomic_write(&target, b"second")?;
        assert_eq!(std::fs::read_to_string(&target)?, "second");

        let leftovers = std::fs::read_dir(temp_dir.path().join("reports"))?.count();
        assert_eq!(leftovers, 1);
        Ok(())
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("./src/app.py")).unwrap(), PathBuf::from("src/app.py"));
        assert_eq!(normalize_path(Path::new("src//lib.rs")).unwrap(), PathBuf::from("src/lib.rs"));
        assert!(normalize_path(Path::new("../outside.py")).is_err());
        assert!(normalize_path(Path::new("/etc/passwd")).is_err());
    }

    #[test]
    fn test_should_ignore() {
        assert!(should_ignore(Path::new(".tidemark/index.db")));
        assert!(should_ignore(Path::new(".git/HEAD")));
        assert!(should_ignore(Path::new("vendor/.git/config")));
        assert!(!should_ignore(Path::new("src/main.rs")));
        assert!(!should_ignore(Path::new("src/.gitkeep")));
    }
}
