//! Build lock
//!
//! The revision index has one writer at a time. `tm build` holds an exclusive
//! `flock` on `<cache>/locks/build.lock` for its whole run. The file records
//! the owner's PID for error messages; a file left behind by a killed process
//! is overwritten once the flock is ours.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "locks/build.lock";

/// Exclusive build lock, released on drop
pub struct BuildLock {
    path: PathBuf,
    // Holds the flock
    _file: File,
}

/// Lock file content
#[derive(Debug, Serialize, Deserialize)]
struct LockOwner {
    pid: u32,
    started_at: i64,
}

impl BuildLock {
    /// Acquire the lock for the cache at `cache_dir`
    ///
    /// Fails when another live process is building.
    pub fn acquire(cache_dir: &Path) -> Result<Self> {
        let lock_path = cache_dir.join(LOCK_FILE);
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create locks directory")?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&lock_path)
            .context("Failed to open build lock")?;

        if !try_flock_exclusive(&file)? {
            // The holder may not have written its owner record yet
            return Err(match read_owner(&mut file) {
                Ok(owner) if is_process_alive(owner.pid) => anyhow::anyhow!(
                    "another build is running (pid {}, started {})",
                    owner.pid,
                    crate::util::format_date(owner.started_at)
                ),
                _ => anyhow::anyhow!("another build is running (lock {})", lock_path.display()),
            });
        }

        if let Ok(previous) = read_owner(&mut file) {
            tracing::warn!(pid = previous.pid, path = %lock_path.display(), "reclaiming stale build lock");
        }
        write_owner(&mut file)?;
        tracing::debug!(path = %lock_path.display(), "acquired build lock");

        Ok(Self {
            path: lock_path,
            _file: file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BuildLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn write_owner(file: &mut File) -> Result<()> {
    let owner = LockOwner {
        pid: std::process::id(),
        started_at: chrono::Utc::now().timestamp(),
    };
    let serialized = serde_json::to_string(&owner).context("Failed to serialize lock owner")?;

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(serialized.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

fn read_owner(file: &mut File) -> Result<LockOwner> {
    file.seek(SeekFrom::Start(0))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    serde_json::from_str(&contents).context("Failed to parse lock owner")
}

#[cfg(unix)]
fn try_flock_exclusive(file: &File) -> Result<bool> {
    use nix::fcntl::{flock, FlockArg};
    use std::os::unix::io::AsRawFd;

    match flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
        Ok(()) => Ok(true),
        Err(nix::errno::Errno::EWOULDBLOCK) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(not(unix))]
fn try_flock_exclusive(_file: &File) -> Result<bool> {
    Ok(true)
}

#[cfg(target_os = "linux")]
fn is_process_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{}", pid)).exists()
}

#[cfg(all(unix, not(target_os = "linux")))]
fn is_process_alive(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    // Null signal: existence check only
    match kill(Pid::from_raw(pid as i32), None) {
        Ok(()) => true,
        Err(nix::errno::Errno::ESRCH) => false,
        Err(_) => true,
    }
}

#[cfg(not(unix))]
fn is_process_alive(_pid: u32) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_is_exclusive() {
        let temp_dir = TempDir::new().unwrap();

        let first = BuildLock::acquire(temp_dir.path()).unwrap();
        let err = BuildLock::acquire(temp_dir.path()).err().unwrap();
        assert!(err.to_string().contains("another build is running"));

        drop(first);
        assert!(BuildLock::acquire(temp_dir.path()).is_ok());
    }

    #[test]
    fn test_drop_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let lock = BuildLock::acquire(temp_dir.path()).unwrap();
        let path = lock.path().to_path_buf();
        assert!(path.exists());

        drop(lock);
        assert!(!path.exists());
    }

    #[test]
    fn test_owner_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(temp_dir.path().join("owner.lock"))
            .unwrap();

        write_owner(&mut file).unwrap();
        let owner = read_owner(&mut file).unwrap();
        assert_eq!(owner.pid, std::process::id());
        assert!(owner.started_at > 0);
    }

    #[test]
    fn test_leftover_file_without_flock_is_reclaimed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(LOCK_FILE);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"pid":999999,"started_at":0}"#).unwrap();

        let lock = BuildLock::acquire(temp_dir.path()).unwrap();
        let content = std::fs::read_to_string(lock.path()).unwrap();
        assert!(content.contains(&std::process::id().to_string()));
    }

    #[test]
    fn test_held_lock_without_owner_is_not_removed() {
        use nix::fcntl::{flock, FlockArg};
        use std::os::unix::io::AsRawFd;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(LOCK_FILE);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let holder = OpenOptions::new().create(true).write(true).open(&path).unwrap();
        flock(holder.as_raw_fd(), FlockArg::LockExclusiveNonblock).unwrap();

        let err = BuildLock::acquire(temp_dir.path()).err().unwrap();
        assert!(err.to_string().contains("another build is running"));
        assert!(path.exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_process_alive() {
        assert!(is_process_alive(std::process::id()));
        assert!(!is_process_alive(999_999));
    }
}
