//! Single-run lock file.
//!
//! Two runs sharing a lock path never overlap: the lock file is created with
//! `create_new`, holds the owner's pid, and is removed when the [`RunLock`]
//! is dropped. A lock left behind by a crashed run is reclaimed once it is
//! older than the stale age.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use thiserror::Error;
use tracing::{debug, warn};

/// Errors acquiring the run lock.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another run owns the lock.
    #[error("another run holds {} (owner: {owner})", .path.display())]
    Held { path: PathBuf, owner: String },

    #[error("lock file {}: {err}", .path.display())]
    Io { path: PathBuf, err: std::io::Error },
}

/// Guard for an acquired lock file.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Acquire the lock at `path`, reclaiming it if it is older than
    /// `stale_after`.
    pub fn acquire(path: impl AsRef<Path>, stale_after: Duration) -> Result<Self, LockError> {
        let path = path.as_ref().to_path_buf();
        let io = |err| LockError::Io {
            path: path.clone(),
            err,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io)?;
        }

        // A second attempt is made only after removing a stale lock.
        for _ in 0..2 {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    writeln!(file, "{}", std::process::id()).map_err(io)?;
                    debug!(path = %path.display(), "acquired run lock");
                    return Ok(Self { path });
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    if lock_age(&path).is_some_and(|age| age > stale_after)
                        && reclaim_stale(&path, stale_after).map_err(io)?
                    {
                        continue;
                    }
                    return Err(LockError::Held {
                        owner: read_owner(&path),
                        path,
                    });
                }
                Err(err) => return Err(io(err)),
            }
        }

        Err(LockError::Held {
            owner: read_owner(&path),
            path,
        })
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %err, "failed to remove run lock");
        }
    }
}

/// Remove a stale lock without racing other reclaimers.
///
/// The lock is first renamed to a name unique to this process, so only one
/// reclaimer can take any given file. If the file taken turns out to be
/// fresh, another run has re-created the lock since the staleness check and
/// it is linked back into place. Returns whether a stale lock was removed.
fn reclaim_stale(path: &Path, stale_after: Duration) -> std::io::Result<bool> {
    let tombstone = tombstone_path(path);
    match fs::rename(path, &tombstone) {
        Ok(()) => {}
        // Someone else reclaimed it first; retry the create.
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(true),
        Err(err) => return Err(err),
    }

    match lock_age(&tombstone) {
        Some(age) if age > stale_after => {
            warn!(path = %path.display(), ?age, "reclaiming stale run lock");
            fs::remove_file(&tombstone)?;
            Ok(true)
        }
        _ => {
            debug!(path = %path.display(), "lock was re-created, putting it back");
            let restored = fs::hard_link(&tombstone, path);
            fs::remove_file(&tombstone)?;
            match restored {
                Ok(()) => Ok(false),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(false),
                Err(err) => Err(err),
            }
        }
    }
}

fn tombstone_path(path: &Path) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".stale.{}.{}", std::process::id(), nanos));
    path.with_file_name(name)
}

fn lock_age(path: &Path) -> Option<Duration> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    SystemTime::now().duration_since(modified).ok()
}

fn read_owner(path: &Path) -> String {
    fs::read_to_string(path)
        .ok()
        .map(|pid| pid.trim().to_string())
        .filter(|pid| !pid.is_empty())
        .map(|pid| format!("pid {}", pid))
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STALE: Duration = Duration::from_secs(120);

    #[test]
    fn test_second_acquire_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleetwatch.lock");

        let first = RunLock::acquire(&path, STALE).unwrap();
        let err = RunLock::acquire(&path, STALE).unwrap_err();
        match err {
            LockError::Held { owner, .. } => {
                assert_eq!(owner, format!("pid {}", std::process::id()))
            }
            other => panic!("unexpected error: {other}"),
        }
        drop(first);
    }

    #[test]
    fn test_drop_releases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run").join("fleetwatch.lock");

        let lock = RunLock::acquire(&path, STALE).unwrap();
        assert!(path.exists());
        assert_eq!(lock.path(), path.as_path());
        drop(lock);
        assert!(!path.exists());

        let again = RunLock::acquire(&path, STALE).unwrap();
        drop(again);
    }

    #[test]
    fn test_stale_lock_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleetwatch.lock");

        let file = fs::File::create(&path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(3600))
            .unwrap();
        drop(file);

        let lock = RunLock::acquire(&path, STALE).unwrap();
        let owner = fs::read_to_string(lock.path()).unwrap();
        assert_eq!(owner.trim(), std::process::id().to_string());
    }

    #[test]
    fn test_late_reclaimer_keeps_fresh_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleetwatch.lock");

        // This run reclaimed a stale lock and now holds a fresh one; a second
        // process that judged the old file stale reclaims afterwards.
        let held = RunLock::acquire(&path, STALE).unwrap();
        assert!(!reclaim_stale(&path, STALE).unwrap());

        let owner = fs::read_to_string(&path).unwrap();
        assert_eq!(owner.trim(), std::process::id().to_string());
        assert!(matches!(
            RunLock::acquire(&path, STALE),
            Err(LockError::Held { .. })
        ));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
        drop(held);
        assert!(!path.exists());
    }

    #[test]
    fn test_reclaim_of_vanished_lock_retries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleetwatch.lock");
        assert!(reclaim_stale(&path, STALE).unwrap());
    }

    #[test]
    fn test_fresh_foreign_lock_is_held() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleetwatch.lock");
        fs::write(&path, "").unwrap();

        let err = RunLock::acquire(&path, STALE).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("another run holds {} (owner: unknown)", path.display())
        );
    }
}
