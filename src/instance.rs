//! Cross-process single-instance guard.
//!
//! Exclusivity is an advisory `flock` on `<runtime_dir>/<app-id>-<version>.lock`.
//! The kernel drops the lock when its holder dies, so a crashed instance leaves
//! at most a file with a stale PID behind; that file is reclaimed on the next
//! acquire.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use log::{debug, info, warn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("Another instance is already running{}", .pid.map(|p| format!(" (pid {p})")).unwrap_or_default())]
    Busy { pid: Option<u32> },

    #[error("Failed to access instance lock {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub struct InstanceGuard {
    lock_path: PathBuf,
}

impl InstanceGuard {
    pub fn new(dir: impl Into<PathBuf>, key: &str) -> Self {
        Self {
            lock_path: dir.into().join(format!("{key}.lock")),
        }
    }

    /// Guard keyed `<app_id>-<version>` in `$XDG_RUNTIME_DIR` (or the temp dir).
    pub fn for_app(app_id: &str, version: &str) -> Self {
        let dir = dirs::runtime_dir().unwrap_or_else(std::env::temp_dir);
        Self::new(dir, &format!("{app_id}-{version}"))
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Take exclusivity, or return a bypassed token when several instances are allowed.
    pub fn acquire(&self, allow_multiple: bool) -> Result<InstanceToken, InstanceError> {
        if allow_multiple {
            debug!("Multiple instances allowed; skipping instance lock");
            return Ok(InstanceToken { held: None });
        }

        self.reclaim_stale()?;

        let io_err = |source: io::Error| InstanceError::Io {
            path: self.lock_path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(io_err)?;

        if let Err(e) = file.try_lock_exclusive() {
            return Err(contended_or_io(e, &mut file, &self.lock_path));
        }

        file.set_len(0).map_err(io_err)?;
        write!(file, "{}", std::process::id()).map_err(io_err)?;
        file.flush().map_err(io_err)?;

        info!("Acquired instance lock {}", self.lock_path.display());
        Ok(InstanceToken {
            held: Some(HeldLock {
                file,
                path: self.lock_path.clone(),
            }),
        })
    }

    /// Attach to a leftover lock file and release it if nobody holds it.
    ///
    /// The file itself is kept: unlinking it could let a concurrent launcher
    /// lock an orphaned inode.
    fn reclaim_stale(&self) -> Result<(), InstanceError> {
        let mut file = match OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.lock_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(InstanceError::Io {
                    path: self.lock_path.clone(),
                    source,
                });
            }
        };

        if let Err(e) = file.try_lock_exclusive() {
            return Err(contended_or_io(e, &mut file, &self.lock_path));
        }

        if let Some(pid) = read_pid(&mut file) {
            info!(
                "Reclaiming instance lock left by pid {} at {}",
                pid,
                self.lock_path.display()
            );
        }
        if let Err(e) = file.unlock() {
            warn!(
                "Failed to release stale instance lock {}: {}",
                self.lock_path.display(),
                e
            );
        }
        Ok(())
    }
}

fn contended_or_io(err: io::Error, file: &mut File, path: &Path) -> InstanceError {
    if err.kind() == fs2::lock_contended_error().kind() {
        InstanceError::Busy {
            pid: read_pid(file),
        }
    } else {
        InstanceError::Io {
            path: path.to_path_buf(),
            source: err,
        }
    }
}

fn read_pid(file: &mut File) -> Option<u32> {
    let mut text = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut text).ok()?;
    text.trim().parse().ok()
}

struct HeldLock {
    file: File,
    path: PathBuf,
}

/// Proof of exclusivity. Released on [`InstanceToken::release`] or drop.
pub struct InstanceToken {
    held: Option<HeldLock>,
}

impl InstanceToken {
    /// True when the guard was skipped because multiple instances are allowed.
    pub fn is_bypassed(&self) -> bool {
        self.held.is_none()
    }

    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        let Some(held) = self.held.take() else {
            return;
        };
        if let Err(e) = held.file.set_len(0) {
            debug!("Failed to clear pid in {}: {}", held.path.display(), e);
        }
        match held.file.unlock() {
            Ok(()) => info!("Released instance lock {}", held.path.display()),
            Err(e) => warn!(
                "Failed to unlock instance lock {}: {}",
                held.path.display(),
                e
            ),
        }
    }
}

impl Drop for InstanceToken {
    fn drop(&mut self) {
        self.release_inner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn second_acquire_fails_until_release() {
        let dir = TempDir::new().unwrap();
        let guard = InstanceGuard::new(dir.path(), "org.example.Test-1.0");

        let token = guard.acquire(false).unwrap();
        assert!(!token.is_bypassed());

        match guard.acquire(false) {
            Err(InstanceError::Busy { pid }) => assert_eq!(pid, Some(std::process::id())),
            Err(other) => panic!("expected Busy, got {other}"),
            Ok(_) => panic!("expected Busy, got a token"),
        }

        token.release();
        assert!(guard.acquire(false).is_ok());
    }

    #[test]
    fn allowed_multiple_instances_bypass_lock() {
        let dir = TempDir::new().unwrap();
        let guard = InstanceGuard::new(dir.path(), "app-1");

        let _held = guard.acquire(false).unwrap();
        let bypassed = guard.acquire(true).unwrap();
        assert!(bypassed.is_bypassed());
    }

    #[test]
    fn stale_lock_file_is_reclaimed() {
        let dir = TempDir::new().unwrap();
        let guard = InstanceGuard::new(dir.path(), "app-1");
        fs::write(guard.lock_path(), "999999").unwrap();

        let _token = guard.acquire(false).unwrap();
        let pid = fs::read_to_string(guard.lock_path()).unwrap();
        assert_eq!(pid, std::process::id().to_string());
    }

    #[test]
    fn dropping_token_releases_lock() {
        let dir = TempDir::new().unwrap();
        let guard = InstanceGuard::new(dir.path(), "app-1");
        drop(guard.acquire(false).unwrap());
        assert!(guard.acquire(false).is_ok());
    }
}
