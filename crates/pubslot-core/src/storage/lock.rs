//! Cross-process run lock.
//!
//! Cron-driven and manual runs are separate processes, so the in-process
//! [`SingleFlight`](crate::trigger::SingleFlight) guard is not enough on its
//! own. The lock is a file created with `create_new`; whoever creates it owns
//! the run until the guard is dropped. A lock older than `stale_after` is
//! assumed to belong to a crashed run and is taken over.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::warn;

use crate::error::TriggerError;

#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Take the lock for `scope` inside `dir`.
    ///
    /// # Errors
    /// [`TriggerError::RunInProgress`] when a live lock exists,
    /// [`TriggerError::LockUnavailable`] when the file cannot be written.
    pub fn acquire(dir: &Path, scope: &str, stale_after: Duration) -> Result<Self, TriggerError> {
        let path = dir.join(format!("{scope}.lock"));

        for _ in 0..2 {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let stamp = format!(
                        "{} {}\n",
                        std::process::id(),
                        chrono::Utc::now().to_rfc3339()
                    );
                    file.write_all(stamp.as_bytes())
                        .map_err(|e| unavailable(&path, e))?;
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if !is_stale(&path, stale_after) {
                        return Err(TriggerError::RunInProgress {
                            scope: scope.to_string(),
                        });
                    }
                    warn!(path = %path.display(), "taking over stale run lock");
                    match fs::remove_file(&path) {
                        Ok(()) => {}
                        Err(e) if e.kind() == ErrorKind::NotFound => {}
                        Err(e) => return Err(unavailable(&path, e)),
                    }
                }
                Err(e) => return Err(unavailable(&path, e)),
            }
        }

        // Another process re-created the lock between removal and retry.
        Err(TriggerError::RunInProgress {
            scope: scope.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn is_stale(path: &Path, stale_after: Duration) -> bool {
    let modified = match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(t) => t,
        // Vanished or unreadable: let the retry decide.
        Err(_) => return true,
    };
    SystemTime::now()
        .duration_since(modified)
        .map(|age| age > stale_after)
        .unwrap_or(false)
}

fn unavailable(path: &Path, err: std::io::Error) -> TriggerError {
    TriggerError::LockUnavailable {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
