//! Single-instance lock using PID files
//!
//! Two reconciliation passes draining the same queue would clear each
//! other's snapshots, so `reconcile` and `schedule` hold this lock.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use listsync_domain::{ListSyncError, Result};

const PID_FILE_NAME: &str = "listsync.pid";

/// Held PID file; removed again on drop.
#[derive(Debug)]
pub struct InstanceLock {
    pid_file: PathBuf,
}

impl InstanceLock {
    /// Take the lock in `lock_dir`, creating the directory if needed.
    ///
    /// The PID file is created atomically, so of several concurrent callers
    /// exactly one wins. Fails if the PID file names a process that is still
    /// running. A PID file left behind by a dead process is replaced.
    pub fn acquire<P: AsRef<Path>>(lock_dir: P) -> Result<Self> {
        let lock_dir = lock_dir.as_ref();
        fs::create_dir_all(lock_dir).map_err(|e| {
            ListSyncError::Internal(format!(
                "Failed to create lock directory {}: {e}",
                lock_dir.display()
            ))
        })?;
        let pid_file = lock_dir.join(PID_FILE_NAME);
        let current_pid = std::process::id();

        // One retry after clearing a stale file; a second collision means
        // another instance won the race.
        for attempt in 0..2 {
            match Self::create_pid_file(&pid_file, current_pid) {
                Ok(()) => {
                    tracing::debug!(pid = current_pid, path = %pid_file.display(), "instance_lock.acquired");
                    return Ok(Self { pid_file });
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists && attempt == 0 => {
                    Self::clear_stale(&pid_file)?;
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => break,
                Err(err) => {
                    return Err(ListSyncError::Internal(format!("Failed to create PID file: {err}")));
                }
            }
        }

        Err(ListSyncError::Internal(format!(
            "Another listsync instance took the lock at {}",
            pid_file.display()
        )))
    }

    /// Create the PID file only if it does not exist yet.
    fn create_pid_file(pid_file: &Path, pid: u32) -> io::Result<()> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(pid_file)?;
        file.write_all(pid.to_string().as_bytes())?;
        file.sync_all()
    }

    /// Remove an existing PID file unless it belongs to a live process.
    ///
    /// An empty file is a competing instance between create and write.
    fn clear_stale(pid_file: &Path) -> Result<()> {
        let contents = fs::read_to_string(pid_file).unwrap_or_default();
        if contents.trim().is_empty() {
            return Err(ListSyncError::Internal(format!(
                "Another listsync instance is starting ({} is empty)",
                pid_file.display()
            )));
        }
        if let Ok(pid) = contents.trim().parse::<u32>() {
            if Self::is_process_running(pid) {
                tracing::warn!(existing_pid = pid, "instance_lock.process_active");
                return Err(ListSyncError::Internal(format!(
                    "Another listsync instance is already running (PID: {pid})"
                )));
            }
            tracing::warn!(stale_pid = pid, "instance_lock.stale_pid_file_detected");
        }
        match fs::remove_file(pid_file) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                tracing::warn!(error = %err, path = %pid_file.display(), "instance_lock.remove_stale_pid_failed");
                Err(ListSyncError::Internal(format!("Failed to remove stale PID file: {err}")))
            }
        }
    }

    pub fn pid_file(&self) -> &Path {
        &self.pid_file
    }

    #[cfg(target_os = "linux")]
    fn is_process_running(pid: u32) -> bool {
        Path::new("/proc").join(pid.to_string()).exists()
    }

    #[cfg(all(unix, not(target_os = "linux")))]
    fn is_process_running(pid: u32) -> bool {
        use std::process::Command;

        // `kill -0` probes for the process without signalling it
        Command::new("kill")
            .arg("-0")
            .arg(pid.to_string())
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    fn is_process_running(pid: u32) -> bool {
        tracing::warn!(pid, "instance_lock.process_check_unsupported");
        false
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.pid_file) {
            tracing::warn!(error = %e, path = %self.pid_file.display(), "instance_lock.remove_pid_failed");
        } else {
            tracing::debug!(path = %self.pid_file.display(), "instance_lock.released");
        }
    }
}
