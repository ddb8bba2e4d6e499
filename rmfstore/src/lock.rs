// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Advisory cross-process locking
//!
//! The lock is a sidecar `<path>.lock` file created exclusively. Processes
//! that bypass it are not protected.

use crate::config::LockConfig;
use crate::error::{RmfError, RmfResult};
use crate::file::FileHandle;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Held advisory lock; released on drop
///
/// Releasing never flushes. Call [`FileHandle::flush`] before dropping the
/// guard if the next holder must see the changes.
#[derive(Debug)]
pub struct FileLock {
    file: FileHandle,
    lock_path: PathBuf,
}

impl FileLock {
    pub(crate) fn acquire(file: &FileHandle, config: &LockConfig) -> RmfResult<Self> {
        let lock_path = lock_path_for(file)?;
        let attempts = config.max_attempts.max(1);
        for attempt in 1..=attempts {
            if let Some(lock) = Self::attempt(file, &lock_path)? {
                if attempt > 1 {
                    log::info!(
                        "Acquired lock {} after {} attempts",
                        lock_path.display(),
                        attempt
                    );
                }
                return Ok(lock);
            }
            if attempt == 1 {
                log::warn!(
                    "Lock {} is held, retrying every {} ms",
                    lock_path.display(),
                    config.retry_interval_ms
                );
            }
            if attempt < attempts {
                std::thread::sleep(config.retry_interval());
            }
        }
        Err(RmfError::Io(format!(
            "Timed out waiting for lock {} after {} attempts",
            lock_path.display(),
            attempts
        )))
    }

    pub(crate) fn try_acquire(file: &FileHandle) -> RmfResult<Option<Self>> {
        let lock_path = lock_path_for(file)?;
        Self::attempt(file, &lock_path)
    }

    fn attempt(file: &FileHandle, lock_path: &Path) -> RmfResult<Option<Self>> {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(lock_path)
        {
            Ok(mut handle) => {
                // owner pid, only for humans inspecting a stale lock
                if let Err(e) = writeln!(handle, "{}", std::process::id()) {
                    log::warn!("Can't record owner in {}: {}", lock_path.display(), e);
                }
                log::info!("Acquired lock {}", lock_path.display());
                Ok(Some(Self {
                    file: file.clone(),
                    lock_path: lock_path.to_path_buf(),
                }))
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(RmfError::Io(format!(
                "Can't create lock {}: {}",
                lock_path.display(),
                e
            ))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.lock_path
    }

    pub fn file(&self) -> &FileHandle {
        &self.file
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.lock_path) {
            Ok(()) => log::info!("Released lock {}", self.lock_path.display()),
            Err(e) => log::error!("Can't remove lock {}: {}", self.lock_path.display(), e),
        }
    }
}

fn lock_path_for(file: &FileHandle) -> RmfResult<PathBuf> {
    let Some(path) = file.path() else {
        return Err(RmfError::Usage(
            "Files without a path can't be locked".to_string(),
        ));
    };
    let mut lock = path.into_os_string();
    lock.push(".lock");
    Ok(PathBuf::from(lock))
}
