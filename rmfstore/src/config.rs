// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Store configuration

use crate::error::{RmfError, RmfResult};
use crate::storage::StorageType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Physical layout used for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// Dense tables with lazy per-category column allocation
    #[default]
    Columnar,
    /// One self-contained serialized document
    Flat,
}

impl std::str::FromStr for BackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "columnar" => Ok(BackendType::Columnar),
            "flat" => Ok(BackendType::Flat),
            _ => Err(format!(
                "Unknown backend type: {}. Valid options: columnar, flat",
                s
            )),
        }
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendType::Columnar => write!(f, "columnar"),
            BackendType::Flat => write!(f, "flat"),
        }
    }
}

/// Advisory lock polling parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Delay between two attempts to take the lock
    pub retry_interval_ms: u64,

    /// Attempts before giving up
    pub max_attempts: u32,
}

impl LockConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: 100,
            max_attempts: 50,
        }
    }
}

/// Configuration used when creating or opening a file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Physical layout of newly created files
    pub backend: BackendType,

    /// Key-value driver under the columnar layout
    pub driver: StorageType,

    /// Expected number of frames; only used to size per-frame tables up front
    pub frames_hint: u32,

    /// Advisory lock settings
    pub lock: LockConfig,

    /// Reject every write operation
    pub read_only: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendType::Columnar,
            driver: StorageType::Sled,
            frames_hint: 0,
            lock: LockConfig::default(),
            read_only: false,
        }
    }
}

impl StoreConfig {
    /// Configuration for a flat file
    pub fn flat() -> Self {
        Self {
            backend: BackendType::Flat,
            ..Self::default()
        }
    }

    /// Configuration for a columnar file that lives only in memory
    pub fn in_memory() -> Self {
        Self {
            driver: StorageType::Memory,
            ..Self::default()
        }
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn from_json_str(json: &str) -> RmfResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> RmfResult<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            RmfError::Io(format!(
                "Failed to read config {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json_str(&text)
    }
}
