// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for the storage engine
//!
//! Every failure falls in one of three families:
//! - `Usage`: the caller violated a precondition (duplicate names, bad arity,
//!   writing a null sentinel, reading a required value that is absent, ...)
//! - `Io`: the physical resource could not be opened, created, read or flushed
//! - `Internal`: an invariant inside a backend was broken (a defect)
//!
//! Absent values are not errors; `get_value_always` and `get_has_value`
//! report sparsity through the null sentinel instead.

use crate::storage::StorageDriverError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RmfError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RmfError {
    /// True if the error is a caller precondition violation
    pub fn is_usage(&self) -> bool {
        matches!(self, RmfError::Usage(_))
    }

    /// True if the error comes from the physical resource
    pub fn is_io(&self) -> bool {
        matches!(self, RmfError::Io(_))
    }

    /// Build an internal error and log it, since it indicates a defect
    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        log::error!("Internal invariant broken: {}", msg);
        RmfError::Internal(msg)
    }
}

impl From<std::io::Error> for RmfError {
    fn from(err: std::io::Error) -> Self {
        RmfError::Io(err.to_string())
    }
}

impl From<bincode::Error> for RmfError {
    fn from(err: bincode::Error) -> Self {
        RmfError::Io(format!("corrupt or unreadable data: {}", err))
    }
}

impl From<serde_json::Error> for RmfError {
    fn from(err: serde_json::Error) -> Self {
        RmfError::Io(err.to_string())
    }
}

impl From<StorageDriverError> for RmfError {
    fn from(err: StorageDriverError) -> Self {
        RmfError::Io(err.to_string())
    }
}

/// Fail with a usage error unless `cond` holds
macro_rules! usage_check {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::RmfError::Usage(format!($($arg)+)));
        }
    };
}

pub(crate) use usage_check;

pub type RmfResult<T> = Result<T, RmfError>;
