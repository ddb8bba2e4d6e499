// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Raw key-value storage drivers
//!
//! This module provides trait-based abstractions over embedded key-value
//! stores. The columnar backend lays its dense tables out on top of these
//! drivers, so the same table code runs on disk (Sled) or purely in memory.
//!
//! # Architecture
//!
//! ```text
//! ColumnarSharedData (node index / value tables)
//!     ↓
//! DataSet (dense N-dimensional table over one tree)
//!     ↓
//! StorageDriver (key-value abstraction)
//!     ↓
//! Concrete Implementations (Sled, Memory)
//! ```

// Core modules
pub mod factory;
pub mod traits;
pub mod types;

// Driver implementations
pub mod memory;
#[cfg(feature = "sled-backend")]
pub mod sled;

// Public API re-exports
pub use factory::create_storage_driver;
pub use traits::{DynStorageDriver, StorageDriver, StorageTree, TreeStatistics};
pub use types::{StorageDriverError, StorageResult, StorageType};
