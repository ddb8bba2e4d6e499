// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage driver factory

use super::traits::DynStorageDriver;
use super::types::{StorageResult, StorageType};
use std::path::Path;

/// Create a storage driver of the requested type at `path`
///
/// The memory driver ignores the path.
pub fn create_storage_driver<P: AsRef<Path>>(
    storage_type: StorageType,
    path: P,
) -> StorageResult<DynStorageDriver> {
    match storage_type {
        #[cfg(feature = "sled-backend")]
        StorageType::Sled => {
            use super::sled::SledDriver;
            use super::traits::StorageDriver;
            let driver = SledDriver::open(path)?;
            Ok(Box::new(driver) as DynStorageDriver)
        }
        #[cfg(not(feature = "sled-backend"))]
        StorageType::Sled => {
            let _ = path;
            Err(super::types::StorageDriverError::BackendSpecific(
                "Sled storage backend not compiled in".to_string(),
            ))
        }
        StorageType::Memory => {
            use super::memory::MemoryStorageDriver;
            Ok(Box::new(MemoryStorageDriver::new()) as DynStorageDriver)
        }
    }
}
