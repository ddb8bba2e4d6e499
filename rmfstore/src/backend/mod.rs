// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Backend contract
//!
//! Every physical layout implements [`SharedData`]. Handles never talk to a
//! layout directly, so the two implementations are interchangeable and can
//! be validated by one conformance suite.
//!
//! # Architecture
//!
//! ```text
//! FileHandle / NodeHandle / decorators
//!     ↓
//! SharedData (this contract)
//!     ↓
//! ColumnarSharedData (dense tables over a StorageDriver) | FlatSharedData (one document)
//! ```
//!
//! Reads take `&self`; implementations keep their caches behind interior
//! locks. Writes take `&mut self`.

pub mod columnar;
pub mod flat;

use crate::config::{BackendType, StoreConfig};
use crate::error::{usage_check, RmfError, RmfResult};
use crate::keys::{Arity, Category, KeyInfo};
use crate::node::{NodeType, SetType};
use crate::types::{NodeId, Value, ValueType};
use std::io::Read;
use std::path::Path;

pub use columnar::ColumnarSharedData;
pub use flat::FlatSharedData;

/// Operations every storage layout provides
pub trait SharedData: Send + Sync {
    /// Location of the file, `None` for in-memory buffers and stores
    fn path(&self) -> Option<&Path>;

    fn backend_type(&self) -> BackendType;

    fn is_read_only(&self) -> bool;

    // ---- nodes ----

    /// Append a node and link it as the new first child of `parent`
    fn add_child(&mut self, parent: NodeId, name: &str, node_type: NodeType)
        -> RmfResult<NodeId>;

    fn get_number_of_nodes(&self) -> u32;

    fn get_name(&self, node: NodeId) -> RmfResult<String>;

    fn set_name(&mut self, node: NodeId, name: &str) -> RmfResult<()>;

    fn get_type(&self, node: NodeId) -> RmfResult<NodeType>;

    fn set_type(&mut self, node: NodeId, node_type: NodeType) -> RmfResult<()>;

    /// Most recently added child, or `NodeId::NULL`
    fn get_first_child(&self, node: NodeId) -> RmfResult<NodeId>;

    /// Next older sibling, or `NodeId::NULL`
    fn get_sibling(&self, node: NodeId) -> RmfResult<NodeId>;

    /// Raw children, most recent first; links are not resolved
    fn get_children(&self, node: NodeId) -> RmfResult<Vec<NodeId>> {
        let mut children = Vec::new();
        let mut cur = self.get_first_child(node)?;
        while !cur.is_null() {
            children.push(cur);
            cur = self.get_sibling(cur)?;
        }
        Ok(children)
    }

    // ---- node sets ----

    /// Create an immutable set; the arity is the member count
    fn add_set(&mut self, members: &[NodeId], set_type: SetType) -> RmfResult<u32>;

    fn get_number_of_sets(&self, arity: Arity) -> u32;

    fn get_set_member(&self, arity: Arity, set: u32, member: usize) -> RmfResult<NodeId>;

    fn get_set_type(&self, arity: Arity, set: u32) -> RmfResult<SetType>;

    // ---- registry ----

    /// Fails if a category of that arity already has the name
    fn add_category(&mut self, arity: Arity, name: &str) -> RmfResult<Category>;

    fn get_category(&self, arity: Arity, name: &str) -> RmfResult<Option<Category>>;

    fn get_categories(&self, arity: Arity) -> RmfResult<Vec<Category>>;

    fn get_category_name(&self, category: Category) -> RmfResult<String>;

    /// Fails if the name is taken for (category, type, per-frame)
    fn add_key(
        &mut self,
        category: Category,
        name: &str,
        value_type: ValueType,
        per_frame: bool,
    ) -> RmfResult<KeyInfo>;

    fn get_key(
        &self,
        category: Category,
        name: &str,
        value_type: ValueType,
        per_frame: bool,
    ) -> RmfResult<Option<KeyInfo>>;

    /// Keys of one type in a category, static ones first
    fn get_keys(&self, category: Category, value_type: ValueType) -> RmfResult<Vec<KeyInfo>>;

    fn get_key_name(&self, key: &KeyInfo) -> RmfResult<String>;

    // ---- values ----

    /// Value or the type's null sentinel; `frame` is ignored for static keys
    fn get_value_always(&self, id: u32, key: &KeyInfo, frame: u32) -> RmfResult<Value>;

    /// Value, failing with a usage error if it is absent
    fn get_value(&self, id: u32, key: &KeyInfo, frame: u32) -> RmfResult<Value> {
        let value = self.get_value_always(id, key, frame)?;
        if value.is_null() {
            let name = self.get_key_name(key)?;
            return Err(RmfError::Usage(format!(
                "No value for key \"{}\" on object {} of arity {}",
                name,
                id,
                key.arity()
            )));
        }
        Ok(value)
    }

    fn get_has_value(&self, id: u32, key: &KeyInfo, frame: u32) -> RmfResult<bool> {
        Ok(!self.get_value_always(id, key, frame)?.is_null())
    }

    /// Store a non-null value of the key's type
    fn set_value(&mut self, id: u32, key: &KeyInfo, frame: u32, value: Value) -> RmfResult<()>;

    /// 1 + the highest frame written for a per-frame key
    fn get_number_of_frames(&self, key: &KeyInfo) -> RmfResult<u32>;

    // ---- file metadata ----

    fn get_description(&self) -> RmfResult<String>;

    fn set_description(&mut self, description: &str) -> RmfResult<()>;

    fn get_producer(&self) -> RmfResult<String>;

    fn set_producer(&mut self, producer: &str) -> RmfResult<()>;

    fn get_frame_name(&self, frame: u32) -> RmfResult<String>;

    fn set_frame_name(&mut self, frame: u32, name: &str) -> RmfResult<()>;

    // ---- lifecycle ----

    /// Durability barrier
    fn flush(&mut self) -> RmfResult<()>;

    /// Drop cached state and re-read the physical file
    fn reload(&mut self) -> RmfResult<()>;

    /// Physical size in bytes
    fn footprint(&self) -> RmfResult<u64>;

    /// Serialize the whole file into one blob
    fn to_buffer(&self) -> RmfResult<Vec<u8>> {
        Err(RmfError::Usage(format!(
            "The {} backend can't be written to a buffer",
            self.backend_type()
        )))
    }
}

pub type DynSharedData = Box<dyn SharedData>;

/// Reject writes on read-only files
pub(crate) fn check_writable(read_only: bool) -> RmfResult<()> {
    usage_check!(!read_only, "File is opened read-only");
    Ok(())
}

/// Validate the value written to `key`
pub(crate) fn check_value(key: &KeyInfo, value: &Value) -> RmfResult<()> {
    usage_check!(
        value.value_type() == key.value_type,
        "Key expects {} values, got {}",
        key.value_type,
        value.value_type()
    );
    usage_check!(
        !value.is_null(),
        "Can't write the null sentinel {} as a value",
        value
    );
    Ok(())
}

/// Null of the index type, never a frame
pub(crate) const NO_FRAME: u32 = u32::MAX;

/// Reject the reserved frame index
pub(crate) fn check_frame(frame: u32) -> RmfResult<()> {
    usage_check!(frame != NO_FRAME, "Frame {} is reserved", frame);
    Ok(())
}

/// Create a new, empty file at `path`, replacing an existing store
pub fn create_shared_data(path: &Path, config: &StoreConfig) -> RmfResult<DynSharedData> {
    log::info!("Creating {} file at {}", config.backend, path.display());
    match config.backend {
        BackendType::Columnar => Ok(Box::new(ColumnarSharedData::create(path, config)?)),
        BackendType::Flat => Ok(Box::new(FlatSharedData::create(path, config)?)),
    }
}

/// Open an existing file, detecting its layout from its content
pub fn open_shared_data(path: &Path, config: &StoreConfig) -> RmfResult<DynSharedData> {
    let backend = detect_backend(path)?;
    log::info!(
        "Opening {} file at {} (read_only={})",
        backend,
        path.display(),
        config.read_only
    );
    match backend {
        BackendType::Columnar => Ok(Box::new(ColumnarSharedData::open(path, config)?)),
        BackendType::Flat => Ok(Box::new(FlatSharedData::open(path, config)?)),
    }
}

/// Work out which layout wrote `path`
///
/// A directory is a columnar store; a regular file must start with the
/// flat magic header.
pub fn detect_backend(path: &Path) -> RmfResult<BackendType> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| RmfError::Io(format!("Can't open {}: {}", path.display(), e)))?;
    if metadata.is_dir() {
        if path.join("db").is_file() {
            return Ok(BackendType::Columnar);
        }
        return Err(RmfError::Io(format!(
            "{} is a directory but not a columnar store",
            path.display()
        )));
    }
    let mut header = [0u8; flat::MAGIC_LEN];
    let mut file = std::fs::File::open(path)?;
    match file.read_exact(&mut header) {
        Ok(()) if header == flat::MAGIC => Ok(BackendType::Flat),
        _ => Err(RmfError::Io(format!(
            "{} is not a recognised RMF file",
            path.display()
        ))),
    }
}

/// Clear the way for a new file at `path`
///
/// Existing RMF files, empty files and empty directories are removed;
/// anything else is left alone and reported.
pub(crate) fn remove_existing(path: &Path) -> RmfResult<()> {
    let Ok(metadata) = std::fs::metadata(path) else {
        return Ok(());
    };
    match detect_backend(path) {
        Ok(BackendType::Columnar) => std::fs::remove_dir_all(path)?,
        Ok(BackendType::Flat) => std::fs::remove_file(path)?,
        Err(_) if metadata.is_file() && metadata.len() == 0 => std::fs::remove_file(path)?,
        Err(_) if metadata.is_dir() && std::fs::read_dir(path)?.next().is_none() => {
            std::fs::remove_dir(path)?
        }
        Err(_) => {
            return Err(RmfError::Io(format!(
                "{} exists and is not an RMF file",
                path.display()
            )))
        }
    }
    log::debug!("Removed existing file at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_detect_unknown_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();
        assert!(detect_backend(&path).unwrap_err().is_io());
        assert!(detect_backend(&dir.path().join("missing")).is_err());
        assert!(detect_backend(dir.path()).unwrap_err().is_io());
    }

    #[test]
    fn test_remove_existing_refuses_foreign_files() {
        let dir = TempDir::new().unwrap();
        let foreign = dir.path().join("data.csv");
        std::fs::write(&foreign, b"a,b").unwrap();
        assert!(remove_existing(&foreign).unwrap_err().is_io());
        assert!(foreign.exists());

        let empty = dir.path().join("empty");
        std::fs::create_dir(&empty).unwrap();
        remove_existing(&empty).unwrap();
        assert!(!empty.exists());
        remove_existing(&dir.path().join("missing")).unwrap();
    }

    #[test]
    fn test_check_value() {
        let key = KeyInfo {
            category: Category::new(Arity::NODE, 0),
            value_type: ValueType::Float,
            per_frame: false,
            index: 0,
        };
        assert!(check_value(&key, &Value::Float(1.0)).is_ok());
        assert!(check_value(&key, &Value::Float(f64::MAX)).unwrap_err().is_usage());
        assert!(check_value(&key, &Value::Int(1)).unwrap_err().is_usage());
    }
}
