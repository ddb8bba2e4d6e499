// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! rmfstore - hierarchical node/attribute storage
//!
//! A file holds a tree of named, typed nodes (with links making it a DAG),
//! immutable node sets of 2 to 4 members, and typed attribute values
//! attached to nodes or sets, either once (static) or per frame.
//!
//! # Features
//!
//! - **Two layouts**: a columnar layout of dense tables over a key-value
//!   driver (sled on disk, or memory), and a flat single-document layout
//!   that also works as an in-memory buffer
//! - **Backend detection**: readers open any file without knowing which
//!   layout wrote it
//! - **Typed keys**: `Key<T>` ties a key to its Rust value type
//! - **Decorators**: bundles of keys for particles, shapes, scores, bonds
//!   and more
//! - **Advisory locking** between cooperating processes
//!
//! # Usage
//!
//! ```text
//! let file = FileHandle::create("trajectory.rmf")?;
//! let atom = file.get_root_node().add_child("CA", NodeType::Representation)?;
//! let physics = file.get_category_always(Arity::NODE, "physics")?;
//! let x = file.get_key_always::<f64>(physics, "cartesian x", true)?;
//! atom.set_value(x, Some(0), 1.25)?;
//! file.flush()?;
//! ```

pub mod association;
pub mod backend;
pub mod config;
pub mod decorators;
pub mod error;
pub mod file;
pub mod keys;
pub mod lock;
pub mod node;
pub mod storage;
pub mod types;
pub mod utility;

pub use association::AssociationHandle;
pub use config::{BackendType, LockConfig, StoreConfig};
pub use error::{RmfError, RmfResult};
pub use file::FileHandle;
pub use keys::{Arity, Category, Key, KeyInfo};
pub use lock::FileLock;
pub use node::{NodeHandle, NodeSetHandle, NodeType, SetType};
pub use storage::StorageType;
pub use types::{NodeId, StoredValue, Value, ValueType};

/// rmfstore version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
