// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Node and node set handles
//!
//! Handles are cheap clones of the owning file plus an id. All attribute
//! access goes through the file, which checks the key's arity against the
//! object it is applied to.

use crate::error::{RmfError, RmfResult};
use crate::file::FileHandle;
use crate::keys::{Arity, Key};
use crate::types::{NodeId, StoredValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a node in the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Root,
    Representation,
    Geometry,
    Feature,
    Custom,
    /// Placeholder linking a second parent to an existing node
    Alias,
}

impl NodeType {
    pub(crate) fn code(self) -> u32 {
        match self {
            NodeType::Root => 0,
            NodeType::Representation => 1,
            NodeType::Geometry => 2,
            NodeType::Feature => 3,
            NodeType::Custom => 4,
            NodeType::Alias => 5,
        }
    }

    pub(crate) fn from_code(code: u32) -> RmfResult<Self> {
        Ok(match code {
            0 => NodeType::Root,
            1 => NodeType::Representation,
            2 => NodeType::Geometry,
            3 => NodeType::Feature,
            4 => NodeType::Custom,
            5 => NodeType::Alias,
            other => return Err(RmfError::Io(format!("Unknown node type code {}", other))),
        })
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::Root => "root",
            NodeType::Representation => "rep",
            NodeType::Geometry => "geometry",
            NodeType::Feature => "feature",
            NodeType::Custom => "custom",
            NodeType::Alias => "alias",
        };
        write!(f, "{}", name)
    }
}

/// Kind of relationship a node set records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetType {
    Bond,
    Custom,
}

impl SetType {
    pub(crate) fn code(self) -> u32 {
        match self {
            SetType::Bond => 0,
            SetType::Custom => 1,
        }
    }

    pub(crate) fn from_code(code: u32) -> RmfResult<Self> {
        match code {
            0 => Ok(SetType::Bond),
            1 => Ok(SetType::Custom),
            other => Err(RmfError::Io(format!("Unknown set type code {}", other))),
        }
    }
}

impl fmt::Display for SetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetType::Bond => write!(f, "bond"),
            SetType::Custom => write!(f, "custom"),
        }
    }
}

/// A node of an open file
#[derive(Clone)]
pub struct NodeHandle {
    file: FileHandle,
    id: NodeId,
}

impl NodeHandle {
    pub(crate) fn new(file: FileHandle, id: NodeId) -> Self {
        Self { file, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn file(&self) -> &FileHandle {
        &self.file
    }

    pub fn get_name(&self) -> RmfResult<String> {
        self.file.with_backend(|b| b.get_name(self.id))
    }

    pub fn set_name(&self, name: &str) -> RmfResult<()> {
        crate::keys::audit_node_name(name)?;
        self.file.with_backend_mut(|b| b.set_name(self.id, name))
    }

    pub fn get_type(&self) -> RmfResult<NodeType> {
        self.file.with_backend(|b| b.get_type(self.id))
    }

    pub fn set_type(&self, node_type: NodeType) -> RmfResult<()> {
        self.file.with_backend_mut(|b| b.set_type(self.id, node_type))
    }

    /// Add a new child; it comes first in `get_children`
    pub fn add_child(&self, name: &str, node_type: NodeType) -> RmfResult<NodeHandle> {
        self.file.add_child(self.id, name, node_type)
    }

    /// Make an existing node a child of this one as well
    pub fn add_existing_child(&self, child: &NodeHandle) -> RmfResult<()> {
        self.file.add_existing_child(self.id, child.id)
    }

    /// Children, most recently added first, with links resolved
    pub fn get_children(&self) -> RmfResult<Vec<NodeHandle>> {
        self.file.get_children(self.id)
    }

    pub fn get_value<T: StoredValue>(&self, key: Key<T>, frame: Option<u32>) -> RmfResult<T> {
        self.file.get_value(Arity::NODE, self.id.0, key, frame)
    }

    pub fn get_value_always<T: StoredValue>(
        &self,
        key: Key<T>,
        frame: Option<u32>,
    ) -> RmfResult<T> {
        self.file.get_value_always(Arity::NODE, self.id.0, key, frame)
    }

    pub fn get_has_value<T: StoredValue>(
        &self,
        key: Key<T>,
        frame: Option<u32>,
    ) -> RmfResult<bool> {
        self.file.get_has_value(Arity::NODE, self.id.0, key, frame)
    }

    pub fn set_value<T: StoredValue>(
        &self,
        key: Key<T>,
        frame: Option<u32>,
        value: T,
    ) -> RmfResult<()> {
        self.file.set_value(Arity::NODE, self.id.0, key, frame, value)
    }

    /// One value per frame of a per-frame key, null where absent
    pub fn get_all_values<T: StoredValue>(&self, key: Key<T>) -> RmfResult<Vec<T>> {
        self.file.get_all_values(Arity::NODE, self.id.0, key)
    }
}

impl PartialEq for NodeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.file.same_file(&other.file)
    }
}

impl Eq for NodeHandle {}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get_name() {
            Ok(name) => write!(f, "\"{}\"({})", name, self.id.0),
            Err(_) => write!(f, "{}", self.id),
        }
    }
}

/// A node set (pair, triplet or quad) of an open file
#[derive(Clone)]
pub struct NodeSetHandle {
    file: FileHandle,
    arity: Arity,
    index: u32,
}

impl NodeSetHandle {
    pub(crate) fn new(file: FileHandle, arity: Arity, index: u32) -> Self {
        Self { file, arity, index }
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn get_set_type(&self) -> RmfResult<SetType> {
        self.file
            .with_backend(|b| b.get_set_type(self.arity, self.index))
    }

    pub fn get_member(&self, member: usize) -> RmfResult<NodeHandle> {
        let id = self
            .file
            .with_backend(|b| b.get_set_member(self.arity, self.index, member))?;
        Ok(NodeHandle::new(self.file.clone(), id))
    }

    pub fn get_members(&self) -> RmfResult<Vec<NodeHandle>> {
        (0..self.arity.get()).map(|i| self.get_member(i)).collect()
    }

    pub fn get_value<T: StoredValue>(&self, key: Key<T>, frame: Option<u32>) -> RmfResult<T> {
        self.file.get_value(self.arity, self.index, key, frame)
    }

    pub fn get_value_always<T: StoredValue>(
        &self,
        key: Key<T>,
        frame: Option<u32>,
    ) -> RmfResult<T> {
        self.file.get_value_always(self.arity, self.index, key, frame)
    }

    pub fn get_has_value<T: StoredValue>(
        &self,
        key: Key<T>,
        frame: Option<u32>,
    ) -> RmfResult<bool> {
        self.file.get_has_value(self.arity, self.index, key, frame)
    }

    pub fn set_value<T: StoredValue>(
        &self,
        key: Key<T>,
        frame: Option<u32>,
        value: T,
    ) -> RmfResult<()> {
        self.file.set_value(self.arity, self.index, key, frame, value)
    }

    pub fn get_all_values<T: StoredValue>(&self, key: Key<T>) -> RmfResult<Vec<T>> {
        self.file.get_all_values(self.arity, self.index, key)
    }
}

impl fmt::Debug for NodeSetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeSet(arity={}, index={})", self.arity, self.index)
    }
}
