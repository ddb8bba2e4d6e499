// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Node associations
//!
//! Host code maps stored nodes to its own objects through an opaque handle.
//! Associations live only as long as the open file and are never persisted.

use crate::error::{usage_check, RmfResult};
use crate::types::NodeId;
use std::collections::HashMap;

/// Opaque host-side identifier bound to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssociationHandle(pub u64);

impl From<u64> for AssociationHandle {
    fn from(value: u64) -> Self {
        AssociationHandle(value)
    }
}

/// Bidirectional node <-> handle map
#[derive(Debug, Default)]
pub(crate) struct AssociationMap {
    by_node: HashMap<NodeId, AssociationHandle>,
    by_handle: HashMap<AssociationHandle, NodeId>,
}

impl AssociationMap {
    pub(crate) fn set(
        &mut self,
        node: NodeId,
        handle: AssociationHandle,
        overwrite: bool,
    ) -> RmfResult<()> {
        let previous = self.by_node.get(&node).copied();
        usage_check!(
            overwrite || previous.is_none(),
            "Node {} already has an association; pass overwrite to replace it",
            node
        );
        if let Some(other) = self.by_handle.get(&handle) {
            usage_check!(
                *other == node,
                "Association collision: handle {} is already bound to {}",
                handle.0,
                other
            );
        }
        if let Some(previous) = previous {
            self.by_handle.remove(&previous);
        }
        self.by_node.insert(node, handle);
        self.by_handle.insert(handle, node);
        Ok(())
    }

    pub(crate) fn get(&self, node: NodeId) -> Option<AssociationHandle> {
        self.by_node.get(&node).copied()
    }

    pub(crate) fn node_for(&self, handle: AssociationHandle) -> Option<NodeId> {
        self.by_handle.get(&handle).copied()
    }

    pub(crate) fn clear(&mut self) {
        self.by_node.clear();
        self.by_handle.clear();
    }
}
