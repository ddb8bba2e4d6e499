// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Scoring features

use crate::error::RmfResult;
use crate::node::NodeHandle;
use crate::types::NodeId;

decorator! {
    /// Score of a restraint over a set of representation nodes
    Score / ScoreConst on NodeHandle {
        factory: ScoreFactory / ScoreConstFactory,
        arity: NODE,
        category: "feature",
        keys: {
            representation / set_representation: Vec<NodeId> = "representation", false;
            score / set_score: f64 = "score", true;
        }
    }
}

fn resolve(node: &NodeHandle, ids: Vec<NodeId>) -> RmfResult<Vec<NodeHandle>> {
    ids.into_iter()
        .map(|id| node.file().get_node_from_id(id))
        .collect()
}

impl Score {
    /// Scored nodes as handles
    pub fn representation_nodes(&self) -> RmfResult<Vec<NodeHandle>> {
        resolve(self.object(), self.representation()?)
    }

    pub fn set_representation_nodes(&self, nodes: &[NodeHandle]) -> RmfResult<()> {
        for node in nodes {
            crate::error::usage_check!(
                node.file().same_file(self.object().file()),
                "Node {} belongs to another file",
                node.id()
            );
        }
        self.set_representation(nodes.iter().map(NodeHandle::id).collect())
    }
}

impl ScoreConst {
    pub fn representation_nodes(&self) -> RmfResult<Vec<NodeHandle>> {
        resolve(self.object(), self.representation()?)
    }
}
