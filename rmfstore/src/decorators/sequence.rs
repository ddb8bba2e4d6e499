// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Sequence annotations

use crate::error::RmfResult;
use crate::node::NodeHandle;

decorator! {
    /// Single residue of a chain
    ///
    /// A residue is stored as a one-residue range, so the first and last
    /// indexes are always equal.
    Residue / ResidueConst on NodeHandle {
        factory: ResidueFactory / ResidueConstFactory,
        arity: NODE,
        category: "sequence",
        keys: {
            first_index / set_first_index: i64 = "first residue index", false;
            last_index / set_last_index: i64 = "last residue index", false;
            residue_type / set_residue_type: String = "residue type", false;
        }
    }
}

impl Residue {
    pub fn index(&self) -> RmfResult<i64> {
        self.first_index()
    }

    /// Write both ends of the range
    pub fn set_index(&self, index: i64) -> RmfResult<()> {
        self.set_first_index(index)?;
        self.set_last_index(index)
    }
}

impl ResidueConst {
    pub fn index(&self) -> RmfResult<i64> {
        self.first_index()
    }
}
