// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Physical table names of the columnar layout

use crate::keys::{Arity, Category};
use crate::types::ValueType;

pub(crate) const METADATA_TREE: &str = "metadata";
pub(crate) const NODE_NAMES: &str = "node_names";
pub(crate) const FRAME_NAMES: &str = "frame_names";

/// Version tag identifying a columnar store
pub(crate) const VERSION_KEY: &[u8] = b"version";
pub(crate) const VERSION: u32 = 2;

pub(crate) const DESCRIPTION_KEY: &[u8] = b"description";
pub(crate) const PRODUCER_KEY: &[u8] = b"producer";
pub(crate) const SAVED_AT_KEY: &[u8] = b"saved_at";

/// Columns of the node table before the category columns start
pub(crate) const TYPE_COLUMN: u32 = 0;
pub(crate) const FIRST_CHILD_COLUMN: u32 = 1;
pub(crate) const SIBLING_COLUMN: u32 = 2;

/// Index of the first per-category column in the `node_data_{arity}` table
///
/// Nodes keep type, first child and sibling; sets keep type and members.
pub(crate) fn category_column_offset(arity: Arity) -> u32 {
    if arity == Arity::NODE {
        3
    } else {
        1 + arity.get() as u32
    }
}

pub(crate) fn node_data(arity: Arity) -> String {
    format!("node_data_{}", arity)
}

pub(crate) fn category_names(arity: Arity) -> String {
    format!("category_names_{}", arity)
}

fn frame_suffix(per_frame: bool) -> &'static str {
    if per_frame {
        "frame"
    } else {
        "static"
    }
}

pub(crate) fn key_names(category: Category, value_type: ValueType, per_frame: bool) -> String {
    format!(
        "keys_{}_{}_{}_{}",
        category.arity(),
        category.index(),
        value_type.name(),
        frame_suffix(per_frame)
    )
}

pub(crate) fn data(category: Category, value_type: ValueType, per_frame: bool) -> String {
    format!(
        "data_{}_{}_{}_{}",
        category.arity(),
        category.index(),
        value_type.name(),
        frame_suffix(per_frame)
    )
}

/// Per-key highest frame written in one per-frame data table
pub(crate) fn last_frames(category: Category, value_type: ValueType) -> String {
    format!(
        "last_frame_{}_{}_{}",
        category.arity(),
        category.index(),
        value_type.name()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names() {
        let cat = Category::new(Arity::PAIR, 3);
        assert_eq!(data(cat, ValueType::Floats, true), "data_2_3_floats_frame");
        assert_eq!(key_names(cat, ValueType::Int, false), "keys_2_3_int_static");
        assert_eq!(last_frames(cat, ValueType::NodeId), "last_frame_2_3_node_id");
        assert_eq!(category_column_offset(Arity::NODE), 3);
        assert_eq!(category_column_offset(Arity::QUAD), 5);
    }
}
