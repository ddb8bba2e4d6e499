// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Whole-file utilities: copying, comparison and display
//!
//! These work on any pair of backends. Structure is compared by node id,
//! values by category and key names, so a columnar file and a flat copy of
//! it compare equal.

use crate::error::{usage_check, RmfResult};
use crate::file::{find_link_key, FileHandle};
use crate::keys::{Arity, Category, KeyInfo};
use crate::node::{NodeHandle, NodeType, SetType};
use crate::types::{NodeId, Value};
use std::collections::BTreeMap;
use std::fmt::Write;

/// One node as stored, links unresolved
#[derive(Debug, Clone, PartialEq)]
struct RawNode {
    name: String,
    node_type: NodeType,
    parent: Option<NodeId>,
    link_target: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
struct RawSet {
    members: Vec<NodeId>,
    set_type: SetType,
}

fn raw_nodes(file: &FileHandle) -> RmfResult<Vec<RawNode>> {
    file.with_backend(|b| {
        let count = b.get_number_of_nodes();
        let link = find_link_key(b)?;
        let mut nodes = Vec::with_capacity(count as usize);
        for id in 0..count {
            let node_type = b.get_type(NodeId(id))?;
            let link_target = match (node_type, &link) {
                (NodeType::Alias, Some(key)) => match b.get_value_always(id, key, 0)? {
                    Value::NodeId(target) if !target.is_null() => Some(target),
                    _ => None,
                },
                _ => None,
            };
            nodes.push(RawNode {
                name: b.get_name(NodeId(id))?,
                node_type,
                parent: None,
                link_target,
            });
        }
        for id in 0..count {
            for child in b.get_children(NodeId(id))? {
                if let Some(node) = nodes.get_mut(child.0 as usize) {
                    node.parent = Some(NodeId(id));
                }
            }
        }
        Ok(nodes)
    })
}

fn raw_sets(file: &FileHandle, arity: Arity) -> RmfResult<Vec<RawSet>> {
    file.with_backend(|b| {
        (0..b.get_number_of_sets(arity))
            .map(|set| {
                let members = (0..arity.get())
                    .map(|member| b.get_set_member(arity, set, member))
                    .collect::<RmfResult<Vec<_>>>()?;
                Ok(RawSet {
                    members,
                    set_type: b.get_set_type(arity, set)?,
                })
            })
            .collect()
    })
}

/// Copy the hierarchy and node sets of `src` into `dst`
///
/// `dst` must hold only its root. Nodes keep their ids, so values can be
/// moved over afterwards with [`copy_frame`].
pub fn copy_structure(src: &FileHandle, dst: &FileHandle) -> RmfResult<()> {
    usage_check!(!src.same_file(dst), "Can't copy a file onto itself");
    usage_check!(
        dst.get_number_of_nodes() == 1,
        "Destination already has {} nodes",
        dst.get_number_of_nodes()
    );
    let nodes = raw_nodes(src)?;
    // parents (and link targets) always have lower ids than their children
    for (id, node) in nodes.iter().enumerate().skip(1) {
        let parent = node.parent.unwrap_or(NodeId::ROOT);
        let parent = dst.get_node_from_id(parent)?;
        match (node.node_type, node.link_target) {
            (NodeType::Alias, Some(target)) => {
                parent.add_existing_child(&dst.get_node_from_id(target)?)?;
            }
            (node_type, _) => {
                parent.add_child(&node.name, node_type)?;
            }
        }
        debug_assert_eq!(dst.get_number_of_nodes() as usize, id + 1);
    }
    for arity in Arity::SETS {
        for set in raw_sets(src, arity)? {
            let members = set
                .members
                .iter()
                .map(|id| dst.get_node_from_id(*id))
                .collect::<RmfResult<Vec<_>>>()?;
            dst.add_node_set(&members, set.set_type)?;
        }
    }
    log::info!(
        "Copied {} nodes from {:?} to {:?}",
        nodes.len(),
        src.path(),
        dst.path()
    );
    Ok(())
}

fn object_count(file: &FileHandle, arity: Arity) -> u32 {
    if arity == Arity::NODE {
        file.get_number_of_nodes()
    } else {
        file.get_number_of_node_sets(arity)
    }
}

fn key_info_always(
    file: &FileHandle,
    category: Category,
    key: &KeyInfo,
    name: &str,
) -> RmfResult<KeyInfo> {
    file.with_backend_mut(|b| {
        match b.get_key(category, name, key.value_type, key.per_frame)? {
            Some(info) => Ok(info),
            None => b.add_key(category, name, key.value_type, key.per_frame),
        }
    })
}

/// Copy every value present in `src_frame` of `src` into `dst_frame` of `dst`
///
/// Static values are copied too. Missing categories and keys are created.
/// Objects are matched by id, so `dst` must have the structure of `src`.
pub fn copy_frame(
    src: &FileHandle,
    dst: &FileHandle,
    src_frame: u32,
    dst_frame: u32,
) -> RmfResult<()> {
    usage_check!(!src.same_file(dst), "Can't copy a file onto itself");
    for arity in Arity::ALL {
        let count = object_count(src, arity);
        usage_check!(
            object_count(dst, arity) >= count,
            "Destination has fewer objects of arity {} than the source",
            arity
        );
        for category in src.get_categories(arity)? {
            let name = src.get_category_name(category)?;
            let dst_category = dst.get_category_always(arity, &name)?;
            for key in src.get_all_keys(category)? {
                let key_name = src.get_key_info_name(&key)?;
                let dst_key = key_info_always(dst, dst_category, &key, &key_name)?;
                for id in 0..count {
                    let value = src.get_value_info(arity, id, &key, Some(src_frame))?;
                    if !value.is_null() {
                        dst.set_value_info(arity, id, &dst_key, Some(dst_frame), value)?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// True if both files have the same nodes, links and node sets
pub fn get_equal_structure(a: &FileHandle, b: &FileHandle) -> RmfResult<bool> {
    let (left, right) = (raw_nodes(a)?, raw_nodes(b)?);
    if left != right {
        if let Some(id) = left.iter().zip(&right).position(|(l, r)| l != r) {
            log::debug!("Structure differs at node {}: {:?} vs {:?}", id, left[id], right[id]);
        } else {
            log::debug!("Node counts differ: {} vs {}", left.len(), right.len());
        }
        return Ok(false);
    }
    for arity in Arity::SETS {
        if raw_sets(a, arity)? != raw_sets(b, arity)? {
            log::debug!("Node sets of arity {} differ", arity);
            return Ok(false);
        }
    }
    Ok(true)
}

type FrameSnapshot = BTreeMap<(Arity, String, String, &'static str, bool), BTreeMap<u32, Value>>;

/// Every non-null value visible in `frame`, keyed by names
fn frame_snapshot(file: &FileHandle, frame: u32) -> RmfResult<FrameSnapshot> {
    let mut snapshot = FrameSnapshot::new();
    for arity in Arity::ALL {
        let count = object_count(file, arity);
        for category in file.get_categories(arity)? {
            let category_name = file.get_category_name(category)?;
            for key in file.get_all_keys(category)? {
                let mut values = BTreeMap::new();
                for id in 0..count {
                    let value = file.get_value_info(arity, id, &key, Some(frame))?;
                    if !value.is_null() {
                        values.insert(id, value);
                    }
                }
                if !values.is_empty() {
                    let name = (
                        arity,
                        category_name.clone(),
                        file.get_key_info_name(&key)?,
                        key.value_type.name(),
                        key.per_frame,
                    );
                    snapshot.insert(name, values);
                }
            }
        }
    }
    Ok(snapshot)
}

/// True if both files hold the same values in `frame`
///
/// Keys without any value in the frame are ignored, so a key that only one
/// side declares does not make the files differ.
pub fn get_equal_frame(a: &FileHandle, b: &FileHandle, frame: u32) -> RmfResult<bool> {
    let (left, right) = (frame_snapshot(a, frame)?, frame_snapshot(b, frame)?);
    if left == right {
        return Ok(true);
    }
    for (name, values) in &left {
        if right.get(name) != Some(values) {
            log::debug!("Frame {} differs for key {:?}", frame, name);
            return Ok(false);
        }
    }
    if let Some(name) = right.keys().find(|name| !left.contains_key(*name)) {
        log::debug!("Frame {} differs for key {:?}", frame, name);
    }
    Ok(false)
}

/// Render the hierarchy as indented text, one node per line
///
/// Linked nodes appear under every parent.
pub fn show_hierarchy(file: &FileHandle) -> RmfResult<String> {
    let mut out = String::new();
    show_node(&file.get_root_node(), 0, &mut out)?;
    Ok(out)
}

fn show_node(node: &NodeHandle, depth: usize, out: &mut String) -> RmfResult<()> {
    // writing to a String never fails
    let _ = writeln!(
        out,
        "{:indent$}\"{}\" [{}] #{}",
        "",
        node.get_name()?,
        node.get_type()?,
        node.id().0,
        indent = depth * 2
    );
    for child in node.get_children()? {
        show_node(&child, depth + 1, out)?;
    }
    Ok(())
}
