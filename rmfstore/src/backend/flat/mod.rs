// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Flat record layout
//!
//! The whole file is one in-memory document: one record per key holding,
//! per object, a static slot or a sparse map of frames. `flush` writes
//! it to a temporary sibling and renames it over the target, or keeps the
//! bytes in memory for buffer-backed files.

mod record;

pub(crate) use self::record::{MAGIC, MAGIC_LEN};

use self::record::{FlatDocument, KeyRecord, NodeRecord, SetRecord};
use super::{check_frame, check_value, check_writable, remove_existing, SharedData};
use crate::config::{BackendType, StoreConfig};
use crate::error::{usage_check, RmfError, RmfResult};
use crate::keys::{Arity, Category, KeyInfo};
use crate::node::{NodeType, SetType};
use crate::types::{NodeId, Value, ValueType};
use std::path::{Path, PathBuf};

enum Target {
    File(PathBuf),
    Buffer(Vec<u8>),
}

pub struct FlatSharedData {
    target: Target,
    doc: FlatDocument,
    read_only: bool,
}

impl FlatSharedData {
    /// Create a file holding only the root node and write it out
    pub fn create(path: &Path, config: &StoreConfig) -> RmfResult<Self> {
        remove_existing(path)?;
        let mut data = Self {
            target: Target::File(path.to_path_buf()),
            doc: FlatDocument::new(),
            read_only: false,
        };
        data.flush()?;
        data.read_only = config.read_only;
        Ok(data)
    }

    pub fn open(path: &Path, config: &StoreConfig) -> RmfResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| RmfError::Io(format!("Can't read {}: {}", path.display(), e)))?;
        Ok(Self {
            target: Target::File(path.to_path_buf()),
            doc: FlatDocument::decode(&bytes)?,
            read_only: config.read_only,
        })
    }

    /// Empty file that lives in memory
    pub fn create_in_buffer() -> RmfResult<Self> {
        let mut data = Self {
            target: Target::Buffer(Vec::new()),
            doc: FlatDocument::new(),
            read_only: false,
        };
        data.flush()?;
        Ok(data)
    }

    pub fn open_from_buffer(bytes: Vec<u8>, read_only: bool) -> RmfResult<Self> {
        Ok(Self {
            doc: FlatDocument::decode(&bytes)?,
            target: Target::Buffer(bytes),
            read_only,
        })
    }

    fn check_object(&self, arity: Arity, id: u32) -> RmfResult<()> {
        let count = self.doc.count(arity);
        usage_check!(
            id < count,
            "Invalid id {} for arity {} ({} objects)",
            id,
            arity,
            count
        );
        Ok(())
    }

    fn node(&self, node: NodeId) -> RmfResult<&NodeRecord> {
        self.check_object(Arity::NODE, node.0)?;
        Ok(&self.doc.nodes[node.index() as usize])
    }

    fn node_mut(&mut self, node: NodeId) -> RmfResult<&mut NodeRecord> {
        self.check_object(Arity::NODE, node.0)?;
        Ok(&mut self.doc.nodes[node.index() as usize])
    }

    fn set_record(&self, arity: Arity, set: u32) -> RmfResult<&SetRecord> {
        usage_check!(arity != Arity::NODE, "Nodes are not node sets");
        self.check_object(arity, set)?;
        Ok(&self.doc.sets(arity)[set as usize])
    }

    fn check_category(&self, category: Category) -> RmfResult<()> {
        usage_check!(
            (category.index() as usize) < self.doc.categories(category.arity()).len(),
            "Invalid category {} of arity {}",
            category.index(),
            category.arity()
        );
        Ok(())
    }
}

impl SharedData for FlatSharedData {
    fn path(&self) -> Option<&Path> {
        match &self.target {
            Target::File(path) => Some(path),
            Target::Buffer(_) => None,
        }
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Flat
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn add_child(
        &mut self,
        parent: NodeId,
        name: &str,
        node_type: NodeType,
    ) -> RmfResult<NodeId> {
        check_writable(self.read_only)?;
        let previous = self.node(parent)?.first_child;
        let id = NodeId(self.doc.nodes.len() as u32);
        self.doc.nodes.push(NodeRecord {
            name: name.to_string(),
            node_type,
            first_child: NodeId::NULL,
            sibling: previous,
        });
        self.node_mut(parent)?.first_child = id;
        Ok(id)
    }

    fn get_number_of_nodes(&self) -> u32 {
        self.doc.nodes.len() as u32
    }

    fn get_name(&self, node: NodeId) -> RmfResult<String> {
        Ok(self.node(node)?.name.clone())
    }

    fn set_name(&mut self, node: NodeId, name: &str) -> RmfResult<()> {
        check_writable(self.read_only)?;
        self.node_mut(node)?.name = name.to_string();
        Ok(())
    }

    fn get_type(&self, node: NodeId) -> RmfResult<NodeType> {
        Ok(self.node(node)?.node_type)
    }

    fn set_type(&mut self, node: NodeId, node_type: NodeType) -> RmfResult<()> {
        check_writable(self.read_only)?;
        self.node_mut(node)?.node_type = node_type;
        Ok(())
    }

    fn get_first_child(&self, node: NodeId) -> RmfResult<NodeId> {
        Ok(self.node(node)?.first_child)
    }

    fn get_sibling(&self, node: NodeId) -> RmfResult<NodeId> {
        Ok(self.node(node)?.sibling)
    }

    fn add_set(&mut self, members: &[NodeId], set_type: SetType) -> RmfResult<u32> {
        check_writable(self.read_only)?;
        let arity = Arity::for_set(members.len())?;
        for member in members {
            self.check_object(Arity::NODE, member.0)?;
        }
        let sets = self.doc.sets_mut(arity);
        sets.push(SetRecord {
            members: members.to_vec(),
            set_type,
        });
        Ok(sets.len() as u32 - 1)
    }

    fn get_number_of_sets(&self, arity: Arity) -> u32 {
        self.doc.count(arity)
    }

    fn get_set_member(&self, arity: Arity, set: u32, member: usize) -> RmfResult<NodeId> {
        usage_check!(
            member < arity.get(),
            "Member {} out of range for arity {}",
            member,
            arity
        );
        let record = self.set_record(arity, set)?;
        record.members.get(member).copied().ok_or_else(|| {
            RmfError::internal(format!("set {} of arity {} lacks member {}", set, arity, member))
        })
    }

    fn get_set_type(&self, arity: Arity, set: u32) -> RmfResult<SetType> {
        Ok(self.set_record(arity, set)?.set_type)
    }

    fn add_category(&mut self, arity: Arity, name: &str) -> RmfResult<Category> {
        check_writable(self.read_only)?;
        usage_check!(
            self.get_category(arity, name)?.is_none(),
            "Category \"{}\" already exists for arity {}",
            name,
            arity
        );
        let categories = self.doc.categories_mut(arity);
        categories.push(name.to_string());
        Ok(Category::new(arity, categories.len() as u32 - 1))
    }

    fn get_category(&self, arity: Arity, name: &str) -> RmfResult<Option<Category>> {
        Ok(self
            .doc
            .categories(arity)
            .iter()
            .position(|n| n == name)
            .map(|index| Category::new(arity, index as u32)))
    }

    fn get_categories(&self, arity: Arity) -> RmfResult<Vec<Category>> {
        Ok((0..self.doc.categories(arity).len() as u32)
            .map(|index| Category::new(arity, index))
            .collect())
    }

    fn get_category_name(&self, category: Category) -> RmfResult<String> {
        self.check_category(category)?;
        Ok(self.doc.categories(category.arity())[category.index() as usize].clone())
    }

    fn add_key(
        &mut self,
        category: Category,
        name: &str,
        value_type: ValueType,
        per_frame: bool,
    ) -> RmfResult<KeyInfo> {
        check_writable(self.read_only)?;
        self.check_category(category)?;
        let existing: Vec<&str> = self
            .doc
            .keys_like(category, value_type, per_frame)
            .map(|r| r.name.as_str())
            .collect();
        usage_check!(
            !existing.contains(&name),
            "Key \"{}\" already exists in category {} for {} {} values",
            name,
            category.index(),
            if per_frame { "per-frame" } else { "static" },
            value_type
        );
        let info = KeyInfo {
            category,
            value_type,
            per_frame,
            index: existing.len() as u32,
        };
        self.doc.push_key(KeyRecord::new(info, name));
        Ok(info)
    }

    fn get_key(
        &self,
        category: Category,
        name: &str,
        value_type: ValueType,
        per_frame: bool,
    ) -> RmfResult<Option<KeyInfo>> {
        Ok(self
            .doc
            .keys_like(category, value_type, per_frame)
            .find(|r| r.name == name)
            .map(|r| r.info))
    }

    fn get_keys(&self, category: Category, value_type: ValueType) -> RmfResult<Vec<KeyInfo>> {
        let mut keys: Vec<KeyInfo> = self
            .doc
            .keys_like(category, value_type, false)
            .chain(self.doc.keys_like(category, value_type, true))
            .map(|r| r.info)
            .collect();
        keys.sort_by_key(|k| (k.per_frame, k.index));
        Ok(keys)
    }

    fn get_key_name(&self, key: &KeyInfo) -> RmfResult<String> {
        match self.doc.key(key) {
            Some(record) => Ok(record.name.clone()),
            None => Err(RmfError::Usage(format!("Invalid key {:?}", key))),
        }
    }

    fn get_value_always(&self, id: u32, key: &KeyInfo, frame: u32) -> RmfResult<Value> {
        self.check_object(key.arity(), id)?;
        let frame = if key.per_frame { frame } else { 0 };
        Ok(self
            .doc
            .key(key)
            .and_then(|record| record.get(id, frame))
            .cloned()
            .unwrap_or_else(|| key.value_type.null_value()))
    }

    fn set_value(&mut self, id: u32, key: &KeyInfo, frame: u32, value: Value) -> RmfResult<()> {
        check_writable(self.read_only)?;
        check_value(key, &value)?;
        check_frame(frame)?;
        self.check_object(key.arity(), id)?;
        let frame = if key.per_frame { frame } else { 0 };
        match self.doc.key_mut(key) {
            Some(record) => {
                record.set(id, frame, value);
                Ok(())
            }
            None => Err(RmfError::Usage(format!("Invalid key {:?}", key))),
        }
    }

    fn get_number_of_frames(&self, key: &KeyInfo) -> RmfResult<u32> {
        usage_check!(
            key.per_frame,
            "Static keys have no frames (key {} of category {})",
            key.index,
            key.category.index()
        );
        Ok(self.doc.key(key).map_or(0, |record| record.frames))
    }

    fn get_description(&self) -> RmfResult<String> {
        Ok(self.doc.description.clone())
    }

    fn set_description(&mut self, description: &str) -> RmfResult<()> {
        check_writable(self.read_only)?;
        self.doc.description = description.to_string();
        Ok(())
    }

    fn get_producer(&self) -> RmfResult<String> {
        Ok(self.doc.producer.clone())
    }

    fn set_producer(&mut self, producer: &str) -> RmfResult<()> {
        check_writable(self.read_only)?;
        self.doc.producer = producer.to_string();
        Ok(())
    }

    fn get_frame_name(&self, frame: u32) -> RmfResult<String> {
        Ok(self.doc.frame_names.get(&frame).cloned().unwrap_or_default())
    }

    fn set_frame_name(&mut self, frame: u32, name: &str) -> RmfResult<()> {
        check_writable(self.read_only)?;
        check_frame(frame)?;
        if name.is_empty() {
            self.doc.frame_names.remove(&frame);
        } else {
            self.doc.frame_names.insert(frame, name.to_string());
        }
        Ok(())
    }

    fn flush(&mut self) -> RmfResult<()> {
        if self.read_only {
            return Ok(());
        }
        self.doc.saved_at = Some(chrono::Utc::now());
        let bytes = self.doc.encode()?;
        match &mut self.target {
            Target::File(path) => {
                let mut tmp = path.clone().into_os_string();
                tmp.push(".tmp");
                let tmp = PathBuf::from(tmp);
                std::fs::write(&tmp, &bytes).map_err(|e| {
                    RmfError::Io(format!("Can't write {}: {}", tmp.display(), e))
                })?;
                std::fs::rename(&tmp, &*path).map_err(|e| {
                    RmfError::Io(format!("Can't replace {}: {}", path.display(), e))
                })?;
                log::info!("Flushed flat file {} ({} bytes)", path.display(), bytes.len());
            }
            Target::Buffer(buffer) => {
                log::debug!("Flushed flat buffer ({} bytes)", bytes.len());
                *buffer = bytes;
            }
        }
        Ok(())
    }

    fn reload(&mut self) -> RmfResult<()> {
        self.doc = match &self.target {
            Target::File(path) => {
                log::info!("Reloading flat file {}", path.display());
                FlatDocument::decode(&std::fs::read(path)?)?
            }
            Target::Buffer(bytes) => FlatDocument::decode(bytes)?,
        };
        Ok(())
    }

    fn footprint(&self) -> RmfResult<u64> {
        Ok(self.doc.encode()?.len() as u64)
    }

    fn to_buffer(&self) -> RmfResult<Vec<u8>> {
        self.doc.encode()
    }
}
