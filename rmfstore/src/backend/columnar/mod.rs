// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Columnar indirection layout
//!
//! Attributes are sparse and both the number of objects and the number of
//! keys grow independently, so values are not stored per (object, key).
//! Instead each object gets, per category, a small integer column the first
//! time any key of that category is written for it. All keys of the
//! category then share that row:
//!
//! ```text
//! node_data_{arity}[id, offset + category]  -> column
//! data_{..}_static[column, key]             -> value
//! data_{..}_frame[column, key, frame]       -> value
//! ```
//!
//! A new column is one more than the highest column used in the category.
//! Caches keep the hot paths off the storage driver: the last resolved
//! column per arity, open table handles, the highest column per category
//! and the number of keys per key-name table.

mod caches;
mod dataset;
mod names;

use self::caches::{CachedTable, ColumnCache, KeyCountCache, MaxColumnCache, TableCache};
use self::dataset::DataSet;
use super::{check_frame, check_value, check_writable, remove_existing, SharedData};
use crate::config::{BackendType, LockConfig, StoreConfig};
use crate::error::{usage_check, RmfError, RmfResult};
use crate::keys::{Arity, Category, KeyInfo};
use crate::node::{NodeType, SetType};
use crate::storage::{
    create_storage_driver, DynStorageDriver, StorageDriverError, StorageTree, StorageType,
};
use crate::types::{NodeId, Value, ValueType};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct ColumnarSharedData {
    path: Option<PathBuf>,
    driver: DynStorageDriver,
    metadata: Box<dyn StorageTree>,
    read_only: bool,
    frames_hint: u32,
    tables: TableCache,
    columns: ColumnCache,
    max_columns: MaxColumnCache,
    key_counts: KeyCountCache,
}

/// Open the driver, waiting while another handle holds the store
///
/// Sled keeps an exclusive lock on its directory for as long as a handle is
/// open, so a second handle polls the way [`crate::FileLock`] does.
fn open_driver(
    storage_type: StorageType,
    path: &Path,
    lock: &LockConfig,
) -> RmfResult<DynStorageDriver> {
    let attempts = lock.max_attempts.max(1);
    for attempt in 1..=attempts {
        match create_storage_driver(storage_type, path) {
            Ok(driver) => {
                if attempt > 1 {
                    log::info!(
                        "Opened {} after {} attempts",
                        path.display(),
                        attempt
                    );
                }
                return Ok(driver);
            }
            Err(StorageDriverError::Locked(reason)) => {
                if attempt == 1 {
                    log::warn!(
                        "{} is held by another handle, retrying every {} ms: {}",
                        path.display(),
                        lock.retry_interval_ms,
                        reason
                    );
                }
            }
            Err(e) => return Err(e.into()),
        }
        if attempt < attempts {
            std::thread::sleep(lock.retry_interval());
        }
    }
    Err(RmfError::Io(format!(
        "Timed out waiting for {} held by another handle after {} attempts",
        path.display(),
        attempts
    )))
}

impl ColumnarSharedData {
    /// Create an empty store holding only the root node
    pub fn create(path: &Path, config: &StoreConfig) -> RmfResult<Self> {
        let location = match config.driver {
            StorageType::Memory => None,
            StorageType::Sled => {
                remove_existing(path)?;
                Some(path.to_path_buf())
            }
        };
        let driver = open_driver(config.driver, path, &config.lock)?;
        let mut data = Self::from_driver(driver, location, config)?;
        data.metadata
            .insert(names::VERSION_KEY, &bincode::serialize(&names::VERSION)?)?;
        data.add_node_record(NodeId::ROOT.0, "root", NodeType::Root)?;
        Ok(data)
    }

    /// Open an existing on-disk store
    pub fn open(path: &Path, config: &StoreConfig) -> RmfResult<Self> {
        if !path.join("db").is_file() {
            return Err(RmfError::Io(format!(
                "{} is not a columnar store",
                path.display()
            )));
        }
        let driver = open_driver(StorageType::Sled, path, &config.lock)?;
        let data = Self::from_driver(driver, Some(path.to_path_buf()), config)?;
        match data.metadata.get(names::VERSION_KEY)? {
            Some(bytes) => {
                let version: u32 = bincode::deserialize(&bytes)?;
                if version != names::VERSION {
                    return Err(RmfError::Io(format!(
                        "Unsupported columnar store version {} in {}",
                        version,
                        path.display()
                    )));
                }
            }
            None => {
                return Err(RmfError::Io(format!(
                    "{} has no columnar version tag",
                    path.display()
                )))
            }
        }
        Ok(data)
    }

    fn from_driver(
        driver: DynStorageDriver,
        path: Option<PathBuf>,
        config: &StoreConfig,
    ) -> RmfResult<Self> {
        let metadata = driver.open_tree(names::METADATA_TREE)?;
        let data = Self {
            path,
            driver,
            metadata,
            read_only: config.read_only,
            frames_hint: config.frames_hint,
            tables: TableCache::default(),
            columns: ColumnCache::default(),
            max_columns: MaxColumnCache::default(),
            key_counts: KeyCountCache::default(),
        };
        data.tables.set_known(data.driver.list_trees()?);
        Ok(data)
    }

    /// Table handle, creating the table if needed
    fn open_table<const D: usize>(
        &self,
        name: &str,
        value_type: ValueType,
    ) -> RmfResult<Arc<DataSet<D>>>
    where
        DataSet<D>: CachedTable,
    {
        if let Some(table) = self.tables.get::<DataSet<D>>(name) {
            return Ok(table);
        }
        log::debug!("Opening {} table {}", value_type, name);
        let tree = self.driver.open_tree(name)?;
        let table = Arc::new(DataSet::<D>::open(name, tree, value_type)?);
        self.tables.put(name, table.clone());
        Ok(table)
    }

    /// Table handle if the table exists
    fn find_table<const D: usize>(
        &self,
        name: &str,
        value_type: ValueType,
    ) -> RmfResult<Option<Arc<DataSet<D>>>>
    where
        DataSet<D>: CachedTable,
    {
        if let Some(table) = self.tables.get::<DataSet<D>>(name) {
            return Ok(Some(table));
        }
        if !self.tables.is_known(name) {
            return Ok(None);
        }
        self.open_table(name, value_type).map(Some)
    }

    fn node_data(&self, arity: Arity) -> RmfResult<Arc<DataSet<2>>> {
        self.open_table(&names::node_data(arity), ValueType::Index)
    }

    fn read_cell(&self, arity: Arity, id: u32, column: u32) -> RmfResult<Value> {
        match self.find_table::<2>(&names::node_data(arity), ValueType::Index)? {
            Some(table) => table.get([id, column]),
            None => Ok(Value::Index(u32::MAX)),
        }
    }

    fn read_index(&self, arity: Arity, id: u32, column: u32) -> RmfResult<Option<u32>> {
        let value = self.read_cell(arity, id, column)?;
        if value.is_null() {
            return Ok(None);
        }
        match value.as_index() {
            Some(v) => Ok(Some(v)),
            None => Err(RmfError::internal(format!(
                "node table of arity {} holds a non-index value",
                arity
            ))),
        }
    }

    fn count(&self, arity: Arity) -> RmfResult<u32> {
        Ok(
            match self.find_table::<2>(&names::node_data(arity), ValueType::Index)? {
                Some(table) => table.extent()[0],
                None => 0,
            },
        )
    }

    /// Object count for the infallible accessors; driver failures are logged
    fn logged_count(&self, arity: Arity) -> u32 {
        self.count(arity).unwrap_or_else(|e| {
            log::error!("Can't count objects of arity {}: {}", arity, e);
            0
        })
    }

    fn check_object(&self, arity: Arity, id: u32) -> RmfResult<()> {
        let count = self.count(arity)?;
        usage_check!(
            id < count,
            "Invalid id {} for arity {} ({} objects)",
            id,
            arity,
            count
        );
        Ok(())
    }

    fn add_node_record(&mut self, id: u32, name: &str, node_type: NodeType) -> RmfResult<()> {
        let node_names = self.open_table::<1>(names::NODE_NAMES, ValueType::String)?;
        node_names.set([id], &Value::String(name.to_string()))?;
        self.node_data(Arity::NODE)?
            .set([id, names::TYPE_COLUMN], &Value::Index(node_type.code()))
    }

    fn category_count(&self, arity: Arity) -> RmfResult<u32> {
        Ok(
            match self.find_table::<1>(&names::category_names(arity), ValueType::String)? {
                Some(table) => table.extent()[0],
                None => 0,
            },
        )
    }

    fn check_category(&self, category: Category) -> RmfResult<()> {
        usage_check!(
            category.index() < self.category_count(category.arity())?,
            "Invalid category {} of arity {}",
            category.index(),
            category.arity()
        );
        Ok(())
    }

    fn key_names(
        &self,
        category: Category,
        value_type: ValueType,
        per_frame: bool,
    ) -> RmfResult<Vec<String>> {
        let name = names::key_names(category, value_type, per_frame);
        let Some(table) = self.find_table::<1>(&name, ValueType::String)? else {
            return Ok(Vec::new());
        };
        (0..table.extent()[0])
            .map(|i| match table.get([i])? {
                Value::String(s) => Ok(s),
                other => Err(RmfError::internal(format!(
                    "key name table {} holds {}",
                    name,
                    other.value_type()
                ))),
            })
            .collect()
    }

    fn key_count(
        &self,
        category: Category,
        value_type: ValueType,
        per_frame: bool,
    ) -> RmfResult<u32> {
        if let Some(count) = self.key_counts.get(category, value_type, per_frame) {
            return Ok(count);
        }
        let name = names::key_names(category, value_type, per_frame);
        let count = match self.find_table::<1>(&name, ValueType::String)? {
            Some(table) => table.extent()[0],
            None => 0,
        };
        self.key_counts.put(category, value_type, per_frame, count);
        Ok(count)
    }

    fn check_key(&self, key: &KeyInfo) -> RmfResult<()> {
        usage_check!(
            key.index < self.key_count(key.category, key.value_type, key.per_frame)?,
            "Invalid key {:?}",
            key
        );
        Ok(())
    }

    /// Column of an object in a category, if one was assigned
    fn get_column(&self, arity: Arity, id: u32, category: Category) -> RmfResult<Option<u32>> {
        if let Some(column) = self.columns.get(arity, id, category.index()) {
            return Ok(Some(column));
        }
        let offset = names::category_column_offset(arity) + category.index();
        let column = self.read_index(arity, id, offset)?;
        if let Some(column) = column {
            self.columns.put(arity, id, category.index(), column);
        }
        Ok(column)
    }

    /// Column of an object in a category, assigning the next free one
    fn get_index_set(&self, arity: Arity, id: u32, category: Category) -> RmfResult<u32> {
        if let Some(column) = self.get_column(arity, id, category)? {
            return Ok(column);
        }
        let max = match self.max_columns.get(category) {
            Some(max) => max,
            None => self.scan_max_column(arity, category)?,
        };
        let column = max.map_or(0, |m| m + 1);
        let offset = names::category_column_offset(arity) + category.index();
        self.node_data(arity)?
            .set([id, offset], &Value::Index(column))?;
        self.max_columns.put(category, Some(column));
        self.columns.put(arity, id, category.index(), column);
        log::debug!(
            "Assigned column {} to object {} of arity {} in category {}",
            column,
            id,
            arity,
            category.index()
        );
        Ok(column)
    }

    fn scan_max_column(&self, arity: Arity, category: Category) -> RmfResult<Option<u32>> {
        let offset = names::category_column_offset(arity) + category.index();
        let mut max = None;
        for id in 0..self.count(arity)? {
            if let Some(column) = self.read_index(arity, id, offset)? {
                max = max.max(Some(column));
            }
        }
        log::debug!(
            "Scanned arity {} category {}: max column {:?}",
            arity,
            category.index(),
            max
        );
        Ok(max)
    }

    fn get_metadata_string(&self, key: &[u8]) -> RmfResult<String> {
        match self.metadata.get(key)? {
            Some(bytes) => Ok(bincode::deserialize(&bytes)?),
            None => Ok(String::new()),
        }
    }

    fn set_metadata_string(&mut self, key: &[u8], value: &str) -> RmfResult<()> {
        check_writable(self.read_only)?;
        self.metadata
            .insert(key, &bincode::serialize(&value.to_string())?)?;
        Ok(())
    }

    #[cfg(test)]
    fn column_cache_hits(&self) -> u64 {
        self.columns.hits()
    }
}

impl SharedData for ColumnarSharedData {
    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Columnar
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
        self.check_object(Arity::NODE, parent.0)?;
        let id = self.count(Arity::NODE)?;
        self.add_node_record(id, name, node_type)?;
        let table = self.node_data(Arity::NODE)?;
        let previous = table.get([parent.0, names::FIRST_CHILD_COLUMN])?;
        if !previous.is_null() {
            table.set([id, names::SIBLING_COLUMN], &previous)?;
        }
        table.set([parent.0, names::FIRST_CHILD_COLUMN], &Value::Index(id))?;
        Ok(NodeId(id))
    }

    fn get_number_of_nodes(&self) -> u32 {
        self.logged_count(Arity::NODE)
    }

    fn get_name(&self, node: NodeId) -> RmfResult<String> {
        self.check_object(Arity::NODE, node.0)?;
        match self.find_table::<1>(names::NODE_NAMES, ValueType::String)? {
            Some(table) => match table.get([node.0])? {
                Value::String(name) => Ok(name),
                other => Err(RmfError::internal(format!(
                    "node name table holds {}",
                    other.value_type()
                ))),
            },
            None => Ok(String::new()),
        }
    }

    fn set_name(&mut self, node: NodeId, name: &str) -> RmfResult<()> {
        check_writable(self.read_only)?;
        self.check_object(Arity::NODE, node.0)?;
        self.open_table::<1>(names::NODE_NAMES, ValueType::String)?
            .set([node.0], &Value::String(name.to_string()))
    }

    fn get_type(&self, node: NodeId) -> RmfResult<NodeType> {
        self.check_object(Arity::NODE, node.0)?;
        match self.read_index(Arity::NODE, node.0, names::TYPE_COLUMN)? {
            Some(code) => NodeType::from_code(code),
            None => Err(RmfError::internal(format!("node {} has no type", node))),
        }
    }

    fn set_type(&mut self, node: NodeId, node_type: NodeType) -> RmfResult<()> {
        check_writable(self.read_only)?;
        self.check_object(Arity::NODE, node.0)?;
        self.node_data(Arity::NODE)?
            .set([node.0, names::TYPE_COLUMN], &Value::Index(node_type.code()))
    }

    fn get_first_child(&self, node: NodeId) -> RmfResult<NodeId> {
        self.check_object(Arity::NODE, node.0)?;
        Ok(self
            .read_index(Arity::NODE, node.0, names::FIRST_CHILD_COLUMN)?
            .map_or(NodeId::NULL, NodeId))
    }

    fn get_sibling(&self, node: NodeId) -> RmfResult<NodeId> {
        self.check_object(Arity::NODE, node.0)?;
        Ok(self
            .read_index(Arity::NODE, node.0, names::SIBLING_COLUMN)?
            .map_or(NodeId::NULL, NodeId))
    }

    fn add_set(&mut self, members: &[NodeId], set_type: SetType) -> RmfResult<u32> {
        check_writable(self.read_only)?;
        let arity = Arity::for_set(members.len())?;
        for member in members {
            self.check_object(Arity::NODE, member.0)?;
        }
        let index = self.count(arity)?;
        let table = self.node_data(arity)?;
        table.set([index, 0], &Value::Index(set_type.code()))?;
        for (i, member) in members.iter().enumerate() {
            table.set([index, 1 + i as u32], &Value::Index(member.0))?;
        }
        Ok(index)
    }

    fn get_number_of_sets(&self, arity: Arity) -> u32 {
        self.logged_count(arity)
    }

    fn get_set_member(&self, arity: Arity, set: u32, member: usize) -> RmfResult<NodeId> {
        usage_check!(arity != Arity::NODE, "Nodes are not node sets");
        usage_check!(
            member < arity.get(),
            "Member {} out of range for arity {}",
            member,
            arity
        );
        self.check_object(arity, set)?;
        match self.read_index(arity, set, 1 + member as u32)? {
            Some(id) => Ok(NodeId(id)),
            None => Err(RmfError::internal(format!(
                "set {} of arity {} lacks member {}",
                set, arity, member
            ))),
        }
    }

    fn get_set_type(&self, arity: Arity, set: u32) -> RmfResult<SetType> {
        usage_check!(arity != Arity::NODE, "Nodes are not node sets");
        self.check_object(arity, set)?;
        match self.read_index(arity, set, 0)? {
            Some(code) => SetType::from_code(code),
            None => Err(RmfError::internal(format!(
                "set {} of arity {} has no type",
                set, arity
            ))),
        }
    }

    fn add_category(&mut self, arity: Arity, name: &str) -> RmfResult<Category> {
        check_writable(self.read_only)?;
        usage_check!(
            self.get_category(arity, name)?.is_none(),
            "Category \"{}\" already exists for arity {}",
            name,
            arity
        );
        let table = self.open_table::<1>(&names::category_names(arity), ValueType::String)?;
        let index = table.extent()[0];
        table.set([index], &Value::String(name.to_string()))?;
        log::debug!("Added category \"{}\" ({}) for arity {}", name, index, arity);
        Ok(Category::new(arity, index))
    }

    fn get_category(&self, arity: Arity, name: &str) -> RmfResult<Option<Category>> {
        let Some(table) = self.find_table::<1>(&names::category_names(arity), ValueType::String)?
        else {
            return Ok(None);
        };
        for index in 0..table.extent()[0] {
            if table.get([index])?.as_string() == Some(name) {
                return Ok(Some(Category::new(arity, index)));
            }
        }
        Ok(None)
    }

    fn get_categories(&self, arity: Arity) -> RmfResult<Vec<Category>> {
        Ok((0..self.category_count(arity)?)
            .map(|index| Category::new(arity, index))
            .collect())
    }

    fn get_category_name(&self, category: Category) -> RmfResult<String> {
        self.check_category(category)?;
        let table = self.open_table::<1>(
            &names::category_names(category.arity()),
            ValueType::String,
        )?;
        match table.get([category.index()])? {
            Value::String(name) => Ok(name),
            other => Err(RmfError::internal(format!(
                "category table holds {}",
                other.value_type()
            ))),
        }
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
        let existing = self.key_names(category, value_type, per_frame)?;
        usage_check!(
            !existing.iter().any(|n| n == name),
            "Key \"{}\" already exists in category {} for {} {} values",
            name,
            category.index(),
            if per_frame { "per-frame" } else { "static" },
            value_type
        );
        let index = existing.len() as u32;
        self.open_table::<1>(
            &names::key_names(category, value_type, per_frame),
            ValueType::String,
        )?
        .set([index], &Value::String(name.to_string()))?;
        self.key_counts.put(category, value_type, per_frame, index + 1);
        if per_frame && self.frames_hint > 0 {
            self.open_table::<3>(&names::data(category, value_type, true), value_type)?
                .reserve([0, index + 1, self.frames_hint])?;
        }
        Ok(KeyInfo {
            category,
            value_type,
            per_frame,
            index,
        })
    }

    fn get_key(
        &self,
        category: Category,
        name: &str,
        value_type: ValueType,
        per_frame: bool,
    ) -> RmfResult<Option<KeyInfo>> {
        Ok(self
            .key_names(category, value_type, per_frame)?
            .iter()
            .position(|n| n == name)
            .map(|index| KeyInfo {
                category,
                value_type,
                per_frame,
                index: index as u32,
            }))
    }

    fn get_keys(&self, category: Category, value_type: ValueType) -> RmfResult<Vec<KeyInfo>> {
        let mut keys = Vec::new();
        for per_frame in [false, true] {
            let count = self.key_count(category, value_type, per_frame)?;
            keys.extend((0..count).map(|index| KeyInfo {
                category,
                value_type,
                per_frame,
                index,
            }));
        }
        Ok(keys)
    }

    fn get_key_name(&self, key: &KeyInfo) -> RmfResult<String> {
        self.check_key(key)?;
        let table = names::key_names(key.category, key.value_type, key.per_frame);
        match self.open_table::<1>(&table, ValueType::String)?.get([key.index])? {
            Value::String(name) => Ok(name),
            other => Err(RmfError::internal(format!(
                "key name table {} holds {}",
                table,
                other.value_type()
            ))),
        }
    }

    fn get_value_always(&self, id: u32, key: &KeyInfo, frame: u32) -> RmfResult<Value> {
        let arity = key.arity();
        self.check_object(arity, id)?;
        let null = key.value_type.null_value();
        let Some(column) = self.get_column(arity, id, key.category)? else {
            return Ok(null);
        };
        let name = names::data(key.category, key.value_type, key.per_frame);
        if key.per_frame {
            match self.find_table::<3>(&name, key.value_type)? {
                Some(table) => table.get([column, key.index, frame]),
                None => Ok(null),
            }
        } else {
            match self.find_table::<2>(&name, key.value_type)? {
                Some(table) => table.get([column, key.index]),
                None => Ok(null),
            }
        }
    }

    fn set_value(&mut self, id: u32, key: &KeyInfo, frame: u32, value: Value) -> RmfResult<()> {
        check_writable(self.read_only)?;
        check_value(key, &value)?;
        check_frame(frame)?;
        let arity = key.arity();
        self.check_object(arity, id)?;
        self.check_key(key)?;
        let column = self.get_index_set(arity, id, key.category)?;
        let name = names::data(key.category, key.value_type, key.per_frame);
        if key.per_frame {
            self.open_table::<3>(&name, key.value_type)?
                .set([column, key.index, frame], &value)?;
            let last = self.open_table::<1>(
                &names::last_frames(key.category, key.value_type),
                ValueType::Index,
            )?;
            let known = last.get([key.index])?;
            if known.is_null() || known.as_index().map_or(true, |known| frame > known) {
                last.set([key.index], &Value::Index(frame))?;
            }
            Ok(())
        } else {
            self.open_table::<2>(&name, key.value_type)?
                .set([column, key.index], &value)
        }
    }

    fn get_number_of_frames(&self, key: &KeyInfo) -> RmfResult<u32> {
        usage_check!(
            key.per_frame,
            "Static keys have no frames (key {} of category {})",
            key.index,
            key.category.index()
        );
        let name = names::last_frames(key.category, key.value_type);
        let Some(table) = self.find_table::<1>(&name, ValueType::Index)? else {
            return Ok(0);
        };
        let last = table.get([key.index])?;
        if last.is_null() {
            return Ok(0);
        }
        match last.as_index() {
            Some(last) => Ok(last + 1),
            None => Err(RmfError::internal(format!(
                "table {} holds {} values",
                name,
                last.value_type()
            ))),
        }
    }

    fn get_description(&self) -> RmfResult<String> {
        self.get_metadata_string(names::DESCRIPTION_KEY)
    }

    fn set_description(&mut self, description: &str) -> RmfResult<()> {
        self.set_metadata_string(names::DESCRIPTION_KEY, description)
    }

    fn get_producer(&self) -> RmfResult<String> {
        self.get_metadata_string(names::PRODUCER_KEY)
    }

    fn set_producer(&mut self, producer: &str) -> RmfResult<()> {
        self.set_metadata_string(names::PRODUCER_KEY, producer)
    }

    fn get_frame_name(&self, frame: u32) -> RmfResult<String> {
        match self.find_table::<1>(names::FRAME_NAMES, ValueType::String)? {
            Some(table) => Ok(table.get([frame])?.as_string().unwrap_or_default().to_string()),
            None => Ok(String::new()),
        }
    }

    fn set_frame_name(&mut self, frame: u32, name: &str) -> RmfResult<()> {
        check_writable(self.read_only)?;
        check_frame(frame)?;
        self.open_table::<1>(names::FRAME_NAMES, ValueType::String)?
            .set([frame], &Value::String(name.to_string()))
    }

    fn flush(&mut self) -> RmfResult<()> {
        if !self.read_only {
            let saved_at = chrono::Utc::now().to_rfc3339();
            self.metadata
                .insert(names::SAVED_AT_KEY, &bincode::serialize(&saved_at)?)?;
        }
        self.driver.flush()?;
        log::info!(
            "Flushed columnar store {}",
            self.path
                .as_ref()
                .map_or_else(|| "<memory>".to_string(), |p| p.display().to_string())
        );
        Ok(())
    }

    fn reload(&mut self) -> RmfResult<()> {
        log::info!(
            "Reloading columnar store, dropping {} open tables",
            self.tables.open_count()
        );
        log::debug!(
            "Column cache before reload: {} hits, {} misses",
            self.columns.hits(),
            self.columns.misses()
        );
        self.tables.clear();
        self.columns.clear();
        self.max_columns.clear();
        self.key_counts.clear();
        self.tables.set_known(self.driver.list_trees()?);
        Ok(())
    }

    fn footprint(&self) -> RmfResult<u64> {
        let mut total = 0;
        for name in self.driver.list_trees()? {
            if let Some(stats) = self.driver.tree_stats(&name)? {
                total += stats.size_bytes;
            }
        }
        Ok(total)
    }
}
