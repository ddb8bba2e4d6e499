// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! File handles
//!
//! A [`FileHandle`] owns one open backend. Clones share it, so node and
//! node set handles stay valid as long as any clone is alive. Callers that
//! share a handle across threads get per-call locking only; sequences of
//! calls are not atomic.

use crate::association::{AssociationHandle, AssociationMap};
use crate::backend::{
    check_frame, create_shared_data, open_shared_data, DynSharedData, FlatSharedData, SharedData,
};
use crate::config::{BackendType, LockConfig, StoreConfig};
use crate::error::{usage_check, RmfError, RmfResult};
use crate::keys::{
    audit_category_name, audit_key_name, audit_node_name, Arity, Category, Key, KeyInfo,
};
use crate::lock::FileLock;
use crate::node::{NodeHandle, NodeSetHandle, NodeType, SetType};
use crate::types::{NodeId, StoredValue, Value, ValueType};
use parking_lot::RwLock;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Category holding the target of link nodes
pub(crate) const LINK_CATEGORY: &str = "link";
/// Static node id key pointing at a link's target
pub(crate) const LINK_KEY: &str = "linked";
/// Name given to link nodes
pub(crate) const LINK_NODE_NAME: &str = "link";

struct FileInner {
    backend: DynSharedData,
    associations: AssociationMap,
    config: StoreConfig,
}

#[derive(Clone)]
pub struct FileHandle {
    inner: Arc<RwLock<FileInner>>,
}

impl FileHandle {
    fn from_backend(backend: DynSharedData, config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(FileInner {
                backend,
                associations: AssociationMap::default(),
                config,
            })),
        }
    }

    /// Create a new columnar file on disk, replacing any existing RMF file
    pub fn create<P: AsRef<Path>>(path: P) -> RmfResult<Self> {
        Self::create_with_config(path, &StoreConfig::default())
    }

    pub fn create_with_config<P: AsRef<Path>>(path: P, config: &StoreConfig) -> RmfResult<Self> {
        let backend = create_shared_data(path.as_ref(), config)?;
        Ok(Self::from_backend(backend, config.clone()))
    }

    /// Open an existing file for reading and writing
    pub fn open<P: AsRef<Path>>(path: P) -> RmfResult<Self> {
        Self::open_with_config(path, &StoreConfig::default())
    }

    pub fn open_read_only<P: AsRef<Path>>(path: P) -> RmfResult<Self> {
        Self::open_with_config(path, &StoreConfig::default().with_read_only(true))
    }

    /// Open an existing file; the layout is detected from its content
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: &StoreConfig) -> RmfResult<Self> {
        let backend = open_shared_data(path.as_ref(), config)?;
        let mut config = config.clone();
        config.backend = backend.backend_type();
        Ok(Self::from_backend(backend, config))
    }

    /// Create an empty file kept in memory; see [`FileHandle::to_buffer`]
    pub fn create_in_buffer() -> RmfResult<Self> {
        let backend = FlatSharedData::create_in_buffer()?;
        Ok(Self::from_backend(Box::new(backend), StoreConfig::flat()))
    }

    pub fn open_from_buffer(bytes: &[u8]) -> RmfResult<Self> {
        let backend = FlatSharedData::open_from_buffer(bytes.to_vec(), false)?;
        Ok(Self::from_backend(Box::new(backend), StoreConfig::flat()))
    }

    pub fn open_buffer_read_only(bytes: &[u8]) -> RmfResult<Self> {
        let backend = FlatSharedData::open_from_buffer(bytes.to_vec(), true)?;
        let config = StoreConfig::flat().with_read_only(true);
        Ok(Self::from_backend(Box::new(backend), config))
    }

    /// Serialize the whole file into one self-contained blob
    pub fn to_buffer(&self) -> RmfResult<Vec<u8>> {
        self.with_backend(|b| b.to_buffer())
    }

    pub(crate) fn with_backend<R>(
        &self,
        f: impl FnOnce(&dyn SharedData) -> RmfResult<R>,
    ) -> RmfResult<R> {
        let inner = self.inner.read();
        f(inner.backend.as_ref())
    }

    pub(crate) fn with_backend_mut<R>(
        &self,
        f: impl FnOnce(&mut dyn SharedData) -> RmfResult<R>,
    ) -> RmfResult<R> {
        let mut inner = self.inner.write();
        f(inner.backend.as_mut())
    }

    pub(crate) fn same_file(&self, other: &FileHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.inner.read().backend.path().map(Path::to_path_buf)
    }

    pub fn backend_type(&self) -> BackendType {
        self.inner.read().backend.backend_type()
    }

    pub fn is_read_only(&self) -> bool {
        self.inner.read().backend.is_read_only()
    }

    pub fn config(&self) -> StoreConfig {
        self.inner.read().config.clone()
    }

    // ---- hierarchy ----

    pub fn get_root_node(&self) -> NodeHandle {
        NodeHandle::new(self.clone(), NodeId::ROOT)
    }

    pub fn get_node_from_id(&self, id: NodeId) -> RmfResult<NodeHandle> {
        let count = self.get_number_of_nodes();
        usage_check!(
            id.0 < count,
            "Invalid node id {} ({} nodes)",
            id.0,
            count
        );
        Ok(NodeHandle::new(self.clone(), id))
    }

    /// Total number of nodes, including the root and link nodes
    pub fn get_number_of_nodes(&self) -> u32 {
        self.inner.read().backend.get_number_of_nodes()
    }

    pub(crate) fn add_child(
        &self,
        parent: NodeId,
        name: &str,
        node_type: NodeType,
    ) -> RmfResult<NodeHandle> {
        audit_node_name(name)?;
        usage_check!(
            node_type != NodeType::Alias && node_type != NodeType::Root,
            "Can't add a child of type {} directly",
            node_type
        );
        let id = self.with_backend_mut(|b| b.add_child(parent, name, node_type))?;
        Ok(NodeHandle::new(self.clone(), id))
    }

    /// Link `child` under `parent` through a link node
    pub(crate) fn add_existing_child(&self, parent: NodeId, child: NodeId) -> RmfResult<()> {
        self.with_backend_mut(|b| {
            usage_check!(
                child.0 < b.get_number_of_nodes() && child != NodeId::ROOT,
                "Can't link node {} as a child",
                child
            );
            let link = ensure_link_key(b)?;
            let alias = b.add_child(parent, LINK_NODE_NAME, NodeType::Alias)?;
            b.set_value(alias.0, &link, 0, Value::NodeId(child))
        })
    }

    /// Children of `node`, most recent first, with link nodes resolved
    pub(crate) fn get_children(&self, node: NodeId) -> RmfResult<Vec<NodeHandle>> {
        let ids = self.with_backend(|b| {
            let raw = b.get_children(node)?;
            let mut link = None;
            let mut out = Vec::with_capacity(raw.len());
            for id in raw {
                if b.get_type(id)? != NodeType::Alias {
                    out.push(id);
                    continue;
                }
                if link.is_none() {
                    link = find_link_key(b)?;
                }
                let key = link.ok_or_else(|| {
                    RmfError::internal(format!("link node {} without a link key", id))
                })?;
                match b.get_value_always(id.0, &key, 0)? {
                    Value::NodeId(target) if !target.is_null() => out.push(target),
                    _ => {
                        return Err(RmfError::internal(format!(
                            "link node {} has no target",
                            id
                        )))
                    }
                }
            }
            Ok(out)
        })?;
        Ok(ids
            .into_iter()
            .map(|id| NodeHandle::new(self.clone(), id))
            .collect())
    }

    // ---- node sets ----

    /// Create an immutable set of 2 to 4 nodes
    pub fn add_node_set(
        &self,
        members: &[NodeHandle],
        set_type: SetType,
    ) -> RmfResult<NodeSetHandle> {
        for member in members {
            usage_check!(
                member.file().same_file(self),
                "Node {} belongs to another file",
                member.id()
            );
        }
        let ids: Vec<NodeId> = members.iter().map(NodeHandle::id).collect();
        let arity = Arity::for_set(ids.len())?;
        let index = self.with_backend_mut(|b| b.add_set(&ids, set_type))?;
        Ok(NodeSetHandle::new(self.clone(), arity, index))
    }

    pub fn get_number_of_node_sets(&self, arity: Arity) -> u32 {
        if arity == Arity::NODE {
            return 0;
        }
        self.inner.read().backend.get_number_of_sets(arity)
    }

    pub fn get_node_sets(&self, arity: Arity) -> Vec<NodeSetHandle> {
        (0..self.get_number_of_node_sets(arity))
            .map(|index| NodeSetHandle::new(self.clone(), arity, index))
            .collect()
    }

    pub fn get_node_set(&self, arity: Arity, index: u32) -> RmfResult<NodeSetHandle> {
        let count = self.get_number_of_node_sets(arity);
        usage_check!(
            index < count,
            "Invalid node set {} of arity {} ({} sets)",
            index,
            arity,
            count
        );
        Ok(NodeSetHandle::new(self.clone(), arity, index))
    }

    // ---- registry ----

    pub fn add_category(&self, arity: Arity, name: &str) -> RmfResult<Category> {
        audit_category_name(name)?;
        self.with_backend_mut(|b| b.add_category(arity, name))
    }

    pub fn get_category(&self, arity: Arity, name: &str) -> RmfResult<Option<Category>> {
        self.with_backend(|b| b.get_category(arity, name))
    }

    /// Look a category up, adding it if it does not exist
    pub fn get_category_always(&self, arity: Arity, name: &str) -> RmfResult<Category> {
        audit_category_name(name)?;
        self.with_backend_mut(|b| match b.get_category(arity, name)? {
            Some(category) => Ok(category),
            None => b.add_category(arity, name),
        })
    }

    pub fn get_categories(&self, arity: Arity) -> RmfResult<Vec<Category>> {
        self.with_backend(|b| b.get_categories(arity))
    }

    pub fn get_category_name(&self, category: Category) -> RmfResult<String> {
        self.with_backend(|b| b.get_category_name(category))
    }

    pub fn add_key<T: StoredValue>(
        &self,
        category: Category,
        name: &str,
        per_frame: bool,
    ) -> RmfResult<Key<T>> {
        audit_key_name(name)?;
        let info =
            self.with_backend_mut(|b| b.add_key(category, name, T::VALUE_TYPE, per_frame))?;
        Ok(Key::from_info(info))
    }

    pub fn get_key<T: StoredValue>(
        &self,
        category: Category,
        name: &str,
        per_frame: bool,
    ) -> RmfResult<Option<Key<T>>> {
        let info = self.with_backend(|b| b.get_key(category, name, T::VALUE_TYPE, per_frame))?;
        Ok(info.map(Key::from_info))
    }

    /// Look a key up, adding it if it does not exist
    pub fn get_key_always<T: StoredValue>(
        &self,
        category: Category,
        name: &str,
        per_frame: bool,
    ) -> RmfResult<Key<T>> {
        audit_key_name(name)?;
        let info = self.with_backend_mut(|b| {
            match b.get_key(category, name, T::VALUE_TYPE, per_frame)? {
                Some(info) => Ok(info),
                None => b.add_key(category, name, T::VALUE_TYPE, per_frame),
            }
        })?;
        Ok(Key::from_info(info))
    }

    /// Keys of type `T` in `category`, static ones first
    pub fn get_keys<T: StoredValue>(&self, category: Category) -> RmfResult<Vec<Key<T>>> {
        let infos = self.with_backend(|b| b.get_keys(category, T::VALUE_TYPE))?;
        Ok(infos.into_iter().map(Key::from_info).collect())
    }

    /// Keys of every type in `category`
    pub fn get_all_keys(&self, category: Category) -> RmfResult<Vec<KeyInfo>> {
        self.with_backend(|b| {
            let mut keys = Vec::new();
            for value_type in ValueType::ALL {
                keys.extend(b.get_keys(category, value_type)?);
            }
            Ok(keys)
        })
    }

    pub fn get_key_name<T: StoredValue>(&self, key: Key<T>) -> RmfResult<String> {
        self.get_key_info_name(&key.info())
    }

    pub fn get_key_info_name(&self, key: &KeyInfo) -> RmfResult<String> {
        self.with_backend(|b| b.get_key_name(key))
    }

    pub fn get_is_per_frame<T: StoredValue>(&self, key: Key<T>) -> bool {
        key.is_per_frame()
    }

    /// Number of frames written for a per-frame key
    pub fn get_number_of_frames_for<T: StoredValue>(&self, key: Key<T>) -> RmfResult<u32> {
        self.with_backend(|b| b.get_number_of_frames(&key.info()))
    }

    /// Highest frame count over every per-frame key of the file
    pub fn get_number_of_frames(&self) -> RmfResult<u32> {
        self.with_backend(|b| {
            let mut frames = 0;
            for arity in Arity::ALL {
                for category in b.get_categories(arity)? {
                    for value_type in ValueType::ALL {
                        for key in b.get_keys(category, value_type)? {
                            if key.per_frame {
                                frames = frames.max(b.get_number_of_frames(&key)?);
                            }
                        }
                    }
                }
            }
            Ok(frames)
        })
    }

    // ---- values ----

    pub(crate) fn get_value_info(
        &self,
        arity: Arity,
        id: u32,
        key: &KeyInfo,
        frame: Option<u32>,
    ) -> RmfResult<Value> {
        check_key_arity(arity, key)?;
        let frame = resolve_frame(key, frame)?;
        self.with_backend(|b| b.get_value_always(id, key, frame))
    }

    pub(crate) fn set_value_info(
        &self,
        arity: Arity,
        id: u32,
        key: &KeyInfo,
        frame: Option<u32>,
        value: Value,
    ) -> RmfResult<()> {
        check_key_arity(arity, key)?;
        let frame = resolve_frame(key, frame)?;
        self.with_backend_mut(|b| b.set_value(id, key, frame, value))
    }

    pub(crate) fn get_value<T: StoredValue>(
        &self,
        arity: Arity,
        id: u32,
        key: Key<T>,
        frame: Option<u32>,
    ) -> RmfResult<T> {
        let info = key.info();
        check_key_arity(arity, &info)?;
        let frame = resolve_frame(&info, frame)?;
        T::from_value(self.with_backend(|b| b.get_value(id, &info, frame))?)
    }

    pub(crate) fn get_value_always<T: StoredValue>(
        &self,
        arity: Arity,
        id: u32,
        key: Key<T>,
        frame: Option<u32>,
    ) -> RmfResult<T> {
        T::from_value(self.get_value_info(arity, id, &key.info(), frame)?)
    }

    pub(crate) fn get_has_value<T: StoredValue>(
        &self,
        arity: Arity,
        id: u32,
        key: Key<T>,
        frame: Option<u32>,
    ) -> RmfResult<bool> {
        Ok(!self.get_value_info(arity, id, &key.info(), frame)?.is_null())
    }

    pub(crate) fn set_value<T: StoredValue>(
        &self,
        arity: Arity,
        id: u32,
        key: Key<T>,
        frame: Option<u32>,
        value: T,
    ) -> RmfResult<()> {
        self.set_value_info(arity, id, &key.info(), frame, value.into_value())
    }

    pub(crate) fn get_all_values<T: StoredValue>(
        &self,
        arity: Arity,
        id: u32,
        key: Key<T>,
    ) -> RmfResult<Vec<T>> {
        let info = key.info();
        check_key_arity(arity, &info)?;
        let values = self.with_backend(|b| {
            let frames = b.get_number_of_frames(&info)?;
            (0..frames)
                .map(|frame| b.get_value_always(id, &info, frame))
                .collect::<RmfResult<Vec<Value>>>()
        })?;
        values.into_iter().map(T::from_value).collect()
    }

    // ---- file metadata ----

    pub fn get_description(&self) -> RmfResult<String> {
        self.with_backend(|b| b.get_description())
    }

    pub fn set_description(&self, description: &str) -> RmfResult<()> {
        self.with_backend_mut(|b| b.set_description(description))
    }

    pub fn get_producer(&self) -> RmfResult<String> {
        self.with_backend(|b| b.get_producer())
    }

    pub fn set_producer(&self, producer: &str) -> RmfResult<()> {
        self.with_backend_mut(|b| b.set_producer(producer))
    }

    pub fn get_frame_name(&self, frame: u32) -> RmfResult<String> {
        check_frame(frame)?;
        self.with_backend(|b| b.get_frame_name(frame))
    }

    pub fn set_frame_name(&self, frame: u32, name: &str) -> RmfResult<()> {
        self.with_backend_mut(|b| b.set_frame_name(frame, name))
    }

    // ---- associations ----

    pub fn set_association(
        &self,
        node: &NodeHandle,
        handle: AssociationHandle,
        overwrite: bool,
    ) -> RmfResult<()> {
        usage_check!(
            node.file().same_file(self),
            "Node {} belongs to another file",
            node.id()
        );
        self.inner
            .write()
            .associations
            .set(node.id(), handle, overwrite)
    }

    pub fn get_association(&self, node: &NodeHandle) -> Option<AssociationHandle> {
        self.inner.read().associations.get(node.id())
    }

    pub fn get_has_association(&self, node: &NodeHandle) -> bool {
        self.get_association(node).is_some()
    }

    pub fn get_node_from_association(&self, handle: AssociationHandle) -> Option<NodeHandle> {
        let id = self.inner.read().associations.node_for(handle)?;
        Some(NodeHandle::new(self.clone(), id))
    }

    /// Forget every association
    pub fn clear_associations(&self) {
        self.inner.write().associations.clear();
    }

    // ---- lifecycle ----

    /// Make every change durable
    pub fn flush(&self) -> RmfResult<()> {
        self.with_backend_mut(|b| b.flush())
    }

    /// Drop cached state and re-read the file
    pub fn reload(&self) -> RmfResult<()> {
        self.with_backend_mut(|b| b.reload())
    }

    /// Physical size of the file in bytes
    pub fn footprint(&self) -> RmfResult<u64> {
        self.with_backend(|b| b.footprint())
    }

    /// Take the advisory lock, polling as configured
    pub fn lock(&self) -> RmfResult<FileLock> {
        let config = self.inner.read().config.lock.clone();
        FileLock::acquire(self, &config)
    }

    pub fn lock_with(&self, config: &LockConfig) -> RmfResult<FileLock> {
        FileLock::acquire(self, config)
    }

    /// Take the advisory lock if it is free
    pub fn try_lock(&self) -> RmfResult<Option<FileLock>> {
        FileLock::try_acquire(self)
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("FileHandle")
            .field("path", &inner.backend.path())
            .field("backend", &inner.backend.backend_type())
            .field("read_only", &inner.backend.is_read_only())
            .finish()
    }
}

/// Key holding the target of link nodes, if any link was ever made
pub(crate) fn find_link_key(backend: &dyn SharedData) -> RmfResult<Option<KeyInfo>> {
    match backend.get_category(Arity::NODE, LINK_CATEGORY)? {
        Some(category) => backend.get_key(category, LINK_KEY, ValueType::NodeId, false),
        None => Ok(None),
    }
}

fn ensure_link_key(backend: &mut dyn SharedData) -> RmfResult<KeyInfo> {
    let category = match backend.get_category(Arity::NODE, LINK_CATEGORY)? {
        Some(category) => category,
        None => backend.add_category(Arity::NODE, LINK_CATEGORY)?,
    };
    match backend.get_key(category, LINK_KEY, ValueType::NodeId, false)? {
        Some(key) => Ok(key),
        None => backend.add_key(category, LINK_KEY, ValueType::NodeId, false),
    }
}

fn check_key_arity(arity: Arity, key: &KeyInfo) -> RmfResult<()> {
    usage_check!(
        key.arity() == arity,
        "Key of arity {} used on an object of arity {}",
        key.arity(),
        arity
    );
    Ok(())
}

/// Frame passed to the backend; per-frame keys need an explicit one
fn resolve_frame(key: &KeyInfo, frame: Option<u32>) -> RmfResult<u32> {
    if !key.per_frame {
        return Ok(0);
    }
    let frame = frame.ok_or_else(|| RmfError::Usage("Per-frame keys need a frame".to_string()))?;
    check_frame(frame)?;
    Ok(frame)
}
