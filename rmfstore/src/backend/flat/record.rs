// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Serializable document of the flat layout
//!
//! ```text
//! +----------------+-------------------+------------------------+
//! | magic (8 B)    | CRC32 LE (4 B)    | bincode FlatDocument   |
//! +----------------+-------------------+------------------------+
//! ```

use crate::error::{RmfError, RmfResult};
use crate::keys::{Arity, Category, KeyInfo};
use crate::node::{NodeType, SetType};
use crate::types::{NodeId, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub(crate) const MAGIC_LEN: usize = 8;
pub(crate) const MAGIC: [u8; MAGIC_LEN] = *b"RMFFLAT\x01";
const HEADER_LEN: usize = MAGIC_LEN + 4;
const VERSION: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct NodeRecord {
    pub name: String,
    pub node_type: NodeType,
    pub first_child: NodeId,
    pub sibling: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SetRecord {
    pub members: Vec<NodeId>,
    pub set_type: SetType,
}

/// Values of one key, indexed by object id
///
/// Frames are kept sparse so a write to a far frame costs one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) enum KeyData {
    Static(Vec<Value>),
    PerFrame(Vec<BTreeMap<u32, Value>>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct KeyRecord {
    pub info: KeyInfo,
    pub name: String,
    /// 1 + highest frame written, per-frame keys only
    pub frames: u32,
    pub data: KeyData,
}

impl KeyRecord {
    pub(crate) fn new(info: KeyInfo, name: &str) -> Self {
        let data = if info.per_frame {
            KeyData::PerFrame(Vec::new())
        } else {
            KeyData::Static(Vec::new())
        };
        Self {
            info,
            name: name.to_string(),
            frames: 0,
            data,
        }
    }

    pub(crate) fn get(&self, id: u32, frame: u32) -> Option<&Value> {
        match &self.data {
            KeyData::Static(slots) => slots.get(id as usize),
            KeyData::PerFrame(slots) => slots
                .get(id as usize)
                .and_then(|frames| frames.get(&frame)),
        }
    }

    pub(crate) fn set(&mut self, id: u32, frame: u32, value: Value) {
        let null = self.info.value_type.null_value();
        let id = id as usize;
        match &mut self.data {
            KeyData::Static(slots) => {
                if slots.len() <= id {
                    slots.resize(id + 1, null);
                }
                slots[id] = value;
            }
            KeyData::PerFrame(slots) => {
                if slots.len() <= id {
                    slots.resize(id + 1, BTreeMap::new());
                }
                slots[id].insert(frame, value);
                self.frames = self.frames.max(frame.saturating_add(1));
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FlatDocument {
    pub version: u32,
    pub saved_at: Option<DateTime<Utc>>,
    pub description: String,
    pub producer: String,
    pub frame_names: BTreeMap<u32, String>,
    pub nodes: Vec<NodeRecord>,
    /// Indexed by arity - 2
    pub sets: Vec<Vec<SetRecord>>,
    /// Indexed by arity - 1
    pub categories: Vec<Vec<String>>,
    pub keys: Vec<KeyRecord>,
    #[serde(skip)]
    lookup: HashMap<KeyInfo, usize>,
}

impl FlatDocument {
    /// Document holding only the root node
    pub(crate) fn new() -> Self {
        Self {
            version: VERSION,
            saved_at: None,
            description: String::new(),
            producer: String::new(),
            frame_names: BTreeMap::new(),
            nodes: vec![NodeRecord {
                name: "root".to_string(),
                node_type: NodeType::Root,
                first_child: NodeId::NULL,
                sibling: NodeId::NULL,
            }],
            sets: vec![Vec::new(); Arity::SETS.len()],
            categories: vec![Vec::new(); Arity::ALL.len()],
            keys: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    fn reindex(&mut self) {
        self.lookup = self
            .keys
            .iter()
            .enumerate()
            .map(|(i, record)| (record.info, i))
            .collect();
    }

    pub(crate) fn sets(&self, arity: Arity) -> &[SetRecord] {
        match arity.get().checked_sub(2) {
            Some(slot) => &self.sets[slot],
            None => &[],
        }
    }

    pub(crate) fn sets_mut(&mut self, arity: Arity) -> &mut Vec<SetRecord> {
        &mut self.sets[arity.get() - 2]
    }

    pub(crate) fn categories(&self, arity: Arity) -> &[String] {
        &self.categories[arity.slot()]
    }

    pub(crate) fn categories_mut(&mut self, arity: Arity) -> &mut Vec<String> {
        &mut self.categories[arity.slot()]
    }

    pub(crate) fn key(&self, info: &KeyInfo) -> Option<&KeyRecord> {
        self.lookup.get(info).map(|&i| &self.keys[i])
    }

    pub(crate) fn key_mut(&mut self, info: &KeyInfo) -> Option<&mut KeyRecord> {
        match self.lookup.get(info) {
            Some(&i) => self.keys.get_mut(i),
            None => None,
        }
    }

    /// Keys of `category` matching the type and per-frame flag, by index
    pub(crate) fn keys_like<'a>(
        &'a self,
        category: Category,
        value_type: crate::types::ValueType,
        per_frame: bool,
    ) -> impl Iterator<Item = &'a KeyRecord> + 'a {
        self.keys.iter().filter(move |r| {
            r.info.category == category
                && r.info.value_type == value_type
                && r.info.per_frame == per_frame
        })
    }

    pub(crate) fn push_key(&mut self, record: KeyRecord) {
        self.lookup.insert(record.info, self.keys.len());
        self.keys.push(record);
    }

    /// Number of objects of an arity
    pub(crate) fn count(&self, arity: Arity) -> u32 {
        if arity == Arity::NODE {
            self.nodes.len() as u32
        } else {
            self.sets(arity).len() as u32
        }
    }

    pub(crate) fn encode(&self) -> RmfResult<Vec<u8>> {
        let payload = bincode::serialize(self)?;
        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    pub(crate) fn decode(bytes: &[u8]) -> RmfResult<Self> {
        if bytes.len() < HEADER_LEN || bytes[..MAGIC_LEN] != MAGIC {
            return Err(RmfError::Io("Not a flat RMF file (bad magic)".to_string()));
        }
        let mut crc = [0u8; 4];
        crc.copy_from_slice(&bytes[MAGIC_LEN..HEADER_LEN]);
        let payload = &bytes[HEADER_LEN..];
        if crc32fast::hash(payload) != u32::from_le_bytes(crc) {
            return Err(RmfError::Io(
                "Flat RMF file is corrupt (checksum mismatch)".to_string(),
            ));
        }
        let mut doc: FlatDocument = bincode::deserialize(payload)?;
        if doc.version != VERSION {
            return Err(RmfError::Io(format!(
                "Unsupported flat file version {}",
                doc.version
            )));
        }
        if doc.sets.len() != Arity::SETS.len() || doc.categories.len() != Arity::ALL.len() {
            return Err(RmfError::Io("Flat RMF file has a malformed layout".to_string()));
        }
        doc.reindex();
        Ok(doc)
    }
}
