// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Dynamic values and their type tags

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a node in a file's hierarchy
///
/// Ids are dense and monotonic; the root is always `NodeId(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Reserved id meaning "no node"
    pub const NULL: NodeId = NodeId(u32::MAX);

    /// The implicit root node of every file
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> u32 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "NodeId(null)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

/// Tag for the closed set of storable value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Int,
    Float,
    String,
    Index,
    NodeId,
    Ints,
    Floats,
    Strings,
    Indexes,
    NodeIds,
}

impl ValueType {
    /// Every storable type, in table-numbering order
    pub const ALL: [ValueType; 10] = [
        ValueType::Int,
        ValueType::Float,
        ValueType::String,
        ValueType::Index,
        ValueType::NodeId,
        ValueType::Ints,
        ValueType::Floats,
        ValueType::Strings,
        ValueType::Indexes,
        ValueType::NodeIds,
    ];

    /// Stable lower-case name, used in physical table names
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::Index => "index",
            ValueType::NodeId => "node_id",
            ValueType::Ints => "ints",
            ValueType::Floats => "floats",
            ValueType::Strings => "strings",
            ValueType::Indexes => "indexes",
            ValueType::NodeIds => "node_ids",
        }
    }

    /// True for the homogeneous-list variants
    pub fn is_list(self) -> bool {
        matches!(
            self,
            ValueType::Ints
                | ValueType::Floats
                | ValueType::Strings
                | ValueType::Indexes
                | ValueType::NodeIds
        )
    }

    /// The null sentinel of this type
    pub fn null_value(self) -> Value {
        match self {
            ValueType::Int => Value::Int(i64::MAX),
            ValueType::Float => Value::Float(f64::MAX),
            ValueType::String => Value::String(String::new()),
            ValueType::Index => Value::Index(u32::MAX),
            ValueType::NodeId => Value::NodeId(NodeId::NULL),
            ValueType::Ints => Value::Ints(Vec::new()),
            ValueType::Floats => Value::Floats(Vec::new()),
            ValueType::Strings => Value::Strings(Vec::new()),
            ValueType::Indexes => Value::Indexes(Vec::new()),
            ValueType::NodeIds => Value::NodeIds(Vec::new()),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A stored attribute value of any supported type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    String(String),
    Index(u32),
    NodeId(NodeId),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
    Strings(Vec<String>),
    Indexes(Vec<u32>),
    NodeIds(Vec<NodeId>),
}

impl Value {
    /// The null sentinel for `value_type`
    pub fn null_of(value_type: ValueType) -> Value {
        value_type.null_value()
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::Index(_) => ValueType::Index,
            Value::NodeId(_) => ValueType::NodeId,
            Value::Ints(_) => ValueType::Ints,
            Value::Floats(_) => ValueType::Floats,
            Value::Strings(_) => ValueType::Strings,
            Value::Indexes(_) => ValueType::Indexes,
            Value::NodeIds(_) => ValueType::NodeIds,
        }
    }

    /// True if this is the null sentinel of its type
    pub fn is_null(&self) -> bool {
        match self {
            Value::Int(v) => *v == i64::MAX,
            // anything at or above the maximum counts, so round-tripped
            // sentinels stay null
            Value::Float(v) => *v >= f64::MAX,
            Value::String(v) => v.is_empty(),
            Value::Index(v) => *v == u32::MAX,
            Value::NodeId(v) => v.is_null(),
            Value::Ints(v) => v.is_empty(),
            Value::Floats(v) => v.is_empty(),
            Value::Strings(v) => v.is_empty(),
            Value::Indexes(v) => v.is_empty(),
            Value::NodeIds(v) => v.is_empty(),
        }
    }

    /// Extract as index if possible
    pub fn as_index(&self) -> Option<u32> {
        match self {
            Value::Index(v) => Some(*v),
            _ => None,
        }
    }

    /// Extract as string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "null");
        }
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "\"{}\"", v),
            Value::Index(v) => write!(f, "{}", v),
            Value::NodeId(v) => write!(f, "{}", v),
            Value::Ints(v) => write!(f, "{:?}", v),
            Value::Floats(v) => write!(f, "{:?}", v),
            Value::Strings(v) => write!(f, "{:?}", v),
            Value::Indexes(v) => write!(f, "{:?}", v),
            Value::NodeIds(v) => {
                let ids: Vec<u32> = v.iter().map(|id| id.0).collect();
                write!(f, "{:?}", ids)
            }
        }
    }
}
