// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Categories and keys
//!
//! A category groups keys for one arity (nodes, pairs, triplets, quads).
//! A key is a typed attribute handle inside a category; it is either static
//! or per-frame. Both are append-only for the life of a file, so their
//! integer indexes are stable handles.

use crate::error::{usage_check, RmfResult};
use crate::types::{StoredValue, ValueType};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

static ILLEGAL_KEY_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\:=()\[\]{}"']"#).expect("static regex is valid"));

/// Number of members of the objects a category describes
///
/// Arity 1 describes nodes; arities 2 to 4 describe node sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Arity(u8);

impl Arity {
    pub const NODE: Arity = Arity(1);
    pub const PAIR: Arity = Arity(2);
    pub const TRIPLET: Arity = Arity(3);
    pub const QUAD: Arity = Arity(4);

    /// Every supported arity
    pub const ALL: [Arity; 4] = [Arity::NODE, Arity::PAIR, Arity::TRIPLET, Arity::QUAD];

    /// Every arity a node set may have
    pub const SETS: [Arity; 3] = [Arity::PAIR, Arity::TRIPLET, Arity::QUAD];

    pub fn new(arity: usize) -> RmfResult<Self> {
        usage_check!(
            (1..=4).contains(&arity),
            "Arity must be between 1 and 4, got {}",
            arity
        );
        Ok(Arity(arity as u8))
    }

    /// Arity for a node set with `members` members
    pub fn for_set(members: usize) -> RmfResult<Self> {
        usage_check!(
            (2..=4).contains(&members),
            "Node sets must have 2 to 4 members, got {}",
            members
        );
        Ok(Arity(members as u8))
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }

    /// Zero-based slot for per-arity arrays
    pub(crate) fn slot(self) -> usize {
        self.0 as usize - 1
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a named category of one arity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Category {
    arity: Arity,
    index: u32,
}

impl Category {
    pub(crate) fn new(arity: Arity, index: u32) -> Self {
        Self { arity, index }
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

/// Untyped identity of a key, as seen by the backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KeyInfo {
    pub category: Category,
    pub value_type: ValueType,
    pub per_frame: bool,
    pub index: u32,
}

impl KeyInfo {
    pub fn arity(&self) -> Arity {
        self.category.arity()
    }
}

/// Typed attribute handle
///
/// Names are unique per (category, value type, per-frame); the same name may
/// therefore exist once as a static key and once as a per-frame key.
pub struct Key<T: StoredValue> {
    info: KeyInfo,
    _marker: PhantomData<fn() -> T>,
}

impl<T: StoredValue> Key<T> {
    pub(crate) fn from_info(info: KeyInfo) -> Self {
        debug_assert_eq!(info.value_type, T::VALUE_TYPE);
        Self {
            info,
            _marker: PhantomData,
        }
    }

    pub fn info(&self) -> KeyInfo {
        self.info
    }

    pub fn category(&self) -> Category {
        self.info.category
    }

    pub fn index(&self) -> u32 {
        self.info.index
    }

    pub fn is_per_frame(&self) -> bool {
        self.info.per_frame
    }

    pub fn arity(&self) -> Arity {
        self.info.arity()
    }
}

impl<T: StoredValue> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: StoredValue> Copy for Key<T> {}

impl<T: StoredValue> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.info == other.info
    }
}

impl<T: StoredValue> Eq for Key<T> {}

impl<T: StoredValue> Hash for Key<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.info.hash(state);
    }
}

impl<T: StoredValue> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("category", &self.info.category)
            .field("type", &self.info.value_type)
            .field("per_frame", &self.info.per_frame)
            .field("index", &self.info.index)
            .finish()
    }
}

/// Reject key names the file format reserves
pub(crate) fn audit_key_name(name: &str) -> RmfResult<()> {
    usage_check!(!name.is_empty(), "Empty key name");
    if let Some(m) = ILLEGAL_KEY_CHARS.find(name) {
        usage_check!(
            false,
            "Key names can't contain '{}', but \"{}\" does",
            m.as_str(),
            name
        );
    }
    usage_check!(
        !name.contains("  "),
        "Key names can't contain two consecutive spaces: \"{}\"",
        name
    );
    Ok(())
}

/// Reject node names the file format reserves
pub(crate) fn audit_node_name(name: &str) -> RmfResult<()> {
    usage_check!(!name.is_empty(), "Empty node name");
    usage_check!(
        !name.contains('"'),
        "Node names can't contain '\"', but \"{}\" does",
        name
    );
    Ok(())
}

pub(crate) fn audit_category_name(name: &str) -> RmfResult<()> {
    usage_check!(!name.is_empty(), "Empty category name");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_bounds() {
        assert!(Arity::new(0).unwrap_err().is_usage());
        assert!(Arity::new(5).unwrap_err().is_usage());
        assert_eq!(Arity::new(3).unwrap(), Arity::TRIPLET);
        assert!(Arity::for_set(1).is_err());
        assert_eq!(Arity::for_set(2).unwrap().slot(), 1);
    }

    #[test]
    fn test_key_name_audit() {
        assert!(audit_key_name("cartesian x").is_ok());
        assert!(audit_key_name("").is_err());
        assert!(audit_key_name("a:b").is_err());
        assert!(audit_key_name("f(x)").is_err());
        assert!(audit_key_name("it's").is_err());
        assert!(audit_key_name("two  spaces").is_err());
    }

    #[test]
    fn test_node_name_audit() {
        assert!(audit_node_name("chain A").is_ok());
        assert!(audit_node_name("say \"hi\"").is_err());
        assert!(audit_node_name("").is_err());
    }

    #[test]
    fn test_typed_key_identity() {
        let cat = Category::new(Arity::NODE, 2);
        let info = KeyInfo {
            category: cat,
            value_type: ValueType::Float,
            per_frame: false,
            index: 0,
        };
        let a: Key<f64> = Key::from_info(info);
        let b: Key<f64> = Key::from_info(KeyInfo {
            per_frame: true,
            ..info
        });
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.info().value_type, ValueType::Float);
        assert_eq!(b.arity(), Arity::NODE);
    }
}
