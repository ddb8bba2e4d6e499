// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Mapping between Rust types and stored values
//!
//! Typed keys (`Key<T>`) are parameterised over a `StoredValue`, which
//! fixes the physical value type and the null sentinel at compile time.

use super::value::{NodeId, Value, ValueType};
use crate::error::{RmfError, RmfResult};
use std::fmt::Debug;

/// A Rust type that can be stored as an attribute value
pub trait StoredValue: Clone + PartialEq + Debug + Send + Sync + 'static {
    /// Physical type tag of this Rust type
    const VALUE_TYPE: ValueType;

    /// The reserved "absent" value
    fn null_value() -> Self;

    /// True if `self` is the null sentinel
    fn is_null(&self) -> bool {
        self.clone().into_value().is_null()
    }

    /// Wrap into a dynamic value
    fn into_value(self) -> Value;

    /// Unwrap a dynamic value; a variant mismatch is an engine defect
    fn from_value(value: Value) -> RmfResult<Self>;
}

macro_rules! impl_stored_value {
    ($rust:ty, $variant:ident) => {
        impl StoredValue for $rust {
            const VALUE_TYPE: ValueType = ValueType::$variant;

            fn null_value() -> Self {
                match ValueType::$variant.null_value() {
                    Value::$variant(v) => v,
                    _ => unreachable!("null sentinel has the wrong variant"),
                }
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: Value) -> RmfResult<Self> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(RmfError::internal(format!(
                        "expected a {} value, found {}",
                        ValueType::$variant,
                        other.value_type()
                    ))),
                }
            }
        }
    };
}

impl_stored_value!(i64, Int);
impl_stored_value!(f64, Float);
impl_stored_value!(String, String);
impl_stored_value!(u32, Index);
impl_stored_value!(NodeId, NodeId);
impl_stored_value!(Vec<i64>, Ints);
impl_stored_value!(Vec<f64>, Floats);
impl_stored_value!(Vec<String>, Strings);
impl_stored_value!(Vec<u32>, Indexes);
impl_stored_value!(Vec<NodeId>, NodeIds);
