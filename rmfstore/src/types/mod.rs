// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Value type system for stored attributes
//!
//! The set of storable types is closed: five scalar types and a homogeneous
//! list of each. Every type reserves one null sentinel meaning "absent",
//! distinguishable from any value a caller may write.

mod stored;
mod value;

pub use stored::StoredValue;
pub use value::{NodeId, Value, ValueType};
