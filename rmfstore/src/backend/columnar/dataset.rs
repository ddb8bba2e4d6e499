// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Dense N-dimensional tables over one storage tree
//!
//! A table has a fixed value type and an extent per dimension. Cells live
//! under `b'c'` followed by the big-endian coordinates; the extent lives
//! under `b"extent"`. Reading outside the extent, or a cell that was never
//! written, yields the null sentinel of the table's type.

use crate::error::{RmfError, RmfResult};
use crate::storage::StorageTree;
use crate::types::{Value, ValueType};
use parking_lot::Mutex;

const EXTENT_KEY: &[u8] = b"extent";
const CELL_PREFIX: u8 = b'c';

pub(crate) struct DataSet<const D: usize> {
    name: String,
    tree: Box<dyn StorageTree>,
    value_type: ValueType,
    extent: Mutex<[u32; D]>,
}

impl<const D: usize> DataSet<D> {
    /// Wrap `tree`, loading the stored extent if there is one
    pub(crate) fn open(
        name: &str,
        tree: Box<dyn StorageTree>,
        value_type: ValueType,
    ) -> RmfResult<Self> {
        let extent = match tree.get(EXTENT_KEY)? {
            Some(bytes) => {
                let dims: Vec<u32> = bincode::deserialize(&bytes)?;
                let dims: [u32; D] = dims.try_into().map_err(|dims: Vec<u32>| {
                    RmfError::Io(format!(
                        "Table {} has {} dimensions, expected {}",
                        name,
                        dims.len(),
                        D
                    ))
                })?;
                dims
            }
            None => [0; D],
        };
        Ok(Self {
            name: name.to_string(),
            tree,
            value_type,
            extent: Mutex::new(extent),
        })
    }

    pub(crate) fn extent(&self) -> [u32; D] {
        *self.extent.lock()
    }

    fn cell_key(index: &[u32; D]) -> Vec<u8> {
        let mut key = Vec::with_capacity(1 + 4 * D);
        key.push(CELL_PREFIX);
        for i in index {
            key.extend_from_slice(&i.to_be_bytes());
        }
        key
    }

    pub(crate) fn get(&self, index: [u32; D]) -> RmfResult<Value> {
        let extent = self.extent();
        if index.iter().zip(extent.iter()).any(|(i, e)| i >= e) {
            return Ok(self.value_type.null_value());
        }
        match self.tree.get(&Self::cell_key(&index))? {
            Some(bytes) => {
                let value: Value = bincode::deserialize(&bytes)?;
                if value.value_type() != self.value_type {
                    return Err(RmfError::internal(format!(
                        "table {} holds {} values but a cell decoded as {}",
                        self.name,
                        self.value_type,
                        value.value_type()
                    )));
                }
                Ok(value)
            }
            None => Ok(self.value_type.null_value()),
        }
    }

    /// Write one cell, growing the extent to fit it
    pub(crate) fn set(&self, index: [u32; D], value: &Value) -> RmfResult<()> {
        if value.value_type() != self.value_type {
            return Err(RmfError::internal(format!(
                "writing a {} value into {} table {}",
                value.value_type(),
                self.value_type,
                self.name
            )));
        }
        let cell = bincode::serialize(value)?;
        let mut extent = self.extent.lock();
        let grown = fit(&extent, &index)?;
        if grown != *extent {
            let dims = bincode::serialize(&grown.to_vec())?;
            self.tree.batch_insert(&[
                (&Self::cell_key(&index)[..], &cell[..]),
                (EXTENT_KEY, &dims[..]),
            ])?;
            *extent = grown;
        } else {
            self.tree.insert(&Self::cell_key(&index), &cell)?;
        }
        Ok(())
    }

    /// Grow the extent to at least `size` without writing cells
    pub(crate) fn reserve(&self, size: [u32; D]) -> RmfResult<()> {
        let mut extent = self.extent.lock();
        let mut grown = *extent;
        for (g, s) in grown.iter_mut().zip(size.iter()) {
            *g = (*g).max(*s);
        }
        if grown != *extent {
            log::debug!("Reserving {:?} in table {}", grown, self.name);
            self.tree
                .insert(EXTENT_KEY, &bincode::serialize(&grown.to_vec())?)?;
            *extent = grown;
        }
        Ok(())
    }
}

/// Smallest extent containing both `extent` and `index`
fn fit<const D: usize>(extent: &[u32; D], index: &[u32; D]) -> RmfResult<[u32; D]> {
    let mut out = *extent;
    for (o, i) in out.iter_mut().zip(index.iter()) {
        let end = i
            .checked_add(1)
            .ok_or_else(|| RmfError::Usage(format!("Index {} is out of range", i)))?;
        *o = (*o).max(end);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorageDriver;
    use crate::storage::StorageDriver;

    fn table<const D: usize>(
        driver: &MemoryStorageDriver,
        name: &str,
        ty: ValueType,
    ) -> DataSet<D> {
        DataSet::open(name, driver.open_tree(name).unwrap(), ty).unwrap()
    }

    #[test]
    fn test_out_of_extent_reads_null() {
        let driver = MemoryStorageDriver::new();
        let t: DataSet<2> = table(&driver, "t", ValueType::Float);
        assert_eq!(t.extent(), [0, 0]);
        assert!(t.get([5, 5]).unwrap().is_null());
        t.set([1, 3], &Value::Float(2.5)).unwrap();
        assert_eq!(t.extent(), [2, 4]);
        assert_eq!(t.get([1, 3]).unwrap(), Value::Float(2.5));
        assert!(t.get([0, 0]).unwrap().is_null());
        assert!(t.get([1, 4]).unwrap().is_null());
    }

    #[test]
    fn test_extent_survives_reopen() {
        let driver = MemoryStorageDriver::new();
        {
            let t: DataSet<3> = table(&driver, "frames", ValueType::Int);
            t.set([0, 1, 7], &Value::Int(3)).unwrap();
            t.reserve([1, 1, 10]).unwrap();
        }
        let t: DataSet<3> = table(&driver, "frames", ValueType::Int);
        assert_eq!(t.extent(), [1, 2, 10]);
        assert_eq!(t.get([0, 1, 7]).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_dimension_mismatch_is_io() {
        let driver = MemoryStorageDriver::new();
        let t: DataSet<1> = table(&driver, "names", ValueType::String);
        t.set([0], &Value::String("a".into())).unwrap();
        let reopened =
            DataSet::<2>::open("names", driver.open_tree("names").unwrap(), ValueType::String);
        assert!(reopened.err().unwrap().is_io());
    }

    #[test]
    fn test_last_index_is_rejected() {
        let driver = MemoryStorageDriver::new();
        let t: DataSet<2> = table(&driver, "t", ValueType::Int);
        let err = t.set([0, u32::MAX], &Value::Int(1)).unwrap_err();
        assert!(err.is_usage());
        assert_eq!(t.extent(), [0, 0]);
        t.set([0, u32::MAX - 1], &Value::Int(1)).unwrap();
        assert_eq!(t.extent(), [1, u32::MAX]);
    }

    #[test]
    fn test_wrong_type_is_internal() {
        let driver = MemoryStorageDriver::new();
        let t: DataSet<1> = table(&driver, "ints", ValueType::Int);
        let err = t.set([0], &Value::Float(1.0)).unwrap_err();
        assert!(matches!(err, RmfError::Internal(_)));
    }
}
