// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Caches of the columnar layout
//!
//! Data is append-only for a single writer, so nothing here is invalidated
//! by writes; `clear` is called only on reload.

use super::dataset::DataSet;
use crate::keys::{Arity, Category};
use crate::types::ValueType;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnEntry {
    id: u32,
    category: u32,
    column: u32,
}

/// Last resolved (object, category) -> column per arity
///
/// Repeated access to several keys of one node hits this entry instead of
/// reading the node table.
#[derive(Default)]
pub(crate) struct ColumnCache {
    last: Mutex<[Option<ColumnEntry>; 4]>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ColumnCache {
    pub(crate) fn get(&self, arity: Arity, id: u32, category: u32) -> Option<u32> {
        let last = self.last.lock();
        match last[arity.slot()] {
            Some(entry) if entry.id == id && entry.category == category => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.column)
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub(crate) fn put(&self, arity: Arity, id: u32, category: u32, column: u32) {
        self.last.lock()[arity.slot()] = Some(ColumnEntry {
            id,
            category,
            column,
        });
    }

    pub(crate) fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub(crate) fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub(crate) fn clear(&self) {
        *self.last.lock() = [None; 4];
    }
}

/// Highest column in use per category
///
/// `Some(None)` records a category known to have no column yet.
#[derive(Default)]
pub(crate) struct MaxColumnCache {
    max: Mutex<HashMap<Category, Option<u32>>>,
}

impl MaxColumnCache {
    pub(crate) fn get(&self, category: Category) -> Option<Option<u32>> {
        self.max.lock().get(&category).copied()
    }

    pub(crate) fn put(&self, category: Category, max: Option<u32>) {
        self.max.lock().insert(category, max);
    }

    pub(crate) fn clear(&self) {
        self.max.lock().clear();
    }
}

/// Number of keys per (category, type, per-frame) group
#[derive(Default)]
pub(crate) struct KeyCountCache {
    counts: Mutex<HashMap<(Category, ValueType, bool), u32>>,
}

impl KeyCountCache {
    pub(crate) fn get(
        &self,
        category: Category,
        value_type: ValueType,
        per_frame: bool,
    ) -> Option<u32> {
        self.counts
            .lock()
            .get(&(category, value_type, per_frame))
            .copied()
    }

    pub(crate) fn put(
        &self,
        category: Category,
        value_type: ValueType,
        per_frame: bool,
        count: u32,
    ) {
        self.counts
            .lock()
            .insert((category, value_type, per_frame), count);
    }

    pub(crate) fn clear(&self) {
        self.counts.lock().clear();
    }
}

/// Open table handles, plus the names of every tree known to exist
#[derive(Default)]
pub(crate) struct TableCache {
    one: Mutex<HashMap<String, Arc<DataSet<1>>>>,
    two: Mutex<HashMap<String, Arc<DataSet<2>>>>,
    three: Mutex<HashMap<String, Arc<DataSet<3>>>>,
    known: Mutex<HashSet<String>>,
}

/// Selects the handle map matching a table's dimension
pub(crate) trait CachedTable: Sized {
    fn slot(cache: &TableCache) -> &Mutex<HashMap<String, Arc<Self>>>;
}

impl CachedTable for DataSet<1> {
    fn slot(cache: &TableCache) -> &Mutex<HashMap<String, Arc<Self>>> {
        &cache.one
    }
}

impl CachedTable for DataSet<2> {
    fn slot(cache: &TableCache) -> &Mutex<HashMap<String, Arc<Self>>> {
        &cache.two
    }
}

impl CachedTable for DataSet<3> {
    fn slot(cache: &TableCache) -> &Mutex<HashMap<String, Arc<Self>>> {
        &cache.three
    }
}

impl TableCache {
    pub(crate) fn get<T: CachedTable>(&self, name: &str) -> Option<Arc<T>> {
        T::slot(self).lock().get(name).cloned()
    }

    pub(crate) fn put<T: CachedTable>(&self, name: &str, table: Arc<T>) {
        T::slot(self).lock().insert(name.to_string(), table);
        self.known.lock().insert(name.to_string());
    }

    pub(crate) fn is_known(&self, name: &str) -> bool {
        self.known.lock().contains(name)
    }

    pub(crate) fn set_known(&self, names: impl IntoIterator<Item = String>) {
        let mut known = self.known.lock();
        known.clear();
        known.extend(names);
    }

    /// Number of open table handles
    pub(crate) fn open_count(&self) -> usize {
        self.one.lock().len() + self.two.lock().len() + self.three.lock().len()
    }

    pub(crate) fn clear(&self) {
        self.one.lock().clear();
        self.two.lock().clear();
        self.three.lock().clear();
        self.known.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_cache_keeps_last_entry_per_arity() {
        let cache = ColumnCache::default();
        assert_eq!(cache.get(Arity::NODE, 4, 0), None);
        cache.put(Arity::NODE, 4, 0, 7);
        cache.put(Arity::PAIR, 4, 0, 1);
        assert_eq!(cache.get(Arity::NODE, 4, 0), Some(7));
        assert_eq!(cache.get(Arity::NODE, 4, 1), None);
        assert_eq!(cache.get(Arity::PAIR, 4, 0), Some(1));
        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.misses(), 2);
        cache.clear();
        assert_eq!(cache.get(Arity::NODE, 4, 0), None);
    }

    #[test]
    fn test_max_column_cache() {
        let cache = MaxColumnCache::default();
        let cat = Category::new(Arity::NODE, 1);
        assert_eq!(cache.get(cat), None);
        cache.put(cat, None);
        assert_eq!(cache.get(cat), Some(None));
        cache.put(cat, Some(3));
        assert_eq!(cache.get(cat), Some(Some(3)));
    }

    #[test]
    fn test_key_count_cache_separates_groups() {
        let cache = KeyCountCache::default();
        let cat = Category::new(Arity::NODE, 0);
        cache.put(cat, ValueType::Float, true, 3);
        assert_eq!(cache.get(cat, ValueType::Float, true), Some(3));
        assert_eq!(cache.get(cat, ValueType::Float, false), None);
        assert_eq!(cache.get(cat, ValueType::Int, true), None);
        cache.clear();
        assert_eq!(cache.get(cat, ValueType::Float, true), None);
    }
}
