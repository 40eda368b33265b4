// Copyright 2026 vidx Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{borrow::Cow, sync::Arc};

use vidx_common::{
    code::Value,
    error::Result,
    event::EventListener,
    metrics::{registry::noop::NoopMetricsRegistry, Metrics, RegistryOps},
};

use crate::{
    index::{Index, IndexConfig},
    indexer::{avl::AvlIndexer, Indexer},
};

/// Builder for [`Index`].
pub struct IndexBuilder<V>
where
    V: Value,
{
    name: Cow<'static, str>,
    capacity: usize,
    event_listener: Option<Arc<dyn EventListener<Value = V>>>,
    metrics: Arc<Metrics>,
}

impl<V> IndexBuilder<V>
where
    V: Value,
{
    /// Create an index builder with the given name.
    ///
    /// The name labels the index metrics and logs. Metrics are dropped unless a registry is set.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        let metrics = Arc::new(Metrics::new(name.clone(), &NoopMetricsRegistry));
        Self {
            name,
            capacity: 0,
            event_listener: None,
            metrics,
        }
    }

    /// Set the count of entries the index can hold before its arena grows.
    ///
    /// The arena is reserved when the index is built. The default value is 0.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the owner of the value lifecycle.
    ///
    /// Without a listener, released values are simply dropped with their entries.
    pub fn with_event_listener(mut self, event_listener: Arc<dyn EventListener<Value = V>>) -> Self {
        self.event_listener = Some(event_listener);
        self
    }

    /// Register the index metrics to the given registry.
    pub fn with_metrics_registry<R>(mut self, registry: &R) -> Self
    where
        R: RegistryOps,
    {
        self.metrics = Arc::new(Metrics::new(self.name.clone(), registry));
        self
    }

    /// Build the index with the default ordered indexer.
    pub fn build(self) -> Result<Index<V>> {
        self.build_with_indexer::<AvlIndexer<V>>()
    }

    /// Build the index with a customized indexer.
    pub fn build_with_indexer<I>(self) -> Result<Index<V, I>>
    where
        I: Indexer<Value = V>,
    {
        Index::new(IndexConfig {
            name: self.name,
            capacity: self.capacity,
            event_listener: self.event_listener,
            metrics: self.metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use vidx_common::error::Error;

    use super::*;
    use crate::{indexer::InsertResult, key::compare, record::Record};

    /// Keeps records in a vector sorted by key.
    struct SortedVecIndexer {
        records: Vec<Arc<Record<u64>>>,
    }

    impl SortedVecIndexer {
        fn search(&self, key: &[u8]) -> std::result::Result<usize, usize> {
            self.records.binary_search_by(|record| compare(record.key(), key))
        }
    }

    impl Indexer for SortedVecIndexer {
        type Value = u64;

        fn try_with_capacity(capacity: usize) -> Result<Self> {
            let mut records = Vec::new();
            records
                .try_reserve_exact(capacity)
                .map_err(|e| Error::alloc("records", capacity, e))?;
            Ok(Self { records })
        }

        fn insert(&mut self, record: Arc<Record<u64>>) -> InsertResult<'_, u64> {
            match self.search(record.key()) {
                Ok(_) => {
                    let len = record.key().len();
                    Err((Error::duplicate_key(len), record))
                }
                Err(pos) => {
                    self.records.insert(pos, record);
                    Ok(&self.records[pos])
                }
            }
        }

        fn get(&self, key: &[u8]) -> Option<&Arc<Record<u64>>> {
            self.search(key).ok().map(|pos| &self.records[pos])
        }

        fn remove(&mut self, key: &[u8]) -> Option<Arc<Record<u64>>> {
            self.search(key).ok().map(|pos| self.records.remove(pos))
        }

        fn len(&self) -> usize {
            self.records.len()
        }

        fn first(&self) -> Option<&Arc<Record<u64>>> {
            self.records.first()
        }

        fn last(&self) -> Option<&Arc<Record<u64>>> {
            self.records.last()
        }

        fn iter(&self) -> impl Iterator<Item = &Arc<Record<u64>>> {
            self.records.iter()
        }

        fn drain(&mut self) -> impl Iterator<Item = Arc<Record<u64>>> {
            std::mem::take(&mut self.records).into_iter()
        }
    }

    #[test]
    fn test_build_with_custom_indexer() {
        let index = IndexBuilder::<u64>::new("sorted-vec")
            .with_capacity(8)
            .build_with_indexer::<SortedVecIndexer>()
            .unwrap();
        assert_eq!(index.name(), "sorted-vec");

        index.insert(b"aa", 1).unwrap();
        index.insert(b"b", 2).unwrap();
        assert!(index.insert(b"b", 3).unwrap_err().0.is_duplicate_key());

        let keys = index.entries().iter().map(|e| e.key().to_vec()).collect_vec();
        assert_eq!(keys, vec![b"b".to_vec(), b"aa".to_vec()]);

        let entry = index.get(b"aa").unwrap().unwrap();
        index.remove(b"aa").unwrap();
        assert!(entry.is_outdated());
        assert_eq!(*entry, 1);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_capacity_reservation_failure() {
        let err = IndexBuilder::<u64>::new("huge").with_capacity(usize::MAX).build().unwrap_err();
        assert!(err.is_alloc_failure());
    }
}
