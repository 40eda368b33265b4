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

use std::sync::Arc;

use vidx_common::{code::Value, error::Result};

use super::{Indexer, InsertResult};
use crate::{record::Record, tree::AvlTree};

/// [`Indexer`] backed by an [`AvlTree`] that stores the records as node payloads.
pub struct AvlIndexer<V>
where
    V: Value,
{
    tree: AvlTree<Arc<Record<V>>>,
}

impl<V> Default for AvlIndexer<V>
where
    V: Value,
{
    fn default() -> Self {
        Self { tree: AvlTree::new() }
    }
}

impl<V> Indexer for AvlIndexer<V>
where
    V: Value,
{
    type Value = V;

    fn try_with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self {
            tree: AvlTree::try_with_capacity(capacity)?,
        })
    }

    fn insert(&mut self, record: Arc<Record<Self::Value>>) -> InsertResult<'_, Self::Value> {
        let token = self.tree.insert(record)?;
        Ok(&self.tree[token])
    }

    fn get(&self, key: &[u8]) -> Option<&Arc<Record<Self::Value>>> {
        self.tree.find(key).and_then(|token| self.tree.get(token))
    }

    fn remove(&mut self, key: &[u8]) -> Option<Arc<Record<Self::Value>>> {
        let token = self.tree.find(key)?;
        self.tree.remove(token)
    }

    fn len(&self) -> usize {
        self.tree.len()
    }

    fn first(&self) -> Option<&Arc<Record<Self::Value>>> {
        self.tree.first().and_then(|token| self.tree.get(token))
    }

    fn last(&self) -> Option<&Arc<Record<Self::Value>>> {
        self.tree.last().and_then(|token| self.tree.get(token))
    }

    fn iter(&self) -> impl Iterator<Item = &Arc<Record<Self::Value>>> {
        self.tree.iter()
    }

    fn drain(&mut self) -> impl Iterator<Item = Arc<Record<Self::Value>>> {
        self.tree.drain()
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    fn record(key: &[u8], value: u64) -> Arc<Record<u64>> {
        Arc::new(Record::new(key, value).unwrap())
    }

    #[test]
    fn test_avl_indexer() {
        let mut indexer = AvlIndexer::<u64>::try_with_capacity(16).unwrap();
        assert!(indexer.is_empty());

        indexer.insert(record(b"aa", 1)).unwrap();
        indexer.insert(record(b"b", 2)).unwrap();
        indexer.insert(record(b"ab", 3)).unwrap();
        let (e, rejected) = indexer.insert(record(b"b", 4)).unwrap_err();
        assert!(e.is_duplicate_key());
        assert_eq!(*rejected.value(), 4);
        assert_eq!(Arc::strong_count(&rejected), 1);
        assert_eq!(indexer.len(), 3);

        assert_eq!(indexer.get(b"b").map(|r| *r.value()), Some(2));
        assert!(indexer.get(b"c").is_none());

        assert_eq!(indexer.first().map(|r| r.key()), Some(&b"b"[..]));
        assert_eq!(indexer.last().map(|r| r.key()), Some(&b"ab"[..]));
        assert_eq!(indexer.iter().map(|r| *r.value()).collect_vec(), vec![2, 1, 3]);

        let removed = indexer.remove(b"aa").unwrap();
        assert_eq!(*removed.value(), 1);
        assert!(indexer.remove(b"aa").is_none());

        assert_eq!(indexer.drain().map(|r| *r.value()).collect_vec(), vec![2, 3]);
        assert!(indexer.is_empty());
    }
}
