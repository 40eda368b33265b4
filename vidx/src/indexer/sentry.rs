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

use vidx_common::{error::Result, strict_assert};

use super::{Indexer, InsertResult};
use crate::record::Record;

/// [`Sentry`] is a guard for all [`Indexer`] implementations to set `IN_INDEXER` flag properly.
pub struct Sentry<I>
where
    I: Indexer,
{
    indexer: I,
}

impl<I> Indexer for Sentry<I>
where
    I: Indexer,
{
    type Value = I::Value;

    fn try_with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self {
            indexer: I::try_with_capacity(capacity)?,
        })
    }

    fn insert(&mut self, record: Arc<Record<Self::Value>>) -> InsertResult<'_, Self::Value> {
        strict_assert!(!record.is_in_indexer());
        let record = self.indexer.insert(record)?;
        record.set_in_indexer(true);
        Ok(record)
    }

    fn get(&self, key: &[u8]) -> Option<&Arc<Record<Self::Value>>> {
        self.indexer.get(key).inspect(|r| {
            strict_assert!(r.is_in_indexer());
        })
    }

    fn remove(&mut self, key: &[u8]) -> Option<Arc<Record<Self::Value>>> {
        self.indexer.remove(key).inspect(|r| {
            strict_assert!(r.is_in_indexer());
            r.set_in_indexer(false)
        })
    }

    fn len(&self) -> usize {
        self.indexer.len()
    }

    fn first(&self) -> Option<&Arc<Record<Self::Value>>> {
        self.indexer.first()
    }

    fn last(&self) -> Option<&Arc<Record<Self::Value>>> {
        self.indexer.last()
    }

    fn iter(&self) -> impl Iterator<Item = &Arc<Record<Self::Value>>> {
        self.indexer.iter().inspect(|r| {
            strict_assert!(r.is_in_indexer());
        })
    }

    fn drain(&mut self) -> impl Iterator<Item = Arc<Record<Self::Value>>> {
        let records = self.indexer.drain().collect::<Vec<_>>();
        for record in &records {
            strict_assert!(record.is_in_indexer());
            record.set_in_indexer(false);
        }
        records.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::avl::AvlIndexer;

    #[test]
    fn test_sentry_flags() {
        let mut indexer = Sentry::<AvlIndexer<u64>>::try_with_capacity(0).unwrap();

        let r1 = Arc::new(Record::new(b"k1", 1).unwrap());
        let r2 = Arc::new(Record::new(b"k2", 2).unwrap());
        indexer.insert(r1.clone()).unwrap();
        indexer.insert(r2.clone()).unwrap();
        assert!(r1.is_in_indexer());
        assert!(r2.is_in_indexer());

        // A rejected duplicate never gets the flag.
        let dup = Arc::new(Record::new(b"k1", 3).unwrap());
        let (_, rejected) = indexer.insert(dup.clone()).unwrap_err();
        assert!(Arc::ptr_eq(&rejected, &dup));
        assert!(!dup.is_in_indexer());

        indexer.remove(b"k1").unwrap();
        assert!(!r1.is_in_indexer());

        assert_eq!(indexer.drain().count(), 1);
        assert!(!r2.is_in_indexer());
    }
}
