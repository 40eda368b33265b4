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

use vidx_common::{
    code::Value,
    error::{Error, Result},
};

use crate::record::Record;

/// Outcome of [`Indexer::insert`]: the indexed record, or the error with the rejected record handed back.
pub type InsertResult<'a, V> = std::result::Result<&'a Arc<Record<V>>, (Error, Arc<Record<V>>)>;

/// Ordered storage of indexed records.
///
/// Implementations are not thread-safe on their own. The index serializes every call under its guard.
pub trait Indexer: Send + Sync + 'static + Sized {
    /// Value handle type of the indexed records.
    type Value: Value;

    /// Create an empty indexer that can hold `capacity` records without reallocation.
    fn try_with_capacity(capacity: usize) -> Result<Self>;

    /// Insert a record by its key and return the indexed record.
    ///
    /// Fails with `DuplicateKey` if a record with an equal key is indexed, or with `AllocationFailure`. A failed
    /// insertion leaves the indexer untouched and hands the record back.
    fn insert(&mut self, record: Arc<Record<Self::Value>>) -> InsertResult<'_, Self::Value>;

    /// Get the record whose key equals `key`.
    fn get(&self, key: &[u8]) -> Option<&Arc<Record<Self::Value>>>;

    /// Detach the record whose key equals `key`.
    fn remove(&mut self, key: &[u8]) -> Option<Arc<Record<Self::Value>>>;

    /// Count of indexed records.
    fn len(&self) -> usize;

    /// Returns `true` if no record is indexed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record with the smallest key.
    fn first(&self) -> Option<&Arc<Record<Self::Value>>>;

    /// Record with the largest key.
    fn last(&self) -> Option<&Arc<Record<Self::Value>>>;

    /// Iterate over the records in key order.
    fn iter(&self) -> impl Iterator<Item = &Arc<Record<Self::Value>>>;

    /// Detach all records in key order. The indexer is empty once this returns, even if the iterator is
    /// dropped early.
    fn drain(&mut self) -> impl Iterator<Item = Arc<Record<Self::Value>>>;
}

pub mod avl;
pub mod sentry;
