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

use std::{borrow::Cow, fmt::Debug, ops::Deref, sync::Arc};

use itertools::Itertools;
use parking_lot::Mutex;
use vidx_common::{
    code::Value,
    error::{Error, ErrorKind, Result},
    event::{Event, EventListener},
    metrics::Metrics,
    scope::Scope,
    strict_assert,
};

use crate::{
    indexer::{avl::AvlIndexer, sentry::Sentry, Indexer},
    key::Probe,
    record::Record,
};

/// Configuration of an [`Index`].
pub struct IndexConfig<V>
where
    V: Value,
{
    /// Name of the index, used as the metrics label and in logs.
    pub name: Cow<'static, str>,
    /// Count of entries the index can hold before its arena grows.
    pub capacity: usize,
    /// Owner of the value lifecycle, notified when an entry is released for good.
    pub event_listener: Option<Arc<dyn EventListener<Value = V>>>,
    /// Metrics of the index.
    pub metrics: Arc<Metrics>,
}

struct IndexInner<V, I>
where
    V: Value,
    I: Indexer<Value = V>,
{
    name: Cow<'static, str>,
    indexer: Mutex<Sentry<I>>,
    event_listener: Option<Arc<dyn EventListener<Value = V>>>,
    metrics: Arc<Metrics>,
}

impl<V, I> IndexInner<V, I>
where
    V: Value,
    I: Indexer<Value = V>,
{
    /// Hand the record back to the value owner. Must be called by the only party that observed refs drop to 0.
    fn release(&self, record: &Record<V>, reason: Event) {
        strict_assert!(!record.is_in_indexer());
        let first = record.mark_released();
        strict_assert!(first, "record released twice");
        if !first {
            tracing::error!("[index {}]: record released twice: {record:?}", self.name);
            return;
        }

        self.metrics.index_release.increase(1);
        if let Some(listener) = self.event_listener.as_ref() {
            listener.on_leave(reason, record.key(), record.value());
        }
    }

    fn clear(&self) {
        self.indexer.lock().with(|mut indexer| {
            let mut count = 0;
            for record in indexer.drain() {
                count += 1;
                if record.dec_refs(1) == 0 {
                    self.release(&record, Event::Clear);
                }
            }
            self.metrics.index_remove.increase(count);
            self.metrics.index_entries.absolute(0);
        });
    }
}

impl<V, I> Drop for IndexInner<V, I>
where
    V: Value,
    I: Indexer<Value = V>,
{
    fn drop(&mut self) {
        self.clear();
    }
}

/// A concurrent ordered index from byte-string keys to reference counted entries.
///
/// All structural mutations, comparisons and reference acquisitions happen under one lock owned by the index
/// instance. Entries returned by [`Index::get`] stay valid after a concurrent [`Index::remove`] and are
/// handed back to the [`EventListener`] only when the last holder drops them.
pub struct Index<V, I = AvlIndexer<V>>
where
    V: Value,
    I: Indexer<Value = V>,
{
    inner: Arc<IndexInner<V, I>>,
}

impl<V, I> Clone for Index<V, I>
where
    V: Value,
    I: Indexer<Value = V>,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<V, I> Debug for Index<V, I>
where
    V: Value,
    I: Indexer<Value = V>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("name", &self.inner.name)
            .field("len", &self.len())
            .finish()
    }
}

impl<V, I> Index<V, I>
where
    V: Value,
    I: Indexer<Value = V>,
{
    /// Create an index with the given configuration.
    ///
    /// Fails only if the initial arena capacity cannot be reserved.
    pub fn new(config: IndexConfig<V>) -> Result<Self> {
        let indexer = Sentry::try_with_capacity(config.capacity)
            .inspect_err(|e| tracing::warn!("[index {}]: create index failed: {e}", config.name))?;

        let inner = IndexInner {
            name: config.name,
            indexer: Mutex::new(indexer),
            event_listener: config.event_listener,
            metrics: config.metrics,
        };

        Ok(Self { inner: Arc::new(inner) })
    }

    /// Insert an entry with a copy of `key` and the value handle.
    ///
    /// The index takes one reference of the new entry. Fails with `DuplicateKey` if an equal key is indexed and
    /// with `AllocationFailure` if the entry cannot be allocated. A failed insertion changes nothing and hands the
    /// value back to the caller, who still owns it.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "vidx::index::insert"))]
    pub fn insert(&self, key: &[u8], value: V) -> std::result::Result<(), (Error, V)> {
        let record = match Record::new(key, value) {
            Ok(record) => Arc::new(record),
            Err((e, value)) => {
                tracing::warn!("[index {}]: insert failed: {e}", self.inner.name);
                self.inner.metrics.index_insert_failed.increase(1);
                return Err((e, value));
            }
        };

        let rejected = self.inner.indexer.lock().with(|mut indexer| match indexer.insert(record) {
            Ok(record) => {
                // The index's own reference, taken within the lock section.
                record.inc_refs(1);
                None
            }
            Err(rejected) => Some(rejected),
        });

        let Some((e, record)) = rejected else {
            self.inner.metrics.index_insert.increase(1);
            self.inner.metrics.index_entries.increase(1);
            return Ok(());
        };

        tracing::debug!("[index {}]: insert failed: {e}", self.inner.name);
        self.inner.metrics.index_insert_failed.increase(1);
        // The indexer hands back the only reference of a rejected record.
        match Arc::into_inner(record) {
            Some(record) => Err((e, record.into_value())),
            None => unreachable!("rejected record is shared"),
        }
    }

    /// Get the entry whose key equals `key`.
    ///
    /// Absence is not an error. A found entry is returned with one reference acquired on behalf of the caller,
    /// released when the returned [`IndexEntry`] drops. Fails with `AllocationFailure` only if an oversized key
    /// cannot be copied into the lookup probe.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "vidx::index::get"))]
    pub fn get(&self, key: &[u8]) -> Result<Option<IndexEntry<V, I>>> {
        let probe = Probe::new(key)
            .inspect_err(|e| tracing::warn!("[index {}]: build probe failed: {e}", self.inner.name))?;

        let record = self.inner.indexer.lock().with(|indexer| {
            indexer.get(&probe).map(|record| {
                record.inc_refs(1);
                record.clone()
            })
        });

        match record {
            Some(record) => {
                self.inner.metrics.index_hit.increase(1);
                Ok(Some(IndexEntry {
                    inner: self.inner.clone(),
                    record,
                }))
            }
            None => {
                tracing::debug!("[index {}]: no entry with key (len: {})", self.inner.name, key.len());
                self.inner.metrics.index_miss.increase(1);
                Ok(None)
            }
        }
    }

    /// Remove the entry whose key equals `key`.
    ///
    /// Releases the index's reference of the entry. If no borrower holds the entry, it is handed back to the
    /// value owner before this call returns. Fails with `NotFound` if no entry with the key is indexed.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "vidx::index::remove"))]
    pub fn remove(&self, key: &[u8]) -> Result<()> {
        self.inner
            .indexer
            .lock()
            .with(|mut indexer| -> Result<()> {
                let record = indexer.remove(key).ok_or_else(|| Error::not_found(key.len()))?;
                self.detached(&record);
                Ok(())
            })
            .inspect_err(|e| tracing::warn!("[index {}]: remove failed: {e}", self.inner.name))
    }

    /// Remove the given entry from the index.
    ///
    /// Unlike [`Index::remove`], only the very entry is removed: fails with `NotFound` if its key is absent or
    /// has been re-inserted as another entry since.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "vidx::index::remove_entry"))]
    pub fn remove_entry(&self, entry: &IndexEntry<V, I>) -> Result<()> {
        let key = entry.key();
        self.inner
            .indexer
            .lock()
            .with(|mut indexer| -> Result<()> {
                match indexer.get(key) {
                    Some(record) if Arc::ptr_eq(record, &entry.record) => {}
                    _ => {
                        return Err(
                            Error::new(ErrorKind::NotFound, "entry no longer indexed").with_context("key_len", key.len())
                        )
                    }
                }
                if let Some(record) = indexer.remove(key) {
                    self.detached(&record);
                }
                Ok(())
            })
            .inspect_err(|e| tracing::warn!("[index {}]: remove entry failed: {e}", self.inner.name))
    }

    /// Release the index's reference of a record just detached. Must be called within the lock section.
    fn detached(&self, record: &Record<V>) {
        strict_assert!(!record.is_in_indexer());
        self.inner.metrics.index_remove.increase(1);
        self.inner.metrics.index_entries.decrease(1);
        if record.dec_refs(1) == 0 {
            self.inner.release(record, Event::Remove);
        }
    }

    /// Returns `true` if an entry with the key is indexed.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.inner.indexer.lock().get(key).is_some()
    }

    /// Get all indexed entries in key order, each with one reference acquired on behalf of the caller.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "vidx::index::entries"))]
    pub fn entries(&self) -> Vec<IndexEntry<V, I>> {
        self.inner.indexer.lock().with(|indexer| {
            indexer
                .iter()
                .map(|record| {
                    record.inc_refs(1);
                    IndexEntry {
                        inner: self.inner.clone(),
                        record: record.clone(),
                    }
                })
                .collect_vec()
        })
    }

    /// Get the entry with the smallest key.
    pub fn first(&self) -> Option<IndexEntry<V, I>> {
        self.inner
            .indexer
            .lock()
            .with(|indexer| {
                indexer.first().map(|record| {
                    record.inc_refs(1);
                    record.clone()
                })
            })
            .map(|record| IndexEntry {
                inner: self.inner.clone(),
                record,
            })
    }

    /// Get the entry with the largest key.
    pub fn last(&self) -> Option<IndexEntry<V, I>> {
        self.inner
            .indexer
            .lock()
            .with(|indexer| {
                indexer.last().map(|record| {
                    record.inc_refs(1);
                    record.clone()
                })
            })
            .map(|record| IndexEntry {
                inner: self.inner.clone(),
                record,
            })
    }

    /// Remove all entries, releasing the index's reference of each.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "vidx::index::clear"))]
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Count of indexed entries.
    pub fn len(&self) -> usize {
        self.inner.indexer.lock().len()
    }

    /// Returns `true` if no entry is indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the index.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Metrics of the index.
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }
}

/// A borrowed reference of an indexed entry.
///
/// The entry and its value stay valid while the handle is alive, even if the entry is removed from the index
/// meanwhile. Cloning the handle acquires another reference. Dropping it releases one, and the last release of
/// a removed entry hands the value back to the [`EventListener`] with [`Event::Release`].
pub struct IndexEntry<V, I = AvlIndexer<V>>
where
    V: Value,
    I: Indexer<Value = V>,
{
    inner: Arc<IndexInner<V, I>>,
    record: Arc<Record<V>>,
}

impl<V, I> Debug for IndexEntry<V, I>
where
    V: Value,
    I: Indexer<Value = V>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexEntry").field("record", &self.record).finish()
    }
}

impl<V, I> Drop for IndexEntry<V, I>
where
    V: Value,
    I: Indexer<Value = V>,
{
    fn drop(&mut self) {
        // The borrower's release does not take the lock, the atomic decrement decides the only releaser.
        if self.record.dec_refs(1) == 0 {
            self.inner.release(&self.record, Event::Release);
        }
    }
}

impl<V, I> Clone for IndexEntry<V, I>
where
    V: Value,
    I: Indexer<Value = V>,
{
    fn clone(&self) -> Self {
        self.record.inc_refs(1);
        Self {
            inner: self.inner.clone(),
            record: self.record.clone(),
        }
    }
}

impl<V, I> Deref for IndexEntry<V, I>
where
    V: Value,
    I: Indexer<Value = V>,
{
    type Target = V;

    fn deref(&self) -> &Self::Target {
        self.value()
    }
}

impl<V, I> IndexEntry<V, I>
where
    V: Value,
    I: Indexer<Value = V>,
{
    /// Key of the entry.
    pub fn key(&self) -> &[u8] {
        self.record.key()
    }

    /// Value handle of the entry.
    pub fn value(&self) -> &V {
        self.record.value()
    }

    /// Current reference count of the entry, including the index's own reference if still indexed.
    pub fn refs(&self) -> usize {
        self.record.refs()
    }

    /// Returns `true` if the entry has been removed from the index.
    pub fn is_outdated(&self) -> bool {
        !self.record.is_in_indexer()
    }
}
