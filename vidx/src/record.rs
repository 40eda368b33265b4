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

use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
};

use bitflags::bitflags;
use vidx_common::{code::Value, error::Error, strict_assert};

use crate::tree::Keyed;

bitflags! {
    /// State flags of a [`Record`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Flags: u64 {
        /// The record is reachable from the index.
        const IN_INDEXER = 0b00000001;
        /// The record has been handed back to the value owner.
        const RELEASED = 0b00000010;
    }
}

/// [`Record`] is the entry stored in the index: an owned key, an opaque value handle and a reference count.
///
/// The reference count counts the holders of the entry. While indexed, the index holds exactly one reference,
/// and every borrowed handle holds one more. The value is handed back to its owner when the count drops to 0.
pub struct Record<V>
where
    V: Value,
{
    key: Box<[u8]>,
    value: V,
    refs: AtomicUsize,
    flags: AtomicU64,
}

impl<V> Debug for Record<V>
where
    V: Value,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("key_len", &self.key.len())
            .field("refs", &self.refs())
            .field("flags", &Flags::from_bits_truncate(self.flags.load(Ordering::Relaxed)))
            .finish()
    }
}

impl<V> Record<V>
where
    V: Value,
{
    /// Create a record with a copy of the key. The reference count starts at 0.
    ///
    /// The caller's key buffer may be transient, so the key is always copied. If the copy cannot be allocated,
    /// the value is handed back with the error.
    pub fn new(key: &[u8], value: V) -> std::result::Result<Self, (Error, V)> {
        let mut owned = Vec::new();
        if let Err(e) = owned.try_reserve_exact(key.len()) {
            return Err((Error::alloc("record key", key.len(), e), value));
        }
        owned.extend_from_slice(key);
        Ok(Self {
            key: owned.into_boxed_slice(),
            value,
            refs: AtomicUsize::new(0),
            flags: AtomicU64::new(0),
        })
    }

    /// Get the immutable reference of the record key.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Get the immutable reference of the record value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Take the value out of a record that was never indexed.
    pub fn into_value(self) -> V {
        strict_assert!(!self.is_in_indexer());
        self.value
    }

    /// Set in indexer flag.
    pub fn set_in_indexer(&self, val: bool) {
        self.set_flags(Flags::IN_INDEXER, val, Ordering::Release);
    }

    /// Get in indexer flag.
    pub fn is_in_indexer(&self) -> bool {
        self.get_flags(Flags::IN_INDEXER, Ordering::Acquire)
    }

    /// Mark the record as handed back to the value owner.
    ///
    /// Returns `false` if the record has already been marked.
    pub fn mark_released(&self) -> bool {
        let old = self.flags.fetch_or(Flags::RELEASED.bits(), Ordering::AcqRel);
        old & Flags::RELEASED.bits() == 0
    }

    /// Set the record atomic flags.
    pub fn set_flags(&self, flags: Flags, val: bool, order: Ordering) {
        match val {
            true => self.flags.fetch_or(flags.bits(), order),
            false => self.flags.fetch_and(!flags.bits(), order),
        };
    }

    /// Get the record atomic flags.
    pub fn get_flags(&self, flags: Flags, order: Ordering) -> bool {
        self.flags.load(order) & flags.bits() == flags.bits()
    }

    /// Get the atomic reference count.
    pub fn refs(&self) -> usize {
        self.refs.load(Ordering::Acquire)
    }

    /// Increase the atomic reference count.
    ///
    /// This function returns the new reference count after the op.
    pub fn inc_refs(&self, val: usize) -> usize {
        let old = self.refs.fetch_add(val, Ordering::SeqCst);
        tracing::trace!(
            "[record]: inc record (key len: {}) refs: {} => {}",
            self.key.len(),
            old,
            old + val
        );
        old + val
    }

    /// Decrease the atomic reference count.
    ///
    /// This function returns the new reference count after the op. Exactly one caller observes the transition
    /// to 0.
    pub fn dec_refs(&self, val: usize) -> usize {
        let old = self.refs.fetch_sub(val, Ordering::SeqCst);
        strict_assert!(old >= val, "record refs underflow: {old} - {val}");
        tracing::trace!(
            "[record]: dec record (key len: {}) refs: {} => {}",
            self.key.len(),
            old,
            old.wrapping_sub(val)
        );
        old.wrapping_sub(val)
    }
}

impl<V> Keyed for Arc<Record<V>>
where
    V: Value,
{
    fn key(&self) -> &[u8] {
        Record::key(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_copies_key() {
        let mut buf = b"transient".to_vec();
        let record = Record::new(&buf, 42u64).unwrap();
        buf.fill(0);
        assert_eq!(record.key(), b"transient");
        assert_eq!(*record.value(), 42);
        assert_eq!(record.refs(), 0);
    }

    #[test]
    fn test_refs() {
        let record = Record::new(b"k", ()).unwrap();
        assert_eq!(record.inc_refs(1), 1);
        assert_eq!(record.inc_refs(2), 3);
        assert_eq!(record.dec_refs(1), 2);
        assert_eq!(record.dec_refs(2), 0);
        assert_eq!(record.refs(), 0);
    }

    #[test]
    fn test_flags() {
        let record = Record::new(b"k", ()).unwrap();
        assert!(!record.is_in_indexer());
        record.set_in_indexer(true);
        assert!(record.is_in_indexer());
        record.set_in_indexer(false);
        assert!(!record.is_in_indexer());

        assert!(record.mark_released());
        assert!(!record.mark_released());
    }

    #[test]
    fn test_concurrent_release_has_one_winner() {
        let record = Arc::new(Record::new(b"k", ()).unwrap());
        record.inc_refs(64);

        let winners = (0..64)
            .map(|_| {
                let record = record.clone();
                std::thread::spawn(move || record.dec_refs(1) == 0)
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|zero| *zero)
            .count();
        assert_eq!(winners, 1);
    }
}
