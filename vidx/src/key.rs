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

use std::{cmp::Ordering, ops::Deref};

use smallvec::SmallVec;
use vidx_common::error::{Error, Result};

/// Keys up to this length are probed from an inline buffer without heap allocation.
pub const PROBE_INLINE_THRESHOLD: usize = 1024;

/// Total order over byte-string keys.
///
/// Keys are ordered by length first, and only keys of the same length are compared byte by byte as unsigned
/// bytes. So `"b"` orders before `"aa"`. Two keys are equal iff both length and bytes are equal.
///
/// Every insert, lookup and remove path goes through this function.
#[inline]
pub fn compare(lhs: &[u8], rhs: &[u8]) -> Ordering {
    lhs.len().cmp(&rhs.len()).then_with(|| lhs.cmp(rhs))
}

/// A transient copy of a lookup key, used only to drive comparisons and never indexed.
///
/// Keys no longer than [`PROBE_INLINE_THRESHOLD`] live in an inline buffer. Longer keys take exactly one heap
/// allocation of the key size, reserved fallibly.
///
/// The caller's slice outlives every lookup, so the copy is not needed for comparisons. It is kept so that a
/// lookup with an oversized key can fail with `AllocationFailure` before the lock is taken, like the insert path
/// does when copying the entry key.
pub struct Probe {
    buf: SmallVec<[u8; PROBE_INLINE_THRESHOLD]>,
}

impl Probe {
    /// Build a probe from the caller's key.
    pub fn new(key: &[u8]) -> Result<Self> {
        let buf = if key.len() <= PROBE_INLINE_THRESHOLD {
            SmallVec::from_slice(key)
        } else {
            let mut heap = Vec::new();
            heap.try_reserve_exact(key.len()).map_err(|e| Error::alloc("probe", key.len(), e))?;
            heap.extend_from_slice(key);
            SmallVec::from_vec(heap)
        };
        Ok(Self { buf })
    }

    /// Returns `true` if the probe key lives in the inline buffer.
    pub fn is_inline(&self) -> bool {
        !self.buf.spilled()
    }
}

impl Deref for Probe {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}
