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

//! A concurrent ordered index for in-memory key-value caches.
//!
//! The index maps byte-string keys to reference counted entries. It finds, inserts and removes entries under a
//! per-instance lock and mediates each entry's reference count, so an entry being read by one thread is never
//! handed back to its owner while another thread removes it.
//!
//! Eviction policies, value payload allocation and persistence are left to the surrounding cache. The
//! [`EventListener`] set on the index is the hook through which released values are handed back.
//!
//! ```
//! use vidx::IndexBuilder;
//!
//! let index = IndexBuilder::<u64>::new("example").build().unwrap();
//! index.insert(b"x", 1).unwrap();
//!
//! let entry = index.get(b"x").unwrap().unwrap();
//! index.remove(b"x").unwrap();
//! // The borrowed entry is still valid after removal.
//! assert_eq!(*entry, 1);
//! assert!(entry.is_outdated());
//! assert!(index.get(b"x").unwrap().is_none());
//! ```

mod builder;
mod index;
mod indexer;
mod key;
mod record;
mod tree;

mod prelude;
pub use prelude::*;
