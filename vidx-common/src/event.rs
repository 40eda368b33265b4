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

use crate::code::Value;

/// The reason an entry has been handed back to the value lifecycle owner.
///
/// The event names the party that observed the reference count dropping to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// The index released its own reference on remove and no borrower was left.
    Remove,
    /// The last borrower released its reference after the entry had been removed.
    Release,
    /// The index released its own reference on clear or drop and no borrower was left.
    Clear,
}

/// Trait for the value lifecycle owner.
///
/// `on_leave` is called exactly once per inserted entry, when the entry's reference count reaches zero. After
/// the call returns the entry is never reachable again, so the owner is free to deallocate the payload.
///
/// On [`Event::Remove`] and [`Event::Clear`] the listener runs within the index lock section, so it must not call
/// back into the same index.
pub trait EventListener: Send + Sync + 'static {
    /// Associated value type.
    type Value: Value;

    /// Called when an entry leaves the index for good with the reason.
    #[expect(unused_variables)]
    fn on_leave(&self, reason: Event, key: &[u8], value: &Self::Value) {}
}
