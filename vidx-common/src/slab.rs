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
    collections::TryReserveError,
    num::NonZeroUsize,
    ops::{Index, IndexMut},
};

/// A handle to a value allocated in a [`Slab`].
///
/// A token is stale once its value is removed. The slot may be reused by a later insertion, so a stale token
/// may address another value. Callers must not keep tokens across removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(NonZeroUsize);

impl Token {
    const HIGHEST_BIT: NonZeroUsize = match NonZeroUsize::new(1 << (usize::BITS - 1)) {
        Some(bit) => bit,
        None => unreachable!(),
    };

    fn new(index: usize) -> Self {
        assert_eq!(index & Self::HIGHEST_BIT.get(), 0, "slab index overflow");
        Self(Self::HIGHEST_BIT | index)
    }

    /// The slot index of the token.
    pub fn index(&self) -> usize {
        self.0.get() & !Self::HIGHEST_BIT.get()
    }
}

#[derive(Debug, Clone)]
enum Entry<T> {
    Vacant(usize),
    Occupied(T),
}

/// A slab arena with a free list.
///
/// Values never move between slots, so a [`Token`] keeps addressing the same value until it is removed. All
/// growth goes through fallible reservation, so allocation failures surface as errors instead of aborts.
#[derive(Debug)]
pub struct Slab<T> {
    entries: Vec<Entry<T>>,
    len: usize,
    next: usize,
}

impl<T> Default for Slab<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Slab<T> {
    /// Create an empty slab without allocation.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next: 0,
            len: 0,
        }
    }

    /// Create an empty slab that can hold at least `capacity` values without reallocation.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        let mut slab = Self::new();
        slab.entries.try_reserve_exact(capacity)?;
        Ok(slab)
    }

    /// Insert a value into the slab and return its token.
    ///
    /// If the slab needs to grow and the allocation fails, the value is handed back with the error.
    pub fn try_insert(&mut self, val: T) -> Result<Token, (TryReserveError, T)> {
        let index = self.next;
        if index == self.entries.len() {
            if let Err(e) = self.entries.try_reserve(1) {
                return Err((e, val));
            }
            self.entries.push(Entry::Occupied(val));
            self.next = index + 1;
        } else {
            self.next = match self.entries[index] {
                Entry::Vacant(next) => next,
                Entry::Occupied(_) => unreachable!("free list points to an occupied slot"),
            };
            self.entries[index] = Entry::Occupied(val);
        }
        self.len += 1;
        Ok(Token::new(index))
    }

    /// Remove the value addressed by the token.
    pub fn remove(&mut self, token: Token) -> Option<T> {
        let index = token.index();
        let entry = self.entries.get_mut(index)?;

        if matches!(entry, Entry::Vacant(_)) {
            return None;
        }

        match std::mem::replace(entry, Entry::Vacant(self.next)) {
            Entry::Vacant(_) => unreachable!(),
            Entry::Occupied(val) => {
                self.len -= 1;
                self.next = index;
                Some(val)
            }
        }
    }

    /// Get the immutable reference of the value addressed by the token.
    pub fn get(&self, token: Token) -> Option<&T> {
        match self.entries.get(token.index()) {
            Some(Entry::Occupied(val)) => Some(val),
            _ => None,
        }
    }

    /// Get the mutable reference of the value addressed by the token.
    pub fn get_mut(&mut self, token: Token) -> Option<&mut T> {
        match self.entries.get_mut(token.index()) {
            Some(Entry::Occupied(val)) => Some(val),
            _ => None,
        }
    }

    /// Count of values held by the slab.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the slab holds no value.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Index<Token> for Slab<T> {
    type Output = T;

    fn index(&self, token: Token) -> &Self::Output {
        match self.get(token) {
            Some(val) => val,
            None => panic!("stale slab token: {}", token.index()),
        }
    }
}

impl<T> IndexMut<Token> for Slab<T> {
    fn index_mut(&mut self, token: Token) -> &mut Self::Output {
        match self.get_mut(token) {
            Some(val) => val,
            None => panic!("stale slab token: {}", token.index()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_niche() {
        assert_eq!(std::mem::size_of::<Option<Token>>(), std::mem::size_of::<usize>());
        assert_eq!(Token::new(0).index(), 0);
        assert_eq!(Token::new(42).index(), 42);
    }

    #[test]
    fn test_slab_reuse() {
        let mut slab = Slab::new();
        let t1 = slab.try_insert(1).unwrap();
        let t2 = slab.try_insert(2).unwrap();
        let t3 = slab.try_insert(3).unwrap();
        assert_eq!(slab.len(), 3);

        assert_eq!(slab.remove(t2), Some(2));
        assert_eq!(slab.remove(t2), None);
        assert_eq!(slab.get(t2), None);
        assert_eq!(slab.len(), 2);

        // The freed slot is reused first.
        let t4 = slab.try_insert(4).unwrap();
        assert_eq!(t4.index(), t2.index());
        assert_eq!(slab[t1], 1);
        assert_eq!(slab[t3], 3);
        assert_eq!(slab[t4], 4);

        slab[t4] = 44;
        assert_eq!(slab.get(t4), Some(&44));

        for t in [t1, t3, t4] {
            slab.remove(t);
        }
        assert!(slab.is_empty());
        // Slots come back in reverse order of removal.
        assert_eq!(slab.try_insert(5).unwrap().index(), t4.index());
    }

    #[test]
    fn test_slab_reservation() {
        let mut slab = Slab::<u64>::try_with_capacity(128).unwrap();
        assert!(slab.is_empty());
        assert_eq!(slab.try_insert(7).unwrap().index(), 0);
        assert!(Slab::<u64>::try_with_capacity(usize::MAX).is_err());
    }

    #[test]
    #[should_panic]
    fn test_stale_token() {
        let mut slab = Slab::new();
        let t = slab.try_insert(1).unwrap();
        slab.remove(t);
        let _v = slab[t];
    }
}
