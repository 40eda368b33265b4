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

//! A self-balancing ordered tree keyed by byte strings.
//!
//! The tree is an AVL tree whose nodes live in a [`Slab`] arena. Items are stored directly as node payloads and
//! ordered by [`compare`]. A node is addressed by the [`Token`] returned from [`AvlTree::insert`] or
//! [`AvlTree::find`], which stays valid until the node is removed.

use std::cmp::Ordering;

use vidx_common::{
    error::{Error, Result},
    slab::{Slab, Token},
    strict_assert,
};

use crate::key::compare;

/// Items that can be stored in an [`AvlTree`].
pub trait Keyed {
    /// The key the item is ordered by. It must not change while the item is in a tree.
    fn key(&self) -> &[u8];
}

#[derive(Debug)]
struct Node<T> {
    item: T,
    left: Option<Token>,
    right: Option<Token>,
    height: u32,
}

/// AVL tree over a slab arena.
#[derive(Debug)]
pub struct AvlTree<T> {
    nodes: Slab<Node<T>>,
    root: Option<Token>,
}

impl<T> Default for AvlTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AvlTree<T> {
    /// Create an empty tree without allocation.
    pub const fn new() -> Self {
        Self {
            nodes: Slab::new(),
            root: None,
        }
    }

    /// Create an empty tree that can hold `capacity` nodes without reallocation.
    pub fn try_with_capacity(capacity: usize) -> Result<Self> {
        let nodes = Slab::try_with_capacity(capacity).map_err(|e| Error::alloc("tree arena", capacity, e))?;
        Ok(Self { nodes, root: None })
    }

    /// Count of items in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree holds no item.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Height of the tree. An empty tree has height 0.
    pub fn height(&self) -> u32 {
        self.height_of(self.root)
    }

    /// Get the item held by the node.
    pub fn get(&self, token: Token) -> Option<&T> {
        self.nodes.get(token).map(|node| &node.item)
    }

    /// Node with the smallest key.
    pub fn first(&self) -> Option<Token> {
        let mut token = self.root?;
        while let Some(left) = self.nodes[token].left {
            token = left;
        }
        Some(token)
    }

    /// Node with the largest key.
    pub fn last(&self) -> Option<Token> {
        let mut token = self.root?;
        while let Some(right) = self.nodes[token].right {
            token = right;
        }
        Some(token)
    }

    /// Iterate over the items in key order.
    pub fn iter(&self) -> Iter<'_, T> {
        let mut iter = Iter {
            tree: self,
            stack: Vec::new(),
        };
        iter.push_left_spine(self.root);
        iter
    }

    fn height_of(&self, link: Option<Token>) -> u32 {
        link.map_or(0, |token| self.nodes[token].height)
    }

    fn balance_of(&self, token: Token) -> i64 {
        let node = &self.nodes[token];
        self.height_of(node.left) as i64 - self.height_of(node.right) as i64
    }

    fn update_height(&mut self, token: Token) {
        let node = &self.nodes[token];
        let height = 1 + self.height_of(node.left).max(self.height_of(node.right));
        self.nodes[token].height = height;
    }

    fn rotate_right(&mut self, token: Token) -> Token {
        let Some(pivot) = self.nodes[token].left else {
            return token;
        };
        self.nodes[token].left = self.nodes[pivot].right;
        self.nodes[pivot].right = Some(token);
        self.update_height(token);
        self.update_height(pivot);
        pivot
    }

    fn rotate_left(&mut self, token: Token) -> Token {
        let Some(pivot) = self.nodes[token].right else {
            return token;
        };
        self.nodes[token].right = self.nodes[pivot].left;
        self.nodes[pivot].left = Some(token);
        self.update_height(token);
        self.update_height(pivot);
        pivot
    }

    /// Restore the AVL property at `token` and return the new root of the subtree.
    fn rebalance(&mut self, token: Token) -> Token {
        self.update_height(token);
        let balance = self.balance_of(token);
        if balance > 1 {
            if let Some(left) = self.nodes[token].left {
                if self.balance_of(left) < 0 {
                    let left = self.rotate_left(left);
                    self.nodes[token].left = Some(left);
                }
            }
            return self.rotate_right(token);
        }
        if balance < -1 {
            if let Some(right) = self.nodes[token].right {
                if self.balance_of(right) > 0 {
                    let right = self.rotate_right(right);
                    self.nodes[token].right = Some(right);
                }
            }
            return self.rotate_left(token);
        }
        token
    }

    /// Detach the smallest node of the subtree. Returns the new subtree root and the detached node.
    fn detach_min(&mut self, token: Token) -> (Option<Token>, Token) {
        match self.nodes[token].left {
            None => (self.nodes[token].right, token),
            Some(left) => {
                let (left, min) = self.detach_min(left);
                self.nodes[token].left = left;
                (Some(self.rebalance(token)), min)
            }
        }
    }
}

impl<T> AvlTree<T>
where
    T: Keyed,
{
    /// Find the node whose key equals `key`.
    pub fn find(&self, key: &[u8]) -> Option<Token> {
        let mut link = self.root;
        while let Some(token) = link {
            let node = &self.nodes[token];
            link = match compare(key, node.item.key()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(token),
            };
        }
        None
    }

    /// Insert an item by its key and return the token of its node.
    ///
    /// The tree never overwrites. If an item with an equal key exists, or the node cannot be allocated, the
    /// item is handed back with the error and the tree is left untouched.
    pub fn insert(&mut self, item: T) -> std::result::Result<Token, (Error, T)> {
        if self.find(item.key()).is_some() {
            let len = item.key().len();
            return Err((Error::duplicate_key(len), item));
        }

        let node = Node {
            item,
            left: None,
            right: None,
            height: 1,
        };
        let token = match self.nodes.try_insert(node) {
            Ok(token) => token,
            Err((e, node)) => {
                let len = node.item.key().len();
                return Err((Error::alloc("tree node", len, e), node.item));
            }
        };

        self.root = Some(self.attach(self.root, token));
        Ok(token)
    }

    /// Detach the node from the tree and return its item.
    ///
    /// The token must come from [`AvlTree::find`] or [`AvlTree::insert`] with no removal in between.
    pub fn remove(&mut self, token: Token) -> Option<T> {
        self.nodes.get(token)?;
        self.root = self.detach(self.root, token);
        self.nodes.remove(token).map(|node| node.item)
    }

    /// Detach all items in key order. The tree is empty once this returns.
    pub fn drain(&mut self) -> std::vec::IntoIter<T> {
        let tokens = self.tokens();
        self.root = None;
        let items = tokens
            .into_iter()
            .filter_map(|token| self.nodes.remove(token).map(|node| node.item))
            .collect::<Vec<_>>();
        strict_assert!(self.nodes.is_empty());
        items.into_iter()
    }

    fn tokens(&self) -> Vec<Token> {
        let mut tokens = Vec::with_capacity(self.len());
        let mut stack = Vec::new();
        let mut link = self.root;
        loop {
            while let Some(token) = link {
                stack.push(token);
                link = self.nodes[token].left;
            }
            match stack.pop() {
                Some(token) => {
                    tokens.push(token);
                    link = self.nodes[token].right;
                }
                None => break,
            }
        }
        tokens
    }

    fn attach(&mut self, link: Option<Token>, token: Token) -> Token {
        let Some(at) = link else {
            return token;
        };
        match compare(self.nodes[token].item.key(), self.nodes[at].item.key()) {
            Ordering::Less => {
                let left = self.attach(self.nodes[at].left, token);
                self.nodes[at].left = Some(left);
            }
            Ordering::Greater => {
                let right = self.attach(self.nodes[at].right, token);
                self.nodes[at].right = Some(right);
            }
            Ordering::Equal => unreachable!("duplicate key reached attach"),
        }
        self.rebalance(at)
    }

    fn detach(&mut self, link: Option<Token>, token: Token) -> Option<Token> {
        let at = link?;

        if at == token {
            let node = &self.nodes[at];
            return match (node.left, node.right) {
                (None, None) => None,
                (Some(child), None) | (None, Some(child)) => Some(child),
                (Some(left), Some(right)) => {
                    let (right, successor) = self.detach_min(right);
                    self.nodes[successor].left = Some(left);
                    self.nodes[successor].right = right;
                    Some(self.rebalance(successor))
                }
            };
        }

        match compare(self.nodes[token].item.key(), self.nodes[at].item.key()) {
            Ordering::Less => {
                let left = self.detach(self.nodes[at].left, token);
                self.nodes[at].left = left;
            }
            Ordering::Greater => {
                let right = self.detach(self.nodes[at].right, token);
                self.nodes[at].right = right;
            }
            Ordering::Equal => unreachable!("two nodes hold equal keys"),
        }
        Some(self.rebalance(at))
    }

    /// Verify ordering, balance and height bookkeeping. Returns the tree height.
    #[cfg(test)]
    pub(crate) fn check(&self) -> u32 {
        fn check_node<T: Keyed>(tree: &AvlTree<T>, link: Option<Token>) -> u32 {
            let Some(token) = link else {
                return 0;
            };
            let node = &tree.nodes[token];
            if let Some(left) = node.left {
                assert_eq!(compare(tree.nodes[left].item.key(), node.item.key()), Ordering::Less);
            }
            if let Some(right) = node.right {
                assert_eq!(compare(tree.nodes[right].item.key(), node.item.key()), Ordering::Greater);
            }
            let lh = check_node(tree, node.left);
            let rh = check_node(tree, node.right);
            assert!(lh.abs_diff(rh) <= 1, "unbalanced node");
            assert_eq!(node.height, 1 + lh.max(rh));
            node.height
        }
        let height = check_node(self, self.root);
        assert_eq!(self.tokens().len(), self.len());
        height
    }
}

impl<T> std::ops::Index<Token> for AvlTree<T> {
    type Output = T;

    fn index(&self, token: Token) -> &Self::Output {
        &self.nodes[token].item
    }
}

/// In-order iterator over an [`AvlTree`].
pub struct Iter<'a, T> {
    tree: &'a AvlTree<T>,
    stack: Vec<Token>,
}

impl<T> Iter<'_, T> {
    fn push_left_spine(&mut self, mut link: Option<Token>) {
        while let Some(token) = link {
            self.stack.push(token);
            link = self.tree.nodes[token].left;
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.stack.pop()?;
        let node = &self.tree.nodes[token];
        self.push_left_spine(node.right);
        strict_assert!(self.stack.len() <= self.tree.height() as usize);
        Some(&node.item)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use itertools::Itertools;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    struct Item(Vec<u8>, u64);

    impl Keyed for Item {
        fn key(&self) -> &[u8] {
            &self.0
        }
    }

    fn item(key: &[u8], value: u64) -> Item {
        Item(key.to_vec(), value)
    }

    #[test]
    fn test_insert_find_remove() {
        let mut tree = AvlTree::new();
        let x = tree.insert(item(b"x", 1)).unwrap();
        let y = tree.insert(item(b"y", 2)).unwrap();
        assert_eq!(tree.len(), 2);

        assert_eq!(tree.find(b"x"), Some(x));
        assert_eq!(tree.find(b"y"), Some(y));
        assert_eq!(tree.find(b"z"), None);
        assert_eq!(tree.get(x).map(|i| i.1), Some(1));

        assert_eq!(tree.remove(y), Some(item(b"y", 2)));
        assert_eq!(tree.remove(y), None);
        assert_eq!(tree.find(b"y"), None);
        assert_eq!(tree.len(), 1);
        tree.check();
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut tree = AvlTree::new();
        tree.insert(item(b"k", 1)).unwrap();

        let (err, rejected) = tree.insert(item(b"k", 2)).unwrap_err();
        assert!(err.is_duplicate_key());
        assert_eq!(rejected, item(b"k", 2));

        let token = tree.find(b"k").unwrap();
        assert_eq!(tree.get(token).map(|i| i.1), Some(1));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_in_order_iteration() {
        let mut tree = AvlTree::new();
        let keys: [&[u8]; 6] = [b"ccc", b"b", b"aa", b"", b"a", b"ab"];
        for key in keys {
            tree.insert(item(key, 0)).unwrap();
        }
        let keys = tree.iter().map(|i| i.0.clone()).collect_vec();
        let sorted: [&[u8]; 6] = [b"", b"a", b"b", b"aa", b"ab", b"ccc"];
        let expected = sorted.iter().map(|k| k.to_vec()).collect_vec();
        assert_eq!(keys, expected);

        assert_eq!(tree.get(tree.first().unwrap()).unwrap().0, b"");
        assert_eq!(tree.get(tree.last().unwrap()).unwrap().0, b"ccc");

        let drained = tree.drain().map(|i| i.0).collect_vec();
        assert_eq!(drained, expected);
        assert!(tree.is_empty());
        assert_eq!(tree.first(), None);
        assert_eq!(tree.iter().count(), 0);
    }

    #[test]
    fn test_drain_dropped_early_empties_tree() {
        let mut tree = AvlTree::new();
        for i in 0..16u64 {
            tree.insert(item(&i.to_be_bytes(), i)).unwrap();
        }

        let first = tree.drain().next().map(|i| i.1);
        assert_eq!(first, Some(0));
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.find(&3u64.to_be_bytes()), None);

        let token = tree.insert(item(b"k", 1)).unwrap();
        assert_eq!(tree[token].1, 1);
        tree.check();
    }

    #[test]
    fn test_sequential_insert_stays_balanced() {
        let mut tree = AvlTree::new();
        for i in 0..1024u64 {
            tree.insert(item(&i.to_be_bytes(), i)).unwrap();
        }
        let height = tree.check();
        // AVL height bound: 1.44 * log2(n + 2).
        assert!(height <= 15, "height: {height}");

        for i in (0..1024u64).step_by(2) {
            let token = tree.find(&i.to_be_bytes()).unwrap();
            assert_eq!(tree.remove(token).map(|i| i.1), Some(i));
        }
        tree.check();
        assert_eq!(tree.len(), 512);
        assert!(tree.iter().map(|i| i.1).tuple_windows().all(|(a, b)| a < b));
    }

    #[test]
    fn test_random_ops_against_model() {
        let mut rng = SmallRng::seed_from_u64(114514);
        let mut tree = AvlTree::new();
        let mut model = BTreeMap::new();

        for _ in 0..10_000 {
            let len = rng.random_range(0..4);
            let key = (0..len).map(|_| rng.random_range(0..4u8)).collect_vec();
            let value = rng.random::<u64>();
            if rng.random_bool(0.6) {
                let res = tree.insert(Item(key.clone(), value));
                match model.entry((key.len(), key)) {
                    std::collections::btree_map::Entry::Occupied(_) => assert!(res.is_err()),
                    std::collections::btree_map::Entry::Vacant(v) => {
                        assert!(res.is_ok());
                        v.insert(value);
                    }
                }
            } else {
                let removed = tree.find(&key).and_then(|token| tree.remove(token)).map(|i| i.1);
                assert_eq!(removed, model.remove(&(key.len(), key)));
            }
        }

        tree.check();
        // `(len, bytes)` tuples order exactly like the comparator.
        let expected = model.into_iter().map(|((_, k), v)| (k, v)).collect_vec();
        let actual = tree.iter().map(|i| (i.0.clone(), i.1)).collect_vec();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_arena_reservation_failure() {
        let err = AvlTree::<Item>::try_with_capacity(usize::MAX).unwrap_err();
        assert!(err.is_alloc_failure());
        assert!(AvlTree::<Item>::try_with_capacity(64).unwrap().is_empty());
    }
}
