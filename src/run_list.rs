//! RunList: a pool-backed doubly-linked ring closed by a sentinel node.
//!
//! The list owns element storage through its node pool. Callers address
//! elements with [`Position`] handles and step them through the list
//! (`next`/`prev`); a position never dangles — after its node is erased it
//! resolves to `None`, it cannot alias a later occupant of the same slot.
//!
//! Nodes carry a `run` stamp next to the payload. The list itself never
//! interprets it; the map layer uses it to mark which bucket a node belongs
//! to. Misusing a position (stale, foreign, or the end position where an
//! element is required) is a well-defined panic, not undefined behavior.

use crate::pool::{NodePool, PoolProvider, SlotPools};
use slotmap::DefaultKey;

/// Non-owning reference to a node of a [`RunList`].
///
/// Positions stay valid across every list operation except erasure of the
/// node they name. Comparing positions from different lists is meaningless
/// but harmless.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Position(DefaultKey);

struct Node<T> {
    next: DefaultKey,
    prev: DefaultKey,
    run: usize,
    /// `None` only for the sentinel.
    payload: Option<T>,
}

/// Doubly-linked list of owned elements behind a sentinel ring.
///
/// `end()` names the sentinel; `head()` is `end()` when the list is empty.
/// A detached node links to itself until it is attached or released.
pub struct RunList<T, A: PoolProvider = SlotPools> {
    pool: A::Pool<Node<T>>,
    sentinel: DefaultKey,
    len: usize,
    provider: A,
}

impl<T> RunList<T> {
    pub fn new() -> Self {
        Self::with_pools(SlotPools)
    }
}

impl<T> Default for RunList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: PoolProvider> RunList<T, A> {
    pub fn with_pools(provider: A) -> Self {
        let mut pool = provider.build();
        let sentinel = pool.allocate(Node {
            next: DefaultKey::default(),
            prev: DefaultKey::default(),
            run: 0,
            payload: None,
        });
        let anchor = pool
            .get_mut(sentinel)
            .expect("freshly allocated sentinel");
        anchor.next = sentinel;
        anchor.prev = sentinel;
        Self {
            pool,
            sentinel,
            len: 0,
            provider,
        }
    }

    fn node(&self, key: DefaultKey) -> &Node<T> {
        self.pool
            .get(key)
            .expect("position does not name a live node of this list")
    }

    fn node_mut(&mut self, key: DefaultKey) -> &mut Node<T> {
        self.pool
            .get_mut(key)
            .expect("position does not name a live node of this list")
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First linked node, or `end()` when empty.
    pub fn head(&self) -> Position {
        Position(self.node(self.sentinel).next)
    }

    /// The sentinel position. Never carries an element.
    pub fn end(&self) -> Position {
        Position(self.sentinel)
    }

    /// Panics if `pos` is stale or foreign.
    pub fn next(&self, pos: Position) -> Position {
        Position(self.node(pos.0).next)
    }

    /// Panics if `pos` is stale or foreign.
    pub fn prev(&self, pos: Position) -> Position {
        Position(self.node(pos.0).prev)
    }

    /// `None` for a stale position or for `end()`.
    pub fn get(&self, pos: Position) -> Option<&T> {
        self.pool.get(pos.0)?.payload.as_ref()
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut T> {
        self.pool.get_mut(pos.0)?.payload.as_mut()
    }

    /// Whether `pos` currently names a live element of this list.
    pub fn contains(&self, pos: Position) -> bool {
        self.pool
            .get(pos.0)
            .map(|node| node.payload.is_some())
            .unwrap_or(false)
    }

    pub(crate) fn run_of(&self, pos: Position) -> Option<usize> {
        let node = self.pool.get(pos.0)?;
        node.payload.as_ref()?;
        Some(node.run)
    }

    pub(crate) fn stamp_run(&mut self, pos: Position, run: usize) {
        let node = self.node_mut(pos.0);
        assert!(node.payload.is_some(), "cannot stamp the end position");
        node.run = run;
    }

    pub(crate) fn provider(&self) -> &A {
        &self.provider
    }

    /// Allocates a node holding `value` without linking it. The node must
    /// later be passed to `attach_before` or `release_detached`.
    pub fn allocate_detached(&mut self, value: T) -> Position {
        let key = self.pool.allocate(Node {
            next: DefaultKey::default(),
            prev: DefaultKey::default(),
            run: 0,
            payload: Some(value),
        });
        let node = self.node_mut(key);
        node.next = key;
        node.prev = key;
        Position(key)
    }

    /// Links the already-allocated, detached `node` immediately before
    /// `pos`. Panics if `node` is the end position or currently linked.
    pub fn attach_before(&mut self, pos: Position, node: Position) {
        assert!(node.0 != self.sentinel, "cannot attach the end position");
        assert!(
            self.node(node.0).next == node.0,
            "node to attach is already linked"
        );
        let prev = self.node(pos.0).prev;
        {
            let fresh = self.node_mut(node.0);
            fresh.prev = prev;
            fresh.next = pos.0;
        }
        self.node_mut(prev).next = node.0;
        self.node_mut(pos.0).prev = node.0;
        self.len += 1;
    }

    /// Unlinks `pos` without releasing its storage; the node keeps its
    /// payload and run stamp and links to itself. With `attach_before` this
    /// is the splice step: detach from one run, attach to another, as one
    /// logical move that never copies the element.
    pub fn detach(&mut self, pos: Position) {
        assert!(pos.0 != self.sentinel, "cannot detach the end position");
        let (prev, next) = {
            let node = self.node(pos.0);
            assert!(node.next != pos.0, "node is not linked");
            (node.prev, node.next)
        };
        self.node_mut(prev).next = next;
        self.node_mut(next).prev = prev;
        let node = self.node_mut(pos.0);
        node.next = pos.0;
        node.prev = pos.0;
        self.len -= 1;
    }

    /// Releases a detached node and returns its payload.
    pub fn release_detached(&mut self, node: Position) -> T {
        assert!(node.0 != self.sentinel, "cannot release the end position");
        assert!(
            self.node(node.0).next == node.0,
            "node to release is still linked"
        );
        let released = self
            .pool
            .release(node.0)
            .expect("position does not name a live node of this list");
        released.payload.expect("non-sentinel node holds a payload")
    }

    /// Allocates a node for `value` and links it immediately before `pos`.
    /// No other position is invalidated.
    pub fn insert_before(&mut self, pos: Position, value: T) -> Position {
        let node = self.allocate_detached(value);
        self.attach_before(pos, node);
        node
    }

    /// Unlinks and releases `pos`, returning its element. Only `pos` itself
    /// becomes stale. Panics on a stale or foreign position.
    pub fn erase(&mut self, pos: Position) -> T {
        self.detach(pos);
        self.release_detached(pos)
    }

    pub fn push_back(&mut self, value: T) -> Position {
        self.insert_before(self.end(), value)
    }

    pub fn push_front(&mut self, value: T) -> Position {
        self.insert_before(self.head(), value)
    }

    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let last = self.prev(self.end());
        Some(self.erase(last))
    }

    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        Some(self.erase(self.head()))
    }

    pub fn clear(&mut self) {
        while self.pop_back().is_some() {}
    }

    pub fn iter(&self) -> Iter<'_, T, A> {
        Iter {
            list: self,
            cur: self.node(self.sentinel).next,
        }
    }

    /// In-order mutable traversal. The closure may not touch the list
    /// structure, which is what makes this expressible without `unsafe`.
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(Position, &mut T),
    {
        let mut cur = self.node(self.sentinel).next;
        while cur != self.sentinel {
            let next = self.node(cur).next;
            if let Some(payload) = self.node_mut(cur).payload.as_mut() {
                f(Position(cur), payload);
            }
            cur = next;
        }
    }

    #[cfg(test)]
    pub(crate) fn assert_ring(&self) {
        let mut forward = Vec::new();
        let mut cur = self.node(self.sentinel).next;
        while cur != self.sentinel {
            forward.push(cur);
            let node = self.node(cur);
            assert!(node.payload.is_some(), "linked node lost its payload");
            assert_eq!(
                self.node(node.next).prev,
                cur,
                "forward/backward links disagree"
            );
            cur = node.next;
        }
        assert_eq!(forward.len(), self.len, "len out of sync with the ring");

        let mut backward = Vec::new();
        let mut cur = self.node(self.sentinel).prev;
        while cur != self.sentinel {
            backward.push(cur);
            cur = self.node(cur).prev;
        }
        backward.reverse();
        assert_eq!(forward, backward, "ring is not symmetric");
    }
}

impl<T: Clone, A: PoolProvider> Clone for RunList<T, A> {
    /// Deep copy in iteration order into a list built from the forked
    /// provider. Run stamps are not copied; only the owning map knows how
    /// to restamp them.
    fn clone(&self) -> Self {
        let mut copy = Self::with_pools(self.provider.fork());
        for (_, value) in self.iter() {
            copy.push_back(value.clone());
        }
        copy
    }
}

/// Forward iterator over `(Position, &T)` in list order.
pub struct Iter<'a, T, A: PoolProvider> {
    list: &'a RunList<T, A>,
    cur: DefaultKey,
}

impl<'a, T, A: PoolProvider> Iterator for Iter<'a, T, A> {
    type Item = (Position, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur == self.list.sentinel {
            return None;
        }
        let key = self.cur;
        let node = self.list.pool.get(key)?;
        self.cur = node.next;
        node.payload.as_ref().map(|payload| (Position(key), payload))
    }
}

impl<'a, T, A: PoolProvider> IntoIterator for &'a RunList<T, A> {
    type Item = (Position, &'a T);
    type IntoIter = Iter<'a, T, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Draining iterator; pops elements front to back.
pub struct IntoIter<T, A: PoolProvider> {
    list: RunList<T, A>,
}

impl<T, A: PoolProvider> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.list.pop_front()
    }
}

impl<T, A: PoolProvider> IntoIterator for RunList<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { list: self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ReservedPools;

    fn collect<T: Clone, A: PoolProvider>(list: &RunList<T, A>) -> Vec<T> {
        list.iter().map(|(_, v)| v.clone()).collect()
    }

    #[test]
    fn empty_list_head_is_end() {
        let list: RunList<i32> = RunList::new();
        assert!(list.is_empty());
        assert_eq!(list.head(), list.end());
        assert!(list.get(list.end()).is_none());
        list.assert_ring();
    }

    #[test]
    fn push_pop_both_ends() {
        let mut list = RunList::new();
        list.push_back(2);
        list.push_back(3);
        list.push_front(1);
        assert_eq!(collect(&list), vec![1, 2, 3]);
        list.assert_ring();

        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.pop_back(), Some(3));
        assert_eq!(list.pop_back(), Some(2));
        assert_eq!(list.pop_back(), None);
        list.assert_ring();
    }

    /// Invariant: inserting before a position places the new element
    /// immediately ahead of it and invalidates nothing.
    #[test]
    fn insert_before_keeps_positions_valid() {
        let mut list = RunList::new();
        let b = list.push_back("b");
        let mid = list.insert_before(b, "a");
        list.insert_before(list.end(), "c");

        assert_eq!(collect(&list), vec!["a", "b", "c"]);
        assert_eq!(list.get(b), Some(&"b"));
        assert_eq!(list.get(mid), Some(&"a"));
        assert_eq!(list.next(mid), b);
        assert_eq!(list.prev(b), mid);
        list.assert_ring();
    }

    /// Invariant: erasing a node staleness-invalidates only that position;
    /// the stale position never aliases a later allocation.
    #[test]
    fn erase_invalidates_only_the_erased_position() {
        let mut list = RunList::new();
        let a = list.push_back(1);
        let b = list.push_back(2);
        let c = list.push_back(3);

        assert_eq!(list.erase(b), 2);
        assert!(!list.contains(b));
        assert!(list.get(b).is_none());
        assert_eq!(list.get(a), Some(&1));
        assert_eq!(list.get(c), Some(&3));
        assert_eq!(list.next(a), c);
        list.assert_ring();

        let d = list.push_back(4);
        assert_ne!(b, d);
        assert!(list.get(b).is_none());
    }

    /// Invariant: detach + attach_before moves a node without touching its
    /// payload, and a detached node is invisible to iteration.
    #[test]
    fn detach_and_reattach_moves_the_node() {
        let mut list = RunList::new();
        let a = list.push_back("a");
        list.push_back("b");
        let c = list.push_back("c");

        list.detach(c);
        assert_eq!(list.len(), 2);
        assert_eq!(collect(&list), vec!["a", "b"]);
        assert_eq!(list.get(c), Some(&"c"), "detached node keeps its payload");

        list.attach_before(a, c);
        assert_eq!(collect(&list), vec!["c", "a", "b"]);
        assert_eq!(list.len(), 3);
        list.assert_ring();
    }

    #[test]
    fn allocate_then_release_detached_round_trips() {
        let mut list: RunList<String> = RunList::new();
        let node = list.allocate_detached("x".to_string());
        assert_eq!(list.len(), 0, "detached nodes are not counted");
        assert_eq!(list.release_detached(node), "x");
        assert!(!list.contains(node));
    }

    #[test]
    #[should_panic(expected = "cannot detach the end position")]
    fn detaching_the_end_position_panics() {
        let mut list: RunList<i32> = RunList::new();
        let end = list.end();
        list.detach(end);
    }

    #[test]
    #[should_panic(expected = "does not name a live node")]
    fn stepping_a_stale_position_panics() {
        let mut list = RunList::new();
        let a = list.push_back(1);
        list.erase(a);
        let _ = list.next(a);
    }

    #[test]
    fn run_stamps_survive_detach() {
        let mut list = RunList::new();
        let a = list.push_back(10);
        list.stamp_run(a, 7);
        list.push_back(11);
        list.detach(a);
        assert_eq!(list.run_of(a), Some(7));
        list.attach_before(list.end(), a);
        assert_eq!(list.run_of(a), Some(7));
    }

    #[test]
    fn clone_is_deep_and_in_order() {
        let mut list = RunList::new();
        for i in 0..5 {
            list.push_back(i);
        }
        let mut copy = list.clone();
        copy.pop_front();
        copy.push_back(99);

        assert_eq!(collect(&list), vec![0, 1, 2, 3, 4]);
        assert_eq!(collect(&copy), vec![1, 2, 3, 4, 99]);
        copy.assert_ring();
    }

    #[test]
    fn for_each_mut_visits_in_order() {
        let mut list = RunList::new();
        for i in 1..=3 {
            list.push_back(i);
        }
        let mut seen = Vec::new();
        list.for_each_mut(|_, v| {
            seen.push(*v);
            *v *= 10;
        });
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(collect(&list), vec![10, 20, 30]);
    }

    #[test]
    fn into_iter_drains_front_to_back() {
        let mut list = RunList::new();
        for i in 0..4 {
            list.push_back(i);
        }
        let drained: Vec<_> = list.into_iter().collect();
        assert_eq!(drained, vec![0, 1, 2, 3]);
    }

    #[test]
    fn reserved_pools_back_a_working_list() {
        let mut list = RunList::with_pools(ReservedPools { nodes: 8 });
        for i in 0..8 {
            list.push_back(i);
        }
        assert_eq!(list.len(), 8);
        list.clear();
        assert!(list.is_empty());
        list.assert_ring();
    }
}
