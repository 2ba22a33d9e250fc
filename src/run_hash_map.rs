//! RunHashMap: bucket index + orchestration over a [`RunList`].
//!
//! Every element lives in the one shared list; the map itself stores no
//! key/value payloads. A bucket is represented only by the position of the
//! first node of its run in `table`. Chain ends are detected by comparing
//! each node's cached run stamp against the probed bucket instead of keeping
//! a per-bucket chain pointer — one word per node saved, paid for with the
//! contiguity invariant: all nodes of a bucket form one unbroken block in
//! the list, starting at the recorded head. An explicit per-bucket chain
//! would trade that word back for a simpler invariant; this implementation
//! keeps the cached-stamp form of the original design.
//!
//! Growth rehashes the table only. Nodes are relinked in place, so element
//! storage and every handed-out [`Position`] stay valid across `rehash`;
//! only iteration order and bucket numbering change.

use crate::pool::{PoolProvider, SlotPools};
use crate::run_list::{self, Position, RunList};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::ops::Index;
use std::collections::hash_map::RandomState;

/// Bucket count of a freshly constructed map.
pub const INITIAL_BUCKETS: usize = 13;

const GROWTH_FACTOR: usize = 2;
const DEFAULT_MAX_LOAD_FACTOR: f64 = 1.0;

/// Hash map whose entries live in one doubly-linked list of contiguous
/// per-bucket runs.
///
/// New entries enter at the front of their bucket's run (an empty bucket
/// starts its run at the tail of the list), so iteration order is
/// most-recent-first within a bucket. Positions returned by `insert`/`find`
/// stay valid until the entry is erased, across any number of rehashes.
pub struct RunHashMap<K, V, S = RandomState, A: PoolProvider = SlotPools> {
    hasher: S,
    elements: RunList<(K, V), A>,
    table: Vec<Option<Position>>,
    max_load_factor: f64,
}

impl<K, V> RunHashMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }
}

impl<K, V> Default for RunHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> RunHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_hasher_and_pools(hasher, SlotPools)
    }
}

impl<K, V, S, A> RunHashMap<K, V, S, A>
where
    K: Eq + Hash,
    S: BuildHasher,
    A: PoolProvider,
{
    pub fn with_hasher_and_pools(hasher: S, pools: A) -> Self {
        Self {
            hasher,
            elements: RunList::with_pools(pools),
            table: vec![None; INITIAL_BUCKETS],
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.table.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.elements.len() as f64 / self.table.len() as f64
    }

    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    /// Takes effect on the next inserting operation; never rehashes by
    /// itself.
    pub fn set_max_load_factor(&mut self, max_load_factor: f64) {
        debug_assert!(max_load_factor > 0.0);
        self.max_load_factor = max_load_factor;
    }

    fn slot_for<Q>(&self, key: &Q) -> usize
    where
        Q: ?Sized + Hash,
    {
        (self.hasher.hash_one(key) % self.table.len() as u64) as usize
    }

    /// Position of the entry for `key`, if present.
    ///
    /// Probes the bucket's run from its recorded head; the walk stops at the
    /// first node whose cached run stamp differs from the probed bucket (or
    /// at the list end) — that is the end of the chain, no separate chain
    /// pointer exists.
    pub fn find<Q>(&self, key: &Q) -> Option<Position>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let slot = self.slot_for(key);
        let mut pos = self.table[slot]?;
        let end = self.elements.end();
        while pos != end {
            if self.elements.run_of(pos) != Some(slot) {
                return None;
            }
            let (k, _) = self.elements.get(pos)?;
            if k.borrow() == key {
                return Some(pos);
            }
            pos = self.elements.next(pos);
        }
        None
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(key).is_some()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let pos = self.find(key)?;
        self.elements.get(pos).map(|(_, v)| v)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let pos = self.find(key)?;
        self.elements.get_mut(pos).map(|(_, v)| v)
    }

    pub fn key_at(&self, pos: Position) -> Option<&K> {
        self.elements.get(pos).map(|(k, _)| k)
    }

    pub fn value_at(&self, pos: Position) -> Option<&V> {
        self.elements.get(pos).map(|(_, v)| v)
    }

    pub fn value_at_mut(&mut self, pos: Position) -> Option<&mut V> {
        self.elements.get_mut(pos).map(|(_, v)| v)
    }

    pub fn entry_at(&self, pos: Position) -> Option<(&K, &V)> {
        self.elements.get(pos).map(|(k, v)| (k, v))
    }

    /// Links a new entry at the front of its bucket's run and records it as
    /// the bucket head. An empty bucket anchors at `end()`, so its first
    /// entry lands at the tail of the list.
    fn link_front(&mut self, key: K, value: V) -> Position {
        let slot = self.slot_for(&key);
        let anchor = self.table[slot].unwrap_or_else(|| self.elements.end());
        let pos = self.elements.insert_before(anchor, (key, value));
        self.elements.stamp_run(pos, slot);
        self.table[slot] = Some(pos);
        pos
    }

    fn grow_if_overloaded(&mut self) {
        if self.load_factor() > self.max_load_factor {
            self.rehash(self.table.len() * GROWTH_FACTOR);
        }
    }

    /// Inserts `key → value` if the key is absent. Returns the entry's
    /// position and whether an insertion happened; a present key is left
    /// untouched and reported with `false`.
    pub fn insert(&mut self, key: K, value: V) -> (Position, bool) {
        if let Some(existing) = self.find(&key) {
            return (existing, false);
        }
        let pos = self.link_front(key, value);
        self.grow_if_overloaded();
        (pos, true)
    }

    /// Like `insert`, but the value is constructed only when the key is
    /// actually absent.
    pub fn insert_with<F>(&mut self, key: K, default: F) -> (Position, bool)
    where
        F: FnOnce() -> V,
    {
        if let Some(existing) = self.find(&key) {
            return (existing, false);
        }
        let pos = self.link_front(key, default());
        self.grow_if_overloaded();
        (pos, true)
    }

    /// Mutable access to the value for `key`, default-constructing and
    /// linking it like `insert` on a miss.
    ///
    /// The slot is recomputed from the key's hash on every miss, even though
    /// `find` just walked the bucket; kept deliberately simple.
    pub fn get_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let pos = match self.find(&key) {
            Some(pos) => pos,
            None => {
                let pos = self.link_front(key, V::default());
                self.grow_if_overloaded();
                pos
            }
        };
        self.elements
            .get_mut(pos)
            .map(|(_, v)| v)
            .expect("entry just found or linked")
    }

    fn erase_entry(&mut self, pos: Position) -> ((K, V), Position) {
        let slot = self
            .elements
            .run_of(pos)
            .expect("erase on a stale or foreign position");
        let next = self.elements.next(pos);
        // The head relationship must be read before unlinking.
        if self.table[slot] == Some(pos) {
            let run_continues =
                next != self.elements.end() && self.elements.run_of(next) == Some(slot);
            self.table[slot] = if run_continues { Some(next) } else { None };
        }
        (self.elements.erase(pos), next)
    }

    /// Erases the entry at `pos` and returns the position after it.
    /// Panics on a stale or foreign position.
    pub fn erase(&mut self, pos: Position) -> Position {
        self.erase_entry(pos).1
    }

    /// Erases every entry in `[from, to)`.
    pub fn erase_range(&mut self, from: Position, to: Position) {
        let mut cur = from;
        while cur != to {
            cur = self.erase(cur);
        }
    }

    /// Removes the entry for `key`, returning the owned pair if it existed.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let pos = self.find(key)?;
        Some(self.erase_entry(pos).0)
    }

    /// Grows the bucket table to `new_buckets` slots; smaller or equal
    /// requests are ignored. Every node is restamped and, when its bucket
    /// already has a run, spliced to that run's front; the first node of a
    /// bucket stays physically where it is. No position is invalidated.
    pub fn rehash(&mut self, new_buckets: usize) {
        if new_buckets <= self.table.len() {
            return;
        }
        self.table.clear();
        self.table.resize(new_buckets, None);

        let end = self.elements.end();
        let mut cur = self.elements.head();
        while cur != end {
            let next = self.elements.next(cur);
            let (key, _) = self
                .elements
                .get(cur)
                .expect("walk only visits linked nodes");
            let slot = self.slot_for(key);
            if let Some(head) = self.table[slot] {
                self.elements.detach(cur);
                self.elements.attach_before(head, cur);
            }
            self.table[slot] = Some(cur);
            self.elements.stamp_run(cur, slot);
            cur = next;
        }
    }

    /// Ensures `entries` elements fit without exceeding the maximum load
    /// factor.
    pub fn reserve(&mut self, entries: usize) {
        self.rehash((entries as f64 / self.max_load_factor) as usize);
    }

    /// Drops every entry; bucket capacity is kept.
    pub fn clear(&mut self) {
        self.elements.clear();
        for head in self.table.iter_mut() {
            *head = None;
        }
    }

    /// Iterates entries in list order: one contiguous run per bucket,
    /// most recently inserted first within each run.
    pub fn iter(&self) -> Iter<'_, K, V, A> {
        Iter {
            inner: self.elements.iter(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(_, k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, _, v)| v)
    }

    /// In-order mutable traversal of the values.
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V),
    {
        self.elements.for_each_mut(|_, (k, v)| f(k, v));
    }

    /// Checks the bucket-contiguity invariant and the bookkeeping around
    /// it; test builds only.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        use std::collections::HashSet;

        self.elements.assert_ring();

        let end = self.elements.end();
        let mut seen_runs: HashSet<usize> = HashSet::new();
        let mut count = 0;
        let mut prev_run = None;
        let mut cur = self.elements.head();
        while cur != end {
            count += 1;
            let run = self
                .elements
                .run_of(cur)
                .expect("linked node carries a run stamp");
            assert!(run < self.table.len(), "run stamp beyond the table");
            if prev_run != Some(run) {
                assert!(
                    seen_runs.insert(run),
                    "bucket {run} occupies two separate blocks"
                );
                assert_eq!(
                    self.table[run],
                    Some(cur),
                    "bucket {run} head does not point at the first node of its run"
                );
            }
            prev_run = Some(run);
            cur = self.elements.next(cur);
        }
        assert_eq!(count, self.len(), "len out of sync with the list");
        for (slot, head) in self.table.iter().enumerate() {
            if head.is_some() {
                assert!(
                    seen_runs.contains(&slot),
                    "bucket {slot} has a head but no nodes"
                );
            }
        }
    }
}

impl<K, V, S, A> Clone for RunHashMap<K, V, S, A>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher + Clone,
    A: PoolProvider,
{
    /// Deep copy: fresh table of equal capacity, entries re-inserted in
    /// iteration order into a list built from the forked pool provider.
    fn clone(&self) -> Self {
        let mut copy = Self {
            hasher: self.hasher.clone(),
            elements: RunList::with_pools(self.elements.provider().fork()),
            table: vec![None; self.table.len()],
            max_load_factor: self.max_load_factor,
        };
        for (_, k, v) in self.iter() {
            copy.insert(k.clone(), v.clone());
        }
        copy
    }
}

impl<K, V, S, A> fmt::Debug for RunHashMap<K, V, S, A>
where
    K: fmt::Debug,
    V: fmt::Debug,
    A: PoolProvider,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.elements.iter().map(|(_, (k, v))| (k, v)))
            .finish()
    }
}

impl<K, Q, V, S, A> Index<&Q> for RunHashMap<K, V, S, A>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Eq + Hash,
    S: BuildHasher,
    A: PoolProvider,
{
    type Output = V;

    /// Panics if the key is absent; the read-only counterpart of
    /// `get_or_default`.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K, V, S, A> Extend<(K, V)> for RunHashMap<K, V, S, A>
where
    K: Eq + Hash,
    S: BuildHasher,
    A: PoolProvider,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, S, A> FromIterator<(K, V)> for RunHashMap<K, V, S, A>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
    A: PoolProvider + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher_and_pools(S::default(), A::default());
        map.extend(iter);
        map
    }
}

/// Iterator over `(Position, &K, &V)` in list order.
pub struct Iter<'a, K, V, A: PoolProvider> {
    inner: run_list::Iter<'a, (K, V), A>,
}

impl<'a, K, V, A: PoolProvider> Iterator for Iter<'a, K, V, A> {
    type Item = (Position, &'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(pos, (k, v))| (pos, k, v))
    }
}

impl<'a, K, V, S, A: PoolProvider> IntoIterator for &'a RunHashMap<K, V, S, A> {
    type Item = (Position, &'a K, &'a V);
    type IntoIter = Iter<'a, K, V, A>;

    fn into_iter(self) -> Self::IntoIter {
        Iter {
            inner: self.elements.iter(),
        }
    }
}

/// Draining iterator over owned `(K, V)` pairs in list order.
pub struct IntoIter<K, V, A: PoolProvider> {
    inner: run_list::IntoIter<(K, V), A>,
}

impl<K, V, A: PoolProvider> Iterator for IntoIter<K, V, A> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl<K, V, S, A: PoolProvider> IntoIterator for RunHashMap<K, V, S, A> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, A>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.elements.into_iter(),
        }
    }
}
