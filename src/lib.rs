//! run-hashmap: a single-threaded hash map whose entries live in one
//! doubly-linked list, partitioned into contiguous per-bucket runs.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: give every entry a storage address and a `Position` handle that
//!   survive growth — rehashing relinks nodes, it never moves them.
//! - Layers:
//!   - pool: the allocator seam. `NodePool`/`PoolProvider` traits with a
//!     `slotmap`-backed default, so node slots are generational and a
//!     released handle can never alias a later entry.
//!   - run_list: RunList<T, A>, a pool-backed doubly-linked ring closed by
//!     a sentinel node. Owns element storage; exposes insert-before,
//!     erase-at, and the detach/attach splice used to move a node between
//!     runs without copying it.
//!   - run_hash_map: RunHashMap<K, V, S, A>, a bucket table of
//!     `Option<Position>` heads over the list plus the find/insert/erase/
//!     rehash orchestration.
//!
//! Constraints
//! - Single-threaded, synchronous, non-reentrant: mutation goes through
//!   `&mut self`, there is no interior mutability and no locking.
//! - One physical sequence: the map stores no payloads of its own; every
//!   mutating operation bottoms out in list relinks plus a bucket-head
//!   update.
//! - Buckets are runs: all nodes of a bucket sit consecutively in the
//!   list, starting at the recorded head. The end of a run is detected by
//!   comparing cached run stamps, not by a per-bucket chain pointer; every
//!   operation must leave runs unbroken for lookup to terminate correctly.
//! - Growth: initial table of 13 buckets, doubling whenever an insertion
//!   pushes the load factor strictly above the configured maximum
//!   (default 1.0).
//!
//! Why this split?
//! - The list can be verified as a plain sequence container (ring
//!   symmetry, splice correctness) with no hashing involved.
//! - The map layer only ever manipulates heads and run stamps, so the
//!   contiguity argument stays local to four code paths: link-front,
//!   erase, rehash, and nothing else.
//! - The pool isolates the one policy the container takes from outside —
//!   where nodes live and how a deep copy picks its storage.
//!
//! Positions
//! - `Position` is a generational handle, not a pointer: resolving one
//!   after its entry was erased yields `None`, never a reused slot.
//!   Insertion invalidates no positions; erasure invalidates exactly the
//!   erased one; rehash invalidates none (but externally cached bucket
//!   numbers are meaningless afterwards).
//!
//! Notes and non-goals
//! - No thread-safety, no persistence, no ordering guarantees beyond
//!   insertion order within a bucket's run (newest first).
//! - Duplicate keys are rejected by report, not by error: `insert` returns
//!   the existing position and `false`, the stored value stays untouched.
//! - Misuse that the original pointer-based design left undefined (stale
//!   or foreign positions, detaching the sentinel) is a documented panic
//!   here.

pub mod pool;
pub mod run_hash_map;
pub mod run_list;

mod run_hash_map_proptest;

// Public surface
pub use pool::{NodePool, PoolProvider, ReservedPools, SlotPool, SlotPools};
pub use run_hash_map::{RunHashMap, INITIAL_BUCKETS};
pub use run_list::{Position, RunList};
