//! Lazy min-heap over slot positions with stale-entry skipping.
//!
//! Maintains a `BinaryHeap` of `(score, seq, slot)` plus an authoritative
//! slot→score map. Updates push new heap entries instead of mutating old
//! ones; `pop_min` discards entries whose score no longer matches the map.
//!
//! ## Architecture
//!
//! ```text
//!   scores (authoritative)
//!   ┌──────┬───────┐
//!   │ slot │ score │
//!   ├──────┼───────┤
//!   │  0   │  10   │
//!   │  3   │   2   │
//!   └──────┴───────┘
//!
//!   heap (may contain stale entries)
//!   min: (2, slot 3), (10, slot 0), (12, slot 0, stale)
//! ```
//!
//! ## Operations
//! - `update(slot, score)`: updates the map and pushes a heap entry
//! - `pop_min()`: pops until the top matches the current score
//! - `maybe_rebuild(factor)`: drops stale entries in bulk once the heap
//!   outgrows the live map by `factor`
//!
//! Ties on equal scores break by insertion sequence, oldest first.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;

#[derive(Debug)]
struct HeapEntry<S> {
    score: S,
    seq: u64,
    slot: usize,
}

impl<S: Ord> PartialEq for HeapEntry<S> {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.seq == other.seq
    }
}

impl<S: Ord> Eq for HeapEntry<S> {}

impl<S: Ord> PartialOrd for HeapEntry<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S: Ord> Ord for HeapEntry<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.score.cmp(&other.score) {
            Ordering::Equal => self.seq.cmp(&other.seq),
            ordering => ordering,
        }
    }
}

#[derive(Debug)]
/// Min-heap keyed by slot position that supports cheap updates via lazy
/// deletion.
pub struct LazyMinHeap<S> {
    scores: FxHashMap<usize, S>,
    heap: BinaryHeap<Reverse<HeapEntry<S>>>,
    seq: u64,
}

impl<S> LazyMinHeap<S>
where
    S: Ord + Clone,
{
    /// Creates an empty heap.
    pub fn new() -> Self {
        Self {
            scores: FxHashMap::default(),
            heap: BinaryHeap::new(),
            seq: 0,
        }
    }

    /// Creates an empty heap with reserved capacity for map + heap.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            scores: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            heap: BinaryHeap::with_capacity(capacity),
            seq: 0,
        }
    }

    /// Returns the number of live slots.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Returns `true` if there are no live slots.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Returns the underlying heap length (may exceed `len()` due to stale
    /// entries).
    pub fn heap_len(&self) -> usize {
        self.heap.len()
    }

    /// Returns the current score for `slot`, if present.
    pub fn score_of(&self, slot: usize) -> Option<&S> {
        self.scores.get(&slot)
    }

    /// Updates `slot`'s score and returns the previous score, if any.
    ///
    /// Pushes a new heap entry; old entries become stale and are ignored by
    /// `pop_min`.
    pub fn update(&mut self, slot: usize, score: S) -> Option<S> {
        let previous = self.scores.insert(slot, score.clone());
        self.push_entry(slot, score);
        previous
    }

    /// Removes `slot` and returns its score, if present.
    ///
    /// Stale heap entries are left behind and skipped by `pop_min`.
    pub fn remove(&mut self, slot: usize) -> Option<S> {
        self.scores.remove(&slot)
    }

    /// Pops and returns the current minimum `(slot, score)`, skipping stale
    /// entries.
    pub fn pop_min(&mut self) -> Option<(usize, S)> {
        loop {
            let Reverse(entry) = self.heap.pop()?;
            match self.scores.get(&entry.slot) {
                Some(score) if *score == entry.score => {
                    self.scores.remove(&entry.slot);
                    return Some((entry.slot, entry.score));
                }
                _ => continue,
            }
        }
    }

    /// Rebuilds the heap from the authoritative score map.
    pub fn rebuild(&mut self) {
        self.heap.clear();
        let entries: Vec<(usize, S)> = self
            .scores
            .iter()
            .map(|(slot, score)| (*slot, score.clone()))
            .collect();
        for (slot, score) in entries {
            self.push_entry(slot, score);
        }
    }

    /// Rebuilds if the heap has grown too stale relative to the map size.
    pub fn maybe_rebuild(&mut self, factor: usize) {
        let factor = factor.max(1);
        if self.heap.len() > self.scores.len().saturating_mul(factor) {
            self.rebuild();
        }
    }

    /// Drops all live and stale entries.
    pub fn clear(&mut self) {
        self.scores.clear();
        self.heap.clear();
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert!(self.heap.len() >= self.scores.len());
        if self.scores.is_empty() && self.heap.is_empty() {
            assert_eq!(self.len(), 0);
        }
    }

    fn push_entry(&mut self, slot: usize, score: S) {
        let entry = HeapEntry {
            score,
            seq: self.seq,
            slot,
        };
        self.seq = self.seq.wrapping_add(1);
        self.heap.push(Reverse(entry));
    }
}

impl<S> Default for LazyMinHeap<S>
where
    S: Ord + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
