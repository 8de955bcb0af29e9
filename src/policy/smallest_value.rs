//! Smallest-value invalidation policy.
//!
//! Orders a set's slots by their stored values and evicts the minimum.
//! Backed by a [`LazyMinHeap`]: the heap never mutates entries in place, so
//! a value update pushes a fresh entry and leaves the old one behind as
//! stale, to be skipped during eviction.
//!
//! ## Stale entry handling
//!
//! ```text
//!   touch(slot 0, 5):   scores { 0: 5 }    heap [ (5, 0) ]
//!   touch(slot 0, 2):   scores { 0: 2 }    heap [ (2, 0), (5, 0 stale) ]
//!
//!   invalidate():
//!     pop (2, 0) → matches scores[0] → victim is slot 0
//!     (the stale (5, 0) is discarded whenever it surfaces)
//! ```
//!
//! Because `touch` re-indexes whenever the observed value differs from the
//! recorded one, a value update that lowers a slot's value is reflected in
//! eviction order immediately. The heap is rebuilt from the authoritative
//! score map once stale entries outnumber live ones by a fixed factor,
//! bounding memory growth under heavy update churn.

use crate::ds::LazyMinHeap;
use crate::policy::Invalidator;

/// Maximum ratio of heap entries to live slots before a rebuild.
const MAX_HEAP_FACTOR: usize = 4;

/// Evicts the slot holding the minimum value in a set.
///
/// Requires `V: Ord + Clone`: values are cloned into the index so the
/// ordering survives slot reuse. Ties on equal values evict the slot that
/// entered the index first.
///
/// # Example
///
/// ```
/// use waycache::policy::{Invalidator, SmallestValueInvalidator};
///
/// let mut smallest = SmallestValueInvalidator::new();
/// smallest.touch(0, &20);
/// smallest.touch(1, &10);
/// smallest.touch(2, &30);
///
/// assert_eq!(smallest.invalidate(), Some(1));
/// assert_eq!(smallest.invalidate(), Some(0));
/// assert_eq!(smallest.invalidate(), Some(2));
/// assert_eq!(smallest.invalidate(), None);
/// ```
#[derive(Debug)]
pub struct SmallestValueInvalidator<V> {
    index: LazyMinHeap<V>,
}

impl<V> SmallestValueInvalidator<V>
where
    V: Ord + Clone,
{
    /// Creates an empty smallest-value index.
    pub fn new() -> Self {
        Self {
            index: LazyMinHeap::new(),
        }
    }

    /// Creates an empty index with storage reserved for `ways` slots.
    pub fn with_capacity(ways: usize) -> Self {
        Self {
            index: LazyMinHeap::with_capacity(ways),
        }
    }

    /// Returns the number of tracked slots.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no slots are tracked.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl<V> Default for SmallestValueInvalidator<V>
where
    V: Ord + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Invalidator<V> for SmallestValueInvalidator<V>
where
    V: Ord + Clone,
{
    fn touch(&mut self, slot: usize, value: &V) {
        if self.index.score_of(slot) != Some(value) {
            self.index.update(slot, value.clone());
            self.index.maybe_rebuild(MAX_HEAP_FACTOR);
        }
    }

    fn remove(&mut self, slot: usize) {
        self.index.remove(slot);
    }

    fn invalidate(&mut self) -> Option<usize> {
        self.index.pop_min().map(|(slot, _)| slot)
    }
}
