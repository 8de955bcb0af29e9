//! Per-set invalidation policies.
//!
//! Every set owns one invalidator. The cache notifies it on each access or
//! write (`touch`), on explicit removal (`remove`), and asks it for a victim
//! when the set is full (`invalidate`). The three shipped policies cover
//! recency in both directions and value-ordered eviction:
//!
//! | Policy                       | Victim                       |
//! |------------------------------|------------------------------|
//! | [`LruInvalidator`]           | least recently touched slot  |
//! | [`MruInvalidator`]           | most recently touched slot   |
//! | [`SmallestValueInvalidator`] | slot with the minimum value  |
//!
//! Custom policies implement [`Invalidator`] and are handed to
//! [`SetAssociativeCache::with_invalidator`](crate::cache::SetAssociativeCache::with_invalidator).

pub mod lru;
pub mod mru;
pub mod smallest_value;

pub use lru::LruInvalidator;
pub use mru::MruInvalidator;
pub use smallest_value::SmallestValueInvalidator;

/// Eviction index for one set.
///
/// Slots are identified by their position within the set (`0..ways`). The
/// invalidator records membership and ordering; it never owns slot storage.
///
/// Contract the cache relies on:
/// - after `touch(slot, _)` the slot is a member (repeated touches update
///   its ordering, never duplicate membership);
/// - after `remove(slot)` or after `invalidate` returns `Some(slot)`, the
///   slot is not a member;
/// - `invalidate` returning `None` means the index tracks no slots.
pub trait Invalidator<V> {
    /// Records that `slot` was just accessed or written with `value`.
    fn touch(&mut self, slot: usize, value: &V);

    /// Drops `slot` from the index; no-op if absent.
    fn remove(&mut self, slot: usize);

    /// Chooses one victim per the policy, drops it from the index, and
    /// returns its slot position. Returns `None` if nothing is tracked.
    fn invalidate(&mut self) -> Option<usize>;
}
