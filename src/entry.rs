//! Pre-allocated entry slots and snapshot entries.
//!
//! A [`Slot`] is a reusable cell inside a set: its storage identity is fixed
//! for the cache's lifetime while its contents turn over. A slot is either
//! *set* (holds a live key/value pair plus the key's cached hash) or *unset*
//! (holds nothing and owns nothing, so previously held key/value storage can
//! be reclaimed).
//!
//! ## Slot lifecycle
//!
//! ```text
//!   unset ──assign──► set ──unset──► unset ──assign──► set ── …
//!                      │
//!                 replace_value (key/hash/flag untouched)
//! ```
//!
//! [`CacheEntry`] is the public, owned snapshot of a set slot. Iterators
//! yield snapshots rather than slot references because the underlying slot
//! may be reused for a different key before the consumer is done with it.

use std::any::Any;

use crate::error::UnwrapError;

/// A reusable entry cell inside a set.
///
/// The set flag is carried by value presence: a slot is set iff it holds a
/// value. The cached hash is only meaningful while the slot is set; probes
/// compare hashes first so mismatched keys short-circuit without an equality
/// call.
#[derive(Debug)]
pub(crate) struct Slot<K, V> {
    key: Option<K>,
    value: Option<V>,
    hash: u64,
}

impl<K, V> Slot<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            key: None,
            value: None,
            hash: 0,
        }
    }

    /// Returns `true` if the slot currently holds a live entry.
    #[inline]
    pub(crate) fn is_set(&self) -> bool {
        self.value.is_some()
    }

    #[inline]
    pub(crate) fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    #[inline]
    pub(crate) fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// The cached key hash; only meaningful while the slot is set.
    #[inline]
    pub(crate) fn hash(&self) -> u64 {
        self.hash
    }

    /// Fills the slot with a new live entry, setting all fields at once.
    pub(crate) fn assign(&mut self, key: K, value: V, hash: u64) {
        self.key = Some(key);
        self.value = Some(value);
        self.hash = hash;
    }

    /// Replaces only the value, returning the previous one.
    ///
    /// Key, hash, and the set state are untouched.
    pub(crate) fn replace_value(&mut self, value: V) -> Option<V> {
        self.value.replace(value)
    }

    /// Clears the slot, releasing ownership of key and value.
    ///
    /// Returns the previous value so eviction paths can hand it back.
    pub(crate) fn unset(&mut self) -> Option<V> {
        self.key = None;
        self.value.take()
    }

    /// Returns `true` if a probe for `(hash, key)` matches this slot.
    #[inline]
    pub(crate) fn matches(&self, hash: u64, key: &K) -> bool
    where
        K: PartialEq,
    {
        self.is_set() && self.hash == hash && self.key.as_ref() == Some(key)
    }

    /// Takes an owned snapshot of the slot, or `None` if it is unset.
    pub(crate) fn snapshot(&self) -> Option<CacheEntry<K, V>>
    where
        K: Clone,
        V: Clone,
    {
        match (&self.key, &self.value) {
            (Some(key), Some(value)) => Some(CacheEntry {
                key: key.clone(),
                value: value.clone(),
                hash: self.hash,
                set: true,
            }),
            _ => None,
        }
    }
}

/// An owned snapshot of a set slot.
///
/// Produced by the cache iterator and by `entries()`. The snapshot is
/// decoupled from slot storage: once yielded it stays valid no matter what
/// the cache does to the underlying slot.
///
/// # Example
///
/// ```
/// use waycache::cache::SetAssociativeCache;
///
/// let mut cache = SetAssociativeCache::new(4, 4).unwrap();
/// cache.insert("a", 1).unwrap();
///
/// let entry = cache.iter().next().unwrap();
/// assert_eq!(entry.key(), &"a");
/// assert_eq!(entry.value(), &1);
/// assert!(entry.is_set());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<K, V> {
    key: K,
    value: V,
    hash: u64,
    set: bool,
}

impl<K, V> CacheEntry<K, V> {
    /// The entry's key.
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The entry's value.
    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// The cached hash of the key at snapshot time.
    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Whether the source slot was set when the snapshot was taken.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.set
    }

    /// Consumes the snapshot into its `(key, value)` pair.
    pub fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K: 'static, V: 'static> CacheEntry<K, V> {
    /// Downcasts the entry to a concrete type.
    ///
    /// Exists so invalidation policies handed an abstract entry can get the
    /// concrete one back. Fails for every type other than
    /// `CacheEntry<K, V>` itself.
    ///
    /// # Example
    ///
    /// ```
    /// use waycache::cache::SetAssociativeCache;
    /// use waycache::entry::CacheEntry;
    ///
    /// let mut cache = SetAssociativeCache::new(1, 1).unwrap();
    /// cache.insert(1u32, "one").unwrap();
    ///
    /// let entry = cache.iter().next().unwrap();
    /// assert!(entry.unwrap_as::<CacheEntry<u32, &str>>().is_ok());
    /// assert!(entry.unwrap_as::<String>().is_err());
    /// ```
    pub fn unwrap_as<T: 'static>(&self) -> Result<&T, UnwrapError> {
        (self as &dyn Any)
            .downcast_ref::<T>()
            .ok_or_else(|| UnwrapError::new("not the concrete set-associative cache entry type"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_starts_unset() {
        let slot: Slot<&str, i32> = Slot::new();
        assert!(!slot.is_set());
        assert_eq!(slot.key(), None);
        assert_eq!(slot.value(), None);
    }

    #[test]
    fn assign_sets_all_fields() {
        let mut slot = Slot::new();
        slot.assign("a", 1, 42);
        assert!(slot.is_set());
        assert_eq!(slot.key(), Some(&"a"));
        assert_eq!(slot.value(), Some(&1));
        assert_eq!(slot.hash(), 42);
    }

    #[test]
    fn replace_value_keeps_key_and_hash() {
        let mut slot = Slot::new();
        slot.assign("a", 1, 42);

        assert_eq!(slot.replace_value(2), Some(1));
        assert!(slot.is_set());
        assert_eq!(slot.key(), Some(&"a"));
        assert_eq!(slot.value(), Some(&2));
        assert_eq!(slot.hash(), 42);
    }

    #[test]
    fn unset_releases_key_and_value() {
        let mut slot = Slot::new();
        slot.assign("a", 1, 42);

        assert_eq!(slot.unset(), Some(1));
        assert!(!slot.is_set());
        assert_eq!(slot.key(), None);
        assert_eq!(slot.value(), None);
    }

    #[test]
    fn slot_is_reusable_after_unset() {
        let mut slot = Slot::new();
        slot.assign("a", 1, 42);
        slot.unset();
        slot.assign("b", 2, 7);

        assert!(slot.is_set());
        assert_eq!(slot.key(), Some(&"b"));
        assert_eq!(slot.hash(), 7);
    }

    #[test]
    fn matches_requires_set_hash_and_key() {
        let mut slot = Slot::new();
        assert!(!slot.matches(42, &"a"));

        slot.assign("a", 1, 42);
        assert!(slot.matches(42, &"a"));
        assert!(!slot.matches(41, &"a"));
        assert!(!slot.matches(42, &"b"));

        slot.unset();
        assert!(!slot.matches(42, &"a"));
    }

    #[test]
    fn snapshot_copies_contents() {
        let mut slot = Slot::new();
        assert!(slot.snapshot().is_none());

        slot.assign("a".to_string(), 1, 42);
        let entry = slot.snapshot().unwrap();

        // Reusing the slot must not disturb the snapshot.
        slot.unset();
        slot.assign("b".to_string(), 2, 7);

        assert_eq!(entry.key(), "a");
        assert_eq!(entry.value(), &1);
        assert_eq!(entry.hash(), 42);
        assert!(entry.is_set());
    }

    #[test]
    fn entry_into_pair() {
        let mut slot = Slot::new();
        slot.assign("a", 1, 42);
        let (key, value) = slot.snapshot().unwrap().into_pair();
        assert_eq!(key, "a");
        assert_eq!(value, 1);
    }

    #[test]
    fn unwrap_as_concrete_type_succeeds() {
        let mut slot = Slot::new();
        slot.assign(1u32, "one", 11);
        let entry = slot.snapshot().unwrap();

        let concrete = entry.unwrap_as::<CacheEntry<u32, &str>>().unwrap();
        assert_eq!(concrete.key(), &1);
    }

    #[test]
    fn unwrap_as_foreign_type_fails() {
        let mut slot = Slot::new();
        slot.assign(1u32, "one", 11);
        let entry = slot.snapshot().unwrap();

        let err = entry.unwrap_as::<Vec<u8>>().unwrap_err();
        assert!(err.message().contains("entry"));
    }
}
