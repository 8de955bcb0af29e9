//! N-way set-associative cache with pluggable per-set invalidation.
//!
//! A fixed geometry of `sets × ways` pre-allocated entry slots. Keys hash to
//! one set and never spill out of it: collisions beyond `ways` within a set
//! are resolved by eviction, keeping every operation bounded by the way
//! count regardless of total cache size.
//!
//! ## Architecture
//!
//! ```text
//!   ┌─────────────────────────────────────────────────────────────────┐
//!   │                 SetAssociativeCache<K, V, I>                    │
//!   │                                                                 │
//!   │   hash(key) ──► set = hash % sets      start = hash % ways     │
//!   │                                                                 │
//!   │   buckets:                                                      │
//!   │   ┌──────────────────────────────────────────────────────────┐  │
//!   │   │ Bucket 0   slots [s0][s1][s2][s3]   invalidator   len   │  │
//!   │   │ Bucket 1   slots [s0][s1][s2][s3]   invalidator   len   │  │
//!   │   │   …                                                      │  │
//!   │   └──────────────────────────────────────────────────────────┘  │
//!   │                                                                 │
//!   │   probe: walk slots from `start`, wrapping, each visited once   │
//!   └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Slots are allocated once at construction and reused for the cache's
//! lifetime; the hot path performs no allocation. Each set owns its own
//! [`Invalidator`]: the cache reports accesses and writes with `touch`,
//! removals with `remove`, and asks for a victim with `invalidate` when a
//! full set must take a new key.
//!
//! ## Operations
//!
//! | Operation        | Cost      | Touches invalidator |
//! |------------------|-----------|---------------------|
//! | `get`            | O(ways)   | yes                 |
//! | `insert`         | O(ways)   | yes                 |
//! | `remove`         | O(ways)   | yes (removal)       |
//! | `contains_key`   | O(ways)   | no                  |
//! | `contains_value` | O(total)  | no                  |
//! | `len` / `is_empty` | O(1)    | no                  |
//!
//! On an update, `touch` is issued both before and after the value is
//! replaced, so value-ordered policies see the new value immediately.
//!
//! ## Thread safety
//!
//! The core is single-mutator and carries no internal locking. For shared
//! use, [`ConcurrentSetAssociativeCache`] wraps it in a
//! `parking_lot::RwLock`.
//!
//! ## Example
//!
//! ```
//! use waycache::cache::SetAssociativeCache;
//! use waycache::policy::MruInvalidator;
//!
//! // 1 set, 2 ways, LRU by default
//! let mut cache = SetAssociativeCache::new(1, 2).unwrap();
//! cache.insert("Bob", 1).unwrap();
//! cache.insert("Steve", 2).unwrap();
//! cache.insert("Newer", 3).unwrap();
//!
//! // "Bob" was least recently used and got evicted.
//! assert!(!cache.contains_key(&"Bob"));
//! assert_eq!(cache.len(), 2);
//!
//! // Same geometry under MRU evicts the most recent instead.
//! let mut cache = SetAssociativeCache::with_invalidator(1, 2, MruInvalidator::new).unwrap();
//! cache.insert("Bob", 1).unwrap();
//! cache.insert("Steve", 2).unwrap();
//! cache.insert("Newer", 3).unwrap();
//! assert!(cache.contains_key(&"Bob"));
//! assert!(!cache.contains_key(&"Steve"));
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};

use parking_lot::RwLock;
use rustc_hash::{FxHashSet, FxHasher};

use crate::entry::{CacheEntry, Slot};
use crate::error::{ConfigError, InvalidationError};
use crate::policy::{Invalidator, LruInvalidator};

/// One set: a fixed run of slots, its invalidator, and a live-entry count.
struct Bucket<K, V, I> {
    slots: Box<[Slot<K, V>]>,
    invalidator: I,
    len: usize,
}

impl<K, V, I> Bucket<K, V, I>
where
    I: Invalidator<V>,
{
    fn new(ways: usize, invalidator: I) -> Self {
        Self {
            slots: (0..ways).map(|_| Slot::new()).collect(),
            invalidator,
            len: 0,
        }
    }

    /// Reports recent use of a set slot to the invalidator.
    fn touch(&mut self, slot: usize) {
        if let Some(value) = self.slots[slot].value() {
            self.invalidator.touch(slot, value);
        }
    }

    /// Drops a slot from the invalidator, unsets it, and returns its value.
    fn remove(&mut self, slot: usize) -> Option<V> {
        self.invalidator.remove(slot);
        let previous = self.slots[slot].unset();
        if previous.is_some() {
            self.len -= 1;
        }
        previous
    }

    /// Asks the invalidator for a victim and unsets it.
    ///
    /// Returns `false` if no victim was produced, or if the produced victim
    /// does not refer to a set slot (a broken invalidator contract either
    /// way).
    fn invalidate(&mut self) -> bool {
        let Some(victim) = self.invalidator.invalidate() else {
            return false;
        };
        match self.slots.get_mut(victim) {
            Some(slot) if slot.is_set() => {
                slot.unset();
                self.len -= 1;
                true
            }
            _ => false,
        }
    }
}

/// Fixed-capacity N-way set-associative cache.
///
/// Holds at most `sets × ways` live entries. Keys are hashed with
/// [`FxHasher`]; the hash picks both the set (`hash % sets`) and the probe
/// start within it (`hash % ways`). Each set evicts independently through
/// its own invalidator `I` (LRU by default).
///
/// # Example
///
/// ```
/// use waycache::cache::SetAssociativeCache;
///
/// let mut cache = SetAssociativeCache::new(10, 5).unwrap();
///
/// assert_eq!(cache.insert("key", 1).unwrap(), None);
/// assert_eq!(cache.insert("key", 2).unwrap(), Some(1));
/// assert_eq!(cache.get(&"key"), Some(&2));
/// assert_eq!(cache.remove(&"key"), Some(2));
/// assert!(cache.is_empty());
/// ```
pub struct SetAssociativeCache<K, V, I = LruInvalidator> {
    buckets: Vec<Bucket<K, V, I>>,
    sets: usize,
    ways: usize,
    len: usize,
}

impl<K, V> SetAssociativeCache<K, V, LruInvalidator>
where
    K: Hash + Eq,
{
    /// Creates a cache of `sets × ways` slots with LRU invalidation per set.
    ///
    /// Fails if `sets` or `ways` is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use waycache::cache::SetAssociativeCache;
    ///
    /// let cache: SetAssociativeCache<u64, String> =
    ///     SetAssociativeCache::new(16, 4).unwrap();
    /// assert_eq!(cache.capacity(), 64);
    ///
    /// assert!(SetAssociativeCache::<u64, String>::new(0, 4).is_err());
    /// ```
    pub fn new(sets: usize, ways: usize) -> Result<Self, ConfigError> {
        Self::with_invalidator(sets, ways, || LruInvalidator::with_capacity(ways))
    }
}

impl<K, V, I> SetAssociativeCache<K, V, I>
where
    K: Hash + Eq,
    I: Invalidator<V>,
{
    /// Creates a cache with a caller-supplied invalidation policy.
    ///
    /// The factory is invoked once per set, so every set gets an independent
    /// invalidator. Fails if `sets` or `ways` is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use waycache::cache::SetAssociativeCache;
    /// use waycache::policy::SmallestValueInvalidator;
    ///
    /// let mut cache =
    ///     SetAssociativeCache::with_invalidator(1, 3, SmallestValueInvalidator::new).unwrap();
    /// cache.insert("two", 2).unwrap();
    /// cache.insert("one", 1).unwrap();
    /// cache.insert("three", 3).unwrap();
    /// cache.insert("four", 4).unwrap();
    ///
    /// // "one" held the minimum value when the set overflowed.
    /// assert!(!cache.contains_key(&"one"));
    /// assert_eq!(cache.len(), 3);
    /// ```
    pub fn with_invalidator<F>(sets: usize, ways: usize, mut factory: F) -> Result<Self, ConfigError>
    where
        F: FnMut() -> I,
    {
        if sets == 0 || ways == 0 {
            return Err(ConfigError::new(
                "must configure at least one set, and one entry per set",
            ));
        }

        let buckets = (0..sets).map(|_| Bucket::new(ways, factory())).collect();

        Ok(Self {
            buckets,
            sets,
            ways,
            len: 0,
        })
    }

    /// Returns the number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the cache holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the total slot count, `sets × ways`.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.sets * self.ways
    }

    /// Returns the number of sets.
    #[inline]
    pub fn sets(&self) -> usize {
        self.sets
    }

    /// Returns the number of entries per set.
    #[inline]
    pub fn ways(&self) -> usize {
        self.ways
    }

    /// Retrieves a value by key, marking the entry as recently used.
    ///
    /// # Example
    ///
    /// ```
    /// use waycache::cache::SetAssociativeCache;
    ///
    /// let mut cache = SetAssociativeCache::new(4, 4).unwrap();
    /// cache.insert("key", 42).unwrap();
    ///
    /// assert_eq!(cache.get(&"key"), Some(&42));
    /// assert_eq!(cache.get(&"missing"), None);
    /// ```
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let hash = self.hash_key(key);
        let bucket_index = self.bucket_index(hash);
        let slot = self.probe(bucket_index, hash, key)?;

        let bucket = &mut self.buckets[bucket_index];
        bucket.touch(slot);
        bucket.slots[slot].value()
    }

    /// Returns `true` if the key is present.
    ///
    /// Unlike [`get`](Self::get), this never notifies the invalidator, so
    /// membership tests do not disturb eviction order.
    pub fn contains_key(&self, key: &K) -> bool {
        let hash = self.hash_key(key);
        let bucket_index = self.bucket_index(hash);
        self.probe(bucket_index, hash, key).is_some()
    }

    /// Returns `true` if any live entry holds a value equal to `value`.
    ///
    /// Scans every set slot; does not notify any invalidator.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.buckets
            .iter()
            .any(|bucket| bucket.slots.iter().any(|slot| slot.value() == Some(value)))
    }

    /// Inserts or updates a key, returning the previous value on update.
    ///
    /// If the key's set is full before probing, the set's invalidator first
    /// sheds one entry, also when the insert turns out to be an update. An
    /// invalidator that refuses to shed while slots are set breaks its
    /// contract and the insert fails with [`InvalidationError`], leaving the
    /// cache unchanged.
    ///
    /// On update, the invalidator is touched both before and after the value
    /// swap so value-ordered policies re-index against the new value.
    ///
    /// # Example
    ///
    /// ```
    /// use waycache::cache::SetAssociativeCache;
    ///
    /// let mut cache = SetAssociativeCache::new(1, 1).unwrap();
    /// assert_eq!(cache.insert("a", 1).unwrap(), None);
    ///
    /// // Single-slot cache: a new key evicts the previous entry.
    /// assert_eq!(cache.insert("b", 2).unwrap(), None);
    /// assert!(!cache.contains_key(&"a"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, InvalidationError> {
        let hash = self.hash_key(&key);
        let bucket_index = self.bucket_index(hash);
        let start = self.start_slot(hash);
        let ways = self.ways;

        if self.buckets[bucket_index].len == ways {
            if !self.buckets[bucket_index].invalidate() {
                return Err(InvalidationError::new(
                    "invalidator failed to shed an entry from a full set",
                ));
            }
            self.len -= 1;
        }

        let bucket = &mut self.buckets[bucket_index];
        let mut index = start;
        let mut last_unset = None;

        loop {
            if bucket.slots[index].matches(hash, &key) {
                bucket.touch(index);
                let previous = bucket.slots[index].replace_value(value);
                bucket.touch(index);
                return Ok(previous);
            }
            if !bucket.slots[index].is_set() {
                last_unset = Some(index);
            }

            index += 1;
            if index == ways {
                index = 0;
            }
            if index == start {
                break;
            }
        }

        // A successful invalidation above guarantees an unset slot.
        let Some(index) = last_unset else {
            return Err(InvalidationError::new(
                "no free slot in set after invalidation",
            ));
        };

        bucket.slots[index].assign(key, value, hash);
        bucket.touch(index);
        bucket.len += 1;
        self.len += 1;

        Ok(None)
    }

    /// Removes a key, returning its value if it was present.
    ///
    /// # Example
    ///
    /// ```
    /// use waycache::cache::SetAssociativeCache;
    ///
    /// let mut cache = SetAssociativeCache::new(4, 4).unwrap();
    /// cache.insert("key", 42).unwrap();
    ///
    /// assert_eq!(cache.remove(&"key"), Some(42));
    /// assert_eq!(cache.remove(&"key"), None);
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let hash = self.hash_key(key);
        let bucket_index = self.bucket_index(hash);
        let slot = self.probe(bucket_index, hash, key)?;

        self.len -= 1;
        self.buckets[bucket_index].remove(slot)
    }

    /// Unsets every slot and resets all invalidators.
    ///
    /// Slot storage is retained for reuse; only entry contents are released.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            for index in 0..bucket.slots.len() {
                if bucket.slots[index].is_set() {
                    bucket.invalidator.remove(index);
                    bucket.slots[index].unset();
                }
            }
            bucket.len = 0;
        }
        self.len = 0;
    }

    /// Iterates snapshots of all live entries, set by set.
    ///
    /// Each yielded [`CacheEntry`] is an owned copy: the underlying slot may
    /// be reused for a different key while the snapshot lives on.
    pub fn iter(&self) -> Iter<'_, K, V, I> {
        Iter {
            cache: self,
            bucket: 0,
            slot: 0,
        }
    }

    /// Collects the keys of all live entries.
    pub fn keys(&self) -> FxHashSet<K>
    where
        K: Clone,
    {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.slots.iter().filter_map(|slot| slot.key()))
            .cloned()
            .collect()
    }

    /// Collects the values of all live entries.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.slots.iter().filter_map(|slot| slot.value()))
            .cloned()
            .collect()
    }

    /// Collects snapshots of all live entries.
    pub fn entries(&self) -> Vec<CacheEntry<K, V>>
    where
        K: Clone,
        V: Clone,
    {
        self.iter().collect()
    }

    fn hash_key(&self, key: &K) -> u64 {
        let mut hasher = FxHasher::default();
        key.hash(&mut hasher);
        hasher.finish()
    }

    fn bucket_index(&self, hash: u64) -> usize {
        (hash % self.sets as u64) as usize
    }

    fn start_slot(&self, hash: u64) -> usize {
        (hash % self.ways as u64) as usize
    }

    /// Walks the set's slots from the hash's start position, wrapping once
    /// around, and returns the position matching `(hash, key)`.
    fn probe(&self, bucket_index: usize, hash: u64, key: &K) -> Option<usize> {
        let bucket = &self.buckets[bucket_index];
        let start = self.start_slot(hash);
        let mut index = start;

        loop {
            if bucket.slots[index].matches(hash, key) {
                return Some(index);
            }
            index += 1;
            if index == self.ways {
                index = 0;
            }
            if index == start {
                return None;
            }
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let mut total = 0usize;
        for (bucket_index, bucket) in self.buckets.iter().enumerate() {
            let set_count = bucket.slots.iter().filter(|slot| slot.is_set()).count();
            assert_eq!(bucket.len, set_count, "set {bucket_index} count drifted");
            assert!(bucket.len <= self.ways);
            total += set_count;

            for slot in bucket.slots.iter() {
                if let Some(key) = slot.key() {
                    let hash = self.hash_key(key);
                    assert_eq!(slot.hash(), hash, "cached hash is stale");
                    assert_eq!(
                        self.bucket_index(hash),
                        bucket_index,
                        "entry landed in the wrong set"
                    );
                }
            }
        }
        assert_eq!(self.len, total, "cache len disagrees with set slots");
    }
}

impl<K, V, I> fmt::Debug for SetAssociativeCache<K, V, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetAssociativeCache")
            .field("sets", &self.sets)
            .field("ways", &self.ways)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// Snapshot iterator over all live entries.
///
/// Walks sets in order and slots within each set, skipping unset slots.
pub struct Iter<'a, K, V, I> {
    cache: &'a SetAssociativeCache<K, V, I>,
    bucket: usize,
    slot: usize,
}

impl<K, V, I> Iterator for Iter<'_, K, V, I>
where
    K: Clone,
    V: Clone,
{
    type Item = CacheEntry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.bucket < self.cache.buckets.len() {
            let slots = &self.cache.buckets[self.bucket].slots;
            while self.slot < slots.len() {
                let index = self.slot;
                self.slot += 1;
                if let Some(entry) = slots[index].snapshot() {
                    return Some(entry);
                }
            }
            self.bucket += 1;
            self.slot = 0;
        }
        None
    }
}

impl<'a, K, V, I> IntoIterator for &'a SetAssociativeCache<K, V, I>
where
    K: Clone,
    V: Clone,
{
    type Item = CacheEntry<K, V>;
    type IntoIter = Iter<'a, K, V, I>;

    fn into_iter(self) -> Self::IntoIter {
        Iter {
            cache: self,
            bucket: 0,
            slot: 0,
        }
    }
}

/// Thread-safe wrapper around [`SetAssociativeCache`] using a
/// `parking_lot::RwLock`.
///
/// The core stays single-mutator; this wrapper serializes access for
/// callers that share the cache across threads. Reads that would move
/// eviction order (`get`) take the write lock; pure membership and size
/// queries take the read lock.
///
/// # Example
///
/// ```
/// use waycache::cache::ConcurrentSetAssociativeCache;
///
/// let cache = ConcurrentSetAssociativeCache::new(4, 4).unwrap();
/// cache.insert("key", 42).unwrap();
///
/// assert_eq!(cache.get_with(&"key", |v| *v), Some(42));
/// assert!(cache.contains_key(&"key"));
/// assert_eq!(cache.len(), 1);
/// ```
#[derive(Debug)]
pub struct ConcurrentSetAssociativeCache<K, V, I = LruInvalidator> {
    inner: RwLock<SetAssociativeCache<K, V, I>>,
}

impl<K, V> ConcurrentSetAssociativeCache<K, V, LruInvalidator>
where
    K: Hash + Eq,
{
    /// Creates a concurrent cache with LRU invalidation per set.
    pub fn new(sets: usize, ways: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            inner: RwLock::new(SetAssociativeCache::new(sets, ways)?),
        })
    }
}

impl<K, V, I> ConcurrentSetAssociativeCache<K, V, I>
where
    K: Hash + Eq,
    I: Invalidator<V>,
{
    /// Creates a concurrent cache with a caller-supplied invalidation policy.
    pub fn with_invalidator<F>(sets: usize, ways: usize, factory: F) -> Result<Self, ConfigError>
    where
        F: FnMut() -> I,
    {
        Ok(Self {
            inner: RwLock::new(SetAssociativeCache::with_invalidator(sets, ways, factory)?),
        })
    }

    /// Runs `f` on the value for `key`, marking the entry as recently used.
    pub fn get_with<R>(&self, key: &K, f: impl FnOnce(&V) -> R) -> Option<R> {
        let mut cache = self.inner.write();
        cache.get(key).map(f)
    }

    /// Inserts or updates a key, returning the previous value on update.
    pub fn insert(&self, key: K, value: V) -> Result<Option<V>, InvalidationError> {
        let mut cache = self.inner.write();
        cache.insert(key, value)
    }

    /// Removes a key, returning its value if it was present.
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut cache = self.inner.write();
        cache.remove(key)
    }

    /// Returns `true` if the key is present; eviction order is untouched.
    pub fn contains_key(&self, key: &K) -> bool {
        let cache = self.inner.read();
        cache.contains_key(key)
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        let cache = self.inner.read();
        cache.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        let cache = self.inner.read();
        cache.is_empty()
    }

    /// Returns the total slot count, `sets × ways`.
    pub fn capacity(&self) -> usize {
        let cache = self.inner.read();
        cache.capacity()
    }

    /// Unsets every slot and resets all invalidators.
    pub fn clear(&self) {
        let mut cache = self.inner.write();
        cache.clear();
    }

    /// Collects snapshots of all live entries.
    pub fn entries(&self) -> Vec<CacheEntry<K, V>>
    where
        K: Clone,
        V: Clone,
    {
        let cache = self.inner.read();
        cache.entries()
    }
}
