use std::{fmt, marker::PhantomData, mem};

use crate::{
    bucket::{Bucket, ChainBucket, ProbeBucket, bucket_index, empty_buckets},
    config::{DEFAULT_INITIAL_SIZE, DEFAULT_REHASH_POLICY, MapBuilder, is_valid_policy},
    hashing::{EqComparer, HashFamily, KeyComparer, UniversalFamily},
};

/// Load factor [`ChainingHashMap::rehash_default`] aims for.
pub const DEFAULT_REHASH_RATIO: f32 = 1.5;

/// Redistribution rounds [`ChainingHashMap::rehash_default`] may spend.
pub const DEFAULT_REHASH_TRIES: usize = 3;

/// A [`ChainingHashMap`] whose buckets are small open-addressed tables.
pub type ProbeHashMap<K, V, F = UniversalFamily, C = EqComparer> = ChainingHashMap<K, V, ProbeBucket<K, V>, F, C>;

/// A [`ChainingHashMap`] whose buckets are linked lists.
pub type ChainHashMap<K, V, F = UniversalFamily, C = EqComparer> = ChainingHashMap<K, V, ChainBucket<K, V>, F, C>;

/// A hash map resolving collisions inside pluggable buckets.
///
/// Keys are routed to one of `capacity()` buckets by a hash function built for the
/// current size. The bucket enforces uniqueness, the map keeps the element count
/// and the number of non-empty buckets. Once the element count exceeds
/// `capacity * rehash_policy`, the bucket array doubles and every entry is moved
/// into a freshly built array. The table never shrinks.
///
/// Note: This implementation is not thread-safe. Wrap it in a lock to share it.
pub struct ChainingHashMap<K, V, B = ProbeBucket<K, V>, F = UniversalFamily, C = EqComparer>
where
    F: HashFamily<K>,
{
    /// The bucket array
    buckets: Vec<B>,
    /// Builds a new hash function whenever the size changes
    family: F,
    /// Hash function for the current size
    hash: F::Function,
    /// Decides key equality inside buckets
    comparer: C,
    /// Number of stored entries
    elem_count: usize,
    /// Number of buckets holding at least one entry
    bucket_count: usize,
    /// Element count past which the table doubles
    next_rehash: usize,
    /// Entries-per-bucket ratio used to derive `next_rehash`
    rehash_policy: f32,
    /// Keys and items only live inside the buckets
    _marker: PhantomData<fn() -> (K, V)>,
}

/// Element count past which a table of `size` buckets grows.
///
/// An unusable policy falls back to [`DEFAULT_REHASH_POLICY`].
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn rehash_threshold(size: usize, policy: f32) -> usize {
    let policy = if is_valid_policy(policy) { policy } else { DEFAULT_REHASH_POLICY };
    (size as f32 * policy) as usize
}

impl<K, V, B, F, C> Default for ChainingHashMap<K, V, B, F, C>
where
    B: Bucket<K, V>,
    F: HashFamily<K> + Default,
    C: KeyComparer<K> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, B, F, C> Clone for ChainingHashMap<K, V, B, F, C>
where
    B: Clone,
    F: HashFamily<K> + Clone,
    F::Function: Clone,
    C: Clone,
{
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            family: self.family.clone(),
            hash: self.hash.clone(),
            comparer: self.comparer.clone(),
            elem_count: self.elem_count,
            bucket_count: self.bucket_count,
            next_rehash: self.next_rehash,
            rehash_policy: self.rehash_policy,
            _marker: PhantomData,
        }
    }
}

impl<K, V, B, F, C> fmt::Debug for ChainingHashMap<K, V, B, F, C>
where
    F: HashFamily<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainingHashMap")
            .field("len", &self.elem_count)
            .field("bucket_count", &self.bucket_count)
            .field("capacity", &self.buckets.len())
            .field("next_rehash", &self.next_rehash)
            .field("rehash_policy", &self.rehash_policy)
            .finish_non_exhaustive()
    }
}

impl<K, V, B, F, C> Extend<(K, V)> for ChainingHashMap<K, V, B, F, C>
where
    B: Bucket<K, V>,
    F: HashFamily<K>,
    C: KeyComparer<K>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, item) in iter {
            self.insert(key, item);
        }
    }
}

impl<K, V, B, F, C> FromIterator<(K, V)> for ChainingHashMap<K, V, B, F, C>
where
    B: Bucket<K, V>,
    F: HashFamily<K> + Default,
    C: KeyComparer<K> + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V, B, F, C> ChainingHashMap<K, V, B, F, C>
where
    B: Bucket<K, V>,
    F: HashFamily<K> + Default,
    C: KeyComparer<K> + Default,
{
    /// Creates a map with [`DEFAULT_INITIAL_SIZE`] buckets and the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_size(DEFAULT_INITIAL_SIZE)
    }

    /// Creates a map with `size` buckets (at least one) and the default policy.
    #[must_use]
    pub fn with_size(size: usize) -> Self {
        Self::from_parts(size, DEFAULT_REHASH_POLICY, F::default(), C::default())
    }

    /// Starts a [`MapBuilder`] with default parameters.
    #[must_use]
    pub fn builder() -> MapBuilder<K, V, B, F, C> {
        MapBuilder::new()
    }
}

impl<K, V, B, F, C> ChainingHashMap<K, V, B, F, C>
where
    B: Bucket<K, V>,
    F: HashFamily<K>,
    C: KeyComparer<K>,
{
    /// Assembles a map from already validated parameters.
    pub(crate) fn from_parts(size: usize, rehash_policy: f32, family: F, comparer: C) -> Self {
        let size = size.max(1);
        let hash = family.build(size);

        Self {
            buckets: empty_buckets::<K, V, B>(size),
            family,
            hash,
            comparer,
            elem_count: 0,
            bucket_count: 0,
            next_rehash: rehash_threshold(size, rehash_policy),
            rehash_policy,
            _marker: PhantomData,
        }
    }

    /// Bucket index of `key` under the current hash function
    fn index_of(&self, key: &K) -> usize {
        bucket_index(&self.hash, key, self.buckets.len())
    }

    /// Inserts `key` unless an equal key is already stored.
    ///
    /// Returns `false` and leaves the map unchanged on a duplicate. May double the
    /// bucket array and move every entry.
    pub fn insert(&mut self, key: K, item: V) -> bool {
        let index = self.index_of(&key);
        let Some(bucket) = self.buckets.get_mut(index) else {
            return false;
        };
        if !bucket.insert(key, item, &self.comparer) {
            return false;
        }

        if bucket.len() == 1 {
            self.bucket_count = self.bucket_count.saturating_add(1);
        }
        self.elem_count = self.elem_count.saturating_add(1);
        if self.elem_count > self.next_rehash {
            self.grow();
        }
        true
    }

    /// Inserts a key-item pair. See [`insert`](Self::insert).
    pub fn insert_pair(&mut self, (key, item): (K, V)) -> bool {
        self.insert(key, item)
    }

    /// Returns `true` if an equal key is stored.
    pub fn search(&self, key: &K) -> bool {
        self.buckets
            .get(self.index_of(key))
            .is_some_and(|bucket| bucket.search(key, &self.comparer))
    }

    /// Removes `key` and returns its item, or `None` if it was not stored.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let index = self.index_of(key);
        let bucket = self.buckets.get_mut(index)?;
        let item = bucket.remove(key, &self.comparer)?;

        if bucket.is_empty() {
            self.bucket_count = self.bucket_count.saturating_sub(1);
        }
        self.elem_count = self.elem_count.saturating_sub(1);
        Some(item)
    }

    /// Removes `key`, reporting whether it was stored.
    pub fn safe_remove(&mut self, key: &K) -> bool {
        let index = self.index_of(key);
        let Some(bucket) = self.buckets.get_mut(index) else {
            return false;
        };
        if !bucket.safe_remove(key, &self.comparer) {
            return false;
        }

        if bucket.is_empty() {
            self.bucket_count = self.bucket_count.saturating_sub(1);
        }
        self.elem_count = self.elem_count.saturating_sub(1);
        true
    }

    /// Looks `key` up for mutation.
    ///
    /// Follows the bucket strategy: a [`ProbeHashMap`] returns `None` for an absent
    /// key, while a [`ChainHashMap`] creates a default entry and always returns
    /// `Some`. A created entry is counted like an insert.
    pub fn get(&mut self, key: &K) -> Option<&mut V>
    where
        K: Clone,
        V: Default,
    {
        if B::VIVIFYING_GET {
            return Some(self.get_or_default(key.clone()));
        }

        let index = self.index_of(key);
        self.buckets.get_mut(index)?.get(key, &self.comparer)
    }

    /// Returns the item stored under `key`, inserting a default item first if the
    /// key is absent.
    ///
    /// This is the map's index-style accessor: reading a missing key creates it.
    #[allow(clippy::indexing_slicing)]
    pub fn get_or_default(&mut self, key: K) -> &mut V
    where
        K: Clone,
        V: Default,
    {
        if !self.search(&key) {
            self.insert(key.clone(), V::default());
        }

        // `index_of` always stays below the bucket count
        let index = self.index_of(&key);
        self.buckets[index].safe_get(&key, &self.comparer)
    }

    /// Redistributes the entries at the current capacity while the load factor is
    /// above `desired_ratio`, at most `max_tries` times.
    ///
    /// Capacity never changes. Returns whether the load factor ended up at or
    /// below `desired_ratio`. Only a hash family that varies between builds, such
    /// as [`UniversalFamily`], can improve the distribution this way.
    pub fn rehash(&mut self, desired_ratio: f32, max_tries: usize) -> bool {
        let mut tries: usize = 0;
        while self.load_factor() > desired_ratio && tries < max_tries {
            tries = tries.saturating_add(1);
            log::debug!(
                "rehashing {} buckets in place, load factor {} above {desired_ratio} (try {tries})",
                self.buckets.len(),
                self.load_factor()
            );
            self.redistribute(self.buckets.len());
        }

        self.load_factor() <= desired_ratio
    }

    /// [`rehash`](Self::rehash) with [`DEFAULT_REHASH_RATIO`] and
    /// [`DEFAULT_REHASH_TRIES`].
    pub fn rehash_default(&mut self) -> bool {
        self.rehash(DEFAULT_REHASH_RATIO, DEFAULT_REHASH_TRIES)
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elem_count
    }

    /// Returns `true` if the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elem_count == 0
    }

    /// Returns the number of buckets holding at least one entry.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// Returns the length of the bucket array.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the average number of entries per non-empty bucket.
    ///
    /// An empty map reports `0.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f32 {
        if self.bucket_count == 0 {
            return 0.0;
        }
        self.elem_count as f32 / self.bucket_count as f32
    }

    /// Returns the entries-per-bucket ratio that triggers growth.
    #[must_use]
    pub fn rehash_policy(&self) -> f32 {
        self.rehash_policy
    }

    /// Gives mutable access to the rehash policy.
    ///
    /// The new value is used the next time the table grows. A value that is not
    /// finite and positive is treated as [`DEFAULT_REHASH_POLICY`].
    pub fn rehash_policy_mut(&mut self) -> &mut f32 {
        &mut self.rehash_policy
    }

    /// Doubles the bucket array
    fn grow(&mut self) {
        let size = self.buckets.len().saturating_mul(2);
        self.next_rehash = rehash_threshold(size, self.rehash_policy);
        log::debug!("growing table to {size} buckets at {} entries", self.elem_count);
        self.redistribute(size);
    }

    /// Moves every entry into `size` new buckets addressed by a freshly built hash
    /// function
    fn redistribute(&mut self, size: usize) {
        self.hash = self.family.build(size);
        let old = mem::take(&mut self.buckets);
        let (buckets, used) = B::reorganize(old, size, &self.hash);
        self.buckets = buckets;
        self.bucket_count = used;
    }
}
