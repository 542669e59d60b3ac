//! Bucket strategies used by [`ChainingHashMap`](crate::ChainingHashMap).
//!
//! Every bucket is a small container of its own that enforces key uniqueness
//! locally. The map only routes a key to a bucket and keeps aggregate counters.

/// Linked-list bucket
mod chain;
/// Open-addressed bucket
mod probe;

pub use chain::ChainBucket;
pub use probe::{MAX_SLOTS, ProbeBucket};

use crate::hashing::{HashFunction, KeyComparer};

/// Contract shared by all bucket strategies.
///
/// Keys are compared through the [`KeyComparer`] handed in by the owning map, so
/// a bucket never carries comparison state of its own.
pub trait Bucket<K, V>: Default {
    /// Whether [`get`](Self::get) creates a default entry for an absent key.
    ///
    /// The map relies on this to keep its counters right when a lookup grows a
    /// bucket.
    const VIVIFYING_GET: bool;

    /// Inserts `key` unless an equal key is already stored.
    ///
    /// Returns `false` and leaves the bucket untouched on a duplicate.
    fn insert<C: KeyComparer<K>>(&mut self, key: K, item: V, cmp: &C) -> bool;

    /// Number of live entries.
    fn len(&self) -> usize;

    /// Returns `true` if the bucket holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if an equal key is stored.
    fn search<C: KeyComparer<K>>(&self, key: &K, cmp: &C) -> bool;

    /// Looks `key` up for mutation.
    ///
    /// Strategies with [`VIVIFYING_GET`](Self::VIVIFYING_GET) set create a default
    /// entry instead of returning `None`.
    fn get<C: KeyComparer<K>>(&mut self, key: &K, cmp: &C) -> Option<&mut V>
    where
        K: Clone,
        V: Default;

    /// Returns the item stored under `key`, creating a default one if absent.
    fn safe_get<C: KeyComparer<K>>(&mut self, key: &K, cmp: &C) -> &mut V
    where
        K: Clone,
        V: Default;

    /// Removes `key` and returns its item, or `None` if it was not stored.
    fn remove<C: KeyComparer<K>>(&mut self, key: &K, cmp: &C) -> Option<V>;

    /// Removes `key`, reporting whether anything was removed.
    fn safe_remove<C: KeyComparer<K>>(&mut self, key: &K, cmp: &C) -> bool {
        self.remove(key, cmp).is_some()
    }

    /// Redistributes every entry of `old` into `new_size` fresh buckets addressed
    /// by `hash`.
    ///
    /// Returns the new buckets and how many of them are non-empty. `old` is fully
    /// drained; no entry is cloned.
    fn reorganize<H: HashFunction<K>>(old: Vec<Self>, new_size: usize, hash: &H) -> (Vec<Self>, usize);
}

/// Allocates `size` empty buckets.
pub(crate) fn empty_buckets<K, V, B: Bucket<K, V>>(size: usize) -> Vec<B> {
    std::iter::repeat_with(B::default).take(size).collect()
}

/// Bucket index of `key` in an array of `len` buckets.
///
/// Wraps the function result so a misbehaving [`HashFunction`] cannot address past
/// the end of the array. An empty array maps everything to zero.
pub(crate) fn bucket_index<K, H: HashFunction<K>>(hash: &H, key: &K, len: usize) -> usize {
    hash.index(key).checked_rem(len).unwrap_or(0)
}
