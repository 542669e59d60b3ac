//! Hash functions, the families that build them, and key comparers.
//!
//! A [`HashFunction`] maps a key to a bucket index for one fixed table size. The
//! size is baked in when the function is built, so a resize builds a new function
//! through the [`HashFamily`] instead of mutating the old one.

use std::hash::{BuildHasher, Hash};

use foldhash::fast::FixedState;

/// Mersenne prime `2^61 - 1` used as the modulus of [`UniversalFamily`].
const MERSENNE_61: u64 = (1 << 61) - 1;

/// Maps keys onto `[0, size)` for the size it was built with.
pub trait HashFunction<K: ?Sized> {
    /// Number of buckets this function distributes keys over.
    fn size(&self) -> usize;

    /// Bucket index for `key`, always smaller than [`size`](Self::size).
    fn index(&self, key: &K) -> usize;
}

/// Builds [`HashFunction`]s for a given table size.
pub trait HashFamily<K: ?Sized> {
    /// The function type produced by this family.
    type Function: HashFunction<K>;

    /// Builds a function distributing keys over `size` buckets.
    ///
    /// `size` must be non-zero; the map never asks for an empty table.
    fn build(&self, size: usize) -> Self::Function;
}

/// Equality used by buckets to decide whether two keys are the same entry.
///
/// Keys a comparer reports as equal must produce equal [`Hash`] output, the same
/// rule [`HashMap`](std::collections::HashMap) places on [`Eq`]. Agreeing with the
/// map's [`HashFamily`] alone is not enough: [`ProbeBucket`](crate::ProbeBucket)
/// addresses its slots with its own seeded hasher fed by `K: Hash`, so keys that
/// are equal but hash differently land in different probe windows and are both
/// stored.
///
/// To compare by a projection of the key, wrap the key in a type whose [`Hash`]
/// impl hashes that same projection.
pub trait KeyComparer<K: ?Sized> {
    /// Returns `true` if `a` and `b` denote the same key.
    fn same_key(&self, a: &K, b: &K) -> bool;
}

/// Comparer delegating to [`PartialEq`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EqComparer;

impl<K: PartialEq + ?Sized> KeyComparer<K> for EqComparer {
    #[inline]
    fn same_key(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

impl<K: ?Sized, F> KeyComparer<K> for F
where
    F: Fn(&K, &K) -> bool,
{
    #[inline]
    fn same_key(&self, a: &K, b: &K) -> bool {
        self(a, b)
    }
}

/// Deterministic family: `hash(key) % size`.
///
/// Rebuilding a function at the same size yields the same distribution, so a
/// manual same-size rehash never moves anything with this family.
#[derive(Debug, Clone, Default)]
pub struct ModuloFamily<S = FixedState> {
    /// Base hasher for keys
    state: S,
}

impl<S> ModuloFamily<S> {
    /// Creates a family hashing keys with `state`.
    pub const fn with_hasher(state: S) -> Self {
        Self { state }
    }
}

/// A function built by [`ModuloFamily`].
#[derive(Debug, Clone)]
pub struct ModuloHash<S> {
    /// Base hasher for keys
    state: S,
    /// Number of buckets
    size: usize,
}

#[allow(clippy::cast_possible_truncation)]
impl<K, S> HashFunction<K> for ModuloHash<S>
where
    K: Hash + ?Sized,
    S: BuildHasher,
{
    fn size(&self) -> usize {
        self.size
    }

    fn index(&self, key: &K) -> usize {
        // the remainder is smaller than `size`, so narrowing back is lossless
        self.state.hash_one(key).checked_rem(self.size as u64).unwrap_or(0) as usize
    }
}

impl<K, S> HashFamily<K> for ModuloFamily<S>
where
    K: Hash + ?Sized,
    S: BuildHasher + Clone,
{
    type Function = ModuloHash<S>;

    fn build(&self, size: usize) -> ModuloHash<S> {
        ModuloHash { state: self.state.clone(), size }
    }
}

/// Randomized family: `((a * hash(key) + b) mod p) mod size` with `p = 2^61 - 1`.
///
/// Every call to [`build`](HashFamily::build) draws fresh `a` and `b`, so two
/// functions of the same size usually distribute keys differently. This is the
/// map default and the reason a same-capacity rehash can improve the load factor.
#[derive(Debug, Clone, Default)]
pub struct UniversalFamily<S = FixedState> {
    /// Base hasher for keys
    state: S,
}

impl<S> UniversalFamily<S> {
    /// Creates a family hashing keys with `state` before the universal step.
    pub const fn with_hasher(state: S) -> Self {
        Self { state }
    }
}

/// A function built by [`UniversalFamily`].
#[derive(Debug, Clone)]
pub struct UniversalHash<S> {
    /// Base hasher for keys
    state: S,
    /// Multiplier in `[1, p)`
    a: u64,
    /// Offset in `[0, p)`
    b: u64,
    /// Number of buckets
    size: usize,
}

impl<S> UniversalHash<S> {
    /// Creates a function with explicit coefficients, reduced into range.
    pub fn with_coefficients(state: S, a: u64, b: u64, size: usize) -> Self {
        Self { state, a: a.wrapping_rem(MERSENNE_61).max(1), b: b.wrapping_rem(MERSENNE_61), size }
    }
}

#[allow(clippy::cast_possible_truncation)]
impl<K, S> HashFunction<K> for UniversalHash<S>
where
    K: Hash + ?Sized,
    S: BuildHasher,
{
    fn size(&self) -> usize {
        self.size
    }

    fn index(&self, key: &K) -> usize {
        // both coefficients and the reduced hash stay below 2^61, so the u128 math cannot overflow
        let h = u128::from(self.state.hash_one(key).wrapping_rem(MERSENNE_61));
        let mixed = u128::from(self.a)
            .wrapping_mul(h)
            .wrapping_add(u128::from(self.b))
            .wrapping_rem(u128::from(MERSENNE_61));
        mixed.checked_rem(self.size as u128).unwrap_or(0) as usize
    }
}

impl<K, S> HashFamily<K> for UniversalFamily<S>
where
    K: Hash + ?Sized,
    S: BuildHasher + Clone,
{
    type Function = UniversalHash<S>;

    fn build(&self, size: usize) -> UniversalHash<S> {
        UniversalHash::with_coefficients(self.state.clone(), rand::random(), rand::random(), size)
    }
}
