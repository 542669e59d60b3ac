//! Construction parameters for [`ChainingHashMap`].

use std::marker::PhantomData;

use crate::{
    bucket::Bucket,
    chaining_map::ChainingHashMap,
    hashing::{HashFamily, KeyComparer},
};

/// Bucket-array size used by [`ChainingHashMap::new`].
pub const DEFAULT_INITIAL_SIZE: usize = 8;

/// Ratio of entries to buckets that triggers growth by default.
pub const DEFAULT_REHASH_POLICY: f32 = 1.0;

/// Rejected construction parameters.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The bucket array must hold at least one bucket.
    #[error("initial size must be at least one bucket")]
    ZeroInitialSize,

    /// The rehash policy must be a finite ratio greater than zero.
    #[error("rehash policy must be a finite ratio greater than zero, got {0}")]
    InvalidRehashPolicy(f32),
}

/// Returns `true` for a usable rehash policy.
pub(crate) fn is_valid_policy(policy: f32) -> bool {
    policy.is_finite() && policy > 0.0
}

/// Builder for a [`ChainingHashMap`].
///
/// The bucket strategy is picked through the `B` type parameter, usually by
/// annotating the binding with [`ProbeHashMap`](crate::ProbeHashMap) or
/// [`ChainHashMap`](crate::ChainHashMap).
///
/// ```rust
/// use chainhash::{ChainHashMap, MapBuilder};
///
/// let map: ChainHashMap<u32, String> =
///     MapBuilder::new().initial_size(32).rehash_policy(0.75).build().unwrap();
/// assert_eq!(map.capacity(), 32);
/// ```
#[derive(Debug, Clone)]
pub struct MapBuilder<K, V, B, F, C> {
    /// Number of buckets allocated up front
    initial_size: usize,
    /// Entries-per-bucket ratio that triggers growth
    rehash_policy: f32,
    /// Builds the hash functions
    family: F,
    /// Decides key equality inside buckets
    comparer: C,
    /// Keys, items and bucket strategy are only fixed by the built map
    _marker: PhantomData<fn() -> (K, V, B)>,
}

impl<K, V, B, F, C> Default for MapBuilder<K, V, B, F, C>
where
    F: Default,
    C: Default,
{
    fn default() -> Self {
        Self::with_parts(F::default(), C::default())
    }
}

impl<K, V, B, F, C> MapBuilder<K, V, B, F, C>
where
    F: Default,
    C: Default,
{
    /// Creates a builder with the default size, policy, hash family and comparer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K, V, B, F, C> MapBuilder<K, V, B, F, C> {
    /// Creates a builder around an explicit hash family and comparer.
    ///
    /// Use this when either of them has no [`Default`], such as a closure comparer.
    /// The comparer must agree with `K: Hash`, see [`KeyComparer`].
    pub fn with_parts(family: F, comparer: C) -> Self {
        Self {
            initial_size: DEFAULT_INITIAL_SIZE,
            rehash_policy: DEFAULT_REHASH_POLICY,
            family,
            comparer,
            _marker: PhantomData,
        }
    }

    /// Sets the number of buckets allocated up front.
    #[must_use]
    pub fn initial_size(mut self, size: usize) -> Self {
        self.initial_size = size;
        self
    }

    /// Sets the entries-per-bucket ratio past which the table doubles.
    #[must_use]
    pub fn rehash_policy(mut self, policy: f32) -> Self {
        self.rehash_policy = policy;
        self
    }

    /// Replaces the hash family.
    #[must_use]
    pub fn hash_family(mut self, family: F) -> Self {
        self.family = family;
        self
    }

    /// Replaces the key comparer.
    ///
    /// Keys the comparer treats as equal must hash equally through `K: Hash`, not
    /// only through the hash family. See [`KeyComparer`].
    #[must_use]
    pub fn comparer(mut self, comparer: C) -> Self {
        self.comparer = comparer;
        self
    }
}

impl<K, V, B, F, C> MapBuilder<K, V, B, F, C>
where
    B: Bucket<K, V>,
    F: HashFamily<K>,
    C: KeyComparer<K>,
{
    /// Validates the parameters and builds the map.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroInitialSize`] for an empty bucket array and
    /// [`ConfigError::InvalidRehashPolicy`] for a policy that is not a finite,
    /// positive number.
    pub fn build(self) -> Result<ChainingHashMap<K, V, B, F, C>, ConfigError> {
        if self.initial_size == 0 {
            return Err(ConfigError::ZeroInitialSize);
        }
        if !is_valid_policy(self.rehash_policy) {
            return Err(ConfigError::InvalidRehashPolicy(self.rehash_policy));
        }

        Ok(ChainingHashMap::from_parts(self.initial_size, self.rehash_policy, self.family, self.comparer))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{ChainHashMap, ProbeHashMap};

    #[test]
    fn test_defaults() {
        let map: ProbeHashMap<u32, u32> = MapBuilder::new().build().unwrap();
        assert_eq!(map.capacity(), DEFAULT_INITIAL_SIZE);
        assert!((map.rehash_policy() - DEFAULT_REHASH_POLICY).abs() < f32::EPSILON);
    }

    #[test]
    fn test_custom_size_and_policy() {
        let map: ChainHashMap<u32, u32> = MapBuilder::new().initial_size(3).rehash_policy(2.5).build().unwrap();
        assert_eq!(map.capacity(), 3);
        assert!((map.rehash_policy() - 2.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let result: Result<ProbeHashMap<u32, u32>, _> = MapBuilder::new().initial_size(0).build();
        assert_eq!(result.err(), Some(ConfigError::ZeroInitialSize));
    }

    #[test]
    fn test_bad_policies_are_rejected() {
        for policy in [0.0, -1.0, f32::INFINITY] {
            let result: Result<ChainHashMap<u32, u32>, _> = MapBuilder::new().rehash_policy(policy).build();
            assert_eq!(result.err(), Some(ConfigError::InvalidRehashPolicy(policy)));
        }

        let result: Result<ChainHashMap<u32, u32>, _> = MapBuilder::new().rehash_policy(f32::NAN).build();
        assert!(matches!(result, Err(ConfigError::InvalidRehashPolicy(p)) if p.is_nan()));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(ConfigError::ZeroInitialSize.to_string(), "initial size must be at least one bucket");
        assert_eq!(
            ConfigError::InvalidRehashPolicy(-2.0).to_string(),
            "rehash policy must be a finite ratio greater than zero, got -2"
        );
    }
}
