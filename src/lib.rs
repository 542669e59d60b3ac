//! # Chaining Hash Map
//!
//! A hash table that resolves collisions inside pluggable buckets.
//!
//! This crate provides one map, [`ChainingHashMap`], generic over how a bucket
//! stores its entries:
//!
//! - [`ProbeBucket`]: every bucket is a small open-addressed table of its own
//! - [`ChainBucket`]: every bucket is a singly linked list
//!
//! The map picks a bucket with a hash function built by a [`HashFamily`] for the
//! current table size, grows by doubling once the element count passes
//! `capacity * rehash_policy`, and can redistribute its entries at the same size
//! with [`ChainingHashMap::rehash`].
//!
//! ## Basic Usage
//!
//! ```rust
//! use chainhash::ProbeHashMap;
//!
//! // Create a new hash map
//! let mut map: ProbeHashMap<String, i32> = ProbeHashMap::new();
//!
//! // Insert values; a duplicate key is rejected
//! assert!(map.insert("apple".to_string(), 1));
//! assert!(map.insert("banana".to_string(), 2));
//! assert!(!map.insert("apple".to_string(), 10));
//!
//! // Retrieve values
//! assert_eq!(map.get(&"apple".to_string()).copied(), Some(1));
//!
//! // Update values in place
//! *map.get_or_default("apple".to_string()) += 10;
//! assert_eq!(map.get(&"apple".to_string()).copied(), Some(11));
//!
//! // Remove values
//! assert_eq!(map.remove(&"apple".to_string()), Some(11));
//! assert_eq!(map.get(&"apple".to_string()), None);
//! ```
//!
//! ## Linked-List Buckets
//!
//! A lookup on a chain-backed map creates a default entry for a missing key:
//!
//! ```rust
//! use chainhash::ChainHashMap;
//!
//! let mut words: ChainHashMap<&str, usize> = ChainHashMap::new();
//! for word in "the cat saw the dog".split(' ') {
//!     if let Some(count) = words.get(&word) {
//!         *count += 1;
//!     }
//! }
//!
//! assert_eq!(words.get(&"the").copied(), Some(2));
//! assert_eq!(words.len(), 4);
//! ```

/// Bucket strategies and their shared contract
pub mod bucket;
/// The bucketed hash map
mod chaining_map;
/// Construction parameters and their validation
mod config;
/// Hash functions, hash families and key comparers
pub mod hashing;

pub use bucket::{Bucket, ChainBucket, MAX_SLOTS, ProbeBucket};
pub use chaining_map::{ChainHashMap, ChainingHashMap, DEFAULT_REHASH_RATIO, DEFAULT_REHASH_TRIES, ProbeHashMap};
pub use config::{ConfigError, DEFAULT_INITIAL_SIZE, DEFAULT_REHASH_POLICY, MapBuilder};
pub use hashing::{
    EqComparer, HashFamily, HashFunction, KeyComparer, ModuloFamily, ModuloHash, UniversalFamily, UniversalHash,
};
