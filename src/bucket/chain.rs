use std::fmt;

use super::{Bucket, bucket_index, empty_buckets};
use crate::hashing::{HashFunction, KeyComparer};

/// Owning link to the next node
type Link<K, V> = Option<Box<Node<K, V>>>;

/// A list node holding one entry
#[derive(Debug)]
struct Node<K, V> {
    /// The entry key
    key: K,
    /// The entry item
    item: V,
    /// The rest of the list
    next: Link<K, V>,
}

/// A bucket backed by a singly linked list.
///
/// `head` is the link held by the sentinel: it is never removed and never holds
/// an entry itself. New entries are always linked right behind it, so the list is
/// ordered most recent first.
///
/// Both [`get`](Bucket::get) and [`safe_get`](Bucket::safe_get) create a default
/// entry for an absent key.
pub struct ChainBucket<K, V> {
    /// Sentinel link to the first node
    head: Link<K, V>,
    /// Number of nodes in the list
    len: usize,
}

impl<K, V> Default for ChainBucket<K, V> {
    fn default() -> Self {
        Self { head: None, len: 0 }
    }
}

impl<K, V> Drop for ChainBucket<K, V> {
    fn drop(&mut self) {
        // unlink iteratively so long chains do not recurse through `Box` drops
        let mut link = self.head.take();
        while let Some(mut node) = link {
            link = node.next.take();
        }
    }
}

impl<K: Clone, V: Clone> Clone for ChainBucket<K, V> {
    fn clone(&self) -> Self {
        let mut entries: Vec<(&K, &V)> = self.iter().collect();
        let mut copy = Self::default();
        // attaching to the front reverses, so walk the snapshot backwards
        while let Some((key, item)) = entries.pop() {
            copy.attach_first(Box::new(Node { key: key.clone(), item: item.clone(), next: None }));
        }
        copy
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ChainBucket<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> ChainBucket<K, V> {
    /// Iterates over the entries, most recently inserted first.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        let mut link = self.head.as_deref();
        std::iter::from_fn(move || {
            let node = link?;
            link = node.next.as_deref();
            Some((&node.key, &node.item))
        })
    }

    /// Links `node` directly behind the sentinel.
    fn attach_first(&mut self, mut node: Box<Node<K, V>>) {
        node.next = self.head.take();
        self.head = Some(node);
        self.len = self.len.saturating_add(1);
    }

    /// Unlinks the node directly behind the sentinel.
    fn detach_first(&mut self) -> Option<Box<Node<K, V>>> {
        let mut node = self.head.take()?;
        self.head = node.next.take();
        self.len = self.len.saturating_sub(1);
        Some(node)
    }
}

/// Walks from `link` to the link holding `key`, or to the empty tail link.
fn link_of<'a, K, V, C: KeyComparer<K>>(mut link: &'a mut Link<K, V>, key: &K, cmp: &C) -> &'a mut Link<K, V> {
    while link.as_ref().is_some_and(|node| !cmp.same_key(&node.key, key)) {
        if let Some(node) = link {
            link = &mut node.next;
        }
    }
    link
}

impl<K, V> Bucket<K, V> for ChainBucket<K, V> {
    const VIVIFYING_GET: bool = true;

    fn insert<C: KeyComparer<K>>(&mut self, key: K, item: V, cmp: &C) -> bool {
        if self.search(&key, cmp) {
            return false;
        }

        self.attach_first(Box::new(Node { key, item, next: None }));
        true
    }

    fn len(&self) -> usize {
        self.len
    }

    fn search<C: KeyComparer<K>>(&self, key: &K, cmp: &C) -> bool {
        self.iter().any(|(stored, _)| cmp.same_key(stored, key))
    }

    fn get<C: KeyComparer<K>>(&mut self, key: &K, cmp: &C) -> Option<&mut V>
    where
        K: Clone,
        V: Default,
    {
        Some(self.safe_get(key, cmp))
    }

    fn safe_get<C: KeyComparer<K>>(&mut self, key: &K, cmp: &C) -> &mut V
    where
        K: Clone,
        V: Default,
    {
        let present = self.search(key, cmp);
        let Self { head, len } = self;
        // an absent key is linked directly behind the sentinel
        let link = if present { link_of(head, key, cmp) } else { head };

        let hit = matches!(&*link, Some(node) if cmp.same_key(&node.key, key));
        match (hit, link) {
            (true, Some(node)) => &mut node.item,
            (_, link) => {
                *len = len.saturating_add(1);
                let next = link.take();
                &mut link.insert(Box::new(Node { key: key.clone(), item: V::default(), next })).item
            }
        }
    }

    fn remove<C: KeyComparer<K>>(&mut self, key: &K, cmp: &C) -> Option<V> {
        let link = link_of(&mut self.head, key, cmp);
        let mut node = link.take()?;
        *link = node.next.take();
        self.len = self.len.saturating_sub(1);
        Some(node.item)
    }

    fn reorganize<H: HashFunction<K>>(old: Vec<Self>, new_size: usize, hash: &H) -> (Vec<Self>, usize) {
        let new_size = new_size.max(1);
        let mut buckets: Vec<Self> = empty_buckets::<K, V, Self>(new_size);
        let mut used: usize = 0;

        for mut bucket in old {
            while let Some(node) = bucket.detach_first() {
                let index = bucket_index(hash, &node.key, new_size);
                if let Some(target) = buckets.get_mut(index) {
                    target.attach_first(node);
                    if target.len == 1 {
                        used = used.saturating_add(1);
                    }
                }
            }
        }

        (buckets, used)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use foldhash::fast::FixedState;

    use crate::hashing::{EqComparer, HashFamily, ModuloFamily};

    #[test]
    fn test_insert_and_search() {
        let mut bucket = ChainBucket::default();
        assert!(bucket.insert("key1".to_string(), 1, &EqComparer));
        assert!(bucket.insert("key2".to_string(), 2, &EqComparer));

        assert!(bucket.search(&"key1".to_string(), &EqComparer));
        assert!(bucket.search(&"key2".to_string(), &EqComparer));
        assert!(!bucket.search(&"key3".to_string(), &EqComparer));
        assert_eq!(bucket.len(), 2);
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let mut bucket = ChainBucket::default();
        assert!(bucket.insert(1, "a", &EqComparer));
        assert!(!bucket.insert(1, "b", &EqComparer));

        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket.get(&1, &EqComparer), Some(&mut "a"));
    }

    #[test]
    fn test_newest_entry_comes_first() {
        let mut bucket = ChainBucket::default();
        for i in 0..4 {
            bucket.insert(i, i * 10, &EqComparer);
        }

        let keys: Vec<i32> = bucket.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_get_creates_missing_entry() {
        let mut bucket: ChainBucket<i32, String> = ChainBucket::default();
        assert!(!bucket.search(&7, &EqComparer));

        let item = bucket.get(&7, &EqComparer).unwrap();
        assert!(item.is_empty());
        item.push_str("seven");

        assert!(bucket.search(&7, &EqComparer));
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket.safe_get(&7, &EqComparer).as_str(), "seven");
    }

    #[test]
    fn test_safe_get_existing_and_missing() {
        let mut bucket = ChainBucket::default();
        bucket.insert(1, 10, &EqComparer);
        bucket.insert(2, 20, &EqComparer);

        *bucket.safe_get(&1, &EqComparer) += 1;
        assert_eq!(*bucket.safe_get(&1, &EqComparer), 11);
        assert_eq!(*bucket.safe_get(&3, &EqComparer), 0);
        assert_eq!(bucket.len(), 3);
        assert_eq!(bucket.iter().next(), Some((&3, &0)));
    }

    #[test]
    fn test_safe_get_keeps_len_in_step_with_nodes() {
        let mut bucket = ChainBucket::default();
        for i in 0..6 {
            bucket.insert(i, i * 10, &EqComparer);
        }

        for key in [3, 0, 5, 7, 3, 8, 7] {
            *bucket.safe_get(&key, &EqComparer) += 1;
            assert_eq!(bucket.len(), bucket.iter().count());
        }

        assert_eq!(bucket.len(), 8);
        assert_eq!(*bucket.safe_get(&3, &EqComparer), 32);
        assert_eq!(*bucket.safe_get(&0, &EqComparer), 1);
        assert_eq!(*bucket.safe_get(&7, &EqComparer), 2);
        let keys: Vec<i32> = bucket.iter().map(|(k, _)| *k).take(2).collect();
        assert_eq!(keys, vec![8, 7]);
    }

    #[test]
    fn test_remove() {
        let mut bucket = ChainBucket::default();
        for i in 0..5 {
            bucket.insert(i, i, &EqComparer);
        }

        assert_eq!(bucket.remove(&0, &EqComparer), Some(0));
        assert_eq!(bucket.remove(&4, &EqComparer), Some(4));
        assert_eq!(bucket.remove(&2, &EqComparer), Some(2));
        assert_eq!(bucket.remove(&2, &EqComparer), None);
        assert!(!bucket.safe_remove(&9, &EqComparer));
        assert!(bucket.safe_remove(&1, &EqComparer));

        assert_eq!(bucket.len(), 1);
        assert!(bucket.search(&3, &EqComparer));
    }

    #[test]
    fn test_custom_comparer() {
        let cmp = |a: &String, b: &String| a.eq_ignore_ascii_case(b);
        let mut bucket = ChainBucket::default();
        assert!(bucket.insert("Apple".to_string(), 1, &cmp));
        assert!(!bucket.insert("APPLE".to_string(), 2, &cmp));
        assert!(bucket.search(&"apple".to_string(), &cmp));
    }

    #[test]
    fn test_reorganize_moves_every_node() {
        let mut old: Vec<ChainBucket<u32, u32>> = empty_buckets::<u32, u32, ChainBucket<u32, u32>>(2);
        for key in 0..40_u32 {
            let index = usize::try_from(key % 2).unwrap();
            old[index].insert(key, key * 2, &EqComparer);
        }

        let hash = HashFamily::<u32>::build(&ModuloFamily::<FixedState>::default(), 8);
        let (buckets, used) = ChainBucket::reorganize(old, 8, &hash);

        assert_eq!(buckets.len(), 8);
        assert_eq!(used, buckets.iter().filter(|b| !b.is_empty()).count());
        assert_eq!(buckets.iter().map(Bucket::len).sum::<usize>(), 40);
        for key in 0..40_u32 {
            let bucket = &buckets[hash.index(&key)];
            assert!(bucket.search(&key, &EqComparer));
            assert_eq!(bucket.iter().find(|(k, _)| **k == key).map(|(_, v)| *v), Some(key * 2));
        }
    }

    #[test]
    fn test_clone_preserves_order() {
        let mut bucket = ChainBucket::default();
        for i in 0..5 {
            bucket.insert(i, i.to_string(), &EqComparer);
        }

        let copy = bucket.clone();
        assert_eq!(copy.len(), 5);
        assert!(copy.iter().eq(bucket.iter()));
    }

    #[test]
    fn test_long_chain_drops() {
        let mut bucket = ChainBucket::default();
        for i in 0..200_000_u32 {
            bucket.attach_first(Box::new(Node { key: i, item: (), next: None }));
        }
        assert_eq!(bucket.len(), 200_000);
        drop(bucket);
    }
}
