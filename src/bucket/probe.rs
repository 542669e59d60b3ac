use std::{
    hash::{BuildHasher, Hash},
    mem,
};

use foldhash::fast::FixedState;

use super::{Bucket, bucket_index, empty_buckets};
use crate::hashing::{HashFunction, KeyComparer};

/// Slot count of a fresh bucket
const INITIAL_SLOTS: usize = 4;
/// Factor applied to the slot count on every growth step
const GROWTH_FACTOR: usize = 2;
/// Entry count that triggers the first growth step
const FIRST_GROWTH_THRESHOLD: usize = 2;
/// Number of consecutive slots an entry may occupy starting from its home slot
const PROBE_WINDOW: usize = 8;
/// Same-size rebuilds attempted before an entry spills into the overflow list
const REBUILD_ATTEMPTS: usize = 3;

/// Upper bound on the slot count of a single [`ProbeBucket`].
///
/// Growth steps past this size are skipped.
pub const MAX_SLOTS: usize = 1 << 12;

/// A stored key-item pair
#[derive(Debug, Clone)]
struct Entry<K, V> {
    /// The entry key
    key: K,
    /// The entry item
    item: V,
}

/// Where an entry lives inside a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    /// Index into the slot array
    Slot(usize),
    /// Index into the overflow list
    Overflow(usize),
}

/// A bucket implemented as its own small open-addressing table.
///
/// Each entry lives within a window of [`PROBE_WINDOW`] slots starting at its home
/// slot. Removal clears the slot outright (there are no tombstones), which is why
/// lookups always scan the whole window instead of stopping at the first hole.
///
/// The slot array doubles every time the entry count reaches a threshold that
/// starts at 2 and moves up by one per growth step, until [`MAX_SLOTS`] is reached.
/// When an entry finds its window full, the array is rebuilt at the same size with
/// a fresh seed a few times; if the window is still full the entry is kept in a
/// linear overflow list instead of retrying forever.
#[derive(Debug, Clone)]
pub struct ProbeBucket<K, V> {
    /// Slot array; `None` marks a free slot
    slots: Vec<Option<Entry<K, V>>>,
    /// Entries whose probe window was saturated
    overflow: Vec<Entry<K, V>>,
    /// Number of live entries across slots and overflow
    len: usize,
    /// Entry count at which the slot array grows next
    next_growth: usize,
    /// Seeded hasher addressing the slot array
    state: FixedState,
}

impl<K, V> Default for ProbeBucket<K, V> {
    fn default() -> Self {
        Self {
            slots: vacant_slots(INITIAL_SLOTS),
            overflow: Vec::new(),
            len: 0,
            next_growth: FIRST_GROWTH_THRESHOLD,
            state: FixedState::with_seed(rand::random()),
        }
    }
}

/// Allocates `capacity` free slots.
fn vacant_slots<K, V>(capacity: usize) -> Vec<Option<Entry<K, V>>> {
    std::iter::repeat_with(|| None).take(capacity).collect()
}

impl<K, V> ProbeBucket<K, V> {
    /// Number of slots in the open-addressed array.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of entries held in the overflow list.
    #[must_use]
    pub fn overflow_len(&self) -> usize {
        self.overflow.len()
    }

    /// Iterates over the stored entries in slot order, overflow last.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.slots
            .iter()
            .flatten()
            .chain(self.overflow.iter())
            .map(|entry| (&entry.key, &entry.item))
    }

    /// Moves every entry out of the bucket.
    fn into_entries(self) -> impl Iterator<Item = Entry<K, V>> {
        self.slots.into_iter().flatten().chain(self.overflow)
    }

    /// Returns a mutable reference to the entry at `location`.
    fn entry_mut(&mut self, location: Location) -> Option<&mut Entry<K, V>> {
        match location {
            Location::Slot(index) => self.slots.get_mut(index)?.as_mut(),
            Location::Overflow(index) => self.overflow.get_mut(index),
        }
    }
}

impl<K: Hash, V> ProbeBucket<K, V> {
    /// Slot indices `key` may occupy, home slot first.
    #[allow(clippy::cast_possible_truncation)]
    fn window(&self, key: &K) -> impl Iterator<Item = usize> {
        let mask = self.slots.len().saturating_sub(1);
        let home = (self.state.hash_one(key) as usize) & mask;
        (0..PROBE_WINDOW.min(self.slots.len())).map(move |step| home.wrapping_add(step) & mask)
    }

    /// Finds the stored entry equal to `key`.
    fn locate<C: KeyComparer<K>>(&self, key: &K, cmp: &C) -> Option<Location> {
        self.window(key)
            .find(|&index| {
                matches!(self.slots.get(index), Some(Some(entry)) if cmp.same_key(&entry.key, key))
            })
            .map(Location::Slot)
            .or_else(|| {
                self.overflow
                    .iter()
                    .position(|entry| cmp.same_key(&entry.key, key))
                    .map(Location::Overflow)
            })
    }

    /// First free slot in the window of `key`.
    fn free_slot(&self, key: &K) -> Option<usize> {
        self.window(key).find(|&index| matches!(self.slots.get(index), Some(None)))
    }

    /// Puts `entry` into a free slot of its window, or into the overflow list.
    fn settle(&mut self, entry: Entry<K, V>) -> Location {
        if let Some(index) = self.free_slot(&entry.key) {
            if let Some(slot) = self.slots.get_mut(index) {
                *slot = Some(entry);
                return Location::Slot(index);
            }
        }
        self.overflow.push(entry);
        Location::Overflow(self.overflow.len().saturating_sub(1))
    }

    /// Re-places every entry into a fresh array of `capacity` slots addressed by
    /// `state`.
    fn rebuild(&mut self, capacity: usize, state: FixedState) {
        let slots = mem::replace(&mut self.slots, vacant_slots(capacity));
        let overflow = mem::take(&mut self.overflow);
        self.state = state;

        for entry in slots.into_iter().flatten().chain(overflow) {
            self.settle(entry);
        }
    }

    /// Places `entry`, rebuilding at the same size with fresh seeds while its
    /// window is saturated.
    ///
    /// A bucket that already spilled skips the rebuilds: its overflow entries share
    /// a window that fresh seeds could not clear before.
    fn place(&mut self, entry: Entry<K, V>) -> Location {
        let first_spill = self.overflow.is_empty();
        let rebuilds = if first_spill { REBUILD_ATTEMPTS } else { 0 };

        let mut attempts: usize = 0;
        while attempts < rebuilds && self.free_slot(&entry.key).is_none() {
            attempts = attempts.saturating_add(1);
            log::trace!("probe window saturated, rebuilding {} slots (attempt {attempts})", self.slots.len());
            self.rebuild(self.slots.len(), FixedState::with_seed(rand::random()));
        }

        let location = self.settle(entry);
        if matches!(location, Location::Overflow(_)) {
            if first_spill {
                log::warn!("probe window still saturated after {REBUILD_ATTEMPTS} rebuilds, spilling into overflow");
            } else {
                log::trace!("probe window saturated, {} entries in overflow", self.overflow.len());
            }
        }
        location
    }

    /// Adds an entry whose key is known to be absent.
    fn insert_unique(&mut self, key: K, item: V) -> Location {
        self.len = self.len.saturating_add(1);
        if self.len == self.next_growth {
            self.next_growth = self.next_growth.saturating_add(1);
            let grown = self.slots.len().saturating_mul(GROWTH_FACTOR);
            if grown <= MAX_SLOTS {
                log::trace!("growing probe bucket to {grown} slots at {} entries", self.len);
                self.rebuild(grown, self.state.clone());
            }
        }

        self.place(Entry { key, item })
    }
}

impl<K: Hash, V> Bucket<K, V> for ProbeBucket<K, V> {
    const VIVIFYING_GET: bool = false;

    fn insert<C: KeyComparer<K>>(&mut self, key: K, item: V, cmp: &C) -> bool {
        if self.search(&key, cmp) {
            return false;
        }

        self.insert_unique(key, item);
        true
    }

    fn len(&self) -> usize {
        self.len
    }

    fn search<C: KeyComparer<K>>(&self, key: &K, cmp: &C) -> bool {
        self.locate(key, cmp).is_some()
    }

    fn get<C: KeyComparer<K>>(&mut self, key: &K, cmp: &C) -> Option<&mut V>
    where
        K: Clone,
        V: Default,
    {
        let location = self.locate(key, cmp)?;
        self.entry_mut(location).map(|entry| &mut entry.item)
    }

    #[allow(clippy::indexing_slicing)]
    fn safe_get<C: KeyComparer<K>>(&mut self, key: &K, cmp: &C) -> &mut V
    where
        K: Clone,
        V: Default,
    {
        let location = match self.locate(key, cmp) {
            Some(location) => location,
            None => self.insert_unique(key.clone(), V::default()),
        };

        // `location` was just produced by `locate` or `settle`, so it is in bounds
        // and the slot lies in the window of `key`
        match location {
            Location::Slot(index) => match self.slots[index] {
                Some(ref mut entry) => &mut entry.item,
                ref mut vacant => {
                    self.len = self.len.saturating_add(1);
                    &mut vacant.insert(Entry { key: key.clone(), item: V::default() }).item
                }
            },
            Location::Overflow(index) => &mut self.overflow[index].item,
        }
    }

    fn remove<C: KeyComparer<K>>(&mut self, key: &K, cmp: &C) -> Option<V> {
        let entry = match self.locate(key, cmp)? {
            Location::Slot(index) => self.slots.get_mut(index)?.take()?,
            Location::Overflow(index) => self.overflow.swap_remove(index),
        };
        self.len = self.len.saturating_sub(1);
        Some(entry.item)
    }

    fn reorganize<H: HashFunction<K>>(old: Vec<Self>, new_size: usize, hash: &H) -> (Vec<Self>, usize) {
        let new_size = new_size.max(1);
        let mut buckets: Vec<Self> = empty_buckets::<K, V, Self>(new_size);
        let mut used: usize = 0;

        for entry in old.into_iter().flat_map(Self::into_entries) {
            let index = bucket_index(hash, &entry.key, new_size);
            if let Some(target) = buckets.get_mut(index) {
                target.insert_unique(entry.key, entry.item);
                if target.len == 1 {
                    used = used.saturating_add(1);
                }
            }
        }

        (buckets, used)
    }
}
