//! Insertion-ordered, unique-keyed container backing `Fields` and `Values`.
//!
//! # Invariants
//! - Keys are unique; inserting an existing key replaces the entry in place.
//! - Iteration always follows first-insertion order.
//! - Removing the last live entry resets the container to its empty state.
//!
//! Entries live in a slot vector addressed through a key→slot index. Removal
//! leaves a tombstone; slots are compacted once tombstones outnumber live
//! entries, which keeps get/insert/remove at average O(1).

use std::collections::HashMap;

const COMPACT_MIN_SLOTS: usize = 16;

/// Item that exposes its own unique key.
pub trait Keyed {
    fn key(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct OrderedMap<T> {
    slots: Vec<Option<T>>,
    index: HashMap<String, usize>,
}

impl<T> Default for OrderedMap<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Keyed> OrderedMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        let slot = *self.index.get(key)?;
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        let slot = *self.index.get(key)?;
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Inserts `item` at the tail, or replaces the entry with the same key
    /// without moving it. Returns the replaced entry.
    pub fn insert(&mut self, item: T) -> Option<T> {
        if let Some(&slot) = self.index.get(item.key()) {
            if let Some(existing) = self.slots.get_mut(slot) {
                return existing.replace(item);
            }
        }

        self.index.insert(item.key().to_string(), self.slots.len());
        self.slots.push(Some(item));
        None
    }

    /// Removes the entry for `key`, keeping the order of the others.
    pub fn remove(&mut self, key: &str) -> Option<T> {
        let slot = self.index.remove(key)?;
        let removed = self.slots.get_mut(slot).and_then(Option::take);

        if self.index.is_empty() {
            self.slots.clear();
        } else if self.slots.len() >= COMPACT_MIN_SLOTS && self.tombstones() > self.index.len() {
            self.compact();
        }

        removed
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            slots: &self.slots,
            position: 0,
        }
    }

    fn tombstones(&self) -> usize {
        self.slots.len() - self.index.len()
    }

    fn compact(&mut self) {
        self.slots.retain(Option::is_some);
        for (position, item) in self.slots.iter().enumerate() {
            if let Some(item) = item {
                if let Some(slot) = self.index.get_mut(item.key()) {
                    *slot = position;
                }
            }
        }
    }
}

impl<T: Keyed + PartialEq> PartialEq for OrderedMap<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

/// Forward-only cursor over live entries in insertion order.
///
/// Exhaustion is final until [`Iter::reset`] rewinds it to the head.
#[derive(Debug, Clone)]
pub struct Iter<'a, T> {
    slots: &'a [Option<T>],
    position: usize,
}

impl<T> Iter<'_, T> {
    pub fn reset(&mut self) {
        self.position = 0;
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(slot) = self.slots.get(self.position) {
            self.position += 1;
            if let Some(item) = slot {
                return Some(item);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{Keyed, OrderedMap};

    #[derive(Debug, Clone, PartialEq)]
    struct Entry {
        key: String,
        payload: u32,
    }

    impl Keyed for Entry {
        fn key(&self) -> &str {
            &self.key
        }
    }

    fn entry(key: &str, payload: u32) -> Entry {
        Entry {
            key: key.to_string(),
            payload,
        }
    }

    fn keys(map: &OrderedMap<Entry>) -> Vec<&str> {
        map.iter().map(|item| item.key.as_str()).collect()
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut map = OrderedMap::new();
        map.insert(entry("a", 1));
        map.insert(entry("b", 2));
        map.insert(entry("c", 3));

        let replaced = map.insert(entry("b", 20));
        assert_eq!(replaced, Some(entry("b", 2)));
        assert_eq!(map.len(), 3);
        assert_eq!(keys(&map), vec!["a", "b", "c"]);
        assert_eq!(map.get("b").map(|item| item.payload), Some(20));
    }

    #[test]
    fn removing_sole_entry_resets_to_empty() {
        let mut map = OrderedMap::new();
        map.insert(entry("only", 1));
        assert_eq!(map.remove("only"), Some(entry("only", 1)));
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.iter().count(), 0);

        map.insert(entry("next", 2));
        assert_eq!(keys(&map), vec!["next"]);
    }

    #[test]
    fn removing_head_middle_and_tail_keeps_order() {
        let mut map = OrderedMap::new();
        for (i, key) in ["a", "b", "c", "d", "e"].into_iter().enumerate() {
            map.insert(entry(key, i as u32));
        }

        map.remove("a");
        map.remove("c");
        map.remove("e");
        assert_eq!(keys(&map), vec!["b", "d"]);
        assert!(map.get("c").is_none());
        assert!(map.remove("c").is_none());

        map.insert(entry("a", 9));
        assert_eq!(keys(&map), vec!["b", "d", "a"]);
    }

    #[test]
    fn compaction_preserves_lookups_and_order() {
        let mut map = OrderedMap::new();
        for i in 0..64u32 {
            map.insert(entry(&format!("k{i}"), i));
        }
        for i in (0..64u32).filter(|i| i % 4 != 0) {
            map.remove(&format!("k{i}"));
        }

        assert_eq!(map.len(), 16);
        let expected: Vec<String> = (0..64u32).step_by(4).map(|i| format!("k{i}")).collect();
        assert_eq!(
            map.iter().map(|item| item.key.clone()).collect::<Vec<_>>(),
            expected
        );
        for i in (0..64u32).step_by(4) {
            assert_eq!(map.get(&format!("k{i}")).map(|item| item.payload), Some(i));
        }
    }

    #[test]
    fn iterator_is_exhausted_until_reset() {
        let mut map = OrderedMap::new();
        map.insert(entry("a", 1));
        map.insert(entry("b", 2));

        let mut iter = map.iter();
        assert_eq!(iter.by_ref().count(), 2);
        assert!(iter.next().is_none());

        iter.reset();
        assert_eq!(iter.next().map(|item| item.payload), Some(1));
    }

    #[test]
    fn equality_is_order_sensitive() {
        let mut left = OrderedMap::new();
        left.insert(entry("a", 1));
        left.insert(entry("b", 2));

        let mut right = OrderedMap::new();
        right.insert(entry("b", 2));
        right.insert(entry("a", 1));

        assert_ne!(left, right);
        right.remove("b");
        right.insert(entry("b", 2));
        assert_eq!(left, right);
    }
}
