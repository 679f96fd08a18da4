//! LRU (Least Recently Used) cache implementation.
//!
//! Entries live in an arena of slots addressed by index. The recency
//! chain is a doubly-linked list threaded through the slots by index, and
//! vacated slots are recycled through a free list, so touch, insert and
//! evict are all O(1).

use std::collections::HashMap;
use std::hash::Hash;

/// An LRU-ordered map from keys to cached values
pub struct LruCache<K, V> {
    /// Maps a key to its slot index
    positions: HashMap<K, usize>,
    /// Slot arena
    slots: Vec<Slot<K, V>>,
    /// Head of the list (most recently used)
    head: Option<usize>,
    /// Tail of the list (least recently used)
    tail: Option<usize>,
    /// Free list of slot indices
    free_slots: Vec<usize>,
}

struct Slot<K, V> {
    /// `None` while the slot sits on the free list
    entry: Option<(K, V)>,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<K: Copy + Eq + Hash, V> LruCache<K, V> {
    /// Create an empty cache sized for `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            positions: HashMap::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free_slots: Vec::new(),
        }
    }

    /// Look up a value and mark it most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let pos = *self.positions.get(key)?;
        self.move_to_front(pos);
        self.slots[pos].entry.as_ref().map(|(_, v)| v)
    }

    /// Look up a value without touching recency
    pub fn peek(&self, key: &K) -> Option<&V> {
        let pos = *self.positions.get(key)?;
        self.slots[pos].entry.as_ref().map(|(_, v)| v)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    /// Insert or replace a value and mark it most recently used.
    ///
    /// Returns the previous value for the key, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&pos) = self.positions.get(&key) {
            self.move_to_front(pos);
            return self.slots[pos]
                .entry
                .replace((key, value))
                .map(|(_, old)| old);
        }

        let slot = Slot {
            entry: Some((key, value)),
            prev: None,
            next: self.head,
        };
        let pos = if let Some(pos) = self.free_slots.pop() {
            self.slots[pos] = slot;
            pos
        } else {
            self.slots.push(slot);
            self.slots.len() - 1
        };

        if let Some(old_head) = self.head {
            self.slots[old_head].prev = Some(pos);
        }
        self.head = Some(pos);
        if self.tail.is_none() {
            self.tail = Some(pos);
        }

        self.positions.insert(key, pos);
        None
    }

    /// Remove an entry
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let pos = self.positions.remove(key)?;
        self.unlink(pos);
        self.free_slots.push(pos);
        self.slots[pos].entry.take().map(|(_, v)| v)
    }

    /// Least recently used key
    pub fn lru(&self) -> Option<K> {
        let pos = self.tail?;
        self.slots[pos].entry.as_ref().map(|(key, _)| *key)
    }

    /// Keys from most to least recently used
    pub fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while let Some(pos) = cursor {
            if let Some((key, _)) = &self.slots[pos].entry {
                keys.push(*key);
            }
            cursor = self.slots[pos].next;
        }
        keys
    }

    /// All entries, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.slots
            .iter()
            .filter_map(|slot| slot.entry.as_ref().map(|(k, v)| (k, v)))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Move a slot to the front of the list
    fn move_to_front(&mut self, pos: usize) {
        if self.head == Some(pos) {
            return; // Already at front
        }

        self.unlink(pos);

        self.slots[pos].prev = None;
        self.slots[pos].next = self.head;
        if let Some(old_head) = self.head {
            self.slots[old_head].prev = Some(pos);
        }
        self.head = Some(pos);

        if self.tail.is_none() {
            self.tail = Some(pos);
        }
    }

    /// Unlink a slot from the list
    fn unlink(&mut self, pos: usize) {
        let (prev, next) = (self.slots[pos].prev, self.slots[pos].next);

        if let Some(prev) = prev {
            self.slots[prev].next = next;
        } else {
            self.head = next;
        }

        if let Some(next) = next {
            self.slots[next].prev = prev;
        } else {
            self.tail = prev;
        }

        self.slots[pos].prev = None;
        self.slots[pos].next = None;
    }
}
