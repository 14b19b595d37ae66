//! Specialized collection types

use std::collections::{HashMap, VecDeque};

use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable key into an [`IdArena`]
    pub struct ArenaKey;
}

/// Slot-map arena addressed by string identifier
///
/// Values live in a slot map so per-frame passes can mutate them in place
/// without re-allocating; the id index is only touched when the set of ids
/// changes.
#[derive(Debug)]
pub struct IdArena<T> {
    slots: SlotMap<ArenaKey, T>,
    index: HashMap<String, ArenaKey>,
}

impl<T> Default for IdArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IdArena<T> {
    /// Create an empty arena
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            index: HashMap::new(),
        }
    }

    /// Insert or replace the value stored for `id`
    pub fn insert(&mut self, id: &str, value: T) -> ArenaKey {
        if let Some(&key) = self.index.get(id) {
            if let Some(slot) = self.slots.get_mut(key) {
                *slot = value;
                return key;
            }
        }
        let key = self.slots.insert(value);
        self.index.insert(id.to_owned(), key);
        key
    }

    /// Look up a value by id
    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).and_then(|key| self.slots.get(*key))
    }

    /// Look up a value by id for in-place mutation
    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        let key = *self.index.get(id)?;
        self.slots.get_mut(key)
    }

    /// Check whether `id` has a slot
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Drop every slot whose id fails the predicate
    pub fn retain_ids(&mut self, mut keep: impl FnMut(&str) -> bool) {
        let slots = &mut self.slots;
        self.index.retain(|id, key| {
            let keep_it = keep(id);
            if !keep_it {
                slots.remove(*key);
            }
            keep_it
        });
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the arena is empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
    }
}

/// Fixed-capacity FIFO history; pushing past capacity evicts the oldest entry
#[derive(Debug, Clone)]
pub struct RollingHistory<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingHistory<T> {
    /// Create a history holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest if full
    pub fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Most recent entry
    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    /// Number of entries held
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no entries are held
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
