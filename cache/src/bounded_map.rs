//! Fixed-capacity key/value map with least-recently-used eviction.

use std::collections::HashMap;

/// A bounded key/value map. When an insertion would exceed capacity, the
/// least-recently-used entry is evicted. Recency is updated on both read
/// and write; evicted entries are simply forgotten.
///
/// Keys are unique within one map; last write wins.
pub struct BoundedStateMap<V> {
    capacity: usize,
    tick: u64,
    entries: HashMap<String, Slot<V>>,
}

struct Slot<V> {
    value: V,
    touched: u64,
}

impl<V> BoundedStateMap<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            tick: 0,
            entries: HashMap::with_capacity(capacity.min(1024)),
        }
    }

    /// Insert or overwrite an entry, evicting the least-recently-used one
    /// if the map is at capacity.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        if self.capacity == 0 {
            return;
        }
        let key = key.into();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_lru();
        }
        let touched = self.next_tick();
        self.entries.insert(key, Slot { value, touched });
    }

    /// Look up an entry, marking it as recently used.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let tick = self.next_tick();
        let slot = self.entries.get_mut(key)?;
        slot.touched = tick;
        Some(&slot.value)
    }

    /// Look up an entry without touching its recency. Used by read-only
    /// views (snapshot assembly) that must not have side effects.
    pub fn peek(&self, key: &str) -> Option<&V> {
        self.entries.get(key).map(|slot| &slot.value)
    }

    /// Remove an entry, returning its value if present.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.remove(key).map(|slot| slot.value)
    }

    /// All live entries, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries
            .iter()
            .map(|(key, slot)| (key.as_str(), &slot.value))
    }

    /// Drop every entry. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn evict_lru(&mut self) {
        if let Some(oldest) = self
            .entries
            .iter()
            .min_by_key(|(_, slot)| slot.touched)
            .map(|(key, _)| key.clone())
        {
            self.entries.remove(&oldest);
        }
    }
}
