//! Byte-bounded in-memory cache tier.

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;

struct MemoryEntry {
    body: Bytes,
    last_used: u64,
}

/// An in-memory LRU store bounded by total body size.
///
/// Not synchronized; [`TieredCache`](super::TieredCache) wraps it in a lock.
pub struct MemoryTier {
    capacity: usize,
    used: usize,
    tick: u64,
    entries: HashMap<String, MemoryEntry>,
    recency: BTreeMap<u64, String>,
}

impl MemoryTier {
    /// Create a tier holding at most `capacity` bytes of bodies.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            used: 0,
            tick: 0,
            entries: HashMap::new(),
            recency: BTreeMap::new(),
        }
    }

    /// Configured capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently held.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the tier is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check for a key without touching its recency.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up a body and mark it most recently used.
    pub fn get(&mut self, key: &str) -> Option<Bytes> {
        let tick = self.next_tick();
        let entry = self.entries.get_mut(key)?;
        self.recency.remove(&entry.last_used);
        entry.last_used = tick;
        self.recency.insert(tick, key.to_string());
        Some(entry.body.clone())
    }

    /// Store a body, evicting least recently used entries to make room.
    ///
    /// Returns `false` when the body alone exceeds the capacity; any previous
    /// entry for the key is dropped in that case.
    pub fn insert(&mut self, key: &str, body: Bytes) -> bool {
        self.remove(key);
        if body.len() > self.capacity {
            return false;
        }

        while self.used + body.len() > self.capacity {
            if self.evict_oldest().is_none() {
                break;
            }
        }

        let tick = self.next_tick();
        self.used += body.len();
        self.recency.insert(tick, key.to_string());
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                body,
                last_used: tick,
            },
        );
        true
    }

    /// Remove an entry, returning its body.
    pub fn remove(&mut self, key: &str) -> Option<Bytes> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.last_used);
        self.used -= entry.body.len();
        Some(entry.body)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
        self.used = 0;
    }

    fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.recency.pop_first()?;
        if let Some(entry) = self.entries.remove(&key) {
            self.used -= entry.body.len();
        }
        Some(key)
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

impl std::fmt::Debug for MemoryTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTier")
            .field("capacity", &self.capacity)
            .field("used", &self.used)
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(len: usize) -> Bytes {
        Bytes::from(vec![b'x'; len])
    }

    #[test]
    fn test_insert_and_get() {
        let mut tier = MemoryTier::new(100);
        assert!(tier.insert("a", Bytes::from_static(b"alpha")));
        assert_eq!(tier.get("a"), Some(Bytes::from_static(b"alpha")));
        assert_eq!(tier.used(), 5);
        assert_eq!(tier.get("missing"), None);
    }

    #[test]
    fn test_replace_updates_size() {
        let mut tier = MemoryTier::new(100);
        tier.insert("a", body(40));
        tier.insert("a", body(10));
        assert_eq!(tier.len(), 1);
        assert_eq!(tier.used(), 10);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut tier = MemoryTier::new(30);
        tier.insert("a", body(10));
        tier.insert("b", body(10));
        tier.insert("c", body(10));

        // Touch "a" so "b" becomes the oldest.
        tier.get("a");
        tier.insert("d", body(10));

        assert!(tier.contains("a"));
        assert!(!tier.contains("b"));
        assert!(tier.contains("c"));
        assert!(tier.contains("d"));
        assert!(tier.used() <= tier.capacity());
    }

    #[test]
    fn test_oversized_body_is_not_stored() {
        let mut tier = MemoryTier::new(8);
        tier.insert("a", body(4));
        assert!(!tier.insert("a", body(9)));
        assert!(!tier.contains("a"));
        assert_eq!(tier.used(), 0);
    }

    #[test]
    fn test_clear() {
        let mut tier = MemoryTier::new(64);
        tier.insert("a", body(4));
        tier.insert("b", body(4));
        tier.clear();
        assert!(tier.is_empty());
        assert_eq!(tier.used(), 0);
    }
}
