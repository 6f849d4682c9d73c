use crate::entry::CacheEntry;
use crate::keys::ComputationKey;
use ::lru::LruCache;
use std::num::NonZeroUsize;

/// Result of offering an entry to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Entry retained; `evicted` older entries were dropped to make room
    Stored { evicted: usize },
    /// Entry alone exceeds the byte bound and was not retained
    TooLarge,
}

/// LRU map that evicts until both the count and byte bounds hold
pub struct BoundedLru {
    entries: LruCache<ComputationKey, CacheEntry>,
    max_bytes: u64,
    total_bytes: u64,
}

impl BoundedLru {
    pub fn new(max_entries: NonZeroUsize, max_bytes: u64) -> Self {
        Self {
            entries: LruCache::new(max_entries),
            max_bytes,
            total_bytes: 0,
        }
    }

    /// Look up an entry and mark it most recently used
    pub fn get(&mut self, key: &ComputationKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Whether a key is retained, without touching recency
    pub fn contains(&self, key: &ComputationKey) -> bool {
        self.entries.contains(key)
    }

    pub fn insert(&mut self, entry: CacheEntry) -> InsertOutcome {
        if entry.size_bytes > self.max_bytes {
            return InsertOutcome::TooLarge;
        }

        let mut evicted = 0;
        let size = entry.size_bytes;
        let key = entry.key.clone();

        // `push` returns the replaced value for an existing key, or the
        // entry displaced by the count bound
        if let Some((old_key, old)) = self.entries.push(key.clone(), entry) {
            self.total_bytes = self.total_bytes.saturating_sub(old.size_bytes);
            if old_key != key {
                evicted += 1;
            }
        }
        self.total_bytes += size;

        while self.total_bytes > self.max_bytes {
            match self.entries.pop_lru() {
                Some((_, old)) => {
                    self.total_bytes = self.total_bytes.saturating_sub(old.size_bytes);
                    evicted += 1;
                }
                None => break,
            }
        }

        InsertOutcome::Stored { evicted }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_bytes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;
    use zeorun_core::{ExecutionResult, ToolArguments};

    fn entry(name: &str, payload: usize) -> CacheEntry {
        let key = ComputationKey::build(name.as_bytes(), &ToolArguments::new(), "op");
        let mut outputs = BTreeMap::new();
        outputs.insert("o".to_string(), vec![b'x'; payload]);
        let result = ExecutionResult::completed(Some(0), String::new(), outputs, None, Duration::ZERO);
        CacheEntry::new(key, Arc::new(result))
    }

    fn lru(entries: usize, bytes: u64) -> BoundedLru {
        BoundedLru::new(NonZeroUsize::new(entries).unwrap(), bytes)
    }

    #[test]
    fn test_count_bound_evicts_least_recent() {
        let mut store = lru(2, 1_000);
        let (a, b, c) = (entry("a", 9), entry("b", 9), entry("c", 9));

        store.insert(a.clone());
        store.insert(b.clone());
        // Touch `a` so `b` becomes the eviction candidate
        assert!(store.get(&a.key).is_some());

        assert_eq!(store.insert(c.clone()), InsertOutcome::Stored { evicted: 1 });
        assert!(store.contains(&a.key));
        assert!(!store.contains(&b.key));
        assert!(store.contains(&c.key));
        assert_eq!(store.total_bytes(), 20);
    }

    #[test]
    fn test_byte_bound_evicts_until_within_budget() {
        // Each entry accounts 1 byte of name + payload
        let mut store = lru(10, 30);
        store.insert(entry("a", 9));
        store.insert(entry("b", 9));
        store.insert(entry("c", 9));
        assert_eq!(store.total_bytes(), 30);

        let big = entry("d", 19);
        assert_eq!(store.insert(big.clone()), InsertOutcome::Stored { evicted: 2 });
        assert_eq!(store.len(), 2);
        assert!(store.contains(&big.key));
        assert!(store.total_bytes() <= 30);
    }

    #[test]
    fn test_oversized_entry_is_rejected() {
        let mut store = lru(10, 8);
        let existing = entry("a", 4);
        store.insert(existing.clone());

        assert_eq!(store.insert(entry("b", 64)), InsertOutcome::TooLarge);
        assert!(store.contains(&existing.key));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_reinsert_same_key_replaces_accounting() {
        let mut store = lru(4, 100);
        let first = entry("a", 9);
        store.insert(first.clone());
        assert_eq!(
            store.insert(first.clone()),
            InsertOutcome::Stored { evicted: 0 }
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.total_bytes(), 10);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.total_bytes(), 0);
    }
}
