use std::{
    borrow::Borrow,
    collections::HashMap,
    fmt::Debug,
    hash::Hash,
    mem,
    sync::atomic::{AtomicUsize, Ordering},
};

use parking_lot::Mutex;

use super::Cache;

/// Sentinel index for "no neighbour".
const NIL: usize = usize::MAX;

struct LruEntry<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

impl<K, V> LruEntry<K, V> {
    fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            prev: NIL,
            next: NIL,
        }
    }
}

/// Entries live in a dense arena and link to each other by index.
/// `head` is the most recently used entry, `tail` the least.
struct LruCacheInner<K, V> {
    table: HashMap<K, usize>,
    entries: Vec<LruEntry<K, V>>,
    head: usize,
    tail: usize,
}

impl<K, V> LruCacheInner<K, V>
where
    K: Hash + Eq + Clone,
{
    fn new() -> Self {
        Self {
            table: HashMap::new(),
            entries: Vec::new(),
            head: NIL,
            tail: NIL,
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let entry = &self.entries[idx];
            (entry.prev, entry.next)
        };

        if prev == NIL {
            self.head = next;
        } else {
            self.entries[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.entries[next].prev = prev;
        }

        let entry = &mut self.entries[idx];
        entry.prev = NIL;
        entry.next = NIL;
    }

    fn link_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let entry = &mut self.entries[idx];
            entry.prev = NIL;
            entry.next = old_head;
        }

        if old_head == NIL {
            self.tail = idx;
        } else {
            self.entries[old_head].prev = idx;
        }
        self.head = idx;
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == idx {
            return;
        }
        self.unlink(idx);
        self.link_front(idx);
    }

    fn push_front(&mut self, key: K, value: V) {
        let idx = self.entries.len();
        self.entries.push(LruEntry::new(key.clone(), value));
        self.table.insert(key, idx);
        self.link_front(idx);
    }

    /// Detaches the least recently used entry and frees its slot.
    ///
    /// The last arena entry is swapped into the freed slot, so its
    /// neighbours and its index in `table` are repointed afterwards.
    fn pop_tail(&mut self) -> Option<(K, V)> {
        let idx = self.tail;
        if idx == NIL {
            return None;
        }

        self.unlink(idx);
        let last = self.entries.len() - 1;
        let evicted = self.entries.swap_remove(idx);
        self.table.remove(&evicted.key);

        if idx != last {
            let (prev, next) = {
                let moved = &self.entries[idx];
                (moved.prev, moved.next)
            };
            if prev == NIL {
                self.head = idx;
            } else {
                self.entries[prev].next = idx;
            }
            if next == NIL {
                self.tail = idx;
            } else {
                self.entries[next].prev = idx;
            }
            if let Some(slot) = self.table.get_mut(&self.entries[idx].key) {
                *slot = idx;
            }
        }

        Some((evicted.key, evicted.value))
    }

    #[cfg(test)]
    fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.entries.len());
        let mut cur = self.head;
        while cur != NIL && keys.len() <= self.entries.len() {
            keys.push(self.entries[cur].key.clone());
            cur = self.entries[cur].next;
        }
        keys
    }

    #[cfg(test)]
    fn validate(&self) {
        assert_eq!(self.table.len(), self.entries.len());

        let mut seen = 0;
        let mut prev = NIL;
        let mut cur = self.head;
        while cur != NIL {
            assert!(seen < self.entries.len(), "cycle in recency list");
            let entry = &self.entries[cur];
            assert_eq!(entry.prev, prev, "broken back link at {cur}");
            assert_eq!(self.table.get(&entry.key), Some(&cur));
            prev = cur;
            cur = entry.next;
            seen += 1;
        }

        assert_eq!(prev, self.tail);
        assert_eq!(seen, self.entries.len());
    }
}

/// A fixed-capacity LRU cache guarded by a single mutex.
///
/// Both `get` and `insert` reorder the recency list, so every operation
/// takes the lock exclusively. A capacity of zero stores nothing.
pub struct LruCache<K, V> {
    inner: Mutex<LruCacheInner<K, V>>,
    usage: AtomicUsize,
    cap: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    pub fn new(cap: usize) -> Self {
        Self {
            inner: Mutex::new(LruCacheInner::new()),
            usage: AtomicUsize::new(0),
            cap,
        }
    }
}

impl<K, V> Cache<K, V> for LruCache<K, V>
where
    K: Send + Sync + Hash + Eq + Clone,
    V: Send + Sync + Clone,
{
    fn insert(&self, key: K, value: V) -> Option<V> {
        if self.cap == 0 {
            return None;
        }

        let mut inner = self.inner.lock();
        if let Some(&idx) = inner.table.get(&key) {
            let old_value = mem::replace(&mut inner.entries[idx].value, value);
            inner.move_to_front(idx);
            return Some(old_value);
        }

        inner.push_front(key, value);
        if inner.len() > self.cap && inner.pop_tail().is_some() {
            tracing::trace!("evicted lru entry, capacity: {}", self.cap);
        }
        self.usage.store(inner.len(), Ordering::Relaxed);

        None
    }

    fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut inner = self.inner.lock();
        let idx = *inner.table.get(key)?;
        inner.move_to_front(idx);
        Some(inner.entries[idx].value.clone())
    }

    fn len(&self) -> usize {
        self.usage.load(Ordering::Relaxed)
    }

    fn capacity(&self) -> usize {
        self.cap
    }
}

impl<K, V> Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("len", &self.usage.load(Ordering::Relaxed))
            .field("cap", &self.cap)
            .finish()
    }
}
