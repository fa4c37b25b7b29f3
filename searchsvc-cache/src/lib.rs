use std::{borrow::Borrow, hash::Hash};

mod lru_cache;

pub mod prelude {
    pub use crate::Cache;
    pub use crate::lru_cache::LruCache;
}
pub use prelude::*;

pub trait Cache<K, V>: Sync + Send
where
    K: Sync + Send,
    V: Sync + Send,
{
    /// Stores `value` under `key`, returning the value it replaced.
    fn insert(&self, key: K, value: V) -> Option<V>;

    /// Returns a copy of the value and marks the key as most recently used.
    fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized;

    fn len(&self) -> usize;

    fn capacity(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
