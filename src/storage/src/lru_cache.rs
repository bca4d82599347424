// Copyright 2024 The Loquat Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bounded thread-safe LRU store backing the SPOP counter, the scan cursor
//! store and the key statistics table.

use std::{hash::Hash, num::NonZeroUsize};

use lru::LruCache;
use parking_lot::Mutex;

pub struct LruStore<K, V>
where
    K: Hash + Eq,
{
    inner: Mutex<LruCache<K, V>>,
}

impl<K, V> LruStore<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    pub fn lookup(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key).cloned()
    }

    pub fn insert(&self, key: K, value: V) {
        self.inner.lock().put(key, value);
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().pop(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn set_capacity(&self, capacity: usize) {
        self.inner
            .lock()
            .resize(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_lookup_remove() {
        let store: LruStore<Vec<u8>, u64> = LruStore::new(4);

        store.insert(b"key".to_vec(), 7);
        assert_eq!(store.lookup(&b"key".to_vec()), Some(7));
        assert_eq!(store.remove(&b"key".to_vec()), Some(7));
        assert_eq!(store.lookup(&b"key".to_vec()), None);
    }

    #[test]
    fn test_capacity_eviction() {
        let store: LruStore<u32, u32> = LruStore::new(2);

        store.insert(1, 1);
        store.insert(2, 2);
        store.insert(3, 3);

        // the least recently used entry is gone
        assert_eq!(store.lookup(&1), None);
        assert_eq!(store.lookup(&2), Some(2));
        assert_eq!(store.lookup(&3), Some(3));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_lookup_refreshes_recency() {
        let store: LruStore<u32, u32> = LruStore::new(2);

        store.insert(1, 1);
        store.insert(2, 2);
        store.lookup(&1);
        store.insert(3, 3);

        assert_eq!(store.lookup(&1), Some(1));
        assert_eq!(store.lookup(&2), None);
    }

    #[test]
    fn test_set_capacity_shrinks() {
        let store: LruStore<u32, u32> = LruStore::new(8);
        for i in 0..8 {
            store.insert(i, i);
        }
        store.set_capacity(2);
        assert_eq!(store.len(), 2);
    }
}
