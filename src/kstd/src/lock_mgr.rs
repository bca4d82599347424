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

//! Sharded per-record lock manager.
//!
//! Record keys are arbitrary byte strings. One writer per key; writers on
//! distinct keys only contend when their keys hash to the same shard.

use std::{
    collections::{hash_map::DefaultHasher, HashSet},
    hash::{Hash, Hasher},
    sync::{Arc, Condvar, Mutex},
};

struct LockMapShard {
    mutex: Mutex<HashSet<Vec<u8>>>,
    condvar: Condvar,
}

impl LockMapShard {
    fn new() -> Self {
        Self {
            mutex: Mutex::new(HashSet::new()),
            condvar: Condvar::new(),
        }
    }
}

pub struct LockMgr {
    shards: Vec<Arc<LockMapShard>>,
}

impl LockMgr {
    pub fn new(num_shards: usize) -> Self {
        Self {
            shards: (0..num_shards.max(1))
                .map(|_| Arc::new(LockMapShard::new()))
                .collect(),
        }
    }

    #[inline]
    fn shard_for(&self, key: &[u8]) -> &Arc<LockMapShard> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[hasher.finish() as usize % self.shards.len()]
    }

    /// Blocks until the record lock for `key` is acquired.
    pub fn lock(&self, key: &[u8]) {
        let shard = self.shard_for(key);

        let mut keys = shard.mutex.lock().expect("lock shard mutex is poisoned");
        while keys.contains(key) {
            keys = shard
                .condvar
                .wait(keys)
                .expect("lock shard condvar is poisoned");
        }
        keys.insert(key.to_vec());
    }

    pub fn unlock(&self, key: &[u8]) {
        let shard = self.shard_for(key);

        let mut keys = shard.mutex.lock().expect("lock shard mutex is poisoned");
        keys.remove(key);
        drop(keys);

        shard.condvar.notify_all();
    }

    /// Non-blocking variant; returns false when the key is already held.
    pub fn try_lock(&self, key: &[u8]) -> bool {
        let shard = self.shard_for(key);

        let mut keys = shard.mutex.lock().expect("lock shard mutex is poisoned");
        if keys.contains(key) {
            return false;
        }
        keys.insert(key.to_vec());
        true
    }
}

/// RAII lock guard over a single record.
pub struct ScopeRecordLock<'a> {
    mgr: &'a LockMgr,
    key: Vec<u8>,
}

impl<'a> ScopeRecordLock<'a> {
    pub fn new(mgr: &'a LockMgr, key: &[u8]) -> Self {
        mgr.lock(key);
        Self {
            mgr,
            key: key.to_vec(),
        }
    }
}

impl Drop for ScopeRecordLock<'_> {
    fn drop(&mut self) {
        self.mgr.unlock(&self.key);
    }
}

/// RAII lock guard over several records.
///
/// Keys are acquired in sorted, deduplicated order so that two guards over
/// overlapping key sets can never deadlock, and released in reverse order.
pub struct MultiScopeRecordLock<'a> {
    mgr: &'a LockMgr,
    keys: Vec<Vec<u8>>,
}

impl<'a> MultiScopeRecordLock<'a> {
    pub fn new(mgr: &'a LockMgr, keys: &[&[u8]]) -> Self {
        let mut sorted_keys: Vec<Vec<u8>> = keys.iter().map(|k| k.to_vec()).collect();
        sorted_keys.sort();
        sorted_keys.dedup();

        for key in &sorted_keys {
            mgr.lock(key);
        }

        Self {
            mgr,
            keys: sorted_keys,
        }
    }
}

impl Drop for MultiScopeRecordLock<'_> {
    fn drop(&mut self) {
        for key in self.keys.iter().rev() {
            self.mgr.unlock(key);
        }
    }
}
