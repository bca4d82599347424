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

//! Shared value types of the storage engine.

/// A user key pinned to one logical generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyVersion {
    pub key: Vec<u8>,
    pub version: u64,
}

impl KeyVersion {
    pub fn new(key: Vec<u8>, version: u64) -> Self {
        Self { key, version }
    }
}

/// Per-type key census produced by the scan-key-num operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyInfo {
    pub keys: u64,
    pub expires: u64,
    pub avg_ttl: u64,
    pub invalid_keys: u64,
}

impl KeyInfo {
    pub fn new(keys: u64, expires: u64, avg_ttl: u64, invalid_keys: u64) -> Self {
        Self {
            keys,
            expires,
            avg_ttl,
            invalid_keys,
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        Self {
            keys: self.keys + other.keys,
            expires: self.expires + other.expires,
            avg_ttl: self.avg_ttl + other.avg_ttl,
            invalid_keys: self.invalid_keys + other.invalid_keys,
        }
    }
}

/// Accumulated write traffic of a single key, used to decide when a
/// small-compaction hint is worth posting.
#[derive(Debug, Clone, Default)]
pub struct KeyStatistics {
    pub modify_count: u64,
}
