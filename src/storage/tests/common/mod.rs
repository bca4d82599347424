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

use std::sync::Arc;

use kstd::lock_mgr::LockMgr;
use storage::{BgTaskHandler, ColumnFamilyIndex, Redis, StorageOptions};
use tempfile::TempDir;

pub fn open_instance() -> (TempDir, Redis) {
    let temp_dir = TempDir::new().unwrap();
    let options = Arc::new(StorageOptions::default());
    let (bg_task_handler, _receiver) = BgTaskHandler::new();
    let lock_mgr = Arc::new(LockMgr::new(1000));

    let mut redis = Redis::new(options, 0, Arc::new(bg_task_handler), lock_mgr);
    redis
        .open(temp_dir.path().to_str().unwrap())
        .expect("open test instance");
    (temp_dir, redis)
}

/// Encoded meta key for short user keys (single-byte varint prefix).
pub fn encoded_meta_key(key: &[u8]) -> Vec<u8> {
    assert!(key.len() < 128);
    let mut encoded = Vec::with_capacity(1 + key.len());
    encoded.push(key.len() as u8);
    encoded.extend_from_slice(key);
    encoded
}

/// Meta value bytes of the documented 29-byte layout:
/// | type 1B | count 4B LE | version 8B LE | etime 8B LE | ctime 8B LE |
pub fn build_meta_bytes(type_tag: u8, count: u32, version: u64, etime: u64, ctime: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(29);
    buf.push(type_tag);
    buf.extend_from_slice(&count.to_le_bytes());
    buf.extend_from_slice(&version.to_le_bytes());
    buf.extend_from_slice(&etime.to_le_bytes());
    buf.extend_from_slice(&ctime.to_le_bytes());
    buf
}

/// Rewrites the stored meta record's etime to 1, making the key stale to
/// every subsequent read.
pub fn force_expire(redis: &Redis, key: &[u8]) {
    let db = redis.db.as_ref().unwrap();
    let meta_cf = redis.get_cf_handle(ColumnFamilyIndex::MetaCF).unwrap();

    let meta_key = encoded_meta_key(key);
    let mut meta_value = db.get_cf(&meta_cf, &meta_key).unwrap().unwrap();
    meta_value[13..21].copy_from_slice(&1u64.to_le_bytes());
    db.put_cf(&meta_cf, &meta_key, &meta_value).unwrap();
}

/// Writes a live record of a foreign data type at `key`.
pub fn put_foreign_type(redis: &Redis, key: &[u8], type_tag: u8, etime: u64) {
    let db = redis.db.as_ref().unwrap();
    let meta_cf = redis.get_cf_handle(ColumnFamilyIndex::MetaCF).unwrap();

    let meta_key = encoded_meta_key(key);
    let meta_value = build_meta_bytes(type_tag, 0, 1, etime, 100);
    db.put_cf(&meta_cf, &meta_key, &meta_value).unwrap();
}
