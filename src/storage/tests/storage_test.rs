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

use storage::{Storage, StorageOptions};
use tempfile::TempDir;

fn open_storage(db_instance_num: usize) -> (TempDir, Storage) {
    let temp_dir = TempDir::new().unwrap();
    let options = Arc::new(StorageOptions {
        db_instance_num,
        ..StorageOptions::default()
    });

    let mut storage = Storage::new(db_instance_num, 0);
    storage.open(options, temp_dir.path()).expect("open storage");
    (temp_dir, storage)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_storage_routes_keys_across_instances() {
    let (_temp_dir, mut storage) = open_storage(3);

    for i in 0..30 {
        let key = format!("key{i}").into_bytes();
        assert_eq!(storage.sadd(&key, &[b"a".as_ref(), b"b".as_ref()]).unwrap(), 2);
    }
    for i in 0..30 {
        let key = format!("key{i}").into_bytes();
        assert_eq!(storage.scard(&key).unwrap(), 2);
        assert_eq!(
            storage.smembers(&key).unwrap(),
            vec![b"a".to_vec(), b"b".to_vec()]
        );
    }

    // the census aggregates over every instance
    let key_info = storage.scan_sets_key_num().unwrap();
    assert_eq!(key_info.keys, 30);

    storage.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_storage_rename_across_instances() {
    let (_temp_dir, mut storage) = open_storage(4);

    storage
        .sadd(b"origin", &[b"a".as_ref(), b"b".as_ref()])
        .unwrap();
    storage.sets_rename(b"origin", b"elsewhere").unwrap();

    assert_eq!(
        storage.smembers(b"elsewhere").unwrap(),
        vec![b"a".to_vec(), b"b".to_vec()]
    );
    assert!(storage.scard(b"origin").unwrap_err().is_not_found());

    // renamenx refuses a live destination
    storage.sadd(b"src", &[b"x".as_ref()]).unwrap();
    assert!(storage
        .sets_renamenx(b"src", b"elsewhere")
        .unwrap_err()
        .is_corruption());

    storage.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_storage_single_instance_ops() {
    let (_temp_dir, mut storage) = open_storage(1);

    storage
        .sadd(b"A", &[b"1".as_ref(), b"2".as_ref(), b"3".as_ref()])
        .unwrap();
    storage.sadd(b"B", &[b"2".as_ref()]).unwrap();

    assert_eq!(
        storage.sdiff(&[b"A".as_ref(), b"B".as_ref()]).unwrap(),
        vec![b"1".to_vec(), b"3".to_vec()]
    );
    assert_eq!(
        storage
            .sdiffstore(b"D", &[b"A".as_ref(), b"B".as_ref()])
            .unwrap(),
        2
    );
    assert!(storage.sismember(b"D", b"1").unwrap());
    assert!(storage.smove(b"A", b"B", b"1").unwrap());
    assert_eq!(storage.spop(b"B", 10).unwrap().len(), 2);

    let (next_cursor, page) = storage.sscan(b"A", 0, b"*", 100).unwrap();
    assert_eq!(next_cursor, 0);
    assert_eq!(page.len(), 2);

    assert!(storage.sets_expire(b"A", 100).unwrap());
    let (_, ttl) = storage.smembers_with_ttl(b"A").unwrap();
    assert!(ttl > 0);

    storage.shutdown().await;
}
