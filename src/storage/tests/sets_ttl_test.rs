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

mod common;

use common::{force_expire, open_instance};

#[test]
fn test_expired_set_reads_as_missing() {
    let (_temp_dir, redis) = open_instance();

    redis.sadd(b"s", &[b"a".as_ref(), b"b".as_ref()]).unwrap();
    force_expire(&redis, b"s");

    assert!(redis.scard(b"s").unwrap_err().is_not_found());
    assert!(redis.smembers(b"s").unwrap_err().is_not_found());
    assert!(redis.sismember(b"s", b"a").unwrap_err().is_not_found());
    assert!(redis.srem(b"s", &[b"a".as_ref()]).unwrap_err().is_not_found());
    assert!(redis.spop(b"s", 1).unwrap_err().is_not_found());
    assert!(redis.srandmember(b"s", 1).unwrap_err().is_not_found());
}

#[test]
fn test_sadd_resurrects_expired_key() {
    let (_temp_dir, redis) = open_instance();

    redis.sadd(b"s", &[b"old1".as_ref(), b"old2".as_ref()]).unwrap();
    force_expire(&redis, b"s");

    // the next write starts a fresh generation
    assert_eq!(redis.sadd(b"s", &[b"new".as_ref()]).unwrap(), 1);
    assert_eq!(redis.scard(b"s").unwrap(), 1);
    assert_eq!(redis.smembers(b"s").unwrap(), vec![b"new".to_vec()]);
    assert!(!redis.sismember(b"s", b"old1").unwrap());
}

#[test]
fn test_sets_expire_future() {
    let (_temp_dir, redis) = open_instance();

    redis.sadd(b"s", &[b"a".as_ref()]).unwrap();
    assert!(redis.sets_expire(b"s", 100).unwrap());

    // still live, and the remaining ttl is visible
    assert_eq!(redis.scard(b"s").unwrap(), 1);
    let (members, ttl) = redis.smembers_with_ttl(b"s").unwrap();
    assert_eq!(members, vec![b"a".to_vec()]);
    assert!(ttl > 0 && ttl <= 100);
}

#[test]
fn test_sets_expire_nonpositive_deletes() {
    let (_temp_dir, redis) = open_instance();

    redis.sadd(b"s", &[b"a".as_ref()]).unwrap();
    assert!(redis.sets_expire(b"s", 0).unwrap());
    assert!(redis.scard(b"s").unwrap_err().is_not_found());
}

#[test]
fn test_sets_expire_missing_key() {
    let (_temp_dir, redis) = open_instance();
    assert!(redis.sets_expire(b"missing", 10).unwrap_err().is_not_found());
}

#[test]
fn test_smembers_with_ttl_permanent() {
    let (_temp_dir, redis) = open_instance();

    redis.sadd(b"s", &[b"a".as_ref(), b"b".as_ref()]).unwrap();
    let (members, ttl) = redis.smembers_with_ttl(b"s").unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(ttl, -1);
}

#[test]
fn test_version_isolation_after_store_overwrite() {
    // old-generation member records never resurface, even while they
    // physically remain
    let (_temp_dir, redis) = open_instance();

    redis
        .sadd(b"s", &[b"ghost1".as_ref(), b"ghost2".as_ref()])
        .unwrap();
    redis.sadd(b"src", &[b"live".as_ref()]).unwrap();
    redis
        .sunionstore(b"s", &[b"src".as_ref()])
        .unwrap();

    assert_eq!(redis.smembers(b"s").unwrap(), vec![b"live".to_vec()]);
    assert!(!redis.sismember(b"s", b"ghost1").unwrap());
    assert_eq!(redis.scard(b"s").unwrap(), 1);
}

#[test]
fn test_scan_sets_key_num() {
    let (_temp_dir, redis) = open_instance();

    redis.sadd(b"live1", &[b"a".as_ref()]).unwrap();
    redis.sadd(b"live2", &[b"a".as_ref(), b"b".as_ref()]).unwrap();
    redis.sadd(b"transient", &[b"a".as_ref()]).unwrap();
    redis.sets_expire(b"transient", 1000).unwrap();
    redis.sadd(b"dead", &[b"a".as_ref()]).unwrap();
    force_expire(&redis, b"dead");

    let key_info = redis.scan_sets_key_num().unwrap();
    assert_eq!(key_info.keys, 3);
    assert_eq!(key_info.expires, 1);
    assert_eq!(key_info.invalid_keys, 1);
    assert!(key_info.avg_ttl > 0 && key_info.avg_ttl <= 1000);
}
