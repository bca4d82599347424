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

//! Set operations over the two key spaces: one meta record per user key in
//! the meta CF, one sentinel record per (key, version, member) in the sets
//! data CF.

use std::collections::HashSet;

use bytes::Bytes;
use kstd::lock_mgr::{MultiScopeRecordLock, ScopeRecordLock};
use rand::{rngs::StdRng, seq::index, seq::SliceRandom, Rng, SeedableRng};
use rocksdb::{Direction, IteratorMode, ReadOptions, WriteBatch};
use snafu::{ensure, ResultExt};

use crate::{
    base_data_value_format::BaseDataValue,
    base_key_format::BaseMetaKey,
    base_meta_value_format::{ParsedSetsMetaValue, SetsMetaValue},
    base_value_format::DataType,
    error::{CorruptionSnafu, Error, InvalidArgumentSnafu, Result, RocksSnafu},
    member_data_key_format::{ParsedSetsMemberKey, SetsMemberKey},
    redis::{
        expected_meta_value, get_meta_value_type, meta_value_is_stale, wrong_type_error,
        ColumnFamilyIndex, Redis,
    },
    types::{KeyInfo, KeyVersion},
    util::{is_tail_wildcard, now_micros, now_seconds, string_match},
};

impl Redis {
    /// Census of set keys: live, expiring, and logically dead headers.
    pub fn scan_sets_key_num(&self) -> Result<KeyInfo> {
        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;

        let mut keys = 0u64;
        let mut expires = 0u64;
        let mut ttl_sum = 0u64;
        let mut invalid_keys = 0u64;

        let snapshot = db.snapshot();
        let mut iterator_options = ReadOptions::default();
        iterator_options.fill_cache(false);
        let now = now_seconds();

        let iter = snapshot.iterator_cf_opt(&meta_cf, iterator_options, IteratorMode::Start);
        for item in iter {
            let (_, meta_value) = item.context(RocksSnafu)?;
            if get_meta_value_type(&meta_value) != DataType::Set {
                continue;
            }
            let parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;
            if parsed_sets_meta_value.is_stale() || parsed_sets_meta_value.count() == 0 {
                invalid_keys += 1;
            } else {
                keys += 1;
                if !parsed_sets_meta_value.is_permanent_survival() {
                    expires += 1;
                    ttl_sum += parsed_sets_meta_value.etime() - now;
                }
            }
        }

        Ok(KeyInfo {
            keys,
            expires,
            avg_ttl: if expires != 0 { ttl_sum / expires } else { 0 },
            invalid_keys,
        })
    }

    /// Adds members, creating or resurrecting the set as needed. Returns
    /// the number of members that were not already present.
    pub fn sadd(&self, key: &[u8], members: &[&[u8]]) -> Result<i32> {
        let mut unique = HashSet::new();
        let mut filtered_members = Vec::with_capacity(members.len());
        for &member in members {
            if unique.insert(member) {
                filtered_members.push(member);
            }
        }
        if filtered_members.is_empty() {
            return Ok(0);
        }

        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.get_cf_handle(ColumnFamilyIndex::SetsDataCF)?;
        let _lock = ScopeRecordLock::new(self.lock_mgr.as_ref(), key);

        let base_meta_key = BaseMetaKey::new(key).encode();
        let mut batch = WriteBatch::default();

        let meta_value = db.get_cf(&meta_cf, &base_meta_key).context(RocksSnafu)?;
        // A stale record of another type reads as missing; a live one is a
        // type error.
        let meta_value = match meta_value {
            Some(value) if !expected_meta_value(DataType::Set, &value) => {
                if meta_value_is_stale(&value)? {
                    None
                } else {
                    return Err(wrong_type_error(key, &value));
                }
            }
            other => other,
        };

        let added;
        match meta_value {
            Some(value) => {
                let mut parsed_sets_meta_value = ParsedSetsMetaValue::new(&value[..])?;
                if parsed_sets_meta_value.is_stale() || parsed_sets_meta_value.count() == 0 {
                    ensure!(
                        parsed_sets_meta_value.check_set_count(filtered_members.len()),
                        InvalidArgumentSnafu {
                            message: "set size overflow",
                        }
                    );
                    let version = parsed_sets_meta_value.initial_meta_value();
                    parsed_sets_meta_value.set_count(filtered_members.len() as i32);
                    batch.put_cf(&meta_cf, &base_meta_key, parsed_sets_meta_value.encoded());
                    for member in &filtered_members {
                        let sets_member_key = SetsMemberKey::new(key, version, member).encode();
                        batch.put_cf(&data_cf, &sets_member_key, BaseDataValue::new(Bytes::new()).encode());
                    }
                    added = filtered_members.len() as i32;
                } else {
                    let version = parsed_sets_meta_value.version();
                    let mut cnt = 0i32;
                    for member in &filtered_members {
                        let sets_member_key = SetsMemberKey::new(key, version, member).encode();
                        if db
                            .get_cf(&data_cf, &sets_member_key)
                            .context(RocksSnafu)?
                            .is_none()
                        {
                            cnt += 1;
                            batch.put_cf(
                                &data_cf,
                                &sets_member_key,
                                BaseDataValue::new(Bytes::new()).encode(),
                            );
                        }
                    }
                    if cnt == 0 {
                        return Ok(0);
                    }
                    ensure!(
                        parsed_sets_meta_value.check_modify_count(cnt),
                        InvalidArgumentSnafu {
                            message: "set size overflow",
                        }
                    );
                    parsed_sets_meta_value.modify_count(cnt);
                    batch.put_cf(&meta_cf, &base_meta_key, parsed_sets_meta_value.encoded());
                    added = cnt;
                }
            }
            None => {
                let mut sets_meta_value =
                    SetsMetaValue::new(DataType::Set, filtered_members.len() as i32);
                let version = sets_meta_value.update_version();
                batch.put_cf(&meta_cf, &base_meta_key, sets_meta_value.encode());
                for member in &filtered_members {
                    let sets_member_key = SetsMemberKey::new(key, version, member).encode();
                    batch.put_cf(&data_cf, &sets_member_key, BaseDataValue::new(Bytes::new()).encode());
                }
                added = filtered_members.len() as i32;
            }
        }

        db.write(batch).context(RocksSnafu)?;
        Ok(added)
    }

    /// Cardinality of a live set.
    pub fn scard(&self, key: &[u8]) -> Result<i32> {
        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;

        let base_meta_key = BaseMetaKey::new(key).encode();
        match db.get_cf(&meta_cf, &base_meta_key).context(RocksSnafu)? {
            Some(meta_value) => {
                self.check_set_meta(key, &meta_value)?;
                let parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;
                if parsed_sets_meta_value.count() == 0 {
                    return Err(Error::key_not_found(key));
                }
                Ok(parsed_sets_meta_value.count())
            }
            None => Err(Error::key_not_found(key)),
        }
    }

    /// Members of the first set that occur in none of the others. Stale or
    /// missing inputs contribute the empty set.
    pub fn sdiff(&self, keys: &[&[u8]]) -> Result<Vec<Vec<u8>>> {
        ensure!(
            !keys.is_empty(),
            CorruptionSnafu {
                message: "SDiff invalid parameter, no keys",
            }
        );

        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.get_cf_handle(ColumnFamilyIndex::SetsDataCF)?;
        let snapshot = db.snapshot();

        let mut valid_sets = Vec::new();
        for &key in &keys[1..] {
            let base_meta_key = BaseMetaKey::new(key).encode();
            if let Some(meta_value) = snapshot
                .get_cf(&meta_cf, &base_meta_key)
                .context(RocksSnafu)?
            {
                if meta_value_is_stale(&meta_value)? {
                    continue;
                }
                if !expected_meta_value(DataType::Set, &meta_value) {
                    return Err(wrong_type_error(key, &meta_value));
                }
                let parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;
                valid_sets.push(KeyVersion::new(
                    key.to_vec(),
                    parsed_sets_meta_value.version(),
                ));
            }
        }

        let mut members = Vec::new();
        let base_meta_key = BaseMetaKey::new(keys[0]).encode();
        if let Some(meta_value) = snapshot
            .get_cf(&meta_cf, &base_meta_key)
            .context(RocksSnafu)?
        {
            if !meta_value_is_stale(&meta_value)? {
                if !expected_meta_value(DataType::Set, &meta_value) {
                    return Err(wrong_type_error(keys[0], &meta_value));
                }
                let parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;
                let version = parsed_sets_meta_value.version();
                let prefix = SetsMemberKey::new(keys[0], version, b"").encode();
                let iter =
                    snapshot.iterator_cf(&data_cf, IteratorMode::From(&prefix, Direction::Forward));
                for item in iter {
                    let (raw_key, _) = item.context(RocksSnafu)?;
                    if !raw_key.starts_with(&prefix) {
                        break;
                    }
                    let member = ParsedSetsMemberKey::new(&raw_key)?.member().to_vec();

                    let mut found = false;
                    for key_version in &valid_sets {
                        let sets_member_key =
                            SetsMemberKey::new(&key_version.key, key_version.version, &member)
                                .encode();
                        if snapshot
                            .get_cf(&data_cf, &sets_member_key)
                            .context(RocksSnafu)?
                            .is_some()
                        {
                            found = true;
                            break;
                        }
                    }
                    if !found {
                        members.push(member);
                    }
                }
            }
        }
        Ok(members)
    }

    /// SDIFF persisted at `destination`; prior content is erased by a
    /// version bump. Returns the stored cardinality.
    pub fn sdiffstore(&self, destination: &[u8], keys: &[&[u8]]) -> Result<i32> {
        ensure!(
            !keys.is_empty(),
            CorruptionSnafu {
                message: "SDiffstore invalid parameter, no keys",
            }
        );

        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.get_cf_handle(ColumnFamilyIndex::SetsDataCF)?;
        let _lock = ScopeRecordLock::new(self.lock_mgr.as_ref(), destination);
        let snapshot = db.snapshot();

        let mut valid_sets = Vec::new();
        for &key in &keys[1..] {
            let base_meta_key = BaseMetaKey::new(key).encode();
            if let Some(meta_value) = snapshot
                .get_cf(&meta_cf, &base_meta_key)
                .context(RocksSnafu)?
            {
                if meta_value_is_stale(&meta_value)? {
                    continue;
                }
                if !expected_meta_value(DataType::Set, &meta_value) {
                    return Err(wrong_type_error(key, &meta_value));
                }
                let parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;
                valid_sets.push(KeyVersion::new(
                    key.to_vec(),
                    parsed_sets_meta_value.version(),
                ));
            }
        }

        let mut members = Vec::new();
        let base_meta_key = BaseMetaKey::new(keys[0]).encode();
        if let Some(meta_value) = snapshot
            .get_cf(&meta_cf, &base_meta_key)
            .context(RocksSnafu)?
        {
            if !meta_value_is_stale(&meta_value)? {
                if !expected_meta_value(DataType::Set, &meta_value) {
                    return Err(wrong_type_error(keys[0], &meta_value));
                }
                let parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;
                let version = parsed_sets_meta_value.version();
                let prefix = SetsMemberKey::new(keys[0], version, b"").encode();
                let iter =
                    snapshot.iterator_cf(&data_cf, IteratorMode::From(&prefix, Direction::Forward));
                for item in iter {
                    let (raw_key, _) = item.context(RocksSnafu)?;
                    if !raw_key.starts_with(&prefix) {
                        break;
                    }
                    let member = ParsedSetsMemberKey::new(&raw_key)?.member().to_vec();

                    let mut found = false;
                    for key_version in &valid_sets {
                        let sets_member_key =
                            SetsMemberKey::new(&key_version.key, key_version.version, &member)
                                .encode();
                        if snapshot
                            .get_cf(&data_cf, &sets_member_key)
                            .context(RocksSnafu)?
                            .is_some()
                        {
                            found = true;
                            break;
                        }
                    }
                    if !found {
                        members.push(member);
                    }
                }
            }
        }

        self.store_members(destination, &members)
    }

    /// Members occurring in every input set. Any stale or missing input
    /// forces the empty result.
    pub fn sinter(&self, keys: &[&[u8]]) -> Result<Vec<Vec<u8>>> {
        ensure!(
            !keys.is_empty(),
            CorruptionSnafu {
                message: "SInter invalid parameter, no keys",
            }
        );

        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.get_cf_handle(ColumnFamilyIndex::SetsDataCF)?;
        let snapshot = db.snapshot();

        let mut valid_sets = Vec::new();
        for &key in &keys[1..] {
            let base_meta_key = BaseMetaKey::new(key).encode();
            match snapshot
                .get_cf(&meta_cf, &base_meta_key)
                .context(RocksSnafu)?
            {
                Some(meta_value) => {
                    if meta_value_is_stale(&meta_value)? {
                        return Ok(Vec::new());
                    }
                    if !expected_meta_value(DataType::Set, &meta_value) {
                        return Err(wrong_type_error(key, &meta_value));
                    }
                    let parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;
                    valid_sets.push(KeyVersion::new(
                        key.to_vec(),
                        parsed_sets_meta_value.version(),
                    ));
                }
                None => return Ok(Vec::new()),
            }
        }

        let mut members = Vec::new();
        let base_meta_key = BaseMetaKey::new(keys[0]).encode();
        match snapshot
            .get_cf(&meta_cf, &base_meta_key)
            .context(RocksSnafu)?
        {
            Some(meta_value) => {
                if meta_value_is_stale(&meta_value)? {
                    return Ok(Vec::new());
                }
                if !expected_meta_value(DataType::Set, &meta_value) {
                    return Err(wrong_type_error(keys[0], &meta_value));
                }
                let parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;
                let version = parsed_sets_meta_value.version();
                let prefix = SetsMemberKey::new(keys[0], version, b"").encode();
                let iter =
                    snapshot.iterator_cf(&data_cf, IteratorMode::From(&prefix, Direction::Forward));
                for item in iter {
                    let (raw_key, _) = item.context(RocksSnafu)?;
                    if !raw_key.starts_with(&prefix) {
                        break;
                    }
                    let member = ParsedSetsMemberKey::new(&raw_key)?.member().to_vec();

                    let mut reliable = true;
                    for key_version in &valid_sets {
                        let sets_member_key =
                            SetsMemberKey::new(&key_version.key, key_version.version, &member)
                                .encode();
                        if snapshot
                            .get_cf(&data_cf, &sets_member_key)
                            .context(RocksSnafu)?
                            .is_none()
                        {
                            reliable = false;
                            break;
                        }
                    }
                    if reliable {
                        members.push(member);
                    }
                }
            }
            None => return Ok(Vec::new()),
        }
        Ok(members)
    }

    /// SINTER persisted at `destination`. A stale or missing input still
    /// replaces prior destination content with the empty set.
    pub fn sinterstore(&self, destination: &[u8], keys: &[&[u8]]) -> Result<i32> {
        ensure!(
            !keys.is_empty(),
            CorruptionSnafu {
                message: "SInterstore invalid parameter, no keys",
            }
        );

        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.get_cf_handle(ColumnFamilyIndex::SetsDataCF)?;
        let _lock = ScopeRecordLock::new(self.lock_mgr.as_ref(), destination);
        let snapshot = db.snapshot();

        let mut have_invalid_sets = false;
        let mut valid_sets = Vec::new();
        for &key in &keys[1..] {
            let base_meta_key = BaseMetaKey::new(key).encode();
            match snapshot
                .get_cf(&meta_cf, &base_meta_key)
                .context(RocksSnafu)?
            {
                Some(meta_value) => {
                    if meta_value_is_stale(&meta_value)? {
                        have_invalid_sets = true;
                        break;
                    }
                    if !expected_meta_value(DataType::Set, &meta_value) {
                        return Err(wrong_type_error(key, &meta_value));
                    }
                    let parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;
                    valid_sets.push(KeyVersion::new(
                        key.to_vec(),
                        parsed_sets_meta_value.version(),
                    ));
                }
                None => {
                    have_invalid_sets = true;
                    break;
                }
            }
        }

        let mut members = Vec::new();
        if !have_invalid_sets {
            let base_meta_key = BaseMetaKey::new(keys[0]).encode();
            if let Some(meta_value) = snapshot
                .get_cf(&meta_cf, &base_meta_key)
                .context(RocksSnafu)?
            {
                if !meta_value_is_stale(&meta_value)? {
                    if !expected_meta_value(DataType::Set, &meta_value) {
                        return Err(wrong_type_error(keys[0], &meta_value));
                    }
                    let parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;
                    let version = parsed_sets_meta_value.version();
                    let prefix = SetsMemberKey::new(keys[0], version, b"").encode();
                    let iter = snapshot
                        .iterator_cf(&data_cf, IteratorMode::From(&prefix, Direction::Forward));
                    for item in iter {
                        let (raw_key, _) = item.context(RocksSnafu)?;
                        if !raw_key.starts_with(&prefix) {
                            break;
                        }
                        let member = ParsedSetsMemberKey::new(&raw_key)?.member().to_vec();

                        let mut reliable = true;
                        for key_version in &valid_sets {
                            let sets_member_key =
                                SetsMemberKey::new(&key_version.key, key_version.version, &member)
                                    .encode();
                            if snapshot
                                .get_cf(&data_cf, &sets_member_key)
                                .context(RocksSnafu)?
                                .is_none()
                            {
                                reliable = false;
                                break;
                            }
                        }
                        if reliable {
                            members.push(member);
                        }
                    }
                }
            }
        }

        self.store_members(destination, &members)
    }

    /// Whether `member` is in the live set at `key`.
    pub fn sismember(&self, key: &[u8], member: &[u8]) -> Result<bool> {
        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.get_cf_handle(ColumnFamilyIndex::SetsDataCF)?;
        let snapshot = db.snapshot();

        let base_meta_key = BaseMetaKey::new(key).encode();
        match snapshot
            .get_cf(&meta_cf, &base_meta_key)
            .context(RocksSnafu)?
        {
            Some(meta_value) => {
                self.check_set_meta(key, &meta_value)?;
                let parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;
                let version = parsed_sets_meta_value.version();
                let sets_member_key = SetsMemberKey::new(key, version, member).encode();
                Ok(snapshot
                    .get_cf(&data_cf, &sets_member_key)
                    .context(RocksSnafu)?
                    .is_some())
            }
            None => Err(Error::key_not_found(key)),
        }
    }

    /// All members of the set, in byte-lexicographic order.
    pub fn smembers(&self, key: &[u8]) -> Result<Vec<Vec<u8>>> {
        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.get_cf_handle(ColumnFamilyIndex::SetsDataCF)?;
        let snapshot = db.snapshot();

        let base_meta_key = BaseMetaKey::new(key).encode();
        match snapshot
            .get_cf(&meta_cf, &base_meta_key)
            .context(RocksSnafu)?
        {
            Some(meta_value) => {
                self.check_set_meta(key, &meta_value)?;
                let parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;
                let version = parsed_sets_meta_value.version();

                let mut members = Vec::new();
                let prefix = SetsMemberKey::new(key, version, b"").encode();
                let iter =
                    snapshot.iterator_cf(&data_cf, IteratorMode::From(&prefix, Direction::Forward));
                for item in iter {
                    let (raw_key, _) = item.context(RocksSnafu)?;
                    if !raw_key.starts_with(&prefix) {
                        break;
                    }
                    members.push(ParsedSetsMemberKey::new(&raw_key)?.member().to_vec());
                }
                Ok(members)
            }
            None => Err(Error::key_not_found(key)),
        }
    }

    /// SMEMBERS plus the remaining TTL: -1 when permanent, -2 when the
    /// expiry has already passed.
    pub fn smembers_with_ttl(&self, key: &[u8]) -> Result<(Vec<Vec<u8>>, i64)> {
        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.get_cf_handle(ColumnFamilyIndex::SetsDataCF)?;
        let snapshot = db.snapshot();

        let base_meta_key = BaseMetaKey::new(key).encode();
        match snapshot
            .get_cf(&meta_cf, &base_meta_key)
            .context(RocksSnafu)?
        {
            Some(meta_value) => {
                self.check_set_meta(key, &meta_value)?;
                let parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;

                let mut ttl = parsed_sets_meta_value.etime() as i64;
                if ttl == 0 {
                    ttl = -1;
                } else {
                    let now = now_seconds() as i64;
                    ttl = if ttl - now >= 0 { ttl - now } else { -2 };
                }

                let version = parsed_sets_meta_value.version();
                let mut members = Vec::new();
                let prefix = SetsMemberKey::new(key, version, b"").encode();
                let iter =
                    snapshot.iterator_cf(&data_cf, IteratorMode::From(&prefix, Direction::Forward));
                for item in iter {
                    let (raw_key, _) = item.context(RocksSnafu)?;
                    if !raw_key.starts_with(&prefix) {
                        break;
                    }
                    members.push(ParsedSetsMemberKey::new(&raw_key)?.member().to_vec());
                }
                Ok((members, ttl))
            }
            None => Err(Error::key_not_found(key)),
        }
    }

    /// Moves `member` between two sets in one batch. Both keys are locked
    /// in sorted order. A missing source or member yields `KeyNotFound`.
    pub fn smove(&self, source: &[u8], destination: &[u8], member: &[u8]) -> Result<bool> {
        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.get_cf_handle(ColumnFamilyIndex::SetsDataCF)?;

        let keys: [&[u8]; 2] = [source, destination];
        let _lock = MultiScopeRecordLock::new(self.lock_mgr.as_ref(), &keys);

        let base_source = BaseMetaKey::new(source).encode();
        let base_destination = BaseMetaKey::new(destination).encode();
        let mut batch = WriteBatch::default();

        let Some(meta_value) = db.get_cf(&meta_cf, &base_source).context(RocksSnafu)? else {
            return Err(Error::key_not_found(source));
        };
        self.check_set_meta(source, &meta_value)?;
        let mut source_meta = ParsedSetsMetaValue::new(&meta_value[..])?;
        let source_version = source_meta.version();
        let source_member_key = SetsMemberKey::new(source, source_version, member).encode();
        if db
            .get_cf(&data_cf, &source_member_key)
            .context(RocksSnafu)?
            .is_none()
        {
            return Err(Error::key_not_found(source));
        }
        ensure!(
            source_meta.check_modify_count(-1),
            InvalidArgumentSnafu {
                message: "set size overflow",
            }
        );
        source_meta.modify_count(-1);
        batch.put_cf(&meta_cf, &base_source, source_meta.encoded());
        batch.delete_cf(&data_cf, &source_member_key);

        let dest_meta_value = db.get_cf(&meta_cf, &base_destination).context(RocksSnafu)?;
        let dest_meta_value = match dest_meta_value {
            Some(value) if !expected_meta_value(DataType::Set, &value) => {
                if meta_value_is_stale(&value)? {
                    None
                } else {
                    return Err(wrong_type_error(destination, &value));
                }
            }
            other => other,
        };

        match dest_meta_value {
            Some(value) => {
                let mut dest_meta = ParsedSetsMetaValue::new(&value[..])?;
                if dest_meta.is_stale() || dest_meta.count() == 0 {
                    let version = dest_meta.initial_meta_value();
                    dest_meta.set_count(1);
                    batch.put_cf(&meta_cf, &base_destination, dest_meta.encoded());
                    let dest_member_key = SetsMemberKey::new(destination, version, member).encode();
                    batch.put_cf(&data_cf, &dest_member_key, BaseDataValue::new(Bytes::new()).encode());
                } else {
                    let version = dest_meta.version();
                    let dest_member_key = SetsMemberKey::new(destination, version, member).encode();
                    if db
                        .get_cf(&data_cf, &dest_member_key)
                        .context(RocksSnafu)?
                        .is_none()
                    {
                        ensure!(
                            dest_meta.check_modify_count(1),
                            InvalidArgumentSnafu {
                                message: "set size overflow",
                            }
                        );
                        dest_meta.modify_count(1);
                        batch.put_cf(&meta_cf, &base_destination, dest_meta.encoded());
                        batch.put_cf(
                            &data_cf,
                            &dest_member_key,
                            BaseDataValue::new(Bytes::new()).encode(),
                        );
                    }
                }
            }
            None => {
                let mut sets_meta_value = SetsMetaValue::new(DataType::Set, 1);
                let version = sets_meta_value.update_version();
                batch.put_cf(&meta_cf, &base_destination, sets_meta_value.encode());
                let dest_member_key = SetsMemberKey::new(destination, version, member).encode();
                batch.put_cf(&data_cf, &dest_member_key, BaseDataValue::new(Bytes::new()).encode());
            }
        }

        db.write(batch).context(RocksSnafu)?;
        self.update_specific_key_statistics(DataType::Set, source, 1);
        Ok(true)
    }

    /// Removes and returns up to `count` random members. Popping the whole
    /// set deletes the meta record outright.
    pub fn spop(&self, key: &[u8], count: i64) -> Result<Vec<Vec<u8>>> {
        if count <= 0 {
            return Ok(Vec::new());
        }

        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.get_cf_handle(ColumnFamilyIndex::SetsDataCF)?;
        let _lock = ScopeRecordLock::new(self.lock_mgr.as_ref(), key);

        let base_meta_key = BaseMetaKey::new(key).encode();
        let Some(meta_value) = db.get_cf(&meta_cf, &base_meta_key).context(RocksSnafu)? else {
            return Err(Error::key_not_found(key));
        };
        self.check_set_meta(key, &meta_value)?;
        let mut parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;

        let size = parsed_sets_meta_value.count();
        let version = parsed_sets_meta_value.version();
        let prefix = SetsMemberKey::new(key, version, b"").encode();

        let mut members = Vec::new();
        let mut batch = WriteBatch::default();

        if count >= i64::from(size) {
            // pop everything, in iteration order, and drop the header
            let iter = db.iterator_cf(&data_cf, IteratorMode::From(&prefix, Direction::Forward));
            let mut cur_index = 0;
            for item in iter {
                if cur_index >= size {
                    break;
                }
                let (raw_key, _) = item.context(RocksSnafu)?;
                if !raw_key.starts_with(&prefix) {
                    break;
                }
                batch.delete_cf(&data_cf, &raw_key);
                members.push(ParsedSetsMemberKey::new(&raw_key)?.member().to_vec());
                cur_index += 1;
            }
            batch.delete_cf(&meta_cf, &base_meta_key);
        } else {
            let mut rng = StdRng::seed_from_u64(now_micros());
            let mut sets_index = HashSet::with_capacity(count as usize);
            while sets_index.len() < count as usize {
                sets_index.insert(rng.gen_range(0..size));
            }

            let mut cur_index = 0;
            let mut del_count = 0i64;
            let iter = db.iterator_cf(&data_cf, IteratorMode::From(&prefix, Direction::Forward));
            for item in iter {
                if del_count == count || cur_index >= size {
                    break;
                }
                let (raw_key, _) = item.context(RocksSnafu)?;
                if !raw_key.starts_with(&prefix) {
                    break;
                }
                if sets_index.contains(&cur_index) {
                    del_count += 1;
                    batch.delete_cf(&data_cf, &raw_key);
                    members.push(ParsedSetsMemberKey::new(&raw_key)?.member().to_vec());
                }
                cur_index += 1;
            }

            ensure!(
                parsed_sets_meta_value.check_modify_count(-(count as i32)),
                InvalidArgumentSnafu {
                    message: "set size overflow",
                }
            );
            parsed_sets_meta_value.modify_count(-(count as i32));
            batch.put_cf(&meta_cf, &base_meta_key, parsed_sets_meta_value.encoded());
        }

        db.write(batch).context(RocksSnafu)?;
        Ok(members)
    }

    /// Random members without mutation. Positive counts sample distinct
    /// members, negative counts sample with replacement.
    pub fn srandmember(&self, key: &[u8], count: i32) -> Result<Vec<Vec<u8>>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.get_cf_handle(ColumnFamilyIndex::SetsDataCF)?;

        let base_meta_key = BaseMetaKey::new(key).encode();
        let Some(meta_value) = db.get_cf(&meta_cf, &base_meta_key).context(RocksSnafu)? else {
            return Err(Error::key_not_found(key));
        };
        self.check_set_meta(key, &meta_value)?;
        let parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;

        let size = parsed_sets_meta_value.count();
        if size == 0 {
            return Ok(Vec::new());
        }
        let version = parsed_sets_meta_value.version();

        let mut rng = StdRng::seed_from_u64(now_micros());
        let mut targets: Vec<i32> = if count > 0 {
            let count = count.min(size);
            index::sample(&mut rng, size as usize, count as usize)
                .into_iter()
                .map(|pos| pos as i32)
                .collect()
        } else {
            (0..count.unsigned_abs())
                .map(|_| rng.gen_range(0..size))
                .collect()
        };
        targets.sort_unstable();

        // one pass over the members, emitting each position as often as it
        // was drawn
        let mut members = Vec::with_capacity(targets.len());
        let prefix = SetsMemberKey::new(key, version, b"").encode();
        let iter = db.iterator_cf(&data_cf, IteratorMode::From(&prefix, Direction::Forward));
        let mut cur_index = 0;
        let mut idx = 0;
        for item in iter {
            if idx >= targets.len() || cur_index >= size {
                break;
            }
            let (raw_key, _) = item.context(RocksSnafu)?;
            if !raw_key.starts_with(&prefix) {
                break;
            }
            let member = ParsedSetsMemberKey::new(&raw_key)?.member().to_vec();
            while idx < targets.len() && cur_index == targets[idx] {
                idx += 1;
                members.push(member.clone());
            }
            cur_index += 1;
        }

        members.shuffle(&mut rng);
        Ok(members)
    }

    /// Removes the given members; returns how many were present.
    pub fn srem(&self, key: &[u8], members: &[&[u8]]) -> Result<i32> {
        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.get_cf_handle(ColumnFamilyIndex::SetsDataCF)?;
        let _lock = ScopeRecordLock::new(self.lock_mgr.as_ref(), key);

        let base_meta_key = BaseMetaKey::new(key).encode();
        let Some(meta_value) = db.get_cf(&meta_cf, &base_meta_key).context(RocksSnafu)? else {
            return Err(Error::key_not_found(key));
        };
        self.check_set_meta(key, &meta_value)?;
        let mut parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;
        let version = parsed_sets_meta_value.version();

        let mut cnt = 0i32;
        let mut batch = WriteBatch::default();
        for member in members {
            let sets_member_key = SetsMemberKey::new(key, version, member).encode();
            if db
                .get_cf(&data_cf, &sets_member_key)
                .context(RocksSnafu)?
                .is_some()
            {
                cnt += 1;
                batch.delete_cf(&data_cf, &sets_member_key);
            }
        }

        ensure!(
            parsed_sets_meta_value.check_modify_count(-cnt),
            InvalidArgumentSnafu {
                message: "set size overflow",
            }
        );
        parsed_sets_meta_value.modify_count(-cnt);
        batch.put_cf(&meta_cf, &base_meta_key, parsed_sets_meta_value.encoded());

        db.write(batch).context(RocksSnafu)?;
        self.update_specific_key_statistics(DataType::Set, key, cnt as u64);
        Ok(cnt)
    }

    /// Sets the key's expiry `ttl` seconds from now. A non-positive ttl
    /// deletes the set logically, exactly like a version bump.
    pub fn sets_expire(&self, key: &[u8], ttl: i64) -> Result<bool> {
        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;
        let _lock = ScopeRecordLock::new(self.lock_mgr.as_ref(), key);

        let base_meta_key = BaseMetaKey::new(key).encode();
        let Some(meta_value) = db.get_cf(&meta_cf, &base_meta_key).context(RocksSnafu)? else {
            return Err(Error::key_not_found(key));
        };
        self.check_set_meta(key, &meta_value)?;
        let mut parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;
        if parsed_sets_meta_value.count() == 0 {
            return Err(Error::key_not_found(key));
        }

        if ttl > 0 {
            parsed_sets_meta_value.set_etime(now_seconds() + ttl as u64);
        } else {
            parsed_sets_meta_value.initial_meta_value();
        }
        db.put_cf(&meta_cf, &base_meta_key, parsed_sets_meta_value.encoded())
            .context(RocksSnafu)?;
        Ok(true)
    }

    /// Union of all input sets, deduplicated on first observation. Stale
    /// and missing inputs are skipped.
    pub fn sunion(&self, keys: &[&[u8]]) -> Result<Vec<Vec<u8>>> {
        ensure!(
            !keys.is_empty(),
            CorruptionSnafu {
                message: "SUnion invalid parameter, no keys",
            }
        );

        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.get_cf_handle(ColumnFamilyIndex::SetsDataCF)?;
        let snapshot = db.snapshot();

        let mut valid_sets = Vec::new();
        for &key in keys {
            let base_meta_key = BaseMetaKey::new(key).encode();
            if let Some(meta_value) = snapshot
                .get_cf(&meta_cf, &base_meta_key)
                .context(RocksSnafu)?
            {
                if meta_value_is_stale(&meta_value)? {
                    continue;
                }
                if !expected_meta_value(DataType::Set, &meta_value) {
                    return Err(wrong_type_error(key, &meta_value));
                }
                let parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;
                valid_sets.push(KeyVersion::new(
                    key.to_vec(),
                    parsed_sets_meta_value.version(),
                ));
            }
        }

        let mut members = Vec::new();
        let mut seen: HashSet<Vec<u8>> = HashSet::new();
        for key_version in &valid_sets {
            let prefix = SetsMemberKey::new(&key_version.key, key_version.version, b"").encode();
            let iter =
                snapshot.iterator_cf(&data_cf, IteratorMode::From(&prefix, Direction::Forward));
            for item in iter {
                let (raw_key, _) = item.context(RocksSnafu)?;
                if !raw_key.starts_with(&prefix) {
                    break;
                }
                let member = ParsedSetsMemberKey::new(&raw_key)?.member().to_vec();
                if seen.insert(member.clone()) {
                    members.push(member);
                }
            }
        }
        Ok(members)
    }

    /// SUNION persisted at `destination`.
    pub fn sunionstore(&self, destination: &[u8], keys: &[&[u8]]) -> Result<i32> {
        ensure!(
            !keys.is_empty(),
            CorruptionSnafu {
                message: "SUnionstore invalid parameter, no keys",
            }
        );

        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.get_cf_handle(ColumnFamilyIndex::SetsDataCF)?;
        let _lock = ScopeRecordLock::new(self.lock_mgr.as_ref(), destination);
        let snapshot = db.snapshot();

        let mut valid_sets = Vec::new();
        for &key in keys {
            let base_meta_key = BaseMetaKey::new(key).encode();
            if let Some(meta_value) = snapshot
                .get_cf(&meta_cf, &base_meta_key)
                .context(RocksSnafu)?
            {
                if meta_value_is_stale(&meta_value)? {
                    continue;
                }
                if !expected_meta_value(DataType::Set, &meta_value) {
                    return Err(wrong_type_error(key, &meta_value));
                }
                let parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;
                valid_sets.push(KeyVersion::new(
                    key.to_vec(),
                    parsed_sets_meta_value.version(),
                ));
            }
        }

        let mut members = Vec::new();
        let mut seen: HashSet<Vec<u8>> = HashSet::new();
        for key_version in &valid_sets {
            let prefix = SetsMemberKey::new(&key_version.key, key_version.version, b"").encode();
            let iter =
                snapshot.iterator_cf(&data_cf, IteratorMode::From(&prefix, Direction::Forward));
            for item in iter {
                let (raw_key, _) = item.context(RocksSnafu)?;
                if !raw_key.starts_with(&prefix) {
                    break;
                }
                let member = ParsedSetsMemberKey::new(&raw_key)?.member().to_vec();
                if seen.insert(member.clone()) {
                    members.push(member);
                }
            }
        }

        self.store_members(destination, &members)
    }

    /// Writes a computed member list as the new content of `destination`.
    /// Prior content is logically erased by a version bump; a destination
    /// holding another type is simply overwritten.
    fn store_members(&self, destination: &[u8], members: &[Vec<u8>]) -> Result<i32> {
        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.get_cf_handle(ColumnFamilyIndex::SetsDataCF)?;

        let mut batch = WriteBatch::default();
        let mut statistic = 0u64;
        let base_destination = BaseMetaKey::new(destination).encode();
        let version;

        match db.get_cf(&meta_cf, &base_destination).context(RocksSnafu)? {
            Some(meta_value) if expected_meta_value(DataType::Set, &meta_value) => {
                let mut parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;
                statistic = parsed_sets_meta_value.count() as u64;
                version = parsed_sets_meta_value.initial_meta_value();
                ensure!(
                    parsed_sets_meta_value.check_set_count(members.len()),
                    InvalidArgumentSnafu {
                        message: "set size overflow",
                    }
                );
                parsed_sets_meta_value.set_count(members.len() as i32);
                batch.put_cf(&meta_cf, &base_destination, parsed_sets_meta_value.encoded());
            }
            _ => {
                let mut sets_meta_value = SetsMetaValue::new(DataType::Set, members.len() as i32);
                version = sets_meta_value.update_version();
                batch.put_cf(&meta_cf, &base_destination, sets_meta_value.encode());
            }
        }

        for member in members {
            let sets_member_key = SetsMemberKey::new(destination, version, member).encode();
            batch.put_cf(&data_cf, &sets_member_key, BaseDataValue::new(Bytes::new()).encode());
        }

        db.write(batch).context(RocksSnafu)?;
        self.update_specific_key_statistics(DataType::Set, destination, statistic);
        Ok(members.len() as i32)
    }

    /// Paginated member scan with glob filtering. The continuation point
    /// is kept in the scan cursor store; a lost entry restarts the scan.
    pub fn sscan(
        &self,
        key: &[u8],
        cursor: i64,
        pattern: &[u8],
        count: i64,
    ) -> Result<(i64, Vec<Vec<u8>>)> {
        if cursor < 0 {
            return Ok((0, Vec::new()));
        }

        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.get_cf_handle(ColumnFamilyIndex::SetsDataCF)?;
        let snapshot = db.snapshot();

        let base_meta_key = BaseMetaKey::new(key).encode();
        let Some(meta_value) = snapshot
            .get_cf(&meta_cf, &base_meta_key)
            .context(RocksSnafu)?
        else {
            return Err(Error::key_not_found(key));
        };
        self.check_set_meta(key, &meta_value)?;
        let parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;
        let version = parsed_sets_meta_value.version();

        let mut cursor = cursor;
        let sub_member: &[u8] = if is_tail_wildcard(pattern) {
            &pattern[..pattern.len() - 1]
        } else {
            b""
        };
        let start_point = match self.get_scan_start_point(DataType::Set, key, pattern, cursor) {
            Some(point) => point,
            None => {
                cursor = 0;
                sub_member.to_vec()
            }
        };

        let prefix = SetsMemberKey::new(key, version, sub_member).encode();
        let seek_key = SetsMemberKey::new(key, version, &start_point).encode();

        let mut members = Vec::new();
        let mut rest = count;
        let mut iter = snapshot.raw_iterator_cf(&data_cf);
        iter.seek(&seek_key);
        while rest > 0 && iter.valid() {
            let Some(raw_key) = iter.key() else {
                break;
            };
            if !raw_key.starts_with(&prefix) {
                break;
            }
            let member = ParsedSetsMemberKey::new(raw_key)?.member().to_vec();
            if string_match(pattern, &member) {
                members.push(member);
            }
            rest -= 1;
            iter.next();
        }
        iter.status().context(RocksSnafu)?;

        let mut next_cursor = 0;
        if iter.valid() {
            if let Some(raw_key) = iter.key() {
                if raw_key.starts_with(&prefix) {
                    next_cursor = cursor + count;
                    let next_member = ParsedSetsMemberKey::new(raw_key)?.member().to_vec();
                    self.store_scan_next_point(
                        DataType::Set,
                        key,
                        pattern,
                        next_cursor,
                        &next_member,
                    );
                }
            }
        }
        Ok((next_cursor, members))
    }

    /// Moves the whole set at `key` to `newkey` on `new_inst`: the header
    /// and every member record are rewritten there, then the source header
    /// is logically deleted. Each instance commits its own batch; the move
    /// is atomic per instance, not across both.
    pub fn sets_rename(&self, key: &[u8], new_inst: &Redis, newkey: &[u8]) -> Result<()> {
        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;

        let keys: [&[u8]; 2] = [key, newkey];
        let _lock = MultiScopeRecordLock::new(self.lock_mgr.as_ref(), &keys);

        let base_meta_key = BaseMetaKey::new(key).encode();
        let base_meta_newkey = BaseMetaKey::new(newkey).encode();

        let Some(meta_value) = db.get_cf(&meta_cf, &base_meta_key).context(RocksSnafu)? else {
            return Err(Error::key_not_found(key));
        };
        self.check_set_meta(key, &meta_value)?;
        let mut parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;
        if parsed_sets_meta_value.count() == 0 {
            return Err(Error::key_not_found(key));
        }
        let statistic = parsed_sets_meta_value.count() as u64;

        self.copy_set_records(new_inst, key, newkey, &base_meta_newkey, &meta_value)?;
        new_inst.update_specific_key_statistics(DataType::Set, newkey, statistic);

        parsed_sets_meta_value.initial_meta_value();
        db.put_cf(&meta_cf, &base_meta_key, parsed_sets_meta_value.encoded())
            .context(RocksSnafu)?;
        self.update_specific_key_statistics(DataType::Set, key, statistic);
        Ok(())
    }

    /// SETSRENAME that refuses to overwrite a live destination.
    pub fn sets_renamenx(&self, key: &[u8], new_inst: &Redis, newkey: &[u8]) -> Result<()> {
        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;

        let keys: [&[u8]; 2] = [key, newkey];
        let _lock = MultiScopeRecordLock::new(self.lock_mgr.as_ref(), &keys);

        let base_meta_key = BaseMetaKey::new(key).encode();
        let base_meta_newkey = BaseMetaKey::new(newkey).encode();

        let Some(meta_value) = db.get_cf(&meta_cf, &base_meta_key).context(RocksSnafu)? else {
            return Err(Error::key_not_found(key));
        };
        self.check_set_meta(key, &meta_value)?;
        let mut parsed_sets_meta_value = ParsedSetsMetaValue::new(&meta_value[..])?;
        if parsed_sets_meta_value.count() == 0 {
            return Err(Error::key_not_found(key));
        }
        let statistic = parsed_sets_meta_value.count() as u64;

        let new_db = new_inst.db()?;
        let new_meta_cf = new_inst.get_cf_handle(ColumnFamilyIndex::MetaCF)?;
        if let Some(new_meta_value) = new_db
            .get_cf(&new_meta_cf, &base_meta_newkey)
            .context(RocksSnafu)?
        {
            let parsed_new_meta_value = ParsedSetsMetaValue::new(&new_meta_value[..])?;
            if !parsed_new_meta_value.is_stale() && parsed_new_meta_value.count() != 0 {
                return CorruptionSnafu {
                    message: "newkey already exists",
                }
                .fail();
            }
        }

        self.copy_set_records(new_inst, key, newkey, &base_meta_newkey, &meta_value)?;
        new_inst.update_specific_key_statistics(DataType::Set, newkey, statistic);

        parsed_sets_meta_value.initial_meta_value();
        db.put_cf(&meta_cf, &base_meta_key, parsed_sets_meta_value.encoded())
            .context(RocksSnafu)?;
        self.update_specific_key_statistics(DataType::Set, key, statistic);
        Ok(())
    }

    /// Writes the source header verbatim and one member record per live
    /// member under `newkey` on the destination instance, in one batch.
    /// The copied header keeps its version, so the copied members are
    /// found under the same generation.
    fn copy_set_records(
        &self,
        new_inst: &Redis,
        key: &[u8],
        newkey: &[u8],
        base_meta_newkey: &[u8],
        meta_value: &[u8],
    ) -> Result<()> {
        let db = self.db()?;
        let data_cf = self.get_cf_handle(ColumnFamilyIndex::SetsDataCF)?;
        let new_db = new_inst.db()?;
        let new_meta_cf = new_inst.get_cf_handle(ColumnFamilyIndex::MetaCF)?;
        let new_data_cf = new_inst.get_cf_handle(ColumnFamilyIndex::SetsDataCF)?;

        let version = ParsedSetsMetaValue::new(meta_value)?.version();

        let mut batch = WriteBatch::default();
        batch.put_cf(&new_meta_cf, base_meta_newkey, meta_value);

        let prefix = SetsMemberKey::new(key, version, b"").encode();
        let iter = db.iterator_cf(&data_cf, IteratorMode::From(&prefix, Direction::Forward));
        for item in iter {
            let (raw_key, raw_value) = item.context(RocksSnafu)?;
            if !raw_key.starts_with(&prefix) {
                break;
            }
            let member = ParsedSetsMemberKey::new(&raw_key)?;
            let new_member_key = SetsMemberKey::new(newkey, version, member.member()).encode();
            batch.put_cf(&new_data_cf, &new_member_key, &raw_value);
        }

        new_db.write(batch).context(RocksSnafu)?;
        Ok(())
    }
}
