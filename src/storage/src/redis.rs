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

use std::sync::{Arc, OnceLock, Weak};

use kstd::lock_mgr::LockMgr;
use log::{debug, info};
use rocksdb::{BlockBasedOptions, BoundColumnFamily, ColumnFamilyDescriptor, DB};
use snafu::{OptionExt, ResultExt};

use crate::{
    base_filter::{SetsDataFilterFactory, SetsMetaFilterFactory},
    base_key_format::BaseMetaKey,
    base_meta_value_format::ParsedBaseMetaValue,
    base_value_format::{data_type_to_string, data_type_to_tag, DataType},
    error::{Error, OptionNoneSnafu, Result, RocksSnafu, WrongTypeSnafu},
    lru_cache::LruStore,
    member_data_key_format::SetsMemberKey,
    options::StorageOptions,
    storage::{BgTask, BgTaskHandler},
    types::KeyStatistics,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFamilyIndex {
    MetaCF = 0,     // meta records of every data type
    SetsDataCF = 1, // set member records
}

impl ColumnFamilyIndex {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnFamilyIndex::MetaCF => "default",
            ColumnFamilyIndex::SetsDataCF => "set_data_cf",
        }
    }
}

/// One RocksDB instance of the storage engine.
pub struct Redis {
    pub index: i32,
    pub lock_mgr: Arc<LockMgr>,
    pub db: Option<Arc<DB>>,

    options: Arc<StorageOptions>,
    bg_task_handler: Arc<BgTaskHandler>,
    // handed to the data compaction filter factory before the DB exists,
    // filled in right after open
    filter_db: Arc<OnceLock<Weak<DB>>>,

    statistics_store: LruStore<Vec<u8>, KeyStatistics>,
    scan_cursors_store: LruStore<Vec<u8>, Vec<u8>>,
    spop_counts_store: LruStore<Vec<u8>, u64>,
    small_compaction_threshold: u64,
}

impl Redis {
    pub fn new(
        options: Arc<StorageOptions>,
        index: i32,
        bg_task_handler: Arc<BgTaskHandler>,
        lock_mgr: Arc<LockMgr>,
    ) -> Self {
        let small_compaction_threshold = options.small_compaction_threshold as u64;
        let statistics_max_size = options.statistics_max_size;
        Self {
            index,
            lock_mgr,
            db: None,
            options,
            bg_task_handler,
            filter_db: Arc::new(OnceLock::new()),
            statistics_store: LruStore::new(statistics_max_size),
            scan_cursors_store: LruStore::new(5000),
            spop_counts_store: LruStore::new(1000),
            small_compaction_threshold,
        }
    }

    pub fn open(&mut self, db_path: &str) -> Result<()> {
        let column_families = vec![
            self.create_cf_options(ColumnFamilyIndex::MetaCF, true),
            self.create_cf_options(ColumnFamilyIndex::SetsDataCF, false),
        ];

        let db = Arc::new(
            DB::open_cf_descriptors(&self.options.options, db_path, column_families)
                .context(RocksSnafu)?,
        );
        let _ = self.filter_db.set(Arc::downgrade(&db));
        self.db = Some(db);

        info!("open RocksDB instance {} at {db_path}", self.index);
        Ok(())
    }

    fn create_cf_options(
        &self,
        cf_index: ColumnFamilyIndex,
        use_bloom_filter: bool,
    ) -> ColumnFamilyDescriptor {
        let mut cf_opts = self.options.options.clone();
        let mut table_opts = BlockBasedOptions::default();

        if use_bloom_filter {
            table_opts.set_bloom_filter(10.0, true);
        }
        if !self.options.share_block_cache && self.options.block_cache_size > 0 {
            let cache = rocksdb::Cache::new_lru_cache(self.options.block_cache_size);
            table_opts.set_block_cache(&cache);
        }
        cf_opts.set_block_based_table_factory(&table_opts);

        match cf_index {
            ColumnFamilyIndex::MetaCF => {
                cf_opts.set_compaction_filter_factory(SetsMetaFilterFactory);
            }
            ColumnFamilyIndex::SetsDataCF => {
                cf_opts
                    .set_compaction_filter_factory(SetsDataFilterFactory::new(Arc::clone(
                        &self.filter_db,
                    )));
            }
        }

        ColumnFamilyDescriptor::new(cf_index.name(), cf_opts)
    }

    pub(crate) fn db(&self) -> Result<&Arc<DB>> {
        self.db.as_ref().context(OptionNoneSnafu {
            message: "db is not initialized",
        })
    }

    pub fn get_cf_handle(&self, cf_index: ColumnFamilyIndex) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db()?
            .cf_handle(cf_index.name())
            .context(OptionNoneSnafu {
                message: format!("column family {} is not initialized", cf_index.name()),
            })
    }

    /// Read-path guard over a fetched meta value: a stale record of any
    /// type reads as a missing key, a live record of another type is a
    /// type error.
    pub(crate) fn check_set_meta(&self, key: &[u8], meta_value: &[u8]) -> Result<()> {
        if meta_value_is_stale(meta_value)? {
            return Err(Error::key_not_found(key));
        }
        if !expected_meta_value(DataType::Set, meta_value) {
            return Err(wrong_type_error(key, meta_value));
        }
        Ok(())
    }

    /// Records destructive writes against `key` and posts a compact-range
    /// hint once the accumulated count crosses the threshold.
    pub(crate) fn update_specific_key_statistics(
        &self,
        data_type: DataType,
        key: &[u8],
        count: u64,
    ) {
        if count == 0 || self.small_compaction_threshold == 0 {
            return;
        }

        let mut statistics = self
            .statistics_store
            .lookup(&key.to_vec())
            .unwrap_or_default();
        statistics.modify_count += count;

        if statistics.modify_count >= self.small_compaction_threshold {
            self.statistics_store.remove(&key.to_vec());
            let task = BgTask::CompactRange {
                data_type,
                start: key.to_vec(),
                end: key.to_vec(),
            };
            if let Err(e) = self.bg_task_handler.try_send(task) {
                debug!("drop compact-range hint for instance {}: {e}", self.index);
            }
        } else {
            self.statistics_store.insert(key.to_vec(), statistics);
        }
    }

    /// Manual compaction of one key's meta record and member prefix.
    pub fn compact_key_range(&self, key: &[u8]) -> Result<()> {
        let db = self.db()?;
        let meta_cf = self.get_cf_handle(ColumnFamilyIndex::MetaCF)?;
        let data_cf = self.get_cf_handle(ColumnFamilyIndex::SetsDataCF)?;

        let meta_key = BaseMetaKey::new(key).encode();
        db.compact_range_cf(&meta_cf, Some(&meta_key), Some(&meta_key));

        let begin = SetsMemberKey::new(key, 0, b"").encode();
        let end = SetsMemberKey::new(key, u64::MAX, b"").encode();
        db.compact_range_cf(&data_cf, Some(&begin), Some(&end));
        Ok(())
    }

    // scan cursor store, keyed by (type tag, key, pattern, cursor)

    pub fn get_scan_start_point(
        &self,
        data_type: DataType,
        key: &[u8],
        pattern: &[u8],
        cursor: i64,
    ) -> Option<Vec<u8>> {
        let index_key = scan_cursor_index_key(data_type, key, pattern, cursor);
        self.scan_cursors_store.lookup(&index_key)
    }

    pub fn store_scan_next_point(
        &self,
        data_type: DataType,
        key: &[u8],
        pattern: &[u8],
        cursor: i64,
        next_point: &[u8],
    ) {
        let index_key = scan_cursor_index_key(data_type, key, pattern, cursor);
        self.scan_cursors_store.insert(index_key, next_point.to_vec());
    }

    // SPOP counter

    pub fn reset_spop_count(&self, key: &[u8]) {
        self.spop_counts_store.remove(&key.to_vec());
    }

    pub fn add_and_get_spop_count(&self, key: &[u8]) -> u64 {
        let count = self.spop_counts_store.lookup(&key.to_vec()).unwrap_or(0) + 1;
        self.spop_counts_store.insert(key.to_vec(), count);
        count
    }
}

fn scan_cursor_index_key(data_type: DataType, key: &[u8], pattern: &[u8], cursor: i64) -> Vec<u8> {
    let cursor = cursor.to_string();
    let mut index_key = Vec::with_capacity(key.len() + pattern.len() + cursor.len() + 4);
    index_key.push(data_type_to_tag(data_type));
    index_key.push(b'_');
    index_key.extend_from_slice(key);
    index_key.push(b'_');
    index_key.extend_from_slice(pattern);
    index_key.push(b'_');
    index_key.extend_from_slice(cursor.as_bytes());
    index_key
}

/// Data-type tag of an encoded meta value, `None` when unreadable.
pub(crate) fn get_meta_value_type(meta_value: &[u8]) -> DataType {
    meta_value
        .first()
        .and_then(|&tag| DataType::try_from(tag).ok())
        .unwrap_or(DataType::None)
}

pub(crate) fn expected_meta_value(data_type: DataType, meta_value: &[u8]) -> bool {
    get_meta_value_type(meta_value) == data_type
}

/// Staleness of a meta record regardless of its data type; every type
/// shares the etime field location.
pub(crate) fn meta_value_is_stale(meta_value: &[u8]) -> Result<bool> {
    Ok(ParsedBaseMetaValue::new(meta_value)?.is_stale())
}

pub(crate) fn wrong_type_error(key: &[u8], meta_value: &[u8]) -> Error {
    WrongTypeSnafu {
        key: key_str(key),
        expected: data_type_to_string(DataType::Set),
        actual: data_type_to_string(get_meta_value_type(meta_value)),
    }
    .build()
}

pub(crate) fn key_str(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}

impl Error {
    pub(crate) fn key_not_found(key: &[u8]) -> Error {
        crate::error::KeyNotFoundSnafu { key: key_str(key) }.build()
    }
}

impl Drop for Redis {
    fn drop(&mut self) {
        if let Some(db) = self.db.take() {
            db.cancel_all_background_work(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base_meta_value_format::BaseMetaValue;

    #[test]
    fn test_column_family_names() {
        assert_eq!(ColumnFamilyIndex::MetaCF.name(), "default");
        assert_eq!(ColumnFamilyIndex::SetsDataCF.name(), "set_data_cf");
    }

    #[test]
    fn test_scan_cursor_index_key() {
        let index_key = scan_cursor_index_key(DataType::Set, b"k", b"m*", 30);
        assert_eq!(index_key, b"s_k_m*_30");
    }

    #[test]
    fn test_expected_meta_value() {
        let set_meta = BaseMetaValue::new(DataType::Set, 1).encode();
        assert!(expected_meta_value(DataType::Set, &set_meta));

        let string_meta = BaseMetaValue::new(DataType::String, 0).encode();
        assert!(!expected_meta_value(DataType::Set, &string_meta));
        assert_eq!(get_meta_value_type(&string_meta), DataType::String);
    }

    #[test]
    fn test_wrong_type_error_message() {
        let string_meta = BaseMetaValue::new(DataType::String, 0).encode();
        let err = wrong_type_error(b"k", &string_meta);
        assert_eq!(
            err.to_string(),
            "WRONGTYPE, key: k, expect type: sets, get type: strings"
        );
    }
}
