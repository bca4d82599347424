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

//! Compaction filters reclaiming logically deleted records.
//!
//! Bumping a set's version (or letting it expire) erases its members only
//! logically; these filters drop the dead records during background
//! compaction.

use std::{
    ffi::CStr,
    sync::{Arc, OnceLock, Weak},
};

use log::debug;
use rocksdb::{
    compaction_filter::CompactionFilter, compaction_filter_factory::CompactionFilterFactory,
    CompactionDecision, DB,
};

use crate::{
    base_meta_value_format::{ParsedBaseMetaValue, ParsedSetsMetaValue},
    base_key_format::BaseMetaKey,
    base_value_format::DataType,
    member_data_key_format::ParsedSetsMemberKey,
    redis::ColumnFamilyIndex,
    util::{now_micros, now_seconds},
};

/// Drops set meta records that are stale or logically empty. The version
/// guard keeps a header a concurrent writer is about to reuse.
#[derive(Debug, Default)]
pub struct SetsMetaFilter;

impl CompactionFilter for SetsMetaFilter {
    fn name(&self) -> &CStr {
        c"SetsMetaFilter"
    }

    fn filter(&mut self, _level: u32, key: &[u8], value: &[u8]) -> CompactionDecision {
        let parsed_meta_value = match ParsedBaseMetaValue::new(value) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("SetsMetaFilter: unreadable meta value for key {key:?}: {e}, remove");
                return CompactionDecision::Remove;
            }
        };

        // other types own their records' lifecycle
        if parsed_meta_value.data_type() != DataType::Set {
            return CompactionDecision::Keep;
        }

        if (parsed_meta_value.is_stale() || parsed_meta_value.count() == 0)
            && parsed_meta_value.version() < now_micros()
        {
            debug!("SetsMetaFilter: drop dead set header for key {key:?}");
            return CompactionDecision::Remove;
        }
        CompactionDecision::Keep
    }
}

#[derive(Debug, Default)]
pub struct SetsMetaFilterFactory;

impl CompactionFilterFactory for SetsMetaFilterFactory {
    type Filter = SetsMetaFilter;

    fn create(
        &mut self,
        _context: rocksdb::compaction_filter_factory::CompactionFilterContext,
    ) -> Self::Filter {
        SetsMetaFilter
    }

    fn name(&self) -> &CStr {
        c"SetsMetaFilterFactory"
    }
}

/// Drops member records whose generation is dead: meta missing, stale, of
/// another type, or carrying a newer version. The current meta is looked
/// up once per run of consecutive entries of the same user key.
pub struct SetsDataFilter {
    db: Weak<DB>,
    cur_key: Option<Vec<u8>>,
    meta_not_found: bool,
    cur_meta_version: u64,
    cur_meta_etime: u64,
}

impl SetsDataFilter {
    fn new(db: Weak<DB>) -> Self {
        Self {
            db,
            cur_key: None,
            meta_not_found: false,
            cur_meta_version: 0,
            cur_meta_etime: 0,
        }
    }
}

impl CompactionFilter for SetsDataFilter {
    fn name(&self) -> &CStr {
        c"SetsDataFilter"
    }

    fn filter(&mut self, _level: u32, key: &[u8], _value: &[u8]) -> CompactionDecision {
        let Some(db) = self.db.upgrade() else {
            // the database is shutting down
            return CompactionDecision::Keep;
        };

        let parsed_member_key = match ParsedSetsMemberKey::new(key) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("SetsDataFilter: unreadable member key {key:?}: {e}, remove");
                return CompactionDecision::Remove;
            }
        };

        if self.cur_key.as_deref() != Some(parsed_member_key.key()) {
            self.cur_key = Some(parsed_member_key.key().to_vec());
            self.meta_not_found = true;
            self.cur_meta_version = 0;
            self.cur_meta_etime = 0;

            let Some(meta_cf) = db.cf_handle(ColumnFamilyIndex::MetaCF.name()) else {
                self.cur_key = None;
                return CompactionDecision::Keep;
            };
            let meta_key = BaseMetaKey::new(parsed_member_key.key()).encode();
            match db.get_cf(&meta_cf, &meta_key) {
                Ok(Some(meta_value)) => {
                    if meta_value.first() != Some(&(DataType::Set as u8)) {
                        // the key was rewritten as another type
                        return CompactionDecision::Remove;
                    }
                    match ParsedSetsMetaValue::new(&meta_value[..]) {
                        Ok(parsed_meta_value) => {
                            self.meta_not_found = false;
                            self.cur_meta_version = parsed_meta_value.version();
                            self.cur_meta_etime = parsed_meta_value.etime();
                        }
                        Err(e) => {
                            debug!("SetsDataFilter: unreadable meta value: {e}, reserve");
                            self.cur_key = None;
                            return CompactionDecision::Keep;
                        }
                    }
                }
                Ok(None) => {
                    self.meta_not_found = true;
                }
                Err(e) => {
                    debug!("SetsDataFilter: meta lookup failed: {e}, reserve");
                    self.cur_key = None;
                    return CompactionDecision::Keep;
                }
            }
        }

        if self.meta_not_found {
            return CompactionDecision::Remove;
        }
        if self.cur_meta_etime != 0 && self.cur_meta_etime <= now_seconds() {
            return CompactionDecision::Remove;
        }
        if self.cur_meta_version > parsed_member_key.version() {
            return CompactionDecision::Remove;
        }
        CompactionDecision::Keep
    }
}

/// The data filter reads the meta CF through a DB handle that does not
/// exist yet when column family options are built; the cell is filled in
/// right after open.
pub struct SetsDataFilterFactory {
    db: Arc<OnceLock<Weak<DB>>>,
}

impl SetsDataFilterFactory {
    pub fn new(db: Arc<OnceLock<Weak<DB>>>) -> Self {
        Self { db }
    }
}

impl CompactionFilterFactory for SetsDataFilterFactory {
    type Filter = SetsDataFilter;

    fn create(
        &mut self,
        _context: rocksdb::compaction_filter_factory::CompactionFilterContext,
    ) -> Self::Filter {
        SetsDataFilter::new(self.db.get().cloned().unwrap_or_default())
    }

    fn name(&self) -> &CStr {
        c"SetsDataFilterFactory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base_meta_value_format::BaseMetaValue;

    #[test]
    fn test_meta_filter_keeps_live_set() {
        let mut filter = SetsMetaFilter;
        let mut meta = BaseMetaValue::new(DataType::Set, 3);
        meta.update_version();
        let encoded = meta.encode();
        let meta_key = BaseMetaKey::new(b"k").encode();

        let decision = filter.filter(0, &meta_key, &encoded);
        assert!(matches!(decision, CompactionDecision::Keep));
    }

    #[test]
    fn test_meta_filter_drops_stale_set() {
        let mut filter = SetsMetaFilter;
        let mut meta = BaseMetaValue::new(DataType::Set, 3);
        meta.set_etime(1);
        let encoded = meta.encode();
        let meta_key = BaseMetaKey::new(b"k").encode();

        let decision = filter.filter(0, &meta_key, &encoded);
        assert!(matches!(decision, CompactionDecision::Remove));
    }

    #[test]
    fn test_meta_filter_drops_empty_set() {
        let mut filter = SetsMetaFilter;
        let encoded = BaseMetaValue::new(DataType::Set, 0).encode();
        let meta_key = BaseMetaKey::new(b"k").encode();

        let decision = filter.filter(0, &meta_key, &encoded);
        assert!(matches!(decision, CompactionDecision::Remove));
    }

    #[test]
    fn test_meta_filter_ignores_other_types() {
        let mut filter = SetsMetaFilter;
        let encoded = BaseMetaValue::new(DataType::String, 0).encode();
        let meta_key = BaseMetaKey::new(b"k").encode();

        let decision = filter.filter(0, &meta_key, &encoded);
        assert!(matches!(decision, CompactionDecision::Keep));
    }

    #[test]
    fn test_data_filter_keeps_when_db_is_gone() {
        let mut filter = SetsDataFilter::new(Weak::new());
        let member_key = crate::member_data_key_format::SetsMemberKey::new(b"k", 1, b"m").encode();

        let decision = filter.filter(0, &member_key, b"");
        assert!(matches!(decision, CompactionDecision::Keep));
    }
}
