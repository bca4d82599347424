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

//! Set data type layer of a Redis-compatible store backed by RocksDB.
//!
//! A set lives in two key spaces: a meta record per user key (type tag,
//! cardinality, logical version, TTL) and one sentinel record per
//! (key, version, member). Bumping the version logically erases all
//! members of earlier generations; compaction filters reclaim them in the
//! background.

mod base_data_value_format;
mod base_filter;
mod base_key_format;
mod base_meta_value_format;
mod base_value_format;
mod coding;
mod error;
mod lru_cache;
mod member_data_key_format;
mod options;
mod redis;
mod redis_sets;
mod slot_indexer;
mod storage;
mod storage_define;
mod types;
mod util;

pub use base_data_value_format::{BaseDataValue, ParsedBaseDataValue};
pub use base_key_format::{BaseMetaKey, ParsedBaseMetaKey};
pub use base_meta_value_format::{
    BaseMetaValue, ParsedBaseMetaValue, ParsedSetsMetaValue, SetsMetaValue,
};
pub use base_value_format::{data_type_to_string, DataType};
pub use error::{Error, Result};
pub use member_data_key_format::{ParsedSetsMemberKey, SetsMemberKey};
pub use options::StorageOptions;
pub use redis::{ColumnFamilyIndex, Redis};
pub use storage::{BgTask, BgTaskHandler, Storage};
pub use types::{KeyInfo, KeyVersion};
