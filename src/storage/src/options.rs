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

use rocksdb::Options;

/// Engine configuration shared by every storage instance.
pub struct StorageOptions {
    /// Base RocksDB options, cloned per column family.
    pub options: Options,
    /// Per-CF block cache size in bytes; 0 leaves the RocksDB default.
    pub block_cache_size: usize,
    /// When true the default block cache is shared instead of per-CF.
    pub share_block_cache: bool,
    /// Capacity of the per-instance key statistics table.
    pub statistics_max_size: usize,
    /// Modify-count threshold after which a compact-range hint is posted
    /// for a key; 0 disables the statistics path.
    pub small_compaction_threshold: usize,
    /// Number of RocksDB instances opened under one database directory.
    pub db_instance_num: usize,
    pub db_id: usize,
}

impl Default for StorageOptions {
    fn default() -> Self {
        let mut options = Options::default();
        options.create_if_missing(true);
        options.create_missing_column_families(true);

        Self {
            options,
            block_cache_size: 8 << 20,
            share_block_cache: false,
            statistics_max_size: 10000,
            small_compaction_threshold: 5000,
            db_instance_num: 1,
            db_id: 0,
        }
    }
}
