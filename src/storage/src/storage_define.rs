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

//! Field widths and offsets of the persistent binary formats.

pub const TYPE_LENGTH: usize = 1;
pub const COUNT_LENGTH: usize = 4;
pub const VERSION_LENGTH: usize = 8;
pub const TIMESTAMP_LENGTH: usize = 8;

// meta value layout, shared by every data type:
// | type | count | version | etime | ctime |
// |  1B  |  4B   |   8B    |  8B   |  8B   |
pub const COUNT_OFFSET: usize = TYPE_LENGTH;
pub const VERSION_OFFSET: usize = COUNT_OFFSET + COUNT_LENGTH;
pub const ETIME_OFFSET: usize = VERSION_OFFSET + VERSION_LENGTH;
pub const CTIME_OFFSET: usize = ETIME_OFFSET + TIMESTAMP_LENGTH;
pub const BASE_META_VALUE_LENGTH: usize = CTIME_OFFSET + TIMESTAMP_LENGTH;

// data value layout:
// | user value | reserve | ctime |
// |            |   16B   |  8B   |
pub const SUFFIX_RESERVE_LENGTH: usize = 16;
pub const BASE_DATA_VALUE_SUFFIX_LENGTH: usize = SUFFIX_RESERVE_LENGTH + TIMESTAMP_LENGTH;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_value_layout() {
        assert_eq!(COUNT_OFFSET, 1);
        assert_eq!(VERSION_OFFSET, 5);
        assert_eq!(ETIME_OFFSET, 13);
        assert_eq!(CTIME_OFFSET, 21);
        assert_eq!(BASE_META_VALUE_LENGTH, 29);
    }

    #[test]
    fn test_data_value_suffix_length() {
        assert_eq!(BASE_DATA_VALUE_SUFFIX_LENGTH, 24);
    }
}
