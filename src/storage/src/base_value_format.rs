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

use crate::error::{Error, InvalidFormatSnafu, Result};

/// Data-type tag carried in the first byte of every meta value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    String = 0,
    Hash = 1,
    Set = 2,
    List = 3,
    ZSet = 4,
    None = 5,
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(DataType::String),
            1 => Ok(DataType::Hash),
            2 => Ok(DataType::Set),
            3 => Ok(DataType::List),
            4 => Ok(DataType::ZSet),
            5 => Ok(DataType::None),
            _ => InvalidFormatSnafu {
                message: format!("Invalid data type byte: {value}"),
            }
            .fail(),
        }
    }
}

pub const DATA_TYPE_STRINGS: [&str; 6] = ["strings", "hashes", "sets", "lists", "zsets", "none"];
pub const DATA_TYPE_TAG: [u8; 6] = [b'k', b'h', b's', b'l', b'z', b'n'];

pub fn data_type_to_string(data_type: DataType) -> &'static str {
    DATA_TYPE_STRINGS[data_type as usize]
}

pub fn data_type_to_tag(data_type: DataType) -> u8 {
    DATA_TYPE_TAG[data_type as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_roundtrip() {
        for data_type in [
            DataType::String,
            DataType::Hash,
            DataType::Set,
            DataType::List,
            DataType::ZSet,
            DataType::None,
        ] {
            assert_eq!(DataType::try_from(data_type as u8).unwrap(), data_type);
        }
        assert!(DataType::try_from(42).is_err());
    }

    #[test]
    fn test_data_type_to_string() {
        assert_eq!(data_type_to_string(DataType::Set), "sets");
        assert_eq!(data_type_to_string(DataType::String), "strings");
        assert_eq!(data_type_to_string(DataType::Hash), "hashes");
    }

    #[test]
    fn test_data_type_to_tag() {
        assert_eq!(data_type_to_tag(DataType::Set), b's');
        assert_eq!(data_type_to_tag(DataType::String), b'k');
    }
}
