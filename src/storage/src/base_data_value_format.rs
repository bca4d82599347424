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

use bytes::{BufMut, Bytes, BytesMut};
use snafu::ensure;

use crate::{
    error::{InvalidFormatSnafu, Result},
    storage_define::{BASE_DATA_VALUE_SUFFIX_LENGTH, SUFFIX_RESERVE_LENGTH, TIMESTAMP_LENGTH},
    util::now_seconds,
};

/*
 * set member value format. membership is the presence of the record; the
 * user value stays empty for sets.
 *
 * | user value | reserve | ctime |
 * |            |   16B   |  8B   |
 */
pub struct BaseDataValue {
    user_value: Bytes,
    reserve: [u8; SUFFIX_RESERVE_LENGTH],
    ctime: u64,
}

impl BaseDataValue {
    pub fn new<T>(user_value: T) -> Self
    where
        T: Into<Bytes>,
    {
        Self {
            user_value: user_value.into(),
            reserve: [0; SUFFIX_RESERVE_LENGTH],
            ctime: now_seconds(),
        }
    }

    pub fn encode(&self) -> BytesMut {
        let mut buf =
            BytesMut::with_capacity(self.user_value.len() + BASE_DATA_VALUE_SUFFIX_LENGTH);
        buf.put_slice(&self.user_value);
        buf.put_slice(&self.reserve);
        buf.put_u64_le(self.ctime);
        buf
    }
}

pub struct ParsedBaseDataValue {
    value: BytesMut,
    ctime: u64,
}

impl ParsedBaseDataValue {
    pub fn new<T>(data_value: T) -> Result<Self>
    where
        T: Into<BytesMut>,
    {
        let value: BytesMut = data_value.into();
        ensure!(
            value.len() >= BASE_DATA_VALUE_SUFFIX_LENGTH,
            InvalidFormatSnafu {
                message: format!(
                    "invalid data value length: {} < {}",
                    value.len(),
                    BASE_DATA_VALUE_SUFFIX_LENGTH,
                ),
            }
        );

        let ctime_start = value.len() - TIMESTAMP_LENGTH;
        let ctime = u64::from_le_bytes(value[ctime_start..].try_into().unwrap());
        Ok(Self { value, ctime })
    }

    pub fn user_value(&self) -> &[u8] {
        &self.value[..self.value.len() - BASE_DATA_VALUE_SUFFIX_LENGTH]
    }

    pub fn ctime(&self) -> u64 {
        self.ctime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_value_encode_and_decode() {
        let encoded = BaseDataValue::new(&b"payload"[..]).encode();
        assert_eq!(encoded.len(), 7 + BASE_DATA_VALUE_SUFFIX_LENGTH);

        let parsed = ParsedBaseDataValue::new(encoded).unwrap();
        assert_eq!(parsed.user_value(), b"payload");
        assert!(parsed.ctime() > 0);
    }

    #[test]
    fn test_empty_sentinel_value() {
        let encoded = BaseDataValue::new(Bytes::new()).encode();
        assert_eq!(encoded.len(), BASE_DATA_VALUE_SUFFIX_LENGTH);

        let parsed = ParsedBaseDataValue::new(encoded).unwrap();
        assert!(parsed.user_value().is_empty());
    }

    #[test]
    fn test_data_value_rejects_short_buffer() {
        assert!(ParsedBaseDataValue::new(&b"short"[..]).is_err());
    }
}
