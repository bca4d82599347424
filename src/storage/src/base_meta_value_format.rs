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

use bytes::{BufMut, BytesMut};
use snafu::ensure;

use crate::{
    base_value_format::DataType,
    error::{InvalidFormatSnafu, Result},
    storage_define::{
        BASE_META_VALUE_LENGTH, COUNT_LENGTH, COUNT_OFFSET, CTIME_OFFSET, ETIME_OFFSET,
        TIMESTAMP_LENGTH, VERSION_LENGTH, VERSION_OFFSET,
    },
    util::{now_micros, now_seconds},
};

pub type SetsMetaValue = BaseMetaValue;
pub type ParsedSetsMetaValue = ParsedBaseMetaValue;

/*
 * meta value layout, shared by every data type. the 4-byte count field is
 * type-specific payload (element count for sets).
 *
 * | type | count | version | etime | ctime |
 * |  1B  |  4B   |   8B    |  8B   |  8B   |
 */
pub struct BaseMetaValue {
    data_type: DataType,
    count: i32,
    version: u64,
    etime: u64,
    ctime: u64,
}

impl BaseMetaValue {
    pub fn new(data_type: DataType, count: i32) -> Self {
        Self {
            data_type,
            count,
            version: 0,
            etime: 0,
            ctime: now_seconds(),
        }
    }

    /// Bumps the version to a value strictly greater than the current one,
    /// derived from the microsecond clock.
    pub fn update_version(&mut self) -> u64 {
        let now = now_micros();
        self.version = if self.version >= now {
            self.version + 1
        } else {
            now
        };
        self.version
    }

    pub fn set_etime(&mut self, etime: u64) {
        self.etime = etime;
    }

    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(BASE_META_VALUE_LENGTH);
        buf.put_u8(self.data_type as u8);
        buf.put_u32_le(self.count as u32);
        buf.put_u64_le(self.version);
        buf.put_u64_le(self.etime);
        buf.put_u64_le(self.ctime);
        buf
    }
}

/// Mutable view over an encoded meta value. Setters write through to the
/// underlying buffer, so `encoded()` always reflects the current fields.
pub struct ParsedBaseMetaValue {
    value: BytesMut,
    data_type: DataType,
    count: i32,
    version: u64,
    etime: u64,
    ctime: u64,
}

impl ParsedBaseMetaValue {
    pub fn new<T>(meta_value: T) -> Result<Self>
    where
        T: Into<BytesMut>,
    {
        let value: BytesMut = meta_value.into();
        ensure!(
            value.len() >= BASE_META_VALUE_LENGTH,
            InvalidFormatSnafu {
                message: format!(
                    "invalid meta value length: {} < {}",
                    value.len(),
                    BASE_META_VALUE_LENGTH,
                ),
            }
        );

        let data_type: DataType = value[0].try_into()?;
        let count = u32::from_le_bytes(
            value[COUNT_OFFSET..COUNT_OFFSET + COUNT_LENGTH]
                .try_into()
                .unwrap(),
        ) as i32;
        let version = u64::from_le_bytes(
            value[VERSION_OFFSET..VERSION_OFFSET + VERSION_LENGTH]
                .try_into()
                .unwrap(),
        );
        let etime = u64::from_le_bytes(
            value[ETIME_OFFSET..ETIME_OFFSET + TIMESTAMP_LENGTH]
                .try_into()
                .unwrap(),
        );
        let ctime = u64::from_le_bytes(
            value[CTIME_OFFSET..CTIME_OFFSET + TIMESTAMP_LENGTH]
                .try_into()
                .unwrap(),
        );

        Ok(Self {
            value,
            data_type,
            count,
            version,
            etime,
            ctime,
        })
    }

    pub fn encoded(&self) -> &[u8] {
        &self.value
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn count(&self) -> i32 {
        self.count
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn etime(&self) -> u64 {
        self.etime
    }

    pub fn ctime(&self) -> u64 {
        self.ctime
    }

    pub fn is_permanent_survival(&self) -> bool {
        self.etime == 0
    }

    pub fn is_stale(&self) -> bool {
        self.etime != 0 && self.etime <= now_seconds()
    }

    /// A set is live iff it is not stale and holds at least one member.
    pub fn is_valid(&self) -> bool {
        !self.is_stale() && self.count != 0
    }

    /// False when replacing the count with `count` would exceed the signed
    /// 32-bit range.
    pub fn check_set_count(&self, count: usize) -> bool {
        count <= i32::MAX as usize
    }

    /// False when applying `delta` would overflow or drive the count
    /// negative.
    pub fn check_modify_count(&self, delta: i32) -> bool {
        matches!(self.count.checked_add(delta), Some(next) if next >= 0)
    }

    pub fn set_count(&mut self, count: i32) {
        self.count = count;
        let dst = &mut self.value[COUNT_OFFSET..COUNT_OFFSET + COUNT_LENGTH];
        dst.copy_from_slice(&(count as u32).to_le_bytes());
    }

    pub fn modify_count(&mut self, delta: i32) {
        self.set_count(self.count + delta);
    }

    pub fn set_etime(&mut self, etime: u64) {
        self.etime = etime;
        let dst = &mut self.value[ETIME_OFFSET..ETIME_OFFSET + TIMESTAMP_LENGTH];
        dst.copy_from_slice(&etime.to_le_bytes());
    }

    pub fn set_ctime(&mut self, ctime: u64) {
        self.ctime = ctime;
        let dst = &mut self.value[CTIME_OFFSET..CTIME_OFFSET + TIMESTAMP_LENGTH];
        dst.copy_from_slice(&ctime.to_le_bytes());
    }

    pub fn update_version(&mut self) -> u64 {
        let now = now_micros();
        self.version = if self.version >= now {
            self.version + 1
        } else {
            now
        };
        let dst = &mut self.value[VERSION_OFFSET..VERSION_OFFSET + VERSION_LENGTH];
        dst.copy_from_slice(&self.version.to_le_bytes());
        self.version
    }

    /// The logical-delete primitive: zero the count, clear the expiry and
    /// bump the version. Member records of the old generation stay on disk
    /// until compaction reclaims them.
    pub fn initial_meta_value(&mut self) -> u64 {
        self.set_count(0);
        self.set_etime(0);
        self.set_ctime(0);
        self.update_version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COUNT: i32 = 42;
    const TEST_VERSION: u64 = 123456789;
    const TEST_ETIME: u64 = 1630000000;

    fn build_test_meta() -> BytesMut {
        let mut meta = BaseMetaValue::new(DataType::Set, TEST_COUNT);
        meta.version = TEST_VERSION;
        meta.etime = TEST_ETIME;
        meta.encode()
    }

    #[test]
    fn test_meta_value_encode_layout() {
        let encoded = build_test_meta();
        assert_eq!(encoded.len(), BASE_META_VALUE_LENGTH);
        assert_eq!(encoded[0], DataType::Set as u8);
        assert_eq!(&encoded[1..5], &(TEST_COUNT as u32).to_le_bytes());
        assert_eq!(&encoded[5..13], &TEST_VERSION.to_le_bytes());
        assert_eq!(&encoded[13..21], &TEST_ETIME.to_le_bytes());
    }

    #[test]
    fn test_meta_value_roundtrip() {
        let parsed = ParsedBaseMetaValue::new(build_test_meta()).unwrap();
        assert_eq!(parsed.data_type(), DataType::Set);
        assert_eq!(parsed.count(), TEST_COUNT);
        assert_eq!(parsed.version(), TEST_VERSION);
        assert_eq!(parsed.etime(), TEST_ETIME);
    }

    #[test]
    fn test_meta_value_rejects_short_buffer() {
        let mut buf = BytesMut::new();
        buf.put_u8(DataType::Set as u8);
        buf.put_u32_le(1);
        assert!(ParsedBaseMetaValue::new(buf).is_err());
    }

    #[test]
    fn test_setters_write_through() {
        let mut parsed = ParsedBaseMetaValue::new(build_test_meta()).unwrap();

        parsed.set_count(7);
        parsed.set_etime(99);
        parsed.set_ctime(100);
        let version = parsed.update_version();

        let reparsed = ParsedBaseMetaValue::new(parsed.encoded()).unwrap();
        assert_eq!(reparsed.count(), 7);
        assert_eq!(reparsed.etime(), 99);
        assert_eq!(reparsed.ctime(), 100);
        assert_eq!(reparsed.version(), version);
    }

    #[test]
    fn test_modify_count() {
        let mut parsed = ParsedBaseMetaValue::new(build_test_meta()).unwrap();
        parsed.modify_count(10);
        assert_eq!(parsed.count(), TEST_COUNT + 10);
        parsed.modify_count(-TEST_COUNT);
        assert_eq!(parsed.count(), 10);
    }

    #[test]
    fn test_check_modify_count_bounds() {
        let mut parsed = ParsedBaseMetaValue::new(build_test_meta()).unwrap();

        parsed.set_count(i32::MAX - 1);
        assert!(parsed.check_modify_count(1));
        assert!(!parsed.check_modify_count(2));

        parsed.set_count(3);
        assert!(parsed.check_modify_count(-3));
        assert!(!parsed.check_modify_count(-4));
    }

    #[test]
    fn test_check_set_count() {
        let parsed = ParsedBaseMetaValue::new(build_test_meta()).unwrap();
        assert!(parsed.check_set_count(100));
        assert!(parsed.check_set_count(i32::MAX as usize));
        assert!(!parsed.check_set_count(i32::MAX as usize + 1));
    }

    #[test]
    fn test_staleness() {
        let mut parsed = ParsedBaseMetaValue::new(build_test_meta()).unwrap();

        parsed.set_etime(0);
        assert!(parsed.is_permanent_survival());
        assert!(!parsed.is_stale());
        assert!(parsed.is_valid());

        parsed.set_etime(1);
        assert!(parsed.is_stale());
        assert!(!parsed.is_valid());

        parsed.set_etime(now_seconds() + 100);
        assert!(!parsed.is_stale());
    }

    #[test]
    fn test_version_monotonicity() {
        let mut parsed = ParsedBaseMetaValue::new(build_test_meta()).unwrap();
        let mut last = parsed.version();
        for _ in 0..100 {
            let next = parsed.update_version();
            assert!(next > last);
            last = next;
        }
    }

    #[test]
    fn test_initial_meta_value() {
        let mut parsed = ParsedBaseMetaValue::new(build_test_meta()).unwrap();
        let old_version = parsed.version();

        let new_version = parsed.initial_meta_value();
        assert!(new_version > old_version);
        assert_eq!(parsed.count(), 0);
        assert_eq!(parsed.etime(), 0);
        assert!(!parsed.is_valid());
    }
}
