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
    coding::{decode_varint32, encode_varint32},
    error::{InvalidFormatSnafu, Result},
    storage_define::VERSION_LENGTH,
};

// member data key, one record per (user key, version, member). format:
// | varint(len(key)) | key | version | member |
// |                  |     |  8B BE  |        |
//
// The version is big-endian so all members of one generation sort
// contiguously; a seek at the (key, version) prefix — an encoded key with
// an empty member — walks them in byte-lexicographic member order.

#[derive(Debug, Clone)]
pub struct SetsMemberKey {
    key: Bytes,
    version: u64,
    member: Bytes,
}

impl SetsMemberKey {
    pub fn new(key: &[u8], version: u64, member: &[u8]) -> Self {
        SetsMemberKey {
            key: Bytes::copy_from_slice(key),
            version,
            member: Bytes::copy_from_slice(member),
        }
    }

    pub fn encode(&self) -> BytesMut {
        let mut dst =
            BytesMut::with_capacity(5 + self.key.len() + VERSION_LENGTH + self.member.len());
        encode_varint32(&mut dst, self.key.len() as u32);
        dst.put_slice(&self.key);
        dst.put_u64(self.version);
        dst.put_slice(&self.member);
        dst
    }
}

pub struct ParsedSetsMemberKey {
    key: Bytes,
    version: u64,
    member: Bytes,
}

impl ParsedSetsMemberKey {
    pub fn new(encoded_key: &[u8]) -> Result<Self> {
        let (key_len, consumed) = decode_varint32(encoded_key).ok_or_else(|| {
            InvalidFormatSnafu {
                message: "Member key length prefix is truncated".to_string(),
            }
            .build()
        })?;
        let version_start = consumed + key_len as usize;
        ensure!(
            encoded_key.len() >= version_start + VERSION_LENGTH,
            InvalidFormatSnafu {
                message: format!(
                    "Member key too short: {} bytes, user key takes {}",
                    encoded_key.len(),
                    version_start,
                ),
            }
        );

        let version_bytes: [u8; VERSION_LENGTH] = encoded_key
            [version_start..version_start + VERSION_LENGTH]
            .try_into()
            .map_err(|_| {
                InvalidFormatSnafu {
                    message: "Member key version field is malformed".to_string(),
                }
                .build()
            })?;

        Ok(ParsedSetsMemberKey {
            key: Bytes::copy_from_slice(&encoded_key[consumed..version_start]),
            version: u64::from_be_bytes(version_bytes),
            member: Bytes::copy_from_slice(&encoded_key[version_start + VERSION_LENGTH..]),
        })
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn member(&self) -> &[u8] {
        &self.member
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_key_encode_and_decode() {
        let test_key = b"set_key\x00with_zero";
        let test_version: u64 = 42;
        let test_member = b"member_one";

        let encoded = SetsMemberKey::new(test_key, test_version, test_member).encode();
        assert_eq!(
            encoded.len(),
            1 + test_key.len() + VERSION_LENGTH + test_member.len()
        );

        let parsed = ParsedSetsMemberKey::new(&encoded).unwrap();
        assert_eq!(parsed.key(), test_key);
        assert_eq!(parsed.version(), test_version);
        assert_eq!(parsed.member(), test_member);
    }

    #[test]
    fn test_member_key_empty_member_is_seek_prefix() {
        let prefix = SetsMemberKey::new(b"k", 7, b"").encode();
        let full = SetsMemberKey::new(b"k", 7, b"m").encode();
        assert!(full.starts_with(&prefix));

        let other_version = SetsMemberKey::new(b"k", 8, b"m").encode();
        assert!(!other_version.starts_with(&prefix));
    }

    #[test]
    fn test_member_key_ordering() {
        // Members of one (key, version) sort byte-lexicographically.
        let a = SetsMemberKey::new(b"k", 3, b"aaa").encode();
        let b = SetsMemberKey::new(b"k", 3, b"aab").encode();
        let c = SetsMemberKey::new(b"k", 3, b"b").encode();
        assert!(a < b);
        assert!(b < c);

        // Generations sort contiguously: every version-3 member precedes
        // every version-4 member of the same key.
        let v4 = SetsMemberKey::new(b"k", 4, b"a").encode();
        assert!(c < v4);
    }

    #[test]
    fn test_member_key_rejects_garbage() {
        assert!(ParsedSetsMemberKey::new(&[]).is_err());
        // key length consumes everything, no room for the version
        assert!(ParsedSetsMemberKey::new(&[2, b'a', b'b']).is_err());
    }
}
