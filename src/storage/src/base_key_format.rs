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
};

// meta key, one record per user key across all data types. format:
// | varint(len(key)) | key |

pub struct BaseMetaKey {
    key: Bytes,
}

impl BaseMetaKey {
    pub fn new(key: &[u8]) -> Self {
        BaseMetaKey {
            key: Bytes::copy_from_slice(key),
        }
    }

    pub fn encode(&self) -> BytesMut {
        let mut dst = BytesMut::with_capacity(5 + self.key.len());
        encode_varint32(&mut dst, self.key.len() as u32);
        dst.put_slice(&self.key);
        dst
    }
}

pub struct ParsedBaseMetaKey {
    key: Bytes,
}

impl ParsedBaseMetaKey {
    pub fn new(encoded_key: &[u8]) -> Result<Self> {
        let (key_len, consumed) = decode_varint32(encoded_key).ok_or_else(|| {
            InvalidFormatSnafu {
                message: "Meta key length prefix is truncated".to_string(),
            }
            .build()
        })?;
        ensure!(
            encoded_key.len() == consumed + key_len as usize,
            InvalidFormatSnafu {
                message: format!(
                    "Meta key length mismatch: prefix says {}, {} bytes remain",
                    key_len,
                    encoded_key.len() - consumed,
                ),
            }
        );

        Ok(ParsedBaseMetaKey {
            key: Bytes::copy_from_slice(&encoded_key[consumed..]),
        })
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_meta_key_encode_and_decode() {
        let test_key = b"test_key";

        let encoded = BaseMetaKey::new(test_key).encode();
        assert_eq!(encoded.len(), 1 + test_key.len());

        let parsed = ParsedBaseMetaKey::new(&encoded).unwrap();
        assert_eq!(parsed.key(), test_key);
    }

    #[test]
    fn test_base_meta_key_binary_and_empty() {
        for key in [&b""[..], &b"a\x00b\xffc"[..]] {
            let encoded = BaseMetaKey::new(key).encode();
            let parsed = ParsedBaseMetaKey::new(&encoded).unwrap();
            assert_eq!(parsed.key(), key);
        }
    }

    #[test]
    fn test_base_meta_key_injective() {
        // Keys that would collide under naive concatenation stay distinct.
        let a = BaseMetaKey::new(b"ab").encode();
        let b = BaseMetaKey::new(b"a").encode();
        assert_ne!(a, b);
    }

    #[test]
    fn test_parsed_base_meta_key_rejects_garbage() {
        assert!(ParsedBaseMetaKey::new(&[]).is_err());
        // prefix says 4 bytes but only 2 remain
        assert!(ParsedBaseMetaKey::new(&[4, b'a', b'b']).is_err());
    }
}
