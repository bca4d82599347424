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

/// Appends `value` as a LEB128-style varint (7 data bits per byte, high bit
/// marks continuation). At most 5 bytes for a u32.
pub fn encode_varint32(dst: &mut BytesMut, mut value: u32) {
    while value >= 0x80 {
        dst.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    dst.put_u8(value as u8);
}

/// Decodes a varint from the front of `buf`, returning the value and the
/// number of bytes consumed, or None when the buffer is truncated.
pub fn decode_varint32(buf: &[u8]) -> Option<(u32, usize)> {
    let mut result: u32 = 0;
    for (i, &byte) in buf.iter().enumerate().take(5) {
        result |= u32::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Some((result, i + 1));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint32_roundtrip() {
        for value in [0u32, 1, 127, 128, 300, 16383, 16384, u32::MAX] {
            let mut buf = BytesMut::new();
            encode_varint32(&mut buf, value);
            let (decoded, consumed) = decode_varint32(&buf).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, buf.len());
        }
    }

    #[test]
    fn test_varint32_sizes() {
        let mut buf = BytesMut::new();
        encode_varint32(&mut buf, 127);
        assert_eq!(buf.len(), 1);

        let mut buf = BytesMut::new();
        encode_varint32(&mut buf, 128);
        assert_eq!(buf.len(), 2);

        let mut buf = BytesMut::new();
        encode_varint32(&mut buf, u32::MAX);
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn test_varint32_truncated() {
        assert!(decode_varint32(&[]).is_none());
        assert!(decode_varint32(&[0x80]).is_none());
        assert!(decode_varint32(&[0xff, 0xff]).is_none());
    }
}
