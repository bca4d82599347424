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

/// Maps user keys to storage instances. The mapping must stay stable for
/// the lifetime of a database directory.
pub struct SlotIndexer {
    instance_num: usize,
}

impl SlotIndexer {
    pub fn new(instance_num: usize) -> Self {
        Self {
            instance_num: instance_num.max(1),
        }
    }

    pub fn get_instance(&self, key: &[u8]) -> usize {
        if self.instance_num <= 1 {
            return 0;
        }
        (Self::hash(key) % self.instance_num as u64) as usize
    }

    // djb2
    fn hash(key: &[u8]) -> u64 {
        let mut hash: u64 = 5381;
        for &byte in key {
            hash = hash.wrapping_mul(33).wrapping_add(u64::from(byte));
        }
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_instance_stable_and_in_range() {
        let indexer = SlotIndexer::new(3);

        for key in [&b"key1"[..], &b"key2"[..], &b"\x00\xff"[..]] {
            let instance = indexer.get_instance(key);
            assert!(instance < 3);
            assert_eq!(instance, indexer.get_instance(key));
        }
    }

    #[test]
    fn test_single_instance() {
        let indexer = SlotIndexer::new(1);
        assert_eq!(0, indexer.get_instance(b"key1"));
        assert_eq!(0, indexer.get_instance(b"key2"));
    }
}
