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

//! Glob matching and clock helpers.

use chrono::Utc;

pub fn now_seconds() -> u64 {
    Utc::now().timestamp() as u64
}

pub fn now_micros() -> u64 {
    Utc::now().timestamp_micros() as u64
}

/// Byte-wise glob matcher: `*`, `?`, `[set]` (with ranges and `^` negation)
/// and `\` escaping.
pub fn string_match(pattern: &[u8], text: &[u8]) -> bool {
    let mut p = 0;
    let mut t = 0;

    while p < pattern.len() && t < text.len() {
        match pattern[p] {
            b'*' => {
                while p + 1 < pattern.len() && pattern[p + 1] == b'*' {
                    p += 1;
                }
                if p + 1 == pattern.len() {
                    return true;
                }
                for skip in t..=text.len() {
                    if string_match(&pattern[p + 1..], &text[skip..]) {
                        return true;
                    }
                }
                return false;
            }
            b'?' => {
                t += 1;
            }
            b'[' => {
                p += 1;
                let negate = p < pattern.len() && pattern[p] == b'^';
                if negate {
                    p += 1;
                }
                let mut matched = false;
                loop {
                    if p >= pattern.len() {
                        p -= 1;
                        break;
                    } else if pattern[p] == b'\\' && p + 1 < pattern.len() {
                        p += 1;
                        if pattern[p] == text[t] {
                            matched = true;
                        }
                    } else if pattern[p] == b']' {
                        break;
                    } else if p + 2 < pattern.len() && pattern[p + 1] == b'-' {
                        let (lo, hi) = if pattern[p] <= pattern[p + 2] {
                            (pattern[p], pattern[p + 2])
                        } else {
                            (pattern[p + 2], pattern[p])
                        };
                        p += 2;
                        if text[t] >= lo && text[t] <= hi {
                            matched = true;
                        }
                    } else if pattern[p] == text[t] {
                        matched = true;
                    }
                    p += 1;
                }
                if negate {
                    matched = !matched;
                }
                if !matched {
                    return false;
                }
                t += 1;
            }
            b'\\' if p + 1 < pattern.len() => {
                p += 1;
                if pattern[p] != text[t] {
                    return false;
                }
                t += 1;
            }
            byte => {
                if byte != text[t] {
                    return false;
                }
                t += 1;
            }
        }
        p += 1;
    }

    while p < pattern.len() && pattern[p] == b'*' {
        p += 1;
    }
    p == pattern.len() && t == text.len()
}

/// A pattern that is a plain literal followed by a single trailing `*`.
/// Such patterns narrow the iterator seek to the literal prefix.
pub fn is_tail_wildcard(pattern: &[u8]) -> bool {
    pattern.len() >= 2
        && pattern.last() == Some(&b'*')
        && pattern[..pattern.len() - 1]
            .iter()
            .all(|&byte| !matches!(byte, b'*' | b'?' | b'[' | b'\\'))
}
