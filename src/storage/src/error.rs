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

//! Status kinds returned by the storage engine.

use snafu::{Location, Snafu};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("RocksDB error"))]
    Rocks {
        #[snafu(source)]
        error: rocksdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Key not found: {}", key))]
    KeyNotFound {
        key: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "WRONGTYPE, key: {}, expect type: {}, get type: {}",
        key,
        expected,
        actual
    ))]
    WrongType {
        key: String,
        expected: &'static str,
        actual: &'static str,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Invalid argument: {}", message))]
    InvalidArgument {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Corruption: {}", message))]
    Corruption {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Invalid format: {}", message))]
    InvalidFormat {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Option is none: {}", message))]
    OptionNone {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Channel error: {}", message))]
    Channel {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound { .. })
    }

    pub fn is_wrong_type(&self) -> bool {
        matches!(self, Error::WrongType { .. })
    }

    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Corruption { .. })
    }
}
