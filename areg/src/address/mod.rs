//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Thread and component addresses.
//!
//! A [`ThreadAddress`] names a dispatcher thread in the current process and a
//! [`ComponentAddress`] names a component living on one of those threads.
//! Both convert to and from a textual path and carry a cached magic number
//! used for fast hashing and directory lookups.
//!
//! ```text
//! thread path:     <thread name>@<process id>
//! component path:  <role name>::<thread path>
//! ```

mod component;
mod thread;

pub use self::component::ComponentAddress;
pub use self::thread::ThreadAddress;

use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

/// Maximum length of a thread or role name, in characters. Longer names are
/// truncated.
pub const MAX_NAME_LENGTH: usize = 64;

/// Name carried by an invalid address.
pub const INVALID_NAME: &str = "INVALID";

/// Separates a role name from its thread path.
pub const COMPONENT_SEPARATOR: &str = "::";

/// Separates a thread name from its process id.
pub const PROCESS_SEPARATOR: char = '@';

/// Characters a thread or role name may not contain. A single `:` is
/// excluded as well as the separator, so a name ending in `:` cannot merge
/// with the separator that follows it in a path.
const RESERVED_CHARS: [char; 2] = [':', PROCESS_SEPARATOR];

pub(crate) fn truncate_name(name: &str) -> String {
    name.chars().take(MAX_NAME_LENGTH).collect()
}

pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != INVALID_NAME
        && name.chars().count() <= MAX_NAME_LENGTH
        && !name.contains(RESERVED_CHARS)
}

pub(crate) fn path_magic(path: &str) -> u64 {
    xxh3_64(path.as_bytes())
}

/// Error returned when a path cannot be parsed into an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressParseError {
    path: String,
    reason: &'static str,
}

impl AddressParseError {
    pub(crate) fn new(path: &str, reason: &'static str) -> Self {
        Self {
            path: path.to_string(),
            reason,
        }
    }

    /// Returns the path that failed to parse.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for AddressParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid address path '{}': {}", self.path, self.reason)
    }
}

impl std::error::Error for AddressParseError {}
