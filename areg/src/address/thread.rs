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

//! Dispatcher thread addresses.

use crate::address::{
    AddressParseError, INVALID_NAME, PROCESS_SEPARATOR, is_valid_name, path_magic, truncate_name,
};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Address of a dispatcher thread.
///
/// Equality compares the thread name and process id. Hashing writes only
/// the cached magic number, which is derived from the path and therefore
/// agrees with equality.
#[derive(Debug, Clone)]
pub struct ThreadAddress {
    name: String,
    process_id: u32,
    magic: u64,
}

impl ThreadAddress {
    /// Creates the address of a thread in the current process.
    ///
    /// Names longer than [`MAX_NAME_LENGTH`](crate::address::MAX_NAME_LENGTH)
    /// are truncated.
    pub fn new(name: &str) -> Self {
        Self::with_process(name, std::process::id())
    }

    /// Creates the address of a thread in the given process.
    pub fn with_process(name: &str, process_id: u32) -> Self {
        let name = truncate_name(name);
        let magic = path_magic(&Self::format_path(&name, process_id));
        Self {
            name,
            process_id,
            magic,
        }
    }

    /// Returns the invalid address.
    pub fn invalid() -> Self {
        Self::with_process(INVALID_NAME, 0)
    }

    /// Returns the thread name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the process id.
    pub fn process_id(&self) -> u32 {
        self.process_id
    }

    /// Returns the cached magic number.
    pub fn magic(&self) -> u64 {
        self.magic
    }

    /// Checks that the name is usable as a thread name.
    pub fn is_valid(&self) -> bool {
        is_valid_name(&self.name)
    }

    /// Formats the address as `name@pid`.
    pub fn to_path(&self) -> String {
        Self::format_path(&self.name, self.process_id)
    }

    /// Parses a `name@pid` path. A path without a process id refers to the
    /// current process.
    pub fn from_path(path: &str) -> Result<Self, AddressParseError> {
        let (name, process_id) = match path.rsplit_once(PROCESS_SEPARATOR) {
            Some((name, pid)) => {
                let pid = pid
                    .parse::<u32>()
                    .map_err(|_| AddressParseError::new(path, "process id is not a number"))?;
                (name, pid)
            }
            None => (path, std::process::id()),
        };
        if !is_valid_name(name) {
            return Err(AddressParseError::new(path, "invalid thread name"));
        }
        Ok(Self::with_process(name, process_id))
    }

    fn format_path(name: &str, process_id: u32) -> String {
        format!("{name}{PROCESS_SEPARATOR}{process_id}")
    }
}

impl PartialEq for ThreadAddress {
    fn eq(&self, other: &Self) -> bool {
        self.process_id == other.process_id && self.name == other.name
    }
}

impl Eq for ThreadAddress {}

impl Hash for ThreadAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.magic);
    }
}

impl fmt::Display for ThreadAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.name, PROCESS_SEPARATOR, self.process_id)
    }
}

impl FromStr for ThreadAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_path(s)
    }
}
