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

//! Class identifiers.

use std::fmt;
use std::hash::{Hash, Hasher};
use xxhash_rust::const_xxh3::xxh3_64 as const_xxh3_64;
use xxhash_rust::xxh3::xxh3_64;

/// Identity of a runtime class.
///
/// Holds the class name and a magic number computed from it. Comparison
/// checks the magic number first and only falls back to the name when the
/// magic numbers agree, so unequal ids are rejected without a string
/// compare.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeClassId {
    name: &'static str,
    magic: u64,
}

impl RuntimeClassId {
    /// Creates a class id. Usable in `static` and `const` items.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            magic: const_xxh3_64(name.as_bytes()),
        }
    }

    /// Computes the magic number a class with this name would carry.
    pub fn magic_of(name: &str) -> u64 {
        xxh3_64(name.as_bytes())
    }

    /// Returns the class name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the magic number.
    pub const fn magic(&self) -> u64 {
        self.magic
    }

    /// Checks whether this id belongs to the class called `name`.
    pub fn matches_name(&self, name: &str) -> bool {
        self.magic == Self::magic_of(name) && self.name == name
    }
}

impl PartialEq for RuntimeClassId {
    fn eq(&self, other: &Self) -> bool {
        self.magic == other.magic && self.name == other.name
    }
}

impl Eq for RuntimeClassId {}

impl Hash for RuntimeClassId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.magic);
    }
}

impl fmt::Display for RuntimeClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
