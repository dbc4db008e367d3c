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

//! Component addresses.

use crate::address::{
    AddressParseError, COMPONENT_SEPARATOR, ThreadAddress, is_valid_name, path_magic,
    truncate_name,
};
use crate::component::ComponentDirectory;
use crate::context::Runtime;
use crate::dispatcher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Address of a component: its role name plus the thread it runs on.
#[derive(Debug, Clone)]
pub struct ComponentAddress {
    role: String,
    thread: ThreadAddress,
    magic: u64,
}

impl ComponentAddress {
    /// Creates an address for `role` on `thread`.
    pub fn new(role: &str, thread: ThreadAddress) -> Self {
        let role = truncate_name(role);
        let magic = path_magic(&Self::format_path(&role, &thread));
        Self {
            role,
            thread,
            magic,
        }
    }

    /// Creates an address for `role` on the dispatcher thread executing the
    /// caller. Off a dispatcher thread the thread part is invalid.
    pub fn new_in_current_thread(role: &str) -> Self {
        let thread = dispatcher::current()
            .map(|handle| handle.address().clone())
            .unwrap_or_else(ThreadAddress::invalid);
        Self::new(role, thread)
    }

    /// Creates an address for `role` on the dispatcher thread called
    /// `thread_name`. Returns `None` when no such thread is registered.
    pub fn with_thread_name(runtime: &Runtime, role: &str, thread_name: &str) -> Option<Self> {
        runtime
            .threads()
            .find_by_name(thread_name)
            .map(|handle| Self::new(role, handle.address().clone()))
    }

    /// Resolves `role` to the address of an already registered component.
    pub fn registered(directory: &ComponentDirectory, role: &str) -> Option<Self> {
        directory
            .find_by_name(role)
            .map(|component| component.address().clone())
    }

    /// Returns the invalid address.
    pub fn invalid() -> Self {
        Self::new(crate::address::INVALID_NAME, ThreadAddress::invalid())
    }

    /// Returns the role name.
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Returns the owning thread address.
    pub fn thread(&self) -> &ThreadAddress {
        &self.thread
    }

    /// Returns the cached magic number.
    pub fn magic(&self) -> u64 {
        self.magic
    }

    /// Checks that both the role and the thread are valid.
    pub fn is_valid(&self) -> bool {
        is_valid_name(&self.role) && self.thread.is_valid()
    }

    /// Formats the address as `role::thread@pid`.
    pub fn to_path(&self) -> String {
        Self::format_path(&self.role, &self.thread)
    }

    /// Parses a `role::thread@pid` path.
    pub fn from_path(path: &str) -> Result<Self, AddressParseError> {
        let (role, thread) = path
            .split_once(COMPONENT_SEPARATOR)
            .ok_or_else(|| AddressParseError::new(path, "missing role separator"))?;
        if !is_valid_name(role) {
            return Err(AddressParseError::new(path, "invalid role name"));
        }
        let thread = ThreadAddress::from_path(thread)?;
        Ok(Self::new(role, thread))
    }

    fn format_path(role: &str, thread: &ThreadAddress) -> String {
        format!("{role}{COMPONENT_SEPARATOR}{}", thread.to_path())
    }
}

impl PartialEq for ComponentAddress {
    fn eq(&self, other: &Self) -> bool {
        self.role == other.role && self.thread == other.thread
    }
}

impl Eq for ComponentAddress {}

impl Hash for ComponentAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.magic);
    }
}

impl fmt::Display for ComponentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.role, COMPONENT_SEPARATOR, self.thread)
    }
}

impl FromStr for ComponentAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_path(s)
    }
}
