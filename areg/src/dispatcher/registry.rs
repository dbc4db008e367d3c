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

//! Registry of live dispatcher threads.

use crate::address::ThreadAddress;
use crate::dispatcher::{DispatchError, DispatcherHandle};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Maps thread names to live dispatcher threads.
#[derive(Debug, Default)]
pub struct ThreadRegistry {
    threads: RwLock<HashMap<String, DispatcherHandle>>,
}

impl ThreadRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a thread.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateThread`] if the name is taken.
    pub fn register(&self, handle: DispatcherHandle) -> Result<(), DispatchError> {
        let mut threads = self.threads.write();
        if threads.contains_key(handle.name()) {
            return Err(DispatchError::DuplicateThread {
                name: handle.name().to_string(),
            });
        }
        threads.insert(handle.name().to_string(), handle);
        Ok(())
    }

    /// Removes the thread with this address.
    pub fn unregister(&self, address: &ThreadAddress) -> Option<DispatcherHandle> {
        let mut threads = self.threads.write();
        match threads.get(address.name()) {
            Some(handle) if handle.address() == address => threads.remove(address.name()),
            _ => None,
        }
    }

    /// Looks up a thread by name.
    pub fn find_by_name(&self, name: &str) -> Option<DispatcherHandle> {
        self.threads.read().get(name).cloned()
    }

    /// Looks up a thread by address.
    pub fn find_by_address(&self, address: &ThreadAddress) -> Option<DispatcherHandle> {
        self.threads
            .read()
            .get(address.name())
            .filter(|handle| handle.address() == address)
            .cloned()
    }

    /// Resolves a thread address or reports it missing.
    pub fn require(&self, address: &ThreadAddress) -> Result<DispatcherHandle, DispatchError> {
        self.find_by_address(address)
            .ok_or_else(|| DispatchError::ThreadNotFound {
                thread: address.to_path(),
            })
    }

    /// Returns `true` if a thread with this address is registered.
    pub fn is_registered(&self, address: &ThreadAddress) -> bool {
        self.find_by_address(address).is_some()
    }

    /// Returns every registered thread.
    pub fn handles(&self) -> Vec<DispatcherHandle> {
        self.threads.read().values().cloned().collect()
    }

    /// Returns the number of registered threads.
    pub fn len(&self) -> usize {
        self.threads.read().len()
    }

    /// Returns `true` if no thread is registered.
    pub fn is_empty(&self) -> bool {
        self.threads.read().is_empty()
    }
}
