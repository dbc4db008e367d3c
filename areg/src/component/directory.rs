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

//! Directory of registered components.

use crate::address::{ComponentAddress, path_magic};
use crate::component::{Component, ComponentError};
use crate::dispatcher::ThreadRegistry;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct DirectoryState {
    // Magic number buckets; collisions fall back to address equality.
    by_magic: HashMap<u64, Vec<Arc<Component>>>,
    by_role: HashMap<String, ComponentAddress>,
}

/// Lookup of live components by role, address or magic number.
///
/// Many concurrent lookups, rare registrations.
#[derive(Debug, Default)]
pub struct ComponentDirectory {
    state: RwLock<DirectoryState>,
}

impl ComponentDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a component living on one of the threads in `threads`.
    ///
    /// # Errors
    ///
    /// Fails if the address is invalid, its thread is not registered, or
    /// the role is already registered.
    pub fn register(
        &self,
        threads: &ThreadRegistry,
        component: Arc<Component>,
    ) -> Result<(), ComponentError> {
        let address = component.address().clone();
        if !address.is_valid() || !threads.is_registered(address.thread()) {
            return Err(ComponentError::InvalidAddress {
                address: address.to_path(),
            });
        }
        let mut state = self.state.write();
        if state.by_role.contains_key(address.role()) {
            return Err(ComponentError::DuplicateRole {
                role: address.role().to_string(),
            });
        }
        state
            .by_magic
            .entry(address.magic())
            .or_default()
            .push(component);
        state.by_role.insert(address.role().to_string(), address.clone());
        debug!(component = %address, "component registered");
        Ok(())
    }

    /// Removes the component at `address`.
    pub fn remove(&self, address: &ComponentAddress) -> Option<Arc<Component>> {
        let mut state = self.state.write();
        let bucket = state.by_magic.get_mut(&address.magic())?;
        let index = bucket
            .iter()
            .position(|component| component.address() == address)?;
        let component = bucket.remove(index);
        if bucket.is_empty() {
            state.by_magic.remove(&address.magic());
        }
        state.by_role.remove(address.role());
        debug!(component = %address, "component removed");
        Some(component)
    }

    /// Looks up a component by role name.
    pub fn find_by_name(&self, role: &str) -> Option<Arc<Component>> {
        let state = self.state.read();
        let address = state.by_role.get(role)?;
        Self::lookup(&state, address)
    }

    /// Looks up a component by address.
    pub fn find_by_address(&self, address: &ComponentAddress) -> Option<Arc<Component>> {
        Self::lookup(&self.state.read(), address)
    }

    /// Looks up a component by the magic number of its address path.
    pub fn find_by_number(&self, magic: u64) -> Option<Arc<Component>> {
        self.state
            .read()
            .by_magic
            .get(&magic)
            .and_then(|bucket| bucket.first().cloned())
    }

    /// Looks up a component by its `role::thread@pid` path.
    pub fn find_by_path(&self, path: &str) -> Option<Arc<Component>> {
        self.find_by_number(path_magic(path))
            .filter(|component| component.address().to_path() == path)
    }

    /// Returns `true` if a component with the role is registered.
    pub fn exists(&self, role: &str) -> bool {
        self.state.read().by_role.contains_key(role)
    }

    /// Returns every registered component.
    pub fn components(&self) -> Vec<Arc<Component>> {
        self.state
            .read()
            .by_magic
            .values()
            .flatten()
            .cloned()
            .collect()
    }

    /// Returns the number of registered components.
    pub fn len(&self) -> usize {
        self.state.read().by_role.len()
    }

    /// Returns `true` if no component is registered.
    pub fn is_empty(&self) -> bool {
        self.state.read().by_role.is_empty()
    }

    fn lookup(state: &DirectoryState, address: &ComponentAddress) -> Option<Arc<Component>> {
        state
            .by_magic
            .get(&address.magic())?
            .iter()
            .find(|component| component.address() == address)
            .cloned()
    }
}
