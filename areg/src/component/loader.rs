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

//! Loading and unloading components.

use crate::address::ComponentAddress;
use crate::component::{Component, ComponentContext, ComponentEntry, ComponentError};
use crate::context::Runtime;
use crate::dispatcher::DispatcherHandle;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// Creates the component described by `entry` on `owner`, registers it and
/// starts its worker threads and services.
///
/// The directory is checked before the factory runs, so a duplicate role
/// never constructs a second component.
///
/// # Errors
///
/// Fails if the address is invalid, the role is taken, the factory fails,
/// or a worker thread or service cannot be started. Partial work is undone.
pub fn load_component(
    runtime: &Arc<Runtime>,
    entry: &ComponentEntry,
    owner: &DispatcherHandle,
) -> Result<Arc<Component>, ComponentError> {
    let address = ComponentAddress::new(&entry.role_name, owner.address().clone());
    if !runtime.is_valid_address(&address) {
        return Err(ComponentError::InvalidAddress {
            address: address.to_path(),
        });
    }
    if runtime.components().exists(address.role()) {
        return Err(ComponentError::DuplicateRole {
            role: address.role().to_string(),
        });
    }

    let context = ComponentContext::new(runtime, entry, address.clone());
    let component = (entry.factory)(&context).map_err(|error| ComponentError::FactoryFailed {
        role: entry.role_name.clone(),
        reason: error.to_string(),
    })?;
    if component.address() != &address {
        return Err(ComponentError::InvalidAddress {
            address: component.address().to_path(),
        });
    }
    runtime
        .components()
        .register(runtime.threads(), component.clone())?;

    if let Err(error) = start(runtime, entry, &component) {
        component.shutdown_servers();
        component.info().stop_workers();
        runtime.components().remove(&address);
        return Err(error);
    }

    info!(
        component = %address,
        services = component.server_items().len(),
        workers = component.info().worker_count(),
        "component loaded"
    );
    Ok(component)
}

fn start(
    runtime: &Arc<Runtime>,
    entry: &ComponentEntry,
    component: &Arc<Component>,
) -> Result<(), ComponentError> {
    for worker in &entry.workers {
        component.info().start_worker(runtime, &worker.name)?;
    }
    for server in component.server_items() {
        server.start()?;
    }
    for service in &entry.services {
        if component.find_server_by_name(&service.name).is_none() {
            warn!(
                component = %component.address(),
                service = %service.name,
                "listed service has no stub"
            );
        }
    }
    Ok(())
}

/// Shuts down the component's services, stops its workers, removes it from
/// the directory and runs the entry's destroy hook.
pub fn unload_component(runtime: &Runtime, component: &Arc<Component>, entry: &ComponentEntry) {
    component.shutdown_servers();
    component.info().stop_workers();
    runtime.components().remove(component.address());
    if let Some(destroy) = &entry.destroy {
        destroy(component);
    }
    info!(component = %component.address(), "component unloaded");
}

/// Loads a list of component entries, spawning owner threads on demand.
///
/// # Examples
///
/// ```rust
/// use areg::component::{Component, ComponentEntry, ModelLoader};
/// use areg::{Runtime, RuntimeConfig};
///
/// let runtime = Runtime::new(RuntimeConfig::default()).unwrap();
/// let model = ModelLoader::new()
///     .with_entry(ComponentEntry::new("First", "ThreadA", |ctx| {
///         Ok(Component::new(ctx.address().clone()))
///     }))
///     .with_entry(ComponentEntry::new("Second", "ThreadA", |ctx| {
///         Ok(Component::new(ctx.address().clone()))
///     }))
///     .load(&runtime)
///     .unwrap();
///
/// assert_eq!(model.len(), 2);
/// assert!(runtime.components().exists("Second"));
/// drop(model);
/// assert!(runtime.components().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct ModelLoader {
    entries: Vec<ComponentEntry>,
}

impl ModelLoader {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry.
    pub fn with_entry(mut self, entry: ComponentEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Loads every entry in order.
    ///
    /// # Errors
    ///
    /// On the first failure, everything loaded so far is unloaded again and
    /// the error is returned.
    pub fn load(self, runtime: &Arc<Runtime>) -> Result<LoadedModel, ComponentError> {
        let mut model = LoadedModel {
            runtime: Arc::downgrade(runtime),
            loaded: Vec::new(),
        };
        for entry in self.entries {
            let owner = match runtime.threads().find_by_name(&entry.thread_name) {
                Some(owner) => owner,
                None => runtime.spawn_thread(&entry.thread_name)?,
            };
            let component = load_component(runtime, &entry, &owner)?;
            model.loaded.push((component, entry));
        }
        debug!(components = model.loaded.len(), "model loaded");
        Ok(model)
    }
}

/// Components loaded by a [`ModelLoader`]. Dropping the model unloads
/// them in reverse order.
#[derive(Debug)]
pub struct LoadedModel {
    runtime: Weak<Runtime>,
    loaded: Vec<(Arc<Component>, ComponentEntry)>,
}

impl LoadedModel {
    /// Returns the loaded component with `role`.
    pub fn find(&self, role: &str) -> Option<&Arc<Component>> {
        self.loaded
            .iter()
            .map(|(component, _)| component)
            .find(|component| component.role() == role)
    }

    /// Returns the loaded components in load order.
    pub fn components(&self) -> impl Iterator<Item = &Arc<Component>> {
        self.loaded.iter().map(|(component, _)| component)
    }

    /// Returns the number of loaded components.
    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    /// Returns `true` if nothing is loaded.
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    /// Unloads every component, newest first.
    pub fn unload(&mut self) {
        let loaded = std::mem::take(&mut self.loaded);
        let Some(runtime) = self.runtime.upgrade() else {
            return;
        };
        for (component, entry) in loaded.into_iter().rev() {
            unload_component(&runtime, &component, &entry);
        }
    }
}

impl Drop for LoadedModel {
    fn drop(&mut self) {
        self.unload();
    }
}
