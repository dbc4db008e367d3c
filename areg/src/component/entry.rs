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

//! Static descriptions of the components of a model.
//!
//! A [`ComponentEntry`] says which role runs on which dispatcher thread,
//! which services it provides, which services it consumes and which worker
//! threads it needs. The loader only reads these descriptions; the factory
//! closure builds the component itself.

use crate::component::Component;
use crate::context::Runtime;
use crate::service::Version;
use crate::AregError;
use std::fmt;
use std::sync::Arc;

/// Builds a component for a [`ComponentContext`].
pub type ComponentFactory =
    Arc<dyn Fn(&ComponentContext<'_>) -> Result<Arc<Component>, AregError> + Send + Sync>;

/// Releases application resources of an unloaded component.
pub type ComponentDestroy = Arc<dyn Fn(&Arc<Component>) + Send + Sync>;

/// A service provided by a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    /// Service name
    pub name: String,
    /// Provided version
    pub version: Version,
}

impl ServiceEntry {
    /// Creates a service entry.
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

/// A service consumed by a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEntry {
    /// Role of the providing component
    pub role_name: String,
    /// Consumed service
    pub service: ServiceEntry,
}

impl DependencyEntry {
    /// Creates a dependency entry.
    pub fn new(role_name: impl Into<String>, service: ServiceEntry) -> Self {
        Self {
            role_name: role_name.into(),
            service,
        }
    }
}

/// A worker thread started together with a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerThreadEntry {
    /// Dispatcher thread name
    pub name: String,
}

impl WorkerThreadEntry {
    /// Creates a worker entry.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Description of one component in a model.
///
/// # Examples
///
/// ```rust
/// use areg::component::{Component, ComponentEntry, ServiceEntry};
/// use areg::service::Version;
///
/// let entry = ComponentEntry::new("Calc", "CalcThread", |ctx| {
///     Ok(Component::new(ctx.address().clone()))
/// })
/// .with_service(ServiceEntry::new("Calculator", Version::new(1, 0, 0)));
///
/// assert_eq!(entry.role_name, "Calc");
/// assert!(entry.provides("Calculator"));
/// ```
#[derive(Clone)]
pub struct ComponentEntry {
    /// Unique role name
    pub role_name: String,
    /// Name of the owning dispatcher thread
    pub thread_name: String,
    /// Provided services
    pub services: Vec<ServiceEntry>,
    /// Consumed services
    pub dependencies: Vec<DependencyEntry>,
    /// Worker threads
    pub workers: Vec<WorkerThreadEntry>,
    /// Builds the component
    pub factory: ComponentFactory,
    /// Runs after the component is unloaded
    pub destroy: Option<ComponentDestroy>,
}

impl ComponentEntry {
    /// Creates an entry for `role_name` running on `thread_name`.
    pub fn new<F>(role_name: impl Into<String>, thread_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ComponentContext<'_>) -> Result<Arc<Component>, AregError> + Send + Sync + 'static,
    {
        Self {
            role_name: role_name.into(),
            thread_name: thread_name.into(),
            services: Vec::new(),
            dependencies: Vec::new(),
            workers: Vec::new(),
            factory: Arc::new(factory),
            destroy: None,
        }
    }

    /// Adds a provided service.
    pub fn with_service(mut self, service: ServiceEntry) -> Self {
        self.services.push(service);
        self
    }

    /// Adds a consumed service.
    pub fn with_dependency(mut self, dependency: DependencyEntry) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Adds a worker thread.
    pub fn with_worker(mut self, worker: WorkerThreadEntry) -> Self {
        self.workers.push(worker);
        self
    }

    /// Sets the destroy hook.
    pub fn with_destroy<F>(mut self, destroy: F) -> Self
    where
        F: Fn(&Arc<Component>) + Send + Sync + 'static,
    {
        self.destroy = Some(Arc::new(destroy));
        self
    }

    /// Returns `true` if the entry lists `service` as provided.
    pub fn provides(&self, service: &str) -> bool {
        self.services.iter().any(|entry| entry.name == service)
    }

    /// Returns the dependency on `service`, if any.
    pub fn dependency(&self, service: &str) -> Option<&DependencyEntry> {
        self.dependencies
            .iter()
            .find(|entry| entry.service.name == service)
    }
}

impl fmt::Debug for ComponentEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentEntry")
            .field("role_name", &self.role_name)
            .field("thread_name", &self.thread_name)
            .field("services", &self.services)
            .field("dependencies", &self.dependencies)
            .field("workers", &self.workers)
            .field("destroy", &self.destroy.is_some())
            .finish()
    }
}

/// What a factory gets to build a component with.
pub struct ComponentContext<'a> {
    runtime: &'a Arc<Runtime>,
    entry: &'a ComponentEntry,
    address: crate::address::ComponentAddress,
}

impl<'a> ComponentContext<'a> {
    pub(crate) fn new(
        runtime: &'a Arc<Runtime>,
        entry: &'a ComponentEntry,
        address: crate::address::ComponentAddress,
    ) -> Self {
        Self {
            runtime,
            entry,
            address,
        }
    }

    /// Returns the runtime.
    pub fn runtime(&self) -> &'a Arc<Runtime> {
        self.runtime
    }

    /// Returns the entry being loaded.
    pub fn entry(&self) -> &'a ComponentEntry {
        self.entry
    }

    /// Returns the address the component must use.
    pub fn address(&self) -> &crate::address::ComponentAddress {
        &self.address
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_builder() {
        let entry = ComponentEntry::new("Client", "ClientThread", |ctx| {
            Ok(Component::new(ctx.address().clone()))
        })
        .with_dependency(DependencyEntry::new(
            "Calc",
            ServiceEntry::new("Calculator", Version::default()),
        ))
        .with_worker(WorkerThreadEntry::new("ClientWorker"))
        .with_destroy(|_| {});

        assert!(!entry.provides("Calculator"));
        assert_eq!(entry.dependency("Calculator").unwrap().role_name, "Calc");
        assert_eq!(entry.workers.len(), 1);
        assert!(format!("{entry:?}").contains("destroy: true"));
    }
}
