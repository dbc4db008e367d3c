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

//! Components and their per-instance bookkeeping.

use crate::address::ComponentAddress;
use crate::context::Runtime;
use crate::dispatcher::{DispatchError, DispatcherHandle, DispatcherThread};
use crate::stub::StubBase;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Address and worker threads of a component.
pub struct ComponentInfo {
    address: ComponentAddress,
    workers: Mutex<Vec<DispatcherThread>>,
}

impl ComponentInfo {
    fn new(address: ComponentAddress) -> Self {
        Self {
            address,
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Returns the component address.
    pub fn address(&self) -> &ComponentAddress {
        &self.address
    }

    /// Starts a worker dispatcher thread owned by the component.
    ///
    /// # Errors
    ///
    /// Fails if the thread name is invalid or taken.
    pub fn start_worker(
        &self,
        runtime: &Arc<Runtime>,
        name: &str,
    ) -> Result<DispatcherHandle, DispatchError> {
        let thread = DispatcherThread::spawn(runtime, name)?;
        let handle = thread.handle().clone();
        debug!(component = %self.address, worker = name, "worker thread started");
        self.workers.lock().push(thread);
        Ok(handle)
    }

    /// Returns the worker thread called `name`.
    pub fn worker(&self, name: &str) -> Option<DispatcherHandle> {
        self.workers
            .lock()
            .iter()
            .find(|thread| thread.address().name() == name)
            .map(|thread| thread.handle().clone())
    }

    /// Returns the number of running worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.lock().len()
    }

    /// Stops every worker thread, newest first.
    pub fn stop_workers(&self) {
        let workers = std::mem::take(&mut *self.workers.lock());
        for mut thread in workers.into_iter().rev() {
            thread.stop();
        }
    }
}

impl fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInfo")
            .field("address", &self.address)
            .field("workers", &self.worker_count())
            .finish()
    }
}

/// A unit of application logic bound to one dispatcher thread.
///
/// A component provides services through the stubs registered with
/// [`register_server_item`](Self::register_server_item). All of them run
/// on the component's thread.
pub struct Component {
    info: ComponentInfo,
    servers: RwLock<Vec<Arc<StubBase>>>,
}

impl Component {
    /// Creates a component at `address`.
    pub fn new(address: ComponentAddress) -> Arc<Self> {
        Arc::new(Self {
            info: ComponentInfo::new(address),
            servers: RwLock::new(Vec::new()),
        })
    }

    /// Returns the component address.
    pub fn address(&self) -> &ComponentAddress {
        self.info.address()
    }

    /// Returns the role name.
    pub fn role(&self) -> &str {
        self.info.address().role()
    }

    /// Returns the address and worker bookkeeping.
    pub fn info(&self) -> &ComponentInfo {
        &self.info
    }

    /// Adds a provided service. A stub for an already listed service
    /// replaces nothing and is ignored.
    pub fn register_server_item(&self, stub: Arc<StubBase>) -> bool {
        let mut servers = self.servers.write();
        if servers
            .iter()
            .any(|server| server.service_name() == stub.service_name())
        {
            return false;
        }
        servers.push(stub);
        true
    }

    /// Returns the stub providing `service`.
    pub fn find_server_by_name(&self, service: &str) -> Option<Arc<StubBase>> {
        self.servers
            .read()
            .iter()
            .find(|server| server.service_name() == service)
            .cloned()
    }

    /// Returns every provided service.
    pub fn server_items(&self) -> Vec<Arc<StubBase>> {
        self.servers.read().clone()
    }

    /// Shuts down every stub of the component.
    pub fn shutdown_servers(&self) {
        for server in self.server_items() {
            server.shutdown();
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let services: Vec<String> = self
            .servers
            .read()
            .iter()
            .map(|server| server.service_name().to_string())
            .collect();
        f.debug_struct("Component")
            .field("address", self.address())
            .field("services", &services)
            .field("workers", &self.info.worker_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RuntimeConfig;
    use crate::address::ThreadAddress;

    #[test]
    fn test_workers_start_and_stop() {
        let runtime = Runtime::new(RuntimeConfig::default()).unwrap();
        let component = Component::new(ComponentAddress::new("Worker", ThreadAddress::new("Owner")));
        component.info().start_worker(&runtime, "Helper").unwrap();
        assert_eq!(component.info().worker_count(), 1);
        assert!(component.info().worker("Helper").unwrap().is_running());
        assert!(runtime.threads().find_by_name("Helper").is_some());

        component.info().stop_workers();
        assert_eq!(component.info().worker_count(), 0);
        assert!(runtime.threads().find_by_name("Helper").is_none());
    }
}
