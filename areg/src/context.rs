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

//! The runtime context.
//!
//! A [`Runtime`] owns every structure shared between dispatcher threads:
//! the thread registry, the component directory, the proxy directory and
//! the service manager. Nothing is process-global, so independent runtimes
//! (one per test, for instance) never see each other's components.

use crate::AregError;
use crate::address::{ComponentAddress, ThreadAddress};
use crate::component::ComponentDirectory;
use crate::config::RuntimeConfig;
use crate::dispatcher::{DispatchError, DispatcherHandle, DispatcherThread, Event, ThreadRegistry};
use crate::observability::RuntimeMetrics;
use crate::proxy::{ProxyDirectory, Watchdog};
use crate::service::ServiceManager;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Shared state of one running system of components.
///
/// # Examples
///
/// ```rust
/// use areg::{Runtime, RuntimeConfig};
///
/// let runtime = Runtime::new(RuntimeConfig::new().with_name("demo")).unwrap();
/// let worker = runtime.spawn_thread("Worker").unwrap();
/// assert!(runtime.threads().is_registered(worker.address()));
///
/// runtime.shutdown();
/// assert!(!worker.is_running());
/// ```
pub struct Runtime {
    config: RuntimeConfig,
    threads: ThreadRegistry,
    components: ComponentDirectory,
    proxies: ProxyDirectory,
    services: ServiceManager,
    metrics: RuntimeMetrics,
    owned_threads: Mutex<Vec<DispatcherThread>>,
    watchdog: Mutex<Option<Watchdog>>,
}

impl Runtime {
    /// Creates a runtime. Starts the request watchdog when
    /// [`RuntimeConfig::request_timeout`] is set.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the watchdog thread cannot
    /// be started.
    pub fn new(config: RuntimeConfig) -> Result<Arc<Self>, AregError> {
        config.validate().map_err(AregError::Config)?;
        let runtime = Arc::new(Self {
            config,
            threads: ThreadRegistry::new(),
            components: ComponentDirectory::new(),
            proxies: ProxyDirectory::new(),
            services: ServiceManager::new(),
            metrics: RuntimeMetrics::default(),
            owned_threads: Mutex::new(Vec::new()),
            watchdog: Mutex::new(None),
        });

        if let Some(timeout) = runtime.config.request_timeout {
            let watchdog = Watchdog::start(
                Arc::downgrade(&runtime),
                runtime.config.watchdog_interval,
                timeout,
            )
            .map_err(|source| DispatchError::SpawnFailed {
                name: "areg-watchdog".to_string(),
                source,
            })?;
            *runtime.watchdog.lock() = Some(watchdog);
        }

        info!(runtime = runtime.config.display_name(), "runtime created");
        Ok(runtime)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Returns the registry of dispatcher threads.
    pub fn threads(&self) -> &ThreadRegistry {
        &self.threads
    }

    /// Returns the component directory.
    pub fn components(&self) -> &ComponentDirectory {
        &self.components
    }

    /// Returns the proxy directory.
    pub fn proxies(&self) -> &ProxyDirectory {
        &self.proxies
    }

    /// Returns the stub/proxy matchmaker.
    pub fn services(&self) -> &ServiceManager {
        &self.services
    }

    /// Returns the runtime counters.
    pub fn metrics(&self) -> &RuntimeMetrics {
        &self.metrics
    }

    /// Starts a dispatcher thread owned by the runtime. It is stopped by
    /// [`shutdown`](Self::shutdown).
    ///
    /// # Errors
    ///
    /// Fails if the name is invalid or already in use.
    pub fn spawn_thread(self: &Arc<Self>, name: &str) -> Result<DispatcherHandle, DispatchError> {
        let thread = DispatcherThread::spawn(self, name)?;
        let handle = thread.handle().clone();
        self.owned_threads.lock().push(thread);
        Ok(handle)
    }

    /// Checks that `address` is well formed and that its dispatcher thread
    /// is registered with this runtime.
    pub fn is_valid_address(&self, address: &ComponentAddress) -> bool {
        address.is_valid() && self.threads.is_registered(address.thread())
    }

    /// Posts an event to the dispatcher thread at `thread`.
    ///
    /// # Errors
    ///
    /// Fails if the thread is unknown or has stopped.
    pub fn post_event(&self, thread: &ThreadAddress, event: Box<dyn Event>) -> Result<(), DispatchError> {
        self.threads.require(thread)?.post_event(event)
    }

    /// Stops the watchdog, shuts down every registered component's stubs
    /// and stops the dispatcher threads owned by the runtime, newest first.
    ///
    /// Threads spawned directly with [`DispatcherThread::spawn`] belong to
    /// their caller and keep running.
    pub fn shutdown(&self) {
        let watchdog = self.watchdog.lock().take();
        drop(watchdog);

        for component in self.components.components() {
            component.shutdown_servers();
            component.info().stop_workers();
            self.components.remove(component.address());
        }

        let threads = std::mem::take(&mut *self.owned_threads.lock());
        if !threads.is_empty() {
            debug!(count = threads.len(), "stopping runtime threads");
        }
        for mut thread in threads.into_iter().rev() {
            thread.stop();
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.shutdown();
        debug!(runtime = self.config.display_name(), "runtime released");
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("threads", &self.threads.len())
            .field("components", &self.components.len())
            .field("proxies", &self.proxies.len())
            .field("stubs", &self.services.stub_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::TaskEvent;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = RuntimeConfig::new().with_shutdown_timeout(Duration::ZERO);
        assert!(matches!(Runtime::new(config), Err(AregError::Config(_))));
    }

    #[test]
    fn test_post_event_by_address() {
        let runtime = Runtime::new(RuntimeConfig::default()).unwrap();
        let handle = runtime.spawn_thread("Poster").unwrap();
        let (sender, receiver) = mpsc::channel();
        runtime
            .post_event(
                handle.address(),
                Box::new(TaskEvent::new(move |_| sender.send(()).unwrap())),
            )
            .unwrap();
        assert!(receiver.recv_timeout(Duration::from_secs(5)).is_ok());

        let missing = ThreadAddress::new("Missing");
        let error = runtime.post_event(&missing, Box::new(TaskEvent::new(|_| {})));
        assert!(matches!(error, Err(DispatchError::ThreadNotFound { .. })));
    }

    #[test]
    fn test_address_validity_requires_live_thread() {
        let runtime = Runtime::new(RuntimeConfig::default()).unwrap();
        let handle = runtime.spawn_thread("Home").unwrap();
        let home = ComponentAddress::new("Calc", handle.address().clone());
        assert!(runtime.is_valid_address(&home));

        let ghost = ComponentAddress::new("Ghost", ThreadAddress::new("NoSuchThread"));
        assert!(ghost.is_valid());
        assert!(!runtime.is_valid_address(&ghost));

        runtime.shutdown();
        assert!(!runtime.is_valid_address(&home));
    }

    #[test]
    fn test_runtimes_are_independent() {
        let first = Runtime::new(RuntimeConfig::default()).unwrap();
        let second = Runtime::new(RuntimeConfig::default()).unwrap();
        first.spawn_thread("Shared").unwrap();
        assert!(second.spawn_thread("Shared").is_ok());
        assert_eq!(first.threads().len(), 1);
        assert_eq!(second.threads().len(), 1);
    }

    #[test]
    fn test_shutdown_stops_owned_threads() {
        let runtime = Runtime::new(RuntimeConfig::default()).unwrap();
        let first = runtime.spawn_thread("First").unwrap();
        let second = runtime.spawn_thread("Second").unwrap();
        runtime.shutdown();
        assert!(!first.is_running());
        assert!(!second.is_running());
        assert!(runtime.threads().is_empty());
        assert_eq!(runtime.metrics().dispatch.active_threads(), 0);
    }
}
