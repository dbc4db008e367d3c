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

//! Matchmaking between stubs and proxies.
//!
//! The service manager knows which stub provides which (service, role)
//! pair and which proxies are waiting for it. Whenever either side appears
//! or disappears it posts [`ServiceConnectionEvent`]s to the affected
//! dispatcher threads; proxies and stubs react on their own threads.

use crate::address::ThreadAddress;
use crate::context::Runtime;
use crate::dispatcher::Event;
use crate::service::{
    ProxyAddress, ServiceConnection, ServiceConnectionEvent, ServiceError, StubAddress,
};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ServiceKey {
    service: String,
    role: String,
}

impl ServiceKey {
    fn of_stub(stub: &StubAddress) -> Self {
        Self {
            service: stub.service().name().to_string(),
            role: stub.role().to_string(),
        }
    }

    fn of_proxy(proxy: &ProxyAddress) -> Self {
        Self {
            service: proxy.service().name().to_string(),
            role: proxy.role().to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct ManagerState {
    stubs: HashMap<ServiceKey, StubAddress>,
    proxies: HashMap<ServiceKey, HashSet<ProxyAddress>>,
}

/// Registry of service providers and consumers.
#[derive(Debug, Default)]
pub struct ServiceManager {
    state: RwLock<ManagerState>,
}

impl ServiceManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Announces a stub and connects every proxy waiting for it.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::DuplicateStub`] if another stub already
    /// provides the same service under the same role.
    pub fn register_stub(&self, runtime: &Runtime, stub: &StubAddress) -> Result<(), ServiceError> {
        let key = ServiceKey::of_stub(stub);
        let mut state = self.state.write();
        if state.stubs.contains_key(&key) {
            return Err(ServiceError::DuplicateStub {
                service: key.service,
                role: key.role,
            });
        }
        state.stubs.insert(key.clone(), stub.clone());
        info!(stub = %stub, version = %stub.service().version(), "service registered");

        if let Some(proxies) = state.proxies.get(&key) {
            for proxy in proxies {
                connect(runtime, stub, proxy);
            }
        }
        Ok(())
    }

    /// Withdraws a stub and disconnects every proxy attached to it.
    ///
    /// Returns the proxies that were notified.
    pub fn unregister_stub(&self, runtime: &Runtime, stub: &StubAddress) -> Vec<ProxyAddress> {
        let key = ServiceKey::of_stub(stub);
        let mut state = self.state.write();
        if state.stubs.get(&key) != Some(stub) {
            return Vec::new();
        }
        state.stubs.remove(&key);
        info!(stub = %stub, "service unregistered");

        let proxies: Vec<_> = state
            .proxies
            .get(&key)
            .map(|proxies| proxies.iter().cloned().collect())
            .unwrap_or_default();
        for proxy in &proxies {
            let event =
                ServiceConnectionEvent::to_proxy(stub.clone(), proxy.clone(), ServiceConnection::Disconnected);
            post(runtime, proxy.thread(), Box::new(event));
        }
        proxies
    }

    /// Announces a proxy and connects it if its stub is already present.
    ///
    /// Returns the status the proxy is about to receive.
    pub fn register_proxy(&self, runtime: &Runtime, proxy: &ProxyAddress) -> ServiceConnection {
        let key = ServiceKey::of_proxy(proxy);
        let mut state = self.state.write();
        state
            .proxies
            .entry(key.clone())
            .or_default()
            .insert(proxy.clone());
        debug!(proxy = %proxy, "proxy registered");

        match state.stubs.get(&key) {
            Some(stub) => connect(runtime, stub, proxy),
            None => ServiceConnection::Disconnected,
        }
    }

    /// Withdraws a proxy and tells its stub the client is gone.
    pub fn unregister_proxy(&self, runtime: &Runtime, proxy: &ProxyAddress) {
        let key = ServiceKey::of_proxy(proxy);
        let mut state = self.state.write();
        let removed = match state.proxies.get_mut(&key) {
            Some(proxies) => {
                let removed = proxies.remove(proxy);
                if proxies.is_empty() {
                    state.proxies.remove(&key);
                }
                removed
            }
            None => false,
        };
        if !removed {
            return;
        }
        debug!(proxy = %proxy, "proxy unregistered");

        if let Some(stub) = state.stubs.get(&key) {
            if compatibility(stub, proxy) == ServiceConnection::Connected {
                let event = ServiceConnectionEvent::to_stub(
                    stub.clone(),
                    proxy.clone(),
                    ServiceConnection::Disconnected,
                );
                post(runtime, stub.thread(), Box::new(event));
            }
        }
    }

    /// Returns the stub providing `service` under `role`.
    pub fn find_stub(&self, service: &str, role: &str) -> Option<StubAddress> {
        let key = ServiceKey {
            service: service.to_string(),
            role: role.to_string(),
        };
        self.state.read().stubs.get(&key).cloned()
    }

    /// Returns the proxies registered for the stub's service and role.
    pub fn proxies_of(&self, stub: &StubAddress) -> Vec<ProxyAddress> {
        self.state
            .read()
            .proxies
            .get(&ServiceKey::of_stub(stub))
            .map(|proxies| proxies.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the number of registered stubs.
    pub fn stub_count(&self) -> usize {
        self.state.read().stubs.len()
    }

    /// Returns the number of registered proxies.
    pub fn proxy_count(&self) -> usize {
        self.state.read().proxies.values().map(HashSet::len).sum()
    }
}

fn compatibility(stub: &StubAddress, proxy: &ProxyAddress) -> ServiceConnection {
    if stub.service().version().can_serve(&proxy.service().version()) {
        ServiceConnection::Connected
    } else {
        ServiceConnection::Rejected
    }
}

fn connect(runtime: &Runtime, stub: &StubAddress, proxy: &ProxyAddress) -> ServiceConnection {
    let status = compatibility(stub, proxy);
    if status == ServiceConnection::Rejected {
        warn!(
            stub = %stub,
            proxy = %proxy,
            provided = %stub.service().version(),
            required = %proxy.service().version(),
            "service version rejected"
        );
    }
    let event = ServiceConnectionEvent::to_proxy(stub.clone(), proxy.clone(), status);
    post(runtime, proxy.thread(), Box::new(event));
    if status == ServiceConnection::Connected {
        let event = ServiceConnectionEvent::to_stub(stub.clone(), proxy.clone(), status);
        post(runtime, stub.thread(), Box::new(event));
    }
    status
}

fn post(runtime: &Runtime, thread: &ThreadAddress, event: Box<dyn Event>) {
    if let Err(error) = runtime.post_event(thread, event) {
        debug!(thread = %thread, %error, "connection event not delivered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::ComponentAddress;
    use crate::service::{ServiceItem, Version};
    use crate::{Runtime, RuntimeConfig};

    fn stub(version: Version) -> StubAddress {
        StubAddress::new(
            ServiceItem::new("Calc", version),
            ComponentAddress::new("Calc", ThreadAddress::new("StubThread")),
        )
    }

    fn proxy(thread: &str, version: Version) -> ProxyAddress {
        ProxyAddress::new(ServiceItem::new("Calc", version), "Calc", ThreadAddress::new(thread))
    }

    #[test]
    fn test_duplicate_stub_is_rejected() {
        let runtime = Runtime::new(RuntimeConfig::default()).unwrap();
        let manager = ServiceManager::new();
        let first = stub(Version::default());
        manager.register_stub(&runtime, &first).unwrap();
        assert!(matches!(
            manager.register_stub(&runtime, &first),
            Err(ServiceError::DuplicateStub { .. })
        ));
        assert_eq!(manager.stub_count(), 1);
        assert_eq!(manager.find_stub("Calc", "Calc"), Some(first));
    }

    #[test]
    fn test_proxy_status_follows_stub() {
        let runtime = Runtime::new(RuntimeConfig::default()).unwrap();
        let manager = ServiceManager::new();
        let waiting = proxy("T1", Version::default());
        assert_eq!(
            manager.register_proxy(&runtime, &waiting),
            ServiceConnection::Disconnected
        );

        let provider = stub(Version::new(1, 1, 0));
        manager.register_stub(&runtime, &provider).unwrap();
        assert_eq!(
            manager.register_proxy(&runtime, &proxy("T2", Version::new(1, 1, 0))),
            ServiceConnection::Connected
        );
        assert_eq!(
            manager.register_proxy(&runtime, &proxy("T3", Version::new(2, 0, 0))),
            ServiceConnection::Rejected
        );
        assert_eq!(manager.proxy_count(), 3);

        let notified = manager.unregister_stub(&runtime, &provider);
        assert_eq!(notified.len(), 3);
        assert_eq!(manager.stub_count(), 0);

        manager.unregister_proxy(&runtime, &waiting);
        assert_eq!(manager.proxy_count(), 2);
    }
}
