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

//! Directory of live proxies.

use crate::address::ThreadAddress;
use crate::proxy::ProxyBase;
use crate::service::ProxyAddress;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Lookup of proxies by address. One proxy exists per service, role and
/// owner thread; clients on the same thread share it.
#[derive(Debug, Default)]
pub struct ProxyDirectory {
    proxies: RwLock<HashMap<ProxyAddress, Arc<ProxyBase>>>,
}

impl ProxyDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a proxy by address.
    pub fn find(&self, address: &ProxyAddress) -> Option<Arc<ProxyBase>> {
        self.proxies.read().get(address).cloned()
    }

    /// Looks up the proxy of `service` under `role` owned by `thread`.
    pub fn find_in_thread(&self, service: &str, role: &str, thread: &ThreadAddress) -> Option<Arc<ProxyBase>> {
        self.proxies
            .read()
            .values()
            .find(|proxy| {
                let address = proxy.address();
                address.service().name() == service && address.role() == role && address.thread() == thread
            })
            .cloned()
    }

    /// Attaches a client to the proxy at `address`, creating the proxy with
    /// `create` if it is missing or already released. `attach` returns
    /// `false` for a released proxy. The flag is `true` when the proxy was
    /// created.
    ///
    /// Attaching runs under the directory lock, so it cannot interleave
    /// with [`release_with`](Self::release_with).
    pub(crate) fn find_or_insert<F, A>(&self, address: &ProxyAddress, create: F, mut attach: A) -> (Arc<ProxyBase>, bool)
    where
        F: FnOnce() -> Arc<ProxyBase>,
        A: FnMut(&ProxyBase) -> bool,
    {
        {
            let proxies = self.proxies.read();
            if let Some(proxy) = proxies.get(address) {
                if attach(proxy) {
                    return (proxy.clone(), false);
                }
            }
        }
        let mut proxies = self.proxies.write();
        if let Some(proxy) = proxies.get(address) {
            if attach(proxy) {
                return (proxy.clone(), false);
            }
        }
        let proxy = create();
        attach(&proxy);
        proxies.insert(address.clone(), proxy.clone());
        (proxy, true)
    }

    /// Runs `release` under the directory write lock and afterwards drops
    /// the entry of `proxy` if it is released. An entry that already holds
    /// a newer proxy at the same address is left alone.
    pub(crate) fn release_with<R>(&self, proxy: &ProxyBase, release: impl FnOnce() -> R) -> R {
        let mut proxies = self.proxies.write();
        let outcome = release();
        let same = proxies
            .get(proxy.address())
            .is_some_and(|entry| std::ptr::eq(Arc::as_ptr(entry), proxy));
        if same && proxy.is_released() {
            proxies.remove(proxy.address());
        }
        outcome
    }

    /// Returns every proxy owned by `thread`.
    pub fn proxies_of_thread(&self, thread: &ThreadAddress) -> Vec<Arc<ProxyBase>> {
        self.proxies
            .read()
            .values()
            .filter(|proxy| proxy.address().thread() == thread)
            .cloned()
            .collect()
    }

    /// Returns every proxy.
    pub fn all(&self) -> Vec<Arc<ProxyBase>> {
        self.proxies.read().values().cloned().collect()
    }

    /// Returns the number of proxies.
    pub fn len(&self) -> usize {
        self.proxies.read().len()
    }

    /// Returns `true` if no proxy exists.
    pub fn is_empty(&self) -> bool {
        self.proxies.read().is_empty()
    }
}
