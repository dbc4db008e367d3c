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

//! Stub and proxy addresses.

use crate::address::{ComponentAddress, ThreadAddress, is_valid_name, truncate_name};
use crate::service::ServiceItem;
use std::fmt;

/// Address of a service provider: the service it implements and the
/// component hosting it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StubAddress {
    service: ServiceItem,
    component: ComponentAddress,
}

impl StubAddress {
    /// Creates a stub address.
    pub fn new(service: ServiceItem, component: ComponentAddress) -> Self {
        Self { service, component }
    }

    /// Returns the service.
    pub fn service(&self) -> &ServiceItem {
        &self.service
    }

    /// Returns the hosting component.
    pub fn component(&self) -> &ComponentAddress {
        &self.component
    }

    /// Returns the role name of the hosting component.
    pub fn role(&self) -> &str {
        self.component.role()
    }

    /// Returns the dispatcher thread the stub runs on.
    pub fn thread(&self) -> &ThreadAddress {
        self.component.thread()
    }

    /// Returns `true` if the hosting component address is valid.
    pub fn is_valid(&self) -> bool {
        self.component.is_valid()
    }
}

impl fmt::Display for StubAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service.name(), self.component)
    }
}

/// Address of a service consumer: the service and role it connects to and
/// the dispatcher thread it lives on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyAddress {
    service: ServiceItem,
    role: String,
    thread: ThreadAddress,
}

impl ProxyAddress {
    /// Creates a proxy address. The role name is truncated like component
    /// role names.
    pub fn new(service: ServiceItem, role: &str, thread: ThreadAddress) -> Self {
        Self {
            service,
            role: truncate_name(role),
            thread,
        }
    }

    /// Returns the service.
    pub fn service(&self) -> &ServiceItem {
        &self.service
    }

    /// Returns the role name of the stub this proxy connects to.
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Returns the dispatcher thread the proxy lives on.
    pub fn thread(&self) -> &ThreadAddress {
        &self.thread
    }

    /// Returns `true` if the role and thread are valid.
    pub fn is_valid(&self) -> bool {
        is_valid_name(&self.role) && self.thread.is_valid()
    }
}

impl fmt::Display for ProxyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}::{}", self.service.name(), self.role, self.thread)
    }
}
