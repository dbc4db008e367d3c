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

//! Service interface descriptions.
//!
//! A [`ServiceInterface`] is the message table of one service: which ids
//! are requests, responses, attributes and broadcasts, and which response
//! answers which request. Proxies and stubs consult the same table, so it
//! is validated once when built.

use crate::service::{InterfaceError, MessageId, MessageKind};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Version of a service interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    /// Incompatible changes
    pub major: u16,
    /// Backward compatible additions
    pub minor: u16,
    /// Fixes
    pub patch: u16,
}

impl Version {
    /// Creates a version.
    #[must_use]
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Returns `true` if a provider at `self` can serve a consumer built
    /// against `required`: same major version, at least the same minor.
    #[must_use]
    pub const fn can_serve(&self, required: &Version) -> bool {
        self.major == required.major && self.minor >= required.minor
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Name and version of a service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceItem {
    name: String,
    version: Version,
}

impl ServiceItem {
    /// Creates a service item.
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    /// Returns the service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the service version.
    pub fn version(&self) -> Version {
        self.version
    }
}

impl fmt::Display for ServiceItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

/// Validated message table of a service.
#[derive(Debug, Clone)]
pub struct ServiceInterface {
    item: ServiceItem,
    kinds: HashMap<MessageId, MessageKind>,
    responses: HashMap<MessageId, MessageId>,
    requests: HashMap<MessageId, MessageId>,
}

impl ServiceInterface {
    /// Starts building the table of `name`.
    pub fn builder(name: impl Into<String>, version: Version) -> ServiceInterfaceBuilder {
        ServiceInterfaceBuilder {
            item: ServiceItem::new(name, version),
            entries: Vec::new(),
        }
    }

    /// Returns the service name and version.
    pub fn service_item(&self) -> &ServiceItem {
        &self.item
    }

    /// Returns the service name.
    pub fn name(&self) -> &str {
        self.item.name()
    }

    /// Returns the kind of `msg_id`, or `None` if the id is not declared.
    pub fn kind_of(&self, msg_id: MessageId) -> Option<MessageKind> {
        self.kinds.get(&msg_id).copied()
    }

    /// Returns `true` if `msg_id` is a declared request.
    pub fn is_request(&self, msg_id: MessageId) -> bool {
        self.kind_of(msg_id) == Some(MessageKind::Request)
    }

    /// Returns the response answering `request`, if it declares one.
    pub fn response_of(&self, request: MessageId) -> Option<MessageId> {
        self.responses.get(&request).copied()
    }

    /// Returns the request answered by `response`.
    pub fn request_of(&self, response: MessageId) -> Option<MessageId> {
        self.requests.get(&response).copied()
    }

    /// Returns every declared id of the given kind, in ascending order.
    pub fn ids_of(&self, kind: MessageKind) -> Vec<MessageId> {
        let mut ids: Vec<_> = self
            .kinds
            .iter()
            .filter(|(_, k)| **k == kind)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }
}

/// Builder for [`ServiceInterface`].
///
/// # Examples
///
/// ```rust
/// use areg::service::{MessageId, MessageKind, ServiceInterface, Version};
///
/// let calc = ServiceInterface::builder("Calc", Version::new(1, 0, 0))
///     .request(10, Some(11))
///     .response(11)
///     .attribute(20)
///     .broadcast(30)
///     .build()
///     .unwrap();
///
/// assert_eq!(calc.response_of(MessageId::new(10)), Some(MessageId::new(11)));
/// assert_eq!(calc.request_of(MessageId::new(11)), Some(MessageId::new(10)));
/// assert_eq!(calc.kind_of(MessageId::new(20)), Some(MessageKind::Attribute));
/// ```
#[derive(Debug, Clone)]
pub struct ServiceInterfaceBuilder {
    item: ServiceItem,
    entries: Vec<(MessageId, MessageKind, Option<MessageId>)>,
}

impl ServiceInterfaceBuilder {
    /// Declares a request, optionally answered by `response`.
    pub fn request(mut self, id: u32, response: Option<u32>) -> Self {
        self.entries.push((
            MessageId::new(id),
            MessageKind::Request,
            response.map(MessageId::new),
        ));
        self
    }

    /// Declares a response.
    pub fn response(mut self, id: u32) -> Self {
        self.entries
            .push((MessageId::new(id), MessageKind::Response, None));
        self
    }

    /// Declares an attribute.
    pub fn attribute(mut self, id: u32) -> Self {
        self.entries
            .push((MessageId::new(id), MessageKind::Attribute, None));
        self
    }

    /// Declares a broadcast.
    pub fn broadcast(mut self, id: u32) -> Self {
        self.entries
            .push((MessageId::new(id), MessageKind::Broadcast, None));
        self
    }

    /// Validates the table.
    ///
    /// # Errors
    ///
    /// Fails when the name is empty, an id is `0` or declared twice, a
    /// request maps to something other than a response, or two requests
    /// share one response.
    pub fn build(self) -> Result<Arc<ServiceInterface>, InterfaceError> {
        let service = self.item.name().to_string();
        if service.is_empty() {
            return Err(InterfaceError::EmptyName);
        }
        let mut kinds = HashMap::with_capacity(self.entries.len());
        for (id, kind, _) in &self.entries {
            if id.is_not_processed() {
                return Err(InterfaceError::ReservedId { service });
            }
            if kinds.insert(*id, *kind).is_some() {
                return Err(InterfaceError::DuplicateId {
                    service,
                    msg_id: *id,
                });
            }
        }

        let mut responses = HashMap::new();
        let mut requests = HashMap::new();
        for (request, _, response) in &self.entries {
            let Some(response) = response else {
                continue;
            };
            if kinds.get(response) != Some(&MessageKind::Response) {
                return Err(InterfaceError::NotAResponse {
                    service,
                    request: *request,
                    response: *response,
                });
            }
            if requests.insert(*response, *request).is_some() {
                return Err(InterfaceError::SharedResponse {
                    service,
                    response: *response,
                });
            }
            responses.insert(*request, *response);
        }

        Ok(Arc::new(ServiceInterface {
            item: self.item,
            kinds,
            responses,
            requests,
        }))
    }
}
