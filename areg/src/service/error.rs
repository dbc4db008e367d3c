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

//! Service layer error types.

use crate::service::MessageId;
use std::fmt;

/// Inconsistent message tables in a service interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceError {
    /// A message id was declared twice.
    DuplicateId {
        /// Service name
        service: String,
        /// The duplicated id
        msg_id: MessageId,
    },

    /// The reserved id `0` was declared.
    ReservedId {
        /// Service name
        service: String,
    },

    /// A request maps to an id that is not declared as a response.
    NotAResponse {
        /// Service name
        service: String,
        /// The request id
        request: MessageId,
        /// The id it maps to
        response: MessageId,
    },

    /// Two requests map to the same response.
    SharedResponse {
        /// Service name
        service: String,
        /// The shared response id
        response: MessageId,
    },

    /// The service name is empty.
    EmptyName,
}

impl fmt::Display for InterfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId { service, msg_id } => {
                write!(f, "Message id {} declared twice in service {}", msg_id, service)
            }
            Self::ReservedId { service } => {
                write!(f, "Message id 0 is reserved (service {})", service)
            }
            Self::NotAResponse {
                service,
                request,
                response,
            } => {
                write!(
                    f,
                    "Request {} of service {} maps to {}, which is not a response",
                    request, service, response
                )
            }
            Self::SharedResponse { service, response } => {
                write!(
                    f,
                    "Response {} of service {} is mapped by more than one request",
                    response, service
                )
            }
            Self::EmptyName => write!(f, "Service name must not be empty"),
        }
    }
}

impl std::error::Error for InterfaceError {}

/// Failures while matching stubs and proxies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// A stub for the same service and role is already registered.
    DuplicateStub {
        /// Service name
        service: String,
        /// Role name
        role: String,
    },

    /// No stub is registered for the service and role.
    StubNotFound {
        /// Service name
        service: String,
        /// Role name
        role: String,
    },
}

impl ServiceError {
    /// Returns `true` if retrying may succeed once the registry changes.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::StubNotFound { .. })
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateStub { service, role } => {
                write!(f, "Service {} with role {} is already provided", service, role)
            }
            Self::StubNotFound { service, role } => {
                write!(f, "Service {} with role {} is not provided", service, role)
            }
        }
    }
}

impl std::error::Error for ServiceError {}
