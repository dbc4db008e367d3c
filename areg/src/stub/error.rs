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

//! Stub error types.

use crate::dispatcher::DispatchError;
use crate::serialization::SerializationError;
use crate::service::{MessageId, MessageKind, ServiceError};
use thiserror::Error;

/// Errors raised by local stub operations.
///
/// Failures a proxy must learn about never use this type; they travel back
/// as a [`ResultType`](crate::service::ResultType) on a response event.
#[derive(Debug, Error)]
pub enum StubError {
    /// The message id is not declared by the service interface.
    #[error("message {msg_id} is not declared by service {service}")]
    UnknownMessage {
        /// Service name
        service: String,
        /// The undeclared id
        msg_id: MessageId,
    },

    /// The message id has a different kind than the operation needs.
    #[error("message {msg_id} of service {service} is not a {expected:?}")]
    WrongKind {
        /// Service name
        service: String,
        /// The offending id
        msg_id: MessageId,
        /// The kind the operation needs
        expected: MessageKind,
    },

    /// The owning runtime was released.
    #[error("runtime of stub {stub} is gone")]
    Released {
        /// Display form of the stub address
        stub: String,
    },

    /// A payload could not be written.
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// The stub's dispatcher thread rejected a registration.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The service manager rejected the stub.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl StubError {
    /// Returns `true` if retrying later may succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Dispatch(e) => e.is_recoverable(),
            Self::Service(e) => e.is_recoverable(),
            _ => false,
        }
    }
}
