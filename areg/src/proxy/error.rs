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

//! Proxy error types.

use crate::dispatcher::DispatchError;
use crate::serialization::{DeserializationError, SerializationError};
use crate::service::{MessageId, ResultType};
use thiserror::Error;

/// Errors raised by local proxy operations.
///
/// # Examples
///
/// ```rust
/// use areg::proxy::ProxyError;
/// use areg::service::ResultType;
///
/// let error = ProxyError::ServiceUnavailable {
///     proxy: "Calculator:1.0.0/Calc@Client".to_string(),
/// };
/// assert_eq!(error.result_type(), Some(ResultType::RequestError));
/// assert!(error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The proxy is not connected to a stub; nothing was queued.
    #[error("service of proxy {proxy} is not available")]
    ServiceUnavailable {
        /// Display form of the proxy address
        proxy: String,
    },

    /// The id is not a request of the service.
    #[error("message {msg_id} is not a request")]
    NotARequest {
        /// The offending id
        msg_id: MessageId,
    },

    /// The id cannot be subscribed to.
    #[error("message {msg_id} is not a response, attribute or broadcast")]
    NotNotifiable {
        /// The offending id
        msg_id: MessageId,
    },

    /// The id is not declared by the service interface.
    #[error("message {msg_id} is not declared by service {service}")]
    UnknownMessage {
        /// Service name
        service: String,
        /// The undeclared id
        msg_id: MessageId,
    },

    /// An event carried data the proxy cannot interpret.
    #[error("protocol error on message {msg_id}: {reason}")]
    Protocol {
        /// The message id of the event
        msg_id: MessageId,
        /// What went wrong
        reason: String,
    },

    /// The proxy was released by its last client.
    #[error("proxy {proxy} was released")]
    Released {
        /// Display form of the proxy address
        proxy: String,
    },

    /// The role or owner thread cannot host a proxy.
    #[error("cannot create proxy for role '{role}' on thread {thread}")]
    InvalidAddress {
        /// Requested role
        role: String,
        /// Requested owner thread
        thread: String,
    },

    /// A payload could not be written.
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// A payload could not be read.
    #[error(transparent)]
    Deserialization(#[from] DeserializationError),

    /// The owner thread rejected a registration.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl ProxyError {
    /// Returns `true` if retrying later may succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::ServiceUnavailable { .. } | Self::Protocol { .. } => true,
            Self::Dispatch(e) => e.is_recoverable(),
            _ => false,
        }
    }

    /// Returns the result a failure handler sees for this error, if any.
    #[must_use]
    pub fn result_type(&self) -> Option<ResultType> {
        match self {
            Self::ServiceUnavailable { .. } => Some(ResultType::RequestError),
            _ => None,
        }
    }

    /// Returns a short, stable code for log fields.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::NotARequest { .. } => "not_a_request",
            Self::NotNotifiable { .. } => "not_notifiable",
            Self::UnknownMessage { .. } => "unknown_message",
            Self::Protocol { .. } => "protocol",
            Self::Released { .. } => "proxy_released",
            Self::InvalidAddress { .. } => "invalid_address",
            Self::Serialization(_) => "serialization",
            Self::Deserialization(_) => "deserialization",
            Self::Dispatch(e) => e.code(),
        }
    }
}
