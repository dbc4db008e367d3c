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

//! Top-level error type.
//!
//! Each layer of the runtime has its own error type:
//!
//! 1. **Dispatch**: thread and consumer management ([`DispatchError`])
//! 2. **Component**: loading and directory registration ([`ComponentError`])
//! 3. **Service**: interface tables and stub matchmaking ([`InterfaceError`],
//!    [`ServiceError`])
//! 4. **Proxy / Stub**: the two ends of a service ([`ProxyError`], [`StubError`])
//! 5. **Application**: errors raised by user handlers (boxed trait objects)
//!
//! [`AregError`] composes them for code that drives the whole runtime.
//!
//! Failures between a proxy and a stub never travel as errors: they are
//! carried as a [`ResultType`](crate::service::ResultType) on the response
//! event. The types here cover the local, synchronous operations.

use crate::component::ComponentError;
use crate::dispatcher::DispatchError;
use crate::proxy::ProxyError;
use crate::service::{InterfaceError, ServiceError};
use crate::stub::StubError;
use std::error::Error as StdError;
use std::fmt;

/// Any error raised by the runtime.
///
/// # Examples
///
/// ```rust
/// use areg::AregError;
/// use areg::dispatcher::DispatchError;
///
/// let error: AregError = DispatchError::ThreadNotFound {
///     thread: "Worker".to_string(),
/// }
/// .into();
/// assert!(error.is_recoverable());
/// assert_eq!(error.code(), "thread_not_found");
/// ```
#[derive(Debug)]
pub enum AregError {
    /// The runtime configuration is invalid.
    Config(String),

    /// A dispatcher thread or consumer operation failed.
    Dispatch(DispatchError),

    /// A component could not be loaded or registered.
    Component(ComponentError),

    /// A service message table is inconsistent.
    Interface(InterfaceError),

    /// Stub and proxy matchmaking failed.
    Service(ServiceError),

    /// A proxy operation failed.
    Proxy(ProxyError),

    /// A stub operation failed.
    Stub(StubError),

    /// An application handler failed.
    Application(Box<dyn StdError + Send + Sync>),
}

impl AregError {
    /// Returns `true` if retrying later may succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(_) => false,
            Self::Dispatch(e) => e.is_recoverable(),
            Self::Component(e) => e.is_recoverable(),
            Self::Interface(_) => false,
            Self::Service(e) => e.is_recoverable(),
            Self::Proxy(e) => e.is_recoverable(),
            Self::Stub(e) => e.is_recoverable(),
            Self::Application(_) => false,
        }
    }

    /// Returns a short, stable code for log fields.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Dispatch(e) => e.code(),
            Self::Component(_) => "component",
            Self::Interface(_) => "interface",
            Self::Service(_) => "service",
            Self::Proxy(e) => e.code(),
            Self::Stub(_) => "stub",
            Self::Application(_) => "application",
        }
    }

    /// Returns `true` if this error was raised by application code.
    #[must_use]
    pub const fn is_application_error(&self) -> bool {
        matches!(self, Self::Application(_))
    }
}

impl fmt::Display for AregError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(reason) => write!(f, "invalid configuration: {}", reason),
            Self::Dispatch(e) => write!(f, "dispatch error: {}", e),
            Self::Component(e) => write!(f, "component error: {}", e),
            Self::Interface(e) => write!(f, "interface error: {}", e),
            Self::Service(e) => write!(f, "service error: {}", e),
            Self::Proxy(e) => write!(f, "proxy error: {}", e),
            Self::Stub(e) => write!(f, "stub error: {}", e),
            Self::Application(e) => write!(f, "application error: {}", e),
        }
    }
}

impl StdError for AregError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Config(_) => None,
            Self::Dispatch(e) => Some(e),
            Self::Component(e) => Some(e),
            Self::Interface(e) => Some(e),
            Self::Service(e) => Some(e),
            Self::Proxy(e) => Some(e),
            Self::Stub(e) => Some(e),
            Self::Application(e) => Some(e.as_ref()),
        }
    }
}

impl From<DispatchError> for AregError {
    fn from(error: DispatchError) -> Self {
        Self::Dispatch(error)
    }
}

impl From<ComponentError> for AregError {
    fn from(error: ComponentError) -> Self {
        Self::Component(error)
    }
}

impl From<InterfaceError> for AregError {
    fn from(error: InterfaceError) -> Self {
        Self::Interface(error)
    }
}

impl From<ServiceError> for AregError {
    fn from(error: ServiceError) -> Self {
        Self::Service(error)
    }
}

impl From<ProxyError> for AregError {
    fn from(error: ProxyError) -> Self {
        Self::Proxy(error)
    }
}

impl From<StubError> for AregError {
    fn from(error: StubError) -> Self {
        Self::Stub(error)
    }
}
