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

//! Message identifiers, result kinds and data states.

use std::fmt;

/// Identifier of a request, response, attribute or broadcast within one
/// service interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(u32);

impl MessageId {
    /// Reserved id meaning "no message"; never declared by an interface.
    pub const NOT_PROCESSED: Self = Self(0);

    /// Creates a message id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns `true` for [`MessageId::NOT_PROCESSED`].
    #[must_use]
    pub const fn is_not_processed(self) -> bool {
        self.0 == Self::NOT_PROCESSED.0
    }
}

impl From<u32> for MessageId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role a message id plays in its interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Sent by a proxy to ask the stub to do something.
    Request,
    /// Sent by a stub to answer a request.
    Response,
    /// State owned by the stub and pushed to subscribed proxies.
    Attribute,
    /// One-to-many notification without an originating request.
    Broadcast,
}

impl MessageKind {
    /// Returns `true` for kinds a proxy can subscribe to.
    #[must_use]
    pub const fn is_notifiable(self) -> bool {
        !matches!(self, Self::Request)
    }
}

/// Outcome carried by a response or update event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultType {
    /// The request succeeded and the payload holds the response.
    RequestOk,
    /// An attribute update or broadcast with a valid payload.
    DataOk,
    /// A request notification was removed while in flight.
    RequestInvalid,
    /// An attribute was invalidated.
    DataInvalid,
    /// The stub failed to process the request.
    RequestError,
    /// The stub is busy with the same request.
    RequestBusy,
    /// The stub canceled the request.
    RequestCanceled,
    /// The message could not reach its target.
    MessageUndelivered,
    /// The stub refused the proxy.
    ServiceRejected,
}

impl ResultType {
    /// Returns `true` for results carrying a valid payload.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::RequestOk | Self::DataOk)
    }

    /// Returns `true` for request level failures delivered to the
    /// request's failure listeners.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(
            self,
            Self::RequestError
                | Self::RequestBusy
                | Self::RequestCanceled
                | Self::MessageUndelivered
                | Self::ServiceRejected
        )
    }

    /// Returns `true` for the benign invalidation results.
    #[must_use]
    pub const fn is_invalidation(self) -> bool {
        matches!(self, Self::RequestInvalid | Self::DataInvalid)
    }

    /// Returns the stable name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RequestOk => "RequestOk",
            Self::DataOk => "DataOk",
            Self::RequestInvalid => "RequestInvalid",
            Self::DataInvalid => "DataInvalid",
            Self::RequestError => "RequestError",
            Self::RequestBusy => "RequestBusy",
            Self::RequestCanceled => "RequestCanceled",
            Self::MessageUndelivered => "MessageUndelivered",
            Self::ServiceRejected => "ServiceRejected",
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Validity of a cached value on the proxy side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataState {
    /// Nothing received yet.
    #[default]
    Unknown,
    /// The cached value is current.
    DataIsOk,
    /// The cached value is stale or was invalidated.
    DataIsInvalid,
}

impl fmt::Display for DataState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unknown => "Unknown",
            Self::DataIsOk => "DataIsOk",
            Self::DataIsInvalid => "DataIsInvalid",
        })
    }
}

/// Sequence number correlating a response with its request.
///
/// Allocated per proxy starting at 1. Unsolicited updates carry
/// [`SequenceNr::UNSOLICITED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SequenceNr(u64);

impl SequenceNr {
    /// Sequence number of updates not caused by a request.
    pub const UNSOLICITED: Self = Self(0);

    /// Creates a sequence number.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns `true` for [`SequenceNr::UNSOLICITED`].
    #[must_use]
    pub const fn is_unsolicited(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for SequenceNr {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SequenceNr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Availability of a service as seen by a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceConnection {
    /// No compatible stub is registered.
    #[default]
    Disconnected,
    /// A stub is registered and serving.
    Connected,
    /// A stub with an incompatible version is registered.
    Rejected,
}

impl fmt::Display for ServiceConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "Disconnected",
            Self::Connected => "Connected",
            Self::Rejected => "Rejected",
        })
    }
}
