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

//! Service interfaces and the events flowing between proxies and stubs.
//!
//! A service is described by a [`ServiceInterface`] message table. A stub
//! provides it under a role name, a proxy consumes it, and the
//! [`ServiceManager`] connects the two. Requests travel as
//! [`ServiceRequestEvent`]s, answers and updates as
//! [`ServiceResponseEvent`]s, each carrying a [`ResultType`] instead of
//! raising errors across threads.

mod address;
mod error;
mod event;
mod interface;
mod manager;
mod message;

pub use self::address::{ProxyAddress, StubAddress};
pub use self::error::{InterfaceError, ServiceError};
pub use self::event::{
    ConnectionSide, NotifyAction, NotifyRequestEvent, ServiceConnectionEvent, ServiceEvent,
    ServiceRequestEvent, ServiceResponseEvent,
};
pub use self::interface::{ServiceInterface, ServiceInterfaceBuilder, ServiceItem, Version};
pub use self::manager::ServiceManager;
pub use self::message::{
    DataState, MessageId, MessageKind, ResultType, SequenceNr, ServiceConnection,
};
