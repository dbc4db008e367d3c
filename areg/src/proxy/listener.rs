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

//! Proxy listeners and the notifications they receive.

use crate::context::Runtime;
use crate::dispatcher::{Event, EventTarget};
use crate::proxy::ProxyBase;
use crate::service::{DataState, MessageId, ResultType, SequenceNr, ServiceConnection};
use std::fmt;
use std::sync::Arc;

/// Outcome of a response, attribute update or broadcast as seen by a
/// listener.
///
/// For failed requests the id is the originating request, not the
/// response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    msg_id: MessageId,
    result: ResultType,
    sequence: SequenceNr,
    state: DataState,
}

impl Notification {
    /// Creates a notification.
    pub fn new(msg_id: MessageId, result: ResultType, sequence: SequenceNr, state: DataState) -> Self {
        Self {
            msg_id,
            result,
            sequence,
            state,
        }
    }

    /// Returns the message id.
    pub fn msg_id(&self) -> MessageId {
        self.msg_id
    }

    /// Returns the result.
    pub fn result(&self) -> ResultType {
        self.result
    }

    /// Returns the sequence number; unsolicited for subscriptions.
    pub fn sequence(&self) -> SequenceNr {
        self.sequence
    }

    /// Returns the cached data state of the id after the update.
    pub fn state(&self) -> DataState {
        self.state
    }

    /// Returns `true` if the request behind this notification failed.
    pub fn request_failed(&self) -> bool {
        self.result.is_failure()
    }
}

/// Receives connection changes and notifications from a proxy.
///
/// Callbacks run on the dispatcher thread the listener registered from,
/// or on the proxy's owner thread when it registered from elsewhere.
pub trait ProxyListener: Send + Sync {
    /// The proxy connected to or lost its stub.
    fn on_service_connected(&self, proxy: &Arc<ProxyBase>, status: ServiceConnection) {
        let _ = (proxy, status);
    }

    /// A response, update, broadcast or failure arrived.
    fn on_notification(&self, proxy: &Arc<ProxyBase>, notification: &Notification);
}

pub(crate) fn same_listener(a: &Arc<dyn ProxyListener>, b: &Arc<dyn ProxyListener>) -> bool {
    // Data pointers only; vtable pointers are not unique per type.
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[derive(Debug, Clone, Copy)]
enum Delivery {
    Data(Notification),
    Connection(ServiceConnection),
}

/// Carries one callback to a listener's dispatcher thread.
pub struct NotificationEvent {
    proxy: Arc<ProxyBase>,
    listener: Arc<dyn ProxyListener>,
    delivery: Delivery,
}

crate::runtime_object!(NotificationEvent, "areg::NotificationEvent");

impl NotificationEvent {
    /// Creates an event delivering `notification`.
    pub fn data(proxy: Arc<ProxyBase>, listener: Arc<dyn ProxyListener>, notification: Notification) -> Self {
        Self {
            proxy,
            listener,
            delivery: Delivery::Data(notification),
        }
    }

    /// Creates an event delivering a connection change.
    pub fn connection(
        proxy: Arc<ProxyBase>,
        listener: Arc<dyn ProxyListener>,
        status: ServiceConnection,
    ) -> Self {
        Self {
            proxy,
            listener,
            delivery: Delivery::Connection(status),
        }
    }

    /// Returns the carried notification, if this is not a connection
    /// change.
    pub fn notification(&self) -> Option<&Notification> {
        match &self.delivery {
            Delivery::Data(notification) => Some(notification),
            Delivery::Connection(_) => None,
        }
    }
}

impl fmt::Debug for NotificationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationEvent")
            .field("proxy", self.proxy.address())
            .field("delivery", &self.delivery)
            .finish()
    }
}

impl Event for NotificationEvent {
    fn target(&self) -> EventTarget {
        EventTarget::Itself
    }

    fn process(&self, _runtime: &Arc<Runtime>) {
        match &self.delivery {
            Delivery::Data(notification) => {
                if !self.proxy.is_released() {
                    self.listener.on_notification(&self.proxy, notification);
                }
            }
            Delivery::Connection(status) => self.listener.on_service_connected(&self.proxy, *status),
        }
    }
}
