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

//! Events exchanged between proxies and stubs.

use crate::context::Runtime;
use crate::dispatcher::{ConsumerKey, Event, EventTarget};
use crate::serialization::InStream;
use crate::service::{
    MessageId, ProxyAddress, ResultType, SequenceNr, ServiceConnection, StubAddress,
};
use std::sync::Arc;
use tracing::debug;

/// Part shared by request and response events: message id, sequence
/// number and serialized payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEvent {
    msg_id: MessageId,
    sequence: SequenceNr,
    payload: Vec<u8>,
}

crate::runtime_object!(ServiceEvent, "areg::ServiceEvent");

impl ServiceEvent {
    /// Creates the shared part.
    pub fn new(msg_id: MessageId, sequence: SequenceNr, payload: Vec<u8>) -> Self {
        Self {
            msg_id,
            sequence,
            payload,
        }
    }

    /// Returns the message id.
    pub fn msg_id(&self) -> MessageId {
        self.msg_id
    }

    /// Returns the sequence number.
    pub fn sequence(&self) -> SequenceNr {
        self.sequence
    }

    /// Returns the serialized payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Opens the payload for reading.
    pub fn stream(&self) -> InStream<'_> {
        InStream::new(&self.payload)
    }
}

/// A request travelling from a proxy to a stub.
#[derive(Debug)]
pub struct ServiceRequestEvent {
    base: ServiceEvent,
    source: ProxyAddress,
    target: StubAddress,
}

crate::runtime_object!(ServiceRequestEvent, "areg::ServiceRequestEvent", base = base);

impl ServiceRequestEvent {
    /// Creates a request event.
    pub fn new(
        source: ProxyAddress,
        target: StubAddress,
        msg_id: MessageId,
        sequence: SequenceNr,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            base: ServiceEvent::new(msg_id, sequence, payload),
            source,
            target,
        }
    }

    /// Returns the shared part.
    pub fn data(&self) -> &ServiceEvent {
        &self.base
    }

    /// Returns the requesting proxy.
    pub fn source(&self) -> &ProxyAddress {
        &self.source
    }

    /// Returns the target stub.
    pub fn target_stub(&self) -> &StubAddress {
        &self.target
    }
}

impl Event for ServiceRequestEvent {
    fn target(&self) -> EventTarget {
        EventTarget::Consumer(ConsumerKey::Stub(self.target.clone()))
    }

    /// Answers the proxy with `MessageUndelivered` so its pending sequence
    /// resolves.
    fn undelivered(self: Box<Self>, runtime: &Arc<Runtime>) {
        debug!(
            stub = %self.target,
            msg_id = %self.base.msg_id,
            seq = %self.base.sequence,
            "request reached no stub"
        );
        let reply = ServiceResponseEvent::new(
            self.source.clone(),
            self.base.msg_id,
            ResultType::MessageUndelivered,
            self.base.sequence,
            Vec::new(),
        );
        if let Err(error) = runtime.post_event(self.source.thread(), Box::new(reply)) {
            debug!(proxy = %self.source, %error, "requesting proxy is gone");
        }
    }
}

/// A response, attribute update or broadcast travelling from a stub to a
/// proxy.
#[derive(Debug)]
pub struct ServiceResponseEvent {
    base: ServiceEvent,
    target: ProxyAddress,
    result: ResultType,
}

crate::runtime_object!(ServiceResponseEvent, "areg::ServiceResponseEvent", base = base);

impl ServiceResponseEvent {
    /// Creates a response event.
    pub fn new(
        target: ProxyAddress,
        msg_id: MessageId,
        result: ResultType,
        sequence: SequenceNr,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            base: ServiceEvent::new(msg_id, sequence, payload),
            target,
            result,
        }
    }

    /// Returns the shared part.
    pub fn data(&self) -> &ServiceEvent {
        &self.base
    }

    /// Returns the receiving proxy.
    pub fn target_proxy(&self) -> &ProxyAddress {
        &self.target
    }

    /// Returns the result kind.
    pub fn result(&self) -> ResultType {
        self.result
    }
}

impl Event for ServiceResponseEvent {
    fn target(&self) -> EventTarget {
        EventTarget::Consumer(ConsumerKey::Proxy(self.target.clone()))
    }

    fn undelivered(self: Box<Self>, _runtime: &Arc<Runtime>) {
        debug!(
            proxy = %self.target,
            msg_id = %self.base.msg_id,
            result = %self.result,
            "response reached no proxy"
        );
    }
}

/// Subscription change requested by a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyAction {
    /// Start sending updates. With `send_current`, an attribute's current
    /// value is sent right away.
    Subscribe {
        /// Send the current attribute value immediately
        send_current: bool,
    },
    /// Stop sending updates.
    Unsubscribe,
}

/// Subscribes a proxy to, or unsubscribes it from, a stub message.
#[derive(Debug)]
pub struct NotifyRequestEvent {
    proxy: ProxyAddress,
    target: StubAddress,
    msg_id: MessageId,
    action: NotifyAction,
}

crate::runtime_object!(NotifyRequestEvent, "areg::NotifyRequestEvent");

impl NotifyRequestEvent {
    /// Creates a subscription event.
    pub fn new(
        proxy: ProxyAddress,
        target: StubAddress,
        msg_id: MessageId,
        action: NotifyAction,
    ) -> Self {
        Self {
            proxy,
            target,
            msg_id,
            action,
        }
    }

    /// Returns the subscribing proxy.
    pub fn proxy(&self) -> &ProxyAddress {
        &self.proxy
    }

    /// Returns the message id.
    pub fn msg_id(&self) -> MessageId {
        self.msg_id
    }

    /// Returns the requested change.
    pub fn action(&self) -> NotifyAction {
        self.action
    }
}

impl Event for NotifyRequestEvent {
    fn target(&self) -> EventTarget {
        EventTarget::Consumer(ConsumerKey::Stub(self.target.clone()))
    }
}

/// Which side of a connection a [`ServiceConnectionEvent`] is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionSide {
    /// Delivered to the proxy.
    Proxy,
    /// Delivered to the stub.
    Stub,
}

/// Announces a change in the connection between a stub and a proxy.
#[derive(Debug)]
pub struct ServiceConnectionEvent {
    stub: StubAddress,
    proxy: ProxyAddress,
    status: ServiceConnection,
    side: ConnectionSide,
}

crate::runtime_object!(ServiceConnectionEvent, "areg::ServiceConnectionEvent");

impl ServiceConnectionEvent {
    /// Creates the event delivered to `proxy`.
    pub fn to_proxy(stub: StubAddress, proxy: ProxyAddress, status: ServiceConnection) -> Self {
        Self {
            stub,
            proxy,
            status,
            side: ConnectionSide::Proxy,
        }
    }

    /// Creates the event delivered to `stub`.
    pub fn to_stub(stub: StubAddress, proxy: ProxyAddress, status: ServiceConnection) -> Self {
        Self {
            stub,
            proxy,
            status,
            side: ConnectionSide::Stub,
        }
    }

    /// Returns the stub side.
    pub fn stub(&self) -> &StubAddress {
        &self.stub
    }

    /// Returns the proxy side.
    pub fn proxy(&self) -> &ProxyAddress {
        &self.proxy
    }

    /// Returns the new status.
    pub fn status(&self) -> ServiceConnection {
        self.status
    }

    /// Returns the receiving side.
    pub fn side(&self) -> ConnectionSide {
        self.side
    }
}

impl Event for ServiceConnectionEvent {
    fn target(&self) -> EventTarget {
        match self.side {
            ConnectionSide::Proxy => EventTarget::Consumer(ConsumerKey::Proxy(self.proxy.clone())),
            ConnectionSide::Stub => EventTarget::Consumer(ConsumerKey::Stub(self.stub.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{ComponentAddress, ThreadAddress};
    use crate::runtime::{RuntimeObject, RuntimeType, runtime_cast};
    use crate::service::{ServiceItem, Version};

    fn addresses() -> (ProxyAddress, StubAddress) {
        let service = ServiceItem::new("Calc", Version::default());
        let proxy = ProxyAddress::new(service.clone(), "Calc", ThreadAddress::new("T1"));
        let stub = StubAddress::new(
            service,
            ComponentAddress::new("Calc", ThreadAddress::new("T2")),
        );
        (proxy, stub)
    }

    #[test]
    fn test_request_and_response_share_base_class() {
        let (proxy, stub) = addresses();
        let request = ServiceRequestEvent::new(
            proxy.clone(),
            stub,
            MessageId::new(10),
            SequenceNr::new(1),
            vec![1, 2, 3],
        );
        let response = ServiceResponseEvent::new(
            proxy,
            MessageId::new(11),
            ResultType::RequestOk,
            SequenceNr::new(1),
            Vec::new(),
        );

        assert!(request.is_instance_of(ServiceEvent::runtime_class()));
        assert!(response.is_instance_of(ServiceEvent::runtime_class()));
        assert!(!request.is_instance_of(ServiceResponseEvent::runtime_class()));

        let base = runtime_cast::<ServiceEvent>(&request).unwrap();
        assert_eq!(base.msg_id(), MessageId::new(10));
        assert_eq!(base.payload(), &[1, 2, 3]);
        assert!(runtime_cast::<ServiceRequestEvent>(&response).is_none());
    }

    #[test]
    fn test_targets() {
        let (proxy, stub) = addresses();
        let to_proxy =
            ServiceConnectionEvent::to_proxy(stub.clone(), proxy.clone(), ServiceConnection::Connected);
        assert_eq!(
            to_proxy.target(),
            EventTarget::Consumer(ConsumerKey::Proxy(proxy.clone()))
        );
        let to_stub = ServiceConnectionEvent::to_stub(stub.clone(), proxy.clone(), ServiceConnection::Connected);
        assert_eq!(to_stub.target(), EventTarget::Consumer(ConsumerKey::Stub(stub.clone())));

        let notify = NotifyRequestEvent::new(
            proxy,
            stub.clone(),
            MessageId::new(20),
            NotifyAction::Unsubscribe,
        );
        assert_eq!(notify.target(), EventTarget::Consumer(ConsumerKey::Stub(stub)));
    }
}
