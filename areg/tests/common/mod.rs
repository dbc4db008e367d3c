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

//! Shared fixtures for the integration tests: a small calculator service,
//! a recording listener and runtime setup.

#![allow(dead_code)]

use areg::address::ThreadAddress;
use areg::component::{Component, ComponentEntry};
use areg::dispatcher::current_thread;
use areg::proxy::{Notification, PayloadCache, ProxyBase, ProxyData, ProxyListener};
use areg::serialization::InStream;
use areg::service::{MessageId, ResultType, ServiceConnection, ServiceInterface, Version};
use areg::stub::{RequestOutcome, StubBase, StubContext, StubHandler};
use areg::{Runtime, RuntimeConfig};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TIMEOUT: Duration = Duration::from_secs(5);
pub const QUIET: Duration = Duration::from_millis(200);

/// `u64` in, `u64 + 1` out. Also stores the result in `VALUE`.
pub const INCREMENT: MessageId = MessageId::new(1);
pub const INCREMENTED: MessageId = MessageId::new(2);
/// Two `u64` arguments, their sum out.
pub const SUM: MessageId = MessageId::new(3);
pub const SUMMED: MessageId = MessageId::new(4);
/// Answered only through `StubBase::respond`.
pub const SLOW: MessageId = MessageId::new(5);
pub const SLOW_DONE: MessageId = MessageId::new(6);
/// Always refused with `RequestBusy`.
pub const BUSY: MessageId = MessageId::new(7);
pub const BUSY_DONE: MessageId = MessageId::new(8);
/// Fire and forget; invalidates `VALUE`.
pub const RESET: MessageId = MessageId::new(9);
pub const VALUE: MessageId = MessageId::new(20);
pub const TICK: MessageId = MessageId::new(30);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn runtime() -> Arc<Runtime> {
    init_tracing();
    Runtime::new(RuntimeConfig::default()).unwrap()
}

pub fn calc_interface(version: Version) -> Arc<ServiceInterface> {
    ServiceInterface::builder("Calc", version)
        .request(INCREMENT.as_u32(), Some(INCREMENTED.as_u32()))
        .response(INCREMENTED.as_u32())
        .request(SUM.as_u32(), Some(SUMMED.as_u32()))
        .response(SUMMED.as_u32())
        .request(SLOW.as_u32(), Some(SLOW_DONE.as_u32()))
        .response(SLOW_DONE.as_u32())
        .request(BUSY.as_u32(), Some(BUSY_DONE.as_u32()))
        .response(BUSY_DONE.as_u32())
        .request(RESET.as_u32(), None)
        .attribute(VALUE.as_u32())
        .broadcast(TICK.as_u32())
        .build()
        .unwrap()
}

pub struct Calc;

impl StubHandler for Calc {
    fn process_request(&self, ctx: &StubContext<'_>, request_id: MessageId, stream: &mut InStream<'_>) -> RequestOutcome {
        match request_id {
            INCREMENT => {
                let Ok(value) = stream.read::<u64>() else {
                    return RequestOutcome::Failed(ResultType::RequestError);
                };
                let result = value + 1;
                let payload = areg::serialization::OutStream::single(&result).unwrap();
                ctx.stub().set_attribute(VALUE, payload).unwrap();
                RequestOutcome::respond_with(&result)
            }
            SUM => match (stream.read::<u64>(), stream.read::<u64>()) {
                (Ok(a), Ok(b)) => RequestOutcome::respond_with(&(a + b)),
                _ => RequestOutcome::Failed(ResultType::RequestError),
            },
            SLOW => RequestOutcome::Deferred,
            BUSY => RequestOutcome::Failed(ResultType::RequestBusy),
            RESET => {
                ctx.stub().invalidate_attribute(VALUE).unwrap();
                RequestOutcome::Done
            }
            _ => RequestOutcome::Failed(ResultType::RequestError),
        }
    }
}

/// Entry providing the calculator under `role` on `thread`.
pub fn calc_entry(role: &str, thread: &str, interface: Arc<ServiceInterface>) -> ComponentEntry {
    ComponentEntry::new(role, thread, move |ctx| {
        let component = Component::new(ctx.address().clone());
        let stub = StubBase::new(ctx.runtime(), ctx.address(), interface.clone(), Arc::new(Calc));
        component.register_server_item(stub);
        Ok(component)
    })
}

pub fn cache(interface: &ServiceInterface) -> Box<dyn ProxyData> {
    Box::new(PayloadCache::new(interface))
}

/// Reads the last value cached for `msg_id`.
pub fn cached(proxy: &ProxyBase, msg_id: MessageId) -> Option<u64> {
    proxy
        .read_data(|data: &PayloadCache| data.get::<u64>(msg_id))
        .flatten()
        .map(|value| value.unwrap())
}

/// Listener forwarding every callback, with the thread it ran on.
pub struct Recorder {
    connections: Mutex<Sender<(ServiceConnection, Option<ThreadAddress>)>>,
    notifications: Mutex<Sender<(Notification, Option<ThreadAddress>)>>,
}

pub struct Inbox {
    pub connections: Receiver<(ServiceConnection, Option<ThreadAddress>)>,
    pub notifications: Receiver<(Notification, Option<ThreadAddress>)>,
}

impl Recorder {
    pub fn new() -> (Arc<Self>, Inbox) {
        let (connections, connection_rx) = mpsc::channel();
        let (notifications, notification_rx) = mpsc::channel();
        let recorder = Arc::new(Self {
            connections: Mutex::new(connections),
            notifications: Mutex::new(notifications),
        });
        (
            recorder,
            Inbox {
                connections: connection_rx,
                notifications: notification_rx,
            },
        )
    }
}

impl ProxyListener for Recorder {
    fn on_service_connected(&self, _proxy: &Arc<ProxyBase>, status: ServiceConnection) {
        let _ = self.connections.lock().unwrap().send((status, current_thread()));
    }

    fn on_notification(&self, _proxy: &Arc<ProxyBase>, notification: &Notification) {
        let _ = self
            .notifications
            .lock()
            .unwrap()
            .send((*notification, current_thread()));
    }
}

impl Inbox {
    pub fn connection(&self) -> ServiceConnection {
        self.connections.recv_timeout(TIMEOUT).unwrap().0
    }

    pub fn notification(&self) -> Notification {
        self.notifications.recv_timeout(TIMEOUT).unwrap().0
    }

    /// Skips notifications until one for `msg_id` arrives.
    pub fn notification_for(&self, msg_id: MessageId) -> Notification {
        loop {
            let notification = self.notification();
            if notification.msg_id() == msg_id {
                return notification;
            }
        }
    }

    pub fn assert_no_notification(&self) {
        if let Ok((notification, _)) = self.notifications.recv_timeout(QUIET) {
            panic!("unexpected notification {notification:?}");
        }
    }
}

/// Proxy for `Calc` on `thread` with a fresh recorder, already connected.
pub fn connected_proxy(
    runtime: &Arc<Runtime>,
    interface: &Arc<ServiceInterface>,
    thread: &ThreadAddress,
) -> (Arc<ProxyBase>, Arc<Recorder>, Inbox) {
    let (recorder, inbox) = Recorder::new();
    let proxy = ProxyBase::find_or_create(runtime, "Calc", interface, recorder.clone(), cache, thread).unwrap();
    assert_eq!(inbox.connection(), ServiceConnection::Connected);
    (proxy, recorder, inbox)
}

/// Converts a recorder into the listener type proxies compare by identity.
pub fn listener(recorder: &Arc<Recorder>) -> Arc<dyn ProxyListener> {
    recorder.clone()
}
