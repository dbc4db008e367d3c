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

//! The provider side of a service.

use crate::address::ComponentAddress;
use crate::context::Runtime;
use crate::dispatcher::{ConsumerKey, Event, EventConsumer};
use crate::runtime::runtime_cast;
use crate::service::{
    DataState, MessageId, MessageKind, NotifyAction, NotifyRequestEvent, ProxyAddress, ResultType,
    SequenceNr, ServiceConnection, ServiceConnectionEvent, ServiceInterface, ServiceRequestEvent,
    ServiceResponseEvent, StubAddress,
};
use crate::stub::{RequestOutcome, StubContext, StubError, StubHandler};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info, trace, warn};

#[derive(Debug)]
struct Attribute {
    state: DataState,
    payload: Vec<u8>,
}

#[derive(Debug, Clone)]
struct PendingCall {
    proxy: ProxyAddress,
    request_id: MessageId,
    sequence: SequenceNr,
}

#[derive(Debug, Default)]
struct StubState {
    running: bool,
    clients: HashSet<ProxyAddress>,
    subscribers: HashMap<MessageId, Vec<ProxyAddress>>,
    attributes: HashMap<MessageId, Attribute>,
    // Keyed by response id.
    pending: HashMap<MessageId, Vec<PendingCall>>,
}

/// One reply to post once the state lock is released.
struct Outgoing {
    proxy: ProxyAddress,
    msg_id: MessageId,
    result: ResultType,
    sequence: SequenceNr,
    payload: Vec<u8>,
}

/// Receives requests for one service and sends back responses, attribute
/// updates and broadcasts.
///
/// A stub lives on the dispatcher thread of its component. Every request
/// with a declared response is eventually answered: by the handler, by
/// [`respond`](Self::respond), or with `MessageUndelivered` on shutdown.
pub struct StubBase {
    address: StubAddress,
    interface: Arc<ServiceInterface>,
    handler: Arc<dyn StubHandler>,
    runtime: Weak<Runtime>,
    self_ref: Weak<StubBase>,
    state: Mutex<StubState>,
}

impl StubBase {
    /// Creates a stub for `interface` provided by the component at
    /// `component`. The stub receives nothing until [`start`](Self::start).
    pub fn new(
        runtime: &Arc<Runtime>,
        component: &ComponentAddress,
        interface: Arc<ServiceInterface>,
        handler: Arc<dyn StubHandler>,
    ) -> Arc<Self> {
        let address = StubAddress::new(interface.service_item().clone(), component.clone());
        Arc::new_cyclic(|self_ref| Self {
            address,
            interface,
            handler,
            runtime: Arc::downgrade(runtime),
            self_ref: self_ref.clone(),
            state: Mutex::new(StubState::default()),
        })
    }

    /// Returns the stub address.
    pub fn address(&self) -> &StubAddress {
        &self.address
    }

    /// Returns the provided service name.
    pub fn service_name(&self) -> &str {
        self.interface.name()
    }

    /// Returns the service interface.
    pub fn interface(&self) -> &Arc<ServiceInterface> {
        &self.interface
    }

    /// Returns `true` between [`start`](Self::start) and
    /// [`shutdown`](Self::shutdown).
    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// Returns the number of connected proxies.
    pub fn client_count(&self) -> usize {
        self.state.lock().clients.len()
    }

    /// Returns the state of an attribute.
    pub fn attribute_state(&self, msg_id: MessageId) -> DataState {
        self.state
            .lock()
            .attributes
            .get(&msg_id)
            .map_or(DataState::Unknown, |attribute| attribute.state)
    }

    /// Returns `true` if a request waits for `response_id`.
    pub fn has_pending(&self, response_id: MessageId) -> bool {
        self.state
            .lock()
            .pending
            .get(&response_id)
            .is_some_and(|calls| !calls.is_empty())
    }

    /// Registers the stub with its dispatcher thread and announces it to
    /// the service manager, which connects waiting proxies.
    ///
    /// # Errors
    ///
    /// Fails if the thread is not running or another stub already provides
    /// the service under the same role.
    pub fn start(&self) -> Result<(), StubError> {
        let runtime = self.runtime()?;
        let this = self.this()?;
        let thread = runtime.threads().require(self.address.thread())?;
        {
            let mut state = self.state.lock();
            if state.running {
                return Ok(());
            }
            state.running = true;
        }

        let key = ConsumerKey::Stub(self.address.clone());
        if let Err(error) = thread.register_consumer(key.clone(), this.clone()) {
            self.state.lock().running = false;
            return Err(error.into());
        }
        let handler = self.handler.clone();
        let stub = this.clone();
        if let Err(error) = thread.post_task(move |_| handler.startup(&stub)) {
            debug!(stub = %self.address, %error, "startup not scheduled");
        }
        if let Err(error) = runtime.services().register_stub(&runtime, &self.address) {
            thread.unregister_consumer(&key);
            self.state.lock().running = false;
            return Err(error.into());
        }
        info!(stub = %self.address, "stub started");
        Ok(())
    }

    /// Stops the stub. Pending requests are answered with
    /// `MessageUndelivered`, attached proxies are disconnected and the stub
    /// stops receiving events.
    pub fn shutdown(&self) {
        let pending = {
            let mut state = self.state.lock();
            if !std::mem::replace(&mut state.running, false) {
                return;
            }
            std::mem::take(&mut state.pending)
        };
        if let Some(this) = self.self_ref.upgrade() {
            self.handler.shutdown(&this);
        }
        let Some(runtime) = self.runtime.upgrade() else {
            return;
        };

        let replies: Vec<Outgoing> = pending
            .into_values()
            .flatten()
            .map(|call| Outgoing {
                proxy: call.proxy,
                msg_id: call.request_id,
                result: ResultType::MessageUndelivered,
                sequence: call.sequence,
                payload: Vec::new(),
            })
            .collect();
        for _ in &replies {
            runtime.metrics().stub.record_request_undelivered();
        }
        self.post_all(&runtime, replies);

        let disconnected = runtime.services().unregister_stub(&runtime, &self.address);
        if let Some(thread) = runtime.threads().find_by_address(self.address.thread()) {
            thread.unregister_consumer(&ConsumerKey::Stub(self.address.clone()));
        }
        {
            let mut state = self.state.lock();
            state.clients.clear();
            state.subscribers.clear();
        }
        info!(stub = %self.address, clients = disconnected.len(), "stub shut down");
    }

    /// Answers every request waiting for `response_id` and notifies the
    /// proxies subscribed to it. Returns the number of answered requests.
    ///
    /// # Errors
    ///
    /// Fails if `response_id` is not a response of the service.
    pub fn respond(&self, response_id: MessageId, payload: Vec<u8>) -> Result<usize, StubError> {
        self.expect_kind(response_id, MessageKind::Response)?;
        let runtime = self.runtime()?;
        let calls = self
            .state
            .lock()
            .pending
            .remove(&response_id)
            .unwrap_or_default();
        let answered = calls.len();
        self.deliver_response(&runtime, response_id, calls, payload);
        Ok(answered)
    }

    /// Fails every request waiting for `response_id` with `result`.
    /// Returns the number of failed requests.
    ///
    /// # Errors
    ///
    /// Fails if `response_id` is not a response of the service.
    pub fn fail_pending(&self, response_id: MessageId, result: ResultType) -> Result<usize, StubError> {
        self.expect_kind(response_id, MessageKind::Response)?;
        let runtime = self.runtime()?;
        let calls = self
            .state
            .lock()
            .pending
            .remove(&response_id)
            .unwrap_or_default();
        let failed = calls.len();
        let result = failure(result);
        let replies = calls
            .into_iter()
            .map(|call| Outgoing {
                proxy: call.proxy,
                msg_id: response_id,
                result,
                sequence: call.sequence,
                payload: Vec::new(),
            })
            .collect();
        self.post_all(&runtime, replies);
        Ok(failed)
    }

    /// Stores a new attribute value and sends it to every subscriber.
    ///
    /// # Errors
    ///
    /// Fails if `msg_id` is not an attribute of the service.
    pub fn set_attribute(&self, msg_id: MessageId, payload: Vec<u8>) -> Result<(), StubError> {
        self.expect_kind(msg_id, MessageKind::Attribute)?;
        let runtime = self.runtime()?;
        let replies = {
            let mut state = self.state.lock();
            state.attributes.insert(
                msg_id,
                Attribute {
                    state: DataState::DataIsOk,
                    payload: payload.clone(),
                },
            );
            Self::to_subscribers(&state, msg_id, ResultType::DataOk, &payload, &[])
        };
        runtime.metrics().stub.record_attribute_update();
        trace!(stub = %self.address, %msg_id, subscribers = replies.len(), "attribute updated");
        self.post_all(&runtime, replies);
        Ok(())
    }

    /// Marks an attribute invalid and tells every subscriber.
    ///
    /// # Errors
    ///
    /// Fails if `msg_id` is not an attribute of the service.
    pub fn invalidate_attribute(&self, msg_id: MessageId) -> Result<(), StubError> {
        self.expect_kind(msg_id, MessageKind::Attribute)?;
        let runtime = self.runtime()?;
        let replies = {
            let mut state = self.state.lock();
            state.attributes.insert(
                msg_id,
                Attribute {
                    state: DataState::DataIsInvalid,
                    payload: Vec::new(),
                },
            );
            Self::to_subscribers(&state, msg_id, ResultType::DataInvalid, &[], &[])
        };
        runtime.metrics().stub.record_attribute_update();
        self.post_all(&runtime, replies);
        Ok(())
    }

    /// Sends a broadcast to every subscriber.
    ///
    /// # Errors
    ///
    /// Fails if `msg_id` is not a broadcast of the service.
    pub fn broadcast(&self, msg_id: MessageId, payload: Vec<u8>) -> Result<(), StubError> {
        self.expect_kind(msg_id, MessageKind::Broadcast)?;
        let runtime = self.runtime()?;
        let replies = Self::to_subscribers(&self.state.lock(), msg_id, ResultType::DataOk, &payload, &[]);
        runtime.metrics().stub.record_broadcast();
        self.post_all(&runtime, replies);
        Ok(())
    }

    fn process_request_event(&self, request: &ServiceRequestEvent, runtime: &Arc<Runtime>) {
        let data = request.data();
        let request_id = data.msg_id();
        let proxy = request.source();
        let call = PendingCall {
            proxy: proxy.clone(),
            request_id,
            sequence: data.sequence(),
        };

        if !self.is_running() {
            runtime.metrics().stub.record_request_undelivered();
            self.post_all(runtime, vec![call.reply(request_id, ResultType::MessageUndelivered)]);
            return;
        }
        runtime.metrics().stub.record_request_received();
        if !self.interface.is_request(request_id) {
            warn!(stub = %self.address, %request_id, "request id not declared");
            self.post_all(runtime, vec![call.reply(request_id, ResultType::RequestError)]);
            return;
        }
        let Some(this) = self.self_ref.upgrade() else {
            return;
        };

        trace!(stub = %self.address, %request_id, seq = %data.sequence(), "processing request");
        let context = StubContext::new(&this, proxy, data.sequence());
        let mut stream = data.stream();
        let outcome = self.handler.process_request(&context, request_id, &mut stream);
        let response_id = self.interface.response_of(request_id);

        match (outcome, response_id) {
            (RequestOutcome::Respond(payload), Some(response_id)) => {
                self.deliver_response(runtime, response_id, vec![call], payload);
            }
            (RequestOutcome::Respond(_), None) => {
                warn!(stub = %self.address, %request_id, "request has no response, payload dropped");
            }
            (RequestOutcome::Done, Some(response_id)) => {
                warn!(stub = %self.address, %request_id, "request finished without its response");
                self.post_all(runtime, vec![call.reply(response_id, ResultType::RequestError)]);
            }
            (RequestOutcome::Deferred, Some(response_id)) => {
                self.state
                    .lock()
                    .pending
                    .entry(response_id)
                    .or_default()
                    .push(call);
            }
            (RequestOutcome::Deferred | RequestOutcome::Done, None) => {}
            (RequestOutcome::Failed(result), response_id) => {
                let msg_id = response_id.unwrap_or(request_id);
                self.post_all(runtime, vec![call.reply(msg_id, failure(result))]);
            }
        }
    }

    fn process_notify_event(&self, notify: &NotifyRequestEvent, runtime: &Arc<Runtime>) {
        let msg_id = notify.msg_id();
        let Some(kind) = self.interface.kind_of(msg_id) else {
            warn!(stub = %self.address, %msg_id, "subscription to undeclared id");
            return;
        };
        if !kind.is_notifiable() {
            warn!(stub = %self.address, %msg_id, "subscription to a request id");
            return;
        }
        let reply = {
            let mut state = self.state.lock();
            match notify.action() {
                NotifyAction::Subscribe { send_current } => {
                    let subscribers = state.subscribers.entry(msg_id).or_default();
                    if !subscribers.contains(notify.proxy()) {
                        subscribers.push(notify.proxy().clone());
                    }
                    if send_current && kind == MessageKind::Attribute {
                        let (result, payload) = match state.attributes.get(&msg_id) {
                            Some(attribute) if attribute.state == DataState::DataIsOk => {
                                (ResultType::DataOk, attribute.payload.clone())
                            }
                            _ => (ResultType::DataInvalid, Vec::new()),
                        };
                        Some(Outgoing {
                            proxy: notify.proxy().clone(),
                            msg_id,
                            result,
                            sequence: SequenceNr::UNSOLICITED,
                            payload,
                        })
                    } else {
                        None
                    }
                }
                NotifyAction::Unsubscribe => {
                    if let Some(subscribers) = state.subscribers.get_mut(&msg_id) {
                        subscribers.retain(|proxy| proxy != notify.proxy());
                    }
                    None
                }
            }
        };
        debug!(stub = %self.address, proxy = %notify.proxy(), %msg_id, action = ?notify.action(), "subscription changed");
        self.post_all(runtime, reply.into_iter().collect());
    }

    fn process_connection_event(&self, event: &ServiceConnectionEvent) {
        let proxy = event.proxy();
        let connected = event.status() == ServiceConnection::Connected;
        {
            let mut state = self.state.lock();
            if connected {
                state.clients.insert(proxy.clone());
            } else {
                state.clients.remove(proxy);
                for subscribers in state.subscribers.values_mut() {
                    subscribers.retain(|subscriber| subscriber != proxy);
                }
                for calls in state.pending.values_mut() {
                    calls.retain(|call| &call.proxy != proxy);
                }
            }
        }
        debug!(stub = %self.address, proxy = %proxy, status = %event.status(), "client connection changed");
        if let Some(this) = self.self_ref.upgrade() {
            self.handler.client_connected(&this, proxy, connected);
        }
    }

    fn deliver_response(
        &self,
        runtime: &Arc<Runtime>,
        response_id: MessageId,
        calls: Vec<PendingCall>,
        payload: Vec<u8>,
    ) {
        let answered: Vec<ProxyAddress> = calls.iter().map(|call| call.proxy.clone()).collect();
        let mut replies: Vec<Outgoing> = calls
            .into_iter()
            .map(|call| Outgoing {
                proxy: call.proxy,
                msg_id: response_id,
                result: ResultType::RequestOk,
                sequence: call.sequence,
                payload: payload.clone(),
            })
            .collect();
        replies.extend(Self::to_subscribers(
            &self.state.lock(),
            response_id,
            ResultType::RequestOk,
            &payload,
            &answered,
        ));
        self.post_all(runtime, replies);
    }

    fn to_subscribers(
        state: &StubState,
        msg_id: MessageId,
        result: ResultType,
        payload: &[u8],
        skip: &[ProxyAddress],
    ) -> Vec<Outgoing> {
        state
            .subscribers
            .get(&msg_id)
            .into_iter()
            .flatten()
            .filter(|proxy| !skip.contains(proxy))
            .map(|proxy| Outgoing {
                proxy: proxy.clone(),
                msg_id,
                result,
                sequence: SequenceNr::UNSOLICITED,
                payload: payload.to_vec(),
            })
            .collect()
    }

    fn post_all(&self, runtime: &Runtime, replies: Vec<Outgoing>) {
        for reply in replies {
            let event = ServiceResponseEvent::new(
                reply.proxy.clone(),
                reply.msg_id,
                reply.result,
                reply.sequence,
                reply.payload,
            );
            match runtime.post_event(reply.proxy.thread(), Box::new(event)) {
                Ok(()) => runtime.metrics().stub.record_response_sent(),
                Err(error) => debug!(stub = %self.address, proxy = %reply.proxy, %error, "reply not delivered"),
            }
        }
    }

    fn expect_kind(&self, msg_id: MessageId, expected: MessageKind) -> Result<(), StubError> {
        match self.interface.kind_of(msg_id) {
            Some(kind) if kind == expected => Ok(()),
            Some(_) => Err(StubError::WrongKind {
                service: self.service_name().to_string(),
                msg_id,
                expected,
            }),
            None => Err(StubError::UnknownMessage {
                service: self.service_name().to_string(),
                msg_id,
            }),
        }
    }

    fn runtime(&self) -> Result<Arc<Runtime>, StubError> {
        self.runtime.upgrade().ok_or_else(|| self.released())
    }

    fn this(&self) -> Result<Arc<Self>, StubError> {
        self.self_ref.upgrade().ok_or_else(|| self.released())
    }

    fn released(&self) -> StubError {
        StubError::Released {
            stub: self.address.to_string(),
        }
    }
}

impl PendingCall {
    fn reply(self, msg_id: MessageId, result: ResultType) -> Outgoing {
        Outgoing {
            proxy: self.proxy,
            msg_id,
            result,
            sequence: self.sequence,
            payload: Vec::new(),
        }
    }
}

fn failure(result: ResultType) -> ResultType {
    if result.is_failure() {
        result
    } else {
        ResultType::RequestError
    }
}

impl EventConsumer for StubBase {
    fn consume(&self, event: &dyn Event, runtime: &Arc<Runtime>) {
        let object = event.as_runtime();
        if let Some(request) = runtime_cast::<ServiceRequestEvent>(object) {
            self.process_request_event(request, runtime);
        } else if let Some(notify) = runtime_cast::<NotifyRequestEvent>(object) {
            self.process_notify_event(notify, runtime);
        } else if let Some(connection) = runtime_cast::<ServiceConnectionEvent>(object) {
            self.process_connection_event(connection);
        } else {
            debug!(stub = %self.address, event = object.class_name(), "unexpected event");
        }
    }
}

impl fmt::Debug for StubBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("StubBase")
            .field("address", &self.address)
            .field("running", &state.running)
            .field("clients", &state.clients.len())
            .field("pending", &state.pending.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}
