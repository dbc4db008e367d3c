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

//! The consumer side of a service.

use crate::address::{ThreadAddress, is_valid_name};
use crate::context::Runtime;
use crate::dispatcher::{self, ConsumerKey, Event, EventConsumer};
use crate::proxy::listener::same_listener;
use crate::proxy::{Notification, NotificationEvent, ProxyData, ProxyError, ProxyListener, SequenceWaiter};
use crate::runtime::runtime_cast;
use crate::serialization::InStream;
use crate::service::{
    DataState, MessageId, MessageKind, NotifyAction, NotifyRequestEvent, ProxyAddress, ResultType,
    SequenceNr, ServiceConnection, ServiceConnectionEvent, ServiceInterface, ServiceRequestEvent,
    ServiceResponseEvent, StubAddress,
};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, error, info, trace, warn};

struct ListenerEntry {
    msg_id: MessageId,
    listener: Arc<dyn ProxyListener>,
    thread: ThreadAddress,
    // Set for a caller waiting on one request only.
    sequence: Option<SequenceNr>,
}

struct ClientEntry {
    listener: Arc<dyn ProxyListener>,
    thread: ThreadAddress,
}

#[derive(Debug, Clone, Copy)]
struct PendingRequest {
    request_id: MessageId,
    sent_at: Instant,
    expired: bool,
}

struct ProxyState {
    connection: ServiceConnection,
    stub: Option<StubAddress>,
    data: Box<dyn ProxyData>,
    states: HashMap<MessageId, DataState>,
    listeners: Vec<ListenerEntry>,
    clients: Vec<ClientEntry>,
    pending: HashMap<SequenceNr, PendingRequest>,
    released: bool,
}

impl ProxyState {
    fn is_listened(&self, msg_id: MessageId) -> bool {
        self.listeners
            .iter()
            .any(|entry| entry.sequence.is_none() && entry.msg_id == msg_id)
    }

    /// Removes the entries of `listener` selected by `filter` and returns
    /// the ids nobody listens to any more.
    fn remove_listener<F>(&mut self, listener: &Arc<dyn ProxyListener>, filter: F) -> Vec<MessageId>
    where
        F: Fn(&ListenerEntry) -> bool,
    {
        let mut touched = BTreeSet::new();
        self.listeners.retain(|entry| {
            let remove = same_listener(&entry.listener, listener) && filter(entry);
            if remove && entry.sequence.is_none() {
                touched.insert(entry.msg_id);
            }
            !remove
        });
        touched
            .into_iter()
            .filter(|msg_id| !self.is_listened(*msg_id))
            .collect()
    }

    fn connected_stub(&self) -> Option<StubAddress> {
        match self.connection {
            ServiceConnection::Connected => self.stub.clone(),
            _ => None,
        }
    }
}

enum Detach {
    AlreadyReleased,
    Released,
    Remaining {
        unused: Vec<MessageId>,
        stub: Option<StubAddress>,
    },
}

/// A notification to post once the state lock is released.
type Delivery = (Arc<dyn ProxyListener>, ThreadAddress);

/// Client-side stand-in for a service provided on another thread.
///
/// One proxy exists per service, role and owner thread, shared by every
/// client on that thread. It turns requests into events for the stub,
/// correlates the answers by sequence number, caches the latest data and
/// forwards every outcome to the registered listeners on their own
/// dispatcher threads.
///
/// Requests are refused while the proxy is not connected to its stub.
pub struct ProxyBase {
    address: ProxyAddress,
    interface: Arc<ServiceInterface>,
    runtime: Weak<Runtime>,
    self_ref: Weak<ProxyBase>,
    state: Mutex<ProxyState>,
    sequence: AtomicU64,
    waiter: SequenceWaiter,
}

impl ProxyBase {
    /// Returns the proxy of `interface` under `role` on `owner`, creating
    /// it with the data built by `factory` if this is the first client.
    ///
    /// `listener` becomes a client of the proxy. If the proxy is already
    /// connected the listener is told so right away; otherwise it hears
    /// about the connection once the stub appears.
    ///
    /// # Errors
    ///
    /// Fails if the role is invalid or `owner` is not a running
    /// dispatcher thread.
    pub fn find_or_create<F>(
        runtime: &Arc<Runtime>,
        role: &str,
        interface: &Arc<ServiceInterface>,
        listener: Arc<dyn ProxyListener>,
        factory: F,
        owner: &ThreadAddress,
    ) -> Result<Arc<Self>, ProxyError>
    where
        F: FnOnce(&ServiceInterface) -> Box<dyn ProxyData>,
    {
        let invalid = || ProxyError::InvalidAddress {
            role: role.to_string(),
            thread: owner.to_path(),
        };
        if !is_valid_name(role) {
            return Err(invalid());
        }
        let handle = runtime.threads().find_by_address(owner).ok_or_else(invalid)?;
        let address = ProxyAddress::new(interface.service_item().clone(), role, owner.clone());

        let client_thread = listener_thread(owner);
        let mut status = ServiceConnection::Disconnected;
        let create = || {
            Arc::new_cyclic(|self_ref| Self {
                address: address.clone(),
                interface: interface.clone(),
                runtime: Arc::downgrade(runtime),
                self_ref: self_ref.clone(),
                state: Mutex::new(ProxyState {
                    connection: ServiceConnection::Disconnected,
                    stub: None,
                    data: factory(interface.as_ref()),
                    states: HashMap::new(),
                    listeners: Vec::new(),
                    clients: Vec::new(),
                    pending: HashMap::new(),
                    released: false,
                }),
                sequence: AtomicU64::new(0),
                waiter: SequenceWaiter::new(),
            })
        };
        let attach = |proxy: &ProxyBase| {
            let mut state = proxy.state.lock();
            if state.released {
                return false;
            }
            state.clients.push(ClientEntry {
                listener: listener.clone(),
                thread: client_thread.clone(),
            });
            status = state.connection;
            true
        };
        let (proxy, created) = runtime.proxies().find_or_insert(&address, create, attach);

        if created {
            runtime.metrics().proxy.record_proxy_created();
            if let Err(error) = handle.register_consumer(ConsumerKey::Proxy(address.clone()), proxy.clone()) {
                runtime.proxies().release_with(&proxy, || proxy.state.lock().released = true);
                return Err(error.into());
            }
            info!(proxy = %address, "proxy created");
            runtime.services().register_proxy(runtime, &address);
        } else {
            debug!(proxy = %address, "proxy shared");
            if status == ServiceConnection::Connected {
                let event = NotificationEvent::connection(proxy.clone(), listener, status);
                post(runtime, &client_thread, Box::new(event));
            }
        }
        Ok(proxy)
    }

    /// Returns the proxy address.
    pub fn address(&self) -> &ProxyAddress {
        &self.address
    }

    /// Returns the service interface.
    pub fn interface(&self) -> &Arc<ServiceInterface> {
        &self.interface
    }

    /// Returns the role of the stub the proxy talks to.
    pub fn role(&self) -> &str {
        self.address.role()
    }

    /// Returns `true` while the stub is reachable.
    pub fn is_connected(&self) -> bool {
        self.state.lock().connection == ServiceConnection::Connected
    }

    /// Returns the connection status.
    pub fn connection(&self) -> ServiceConnection {
        self.state.lock().connection
    }

    /// Returns the connected stub.
    pub fn stub(&self) -> Option<StubAddress> {
        self.state.lock().connected_stub()
    }

    /// Returns `true` once the last client released the proxy.
    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }

    /// Returns the cached state of a response, attribute or broadcast.
    pub fn data_state(&self, msg_id: MessageId) -> DataState {
        self.state
            .lock()
            .states
            .get(&msg_id)
            .copied()
            .unwrap_or_default()
    }

    /// Returns the number of clients sharing the proxy.
    pub fn client_count(&self) -> usize {
        self.state.lock().clients.len()
    }

    /// Returns the number of requests waiting for a response.
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Reads the cached data through `read` if it is a `D`.
    pub fn read_data<D, R>(&self, read: impl FnOnce(&D) -> R) -> Option<R>
    where
        D: ProxyData,
    {
        let state = self.state.lock();
        state.data.as_any().downcast_ref::<D>().map(read)
    }

    /// Sends request `msg_id` with `payload` to the stub and returns its
    /// sequence number. Never blocks.
    ///
    /// A `caller` is notified once about the outcome of this request, in
    /// addition to any listener registered for the response.
    ///
    /// # Errors
    ///
    /// Fails without queueing anything if the id is not a request, the
    /// proxy was released, or the stub is not connected.
    pub fn send_request(
        &self,
        msg_id: MessageId,
        payload: Vec<u8>,
        caller: Option<Arc<dyn ProxyListener>>,
    ) -> Result<SequenceNr, ProxyError> {
        self.dispatch_request(msg_id, payload, caller, false)
            .map(|(sequence, _)| sequence)
    }

    /// Sends a request like [`send_request`](Self::send_request) and
    /// returns a receiver completed with its outcome. A request without a
    /// declared response completes as soon as it is queued.
    ///
    /// # Errors
    ///
    /// Same as [`send_request`](Self::send_request).
    pub fn send_request_tracked(
        &self,
        msg_id: MessageId,
        payload: Vec<u8>,
    ) -> Result<(SequenceNr, oneshot::Receiver<Notification>), ProxyError> {
        let (sequence, receiver) = self.dispatch_request(msg_id, payload, None, true)?;
        match receiver {
            Some(receiver) => Ok((sequence, receiver)),
            None => Err(ProxyError::Protocol {
                msg_id,
                reason: "request was not tracked".to_string(),
            }),
        }
    }

    fn dispatch_request(
        &self,
        msg_id: MessageId,
        payload: Vec<u8>,
        caller: Option<Arc<dyn ProxyListener>>,
        track: bool,
    ) -> Result<(SequenceNr, Option<oneshot::Receiver<Notification>>), ProxyError> {
        let runtime = self.runtime()?;
        if !self.interface.is_request(msg_id) {
            return Err(ProxyError::NotARequest { msg_id });
        }
        let response_id = self.interface.response_of(msg_id);

        let (sequence, stub, receiver) = {
            let mut state = self.state.lock();
            if state.released {
                return Err(self.released());
            }
            let Some(stub) = state.connected_stub() else {
                runtime.metrics().proxy.record_request_rejected();
                debug!(proxy = %self.address, %msg_id, "request refused, service unavailable");
                return Err(ProxyError::ServiceUnavailable {
                    proxy: self.address.to_string(),
                });
            };
            let sequence = SequenceNr::new(self.sequence.fetch_add(1, Ordering::Relaxed) + 1);
            let receiver = track.then(|| self.waiter.expect(sequence));
            if let Some(response_id) = response_id {
                state.pending.insert(
                    sequence,
                    PendingRequest {
                        request_id: msg_id,
                        sent_at: Instant::now(),
                        expired: false,
                    },
                );
                if let Some(caller) = caller {
                    state.listeners.push(ListenerEntry {
                        msg_id: response_id,
                        listener: caller,
                        thread: listener_thread(self.address.thread()),
                        sequence: Some(sequence),
                    });
                }
            }
            (sequence, stub, receiver)
        };

        let event = ServiceRequestEvent::new(self.address.clone(), stub.clone(), msg_id, sequence, payload);
        runtime.metrics().proxy.record_request_sent();
        trace!(proxy = %self.address, %msg_id, seq = %sequence, "request sent");
        if let Err(error) = runtime.post_event(stub.thread(), Box::new(event)) {
            // The stub thread is gone; resolve on our own thread instead.
            debug!(proxy = %self.address, %error, "stub thread unreachable");
            let reply = ServiceResponseEvent::new(
                self.address.clone(),
                msg_id,
                ResultType::MessageUndelivered,
                sequence,
                Vec::new(),
            );
            post(&runtime, self.address.thread(), Box::new(reply));
        }

        if response_id.is_none() && track {
            self.waiter.complete(
                sequence,
                Notification::new(msg_id, ResultType::RequestOk, sequence, DataState::Unknown),
            );
        }
        Ok((sequence, receiver))
    }

    /// Registers `listener` for updates of a response, attribute or
    /// broadcast.
    ///
    /// Registering the same listener twice is ignored, except that with
    /// `notify_always` a valid cached value is replayed to it at once. The
    /// replay is queued before this call returns and replaces the current
    /// value the stub would otherwise send.
    ///
    /// # Errors
    ///
    /// Fails if the id is undeclared or is a request.
    pub fn set_notification(
        &self,
        msg_id: MessageId,
        listener: Arc<dyn ProxyListener>,
        notify_always: bool,
    ) -> Result<(), ProxyError> {
        let kind = self.kind_of(msg_id)?;
        if !kind.is_notifiable() {
            return Err(ProxyError::NotNotifiable { msg_id });
        }
        let runtime = self.runtime()?;
        let this = self.this()?;
        let thread = listener_thread(self.address.thread());

        let (replay, subscribe) = {
            let mut state = self.state.lock();
            if state.released {
                return Err(self.released());
            }
            let registered = state.listeners.iter().any(|entry| {
                entry.sequence.is_none() && entry.msg_id == msg_id && same_listener(&entry.listener, &listener)
            });
            let first = !state.is_listened(msg_id);
            let replay = notify_always && state.states.get(&msg_id) == Some(&DataState::DataIsOk);
            if registered {
                (replay, None)
            } else {
                state.listeners.push(ListenerEntry {
                    msg_id,
                    listener: listener.clone(),
                    thread: thread.clone(),
                    sequence: None,
                });
                let subscribe = if first { state.connected_stub() } else { None };
                (replay, subscribe.map(|stub| (stub, !replay)))
            }
        };

        if replay {
            let result = match kind {
                MessageKind::Response => ResultType::RequestOk,
                _ => ResultType::DataOk,
            };
            let notification = Notification::new(msg_id, result, SequenceNr::UNSOLICITED, DataState::DataIsOk);
            trace!(proxy = %self.address, %msg_id, "replaying cached data");
            runtime.metrics().proxy.record_notification_posted();
            post(&runtime, &thread, Box::new(NotificationEvent::data(this, listener, notification)));
        }
        if let Some((stub, send_current)) = subscribe {
            self.notify_stub(&runtime, &stub, msg_id, NotifyAction::Subscribe { send_current });
        }
        Ok(())
    }

    /// Removes the registration of `listener` for `msg_id`.
    pub fn clear_notification(&self, msg_id: MessageId, listener: &Arc<dyn ProxyListener>) {
        let (unused, stub) = {
            let mut state = self.state.lock();
            let unused = state.remove_listener(listener, |entry| entry.sequence.is_none() && entry.msg_id == msg_id);
            (unused, state.connected_stub())
        };
        self.unsubscribe(unused, stub);
    }

    /// Removes every registration of `listener`, including callers still
    /// waiting for a single response.
    pub fn clear_all_notifications(&self, listener: &Arc<dyn ProxyListener>) {
        let (unused, stub) = {
            let mut state = self.state.lock();
            let unused = state.remove_listener(listener, |_| true);
            (unused, state.connected_stub())
        };
        self.unsubscribe(unused, stub);
    }

    /// Releases the share held by `listener`. The last release removes the
    /// proxy from its thread and from the service manager. Returns `true`
    /// when the proxy was released.
    pub fn free_proxy(&self, listener: &Arc<dyn ProxyListener>) -> bool {
        // The last release, the directory entry and the consumer are
        // torn down under the directory lock, before a new proxy for the
        // same address can be inserted.
        let runtime = self.runtime.upgrade();
        let outcome = match &runtime {
            Some(runtime) => runtime.proxies().release_with(self, || {
                let outcome = self.detach(listener);
                if matches!(outcome, Detach::Released) {
                    if let Some(thread) = runtime.threads().find_by_address(self.address.thread()) {
                        thread.unregister_consumer(&ConsumerKey::Proxy(self.address.clone()));
                    }
                    runtime.services().unregister_proxy(runtime, &self.address);
                }
                outcome
            }),
            None => self.detach(listener),
        };

        match outcome {
            Detach::AlreadyReleased => true,
            Detach::Remaining { unused, stub } => {
                self.unsubscribe(unused, stub);
                false
            }
            Detach::Released => {
                self.waiter.cancel_all();
                if let Some(runtime) = runtime {
                    runtime.metrics().proxy.record_proxy_released();
                }
                info!(proxy = %self.address, "proxy released");
                true
            }
        }
    }

    fn detach(&self, listener: &Arc<dyn ProxyListener>) -> Detach {
        let mut state = self.state.lock();
        if state.released {
            return Detach::AlreadyReleased;
        }
        state
            .clients
            .retain(|client| !same_listener(&client.listener, listener));
        let unused = state.remove_listener(listener, |_| true);
        if !state.clients.is_empty() {
            return Detach::Remaining {
                unused,
                stub: state.connected_stub(),
            };
        }
        state.released = true;
        state.listeners.clear();
        state.pending.clear();
        Detach::Released
    }

    /// Handles a response event addressed to this proxy.
    pub fn process_response_event(&self, event: &ServiceResponseEvent) {
        let data = event.data();
        self.process_response(data.msg_id(), event.result(), data.sequence(), data.payload());
    }

    /// Handles an attribute update addressed to this proxy.
    pub fn process_attribute_event(&self, event: &ServiceResponseEvent) {
        let data = event.data();
        if self.interface.kind_of(data.msg_id()) != Some(MessageKind::Attribute) {
            warn!(proxy = %self.address, msg_id = %data.msg_id(), "attribute event for a non-attribute id");
        }
        self.process_response(data.msg_id(), event.result(), data.sequence(), data.payload());
    }

    /// Applies one response, update or failure.
    ///
    /// Successful results are decoded into the cached data and mark the id
    /// valid. Invalidations mark it invalid. Failures leave the cache alone
    /// and are reported under the originating request id. Every outcome is
    /// queued to the listeners of the id on their own threads.
    pub fn process_response(&self, msg_id: MessageId, result: ResultType, sequence: SequenceNr, payload: &[u8]) {
        let (Some(runtime), Some(this)) = (self.runtime.upgrade(), self.self_ref.upgrade()) else {
            return;
        };

        let (notification, deliveries) = {
            let mut state = self.state.lock();
            if state.released {
                return;
            }
            let pending = if sequence.is_unsolicited() {
                None
            } else {
                state.pending.remove(&sequence)
            };
            // A request with a response is settled once; a second failure
            // for it (a disconnect raced a timeout or the stub's own
            // shutdown reply) is stale.
            let settled = result.is_failure()
                && !sequence.is_unsolicited()
                && pending.is_none()
                && self
                    .interface
                    .response_of(self.originating_request(msg_id, None))
                    .is_some();
            if settled {
                debug!(proxy = %self.address, %msg_id, %result, seq = %sequence, "failure for settled request dropped");
                return;
            }

            let (notify_id, valid, update_state) = match result {
                ResultType::RequestOk | ResultType::DataOk => (msg_id, true, true),
                ResultType::DataInvalid | ResultType::RequestInvalid => (msg_id, false, true),
                ResultType::RequestError
                | ResultType::RequestBusy
                | ResultType::RequestCanceled
                | ResultType::MessageUndelivered => (self.originating_request(msg_id, pending.as_ref()), false, false),
                ResultType::ServiceRejected => {
                    warn!(proxy = %self.address, %msg_id, "unexpected rejection result");
                    return;
                }
            };

            if self.interface.kind_of(notify_id).is_none() {
                drop(state);
                self.protocol_error(&runtime, notify_id, sequence, "message id not declared");
                return;
            }
            if valid {
                let mut stream = InStream::new(payload);
                if let Err(error) = state.data.update_data(notify_id, &mut stream) {
                    drop(state);
                    self.protocol_error(&runtime, notify_id, sequence, &error.to_string());
                    return;
                }
            }

            let data_state = if update_state {
                let data_state = if valid {
                    DataState::DataIsOk
                } else {
                    DataState::DataIsInvalid
                };
                state.states.insert(notify_id, data_state);
                data_state
            } else {
                state.states.get(&notify_id).copied().unwrap_or_default()
            };

            // Failures also reach whoever listens for the request's response.
            let response_id = if result.is_failure() {
                self.interface.response_of(notify_id)
            } else {
                None
            };
            let mut deliveries: Vec<Delivery> = Vec::new();
            state.listeners.retain(|entry| match entry.sequence {
                Some(waiting) => {
                    if !sequence.is_unsolicited() && waiting == sequence {
                        deliveries.push((entry.listener.clone(), entry.thread.clone()));
                        false
                    } else {
                        true
                    }
                }
                None => {
                    if entry.msg_id == notify_id || Some(entry.msg_id) == response_id {
                        deliveries.push((entry.listener.clone(), entry.thread.clone()));
                    }
                    true
                }
            });
            (Notification::new(notify_id, result, sequence, data_state), deliveries)
        };

        let metrics = &runtime.metrics().proxy;
        metrics.record_response_processed();
        if result.is_failure() {
            metrics.record_request_failure();
            debug!(proxy = %self.address, msg_id = %notification.msg_id(), %result, seq = %sequence, "request failed");
        } else {
            trace!(proxy = %self.address, %msg_id, %result, seq = %sequence, "response processed");
        }
        if !sequence.is_unsolicited() {
            self.waiter.complete(sequence, notification);
        }
        for (listener, thread) in deliveries {
            metrics.record_notification_posted();
            let event = NotificationEvent::data(this.clone(), listener, notification);
            post(&runtime, &thread, Box::new(event));
        }
    }

    /// Applies a connection change. Repeating the current status is a
    /// no-op.
    ///
    /// On connect every listened id is subscribed at the stub. On
    /// disconnect cached data becomes invalid and every pending request
    /// fails with `MessageUndelivered`. Clients are told either way.
    pub fn service_connected(&self, status: ServiceConnection, stub: &StubAddress) {
        let (Some(runtime), Some(this)) = (self.runtime.upgrade(), self.self_ref.upgrade()) else {
            return;
        };
        let (clients, subscriptions, pending) = {
            let mut state = self.state.lock();
            if state.released {
                return;
            }
            let unchanged = state.connection == status
                && (status != ServiceConnection::Connected || state.stub.as_ref() == Some(stub));
            if unchanged {
                return;
            }
            state.connection = status;
            let mut subscriptions = Vec::new();
            let mut pending = Vec::new();
            if status == ServiceConnection::Connected {
                state.stub = Some(stub.clone());
                let listened: BTreeSet<MessageId> = state
                    .listeners
                    .iter()
                    .filter(|entry| entry.sequence.is_none())
                    .map(|entry| entry.msg_id)
                    .collect();
                subscriptions.extend(listened);
            } else {
                state.stub = None;
                for data_state in state.states.values_mut() {
                    if *data_state == DataState::DataIsOk {
                        *data_state = DataState::DataIsInvalid;
                    }
                }
                pending.extend(
                    state
                        .pending
                        .iter()
                        .map(|(sequence, request)| (*sequence, request.request_id)),
                );
            }
            let clients: Vec<Delivery> = state
                .clients
                .iter()
                .map(|client| (client.listener.clone(), client.thread.clone()))
                .collect();
            (clients, subscriptions, pending)
        };

        info!(proxy = %self.address, stub = %stub, %status, "service connection changed");
        for msg_id in subscriptions {
            self.notify_stub(&runtime, stub, msg_id, NotifyAction::Subscribe { send_current: true });
        }
        for (sequence, request_id) in pending {
            self.process_response(request_id, ResultType::MessageUndelivered, sequence, &[]);
        }
        for (listener, thread) in clients {
            let event = NotificationEvent::connection(this.clone(), listener, status);
            post(&runtime, &thread, Box::new(event));
        }
    }

    /// Resolves requests pending for longer than `timeout` by queueing a
    /// `MessageUndelivered` response to the proxy's own thread. Returns the
    /// number of expired requests.
    pub fn expire_requests(&self, timeout: Duration) -> usize {
        let Some(runtime) = self.runtime.upgrade() else {
            return 0;
        };
        let now = Instant::now();
        let expired: Vec<(SequenceNr, MessageId)> = {
            let mut state = self.state.lock();
            state
                .pending
                .iter_mut()
                .filter(|(_, request)| !request.expired && now.duration_since(request.sent_at) >= timeout)
                .map(|(sequence, request)| {
                    request.expired = true;
                    (*sequence, request.request_id)
                })
                .collect()
        };
        for (sequence, request_id) in &expired {
            runtime.metrics().proxy.record_request_expired();
            warn!(proxy = %self.address, msg_id = %request_id, seq = %sequence, "request timed out");
            let reply = ServiceResponseEvent::new(
                self.address.clone(),
                *request_id,
                ResultType::MessageUndelivered,
                *sequence,
                Vec::new(),
            );
            post(&runtime, self.address.thread(), Box::new(reply));
        }
        expired.len()
    }

    fn originating_request(&self, msg_id: MessageId, pending: Option<&PendingRequest>) -> MessageId {
        if self.interface.is_request(msg_id) {
            return msg_id;
        }
        if let Some(pending) = pending {
            return pending.request_id;
        }
        self.interface.request_of(msg_id).unwrap_or(msg_id)
    }

    fn protocol_error(&self, runtime: &Runtime, msg_id: MessageId, sequence: SequenceNr, reason: &str) {
        runtime.metrics().proxy.record_protocol_error();
        let error = ProxyError::Protocol {
            msg_id,
            reason: reason.to_string(),
        };
        error!(proxy = %self.address, %msg_id, seq = %sequence, %error, "event dropped");
        if !sequence.is_unsolicited() {
            self.waiter.cancel(sequence);
        }
    }

    fn unsubscribe(&self, unused: Vec<MessageId>, stub: Option<StubAddress>) {
        let (Some(stub), Some(runtime)) = (stub, self.runtime.upgrade()) else {
            return;
        };
        for msg_id in unused {
            self.notify_stub(&runtime, &stub, msg_id, NotifyAction::Unsubscribe);
        }
    }

    fn notify_stub(&self, runtime: &Runtime, stub: &StubAddress, msg_id: MessageId, action: NotifyAction) {
        let event = NotifyRequestEvent::new(self.address.clone(), stub.clone(), msg_id, action);
        post(runtime, stub.thread(), Box::new(event));
    }

    fn kind_of(&self, msg_id: MessageId) -> Result<MessageKind, ProxyError> {
        self.interface
            .kind_of(msg_id)
            .ok_or_else(|| ProxyError::UnknownMessage {
                service: self.interface.name().to_string(),
                msg_id,
            })
    }

    fn runtime(&self) -> Result<Arc<Runtime>, ProxyError> {
        self.runtime.upgrade().ok_or_else(|| self.released())
    }

    fn this(&self) -> Result<Arc<Self>, ProxyError> {
        self.self_ref.upgrade().ok_or_else(|| self.released())
    }

    fn released(&self) -> ProxyError {
        ProxyError::Released {
            proxy: self.address.to_string(),
        }
    }
}

impl EventConsumer for ProxyBase {
    fn consume(&self, event: &dyn Event, _runtime: &Arc<Runtime>) {
        let object = event.as_runtime();
        if let Some(response) = runtime_cast::<ServiceResponseEvent>(object) {
            if self.interface.kind_of(response.data().msg_id()) == Some(MessageKind::Attribute) {
                self.process_attribute_event(response);
            } else {
                self.process_response_event(response);
            }
        } else if let Some(connection) = runtime_cast::<ServiceConnectionEvent>(object) {
            self.service_connected(connection.status(), connection.stub());
        } else {
            debug!(proxy = %self.address, event = object.class_name(), "unexpected event");
        }
    }
}

impl fmt::Debug for ProxyBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ProxyBase")
            .field("address", &self.address)
            .field("connection", &state.connection)
            .field("clients", &state.clients.len())
            .field("listeners", &state.listeners.len())
            .field("pending", &state.pending.len())
            .finish()
    }
}

fn listener_thread(fallback: &ThreadAddress) -> ThreadAddress {
    dispatcher::current_thread().unwrap_or_else(|| fallback.clone())
}

fn post(runtime: &Runtime, thread: &ThreadAddress, event: Box<dyn Event>) {
    if let Err(error) = runtime.post_event(thread, event) {
        debug!(thread = %thread, %error, "proxy event not delivered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RuntimeConfig;
    use crate::address::ComponentAddress;
    use crate::dispatcher::DispatcherThread;
    use crate::serialization::OutStream;
    use crate::service::Version;
    use std::any::Any;
    use std::sync::mpsc;

    const ASK: MessageId = MessageId::new(1);
    const ANSWER: MessageId = MessageId::new(2);
    const LEVEL: MessageId = MessageId::new(3);
    const FIRE: MessageId = MessageId::new(4);
    const WAIT: Duration = Duration::from_secs(5);

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Seen {
        Request(MessageId, SequenceNr),
        Notify(MessageId, NotifyAction),
    }

    /// Stands in for a stub and records what reaches it.
    struct Sink(Mutex<mpsc::Sender<Seen>>);

    impl EventConsumer for Sink {
        fn consume(&self, event: &dyn Event, _runtime: &Arc<Runtime>) {
            let object = event.as_runtime();
            let seen = if let Some(request) = runtime_cast::<ServiceRequestEvent>(object) {
                Seen::Request(request.data().msg_id(), request.data().sequence())
            } else if let Some(notify) = runtime_cast::<NotifyRequestEvent>(object) {
                Seen::Notify(notify.msg_id(), notify.action())
            } else {
                return;
            };
            let _ = self.0.lock().send(seen);
        }
    }

    #[derive(Default)]
    struct Level {
        value: Option<u64>,
    }

    impl ProxyData for Level {
        fn update_data(&mut self, _msg_id: MessageId, stream: &mut InStream<'_>) -> Result<(), ProxyError> {
            self.value = Some(stream.read::<u64>()?);
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct Watch {
        connections: Mutex<mpsc::Sender<ServiceConnection>>,
        notifications: Mutex<mpsc::Sender<Notification>>,
    }

    impl ProxyListener for Watch {
        fn on_service_connected(&self, _proxy: &Arc<ProxyBase>, status: ServiceConnection) {
            let _ = self.connections.lock().send(status);
        }

        fn on_notification(&self, _proxy: &Arc<ProxyBase>, notification: &Notification) {
            let _ = self.notifications.lock().send(*notification);
        }
    }

    struct Fixture {
        proxy: Arc<ProxyBase>,
        watch: Arc<dyn ProxyListener>,
        stub: StubAddress,
        seen: mpsc::Receiver<Seen>,
        connections: mpsc::Receiver<ServiceConnection>,
        notifications: mpsc::Receiver<Notification>,
        runtime: Arc<Runtime>,
        _threads: Vec<DispatcherThread>,
    }

    impl Fixture {
        fn connected() -> Self {
            let runtime = Runtime::new(RuntimeConfig::default()).unwrap();
            let server = DispatcherThread::spawn(&runtime, "Server").unwrap();
            let client = DispatcherThread::spawn(&runtime, "Client").unwrap();
            let interface = ServiceInterface::builder("Level", Version::new(1, 0, 0))
                .request(ASK.as_u32(), Some(ANSWER.as_u32()))
                .response(ANSWER.as_u32())
                .attribute(LEVEL.as_u32())
                .request(FIRE.as_u32(), None)
                .build()
                .unwrap();

            let stub = StubAddress::new(
                interface.service_item().clone(),
                ComponentAddress::new("Level", server.address().clone()),
            );
            let (sender, seen) = mpsc::channel();
            server
                .handle()
                .register_consumer(ConsumerKey::Stub(stub.clone()), Arc::new(Sink(Mutex::new(sender))))
                .unwrap();
            runtime.services().register_stub(&runtime, &stub).unwrap();

            let (connection_tx, connections) = mpsc::channel();
            let (notification_tx, notifications) = mpsc::channel();
            let watch: Arc<dyn ProxyListener> = Arc::new(Watch {
                connections: Mutex::new(connection_tx),
                notifications: Mutex::new(notification_tx),
            });
            let proxy = ProxyBase::find_or_create(
                &runtime,
                "Level",
                &interface,
                watch.clone(),
                |_| Box::new(Level::default()),
                client.address(),
            )
            .unwrap();
            assert_eq!(connections.recv_timeout(WAIT).unwrap(), ServiceConnection::Connected);

            Self {
                proxy,
                watch,
                stub,
                seen,
                connections,
                notifications,
                runtime,
                _threads: vec![server, client],
            }
        }

        fn seen(&self) -> Seen {
            self.seen.recv_timeout(WAIT).unwrap()
        }

        fn assert_stub_quiet(&self) {
            assert!(self.seen.recv_timeout(Duration::from_millis(200)).is_err());
        }

        fn notification(&self) -> Notification {
            self.notifications.recv_timeout(WAIT).unwrap()
        }

        fn level(&self) -> Option<u64> {
            self.proxy.read_data(|data: &Level| data.value).flatten()
        }
    }

    fn encoded(value: u64) -> Vec<u8> {
        OutStream::single(&value).unwrap()
    }

    #[test]
    fn test_failure_reported_under_request_id() {
        let fixture = Fixture::connected();
        let (sequence, outcome) = fixture.proxy.send_request_tracked(ASK, encoded(1)).unwrap();
        assert_eq!(fixture.seen(), Seen::Request(ASK, sequence));
        assert_eq!(fixture.proxy.pending_count(), 1);

        fixture
            .proxy
            .process_response(ANSWER, ResultType::RequestCanceled, sequence, &[]);

        let outcome = outcome.blocking_recv().unwrap();
        assert_eq!(outcome.msg_id(), ASK);
        assert_eq!(outcome.result(), ResultType::RequestCanceled);
        assert_eq!(fixture.proxy.data_state(ANSWER), DataState::Unknown);
        assert_eq!(fixture.proxy.pending_count(), 0);
    }

    #[test]
    fn test_undecodable_payload_dropped() {
        let fixture = Fixture::connected();
        let (sequence, outcome) = fixture.proxy.send_request_tracked(ASK, encoded(1)).unwrap();

        fixture
            .proxy
            .process_response(ANSWER, ResultType::RequestOk, sequence, &[1, 2]);

        assert!(outcome.blocking_recv().is_err());
        assert_eq!(fixture.proxy.data_state(ANSWER), DataState::Unknown);
        assert_eq!(fixture.level(), None);
        assert_eq!(fixture.runtime.metrics().proxy.total_protocol_errors(), 1);
    }

    #[test]
    fn test_undeclared_id_dropped() {
        let fixture = Fixture::connected();
        fixture.proxy.set_notification(LEVEL, fixture.watch.clone(), false).unwrap();

        fixture
            .proxy
            .process_response(MessageId::new(77), ResultType::DataOk, SequenceNr::UNSOLICITED, &encoded(3));

        assert_eq!(fixture.runtime.metrics().proxy.total_protocol_errors(), 1);
        assert!(fixture.notifications.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_data_update_and_invalidation() {
        let fixture = Fixture::connected();
        fixture.proxy.set_notification(LEVEL, fixture.watch.clone(), false).unwrap();

        fixture
            .proxy
            .process_response(LEVEL, ResultType::DataOk, SequenceNr::UNSOLICITED, &encoded(9));
        let update = fixture.notification();
        assert_eq!((update.msg_id(), update.state()), (LEVEL, DataState::DataIsOk));
        assert_eq!(fixture.level(), Some(9));

        fixture
            .proxy
            .process_response(LEVEL, ResultType::DataInvalid, SequenceNr::UNSOLICITED, &[]);
        assert_eq!(fixture.notification().state(), DataState::DataIsInvalid);
        assert_eq!(fixture.proxy.data_state(LEVEL), DataState::DataIsInvalid);
        // The last valid value stays readable.
        assert_eq!(fixture.level(), Some(9));
    }

    #[test]
    fn test_subscription_follows_listeners() {
        let fixture = Fixture::connected();
        let (other_tx, _other_rx) = mpsc::channel();
        let (other_conn_tx, _other_conn_rx) = mpsc::channel();
        let other: Arc<dyn ProxyListener> = Arc::new(Watch {
            connections: Mutex::new(other_conn_tx),
            notifications: Mutex::new(other_tx),
        });

        fixture.proxy.set_notification(LEVEL, fixture.watch.clone(), false).unwrap();
        assert_eq!(
            fixture.seen(),
            Seen::Notify(LEVEL, NotifyAction::Subscribe { send_current: true })
        );
        fixture.proxy.set_notification(LEVEL, other.clone(), false).unwrap();
        fixture.proxy.clear_notification(LEVEL, &fixture.watch);
        fixture.assert_stub_quiet();

        fixture.proxy.clear_all_notifications(&other);
        assert_eq!(fixture.seen(), Seen::Notify(LEVEL, NotifyAction::Unsubscribe));
    }

    #[test]
    fn test_replay_suppresses_current_value() {
        let fixture = Fixture::connected();
        fixture
            .proxy
            .process_response(LEVEL, ResultType::DataOk, SequenceNr::UNSOLICITED, &encoded(4));

        fixture.proxy.set_notification(LEVEL, fixture.watch.clone(), true).unwrap();

        let replay = fixture.notification();
        assert_eq!(replay.result(), ResultType::DataOk);
        assert!(replay.sequence().is_unsolicited());
        assert_eq!(
            fixture.seen(),
            Seen::Notify(LEVEL, NotifyAction::Subscribe { send_current: false })
        );
    }

    #[test]
    fn test_disconnect_resolves_pending_locally() {
        let fixture = Fixture::connected();
        fixture
            .proxy
            .process_response(LEVEL, ResultType::DataOk, SequenceNr::UNSOLICITED, &encoded(4));
        let (_, outcome) = fixture.proxy.send_request_tracked(ASK, encoded(1)).unwrap();

        fixture
            .proxy
            .service_connected(ServiceConnection::Disconnected, &fixture.stub);

        let outcome = outcome.blocking_recv().unwrap();
        assert_eq!((outcome.msg_id(), outcome.result()), (ASK, ResultType::MessageUndelivered));
        assert_eq!(fixture.connections.recv_timeout(WAIT).unwrap(), ServiceConnection::Disconnected);
        assert_eq!(fixture.proxy.data_state(LEVEL), DataState::DataIsInvalid);
        assert_eq!(fixture.proxy.pending_count(), 0);

        // Repeating the status changes nothing.
        fixture
            .proxy
            .service_connected(ServiceConnection::Disconnected, &fixture.stub);
        assert!(fixture.connections.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_settled_request_fails_once() {
        let fixture = Fixture::connected();
        fixture.proxy.set_notification(ANSWER, fixture.watch.clone(), false).unwrap();
        let sequence = fixture.proxy.send_request(ASK, encoded(1), None).unwrap();

        fixture
            .proxy
            .service_connected(ServiceConnection::Disconnected, &fixture.stub);
        let failure = fixture.notification();
        assert_eq!((failure.msg_id(), failure.result()), (ASK, ResultType::MessageUndelivered));
        assert_eq!(failure.sequence(), sequence);

        // The timeout reply queued before the disconnect arrives late.
        fixture
            .proxy
            .process_response(ASK, ResultType::MessageUndelivered, sequence, &[]);
        assert!(fixture.notifications.recv_timeout(Duration::from_millis(200)).is_err());
        assert_eq!(fixture.runtime.metrics().proxy.total_request_failures(), 1);
    }

    #[test]
    fn test_request_without_response_completes_on_send() {
        let fixture = Fixture::connected();
        let (sequence, outcome) = fixture.proxy.send_request_tracked(FIRE, Vec::new()).unwrap();

        let outcome = outcome.blocking_recv().unwrap();
        assert_eq!(outcome.result(), ResultType::RequestOk);
        assert_eq!(outcome.sequence(), sequence);
        assert_eq!(fixture.proxy.pending_count(), 0);
        assert_eq!(fixture.seen(), Seen::Request(FIRE, sequence));
    }
}
