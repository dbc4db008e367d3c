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

//! Failure results: undeliverable requests, refused requests and stub
//! side failures.

mod common;

use areg::address::ComponentAddress;
use areg::component::ModelLoader;
use areg::proxy::{ProxyBase, ProxyError};
use areg::serialization::OutStream;
use areg::service::{DataState, ResultType, ServiceConnection, StubAddress, Version};
use common::*;

#[test]
fn test_request_without_stub_consumer_is_undelivered() {
    let runtime = runtime();
    let interface = calc_interface(Version::new(1, 0, 0));
    let server = runtime.spawn_thread("Server").unwrap();
    let client = runtime.spawn_thread("Client").unwrap();

    // Announced to the service manager, but nothing consumes its events.
    let stub = StubAddress::new(
        interface.service_item().clone(),
        ComponentAddress::new("Calc", server.address().clone()),
    );
    runtime.services().register_stub(&runtime, &stub).unwrap();

    let (proxy, recorder, inbox) = connected_proxy(&runtime, &interface, client.address());
    proxy
        .set_notification(INCREMENTED, listener(&recorder), false)
        .unwrap();
    let (sequence, outcome) = proxy
        .send_request_tracked(INCREMENT, OutStream::single(&1u64).unwrap())
        .unwrap();

    let outcome = outcome.blocking_recv().unwrap();
    assert_eq!(outcome.result(), ResultType::MessageUndelivered);
    assert_eq!(outcome.msg_id(), INCREMENT);
    assert_eq!(outcome.sequence(), sequence);
    assert!(outcome.request_failed());

    // Listeners of the response hear about the failure of its request.
    let notification = inbox.notification();
    assert_eq!(notification.msg_id(), INCREMENT);
    assert_eq!(notification.result(), ResultType::MessageUndelivered);
    assert_eq!(proxy.data_state(INCREMENTED), DataState::Unknown);
    assert_eq!(proxy.pending_count(), 0);
    assert!(runtime.metrics().dispatch.total_events_undelivered() >= 1);
}

#[test]
fn test_stub_failure_reported_under_request_id() {
    let runtime = runtime();
    let interface = calc_interface(Version::new(1, 0, 0));
    let _model = ModelLoader::new()
        .with_entry(calc_entry("Calc", "Server", interface.clone()))
        .load(&runtime)
        .unwrap();
    let client = runtime.spawn_thread("Client").unwrap();
    let (proxy, recorder, inbox) = connected_proxy(&runtime, &interface, client.address());

    let sequence = proxy
        .send_request(BUSY, Vec::new(), Some(listener(&recorder)))
        .unwrap();

    let notification = inbox.notification();
    assert_eq!(notification.msg_id(), BUSY);
    assert_eq!(notification.result(), ResultType::RequestBusy);
    assert_eq!(notification.sequence(), sequence);
    assert_eq!(proxy.data_state(BUSY_DONE), DataState::Unknown);
    assert_eq!(runtime.metrics().proxy.total_request_failures(), 1);
}

#[test]
fn test_requests_refused_while_disconnected() {
    let runtime = runtime();
    let interface = calc_interface(Version::new(1, 0, 0));
    let client = runtime.spawn_thread("Client").unwrap();
    let (recorder, inbox) = Recorder::new();
    let proxy =
        ProxyBase::find_or_create(&runtime, "Calc", &interface, recorder, cache, client.address()).unwrap();

    let error = proxy
        .send_request(INCREMENT, OutStream::single(&1u64).unwrap(), None)
        .unwrap_err();

    assert!(matches!(error, ProxyError::ServiceUnavailable { .. }));
    assert_eq!(error.result_type(), ResultType::RequestError);
    assert_eq!(proxy.connection(), ServiceConnection::Disconnected);
    assert_eq!(proxy.pending_count(), 0);
    assert_eq!(runtime.metrics().proxy.total_requests_rejected(), 1);
    assert_eq!(runtime.metrics().proxy.total_requests_sent(), 0);
    assert!(inbox.connections.recv_timeout(QUIET).is_err());
}

#[test]
fn test_only_requests_can_be_sent() {
    let runtime = runtime();
    let interface = calc_interface(Version::new(1, 0, 0));
    let _model = ModelLoader::new()
        .with_entry(calc_entry("Calc", "Server", interface.clone()))
        .load(&runtime)
        .unwrap();
    let client = runtime.spawn_thread("Client").unwrap();
    let (proxy, recorder, _inbox) = connected_proxy(&runtime, &interface, client.address());

    let error = proxy.send_request(VALUE, Vec::new(), None).unwrap_err();
    assert!(matches!(error, ProxyError::NotARequest { msg_id } if msg_id == VALUE));

    let error = proxy
        .set_notification(INCREMENT, listener(&recorder), false)
        .unwrap_err();
    assert!(matches!(error, ProxyError::NotNotifiable { .. }));
}

#[test]
fn test_deferred_request_answered_later() {
    let runtime = runtime();
    let interface = calc_interface(Version::new(1, 0, 0));
    let model = ModelLoader::new()
        .with_entry(calc_entry("Calc", "Server", interface.clone()))
        .load(&runtime)
        .unwrap();
    let client = runtime.spawn_thread("Client").unwrap();
    let (proxy, _recorder, _inbox) = connected_proxy(&runtime, &interface, client.address());
    let stub = model
        .find("Calc")
        .and_then(|component| component.find_server_by_name("Calc"))
        .unwrap();

    let (_, outcome) = proxy.send_request_tracked(SLOW, Vec::new()).unwrap();
    let (answered_tx, answered) = std::sync::mpsc::channel();
    runtime
        .threads()
        .find_by_name("Server")
        .unwrap()
        .post_task(move |_| {
            let answered = stub.respond(SLOW_DONE, OutStream::single(&99u64).unwrap()).unwrap();
            answered_tx.send(answered).unwrap();
        })
        .unwrap();

    assert_eq!(answered.recv_timeout(TIMEOUT).unwrap(), 1);
    assert_eq!(outcome.blocking_recv().unwrap().result(), ResultType::RequestOk);
    assert_eq!(cached(&proxy, SLOW_DONE), Some(99));
}

#[test]
fn test_unloading_stub_resolves_pending_requests() {
    let runtime = runtime();
    let interface = calc_interface(Version::new(1, 0, 0));
    let mut model = ModelLoader::new()
        .with_entry(calc_entry("Calc", "Server", interface.clone()))
        .load(&runtime)
        .unwrap();
    let client = runtime.spawn_thread("Client").unwrap();
    let (proxy, _recorder, inbox) = connected_proxy(&runtime, &interface, client.address());

    let (_, outcome) = proxy.send_request_tracked(SLOW, Vec::new()).unwrap();
    model.unload();

    let outcome = outcome.blocking_recv().unwrap();
    assert_eq!(outcome.result(), ResultType::MessageUndelivered);
    assert_eq!(outcome.msg_id(), SLOW);
    assert_eq!(inbox.connection(), ServiceConnection::Disconnected);
    assert_eq!(proxy.pending_count(), 0);
}
