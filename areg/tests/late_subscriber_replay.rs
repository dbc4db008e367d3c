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

//! Cached data replayed to listeners that register late.

mod common;

use areg::component::ModelLoader;
use areg::serialization::OutStream;
use areg::service::{DataState, ResultType, Version};
use common::*;

#[test]
fn test_late_listener_gets_cached_response() {
    let runtime = runtime();
    let interface = calc_interface(Version::new(1, 0, 0));
    let _model = ModelLoader::new()
        .with_entry(calc_entry("Calc", "Server", interface.clone()))
        .load(&runtime)
        .unwrap();
    let client = runtime.spawn_thread("Client").unwrap();
    let (proxy, early, early_inbox) = connected_proxy(&runtime, &interface, client.address());
    proxy
        .set_notification(INCREMENTED, listener(&early), false)
        .unwrap();
    proxy
        .send_request(INCREMENT, OutStream::single(&5u64).unwrap(), None)
        .unwrap();
    assert_eq!(early_inbox.notification().result(), ResultType::RequestOk);

    let (late, late_inbox) = Recorder::new();
    proxy
        .set_notification(INCREMENTED, listener(&late), true)
        .unwrap();
    let replay = late_inbox.notification();
    assert_eq!(replay.msg_id(), INCREMENTED);
    assert_eq!(replay.result(), ResultType::RequestOk);
    assert_eq!(replay.state(), DataState::DataIsOk);
    assert!(replay.sequence().is_unsolicited());
    assert_eq!(cached(&proxy, INCREMENTED), Some(6));
    late_inbox.assert_no_notification();
    early_inbox.assert_no_notification();
}

#[test]
fn test_no_replay_without_notify_always() {
    let runtime = runtime();
    let interface = calc_interface(Version::new(1, 0, 0));
    let _model = ModelLoader::new()
        .with_entry(calc_entry("Calc", "Server", interface.clone()))
        .load(&runtime)
        .unwrap();
    let client = runtime.spawn_thread("Client").unwrap();
    let (proxy, _recorder, _inbox) = connected_proxy(&runtime, &interface, client.address());
    let (_, outcome) = proxy
        .send_request_tracked(INCREMENT, OutStream::single(&5u64).unwrap())
        .unwrap();
    outcome.blocking_recv().unwrap();

    let (quiet, quiet_inbox) = Recorder::new();
    proxy
        .set_notification(INCREMENTED, listener(&quiet), false)
        .unwrap();
    quiet_inbox.assert_no_notification();
}

#[test]
fn test_repeated_registration_only_replays() {
    let runtime = runtime();
    let interface = calc_interface(Version::new(1, 0, 0));
    let _model = ModelLoader::new()
        .with_entry(calc_entry("Calc", "Server", interface.clone()))
        .load(&runtime)
        .unwrap();
    let client = runtime.spawn_thread("Client").unwrap();
    let (proxy, recorder, inbox) = connected_proxy(&runtime, &interface, client.address());
    proxy
        .set_notification(INCREMENTED, listener(&recorder), false)
        .unwrap();
    proxy
        .send_request(INCREMENT, OutStream::single(&1u64).unwrap(), None)
        .unwrap();
    inbox.notification();

    proxy
        .set_notification(INCREMENTED, listener(&recorder), true)
        .unwrap();
    assert!(inbox.notification().sequence().is_unsolicited());

    // Still registered once: the next answer arrives once.
    proxy
        .send_request(INCREMENT, OutStream::single(&2u64).unwrap(), None)
        .unwrap();
    assert_eq!(inbox.notification().result(), ResultType::RequestOk);
    inbox.assert_no_notification();
}

#[test]
fn test_first_attribute_subscriber_gets_stub_value() {
    let runtime = runtime();
    let interface = calc_interface(Version::new(1, 0, 0));
    let _model = ModelLoader::new()
        .with_entry(calc_entry("Calc", "Server", interface.clone()))
        .load(&runtime)
        .unwrap();
    let client = runtime.spawn_thread("Client").unwrap();
    let (proxy, first, first_inbox) = connected_proxy(&runtime, &interface, client.address());
    let (_, outcome) = proxy
        .send_request_tracked(INCREMENT, OutStream::single(&7u64).unwrap())
        .unwrap();
    outcome.blocking_recv().unwrap();
    // Nobody subscribed yet, so the proxy knows nothing about the value.
    assert_eq!(proxy.data_state(VALUE), DataState::Unknown);

    proxy.set_notification(VALUE, listener(&first), true).unwrap();
    let current = first_inbox.notification();
    assert_eq!(current.result(), ResultType::DataOk);
    assert_eq!(cached(&proxy, VALUE), Some(8));

    let (second, second_inbox) = Recorder::new();
    proxy.set_notification(VALUE, listener(&second), true).unwrap();
    assert_eq!(second_inbox.notification().result(), ResultType::DataOk);
    second_inbox.assert_no_notification();
    first_inbox.assert_no_notification();
}

#[test]
fn test_replayed_subscription_not_duplicated_by_stub() {
    let runtime = runtime();
    let interface = calc_interface(Version::new(1, 0, 0));
    let _model = ModelLoader::new()
        .with_entry(calc_entry("Calc", "Server", interface.clone()))
        .load(&runtime)
        .unwrap();
    let client = runtime.spawn_thread("Client").unwrap();
    let (proxy, recorder, inbox) = connected_proxy(&runtime, &interface, client.address());

    proxy.set_notification(VALUE, listener(&recorder), false).unwrap();
    assert_eq!(inbox.notification().result(), ResultType::DataInvalid);
    proxy
        .send_request(INCREMENT, OutStream::single(&1u64).unwrap(), None)
        .unwrap();
    assert_eq!(inbox.notification().result(), ResultType::DataOk);
    proxy.clear_notification(VALUE, &listener(&recorder));

    // The cached value is replayed and the stub is asked not to resend it.
    proxy.set_notification(VALUE, listener(&recorder), true).unwrap();
    assert!(inbox.notification().sequence().is_unsolicited());
    inbox.assert_no_notification();
}
