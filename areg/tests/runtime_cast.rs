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

//! Run-time class checks on events crossing dispatcher threads.

mod common;

use areg::address::{ComponentAddress, ThreadAddress};
use areg::dispatcher::{ConsumerKey, DispatcherThread, Event, EventConsumer, EventTarget};
use areg::runtime::{RuntimeObject, RuntimeType, runtime_cast, runtime_cast_by_name};
use areg::service::{
    MessageId, ProxyAddress, ResultType, SequenceNr, ServiceEvent, ServiceItem, ServiceRequestEvent,
    ServiceResponseEvent, StubAddress, Version,
};
use areg::Runtime;
use common::*;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct Tick {
    count: u32,
}
areg::runtime_object!(Tick, "test::Tick");

impl Event for Tick {
    fn target(&self) -> EventTarget {
        EventTarget::Broadcast
    }
}

#[derive(Debug)]
struct AlarmTick {
    tick: Tick,
    label: &'static str,
}
areg::runtime_object!(AlarmTick, "test::AlarmTick", base = tick);

impl Event for AlarmTick {
    fn target(&self) -> EventTarget {
        EventTarget::Broadcast
    }
}

struct Watcher {
    name: &'static str,
    seen: Mutex<Sender<(&'static str, u32, Option<&'static str>)>>,
}

impl EventConsumer for Watcher {
    fn consume(&self, event: &dyn Event, _runtime: &Arc<Runtime>) {
        let object = event.as_runtime();
        let count = runtime_cast::<Tick>(object).map_or(0, |tick| tick.count);
        let label = runtime_cast::<AlarmTick>(object).map(|alarm| alarm.label);
        let _ = self.seen.lock().unwrap().send((self.name, count, label));
    }
}

fn addresses() -> (ProxyAddress, StubAddress) {
    let service = ServiceItem::new("Calc", Version::new(1, 0, 0));
    let proxy = ProxyAddress::new(service.clone(), "Calc", ThreadAddress::new("Client"));
    let stub = StubAddress::new(service, ComponentAddress::new("Calc", ThreadAddress::new("Server")));
    (proxy, stub)
}

#[test]
fn test_service_events_cast_to_their_base() {
    let (proxy, stub) = addresses();
    let request = ServiceRequestEvent::new(proxy, stub, MessageId::new(1), SequenceNr::new(3), vec![9]);

    let base = runtime_cast::<ServiceEvent>(&request).unwrap();
    assert_eq!(base.msg_id(), MessageId::new(1));
    assert_eq!(base.sequence(), SequenceNr::new(3));
    assert!(runtime_cast::<ServiceResponseEvent>(&request).is_none());
    assert!(request.is_instance_of(ServiceEvent::runtime_class()));
    assert!(!request.is_instance_of(ServiceResponseEvent::runtime_class()));
}

#[test]
fn test_cast_by_class_name() {
    let (proxy, _) = addresses();
    let response = ServiceResponseEvent::new(
        proxy,
        MessageId::new(2),
        ResultType::RequestOk,
        SequenceNr::new(1),
        Vec::new(),
    );
    let base_name = ServiceEvent::runtime_class().name();

    let base = runtime_cast_by_name(&response, base_name).unwrap();
    assert_eq!(base.class_name(), base_name);
    assert!(runtime_cast_by_name(&response, "test::Unrelated").is_none());
    assert!(response.is_instance_of_name(base_name));
}

#[test]
fn test_broadcast_reaches_consumers_of_base_class() {
    let runtime = runtime();
    let thread = DispatcherThread::spawn(&runtime, "Bus").unwrap();
    let (sender, seen) = mpsc::channel();
    for (name, class) in [
        ("ticks", Tick::runtime_class()),
        ("alarms", AlarmTick::runtime_class()),
    ] {
        let watcher = Arc::new(Watcher {
            name,
            seen: Mutex::new(sender.clone()),
        });
        thread
            .handle()
            .register_consumer(ConsumerKey::Class(class), watcher)
            .unwrap();
    }

    thread.handle().post_event(Box::new(Tick { count: 1 })).unwrap();
    assert_eq!(seen.recv_timeout(TIMEOUT).unwrap(), ("ticks", 1, None));

    thread
        .handle()
        .post_event(Box::new(AlarmTick {
            tick: Tick { count: 2 },
            label: "wake",
        }))
        .unwrap();
    let mut received = vec![
        seen.recv_timeout(TIMEOUT).unwrap(),
        seen.recv_timeout(TIMEOUT).unwrap(),
    ];
    received.sort();
    assert_eq!(received, vec![("alarms", 2, Some("wake")), ("ticks", 2, Some("wake"))]);
    assert!(seen.recv_timeout(QUIET).is_err());
}
