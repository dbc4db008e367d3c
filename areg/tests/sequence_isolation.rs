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

//! Sequence numbers are per proxy and match each response to its request.

mod common;

use areg::component::ModelLoader;
use areg::serialization::OutStream;
use areg::service::{ResultType, SequenceNr, Version};
use common::*;
use std::collections::BTreeSet;
use std::sync::Arc;

#[test]
fn test_sequences_independent_per_proxy() {
    let runtime = runtime();
    let interface = calc_interface(Version::new(1, 0, 0));
    let _model = ModelLoader::new()
        .with_entry(calc_entry("Calc", "Server", interface.clone()))
        .load(&runtime)
        .unwrap();
    let first = runtime.spawn_thread("First").unwrap();
    let second = runtime.spawn_thread("Second").unwrap();
    let (a, _a_recorder, _a_inbox) = connected_proxy(&runtime, &interface, first.address());
    let (b, _b_recorder, _b_inbox) = connected_proxy(&runtime, &interface, second.address());

    let mut outcomes = Vec::new();
    for value in 0..5u64 {
        for proxy in [&a, &b] {
            let payload = OutStream::single(&value).unwrap();
            outcomes.push(proxy.send_request_tracked(INCREMENT, payload).unwrap());
        }
    }

    let sequences: Vec<u64> = outcomes.iter().map(|(sequence, _)| sequence.as_u64()).collect();
    assert_eq!(sequences, vec![1, 1, 2, 2, 3, 3, 4, 4, 5, 5]);
    for (sequence, outcome) in outcomes {
        let notification = outcome.blocking_recv().unwrap();
        assert_eq!(notification.sequence(), sequence);
        assert_eq!(notification.result(), ResultType::RequestOk);
    }
}

#[test]
fn test_concurrent_senders_get_their_own_answers() {
    let runtime = runtime();
    let interface = calc_interface(Version::new(1, 0, 0));
    let _model = ModelLoader::new()
        .with_entry(calc_entry("Calc", "Server", interface.clone()))
        .load(&runtime)
        .unwrap();
    let client = runtime.spawn_thread("Client").unwrap();
    let (proxy, _recorder, _inbox) = connected_proxy(&runtime, &interface, client.address());

    let senders: Vec<_> = (0..4)
        .map(|_| {
            let proxy = Arc::clone(&proxy);
            std::thread::spawn(move || {
                (0..25)
                    .map(|_| {
                        let (sequence, outcome) = proxy
                            .send_request_tracked(SLOW, Vec::new())
                            .unwrap();
                        (sequence, outcome)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    let outcomes: Vec<_> = senders
        .into_iter()
        .flat_map(|sender| sender.join().unwrap())
        .collect();

    let unique: BTreeSet<SequenceNr> = outcomes.iter().map(|(sequence, _)| *sequence).collect();
    assert_eq!(unique.len(), 100);
    assert_eq!(unique.first(), Some(&SequenceNr::new(1)));
    assert_eq!(unique.last(), Some(&SequenceNr::new(100)));

    // Answer every deferred request at once; each waiter still resolves
    // with its own sequence number.
    let stub = runtime
        .components()
        .find_by_name("Calc")
        .and_then(|component| component.find_server_by_name("Calc"))
        .unwrap();
    let (answered_tx, answered) = std::sync::mpsc::channel();
    runtime
        .threads()
        .find_by_name("Server")
        .unwrap()
        .post_task(move |_| {
            let count = stub.respond(SLOW_DONE, OutStream::single(&0u64).unwrap()).unwrap();
            answered_tx.send(count).unwrap();
        })
        .unwrap();
    assert_eq!(answered.recv_timeout(TIMEOUT).unwrap(), 100);

    for (sequence, outcome) in outcomes {
        let notification = outcome.blocking_recv().unwrap();
        assert_eq!(notification.sequence(), sequence);
        assert_eq!(notification.msg_id(), SLOW_DONE);
    }
    assert_eq!(proxy.pending_count(), 0);
}
