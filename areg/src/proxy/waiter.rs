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

//! Waiting for the response to one request.

use crate::proxy::Notification;
use crate::service::SequenceNr;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::oneshot;

/// Maps sequence numbers to callers waiting for their outcome.
///
/// The proxy core never blocks; this is the primitive applications use to
/// wait anyway. The receiver can be awaited or drained with
/// `blocking_recv` off a dispatcher thread.
///
/// # Examples
///
/// ```rust
/// use areg::proxy::{Notification, SequenceWaiter};
/// use areg::service::{DataState, MessageId, ResultType, SequenceNr};
///
/// let waiter = SequenceWaiter::new();
/// let receiver = waiter.expect(SequenceNr::new(1));
/// let outcome = Notification::new(
///     MessageId::new(11),
///     ResultType::RequestOk,
///     SequenceNr::new(1),
///     DataState::DataIsOk,
/// );
/// assert!(waiter.complete(SequenceNr::new(1), outcome));
/// assert_eq!(receiver.blocking_recv().unwrap(), outcome);
/// ```
#[derive(Debug, Default)]
pub struct SequenceWaiter {
    waiting: Mutex<HashMap<SequenceNr, oneshot::Sender<Notification>>>,
}

impl SequenceWaiter {
    /// Creates an empty waiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers interest in `sequence`.
    pub fn expect(&self, sequence: SequenceNr) -> oneshot::Receiver<Notification> {
        let (sender, receiver) = oneshot::channel();
        self.waiting.lock().insert(sequence, sender);
        receiver
    }

    /// Completes `sequence`. Returns `false` if nobody was waiting.
    pub fn complete(&self, sequence: SequenceNr, notification: Notification) -> bool {
        match self.waiting.lock().remove(&sequence) {
            Some(sender) => sender.send(notification).is_ok(),
            None => false,
        }
    }

    /// Stops waiting for `sequence`; its receiver reports an error.
    pub fn cancel(&self, sequence: SequenceNr) -> bool {
        self.waiting.lock().remove(&sequence).is_some()
    }

    /// Stops waiting for everything. Returns the number of cancelled
    /// waits.
    pub fn cancel_all(&self) -> usize {
        let mut waiting = self.waiting.lock();
        let count = waiting.len();
        waiting.clear();
        count
    }

    /// Returns the number of open waits.
    pub fn len(&self) -> usize {
        self.waiting.lock().len()
    }

    /// Returns `true` if nobody waits.
    pub fn is_empty(&self) -> bool {
        self.waiting.lock().is_empty()
    }
}
