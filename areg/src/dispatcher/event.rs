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

//! Events and event consumers.

use crate::context::Runtime;
use crate::runtime::RuntimeClassId;
use crate::runtime::RuntimeObject;
use crate::service::{ProxyAddress, StubAddress};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Where a dispatcher thread delivers an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTarget {
    /// Exactly one consumer registered under the key. If none is registered
    /// the event's [`Event::undelivered`] hook runs instead.
    Consumer(ConsumerKey),
    /// Every consumer registered under a [`ConsumerKey::Class`] the event is
    /// an instance of.
    Broadcast,
    /// The event itself, through [`Event::process`].
    Itself,
}

/// Key under which a consumer registers with a dispatcher thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConsumerKey {
    /// Receives broadcast events of the class (or derived classes).
    Class(&'static RuntimeClassId),
    /// A service provider.
    Stub(StubAddress),
    /// A service consumer.
    Proxy(ProxyAddress),
    /// An application defined consumer.
    Named(String),
}

impl fmt::Display for ConsumerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(id) => write!(f, "class:{}", id.name()),
            Self::Stub(address) => write!(f, "stub:{address}"),
            Self::Proxy(address) => write!(f, "proxy:{address}"),
            Self::Named(name) => write!(f, "named:{name}"),
        }
    }
}

/// An event queued on a dispatcher thread.
///
/// Implement [`RuntimeObject`] through
/// [`runtime_object!`](crate::runtime_object) so consumers can recover the
/// concrete type with [`runtime_cast`](crate::runtime::runtime_cast).
pub trait Event: RuntimeObject + Send + fmt::Debug {
    /// Returns where the event is delivered.
    fn target(&self) -> EventTarget;

    /// Handles an event targeted at [`EventTarget::Itself`].
    fn process(&self, runtime: &Arc<Runtime>) {
        let _ = runtime;
    }

    /// Runs when no consumer is registered for the event's key.
    fn undelivered(self: Box<Self>, runtime: &Arc<Runtime>) {
        let _ = runtime;
        debug!(event = self.class_name(), "event dropped without consumer");
    }
}

/// Receives events from a dispatcher thread.
pub trait EventConsumer: Send + Sync {
    /// Handles one event. Runs on the dispatcher thread the consumer is
    /// registered with.
    fn consume(&self, event: &dyn Event, runtime: &Arc<Runtime>);
}

type Task = Box<dyn FnOnce(&Arc<Runtime>) + Send>;

/// Runs a closure on the dispatcher thread that receives it.
pub struct TaskEvent {
    task: Mutex<Option<Task>>,
}

impl TaskEvent {
    /// Wraps a closure.
    pub fn new<F>(task: F) -> Self
    where
        F: FnOnce(&Arc<Runtime>) + Send + 'static,
    {
        Self {
            task: Mutex::new(Some(Box::new(task))),
        }
    }
}

crate::runtime_object!(TaskEvent, "areg::TaskEvent");

impl fmt::Debug for TaskEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskEvent")
            .field("pending", &self.task.lock().is_some())
            .finish()
    }
}

impl Event for TaskEvent {
    fn target(&self) -> EventTarget {
        EventTarget::Itself
    }

    fn process(&self, runtime: &Arc<Runtime>) {
        if let Some(task) = self.task.lock().take() {
            task(runtime);
        }
    }
}
