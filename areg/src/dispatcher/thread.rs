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

//! Dispatcher threads.
//!
//! Each dispatcher thread is a named OS thread draining a multi-producer
//! queue in FIFO order. Events are routed to the consumers registered with
//! the thread, or processed by the event itself.

use crate::address::{ThreadAddress, is_valid_name};
use crate::context::Runtime;
use crate::dispatcher::{
    ConsumerKey, DispatchError, Event, EventConsumer, EventTarget, TaskEvent,
};
use crate::observability::DispatchMetrics;
use parking_lot::RwLock;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, trace, warn};

thread_local! {
    static CURRENT: RefCell<Option<DispatcherHandle>> = const { RefCell::new(None) };
}

/// Returns the dispatcher thread executing the caller, if any.
pub fn current() -> Option<DispatcherHandle> {
    CURRENT.with(|current| current.borrow().clone())
}

/// Returns the address of the dispatcher thread executing the caller.
pub fn current_thread() -> Option<ThreadAddress> {
    CURRENT.with(|current| {
        current
            .borrow()
            .as_ref()
            .map(|handle| handle.address().clone())
    })
}

enum QueueItem {
    Event(Box<dyn Event>),
    Exit,
}

struct DispatcherShared {
    address: ThreadAddress,
    sender: mpsc::UnboundedSender<QueueItem>,
    consumers: RwLock<HashMap<ConsumerKey, Arc<dyn EventConsumer>>>,
    depth: AtomicUsize,
    running: AtomicBool,
    warning_threshold: usize,
    metrics: Arc<DispatchMetrics>,
}

/// Cloneable handle used to post events to a dispatcher thread and manage
/// its consumers.
#[derive(Clone)]
pub struct DispatcherHandle {
    shared: Arc<DispatcherShared>,
}

impl DispatcherHandle {
    /// Returns the thread address.
    pub fn address(&self) -> &ThreadAddress {
        &self.shared.address
    }

    /// Returns the thread name.
    pub fn name(&self) -> &str {
        self.shared.address.name()
    }

    /// Returns `true` while the thread accepts events.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Returns the number of queued events not yet dispatched.
    pub fn queue_depth(&self) -> usize {
        self.shared.depth.load(Ordering::Relaxed)
    }

    /// Returns `true` if the caller runs on this dispatcher thread.
    pub fn is_current(&self) -> bool {
        current_thread().is_some_and(|address| address == self.shared.address)
    }

    /// Queues an event. Never blocks; safe to call from any thread.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ThreadStopped`] if the thread no longer
    /// accepts events.
    pub fn post_event(&self, event: Box<dyn Event>) -> Result<(), DispatchError> {
        if !self.is_running() {
            return Err(self.stopped());
        }
        trace!(thread = %self.shared.address, event = event.class_name(), "posting event");
        let depth = self.shared.depth.fetch_add(1, Ordering::Relaxed) + 1;
        if self.shared.sender.send(QueueItem::Event(event)).is_err() {
            self.shared.depth.fetch_sub(1, Ordering::Relaxed);
            return Err(self.stopped());
        }
        self.shared.metrics.record_event_posted();
        if depth == self.shared.warning_threshold {
            warn!(thread = %self.shared.address, depth, "dispatcher queue is backing up");
        }
        Ok(())
    }

    /// Queues a closure to run on the thread.
    pub fn post_task<F>(&self, task: F) -> Result<(), DispatchError>
    where
        F: FnOnce(&Arc<Runtime>) + Send + 'static,
    {
        self.post_event(Box::new(TaskEvent::new(task)))
    }

    /// Registers a consumer under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ConsumerExists`] if the key is taken.
    pub fn register_consumer(
        &self,
        key: ConsumerKey,
        consumer: Arc<dyn EventConsumer>,
    ) -> Result<(), DispatchError> {
        let mut consumers = self.shared.consumers.write();
        if consumers.contains_key(&key) {
            return Err(DispatchError::ConsumerExists {
                key: key.to_string(),
                thread: self.shared.address.clone(),
            });
        }
        debug!(thread = %self.shared.address, consumer = %key, "registered consumer");
        consumers.insert(key, consumer);
        Ok(())
    }

    /// Removes the consumer registered under `key`.
    pub fn unregister_consumer(&self, key: &ConsumerKey) -> Option<Arc<dyn EventConsumer>> {
        let removed = self.shared.consumers.write().remove(key);
        if removed.is_some() {
            debug!(thread = %self.shared.address, consumer = %key, "unregistered consumer");
        }
        removed
    }

    /// Returns `true` if a consumer is registered under `key`.
    pub fn has_consumer(&self, key: &ConsumerKey) -> bool {
        self.shared.consumers.read().contains_key(key)
    }

    fn stopped(&self) -> DispatchError {
        DispatchError::ThreadStopped {
            thread: self.shared.address.clone(),
        }
    }

    fn dispatch(&self, event: Box<dyn Event>, runtime: &Arc<Runtime>) {
        match event.target() {
            EventTarget::Itself => event.process(runtime),
            EventTarget::Consumer(key) => {
                // Lock released before the consumer runs; consumers may
                // register or unregister themselves.
                let consumer = self.shared.consumers.read().get(&key).cloned();
                match consumer {
                    Some(consumer) => consumer.consume(&*event, runtime),
                    None => {
                        self.shared.metrics.record_event_undelivered();
                        debug!(
                            thread = %self.shared.address,
                            consumer = %key,
                            event = event.class_name(),
                            "no consumer for event"
                        );
                        event.undelivered(runtime);
                    }
                }
            }
            EventTarget::Broadcast => {
                let consumers: Vec<_> = self
                    .shared
                    .consumers
                    .read()
                    .iter()
                    .filter_map(|(key, consumer)| match key {
                        ConsumerKey::Class(class) if event.is_instance_of(class) => {
                            Some(consumer.clone())
                        }
                        _ => None,
                    })
                    .collect();
                if consumers.is_empty() {
                    self.shared.metrics.record_event_undelivered();
                    event.undelivered(runtime);
                    return;
                }
                for consumer in consumers {
                    consumer.consume(&*event, runtime);
                }
            }
        }
        self.shared.metrics.record_event_processed();
    }
}

impl fmt::Debug for DispatcherHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherHandle")
            .field("address", &self.shared.address)
            .field("running", &self.is_running())
            .field("queue_depth", &self.queue_depth())
            .field("consumers", &self.shared.consumers.read().len())
            .finish()
    }
}

/// Owner of a running dispatcher thread.
///
/// Dropping the owner stops the thread: events already queued are
/// processed, then the thread exits and is joined.
pub struct DispatcherThread {
    handle: DispatcherHandle,
    join: Option<JoinHandle<()>>,
    runtime: Weak<Runtime>,
    shutdown_timeout: Duration,
}

impl DispatcherThread {
    /// Starts a dispatcher thread and registers it with the runtime.
    ///
    /// # Errors
    ///
    /// Fails if the name is invalid or taken, or if the OS cannot start
    /// the thread.
    pub fn spawn(runtime: &Arc<Runtime>, name: &str) -> Result<Self, DispatchError> {
        if !is_valid_name(name) {
            return Err(DispatchError::InvalidName {
                name: name.to_string(),
            });
        }
        let address = ThreadAddress::new(name);
        let (sender, receiver) = mpsc::unbounded_channel();
        let shared = Arc::new(DispatcherShared {
            address: address.clone(),
            sender,
            consumers: RwLock::new(HashMap::new()),
            depth: AtomicUsize::new(0),
            running: AtomicBool::new(true),
            warning_threshold: runtime.config().queue_warning_threshold,
            metrics: runtime.metrics().dispatch.clone(),
        });
        let handle = DispatcherHandle {
            shared: shared.clone(),
        };
        runtime.threads().register(handle.clone())?;

        let weak = Arc::downgrade(runtime);
        let join = std::thread::Builder::new()
            .name(address.name().to_string())
            .spawn(move || run(shared, receiver, weak));
        let join = match join {
            Ok(join) => join,
            Err(source) => {
                runtime.threads().unregister(&address);
                return Err(DispatchError::SpawnFailed {
                    name: name.to_string(),
                    source,
                });
            }
        };
        runtime.metrics().dispatch.record_thread_started();
        debug!(thread = %address, "dispatcher thread spawned");

        Ok(Self {
            handle,
            join: Some(join),
            runtime: Arc::downgrade(runtime),
            shutdown_timeout: runtime.config().shutdown_timeout,
        })
    }

    /// Returns a handle to the thread.
    pub fn handle(&self) -> &DispatcherHandle {
        &self.handle
    }

    /// Returns the thread address.
    pub fn address(&self) -> &ThreadAddress {
        self.handle.address()
    }

    /// Stops accepting events, drains the queue and joins the thread.
    ///
    /// Joining is skipped when called from the thread itself, and gives up
    /// after the configured shutdown timeout.
    pub fn stop(&mut self) {
        let Some(join) = self.join.take() else {
            return;
        };
        if self.handle.shared.running.swap(false, Ordering::AcqRel) {
            // Exit marker queued after every event already accepted.
            let _ = self.handle.shared.sender.send(QueueItem::Exit);
        }
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.threads().unregister(self.handle.address());
            runtime.metrics().dispatch.record_thread_stopped();
        }
        if join.thread().id() == std::thread::current().id() {
            return;
        }
        let deadline = Instant::now() + self.shutdown_timeout;
        while !join.is_finished() {
            if Instant::now() >= deadline {
                warn!(thread = %self.handle.address(), "dispatcher thread did not stop in time");
                return;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        if join.join().is_err() {
            error!(thread = %self.handle.address(), "dispatcher thread panicked");
        }
    }
}

impl Drop for DispatcherThread {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for DispatcherThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherThread")
            .field("handle", &self.handle)
            .field("joined", &self.join.is_none())
            .finish()
    }
}

fn run(
    shared: Arc<DispatcherShared>,
    mut receiver: mpsc::UnboundedReceiver<QueueItem>,
    runtime: Weak<Runtime>,
) {
    let handle = DispatcherHandle { shared };
    CURRENT.with(|current| *current.borrow_mut() = Some(handle.clone()));
    let span = tracing::debug_span!("dispatcher", thread = %handle.address());
    let _entered = span.enter();
    debug!("dispatcher thread started");

    while let Some(item) = receiver.blocking_recv() {
        let event = match item {
            QueueItem::Event(event) => event,
            QueueItem::Exit => break,
        };
        handle.shared.depth.fetch_sub(1, Ordering::Relaxed);
        let Some(runtime) = runtime.upgrade() else {
            debug!("runtime released, leaving dispatch loop");
            break;
        };
        let class = event.class_name();
        let outcome = catch_unwind(AssertUnwindSafe(|| handle.dispatch(event, &runtime)));
        if outcome.is_err() {
            error!(event = class, "event handler panicked");
        }
    }

    handle.shared.running.store(false, Ordering::Release);
    let consumers = std::mem::take(&mut *handle.shared.consumers.write());
    drop(consumers);
    CURRENT.with(|current| current.borrow_mut().take());
    debug!("dispatcher thread stopped");
}
