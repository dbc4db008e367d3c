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

//! Per-thread event dispatching.
//!
//! A [`DispatcherThread`] owns one OS thread and one FIFO event queue. Any
//! thread may post an [`Event`] to it through a [`DispatcherHandle`]; the
//! dispatcher thread pops events in order and hands each one to the
//! [`EventConsumer`] registered under the event's [`ConsumerKey`], to every
//! class consumer for broadcasts, or to the event itself.
//!
//! Components, stubs and proxies all live on a dispatcher thread, so their
//! handlers never run concurrently with each other.
//!
//! # Examples
//!
//! ```rust
//! use areg::dispatcher::DispatcherThread;
//! use areg::{Runtime, RuntimeConfig};
//! use std::sync::mpsc;
//! use std::time::Duration;
//!
//! let runtime = Runtime::new(RuntimeConfig::default()).unwrap();
//! let thread = DispatcherThread::spawn(&runtime, "Worker").unwrap();
//!
//! let (sender, receiver) = mpsc::channel();
//! thread
//!     .handle()
//!     .post_task(move |_| sender.send(areg::dispatcher::current_thread()).unwrap())
//!     .unwrap();
//! let seen = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
//! assert_eq!(seen.as_ref(), Some(thread.address()));
//! ```

mod error;
mod event;
mod registry;
mod thread;

pub use self::error::DispatchError;
pub use self::event::{ConsumerKey, Event, EventConsumer, EventTarget, TaskEvent};
pub use self::registry::ThreadRegistry;
pub use self::thread::{DispatcherHandle, DispatcherThread, current, current_thread};
