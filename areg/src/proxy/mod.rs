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

//! Service consumers.
//!
//! A [`ProxyBase`] represents one service on the thread of its clients.
//! Clients share the proxy, send requests through it and register
//! [`ProxyListener`]s for responses, attribute updates and broadcasts.
//! Every notification is delivered as an event on the listener's own
//! dispatcher thread, so listeners never run concurrently with the
//! other work of that thread.
//!
//! ```rust,ignore
//! let proxy = ProxyBase::find_or_create(&runtime, "Calc", &interface, client, |iface| {
//!     Box::new(PayloadCache::new(iface))
//! }, &thread)?;
//! proxy.set_notification(VALUE, client.clone(), true)?;
//! let (seq, outcome) = proxy.send_request_tracked(INCREMENT, OutStream::single(&10u64)?)?;
//! ```

mod base;
mod data;
mod directory;
mod error;
mod listener;
mod waiter;
mod watchdog;

pub use self::base::ProxyBase;
pub use self::data::{PayloadCache, ProxyData};
pub use self::directory::ProxyDirectory;
pub use self::error::ProxyError;
pub use self::listener::{Notification, NotificationEvent, ProxyListener};
pub use self::waiter::SequenceWaiter;

pub(crate) use self::watchdog::Watchdog;
