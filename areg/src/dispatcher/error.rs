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

//! Dispatcher error types.

use crate::address::ThreadAddress;
use std::io;
use thiserror::Error;

/// Errors raised by dispatcher threads and the thread registry.
///
/// # Examples
///
/// ```rust
/// use areg::address::ThreadAddress;
/// use areg::dispatcher::DispatchError;
///
/// let error = DispatchError::ThreadStopped {
///     thread: ThreadAddress::with_process("Worker", 1),
/// };
/// assert!(!error.is_recoverable());
/// assert_eq!(error.to_string(), "dispatcher thread Worker@1 is not running");
/// ```
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The target thread has stopped and no longer accepts events.
    #[error("dispatcher thread {thread} is not running")]
    ThreadStopped {
        /// Address of the stopped thread
        thread: ThreadAddress,
    },

    /// No dispatcher thread with that name or address is registered.
    #[error("dispatcher thread {thread} not found")]
    ThreadNotFound {
        /// Name or path that was looked up
        thread: String,
    },

    /// A dispatcher thread with the same name is already registered.
    #[error("dispatcher thread name '{name}' is already registered")]
    DuplicateThread {
        /// The duplicated name
        name: String,
    },

    /// The name cannot be used for a dispatcher thread.
    #[error("invalid dispatcher thread name '{name}'")]
    InvalidName {
        /// The rejected name
        name: String,
    },

    /// A consumer is already registered under the same key.
    #[error("consumer {key} is already registered on {thread}")]
    ConsumerExists {
        /// Display form of the consumer key
        key: String,
        /// Thread holding the registration
        thread: ThreadAddress,
    },

    /// The operating system refused to start the thread.
    #[error("failed to spawn dispatcher thread '{name}': {source}")]
    SpawnFailed {
        /// Requested thread name
        name: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl DispatchError {
    /// Returns `true` if retrying the operation later may succeed.
    ///
    /// A missing thread may simply not have been started yet.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::ThreadNotFound { .. })
    }

    /// Returns a short, stable code for log fields.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ThreadStopped { .. } => "thread_stopped",
            Self::ThreadNotFound { .. } => "thread_not_found",
            Self::DuplicateThread { .. } => "duplicate_thread",
            Self::InvalidName { .. } => "invalid_name",
            Self::ConsumerExists { .. } => "consumer_exists",
            Self::SpawnFailed { .. } => "spawn_failed",
        }
    }
}
