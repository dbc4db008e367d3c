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

#![doc = include_str!("../../README.md")]
#![allow(clippy::module_inception)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! ## Architecture
//!
//! The crate is organized in layers, each building on the ones above it:
//!
//! - **[`runtime`]**: run-time class identity and checked downcasts
//! - **[`address`]**: thread and component addresses with stable path forms
//! - **[`dispatcher`]**: event queues and the threads that drain them
//! - **[`service`]**: interface tables, service events and stub/proxy matchmaking
//! - **[`serialization`]**: length-framed payload streams
//! - **[`stub`]**: the provider side of a service
//! - **[`proxy`]**: the consumer side of a service
//! - **[`component`]**: components, their directory and model loading
//! - **[`observability`]**: counters and error logging
//!
//! Every directory lives in a [`Runtime`] context. Runtimes are independent
//! of each other, so tests can run several side by side.
//!
//! ## Features
//!
//! - **`observability`**: Export the built-in counters through the
//!   [`metrics`](https://docs.rs/metrics) facade
//!
//! ## Error Handling
//!
//! Each layer has its own error type, collected into [`AregError`]:
//!
//! - [`DispatchError`](dispatcher::DispatchError): posting to stopped or unknown threads
//! - [`ComponentError`](component::ComponentError): loading and registration
//! - [`ProxyError`](proxy::ProxyError): refused requests and protocol violations
//! - [`StubError`](stub::StubError): misuse of the provider API
//!
//! Failures of individual requests are not errors of the caller. They
//! arrive as notifications carrying a failure [`ResultType`](service::ResultType).
//!
//! ## Safety
//!
//! The crate is written in 100% safe Rust with `#![deny(unsafe_code)]`.

pub mod address;
pub mod component;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod observability;
pub mod proxy;
pub mod runtime;
pub mod serialization;
pub mod service;
pub mod stub;

pub use config::RuntimeConfig;
pub use context::Runtime;
pub use error::AregError;
pub use observability::{ErrorMetrics, RuntimeMetrics, log_error};
