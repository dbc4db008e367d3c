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

//! Metrics and structured error logging.
//!
//! Every [`Runtime`](crate::Runtime) owns a [`RuntimeMetrics`] with atomic
//! counters for its dispatcher threads, proxies and stubs. The counters are
//! always maintained; enabling the `observability` feature additionally
//! forwards them to the `metrics` crate so any installed recorder can
//! export them.
//!
//! Logging goes through `tracing`. Install a subscriber to see it:
//!
//! ```rust,ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
//!     .init();
//! ```

mod metrics;

pub use self::metrics::{DispatchMetrics, ProxyMetrics, RuntimeMetrics, StubMetrics};

use crate::AregError;
use std::sync::atomic::{AtomicU64, Ordering};

/// Error counters by layer.
#[derive(Debug, Default)]
pub struct ErrorMetrics {
    dispatch_errors: AtomicU64,
    component_errors: AtomicU64,
    service_errors: AtomicU64,
    proxy_errors: AtomicU64,
    stub_errors: AtomicU64,
    application_errors: AtomicU64,
    recoverable_errors: AtomicU64,
}

impl ErrorMetrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts an error under its layer.
    pub fn record_error(&self, error: &AregError) {
        let counter = match error {
            AregError::Config(_) | AregError::Dispatch(_) => &self.dispatch_errors,
            AregError::Component(_) => &self.component_errors,
            AregError::Interface(_) | AregError::Service(_) => &self.service_errors,
            AregError::Proxy(_) => &self.proxy_errors,
            AregError::Stub(_) => &self.stub_errors,
            AregError::Application(_) => &self.application_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if error.is_recoverable() {
            self.recoverable_errors.fetch_add(1, Ordering::Relaxed);
        }

        #[cfg(feature = "observability")]
        {
            ::metrics::counter!("areg.errors.total", "code" => error.code()).increment(1);
            if error.is_recoverable() {
                ::metrics::counter!("areg.errors.recoverable").increment(1);
            }
        }
    }

    /// Returns the number of dispatcher errors.
    #[must_use]
    pub fn dispatch_errors(&self) -> u64 {
        self.dispatch_errors.load(Ordering::Relaxed)
    }

    /// Returns the number of component errors.
    #[must_use]
    pub fn component_errors(&self) -> u64 {
        self.component_errors.load(Ordering::Relaxed)
    }

    /// Returns the number of interface and service errors.
    #[must_use]
    pub fn service_errors(&self) -> u64 {
        self.service_errors.load(Ordering::Relaxed)
    }

    /// Returns the number of proxy errors.
    #[must_use]
    pub fn proxy_errors(&self) -> u64 {
        self.proxy_errors.load(Ordering::Relaxed)
    }

    /// Returns the number of stub errors.
    #[must_use]
    pub fn stub_errors(&self) -> u64 {
        self.stub_errors.load(Ordering::Relaxed)
    }

    /// Returns the number of application errors.
    #[must_use]
    pub fn application_errors(&self) -> u64 {
        self.application_errors.load(Ordering::Relaxed)
    }

    /// Returns the number of recoverable errors.
    #[must_use]
    pub fn recoverable_errors(&self) -> u64 {
        self.recoverable_errors.load(Ordering::Relaxed)
    }

    /// Returns the number of errors of every layer.
    #[must_use]
    pub fn total_errors(&self) -> u64 {
        self.dispatch_errors()
            + self.component_errors()
            + self.service_errors()
            + self.proxy_errors()
            + self.stub_errors()
            + self.application_errors()
    }
}

/// Logs an error with structured fields.
///
/// Recoverable errors log at `WARN`, application errors at `INFO` and
/// everything else at `ERROR`.
pub fn log_error(error: &AregError) {
    let recoverable = error.is_recoverable();
    if error.is_application_error() {
        tracing::info!(error = %error, code = error.code(), "application error");
    } else if recoverable {
        tracing::warn!(error = %error, code = error.code(), recoverable, "runtime error");
    } else {
        tracing::error!(error = %error, code = error.code(), recoverable, "runtime error");
    }
}
