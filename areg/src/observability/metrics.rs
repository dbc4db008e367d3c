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

//! Counters for dispatcher threads, proxies and stubs.
//!
//! Counters are plain atomics and always available. With the
//! `observability` feature each update is also forwarded to the `metrics`
//! crate under an `areg.` prefix.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for dispatcher threads and their queues.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    threads_started: AtomicU64,
    threads_stopped: AtomicU64,
    events_posted: AtomicU64,
    events_processed: AtomicU64,
    events_undelivered: AtomicU64,
}

impl DispatchMetrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a dispatcher thread start.
    pub fn record_thread_started(&self) {
        self.threads_started.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        {
            metrics::counter!("areg.dispatch.threads.started").increment(1);
            metrics::gauge!("areg.dispatch.threads.active").increment(1.0);
        }
    }

    /// Records a dispatcher thread stop.
    pub fn record_thread_stopped(&self) {
        self.threads_stopped.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        {
            metrics::counter!("areg.dispatch.threads.stopped").increment(1);
            metrics::gauge!("areg.dispatch.threads.active").decrement(1.0);
        }
    }

    /// Records an event accepted by a queue.
    pub fn record_event_posted(&self) {
        self.events_posted.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("areg.dispatch.events.posted").increment(1);
    }

    /// Records an event handed to its consumer.
    pub fn record_event_processed(&self) {
        self.events_processed.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("areg.dispatch.events.processed").increment(1);
    }

    /// Records an event that found no consumer.
    pub fn record_event_undelivered(&self) {
        self.events_undelivered.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("areg.dispatch.events.undelivered").increment(1);
    }

    /// Returns the number of running dispatcher threads.
    #[must_use]
    pub fn active_threads(&self) -> u64 {
        let started = self.threads_started.load(Ordering::Relaxed);
        let stopped = self.threads_stopped.load(Ordering::Relaxed);
        started.saturating_sub(stopped)
    }

    /// Returns the number of events posted.
    #[must_use]
    pub fn total_events_posted(&self) -> u64 {
        self.events_posted.load(Ordering::Relaxed)
    }

    /// Returns the number of events processed.
    #[must_use]
    pub fn total_events_processed(&self) -> u64 {
        self.events_processed.load(Ordering::Relaxed)
    }

    /// Returns the number of events without a consumer.
    #[must_use]
    pub fn total_events_undelivered(&self) -> u64 {
        self.events_undelivered.load(Ordering::Relaxed)
    }
}

/// Counters for the consumer side of services.
#[derive(Debug, Default)]
pub struct ProxyMetrics {
    proxies_created: AtomicU64,
    proxies_released: AtomicU64,
    requests_sent: AtomicU64,
    requests_rejected: AtomicU64,
    responses_processed: AtomicU64,
    request_failures: AtomicU64,
    requests_expired: AtomicU64,
    notifications_posted: AtomicU64,
    protocol_errors: AtomicU64,
}

impl ProxyMetrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new proxy.
    pub fn record_proxy_created(&self) {
        self.proxies_created.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::gauge!("areg.proxy.active").increment(1.0);
    }

    /// Records the release of a proxy's last client.
    pub fn record_proxy_released(&self) {
        self.proxies_released.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::gauge!("areg.proxy.active").decrement(1.0);
    }

    /// Records a request handed to the stub's thread.
    pub fn record_request_sent(&self) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("areg.proxy.requests.sent").increment(1);
    }

    /// Records a request refused because the service was unavailable.
    pub fn record_request_rejected(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("areg.proxy.requests.rejected").increment(1);
    }

    /// Records a processed response or update.
    pub fn record_response_processed(&self) {
        self.responses_processed.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("areg.proxy.responses.processed").increment(1);
    }

    /// Records a request that resolved with a failure result.
    pub fn record_request_failure(&self) {
        self.request_failures.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("areg.proxy.requests.failed").increment(1);
    }

    /// Records a request resolved by the watchdog.
    pub fn record_request_expired(&self) {
        self.requests_expired.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("areg.proxy.requests.expired").increment(1);
    }

    /// Records a notification queued for a listener.
    pub fn record_notification_posted(&self) {
        self.notifications_posted.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("areg.proxy.notifications").increment(1);
    }

    /// Records an event the proxy could not interpret.
    pub fn record_protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("areg.proxy.errors.protocol").increment(1);
    }

    /// Returns the number of live proxies.
    #[must_use]
    pub fn active_proxies(&self) -> u64 {
        let created = self.proxies_created.load(Ordering::Relaxed);
        let released = self.proxies_released.load(Ordering::Relaxed);
        created.saturating_sub(released)
    }

    /// Returns the number of requests sent.
    #[must_use]
    pub fn total_requests_sent(&self) -> u64 {
        self.requests_sent.load(Ordering::Relaxed)
    }

    /// Returns the number of requests refused while disconnected.
    #[must_use]
    pub fn total_requests_rejected(&self) -> u64 {
        self.requests_rejected.load(Ordering::Relaxed)
    }

    /// Returns the number of processed responses and updates.
    #[must_use]
    pub fn total_responses_processed(&self) -> u64 {
        self.responses_processed.load(Ordering::Relaxed)
    }

    /// Returns the number of failed requests.
    #[must_use]
    pub fn total_request_failures(&self) -> u64 {
        self.request_failures.load(Ordering::Relaxed)
    }

    /// Returns the number of requests resolved by the watchdog.
    #[must_use]
    pub fn total_requests_expired(&self) -> u64 {
        self.requests_expired.load(Ordering::Relaxed)
    }

    /// Returns the number of queued notifications.
    #[must_use]
    pub fn total_notifications_posted(&self) -> u64 {
        self.notifications_posted.load(Ordering::Relaxed)
    }

    /// Returns the number of protocol errors.
    #[must_use]
    pub fn total_protocol_errors(&self) -> u64 {
        self.protocol_errors.load(Ordering::Relaxed)
    }
}

/// Counters for the provider side of services.
#[derive(Debug, Default)]
pub struct StubMetrics {
    requests_received: AtomicU64,
    responses_sent: AtomicU64,
    requests_undelivered: AtomicU64,
    attribute_updates: AtomicU64,
    broadcasts_sent: AtomicU64,
}

impl StubMetrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a request reaching a stub handler.
    pub fn record_request_received(&self) {
        self.requests_received.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("areg.stub.requests.received").increment(1);
    }

    /// Records a response posted to a proxy.
    pub fn record_response_sent(&self) {
        self.responses_sent.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("areg.stub.responses.sent").increment(1);
    }

    /// Records a request answered with `MessageUndelivered`.
    pub fn record_request_undelivered(&self) {
        self.requests_undelivered.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("areg.stub.requests.undelivered").increment(1);
    }

    /// Records an attribute change.
    pub fn record_attribute_update(&self) {
        self.attribute_updates.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("areg.stub.attributes.updated").increment(1);
    }

    /// Records a broadcast.
    pub fn record_broadcast(&self) {
        self.broadcasts_sent.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("areg.stub.broadcasts").increment(1);
    }

    /// Returns the number of requests received.
    #[must_use]
    pub fn total_requests_received(&self) -> u64 {
        self.requests_received.load(Ordering::Relaxed)
    }

    /// Returns the number of responses sent.
    #[must_use]
    pub fn total_responses_sent(&self) -> u64 {
        self.responses_sent.load(Ordering::Relaxed)
    }

    /// Returns the number of requests answered with `MessageUndelivered`.
    #[must_use]
    pub fn total_requests_undelivered(&self) -> u64 {
        self.requests_undelivered.load(Ordering::Relaxed)
    }

    /// Returns the number of attribute changes.
    #[must_use]
    pub fn total_attribute_updates(&self) -> u64 {
        self.attribute_updates.load(Ordering::Relaxed)
    }

    /// Returns the number of broadcasts.
    #[must_use]
    pub fn total_broadcasts(&self) -> u64 {
        self.broadcasts_sent.load(Ordering::Relaxed)
    }
}

/// Every counter owned by one runtime.
#[derive(Debug, Default)]
pub struct RuntimeMetrics {
    /// Dispatcher threads; shared with each thread.
    pub dispatch: Arc<DispatchMetrics>,
    /// Proxies
    pub proxy: ProxyMetrics,
    /// Stubs
    pub stub: StubMetrics,
    /// Errors reported through [`log_error`](crate::observability::log_error)
    pub errors: super::ErrorMetrics,
}
