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

//! Runtime configuration.

use std::time::Duration;

/// Configuration for a [`Runtime`](crate::Runtime).
///
/// # Examples
///
/// ```rust
/// use areg::RuntimeConfig;
/// use std::time::Duration;
///
/// let config = RuntimeConfig::new()
///     .with_name("calculator")
///     .with_request_timeout(Some(Duration::from_secs(2)));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Label used in log output.
    ///
    /// Default: None
    pub name: Option<String>,

    /// Time after which a request without a response resolves as
    /// `MessageUndelivered`. `None` disables the request watchdog.
    ///
    /// Default: None
    pub request_timeout: Option<Duration>,

    /// How often the request watchdog scans pending requests.
    ///
    /// Default: 50 milliseconds
    pub watchdog_interval: Duration,

    /// Upper bound on waiting for a dispatcher thread to exit on shutdown.
    ///
    /// Default: 5 seconds
    pub shutdown_timeout: Duration,

    /// Queue depth above which a dispatcher thread logs a warning.
    ///
    /// Default: 1024
    pub queue_warning_threshold: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            name: None,
            request_timeout: None,
            watchdog_interval: Duration::from_millis(50),
            shutdown_timeout: Duration::from_secs(5),
            queue_warning_threshold: 1024,
        }
    }
}

impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("name", &self.name.as_deref().unwrap_or("<unnamed>"))
            .field("request_timeout", &self.request_timeout)
            .field("watchdog_interval", &self.watchdog_interval)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("queue_warning_threshold", &self.queue_warning_threshold)
            .finish()
    }
}

impl RuntimeConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime label.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Enables or disables the request watchdog.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the watchdog scan interval.
    pub fn with_watchdog_interval(mut self, interval: Duration) -> Self {
        self.watchdog_interval = interval;
        self
    }

    /// Sets the shutdown bound for dispatcher threads.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Sets the queue depth warning threshold.
    pub fn with_queue_warning_threshold(mut self, threshold: usize) -> Self {
        self.queue_warning_threshold = threshold;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The request timeout is zero
    /// - The watchdog interval is zero
    /// - The shutdown timeout is zero
    /// - The queue warning threshold is zero
    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err("request_timeout must be greater than 0".to_string());
        }
        if self.watchdog_interval.is_zero() {
            return Err("watchdog_interval must be greater than 0".to_string());
        }
        if self.shutdown_timeout.is_zero() {
            return Err("shutdown_timeout must be greater than 0".to_string());
        }
        if self.queue_warning_threshold == 0 {
            return Err("queue_warning_threshold must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Returns the label used in log output.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("areg")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RuntimeConfig::default();
        assert_eq!(config.name, None);
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.watchdog_interval, Duration::from_millis(50));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(config.queue_warning_threshold, 1024);
        assert_eq!(config.display_name(), "areg");
    }

    #[test]
    fn test_builder_pattern() {
        let config = RuntimeConfig::new()
            .with_name("calc")
            .with_request_timeout(Some(Duration::from_millis(200)))
            .with_watchdog_interval(Duration::from_millis(10))
            .with_shutdown_timeout(Duration::from_secs(1))
            .with_queue_warning_threshold(16);

        assert_eq!(config.display_name(), "calc");
        assert_eq!(config.request_timeout, Some(Duration::from_millis(200)));
        assert_eq!(config.watchdog_interval, Duration::from_millis(10));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
        assert_eq!(config.queue_warning_threshold, 16);
    }

    #[test]
    fn test_validate() {
        assert!(RuntimeConfig::default().validate().is_ok());

        let zero_timeout = RuntimeConfig::new().with_request_timeout(Some(Duration::ZERO));
        assert!(zero_timeout.validate().is_err());

        let zero_interval = RuntimeConfig::new().with_watchdog_interval(Duration::ZERO);
        assert!(zero_interval.validate().is_err());

        let zero_shutdown = RuntimeConfig::new().with_shutdown_timeout(Duration::ZERO);
        assert!(zero_shutdown.validate().is_err());

        let zero_threshold = RuntimeConfig::new().with_queue_warning_threshold(0);
        assert!(zero_threshold.validate().is_err());
    }

    #[test]
    fn test_debug_output() {
        let debug = format!("{:?}", RuntimeConfig::new().with_name("calc"));
        assert!(debug.contains("RuntimeConfig"));
        assert!(debug.contains("calc"));
    }
}
