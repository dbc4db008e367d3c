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

//! Timeout of requests that never receive a response.

use crate::context::Runtime;
use parking_lot::{Condvar, Mutex};
use std::io;
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct Signal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// Background thread resolving overdue requests as `MessageUndelivered`.
///
/// Each tick scans the pending requests of every proxy. Expired ones are
/// answered by an event posted to the proxy's own thread, so the proxy
/// still resolves them in order with everything else it receives.
#[derive(Debug)]
pub(crate) struct Watchdog {
    signal: Arc<Signal>,
    join: Option<JoinHandle<()>>,
}

impl Watchdog {
    pub(crate) fn start(runtime: Weak<Runtime>, interval: Duration, timeout: Duration) -> io::Result<Self> {
        let signal = Arc::new(Signal::default());
        let shared = signal.clone();
        let join = std::thread::Builder::new()
            .name("areg-watchdog".to_string())
            .spawn(move || run(&shared, &runtime, interval, timeout))?;
        debug!(?interval, ?timeout, "request watchdog started");
        Ok(Self {
            signal,
            join: Some(join),
        })
    }

    pub(crate) fn stop(&mut self) {
        *self.signal.stopped.lock() = true;
        self.signal.wake.notify_all();
        let Some(join) = self.join.take() else {
            return;
        };
        if join.thread().id() != std::thread::current().id() {
            let _ = join.join();
        }
        debug!("request watchdog stopped");
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(signal: &Signal, runtime: &Weak<Runtime>, interval: Duration, timeout: Duration) {
    loop {
        {
            let mut stopped = signal.stopped.lock();
            if *stopped {
                return;
            }
            signal.wake.wait_for(&mut stopped, interval);
            if *stopped {
                return;
            }
        }
        let Some(runtime) = runtime.upgrade() else {
            return;
        };
        let expired: usize = runtime
            .proxies()
            .all()
            .iter()
            .map(|proxy| proxy.expire_requests(timeout))
            .sum();
        if expired > 0 {
            trace!(expired, "requests timed out");
        }
    }
}
