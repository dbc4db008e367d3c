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

//! # Calculator Example
//!
//! A `Calc` service runs on its own dispatcher thread. A client component on
//! a second thread connects through a proxy, sends requests, and watches the
//! running total the service publishes as an attribute.
//!
//! ## What it shows
//!
//! - Describing a service interface with requests, responses, an attribute
//!   and a broadcast
//! - Loading components from a model
//! - Answering requests immediately and deferring one until later
//! - Receiving responses, attribute updates and failures as notifications
//!
//! ## Running
//!
//! ```bash
//! RUST_LOG=areg=debug cargo run --example calculator
//! ```

use areg::component::{Component, ComponentEntry, DependencyEntry, ModelLoader, ServiceEntry};
use areg::proxy::{Notification, PayloadCache, ProxyBase, ProxyData, ProxyListener};
use areg::serialization::{InStream, OutStream};
use areg::service::{MessageId, ResultType, ServiceConnection, ServiceInterface, Version};
use areg::stub::{RequestOutcome, StubBase, StubContext, StubHandler};
use areg::{Runtime, RuntimeConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

const ADD: MessageId = MessageId::new(1);
const ADDED: MessageId = MessageId::new(2);
const DIVIDE: MessageId = MessageId::new(3);
const DIVIDED: MessageId = MessageId::new(4);
const CLEAR: MessageId = MessageId::new(5);
const TOTAL: MessageId = MessageId::new(10);
const CLEARED: MessageId = MessageId::new(20);

const VERSION: Version = Version::new(1, 0, 0);

fn calc_interface() -> Arc<ServiceInterface> {
    ServiceInterface::builder("Calc", VERSION)
        .request(ADD.as_u32(), Some(ADDED.as_u32()))
        .response(ADDED.as_u32())
        .request(DIVIDE.as_u32(), Some(DIVIDED.as_u32()))
        .response(DIVIDED.as_u32())
        .request(CLEAR.as_u32(), None)
        .attribute(TOTAL.as_u32())
        .broadcast(CLEARED.as_u32())
        .build()
        .expect("calculator interface")
}

/// Service implementation: keeps a running total of every sum.
#[derive(Default)]
struct Calculator {
    total: AtomicU64,
}

impl Calculator {
    fn publish(&self, ctx: &StubContext<'_>, total: u64) {
        if let Ok(payload) = OutStream::single(&total) {
            let _ = ctx.stub().set_attribute(TOTAL, payload);
        }
    }
}

impl StubHandler for Calculator {
    fn process_request(&self, ctx: &StubContext<'_>, request_id: MessageId, stream: &mut InStream<'_>) -> RequestOutcome {
        match request_id {
            ADD => {
                let (Ok(a), Ok(b)) = (stream.read::<u64>(), stream.read::<u64>()) else {
                    return RequestOutcome::Failed(ResultType::RequestError);
                };
                let sum = a + b;
                let total = self.total.fetch_add(sum, Ordering::Relaxed) + sum;
                self.publish(ctx, total);
                RequestOutcome::respond_with(&sum)
            }
            DIVIDE => match (stream.read::<u64>(), stream.read::<u64>()) {
                (Ok(_), Ok(0)) => RequestOutcome::Failed(ResultType::RequestError),
                (Ok(a), Ok(b)) => RequestOutcome::respond_with(&(a / b)),
                _ => RequestOutcome::Failed(ResultType::RequestError),
            },
            CLEAR => {
                self.total.store(0, Ordering::Relaxed);
                self.publish(ctx, 0);
                if let Ok(payload) = OutStream::single(&()) {
                    let _ = ctx.stub().broadcast(CLEARED, payload);
                }
                RequestOutcome::Done
            }
            _ => RequestOutcome::Failed(ResultType::RequestError),
        }
    }

    fn client_connected(&self, stub: &Arc<StubBase>, proxy: &areg::service::ProxyAddress, connected: bool) {
        tracing::info!(service = stub.service_name(), %proxy, connected, "client changed");
    }
}

/// Client side: prints everything the proxy reports.
struct PanelView {
    events: Mutex<mpsc::Sender<String>>,
}

impl PanelView {
    fn report(&self, line: String) {
        println!("  {line}");
        let _ = self.events.lock().map(|events| events.send(line));
    }
}

impl ProxyListener for PanelView {
    fn on_service_connected(&self, proxy: &Arc<ProxyBase>, status: ServiceConnection) {
        self.report(format!("{} is {status}", proxy.address()));
    }

    fn on_notification(&self, proxy: &Arc<ProxyBase>, notification: &Notification) {
        let value = proxy
            .read_data(|data: &PayloadCache| data.get::<u64>(notification.msg_id()))
            .flatten()
            .and_then(Result::ok);
        let line = match (notification.msg_id(), value) {
            (ADDED, Some(sum)) => format!("sum = {sum}"),
            (DIVIDED, Some(quotient)) => format!("quotient = {quotient}"),
            (TOTAL, Some(total)) => format!("total = {total}"),
            (CLEARED, _) => "total cleared".to_string(),
            (id, _) => format!("message {id}: {} ({})", notification.result(), notification.state()),
        };
        self.report(line);
    }
}

fn cache(interface: &ServiceInterface) -> Box<dyn ProxyData> {
    Box::new(PayloadCache::new(interface))
}

fn args(a: u64, b: u64) -> Vec<u8> {
    let mut stream = OutStream::new();
    stream
        .write(&a)
        .and_then(|stream| stream.write(&b))
        .expect("u64 arguments serialize");
    stream.into_bytes()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== AREG Calculator Example ===\n");

    let runtime = Runtime::new(
        RuntimeConfig::new()
            .with_name("calculator")
            .with_request_timeout(Some(Duration::from_secs(2))),
    )?;
    let interface = calc_interface();

    let provided = interface.clone();
    let model = ModelLoader::new()
        .with_entry(
            ComponentEntry::new("Calc", "CalcThread", move |ctx| {
                let component = Component::new(ctx.address().clone());
                let stub = StubBase::new(
                    ctx.runtime(),
                    ctx.address(),
                    provided.clone(),
                    Arc::new(Calculator::default()),
                );
                component.register_server_item(stub);
                Ok(component)
            })
            .with_service(ServiceEntry::new("Calc", VERSION)),
        )
        .with_entry(
            ComponentEntry::new("Panel", "PanelThread", |ctx| Ok(Component::new(ctx.address().clone())))
                .with_dependency(DependencyEntry::new("Calc", ServiceEntry::new("Calc", VERSION))),
        )
        .load(&runtime)?;
    println!("Loaded {} components", model.len());

    let panel = runtime
        .components()
        .find_by_name("Panel")
        .ok_or("panel component missing")?;
    let (sender, events) = mpsc::channel();
    let display: Arc<dyn ProxyListener> = Arc::new(PanelView {
        events: Mutex::new(sender),
    });
    let proxy = ProxyBase::find_or_create(
        &runtime,
        "Calc",
        &interface,
        display.clone(),
        cache,
        panel.address().thread(),
    )?;
    let next = || events.recv_timeout(Duration::from_secs(5));
    next()?;

    println!("\nSubscribing to the total and sums");
    proxy.set_notification(TOTAL, display.clone(), true)?;
    proxy.set_notification(ADDED, display.clone(), false)?;
    proxy.set_notification(CLEARED, display.clone(), false)?;
    next()?;

    println!("\nAdding");
    for (a, b) in [(2, 3), (10, 20)] {
        proxy.send_request(ADD, args(a, b), None)?;
        next()?;
        next()?;
    }

    println!("\nDividing");
    proxy.send_request(DIVIDE, args(84, 2), Some(display.clone()))?;
    next()?;
    proxy.send_request(DIVIDE, args(1, 0), Some(display.clone()))?;
    next()?;

    println!("\nClearing");
    proxy.send_request(CLEAR, Vec::new(), None)?;
    next()?;
    next()?;

    println!("\nShutting down");
    proxy.free_proxy(&display);
    drop(model);
    runtime.shutdown();
    println!("\n=== Example Complete ===");
    Ok(())
}
