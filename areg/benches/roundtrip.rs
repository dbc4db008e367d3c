//! Round-trip benchmarks for AREG
//!
//! Measures:
//! - Request/response latency between two dispatcher threads
//! - Attribute fan-out to several proxies
//! - Payload framing for different value sizes

use areg::component::{Component, ComponentEntry, LoadedModel, ModelLoader};
use areg::proxy::{Notification, PayloadCache, ProxyBase, ProxyData, ProxyListener};
use areg::serialization::{InStream, OutStream};
use areg::service::{MessageId, ResultType, ServiceConnection, ServiceInterface, Version};
use areg::stub::{RequestOutcome, StubBase, StubContext, StubHandler};
use areg::{Runtime, RuntimeConfig};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::sync::{Arc, mpsc};
use std::time::Duration;

const ECHO: MessageId = MessageId::new(1);
const ECHOED: MessageId = MessageId::new(2);

struct Echo;

impl StubHandler for Echo {
    fn process_request(&self, _ctx: &StubContext<'_>, _id: MessageId, stream: &mut InStream<'_>) -> RequestOutcome {
        RequestOutcome::Respond(stream.unread().to_vec())
    }
}

struct Connected(std::sync::Mutex<mpsc::Sender<ServiceConnection>>);

impl ProxyListener for Connected {
    fn on_service_connected(&self, _proxy: &Arc<ProxyBase>, status: ServiceConnection) {
        let _ = self.0.lock().unwrap().send(status);
    }

    fn on_notification(&self, _proxy: &Arc<ProxyBase>, _notification: &Notification) {}
}

fn cache(interface: &ServiceInterface) -> Box<dyn ProxyData> {
    Box::new(PayloadCache::new(interface))
}

/// A loaded echo service and one connected proxy.
fn setup() -> (Arc<Runtime>, LoadedModel, Arc<ProxyBase>) {
    let runtime = Runtime::new(RuntimeConfig::new().with_name("bench")).unwrap();
    let interface = ServiceInterface::builder("Echo", Version::new(1, 0, 0))
        .request(ECHO.as_u32(), Some(ECHOED.as_u32()))
        .response(ECHOED.as_u32())
        .build()
        .unwrap();
    let provided = interface.clone();
    let model = ModelLoader::new()
        .with_entry(ComponentEntry::new("Echo", "Server", move |ctx| {
            let component = Component::new(ctx.address().clone());
            component.register_server_item(StubBase::new(
                ctx.runtime(),
                ctx.address(),
                provided.clone(),
                Arc::new(Echo),
            ));
            Ok(component)
        }))
        .load(&runtime)
        .unwrap();

    let client = runtime.spawn_thread("Client").unwrap();
    let (sender, connected) = mpsc::channel();
    let listener = Arc::new(Connected(std::sync::Mutex::new(sender)));
    let proxy = ProxyBase::find_or_create(&runtime, "Echo", &interface, listener, cache, client.address()).unwrap();
    assert_eq!(
        connected.recv_timeout(Duration::from_secs(5)).unwrap(),
        ServiceConnection::Connected
    );
    (runtime, model, proxy)
}

/// Benchmark request/response round trips
fn bench_request_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_roundtrip");
    let (_runtime, _model, proxy) = setup();
    let rt = tokio::runtime::Runtime::new().unwrap();

    for size in [16usize, 1024, 16 * 1024] {
        let payload = OutStream::single(&vec![0u8; size]).unwrap();
        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(format!("{size}bytes")), &payload, |b, payload| {
            b.to_async(&rt).iter(|| async {
                let (_, outcome) = proxy.send_request_tracked(ECHO, payload.clone()).unwrap();
                let notification = outcome.await.unwrap();
                assert_eq!(notification.result(), ResultType::RequestOk);
            });
        });
    }

    group.finish();
}

/// Benchmark pipelined requests resolved out of a single batch
fn bench_pipelined_requests(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipelined_requests");
    let (_runtime, _model, proxy) = setup();
    let payload = OutStream::single(&42u64).unwrap();

    for batch in [10usize, 100] {
        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch), &batch, |b, &batch| {
            b.iter(|| {
                let outcomes: Vec<_> = (0..batch)
                    .map(|_| proxy.send_request_tracked(ECHO, payload.clone()).unwrap().1)
                    .collect();
                for outcome in outcomes {
                    outcome.blocking_recv().unwrap();
                }
            });
        });
    }

    group.finish();
}

/// Benchmark payload framing
fn bench_payload_framing(c: &mut Criterion) {
    let mut group = c.benchmark_group("payload_framing");

    for size in [16usize, 1024, 16 * 1024] {
        let value = vec![7u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("write", size), &value, |b, value| {
            b.iter(|| OutStream::single(value).unwrap());
        });
        let payload = OutStream::single(&value).unwrap();
        group.bench_with_input(BenchmarkId::new("read", size), &payload, |b, payload| {
            b.iter(|| InStream::new(payload).read::<Vec<u8>>().unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_request_roundtrip,
    bench_pipelined_requests,
    bench_payload_framing
);
criterion_main!(benches);
