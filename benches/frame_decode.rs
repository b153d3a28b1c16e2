//! Inbound frame pipeline benchmarks.
//!
//! - Heartbeat filter on pings and ordinary payloads
//! - Decoding per encoding at several payload sizes
//! - End-to-end listener throughput over the in-memory transport
//!
//! Run with: cargo bench --bench frame_decode
//! Results saved to: target/criterion/

use std::hint::black_box;

use bytes::Bytes;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tokio::runtime::Runtime;

use buoy_client::protocol::heartbeat;
use buoy_client::{Encoding, Listener, ListenerEvent, MemoryTransport};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const PAYLOAD_SIZES: &[usize] = &[16, 1024, 64 * 1024];
const MESSAGE_COUNTS: &[usize] = &[100, 1000];

fn json_payload(size: usize) -> Bytes {
    let filler = "x".repeat(size.saturating_sub(16));
    Bytes::from(format!(r#"{{"data":"{filler}"}}"#))
}

// ============================================================================
// Benchmark: Heartbeat Filter
// ============================================================================

fn bench_heartbeat_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("heartbeat_filter");

    let ping = heartbeat::ping(42);
    group.bench_function("ping", |b| {
        b.iter(|| heartbeat::filter(black_box(ping.clone())));
    });

    let payload = Bytes::from_static(b"an ordinary text payload");
    group.bench_function("payload", |b| {
        b.iter(|| heartbeat::filter(black_box(payload.clone())));
    });

    group.finish();
}

// ============================================================================
// Benchmark: Decode
// ============================================================================

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for &size in PAYLOAD_SIZES {
        let payload = json_payload(size);
        group.throughput(Throughput::Bytes(payload.len() as u64));

        for encoding in [Encoding::Binary, Encoding::Text, Encoding::Json] {
            group.bench_with_input(
                BenchmarkId::new(encoding.as_str(), size),
                &payload,
                |b, payload| {
                    b.iter(|| encoding.decode(black_box(payload.clone())));
                },
            );
        }
    }

    group.finish();
}

// ============================================================================
// Benchmark: Listener Throughput
// ============================================================================

fn bench_listener_throughput(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");

    let mut group = c.benchmark_group("listener_throughput");
    group.sample_size(20);

    for &count in MESSAGE_COUNTS {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("messages", count), &count, |b, &count| {
            b.to_async(&rt).iter(|| pump_messages(count));
        });
    }

    group.finish();
}

/// Pushes `count` frames (every tenth a heartbeat) through a listener.
async fn pump_messages(count: usize) -> usize {
    let transport = MemoryTransport::new();
    let listener = Listener::builder()
        .service("http://bench.test")
        .channel("bench")
        .transport(transport.clone())
        .event_capacity(count * 2)
        .auto_connect(false)
        .build()
        .expect("listener");
    let mut events = listener.subscribe();
    listener.connect();

    let Some(remote) = transport.accept().await else {
        return 0;
    };

    for i in 0..count {
        if i % 10 == 0 {
            remote.send_frame(heartbeat::ping(i as u8));
        }
        remote.send_text("benchmark message payload");
    }

    let mut received = 0;
    while received < count {
        match events.recv().await {
            Ok(ListenerEvent::Message(_)) => received += 1,
            Ok(_) => {}
            Err(_) => break,
        }
    }

    listener.disconnect();
    received
}

criterion_group!(
    benches,
    bench_heartbeat_filter,
    bench_decode,
    bench_listener_throughput
);
criterion_main!(benches);
