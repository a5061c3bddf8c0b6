//! Snapshot and connection benchmark suite.
//!
//! - Snapshot processing at different tree sizes, full and interactive-only
//! - Command round-trips through a [`Connection`] against an in-process peer
//!
//! Run with: cargo bench --bench snapshot
//! Results saved to: target/criterion/

use std::hint::black_box;

use cdp_pilot::{Connection, ConnectionOptions, SnapshotOptions, SnapshotProcessor};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::io::duplex;
use tokio::runtime::Runtime;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, client_async};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const TREE_SIZES: &[usize] = &[100, 1_000, 10_000];
const CONCURRENT_COMMANDS: &[usize] = &[1, 16, 128];

// ============================================================================
// Fixtures
// ============================================================================

/// Builds a raw tree of roughly `lines` lines: sections of headings, links,
/// buttons and text, with repeated names to exercise `nth`.
fn raw_tree(lines: usize) -> String {
    let mut out = String::with_capacity(lines * 32);
    let mut emitted = 0;
    let mut section = 0;

    while emitted < lines {
        out.push_str(&format!("- region \"Section {section}\":\n"));
        out.push_str(&format!("  - heading \"Title {section}\" [level=2]\n"));
        out.push_str("  - list:\n");
        for item in 0..4 {
            out.push_str(&format!("    - listitem:\n      - link \"Item {item}\"\n"));
        }
        out.push_str("  - generic:\n    - text: Some descriptive text\n");
        out.push_str("  - button \"More\"\n");
        emitted += 15;
        section += 1;
    }
    out
}

// ============================================================================
// Benchmark: Snapshot Processing
// ============================================================================

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_process");

    for &size in TREE_SIZES {
        let raw = raw_tree(size);
        group.throughput(Throughput::Bytes(raw.len() as u64));

        let full = SnapshotProcessor::new(SnapshotOptions::new());
        group.bench_with_input(BenchmarkId::new("full", size), &raw, |b, raw| {
            b.iter(|| full.process(black_box(raw)));
        });

        let interactive = SnapshotProcessor::new(SnapshotOptions::new().with_interactive_only());
        group.bench_with_input(BenchmarkId::new("interactive", size), &raw, |b, raw| {
            b.iter(|| interactive.process(black_box(raw)));
        });

        let compact = SnapshotProcessor::new(SnapshotOptions::new().with_compact());
        group.bench_with_input(BenchmarkId::new("compact", size), &raw, |b, raw| {
            b.iter(|| compact.process(black_box(raw)));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Command Round-Trips
// ============================================================================

/// Connects to an in-process peer that answers every command with `{}`.
async fn echo_connection() -> Connection {
    let (client, server) = duplex(1 << 20);

    let peer = tokio::spawn(async move {
        let Ok(mut ws) = accept_async(server).await else {
            return;
        };
        while let Some(Ok(Message::Text(text))) = ws.next().await {
            let Ok(command) = serde_json::from_str::<Value>(text.as_str()) else {
                continue;
            };
            let reply = json!({"id": command["id"], "result": {}});
            if ws.send(Message::Text(reply.to_string().into())).await.is_err() {
                return;
            }
        }
    });

    let (ws, _) = client_async("ws://127.0.0.1:9222/devtools/browser/bench", client)
        .await
        .expect("handshake");
    drop(peer);

    Connection::from_stream(ws, ConnectionOptions::new())
}

fn bench_round_trip(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let connection = rt.block_on(echo_connection());

    let mut group = c.benchmark_group("command_round_trip");

    for &count in CONCURRENT_COMMANDS {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("concurrent", count), &count, |b, &count| {
            b.to_async(&rt).iter(|| {
                let connection = connection.clone();
                async move {
                    let calls = (0..count).map(|_| {
                        connection.send_command("Runtime.evaluate", json!({"expression": "1"}), None)
                    });
                    for result in futures_util::future::join_all(calls).await {
                        result.expect("round trip");
                    }
                }
            });
        });
    }

    group.finish();
    connection.close();
}

criterion_group!(benches, bench_process, bench_round_trip);
criterion_main!(benches);
