//! # Blockclock Benchmarks
//!
//! | Area | Operation | Scales with |
//! |------|-----------|-------------|
//! | bc-01 Chain Cache | insert into a full window | capacity |
//! | bc-04 Broadcast | encode a `blocks` frame | snapshot size |
//! | bc-04 Broadcast | fan one frame out | live subscribers |

use bc_01_chain_cache::BoundedChain;
use bc_04_broadcast::domain::clock_event_frame;
use bc_04_broadcast::{ConnectionState, Dispatcher, SubscriberRegistry};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shared_bus::ClockEvent;
use shared_types::fixtures::{header, tx_summary};
use shared_types::ChainSnapshot;
use std::sync::Arc;

// ============================================================================
// BC-01: Chain Cache
// ============================================================================

fn bench_chain_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("bc-01-chain-cache");

    for capacity in [20usize, 200, 2_000] {
        let mut chain = BoundedChain::new(capacity).unwrap();
        for height in 0..capacity as u64 {
            chain.insert(header(height));
        }
        let mut next = capacity as u64;

        group.bench_with_input(
            BenchmarkId::new("insert_evicting", capacity),
            &capacity,
            |b, _| {
                b.iter(|| {
                    let outcome = chain.insert(header(next));
                    next += 1;
                    black_box(outcome)
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// BC-04: Broadcast
// ============================================================================

fn bench_blocks_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("bc-04-broadcast");

    for blocks in [20u64, 100] {
        let snapshot: ChainSnapshot = (0..blocks).map(header).collect();
        let event = ClockEvent::blocks(Arc::new(snapshot));
        group.throughput(Throughput::Elements(blocks));
        group.bench_with_input(BenchmarkId::new("encode_blocks", blocks), &event, |b, event| {
            b.iter(|| black_box(clock_event_frame(event).unwrap()))
        });
    }

    group.finish();
}

fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("bc-04-broadcast");

    for subscribers in [1usize, 100, 1_000] {
        let registry = Arc::new(SubscriberRegistry::new(4));
        let mut queues = Vec::with_capacity(subscribers);
        for _ in 0..subscribers {
            let (id, frames) = registry.register();
            registry.transition(&id, ConnectionState::CatchingUp).unwrap();
            registry.transition(&id, ConnectionState::Live).unwrap();
            queues.push(frames);
        }
        let dispatcher = Dispatcher::new(Arc::clone(&registry));
        let event = ClockEvent::tx(tx_summary(1, 2));

        group.throughput(Throughput::Elements(subscribers as u64));
        group.bench_with_input(
            BenchmarkId::new("dispatch_tx", subscribers),
            &subscribers,
            |b, _| {
                b.iter(|| {
                    let report = dispatcher.dispatch(&event).unwrap();
                    for queue in &mut queues {
                        while queue.try_recv().is_ok() {}
                    }
                    black_box(report)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_chain_insert, bench_blocks_frame, bench_fan_out);
criterion_main!(benches);
