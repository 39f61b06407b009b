//! Pipeline Performance Benchmarks
//!
//! Measures the cost of the building blocks a store's derived state runs on:
//! - Relay send with subscribers attached
//! - Combine-latest emission across six inputs
//! - Virtual clock scheduling and draining
//!
//! Run with: `cargo bench`

#![allow(missing_docs)] // Benchmarks don't need extensive docs

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::time::Duration;
use viewstore_core::Relay;
use viewstore_runtime::{Scheduler, StreamSchedulingExt, VirtualClock, combine_latest};

fn benchmark_relay_send(c: &mut Criterion) {
    let mut group = c.benchmark_group("relay");
    group.throughput(Throughput::Elements(1));

    group.bench_function("send_no_subscribers", |b| {
        let relay = Relay::new(0_u64);
        let mut next = 0_u64;
        b.iter(|| {
            next += 1;
            relay.send(black_box(next));
        });
    });

    group.bench_function("send_through_map", |b| {
        let relay = Relay::new(0_u64);
        let doubled = relay.stream().map(|value: &u64| value * 2);
        let mut next = 0_u64;
        b.iter(|| {
            next += 1;
            relay.send(black_box(next));
        });
        black_box(doubled.current());
    });

    group.finish();
}

fn benchmark_combine_latest(c: &mut Criterion) {
    let mut group = c.benchmark_group("combine_latest");
    group.throughput(Throughput::Elements(1));

    group.bench_function("six_inputs_one_changes", |b| {
        let items = Relay::new(vec![0_u32; 64]);
        let toggle = Relay::new(false);
        let search = Relay::new(String::new());
        let banner = Relay::new(String::from("Banner"));
        let presented = Relay::new(false);
        let count = Relay::new(0_u64);

        let combined = combine_latest((
            items.stream(),
            toggle.stream(),
            search.stream(),
            banner.stream(),
            presented.stream(),
            count.stream(),
        ))
        .map(|(items, toggle, _, _, _, count): &(Vec<u32>, bool, String, String, bool, u64)| {
            if *toggle { items.len() as u64 + count } else { *count }
        });

        let mut next = 0_u64;
        b.iter(|| {
            next += 1;
            count.send(black_box(next));
        });
        black_box(combined.current());
    });

    group.finish();
}

fn benchmark_virtual_clock(c: &mut Criterion) {
    let mut group = c.benchmark_group("virtual_clock");

    for pending in [10_usize, 100, 1_000] {
        group.throughput(Throughput::Elements(pending as u64));
        group.bench_function(format!("schedule_and_drain_{pending}"), |b| {
            b.iter_batched(
                VirtualClock::new,
                |clock| {
                    for index in 0..pending {
                        clock.schedule_after(Duration::from_millis((index % 17) as u64), || {});
                    }
                    black_box(clock.run())
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.bench_function("debounced_burst", |b| {
        b.iter_batched(
            || {
                let clock = VirtualClock::new();
                let scheduler: Scheduler = clock.clone().into();
                let search = Relay::new(String::new());
                let debounced = search.stream().debounce(Duration::from_secs(1), &scheduler);
                (clock, search, debounced)
            },
            |(clock, search, debounced)| {
                for text in ["p", "pl", "plu", "plum"] {
                    search.send(text.to_string());
                    clock.advance(Duration::from_millis(100));
                }
                clock.run();
                black_box(debounced.current())
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_relay_send,
    benchmark_combine_latest,
    benchmark_virtual_clock
);
criterion_main!(benches);
