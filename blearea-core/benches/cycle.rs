//! Update cycle benchmarks
//!
//! Run with: cargo bench --package blearea-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use blearea_core::{constants::time::UPDATE_INTERVAL_MS, Observation, Tracker, TrackerConfig};

/// One cycle's worth of sightings, every device heard by every receiver
fn observations(devices: usize, receivers: usize, now: u64) -> Vec<Observation> {
    let mut out = Vec::with_capacity(devices * receivers);
    for d in 0..devices {
        for r in 0..receivers {
            // Spread devices across the receivers with some jitter per cycle
            let rssi = -50.0 - ((d * 7 + r * 13) % 35) as f64 - (now / 1000 % 3) as f64;
            out.push(
                Observation::timestamped(format!("dev-{d}"), format!("rx-{r}"), rssi, now)
                    .with_area(format!("area-{r}")),
            );
        }
    }
    out
}

fn bench_run_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_cycle");

    for &(devices, receivers) in &[(10, 4), (50, 8), (200, 16)] {
        let links = (devices * receivers) as u64;
        group.throughput(Throughput::Elements(links));

        let mut tracker = Tracker::new(TrackerConfig::default()).unwrap();
        let mut now = 10_000u64;

        // Warm every link into steady state
        for _ in 0..25 {
            now += UPDATE_INTERVAL_MS;
            tracker.run_cycle(now, &observations(devices, receivers, now));
        }

        group.bench_with_input(
            BenchmarkId::new("links", links),
            &(devices, receivers),
            |b, &(devices, receivers)| {
                b.iter_batched(
                    || {
                        now += UPDATE_INTERVAL_MS;
                        (now, observations(devices, receivers, now))
                    },
                    |(ts, obs)| black_box(tracker.run_cycle(ts, &obs)),
                    criterion::BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

fn bench_idle_cycle(c: &mut Criterion) {
    let mut tracker = Tracker::default();
    let mut now = 10_000u64;
    for _ in 0..10 {
        now += UPDATE_INTERVAL_MS;
        tracker.run_cycle(now, &observations(100, 8, now));
    }

    c.bench_function("idle_cycle_800_links", |b| {
        b.iter(|| black_box(tracker.run_cycle(black_box(now), &[])))
    });
}

criterion_group!(benches, bench_run_cycle, bench_idle_cycle);
criterion_main!(benches);
