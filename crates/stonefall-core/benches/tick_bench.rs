//! Criterion benchmarks for the world tracker.
//!
//! Two benchmark groups:
//! - `idle_tick`: tracker with no pending work -- measures fixed overhead
//! - `busy_tick`: active cascades plus loaded queues -- measures a worst
//!   case tick

use criterion::{criterion_group, criterion_main, Criterion};
use stonefall_core::collapse::Collapse;
use stonefall_core::pos::BlockPos;
use stonefall_core::settings::TrackerSettings;
use stonefall_core::test_utils::{CountRoster, FixedOracle, GridWorld};
use stonefall_core::tracker::WorldTracker;

fn build_busy_tracker() -> (WorldTracker, GridWorld) {
    let settings = TrackerSettings {
        collapse_trigger_denominator: 1,
        propagate_chance: 0.55,
        ..Default::default()
    };
    let mut tracker = WorldTracker::with_settings(0xBEEF, settings).unwrap();
    tracker.set_players_online(true);

    let mut world = GridWorld::new();
    world.fill_box(BlockPos::new(-16, 0, -16), BlockPos::new(16, 48, 16));

    for i in 0..8 {
        let center = BlockPos::new(i * 4 - 16, 0, 0);
        tracker.begin_collapse(Collapse::new(center, vec![center], 256.0));
    }
    for i in 0..256 {
        tracker.schedule_landslide_check(BlockPos::new(i % 32, 8, i / 32));
        tracker.schedule_isolation_check(BlockPos::new(i % 32, 40, i / 32));
    }
    (tracker, world)
}

fn bench_idle_tick(c: &mut Criterion) {
    let mut tracker = WorldTracker::new(1);
    tracker.set_players_online(true);
    let mut world = GridWorld::new();
    let roster = CountRoster(1);

    c.bench_function("idle_tick", |b| {
        let mut oracle = FixedOracle::tracking(tracker.calendar());
        b.iter(|| {
            tracker.tick(&mut world, &mut oracle, &roster);
            oracle.advance(1);
            tracker.drain_events()
        });
    });
}

fn bench_busy_tick(c: &mut Criterion) {
    c.bench_function("busy_tick", |b| {
        b.iter_batched(
            build_busy_tracker,
            |(mut tracker, mut world)| {
                let mut oracle = FixedOracle::tracking(tracker.calendar());
                let roster = CountRoster(1);
                for _ in 0..64 {
                    tracker.tick(&mut world, &mut oracle, &roster);
                    oracle.advance(1);
                }
                tracker.drain_events()
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_idle_tick, bench_busy_tick);
criterion_main!(benches);
