//! Bot system throughput benchmarks
//!
//! Measures a full lockstep tick and the bot pass alone at several roster
//! sizes on the demo map.
//!
//! Run with: cargo bench --bench bot_tick

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use royale_bots::config::MatchConfig;
use royale_bots::game::catalog::{BotCatalog, ItemCatalog};
use royale_bots::sim::{scenario, Simulation};

fn create_sim(players: u32) -> Simulation {
    let config = MatchConfig { seed: 42, max_players: players, ..MatchConfig::default() };
    match scenario::demo(&config, BotCatalog::builtin(), ItemCatalog::builtin()) {
        Ok(sim) => sim,
        Err(e) => panic!("demo setup failed: {}", e),
    }
}

/// Warm past the spawn grace so bots actually decide
fn warmed_sim(players: u32) -> Simulation {
    let mut sim = create_sim(players);
    for _ in 0..90 {
        sim.step();
    }
    sim
}

/// Benchmark one full simulation tick
fn bench_full_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_tick");
    group.sample_size(50);

    for players in [8u32, 24, 48, 64] {
        let mut sim = warmed_sim(players);

        group.throughput(Throughput::Elements(u64::from(players)));
        group.bench_with_input(BenchmarkId::new("demo", players), &players, |b, _| {
            b.iter(|| black_box(sim.step()));
        });
    }

    group.finish();
}

/// Benchmark the bot pass in isolation
fn bench_bot_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("bot_update");
    group.sample_size(50);

    for players in [8u32, 24, 48, 64] {
        let mut sim = warmed_sim(players);

        group.throughput(Throughput::Elements(u64::from(players)));
        group.bench_with_input(BenchmarkId::new("round_robin", players), &players, |b, _| {
            b.iter(|| {
                sim.world.advance();
                black_box(sim.bots.update(&mut sim.world, &mut sim.nav, &sim.physics, &mut sim.rng))
            });
        });
    }

    group.finish();
}

/// Benchmark setup of the demo roster
fn bench_roster_setup(c: &mut Criterion) {
    let mut group = c.benchmark_group("roster_setup");
    group.sample_size(30);

    for players in [24u32, 64] {
        group.bench_with_input(BenchmarkId::new("demo", players), &players, |b, &players| {
            b.iter(|| black_box(create_sim(players)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_full_tick, bench_bot_update, bench_roster_setup);
criterion_main!(benches);
