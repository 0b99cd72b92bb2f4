use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use sapper_core::*;

const TIERS: [(&str, GameConfig); 3] = [
    ("beginner", GameConfig::beginner()),
    ("intermediate", GameConfig::intermediate()),
    ("expert", GameConfig::expert()),
];

fn play_tiers(c: &mut Criterion) {
    let mut group = c.benchmark_group("autoplay");

    for (name, config) in TIERS {
        let start = (config.size.0 / 2, config.size.1 / 2);
        let fields: Vec<Minefield> = (0..8)
            .map(|seed| RandomMinefieldGenerator::new(seed, start, StartTile::AlwaysZero).generate(config))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(name), &fields, |b, fields| {
            b.iter(|| {
                for (seed, field) in fields.iter().enumerate() {
                    let mut rng = SmallRng::seed_from_u64(seed as u64);
                    let mut player = Autoplayer::new(field.clone());
                    player.open(start).unwrap();
                    if !player.is_finished() {
                        black_box(player.play(&mut rng).unwrap());
                    }
                }
            });
        });
    }

    group.finish();
}

fn closure_after_clues(c: &mut Criterion) {
    let config = GameConfig::expert();
    let field = RandomMinefieldGenerator::new(1, (8, 15), StartTile::AlwaysZero).generate(config);
    let clues: Vec<(Coord2, u8)> = iter_cells(config.size)
        .filter(|&cell| !field.contains_mine(cell))
        .step_by(3)
        .map(|cell| (cell, field.adjacent_mine_count(cell)))
        .collect();

    c.bench_function("observe_expert_clues", |b| {
        b.iter(|| {
            let mut knowledge = KnowledgeBase::new(config.size);
            for &(cell, count) in &clues {
                knowledge.observe(cell, count).unwrap();
            }
            black_box(knowledge.constraint_count())
        });
    });
}

criterion_group!(benches, play_tiers, closure_after_clues);
criterion_main!(benches);
