//! Benchmark for chunk generation performance.
//!
//! Covers the base constraint solve on its own and the full chunk pipeline
//! (solve, growth passes, structures, roads).
//!
//! Run with: cargo bench --package acreage_worldgen --bench chunk_benchmark

use acreage_worldgen::{ChunkCoord, ChunkGenerator, ConstraintSolver, WorldConfig, WorldSeed};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn benchmark_base_solve(c: &mut Criterion) {
    let solver = ConstraintSolver::canonical();
    let mut group = c.benchmark_group("base_solve");

    for size in [16usize, 32, 64] {
        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut seed = 0u64;
            b.iter(|| {
                seed = seed.wrapping_add(1);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                black_box(solver.solve(size, size, &mut rng))
            });
        });
    }

    group.finish();
}

fn benchmark_single_chunk(c: &mut Criterion) {
    let config = WorldConfig::default();
    let gen = ChunkGenerator::new(&config, WorldSeed::new(42));

    c.bench_function("single_chunk_generation", |b| {
        let mut coord = 0i32;
        b.iter(|| {
            coord = coord.wrapping_add(1);
            black_box(gen.generate(ChunkCoord::new(coord, coord / 2)))
        });
    });
}

fn benchmark_viewport_fill(c: &mut Criterion) {
    let config = WorldConfig::default();
    let gen = ChunkGenerator::new(&config, WorldSeed::new(42));

    let mut group = c.benchmark_group("viewport_fill");
    group.sample_size(10);

    // A 4x3 block of default 32x32-tile chunks.
    group.throughput(Throughput::Elements(4 * 3));
    group.bench_function("4x3_chunks", |b| {
        b.iter(|| {
            for y in 0..3 {
                for x in 0..4 {
                    black_box(gen.generate(ChunkCoord::new(x, y)));
                }
            }
        });
    });

    group.finish();
}

fn benchmark_river_chunk(c: &mut Criterion) {
    let mut config = WorldConfig::default();
    config.river.enabled = true;
    let gen = ChunkGenerator::new(&config, WorldSeed::new(42));

    c.bench_function("chunk_generation_with_river", |b| {
        let mut coord = 0i32;
        b.iter(|| {
            coord = coord.wrapping_add(1);
            black_box(gen.generate(ChunkCoord::new(coord, -coord)))
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = benchmark_base_solve,
              benchmark_single_chunk,
              benchmark_viewport_fill,
              benchmark_river_chunk
}

criterion_main!(benches);
