//! # Terrain Quality Tests
//!
//! End-to-end checks on generated chunks: reproducibility, adjacency of the
//! base solve, and where structures and roads end up.

use acreage_worldgen::solver::first_violation;
use acreage_worldgen::{
    AdjacencyTable, ChunkCoord, ChunkGenerator, ConstraintSolver, TerrainSynthesizer, TileType,
    WorldConfig, WorldSeed,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn config_with_chunk_size(chunk_size: usize) -> WorldConfig {
    WorldConfig {
        chunk_size,
        seed: Some(42),
        ..WorldConfig::default()
    }
}

/// Test: 64x64 chunk at the origin with master seed 42.
#[test]
fn test_seed_42_origin_chunk() {
    let config = config_with_chunk_size(64);
    let gen = ChunkGenerator::new(&config, WorldSeed::new(42));

    let chunk = gen.generate(ChunkCoord::new(0, 0)).unwrap();
    assert_eq!(chunk.terrain().width(), 64);
    assert_eq!(chunk.terrain().height(), 64);
    assert_eq!(chunk.terrain().len(), 64 * 64);
    assert!(chunk
        .terrain_bytes()
        .iter()
        .all(|&b| TileType::from_index(usize::from(b)).is_some()));

    let again = ChunkGenerator::new(&config, WorldSeed::new(42))
        .generate(ChunkCoord::new(0, 0))
        .unwrap();
    assert_eq!(chunk.terrain_bytes(), again.terrain_bytes());
    assert_eq!(chunk.road_bytes(), again.road_bytes());
    assert_eq!(chunk.structures(), again.structures());

    println!("Seed 42, chunk (0, 0), region {:?}:\n{}", chunk.region(), chunk.composited());
}

/// Test: Solved grids satisfy the adjacency table everywhere.
#[test]
fn test_base_solve_respects_adjacency() {
    let solver = ConstraintSolver::canonical();
    let adjacency = AdjacencyTable::canonical();

    for seed in 0..20 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let grid = solver.solve_with_recovery(48, 48, 3, &mut rng).unwrap();
        assert_eq!(
            first_violation(&grid, &adjacency),
            None,
            "seed {seed} produced an adjacency violation"
        );
    }
}

/// Test: Structures only ever land on farmland.
#[test]
fn test_structures_land_on_fields() {
    let mut config = config_with_chunk_size(32);
    config.structures.barns = 4;
    config.structures.silos = 3;
    let seed = WorldSeed::new(42);
    let gen = ChunkGenerator::new(&config, seed);
    let synth = TerrainSynthesizer::from_config(&config);

    let mut total = 0;
    for y in -3..3 {
        for x in -3..3 {
            let coord = ChunkCoord::new(x, y);
            let chunk = gen.generate(coord).unwrap();

            // Replay the terrain pipeline on the same stream to see the
            // ground before structures were dropped on it.
            let mut rng = seed.chunk_seed(coord).rng();
            let growth = seed.region(coord).adjust_growth(synth.growth());
            let bare = synth.synthesize(32, 32, &growth, &mut rng).unwrap();

            for s in chunk.structures() {
                assert_eq!(bare[s.position], TileType::Field, "{s:?} in chunk {coord:?}");
                assert_eq!(chunk.terrain()[s.position], s.kind.tile());
                total += 1;
            }
        }
    }
    println!("Placed {total} structures across 36 chunks");
    assert!(total > 0);
}

/// Test: Roads trace farmland edges and never cover other terrain.
#[test]
fn test_roads_follow_farm_edges() {
    let config = config_with_chunk_size(32);
    let gen = ChunkGenerator::new(&config, WorldSeed::new(7));

    let mut roads = 0;
    for x in 0..8 {
        let chunk = gen.generate(ChunkCoord::new(x, 0)).unwrap();
        let terrain = chunk.terrain();
        for pos in terrain.positions() {
            let is_edge = terrain[pos] == TileType::Field
                && terrain.neighbors4(pos).any(|n| terrain[n] != TileType::Field);
            assert_eq!(chunk.roads()[pos], is_edge);
            roads += usize::from(is_edge);
        }
    }
    println!("Road cells across 8 chunks: {roads}");
}

/// Test: Regions actually change the terrain mix.
#[test]
fn test_region_flavour_shows_in_terrain() {
    let config = config_with_chunk_size(32);
    let seed = WorldSeed::new(42);
    let gen = ChunkGenerator::new(&config, seed);

    let mut water_by_region = std::collections::HashMap::new();
    for y in -6..6 {
        for x in -6..6 {
            let chunk = gen.generate(ChunkCoord::new(x, y)).unwrap();
            let water = chunk
                .terrain()
                .cells()
                .iter()
                .filter(|&&t| t == TileType::Water)
                .count();
            let entry = water_by_region.entry(chunk.region()).or_insert((0usize, 0usize));
            entry.0 += water;
            entry.1 += 1;
        }
    }

    for (region, (water, chunks)) in &water_by_region {
        println!("{region:?}: {chunks} chunks, {:.1} water tiles/chunk", *water as f64 / *chunks as f64);
    }
    assert!(water_by_region.len() > 1, "only one region across 144 chunks");
}

/// Test: Rivers enabled through a TOML document.
#[test]
fn test_river_from_toml_config() {
    let config = WorldConfig::from_toml_str(
        r#"
        chunk_size = 24
        seed = 42

        [river]
        enabled = true
        start = [0.0, 0.0]
        end = [1.0, 1.0]
        "#,
    )
    .unwrap();
    let gen = ChunkGenerator::new(&config, config.world_seed());

    for x in 0..4 {
        let chunk = gen.generate(ChunkCoord::new(x, 0)).unwrap();
        let terrain = chunk.terrain();
        let corner = acreage_worldgen::GridPos::new(0, 0);
        assert_eq!(terrain[corner], TileType::Water);
        assert_eq!(terrain[acreage_worldgen::GridPos::new(23, 23)], TileType::Water);
    }
}
