//! # Viewport Walk Integration Test
//!
//! Proves the loaded chunk set tracks the viewport exactly, however the
//! camera moves.

use acreage_worldgen::{ChunkCoord, ChunkState, WorldConfig, WorldManager};
use std::collections::HashSet;
use std::time::Instant;

fn loaded_set(manager: &WorldManager) -> HashSet<ChunkCoord> {
    manager.loaded_coords().into_iter().collect()
}

fn visible_set(manager: &WorldManager, x: f64, y: f64) -> HashSet<ChunkCoord> {
    manager.visible_chunks(x, y).unwrap().into_iter().collect()
}

/// Test: Walk east, checking the loaded set after every step.
#[test]
fn test_walk_keeps_loaded_equal_to_visible() {
    let mut manager = WorldManager::new(WorldConfig::test()).unwrap();

    let start = Instant::now();
    let mut x = 0.0;
    let y = 20.0;

    for _ in 0..200 {
        x += 13.0;
        manager.update_viewport(x, y).unwrap();
        assert_eq!(loaded_set(&manager), visible_set(&manager, x, y), "drift at x={x}");
    }

    let stats = manager.stats();
    println!("Walked to x={x} in {:?}", start.elapsed());
    println!("Loaded chunks: {}", manager.loaded_chunk_count());
    println!("Generated total: {}", stats.generated_this_session);
    println!("Unloaded total: {}", stats.unloaded_this_session);

    assert_eq!(
        stats.generated_this_session - stats.unloaded_this_session,
        stats.loaded as u64
    );
}

/// Test: Jump around the world, including negative coordinates.
#[test]
fn test_teleports_leave_no_stale_chunks() {
    let mut manager = WorldManager::new(WorldConfig::test()).unwrap();
    let stops = [
        (0.0, 0.0),
        (-3_000.5, 250.0),
        (-3_010.0, 260.0),
        (12_345.0, -999.0),
        (0.0, 0.0),
        (31.9, -31.9),
    ];

    for (x, y) in stops {
        manager.update_viewport(x, y).unwrap();
        let visible = visible_set(&manager, x, y);
        assert_eq!(loaded_set(&manager), visible);
        for coord in &visible {
            assert_eq!(manager.chunk_state(*coord), ChunkState::Loaded);
            assert!(manager.get_chunk(*coord).is_some());
        }
    }
}

/// Test: Repeated updates at one position change nothing.
#[test]
fn test_update_is_idempotent() {
    let mut manager = WorldManager::new(WorldConfig::test()).unwrap();
    manager.update_viewport(-77.0, 140.0).unwrap();

    let stats = manager.stats();
    let fingerprints: Vec<_> = manager
        .loaded_coords()
        .into_iter()
        .map(|c| manager.get_chunk(c).map(|chunk| chunk.fingerprint()))
        .collect();

    for _ in 0..3 {
        manager.update_viewport(-77.0, 140.0).unwrap();
    }

    assert_eq!(manager.stats(), stats);
    let after: Vec<_> = manager
        .loaded_coords()
        .into_iter()
        .map(|c| manager.get_chunk(c).map(|chunk| chunk.fingerprint()))
        .collect();
    assert_eq!(after, fingerprints);
}

/// Test: A chunk that is evicted and reloaded comes back identical.
#[test]
fn test_reloaded_chunk_is_identical() {
    let mut manager = WorldManager::new(WorldConfig::test()).unwrap();
    let origin = ChunkCoord::new(0, 0);

    manager.update_viewport(0.0, 0.0).unwrap();
    let first = manager.get_chunk(origin).unwrap().clone();

    manager.update_viewport(50_000.0, 50_000.0).unwrap();
    assert_eq!(manager.chunk_state(origin), ChunkState::Unloaded);

    manager.update_viewport(0.0, 0.0).unwrap();
    let second = manager.get_chunk(origin).unwrap();
    assert_eq!(first.terrain_bytes(), second.terrain_bytes());
    assert_eq!(first.road_bytes(), second.road_bytes());
    assert_eq!(first.structures(), second.structures());
}

/// Test: Background generation converges on the same world.
#[test]
fn test_background_walk_converges() {
    let sync_config = WorldConfig::test();
    let async_config = WorldConfig {
        workers: 4,
        ..WorldConfig::test()
    };
    let mut sync_world = WorldManager::new(sync_config).unwrap();
    let mut async_world = WorldManager::new(async_config).unwrap();

    let mut x = 0.0;
    for _ in 0..20 {
        x += 40.0;
        async_world.request_viewport(x, 0.0).unwrap();
        async_world.poll_generated().unwrap();

        // Nothing outside the viewport is ever loaded or in flight twice.
        let visible = visible_set(&async_world, x, 0.0);
        assert!(loaded_set(&async_world).is_subset(&visible));
    }

    async_world.flush_pending().unwrap();
    sync_world.update_viewport(x, 0.0).unwrap();
    assert_eq!(async_world.request_viewport(x, 0.0).unwrap(), 0);

    assert_eq!(loaded_set(&async_world), loaded_set(&sync_world));
    for coord in sync_world.loaded_coords() {
        assert_eq!(
            async_world.get_chunk(coord).map(|c| c.fingerprint()),
            sync_world.get_chunk(coord).map(|c| c.fingerprint()),
            "chunk {coord:?} differs between background and inline generation"
        );
    }
    println!("Background stats: {:?}", async_world.stats());
}
