//! # Chunk System
//!
//! The world is an unbounded plane of square chunks, each `chunk_size`
//! tiles on a side and addressed by integer [`ChunkCoord`]s.
//!
//! ## Chunk Contents
//!
//! | Layer        | Type                     | Source               |
//! |--------------|--------------------------|----------------------|
//! | terrain      | `Grid<TileType>`         | terrain synthesis, with structure overlays |
//! | structures   | `Vec<PlacedStructure>`   | structure placement  |
//! | roads        | `Grid<bool>`             | road placement       |
//!
//! ## Generation Order
//!
//! 1. Chunk seed and region from the [`WorldSeed`]
//! 2. Terrain pipeline with region-adjusted growth
//! 3. Barns, then silos
//! 4. Roads around the finished farmland
//!
//! All four steps draw from one `ChaCha8Rng` seeded from the chunk seed, so a
//! chunk is a pure function of `(world seed, coordinate, configuration)`.

use crate::config::{StructureConfig, WorldConfig};
use crate::error::WorldResult;
use crate::grid::{Grid, GridPos};
use crate::roads;
use crate::seed::{ChunkSeed, RegionType, WorldSeed};
use crate::structures::{self, PlacedStructure, StructureKind};
use crate::terrain::TerrainSynthesizer;
use crate::tile::TileType;

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not tiles).
    pub x: i32,
    /// Y coordinate (in chunks, not tiles).
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk containing world tile `(tile_x, tile_y)`.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub const fn from_tile_pos(tile_x: i64, tile_y: i64, chunk_size: usize) -> Self {
        let size = chunk_size as i64;
        Self {
            x: tile_x.div_euclid(size) as i32,
            y: tile_y.div_euclid(size) as i32,
        }
    }

    /// World tile coordinates of the chunk's top-left corner.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn origin_tile(self, chunk_size: usize) -> (i64, i64) {
        let size = chunk_size as i64;
        (self.x as i64 * size, self.y as i64 * size)
    }
}

/// A generated chunk.
///
/// Chunks are immutable once generated; the world manager hands out shared
/// references only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk position in the world.
    pub coord: ChunkCoord,
    seed: ChunkSeed,
    region: RegionType,
    terrain: Grid<TileType>,
    structures: Vec<PlacedStructure>,
    roads: Grid<bool>,
}

impl Chunk {
    /// Seed this chunk was generated from.
    #[must_use]
    pub const fn seed(&self) -> ChunkSeed {
        self.seed
    }

    /// Region flavour.
    #[must_use]
    pub const fn region(&self) -> RegionType {
        self.region
    }

    /// Terrain layer, including structure overlay tiles.
    #[must_use]
    pub const fn terrain(&self) -> &Grid<TileType> {
        &self.terrain
    }

    /// Placed structures.
    #[must_use]
    pub fn structures(&self) -> &[PlacedStructure] {
        &self.structures
    }

    /// Road overlay.
    #[must_use]
    pub const fn roads(&self) -> &Grid<bool> {
        &self.roads
    }

    /// Edge length in tiles.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.terrain.width()
    }

    /// Terrain with roads painted in as [`TileType::Road`].
    ///
    /// Structure tiles win over roads.
    #[must_use]
    pub fn composited(&self) -> Grid<TileType> {
        Grid::from_fn(self.terrain.width(), self.terrain.height(), |pos| {
            let tile = self.terrain[pos];
            if self.roads[pos] && !tile.is_structure() {
                TileType::Road
            } else {
                tile
            }
        })
    }

    /// Raw terrain bytes, one per tile in row-major order.
    #[must_use]
    pub fn terrain_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.terrain.cells())
    }

    /// Raw road bytes, one per tile in row-major order.
    #[must_use]
    pub fn road_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.roads.cells())
    }

    /// 64-bit FNV-1a digest over every layer.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0100_0000_01b3;

        let structure_bytes = self.structures.iter().flat_map(|s| {
            let kind = [s.kind.tile() as u8];
            kind.into_iter()
                .chain((s.position.x as u64).to_le_bytes())
                .chain((s.position.y as u64).to_le_bytes())
        });

        self.terrain_bytes()
            .iter()
            .copied()
            .chain(self.road_bytes().iter().copied())
            .chain(structure_bytes)
            .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
    }

    /// Tile at a local position.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WorldError::InvalidCoordinate`] outside the chunk.
    pub fn tile(&self, pos: GridPos) -> WorldResult<TileType> {
        self.terrain.get(pos)
    }
}

/// Chunk generator.
///
/// Holds no mutable state, so one generator can be shared across worker
/// threads.
#[derive(Clone, Debug)]
pub struct ChunkGenerator {
    seed: WorldSeed,
    chunk_size: usize,
    synthesizer: TerrainSynthesizer,
    structures: StructureConfig,
}

impl ChunkGenerator {
    /// Creates a generator for `config` under `seed`.
    #[must_use]
    pub fn new(config: &WorldConfig, seed: WorldSeed) -> Self {
        Self {
            seed,
            chunk_size: config.chunk_size,
            synthesizer: TerrainSynthesizer::from_config(config),
            structures: config.structures.clone(),
        }
    }

    /// Replaces the terrain synthesizer.
    #[must_use]
    pub fn with_synthesizer(mut self, synthesizer: TerrainSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    /// The master seed.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Edge length of generated chunks, in tiles.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Generates the chunk at `coord`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WorldError::UnsolvableConstraints`] if the terrain
    /// solver fails even after recovery.
    pub fn generate(&self, coord: ChunkCoord) -> WorldResult<Chunk> {
        let seed = self.seed.chunk_seed(coord);
        let region = self.seed.region(coord);
        let mut rng = seed.rng();

        let growth = region.adjust_growth(self.synthesizer.growth());
        let mut terrain =
            self.synthesizer
                .synthesize(self.chunk_size, self.chunk_size, &growth, &mut rng)?;

        let mut placed = structures::place(
            &mut terrain,
            StructureKind::Barn,
            region.adjust_structures(self.structures.barns),
            self.structures.max_attempts,
            &mut rng,
        );
        placed.extend(structures::place(
            &mut terrain,
            StructureKind::Silo,
            region.adjust_structures(self.structures.silos),
            self.structures.max_attempts,
            &mut rng,
        ));

        let roads = roads::place(&terrain);

        tracing::debug!(
            "generated chunk ({}, {}) seed={} region={:?} structures={} roads={}",
            coord.x,
            coord.y,
            seed.value(),
            region,
            placed.len(),
            roads::road_count(&roads)
        );

        Ok(Chunk {
            coord,
            seed,
            region,
            terrain,
            structures: placed,
            roads,
        })
    }
}
