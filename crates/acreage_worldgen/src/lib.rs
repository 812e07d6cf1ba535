//! # Acreage World Generation
//!
//! Deterministic tile-world generation for infinite, reproducible farmland.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed and coordinate always produce the same chunk
//! 2. **Constrained**: Base terrain satisfies a tile adjacency table
//! 3. **Chunked**: World is generated in fixed-size square chunks
//! 4. **Streamable**: Chunks follow the viewport and can be generated in the background
//!
//! ## Core Components
//!
//! - `ConstraintSolver`: Entropy-ordered constraint propagation over tile domains
//! - `TerrainSynthesizer`: Base solve plus forest, farm, lake and river passes
//! - `find_path`: A* over grids with pluggable heuristic and step cost
//! - `structures` / `roads`: Barn and silo placement, farmland-edge roads
//! - `WorldSeed`: Master seed, chunk seeds and region flavour
//! - `WorldManager`: Viewport-driven chunk loading/unloading
//! - `ChunkWorkerPool`: Background chunk generation
//!
//! ## Example
//!
//! ```rust,ignore
//! use acreage_worldgen::{ChunkCoord, WorldConfig, WorldManager};
//!
//! let mut world = WorldManager::new(WorldConfig::from_toml_file("world.toml")?)?;
//!
//! // Camera centred at pixel (640, 360)
//! world.update_viewport(640.0, 360.0)?;
//!
//! let chunk = world.get_chunk(ChunkCoord::new(0, 0)).expect("visible");
//! println!("{}", chunk.composited());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chunk;
pub mod config;
pub mod error;
pub mod grid;
pub mod pathfinding;
pub mod roads;
pub mod seed;
pub mod solver;
pub mod structures;
pub mod terrain;
pub mod tile;
pub mod worker;
pub mod world_manager;

pub use chunk::{Chunk, ChunkCoord, ChunkGenerator};
pub use config::{GrowthConfig, RiverConfig, SolverConfig, StructureConfig, WorldConfig};
pub use error::{WorldError, WorldResult};
pub use grid::{Grid, GridPos};
pub use pathfinding::{find_path, manhattan, Path};
pub use seed::{ChunkSeed, RegionType, WorldSeed};
pub use solver::ConstraintSolver;
pub use structures::{PlacedStructure, StructureKind};
pub use terrain::TerrainSynthesizer;
pub use tile::{AdjacencyTable, TileMask, TileSet, TileType};
pub use worker::{ChunkWorkerPool, GenerationResult, PoolStats};
pub use world_manager::{ChunkState, WorldManager, WorldStats};
