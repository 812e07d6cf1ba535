//! # World Manager
//!
//! Owns the loaded chunks and keeps them in step with the viewport.
//!
//! ## Chunk Lifecycle
//!
//! ```text
//!             request_viewport            poll_generated
//! Unloaded ─────────────────> Pending ─────────────────> Loaded
//!    ▲                           │ (no longer visible:       │
//!    │                           │  result discarded)        │
//!    └───────────────────────────┴───────────────────────────┘
//!                          left the viewport
//! ```
//!
//! [`WorldManager::update_viewport`] is the synchronous path: it generates
//! every missing visible chunk before returning, so afterwards the loaded set
//! equals the visible set exactly.
//!
//! With `workers > 0`, [`WorldManager::request_viewport`] queues missing
//! chunks on the [`ChunkWorkerPool`] instead. At most one generation per
//! coordinate is ever in flight, and a chunk that finishes after leaving the
//! viewport is dropped rather than installed. The loaded set converges on
//! the visible set as results are polled.
//!
//! ## Visibility
//!
//! For a viewport of `w x h` pixels centred on `(cx, cy)` and chunks of
//! `c = tile_size * chunk_size` pixels, the visible chunks are
//!
//! ```text
//! x in floor((cx - w/2) / c) ..= ceil((cx + w/2) / c)
//! y in floor((cy - h/2) / c) ..= ceil((cy + h/2) / c)
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::chunk::{Chunk, ChunkCoord, ChunkGenerator};
use crate::config::WorldConfig;
use crate::error::{WorldError, WorldResult};
use crate::grid::GridPos;
use crate::seed::WorldSeed;
use crate::tile::TileType;
use crate::worker::{ChunkWorkerPool, GenerationResult};

/// Lifecycle state of one chunk coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Not in memory.
    Unloaded,
    /// Queued or generating on a worker.
    Pending,
    /// Generated and installed.
    Loaded,
}

/// World statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    /// Chunks currently loaded.
    pub loaded: usize,
    /// Chunks currently generating in the background.
    pub pending: usize,
    /// Chunks installed since the manager was created.
    pub generated_this_session: u64,
    /// Chunks evicted since the manager was created.
    pub unloaded_this_session: u64,
    /// Background results dropped because the chunk was no longer visible.
    pub discarded_this_session: u64,
}

/// Chunk lifecycle manager.
#[derive(Debug)]
pub struct WorldManager {
    config: WorldConfig,
    generator: Arc<ChunkGenerator>,
    chunks: HashMap<ChunkCoord, Chunk>,
    pending: HashSet<ChunkCoord>,
    visible: HashSet<ChunkCoord>,
    pool: Option<ChunkWorkerPool>,
    stats: WorldStats,
}

impl WorldManager {
    /// Creates a manager, taking the seed from `config` or drawing a random one.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: WorldConfig) -> WorldResult<Self> {
        let seed = config.world_seed();
        Self::with_seed(config, seed)
    }

    /// Creates a manager with an explicit master seed.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] if `config` fails validation.
    pub fn with_seed(config: WorldConfig, seed: WorldSeed) -> WorldResult<Self> {
        config.validate()?;
        let generator = Arc::new(ChunkGenerator::new(&config, seed));
        let pool = (config.workers > 0)
            .then(|| ChunkWorkerPool::new(Arc::clone(&generator), config.workers));

        tracing::info!(
            "world manager ready: seed={} chunk_size={} workers={}",
            seed.value(),
            config.chunk_size,
            config.workers
        );

        Ok(Self {
            config,
            generator,
            chunks: HashMap::new(),
            pending: HashSet::new(),
            visible: HashSet::new(),
            pool,
            stats: WorldStats::default(),
        })
    }

    /// The master seed.
    #[must_use]
    pub fn seed(&self) -> WorldSeed {
        self.generator.seed()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Chunks visible from a viewport centred on `(center_x, center_y)` pixels,
    /// in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] for a non-finite centre.
    #[allow(clippy::cast_possible_truncation)]
    pub fn visible_chunks(&self, center_x: f64, center_y: f64) -> WorldResult<Vec<ChunkCoord>> {
        if !center_x.is_finite() || !center_y.is_finite() {
            return Err(WorldError::InvalidConfig(format!(
                "viewport centre must be finite, got ({center_x}, {center_y})"
            )));
        }

        let chunk_px = self.config.chunk_pixels();
        let half_w = self.config.viewport_width / 2.0;
        let half_h = self.config.viewport_height / 2.0;

        let min_x = ((center_x - half_w) / chunk_px).floor() as i32;
        let max_x = ((center_x + half_w) / chunk_px).ceil() as i32;
        let min_y = ((center_y - half_h) / chunk_px).floor() as i32;
        let max_y = ((center_y + half_h) / chunk_px).ceil() as i32;

        Ok((min_y..=max_y)
            .flat_map(|y| (min_x..=max_x).map(move |x| ChunkCoord::new(x, y)))
            .collect())
    }

    /// Brings the loaded set in line with a viewport centred on
    /// `(center_x, center_y)`, generating on the calling thread.
    ///
    /// Chunks already loaded are kept as they are. Outstanding background
    /// generations are waited for first; any that failed are retried here.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] for a non-finite centre and
    /// [`WorldError::UnsolvableConstraints`] if a chunk cannot be generated.
    pub fn update_viewport(&mut self, center_x: f64, center_y: f64) -> WorldResult<()> {
        let visible = self.visible_chunks(center_x, center_y)?;
        self.visible = visible.iter().copied().collect();
        self.evict_invisible();

        // Failed background jobs are regenerated below.
        if let Err(err) = self.flush_pending() {
            tracing::warn!("regenerating after background failure: {err}");
        }

        let mut generated = 0usize;
        for coord in visible {
            if self.chunks.contains_key(&coord) {
                continue;
            }
            let chunk = self.generator.generate(coord)?;
            self.install(chunk);
            generated += 1;
        }

        tracing::debug!(
            "viewport ({center_x:.1}, {center_y:.1}): {} visible, {} generated",
            self.visible.len(),
            generated
        );
        Ok(())
    }

    /// Background variant of [`WorldManager::update_viewport`].
    ///
    /// Evicts chunks that left the viewport and queues generation of visible
    /// chunks that are neither loaded nor pending. Returns how many were
    /// queued. Without a worker pool this generates synchronously and
    /// returns 0; chunks the pool refuses are generated inline.
    ///
    /// # Errors
    ///
    /// As [`WorldManager::update_viewport`]; errors from earlier background
    /// jobs surface here too.
    pub fn request_viewport(&mut self, center_x: f64, center_y: f64) -> WorldResult<usize> {
        if self.pool.is_none() {
            self.update_viewport(center_x, center_y)?;
            return Ok(0);
        }

        let visible = self.visible_chunks(center_x, center_y)?;
        self.visible = visible.iter().copied().collect();

        let polled = self.poll_generated();
        self.evict_invisible();

        let missing: Vec<_> = visible
            .into_iter()
            .filter(|c| !self.chunks.contains_key(c) && !self.pending.contains(c))
            .collect();

        let mut queued = 0;
        for coord in missing {
            if self.pool.as_ref().is_some_and(|pool| pool.submit(coord)) {
                self.pending.insert(coord);
                queued += 1;
                continue;
            }
            tracing::warn!(
                "chunk workers unavailable, generating ({}, {}) inline",
                coord.x,
                coord.y
            );
            let chunk = self.generator.generate(coord)?;
            self.install(chunk);
        }
        polled?;
        Ok(queued)
    }

    /// Installs finished background chunks without blocking.
    ///
    /// Returns how many were installed.
    ///
    /// # Errors
    ///
    /// Returns the first generation error among the drained results; the
    /// rest are still processed.
    pub fn poll_generated(&mut self) -> WorldResult<usize> {
        let mut results = Vec::new();
        if let Some(pool) = &self.pool {
            while let Some(result) = pool.try_recv() {
                results.push(result);
            }
        }
        self.accept_results(results)
    }

    /// Blocks until every pending generation has finished, installing the
    /// visible ones.
    ///
    /// # Errors
    ///
    /// As [`WorldManager::poll_generated`].
    pub fn flush_pending(&mut self) -> WorldResult<usize> {
        let mut results = Vec::new();
        if let Some(pool) = &self.pool {
            let mut outstanding = self.pending.len();
            while outstanding > 0 {
                let Some(result) = pool.recv() else {
                    tracing::warn!("chunk workers exited with {outstanding} jobs outstanding");
                    break;
                };
                results.push(result);
                outstanding -= 1;
            }
        }
        let accepted = self.accept_results(results);
        self.pending.clear();
        accepted
    }

    /// The loaded chunk at `coord`. Never triggers generation.
    #[must_use]
    pub fn get_chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Lifecycle state of `coord`.
    #[must_use]
    pub fn chunk_state(&self, coord: ChunkCoord) -> ChunkState {
        if self.chunks.contains_key(&coord) {
            ChunkState::Loaded
        } else if self.pending.contains(&coord) {
            ChunkState::Pending
        } else {
            ChunkState::Unloaded
        }
    }

    /// Loaded coordinates, sorted row-major.
    #[must_use]
    pub fn loaded_coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<_> = self.chunks.keys().copied().collect();
        coords.sort_unstable_by_key(|c| (c.y, c.x));
        coords
    }

    /// Number of loaded chunks.
    #[must_use]
    pub fn loaded_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Iterates over loaded chunks in no particular order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    /// Terrain at world tile `(tile_x, tile_y)`, if its chunk is loaded.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn tile_at(&self, tile_x: i64, tile_y: i64) -> Option<TileType> {
        let size = self.config.chunk_size;
        let coord = ChunkCoord::from_tile_pos(tile_x, tile_y, size);
        let chunk = self.chunks.get(&coord)?;
        let (origin_x, origin_y) = coord.origin_tile(size);
        let local = GridPos::new((tile_x - origin_x) as usize, (tile_y - origin_y) as usize);
        chunk.tile(local).ok()
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> WorldStats {
        WorldStats {
            loaded: self.chunks.len(),
            pending: self.pending.len(),
            ..self.stats
        }
    }

    fn install(&mut self, chunk: Chunk) {
        self.chunks.insert(chunk.coord, chunk);
        self.stats.generated_this_session += 1;
    }

    fn evict_invisible(&mut self) {
        let visible = &self.visible;
        let before = self.chunks.len();
        self.chunks.retain(|coord, _| visible.contains(coord));
        let evicted = before - self.chunks.len();
        if evicted > 0 {
            self.stats.unloaded_this_session += evicted as u64;
            tracing::debug!("evicted {evicted} chunks");
        }
    }

    fn accept_results(&mut self, results: Vec<GenerationResult>) -> WorldResult<usize> {
        let mut installed = 0;
        let mut first_err = None;

        for GenerationResult { coord, chunk } in results {
            self.pending.remove(&coord);
            match chunk {
                Ok(chunk) if self.visible.contains(&coord) && !self.chunks.contains_key(&coord) => {
                    self.install(chunk);
                    installed += 1;
                }
                Ok(_) => {
                    self.stats.discarded_this_session += 1;
                    tracing::debug!("discarded chunk ({}, {}): no longer visible", coord.x, coord.y);
                }
                Err(err) => {
                    tracing::warn!("background generation of ({}, {}) failed: {err}", coord.x, coord.y);
                    first_err.get_or_insert(err);
                }
            }
        }

        first_err.map_or(Ok(installed), Err)
    }
}
