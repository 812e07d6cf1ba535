//! # Terrain Synthesis
//!
//! Turns a seed into a finished terrain grid.
//!
//! ## Pipeline
//!
//! ```text
//! solve ──> forests ──> farms ──> lakes ──> river (optional)
//! ```
//!
//! The order is fixed. Each stage takes the grid by value and hands it on,
//! and later stages may overwrite earlier ones (a lake can drown farmland,
//! a river can cut through a forest).
//!
//! Growth passes seed from a snapshot taken at the start of the pass:
//! cells a pass converts do not seed further patches in the same pass.
//!
//! ## Rivers
//!
//! Rivers are routed with [`find_path`] under a heuristic of 0.8x Manhattan
//! distance. Water steps cost 0.1 and grass 0.5, so the heuristic is not
//! admissible: river routes are valid but not cheapest, and they wander
//! along existing low ground instead of cutting straight lines.

use rand::Rng;

use crate::config::{GrowthConfig, RiverConfig, WorldConfig};
use crate::error::WorldResult;
use crate::grid::{Grid, GridPos};
use crate::pathfinding::{find_path, scaled_manhattan};
use crate::seed::ChunkSeed;
use crate::solver::ConstraintSolver;
use crate::tile::TileType;

/// Forest patches convert this many cells, `[min, max)`.
pub const FOREST_CLUSTER: (usize, usize) = (5, 15);
/// Farm rectangles have sides in `[min, max)`.
pub const FARM_SIDE: (usize, usize) = (3, 8);
/// Lake patches convert this many cells, `[min, max)`.
pub const LAKE_CLUSTER: (usize, usize) = (5, 20);
/// Patch offsets are drawn from `[-PATCH_RADIUS, PATCH_RADIUS]`, a 5x5 window.
pub const PATCH_RADIUS: isize = 2;
/// Share of forest conversions that become Tree rather than Bush.
pub const TREE_SHARE: f64 = 0.7;
/// River heuristic scale.
pub const RIVER_HEURISTIC_SCALE: f64 = 0.8;

/// Cost of carving a river into a cell of type `tile`.
#[must_use]
pub const fn river_cost(tile: TileType) -> f64 {
    match tile {
        TileType::Water => 0.1,
        TileType::Grass => 0.5,
        TileType::Tree => 2.0,
        TileType::Hill => 5.0,
        TileType::Field
        | TileType::Bush
        | TileType::Road
        | TileType::Barn
        | TileType::Silo => 1.0,
    }
}

/// Seeded terrain generator.
#[derive(Clone, Debug)]
pub struct TerrainSynthesizer {
    solver: ConstraintSolver,
    growth: GrowthConfig,
    river: RiverConfig,
    solver_attempts: u32,
}

impl TerrainSynthesizer {
    /// Creates a synthesizer over the canonical tile rules.
    #[must_use]
    pub fn new(growth: GrowthConfig, river: RiverConfig, solver_attempts: u32) -> Self {
        Self {
            solver: ConstraintSolver::canonical(),
            growth,
            river,
            solver_attempts,
        }
    }

    /// Creates a synthesizer from world configuration.
    #[must_use]
    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(
            config.growth.clone(),
            config.river.clone(),
            config.solver.max_attempts,
        )
    }

    /// Replaces the base-pass solver.
    #[must_use]
    pub fn with_solver(mut self, solver: ConstraintSolver) -> Self {
        self.solver = solver;
        self
    }

    /// Configured growth probabilities.
    #[must_use]
    pub const fn growth(&self) -> &GrowthConfig {
        &self.growth
    }

    /// Generates a `width` x `height` grid from `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WorldError::UnsolvableConstraints`] if the base pass
    /// fails even after recovery.
    pub fn generate(&self, width: usize, height: usize, seed: ChunkSeed) -> WorldResult<Grid<TileType>> {
        let mut rng = seed.rng();
        self.generate_with_rng(width, height, &mut rng)
    }

    /// Generates a grid, drawing every random decision from `rng`.
    ///
    /// # Errors
    ///
    /// See [`TerrainSynthesizer::generate`].
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        width: usize,
        height: usize,
        rng: &mut R,
    ) -> WorldResult<Grid<TileType>> {
        self.synthesize(width, height, &self.growth, rng)
    }

    /// Runs the pipeline with `growth` in place of the configured probabilities.
    ///
    /// # Errors
    ///
    /// See [`TerrainSynthesizer::generate`].
    pub fn synthesize<R: Rng + ?Sized>(
        &self,
        width: usize,
        height: usize,
        growth: &GrowthConfig,
        rng: &mut R,
    ) -> WorldResult<Grid<TileType>> {
        let grid = self
            .solver
            .solve_with_recovery(width, height, self.solver_attempts, rng)?;
        let grid = grow_forests(grid, growth.forest_probability, rng);
        let grid = grow_farms(grid, growth.farm_probability, rng);
        let grid = grow_lakes(grid, growth.lake_probability, rng);

        if !self.river.enabled {
            return Ok(grid);
        }
        match river_endpoints(width, height, &self.river, rng) {
            Some((start, end)) => carve_river(grid, start, end),
            None => Ok(grid),
        }
    }
}

impl Default for TerrainSynthesizer {
    fn default() -> Self {
        Self::new(GrowthConfig::default(), RiverConfig::default(), 3)
    }
}

/// Grows forest patches around existing trees.
///
/// Each Tree cell seeds a patch with `probability`; the patch converts Grass
/// within a 5x5 window to Tree or Bush.
pub fn grow_forests<R: Rng + ?Sized>(
    mut grid: Grid<TileType>,
    probability: f64,
    rng: &mut R,
) -> Grid<TileType> {
    for seed in seeds_of(&grid, TileType::Tree) {
        if !roll(probability, rng) {
            continue;
        }
        let size = rng.gen_range(FOREST_CLUSTER.0..FOREST_CLUSTER.1);
        for _ in 0..size {
            let Some(pos) = random_offset(&grid, seed, rng) else {
                continue;
            };
            if grid[pos] == TileType::Grass {
                grid[pos] = if roll(TREE_SHARE, rng) {
                    TileType::Tree
                } else {
                    TileType::Bush
                };
            }
        }
    }
    grid
}

/// Grows rectangular farms from existing fields.
///
/// Each Field cell seeds, with `probability`, a rectangle extending right and
/// down from it; Grass inside the rectangle becomes Field.
pub fn grow_farms<R: Rng + ?Sized>(
    mut grid: Grid<TileType>,
    probability: f64,
    rng: &mut R,
) -> Grid<TileType> {
    for seed in seeds_of(&grid, TileType::Field) {
        if !roll(probability, rng) {
            continue;
        }
        let cols = rng.gen_range(FARM_SIDE.0..FARM_SIDE.1);
        let rows = rng.gen_range(FARM_SIDE.0..FARM_SIDE.1);
        let x_end = (seed.x + cols).min(grid.width());
        let y_end = (seed.y + rows).min(grid.height());
        for y in seed.y..y_end {
            for x in seed.x..x_end {
                let pos = GridPos::new(x, y);
                if grid[pos] == TileType::Grass {
                    grid[pos] = TileType::Field;
                }
            }
        }
    }
    grid
}

/// Grows lakes from existing water.
///
/// Each Water cell seeds a patch with `probability`; the patch converts Grass
/// and Water within a 5x5 window to Water.
pub fn grow_lakes<R: Rng + ?Sized>(
    mut grid: Grid<TileType>,
    probability: f64,
    rng: &mut R,
) -> Grid<TileType> {
    for seed in seeds_of(&grid, TileType::Water) {
        if !roll(probability, rng) {
            continue;
        }
        let size = rng.gen_range(LAKE_CLUSTER.0..LAKE_CLUSTER.1);
        for _ in 0..size {
            let Some(pos) = random_offset(&grid, seed, rng) else {
                continue;
            };
            if matches!(grid[pos], TileType::Grass | TileType::Water) {
                grid[pos] = TileType::Water;
            }
        }
    }
    grid
}

/// Carves a river from `start` to `end`, turning every path cell to Water.
///
/// If no route exists the grid is returned unchanged.
///
/// # Errors
///
/// Returns [`crate::WorldError::InvalidCoordinate`] if an endpoint lies
/// outside the grid.
pub fn carve_river(
    mut grid: Grid<TileType>,
    start: GridPos,
    end: GridPos,
) -> WorldResult<Grid<TileType>> {
    let path = find_path(
        &grid,
        start,
        end,
        scaled_manhattan(RIVER_HEURISTIC_SCALE),
        |_, to| Some(river_cost(grid[to])),
    )?;

    match path {
        Some(path) => {
            tracing::trace!("river carved through {} cells", path.len());
            for pos in path {
                grid[pos] = TileType::Water;
            }
        }
        None => {
            tracing::debug!(
                "no river route from ({}, {}) to ({}, {})",
                start.x,
                start.y,
                end.x,
                end.y
            );
        }
    }
    Ok(grid)
}

/// Resolves river endpoints for a `width` x `height` grid.
///
/// Configured fractional points are scaled onto the grid. A missing start is
/// drawn on the top edge and a missing end on the bottom edge. Returns `None`
/// for an empty grid.
pub fn river_endpoints<R: Rng + ?Sized>(
    width: usize,
    height: usize,
    river: &RiverConfig,
    rng: &mut R,
) -> Option<(GridPos, GridPos)> {
    if width == 0 || height == 0 {
        return None;
    }
    let start = match river.start {
        Some(point) => scale_point(point, width, height),
        None => GridPos::new(rng.gen_range(0..width), 0),
    };
    let end = match river.end {
        Some(point) => scale_point(point, width, height),
        None => GridPos::new(rng.gen_range(0..width), height - 1),
    };
    Some((start, end))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale_point([fx, fy]: [f64; 2], width: usize, height: usize) -> GridPos {
    let scale = |f: f64, len: usize| {
        let max = len - 1;
        ((f.clamp(0.0, 1.0) * max as f64).round() as usize).min(max)
    };
    GridPos::new(scale(fx, width), scale(fy, height))
}

fn seeds_of(grid: &Grid<TileType>, tile: TileType) -> Vec<GridPos> {
    grid.positions().filter(|&pos| grid[pos] == tile).collect()
}

fn random_offset<R: Rng + ?Sized>(grid: &Grid<TileType>, origin: GridPos, rng: &mut R) -> Option<GridPos> {
    let dx = rng.gen_range(-PATCH_RADIUS..=PATCH_RADIUS);
    let dy = rng.gen_range(-PATCH_RADIUS..=PATCH_RADIUS);
    grid.offset(origin, dx, dy)
}

fn roll<R: Rng + ?Sized>(probability: f64, rng: &mut R) -> bool {
    rng.gen::<f64>() < probability
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn grass_with(width: usize, height: usize, seeds: &[(usize, usize, TileType)]) -> Grid<TileType> {
        let mut grid = Grid::new(width, height, TileType::Grass);
        for &(x, y, tile) in seeds {
            grid[GridPos::new(x, y)] = tile;
        }
        grid
    }

    fn changed(before: &Grid<TileType>, after: &Grid<TileType>) -> Vec<GridPos> {
        before.positions().filter(|&p| before[p] != after[p]).collect()
    }

    #[test]
    fn test_generate_is_deterministic() {
        let synth = TerrainSynthesizer::default();
        let seed = ChunkSeed::new(4242);

        let a = synth.generate(24, 24, seed).unwrap();
        let b = synth.generate(24, 24, seed).unwrap();
        assert_eq!(a, b);

        let c = synth.generate(24, 24, ChunkSeed::new(4243)).unwrap();
        assert_ne!(a, c, "different seeds produced identical terrain");
    }

    #[test]
    fn test_generate_uses_only_base_tiles() {
        let synth = TerrainSynthesizer::default();
        let grid = synth.generate(32, 32, ChunkSeed::new(7)).unwrap();

        assert_eq!(grid.len(), 32 * 32);
        assert!(grid.cells().iter().all(|t| TileType::BASE.contains(t)));
        println!("{grid}");
    }

    #[test]
    fn test_forest_growth_converts_only_grass_near_seed() {
        let before = grass_with(15, 15, &[(7, 7, TileType::Tree), (8, 7, TileType::Hill)]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let after = grow_forests(before.clone(), 1.0, &mut rng);

        let diff = changed(&before, &after);
        assert!(!diff.is_empty());
        // One seed: at most one cluster worth of conversions.
        assert!(diff.len() < FOREST_CLUSTER.1);
        for pos in diff {
            assert_eq!(before[pos], TileType::Grass);
            assert!(matches!(after[pos], TileType::Tree | TileType::Bush));
            assert!(pos.x.abs_diff(7) <= 2 && pos.y.abs_diff(7) <= 2);
        }
        assert_eq!(after[GridPos::new(8, 7)], TileType::Hill);
    }

    #[test]
    fn test_zero_probability_leaves_grid_untouched() {
        let before = grass_with(10, 10, &[(1, 1, TileType::Tree), (5, 5, TileType::Field), (8, 2, TileType::Water)]);
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let after = grow_forests(before.clone(), 0.0, &mut rng);
        let after = grow_farms(after, 0.0, &mut rng);
        let after = grow_lakes(after, 0.0, &mut rng);
        assert_eq!(before, after);
    }

    #[test]
    fn test_farm_growth_fills_rectangle() {
        let before = grass_with(12, 12, &[(2, 3, TileType::Field), (4, 4, TileType::Water)]);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let after = grow_farms(before.clone(), 1.0, &mut rng);

        let diff = changed(&before, &after);
        assert!(diff.len() >= FARM_SIDE.0 * FARM_SIDE.0 - 2);
        for pos in &diff {
            assert_eq!(after[*pos], TileType::Field);
            assert!((2..2 + FARM_SIDE.1 - 1).contains(&pos.x));
            assert!((3..3 + FARM_SIDE.1 - 1).contains(&pos.y));
        }
        assert_eq!(after[GridPos::new(4, 4)], TileType::Water);
    }

    #[test]
    fn test_farm_growth_clips_at_edges() {
        let before = grass_with(4, 4, &[(3, 3, TileType::Field)]);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let after = grow_farms(before.clone(), 1.0, &mut rng);
        assert_eq!(before, after);
    }

    #[test]
    fn test_lake_growth_spares_other_terrain() {
        let mut before = Grid::new(9, 9, TileType::Hill);
        before[GridPos::new(4, 4)] = TileType::Water;
        before[GridPos::new(3, 4)] = TileType::Grass;
        before[GridPos::new(5, 4)] = TileType::Grass;

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let after = grow_lakes(before.clone(), 1.0, &mut rng);

        for pos in changed(&before, &after) {
            assert_eq!(before[pos], TileType::Grass);
            assert_eq!(after[pos], TileType::Water);
        }
        assert_eq!(after.cells().iter().filter(|&&t| t == TileType::Hill).count(), 78);
    }

    #[test]
    fn test_river_prefers_grass_over_hills() {
        // Hill band across the middle with a single grass gap at x = 1.
        let mut grid = Grid::new(10, 9, TileType::Grass);
        for x in 0..10 {
            if x != 1 {
                grid[GridPos::new(x, 4)] = TileType::Hill;
            }
        }

        let river = carve_river(grid.clone(), GridPos::new(0, 0), GridPos::new(0, 8)).unwrap();
        assert_eq!(river[GridPos::new(1, 4)], TileType::Water);
        assert_eq!(river[GridPos::new(0, 0)], TileType::Water);
        assert_eq!(river[GridPos::new(0, 8)], TileType::Water);
        for x in (0..10).filter(|&x| x != 1) {
            assert_eq!(river[GridPos::new(x, 4)], TileType::Hill);
        }
        for pos in changed(&grid, &river) {
            assert_eq!(river[pos], TileType::Water);
        }
    }

    #[test]
    fn test_river_endpoint_out_of_bounds() {
        let grid = Grid::new(4, 4, TileType::Grass);
        assert!(carve_river(grid, GridPos::new(0, 0), GridPos::new(0, 4)).is_err());
    }

    #[test]
    fn test_river_endpoints_scale_and_sample() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let configured = RiverConfig {
            enabled: true,
            start: Some([0.5, 0.0]),
            end: Some([1.0, 1.0]),
        };
        let (start, end) = river_endpoints(11, 21, &configured, &mut rng).unwrap();
        assert_eq!(start, GridPos::new(5, 0));
        assert_eq!(end, GridPos::new(10, 20));

        let sampled = RiverConfig { enabled: true, ..RiverConfig::default() };
        let (start, end) = river_endpoints(11, 21, &sampled, &mut rng).unwrap();
        assert_eq!(start.y, 0);
        assert_eq!(end.y, 20);
        assert!(start.x < 11 && end.x < 11);

        assert!(river_endpoints(0, 5, &sampled, &mut rng).is_none());
    }

    #[test]
    fn test_river_enabled_pipeline_connects_edges() {
        let river = RiverConfig {
            enabled: true,
            start: Some([0.0, 0.0]),
            end: Some([1.0, 1.0]),
        };
        let synth = TerrainSynthesizer::new(GrowthConfig::default(), river, 3);
        let grid = synth.generate(16, 16, ChunkSeed::new(99)).unwrap();

        assert_eq!(grid[GridPos::new(0, 0)], TileType::Water);
        assert_eq!(grid[GridPos::new(15, 15)], TileType::Water);
    }

    #[test]
    fn test_river_costs_follow_terrain() {
        assert!(river_cost(TileType::Water) < river_cost(TileType::Grass));
        assert!(river_cost(TileType::Grass) < river_cost(TileType::Field));
        assert!(river_cost(TileType::Field) < river_cost(TileType::Hill));
    }
}
