//! # Constraint Terrain Solver
//!
//! Wave-function-collapse over a tile grid.
//!
//! ## Algorithm
//!
//! Each cell starts with a domain holding every tile in the [`TileSet`].
//! Until every domain is a singleton:
//!
//! 1. Pick the cell with the smallest domain larger than one (ties broken
//!    uniformly with the supplied RNG).
//! 2. Collapse it by weighted sampling over its remaining candidates.
//! 3. Propagate through a worklist: a processed cell restricts each
//!    4-directional neighbour to tiles that may border one of its own
//!    candidates, with the rule holding in both directions. Neighbours that
//!    shrink are queued in turn.
//!
//! A domain that empties is a contradiction and surfaces as
//! [`WorldError::UnsolvableConstraints`]; no grid with undefined tiles is ever
//! returned.
//!
//! ## Determinism
//!
//! All choices draw from the caller's RNG. Given the same seed the solver
//! visits cells in the same order and produces the same grid.

use std::collections::VecDeque;

use rand::Rng;

use crate::error::{WorldError, WorldResult};
use crate::grid::{Grid, GridPos, CARDINALS};
use crate::tile::{AdjacencyTable, TileMask, TileSet, TileType};

/// Solves tile grids under adjacency constraints.
#[derive(Clone, Debug)]
pub struct ConstraintSolver {
    tiles: TileSet,
    adjacency: AdjacencyTable,
    constraints: AdjacencyTable,
}

impl ConstraintSolver {
    /// Creates a solver after validating the adjacency table.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidAdjacency`] if a tile has an empty
    /// neighbour set or may not border itself.
    pub fn new(tiles: TileSet, adjacency: AdjacencyTable) -> WorldResult<Self> {
        adjacency.validate(tiles.tiles())?;
        if !adjacency.is_symmetric() {
            tracing::debug!("adjacency table is asymmetric; both rule directions are enforced");
        }
        let constraints = adjacency.mutual();
        Ok(Self {
            tiles,
            adjacency,
            constraints,
        })
    }

    /// Solver over the canonical base terrain set.
    #[must_use]
    pub fn canonical() -> Self {
        let adjacency = AdjacencyTable::canonical();
        Self {
            tiles: TileSet::canonical(),
            constraints: adjacency.mutual(),
            adjacency,
        }
    }

    /// The tile set being solved for.
    #[must_use]
    pub const fn tiles(&self) -> &TileSet {
        &self.tiles
    }

    /// The adjacency rules in force.
    #[must_use]
    pub const fn adjacency(&self) -> &AdjacencyTable {
        &self.adjacency
    }

    /// Solves a `width` x `height` grid.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnsolvableConstraints`] on contradiction.
    pub fn solve<R: Rng + ?Sized>(
        &self,
        width: usize,
        height: usize,
        rng: &mut R,
    ) -> WorldResult<Grid<TileType>> {
        self.solve_pinned(width, height, &[], rng)
    }

    /// Solves a grid with some cells fixed in advance.
    ///
    /// Pinned cells are collapsed and propagated before the main loop.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidCoordinate`] for a pin outside the grid and
    /// [`WorldError::UnsolvableConstraints`] on contradiction (including a pin
    /// the tile set cannot hold).
    pub fn solve_pinned<R: Rng + ?Sized>(
        &self,
        width: usize,
        height: usize,
        pins: &[(GridPos, TileType)],
        rng: &mut R,
    ) -> WorldResult<Grid<TileType>> {
        let mut wave = Wave::new(width, height, self.tiles.tiles());

        for &(pos, tile) in pins {
            let narrowed = wave.domains.get(pos)?.intersection(TileMask::single(tile));
            if narrowed.is_empty() {
                return Err(WorldError::UnsolvableConstraints { x: pos.x, y: pos.y });
            }
            wave.domains[pos] = narrowed;
            wave.propagate(pos, &self.constraints)?;
        }

        while let Some(pos) = wave.min_entropy_cell(rng) {
            let domain = wave.domains[pos];
            let tile = self
                .tiles
                .sample(domain, rng)
                .ok_or(WorldError::UnsolvableConstraints { x: pos.x, y: pos.y })?;
            wave.domains[pos] = TileMask::single(tile);
            wave.propagate(pos, &self.constraints)?;
        }

        wave.into_grid()
    }

    /// Solves with the recovery policy used by terrain synthesis.
    ///
    /// Tries `attempts` times with fresh draws from `rng`, then once more
    /// with [`AdjacencyTable::relaxed`] around the heaviest tile. With
    /// `attempts == 0` the relaxed table is used straight away.
    ///
    /// # Errors
    ///
    /// Returns the last [`WorldError::UnsolvableConstraints`] if even the
    /// relaxed table fails.
    pub fn solve_with_recovery<R: Rng + ?Sized>(
        &self,
        width: usize,
        height: usize,
        attempts: u32,
        rng: &mut R,
    ) -> WorldResult<Grid<TileType>> {
        self.solve_pinned_with_recovery(width, height, &[], attempts, rng)
    }

    /// [`ConstraintSolver::solve_with_recovery`] with pinned cells.
    ///
    /// Pins are kept through every retry, including the relaxed one.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidCoordinate`] for a pin outside the grid
    /// without retrying, and the last [`WorldError::UnsolvableConstraints`]
    /// if even the relaxed table fails.
    pub fn solve_pinned_with_recovery<R: Rng + ?Sized>(
        &self,
        width: usize,
        height: usize,
        pins: &[(GridPos, TileType)],
        attempts: u32,
        rng: &mut R,
    ) -> WorldResult<Grid<TileType>> {
        let mut last_err = None;
        for attempt in 1..=attempts {
            match self.solve_pinned(width, height, pins, rng) {
                Ok(grid) => return Ok(grid),
                Err(err @ WorldError::UnsolvableConstraints { .. }) => {
                    tracing::warn!("terrain solve attempt {attempt}/{attempts} failed: {err}");
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        let Some(fallback) = self.heaviest_tile() else {
            return Err(last_err.unwrap_or(WorldError::UnsolvableConstraints { x: 0, y: 0 }));
        };
        tracing::warn!("solving terrain with relaxed adjacency around {fallback:?}");
        self.relaxed(fallback).solve_pinned(width, height, pins, rng)
    }

    /// Copy of this solver over [`AdjacencyTable::relaxed`] around `fallback`.
    #[must_use]
    pub fn relaxed(&self, fallback: TileType) -> Self {
        let adjacency = self.adjacency.relaxed(self.tiles.tiles(), fallback);
        Self {
            tiles: self.tiles.clone(),
            constraints: adjacency.mutual(),
            adjacency,
        }
    }

    fn heaviest_tile(&self) -> Option<TileType> {
        self.tiles
            .tiles()
            .iter()
            .max_by_key(|&t| self.tiles.weight(t))
    }
}

/// Solves with the canonical terrain rules.
///
/// # Errors
///
/// Returns [`WorldError::InvalidAdjacency`] for a malformed table and
/// [`WorldError::UnsolvableConstraints`] on contradiction.
pub fn solve<R: Rng + ?Sized>(
    width: usize,
    height: usize,
    tiles: &TileSet,
    adjacency: &AdjacencyTable,
    rng: &mut R,
) -> WorldResult<Grid<TileType>> {
    ConstraintSolver::new(tiles.clone(), adjacency.clone())?.solve(width, height, rng)
}

/// First pair of 4-neighbours violating `adjacency`, scanning in raster order.
///
/// Overlay tiles are skipped; they are painted after solving.
#[must_use]
pub fn first_violation(
    grid: &Grid<TileType>,
    adjacency: &AdjacencyTable,
) -> Option<(GridPos, GridPos)> {
    grid.positions().find_map(|pos| {
        let tile = grid[pos];
        if tile.is_overlay() {
            return None;
        }
        grid.neighbors4(pos)
            .find(|&n| !grid[n].is_overlay() && !adjacency.allows(tile, grid[n]))
            .map(|n| (pos, n))
    })
}

/// Per-cell candidate sets during a solve.
struct Wave {
    domains: Grid<TileMask>,
    queue: VecDeque<GridPos>,
    queued: Grid<bool>,
    candidates: Vec<GridPos>,
}

impl Wave {
    fn new(width: usize, height: usize, tiles: TileMask) -> Self {
        Self {
            domains: Grid::new(width, height, tiles),
            queue: VecDeque::new(),
            queued: Grid::new(width, height, false),
            candidates: Vec::new(),
        }
    }

    /// Uncollapsed cell with the fewest candidates, ties broken by `rng`.
    fn min_entropy_cell<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<GridPos> {
        let mut min_entropy = usize::MAX;
        self.candidates.clear();

        for pos in self.domains.positions() {
            let entropy = self.domains[pos].len();
            if entropy <= 1 {
                continue;
            }
            if entropy < min_entropy {
                min_entropy = entropy;
                self.candidates.clear();
                self.candidates.push(pos);
            } else if entropy == min_entropy {
                self.candidates.push(pos);
            }
        }

        if self.candidates.is_empty() {
            return None;
        }
        let pick = rng.gen_range(0..self.candidates.len());
        Some(self.candidates[pick])
    }

    fn propagate(&mut self, start: GridPos, adjacency: &AdjacencyTable) -> WorldResult<()> {
        self.queue.clear();
        self.queue.push_back(start);
        self.queued[start] = true;

        while let Some(pos) = self.queue.pop_front() {
            self.queued[pos] = false;
            let support = adjacency.supported_by(self.domains[pos]);

            for (dx, dy) in CARDINALS {
                let Some(neighbor) = self.domains.offset(pos, dx, dy) else {
                    continue;
                };
                let before = self.domains[neighbor];
                let after = before.intersection(support);
                if after == before {
                    continue;
                }
                if after.is_empty() {
                    return Err(WorldError::UnsolvableConstraints {
                        x: neighbor.x,
                        y: neighbor.y,
                    });
                }
                self.domains[neighbor] = after;
                if !self.queued[neighbor] {
                    self.queued[neighbor] = true;
                    self.queue.push_back(neighbor);
                }
            }
        }

        Ok(())
    }

    fn into_grid(self) -> WorldResult<Grid<TileType>> {
        self.domains.try_map(|pos, domain| {
            domain
                .only()
                .ok_or(WorldError::UnsolvableConstraints { x: pos.x, y: pos.y })
        })
    }
}
