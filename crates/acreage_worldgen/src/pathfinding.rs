//! # Grid Pathfinder
//!
//! Best-first (A*) search over a 2D grid with caller-supplied heuristic and
//! step cost.
//!
//! The search itself knows nothing about terrain. River carving and any other
//! feature that needs a route plug in their own preferences:
//!
//! ```rust,ignore
//! let path = find_path(&grid, start, goal, manhattan, |_, to| match grid[to] {
//!     TileType::Hill => None,
//!     _ => Some(1.0),
//! })?;
//! ```
//!
//! ## Optimality
//!
//! With an admissible, consistent heuristic the returned path has minimal
//! total cost. An inadmissible heuristic (such as the river heuristic, which
//! scales Manhattan distance down) still yields a valid path; it is simply
//! not guaranteed cheapest.
//!
//! ## Reproducibility
//!
//! Open nodes with equal estimated cost are expanded in insertion order, and
//! neighbours are generated in a fixed order, so identical inputs always give
//! the identical path.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::WorldResult;
use crate::grid::{Grid, GridPos, CARDINALS};

/// Ordered cells from start to goal, both inclusive.
pub type Path = Vec<GridPos>;

/// Manhattan distance heuristic.
#[must_use]
pub fn manhattan(from: GridPos, to: GridPos) -> f64 {
    from.manhattan(to) as f64
}

/// Manhattan distance scaled by `factor`.
///
/// Factors above 1.0 overestimate and trade optimality for speed; factors
/// below 1.0 underestimate.
pub fn scaled_manhattan(factor: f64) -> impl Fn(GridPos, GridPos) -> f64 {
    move |from, to| factor * manhattan(from, to)
}

/// Every step costs 1.
#[must_use]
pub fn unit_cost(_from: GridPos, _to: GridPos) -> Option<f64> {
    Some(1.0)
}

/// Finds a path from `start` to `goal`.
///
/// `heuristic(cell, goal)` estimates remaining cost. `step_cost(from, to)`
/// returns the cost of moving between 4-adjacent cells, or `None` when `to`
/// cannot be entered. Negative and non-finite costs are treated as
/// impassable.
///
/// Returns `Ok(None)` when the goal is unreachable.
///
/// # Errors
///
/// Returns [`crate::WorldError::InvalidCoordinate`] if `start` or `goal` lies
/// outside `grid`.
pub fn find_path<T, H, C>(
    grid: &Grid<T>,
    start: GridPos,
    goal: GridPos,
    heuristic: H,
    step_cost: C,
) -> WorldResult<Option<Path>>
where
    H: Fn(GridPos, GridPos) -> f64,
    C: Fn(GridPos, GridPos) -> Option<f64>,
{
    grid.get_ref(start)?;
    grid.get_ref(goal)?;

    let (width, height) = (grid.width(), grid.height());
    let mut cost_so_far = Grid::new(width, height, f64::INFINITY);
    let mut came_from: Grid<Option<GridPos>> = Grid::new(width, height, None);
    let mut closed = Grid::new(width, height, false);
    let mut open = BinaryHeap::new();
    let mut sequence = 0u64;

    cost_so_far[start] = 0.0;
    open.push(OpenNode {
        pos: start,
        cost: 0.0,
        estimate: heuristic(start, goal),
        sequence,
    });

    while let Some(current) = open.pop() {
        if closed[current.pos] || current.cost > cost_so_far[current.pos] {
            continue;
        }
        if current.pos == goal {
            return Ok(Some(reconstruct(&came_from, goal)));
        }
        closed[current.pos] = true;

        for (dx, dy) in CARDINALS {
            let Some(neighbor) = grid.offset(current.pos, dx, dy) else {
                continue;
            };
            if closed[neighbor] {
                continue;
            }
            let Some(step) = step_cost(current.pos, neighbor) else {
                continue;
            };
            if !step.is_finite() || step < 0.0 {
                continue;
            }

            let tentative = current.cost + step;
            if tentative < cost_so_far[neighbor] {
                cost_so_far[neighbor] = tentative;
                came_from[neighbor] = Some(current.pos);
                sequence += 1;
                open.push(OpenNode {
                    pos: neighbor,
                    cost: tentative,
                    estimate: tentative + heuristic(neighbor, goal),
                    sequence,
                });
            }
        }
    }

    Ok(None)
}

/// Sums `step_cost` along `path`.
///
/// Returns `None` if any step is impassable.
pub fn path_cost<C>(path: &[GridPos], step_cost: C) -> Option<f64>
where
    C: Fn(GridPos, GridPos) -> Option<f64>,
{
    path.windows(2).map(|w| step_cost(w[0], w[1])).sum()
}

fn reconstruct(came_from: &Grid<Option<GridPos>>, goal: GridPos) -> Path {
    let mut path = vec![goal];
    let mut node = goal;
    while let Some(prev) = came_from[node] {
        path.push(prev);
        node = prev;
    }
    path.reverse();
    path
}

/// Entry in the open set.
#[derive(Debug, Clone, Copy)]
struct OpenNode {
    pos: GridPos,
    cost: f64,
    estimate: f64,
    sequence: u64,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    // BinaryHeap is a max-heap: lowest estimate, then earliest insertion, wins.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .total_cmp(&self.estimate)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
