//! # Road Placement
//!
//! Roads run along the edges of farmland: a Field cell with at least one
//! 4-neighbour that is not Field is a road cell. Grid borders do not count
//! as non-Field neighbours.
//!
//! The overlay marks edge cells only. Nothing here traces them into a
//! connected network; linking farm clusters would need a pathfinding pass
//! between them.

use crate::grid::Grid;
use crate::tile::TileType;

/// Marks road cells of `grid`.
#[must_use]
pub fn place(grid: &Grid<TileType>) -> Grid<bool> {
    Grid::from_fn(grid.width(), grid.height(), |pos| {
        grid[pos] == TileType::Field
            && grid.neighbors4(pos).any(|n| grid[n] != TileType::Field)
    })
}

/// Number of road cells in an overlay.
#[must_use]
pub fn road_count(roads: &Grid<bool>) -> usize {
    roads.cells().iter().filter(|&&road| road).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridPos;

    #[test]
    fn test_marks_farm_border_only() {
        // 5x5 farm in a 7x7 meadow.
        let grid = Grid::from_fn(7, 7, |p| {
            if (1..6).contains(&p.x) && (1..6).contains(&p.y) {
                TileType::Field
            } else {
                TileType::Grass
            }
        });
        let roads = place(&grid);

        assert_eq!(road_count(&roads), 16);
        assert!(roads[GridPos::new(1, 1)]);
        assert!(roads[GridPos::new(5, 3)]);
        assert!(!roads[GridPos::new(3, 3)]);
        assert!(!roads[GridPos::new(0, 0)]);
    }

    #[test]
    fn test_grid_edge_is_not_a_boundary() {
        let grid = Grid::new(4, 4, TileType::Field);
        assert_eq!(road_count(&place(&grid)), 0);
    }

    #[test]
    fn test_structures_break_farmland() {
        let mut grid = Grid::new(3, 3, TileType::Field);
        grid[GridPos::new(1, 1)] = TileType::Barn;
        let roads = place(&grid);

        assert_eq!(road_count(&roads), 4);
        assert!(roads[GridPos::new(1, 0)]);
        assert!(!roads[GridPos::new(0, 0)]);
        assert!(!roads[GridPos::new(1, 1)]);
    }
}
