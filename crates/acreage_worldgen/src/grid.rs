//! # Tile Grids
//!
//! A rectangular, row-major array used for terrain and overlay layers.
//!
//! Access comes in two flavours:
//! - [`Grid::get`] / [`Grid::set`] return [`WorldError::InvalidCoordinate`]
//!   for out-of-bounds positions, for callers holding untrusted coordinates.
//! - `grid[pos]` panics on out-of-bounds access, for internal passes whose
//!   positions come from the grid itself.
//!
//! Neither path ever substitutes a default tile for a bad coordinate.

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::error::{WorldError, WorldResult};
use crate::tile::TileType;

/// A cell position inside a grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPos {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
}

impl GridPos {
    /// Creates a new position.
    #[inline]
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to `other`.
    #[inline]
    #[must_use]
    pub const fn manhattan(self, other: Self) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// The four cardinal offsets, in a fixed order (up, down, left, right).
pub const CARDINALS: [(isize, isize); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// A width x height array of cells.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Creates a grid with every cell set to `fill`.
    #[must_use]
    pub fn new(width: usize, height: usize, fill: T) -> Self {
        Self {
            width,
            height,
            cells: vec![fill; width * height],
        }
    }
}

impl<T> Grid<T> {
    /// Creates a grid by evaluating `f` at each position in raster order.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(GridPos) -> T) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(GridPos::new(x, y)));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    /// Grid width in cells.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true for a zero-area grid.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns true if `pos` lies inside the grid.
    #[inline]
    #[must_use]
    pub const fn contains(&self, pos: GridPos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Row-major cell storage.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// Checked shared access.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidCoordinate`] if `pos` is out of bounds.
    pub fn get_ref(&self, pos: GridPos) -> WorldResult<&T> {
        let idx = self.checked_index(pos)?;
        Ok(&self.cells[idx])
    }

    /// Checked write.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidCoordinate`] if `pos` is out of bounds.
    pub fn set(&mut self, pos: GridPos, value: T) -> WorldResult<()> {
        let idx = self.checked_index(pos)?;
        self.cells[idx] = value;
        Ok(())
    }

    /// Position offset by `(dx, dy)`, if it stays inside the grid.
    #[inline]
    #[must_use]
    pub fn offset(&self, pos: GridPos, dx: isize, dy: isize) -> Option<GridPos> {
        let x = pos.x.checked_add_signed(dx)?;
        let y = pos.y.checked_add_signed(dy)?;
        let moved = GridPos::new(x, y);
        self.contains(moved).then_some(moved)
    }

    /// In-bounds 4-directional neighbours of `pos`.
    pub fn neighbors4(&self, pos: GridPos) -> impl Iterator<Item = GridPos> + '_ {
        CARDINALS
            .into_iter()
            .filter_map(move |(dx, dy)| self.offset(pos, dx, dy))
    }

    /// Every position in raster order.
    pub fn positions(&self) -> impl Iterator<Item = GridPos> {
        let width = self.width;
        (0..self.cells.len()).map(move |i| GridPos::new(i % width, i / width))
    }

    /// Applies `f` to every cell, producing a grid of the same shape.
    #[must_use]
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            cells: self.cells.iter().map(f).collect(),
        }
    }

    /// Fallible [`Grid::map`] that also sees each position.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`, in raster order.
    pub fn try_map<U, E>(
        &self,
        mut f: impl FnMut(GridPos, &T) -> Result<U, E>,
    ) -> Result<Grid<U>, E> {
        let cells = self
            .positions()
            .zip(&self.cells)
            .map(|(pos, cell)| f(pos, cell))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Grid {
            width: self.width,
            height: self.height,
            cells,
        })
    }

    fn checked_index(&self, pos: GridPos) -> WorldResult<usize> {
        if self.contains(pos) {
            Ok(pos.y * self.width + pos.x)
        } else {
            Err(WorldError::InvalidCoordinate {
                x: pos.x,
                y: pos.y,
                width: self.width,
                height: self.height,
            })
        }
    }
}

impl<T: Copy> Grid<T> {
    /// Checked read.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidCoordinate`] if `pos` is out of bounds.
    #[inline]
    pub fn get(&self, pos: GridPos) -> WorldResult<T> {
        self.get_ref(pos).copied()
    }
}

impl<T> Index<GridPos> for Grid<T> {
    type Output = T;

    fn index(&self, pos: GridPos) -> &T {
        assert!(
            self.contains(pos),
            "grid position ({}, {}) out of bounds for {}x{} grid",
            pos.x,
            pos.y,
            self.width,
            self.height
        );
        &self.cells[pos.y * self.width + pos.x]
    }
}

impl<T> IndexMut<GridPos> for Grid<T> {
    fn index_mut(&mut self, pos: GridPos) -> &mut T {
        assert!(
            self.contains(pos),
            "grid position ({}, {}) out of bounds for {}x{} grid",
            pos.x,
            pos.y,
            self.width,
            self.height
        );
        &mut self.cells[pos.y * self.width + pos.x]
    }
}

impl fmt::Display for Grid<TileType> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.width.max(1)) {
            for tile in row {
                write!(f, "{}", tile.glyph())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_access_rejects_out_of_bounds() {
        let mut grid = Grid::new(4, 3, TileType::Grass);

        assert_eq!(grid.get(GridPos::new(3, 2)), Ok(TileType::Grass));
        assert_eq!(
            grid.get(GridPos::new(4, 0)),
            Err(WorldError::InvalidCoordinate {
                x: 4,
                y: 0,
                width: 4,
                height: 3
            })
        );
        assert!(grid.set(GridPos::new(0, 3), TileType::Water).is_err());
        assert!(grid.cells().iter().all(|&t| t == TileType::Grass));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_index_panics_out_of_bounds() {
        let grid = Grid::new(2, 2, false);
        let _value: bool = grid[GridPos::new(2, 0)];
    }

    #[test]
    fn test_neighbors_clip_at_edges() {
        let grid = Grid::new(3, 3, 0u8);

        let corner: Vec<_> = grid.neighbors4(GridPos::new(0, 0)).collect();
        assert_eq!(corner, vec![GridPos::new(0, 1), GridPos::new(1, 0)]);

        let centre: Vec<_> = grid.neighbors4(GridPos::new(1, 1)).collect();
        assert_eq!(centre.len(), 4);
    }

    #[test]
    fn test_positions_are_raster_order() {
        let grid = Grid::from_fn(3, 2, |p| p.y * 10 + p.x);
        let positions: Vec<_> = grid.positions().collect();

        assert_eq!(positions.len(), 6);
        assert_eq!(positions[0], GridPos::new(0, 0));
        assert_eq!(positions[4], GridPos::new(1, 1));
        for pos in positions {
            assert_eq!(grid[pos], pos.y * 10 + pos.x);
        }
    }

    #[test]
    fn test_display_renders_glyphs() {
        let mut grid = Grid::new(3, 2, TileType::Grass);
        grid[GridPos::new(1, 0)] = TileType::Water;
        grid[GridPos::new(2, 1)] = TileType::Barn;

        assert_eq!(grid.to_string(), ".~.\n..B\n");
    }

    #[test]
    fn test_manhattan() {
        assert_eq!(GridPos::new(1, 4).manhattan(GridPos::new(3, 1)), 5);
    }
}
