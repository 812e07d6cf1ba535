//! # Structure Placement
//!
//! Barns and silos are dropped onto farmland by rejection sampling. Each
//! structure gets a fixed budget of random draws; if none lands on a Field
//! cell the structure is skipped. A short placement list is a normal outcome.

use rand::Rng;

use crate::grid::{Grid, GridPos};
use crate::tile::TileType;

/// Default sampling budget per structure.
pub const DEFAULT_ATTEMPTS: u32 = 100;

/// Kinds of farm structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StructureKind {
    /// Barn.
    Barn,
    /// Grain silo.
    Silo,
}

impl StructureKind {
    /// Overlay tile written at the structure's position.
    #[inline]
    #[must_use]
    pub const fn tile(self) -> TileType {
        match self {
            Self::Barn => TileType::Barn,
            Self::Silo => TileType::Silo,
        }
    }

    /// Whether a structure may stand on `tile`.
    #[inline]
    #[must_use]
    pub const fn accepts(self, tile: TileType) -> bool {
        matches!(tile, TileType::Field)
    }
}

/// A structure and the cell it occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlacedStructure {
    /// What was placed.
    pub kind: StructureKind,
    /// Where it stands.
    pub position: GridPos,
}

/// Places up to `count` structures of `kind` on Field cells of `grid`.
///
/// Each placement writes the structure's overlay tile, so later draws (and
/// later calls) never stack two structures on one cell.
pub fn place<R: Rng + ?Sized>(
    grid: &mut Grid<TileType>,
    kind: StructureKind,
    count: usize,
    max_attempts: u32,
    rng: &mut R,
) -> Vec<PlacedStructure> {
    let mut placed = Vec::with_capacity(count);
    if grid.is_empty() {
        return placed;
    }

    for _ in 0..count {
        for _ in 0..max_attempts {
            let pos = GridPos::new(rng.gen_range(0..grid.width()), rng.gen_range(0..grid.height()));
            if kind.accepts(grid[pos]) {
                grid[pos] = kind.tile();
                placed.push(PlacedStructure { kind, position: pos });
                break;
            }
        }
    }

    if placed.len() < count {
        tracing::debug!(
            "placed {}/{} {:?} structures; ran out of attempts",
            placed.len(),
            count,
            kind
        );
    }
    placed
}
