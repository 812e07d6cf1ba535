//! # World Generation Error Types
//!
//! All errors that can surface from terrain synthesis and chunk streaming.
//!
//! Two failure modes are deliberately *not* errors:
//! - An unreachable pathfinding goal is an absent path (`None`).
//! - Placing fewer structures than requested is a normal outcome.

use thiserror::Error;

use crate::tile::TileType;

/// Errors that can occur while generating or querying the world.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// A cell's domain became empty during constraint propagation.
    #[error("unsolvable constraints: cell ({x}, {y}) has no remaining tile candidates")]
    UnsolvableConstraints {
        /// Cell column.
        x: usize,
        /// Cell row.
        y: usize,
    },

    /// Grid access outside the grid bounds.
    #[error("invalid coordinate ({x}, {y}) for {width}x{height} grid")]
    InvalidCoordinate {
        /// Requested column.
        x: usize,
        /// Requested row.
        y: usize,
        /// Grid width.
        width: usize,
        /// Grid height.
        height: usize,
    },

    /// The adjacency table violates a structural invariant.
    #[error("invalid adjacency for {tile:?}: {reason}")]
    InvalidAdjacency {
        /// Offending tile.
        tile: TileType,
        /// What is wrong with its neighbour set.
        reason: &'static str,
    },

    /// A background worker panicked while generating a chunk.
    #[error("chunk generation panicked at chunk ({x}, {y})")]
    GenerationPanicked {
        /// Chunk column.
        x: i32,
        /// Chunk row.
        y: i32,
    },

    /// Invalid configuration file or values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for world generation operations.
pub type WorldResult<T> = Result<T, WorldError>;
