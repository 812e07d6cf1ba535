//! # Tile Types and Adjacency Rules
//!
//! The closed set of terrain tiles, plus the per-type selection weights and
//! neighbour rules the constraint solver works with.
//!
//! ## Base vs Overlay
//!
//! `Grass`, `Water`, `Field`, `Tree`, `Bush` and `Hill` are *base* tiles:
//! they are chosen by the solver and are subject to adjacency rules.
//! `Road`, `Barn` and `Silo` are *overlays* painted after base generation and
//! never participate in constraint solving.
//!
//! ## Domains
//!
//! A solver domain is a [`TileMask`], a 16-bit set of tile types. Set
//! operations are single instructions and domains are `Copy`.

use bytemuck::NoUninit;
use rand::Rng;

use crate::error::{WorldError, WorldResult};

/// A terrain tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, NoUninit)]
#[repr(u8)]
pub enum TileType {
    /// Open grassland. Compatible with every base tile.
    Grass = 0,
    /// River or lake water.
    Water = 1,
    /// Cultivated farmland.
    Field = 2,
    /// Forest tree.
    Tree = 3,
    /// Scrub bush.
    Bush = 4,
    /// Rocky hill.
    Hill = 5,
    /// Road overlay.
    Road = 6,
    /// Barn structure overlay.
    Barn = 7,
    /// Silo structure overlay.
    Silo = 8,
}

impl TileType {
    /// Number of tile types.
    pub const COUNT: usize = 9;

    /// Every tile type, in discriminant order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Grass,
        Self::Water,
        Self::Field,
        Self::Tree,
        Self::Bush,
        Self::Hill,
        Self::Road,
        Self::Barn,
        Self::Silo,
    ];

    /// Tiles the solver may place.
    pub const BASE: [Self; 6] = [
        Self::Grass,
        Self::Water,
        Self::Field,
        Self::Tree,
        Self::Bush,
        Self::Hill,
    ];

    /// Index of this tile in [`TileType::ALL`].
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Tile with the given index, if any.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Returns true for tiles painted after base generation.
    #[inline]
    #[must_use]
    pub const fn is_overlay(self) -> bool {
        matches!(self, Self::Road | Self::Barn | Self::Silo)
    }

    /// Returns true for structure overlays.
    #[inline]
    #[must_use]
    pub const fn is_structure(self) -> bool {
        matches!(self, Self::Barn | Self::Silo)
    }

    /// Single-character glyph, handy for debug dumps.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Grass => '.',
            Self::Water => '~',
            Self::Field => '=',
            Self::Tree => 'T',
            Self::Bush => '*',
            Self::Hill => '^',
            Self::Road => '#',
            Self::Barn => 'B',
            Self::Silo => 'S',
        }
    }
}

/// A set of tile types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TileMask(u16);

impl TileMask {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// All base tiles.
    pub const BASE: Self = Self::from_tiles(&TileType::BASE);

    /// A set holding exactly one tile.
    #[inline]
    #[must_use]
    pub const fn single(tile: TileType) -> Self {
        Self(1 << tile as u16)
    }

    /// Builds a set from a slice of tiles.
    #[must_use]
    pub const fn from_tiles(tiles: &[TileType]) -> Self {
        let mut bits = 0u16;
        let mut i = 0;
        while i < tiles.len() {
            bits |= 1 << tiles[i] as u16;
            i += 1;
        }
        Self(bits)
    }

    /// Returns true if `tile` is in the set.
    #[inline]
    #[must_use]
    pub const fn contains(self, tile: TileType) -> bool {
        self.0 & (1 << tile as u16) != 0
    }

    /// Returns the set with `tile` added.
    #[inline]
    #[must_use]
    pub const fn with(self, tile: TileType) -> Self {
        Self(self.0 | (1 << tile as u16))
    }

    /// Set union.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Set intersection.
    #[inline]
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Number of tiles in the set.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns true if the set holds no tiles.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The only tile in the set, if it holds exactly one.
    #[must_use]
    pub fn only(self) -> Option<TileType> {
        if self.len() == 1 {
            TileType::from_index(self.0.trailing_zeros() as usize)
        } else {
            None
        }
    }

    /// Iterates the tiles in discriminant order.
    pub fn iter(self) -> impl Iterator<Item = TileType> {
        TileType::ALL.into_iter().filter(move |&t| self.contains(t))
    }
}

impl FromIterator<TileType> for TileMask {
    fn from_iter<I: IntoIterator<Item = TileType>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

/// Tile set with selection weights.
///
/// Weights are only meaningful for tiles in the set; the solver samples a
/// cell's remaining candidates with probability `weight / total_weight`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileSet {
    tiles: TileMask,
    weights: [u32; TileType::COUNT],
}

impl TileSet {
    /// Creates an empty tile set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tiles: TileMask::EMPTY,
            weights: [0; TileType::COUNT],
        }
    }

    /// The canonical base terrain set.
    ///
    /// Grass dominates; hills are rare.
    #[must_use]
    pub fn canonical() -> Self {
        Self::new()
            .with_tile(TileType::Grass, 10)
            .with_tile(TileType::Water, 2)
            .with_tile(TileType::Field, 4)
            .with_tile(TileType::Tree, 3)
            .with_tile(TileType::Bush, 2)
            .with_tile(TileType::Hill, 1)
    }

    /// Adds a tile with the given weight.
    #[must_use]
    pub fn with_tile(mut self, tile: TileType, weight: u32) -> Self {
        self.tiles = self.tiles.with(tile);
        self.weights[tile.index()] = weight;
        self
    }

    /// Tiles in the set.
    #[inline]
    #[must_use]
    pub const fn tiles(&self) -> TileMask {
        self.tiles
    }

    /// Weight of `tile` (0 if not in the set).
    #[inline]
    #[must_use]
    pub const fn weight(&self, tile: TileType) -> u32 {
        if self.tiles.contains(tile) {
            self.weights[tile.index()]
        } else {
            0
        }
    }

    /// Sum of weights over `domain`, restricted to this set.
    #[must_use]
    pub fn total_weight(&self, domain: TileMask) -> u64 {
        domain
            .intersection(self.tiles)
            .iter()
            .map(|t| u64::from(self.weight(t)))
            .sum()
    }

    /// Picks one tile from `domain` by weighted random sampling.
    ///
    /// Only candidates that are also in this set are considered. If every
    /// candidate has zero weight the pick is uniform. Returns `None` for an
    /// empty candidate set.
    pub fn sample<R: Rng + ?Sized>(&self, domain: TileMask, rng: &mut R) -> Option<TileType> {
        let candidates = domain.intersection(self.tiles);
        if candidates.is_empty() {
            return None;
        }

        let total = self.total_weight(candidates);
        if total == 0 {
            let pick = rng.gen_range(0..candidates.len());
            return candidates.iter().nth(pick);
        }

        let mut roll = rng.gen_range(0..total);
        for tile in candidates.iter() {
            let weight = u64::from(self.weight(tile));
            if roll < weight {
                return Some(tile);
            }
            roll -= weight;
        }

        // Unreachable: roll < total.
        candidates.iter().last()
    }
}

impl Default for TileSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Allowed 4-directional neighbours per tile type.
///
/// Rules are non-directional: `allows(a, b)` means a `b` may sit on any side
/// of an `a`. Symmetry is not enforced; the solver honours both directions
/// of every rule it is given.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdjacencyTable {
    neighbors: [TileMask; TileType::COUNT],
}

impl AdjacencyTable {
    /// Creates a table with no rules.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            neighbors: [TileMask::EMPTY; TileType::COUNT],
        }
    }

    /// The canonical base terrain table.
    ///
    /// Grass borders everything, which keeps the canonical table solvable
    /// under any collapse order.
    #[must_use]
    pub fn canonical() -> Self {
        use TileType::{Bush, Field, Grass, Hill, Tree, Water};

        let mut table = Self::new();
        for tile in TileType::BASE {
            table.allow_both(Grass, tile);
            table.allow(tile, tile);
        }
        table.allow_both(Water, Bush);
        table.allow_both(Field, Bush);
        table.allow_both(Tree, Bush);
        table.allow_both(Tree, Hill);
        table
    }

    /// Permits `neighbor` next to `tile` (one direction only).
    pub fn allow(&mut self, tile: TileType, neighbor: TileType) {
        self.neighbors[tile.index()] = self.neighbors[tile.index()].with(neighbor);
    }

    /// Permits `a` and `b` next to each other in both directions.
    pub fn allow_both(&mut self, a: TileType, b: TileType) {
        self.allow(a, b);
        self.allow(b, a);
    }

    /// Allowed neighbours of `tile`.
    #[inline]
    #[must_use]
    pub const fn neighbors(&self, tile: TileType) -> TileMask {
        self.neighbors[tile.index()]
    }

    /// Returns true if `neighbor` may sit next to `tile`.
    #[inline]
    #[must_use]
    pub const fn allows(&self, tile: TileType, neighbor: TileType) -> bool {
        self.neighbors(tile).contains(neighbor)
    }

    /// Union of allowed neighbours over every tile in `domain`.
    #[must_use]
    pub fn supported_by(&self, domain: TileMask) -> TileMask {
        domain
            .iter()
            .fold(TileMask::EMPTY, |acc, t| acc.union(self.neighbors(t)))
    }

    /// Checks the table against a tile set.
    ///
    /// Every tile in `tiles` must have a non-empty neighbour set that
    /// includes itself.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidAdjacency`] naming the first offender.
    pub fn validate(&self, tiles: TileMask) -> WorldResult<()> {
        for tile in tiles.iter() {
            let set = self.neighbors(tile);
            if set.is_empty() {
                return Err(WorldError::InvalidAdjacency {
                    tile,
                    reason: "empty neighbour set",
                });
            }
            if !set.contains(tile) {
                return Err(WorldError::InvalidAdjacency {
                    tile,
                    reason: "tile may not border itself",
                });
            }
        }
        Ok(())
    }

    /// Returns true if every rule is mirrored.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        TileType::ALL.iter().all(|&a| {
            self.neighbors(a)
                .iter()
                .all(|b| self.neighbors(b).contains(a))
        })
    }

    /// Copy of this table with every rule mirrored.
    #[must_use]
    pub fn symmetrized(&self) -> Self {
        let mut table = self.clone();
        for a in TileType::ALL {
            for b in self.neighbors(a).iter() {
                table.allow(b, a);
            }
        }
        table
    }

    /// Copy of this table keeping only rules that hold in both directions.
    ///
    /// This is what the solver propagates over.
    #[must_use]
    pub fn mutual(&self) -> Self {
        let mut table = Self::new();
        for a in TileType::ALL {
            for b in self.neighbors(a).iter() {
                if self.allows(b, a) {
                    table.allow(a, b);
                }
            }
        }
        table
    }

    /// Loosened table used when a solve keeps failing.
    ///
    /// Mirrors every rule and lets `fallback` border every tile in `tiles`.
    #[must_use]
    pub fn relaxed(&self, tiles: TileMask, fallback: TileType) -> Self {
        let mut table = self.symmetrized();
        for tile in tiles.iter() {
            table.allow_both(tile, fallback);
            table.allow(tile, tile);
        }
        table
    }
}

impl Default for AdjacencyTable {
    fn default() -> Self {
        Self::new()
    }
}
