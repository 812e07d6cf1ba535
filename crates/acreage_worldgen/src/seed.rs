//! # World Seed Authority
//!
//! Every random decision in the world traces back to one master seed.
//!
//! ## Determinism Guarantee
//!
//! A chunk's content is a pure function of `(master seed, chunk coordinate)`:
//!
//! ```text
//! WorldSeed ──derive──> ChunkSeed ──seed_from_u64──> ChaCha8Rng ──> terrain
//!     │
//!     └──(coord / 2)──> RegionType
//! ```
//!
//! The hash is integer-only, so the same inputs give the same chunk on any
//! platform, any time.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::chunk::ChunkCoord;
use crate::config::GrowthConfig;

/// Purpose tag for chunk seed derivation.
const CHUNK_PURPOSE: u64 = 0x0C4A_11C5;

/// Chunk seeds lie in `[0, CHUNK_SEED_RANGE)`.
pub const CHUNK_SEED_RANGE: u64 = 1_000_000;

/// Master seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Draws a seed from OS entropy.
    ///
    /// Worlds built from this seed are not reproducible unless the value is
    /// recorded.
    #[must_use]
    pub fn random() -> Self {
        Self(rand::random())
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose.
    ///
    /// Uses a hash function to create independent streams from one seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }

    /// Seed for the chunk at `coord`.
    #[must_use]
    pub const fn chunk_seed(self, coord: ChunkCoord) -> ChunkSeed {
        let packed = ((coord.x as u32 as u64) << 32) | coord.y as u32 as u64;
        let hash = splitmix64(self.derive(CHUNK_PURPOSE).0 ^ packed);
        ChunkSeed(hash % CHUNK_SEED_RANGE)
    }

    /// Region flavour of the chunk at `coord`.
    ///
    /// Regions span 2x2 chunks: the coordinate is floor-divided by two and
    /// run through the chunk seed derivation.
    #[must_use]
    pub const fn region(self, coord: ChunkCoord) -> RegionType {
        let region = ChunkCoord::new(coord.x.div_euclid(2), coord.y.div_euclid(2));
        RegionType::from_seed(self.chunk_seed(region))
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(0xDEAD_BEEF_CAFE_BABE)
    }
}

/// Per-chunk seed, in `[0, CHUNK_SEED_RANGE)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkSeed(u64);

impl ChunkSeed {
    /// Wraps a raw value, reducing it into range.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value % CHUNK_SEED_RANGE)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The RNG every generation stage of this chunk draws from.
    #[must_use]
    pub fn rng(self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.0)
    }
}

/// Coarse biome flavour shared by a 2x2 block of chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RegionType {
    /// Dense farmland, more barns and silos.
    Farmland = 0,
    /// Wooded country.
    Forest = 1,
    /// No particular bias.
    Mixed = 2,
    /// Lakes and wetlands.
    Lakeside = 3,
}

impl RegionType {
    /// Maps a seed onto the four regions.
    #[must_use]
    pub const fn from_seed(seed: ChunkSeed) -> Self {
        match seed.value() % 4 {
            0 => Self::Farmland,
            1 => Self::Forest,
            2 => Self::Mixed,
            _ => Self::Lakeside,
        }
    }

    /// Growth probabilities adjusted for this region, clamped to `[0, 1]`.
    #[must_use]
    pub fn adjust_growth(self, base: &GrowthConfig) -> GrowthConfig {
        let (forest, farm, lake) = match self {
            Self::Farmland => (1.0, 1.5, 1.0),
            Self::Forest => (2.0, 1.0, 1.0),
            Self::Mixed => (1.0, 1.0, 1.0),
            Self::Lakeside => (1.0, 1.0, 2.0),
        };
        GrowthConfig {
            forest_probability: (base.forest_probability * forest).clamp(0.0, 1.0),
            farm_probability: (base.farm_probability * farm).clamp(0.0, 1.0),
            lake_probability: (base.lake_probability * lake).clamp(0.0, 1.0),
        }
    }

    /// Structure count for this region, given the configured count.
    #[must_use]
    pub const fn adjust_structures(self, count: usize) -> usize {
        match self {
            Self::Farmland | Self::Mixed => count,
            Self::Forest | Self::Lakeside => count / 2,
        }
    }
}

/// SplitMix64 finaliser.
const fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
