//! # World Configuration
//!
//! All tunables live in one TOML-loadable structure.
//!
//! ```toml
//! viewport_width = 1280
//! viewport_height = 720
//! tile_size = 16
//! chunk_size = 32
//! seed = 42
//!
//! [growth]
//! forest_probability = 0.3
//! farm_probability = 0.4
//! lake_probability = 0.2
//!
//! [river]
//! enabled = true
//! start = [0.5, 0.0]
//! end = [0.5, 1.0]
//!
//! [structures]
//! barns = 2
//! silos = 1
//! ```
//!
//! Every section and field is optional; missing values take the defaults
//! below.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{WorldError, WorldResult};
use crate::seed::WorldSeed;

/// Widest viewport accepted, in chunks per axis.
pub const MAX_VIEWPORT_CHUNKS: f64 = 1024.0;

/// Probabilities for the organic growth passes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Chance that a Tree cell seeds a forest patch.
    pub forest_probability: f64,
    /// Chance that a Field cell seeds a farm rectangle.
    pub farm_probability: f64,
    /// Chance that a Water cell seeds a lake patch.
    pub lake_probability: f64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            forest_probability: 0.3,
            farm_probability: 0.4,
            lake_probability: 0.2,
        }
    }
}

/// River carving toggle and endpoints.
///
/// Endpoints are fractions of the grid size, `[0, 0]` being the top-left
/// cell and `[1, 1]` the bottom-right. A missing endpoint is drawn from the
/// chunk RNG (start on the top edge, end on the bottom edge).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiverConfig {
    /// Carve a river through each generated grid.
    pub enabled: bool,
    /// Fractional start point.
    pub start: Option<[f64; 2]>,
    /// Fractional end point.
    pub end: Option<[f64; 2]>,
}

/// Structures placed per chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    /// Barns per chunk.
    pub barns: usize,
    /// Silos per chunk.
    pub silos: usize,
    /// Sampling attempts per structure before giving up.
    pub max_attempts: u32,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            barns: 2,
            silos: 1,
            max_attempts: 100,
        }
    }
}

/// Constraint solver recovery policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Full solve attempts before relaxing the adjacency table.
    pub max_attempts: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// World configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Viewport width in pixels.
    pub viewport_width: f64,
    /// Viewport height in pixels.
    pub viewport_height: f64,
    /// Tile edge length in pixels.
    pub tile_size: u32,
    /// Chunk edge length in tiles.
    pub chunk_size: usize,
    /// Master seed. `None` draws a fresh seed per world.
    pub seed: Option<u64>,
    /// Background generation threads; 0 generates on the caller's thread only.
    pub workers: usize,
    /// Growth pass probabilities.
    pub growth: GrowthConfig,
    /// River carving.
    pub river: RiverConfig,
    /// Structure counts.
    pub structures: StructureConfig,
    /// Solver recovery.
    pub solver: SolverConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1280.0,
            viewport_height: 720.0,
            tile_size: 16,
            chunk_size: 32,
            seed: None,
            workers: 0,
            growth: GrowthConfig::default(),
            river: RiverConfig::default(),
            structures: StructureConfig::default(),
            solver: SolverConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Small, seeded configuration for tests.
    ///
    /// 8x8-tile chunks of 8px tiles behind a 128x96 viewport.
    #[must_use]
    pub fn test() -> Self {
        Self {
            viewport_width: 128.0,
            viewport_height: 96.0,
            tile_size: 8,
            chunk_size: 8,
            seed: Some(42),
            ..Self::default()
        }
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] for malformed TOML or values
    /// that fail [`WorldConfig::validate`].
    pub fn from_toml_str(source: &str) -> WorldResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| WorldError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] if the file cannot be read or
    /// its contents are invalid.
    pub fn from_toml_file(path: impl AsRef<Path>) -> WorldResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            WorldError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    /// Serialises back to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] if serialisation fails.
    pub fn to_toml_string(&self) -> WorldResult<String> {
        toml::to_string(self).map_err(|e| WorldError::InvalidConfig(e.to_string()))
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> WorldResult<()> {
        let invalid = |msg: String| Err(WorldError::InvalidConfig(msg));

        if !(self.viewport_width.is_finite() && self.viewport_width >= 0.0)
            || !(self.viewport_height.is_finite() && self.viewport_height >= 0.0)
        {
            return invalid(format!(
                "viewport must be finite and non-negative, got {}x{}",
                self.viewport_width, self.viewport_height
            ));
        }
        if self.tile_size == 0 {
            return invalid("tile_size must be positive".into());
        }
        if self.chunk_size == 0 {
            return invalid("chunk_size must be positive".into());
        }
        let chunk_px = self.chunk_pixels();
        if self.viewport_width / chunk_px > MAX_VIEWPORT_CHUNKS
            || self.viewport_height / chunk_px > MAX_VIEWPORT_CHUNKS
        {
            return invalid(format!(
                "viewport {}x{} spans more than {MAX_VIEWPORT_CHUNKS} chunks of {chunk_px}px",
                self.viewport_width, self.viewport_height
            ));
        }

        let probabilities = [
            ("growth.forest_probability", self.growth.forest_probability),
            ("growth.farm_probability", self.growth.farm_probability),
            ("growth.lake_probability", self.growth.lake_probability),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return invalid(format!("{name} must be in [0, 1], got {p}"));
            }
        }

        for (name, point) in [("river.start", self.river.start), ("river.end", self.river.end)] {
            if let Some([fx, fy]) = point {
                if !(0.0..=1.0).contains(&fx) || !(0.0..=1.0).contains(&fy) {
                    return invalid(format!("{name} must lie in [0, 1]^2, got [{fx}, {fy}]"));
                }
            }
        }

        Ok(())
    }

    /// The configured master seed, or a fresh random one.
    #[must_use]
    pub fn world_seed(&self) -> WorldSeed {
        self.seed.map_or_else(WorldSeed::random, WorldSeed::new)
    }

    /// Chunk edge length in pixels.
    #[must_use]
    pub fn chunk_pixels(&self) -> f64 {
        f64::from(self.tile_size) * self.chunk_size as f64
    }
}
