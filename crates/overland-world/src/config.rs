//! World generation configuration.
//!
//! Stored as TOML. Every field has a default, so a partial file (or none at
//! all) yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{info, warn};

use overland_common::{OverlandError, OverlandResult, WorldError, WorldResult};

use crate::bias::{check_penalty_radius, DEFAULT_PENALTY_RADIUS};
use crate::streaming::MAX_CHUNK_SIZE;
use crate::terrain::TerrainType;

/// Default world seed.
pub const DEFAULT_WORLD_SEED: u64 = 0x5EED;

/// Default chunk edge length in tiles.
pub const DEFAULT_CHUNK_SIZE: u32 = 16;

/// Terrain world configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    // === World ===
    /// Seed every chunk seed is derived from
    pub world_seed: u64,
    /// Chunk edge length in tiles
    pub chunk_size: u32,

    // === Generation ===
    /// Manhattan radius searched for incompatible biome groups
    pub penalty_radius: u32,
    /// Base spawn weight overrides by terrain name
    pub weights: BTreeMap<String, f64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            world_seed: DEFAULT_WORLD_SEED,
            chunk_size: DEFAULT_CHUNK_SIZE,
            penalty_radius: DEFAULT_PENALTY_RADIUS,
            weights: BTreeMap::new(),
        }
    }
}

impl WorldConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(contents: &str) -> OverlandResult<Self> {
        toml::from_str(contents).map_err(|e| OverlandError::Config(e.to_string()))
    }

    /// Serializes to pretty TOML.
    pub fn to_toml_string(&self) -> OverlandResult<String> {
        toml::to_string_pretty(self).map_err(|e| OverlandError::Config(e.to_string()))
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("World config not found at {}, using defaults", path.display());
            return Self::default();
        }

        let mut contents = String::new();
        if let Err(e) = fs::File::open(path).and_then(|mut f| f.read_to_string(&mut contents)) {
            warn!("Failed to read world config: {e}");
            return Self::default();
        }

        match Self::from_toml_str(&contents) {
            Ok(config) => {
                info!("Loaded world config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse world config: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> OverlandResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = self.to_toml_string()?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved world config to {}", path.display());
        Ok(())
    }

    /// Checks the configuration without modifying it.
    ///
    /// Unlike engine settings, bad world parameters are not clamped: a
    /// different chunk size or weight table is a different world.
    pub fn validate(&self) -> WorldResult<()> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(WorldError::InvalidChunkSize(self.chunk_size));
        }
        check_penalty_radius(self.penalty_radius)?;
        for (name, &weight) in &self.weights {
            let terrain: TerrainType = name.parse()?;
            if !weight.is_finite() || weight < 0.0 {
                return Err(WorldError::InvalidWeight {
                    terrain: terrain.name().to_string(),
                    weight,
                });
            }
        }
        Ok(())
    }
}
