//! Error types for Overland.

use thiserror::Error;

/// Top-level error type for Overland operations.
#[derive(Debug, Error)]
pub enum OverlandError {
    /// World/terrain configuration errors
    #[error("World error: {0}")]
    World(#[from] WorldError),

    /// Configuration file could not be parsed or written
    #[error("Config error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Terrain generation errors.
///
/// Every variant is a caller mistake detected at construction time.
/// Contradictions inside the solver are never reported here.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WorldError {
    /// Chunk size outside the supported range
    #[error("Invalid chunk size {0}: must be between 1 and 1024")]
    InvalidChunkSize(u32),

    /// Penalty radius beyond the supported maximum
    #[error("Invalid penalty radius {0}: must be at most 16")]
    InvalidPenaltyRadius(u32),

    /// Solver grid with a zero dimension
    #[error("Invalid grid size {width}x{height}")]
    InvalidGridSize {
        /// Grid width
        width: u32,
        /// Grid height
        height: u32,
    },

    /// Terrain name not in the terrain enumeration
    #[error("Unknown terrain '{0}'")]
    UnknownTerrain(String),

    /// Biome group name not recognized
    #[error("Unknown biome group '{0}'")]
    UnknownBiomeGroup(String),

    /// Negative, NaN or infinite weight
    #[error("Invalid weight {weight} for terrain '{terrain}'")]
    InvalidWeight {
        /// Terrain the weight belongs to
        terrain: String,
        /// Offending value
        weight: f64,
    },
}

/// Result type alias for terrain generation.
pub type WorldResult<T> = Result<T, WorldError>;

/// Result type alias for Overland operations.
pub type OverlandResult<T> = Result<T, OverlandError>;
