//! # Overland World
//!
//! Procedural overworld terrain.
//!
//! This crate handles:
//! - Terrain types, biome groups and the tile registry
//! - Wave Function Collapse generation of terrain grids
//! - Theme biasing and short-range biome separation
//! - Lazy chunk generation, caching and background pregeneration
//! - World configuration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod bias;
pub mod chunk;
pub mod config;
pub mod pregen;
pub mod region;
pub mod registry;
pub mod streaming;
pub mod terrain;
pub mod transition;
pub mod wfc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::bias::*;
    pub use crate::chunk::*;
    pub use crate::config::*;
    pub use crate::pregen::*;
    pub use crate::region::*;
    pub use crate::registry::*;
    pub use crate::streaming::*;
    pub use crate::terrain::*;
    pub use crate::transition::*;
    pub use crate::wfc::*;
}

pub use prelude::*;
