//! # Overland Common
//!
//! Common types shared by the Overland terrain crates.
//!
//! This crate provides:
//! - Coordinate types (world, chunk, local)
//! - The error taxonomy for world generation and configuration
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
}

pub use prelude::*;
