//! # Overland Tools
//!
//! Development tools for inspecting generated terrain.
//!
//! This crate provides:
//! - ASCII rendering of a rectangular world area
//! - Terrain histograms
//! - Unnatural transition reports for QA

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod preview;

pub use preview::*;
