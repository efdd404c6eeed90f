//! Terrain area inspection.

use std::collections::HashMap;
use std::fmt::Write;

use overland_common::WorldCoord;
use overland_world::{transition_warning, ChunkManager, TerrainType};

/// Rectangular area of world tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    /// Top-left tile
    pub origin: WorldCoord,
    /// Width in tiles
    pub width: u32,
    /// Height in tiles
    pub height: u32,
}

/// Moves `start` back so that `len` tiles fit before the plane edge.
fn fit(start: i64, len: u32) -> i64 {
    start.min(i64::MAX - i64::from(len.saturating_sub(1)))
}

impl Area {
    /// Creates an area, shifted inward if it would run past the plane edge.
    #[must_use]
    pub fn new(origin: WorldCoord, width: u32, height: u32) -> Self {
        Self {
            origin: WorldCoord::new(fit(origin.x, width), fit(origin.y, height)),
            width,
            height,
        }
    }

    /// Area of `width x height` tiles centered on `center`.
    #[must_use]
    pub fn centered(center: WorldCoord, width: u32, height: u32) -> Self {
        Self::new(
            WorldCoord::new(
                center.x.saturating_sub(i64::from(width / 2)),
                center.y.saturating_sub(i64::from(height / 2)),
            ),
            width,
            height,
        )
    }

    /// Tile coordinates in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = WorldCoord> + '_ {
        (0..i64::from(self.height)).flat_map(move |dy| {
            (0..i64::from(self.width)).map(move |dx| {
                WorldCoord::new(
                    self.origin.x.saturating_add(dx),
                    self.origin.y.saturating_add(dy),
                )
            })
        })
    }

    /// One past the last tile on each axis, saturating at the plane edge.
    fn end(&self) -> (i64, i64) {
        (
            self.origin.x.saturating_add(i64::from(self.width)),
            self.origin.y.saturating_add(i64::from(self.height)),
        )
    }
}

/// Renders an area as one glyph per tile, one line per row.
pub fn render_area(manager: &ChunkManager, area: Area) -> String {
    if area.width == 0 || area.height == 0 {
        return String::new();
    }
    let capacity = (u64::from(area.width) + 1) * u64::from(area.height);
    let mut out = String::with_capacity(usize::try_from(capacity).unwrap_or(0));
    for (i, tile) in area.tiles().enumerate() {
        out.push(manager.get_tile_at(tile.x, tile.y).glyph());
        if (i + 1) % area.width as usize == 0 {
            out.push('\n');
        }
    }
    out
}

/// Glyph legend, one terrain per line.
#[must_use]
pub fn legend() -> String {
    TerrainType::ALL
        .iter()
        .fold(String::new(), |mut out, terrain| {
            let _ = writeln!(out, "{} {terrain}", terrain.glyph());
            out
        })
}

/// Tile count per terrain in an area, most common first.
pub fn terrain_histogram(manager: &ChunkManager, area: Area) -> Vec<(TerrainType, u32)> {
    let mut counts: HashMap<TerrainType, u32> = HashMap::new();

    for tile in area.tiles() {
        *counts.entry(manager.get_tile_at(tile.x, tile.y)).or_insert(0) += 1;
    }

    let mut result: Vec<_> = counts.into_iter().collect();
    result.sort_by_key(|&(terrain, count)| (std::cmp::Reverse(count), terrain));
    result
}

/// Unnatural transition found in an area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionIssue {
    /// First tile of the pair
    pub at: WorldCoord,
    /// The other tile (east or south neighbor)
    pub neighbor: WorldCoord,
    /// Warning text
    pub warning: String,
}

/// Every unnatural east/south neighbor pair inside an area.
pub fn transition_report(manager: &ChunkManager, area: Area) -> Vec<TransitionIssue> {
    let registry = manager.registry();
    let (end_x, end_y) = area.end();
    let mut issues = Vec::new();

    for at in area.tiles() {
        let here = manager.get_tile_at(at.x, at.y);
        let east = at.x.checked_add(1).map(|x| WorldCoord::new(x, at.y));
        let south = at.y.checked_add(1).map(|y| WorldCoord::new(at.x, y));
        for neighbor in [east, south].into_iter().flatten() {
            if neighbor.x >= end_x || neighbor.y >= end_y {
                continue;
            }
            let there = manager.get_tile_at(neighbor.x, neighbor.y);
            if let Some(warning) = transition_warning(registry, here, there) {
                issues.push(TransitionIssue {
                    at,
                    neighbor,
                    warning,
                });
            }
        }
    }
    issues
}
