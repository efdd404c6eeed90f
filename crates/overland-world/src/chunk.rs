//! Immutable terrain chunks.

use overland_common::{ChunkCoord, LocalCoord};

use crate::terrain::TerrainType;
use crate::wfc::TerrainGrid;

/// A square block of generated terrain.
///
/// Produced once by the chunk manager and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk coordinate
    coord: ChunkCoord,
    /// Chunk size (width and height in tiles)
    size: u32,
    /// Row-major terrain (size x size)
    tiles: Vec<TerrainType>,
    /// Cells resolved by the solver's contradiction fallback
    relaxations: u32,
}

impl Chunk {
    /// Wraps a square solver grid.
    pub(crate) fn from_grid(coord: ChunkCoord, grid: TerrainGrid) -> Self {
        debug_assert_eq!(grid.width(), grid.height());
        let size = grid.width();
        let relaxations = grid.relaxations();
        Self {
            coord,
            size,
            tiles: grid.into_tiles(),
            relaxations,
        }
    }

    /// Returns the chunk coordinate.
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Returns the chunk size.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Gets the terrain at local coordinates.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<TerrainType> {
        if x >= self.size || y >= self.size {
            return None;
        }
        let index = (y * self.size + x) as usize;
        self.tiles.get(index).copied()
    }

    /// Gets the terrain at a local coordinate.
    #[must_use]
    pub fn tile(&self, local: LocalCoord) -> Option<TerrainType> {
        self.get(u32::from(local.x), u32::from(local.y))
    }

    /// Returns a slice of all tiles, row-major.
    #[must_use]
    pub fn tiles(&self) -> &[TerrainType] {
        &self.tiles
    }

    /// Number of tiles holding `terrain`.
    #[must_use]
    pub fn count(&self, terrain: TerrainType) -> usize {
        self.tiles.iter().filter(|&&t| t == terrain).count()
    }

    /// Fraction of tiles holding any of `terrains`.
    #[must_use]
    pub fn fraction(&self, terrains: &[TerrainType]) -> f64 {
        let hits = self.tiles.iter().filter(|t| terrains.contains(t)).count();
        hits as f64 / self.tiles.len() as f64
    }

    /// Cells the solver had to relax while generating this chunk.
    #[must_use]
    pub const fn relaxations(&self) -> u32 {
        self.relaxations
    }

    /// One glyph per tile, one line per row.
    #[must_use]
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(((self.size + 1) * self.size) as usize);
        for row in self.tiles.chunks(self.size as usize) {
            out.extend(row.iter().map(|t| t.glyph()));
            out.push('\n');
        }
        out
    }
}
