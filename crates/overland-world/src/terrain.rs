//! Terrain and biome group definitions.
//!
//! This module provides:
//! - The closed [`TerrainType`] enumeration and its canonical names
//! - [`BiomeGroup`] coarse classification
//! - [`TerrainSet`], a bit set used for possibility and neighbor sets
//! - [`TerrainWeights`], a dense per-terrain float table

use std::fmt;
use std::ops::{BitAnd, BitOr, Index, IndexMut};
use std::str::FromStr;

use overland_common::WorldError;
use serde::{Deserialize, Serialize};

// ============================================================================
// Terrain Types
// ============================================================================

/// Biome classification of a single overworld tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainType {
    /// Open grassland.
    Plains,
    /// Dense woodland.
    Forest,
    /// Rolling high ground.
    Hills,
    /// Impassable peaks.
    Mountain,
    /// Broken ground at the base of mountains.
    Foothills,
    /// Sand along water.
    Beach,
    /// Hot, dry sand and rock.
    Desert,
    /// Wet, low-lying marsh.
    Swamp,
    /// Lakes and sea.
    Water,
}

impl TerrainType {
    /// Number of terrain types.
    pub const COUNT: usize = 9;

    /// All terrain types in enumeration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Plains,
        Self::Forest,
        Self::Hills,
        Self::Mountain,
        Self::Foothills,
        Self::Beach,
        Self::Desert,
        Self::Swamp,
        Self::Water,
    ];

    /// Position of this terrain in [`TerrainType::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Plains => "plains",
            Self::Forest => "forest",
            Self::Hills => "hills",
            Self::Mountain => "mountain",
            Self::Foothills => "foothills",
            Self::Beach => "beach",
            Self::Desert => "desert",
            Self::Swamp => "swamp",
            Self::Water => "water",
        }
    }

    /// Single-character glyph for ASCII map dumps.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Plains => '.',
            Self::Forest => 'T',
            Self::Hills => 'n',
            Self::Mountain => '^',
            Self::Foothills => 'm',
            Self::Beach => ':',
            Self::Desert => 'd',
            Self::Swamp => '%',
            Self::Water => '~',
        }
    }
}

impl fmt::Display for TerrainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TerrainType {
    type Err = WorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| WorldError::UnknownTerrain(s.to_string()))
    }
}

// ============================================================================
// Biome Groups
// ============================================================================

/// Coarse grouping of terrain used for short-range incompatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiomeGroup {
    /// Woodland and wetland.
    Temperate,
    /// High ground.
    Alpine,
    /// Dry land.
    Arid,
    /// Water and shoreline.
    Aquatic,
    /// Fits next to anything.
    Neutral,
}

impl BiomeGroup {
    /// Number of biome groups.
    pub const COUNT: usize = 5;

    /// All groups in enumeration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Temperate,
        Self::Alpine,
        Self::Arid,
        Self::Aquatic,
        Self::Neutral,
    ];

    /// Position of this group in [`BiomeGroup::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Temperate => "temperate",
            Self::Alpine => "alpine",
            Self::Arid => "arid",
            Self::Aquatic => "aquatic",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for BiomeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BiomeGroup {
    type Err = WorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|g| g.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| WorldError::UnknownBiomeGroup(s.to_string()))
    }
}

// ============================================================================
// Terrain Set
// ============================================================================

/// Set of terrain types stored as a bit mask.
///
/// Iteration always follows enumeration order, which keeps every
/// consumer deterministic.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TerrainSet(u16);

impl TerrainSet {
    const FULL_MASK: u16 = (1 << TerrainType::COUNT) - 1;

    /// The empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every terrain type.
    #[must_use]
    pub const fn all() -> Self {
        Self(Self::FULL_MASK)
    }

    /// A set holding exactly one terrain.
    #[must_use]
    pub const fn single(terrain: TerrainType) -> Self {
        Self(1 << terrain.index())
    }

    /// Builds a set from a slice.
    #[must_use]
    pub fn of(terrains: &[TerrainType]) -> Self {
        terrains.iter().copied().collect()
    }

    /// Returns true if `terrain` is a member.
    #[must_use]
    pub const fn contains(self, terrain: TerrainType) -> bool {
        self.0 & (1 << terrain.index()) != 0
    }

    /// Adds a terrain.
    pub fn insert(&mut self, terrain: TerrainType) {
        self.0 |= 1 << terrain.index();
    }

    /// Removes a terrain.
    pub fn remove(&mut self, terrain: TerrainType) {
        self.0 &= !(1 << terrain.index());
    }

    /// Set intersection.
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Set union.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Number of members (the WFC entropy of a cell).
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns true if the set has no members.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// First member in enumeration order.
    #[must_use]
    pub fn first(self) -> Option<TerrainType> {
        self.iter().next()
    }

    /// Iterates members in enumeration order.
    pub fn iter(self) -> impl Iterator<Item = TerrainType> {
        TerrainType::ALL
            .into_iter()
            .filter(move |t| self.contains(*t))
    }
}

impl fmt::Debug for TerrainSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<TerrainType> for TerrainSet {
    fn from_iter<I: IntoIterator<Item = TerrainType>>(iter: I) -> Self {
        let mut set = Self::empty();
        for terrain in iter {
            set.insert(terrain);
        }
        set
    }
}

impl BitAnd for TerrainSet {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.intersection(rhs)
    }
}

impl BitOr for TerrainSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

// ============================================================================
// Terrain Weights
// ============================================================================

/// Dense terrain -> float table.
///
/// Holds base spawn weights as well as multiplicative overrides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainWeights([f64; TerrainType::COUNT]);

impl TerrainWeights {
    /// Every terrain mapped to `value`.
    #[must_use]
    pub const fn uniform(value: f64) -> Self {
        Self([value; TerrainType::COUNT])
    }

    /// Multiplier table that leaves weights unchanged.
    #[must_use]
    pub const fn identity() -> Self {
        Self::uniform(1.0)
    }

    /// Weight for `terrain`.
    #[must_use]
    pub const fn get(&self, terrain: TerrainType) -> f64 {
        self.0[terrain.index()]
    }

    /// Sets the weight for `terrain`.
    pub fn set(&mut self, terrain: TerrainType, value: f64) {
        self.0[terrain.index()] = value;
    }

    /// Element-wise product.
    #[must_use]
    pub fn multiplied_by(&self, other: &Self) -> Self {
        let mut out = *self;
        for terrain in TerrainType::ALL {
            out.0[terrain.index()] *= other.get(terrain);
        }
        out
    }

    /// Iterates `(terrain, weight)` pairs in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (TerrainType, f64)> + '_ {
        TerrainType::ALL.into_iter().map(|t| (t, self.get(t)))
    }
}

impl Default for TerrainWeights {
    fn default() -> Self {
        Self::identity()
    }
}

impl Index<TerrainType> for TerrainWeights {
    type Output = f64;

    fn index(&self, terrain: TerrainType) -> &f64 {
        &self.0[terrain.index()]
    }
}

impl IndexMut<TerrainType> for TerrainWeights {
    fn index_mut(&mut self, terrain: TerrainType) -> &mut f64 {
        &mut self.0[terrain.index()]
    }
}
