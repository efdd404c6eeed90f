//! Immutable terrain lookup tables.
//!
//! A [`TileRegistry`] is built once, validated, and then shared read-only by
//! the solver and the chunk manager. Storage is indexed by terrain, so every
//! terrain always has an entry in every table.

use std::collections::BTreeMap;

use overland_common::{WorldError, WorldResult};
use tracing::debug;

use crate::terrain::{BiomeGroup, TerrainSet, TerrainType, TerrainWeights};

use crate::terrain::BiomeGroup::{Alpine, Aquatic, Arid, Neutral, Temperate};
use crate::terrain::TerrainType::{Beach, Desert, Forest, Foothills, Hills, Mountain, Plains, Swamp, Water};

/// Default spawn weights, in enumeration order.
const DEFAULT_WEIGHTS: [(TerrainType, f64); TerrainType::COUNT] = [
    (Plains, 3.0),
    (Forest, 2.5),
    (Hills, 1.5),
    (Mountain, 1.0),
    (Foothills, 1.0),
    (Beach, 0.5),
    (Desert, 1.0),
    (Swamp, 0.5),
    (Water, 1.0),
];

const DEFAULT_GROUPS: [(TerrainType, BiomeGroup); TerrainType::COUNT] = [
    (Plains, Neutral),
    (Forest, Temperate),
    (Hills, Alpine),
    (Mountain, Alpine),
    (Foothills, Alpine),
    (Beach, Aquatic),
    (Desert, Arid),
    (Swamp, Temperate),
    (Water, Aquatic),
];

/// Hard adjacency pairs besides self-adjacency. Hills pair with everything.
const DEFAULT_ADJACENT: &[(TerrainType, TerrainType)] = &[
    (Plains, Forest),
    (Plains, Foothills),
    (Plains, Beach),
    (Plains, Desert),
    (Plains, Swamp),
    (Plains, Water),
    (Forest, Foothills),
    (Forest, Beach),
    (Forest, Swamp),
    (Forest, Water),
    (Mountain, Foothills),
    (Beach, Water),
    (Beach, Desert),
    (Swamp, Water),
];

/// Pairs that read as natural to a player. Advisory only.
const DEFAULT_NATURAL: &[(TerrainType, TerrainType)] = &[
    (Plains, Forest),
    (Plains, Hills),
    (Plains, Foothills),
    (Plains, Beach),
    (Plains, Desert),
    (Plains, Swamp),
    (Plains, Water),
    (Forest, Hills),
    (Forest, Foothills),
    (Forest, Swamp),
    (Hills, Foothills),
    (Hills, Mountain),
    (Hills, Desert),
    (Foothills, Mountain),
    (Beach, Water),
    (Beach, Desert),
    (Swamp, Water),
];

const DEFAULT_INCOMPATIBLE: &[(BiomeGroup, BiomeGroup)] = &[(Temperate, Arid)];

/// Terrain lookup tables shared by every generator call.
#[derive(Debug, Clone, PartialEq)]
pub struct TileRegistry {
    weights: TerrainWeights,
    allowed: [TerrainSet; TerrainType::COUNT],
    groups: [BiomeGroup; TerrainType::COUNT],
    incompatible: [[bool; BiomeGroup::COUNT]; BiomeGroup::COUNT],
    natural: [TerrainSet; TerrainType::COUNT],
}

impl TileRegistry {
    /// Starts a builder preloaded with the default overworld tables.
    #[must_use]
    pub fn builder() -> TileRegistryBuilder {
        TileRegistryBuilder::new()
    }

    /// Base spawn weight of `terrain`.
    #[must_use]
    pub fn weight(&self, terrain: TerrainType) -> f64 {
        self.weights.get(terrain)
    }

    /// All base spawn weights.
    #[must_use]
    pub const fn weights(&self) -> &TerrainWeights {
        &self.weights
    }

    /// Terrain types legally 4-adjacent to `terrain`.
    #[must_use]
    pub const fn allowed_neighbors(&self, terrain: TerrainType) -> TerrainSet {
        self.allowed[terrain.index()]
    }

    /// Returns true if `a` may sit next to `b`.
    #[must_use]
    pub const fn is_allowed(&self, a: TerrainType, b: TerrainType) -> bool {
        self.allowed[a.index()].contains(b)
    }

    /// Union of the allowed neighbors of every member of `set`.
    ///
    /// A neighbor of a cell whose possibilities are `set` can only hold
    /// terrain from this union.
    #[must_use]
    pub fn support_of(&self, set: TerrainSet) -> TerrainSet {
        set.iter()
            .fold(TerrainSet::empty(), |acc, t| acc | self.allowed_neighbors(t))
    }

    /// Biome group of `terrain`.
    #[must_use]
    pub const fn biome_group(&self, terrain: TerrainType) -> BiomeGroup {
        self.groups[terrain.index()]
    }

    /// Returns true if the two groups should not be placed close together.
    #[must_use]
    pub const fn groups_incompatible(&self, a: BiomeGroup, b: BiomeGroup) -> bool {
        self.incompatible[a.index()][b.index()]
    }

    /// Terrain considered a natural neighbor of `terrain`.
    #[must_use]
    pub const fn natural_neighbors(&self, terrain: TerrainType) -> TerrainSet {
        self.natural[terrain.index()]
    }

    /// Returns a copy of this registry with base weights replaced by name.
    ///
    /// Names are parsed strictly; an unknown terrain name is an error.
    pub fn with_weights(&self, weights: &BTreeMap<String, f64>) -> WorldResult<Self> {
        let mut builder = TileRegistryBuilder::from_registry(self);
        for (name, &weight) in weights {
            builder = builder.weight(name.parse()?, weight);
        }
        builder.build()
    }
}

impl Default for TileRegistry {
    fn default() -> Self {
        // The default tables are symmetric and all weights are valid.
        TileRegistryBuilder::new().finish()
    }
}

/// Builder for [`TileRegistry`].
#[derive(Debug, Clone)]
pub struct TileRegistryBuilder {
    weights: TerrainWeights,
    allowed: [TerrainSet; TerrainType::COUNT],
    groups: [BiomeGroup; TerrainType::COUNT],
    incompatible: [[bool; BiomeGroup::COUNT]; BiomeGroup::COUNT],
    natural: [TerrainSet; TerrainType::COUNT],
}

impl TileRegistryBuilder {
    /// Creates a builder holding the default overworld tables.
    #[must_use]
    pub fn new() -> Self {
        let mut weights = TerrainWeights::uniform(0.0);
        for (terrain, weight) in DEFAULT_WEIGHTS {
            weights.set(terrain, weight);
        }

        let mut groups = [Neutral; TerrainType::COUNT];
        for (terrain, group) in DEFAULT_GROUPS {
            groups[terrain.index()] = group;
        }

        let mut allowed: [TerrainSet; TerrainType::COUNT] =
            std::array::from_fn(|i| TerrainSet::single(TerrainType::ALL[i]));
        for terrain in TerrainType::ALL {
            link(&mut allowed, Hills, terrain);
        }
        for &(a, b) in DEFAULT_ADJACENT {
            link(&mut allowed, a, b);
        }

        let mut natural = [TerrainSet::empty(); TerrainType::COUNT];
        for &(a, b) in DEFAULT_NATURAL {
            link(&mut natural, a, b);
        }

        let mut incompatible = [[false; BiomeGroup::COUNT]; BiomeGroup::COUNT];
        for &(a, b) in DEFAULT_INCOMPATIBLE {
            incompatible[a.index()][b.index()] = true;
            incompatible[b.index()][a.index()] = true;
        }

        Self {
            weights,
            allowed,
            groups,
            incompatible,
            natural,
        }
    }

    fn from_registry(registry: &TileRegistry) -> Self {
        Self {
            weights: registry.weights,
            allowed: registry.allowed,
            groups: registry.groups,
            incompatible: registry.incompatible,
            natural: registry.natural,
        }
    }

    /// Sets the base spawn weight of `terrain`.
    #[must_use]
    pub fn weight(mut self, terrain: TerrainType, weight: f64) -> Self {
        self.weights.set(terrain, weight);
        self
    }

    /// Replaces the allowed-neighbor set of `terrain`.
    ///
    /// Adjacency is symmetrized on [`build`](Self::build): a pair survives
    /// only if both sides list each other.
    #[must_use]
    pub fn allowed_neighbors(
        mut self,
        terrain: TerrainType,
        neighbors: impl IntoIterator<Item = TerrainType>,
    ) -> Self {
        self.allowed[terrain.index()] = neighbors.into_iter().collect();
        self
    }

    /// Moves `terrain` into `group`.
    #[must_use]
    pub fn biome_group(mut self, terrain: TerrainType, group: BiomeGroup) -> Self {
        self.groups[terrain.index()] = group;
        self
    }

    /// Marks two groups as incompatible (symmetric).
    #[must_use]
    pub fn incompatible_groups(mut self, a: BiomeGroup, b: BiomeGroup) -> Self {
        self.incompatible[a.index()][b.index()] = true;
        self.incompatible[b.index()][a.index()] = true;
        self
    }

    /// Removes every incompatible group pair.
    #[must_use]
    pub fn clear_incompatible_groups(mut self) -> Self {
        self.incompatible = [[false; BiomeGroup::COUNT]; BiomeGroup::COUNT];
        self
    }

    /// Replaces the natural-transition set of `terrain`.
    #[must_use]
    pub fn natural_neighbors(
        mut self,
        terrain: TerrainType,
        neighbors: impl IntoIterator<Item = TerrainType>,
    ) -> Self {
        self.natural[terrain.index()] = neighbors.into_iter().collect();
        self
    }

    /// Validates and freezes the tables.
    pub fn build(self) -> WorldResult<TileRegistry> {
        for (terrain, weight) in self.weights.iter() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(WorldError::InvalidWeight {
                    terrain: terrain.to_string(),
                    weight,
                });
            }
        }
        Ok(self.finish())
    }

    fn finish(self) -> TileRegistry {
        let mut allowed = self.allowed;
        for a in TerrainType::ALL {
            for b in TerrainType::ALL {
                let ab = self.allowed[a.index()].contains(b);
                let ba = self.allowed[b.index()].contains(a);
                if ab && !ba {
                    debug!("Dropping one-sided adjacency {a} -> {b}");
                    allowed[a.index()].remove(b);
                }
            }
        }

        let mut natural = self.natural;
        for a in TerrainType::ALL {
            for b in self.natural[a.index()].iter() {
                natural[b.index()].insert(a);
            }
        }

        TileRegistry {
            weights: self.weights,
            allowed,
            groups: self.groups,
            incompatible: self.incompatible,
            natural,
        }
    }
}

impl Default for TileRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn link(table: &mut [TerrainSet; TerrainType::COUNT], a: TerrainType, b: TerrainType) {
    table[a.index()].insert(b);
    table[b.index()].insert(a);
}
