//! Theme biasing and biome-distance helpers.
//!
//! A region theme turns into a per-terrain multiplier table that the chunk
//! manager hands to the solver as weight overrides. The distance penalty keeps
//! incompatible biome groups apart at short range.

use std::collections::HashSet;

use overland_common::{WorldError, WorldResult};

use crate::registry::TileRegistry;
use crate::terrain::{BiomeGroup, TerrainSet, TerrainType, TerrainWeights};

/// Multiplier applied to a candidate near an incompatible biome group.
pub const INCOMPATIBLE_PENALTY: f64 = 0.01;

/// Default Manhattan radius searched for incompatible neighbors.
pub const DEFAULT_PENALTY_RADIUS: u32 = 2;

/// Largest accepted penalty radius.
pub const MAX_PENALTY_RADIUS: u32 = 16;

/// Multiplier applied to groups a theme suppresses.
pub const SUPPRESS_MULTIPLIER: f64 = 0.3;

/// Bias a recognized region theme applies to terrain weights.
#[derive(Debug, Clone, Copy)]
struct ThemeBias {
    /// Theme name as supplied by the region layer.
    theme: &'static str,
    /// Terrain family the theme is about.
    boosted: &'static [TerrainType],
    /// Multiplier for the boosted family.
    boost: f64,
    /// Groups that clash with the theme.
    suppressed: &'static [BiomeGroup],
}

const THEMES: &[ThemeBias] = &[
    ThemeBias {
        theme: "forest",
        boosted: &[TerrainType::Forest],
        boost: 4.0,
        suppressed: &[BiomeGroup::Arid, BiomeGroup::Alpine],
    },
    ThemeBias {
        theme: "mountains",
        boosted: &[TerrainType::Mountain, TerrainType::Foothills, TerrainType::Hills],
        boost: 3.0,
        suppressed: &[BiomeGroup::Aquatic],
    },
    ThemeBias {
        theme: "desert",
        boosted: &[TerrainType::Desert],
        boost: 4.0,
        suppressed: &[BiomeGroup::Temperate],
    },
    ThemeBias {
        theme: "swamp",
        boosted: &[TerrainType::Swamp, TerrainType::Water],
        boost: 3.5,
        suppressed: &[BiomeGroup::Arid, BiomeGroup::Alpine],
    },
    ThemeBias {
        theme: "coastal",
        boosted: &[TerrainType::Beach, TerrainType::Water],
        boost: 3.0,
        suppressed: &[BiomeGroup::Alpine],
    },
    ThemeBias {
        theme: "plains",
        boosted: &[TerrainType::Plains],
        boost: 3.0,
        suppressed: &[BiomeGroup::Alpine],
    },
];

fn find_theme(theme: &str) -> Option<&'static ThemeBias> {
    let wanted = theme.trim();
    THEMES.iter().find(|t| t.theme.eq_ignore_ascii_case(wanted))
}

/// Returns true if `theme` changes generation.
#[must_use]
pub fn is_known_theme(theme: &str) -> bool {
    find_theme(theme).is_some()
}

/// Per-terrain multipliers for a region theme.
///
/// Boosted terrain takes the theme's boost even if its group is also
/// suppressed. Unknown themes yield the identity table.
#[must_use]
pub fn theme_multipliers(registry: &TileRegistry, theme: &str) -> TerrainWeights {
    let mut multipliers = TerrainWeights::identity();
    let Some(bias) = find_theme(theme) else {
        return multipliers;
    };

    for terrain in TerrainType::ALL {
        if bias.boosted.contains(&terrain) {
            multipliers.set(terrain, bias.boost);
        } else if bias.suppressed.contains(&registry.biome_group(terrain)) {
            multipliers.set(terrain, SUPPRESS_MULTIPLIER);
        }
    }
    multipliers
}

/// Base weights of `registry` biased toward `theme`.
///
/// Never fails: an unrecognized theme returns the base weights unmodified.
#[must_use]
pub fn biased_weights(registry: &TileRegistry, theme: &str) -> TerrainWeights {
    registry
        .weights()
        .multiplied_by(&theme_multipliers(registry, theme))
}

/// Weight multiplier for placing `terrain` near `nearby` collapsed tiles.
///
/// Returns [`INCOMPATIBLE_PENALTY`] if any nearby terrain belongs to a group
/// incompatible with the group of `terrain`, otherwise 1.0.
#[must_use]
pub fn distance_penalty(registry: &TileRegistry, terrain: TerrainType, nearby: TerrainSet) -> f64 {
    let group = registry.biome_group(terrain);
    let clash = nearby
        .iter()
        .any(|other| registry.groups_incompatible(group, registry.biome_group(other)));
    if clash {
        INCOMPATIBLE_PENALTY
    } else {
        1.0
    }
}

/// Returns the radius unchanged if it is at most [`MAX_PENALTY_RADIUS`].
pub fn check_penalty_radius(radius: u32) -> WorldResult<u32> {
    if radius > MAX_PENALTY_RADIUS {
        return Err(WorldError::InvalidPenaltyRadius(radius));
    }
    Ok(radius)
}

/// Every coordinate within Manhattan distance `radius` of `(x, y)`.
///
/// Coordinates past the edge of the `i64` plane are omitted.
#[must_use]
pub fn tiles_in_radius(x: i64, y: i64, radius: u32) -> HashSet<(i64, i64)> {
    radius_offsets(radius)
        .filter_map(|(dx, dy)| Some((x.checked_add(dx)?, y.checked_add(dy)?)))
        .collect()
}

/// Number of tiles in the Manhattan ball of `radius`, if it fits in `usize`.
fn diamond_size(radius: u32) -> Option<usize> {
    let r = usize::try_from(radius).ok()?;
    // 2r^2 + 2r + 1
    r.checked_mul(r)?
        .checked_mul(2)?
        .checked_add(r.checked_mul(2)?)?
        .checked_add(1)
}

/// Offsets of the Manhattan ball of `radius`, row-major.
pub(crate) fn radius_offsets(radius: u32) -> impl ExactSizeIterator<Item = (i64, i64)> {
    let r = i64::from(radius);
    let mut offsets = Vec::with_capacity(diamond_size(radius).unwrap_or(0));
    for dy in -r..=r {
        let span = r - dy.abs();
        for dx in -span..=span {
            offsets.push((dx, dy));
        }
    }
    offsets.into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mountains_bias() {
        let registry = TileRegistry::default();
        let base = registry.weights();
        let biased = biased_weights(&registry, "mountains");

        assert_eq!(
            biased[TerrainType::Mountain],
            base[TerrainType::Mountain] * 3.0
        );
        assert_eq!(biased[TerrainType::Beach], base[TerrainType::Beach] * 0.3);
        assert_eq!(biased[TerrainType::Plains], base[TerrainType::Plains]);
    }

    #[test]
    fn test_unknown_theme_unmodified() {
        let registry = TileRegistry::default();
        assert_eq!(&biased_weights(&registry, "unknown_xyz"), registry.weights());
        assert_eq!(&biased_weights(&registry, ""), registry.weights());
        assert!(!is_known_theme("unknown_xyz"));
    }

    #[test]
    fn test_theme_lookup_case_insensitive() {
        let registry = TileRegistry::default();
        assert_eq!(
            biased_weights(&registry, "  Forest "),
            biased_weights(&registry, "forest")
        );
        assert!(is_known_theme("DESERT"));
    }

    #[test]
    fn test_forest_theme_suppresses_arid() {
        let registry = TileRegistry::default();
        let mult = theme_multipliers(&registry, "forest");
        assert_eq!(mult[TerrainType::Forest], 4.0);
        assert_eq!(mult[TerrainType::Desert], SUPPRESS_MULTIPLIER);
        assert_eq!(mult[TerrainType::Mountain], SUPPRESS_MULTIPLIER);
        assert_eq!(mult[TerrainType::Swamp], 1.0);
    }

    #[test]
    fn test_distance_penalty() {
        let registry = TileRegistry::default();
        let deserts = TerrainSet::single(TerrainType::Desert);

        assert_eq!(
            distance_penalty(&registry, TerrainType::Forest, deserts),
            INCOMPATIBLE_PENALTY
        );
        assert_eq!(distance_penalty(&registry, TerrainType::Plains, deserts), 1.0);
        assert_eq!(
            distance_penalty(&registry, TerrainType::Desert, TerrainSet::of(&[TerrainType::Swamp])),
            INCOMPATIBLE_PENALTY
        );
        assert_eq!(
            distance_penalty(&registry, TerrainType::Forest, TerrainSet::empty()),
            1.0
        );
    }

    #[test]
    fn test_tiles_in_radius_sizes() {
        assert_eq!(tiles_in_radius(0, 0, 0), HashSet::from([(0, 0)]));
        assert_eq!(tiles_in_radius(0, 0, 1).len(), 5);
        assert_eq!(tiles_in_radius(0, 0, 2).len(), 13);
    }

    #[test]
    fn test_diamond_size() {
        assert_eq!(diamond_size(0), Some(1));
        assert_eq!(diamond_size(2), Some(13));
        assert_eq!(diamond_size(MAX_PENALTY_RADIUS), Some(545));
        assert_eq!(radius_offsets(3).len(), diamond_size(3).unwrap_or_default());
    }

    #[test]
    fn test_penalty_radius_bounds() {
        assert_eq!(check_penalty_radius(0), Ok(0));
        assert_eq!(check_penalty_radius(MAX_PENALTY_RADIUS), Ok(MAX_PENALTY_RADIUS));
        assert_eq!(
            check_penalty_radius(u32::MAX),
            Err(WorldError::InvalidPenaltyRadius(u32::MAX))
        );
    }

    #[test]
    fn test_tiles_in_radius_at_plane_edge() {
        let tiles = tiles_in_radius(i64::MAX, i64::MIN, 1);
        assert_eq!(tiles.len(), 3);
        assert!(tiles.contains(&(i64::MAX, i64::MIN)));
        assert!(tiles.contains(&(i64::MAX - 1, i64::MIN)));
        assert!(tiles.contains(&(i64::MAX, i64::MIN + 1)));
    }

    #[test]
    fn test_tiles_in_radius_offset_center() {
        let tiles = tiles_in_radius(10, -4, 1);
        assert!(tiles.contains(&(10, -4)));
        assert!(tiles.contains(&(11, -4)));
        assert!(tiles.contains(&(10, -5)));
        assert!(!tiles.contains(&(11, -5)));
    }

    proptest! {
        #[test]
        fn prop_tiles_in_radius_is_manhattan_ball(x in -1000i64..1000, y in -1000i64..1000, r in 0u32..6) {
            let tiles = tiles_in_radius(x, y, r);
            let r = i64::from(r);
            prop_assert_eq!(tiles.len() as i64, 2 * r * r + 2 * r + 1);
            for (tx, ty) in tiles {
                prop_assert!((tx - x).abs() + (ty - y).abs() <= r);
            }
        }
    }
}
