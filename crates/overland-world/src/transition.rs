//! Advisory naturalness checks for terrain transitions.
//!
//! These never affect generation. Narrative and QA tooling use them to flag
//! jarring neighbors such as forest next to desert.

use crate::registry::TileRegistry;
use crate::terrain::TerrainType;

/// Returns true if `a` next to `b` reads as natural.
///
/// Same-terrain pairs are always natural.
#[must_use]
pub fn is_natural_transition(registry: &TileRegistry, a: TerrainType, b: TerrainType) -> bool {
    a == b || registry.natural_neighbors(a).contains(b)
}

/// Human-readable warning for an unnatural transition.
#[must_use]
pub fn transition_warning(registry: &TileRegistry, a: TerrainType, b: TerrainType) -> Option<String> {
    if is_natural_transition(registry, a, b) {
        None
    } else {
        Some(format!("Unnatural transition: {a} next to {b}"))
    }
}

/// String form of [`is_natural_transition`]. Unknown terrain is never natural.
#[must_use]
pub fn is_natural_transition_named(registry: &TileRegistry, a: &str, b: &str) -> bool {
    match (a.parse(), b.parse()) {
        (Ok(a), Ok(b)) => is_natural_transition(registry, a, b),
        _ => false,
    }
}

/// String form of [`transition_warning`].
///
/// Unknown terrain always yields a warning naming it.
#[must_use]
pub fn transition_warning_named(registry: &TileRegistry, a: &str, b: &str) -> Option<String> {
    let parsed_a = a.parse::<TerrainType>();
    let parsed_b = b.parse::<TerrainType>();
    match (parsed_a, parsed_b) {
        (Ok(a), Ok(b)) => transition_warning(registry, a, b),
        (Err(e), _) | (_, Err(e)) => Some(format!("Unnatural transition: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::TerrainType::{Beach, Desert, Forest, Mountain, Water};

    #[test]
    fn test_same_terrain_natural() {
        let registry = TileRegistry::default();
        for terrain in TerrainType::ALL {
            assert!(is_natural_transition(&registry, terrain, terrain));
        }
    }

    #[test]
    fn test_natural_pairs_symmetric() {
        let registry = TileRegistry::default();
        assert!(is_natural_transition(&registry, Beach, Water));
        assert!(is_natural_transition(&registry, Water, Beach));
        assert!(!is_natural_transition(&registry, Forest, Desert));
        assert!(!is_natural_transition(&registry, Desert, Forest));
    }

    #[test]
    fn test_warning_text() {
        let registry = TileRegistry::default();
        assert_eq!(transition_warning(&registry, Beach, Water), None);
        let warning = transition_warning(&registry, Mountain, Water).expect("unnatural");
        assert!(warning.contains("mountain"));
        assert!(warning.contains("water"));
    }

    #[test]
    fn test_named_variants() {
        let registry = TileRegistry::default();
        assert!(is_natural_transition_named(&registry, "Beach", "water"));
        assert!(!is_natural_transition_named(&registry, "lava", "lava"));
        assert!(!is_natural_transition_named(&registry, "forest", "lava"));

        let warning = transition_warning_named(&registry, "lava", "forest").expect("unknown");
        assert!(warning.contains("lava"));
        assert_eq!(transition_warning_named(&registry, "plains", "forest"), None);
    }
}
