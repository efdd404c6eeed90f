//! Region context supplied by the region-assignment layer.

use serde::{Deserialize, Serialize};

/// Descriptor of the broad area the player is in.
///
/// Only [`theme`](Self::theme) affects terrain generation. The remaining
/// fields travel with the context for encounter scaling and narration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionContext {
    /// Theme name, e.g. "forest" or "mountains".
    pub theme: String,
    /// Danger rating of the region, e.g. "low" or "high".
    pub danger_level: String,
    /// Named landmarks inside the region.
    pub landmarks: Vec<String>,
    /// Anchor of the region in world tiles.
    pub coordinates: (i64, i64),
}

impl RegionContext {
    /// Creates a context with the given theme.
    #[must_use]
    pub fn new(theme: impl Into<String>) -> Self {
        Self {
            theme: theme.into(),
            ..Self::default()
        }
    }

    /// Sets the danger level.
    #[must_use]
    pub fn with_danger_level(mut self, danger_level: impl Into<String>) -> Self {
        self.danger_level = danger_level.into();
        self
    }

    /// Sets the landmark list.
    #[must_use]
    pub fn with_landmarks<I, S>(mut self, landmarks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.landmarks = landmarks.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the anchor coordinates.
    #[must_use]
    pub fn with_coordinates(mut self, x: i64, y: i64) -> Self {
        self.coordinates = (x, y);
        self
    }

    /// Theme name.
    #[must_use]
    pub fn theme(&self) -> &str {
        &self.theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let region = RegionContext::new("mountains")
            .with_danger_level("high")
            .with_landmarks(["Old Keep", "Pass"])
            .with_coordinates(-40, 12);

        assert_eq!(region.theme(), "mountains");
        assert_eq!(region.danger_level, "high");
        assert_eq!(region.landmarks, vec!["Old Keep".to_string(), "Pass".to_string()]);
        assert_eq!(region.coordinates, (-40, 12));
    }

    #[test]
    fn test_toml_roundtrip() {
        let region = RegionContext::new("coastal")
            .with_danger_level("low")
            .with_coordinates(3, -9);
        let text = toml::to_string(&region).expect("serialize");
        let back: RegionContext = toml::from_str(&text).expect("deserialize");
        assert_eq!(back, region);
    }

    #[test]
    fn test_region_layer_document() {
        let region: RegionContext = toml::from_str(
            r#"
            theme = "forest"
            danger_level = "high"
            landmarks = ["Witch Hut"]
            coordinates = [120, -48]
            "#,
        )
        .expect("deserialize");

        assert_eq!(region.danger_level, "high");
        assert_eq!(region.coordinates, (120, -48));
        assert_eq!(region.landmarks, vec!["Witch Hut".to_string()]);
    }

    #[test]
    fn test_missing_fields_default() {
        let region: RegionContext = toml::from_str("theme = \"swamp\"").expect("deserialize");
        assert_eq!(region, RegionContext::new("swamp"));
    }
}
