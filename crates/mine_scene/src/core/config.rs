//! # Scene Settings
//!
//! One serializable structure carrying every tunable of the scene core, so a
//! deployment can be retargeted (e.g. to low-end integrated graphics) from a
//! single file.
//!
//! ## Sections
//!
//! - **coordinates**: domain and scene bounding boxes
//! - **culling**: margin, volume kind and recompute interval
//! - **lod**: per-kind distance thresholds
//! - **instancing**: strategy threshold, capacity and per-kind styles
//! - **heatmap**: overlay elevation, opacity and fade
//! - **perf**: named performance test configurations

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::domain::equipment::EquipmentKind;
use crate::error::SceneResult;
use crate::perf::config::TestConfig;
use crate::render::heatmap::HeatmapConfig;
use crate::render::instancing::InstancingConfig;
use crate::scene::coordinates::{Bounds3, CoordinateTransformer};
use crate::scene::culling::CullingConfig;
use crate::scene::lod::LodConfig;

/// Bounding boxes of the two coordinate spaces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinateSettings {
    /// Domain (easting / northing / elevation) box
    pub domain: Bounds3,
    /// Scene box
    pub scene: Bounds3,
}

impl Default for CoordinateSettings {
    fn default() -> Self {
        Self { domain: Bounds3::mining_default(), scene: Bounds3::scene_default() }
    }
}

/// Performance test configurations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerfSettings {
    /// Configurations, run in order
    pub tests: Vec<TestConfig>,
}

impl Default for PerfSettings {
    fn default() -> Self {
        Self { tests: TestConfig::presets() }
    }
}

impl PerfSettings {
    /// Configuration by name
    pub fn test(&self, name: &str) -> Option<&TestConfig> {
        self.tests.iter().find(|test| test.name == name)
    }
}

/// Every tunable of the scene core
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// Coordinate spaces
    pub coordinates: CoordinateSettings,
    /// Frustum culling
    pub culling: CullingConfig,
    /// Level of detail
    pub lod: LodConfig,
    /// Instanced rendering
    pub instancing: InstancingConfig,
    /// Grade overlay
    pub heatmap: HeatmapConfig,
    /// Performance tests
    pub perf: PerfSettings,
}

impl SceneSettings {
    /// Settings tuned for integrated graphics: earlier LOD drops, earlier
    /// instancing and less frequent culling
    pub fn low_end() -> Self {
        let mut settings = Self::default();
        settings.culling.update_interval = 5;
        for kind in EquipmentKind::ALL {
            let thresholds = match kind {
                EquipmentKind::Excavator => &mut settings.lod.excavator,
                EquipmentKind::Truck => &mut settings.lod.truck,
                EquipmentKind::Conveyor => &mut settings.lod.conveyor,
            };
            thresholds.high *= 0.6;
            thresholds.medium *= 0.6;
        }
        settings.instancing.threshold = 20;
        settings
    }

    /// Transformer for the configured boxes
    pub fn transformer(&self) -> SceneResult<CoordinateTransformer> {
        CoordinateTransformer::new(self.coordinates.domain, self.coordinates.scene)
    }
}

fn invalid(message: impl Into<String>) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(message.into()))
}

impl Config for SceneSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        self.transformer().map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if !(self.culling.margin.is_finite() && self.culling.margin >= 0.0) {
            return invalid(format!("culling margin must be a non-negative number, got {}", self.culling.margin));
        }
        if self.culling.update_interval == 0 {
            return invalid("culling update_interval must be at least 1");
        }

        for kind in EquipmentKind::ALL {
            if !self.lod.thresholds(kind).is_ordered() {
                return invalid(format!("lod thresholds for {kind} must satisfy 0 <= high <= medium"));
            }
            let style = self.instancing.styles.style(kind);
            if !(style.scale > 0.0 && style.ground_offset >= 0.0) {
                return invalid(format!("{kind} style needs a positive scale and non-negative ground offset"));
            }
        }
        if self.instancing.threshold == 0 || self.instancing.max_instances == 0 {
            return invalid("instancing threshold and max_instances must be at least 1");
        }

        if !(0.0..=1.0).contains(&self.heatmap.opacity) {
            return invalid(format!("heatmap opacity must be within [0, 1], got {}", self.heatmap.opacity));
        }
        if !(self.heatmap.fade_duration >= 0.0) {
            return invalid("heatmap fade_duration must not be negative");
        }

        let mut names = HashSet::new();
        for test in &self.perf.tests {
            test.validate().map_err(|e| ConfigError::Invalid(e.to_string()))?;
            if !names.insert(test.name.as_str()) {
                return invalid(format!("duplicate performance test name '{}'", test.name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;
    use crate::scene::coordinates::AxisRange;

    #[test]
    fn test_defaults_are_valid() {
        SceneSettings::default().validate().unwrap();
        SceneSettings::low_end().validate().unwrap();
        assert_eq!(SceneSettings::default().perf.tests.len(), 3);
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = SceneSettings::low_end();
        let text = settings.to_string_as(ConfigFormat::Toml).unwrap();
        let back = SceneSettings::from_str_as(&text, ConfigFormat::Toml).unwrap();
        assert_eq!(back.culling.update_interval, 5);
        assert_eq!(back.lod, settings.lod);
        assert_eq!(back.perf, settings.perf);
    }

    #[test]
    fn test_ron_round_trip() {
        let settings = SceneSettings::default();
        let text = settings.to_string_as(ConfigFormat::Ron).unwrap();
        let back = SceneSettings::from_str_as(&text, ConfigFormat::Ron).unwrap();
        assert_eq!(back.instancing, settings.instancing);
        assert_eq!(back.heatmap, settings.heatmap);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let text = "[culling]\nupdate_interval = 1\n\n[heatmap]\nopacity = 0.5\n";
        let settings = SceneSettings::from_str_as(text, ConfigFormat::Toml).unwrap();
        assert_eq!(settings.culling.update_interval, 1);
        assert_eq!(settings.culling.margin, 5.0);
        assert_eq!(settings.heatmap.opacity, 0.5);
        assert_eq!(settings.coordinates, CoordinateSettings::default());
    }

    #[test]
    fn test_rejects_degenerate_bounds() {
        let mut settings = SceneSettings::default();
        settings.coordinates.domain.x = AxisRange::new(100.0, 100.0);
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_inverted_lod() {
        let mut settings = SceneSettings::default();
        settings.lod.truck.high = 200.0;
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(msg)) if msg.contains("truck")));
    }

    #[test]
    fn test_rejects_duplicate_test_names() {
        let mut settings = SceneSettings::default();
        settings.perf.tests.push(TestConfig::baseline());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(SceneSettings::load_from_file("settings.json"), Err(ConfigError::UnsupportedFormat(_))));
    }
}
