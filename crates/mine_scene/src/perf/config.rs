//! Named performance test configurations

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::perf::scenario::SyntheticScenario;
use crate::perf::PerfError;

/// Budgets and pacing for one performance run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestConfig {
    /// Configuration name, carried into the result
    pub name: String,
    /// Total run length in milliseconds
    pub duration_ms: u64,
    /// Minimum acceptable average frame rate
    pub target_fps: f32,
    /// Maximum acceptable average frame time in milliseconds
    pub max_frame_time_ms: f32,
    /// Maximum acceptable memory growth over the run in megabytes
    pub max_memory_growth_mb: f32,
    /// Time between samples in milliseconds
    pub sample_interval_ms: u64,
    /// Synthetic load the run is meant to be paired with
    #[serde(default)]
    pub scenario: SyntheticScenario,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self::baseline()
    }
}

impl TestConfig {
    /// Small pit, desktop budget
    pub fn baseline() -> Self {
        Self {
            name: "baseline".into(),
            duration_ms: 10_000,
            target_fps: 60.0,
            max_frame_time_ms: 16.7,
            max_memory_growth_mb: 50.0,
            sample_interval_ms: 100,
            scenario: SyntheticScenario { equipment_count: 30, grid_rows: 20, grid_cols: 20, ..SyntheticScenario::default() },
        }
    }

    /// Moderate pit on integrated graphics
    pub fn low_end_integrated() -> Self {
        Self {
            name: "low_end_integrated".into(),
            duration_ms: 30_000,
            target_fps: 30.0,
            max_frame_time_ms: 33.3,
            max_memory_growth_mb: 100.0,
            sample_interval_ms: 250,
            scenario: SyntheticScenario { equipment_count: 100, grid_rows: 40, grid_cols: 40, ..SyntheticScenario::default() },
        }
    }

    /// Large fleet and dense grid
    pub fn stress() -> Self {
        Self {
            name: "stress".into(),
            duration_ms: 60_000,
            target_fps: 30.0,
            max_frame_time_ms: 33.3,
            max_memory_growth_mb: 200.0,
            sample_interval_ms: 500,
            scenario: SyntheticScenario { equipment_count: 500, grid_rows: 100, grid_cols: 100, ..SyntheticScenario::default() },
        }
    }

    /// Every built-in preset
    pub fn presets() -> Vec<Self> {
        vec![Self::baseline(), Self::low_end_integrated(), Self::stress()]
    }

    /// Built-in preset by name
    pub fn preset(name: &str) -> Option<Self> {
        Self::presets().into_iter().find(|config| config.name == name)
    }

    /// Run length
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Sampling period
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// Reject configurations that could never produce a meaningful run
    pub fn validate(&self) -> Result<(), PerfError> {
        let problem = if self.name.trim().is_empty() {
            Some("name must not be empty".to_string())
        } else if self.duration_ms == 0 || self.sample_interval_ms == 0 {
            Some("duration and sample interval must be positive".to_string())
        } else if self.sample_interval_ms > self.duration_ms {
            Some(format!("sample interval {} ms exceeds duration {} ms", self.sample_interval_ms, self.duration_ms))
        } else if !(self.target_fps > 0.0 && self.max_frame_time_ms > 0.0) {
            Some("target fps and max frame time must be positive".to_string())
        } else if !(self.max_memory_growth_mb >= 0.0) {
            Some("max memory growth must not be negative".to_string())
        } else {
            None
        };
        match problem {
            Some(reason) => Err(PerfError::InvalidConfig { name: self.name.clone(), reason }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid_and_named() {
        for preset in TestConfig::presets() {
            preset.validate().unwrap();
            assert_eq!(TestConfig::preset(&preset.name), Some(preset.clone()));
        }
        assert!(TestConfig::preset("nonexistent").is_none());
    }

    #[test]
    fn test_presets_scale_load() {
        let baseline = TestConfig::baseline();
        let stress = TestConfig::stress();
        assert!(stress.scenario.equipment_count > baseline.scenario.equipment_count);
        assert!(stress.target_fps <= baseline.target_fps);
    }

    #[test]
    fn test_interval_longer_than_duration_is_invalid() {
        let config = TestConfig { sample_interval_ms: 20_000, ..TestConfig::baseline() };
        assert!(matches!(config.validate(), Err(PerfError::InvalidConfig { .. })));
    }
}
