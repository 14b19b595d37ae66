//! Performance testing
//!
//! Named configurations, a cooperative sampling harness, pass/fail analysis
//! and JSON export, plus seeded synthetic scenes to load the pipeline with.

pub mod analysis;
pub mod config;
pub mod harness;
pub mod metrics;
pub mod scenario;

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

pub use analysis::{analyze, TestResult, FPS_VARIANCE_THRESHOLD};
pub use config::TestConfig;
pub use harness::{simulate_run, PerformanceHarness};
pub use metrics::{platform_probe, MemoryProbe, MetricsSample, NullProbe, PerformanceMonitor, ProcStatusProbe};
pub use scenario::{SyntheticFeed, SyntheticScenario};

/// Performance harness errors
#[derive(Error, Debug)]
pub enum PerfError {
    /// A run is already active
    #[error("performance test '{active}' is already running")]
    AlreadyRunning {
        /// Name of the active configuration
        active: String,
    },

    /// The configuration cannot produce a meaningful run
    #[error("invalid performance test configuration '{name}': {reason}")]
    InvalidConfig {
        /// Configuration name
        name: String,
        /// What is wrong
        reason: String,
    },

    /// Results could not be serialized
    #[error("failed to export results: {0}")]
    Export(#[from] serde_json::Error),

    /// Results could not be written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct Report<'a> {
    results: &'a [TestResult],
    passed: usize,
    failed: usize,
}

/// Serialize results as pretty-printed JSON
pub fn export_json(results: &[TestResult]) -> Result<String, PerfError> {
    let passed = results.iter().filter(|result| result.passed).count();
    let report = Report { results, passed, failed: results.len() - passed };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Write results to a JSON file
pub fn write_json(path: impl AsRef<Path>, results: &[TestResult]) -> Result<(), PerfError> {
    let path = path.as_ref();
    std::fs::write(path, export_json(results)?)?;
    log::info!("Wrote {} performance result(s) to {}", results.len(), path.display());
    Ok(())
}
