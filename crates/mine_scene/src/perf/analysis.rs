//! Pass/fail analysis of a sampled run
//!
//! A run passes only when every clause holds. Each violated clause adds one
//! human-readable issue, so a partial failure explains itself.

use serde::{Deserialize, Serialize};

use crate::perf::config::TestConfig;
use crate::perf::metrics::MetricsSample;

/// Minimum FPS must stay above this fraction of the target
pub const MIN_FPS_RATIO: f32 = 0.8;
/// A frame is a spike when it exceeds this multiple of the frame-time budget
pub const SPIKE_FACTOR: f32 = 2.0;
/// Largest tolerated fraction of spiking samples
pub const MAX_SPIKE_RATIO: f32 = 0.05;
/// FPS variance (fps²) at or above which a run is unstable
pub const FPS_VARIANCE_THRESHOLD: f32 = 100.0;

/// Outcome of one performance run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Configuration name
    pub config_name: String,
    /// Configured run length in milliseconds
    pub duration_ms: u64,
    /// Raw samples
    pub samples: Vec<MetricsSample>,
    /// Mean FPS
    pub average_fps: f32,
    /// Lowest FPS sample
    pub min_fps: f32,
    /// Highest FPS sample
    pub max_fps: f32,
    /// Mean frame time
    pub average_frame_time_ms: f32,
    /// Last sample memory minus first sample memory
    pub memory_growth_mb: f32,
    /// Fraction of samples above the spike limit
    pub spike_ratio: f32,
    /// Population variance of the FPS series
    pub fps_variance: f32,
    /// Whether every clause held
    pub passed: bool,
    /// One entry per violated clause
    pub issues: Vec<String>,
}

fn mean(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, count) = values.fold((0.0_f64, 0_usize), |(sum, count), v| (sum + f64::from(v), count + 1));
    if count == 0 {
        0.0
    } else {
        (sum / count as f64) as f32
    }
}

/// Judge `samples` against the budgets in `config`
pub fn analyze(config: &TestConfig, samples: Vec<MetricsSample>) -> TestResult {
    let mut result = TestResult {
        config_name: config.name.clone(),
        duration_ms: config.duration_ms,
        samples: Vec::new(),
        average_fps: 0.0,
        min_fps: 0.0,
        max_fps: 0.0,
        average_frame_time_ms: 0.0,
        memory_growth_mb: 0.0,
        spike_ratio: 0.0,
        fps_variance: 0.0,
        passed: false,
        issues: Vec::new(),
    };

    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        result.issues.push("No samples were collected".to_string());
        return result;
    };

    result.average_fps = mean(samples.iter().map(|s| s.fps));
    result.min_fps = samples.iter().map(|s| s.fps).fold(f32::INFINITY, f32::min);
    result.max_fps = samples.iter().map(|s| s.fps).fold(f32::NEG_INFINITY, f32::max);
    result.average_frame_time_ms = mean(samples.iter().map(|s| s.frame_time_ms));
    result.memory_growth_mb = last.memory_mb - first.memory_mb;

    let spike_limit = config.max_frame_time_ms * SPIKE_FACTOR;
    let spikes = samples.iter().filter(|s| s.frame_time_ms > spike_limit).count();
    result.spike_ratio = spikes as f32 / samples.len() as f32;

    let average_fps = result.average_fps;
    result.fps_variance = mean(samples.iter().map(|s| (s.fps - average_fps).powi(2)));

    let issues = &mut result.issues;
    if result.average_fps < config.target_fps {
        issues.push(format!("Average FPS {:.1} is below target {:.1}", result.average_fps, config.target_fps));
    }
    let min_allowed = config.target_fps * MIN_FPS_RATIO;
    if result.min_fps < min_allowed {
        issues.push(format!("Minimum FPS {:.1} is below {:.1} (80% of target)", result.min_fps, min_allowed));
    }
    if result.average_frame_time_ms > config.max_frame_time_ms {
        issues.push(format!(
            "Average frame time {:.2} ms exceeds budget {:.2} ms",
            result.average_frame_time_ms, config.max_frame_time_ms
        ));
    }
    if result.memory_growth_mb > config.max_memory_growth_mb {
        issues.push(format!(
            "Memory grew by {:.1} MB (limit {:.1} MB)",
            result.memory_growth_mb, config.max_memory_growth_mb
        ));
    }
    if result.spike_ratio > MAX_SPIKE_RATIO {
        issues.push(format!(
            "{:.1}% of samples spiked above {:.2} ms (limit {:.0}%)",
            result.spike_ratio * 100.0,
            spike_limit,
            MAX_SPIKE_RATIO * 100.0
        ));
    }
    if result.fps_variance >= FPS_VARIANCE_THRESHOLD {
        issues.push(format!(
            "FPS variance {:.1} exceeds stability threshold {:.0}",
            result.fps_variance, FPS_VARIANCE_THRESHOLD
        ));
    }

    result.passed = result.issues.is_empty();
    result.samples = samples;
    result
}
