//! Cooperative performance test harness
//!
//! The harness never owns a timer or a thread. The render loop calls
//! [`PerformanceHarness::record_frame`] once per frame and
//! [`PerformanceHarness::tick`] with the current time; sampling and the end
//! of the run are decided from those timestamps alone, so the loop is never
//! stalled and tests can drive it with synthetic clocks.

use std::time::{Duration, Instant};

use crate::foundation::time::millis_between;
use crate::perf::analysis::{analyze, TestResult};
use crate::perf::config::TestConfig;
use crate::perf::metrics::{MemoryProbe, MetricsSample};
use crate::perf::PerfError;
use crate::render::stats::RenderInfo;

#[derive(Debug)]
struct ActiveRun {
    config: TestConfig,
    started: Instant,
    last_sample: Instant,
    frames_since_sample: u32,
    samples: Vec<MetricsSample>,
}

/// Runs one named configuration at a time
#[derive(Debug, Default)]
pub struct PerformanceHarness {
    run: Option<ActiveRun>,
    results: Vec<TestResult>,
}

impl PerformanceHarness {
    /// Create an idle harness
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a run
    ///
    /// Fails immediately if a run is already active; the active run is left
    /// untouched.
    pub fn start(&mut self, config: TestConfig, now: Instant) -> Result<(), PerfError> {
        if let Some(active) = &self.run {
            return Err(PerfError::AlreadyRunning { active: active.config.name.clone() });
        }
        config.validate()?;

        log::info!(
            "Starting performance test '{}' ({} ms, target {:.0} fps)",
            config.name,
            config.duration_ms,
            config.target_fps
        );
        self.run = Some(ActiveRun {
            config,
            started: now,
            last_sample: now,
            frames_since_sample: 0,
            samples: Vec::new(),
        });
        Ok(())
    }

    /// Whether a run is active
    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Name of the active configuration
    pub fn active_config(&self) -> Option<&TestConfig> {
        self.run.as_ref().map(|run| &run.config)
    }

    /// Count one rendered frame
    pub fn record_frame(&mut self) {
        if let Some(run) = &mut self.run {
            run.frames_since_sample = run.frames_since_sample.saturating_add(1);
        }
    }

    /// Advance the harness clock
    ///
    /// Takes a sample when the sample interval has elapsed and finishes the
    /// run once its duration is over, returning the analyzed result.
    pub fn tick(&mut self, now: Instant, render_info: &RenderInfo, probe: &dyn MemoryProbe) -> Option<TestResult> {
        let run = self.run.as_mut()?;

        if now.saturating_duration_since(run.last_sample) >= run.config.sample_interval() {
            let sample = take_sample(run, now, render_info, probe);
            log::trace!("Sample at {:.0} ms: {:.1} fps", sample.timestamp_ms, sample.fps);
            run.samples.push(sample);
        }

        if now.saturating_duration_since(run.started) < run.config.duration() {
            return None;
        }

        let run = self.run.take()?;
        let result = analyze(&run.config, run.samples);
        if result.passed {
            log::info!("Performance test '{}' passed ({:.1} avg fps)", result.config_name, result.average_fps);
        } else {
            log::warn!("Performance test '{}' failed: {}", result.config_name, result.issues.join("; "));
        }
        self.results.push(result.clone());
        Some(result)
    }

    /// Halt the active run without analysis, returning its samples
    ///
    /// Returns an empty list when nothing is running.
    pub fn stop(&mut self) -> Vec<MetricsSample> {
        match self.run.take() {
            Some(run) => {
                log::info!("Performance test '{}' stopped after {} samples", run.config.name, run.samples.len());
                run.samples
            }
            None => Vec::new(),
        }
    }

    /// Fraction of the active run's duration elapsed at `now`
    pub fn progress(&self, now: Instant) -> Option<f32> {
        let run = self.run.as_ref()?;
        let total = run.config.duration().as_secs_f32();
        Some((now.saturating_duration_since(run.started).as_secs_f32() / total).min(1.0))
    }

    /// Completed results, oldest first
    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// Remove and return completed results
    pub fn take_results(&mut self) -> Vec<TestResult> {
        std::mem::take(&mut self.results)
    }
}

fn take_sample(run: &mut ActiveRun, now: Instant, render_info: &RenderInfo, probe: &dyn MemoryProbe) -> MetricsSample {
    let elapsed_ms = millis_between(run.last_sample, now) as f32;
    let frames = run.frames_since_sample;
    let (fps, frame_time_ms) = if frames == 0 || elapsed_ms <= 0.0 {
        (0.0, elapsed_ms)
    } else {
        (frames as f32 * 1000.0 / elapsed_ms, elapsed_ms / frames as f32)
    };

    run.last_sample = now;
    run.frames_since_sample = 0;

    MetricsSample {
        fps,
        frame_time_ms,
        memory_mb: probe.memory_mb().max(0.0),
        draw_calls: render_info.draw_calls,
        triangles: render_info.triangles,
        timestamp_ms: millis_between(run.started, now),
    }
}

/// Drive a full run against a fixed frame time, without a renderer
///
/// Useful for checking budgets in tests: every simulated frame takes
/// `frame_time` and reports `render_info`.
pub fn simulate_run(
    config: TestConfig,
    frame_time: Duration,
    render_info: RenderInfo,
    probe: &dyn MemoryProbe,
) -> Result<TestResult, PerfError> {
    let mut harness = PerformanceHarness::new();
    let mut now = Instant::now();
    harness.start(config, now)?;

    let step = frame_time.max(Duration::from_micros(100));
    loop {
        now += step;
        harness.record_frame();
        if let Some(result) = harness.tick(now, &render_info, probe) {
            return Ok(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perf::metrics::NullProbe;

    fn short_config() -> TestConfig {
        TestConfig {
            name: "short".into(),
            duration_ms: 1000,
            target_fps: 30.0,
            max_frame_time_ms: 33.3,
            max_memory_growth_mb: 10.0,
            sample_interval_ms: 100,
            scenario: Default::default(),
        }
    }

    #[test]
    fn test_start_rejects_reentry() {
        let mut harness = PerformanceHarness::new();
        let now = Instant::now();
        harness.start(short_config(), now).unwrap();

        let err = harness.start(TestConfig::baseline(), now).unwrap_err();
        assert!(matches!(err, PerfError::AlreadyRunning { ref active } if active == "short"));
        assert_eq!(harness.active_config().map(|c| c.name.as_str()), Some("short"));
    }

    #[test]
    fn test_samples_at_interval_and_finishes() {
        let mut harness = PerformanceHarness::new();
        let start = Instant::now();
        harness.start(short_config(), start).unwrap();
        let info = RenderInfo { draw_calls: 7, triangles: 900, ..RenderInfo::default() };

        // 60 fps for one second, ticking every frame
        let mut result = None;
        for frame in 1..=61 {
            harness.record_frame();
            let now = start + Duration::from_micros(frame * 16_667);
            if let Some(done) = harness.tick(now, &info, &NullProbe) {
                result = Some(done);
                break;
            }
        }

        let result = result.expect("run should finish after its duration");
        assert!(!harness.is_running());
        assert!(result.passed, "{:?}", result.issues);
        assert!((9..=10).contains(&result.samples.len()));
        assert!(result.samples.iter().all(|s| s.draw_calls == 7 && s.triangles == 900));
        assert!((result.average_fps - 60.0).abs() < 1.0);
        assert_eq!(harness.results().len(), 1);
    }

    #[test]
    fn test_stop_returns_samples_without_result() {
        let mut harness = PerformanceHarness::new();
        let start = Instant::now();
        harness.start(short_config(), start).unwrap();
        for step in 1..=3 {
            harness.record_frame();
            harness.tick(start + Duration::from_millis(step * 100), &RenderInfo::default(), &NullProbe);
        }

        let samples = harness.stop();
        assert_eq!(samples.len(), 3);
        assert!(!harness.is_running());
        assert!(harness.results().is_empty());
        assert!(harness.stop().is_empty());

        // A new run may start after stopping
        harness.start(short_config(), start).unwrap();
    }

    #[test]
    fn test_tick_when_idle_does_nothing() {
        let mut harness = PerformanceHarness::new();
        harness.record_frame();
        assert!(harness.tick(Instant::now(), &RenderInfo::default(), &NullProbe).is_none());
    }

    #[test]
    fn test_slow_simulated_run_fails_on_fps() {
        let result = simulate_run(short_config(), Duration::from_millis(50), RenderInfo::default(), &NullProbe).unwrap();
        assert!(!result.passed);
        assert!(result.issues.iter().any(|issue| issue.contains("FPS")));
    }

    #[test]
    fn test_fast_simulated_run_passes() {
        let result = simulate_run(short_config(), Duration::from_millis(10), RenderInfo::default(), &NullProbe).unwrap();
        assert!(result.passed, "{:?}", result.issues);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_memory_probe_is_sampled() {
        let result = simulate_run(short_config(), Duration::from_millis(10), RenderInfo::default(), &|| 64.0_f32).unwrap();
        assert!(result.samples.iter().all(|s| s.memory_mb == 64.0));
        assert_eq!(result.memory_growth_mb, 0.0);
    }
}
