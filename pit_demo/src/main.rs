//! Headless performance runner for the mine scene core
//!
//! Runs each configured performance test against a synthetic pit: a feed
//! thread publishes drifting snapshots while the render loop culls, selects
//! LOD and builds draw data every frame. Results are written as JSON.
//!
//! ```text
//! pit_perf [--config <file>] [--out <file>] [preset ...]
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use mine_scene::config::ConfigError;
use mine_scene::domain::SnapshotSender;
use mine_scene::error::SceneError;
use mine_scene::foundation::logging;
use mine_scene::foundation::time::Timer;
use mine_scene::perf::{platform_probe, write_json, MemoryProbe, PerfError, PerformanceMonitor};
use mine_scene::prelude::*;
use mine_scene::scene::Bounds3;
use thiserror::Error;

const DEFAULT_CONFIG: &str = "pit_demo/config/mine_scene.toml";
const DEFAULT_OUTPUT: &str = "perf_results.json";

// Feed cadence; the telemetry backend pushes roughly ten updates a second
const FEED_INTERVAL: Duration = Duration::from_millis(100);
const ORBIT_RADIUS: f32 = 250.0;
const ORBIT_HEIGHT: f32 = 150.0;
const ORBIT_SPEED: f32 = 0.2;

#[derive(Error, Debug)]
enum DemoError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("performance test error: {0}")]
    Perf(#[from] PerfError),

    #[error("no performance test named '{0}'")]
    UnknownTest(String),

    #[error("{0}")]
    Usage(String),
}

struct Options {
    config: Option<PathBuf>,
    output: PathBuf,
    tests: Vec<String>,
}

impl Options {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, DemoError> {
        let mut options = Self { config: None, output: PathBuf::from(DEFAULT_OUTPUT), tests: Vec::new() };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => options.config = Some(args.next().ok_or_else(|| missing("--config"))?.into()),
                "--out" => options.output = args.next().ok_or_else(|| missing("--out"))?.into(),
                flag if flag.starts_with("--") => return Err(DemoError::Usage(format!("unknown flag '{flag}'"))),
                name => options.tests.push(name.to_string()),
            }
        }
        Ok(options)
    }

    fn settings(&self) -> Result<SceneSettings, DemoError> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None if PathBuf::from(DEFAULT_CONFIG).exists() => PathBuf::from(DEFAULT_CONFIG),
            None => {
                log::info!("No configuration file, using defaults");
                return Ok(SceneSettings::default());
            }
        };
        Ok(SceneSettings::load_from_file(path)?)
    }
}

fn missing(flag: &str) -> DemoError {
    DemoError::Usage(format!("{flag} needs a value"))
}

/// Publishes synthetic snapshots from a background thread until stopped
struct FeedThread {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FeedThread {
    fn spawn(scenario: &SyntheticScenario, domain: Bounds3, sender: SnapshotSender) -> Result<Self, DemoError> {
        let mut feed = scenario.feed(domain)?;
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::spawn(move || {
            while flag.load(Ordering::Relaxed) {
                sender.publish(feed.next_snapshot());
                thread::sleep(FEED_INTERVAL);
            }
        });
        Ok(Self { running, handle: Some(handle) })
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Feed thread panicked");
            }
        }
    }
}

impl Drop for FeedThread {
    fn drop(&mut self) {
        self.stop();
    }
}

struct PitPerfApp {
    settings: SceneSettings,
    probe: Box<dyn MemoryProbe>,
    harness: PerformanceHarness,
}

impl PitPerfApp {
    fn new(settings: SceneSettings) -> Self {
        Self { settings, probe: platform_probe(), harness: PerformanceHarness::new() }
    }

    fn run_test(&mut self, config: TestConfig) -> Result<TestResult, DemoError> {
        let mut scene = MineScene::new(&self.settings)?;
        let (sender, inbox) = snapshot_channel();
        let mut feed = FeedThread::spawn(&config.scenario, self.settings.coordinates.domain, sender)?;

        log::info!(
            "Test '{}': {} equipment, {}x{} grade grid",
            config.name,
            config.scenario.equipment_count,
            config.scenario.grid_rows,
            config.scenario.grid_cols
        );

        let mut camera = Camera::default();
        let mut monitor = PerformanceMonitor::default();
        let mut angle = 0.0_f32;
        let mut timer = Timer::new();
        self.harness.start(config, Instant::now())?;

        let result = loop {
            timer.update();
            let dt = timer.delta_time();

            scene.ingest(&inbox);
            angle += ORBIT_SPEED * dt;
            camera.set_position(Vec3::new(angle.cos() * ORBIT_RADIUS, ORBIT_HEIGHT, angle.sin() * ORBIT_RADIUS));
            camera.look_at(Vec3::zeros(), Vec3::y());

            let frame = scene.render_frame(&camera.state(), dt);
            monitor.record_frame_time(dt * 1000.0);
            if frame.frame % 1000 == 0 {
                log::debug!(
                    "Frame {}: {:.0} fps, {} draw calls, {:.0}% visible",
                    frame.frame,
                    monitor.fps(),
                    frame.render_info.draw_calls,
                    frame.culling.visibility_ratio * 100.0
                );
            }

            self.harness.record_frame();
            if let Some(result) = self.harness.tick(Instant::now(), &frame.render_info, self.probe.as_ref()) {
                break result;
            }
        };

        feed.stop();
        log::info!("Rendered {} frames in {:.1}s", timer.frame_count(), timer.elapsed().as_secs_f32());
        log::info!("Feed delivered {} snapshots, {} superseded", inbox.delivered_count(), inbox.superseded_count());
        Ok(result)
    }

    fn run(&mut self, names: &[String]) -> Result<Vec<TestResult>, DemoError> {
        let tests: Vec<TestConfig> = if names.is_empty() {
            self.settings.perf.tests.clone()
        } else {
            names
                .iter()
                .map(|name| {
                    self.settings
                        .perf
                        .test(name)
                        .cloned()
                        .or_else(|| TestConfig::preset(name))
                        .ok_or_else(|| DemoError::UnknownTest(name.clone()))
                })
                .collect::<Result<_, _>>()?
        };

        for config in tests {
            self.run_test(config)?;
        }
        Ok(self.harness.take_results())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let options = Options::parse(std::env::args().skip(1))?;
    let settings = options.settings()?;
    log::info!("Starting pit performance run");

    let mut app = PitPerfApp::new(settings);
    let results = app.run(&options.tests)?;

    for result in &results {
        let verdict = if result.passed { "PASS" } else { "FAIL" };
        println!(
            "{verdict} {:<20} avg {:6.1} fps  min {:6.1} fps  {:6.2} ms  +{:.1} MB",
            result.config_name,
            result.average_fps,
            result.min_fps,
            result.average_frame_time_ms,
            result.memory_growth_mb
        );
        for issue in &result.issues {
            println!("     - {issue}");
        }
    }

    write_json(&options.output, &results)?;
    Ok(())
}
