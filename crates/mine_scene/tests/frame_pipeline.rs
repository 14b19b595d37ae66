use std::sync::{Arc, Mutex};
use std::time::Duration;

use mine_scene::config::ConfigFormat;
use mine_scene::perf::{export_json, simulate_run, NullProbe};
use mine_scene::prelude::*;
use mine_scene::render::GradeBand;
use mine_scene::scene::{LodTier, Ray};

const FEED: &str = r#"{
    "sequence": 12,
    "equipment": [
        {"id": "EX-01", "type": "Excavator", "status": "operating",
         "position": {"x": 1100, "y": 1900, "z": -25}},
        {"id": "HT-07", "type": "truck", "status": "idle", "space": "scene",
         "position": {"x": 0, "y": 0, "z": -80}},
        {"id": "DL-01", "type": "dragline", "status": "operating",
         "position": {"x": 1000, "y": 1700, "z": -10}},
        {"id": "CV-02", "type": "conveyor", "status": "broken",
         "position": {"x": 900, "y": 1650, "z": -5}}
    ],
    "gradeData": {
        "grid": [[0.4, 1.2], [2.2, 2.9]], "rows": 2, "columns": 2,
        "bounds": {"minX": 800, "maxX": 1400, "minY": 1600, "maxY": 2200}
    }
}"#;

fn close_camera() -> Camera {
    let mut camera = Camera::default();
    camera.set_position(Vec3::new(0.0, 20.0, 30.0));
    camera.look_at(Vec3::zeros(), Vec3::y());
    camera
}

fn decoded(settings: &SceneSettings) -> SceneSnapshot {
    let transformer = settings.transformer().unwrap();
    SnapshotMessage::from_json(FEED).unwrap().into_snapshot(&transformer).unwrap()
}

#[test]
fn feed_message_renders_with_lod_and_overlay() {
    let settings = SceneSettings::default();
    let mut scene = MineScene::new(&settings).unwrap();
    let (sender, inbox) = snapshot_channel();
    sender.publish(decoded(&settings));

    assert!(scene.ingest(&inbox));
    assert_eq!(scene.sequence(), 12);
    // Unknown type and unknown status are dropped
    let ids: Vec<_> = scene.equipment().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["EX-01", "HT-07"]);

    let frame = scene.render_frame(&close_camera().state(), 0.016);
    assert_eq!(frame.frame, 1);
    assert_eq!(frame.strategy, RenderStrategy::PerObject);
    assert_eq!(frame.culling.visible_objects.len(), 2);

    let tier = |id: &str| frame.drawables.iter().find(|d| d.id == id).map(|d| d.tier);
    // Excavator at the pit center, ~44 units away
    assert_eq!(tier("EX-01"), Some(LodTier::High));
    // Truck ~112 units away
    assert_eq!(tier("HT-07"), Some(LodTier::Medium));
    assert!(frame.drawables.iter().all(|d| d.label.is_some()));

    // Equipment parts plus one heatmap draw
    let equipment_calls: u32 = frame.drawables.iter().map(|d| d.draw_calls()).sum();
    assert_eq!(frame.render_info.draw_calls, equipment_calls + 1);
    assert!((frame.heatmap_opacity - 0.7).abs() < 1e-6);
}

#[test]
fn heatmap_picking_reports_cell_grade() {
    let settings = SceneSettings::default();
    let mut scene = MineScene::new(&settings).unwrap();
    scene.apply_snapshot(decoded(&settings));

    let clicked = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&clicked);
    scene.heatmap_mut().set_on_click(move |cell| sink.lock().unwrap().push(cell));

    // Straight down onto the south-west quadrant
    let ray = Ray::new(Vec3::new(-100.0, 50.0, -100.0), Vec3::new(0.0, -1.0, 0.0));
    let cell = scene.heatmap_mut().click(&ray).unwrap();
    assert_eq!((cell.row, cell.col), (0, 0));
    assert_eq!(GradeBand::for_grade(cell.grade), GradeBand::Waste);
    assert_eq!(hex_for(cell.grade), color_for(0.1).to_hex());

    let seen = clicked.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], cell);
}

#[test]
fn hidden_heatmap_fades_out_and_stops_drawing() {
    let settings = SceneSettings::default();
    let mut scene = MineScene::new(&settings).unwrap();
    scene.apply_snapshot(decoded(&settings));
    let camera = close_camera().state();

    scene.heatmap_mut().set_visible(false);
    let half = scene.render_frame(&camera, 0.25);
    assert!((half.heatmap_opacity - 0.35).abs() < 1e-4);

    let gone = scene.render_frame(&camera, 0.25);
    assert_eq!(gone.heatmap_opacity, 0.0);
    let equipment_calls: u32 = gone.drawables.iter().map(|d| d.draw_calls()).sum();
    assert_eq!(gone.render_info.draw_calls, equipment_calls);
}

#[test]
fn synthetic_load_switches_to_instancing() {
    let settings = SceneSettings::default();
    let mut scene = MineScene::new(&settings).unwrap();
    let scenario = SyntheticScenario { equipment_count: 120, ..SyntheticScenario::default() };
    let mut feed = scenario.feed(settings.coordinates.domain).unwrap();
    let camera = Camera::default().state();

    scene.apply_snapshot(feed.next_snapshot());
    let first = scene.render_frame(&camera, 0.016);
    assert_eq!(first.strategy, RenderStrategy::Instanced);
    assert!(first.drawables.is_empty());

    let drawn: usize = scene.instanced().batches().iter().map(|b| b.len()).sum();
    assert_eq!(drawn, first.culling.visible_objects.len());

    // Equipment-only updates keep the overlay
    for _ in 0..5 {
        scene.apply_snapshot(feed.next_snapshot());
        scene.render_frame(&camera, 0.016);
    }
    assert_eq!(scene.sequence(), 6);
    assert!(scene.heatmap().grade().is_some());
    assert_eq!(scene.equipment().len(), 120);
}

#[test]
fn simulated_runs_are_deterministic() {
    let info = RenderInfo { draw_calls: 40, triangles: 25_000, ..RenderInfo::default() };
    let config = TestConfig::low_end_integrated();

    let a = simulate_run(config.clone(), Duration::from_millis(20), info, &NullProbe).unwrap();
    let b = simulate_run(config, Duration::from_millis(20), info, &NullProbe).unwrap();
    assert_eq!(a.passed, b.passed);
    assert_eq!(a.issues, b.issues);
    assert_eq!(a.samples.len(), b.samples.len());
    assert!(a.passed, "{:?}", a.issues);

    let json = export_json(&[a, b]).unwrap();
    let report: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(report["passed"], 2);
    assert_eq!(report["results"][0]["config_name"], "low_end_integrated");
}

#[test]
fn settings_survive_a_file_round_trip() {
    let dir = std::env::temp_dir().join(format!("mine_scene_settings_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let settings = SceneSettings::low_end();
    for name in ["scene.toml", "scene.ron"] {
        let path = dir.join(name);
        settings.save_to_file(&path).unwrap();
        let loaded = SceneSettings::load_from_file(&path).unwrap();
        assert_eq!(loaded, settings, "{name}");
    }

    let bad = dir.join("scene.toml");
    std::fs::write(&bad, "[culling]\nupdate_interval = 0\n").unwrap();
    assert!(SceneSettings::load_from_file(&bad).is_err());
    assert!(ConfigFormat::from_path(&dir.join("scene.yaml")).is_err());

    std::fs::remove_dir_all(&dir).ok();
}
