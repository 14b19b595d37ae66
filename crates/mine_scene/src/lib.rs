//! # Mine Scene
//!
//! Scene-management core for an interactive 3D view of an open-pit mine.
//! Keeps a live equipment fleet and an ore-grade overlay drawable at a
//! usable frame rate on low-end integrated graphics.
//!
//! ## Features
//!
//! - **Coordinate Mapping**: domain (easting / northing / elevation) ↔ Y-up scene space
//! - **Grade Colors**: six fixed bands with legend table
//! - **Frustum Culling**: memoized bounding volumes, throttled recomputation
//! - **Level of Detail**: per-kind distance tiers, evaluated for visible objects only
//! - **Equipment Rendering**: per-object drawables or per-kind instance buffers
//! - **Heatmap**: grade grid overlay with fade and cell picking
//! - **Performance Harness**: named budgets, cooperative sampling, JSON export
//!
//! Rendering produces CPU-side draw descriptions; uploading them is the host's job.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mine_scene::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = SceneSettings::default();
//!     let mut scene = MineScene::new(&settings)?;
//!     let (sender, inbox) = snapshot_channel();
//!
//!     // Feed thread
//!     let snapshot = SyntheticScenario::default().generate(&settings.coordinates.domain)?;
//!     sender.publish(snapshot);
//!
//!     // Render loop
//!     let camera = Camera::default();
//!     scene.ingest(&inbox);
//!     let frame = scene.render_frame(&camera.state(), 1.0 / 60.0);
//!     println!("{} draw calls", frame.render_info.draw_calls);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::must_use_candidate
)]

pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod foundation;
pub mod perf;
pub mod render;
pub mod scene;

pub use error::{SceneError, SceneResult};

/// Common imports for scene users
pub mod prelude {
    pub use crate::{
        core::config::SceneSettings,
        config::Config,
        domain::{
            snapshot_channel, EquipmentKind, EquipmentPosition, EquipmentStatus, GradeData, GridBounds,
            SceneSnapshot, SnapshotMessage,
        },
        error::{SceneError, SceneResult},
        foundation::math::{Mat4, Vec3},
        perf::{PerformanceHarness, SyntheticScenario, TestConfig, TestResult},
        render::{color_for, hex_for, Camera, CameraState, RenderInfo, RenderStrategy},
        scene::{CoordinateTransformer, FrameOutput, LodTier, MineScene, SpacePosition},
    };
}
