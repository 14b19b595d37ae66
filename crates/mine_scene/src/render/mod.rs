//! # Rendering
//!
//! CPU-side rendering layer for the pit view. Nothing here talks to a GPU;
//! every path produces draw descriptions a host renderer uploads as-is.
//!
//! ## Architecture
//!
//! - **Camera**: perspective camera, per-frame [`CameraState`] and focus cycling
//! - **Color**: grade bands and status tints
//! - **Equipment**: per-object drawables with LOD
//! - **Instancing**: one instance buffer per equipment kind
//! - **Heatmap**: grade overlay mesh with fade and picking
//! - **Stats**: draw call and triangle counters

pub mod camera;
pub mod color;
pub mod equipment;
pub mod heatmap;
pub mod instancing;
pub mod stats;

pub use camera::{Camera, CameraFocus, CameraState};
pub use color::{color_for, hex_for, status_color, GradeBand, GradeRange, Rgb, GRADE_RANGES};
pub use equipment::{EquipmentDrawable, EquipmentParts, EquipmentRenderer, EquipmentStyle, EquipmentStyles};
pub use heatmap::{HeatmapCell, HeatmapConfig, HeatmapMesh, HeatmapRenderer, OpacityFade};
pub use instancing::{InstanceData, InstancedBatch, InstancedRenderer, InstancingConfig, RenderStrategy};
pub use stats::RenderInfo;
