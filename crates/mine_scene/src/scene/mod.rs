//! Scene management
//!
//! Spatial side of the pit view: coordinate mapping, bounding volumes,
//! frustum culling and LOD selection, tied together per frame by
//! [`MineScene`].
//!
//! ## Frame order
//!
//! ```text
//! snapshot swap → cull (throttled) → LOD for survivors → drawables / instances → heatmap fade
//! ```

pub mod bounds;
pub mod coordinates;
pub mod culling;
pub mod lod;
mod scene_manager;

pub use bounds::{BoundingSphere, BoundingVolume, Frustum, Plane, Ray, AABB};
pub use coordinates::{AxisRange, Bounds3, CoordinateTransformer, SpacePosition};
pub use culling::{BoundingMode, CullableObject, CullingConfig, CullingResult, FrustumCuller, ObjectBounds};
pub use lod::{LodConfig, LodDecision, LodSelector, LodThresholds, LodTier};
pub use scene_manager::{FrameOutput, MineScene};
