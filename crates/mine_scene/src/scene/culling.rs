//! Frustum culling pass
//!
//! Partitions a set of [`CullableObject`]s into visible and culled ids
//! against the camera view volume.
//!
//! Bounding volumes are memoized in an [`IdArena`] keyed by object id and only
//! rebuilt when an object appears, disappears or changes its bounds. Each pass
//! recenters the stored volume on the object's current position in place, so
//! the hot loop does not allocate volumes. Recomputation is throttled to every
//! Nth call of [`FrustumCuller::update`]; in between, the previous result
//! remains authoritative.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::foundation::collections::IdArena;
use crate::foundation::math::Vec3;
use crate::render::camera::CameraState;
use crate::scene::bounds::{AABB, BoundingSphere, BoundingVolume, Frustum};

/// Which bounding test to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundingMode {
    /// Bounding sphere test (cheaper, looser)
    #[default]
    Sphere,
    /// Axis-aligned box test
    Box,
}

/// Culling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CullingConfig {
    /// Run the culling pass at all; when off every object is visible
    pub enabled: bool,
    /// Extra size added to every bounding volume to avoid pop-in at the edges
    pub margin: f32,
    /// Sphere or box volumes
    pub mode: BoundingMode,
    /// Recompute on every Nth frame (1 = every frame)
    pub update_interval: u32,
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            margin: 5.0,
            mode: BoundingMode::Sphere,
            update_interval: 3,
        }
    }
}

/// Bounds supplied with a cullable object
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectBounds {
    /// Bounding radius around the position
    Radius(f32),
    /// Explicit box half-extents around the position
    Box {
        /// Half-size on each axis
        half_extents: Vec3,
    },
}

/// Lightweight culling view of a renderable entity
#[derive(Debug, Clone, PartialEq)]
pub struct CullableObject {
    /// Stable id used to correlate frames
    pub id: String,
    /// Current scene-space position
    pub position: Vec3,
    /// Bounds; `None` means "no volume", which is always treated as visible
    pub bounds: Option<ObjectBounds>,
}

impl CullableObject {
    /// Object with a bounding radius
    pub fn with_radius(id: impl Into<String>, position: Vec3, radius: f32) -> Self {
        Self { id: id.into(), position, bounds: Some(ObjectBounds::Radius(radius)) }
    }
}

/// Outcome of one culling pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CullingResult {
    /// Ids that intersect the frustum
    pub visible_objects: Vec<String>,
    /// Ids outside the frustum
    pub culled_objects: Vec<String>,
    /// Number of objects considered
    pub total_objects: usize,
    /// `visible / total`, or 1 for an empty set
    pub visibility_ratio: f32,
    #[serde(skip)]
    culled_index: HashSet<String>,
}

impl Default for CullingResult {
    fn default() -> Self {
        Self::from_partition(Vec::new(), Vec::new())
    }
}

impl CullingResult {
    /// Build a result from the two id lists
    pub fn from_partition(visible_objects: Vec<String>, culled_objects: Vec<String>) -> Self {
        let total_objects = visible_objects.len() + culled_objects.len();
        let visibility_ratio = if total_objects == 0 {
            1.0
        } else {
            visible_objects.len() as f32 / total_objects as f32
        };
        let culled_index = culled_objects.iter().cloned().collect();
        Self { visible_objects, culled_objects, total_objects, visibility_ratio, culled_index }
    }

    /// Whether `id` was culled in this result (unknown ids are not culled)
    pub fn is_culled(&self, id: &str) -> bool {
        self.culled_index.contains(id)
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedVolume {
    source: ObjectBounds,
    mode: BoundingMode,
    volume: BoundingVolume,
}

/// Frustum culler with memoized volumes and throttled recomputation
#[derive(Debug)]
pub struct FrustumCuller {
    config: CullingConfig,
    volumes: IdArena<CachedVolume>,
    frame_counter: u64,
    last_result: Option<Arc<CullingResult>>,
}

impl FrustumCuller {
    /// Create a culler
    pub fn new(config: CullingConfig) -> Self {
        Self {
            config,
            volumes: IdArena::new(),
            frame_counter: 0,
            last_result: None,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &CullingConfig {
        &self.config
    }

    /// Most recent result, if any pass has run
    pub fn last_result(&self) -> Option<&CullingResult> {
        self.last_result.as_deref()
    }

    /// Whether `id` is visible according to the last pass
    ///
    /// Ids the culler has never classified are reported visible.
    pub fn is_visible(&self, id: &str) -> bool {
        self.last_result.as_ref().map_or(true, |result| !result.is_culled(id))
    }

    /// Per-frame entry point; recomputes only every `update_interval` frames
    ///
    /// The first call always computes. Between recomputations the previous
    /// result is shared, not copied.
    pub fn update(&mut self, camera: &CameraState, objects: &[CullableObject]) -> Arc<CullingResult> {
        let interval = u64::from(self.config.update_interval.max(1));
        let due = self.last_result.is_none() || self.frame_counter % interval == 0;
        self.frame_counter += 1;

        if due {
            let result = self.cull(camera, objects);
            self.last_result = Some(Arc::new(result));
        }
        Arc::clone(self.last_result.get_or_insert_with(Arc::default))
    }

    /// Classify `objects` immediately, ignoring throttling
    pub fn cull(&mut self, camera: &CameraState, objects: &[CullableObject]) -> CullingResult {
        if !self.config.enabled {
            let ids = objects.iter().map(|o| o.id.clone()).collect();
            return CullingResult::from_partition(ids, Vec::new());
        }

        self.sync_volumes(objects);
        let frustum = Frustum::from_camera(&camera.projection, &camera.world_inverse);

        let mut visible = Vec::with_capacity(objects.len());
        let mut culled = Vec::new();
        for object in objects {
            let is_visible = match self.volumes.get_mut(&object.id) {
                Some(cached) => {
                    cached.volume.recenter(object.position);
                    cached.volume.intersects(&frustum)
                }
                // No volume: never hide something by mistake
                None => true,
            };
            if is_visible {
                visible.push(object.id.clone());
            } else {
                culled.push(object.id.clone());
            }
        }

        let result = CullingResult::from_partition(visible, culled);
        log::debug!(
            "Culling pass: {}/{} visible ({:.0}%)",
            result.visible_objects.len(),
            result.total_objects,
            result.visibility_ratio * 100.0
        );
        result
    }

    /// Number of memoized volumes
    pub fn cached_volume_count(&self) -> usize {
        self.volumes.len()
    }

    fn sync_volumes(&mut self, objects: &[CullableObject]) {
        let mode = self.config.mode;
        let margin = self.config.margin;

        for object in objects {
            let Some(bounds) = object.bounds else {
                continue;
            };
            let stale = self
                .volumes
                .get(&object.id)
                .map_or(true, |cached| cached.source != bounds || cached.mode != mode);
            if stale {
                let volume = build_volume(bounds, mode, margin, object.position);
                self.volumes.insert(&object.id, CachedVolume { source: bounds, mode, volume });
            }
        }

        if self.volumes.len() > objects.len() || objects.iter().any(|o| o.bounds.is_none()) {
            let live: std::collections::HashSet<&str> = objects
                .iter()
                .filter(|o| o.bounds.is_some())
                .map(|o| o.id.as_str())
                .collect();
            self.volumes.retain_ids(|id| live.contains(id));
        }
    }
}

impl Default for FrustumCuller {
    fn default() -> Self {
        Self::new(CullingConfig::default())
    }
}

fn build_volume(bounds: ObjectBounds, mode: BoundingMode, margin: f32, center: Vec3) -> BoundingVolume {
    match (mode, bounds) {
        (BoundingMode::Sphere, ObjectBounds::Radius(radius)) => {
            BoundingVolume::Sphere(BoundingSphere::new(center, radius + margin))
        }
        (BoundingMode::Sphere, ObjectBounds::Box { half_extents }) => {
            BoundingVolume::Sphere(BoundingSphere::new(center, half_extents.magnitude() + margin))
        }
        (BoundingMode::Box, ObjectBounds::Radius(radius)) => {
            let half = radius + margin;
            BoundingVolume::Box(AABB::from_center_extents(center, Vec3::new(half, half, half)))
        }
        (BoundingMode::Box, ObjectBounds::Box { half_extents }) => {
            let grown = half_extents.add_scalar(margin);
            BoundingVolume::Box(AABB::from_center_extents(center, grown))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::camera::Camera;

    fn camera_looking_down_negative_z() -> CameraState {
        let mut camera = Camera::perspective(Vec3::zeros(), 90.0, 1.0, 0.1, 500.0);
        camera.look_at(Vec3::new(0.0, 0.0, -1.0), Vec3::y());
        camera.state()
    }

    fn scene_objects() -> Vec<CullableObject> {
        vec![
            CullableObject::with_radius("ahead", Vec3::new(0.0, 0.0, -50.0), 2.0),
            CullableObject::with_radius("behind", Vec3::new(0.0, 0.0, 50.0), 2.0),
            CullableObject::with_radius("far-left", Vec3::new(-200.0, 0.0, -20.0), 2.0),
        ]
    }

    #[test]
    fn test_partition_visible_and_culled() {
        let mut culler = FrustumCuller::default();
        let result = culler.cull(&camera_looking_down_negative_z(), &scene_objects());

        assert_eq!(result.visible_objects, vec!["ahead".to_string()]);
        assert_eq!(result.culled_objects.len(), 2);
        assert_eq!(result.total_objects, 3);
        assert!((result.visibility_ratio - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_input_ratio_is_one() {
        let mut culler = FrustumCuller::default();
        let result = culler.cull(&camera_looking_down_negative_z(), &[]);
        assert_eq!(result.total_objects, 0);
        assert_eq!(result.visibility_ratio, 1.0);
    }

    #[test]
    fn test_missing_bounds_fail_open() {
        let mut culler = FrustumCuller::default();
        let objects = vec![CullableObject {
            id: "unbounded".into(),
            position: Vec3::new(0.0, 0.0, 400.0),
            bounds: None,
        }];
        let result = culler.cull(&camera_looking_down_negative_z(), &objects);
        assert_eq!(result.visible_objects, vec!["unbounded".to_string()]);
        assert!(culler.is_visible("never-seen"));
    }

    #[test]
    fn test_margin_prevents_edge_pop_in() {
        let camera = camera_looking_down_negative_z();
        // Center 1 unit past the right plane, radius 0.5
        let objects = vec![CullableObject::with_radius("edge", Vec3::new(11.0, 0.0, -10.0), 0.5)];

        let mut tight = FrustumCuller::new(CullingConfig { margin: 0.0, ..CullingConfig::default() });
        assert!(tight.cull(&camera, &objects).visible_objects.is_empty());

        let mut padded = FrustumCuller::new(CullingConfig { margin: 2.0, ..CullingConfig::default() });
        assert_eq!(padded.cull(&camera, &objects).visible_objects.len(), 1);
    }

    #[test]
    fn test_box_mode_matches_sphere_for_clear_cases() {
        let camera = camera_looking_down_negative_z();
        let mut culler = FrustumCuller::new(CullingConfig { mode: BoundingMode::Box, ..CullingConfig::default() });
        let result = culler.cull(&camera, &scene_objects());
        assert_eq!(result.visible_objects, vec!["ahead".to_string()]);
    }

    #[test]
    fn test_volumes_follow_moving_objects() {
        let camera = camera_looking_down_negative_z();
        let mut culler = FrustumCuller::default();
        let mut objects = vec![CullableObject::with_radius("truck", Vec3::new(0.0, 0.0, -50.0), 2.0)];
        assert_eq!(culler.cull(&camera, &objects).visible_objects.len(), 1);

        objects[0].position = Vec3::new(0.0, 0.0, 80.0);
        let result = culler.cull(&camera, &objects);
        assert_eq!(result.culled_objects, vec!["truck".to_string()]);
        assert_eq!(culler.cached_volume_count(), 1);
    }

    #[test]
    fn test_removed_objects_leave_arena() {
        let camera = camera_looking_down_negative_z();
        let mut culler = FrustumCuller::default();
        culler.cull(&camera, &scene_objects());
        assert_eq!(culler.cached_volume_count(), 3);

        culler.cull(&camera, &scene_objects()[..1]);
        assert_eq!(culler.cached_volume_count(), 1);
    }

    #[test]
    fn test_update_is_throttled() {
        let camera = camera_looking_down_negative_z();
        let mut culler = FrustumCuller::default(); // every 3rd frame
        let mut objects = vec![CullableObject::with_radius("truck", Vec3::new(0.0, 0.0, -50.0), 2.0)];

        assert_eq!(culler.update(&camera, &objects).visible_objects.len(), 1); // frame 0 computes

        objects[0].position = Vec3::new(0.0, 0.0, 80.0);
        assert_eq!(culler.update(&camera, &objects).visible_objects.len(), 1); // frame 1 stale
        assert_eq!(culler.update(&camera, &objects).visible_objects.len(), 1); // frame 2 stale
        assert_eq!(culler.update(&camera, &objects).culled_objects.len(), 1); // frame 3 recomputes
    }

    #[test]
    fn test_stale_frames_share_one_result() {
        let camera = camera_looking_down_negative_z();
        let mut culler = FrustumCuller::default();
        let first = culler.update(&camera, &scene_objects());
        let stale = culler.update(&camera, &scene_objects());
        assert!(Arc::ptr_eq(&first, &stale));

        culler.update(&camera, &scene_objects());
        let fresh = culler.update(&camera, &scene_objects());
        assert!(!Arc::ptr_eq(&first, &fresh));
        assert_eq!(*first, *fresh);
    }

    #[test]
    fn test_culled_lookup_over_large_partition() {
        let (culled, visible): (Vec<String>, Vec<String>) =
            (0..500).map(|i| format!("EQ-{i}")).partition(|id| id.ends_with(|c: char| c.to_digit(10).is_some_and(|d| d % 2 == 1)));
        let result = CullingResult::from_partition(visible.clone(), culled.clone());

        assert_eq!(result.total_objects, 500);
        assert!(culled.iter().all(|id| result.is_culled(id)));
        assert!(visible.iter().all(|id| !result.is_culled(id)));
        assert!(!result.is_culled("EQ-500"));
    }

    #[test]
    fn test_disabled_culling_shows_everything() {
        let mut culler = FrustumCuller::new(CullingConfig { enabled: false, ..CullingConfig::default() });
        let result = culler.cull(&camera_looking_down_negative_z(), &scene_objects());
        assert_eq!(result.visible_objects.len(), 3);
        assert_eq!(result.visibility_ratio, 1.0);
    }
}
