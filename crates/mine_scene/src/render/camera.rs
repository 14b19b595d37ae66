//! # Camera
//!
//! Perspective camera producing the read-only [`CameraState`] the culling and
//! LOD passes consume each frame, plus [`CameraFocus`] for cycling the camera
//! target through equipment.
//!
//! ## Coordinate System
//! Right-handed, Y-up scene space:
//! - X+ = Right
//! - Y+ = Up
//! - Z+ = Towards the viewer
//!
//! Projection uses a `[-1, 1]` clip depth range, matching the web renderers
//! that supply camera state to the scene core.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Point3, Vec3, Vec4};
use crate::scene::bounds::Ray;

/// Snapshot of the camera matrices for one frame
///
/// Hosts that own their own camera (e.g. a browser scene graph) build this
/// directly from their projection and world-inverse matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    /// Projection matrix
    pub projection: Mat4,
    /// World-inverse (view) matrix
    pub world_inverse: Mat4,
    /// Camera position in scene space, used for LOD distances
    pub position: Vec3,
}

impl CameraState {
    /// Build a camera state from raw matrices
    ///
    /// The position is recovered from the world-inverse matrix; a singular
    /// matrix yields the origin.
    pub fn from_matrices(projection: Mat4, world_inverse: Mat4) -> Self {
        let position = world_inverse
            .try_inverse()
            .map_or_else(Vec3::zeros, |world| world.transform_point(&Point3::origin()).coords);
        Self { projection, world_inverse, position }
    }

    /// Combined view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.world_inverse
    }
}

/// 3D perspective camera
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in scene space
    pub position: Vec3,

    /// Point the camera is looking at in scene space
    pub target: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,

    /// Vertical field of view in radians
    pub fov: f32,

    /// Aspect ratio (width / height)
    pub aspect: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,
}

impl Camera {
    /// Create a new perspective camera looking at the origin
    ///
    /// # Arguments
    /// * `position` - Camera position in scene space
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        }
    }

    /// Update camera position in scene space
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        log::trace!("Camera position updated to: {:?}", position);
    }

    /// Point the camera at `target` with a custom up vector
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.target = target;
        self.up = up;
        log::trace!("Camera look_at updated - target: {:?}, up: {:?}", target, up);
    }

    /// View (world-inverse) matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }

    /// Perspective projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective(self.fov, self.aspect, self.near, self.far)
    }

    /// Matrices for the current frame
    pub fn state(&self) -> CameraState {
        CameraState {
            projection: self.projection_matrix(),
            world_inverse: self.view_matrix(),
            position: self.position,
        }
    }

    /// Convert normalized device coordinates to a scene-space picking ray
    ///
    /// `ndc_x` runs left to right and `ndc_y` bottom to top, both in `[-1, 1]`.
    /// Returns `None` if the view-projection matrix is singular.
    pub fn screen_to_world_ray(&self, ndc_x: f32, ndc_y: f32) -> Option<Ray> {
        let inv_view_proj = self.state().view_projection().try_inverse()?;

        let unproject = |z: f32| {
            let h = inv_view_proj * Vec4::new(ndc_x, ndc_y, z, 1.0);
            Vec3::new(h.x / h.w, h.y / h.w, h.z / h.w)
        };
        let near = unproject(-1.0);
        let far = unproject(1.0);

        Some(Ray::new(self.position, far - near))
    }
}

impl Default for Camera {
    /// Overview of the whole pit from above one corner
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 150.0, 250.0),
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: utils::deg_to_rad(60.0),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

/// Which equipment the camera is currently focused on
///
/// Owned by the camera controller; cycling wraps around the current
/// equipment list. `None` means the free overview camera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraFocus {
    index: Option<usize>,
}

impl CameraFocus {
    /// Start unfocused
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently focused index, if any
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Advance to the next item out of `count`; returns the new index
    pub fn next(&mut self, count: usize) -> Option<usize> {
        self.index = match (self.index, count) {
            (_, 0) => None,
            (None, _) => Some(0),
            (Some(i), n) => Some((i + 1) % n),
        };
        self.index
    }

    /// Step back to the previous item out of `count`; returns the new index
    pub fn previous(&mut self, count: usize) -> Option<usize> {
        self.index = match (self.index, count) {
            (_, 0) => None,
            (None, n) => Some(n - 1),
            (Some(i), n) => Some((i + n - 1) % n),
        };
        self.index
    }

    /// Return to the overview camera
    pub fn clear(&mut self) {
        self.index = None;
    }

    /// Clamp the focus after the equipment list changed size
    pub fn revalidate(&mut self, count: usize) {
        if self.index.is_some_and(|i| i >= count) {
            self.index = None;
        }
    }

    /// Aim `camera` at the focused position, keeping the current viewing offset
    pub fn apply(&self, camera: &mut Camera, focused_position: Vec3) {
        let offset = camera.position - camera.target;
        camera.look_at(focused_position, camera.up);
        camera.set_position(focused_position + offset);
    }
}
