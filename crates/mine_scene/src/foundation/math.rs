//! Math utilities and types
//!
//! Provides the fundamental math types used by the scene core. Everything is
//! expressed in `f32` on top of nalgebra, matching what a GPU consumes.

pub use nalgebra::{
    Vector3, Vector4,
    Matrix4,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Transform {
    /// Create a transform from position, Euler angles (radians, XYZ order) and uniform scale
    pub fn from_euler(position: Vec3, euler: Vec3, scale: f32) -> Self {
        Self {
            position,
            rotation: utils::euler_xyz(euler),
            scale: Vec3::new(scale, scale, scale),
        }
    }

    /// Convert to a transformation matrix (translation * rotation * scale)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Point3) -> Point3 {
        self.to_matrix().transform_point(&point)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Quat, Vec3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Normalized position of `value` inside `[min, max]`; not clamped
    pub fn inverse_lerp(min: f32, max: f32, value: f32) -> f32 {
        (value - min) / (max - min)
    }

    /// Rotation for Euler angles applied in X, then Y, then Z order
    ///
    /// The resulting matrix is `Rx * Ry * Rz`, the convention web scene
    /// graphs use for an `XYZ` Euler order.
    pub fn euler_xyz(euler: Vec3) -> Quat {
        Quat::from_axis_angle(&Vec3::x_axis(), euler.x)
            * Quat::from_axis_angle(&Vec3::y_axis(), euler.y)
            * Quat::from_axis_angle(&Vec3::z_axis(), euler.z)
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a right-handed perspective projection with a `[-1, 1]` clip depth range
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create a right-handed look-at view matrix (the camera's world inverse)
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        // OpenGL-style depth range, same as the web renderers feeding camera state
        Mat4::new_perspective(aspect, fov_y, near, far)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }
}
