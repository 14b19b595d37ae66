//! Bounding volumes and view-frustum math
//!
//! Axis-aligned boxes, spheres, planes, rays and the six-plane frustum used by
//! the culling pass.

use crate::foundation::math::{Mat4, Vec3, Vec4};

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given half-extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Move the box so it is centered on `center`, keeping its size
    pub fn recenter(&mut self, center: Vec3) {
        let extents = self.extents();
        self.min = center - extents;
        self.max = center + extents;
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }
}

/// Bounding sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// Center in scene space
    pub center: Vec3,
    /// Radius
    pub radius: f32,
}

impl BoundingSphere {
    /// Create a sphere
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Either kind of volume the culler can test
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundingVolume {
    /// Sphere test
    Sphere(BoundingSphere),
    /// Box test
    Box(AABB),
}

impl BoundingVolume {
    /// Move the volume so it is centered on `center`
    pub fn recenter(&mut self, center: Vec3) {
        match self {
            Self::Sphere(sphere) => sphere.center = center,
            Self::Box(aabb) => aabb.recenter(center),
        }
    }

    /// Test the volume against a frustum
    pub fn intersects(&self, frustum: &Frustum) -> bool {
        match self {
            Self::Sphere(sphere) => frustum.intersects_sphere(sphere),
            Self::Box(aabb) => frustum.intersects_aabb(aabb),
        }
    }
}

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (normalized)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Build a normalized plane from `(a, b, c, d)` coefficients
    fn from_coefficients(coefficients: Vec4) -> Self {
        let normal = Vec3::new(coefficients.x, coefficients.y, coefficients.z);
        let length = normal.magnitude();
        if length <= f32::EPSILON {
            // Degenerate row (e.g. an infinite far plane): accept everything
            return Self { normal: Vec3::zeros(), distance: 0.0 };
        }
        Self {
            normal: normal / length,
            distance: coefficients.w / length,
        }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }
}

/// Frustum for visibility culling
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// Six planes (left, right, bottom, top, near, far), normals pointing inward
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix
    ///
    /// Gribb-Hartmann extraction for a column-vector matrix with a `[-1, 1]`
    /// clip depth range; each plane is a sum or difference of the fourth row
    /// with one of the first three.
    pub fn from_matrix(view_projection: &Mat4) -> Self {
        let row = |i: usize| {
            Vec4::new(
                view_projection[(i, 0)],
                view_projection[(i, 1)],
                view_projection[(i, 2)],
                view_projection[(i, 3)],
            )
        };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 - r1),
                Plane::from_coefficients(r3 + r2),
                Plane::from_coefficients(r3 - r2),
            ],
        }
    }

    /// Build the frustum for a camera's projection and world-inverse (view) matrices
    pub fn from_camera(projection: &Mat4, world_inverse: &Mat4) -> Self {
        Self::from_matrix(&(projection * world_inverse))
    }

    /// Check if a sphere is inside or intersects the frustum
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(sphere.center) >= -sphere.radius)
    }

    /// Check if an AABB is inside or intersects the frustum
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        for plane in &self.planes {
            // Corner furthest along the plane normal
            let mut p = aabb.min;
            if plane.normal.x >= 0.0 { p.x = aabb.max.x; }
            if plane.normal.y >= 0.0 { p.y = aabb.max.y; }
            if plane.normal.z >= 0.0 { p.z = aabb.max.z; }

            // If this point is outside the plane, the entire AABB is outside
            if plane.distance_to_point(p) < 0.0 {
                return false;
            }
        }

        true
    }

    /// Check if a point is inside the frustum
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.distance_to_point(point) >= 0.0)
    }
}

/// A ray for picking
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in scene space
    pub origin: Vec3,
    /// The direction of the ray (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Intersection with the horizontal plane `y = height`, if in front of the origin
    pub fn intersect_horizontal_plane(&self, height: f32) -> Option<Vec3> {
        if self.direction.y.abs() <= f32::EPSILON {
            return None;
        }
        let t = (height - self.origin.y) / self.direction.y;
        (t >= 0.0).then(|| self.point_at(t))
    }
}
