//! Domain ↔ scene coordinate conversion
//!
//! The equipment feed reports positions as easting / northing / elevation
//! ("domain" space). The renderer works in a Y-up scene space. Conversion is a
//! per-axis affine remap between two axis-aligned boxes, with the axes
//! permuted so that elevation becomes the vertical axis:
//!
//! ```text
//! domain X (easting)   → scene X (right)
//! domain Z (elevation) → scene Y (up)
//! domain Y (northing)  → scene Z (forward/back)
//! ```
//!
//! No clamping is applied; points outside the domain box extrapolate linearly.

use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};
use crate::foundation::math::{utils, Vec3};

/// Closed interval on one axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    /// Lower bound
    pub min: f32,
    /// Upper bound
    pub max: f32,
}

impl AxisRange {
    /// Create a range
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Width of the range
    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    /// Midpoint of the range
    pub fn center(&self) -> f32 {
        (self.min + self.max) * 0.5
    }

    /// Inclusive containment
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Map `value` from this range onto `target`
    pub fn remap_to(&self, value: f32, target: &Self) -> f32 {
        let t = utils::inverse_lerp(self.min, self.max, value);
        utils::lerp(target.min, target.max, t)
    }

    fn check(&self, space: &'static str, axis: &'static str) -> SceneResult<()> {
        if self.min.is_finite() && self.max.is_finite() && self.min < self.max {
            Ok(())
        } else {
            Err(SceneError::InvalidBounds { space, axis, min: self.min, max: self.max })
        }
    }
}

/// Axis-aligned box given as one range per axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds3 {
    /// X range
    pub x: AxisRange,
    /// Y range
    pub y: AxisRange,
    /// Z range
    pub z: AxisRange,
}

impl Bounds3 {
    /// Create bounds from three ranges
    pub const fn new(x: AxisRange, y: AxisRange, z: AxisRange) -> Self {
        Self { x, y, z }
    }

    /// Default extent of the mine pit in domain coordinates
    pub const fn mining_default() -> Self {
        Self::new(
            AxisRange::new(800.0, 1400.0),
            AxisRange::new(1600.0, 2200.0),
            AxisRange::new(-50.0, 0.0),
        )
    }

    /// Default extent of the rendered pit in scene coordinates
    pub const fn scene_default() -> Self {
        Self::new(
            AxisRange::new(-200.0, 200.0),
            AxisRange::new(-25.0, 0.0),
            AxisRange::new(-200.0, 200.0),
        )
    }

    /// Center point of the box
    pub fn center(&self) -> Vec3 {
        Vec3::new(self.x.center(), self.y.center(), self.z.center())
    }

    /// Inclusive containment on all three axes
    pub fn contains(&self, point: &Vec3) -> bool {
        self.x.contains(point.x) && self.y.contains(point.y) && self.z.contains(point.z)
    }

    /// Reject boxes with `min >= max` on any axis
    pub fn validate(&self, space: &'static str) -> SceneResult<()> {
        self.x.check(space, "x")?;
        self.y.check(space, "y")?;
        self.z.check(space, "z")
    }
}

/// A position explicitly tagged with the space it is expressed in
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpacePosition {
    /// Easting / northing / elevation from the equipment feed
    Domain(Vec3),
    /// Already in renderer coordinates
    Scene(Vec3),
}

impl SpacePosition {
    /// Tag an untagged raw position using the domain-box heuristic
    ///
    /// Points inside the domain box are assumed to be domain coordinates,
    /// everything else is assumed to already be in scene space. Only used for
    /// feed records that arrive without an explicit space tag.
    pub fn infer(raw: Vec3, transformer: &CoordinateTransformer) -> Self {
        if transformer.is_valid_domain_coordinates(&raw) {
            Self::Domain(raw)
        } else {
            log::trace!("Position {:?} outside domain bounds, treating as scene space", raw);
            Self::Scene(raw)
        }
    }

    /// The raw, space-dependent coordinates
    pub fn raw(&self) -> Vec3 {
        match *self {
            Self::Domain(p) | Self::Scene(p) => p,
        }
    }
}

/// Affine mapping between the domain box and the scene box
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateTransformer {
    domain: Bounds3,
    scene: Bounds3,
}

impl Default for CoordinateTransformer {
    fn default() -> Self {
        Self {
            domain: Bounds3::mining_default(),
            scene: Bounds3::scene_default(),
        }
    }
}

impl CoordinateTransformer {
    /// Create a transformer, rejecting degenerate boxes
    pub fn new(domain: Bounds3, scene: Bounds3) -> SceneResult<Self> {
        domain.validate("domain")?;
        scene.validate("scene")?;
        Ok(Self { domain, scene })
    }

    /// Domain bounding box
    pub fn domain_bounds(&self) -> &Bounds3 {
        &self.domain
    }

    /// Scene bounding box
    pub fn scene_bounds(&self) -> &Bounds3 {
        &self.scene
    }

    /// Map a domain point into scene space
    pub fn to_scene(&self, domain: &Vec3) -> Vec3 {
        Vec3::new(
            self.domain.x.remap_to(domain.x, &self.scene.x),
            self.domain.z.remap_to(domain.z, &self.scene.y),
            self.domain.y.remap_to(domain.y, &self.scene.z),
        )
    }

    /// Map a scene point back into domain space (exact inverse of [`Self::to_scene`])
    pub fn to_domain(&self, scene: &Vec3) -> Vec3 {
        Vec3::new(
            self.scene.x.remap_to(scene.x, &self.domain.x),
            self.scene.z.remap_to(scene.z, &self.domain.y),
            self.scene.y.remap_to(scene.y, &self.domain.z),
        )
    }

    /// Whether every axis of `point` lies inside the domain box (inclusive)
    pub fn is_valid_domain_coordinates(&self, point: &Vec3) -> bool {
        self.domain.contains(point)
    }

    /// Scene-space coordinates for a tagged position
    pub fn resolve(&self, position: &SpacePosition) -> Vec3 {
        match position {
            SpacePosition::Domain(p) => self.to_scene(p),
            SpacePosition::Scene(p) => *p,
        }
    }
}
