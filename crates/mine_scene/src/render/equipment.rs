//! Per-object equipment rendering
//!
//! Turns one [`EquipmentPosition`] plus its LOD tier into an
//! [`EquipmentDrawable`]: a world transform and a list of primitive parts the
//! host renderer draws. This path keeps per-object LOD, labels and hover
//! highlighting; the instanced path in [`crate::render::instancing`] trades
//! those away for one draw call per equipment kind.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::domain::equipment::{EquipmentKind, EquipmentPosition};
use crate::foundation::math::{Mat4, Transform, Vec3};
use crate::render::color::{status_color, Rgb};
use crate::scene::coordinates::CoordinateTransformer;
use crate::scene::culling::{CullableObject, ObjectBounds};
use crate::scene::lod::LodTier;

bitflags! {
    /// Parts an equipment model can be decomposed into
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EquipmentParts: u16 {
        /// Main chassis / frame
        const BODY = 1 << 0;
        /// Operator cab
        const CAB = 1 << 1;
        /// Boom and bucket
        const ARM = 1 << 2;
        /// Crawler tracks
        const TRACKS = 1 << 3;
        /// Wheels
        const WHEELS = 1 << 4;
        /// Dump bed
        const BED = 1 << 5;
        /// Conveyor belt
        const BELT = 1 << 6;
        /// Conveyor support legs
        const SUPPORTS = 1 << 7;
        /// Single bounding box stand-in
        const BOUNDS = 1 << 8;
    }
}

impl EquipmentParts {
    /// Parts drawn for a kind at a tier
    pub fn for_tier(kind: EquipmentKind, tier: LodTier) -> Self {
        match (kind, tier) {
            (EquipmentKind::Excavator, LodTier::High) => Self::BODY | Self::CAB | Self::ARM | Self::TRACKS,
            (EquipmentKind::Excavator, LodTier::Medium) => Self::BODY | Self::ARM,
            (EquipmentKind::Truck, LodTier::High) => Self::BODY | Self::CAB | Self::BED | Self::WHEELS,
            (EquipmentKind::Truck, LodTier::Medium) => Self::BODY | Self::BED,
            (EquipmentKind::Conveyor, LodTier::High) => Self::BODY | Self::BELT | Self::SUPPORTS,
            (EquipmentKind::Conveyor, LodTier::Medium) => Self::BODY | Self::BELT,
            (_, LodTier::Low) => Self::BOUNDS,
        }
    }
}

/// Primitive shape of one part
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Box with full size on each axis
    Box {
        /// Width, height, depth
        size: [f32; 3],
    },
    /// Upright cylinder
    Cylinder {
        /// Radius
        radius: f32,
        /// Height
        height: f32,
        /// Radial segments
        segments: u32,
    },
}

impl Shape {
    /// Triangle count of the tessellated shape
    pub fn triangle_count(&self) -> u32 {
        match self {
            Self::Box { .. } => 12,
            // Side quads plus two fan caps
            Self::Cylinder { segments, .. } => segments * 4,
        }
    }
}

/// Part of a model in model space
#[derive(Debug, Clone, Copy)]
struct PartTemplate {
    part: EquipmentParts,
    shape: Shape,
    offset: [f32; 3],
    /// Dark running-gear parts ignore the status tint
    running_gear: bool,
}

const fn part(part: EquipmentParts, shape: Shape, offset: [f32; 3], running_gear: bool) -> PartTemplate {
    PartTemplate { part, shape, offset, running_gear }
}

const WHEEL: Shape = Shape::Cylinder { radius: 0.9, height: 0.6, segments: 12 };
const LEG: Shape = Shape::Cylinder { radius: 0.2, height: 2.0, segments: 6 };

const EXCAVATOR_PARTS: &[PartTemplate] = &[
    part(EquipmentParts::BODY, Shape::Box { size: [6.0, 2.5, 4.0] }, [0.0, 1.25, 0.0], false),
    part(EquipmentParts::CAB, Shape::Box { size: [2.0, 2.0, 2.0] }, [1.5, 3.5, 1.0], false),
    part(EquipmentParts::ARM, Shape::Box { size: [1.0, 1.0, 7.0] }, [-1.0, 3.0, 4.5], false),
    part(EquipmentParts::TRACKS, Shape::Box { size: [7.0, 1.0, 1.2] }, [0.0, -0.5, 1.8], true),
    part(EquipmentParts::TRACKS, Shape::Box { size: [7.0, 1.0, 1.2] }, [0.0, -0.5, -1.8], true),
];

const TRUCK_PARTS: &[PartTemplate] = &[
    part(EquipmentParts::BODY, Shape::Box { size: [7.0, 1.0, 3.5] }, [0.0, 0.5, 0.0], false),
    part(EquipmentParts::CAB, Shape::Box { size: [1.8, 1.8, 3.0] }, [2.8, 1.9, 0.0], false),
    part(EquipmentParts::BED, Shape::Box { size: [4.8, 2.0, 3.8] }, [-1.0, 2.0, 0.0], false),
    part(EquipmentParts::WHEELS, WHEEL, [2.5, -0.1, 1.9], true),
    part(EquipmentParts::WHEELS, WHEEL, [2.5, -0.1, -1.9], true),
    part(EquipmentParts::WHEELS, WHEEL, [-2.5, -0.1, 1.9], true),
    part(EquipmentParts::WHEELS, WHEEL, [-2.5, -0.1, -1.9], true),
];

const CONVEYOR_PARTS: &[PartTemplate] = &[
    part(EquipmentParts::BODY, Shape::Box { size: [20.0, 0.5, 1.8] }, [0.0, 0.0, 0.0], false),
    part(EquipmentParts::BELT, Shape::Box { size: [20.0, 0.2, 1.5] }, [0.0, 0.35, 0.0], true),
    part(EquipmentParts::SUPPORTS, LEG, [-8.0, -1.25, 0.0], true),
    part(EquipmentParts::SUPPORTS, LEG, [0.0, -1.25, 0.0], true),
    part(EquipmentParts::SUPPORTS, LEG, [8.0, -1.25, 0.0], true),
];

fn templates(kind: EquipmentKind) -> &'static [PartTemplate] {
    match kind {
        EquipmentKind::Excavator => EXCAVATOR_PARTS,
        EquipmentKind::Truck => TRUCK_PARTS,
        EquipmentKind::Conveyor => CONVEYOR_PARTS,
    }
}

/// Overall model-space size of a kind, used for the Low tier and for culling
pub fn bounding_size(kind: EquipmentKind) -> [f32; 3] {
    match kind {
        EquipmentKind::Excavator => [8.0, 5.0, 10.0],
        EquipmentKind::Truck => [7.5, 4.0, 4.5],
        EquipmentKind::Conveyor => [20.0, 3.0, 2.0],
    }
}

/// Triangles drawn for a kind at a tier
pub fn triangle_estimate(kind: EquipmentKind, tier: LodTier) -> u32 {
    if tier == LodTier::Low {
        return Shape::Box { size: bounding_size(kind) }.triangle_count();
    }
    let wanted = EquipmentParts::for_tier(kind, tier);
    templates(kind)
        .iter()
        .filter(|template| wanted.contains(template.part))
        .map(|template| template.shape.triangle_count())
        .sum()
}

const RUNNING_GEAR: Rgb = Rgb::new(0.18, 0.18, 0.2);

/// Scale and ground clearance for one kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquipmentStyle {
    /// Uniform model scale
    pub scale: f32,
    /// Height added above the ground plane so geometry never clips through it
    pub ground_offset: f32,
}

/// Per-kind styles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentStyles {
    /// Excavator style
    pub excavator: EquipmentStyle,
    /// Truck style
    pub truck: EquipmentStyle,
    /// Conveyor style; larger offset for the elevated support structure
    pub conveyor: EquipmentStyle,
}

impl Default for EquipmentStyles {
    fn default() -> Self {
        Self {
            excavator: EquipmentStyle { scale: 1.0, ground_offset: 1.5 },
            truck: EquipmentStyle { scale: 0.8, ground_offset: 1.0 },
            conveyor: EquipmentStyle { scale: 1.0, ground_offset: 3.0 },
        }
    }
}

impl EquipmentStyles {
    /// Style for a kind
    pub fn style(&self, kind: EquipmentKind) -> &EquipmentStyle {
        match kind {
            EquipmentKind::Excavator => &self.excavator,
            EquipmentKind::Truck => &self.truck,
            EquipmentKind::Conveyor => &self.conveyor,
        }
    }
}

/// Scene position with the ground rule applied
///
/// The base never sits below the ground plane (`y = 0`), and the per-kind
/// offset lifts it further, so the result's Y is always `>= ground_offset`.
pub fn grounded_position(scene: Vec3, style: &EquipmentStyle) -> Vec3 {
    Vec3::new(scene.x, scene.y.max(0.0) + style.ground_offset.max(0.0), scene.z)
}

/// Model matrix for equipment at a scene position
pub fn model_matrix(scene: Vec3, rotation: Vec3, style: &EquipmentStyle) -> Mat4 {
    Transform::from_euler(grounded_position(scene, style), rotation, style.scale).to_matrix()
}

/// Culling proxy for a piece of equipment
pub fn cullable(equipment: &EquipmentPosition, transformer: &CoordinateTransformer, styles: &EquipmentStyles) -> CullableObject {
    let style = styles.style(equipment.kind);
    let [w, h, d] = bounding_size(equipment.kind);
    let half_extents = Vec3::new(w, h, d) * (0.5 * style.scale);
    CullableObject {
        id: equipment.id.clone(),
        position: grounded_position(transformer.resolve(&equipment.position), style),
        bounds: Some(ObjectBounds::Radius(half_extents.magnitude())),
    }
}

/// One drawable part
#[derive(Debug, Clone, PartialEq)]
pub struct DrawPart {
    /// Which part this is
    pub part: EquipmentParts,
    /// Primitive shape
    pub shape: Shape,
    /// Model-space offset
    pub offset: Vec3,
    /// Color
    pub color: Rgb,
    /// Lit (standard) or unlit (basic) material
    pub lit: bool,
}

/// Everything the host needs to draw one piece of equipment
#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentDrawable {
    /// Equipment id
    pub id: String,
    /// Kind
    pub kind: EquipmentKind,
    /// Tier used
    pub tier: LodTier,
    /// World transform
    pub transform: Mat4,
    /// Parts to draw
    pub parts: Vec<DrawPart>,
    /// Label billboard text, if the tier shows labels
    pub label: Option<String>,
    /// Whether to draw the hover highlight
    pub hover_highlight: bool,
}

impl EquipmentDrawable {
    /// Triangles submitted for this drawable
    pub fn triangle_count(&self) -> u32 {
        self.parts.iter().map(|p| p.shape.triangle_count()).sum()
    }

    /// Draw calls for this drawable (one per part)
    pub fn draw_calls(&self) -> u32 {
        self.parts.len() as u32
    }

    /// Scene-space origin of the model
    pub fn origin(&self) -> Vec3 {
        Vec3::new(self.transform[(0, 3)], self.transform[(1, 3)], self.transform[(2, 3)])
    }
}

/// Per-object renderer
#[derive(Debug, Clone, Default)]
pub struct EquipmentRenderer {
    styles: EquipmentStyles,
    hovered: Option<String>,
}

impl EquipmentRenderer {
    /// Create a renderer
    pub fn new(styles: EquipmentStyles) -> Self {
        Self { styles, hovered: None }
    }

    /// Per-kind styles
    pub fn styles(&self) -> &EquipmentStyles {
        &self.styles
    }

    /// Set or clear the hovered equipment id
    pub fn set_hovered(&mut self, id: Option<String>) {
        self.hovered = id;
    }

    /// Currently hovered id
    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Build the drawable for one piece of equipment at a tier
    pub fn build(&self, equipment: &EquipmentPosition, tier: LodTier, transformer: &CoordinateTransformer) -> EquipmentDrawable {
        let style = self.styles.style(equipment.kind);
        let transform = model_matrix(transformer.resolve(&equipment.position), equipment.rotation, style);
        let tint = status_color(equipment.status);

        let parts = if tier == LodTier::Low {
            vec![DrawPart {
                part: EquipmentParts::BOUNDS,
                shape: Shape::Box { size: bounding_size(equipment.kind) },
                offset: Vec3::zeros(),
                color: tint,
                lit: false,
            }]
        } else {
            let wanted = EquipmentParts::for_tier(equipment.kind, tier);
            templates(equipment.kind)
                .iter()
                .filter(|template| wanted.contains(template.part))
                .map(|template| DrawPart {
                    part: template.part,
                    shape: template.shape,
                    offset: Vec3::from(template.offset),
                    color: if template.running_gear { RUNNING_GEAR } else { tint },
                    lit: true,
                })
                .collect()
        };

        let hover_highlight = tier.allows_hover_highlight() && self.hovered.as_deref() == Some(equipment.id.as_str());

        EquipmentDrawable {
            id: equipment.id.clone(),
            kind: equipment.kind,
            tier,
            transform,
            parts,
            label: tier.shows_label().then(|| equipment.label()),
            hover_highlight,
        }
    }
}
