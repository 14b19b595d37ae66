//! Equipment records as delivered by the telemetry feed

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;
use crate::scene::coordinates::SpacePosition;

/// Category of a physical asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentKind {
    /// Hydraulic excavator / shovel
    Excavator,
    /// Haul truck
    Truck,
    /// Conveyor section
    Conveyor,
}

impl EquipmentKind {
    /// Every kind, in a fixed order
    pub const ALL: [Self; 3] = [Self::Excavator, Self::Truck, Self::Conveyor];

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excavator => "excavator",
            Self::Truck => "truck",
            Self::Conveyor => "conveyor",
        }
    }
}

impl fmt::Display for EquipmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EquipmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "excavator" => Ok(Self::Excavator),
            "truck" => Ok(Self::Truck),
            "conveyor" => Ok(Self::Conveyor),
            other => Err(format!("unknown equipment type '{other}'")),
        }
    }
}

/// Operating state of an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentStatus {
    /// Working normally
    Operating,
    /// Powered but not working
    Idle,
    /// Out of service for maintenance
    Maintenance,
    /// Faulted
    Error,
}

impl FromStr for EquipmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "operating" => Ok(Self::Operating),
            "idle" => Ok(Self::Idle),
            "maintenance" => Ok(Self::Maintenance),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown equipment status '{other}'")),
        }
    }
}

/// Optional live readings
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// Ground speed
    pub speed: Option<f32>,
    /// Current payload
    pub payload: Option<f32>,
    /// Engine / motor temperature
    pub temperature: Option<f32>,
}

/// One asset in one snapshot
///
/// Snapshots are replaced wholesale; the `id` is the only identity shared
/// across frames.
#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentPosition {
    /// Stable identifier
    pub id: String,
    /// Asset category
    pub kind: EquipmentKind,
    /// Position, tagged with the space it is expressed in
    pub position: SpacePosition,
    /// Euler rotation in radians (XYZ order)
    pub rotation: Vec3,
    /// Operating state
    pub status: EquipmentStatus,
    /// Optional live readings
    pub telemetry: Telemetry,
}

impl EquipmentPosition {
    /// Operating, unrotated equipment at a domain-space position
    pub fn new(id: impl Into<String>, kind: EquipmentKind, domain_position: Vec3) -> Self {
        Self {
            id: id.into(),
            kind,
            position: SpacePosition::Domain(domain_position),
            rotation: Vec3::zeros(),
            status: EquipmentStatus::Operating,
            telemetry: Telemetry::default(),
        }
    }

    /// Builder-style status override
    pub fn with_status(mut self, status: EquipmentStatus) -> Self {
        self.status = status;
        self
    }

    /// Builder-style rotation override
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Text shown on the label billboard
    pub fn label(&self) -> String {
        match self.telemetry.payload {
            Some(payload) if self.kind == EquipmentKind::Truck => format!("{} ({payload:.0} t)", self.id),
            _ => self.id.clone(),
        }
    }
}
