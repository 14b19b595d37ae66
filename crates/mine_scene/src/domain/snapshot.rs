//! Snapshot ingestion
//!
//! The telemetry feed delivers full snapshots (never deltas) from another
//! thread or task. [`SnapshotMessage`] is the JSON form of one delivery;
//! [`snapshot_channel`] hands decoded snapshots to the frame loop.
//!
//! Deliveries that arrive faster than frames are coalesced: the inbox only
//! keeps the newest snapshot and counts the ones it superseded. The frame loop
//! takes it between frames, so a snapshot is never mutated while a pass reads it.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Deserialize;

use crate::domain::equipment::{EquipmentKind, EquipmentPosition, EquipmentStatus, Telemetry};
use crate::domain::grade::{GradeData, GradeStats, GridBounds};
use crate::error::SceneResult;
use crate::foundation::math::Vec3;
use crate::scene::coordinates::{CoordinateTransformer, SpacePosition};

/// One complete, immutable view of the pit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneSnapshot {
    /// Monotonic sequence number assigned by the feed
    pub sequence: u64,
    /// Every asset in the pit
    pub equipment: Vec<EquipmentPosition>,
    /// Ore-grade overlay, if the feed included one
    pub grade: Option<GradeData>,
}

/// `{x, y, z}` triple on the wire
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WirePoint {
    /// X
    #[serde(default)]
    pub x: f32,
    /// Y
    #[serde(default)]
    pub y: f32,
    /// Z
    #[serde(default)]
    pub z: f32,
}

impl From<WirePoint> for Vec3 {
    fn from(p: WirePoint) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

/// Coordinate space tag on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireSpace {
    /// Easting / northing / elevation
    Domain,
    /// Renderer coordinates
    Scene,
}

/// Equipment record on the wire
#[derive(Debug, Clone, Deserialize)]
pub struct EquipmentRecord {
    /// Stable identifier
    pub id: String,
    /// Equipment type name
    #[serde(rename = "type")]
    pub kind: String,
    /// Status name
    pub status: String,
    /// Position
    pub position: WirePoint,
    /// Euler rotation in radians
    #[serde(default)]
    pub rotation: WirePoint,
    /// Which space `position` is in; untagged records are classified heuristically
    #[serde(default)]
    pub space: Option<WireSpace>,
    /// Live readings
    #[serde(default)]
    pub telemetry: Telemetry,
}

/// Grade grid on the wire
#[derive(Debug, Clone, Deserialize)]
pub struct GradeRecord {
    /// Row-major grade values
    pub grid: Vec<Vec<f32>>,
    /// Row count
    pub rows: usize,
    /// Column count
    #[serde(alias = "columns")]
    pub cols: usize,
    /// Domain rectangle covered
    pub bounds: GridBounds,
    /// Precomputed statistics; derived from the grid when absent
    #[serde(default)]
    pub stats: Option<GradeStats>,
}

/// One feed delivery
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotMessage {
    /// Sequence number
    #[serde(default)]
    pub sequence: u64,
    /// Equipment records
    #[serde(default)]
    pub equipment: Vec<EquipmentRecord>,
    /// Grade grid
    #[serde(default, alias = "gradeData")]
    pub grade: Option<GradeRecord>,
}

impl SnapshotMessage {
    /// Decode a JSON message
    pub fn from_json(text: &str) -> SceneResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Convert to a snapshot
    ///
    /// Records with an unknown type or status are dropped with a warning so
    /// that a bad record renders nothing rather than failing the frame. A
    /// malformed grade grid rejects the whole message.
    pub fn into_snapshot(self, transformer: &CoordinateTransformer) -> SceneResult<SceneSnapshot> {
        let grade = self
            .grade
            .map(|record| match record.stats {
                Some(stats) => GradeData::with_stats(record.grid, record.rows, record.cols, record.bounds, stats),
                None => GradeData::new(record.grid, record.rows, record.cols, record.bounds),
            })
            .transpose()?;

        let equipment = self
            .equipment
            .into_iter()
            .filter_map(|record| convert_record(record, transformer))
            .collect();

        Ok(SceneSnapshot { sequence: self.sequence, equipment, grade })
    }
}

fn convert_record(record: EquipmentRecord, transformer: &CoordinateTransformer) -> Option<EquipmentPosition> {
    let kind = match record.kind.parse::<EquipmentKind>() {
        Ok(kind) => kind,
        Err(e) => {
            log::warn!("Dropping equipment '{}': {}", record.id, e);
            return None;
        }
    };
    let status = match record.status.parse::<EquipmentStatus>() {
        Ok(status) => status,
        Err(e) => {
            log::warn!("Dropping equipment '{}': {}", record.id, e);
            return None;
        }
    };

    let raw = Vec3::from(record.position);
    let position = match record.space {
        Some(WireSpace::Domain) => SpacePosition::Domain(raw),
        Some(WireSpace::Scene) => SpacePosition::Scene(raw),
        None => SpacePosition::infer(raw, transformer),
    };

    Some(EquipmentPosition {
        id: record.id,
        kind,
        position,
        rotation: record.rotation.into(),
        status,
        telemetry: record.telemetry,
    })
}

#[derive(Debug, Default)]
struct Mailbox {
    pending: Option<SceneSnapshot>,
    superseded: u64,
    delivered: u64,
}

/// Producer half; cheap to clone and `Send`
#[derive(Debug, Clone)]
pub struct SnapshotSender {
    mailbox: Arc<Mutex<Mailbox>>,
}

impl SnapshotSender {
    /// Publish a snapshot, replacing any that the frame loop has not taken yet
    ///
    /// A grade grid on the replaced snapshot carries over when the new one has
    /// none, so an overlay is never lost to coalescing.
    pub fn publish(&self, mut snapshot: SceneSnapshot) {
        let mut mailbox = self.mailbox.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = mailbox.pending.take() {
            mailbox.superseded += 1;
            log::trace!("Snapshot {} superseded before it was rendered", previous.sequence);
            if snapshot.grade.is_none() {
                snapshot.grade = previous.grade;
            }
        }
        mailbox.pending = Some(snapshot);
        mailbox.delivered += 1;
    }
}

/// Consumer half, owned by the frame loop
#[derive(Debug)]
pub struct SnapshotInbox {
    mailbox: Arc<Mutex<Mailbox>>,
}

impl SnapshotInbox {
    /// Take the newest pending snapshot, if any
    pub fn take_latest(&self) -> Option<SceneSnapshot> {
        self.mailbox.lock().unwrap_or_else(PoisonError::into_inner).pending.take()
    }

    /// Snapshots dropped because a newer one arrived first
    pub fn superseded_count(&self) -> u64 {
        self.mailbox.lock().unwrap_or_else(PoisonError::into_inner).superseded
    }

    /// Total snapshots published
    pub fn delivered_count(&self) -> u64 {
        self.mailbox.lock().unwrap_or_else(PoisonError::into_inner).delivered
    }
}

/// Create a coalescing snapshot channel
pub fn snapshot_channel() -> (SnapshotSender, SnapshotInbox) {
    let mailbox = Arc::new(Mutex::new(Mailbox::default()));
    (SnapshotSender { mailbox: Arc::clone(&mailbox) }, SnapshotInbox { mailbox })
}
