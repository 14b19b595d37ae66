//! Data model for the equipment feed
//!
//! Equipment positions and grade grids arrive as complete snapshots and are
//! treated as immutable once ingested.

pub mod equipment;
pub mod grade;
pub mod snapshot;

pub use equipment::{EquipmentKind, EquipmentPosition, EquipmentStatus, Telemetry};
pub use grade::{GradeData, GradeStats, GridBounds};
pub use snapshot::{snapshot_channel, SceneSnapshot, SnapshotInbox, SnapshotMessage, SnapshotSender};
