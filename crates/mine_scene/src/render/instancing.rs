//! Instanced equipment rendering
//!
//! Collapses every piece of equipment of one kind into a single instance
//! buffer, so the host issues one draw call per kind instead of one per
//! object. Per-object LOD, labels and hover highlighting are not available on
//! this path.
//!
//! # Architecture
//!
//! ```text
//! SceneSnapshot ─► InstancedBatch::update ─► Vec<InstanceData> ─► host upload
//!                         │
//!                  one batch per EquipmentKind
//! ```

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::domain::equipment::{EquipmentKind, EquipmentPosition};
use crate::render::color::status_color;
use crate::render::equipment::{model_matrix, triangle_estimate, EquipmentStyles};
use crate::render::stats::RenderInfo;
use crate::scene::coordinates::CoordinateTransformer;
use crate::scene::lod::LodTier;

/// Per-instance data uploaded to the GPU
/// Must match the host shader layout exactly
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    /// Model transformation matrix (column-major 4x4)
    pub model_matrix: [[f32; 4]; 4],
    /// Instance color (RGBA)
    pub color: [f32; 4],
}

impl InstanceData {
    /// Translation column of the model matrix
    pub fn translation(&self) -> [f32; 3] {
        let column = self.model_matrix[3];
        [column[0], column[1], column[2]]
    }
}

/// Instancing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstancingConfig {
    /// Allow the instanced path at all
    pub enabled: bool,
    /// Minimum equipment count before switching to instancing
    pub threshold: usize,
    /// Maximum instances per kind; extra equipment is not drawn
    pub max_instances: usize,
    /// Per-kind scale and ground offset
    pub styles: EquipmentStyles,
}

impl Default for InstancingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 50,
            max_instances: 1000,
            styles: EquipmentStyles::default(),
        }
    }
}

/// Which equipment path a frame uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStrategy {
    /// One drawable per object with LOD
    PerObject,
    /// One instance buffer per kind
    Instanced,
}

impl RenderStrategy {
    /// Pick a strategy for `count` objects
    pub fn choose(count: usize, config: &InstancingConfig) -> Self {
        if config.enabled && count >= config.threshold {
            Self::Instanced
        } else {
            Self::PerObject
        }
    }
}

/// Instance buffer for one equipment kind
#[derive(Debug, Clone)]
pub struct InstancedBatch {
    kind: EquipmentKind,
    capacity: usize,
    instances: Vec<InstanceData>,
    ids: Vec<String>,
    dirty: bool,
    version: u64,
}

impl InstancedBatch {
    /// Create an empty batch
    pub fn new(kind: EquipmentKind, capacity: usize) -> Self {
        Self {
            kind,
            capacity,
            instances: Vec::with_capacity(capacity.min(256)),
            ids: Vec::new(),
            dirty: false,
            version: 0,
        }
    }

    /// Kind this batch draws
    pub fn kind(&self) -> EquipmentKind {
        self.kind
    }

    /// Rebuild the buffer from the equipment of this batch's kind
    ///
    /// Marks the buffer dirty once for the whole pass regardless of how many
    /// instances were written. Returns the instance count.
    pub fn update<'a>(
        &mut self,
        equipment: impl IntoIterator<Item = &'a EquipmentPosition>,
        transformer: &CoordinateTransformer,
        styles: &EquipmentStyles,
    ) -> usize {
        let style = styles.style(self.kind);
        self.instances.clear();
        self.ids.clear();

        let mut overflow = 0_usize;
        for item in equipment.into_iter().filter(|item| item.kind == self.kind) {
            if self.instances.len() >= self.capacity {
                overflow += 1;
                continue;
            }
            let model = model_matrix(transformer.resolve(&item.position), item.rotation, style);
            self.instances.push(InstanceData {
                model_matrix: model.into(),
                color: status_color(item.status).to_rgba(1.0),
            });
            self.ids.push(item.id.clone());
        }
        if overflow > 0 {
            log::warn!("{} batch full ({}), {} instances not drawn", self.kind, self.capacity, overflow);
        }

        self.dirty = true;
        self.version += 1;
        self.instances.len()
    }

    /// Instance data written by the last update
    pub fn instances(&self) -> &[InstanceData] {
        &self.instances
    }

    /// Equipment ids, parallel to [`Self::instances`]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Raw bytes for upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    /// Number of live instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the batch has no instances
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Whether the buffer changed since the host last uploaded it
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Consume the dirty flag; returns whether an upload is needed
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Number of times the buffer has been marked for upload
    pub fn version(&self) -> u64 {
        self.version
    }

    /// One draw call for a non-empty batch
    pub fn render_info(&self) -> RenderInfo {
        let mut info = RenderInfo::default();
        if !self.is_empty() {
            let per_instance = u64::from(triangle_estimate(self.kind, LodTier::Medium));
            info.add_draw(per_instance * self.len() as u64);
        }
        info
    }
}

/// One batch per equipment kind
#[derive(Debug, Clone)]
pub struct InstancedRenderer {
    batches: Vec<InstancedBatch>,
}

impl InstancedRenderer {
    /// Create batches for every kind
    pub fn new(capacity: usize) -> Self {
        Self {
            batches: EquipmentKind::ALL.iter().map(|&kind| InstancedBatch::new(kind, capacity)).collect(),
        }
    }

    /// Rebuild every batch
    pub fn update(&mut self, equipment: &[&EquipmentPosition], transformer: &CoordinateTransformer, styles: &EquipmentStyles) {
        for batch in &mut self.batches {
            batch.update(equipment.iter().copied(), transformer, styles);
        }
    }

    /// Batch for a kind
    pub fn batch(&self, kind: EquipmentKind) -> Option<&InstancedBatch> {
        self.batches.iter().find(|batch| batch.kind == kind)
    }

    /// All batches
    pub fn batches(&self) -> &[InstancedBatch] {
        &self.batches
    }

    /// Combined statistics
    pub fn render_info(&self) -> RenderInfo {
        let mut info = RenderInfo::default();
        for batch in &self.batches {
            info.merge(&batch.render_info());
        }
        info
    }
}
