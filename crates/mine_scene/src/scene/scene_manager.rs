//! Mine Scene - per-frame pipeline
//!
//! The Mine Scene:
//! 1. Swaps in complete snapshots from the feed between frames
//! 2. Keeps culling proxies for the current equipment set
//! 3. Performs throttled visibility culling
//! 4. Selects LOD tiers for the survivors only
//! 5. Produces per-object drawables or per-kind instance buffers
//! 6. Advances the heatmap fade and reports render statistics

use std::collections::HashSet;
use std::sync::Arc;

use crate::core::config::SceneSettings;
use crate::domain::equipment::EquipmentPosition;
use crate::domain::snapshot::{SceneSnapshot, SnapshotInbox};
use crate::error::SceneResult;
use crate::render::camera::{Camera, CameraFocus, CameraState};
use crate::render::equipment::{self, EquipmentDrawable, EquipmentRenderer};
use crate::render::heatmap::HeatmapRenderer;
use crate::render::instancing::{InstancedRenderer, InstancingConfig, RenderStrategy};
use crate::render::stats::RenderInfo;
use crate::scene::coordinates::CoordinateTransformer;
use crate::scene::culling::{CullableObject, CullingResult, FrustumCuller};
use crate::scene::lod::LodSelector;

/// Everything one frame produced
#[derive(Debug, Clone)]
pub struct FrameOutput {
    /// Frame number, starting at 1
    pub frame: u64,
    /// Path used for equipment this frame
    pub strategy: RenderStrategy,
    /// Culling result in effect, shared with the culler between recomputations
    pub culling: Arc<CullingResult>,
    /// Objects whose LOD tier changed this frame
    pub lod_changes: usize,
    /// Per-object drawables; empty on the instanced path
    pub drawables: Vec<EquipmentDrawable>,
    /// Heatmap opacity after this frame's fade step
    pub heatmap_opacity: f32,
    /// Draw calls and triangles for reporting
    pub render_info: RenderInfo,
}

/// Scene state for one pit view, owned by the render loop
#[derive(Debug)]
pub struct MineScene {
    transformer: CoordinateTransformer,
    culler: FrustumCuller,
    lod: LodSelector,
    equipment_renderer: EquipmentRenderer,
    instanced: InstancedRenderer,
    instancing: InstancingConfig,
    heatmap: HeatmapRenderer,
    snapshot: SceneSnapshot,
    cullables: Vec<CullableObject>,
    focus: CameraFocus,
    frame: u64,
}

impl MineScene {
    /// Create an empty scene from settings
    pub fn new(settings: &SceneSettings) -> SceneResult<Self> {
        let transformer = settings.transformer()?;
        log::info!(
            "Mine scene: culling every {} frame(s), instancing from {} objects",
            settings.culling.update_interval.max(1),
            settings.instancing.threshold
        );
        Ok(Self {
            culler: FrustumCuller::new(settings.culling.clone()),
            lod: LodSelector::new(settings.lod.clone()),
            equipment_renderer: EquipmentRenderer::new(settings.instancing.styles.clone()),
            instanced: InstancedRenderer::new(settings.instancing.max_instances),
            instancing: settings.instancing.clone(),
            heatmap: HeatmapRenderer::new(settings.heatmap.clone(), transformer.clone()),
            transformer,
            snapshot: SceneSnapshot::default(),
            cullables: Vec::new(),
            focus: CameraFocus::new(),
            frame: 0,
        })
    }

    /// Replace the scene contents with a complete snapshot
    ///
    /// Must be called between frames. A snapshot without a grade grid keeps
    /// the current overlay.
    pub fn apply_snapshot(&mut self, snapshot: SceneSnapshot) {
        log::debug!("Applying snapshot {} ({} equipment)", snapshot.sequence, snapshot.equipment.len());

        let styles = self.equipment_renderer.styles();
        self.cullables = snapshot
            .equipment
            .iter()
            .map(|item| equipment::cullable(item, &self.transformer, styles))
            .collect();

        let ids: HashSet<&str> = snapshot.equipment.iter().map(|item| item.id.as_str()).collect();
        self.lod.retain(|id| ids.contains(id));
        self.focus.revalidate(snapshot.equipment.len());

        let SceneSnapshot { sequence, equipment, grade } = snapshot;
        if let Some(grade) = grade {
            self.heatmap.set_grade(grade);
        }
        self.snapshot = SceneSnapshot { sequence, equipment, grade: None };
    }

    /// Swap in the newest snapshot from the feed, if one arrived
    pub fn ingest(&mut self, inbox: &SnapshotInbox) -> bool {
        match inbox.take_latest() {
            Some(snapshot) => {
                self.apply_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    /// Run one frame
    pub fn render_frame(&mut self, camera: &CameraState, dt: f32) -> FrameOutput {
        self.frame += 1;
        let culling = self.culler.update(camera, &self.cullables);
        let strategy = RenderStrategy::choose(self.snapshot.equipment.len(), &self.instancing);

        let mut render_info = RenderInfo::default();
        let mut drawables = Vec::new();
        let mut lod_changes = 0;

        match strategy {
            RenderStrategy::PerObject => {
                let decisions =
                    self.lod.select_visible(&camera.position, &self.snapshot.equipment, &self.transformer, &culling);
                lod_changes = decisions.iter().filter(|decision| decision.changed).count();

                let visible = self.snapshot.equipment.iter().filter(|item| !culling.is_culled(&item.id));
                for (item, decision) in visible.zip(&decisions) {
                    let drawable = self.equipment_renderer.build(item, decision.tier, &self.transformer);
                    render_info.draw_calls += drawable.draw_calls();
                    render_info.triangles += u64::from(drawable.triangle_count());
                    drawables.push(drawable);
                }
            }
            RenderStrategy::Instanced => {
                let visible: Vec<&EquipmentPosition> =
                    self.snapshot.equipment.iter().filter(|item| !culling.is_culled(&item.id)).collect();
                self.instanced.update(&visible, &self.transformer, &self.instancing.styles);
                render_info.merge(&self.instanced.render_info());
            }
        }

        let heatmap_opacity = self.heatmap.update(dt);
        render_info.merge(&self.heatmap.render_info());

        log::trace!(
            "Frame {}: {:?}, {} draw calls, {} triangles",
            self.frame,
            strategy,
            render_info.draw_calls,
            render_info.triangles
        );

        FrameOutput {
            frame: self.frame,
            strategy,
            culling,
            lod_changes,
            drawables,
            heatmap_opacity,
            render_info,
        }
    }

    /// Current equipment
    pub fn equipment(&self) -> &[EquipmentPosition] {
        &self.snapshot.equipment
    }

    /// Sequence number of the applied snapshot
    pub fn sequence(&self) -> u64 {
        self.snapshot.sequence
    }

    /// Coordinate mapping
    pub fn transformer(&self) -> &CoordinateTransformer {
        &self.transformer
    }

    /// Frustum culler
    pub fn culler(&self) -> &FrustumCuller {
        &self.culler
    }

    /// LOD selector
    pub fn lod_selector(&self) -> &LodSelector {
        &self.lod
    }

    /// Instance batches
    pub fn instanced(&self) -> &InstancedRenderer {
        &self.instanced
    }

    /// Heatmap overlay
    pub fn heatmap(&self) -> &HeatmapRenderer {
        &self.heatmap
    }

    /// Mutable heatmap overlay, for picking and visibility toggles
    pub fn heatmap_mut(&mut self) -> &mut HeatmapRenderer {
        &mut self.heatmap
    }

    /// Set or clear the hovered equipment id
    pub fn set_hovered_equipment(&mut self, id: Option<String>) {
        self.equipment_renderer.set_hovered(id);
    }

    /// Focused equipment, if any
    pub fn focused(&self) -> Option<&EquipmentPosition> {
        self.focus.index().and_then(|index| self.snapshot.equipment.get(index))
    }

    /// Focus the camera on the next piece of equipment
    pub fn focus_next(&mut self, camera: &mut Camera) -> Option<&EquipmentPosition> {
        self.focus.next(self.snapshot.equipment.len())?;
        self.aim(camera)
    }

    /// Focus the camera on the previous piece of equipment
    pub fn focus_previous(&mut self, camera: &mut Camera) -> Option<&EquipmentPosition> {
        self.focus.previous(self.snapshot.equipment.len())?;
        self.aim(camera)
    }

    /// Return to the overview camera
    pub fn clear_focus(&mut self) {
        self.focus.clear();
    }

    fn aim(&self, camera: &mut Camera) -> Option<&EquipmentPosition> {
        let item = self.focused()?;
        let style = self.equipment_renderer.styles().style(item.kind);
        let target = equipment::grounded_position(self.transformer.resolve(&item.position), style);
        self.focus.apply(camera, target);
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::equipment::EquipmentKind;
    use crate::domain::grade::{GradeData, GridBounds};
    use crate::foundation::math::Vec3;
    use crate::scene::lod::LodTier;

    fn snapshot(count: usize) -> SceneSnapshot {
        let equipment = (0..count)
            .map(|i| {
                let kind = EquipmentKind::ALL[i % 3];
                let offset = i as f32;
                EquipmentPosition::new(format!("EQ-{i}"), kind, Vec3::new(1100.0 + offset, 1900.0, -25.0))
            })
            .collect();
        let bounds = GridBounds { min_x: 800.0, max_x: 1400.0, min_y: 1600.0, max_y: 2200.0 };
        let grade = GradeData::new(vec![vec![1.0, 2.0], vec![3.0, 0.2]], 2, 2, bounds).unwrap();
        SceneSnapshot { sequence: 1, equipment, grade: Some(grade) }
    }

    fn overview() -> CameraState {
        Camera::default().state()
    }

    #[test]
    fn test_per_object_frame() {
        let mut scene = MineScene::new(&SceneSettings::default()).unwrap();
        scene.apply_snapshot(snapshot(3));

        let output = scene.render_frame(&overview(), 0.016);
        assert_eq!(output.strategy, RenderStrategy::PerObject);
        assert_eq!(output.drawables.len(), 3);
        assert_eq!(output.lod_changes, 3);
        // Overview camera sits roughly 290 units away
        assert!(output.drawables.iter().all(|d| d.tier == LodTier::Low));
        assert!(output.render_info.draw_calls >= 4);

        let again = scene.render_frame(&overview(), 0.016);
        assert_eq!(again.lod_changes, 0);
    }

    #[test]
    fn test_instanced_frame_above_threshold() {
        let mut settings = SceneSettings::default();
        settings.instancing.threshold = 6;
        let mut scene = MineScene::new(&settings).unwrap();
        scene.apply_snapshot(snapshot(9));

        let output = scene.render_frame(&overview(), 0.016);
        assert_eq!(output.strategy, RenderStrategy::Instanced);
        assert!(output.drawables.is_empty());
        // Three kinds plus the heatmap
        assert_eq!(output.render_info.draw_calls, 4);
        assert_eq!(scene.instanced().batch(EquipmentKind::Truck).map(|b| b.len()), Some(3));
    }

    #[test]
    fn test_culled_equipment_is_not_drawn() {
        let mut scene = MineScene::new(&SceneSettings::default()).unwrap();
        scene.apply_snapshot(snapshot(3));

        // Looking straight up at the sky
        let mut camera = Camera::default();
        camera.set_position(Vec3::new(0.0, 500.0, 0.0));
        camera.look_at(Vec3::new(0.0, 1000.0, 1.0), Vec3::y());

        let output = scene.render_frame(&camera.state(), 0.016);
        assert!(output.drawables.is_empty());
        assert_eq!(output.culling.culled_objects.len(), 3);
        assert!(scene.lod_selector().current_tier("EQ-0").is_none());
    }

    #[test]
    fn test_snapshot_replaces_equipment() {
        let mut scene = MineScene::new(&SceneSettings::default()).unwrap();
        scene.apply_snapshot(snapshot(3));
        scene.render_frame(&overview(), 0.016);

        scene.apply_snapshot(SceneSnapshot { sequence: 2, equipment: Vec::new(), grade: None });
        assert!(scene.equipment().is_empty());
        assert_eq!(scene.sequence(), 2);
        // Grade overlay survives equipment-only snapshots
        assert!(scene.heatmap().grade().is_some());
        assert!(scene.lod_selector().current_tier("EQ-0").is_none());
    }

    #[test]
    fn test_focus_cycles_through_equipment() {
        let mut scene = MineScene::new(&SceneSettings::default()).unwrap();
        scene.apply_snapshot(snapshot(2));
        let mut camera = Camera::default();

        assert_eq!(scene.focus_next(&mut camera).map(|e| e.id.clone()), Some("EQ-0".into()));
        assert_eq!(scene.focus_next(&mut camera).map(|e| e.id.clone()), Some("EQ-1".into()));
        assert_eq!(scene.focus_next(&mut camera).map(|e| e.id.clone()), Some("EQ-0".into()));
        assert_eq!(scene.focus_previous(&mut camera).map(|e| e.id.clone()), Some("EQ-1".into()));

        scene.apply_snapshot(snapshot(1));
        assert!(scene.focused().is_none());
    }

    #[test]
    fn test_hovered_equipment_highlights_up_close() {
        let mut scene = MineScene::new(&SceneSettings::default()).unwrap();
        scene.apply_snapshot(snapshot(1));
        scene.set_hovered_equipment(Some("EQ-0".into()));

        let mut camera = Camera::default();
        camera.set_position(Vec3::new(0.0, 20.0, 30.0));
        camera.look_at(Vec3::zeros(), Vec3::y());
        let close = scene.render_frame(&camera.state(), 0.016);
        assert_eq!(close.drawables[0].tier, LodTier::High);
        assert!(close.drawables[0].hover_highlight);

        scene.set_hovered_equipment(None);
        let cleared = scene.render_frame(&camera.state(), 0.016);
        assert!(!cleared.drawables[0].hover_highlight);
    }

    #[test]
    fn test_clear_focus_returns_to_overview() {
        let mut scene = MineScene::new(&SceneSettings::default()).unwrap();
        scene.apply_snapshot(snapshot(2));
        let mut camera = Camera::default();

        scene.focus_next(&mut camera);
        assert!(scene.focused().is_some());
        scene.clear_focus();
        assert!(scene.focused().is_none());
        // Cycling restarts from the first item
        assert_eq!(scene.focus_next(&mut camera).map(|e| e.id.clone()), Some("EQ-0".into()));
    }

    #[test]
    fn test_throttled_frames_reuse_culling() {
        let mut scene = MineScene::new(&SceneSettings::default()).unwrap();
        scene.apply_snapshot(snapshot(3));

        let first = scene.render_frame(&overview(), 0.016);
        let second = scene.render_frame(&overview(), 0.016);
        assert!(Arc::ptr_eq(&first.culling, &second.culling));
    }

    #[test]
    fn test_ingest_keeps_grid_from_coalesced_snapshot() {
        let (sender, inbox) = crate::domain::snapshot::snapshot_channel();
        let mut scene = MineScene::new(&SceneSettings::default()).unwrap();

        sender.publish(snapshot(2));
        sender.publish(SceneSnapshot { sequence: 2, grade: None, ..snapshot(2) });
        assert!(scene.ingest(&inbox));

        assert_eq!(scene.sequence(), 2);
        assert!(scene.heatmap().grade().is_some());
        assert!(scene.heatmap().mesh().is_some());
    }

    #[test]
    fn test_ingest_takes_latest() {
        let (sender, inbox) = crate::domain::snapshot::snapshot_channel();
        let mut scene = MineScene::new(&SceneSettings::default()).unwrap();
        assert!(!scene.ingest(&inbox));

        sender.publish(snapshot(1));
        sender.publish(SceneSnapshot { sequence: 5, ..snapshot(2) });
        assert!(scene.ingest(&inbox));
        assert_eq!(scene.sequence(), 5);
        assert_eq!(scene.equipment().len(), 2);
    }
}
