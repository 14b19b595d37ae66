//! Ore-grade heatmap overlay
//!
//! Builds a flat, vertex-colored mesh over the pit from a [`GradeData`] grid:
//! four vertices and two triangles per cell, every vertex of a cell sharing
//! the cell's band color. Picking runs the construction math backwards
//! through the inverse coordinate transform.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::grade::GradeData;
use crate::foundation::math::Vec3;
use crate::render::color::color_for;
use crate::render::stats::RenderInfo;
use crate::scene::bounds::Ray;
use crate::scene::coordinates::CoordinateTransformer;

/// Heatmap configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    /// Scene-space height of the overlay plane
    pub elevation: f32,
    /// Opacity when fully shown
    pub opacity: f32,
    /// Seconds for a full fade in or out
    pub fade_duration: f32,
    /// Start visible
    pub visible: bool,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self { elevation: 0.5, opacity: 0.7, fade_duration: 0.5, visible: true }
    }
}

/// CPU-side overlay mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeatmapMesh {
    /// Scene-space vertex positions
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex colors
    pub colors: Vec<[f32; 3]>,
    /// Triangle list indices
    pub indices: Vec<u32>,
}

impl HeatmapMesh {
    /// Build the mesh for a grid at a fixed scene elevation
    pub fn build(grade: &GradeData, transformer: &CoordinateTransformer, elevation: f32) -> Self {
        let cells = grade.rows() * grade.cols();
        let mut mesh = Self {
            positions: Vec::with_capacity(cells * 4),
            colors: Vec::with_capacity(cells * 4),
            indices: Vec::with_capacity(cells * 6),
        };
        let ground = transformer.domain_bounds().z.max;

        for row in 0..grade.rows() {
            for col in 0..grade.cols() {
                let (x0, y0, x1, y1) = grade.cell_rect(row, col);
                let color = grade.value(row, col).map_or_else(|| color_for(f32::NAN), color_for).to_array();
                let base = mesh.positions.len() as u32;

                for (x, y) in [(x0, y0), (x1, y0), (x1, y1), (x0, y1)] {
                    let scene = transformer.to_scene(&Vec3::new(x, y, ground));
                    mesh.positions.push([scene.x, elevation, scene.z]);
                    mesh.colors.push(color);
                }
                // Counter-clockwise seen from above
                mesh.indices.extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
            }
        }
        log::debug!("Built heatmap mesh: {} cells, {} triangles", cells, mesh.triangle_count());
        mesh
    }

    /// Number of grid cells in the mesh
    pub fn cell_count(&self) -> usize {
        self.positions.len() / 4
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Linear opacity fade toward a target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpacityFade {
    current: f32,
    target: f32,
    max: f32,
    duration: f32,
}

impl OpacityFade {
    /// Create a fade at rest, either fully shown or hidden
    pub fn new(max: f32, duration: f32, visible: bool) -> Self {
        let current = if visible { max } else { 0.0 };
        Self { current, target: current, max, duration }
    }

    /// Start fading in or out
    pub fn set_visible(&mut self, visible: bool) {
        self.target = if visible { self.max } else { 0.0 };
    }

    /// Advance by `dt` seconds; returns the new opacity
    pub fn update(&mut self, dt: f32) -> f32 {
        if self.duration <= 0.0 {
            self.current = self.target;
            return self.current;
        }
        let step = self.max / self.duration * dt.max(0.0);
        self.current = if self.current < self.target {
            (self.current + step).min(self.target)
        } else {
            (self.current - step).max(self.target)
        };
        self.current
    }

    /// Current opacity
    pub fn opacity(&self) -> f32 {
        self.current
    }

    /// Whether anything is drawn at all
    pub fn is_visible(&self) -> bool {
        self.current > 0.0
    }

    /// Whether a fade is in progress
    pub fn is_animating(&self) -> bool {
        (self.current - self.target).abs() > f32::EPSILON
    }
}

/// Grid cell under the pointer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatmapCell {
    /// Row (northing index)
    pub row: usize,
    /// Column (easting index)
    pub col: usize,
    /// Grade value of the cell
    pub grade: f32,
}

/// Click handler receiving the picked cell
pub type CellCallback = Box<dyn FnMut(HeatmapCell) + Send>;

/// Heatmap overlay with fade and picking
pub struct HeatmapRenderer {
    config: HeatmapConfig,
    transformer: CoordinateTransformer,
    grade: Option<GradeData>,
    mesh: Option<HeatmapMesh>,
    fade: OpacityFade,
    hovered: Option<HeatmapCell>,
    on_click: Option<CellCallback>,
}

impl fmt::Debug for HeatmapRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeatmapRenderer")
            .field("config", &self.config)
            .field("cells", &self.mesh.as_ref().map_or(0, HeatmapMesh::cell_count))
            .field("fade", &self.fade)
            .field("hovered", &self.hovered)
            .field("has_click_handler", &self.on_click.is_some())
            .finish()
    }
}

impl HeatmapRenderer {
    /// Create an empty overlay
    pub fn new(config: HeatmapConfig, transformer: CoordinateTransformer) -> Self {
        let fade = OpacityFade::new(config.opacity, config.fade_duration, config.visible);
        Self { config, transformer, grade: None, mesh: None, fade, hovered: None, on_click: None }
    }

    /// Replace the grid and rebuild the mesh
    pub fn set_grade(&mut self, grade: GradeData) {
        self.mesh = Some(HeatmapMesh::build(&grade, &self.transformer, self.config.elevation));
        self.grade = Some(grade);
        self.hovered = None;
    }

    /// Drop the grid
    pub fn clear(&mut self) {
        self.grade = None;
        self.mesh = None;
        self.hovered = None;
    }

    /// Current mesh
    pub fn mesh(&self) -> Option<&HeatmapMesh> {
        self.mesh.as_ref()
    }

    /// Current grid
    pub fn grade(&self) -> Option<&GradeData> {
        self.grade.as_ref()
    }

    /// Toggle visibility; the change fades rather than pops
    pub fn set_visible(&mut self, visible: bool) {
        self.fade.set_visible(visible);
    }

    /// Advance the fade by `dt` seconds; returns the current opacity
    pub fn update(&mut self, dt: f32) -> f32 {
        self.fade.update(dt)
    }

    /// Current opacity
    pub fn opacity(&self) -> f32 {
        self.fade.opacity()
    }

    /// Cell under a scene-space point, if any
    pub fn cell_at(&self, scene_point: &Vec3) -> Option<HeatmapCell> {
        let grade = self.grade.as_ref()?;
        let domain = self.transformer.to_domain(scene_point);
        let (row, col) = grade.cell_at(domain.x, domain.y)?;
        Some(HeatmapCell { row, col, grade: grade.value(row, col)? })
    }

    /// Cell hit by a picking ray at the overlay elevation
    pub fn pick_ray(&self, ray: &Ray) -> Option<HeatmapCell> {
        let hit = ray.intersect_horizontal_plane(self.config.elevation)?;
        self.cell_at(&hit)
    }

    /// Update the hovered cell from a pointer ray
    pub fn pointer_move(&mut self, ray: &Ray) -> Option<HeatmapCell> {
        self.hovered = if self.fade.is_visible() { self.pick_ray(ray) } else { None };
        self.hovered
    }

    /// Cell currently under the pointer
    pub fn hovered(&self) -> Option<HeatmapCell> {
        self.hovered
    }

    /// Register the click handler
    pub fn set_on_click(&mut self, callback: impl FnMut(HeatmapCell) + Send + 'static) {
        self.on_click = Some(Box::new(callback));
    }

    /// Handle a click; the handler runs only when a cell was hit
    pub fn click(&mut self, ray: &Ray) -> Option<HeatmapCell> {
        if !self.fade.is_visible() {
            return None;
        }
        let cell = self.pick_ray(ray)?;
        if let Some(callback) = self.on_click.as_mut() {
            callback(cell);
        }
        Some(cell)
    }

    /// One draw call while any opacity remains
    pub fn render_info(&self) -> RenderInfo {
        let mut info = RenderInfo::default();
        if let Some(mesh) = self.mesh.as_ref().filter(|_| self.fade.is_visible()) {
            info.add_draw(mesh.triangle_count() as u64);
        }
        info
    }
}
