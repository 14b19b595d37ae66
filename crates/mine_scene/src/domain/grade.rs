//! Ore-grade grid data

use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};
use crate::scene::coordinates::AxisRange;

/// Domain rectangle (easting × northing) covered by a grade grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridBounds {
    /// Minimum easting
    #[serde(alias = "minX")]
    pub min_x: f32,
    /// Maximum easting
    #[serde(alias = "maxX")]
    pub max_x: f32,
    /// Minimum northing
    #[serde(alias = "minY")]
    pub min_y: f32,
    /// Maximum northing
    #[serde(alias = "maxY")]
    pub max_y: f32,
}

impl GridBounds {
    /// Easting range
    pub fn x_range(&self) -> AxisRange {
        AxisRange::new(self.min_x, self.max_x)
    }

    /// Northing range
    pub fn y_range(&self) -> AxisRange {
        AxisRange::new(self.min_y, self.max_y)
    }

    fn validate(&self) -> SceneResult<()> {
        for (axis, range) in [("x", self.x_range()), ("y", self.y_range())] {
            if !(range.min.is_finite() && range.max.is_finite() && range.min < range.max) {
                return Err(SceneError::InvalidBounds { space: "grid", axis, min: range.min, max: range.max });
            }
        }
        Ok(())
    }
}

/// Summary statistics over a grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeStats {
    /// Lowest grade
    pub min: f32,
    /// Highest grade
    pub max: f32,
    /// Mean grade
    pub average: f32,
}

impl GradeStats {
    /// Compute statistics over every cell
    pub fn from_grid(grid: &[Vec<f32>]) -> Self {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0_f64;
        let mut count = 0_usize;
        for &value in grid.iter().flatten() {
            min = min.min(value);
            max = max.max(value);
            sum += f64::from(value);
            count += 1;
        }
        if count == 0 {
            return Self { min: 0.0, max: 0.0, average: 0.0 };
        }
        Self { min, max, average: (sum / count as f64) as f32 }
    }
}

/// Slack allowed between supplied statistics and the grid, for rounded feeds
pub const STATS_TOLERANCE: f32 = 1e-3;

fn check_stats(supplied: &GradeStats, actual: &GradeStats) -> SceneResult<()> {
    let GradeStats { min, max, average } = *supplied;
    let problem = if !(min.is_finite() && max.is_finite() && average.is_finite()) {
        Some("non-finite value".to_string())
    } else if min > max {
        Some(format!("min {min} above max {max}"))
    } else if average < min - STATS_TOLERANCE || average > max + STATS_TOLERANCE {
        Some(format!("average {average} outside [{min}, {max}]"))
    } else if actual.min < min - STATS_TOLERANCE {
        Some(format!("grid holds {} below min {min}", actual.min))
    } else if actual.max > max + STATS_TOLERANCE {
        Some(format!("grid holds {} above max {max}", actual.max))
    } else {
        None
    };
    problem.map_or(Ok(()), |detail| Err(SceneError::InconsistentGradeStats(detail)))
}

/// Validated rows × cols grid of grade readings
///
/// Read-only once constructed; a new grid replaces the old one wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeData {
    grid: Vec<Vec<f32>>,
    rows: usize,
    cols: usize,
    bounds: GridBounds,
    stats: GradeStats,
}

impl GradeData {
    /// Build a grid, computing statistics from the values
    ///
    /// Fails if the grid shape disagrees with `rows`/`cols`, the bounds are
    /// degenerate, or any value is not finite.
    pub fn new(grid: Vec<Vec<f32>>, rows: usize, cols: usize, bounds: GridBounds) -> SceneResult<Self> {
        let stats = GradeStats::from_grid(&grid);
        Self::with_stats(grid, rows, cols, bounds, stats)
    }

    /// Build a grid with externally supplied statistics
    ///
    /// The statistics must be consistent with the values: `min <= average <=
    /// max`, and every cell within `[min, max]` up to [`STATS_TOLERANCE`].
    pub fn with_stats(
        grid: Vec<Vec<f32>>,
        rows: usize,
        cols: usize,
        bounds: GridBounds,
        stats: GradeStats,
    ) -> SceneResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(SceneError::EmptyGrid);
        }
        if grid.len() != rows {
            return Err(SceneError::GridDimensionMismatch {
                expected_rows: rows,
                expected_cols: cols,
                detail: format!("{} rows", grid.len()),
            });
        }
        for (row, values) in grid.iter().enumerate() {
            if values.len() != cols {
                return Err(SceneError::GridDimensionMismatch {
                    expected_rows: rows,
                    expected_cols: cols,
                    detail: format!("row {row} has {} columns", values.len()),
                });
            }
            if let Some(col) = values.iter().position(|v| !v.is_finite()) {
                return Err(SceneError::NonFiniteGrade { row, col });
            }
        }
        bounds.validate()?;
        check_stats(&stats, &GradeStats::from_grid(&grid))?;

        Ok(Self { grid, rows, cols, bounds, stats })
    }

    /// Row count
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Column count
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Domain rectangle covered
    pub fn bounds(&self) -> &GridBounds {
        &self.bounds
    }

    /// Summary statistics
    pub fn stats(&self) -> &GradeStats {
        &self.stats
    }

    /// Grade at `(row, col)`
    pub fn value(&self, row: usize, col: usize) -> Option<f32> {
        self.grid.get(row)?.get(col).copied()
    }

    /// Width and depth of one cell in domain units
    pub fn cell_size(&self) -> (f32, f32) {
        (
            self.bounds.x_range().span() / self.cols as f32,
            self.bounds.y_range().span() / self.rows as f32,
        )
    }

    /// Domain rectangle `(min_x, min_y, max_x, max_y)` of one cell
    pub fn cell_rect(&self, row: usize, col: usize) -> (f32, f32, f32, f32) {
        let (cell_w, cell_h) = self.cell_size();
        let x0 = self.bounds.min_x + col as f32 * cell_w;
        let y0 = self.bounds.min_y + row as f32 * cell_h;
        (x0, y0, x0 + cell_w, y0 + cell_h)
    }

    /// Cell containing a domain `(x, y)` point, if inside the grid
    pub fn cell_at(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        if !(self.bounds.x_range().contains(x) && self.bounds.y_range().contains(y)) {
            return None;
        }
        let (cell_w, cell_h) = self.cell_size();
        // The max edge belongs to the last cell
        let col = (((x - self.bounds.min_x) / cell_w).floor() as usize).min(self.cols - 1);
        let row = (((y - self.bounds.min_y) / cell_h).floor() as usize).min(self.rows - 1);
        Some((row, col))
    }
}
