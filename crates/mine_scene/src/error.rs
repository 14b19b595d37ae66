//! Scene-level error types

use thiserror::Error;

/// Errors raised while building scene state from external data
///
/// Rendering passes themselves never fail; these errors come from
/// constructing transformers and ingesting snapshots.
#[derive(Error, Debug)]
pub enum SceneError {
    /// A bounding box axis has `min >= max` (or a non-finite bound)
    #[error("invalid {space} bounds on axis {axis}: min {min} must be below max {max}")]
    InvalidBounds {
        /// Which coordinate space the bounds belong to
        space: &'static str,
        /// Axis name
        axis: &'static str,
        /// Lower bound
        min: f32,
        /// Upper bound
        max: f32,
    },

    /// Grid row/column counts disagree with the grid contents
    #[error("grade grid dimensions mismatch: expected {expected_rows}x{expected_cols}, found {detail}")]
    GridDimensionMismatch {
        /// Declared row count
        expected_rows: usize,
        /// Declared column count
        expected_cols: usize,
        /// Description of what was actually found
        detail: String,
    },

    /// A grid needs at least one row and column
    #[error("grade grid is empty")]
    EmptyGrid,

    /// A grade value is NaN or infinite
    #[error("grade value at ({row}, {col}) is not finite")]
    NonFiniteGrade {
        /// Row index
        row: usize,
        /// Column index
        col: usize,
    },

    /// Supplied grade statistics contradict the grid values
    #[error("grade statistics disagree with the grid: {0}")]
    InconsistentGradeStats(String),

    /// A snapshot message could not be decoded
    #[error("malformed snapshot message: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result alias for scene operations
pub type SceneResult<T> = Result<T, SceneError>;
