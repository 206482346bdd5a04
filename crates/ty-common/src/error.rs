//! Error types for grid geometry.

use thiserror::Error;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Errors raised while building, cropping or reshaping grids.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("grid data has {actual} values, expected {width}x{height} = {expected}")]
    DataLength {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("{axis} axis has {actual} labels, grid has {expected}")]
    AxisLength {
        axis: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("grid shape {actual:?} does not match expected shape {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("window selects no {axis} labels in range [{min}, {max}]")]
    EmptySelection {
        axis: &'static str,
        min: f64,
        max: f64,
    },

    #[error("invalid window: {0}")]
    InvalidWindow(String),
}
