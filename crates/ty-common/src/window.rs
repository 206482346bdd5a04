//! Rectangular crop windows in grid label coordinates.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// A crop window expressed in the coordinate labels of a gridded field.
///
/// `x` and `y` are inclusive label ranges (longitude/latitude for the radar
/// mosaics). `shape` is `(width, height)` and is what the crop must yield;
/// a mismatch means the window and the source grid disagree on resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialWindow {
    pub x: (f64, f64),
    pub y: (f64, f64),
    pub shape: (usize, usize),
}

impl SpatialWindow {
    pub fn new(x: (f64, f64), y: (f64, f64), shape: (usize, usize)) -> Self {
        Self { x, y, shape }
    }

    pub fn width(&self) -> usize {
        self.shape.0
    }

    pub fn height(&self) -> usize {
        self.shape.1
    }

    /// Check that bounds are finite and the target shape is non-empty.
    pub fn validate(&self) -> GridResult<()> {
        for (axis, (lo, hi)) in [("x", self.x), ("y", self.y)] {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(GridError::InvalidWindow(format!(
                    "{} bounds must be finite, got [{}, {}]",
                    axis, lo, hi
                )));
            }
        }

        if self.shape.0 == 0 || self.shape.1 == 0 {
            return Err(GridError::InvalidWindow(format!(
                "shape must be non-empty, got {:?}",
                self.shape
            )));
        }

        Ok(())
    }
}
