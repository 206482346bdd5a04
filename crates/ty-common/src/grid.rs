//! Two-dimensional grids for radar, precipitation and terrain fields.

use crate::error::{GridError, GridResult};
use crate::window::SpatialWindow;

/// Labels within this distance of a window edge are treated as inside it.
const LABEL_TOLERANCE: f64 = 1e-6;

/// A dense row-major grid of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// The grid values (row-major order, top-to-bottom).
    pub data: Vec<f32>,
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
}

impl Grid {
    /// Create a grid, checking that `data` holds exactly `width * height` values.
    pub fn new(data: Vec<f32>, width: usize, height: usize) -> GridResult<Self> {
        let expected = width * height;
        if data.len() != expected {
            return Err(GridError::DataLength {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Create a grid with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Create a grid by evaluating `f(col, row)` for every cell.
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                data.push(f(col, row));
            }
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Get the value at a specific grid coordinate.
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// `(width, height)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Minimum and maximum over all non-NaN values.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Apply `f` to every value, returning a new grid of the same shape.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            data: self.data.iter().map(|&v| f(v)).collect(),
            width: self.width,
            height: self.height,
        }
    }

    /// Apply `f` to every value in place.
    pub fn map_in_place(&mut self, f: impl Fn(f32) -> f32) {
        for v in &mut self.data {
            *v = f(*v);
        }
    }

    /// Fail unless the grid has the given `(width, height)`.
    pub fn expect_shape(&self, shape: (usize, usize)) -> GridResult<()> {
        if self.shape() != shape {
            return Err(GridError::ShapeMismatch {
                expected: shape,
                actual: self.shape(),
            });
        }
        Ok(())
    }
}

/// A grid with coordinate labels along each axis.
///
/// `x` labels the columns and `y` labels the rows, in storage order.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoGrid {
    pub grid: Grid,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl GeoGrid {
    pub fn new(grid: Grid, x: Vec<f64>, y: Vec<f64>) -> GridResult<Self> {
        if x.len() != grid.width {
            return Err(GridError::AxisLength {
                axis: "x",
                expected: grid.width,
                actual: x.len(),
            });
        }
        if y.len() != grid.height {
            return Err(GridError::AxisLength {
                axis: "y",
                expected: grid.height,
                actual: y.len(),
            });
        }
        Ok(Self { grid, x, y })
    }

    /// Select the rows and columns whose labels fall inside the window
    /// (inclusive on both ends) and check the result has the window's shape.
    pub fn crop(&self, window: &SpatialWindow) -> GridResult<Grid> {
        let cols = select_labels(&self.x, window.x, "x")?;
        let rows = select_labels(&self.y, window.y, "y")?;

        let mut data = Vec::with_capacity(cols.len() * rows.len());
        for &row in &rows {
            let offset = row * self.grid.width;
            data.extend(cols.iter().map(|&col| self.grid.data[offset + col]));
        }

        let cropped = Grid::new(data, cols.len(), rows.len())?;
        cropped.expect_shape(window.shape)?;
        Ok(cropped)
    }

    /// Take the whole grid, checking it already has the given shape.
    pub fn whole(&self, shape: (usize, usize)) -> GridResult<Grid> {
        self.grid.expect_shape(shape)?;
        Ok(self.grid.clone())
    }
}

fn select_labels(labels: &[f64], bounds: (f64, f64), axis: &'static str) -> GridResult<Vec<usize>> {
    let (min, max) = if bounds.0 <= bounds.1 {
        bounds
    } else {
        (bounds.1, bounds.0)
    };

    let selected: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v >= min - LABEL_TOLERANCE && v <= max + LABEL_TOLERANCE)
        .map(|(i, _)| i)
        .collect();

    if selected.is_empty() {
        return Err(GridError::EmptySelection { axis, min, max });
    }
    Ok(selected)
}

/// Column-index and row-index grids for the given shape.
///
/// The first grid holds `col` at every cell, the second `row`.
pub fn coordinate_grids(width: usize, height: usize) -> (Grid, Grid) {
    (
        Grid::from_fn(width, height, |col, _| col as f32),
        Grid::from_fn(width, height, |_, row| row as f32),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled(width: usize, height: usize) -> GeoGrid {
        let grid = Grid::from_fn(width, height, |col, row| (col * 1000 + row) as f32);
        let x = (0..width).map(|i| 120.0 + i as f64 * 0.5).collect();
        let y = (0..height).map(|j| 25.0 - j as f64 * 0.5).collect();
        GeoGrid::new(grid, x, y).unwrap()
    }

    #[test]
    fn test_grid_new_checks_length() {
        assert!(Grid::new(vec![0.0; 6], 3, 2).is_ok());
        let err = Grid::new(vec![0.0; 5], 3, 2).unwrap_err();
        assert!(matches!(err, GridError::DataLength { expected: 6, actual: 5, .. }));
    }

    #[test]
    fn test_grid_get() {
        let grid = Grid::from_fn(3, 3, |col, row| (row * 3 + col) as f32);
        assert_eq!(grid.get(0, 0), Some(0.0));
        assert_eq!(grid.get(2, 2), Some(8.0));
        assert_eq!(grid.get(1, 1), Some(4.0));
        assert_eq!(grid.get(3, 0), None);
    }

    #[test]
    fn test_min_max_skips_nan() {
        let grid = Grid::new(vec![3.0, f32::NAN, -1.0, 7.5], 2, 2).unwrap();
        assert_eq!(grid.min_max(), Some((-1.0, 7.5)));
        assert_eq!(Grid::new(vec![], 0, 0).unwrap().min_max(), None);
    }

    #[test]
    fn test_crop_selects_inclusive_labels() {
        let geo = labeled(10, 8);
        // x labels 121.0..=122.0 are columns 2..=4, y labels 24.0..=23.0 are rows 2..=4
        let window = SpatialWindow::new((121.0, 122.0), (23.0, 24.0), (3, 3));
        let cropped = geo.crop(&window).unwrap();

        assert_eq!(cropped.shape(), (3, 3));
        assert_eq!(cropped.get(0, 0), Some(2002.0));
        assert_eq!(cropped.get(2, 2), Some(4004.0));
    }

    #[test]
    fn test_crop_shape_mismatch() {
        let geo = labeled(10, 8);
        let window = SpatialWindow::new((121.0, 122.0), (23.0, 24.0), (4, 3));
        let err = geo.crop(&window).unwrap_err();
        assert!(matches!(err, GridError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_crop_outside_grid() {
        let geo = labeled(10, 8);
        let window = SpatialWindow::new((0.0, 1.0), (23.0, 24.0), (3, 3));
        assert!(matches!(
            geo.crop(&window),
            Err(GridError::EmptySelection { axis: "x", .. })
        ));
    }

    #[test]
    fn test_geo_grid_axis_length() {
        let grid = Grid::filled(3, 2, 0.0);
        assert!(GeoGrid::new(grid.clone(), vec![0.0, 1.0, 2.0], vec![0.0, 1.0]).is_ok());
        assert!(GeoGrid::new(grid, vec![0.0, 1.0], vec![0.0, 1.0]).is_err());
    }

    #[test]
    fn test_coordinate_grids() {
        let (gx, gy) = coordinate_grids(4, 3);
        assert_eq!(gx.shape(), (4, 3));
        assert_eq!(gx.get(3, 2), Some(3.0));
        assert_eq!(gy.get(3, 2), Some(2.0));
        assert_eq!(gy.get(0, 1), Some(1.0));
    }
}
