//! Test data generators for creating synthetic radar-like grids.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

use ty_common::{GeoGrid, Grid};

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `base + col * 1000 + row`
///
/// This makes it easy to verify that a crop picked the right cells
/// by checking that grid[row][col] == base + col * 1000 + row.
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5, 0.0);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid.get(1, 0), Some(1000.0));
/// assert_eq!(grid.get(0, 1), Some(1.0));
/// ```
pub fn create_test_grid(width: usize, height: usize, base: f32) -> Grid {
    Grid::from_fn(width, height, |col, row| base + (col * 1000 + row) as f32)
}

/// Evenly spaced axis labels: `start, start + step, ...` (`n` values).
pub fn axis_labels(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + i as f64 * step).collect()
}

/// A [`create_test_grid`] grid labeled `0, 1, 2, ...` along both axes.
///
/// With integer labels a window `(a, b)` selects columns/rows `a..=b`.
pub fn create_labeled_grid(width: usize, height: usize, base: f32) -> GeoGrid {
    GeoGrid {
        grid: create_test_grid(width, height, base),
        x: axis_labels(0.0, 1.0, width),
        y: axis_labels(0.0, 1.0, height),
    }
}

/// Creates a terrain-like grid rising from `low` in the top-left corner
/// to `high` in the bottom-right corner.
pub fn create_terrain_grid(width: usize, height: usize, low: f32, high: f32) -> Grid {
    let span = (width + height).saturating_sub(2).max(1) as f32;
    Grid::from_fn(width, height, |col, row| {
        low + (high - low) * (col + row) as f32 / span
    })
}
