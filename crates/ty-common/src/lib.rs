//! Common types and utilities shared across the typhoon dataset crates.

pub mod error;
pub mod grid;
pub mod time;
pub mod window;

pub use error::{GridError, GridResult};
pub use grid::{coordinate_grids, GeoGrid, Grid};
pub use time::{TimeParseError, STEP_MINUTES};
pub use window::SpatialWindow;
