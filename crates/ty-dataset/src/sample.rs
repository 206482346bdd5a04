//! Assembled training samples.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use ty_common::Grid;

/// Index of the field channel in a frame; coordinate grids follow it.
pub const FIELD_CHANNEL: usize = 0;
/// Index of the column-coordinate channel when grid channels are enabled.
pub const GRID_X_CHANNEL: usize = 1;
/// Index of the row-coordinate channel when grid channels are enabled.
pub const GRID_Y_CHANNEL: usize = 2;

/// One time step: the field plus optional coordinate channels, all the same shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub channels: Vec<Grid>,
}

impl Frame {
    pub fn new(channels: Vec<Grid>) -> Self {
        Self { channels }
    }

    pub fn field(&self) -> &Grid {
        &self.channels[FIELD_CHANNEL]
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// `(width, height)` of the frame.
    pub fn shape(&self) -> (usize, usize) {
        self.field().shape()
    }
}

/// Scalar track/intensity rows accompanying the target frames.
#[derive(Debug, Clone, PartialEq)]
pub struct SideInfo {
    /// Column names, in the order values appear in each row.
    pub columns: Vec<String>,
    /// One row per target frame.
    pub rows: Vec<Vec<f64>>,
}

/// A training sample.
#[derive(Debug, Clone)]
pub struct Sample {
    /// `input_frames` frames of `input_channels` channels each.
    pub inputs: Vec<Frame>,
    /// The last input time step at the radar map shape.
    pub radar_map: Frame,
    /// `target_frames` single-channel grids.
    pub targets: Vec<Grid>,
    /// Scalar features for each target frame.
    pub side_info: SideInfo,
    /// Terrain height scaled to `[0, 1]`, shared by every sample.
    pub height: Arc<Grid>,
    /// Last input frame time, formatted `%Y%m%d%H%M`.
    pub timestamp: String,
    /// Last input frame time.
    pub valid_time: DateTime<Utc>,
}

impl Sample {
    pub fn summary(&self) -> SampleSummary {
        let (in_w, in_h) = self.inputs.first().map(Frame::shape).unwrap_or((0, 0));
        let (out_w, out_h) = self.targets.first().map(Grid::shape).unwrap_or((0, 0));
        let (map_w, map_h) = self.radar_map.shape();

        SampleSummary {
            timestamp: self.timestamp.clone(),
            inputs_shape: [
                self.inputs.len(),
                self.inputs.first().map(Frame::channel_count).unwrap_or(0),
                in_h,
                in_w,
            ],
            radar_map_shape: [self.radar_map.channel_count(), map_h, map_w],
            targets_shape: [self.targets.len(), out_h, out_w],
            side_info_shape: [self.side_info.rows.len(), self.side_info.columns.len()],
            side_info_columns: self.side_info.columns.clone(),
            height_shape: [self.height.height, self.height.width],
            input_range: value_range(self.inputs.iter().map(Frame::field)),
            target_range: value_range(self.targets.iter()),
        }
    }
}

fn value_range<'a>(grids: impl Iterator<Item = &'a Grid>) -> Option<(f32, f32)> {
    grids
        .filter_map(Grid::min_max)
        .reduce(|(lo, hi), (l, h)| (lo.min(l), hi.max(h)))
}

/// Shapes (in frames × channels × rows × columns order) and value ranges
/// of a sample, for logs and inspection output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleSummary {
    pub timestamp: String,
    pub inputs_shape: [usize; 4],
    pub radar_map_shape: [usize; 3],
    pub targets_shape: [usize; 3],
    pub side_info_shape: [usize; 2],
    pub side_info_columns: Vec<String>,
    pub height_shape: [usize; 2],
    pub input_range: Option<(f32, f32)>,
    pub target_range: Option<(f32, f32)>,
}
