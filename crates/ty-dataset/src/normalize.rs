//! Min-max normalization of assembled samples.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ty_common::Grid;

use crate::config::DatasetConfig;
use crate::error::{DatasetError, Result};
use crate::sample::{Frame, Sample, FIELD_CHANNEL, GRID_X_CHANNEL, GRID_Y_CHANNEL};
use crate::source::FieldKind;

/// Observed value range of a field or column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Fail unless both ends are finite and `max > min`.
    pub fn validate(&self, name: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(DatasetError::invalid_argument(format!(
                "normalization range for {} is not finite: [{}, {}]",
                name, self.min, self.max
            )));
        }
        if self.max <= self.min {
            return Err(DatasetError::invalid_argument(format!(
                "normalization range for {} is degenerate: [{}, {}]",
                name, self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn scale(&self, v: f64) -> f64 {
        (v - self.min) / (self.max - self.min)
    }

    pub fn unscale(&self, v: f64) -> f64 {
        v * (self.max - self.min) + self.min
    }

    fn scale_grid(&self, grid: &mut Grid) {
        let range = *self;
        grid.map_in_place(|v| range.scale(v as f64) as f32);
    }

    fn unscale_grid(&self, grid: &mut Grid) {
        let range = *self;
        grid.map_in_place(|v| range.unscale(v as f64) as f32);
    }
}

/// Normalization statistics: field ranges keyed by field name (`RAD`,
/// `QPE`) and side-info column ranges keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizationStats {
    pub fields: BTreeMap<String, ValueRange>,
    #[serde(default)]
    pub columns: BTreeMap<String, ValueRange>,
}

impl NormalizationStats {
    pub fn with_field(mut self, kind: FieldKind, range: ValueRange) -> Self {
        self.fields.insert(kind.as_str().to_string(), range);
        self
    }

    pub fn with_column(mut self, name: impl Into<String>, range: ValueRange) -> Self {
        self.columns.insert(name.into(), range);
        self
    }

    fn field(&self, kind: FieldKind) -> Result<ValueRange> {
        let range = self.fields.get(kind.as_str()).copied().ok_or_else(|| {
            DatasetError::invalid_argument(format!("no normalization stats for field {}", kind))
        })?;
        range.validate(kind.as_str())?;
        Ok(range)
    }
}

/// Rescales samples with fixed statistics.
///
/// Inputs and the radar map field channel use the primary field range,
/// coordinate channels are divided by the frame extent, targets use the
/// target field range when `normalize_target` is set, and each side-info
/// column uses the range stored under its name. Terrain is left alone.
#[derive(Debug, Clone)]
pub struct Normalizer {
    primary: ValueRange,
    target: Option<ValueRange>,
    columns: BTreeMap<String, ValueRange>,
    input_channels: usize,
}

impl Normalizer {
    /// Column ranges are checked only for named `side_info_columns`;
    /// otherwise each column is checked the first time a sample uses it.
    pub fn new(stats: &NormalizationStats, config: &DatasetConfig) -> Result<Self> {
        config.validate()?;

        let primary = stats.field(FieldKind::Primary)?;
        let target = if config.normalize_target {
            Some(stats.field(config.target_field())?)
        } else {
            None
        };

        if let Some(names) = &config.side_info_columns {
            for name in names {
                column_range(&stats.columns, name)?;
            }
        }

        Ok(Self {
            primary,
            target,
            columns: stats.columns.clone(),
            input_channels: config.input_channels,
        })
    }

    /// Normalize a sample, consuming it.
    pub fn normalize(&self, mut sample: Sample) -> Result<Sample> {
        let ranges = self.column_ranges(&sample.side_info.columns)?;

        for frame in sample.inputs.iter_mut() {
            self.scale_frame(frame)?;
        }
        self.scale_frame(&mut sample.radar_map)?;

        if let Some(range) = &self.target {
            for grid in sample.targets.iter_mut() {
                range.scale_grid(grid);
            }
        }

        for row in sample.side_info.rows.iter_mut() {
            for (v, range) in row.iter_mut().zip(&ranges) {
                *v = range.scale(*v);
            }
        }

        Ok(sample)
    }

    /// Undo [`normalize`](Self::normalize).
    pub fn denormalize(&self, mut sample: Sample) -> Result<Sample> {
        let ranges = self.column_ranges(&sample.side_info.columns)?;

        for frame in sample.inputs.iter_mut() {
            self.unscale_frame(frame)?;
        }
        self.unscale_frame(&mut sample.radar_map)?;

        if let Some(range) = &self.target {
            for grid in sample.targets.iter_mut() {
                range.unscale_grid(grid);
            }
        }

        for row in sample.side_info.rows.iter_mut() {
            for (v, range) in row.iter_mut().zip(&ranges) {
                *v = range.unscale(*v);
            }
        }

        Ok(sample)
    }

    fn column_ranges(&self, columns: &[String]) -> Result<Vec<ValueRange>> {
        columns
            .iter()
            .map(|name| column_range(&self.columns, name))
            .collect()
    }

    fn check_channels(&self, frame: &Frame) -> Result<()> {
        if frame.channel_count() != self.input_channels {
            return Err(DatasetError::invalid_argument(format!(
                "frame has {} channels, expected {}",
                frame.channel_count(),
                self.input_channels
            )));
        }
        Ok(())
    }

    fn scale_frame(&self, frame: &mut Frame) -> Result<()> {
        self.check_channels(frame)?;
        let (width, height) = frame.shape();

        self.primary.scale_grid(&mut frame.channels[FIELD_CHANNEL]);
        if self.input_channels > GRID_Y_CHANNEL {
            let (w, h) = (width as f32, height as f32);
            frame.channels[GRID_X_CHANNEL].map_in_place(|v| v / w);
            frame.channels[GRID_Y_CHANNEL].map_in_place(|v| v / h);
        }
        Ok(())
    }

    fn unscale_frame(&self, frame: &mut Frame) -> Result<()> {
        self.check_channels(frame)?;
        let (width, height) = frame.shape();

        self.primary.unscale_grid(&mut frame.channels[FIELD_CHANNEL]);
        if self.input_channels > GRID_Y_CHANNEL {
            let (w, h) = (width as f32, height as f32);
            frame.channels[GRID_X_CHANNEL].map_in_place(|v| v * w);
            frame.channels[GRID_Y_CHANNEL].map_in_place(|v| v * h);
        }
        Ok(())
    }
}

fn column_range(columns: &BTreeMap<String, ValueRange>, name: &str) -> Result<ValueRange> {
    let range = columns.get(name).copied().ok_or_else(|| {
        DatasetError::invalid_argument(format!(
            "no normalization stats for side-info column {:?}",
            name
        ))
    })?;
    range.validate(name)?;
    Ok(range)
}
