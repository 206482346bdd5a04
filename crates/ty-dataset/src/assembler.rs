//! Sample assembly from per-frame fields, scalar tables and terrain.
//!
//! # Frame layout
//!
//! ```text
//! offset ──► first_input                       target_start
//!            │                                  │
//!            ▼                                  ▼
//!            [ in 0 | in 1 | ... | in n-1 ]     [ tg 0 | ... | tg m-1 ]
//!                                   │
//!                                   └─► radar map, timestamp
//! ```
//!
//! All reads for a sample go through the [`DataSource`]. Nothing is kept
//! between calls except the terrain grid and the coordinate channels,
//! which are identical for every sample.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use ty_common::time::{format_label, steps};
use ty_common::{coordinate_grids, GeoGrid, Grid, SpatialWindow};

use crate::config::{DatasetConfig, OutputMapWindow};
use crate::error::{DatasetError, RecordId, Result, SourceError};
use crate::registry::Event;
use crate::sample::{Frame, Sample, SideInfo};
use crate::source::{DataSource, FieldKind};
use crate::table::ColumnSelection;

/// Builds samples for (event, local offset) pairs.
pub struct SampleAssembler<S> {
    source: Arc<S>,
    input_frames: usize,
    target_frames: usize,
    input_window: SpatialWindow,
    forecast_window: SpatialWindow,
    radar_map: OutputMapWindow,
    target_field: FieldKind,
    columns: ColumnSelection,
    terrain_name: String,
    /// Column/row channels for input frames and for the radar map.
    grid_channels: Option<((Grid, Grid), (Grid, Grid))>,
    terrain: OnceCell<Arc<Grid>>,
}

impl<S: DataSource> SampleAssembler<S> {
    /// Create an assembler, validating the configuration.
    pub fn new(source: Arc<S>, config: &DatasetConfig) -> Result<Self> {
        config.validate()?;

        let grid_channels = config.input_with_grid.then(|| {
            (
                coordinate_grids(config.input_window.width(), config.input_window.height()),
                coordinate_grids(config.radar_map.width(), config.radar_map.height()),
            )
        });

        Ok(Self {
            source,
            input_frames: config.input_frames,
            target_frames: config.target_frames,
            input_window: config.input_window,
            forecast_window: config.forecast_window,
            radar_map: config.radar_map,
            target_field: config.target_field(),
            columns: config.column_selection(),
            terrain_name: config.terrain_grid.clone(),
            grid_channels,
            terrain: OnceCell::new(),
        })
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Assemble the sample whose first input frame is `local_offset` steps
    /// after the event's issue time.
    ///
    /// Either every read succeeds and a complete sample is returned, or the
    /// first failure is returned with the identity of the failing record.
    pub async fn assemble(&self, event: &Event, local_offset: usize) -> Result<Sample> {
        let first_input = event.issue_time + steps(local_offset as i64);
        let last_input = first_input + steps(self.input_frames as i64 - 1);
        let target_start = first_input + steps(self.input_frames as i64);

        debug!(
            event = %event.name,
            local_offset,
            first_input = %format_label(&first_input),
            "Assembling sample"
        );

        let inputs = try_join_all(
            (0..self.input_frames).map(|j| self.input_frame(event, first_input + steps(j as i64))),
        );
        let targets = try_join_all(
            (0..self.target_frames).map(|j| self.target_frame(event, target_start + steps(j as i64))),
        );
        let (inputs, radar_map, targets, side_info, height) = futures::try_join!(
            inputs,
            self.radar_map_frame(event, last_input),
            targets,
            self.side_info(event, target_start),
            self.terrain(),
        )?;

        Ok(Sample {
            inputs,
            radar_map,
            targets,
            side_info,
            height,
            timestamp: format_label(&last_input),
            valid_time: last_input,
        })
    }

    /// Terrain height over the input window, scaled to `[0, 1]`.
    ///
    /// Read from the source on first use only.
    pub async fn terrain(&self) -> Result<Arc<Grid>> {
        self.terrain
            .get_or_try_init(|| self.load_terrain())
            .await
            .cloned()
    }

    async fn load_terrain(&self) -> Result<Arc<Grid>> {
        let record = RecordId::new(self.terrain_name.as_str());
        let geo = self
            .source
            .read_static_grid(&self.terrain_name)
            .await
            .map_err(|e| e.at(record.clone()))?;
        let grid = geo
            .crop(&self.input_window)
            .map_err(|e| SourceError::from(e).at(record))?;

        let (min, max) = grid.min_max().unwrap_or((0.0, 0.0));
        if max <= min {
            return Err(DatasetError::invalid_argument(format!(
                "terrain grid {:?} is flat over the input window",
                self.terrain_name
            )));
        }

        info!(grid = %self.terrain_name, min, max, "Loaded terrain grid");
        let span = max - min;
        Ok(Arc::new(grid.map(|v| (v - min) / span)))
    }

    async fn read_field(
        &self,
        event: &Event,
        kind: FieldKind,
        time: DateTime<Utc>,
    ) -> Result<(GeoGrid, RecordId)> {
        let record = RecordId::new(kind.as_str())
            .for_event(event.storage_key())
            .at(format_label(&time));
        let geo = self
            .source
            .read_field(event, kind, time)
            .await
            .map_err(|e| e.at(record.clone()))?;
        Ok((geo, record))
    }

    async fn input_frame(&self, event: &Event, time: DateTime<Utc>) -> Result<Frame> {
        let (geo, record) = self.read_field(event, FieldKind::Primary, time).await?;
        let field = geo
            .crop(&self.input_window)
            .map_err(|e| SourceError::from(e).at(record))?;

        let mut channels = vec![field];
        if let Some(((gx, gy), _)) = &self.grid_channels {
            channels.push(gx.clone());
            channels.push(gy.clone());
        }
        Ok(Frame::new(channels))
    }

    async fn radar_map_frame(&self, event: &Event, time: DateTime<Utc>) -> Result<Frame> {
        let (geo, record) = self.read_field(event, FieldKind::Primary, time).await?;
        let field = self
            .radar_map
            .extract(&geo)
            .map_err(|e| SourceError::from(e).at(record))?;

        let mut channels = vec![field];
        if let Some((_, (gx, gy))) = &self.grid_channels {
            channels.push(gx.clone());
            channels.push(gy.clone());
        }
        Ok(Frame::new(channels))
    }

    async fn target_frame(&self, event: &Event, time: DateTime<Utc>) -> Result<Grid> {
        let (geo, record) = self.read_field(event, self.target_field, time).await?;
        geo.crop(&self.forecast_window)
            .map_err(|e| SourceError::from(e).at(record))
    }

    async fn side_info(&self, event: &Event, target_start: DateTime<Utc>) -> Result<SideInfo> {
        let target_end = target_start + steps(self.target_frames as i64 - 1);
        let record = RecordId::new("scalar table")
            .for_event(event.storage_key())
            .at(format!(
                "{}-{}",
                format_label(&target_start),
                format_label(&target_end)
            ));

        let table = self
            .source
            .read_scalar_table(event)
            .await
            .map_err(|e| e.at(record.clone()))?;
        let selected = self
            .columns
            .resolve(table.columns())
            .map_err(|e| e.at(record.clone()))?;

        let rows = table.select(target_start, target_end, &selected);
        if rows.len() != self.target_frames {
            return Err(SourceError::malformed(format!(
                "expected {} rows in the target window, found {}",
                self.target_frames,
                rows.len()
            ))
            .at(record));
        }

        Ok(SideInfo {
            columns: selected
                .iter()
                .map(|&i| table.columns()[i].clone())
                .collect(),
            rows,
        })
    }
}
