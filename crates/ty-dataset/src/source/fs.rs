//! Filesystem data source.
//!
//! Layout under the configured roots:
//!
//! ```text
//! {field_root}/RAD/{year}.{name}.{YYYYmmddHHMM}.json[.gz]
//! {field_root}/QPE/{year}.{name}.{YYYYmmddHHMM}.json[.gz]
//! {scalar_root}/{year}.{name}.csv
//! {static_root}/{grid}.json[.gz]
//! ```
//!
//! Grid documents are JSON objects with `x` and `y` label arrays and a
//! row-major `values` matrix; `null` cells decode as NaN.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use ty_common::{time::format_label, GeoGrid, Grid};

use super::{DataSource, FieldKind};
use crate::config::{Compression, SourceConfig};
use crate::error::SourceError;
use crate::registry::Event;
use crate::table::ScalarTable;

#[derive(Debug, Serialize, Deserialize)]
struct GridDocument {
    x: Vec<f64>,
    y: Vec<f64>,
    values: Vec<Vec<Option<f32>>>,
}

/// Decode a (possibly gzip-compressed) grid document.
pub fn decode_grid_document(bytes: &[u8], compression: Compression) -> Result<GeoGrid, SourceError> {
    let doc: GridDocument = match compression {
        Compression::None => serde_json::from_slice(bytes)?,
        Compression::Gzip => {
            let mut json = Vec::new();
            GzDecoder::new(bytes).read_to_end(&mut json)?;
            serde_json::from_slice(&json)?
        }
    };

    let width = doc.x.len();
    let mut data = Vec::with_capacity(width * doc.y.len());
    for (row, values) in doc.values.iter().enumerate() {
        if values.len() != width {
            return Err(SourceError::malformed(format!(
                "row {} has {} values, x axis has {}",
                row,
                values.len(),
                width
            )));
        }
        data.extend(values.iter().map(|v| v.unwrap_or(f32::NAN)));
    }

    let grid = Grid::new(data, width, doc.values.len())?;
    Ok(GeoGrid::new(grid, doc.x, doc.y)?)
}

/// Encode a grid document, the inverse of [`decode_grid_document`].
pub fn encode_grid_document(geo: &GeoGrid, compression: Compression) -> Result<Vec<u8>, SourceError> {
    let values = geo
        .grid
        .data
        .chunks(geo.grid.width.max(1))
        .take(geo.grid.height)
        .map(|row| {
            row.iter()
                .map(|&v| if v.is_nan() { None } else { Some(v) })
                .collect()
        })
        .collect();
    let doc = GridDocument {
        x: geo.x.clone(),
        y: geo.y.clone(),
        values,
    };
    let json = serde_json::to_vec(&doc)?;

    match compression {
        Compression::None => Ok(json),
        Compression::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(&json)?;
            Ok(encoder.finish()?)
        }
    }
}

/// A [`DataSource`] reading the directory layout described above.
#[derive(Debug, Clone)]
pub struct FsSource {
    config: SourceConfig,
}

impl FsSource {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn field_path(&self, event: &Event, kind: FieldKind, time: DateTime<Utc>) -> PathBuf {
        self.config.field_root.join(kind.as_str()).join(format!(
            "{}.{}.{}",
            event.storage_key(),
            format_label(&time),
            self.config.compression.extension()
        ))
    }

    pub fn table_path(&self, event: &Event) -> PathBuf {
        self.config
            .scalar_root
            .join(format!("{}.csv", event.storage_key()))
    }

    pub fn static_path(&self, name: &str) -> PathBuf {
        self.config
            .static_root
            .join(format!("{}.{}", name, self.config.compression.extension()))
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn read_grid(&self, path: &Path) -> Result<GeoGrid, SourceError> {
        let bytes = tokio::fs::read(path).await?;
        decode_grid_document(&bytes, self.config.compression)
    }
}

#[async_trait]
impl DataSource for FsSource {
    async fn read_field(
        &self,
        event: &Event,
        kind: FieldKind,
        time: DateTime<Utc>,
    ) -> Result<GeoGrid, SourceError> {
        self.read_grid(&self.field_path(event, kind, time)).await
    }

    async fn read_scalar_table(&self, event: &Event) -> Result<ScalarTable, SourceError> {
        let path = self.table_path(event);
        let bytes = tokio::fs::read(&path).await?;
        ScalarTable::from_csv_reader(bytes.as_slice())
    }

    async fn read_static_grid(&self, name: &str) -> Result<GeoGrid, SourceError> {
        self.read_grid(&self.static_path(name)).await
    }
}
