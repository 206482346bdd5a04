//! Readers for gridded fields, scalar tables and static grids.
//!
//! The assembler only sees the [`DataSource`] trait; storage layout and
//! encoding live in the implementations.

mod fs;
mod memory;

pub use fs::{decode_grid_document, encode_grid_document, FsSource};
pub use memory::MemorySource;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ty_common::GeoGrid;

use crate::error::SourceError;
use crate::registry::Event;
use crate::table::ScalarTable;

/// The two interchangeable gridded quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Radar reflectivity (`RAD`).
    #[serde(rename = "RAD")]
    Primary,
    /// Quantitative precipitation estimate (`QPE`).
    #[serde(rename = "QPE")]
    Secondary,
}

impl FieldKind {
    /// Short name used for directories and normalization statistics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "RAD",
            Self::Secondary => "QPE",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for reading the records a sample is assembled from.
///
/// Implementations must be safe to call concurrently; the dataset issues
/// independent reads for different samples in parallel.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Read one field for an event at a frame time, at native resolution.
    async fn read_field(
        &self,
        event: &Event,
        kind: FieldKind,
        time: DateTime<Utc>,
    ) -> Result<GeoGrid, SourceError>;

    /// Read the scalar feature table of an event.
    async fn read_scalar_table(&self, event: &Event) -> Result<ScalarTable, SourceError>;

    /// Read a static grid by name (e.g. terrain height).
    async fn read_static_grid(&self, name: &str) -> Result<GeoGrid, SourceError>;
}
