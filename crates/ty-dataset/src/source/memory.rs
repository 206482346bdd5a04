//! In-memory data source.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ty_common::GeoGrid;

use super::{DataSource, FieldKind};
use crate::error::SourceError;
use crate::registry::Event;
use crate::table::ScalarTable;

type FieldKey = (String, FieldKind, DateTime<Utc>);

/// A [`DataSource`] backed by hash maps.
///
/// Records are keyed by [`Event::storage_key`]. Read counters make it easy
/// to check how often each kind of record was fetched.
#[derive(Debug, Default)]
pub struct MemorySource {
    fields: HashMap<FieldKey, GeoGrid>,
    tables: HashMap<String, ScalarTable>,
    statics: HashMap<String, GeoGrid>,
    field_reads: AtomicU64,
    static_reads: AtomicU64,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_field(
        &mut self,
        event: &Event,
        kind: FieldKind,
        time: DateTime<Utc>,
        grid: GeoGrid,
    ) {
        self.fields.insert((event.storage_key(), kind, time), grid);
    }

    pub fn insert_table(&mut self, event: &Event, table: ScalarTable) {
        self.tables.insert(event.storage_key(), table);
    }

    pub fn insert_static(&mut self, name: impl Into<String>, grid: GeoGrid) {
        self.statics.insert(name.into(), grid);
    }

    /// Remove a field, returning it if present.
    pub fn remove_field(
        &mut self,
        event: &Event,
        kind: FieldKind,
        time: DateTime<Utc>,
    ) -> Option<GeoGrid> {
        self.fields.remove(&(event.storage_key(), kind, time))
    }

    /// Number of field reads served so far (hits and misses).
    pub fn field_reads(&self) -> u64 {
        self.field_reads.load(Ordering::Relaxed)
    }

    /// Number of static grid reads served so far (hits and misses).
    pub fn static_reads(&self) -> u64 {
        self.static_reads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn read_field(
        &self,
        event: &Event,
        kind: FieldKind,
        time: DateTime<Utc>,
    ) -> Result<GeoGrid, SourceError> {
        self.field_reads.fetch_add(1, Ordering::Relaxed);
        self.fields
            .get(&(event.storage_key(), kind, time))
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("no {} field stored", kind)))
    }

    async fn read_scalar_table(&self, event: &Event) -> Result<ScalarTable, SourceError> {
        self.tables
            .get(&event.storage_key())
            .cloned()
            .ok_or_else(|| SourceError::NotFound("no scalar table stored".to_string()))
    }

    async fn read_static_grid(&self, name: &str) -> Result<GeoGrid, SourceError> {
        self.static_reads.fetch_add(1, Ordering::Relaxed);
        self.statics
            .get(name)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("no static grid {:?} stored", name)))
    }
}
