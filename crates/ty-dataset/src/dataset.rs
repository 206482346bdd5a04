//! Indexed access to normalized samples for one side of the split.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

use crate::assembler::SampleAssembler;
use crate::config::DatasetConfig;
use crate::error::{DatasetError, Result};
use crate::index::{IndexMap, Location};
use crate::normalize::Normalizer;
use crate::registry::{EventRegistry, EventSelection, SplitRequest};
use crate::sample::Sample;
use crate::source::{DataSource, FsSource};

/// A fixed-length, randomly addressable collection of samples.
pub struct TyDataset<S> {
    selection: EventSelection,
    index: IndexMap,
    assembler: SampleAssembler<S>,
    normalizer: Option<Normalizer>,
}

impl TyDataset<FsSource> {
    /// Open a dataset over the filesystem layout named in the config.
    pub fn open(config: &DatasetConfig, request: &SplitRequest) -> Result<Self> {
        let registry = EventRegistry::from_csv_path(&config.source.event_list)?;
        let source = FsSource::new(config.source.clone());
        Self::new(config, &registry, request, Arc::new(source))
    }
}

impl<S: DataSource> TyDataset<S> {
    /// Build the selection, index, assembler and (if statistics are
    /// configured) the normalizer.
    pub fn new(
        config: &DatasetConfig,
        registry: &EventRegistry,
        request: &SplitRequest,
        source: Arc<S>,
    ) -> Result<Self> {
        config.validate()?;

        let selection = registry.select(request)?;
        let index = IndexMap::build(&selection, config.window_length())?;
        let assembler = SampleAssembler::new(source, config)?;
        let normalizer = config
            .normalization
            .as_ref()
            .map(|stats| Normalizer::new(stats, config))
            .transpose()?;

        info!(
            mode = %selection.mode(),
            events = selection.len(),
            samples = index.len(),
            normalized = normalizer.is_some(),
            "Opened typhoon dataset"
        );

        Ok(Self {
            selection,
            index,
            assembler,
            normalizer,
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn selection(&self) -> &EventSelection {
        &self.selection
    }

    pub fn index(&self) -> &IndexMap {
        &self.index
    }

    pub fn assembler(&self) -> &SampleAssembler<S> {
        &self.assembler
    }

    /// Event and local offset of a sample.
    pub fn locate<I>(&self, idx: I) -> Result<Location<'_>>
    where
        I: TryInto<usize> + TryInto<i128> + Copy,
    {
        self.index.resolve(idx)
    }

    /// Fetch one sample, normalized if statistics are configured.
    pub async fn get<I>(&self, idx: I) -> Result<Sample>
    where
        I: TryInto<usize> + TryInto<i128> + Copy,
    {
        let location = self.index.resolve(idx)?;
        debug!(
            event = %location.event.name,
            local_offset = location.local_offset,
            "Resolved sample"
        );

        let sample = self
            .assembler
            .assemble(location.event, location.local_offset)
            .await?;

        match &self.normalizer {
            Some(normalizer) => normalizer.normalize(sample),
            None => Ok(sample),
        }
    }

    /// Fetch several samples with at most `concurrency` in flight.
    ///
    /// Results come back in request order; the first failure aborts the batch.
    pub async fn get_many(&self, indices: &[usize], concurrency: usize) -> Result<Vec<Sample>> {
        if concurrency == 0 {
            return Err(DatasetError::invalid_argument("concurrency must be > 0"));
        }

        stream::iter(indices.iter().copied())
            .map(|idx| self.get(idx))
            .buffered(concurrency)
            .try_collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputMapWindow;
    use crate::registry::Event;
    use crate::source::MemorySource;
    use chrono::{Duration, TimeZone, Utc};
    use ty_common::SpatialWindow;

    fn registry() -> EventRegistry {
        let a = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2020, 2, 1, 0, 0, 0).unwrap();
        EventRegistry::new(vec![
            Event::new("A", a, a + Duration::hours(2)),
            Event::new("B", b, b + Duration::hours(1)),
        ])
        .unwrap()
    }

    fn config() -> DatasetConfig {
        DatasetConfig {
            input_frames: 3,
            target_frames: 2,
            input_window: SpatialWindow::new((0.0, 1.0), (0.0, 1.0), (2, 2)),
            forecast_window: SpatialWindow::new((0.0, 1.0), (0.0, 1.0), (2, 2)),
            radar_map: OutputMapWindow::new((2, 2)),
            ..DatasetConfig::default()
        }
    }

    #[test]
    fn test_len_and_locate() {
        let request = SplitRequest::train().with_train_count(2);
        let dataset =
            TyDataset::new(&config(), &registry(), &request, Arc::new(MemorySource::new()))
                .unwrap();

        assert_eq!(dataset.len(), 12);
        assert!(!dataset.is_empty());
        assert!(dataset.locate(12).is_err());
        assert!(dataset.locate(-1).is_err());
    }

    #[test]
    fn test_test_split_empty() {
        let request = SplitRequest::test().with_train_count(2);
        let dataset =
            TyDataset::new(&config(), &registry(), &request, Arc::new(MemorySource::new()))
                .unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = config();
        config.input_with_grid = true;
        let result = TyDataset::new(
            &config,
            &registry(),
            &SplitRequest::train(),
            Arc::new(MemorySource::new()),
        );
        assert!(matches!(result, Err(DatasetError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_get_many_zero_concurrency() {
        let request = SplitRequest::train().with_train_count(2);
        let dataset =
            TyDataset::new(&config(), &registry(), &request, Arc::new(MemorySource::new()))
                .unwrap();
        assert!(dataset.get_many(&[0], 0).await.is_err());
    }
}
