//! Typhoon radar dataset
//!
//! Turns a list of typhoon events and per-event radar, precipitation and
//! track records into fixed-shape training samples for sequence models.
//! Every sample is addressed by a single integer:
//!
//! - **Deterministic split**: events are permuted with a fixed seed and cut
//!   into a training prefix and a test suffix
//! - **Flat index**: every valid window start of every selected event gets
//!   one global sample number
//! - **Atomic assembly**: a sample is built completely from the backing
//!   records or not at all
//!
//! # Architecture
//!
//! ```text
//! TyDataset::get(idx)
//!      │
//!      ├─► IndexMap::resolve(idx) ──► (event, local offset)
//!      │
//!      ├─► SampleAssembler::assemble
//!      │         │
//!      │         ├─► input frames     (RAD, input window)
//!      │         ├─► radar map        (RAD, last input step)
//!      │         ├─► target frames    (QPE or RAD, forecast window)
//!      │         ├─► side info        (scalar table rows)
//!      │         └─► terrain          (loaded once, shared)
//!      │
//!      └─► Normalizer::normalize (optional)
//!               │
//!               ▼
//!            Sample
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ty_dataset::{DatasetConfig, SplitRequest, TyDataset};
//!
//! let config = DatasetConfig::from_yaml("config/dataset.yaml")?;
//! let dataset = TyDataset::open(&config, &SplitRequest::train())?;
//!
//! let sample = dataset.get(0).await?;
//! println!("{} inputs ending at {}", sample.inputs.len(), sample.timestamp);
//! ```

pub mod assembler;
pub mod config;
pub mod dataset;
pub mod error;
pub mod index;
pub mod normalize;
pub mod registry;
pub mod sample;
pub mod source;
pub mod table;

pub use assembler::SampleAssembler;
pub use config::{Compression, DatasetConfig, OutputMapWindow, SourceConfig};
pub use dataset::TyDataset;
pub use error::{DatasetError, RecordId, Result, SourceError};
pub use index::{valid_window_count, IndexEntry, IndexMap, Location};
pub use normalize::{NormalizationStats, Normalizer, ValueRange};
pub use registry::{Event, EventRegistry, EventSelection, SplitMode, SplitRequest, SPLIT_SEED};
pub use sample::{Frame, Sample, SampleSummary, SideInfo};
pub use source::{DataSource, FieldKind, FsSource, MemorySource};
pub use table::{ColumnSelection, ScalarTable};
