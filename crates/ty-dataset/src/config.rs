//! Configuration for the typhoon dataset.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use ty_common::{GeoGrid, Grid, GridResult, SpatialWindow};

use crate::error::{DatasetError, Result};
use crate::normalize::NormalizationStats;
use crate::source::FieldKind;
use crate::table::ColumnSelection;

/// Configuration for sample assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Number of input frames (10-minute steps).
    pub input_frames: usize,

    /// Number of target frames (10-minute steps).
    pub target_frames: usize,

    /// Channels per input frame: 1, or 3 with coordinate grids.
    pub input_channels: usize,

    /// Crop window for input frames and the terrain layer.
    #[serde(alias = "I")]
    pub input_window: SpatialWindow,

    /// Crop window for target frames.
    #[serde(alias = "F")]
    pub forecast_window: SpatialWindow,

    /// Shape (and optional crop) of the last-input radar map.
    #[serde(alias = "O")]
    pub radar_map: OutputMapWindow,

    /// Append column/row coordinate grids to input frames and the radar map.
    pub input_with_grid: bool,

    /// Targets are the primary field (RAD) instead of the secondary (QPE).
    #[serde(alias = "target_RAD")]
    pub target_is_primary_field: bool,

    /// Scale targets with the field statistics when normalizing.
    pub normalize_target: bool,

    /// Side info keeps only the first two columns plus the last.
    pub catcher_location: bool,

    /// Explicit side-info column names; overrides `catcher_location`.
    pub side_info_columns: Option<Vec<String>>,

    /// Name of the static terrain grid.
    pub terrain_grid: String,

    /// Per-field and per-column normalization statistics.
    pub normalization: Option<NormalizationStats>,

    /// Filesystem layout for the bundled reader.
    pub source: SourceConfig,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            input_frames: 6,
            target_frames: 18,
            input_channels: 1,
            input_window: SpatialWindow::new((118.3, 123.2875), (21.8875, 26.875), (400, 400)),
            forecast_window: SpatialWindow::new((120.95, 122.1875), (24.0, 25.2375), (100, 100)),
            radar_map: OutputMapWindow::new((100, 100)),
            input_with_grid: false,
            target_is_primary_field: false,
            normalize_target: false,
            catcher_location: false,
            side_info_columns: None,
            terrain_grid: "height".to_string(),
            normalization: None,
            source: SourceConfig::default(),
        }
    }
}

impl DatasetConfig {
    /// Load configuration from a YAML file, then apply environment overrides.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DatasetError::invalid_argument(format!(
                "cannot read config {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_str(&contents)?.with_env_overrides()
    }

    /// Parse configuration from a YAML document.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents)
            .map_err(|e| DatasetError::invalid_argument(format!("invalid config YAML: {}", e)))
    }

    /// Load configuration from environment variables on top of the defaults.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `TY_*` environment variable overrides.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(n) = env_parse("TY_INPUT_FRAMES") {
            self.input_frames = n;
        }

        if let Some(n) = env_parse("TY_TARGET_FRAMES") {
            self.target_frames = n;
        }

        if let Some(flag) = env_flag("TY_INPUT_WITH_GRID") {
            self.input_with_grid = flag;
            self.input_channels = expected_input_channels(flag);
        }

        if let Some(flag) = env_flag("TY_TARGET_IS_PRIMARY") {
            self.target_is_primary_field = flag;
        }

        if let Some(flag) = env_flag("TY_NORMALIZE_TARGET") {
            self.normalize_target = flag;
        }

        if let Some(flag) = env_flag("TY_CATCHER_LOCATION") {
            self.catcher_location = flag;
        }

        if let Ok(val) = std::env::var("TY_EVENT_LIST") {
            self.source.event_list = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("TY_FIELD_ROOT") {
            self.source.field_root = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("TY_SCALAR_ROOT") {
            self.source.scalar_root = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("TY_STATIC_ROOT") {
            self.source.static_root = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("TY_COMPRESSION") {
            self.source.compression = Compression::from_str(&val).ok_or_else(|| {
                DatasetError::invalid_argument(format!(
                    "TY_COMPRESSION must be none or gzip, got {:?}",
                    val
                ))
            })?;
        }

        Ok(self)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.input_frames == 0 {
            return Err(DatasetError::invalid_argument("input_frames must be > 0"));
        }

        if self.target_frames == 0 {
            return Err(DatasetError::invalid_argument("target_frames must be > 0"));
        }

        let expected = expected_input_channels(self.input_with_grid);
        if self.input_channels != expected {
            return Err(DatasetError::invalid_argument(format!(
                "input_channels is {} but input_with_grid={} requires {}",
                self.input_channels, self.input_with_grid, expected
            )));
        }

        for (name, window) in [
            ("input_window", &self.input_window),
            ("forecast_window", &self.forecast_window),
        ] {
            window
                .validate()
                .map_err(|e| DatasetError::invalid_argument(format!("{}: {}", name, e)))?;
        }

        self.radar_map.validate()?;

        if let Some(columns) = &self.side_info_columns {
            if columns.is_empty() {
                return Err(DatasetError::invalid_argument(
                    "side_info_columns must name at least one column",
                ));
            }
        }

        if self.terrain_grid.is_empty() {
            return Err(DatasetError::invalid_argument("terrain_grid must be set"));
        }

        Ok(())
    }

    /// Frames spanned by one sample.
    pub fn window_length(&self) -> usize {
        self.input_frames + self.target_frames
    }

    /// Field read for target frames.
    pub fn target_field(&self) -> FieldKind {
        if self.target_is_primary_field {
            FieldKind::Primary
        } else {
            FieldKind::Secondary
        }
    }

    /// Side-info column selection implied by the flags.
    pub fn column_selection(&self) -> ColumnSelection {
        match &self.side_info_columns {
            Some(names) => ColumnSelection::Named(names.clone()),
            None if self.catcher_location => ColumnSelection::CatcherLocation,
            None => ColumnSelection::AllButLast,
        }
    }
}

fn expected_input_channels(with_grid: bool) -> usize {
    if with_grid {
        3
    } else {
        1
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|val| val.parse().ok())
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|val| val.to_lowercase() == "true" || val == "1")
}

/// Shape of the radar map, with an optional crop in label coordinates.
///
/// Without bounds the native grid is used whole and must already have
/// `shape`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputMapWindow {
    pub shape: (usize, usize),
    #[serde(default)]
    pub x: Option<(f64, f64)>,
    #[serde(default)]
    pub y: Option<(f64, f64)>,
}

impl OutputMapWindow {
    pub fn new(shape: (usize, usize)) -> Self {
        Self {
            shape,
            x: None,
            y: None,
        }
    }

    pub fn with_bounds(shape: (usize, usize), x: (f64, f64), y: (f64, f64)) -> Self {
        Self {
            shape,
            x: Some(x),
            y: Some(y),
        }
    }

    pub fn width(&self) -> usize {
        self.shape.0
    }

    pub fn height(&self) -> usize {
        self.shape.1
    }

    pub fn validate(&self) -> Result<()> {
        if self.shape.0 == 0 || self.shape.1 == 0 {
            return Err(DatasetError::invalid_argument(format!(
                "radar_map shape must be non-empty, got {:?}",
                self.shape
            )));
        }

        match (self.x, self.y) {
            (Some(x), Some(y)) => SpatialWindow::new(x, y, self.shape)
                .validate()
                .map_err(|e| DatasetError::invalid_argument(format!("radar_map: {}", e))),
            (None, None) => Ok(()),
            _ => Err(DatasetError::invalid_argument(
                "radar_map bounds need both x and y, or neither",
            )),
        }
    }

    /// Crop (or take whole) a native-resolution grid to the map shape.
    pub fn extract(&self, geo: &GeoGrid) -> GridResult<Grid> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => geo.crop(&SpatialWindow::new(x, y, self.shape)),
            _ => geo.whole(self.shape),
        }
    }
}

/// Filesystem layout read by [`FsSource`](crate::source::FsSource).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// CSV event list (name, issue time, cancel time).
    pub event_list: PathBuf,

    /// Root holding `RAD/` and `QPE/` field directories.
    pub field_root: PathBuf,

    /// Directory of per-event scalar feature tables.
    pub scalar_root: PathBuf,

    /// Directory of static grids (terrain).
    pub static_root: PathBuf,

    /// Compression of grid documents.
    pub compression: Compression,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            event_list: PathBuf::from("data/ty_list.csv"),
            field_root: PathBuf::from("data/wrangled/radar"),
            scalar_root: PathBuf::from("data/wrangled/ty_info"),
            static_root: PathBuf::from("data/radar"),
            compression: Compression::Gzip,
        }
    }
}

/// Compression codec for grid documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Plain JSON.
    None,
    /// Gzip-compressed JSON.
    #[default]
    Gzip,
}

impl Compression {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" | "json" => Some(Self::None),
            "gzip" | "gz" => Some(Self::Gzip),
            _ => None,
        }
    }

    /// File extension appended to grid documents.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::None => "json",
            Self::Gzip => "json.gz",
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Gzip => write!(f, "gzip"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DatasetConfig::default();
        assert_eq!(config.input_frames, 6);
        assert_eq!(config.target_frames, 18);
        assert_eq!(config.window_length(), 24);
        assert_eq!(config.input_channels, 1);
        assert!(!config.input_with_grid);
        assert_eq!(config.target_field(), FieldKind::Secondary);
        assert_eq!(config.source.compression, Compression::Gzip);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = DatasetConfig::default();
        config.input_frames = 0;
        assert!(config.validate().is_err());

        config = DatasetConfig::default();
        config.target_frames = 0;
        assert!(config.validate().is_err());

        config = DatasetConfig::default();
        config.input_with_grid = true;
        assert!(config.validate().is_err());
        config.input_channels = 3;
        assert!(config.validate().is_ok());

        config = DatasetConfig::default();
        config.radar_map.x = Some((0.0, 1.0));
        assert!(config.validate().is_err());

        config = DatasetConfig::default();
        config.side_info_columns = Some(vec![]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_column_selection() {
        let mut config = DatasetConfig::default();
        assert_eq!(config.column_selection(), ColumnSelection::AllButLast);

        config.catcher_location = true;
        assert_eq!(config.column_selection(), ColumnSelection::CatcherLocation);

        config.side_info_columns = Some(vec!["Lat".into(), "Lon".into()]);
        assert_eq!(
            config.column_selection(),
            ColumnSelection::Named(vec!["Lat".into(), "Lon".into()])
        );
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = r#"
input_frames: 3
target_frames: 2
input_channels: 3
input_with_grid: true
target_RAD: true
input_window:
  x: [120.0, 121.0]
  y: [24.0, 25.0]
  shape: [5, 5]
forecast_window:
  x: [120.25, 120.75]
  y: [24.25, 24.75]
  shape: [3, 3]
radar_map:
  shape: [3, 3]
normalization:
  fields:
    RAD: { min: 0.0, max: 100.0 }
source:
  field_root: /data/radar
  compression: none
"#;
        let config = DatasetConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.input_frames, 3);
        assert!(config.target_is_primary_field);
        assert_eq!(config.input_window.shape, (5, 5));
        assert_eq!(config.radar_map.x, None);
        assert_eq!(config.source.compression, Compression::None);
        assert_eq!(config.source.field_root, PathBuf::from("/data/radar"));
        assert_eq!(config.terrain_grid, "height");
        assert!(config.normalization.is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_compression_from_str() {
        assert_eq!(Compression::from_str("none"), Some(Compression::None));
        assert_eq!(Compression::from_str("GZIP"), Some(Compression::Gzip));
        assert_eq!(Compression::from_str("bz2"), None);
        assert_eq!(Compression::from_str(""), None);
        assert_eq!(Compression::None.extension(), "json");
        assert_eq!(Compression::Gzip.extension(), "json.gz");
    }

    #[test]
    fn test_unknown_compression_env_rejected() {
        std::env::set_var("TY_COMPRESSION", "bz2");
        let result = DatasetConfig::default().with_env_overrides();
        std::env::set_var("TY_COMPRESSION", "none");
        let plain = DatasetConfig::default().with_env_overrides();
        std::env::remove_var("TY_COMPRESSION");

        assert!(matches!(result, Err(DatasetError::InvalidArgument(ref msg)) if msg.contains("bz2")));
        assert_eq!(plain.unwrap().source.compression, Compression::None);
    }

    #[test]
    fn test_radar_map_bounds() {
        let window = OutputMapWindow::with_bounds((2, 2), (1.0, 2.0), (2.0, 3.0));
        assert!(window.validate().is_ok());
        assert_eq!((window.width(), window.height()), (2, 2));

        let grid = Grid::from_fn(4, 4, |col, row| (row * 4 + col) as f32);
        let geo = GeoGrid::new(grid, vec![0.0, 1.0, 2.0, 3.0], vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let cropped = window.extract(&geo).unwrap();
        assert_eq!(cropped.shape(), (2, 2));
        assert_eq!(cropped.get(0, 0), Some(9.0));
        assert_eq!(cropped.get(1, 1), Some(14.0));

        // Without bounds the native grid must already have the map shape.
        assert!(OutputMapWindow::new((2, 2)).extract(&geo).is_err());
    }
}
