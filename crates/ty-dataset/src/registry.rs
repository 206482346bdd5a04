//! Typhoon event list and the deterministic train/test split.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Datelike, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{DatasetError, RecordId, Result, SourceError};

/// Seed for the split permutation. Fixed so that the same event list
/// always yields the same partition.
pub const SPLIT_SEED: u64 = 1;

/// One typhoon event and its warning period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub issue_time: DateTime<Utc>,
    pub cancel_time: DateTime<Utc>,
}

impl Event {
    pub fn new(
        name: impl Into<String>,
        issue_time: DateTime<Utc>,
        cancel_time: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            issue_time,
            cancel_time,
        }
    }

    /// Key used to locate the event's files, e.g. `2019.LEKIMA`.
    pub fn storage_key(&self) -> String {
        format!("{}.{}", self.issue_time.year(), self.name)
    }
}

/// Which side of the split to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    Train,
    Test,
}

impl SplitMode {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "train" | "training" => Some(Self::Train),
            "test" | "testing" => Some(Self::Test),
            _ => None,
        }
    }
}

impl std::fmt::Display for SplitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Train => write!(f, "train"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// Request for one side of the split.
///
/// `train_count` is the size of the training prefix; without it the
/// training set is the first three quarters of the permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitRequest {
    pub mode: SplitMode,
    pub train_count: Option<usize>,
}

impl SplitRequest {
    pub fn train() -> Self {
        Self {
            mode: SplitMode::Train,
            train_count: None,
        }
    }

    pub fn test() -> Self {
        Self {
            mode: SplitMode::Test,
            train_count: None,
        }
    }

    pub fn with_train_count(mut self, count: usize) -> Self {
        self.train_count = Some(count);
        self
    }
}

/// Events selected for one side of the split, in permutation order.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSelection {
    mode: SplitMode,
    events: Vec<Event>,
}

impl EventSelection {
    pub fn new(mode: SplitMode, events: Vec<Event>) -> Self {
        Self { mode, events }
    }

    pub fn mode(&self) -> SplitMode {
        self.mode
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.name.as_str()).collect()
    }
}

#[derive(Debug, Deserialize)]
struct EventRow {
    #[serde(rename = "En name", alias = "name")]
    name: String,
    #[serde(rename = "Time of issuing", alias = "issue_time")]
    issue_time: String,
    #[serde(rename = "Time of canceling", alias = "cancel_time")]
    cancel_time: String,
}

/// The full event table.
#[derive(Debug, Clone)]
pub struct EventRegistry {
    events: Vec<Event>,
}

impl EventRegistry {
    /// Create a registry, rejecting duplicate names and inverted periods.
    pub fn new(events: Vec<Event>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(events.len());
        for event in &events {
            if !seen.insert(event.name.as_str()) {
                return Err(DatasetError::invalid_argument(format!(
                    "duplicate event name {:?}",
                    event.name
                )));
            }
            if event.cancel_time < event.issue_time {
                return Err(DatasetError::invalid_argument(format!(
                    "event {} is cancelled ({}) before it is issued ({})",
                    event.name, event.cancel_time, event.issue_time
                )));
            }
        }
        Ok(Self { events })
    }

    /// Parse a CSV event list. Columns other than the name and the two
    /// warning times are ignored.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let mut events = Vec::new();

        for (line, row) in reader.deserialize::<EventRow>().enumerate() {
            let row = row.map_err(|e| {
                DatasetError::invalid_argument(format!("event list row {}: {}", line + 1, e))
            })?;
            let parse = |s: &str| {
                ty_common::time::parse_datetime(s).map_err(|e| {
                    DatasetError::invalid_argument(format!(
                        "event list row {} ({}): {}",
                        line + 1,
                        row.name,
                        e
                    ))
                })
            };
            let event = Event::new(
                row.name.trim(),
                parse(&row.issue_time)?,
                parse(&row.cancel_time)?,
            );
            debug!(event = %event.name, issue = %event.issue_time, cancel = %event.cancel_time, "Loaded event");
            events.push(event);
        }

        Self::new(events)
    }

    /// Load a CSV event list from disk.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            SourceError::from(e).at(RecordId::new(format!("event list {}", path.display())))
        })?;
        let registry = Self::from_csv_reader(file)?;
        info!(path = %path.display(), events = registry.len(), "Loaded event list");
        Ok(registry)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, name: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Seeded permutation of `[0, len)`. Depends only on the event count.
    pub fn permutation(&self) -> Vec<usize> {
        let mut rng = StdRng::seed_from_u64(SPLIT_SEED);
        let mut order: Vec<usize> = (0..self.events.len()).collect();
        order.shuffle(&mut rng);
        order
    }

    /// Select one side of the split.
    pub fn select(&self, request: &SplitRequest) -> Result<EventSelection> {
        let n = self.events.len();
        let train_count = match request.train_count {
            Some(count) if count > n => {
                return Err(DatasetError::invalid_argument(format!(
                    "train count {} exceeds the {} available events",
                    count, n
                )));
            }
            Some(count) => count,
            None => n * 3 / 4,
        };

        let order = self.permutation();
        let picked = match request.mode {
            SplitMode::Train => &order[..train_count],
            SplitMode::Test => &order[train_count..],
        };

        let events: Vec<Event> = picked.iter().map(|&i| self.events[i].clone()).collect();
        info!(
            mode = %request.mode,
            selected = events.len(),
            total = n,
            "Selected events"
        );

        Ok(EventSelection::new(request.mode, events))
    }

    /// Both sides of the split for the same training count.
    pub fn split(&self, train_count: Option<usize>) -> Result<(EventSelection, EventSelection)> {
        let mut train = SplitRequest::train();
        let mut test = SplitRequest::test();
        train.train_count = train_count;
        test.train_count = train_count;
        Ok((self.select(&train)?, self.select(&test)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn events(n: usize) -> Vec<Event> {
        (0..n)
            .map(|i| {
                let issue = Utc.with_ymd_and_hms(2015 + i as i32 % 5, 7, 1, 0, 0, 0).unwrap();
                Event::new(format!("TY{:02}", i), issue, issue + Duration::hours(48))
            })
            .collect()
    }

    #[test]
    fn test_storage_key() {
        let issue = Utc.with_ymd_and_hms(2019, 8, 7, 11, 30, 0).unwrap();
        let event = Event::new("LEKIMA", issue, issue + Duration::hours(60));
        assert_eq!(event.storage_key(), "2019.LEKIMA");
    }

    #[test]
    fn test_default_split_sizes() {
        let registry = EventRegistry::new(events(10)).unwrap();
        let (train, test) = registry.split(None).unwrap();
        assert_eq!(train.len(), 7);
        assert_eq!(test.len(), 3);
        assert_eq!(train.mode(), SplitMode::Train);
        assert_eq!(test.mode(), SplitMode::Test);
    }

    #[test]
    fn test_split_is_partition() {
        let registry = EventRegistry::new(events(23)).unwrap();
        for count in [None, Some(0), Some(5), Some(23)] {
            let (train, test) = registry.split(count).unwrap();
            let mut names: Vec<&str> = train.names();
            names.extend(test.names());
            assert_eq!(names.len(), 23);

            let unique: HashSet<&str> = names.iter().copied().collect();
            assert_eq!(unique.len(), 23, "overlap for count {:?}", count);
        }
    }

    #[test]
    fn test_split_is_deterministic() {
        let a = EventRegistry::new(events(17)).unwrap();
        let b = EventRegistry::new(events(17)).unwrap();
        assert_eq!(a.permutation(), b.permutation());
        assert_eq!(
            a.select(&SplitRequest::train()).unwrap(),
            b.select(&SplitRequest::train()).unwrap()
        );
    }

    #[test]
    fn test_selection_follows_permutation_order() {
        let registry = EventRegistry::new(events(12)).unwrap();
        let order = registry.permutation();
        let train = registry
            .select(&SplitRequest::train().with_train_count(4))
            .unwrap();
        let expected: Vec<&str> = order[..4]
            .iter()
            .map(|&i| registry.events()[i].name.as_str())
            .collect();
        assert_eq!(train.names(), expected);
    }

    #[test]
    fn test_train_count_exceeds_population() {
        let registry = EventRegistry::new(events(4)).unwrap();
        let err = registry
            .select(&SplitRequest::test().with_train_count(5))
            .unwrap_err();
        assert!(matches!(err, DatasetError::InvalidArgument(_)));
    }

    #[test]
    fn test_rejects_duplicates_and_inverted_periods() {
        let mut list = events(3);
        list.push(list[0].clone());
        assert!(EventRegistry::new(list).is_err());

        let issue = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let inverted = Event::new("BACKWARDS", issue, issue - Duration::minutes(10));
        assert!(EventRegistry::new(vec![inverted]).is_err());
    }

    #[test]
    fn test_from_csv_reader() {
        let csv = "\
En name,Ch name,Time of issuing,Time of canceling
LEKIMA,利奇馬,2019-08-07 11:30:00,2019-08-10 14:30:00
BAILU,白鹿,2019-08-23 11:30:00,2019-08-25 08:30:00
";
        let registry = EventRegistry::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(registry.len(), 2);

        let lekima = registry.get("LEKIMA").unwrap();
        assert_eq!(
            lekima.issue_time,
            Utc.with_ymd_and_hms(2019, 8, 7, 11, 30, 0).unwrap()
        );
        assert_eq!(
            lekima.cancel_time,
            Utc.with_ymd_and_hms(2019, 8, 10, 14, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_from_csv_reader_aliases() {
        let csv = "name,issue_time,cancel_time\nA,2020-01-01T00:00:00Z,2020-01-01T02:00:00Z\n";
        let registry = EventRegistry::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(registry.events()[0].name, "A");
    }

    #[test]
    fn test_from_csv_reader_bad_time() {
        let csv = "name,issue_time,cancel_time\nA,soon,2020-01-01T02:00:00Z\n";
        let err = EventRegistry::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidArgument(_)));
    }
}
