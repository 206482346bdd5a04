//! Error types for dataset construction and sample assembly.

use std::fmt;

use thiserror::Error;
use ty_common::{GridError, TimeParseError};

/// Identity of a backing record: which field, for which event, at which time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordId {
    pub field: String,
    pub event: Option<String>,
    pub timestamp: Option<String>,
}

impl RecordId {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            event: None,
            timestamp: None,
        }
    }

    pub fn for_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub fn at(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.field)?;
        if let Some(event) = &self.event {
            write!(f, " of {}", event)?;
        }
        if let Some(timestamp) = &self.timestamp {
            write!(f, " at {}", timestamp)?;
        }
        Ok(())
    }
}

/// Errors surfaced by the dataset.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Bad configuration or input that can never produce a sample.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Sample index outside `[0, total)`.
    #[error("sample index {index} is out of range [0, {total})")]
    IndexOutOfRange { index: i128, total: usize },

    /// A required backing record does not exist.
    #[error("{record} not found: {message}")]
    NotFound { record: RecordId, message: String },

    /// A backing record exists but could not be read or decoded.
    #[error("failed to read {record}: {message}")]
    IoFailure { record: RecordId, message: String },
}

impl DatasetError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// The record a read failure refers to, if any.
    pub fn record(&self) -> Option<&RecordId> {
        match self {
            Self::NotFound { record, .. } | Self::IoFailure { record, .. } => Some(record),
            _ => None,
        }
    }
}

/// Result type for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;

/// Errors returned by a [`DataSource`](crate::source::DataSource).
///
/// Sources report what went wrong; the assembler attaches the record
/// identity with [`SourceError::at`].
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("malformed record: {0}")]
    Malformed(String),
}

impl SourceError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Attach the identity of the record being read.
    pub fn at(self, record: RecordId) -> DatasetError {
        match self {
            Self::NotFound(message) => DatasetError::NotFound { record, message },
            Self::Io(message) | Self::Malformed(message) => {
                DatasetError::IoFailure { record, message }
            }
        }
    }
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::Io(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(format!("JSON error: {}", err))
    }
}

impl From<csv::Error> for SourceError {
    fn from(err: csv::Error) -> Self {
        Self::Malformed(format!("CSV error: {}", err))
    }
}

impl From<GridError> for SourceError {
    fn from(err: GridError) -> Self {
        Self::Malformed(err.to_string())
    }
}

impl From<TimeParseError> for SourceError {
    fn from(err: TimeParseError) -> Self {
        Self::Malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_display() {
        let record = RecordId::new("RAD").for_event("2019.LEKIMA").at("201908090340");
        assert_eq!(record.to_string(), "RAD of 2019.LEKIMA at 201908090340");
        assert_eq!(RecordId::new("height").to_string(), "height");
    }

    #[test]
    fn test_source_error_mapping() {
        let record = RecordId::new("QPE").for_event("2020.HAGUPIT");

        let err = SourceError::NotFound("no such file".into()).at(record.clone());
        assert!(matches!(err, DatasetError::NotFound { .. }));
        assert_eq!(err.record(), Some(&record));

        let err = SourceError::malformed("bad header").at(record.clone());
        assert!(matches!(err, DatasetError::IoFailure { .. }));
        assert!(err.to_string().contains("QPE of 2020.HAGUPIT"));
    }

    #[test]
    fn test_io_error_kind() {
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(SourceError::from(missing), SourceError::NotFound(_)));

        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(SourceError::from(denied), SourceError::Io(_)));
    }
}
