//! Global sample index over the selected events.
//!
//! Each event contributes one sample per valid window start. Events are laid
//! out back to back in selection order, so a flat sample number maps to
//! exactly one (event, offset) pair.
//!
//! ```text
//! event:    |---- A (9) ----|-- B (3) --|
//! global:    0 1 2 ... 7 8   9 10 11
//! offset:    0 1 2 ... 7 8   0  1  2
//! ```

use chrono::{DateTime, Utc};
use tracing::info;
use ty_common::time::{steps, whole_steps_between};

use crate::error::{DatasetError, Result};
use crate::registry::{Event, EventSelection};

/// One event's slice of the global index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub event: Event,
    /// Latest valid window start: `cancel - (window_length - 1)` steps.
    pub last_start: DateTime<Utc>,
    /// First global index owned by the event.
    pub start: usize,
    /// One past the last global index owned by the event.
    pub end: usize,
}

impl IndexEntry {
    pub fn window_count(&self) -> usize {
        self.end - self.start
    }
}

/// A resolved sample position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location<'a> {
    pub event: &'a Event,
    pub local_offset: usize,
}

/// Mapping from flat sample numbers to (event, local offset).
#[derive(Debug, Clone)]
pub struct IndexMap {
    entries: Vec<IndexEntry>,
    total: usize,
    window_length: usize,
}

impl IndexMap {
    /// Build the index for a selection and a window of `window_length` frames.
    ///
    /// Fails if any event is too short to hold a single window.
    pub fn build(selection: &EventSelection, window_length: usize) -> Result<Self> {
        let mut entries = Vec::with_capacity(selection.len());
        let mut total = 0usize;

        for event in selection.iter() {
            let count = valid_window_count(event, window_length)?;
            let last_start = event.cancel_time - steps(window_length as i64 - 1);
            entries.push(IndexEntry {
                event: event.clone(),
                last_start,
                start: total,
                end: total + count,
            });
            total += count;
        }

        info!(
            events = entries.len(),
            total_samples = total,
            window_length,
            "Built sample index"
        );

        Ok(Self {
            entries,
            total,
            window_length,
        })
    }

    /// Total number of samples.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn window_length(&self) -> usize {
        self.window_length
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Map a flat sample number to its event and local offset.
    ///
    /// Accepts any integer type so that negative indices are rejected with
    /// `IndexOutOfRange` rather than failing to convert at the call site.
    pub fn resolve<I>(&self, idx: I) -> Result<Location<'_>>
    where
        I: TryInto<usize> + TryInto<i128> + Copy,
    {
        let out_of_range = || DatasetError::IndexOutOfRange {
            index: TryInto::<i128>::try_into(idx).unwrap_or(i128::MAX),
            total: self.total,
        };

        let idx: usize = TryInto::<usize>::try_into(idx).map_err(|_| out_of_range())?;
        if idx >= self.total {
            return Err(out_of_range());
        }

        // Entries are contiguous and in selection order, so the first entry
        // whose end lies past idx is the owner.
        let position = self.entries.partition_point(|e| e.end <= idx);
        let entry = &self.entries[position];

        Ok(Location {
            event: &entry.event,
            local_offset: idx - entry.start,
        })
    }

    /// Every (event, offset) pair in global index order.
    pub fn iter(&self) -> impl Iterator<Item = Location<'_>> {
        self.entries.iter().flat_map(|entry| {
            (0..entry.window_count()).map(move |local_offset| Location {
                event: &entry.event,
                local_offset,
            })
        })
    }
}

/// Number of valid window starts for an event:
/// `floor((cancel - (L - 1) steps - issue) / step) + 1`.
pub fn valid_window_count(event: &Event, window_length: usize) -> Result<usize> {
    if window_length == 0 {
        return Err(DatasetError::invalid_argument("window length must be > 0"));
    }

    let last_start = event.cancel_time - steps(window_length as i64 - 1);
    if last_start < event.issue_time {
        return Err(DatasetError::invalid_argument(format!(
            "event {} ({} to {}) is too short for a {}-frame window",
            event.name, event.issue_time, event.cancel_time, window_length
        )));
    }

    let whole = whole_steps_between(event.issue_time, last_start);
    Ok(whole as usize + 1)
}
