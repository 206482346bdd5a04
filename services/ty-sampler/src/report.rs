//! Plain-text and JSON reports printed by the sampler.

use serde::Serialize;
use ty_common::time::format_label;
use ty_dataset::{IndexMap, SampleSummary, SplitMode};

/// One row of the index table.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRow {
    pub event: String,
    pub issue: String,
    pub cancel: String,
    pub first_index: usize,
    pub windows: usize,
}

pub fn index_rows(index: &IndexMap) -> Vec<IndexRow> {
    index
        .entries()
        .iter()
        .map(|entry| IndexRow {
            event: entry.event.storage_key(),
            issue: format_label(&entry.event.issue_time),
            cancel: format_label(&entry.event.cancel_time),
            first_index: entry.start,
            windows: entry.window_count(),
        })
        .collect()
}

/// Fixed-width table of the index layout.
pub fn render_index_table(mode: SplitMode, index: &IndexMap) -> String {
    let rows = index_rows(index);
    let width = rows
        .iter()
        .map(|r| r.event.len())
        .max()
        .unwrap_or(0)
        .max("event".len());

    let mut out = format!(
        "split={} events={} samples={} window={}\n",
        mode,
        rows.len(),
        index.len(),
        index.window_length()
    );
    out.push_str(&format!(
        "{:<width$}  {:<12}  {:<12}  {:>8}  {:>8}\n",
        "event",
        "issue",
        "cancel",
        "first",
        "windows",
        width = width
    ));
    for row in &rows {
        out.push_str(&format!(
            "{:<width$}  {:<12}  {:<12}  {:>8}  {:>8}\n",
            row.event,
            row.issue,
            row.cancel,
            row.first_index,
            row.windows,
            width = width
        ));
    }
    out
}

/// A sample summary tagged with its global index.
#[derive(Debug, Serialize)]
pub struct SampleReport<'a> {
    pub index: usize,
    pub event: &'a str,
    pub local_offset: usize,
    #[serde(flatten)]
    pub summary: SampleSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use ty_dataset::{Event, EventSelection};

    fn index() -> IndexMap {
        let a = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2020, 2, 1, 0, 0, 0).unwrap();
        let selection = EventSelection::new(
            SplitMode::Train,
            vec![
                Event::new("A", a, a + Duration::hours(2)),
                Event::new("B", b, b + Duration::hours(1)),
            ],
        );
        IndexMap::build(&selection, 5).unwrap()
    }

    #[test]
    fn test_index_rows() {
        let rows = index_rows(&index());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].event, "2020.A");
        assert_eq!(rows[0].issue, "202001010000");
        assert_eq!(rows[0].windows, 9);
        assert_eq!(rows[1].first_index, 9);
        assert_eq!(rows[1].windows, 3);
    }

    #[test]
    fn test_render_index_table() {
        let table = render_index_table(SplitMode::Train, &index());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "split=train events=2 samples=12 window=5");
        assert!(lines[1].starts_with("event"));
        assert!(lines[3].starts_with("2020.B"));
        assert!(lines[3].trim_end().ends_with('3'));
    }
}
