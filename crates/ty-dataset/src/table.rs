//! Time-indexed scalar feature tables (typhoon track and intensity).

use std::io::Read;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// A table of scalar feature columns indexed by time.
///
/// Rows keep their source order; lookups select by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarTable {
    columns: Vec<String>,
    times: Vec<DateTime<Utc>>,
    rows: Vec<Vec<f64>>,
}

impl ScalarTable {
    /// Build a table, checking every row has one value per column.
    pub fn new(
        columns: Vec<String>,
        rows: Vec<(DateTime<Utc>, Vec<f64>)>,
    ) -> Result<Self, SourceError> {
        let mut times = Vec::with_capacity(rows.len());
        let mut values = Vec::with_capacity(rows.len());

        for (time, row) in rows {
            if row.len() != columns.len() {
                return Err(SourceError::malformed(format!(
                    "row at {} has {} values, table has {} columns",
                    time,
                    row.len(),
                    columns.len()
                )));
            }
            times.push(time);
            values.push(row);
        }

        Ok(Self {
            columns,
            times,
            rows: values,
        })
    }

    /// Parse a CSV table whose first column is `Time` and whose remaining
    /// columns are numeric. Empty cells read as NaN.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, SourceError> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.clone();

        let time_col = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case("time"))
            .ok_or_else(|| SourceError::malformed("scalar table has no Time column"))?;

        let columns: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != time_col)
            .map(|(_, h)| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let time = ty_common::time::parse_datetime(&record[time_col])?;

            let mut values = Vec::with_capacity(columns.len());
            for (i, cell) in record.iter().enumerate() {
                if i == time_col {
                    continue;
                }
                let cell = cell.trim();
                let value = if cell.is_empty() {
                    f64::NAN
                } else {
                    cell.parse::<f64>().map_err(|e| {
                        SourceError::malformed(format!(
                            "row {} column {}: {:?} is not a number ({})",
                            line + 1,
                            headers.get(i).unwrap_or("?"),
                            cell,
                            e
                        ))
                    })?
                };
                values.push(value);
            }
            rows.push((time, values));
        }

        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows with `start <= time <= end`, restricted to the given columns.
    pub fn select(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        columns: &[usize],
    ) -> Vec<Vec<f64>> {
        self.times
            .iter()
            .zip(&self.rows)
            .filter(|(time, _)| **time >= start && **time <= end)
            .map(|(_, row)| columns.iter().map(|&c| row[c]).collect())
            .collect()
    }
}

/// Which scalar columns become side info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnSelection {
    /// Every column except the last.
    AllButLast,
    /// The first two columns (the track position) plus the last.
    CatcherLocation,
    /// Columns by name, in the given order.
    Named(Vec<String>),
}

impl ColumnSelection {
    /// Resolve the selection against a table's columns.
    pub fn resolve(&self, available: &[String]) -> Result<Vec<usize>, SourceError> {
        let n = available.len();
        match self {
            Self::AllButLast => {
                if n < 2 {
                    return Err(SourceError::malformed(format!(
                        "need at least 2 feature columns, table has {}",
                        n
                    )));
                }
                Ok((0..n - 1).collect())
            }
            Self::CatcherLocation => {
                if n < 3 {
                    return Err(SourceError::malformed(format!(
                        "need at least 3 feature columns, table has {}",
                        n
                    )));
                }
                Ok(vec![0, 1, n - 1])
            }
            Self::Named(names) => names
                .iter()
                .map(|name| {
                    available.iter().position(|c| c == name).ok_or_else(|| {
                        SourceError::malformed(format!("scalar table has no column {:?}", name))
                    })
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const TABLE: &str = "\
Time,Lat,Lon,Pressure,MaxWind,Radius15
2020-01-01 00:00:00,21.5,125.0,960,35,250
2020-01-01 00:10:00,21.6,124.9,958,36,
2020-01-01 00:20:00,21.7,124.8,955,38,260
";

    fn t(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, minute, 0).unwrap()
    }

    #[test]
    fn test_from_csv_reader() {
        let table = ScalarTable::from_csv_reader(TABLE.as_bytes()).unwrap();
        assert_eq!(table.columns(), &["Lat", "Lon", "Pressure", "MaxWind", "Radius15"]);
        assert_eq!(table.len(), 3);

        let rows = table.select(t(10), t(10), &[0, 4]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], 21.6);
        assert!(rows[0][1].is_nan());
    }

    #[test]
    fn test_select_inclusive_range() {
        let table = ScalarTable::from_csv_reader(TABLE.as_bytes()).unwrap();
        let rows = table.select(t(10), t(20), &[0, 1]);
        assert_eq!(rows, vec![vec![21.6, 124.9], vec![21.7, 124.8]]);
        assert!(table.select(t(30), t(40), &[0]).is_empty());
    }

    #[test]
    fn test_missing_time_column() {
        let err = ScalarTable::from_csv_reader("Lat,Lon\n1,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[test]
    fn test_non_numeric_cell() {
        let csv = "Time,Lat\n2020-01-01 00:00,north\n";
        assert!(ScalarTable::from_csv_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_row_width_checked() {
        let columns = vec!["Lat".to_string(), "Lon".to_string()];
        assert!(ScalarTable::new(columns, vec![(t(0), vec![1.0])]).is_err());
    }

    #[test]
    fn test_column_selection_resolve() {
        let columns: Vec<String> = ["Lat", "Lon", "Pressure", "MaxWind", "Radius15"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(
            ColumnSelection::AllButLast.resolve(&columns).unwrap(),
            vec![0, 1, 2, 3]
        );
        assert_eq!(
            ColumnSelection::CatcherLocation.resolve(&columns).unwrap(),
            vec![0, 1, 4]
        );
        assert_eq!(
            ColumnSelection::Named(vec!["MaxWind".into(), "Lat".into()])
                .resolve(&columns)
                .unwrap(),
            vec![3, 0]
        );
        assert!(ColumnSelection::Named(vec!["Speed".into()])
            .resolve(&columns)
            .is_err());
        assert!(ColumnSelection::CatcherLocation
            .resolve(&columns[..2])
            .is_err());
    }
}
