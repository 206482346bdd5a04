//! Common test fixtures for typhoon dataset tests.
//!
//! This module provides pre-defined test data that represents common
//! scenarios in event indexing and sample assembly.

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Shorthand for a UTC date-time.
pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .unwrap_or_else(|| panic!("invalid test time {}-{}-{} {}:{}", year, month, day, hour, minute))
}

/// Two-event index scenario.
///
/// With 3 input and 2 target frames, event A holds 9 windows and event B
/// holds 3, for 12 samples in total.
pub mod scenario {
    pub const INPUT_FRAMES: usize = 3;
    pub const TARGET_FRAMES: usize = 2;
    pub const WINDOWS_A: usize = 9;
    pub const WINDOWS_B: usize = 3;
    pub const TOTAL: usize = WINDOWS_A + WINDOWS_B;

    /// Event list in the column layout of the published typhoon table.
    pub const EVENT_LIST_CSV: &str = "\
En name,Time of issuing,Time of canceling
A,2020-01-01 00:00,2020-01-01 02:00
B,2020-02-01 00:00,2020-02-01 01:00
";
}

/// Column names of per-event scalar tables.
pub mod columns {
    pub const ALL: [&str; 5] = ["Lat", "Lon", "Pressure", "MaxWind", "Radius15"];
}

/// Builds a scalar table CSV with one row per 10-minute step from `start`.
///
/// Cell `(step, column)` holds `column * 100 + step`, so selected rows and
/// columns can be checked by value.
pub fn scalar_table_csv(start: DateTime<Utc>, rows: usize, columns: &[&str]) -> String {
    let mut csv = String::from("Time");
    for name in columns {
        csv.push(',');
        csv.push_str(name);
    }
    csv.push('\n');

    for step in 0..rows {
        let time = start + Duration::minutes(10 * step as i64);
        csv.push_str(&time.format("%Y-%m-%d %H:%M:%S").to_string());
        for col in 0..columns.len() {
            csv.push_str(&format!(",{}", col * 100 + step));
        }
        csv.push('\n');
    }
    csv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_table_csv() {
        let csv = scalar_table_csv(utc(2020, 1, 1, 0, 0), 2, &columns::ALL);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Time,Lat,Lon,Pressure,MaxWind,Radius15");
        assert_eq!(lines[1], "2020-01-01 00:00:00,0,100,200,300,400");
        assert_eq!(lines[2], "2020-01-01 00:10:00,1,101,201,301,401");
    }

    #[test]
    fn test_scenario_totals() {
        assert_eq!(scenario::TOTAL, 12);
        assert_eq!(scenario::EVENT_LIST_CSV.lines().count(), 3);
    }
}
