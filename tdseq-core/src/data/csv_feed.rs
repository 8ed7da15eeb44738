//! CSV bar feed.
//!
//! Expected header: `timestamp,open,high,low,close[,volume]` (`date` and
//! `datetime` are accepted for the first column). Volume is read and dropped.
//! Rows must already be in strictly increasing timestamp order; the feed
//! validates but never sorts or fills gaps.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, warn};

use super::DataError;
use crate::domain::Bar;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "date", alias = "datetime")]
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    #[allow(dead_code)]
    volume: Option<f64>,
}

/// Parse a timestamp in any supported format. RFC 3339 values are
/// converted to UTC; date-only values fall at midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Read bars from a CSV file.
pub fn read_bars_csv(path: &Path) -> Result<Vec<Bar>, DataError> {
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bars = parse_bars_csv(file)?;
    debug!(path = %path.display(), bars = bars.len(), "loaded CSV bars");
    Ok(bars)
}

/// Parse bars from any CSV reader. Row numbers in errors are 1-based and
/// exclude the header.
pub fn parse_bars_csv<R: Read>(reader: R) -> Result<Vec<Bar>, DataError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut bars: Vec<Bar> = Vec::new();
    for (i, result) in csv_reader.deserialize::<CsvRow>().enumerate() {
        let row = i + 1;
        let record = result.map_err(|source| DataError::Csv { row, source })?;

        let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| DataError::Timestamp {
            row,
            value: record.timestamp.clone(),
        })?;
        let bar = Bar::new(timestamp, record.open, record.high, record.low, record.close);

        if bar.is_void() {
            warn!(row, %timestamp, "void bar (NaN field) passed through");
        } else if !bar.is_sane() {
            return Err(DataError::InvalidBar {
                row,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
            });
        }

        if let Some(previous) = bars.last() {
            if timestamp <= previous.timestamp {
                return Err(DataError::NotMonotonic {
                    row,
                    previous: previous.timestamp,
                    received: timestamp,
                });
            }
        }
        bars.push(bar);
    }
    Ok(bars)
}
