//! Bar feeds.
//!
//! The engine assumes clean input: strictly increasing timestamps, one symbol,
//! one timeframe. Feeds enforce that before a bar reaches it.

pub mod csv_feed;

pub use csv_feed::{parse_bars_csv, parse_timestamp, read_bars_csv};

use chrono::NaiveDateTime;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error at row {row}: {source}")]
    Csv {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("row {row}: unrecognized timestamp '{value}'")]
    Timestamp { row: usize, value: String },

    #[error("row {row}: inconsistent OHLC (open={open}, high={high}, low={low}, close={close})")]
    InvalidBar {
        row: usize,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },

    #[error("row {row}: timestamp {received} does not follow {previous}")]
    NotMonotonic {
        row: usize,
        previous: NaiveDateTime,
        received: NaiveDateTime,
    },
}
