//! Bar: the market data unit fed to the engine.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::PriceSource;

/// OHLC bar for a single symbol on a single timeframe.
///
/// Volume is accepted by the CSV feed but never reaches the engine; TD
/// Sequential is a pure price-pattern study.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    pub fn new(timestamp: NaiveDateTime, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
        }
    }

    /// Price selected by the configured data source.
    pub fn price(&self, source: PriceSource) -> f64 {
        match source {
            PriceSource::Close => self.close,
            PriceSource::High => self.high,
            PriceSource::Low => self.low,
        }
    }

    /// Returns true if any OHLC field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}
