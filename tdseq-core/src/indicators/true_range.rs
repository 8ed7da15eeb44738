//! True Range.
//!
//! TR = max(high - low, |high - prev_close|, |low - prev_close|).
//! The first bar of a stream has no previous close, so TR = high - low.
//! Any NaN input yields NaN.

use crate::domain::Bar;

/// True Range of one bar given the previous bar's close.
pub fn true_range_step(high: f64, low: f64, prev_close: Option<f64>) -> f64 {
    match prev_close {
        None => {
            if high.is_nan() || low.is_nan() {
                f64::NAN
            } else {
                high - low
            }
        }
        Some(pc) => {
            if high.is_nan() || low.is_nan() || pc.is_nan() {
                f64::NAN
            } else {
                (high - low).max((high - pc).abs()).max((low - pc).abs())
            }
        }
    }
}

/// True Range series over a bar slice.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let prev_close = i.checked_sub(1).map(|p| bars[p].close);
            true_range_step(bar.high, bar.low, prev_close)
        })
        .collect()
}
