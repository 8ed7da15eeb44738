//! Batch indicator interface over bar slices.
//!
//! `Indicator` turns a full bar series into one numeric series of the same
//! length. The TD Sequential outputs are exposed as separate `TdLine`
//! instances, one per price series or flag, keeping the trait single-series.

pub mod td_line;
pub mod true_range;

pub use td_line::{TdLine, TdOutput};
pub use true_range::{true_range, true_range_step};

use crate::domain::Bar;

/// Bar series in, numeric series out.
///
/// # Look-ahead contamination guard
/// No value at bar t may depend on bar t+1 or later. Every implementation must
/// pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g. "td_risk_level").
    fn name(&self) -> &str;

    /// Number of leading bars that are always `f64::NAN`.
    fn lookback(&self) -> usize;

    /// Compute the series. Returns a `Vec<f64>` of the same length as `bars`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Synthetic bars from close prices, one day apart.
///
/// open = prev_close (or close for the first bar),
/// high = max(open, close) + 1.0, low = min(open, close) - 1.0.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar::new(
                base + chrono::Duration::days(i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
            )
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
