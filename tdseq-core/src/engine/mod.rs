//! TD Sequential engine: one instance per single-symbol, single-timeframe stream.
//!
//! Each call to [`TdSequential::update`] runs the stages in a fixed order:
//!
//! 1. History: push the bar with its source price and True Range
//! 2. Setup: flip counts, completion, perfection, TDST, recycle
//! 3. Countdown: counters, qualification, completion/deferral events
//! 4. Risk level
//! 5. Snapshot
//!
//! Each stage reads only what earlier stages committed for this bar or for
//! prior bars. Nothing looks ahead.

mod countdown;
mod risk;
pub mod runner;
mod setup;
pub mod state;
pub mod warmup;

pub use runner::{compute_series, run_stream, RunSummary, SignalObserver, TdError};
pub use state::{EngineState, Mask, Side};
pub use warmup::WarmupState;

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{trace, warn};

use crate::config::{ConfigError, TdConfig};
use crate::domain::Bar;
use crate::history::RollingWindow;
use crate::indicators::true_range_step;
use crate::snapshot::TdSnapshot;
use state::BarRecord;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("bar at {received} does not follow previous bar at {previous}")]
    OutOfOrder {
        previous: NaiveDateTime,
        received: NaiveDateTime,
    },

    #[error("engine stopped after an out-of-order bar; reset it before reuse")]
    Poisoned,
}

#[derive(Debug, Clone)]
pub struct TdSequential {
    config: TdConfig,
    history: RollingWindow<BarRecord>,
    state: EngineState,
    warmup: WarmupState,
    poisoned: bool,
}

impl TdSequential {
    /// Validate `config` and build an engine with empty history.
    pub fn new(config: TdConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let warmup = WarmupState::from_config(&config);
        Ok(Self {
            config,
            history: RollingWindow::default(),
            state: EngineState::new(),
            warmup,
            poisoned: false,
        })
    }

    pub fn config(&self) -> &TdConfig {
        &self.config
    }

    /// Bars accepted since construction or the last reset.
    pub fn bars_processed(&self) -> usize {
        self.warmup.bars_processed()
    }

    pub fn is_warm(&self) -> bool {
        self.warmup.is_warm()
    }

    /// Committed state after the last bar. Read-only.
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Discard all state and history. The next bar starts a fresh warm-up.
    pub fn reset(&mut self) {
        self.history.clear();
        self.state = EngineState::new();
        self.warmup.reset();
        self.poisoned = false;
    }

    /// Process one bar.
    ///
    /// Timestamps must strictly increase. A bar that does not is rejected
    /// with [`EngineError::OutOfOrder`], and every later call fails with
    /// [`EngineError::Poisoned`] until [`reset`](Self::reset).
    pub fn update(&mut self, bar: Bar) -> Result<TdSnapshot, EngineError> {
        if self.poisoned {
            return Err(EngineError::Poisoned);
        }
        let prev_close = match self.history.current() {
            Some(last) if bar.timestamp <= last.bar.timestamp => {
                warn!(
                    previous = %last.bar.timestamp,
                    received = %bar.timestamp,
                    "out-of-order bar; engine poisoned"
                );
                self.poisoned = true;
                return Err(EngineError::OutOfOrder {
                    previous: last.bar.timestamp,
                    received: bar.timestamp,
                });
            }
            Some(last) => Some(last.bar.close),
            None => None,
        };

        let index = self.warmup.bars_processed();
        let source = bar.price(self.config.data_source);
        let true_range = true_range_step(bar.high, bar.low, prev_close);
        self.history.push(BarRecord::new(bar, source, true_range));
        self.warmup.process_bar();

        if !self.warmup.is_warm() {
            trace!(index, remaining = self.warmup.bars_until_warm(), "warming up");
            return Ok(TdSnapshot::not_ready(index, bar.timestamp));
        }

        self.state.clear_events();
        setup::update(&mut self.state, &mut self.history, &self.config);
        countdown::update(&mut self.state, &self.history, &self.config);
        risk::update(&mut self.state, &self.history, &self.config);

        let snapshot = TdSnapshot::capture(index, bar.timestamp, &self.state);
        trace!(
            index,
            source,
            setup_up = ?snapshot.counts.setup_up,
            setup_down = ?snapshot.counts.setup_down,
            "bar processed"
        );
        Ok(snapshot)
    }
}

/// History built from `(close, high, low)` rows one day apart, sourced on close.
#[cfg(test)]
pub(crate) fn history_from_rows(rows: &[(f64, f64, f64)]) -> RollingWindow<BarRecord> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut history = RollingWindow::default();
    let mut prev_close = None;
    for (i, &(close, high, low)) in rows.iter().enumerate() {
        let bar = Bar::new(base + chrono::Duration::days(i as i64), close, high, low, close);
        history.push(BarRecord::new(bar, close, true_range_step(high, low, prev_close)));
        prev_close = Some(close);
    }
    history
}
