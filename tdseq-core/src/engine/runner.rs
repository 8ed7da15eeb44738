//! Push-model driver and batch helper.
//!
//! `run_stream` feeds bars one at a time into an engine and hands every
//! snapshot to a read-only observer. Observers get `&TdSnapshot` and nothing
//! else, so they cannot feed back into the engine.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::{EngineError, TdSequential};
use crate::config::{ConfigError, TdConfig};
use crate::data::DataError;
use crate::domain::Bar;
use crate::snapshot::{Signal, TdSnapshot};

/// Any failure from config, data or engine.
#[derive(Debug, Error)]
pub enum TdError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Read-only consumer of per-bar output (renderer, alert relay, strategy).
pub trait SignalObserver {
    fn on_snapshot(&mut self, snapshot: &TdSnapshot);
}

impl SignalObserver for Vec<TdSnapshot> {
    fn on_snapshot(&mut self, snapshot: &TdSnapshot) {
        self.push(snapshot.clone());
    }
}

/// Totals for one replay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub bars: usize,
    pub ready_bars: usize,
    /// Fired count per signal. Signals that never fired are absent.
    pub events: BTreeMap<Signal, usize>,
}

impl RunSummary {
    pub fn count(&self, signal: Signal) -> usize {
        self.events.get(&signal).copied().unwrap_or(0)
    }

    pub fn total_events(&self) -> usize {
        self.events.values().sum()
    }

    fn record(&mut self, snapshot: &TdSnapshot) {
        self.bars += 1;
        if snapshot.ready {
            self.ready_bars += 1;
        }
        for signal in snapshot.signals.fired() {
            *self.events.entry(signal).or_insert(0) += 1;
        }
    }
}

/// Feed `bars` through `engine`, notifying `observer` after each bar.
///
/// Stops at the first engine error; bars before it have already been observed.
pub fn run_stream<I>(
    engine: &mut TdSequential,
    bars: I,
    observer: &mut dyn SignalObserver,
) -> Result<RunSummary, EngineError>
where
    I: IntoIterator<Item = Bar>,
{
    let mut summary = RunSummary::default();
    for bar in bars {
        let snapshot = engine.update(bar)?;
        if snapshot.signals.any() {
            debug!(
                index = snapshot.index,
                timestamp = %snapshot.timestamp,
                signals = ?snapshot.signals.fired().collect::<Vec<_>>(),
                "events"
            );
        }
        summary.record(&snapshot);
        observer.on_snapshot(&snapshot);
    }
    info!(
        bars = summary.bars,
        ready = summary.ready_bars,
        events = summary.total_events(),
        "stream complete"
    );
    Ok(summary)
}

/// Run a fresh engine over a whole series and collect every snapshot.
pub fn compute_series(config: &TdConfig, bars: &[Bar]) -> Result<Vec<TdSnapshot>, TdError> {
    let mut engine = TdSequential::new(config.clone())?;
    let mut snapshots = Vec::with_capacity(bars.len());
    run_stream(&mut engine, bars.iter().copied(), &mut snapshots)?;
    Ok(snapshots)
}
