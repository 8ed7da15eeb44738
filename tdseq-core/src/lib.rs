//! tdseq core: the TD Sequential signal engine.
//!
//! This crate contains:
//! - Domain types (`Bar`) and validated configuration (`TdConfig`)
//! - A bounded rolling history and pure lookback primitives over it
//! - The bar-by-bar engine: setup, perfection, TDST, countdown,
//!   qualification/deferral, recycle, risk level
//! - A read-only per-bar snapshot and the observer/driver around it
//! - A CSV bar feed and a batch `Indicator` view of the outputs

pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod history;
pub mod indicators;
pub mod lookback;
pub mod snapshot;

pub use config::{ConfigError, PriceSource, TdConfig};
pub use domain::Bar;
pub use engine::{
    compute_series, run_stream, EngineError, RunSummary, SignalObserver, TdError, TdSequential,
};
pub use snapshot::{Signal, TdCounts, TdPrices, TdSignals, TdSnapshot};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: engine and output types are Send + Sync, so a
    /// caller can move an engine onto a worker thread.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Bar>();
        require_sync::<Bar>();
        require_send::<TdConfig>();
        require_sync::<TdConfig>();

        require_send::<TdSequential>();
        require_sync::<TdSequential>();
        require_send::<engine::EngineState>();
        require_sync::<engine::EngineState>();
        require_send::<history::RollingWindow<engine::state::BarRecord>>();
        require_sync::<history::RollingWindow<engine::state::BarRecord>>();

        require_send::<TdSnapshot>();
        require_sync::<TdSnapshot>();
        require_send::<RunSummary>();
        require_sync::<RunSummary>();

        require_send::<EngineError>();
        require_sync::<EngineError>();
        require_send::<TdError>();
        require_sync::<TdError>();

        require_send::<indicators::TdLine>();
        require_sync::<indicators::TdLine>();

        // Observers get a shared snapshot and no handle to the engine.
        fn notify(observer: &mut dyn SignalObserver, snapshot: &TdSnapshot) {
            observer.on_snapshot(snapshot);
        }
        let _ = notify;
    }
}
