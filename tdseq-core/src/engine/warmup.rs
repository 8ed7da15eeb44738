//! Warm-up tracking.
//!
//! Outputs are "not ready" until `setup_lookback_bars + 1` bars have been
//! seen, since the first price flip compares against a bar that far back.

use crate::config::TdConfig;

#[derive(Debug, Clone)]
pub struct WarmupState {
    warmup_bars: usize,
    bars_processed: usize,
}

impl WarmupState {
    pub fn new(warmup_bars: usize) -> Self {
        Self {
            warmup_bars,
            bars_processed: 0,
        }
    }

    pub fn from_config(config: &TdConfig) -> Self {
        Self::new(config.warmup_bars())
    }

    pub fn process_bar(&mut self) {
        self.bars_processed += 1;
    }

    pub fn bars_processed(&self) -> usize {
        self.bars_processed
    }

    pub fn is_warm(&self) -> bool {
        self.bars_processed >= self.warmup_bars
    }

    pub fn bars_until_warm(&self) -> usize {
        self.warmup_bars.saturating_sub(self.bars_processed)
    }

    pub fn reset(&mut self) {
        self.bars_processed = 0;
    }
}
