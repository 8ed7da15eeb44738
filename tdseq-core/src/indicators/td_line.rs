//! One TD Sequential output as a batch `Indicator` series.
//!
//! Warm-up bars and unset values become `f64::NAN`; flags are `1.0`/`0.0`.

use tracing::warn;

use super::Indicator;
use crate::config::{ConfigError, TdConfig};
use crate::domain::Bar;
use crate::engine::TdSequential;
use crate::snapshot::{Signal, TdSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TdOutput {
    RiskLevel,
    TrendSupport,
    TrendResistance,
    SetupSellPerfPrice,
    SetupBuyPerfPrice,
    SetupUp,
    SetupDown,
    CountdownUp,
    CountdownDown,
    Flag(Signal),
}

impl TdOutput {
    fn key(&self) -> &'static str {
        match self {
            TdOutput::RiskLevel => "risk_level",
            TdOutput::TrendSupport => "trend_support",
            TdOutput::TrendResistance => "trend_resistance",
            TdOutput::SetupSellPerfPrice => "setup_sell_perf_price",
            TdOutput::SetupBuyPerfPrice => "setup_buy_perf_price",
            TdOutput::SetupUp => "setup_up",
            TdOutput::SetupDown => "setup_down",
            TdOutput::CountdownUp => "countdown_up",
            TdOutput::CountdownDown => "countdown_down",
            TdOutput::Flag(signal) => signal.name(),
        }
    }

    fn extract(&self, snapshot: &TdSnapshot) -> f64 {
        if !snapshot.ready {
            return f64::NAN;
        }
        let prices = &snapshot.prices;
        let counts = &snapshot.counts;
        let value = match self {
            TdOutput::RiskLevel => prices.risk_level,
            TdOutput::TrendSupport => prices.trend_support,
            TdOutput::TrendResistance => prices.trend_resistance,
            TdOutput::SetupSellPerfPrice => prices.setup_sell_perf_price,
            TdOutput::SetupBuyPerfPrice => prices.setup_buy_perf_price,
            TdOutput::SetupUp => counts.setup_up.map(f64::from),
            TdOutput::SetupDown => counts.setup_down.map(f64::from),
            TdOutput::CountdownUp => counts.countdown_up.map(f64::from),
            TdOutput::CountdownDown => counts.countdown_down.map(f64::from),
            TdOutput::Flag(signal) => Some(if snapshot.signals.get(*signal) { 1.0 } else { 0.0 }),
        };
        value.unwrap_or(f64::NAN)
    }
}

#[derive(Debug, Clone)]
pub struct TdLine {
    config: TdConfig,
    output: TdOutput,
    name: String,
}

impl TdLine {
    pub fn new(config: TdConfig, output: TdOutput) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            name: format!("td_{}", output.key()),
            config,
            output,
        })
    }

    pub fn output(&self) -> TdOutput {
        self.output
    }
}

impl Indicator for TdLine {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.config.setup_lookback_bars
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut values = vec![f64::NAN; bars.len()];
        let mut engine = match TdSequential::new(self.config.clone()) {
            Ok(engine) => engine,
            Err(_) => return values,
        };
        for (i, bar) in bars.iter().enumerate() {
            match engine.update(*bar) {
                Ok(snapshot) => values[i] = self.output.extract(&snapshot),
                Err(e) => {
                    warn!(indicator = %self.name, index = i, error = %e, "series truncated");
                    break;
                }
            }
        }
        values
    }
}
