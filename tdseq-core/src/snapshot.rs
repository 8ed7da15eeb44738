//! Per-bar read-only output.
//!
//! A `TdSnapshot` is built once per bar from committed engine state. Consumers
//! never see the state itself, so its layout can change without breaking them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::state::EngineState;

/// The ten boolean events, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    SetupSell,
    SetupBuy,
    SetupSellPerf,
    SetupBuyPerf,
    CountdownSell,
    CountdownBuy,
    CountdownSellDefer,
    CountdownBuyDefer,
    CountdownCountUpRecycle,
    CountdownCountDownRecycle,
}

impl Signal {
    pub const ALL: [Signal; 10] = [
        Signal::SetupSell,
        Signal::SetupBuy,
        Signal::SetupSellPerf,
        Signal::SetupBuyPerf,
        Signal::CountdownSell,
        Signal::CountdownBuy,
        Signal::CountdownSellDefer,
        Signal::CountdownBuyDefer,
        Signal::CountdownCountUpRecycle,
        Signal::CountdownCountDownRecycle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Signal::SetupSell => "setup_sell",
            Signal::SetupBuy => "setup_buy",
            Signal::SetupSellPerf => "setup_sell_perf",
            Signal::SetupBuyPerf => "setup_buy_perf",
            Signal::CountdownSell => "countdown_sell",
            Signal::CountdownBuy => "countdown_buy",
            Signal::CountdownSellDefer => "countdown_sell_defer",
            Signal::CountdownBuyDefer => "countdown_buy_defer",
            Signal::CountdownCountUpRecycle => "countdown_count_up_recycle",
            Signal::CountdownCountDownRecycle => "countdown_count_down_recycle",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Event flags for one bar. A flag is true only on the bar its event fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TdSignals {
    pub setup_sell: bool,
    pub setup_buy: bool,
    pub setup_sell_perf: bool,
    pub setup_buy_perf: bool,
    pub countdown_sell: bool,
    pub countdown_buy: bool,
    pub countdown_sell_defer: bool,
    pub countdown_buy_defer: bool,
    pub countdown_count_up_recycle: bool,
    pub countdown_count_down_recycle: bool,
}

impl TdSignals {
    pub fn get(&self, signal: Signal) -> bool {
        match signal {
            Signal::SetupSell => self.setup_sell,
            Signal::SetupBuy => self.setup_buy,
            Signal::SetupSellPerf => self.setup_sell_perf,
            Signal::SetupBuyPerf => self.setup_buy_perf,
            Signal::CountdownSell => self.countdown_sell,
            Signal::CountdownBuy => self.countdown_buy,
            Signal::CountdownSellDefer => self.countdown_sell_defer,
            Signal::CountdownBuyDefer => self.countdown_buy_defer,
            Signal::CountdownCountUpRecycle => self.countdown_count_up_recycle,
            Signal::CountdownCountDownRecycle => self.countdown_count_down_recycle,
        }
    }

    /// Signals that fired, in output order.
    pub fn fired(&self) -> impl Iterator<Item = Signal> + '_ {
        Signal::ALL.into_iter().filter(|s| self.get(*s))
    }

    pub fn any(&self) -> bool {
        self.fired().next().is_some()
    }
}

/// Price series for renderers. Event prices are `Some` only on their firing
/// bar; perfection prices, TDST levels and the risk level are latched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TdPrices {
    pub setup_sell_price: Option<f64>,
    pub setup_buy_price: Option<f64>,
    pub setup_sell_perf_price: Option<f64>,
    pub setup_buy_perf_price: Option<f64>,
    pub trend_support: Option<f64>,
    pub trend_resistance: Option<f64>,
    pub countdown_sell_price: Option<f64>,
    pub countdown_buy_price: Option<f64>,
    pub countdown_sell_defer_price: Option<f64>,
    pub countdown_buy_defer_price: Option<f64>,
    pub risk_level: Option<f64>,
}

/// Running counters, for count markers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TdCounts {
    pub setup_up: Option<u32>,
    pub setup_down: Option<u32>,
    pub countdown_up: Option<u32>,
    pub countdown_down: Option<u32>,
    pub countdown_up_imp: Option<u32>,
    pub countdown_down_imp: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TdSnapshot {
    /// Zero-based position of the bar in its stream.
    pub index: usize,
    pub timestamp: NaiveDateTime,
    /// False during warm-up; every other field is then empty.
    pub ready: bool,
    pub signals: TdSignals,
    pub prices: TdPrices,
    pub counts: TdCounts,
}

impl TdSnapshot {
    pub fn not_ready(index: usize, timestamp: NaiveDateTime) -> Self {
        Self {
            index,
            timestamp,
            ready: false,
            signals: TdSignals::default(),
            prices: TdPrices::default(),
            counts: TdCounts::default(),
        }
    }

    pub(crate) fn capture(index: usize, timestamp: NaiveDateTime, state: &EngineState) -> Self {
        let (sell, buy) = (&state.sell_setup, &state.buy_setup);
        let (sell_cd, buy_cd) = (&state.sell_countdown, &state.buy_countdown);

        let signals = TdSignals {
            setup_sell: sell.completed.is_some(),
            setup_buy: buy.completed.is_some(),
            setup_sell_perf: sell.perfected.is_some(),
            setup_buy_perf: buy.perfected.is_some(),
            countdown_sell: sell_cd.completed.is_some(),
            countdown_buy: buy_cd.completed.is_some(),
            countdown_sell_defer: sell_cd.deferred.is_some(),
            countdown_buy_defer: buy_cd.deferred.is_some(),
            countdown_count_up_recycle: sell.recycle.is_some(),
            countdown_count_down_recycle: buy.recycle.is_some(),
        };
        let prices = TdPrices {
            setup_sell_price: sell.completed,
            setup_buy_price: buy.completed,
            setup_sell_perf_price: sell.perf_price,
            setup_buy_perf_price: buy.perf_price,
            trend_support: sell.trend_level,
            trend_resistance: buy.trend_level,
            countdown_sell_price: sell_cd.completed,
            countdown_buy_price: buy_cd.completed,
            countdown_sell_defer_price: sell_cd.deferred,
            countdown_buy_defer_price: buy_cd.deferred,
            risk_level: state.risk_level,
        };
        let counts = TdCounts {
            setup_up: sell.count,
            setup_down: buy.count,
            countdown_up: sell_cd.count,
            countdown_down: buy_cd.count,
            countdown_up_imp: sell_cd.count_imp,
            countdown_down_imp: buy_cd.count_imp,
        };

        Self {
            index,
            timestamp,
            ready: true,
            signals,
            prices,
            counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn not_ready_is_empty() {
        let snap = TdSnapshot::not_ready(2, ts());
        assert!(!snap.ready);
        assert!(!snap.signals.any());
        assert_eq!(snap.prices, TdPrices::default());
        assert_eq!(snap.counts.setup_up, None);
    }

    #[test]
    fn flags_follow_fresh_prices() {
        let mut state = EngineState::new();
        state.sell_setup.completed = Some(101.0);
        state.sell_setup.trend_level = Some(95.0);
        state.buy_countdown.deferred = Some(90.0);
        state.risk_level = Some(99.0);

        let snap = TdSnapshot::capture(10, ts(), &state);
        assert!(snap.ready);
        assert!(snap.signals.setup_sell);
        assert!(snap.signals.countdown_buy_defer);
        assert!(!snap.signals.setup_buy);
        assert_eq!(
            snap.signals.fired().collect::<Vec<_>>(),
            vec![Signal::SetupSell, Signal::CountdownBuyDefer]
        );
        assert_eq!(snap.prices.setup_sell_price, Some(101.0));
        assert_eq!(snap.prices.trend_support, Some(95.0));
        assert_eq!(snap.prices.risk_level, Some(99.0));
    }

    #[test]
    fn latched_levels_do_not_raise_flags() {
        let mut state = EngineState::new();
        state.sell_setup.perf_price = Some(110.0);
        state.buy_setup.trend_level = Some(120.0);
        let snap = TdSnapshot::capture(0, ts(), &state);
        assert!(!snap.signals.any());
        assert_eq!(snap.prices.setup_sell_perf_price, Some(110.0));
    }

    #[test]
    fn signal_names_are_snake_case() {
        assert_eq!(Signal::CountdownCountUpRecycle.to_string(), "countdown_count_up_recycle");
        let json = serde_json::to_string(&Signal::SetupBuyPerf).unwrap();
        assert_eq!(json, "\"setup_buy_perf\"");
    }

    #[test]
    fn snapshot_json_roundtrip() {
        let snap = TdSnapshot::not_ready(0, ts());
        let json = serde_json::to_string(&snap).unwrap();
        let back: TdSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
