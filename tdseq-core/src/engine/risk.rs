//! Risk level: a trailing stop derived from the most significant event this bar.
//!
//! Sell-side events place the level one True Range above the highest high of
//! the relevant window; buy-side events one True Range below the lowest low.
//! With no event the previous level carries, defaulting to the current low.

use tracing::debug;

use super::state::{BarRecord, EngineState, Side};
use crate::config::TdConfig;
use crate::history::RollingWindow;
use crate::lookback::{highest, lowest};

pub(crate) fn update(
    state: &mut EngineState,
    history: &RollingWindow<BarRecord>,
    config: &TdConfig,
) {
    let Some(current) = history.current() else {
        return;
    };

    let sell = &state.sell_setup;
    let buy = &state.buy_setup;
    let level = if sell.completed.is_some() || sell.recycle.is_some() {
        offset_extreme(history, config.setup_bars, Side::Sell)
    } else if buy.completed.is_some() || buy.recycle.is_some() {
        offset_extreme(history, config.setup_bars, Side::Buy)
    } else if state.sell_countdown.completed.is_some() {
        offset_extreme(history, config.countdown_bars, Side::Sell)
    } else if state.buy_countdown.completed.is_some() {
        offset_extreme(history, config.countdown_bars, Side::Buy)
    } else {
        None
    };

    if let Some(level) = level {
        debug!(level, "risk level moved");
    }
    state.risk_level = level
        .or(state.risk_level)
        .or(Some(current.bar.low));
}

/// Extreme over `length` bars pushed out by the True Range of the bar holding it.
fn offset_extreme(history: &RollingWindow<BarRecord>, length: usize, side: Side) -> Option<f64> {
    let extreme = match side {
        Side::Sell => highest(history, length, |r| r.bar.high),
        Side::Buy => lowest(history, length, |r| r.bar.low),
    }?;
    let true_range = history.get(extreme.bars_ago)?.true_range;
    Some(match side {
        Side::Sell => extreme.value + true_range,
        Side::Buy => extreme.value - true_range,
    })
}
