//! Setup stage: price-flip counts, completion, perfection, TDST and recycle.
//!
//! Runs once per warm bar, after the current bar's record has been pushed to
//! history. Writes the setup counts and completion flags back into that record
//! so later lookbacks can see them.

use tracing::debug;

use super::state::{BarRecord, EngineState, Mask, Side};
use crate::config::TdConfig;
use crate::history::RollingWindow;
use crate::lookback::{bars_since, highest, lowest, value_when};

pub(crate) fn update(
    state: &mut EngineState,
    history: &mut RollingWindow<BarRecord>,
    config: &TdConfig,
) {
    update_counts(state, history, config);
    for side in Side::BOTH {
        complete(state, history, config, side);
    }
    for side in Side::BOTH {
        update_perfection(state, history, config, side);
    }
    for side in Side::BOTH {
        update_trend_level(state, history, config, side);
    }
    for side in Side::BOTH {
        update_recycle(state, history, config, side);
    }
    for side in Side::BOTH {
        state.setup_mut(side).bars_since_completed = bars_since(history, 0, |r| r.setup_fired(side));
    }
}

/// A flip continues the previous run; any other bar ends it.
fn update_counts(
    state: &mut EngineState,
    history: &mut RollingWindow<BarRecord>,
    config: &TdConfig,
) {
    let (source, prior) = match (history.get(0), history.get(config.setup_lookback_bars)) {
        (Some(current), Some(past)) => (current.source, past.source),
        _ => return,
    };
    let equal = source == prior;

    for side in Side::BOTH {
        let previous = state.setup(side).count;
        let continues = config.setup_equal_enable && equal && previous.is_some_and(|c| c > 0);
        let count = if side.flips(source, prior) || continues {
            Some(previous.unwrap_or(0) + 1)
        } else {
            None
        };

        state.setup_mut(side).count = count;
        if let Some(record) = history.current_mut() {
            record.set_setup_count(side, count);
        }
    }
}

fn complete(
    state: &mut EngineState,
    history: &mut RollingWindow<BarRecord>,
    config: &TdConfig,
    side: Side,
) {
    let setup = state.setup_mut(side);
    if setup.count == Some(config.setup_bars as u32) {
        if let Some(record) = history.current_mut() {
            record.mark_setup(side);
            setup.completed = Some(record.source);
            debug!(?side, price = record.source, "setup completed");
        }
    }
}

/// The more extreme of the prices recorded at counts
/// `setup_bars - perf_lookback` and `setup_bars - perf_lookback + 1`.
fn perfection_price(history: &RollingWindow<BarRecord>, config: &TdConfig, side: Side) -> Option<f64> {
    let first = config.setup_bars as i64 - config.setup_perf_lookback as i64;
    let at = |count: i64| {
        let count = u32::try_from(count).ok().filter(|c| *c > 0)?;
        value_when(
            history,
            0,
            |r| r.setup_count(side) == Some(count),
            |r| side.extreme_price(&r.bar),
        )
    };

    match (at(first), at(first + 1)) {
        (Some(a), Some(b)) => Some(side.more_extreme(a, b)),
        (a, b) => a.or(b),
    }
}

fn update_perfection(
    state: &mut EngineState,
    history: &RollingWindow<BarRecord>,
    config: &TdConfig,
    side: Side,
) {
    let Some(current) = history.current() else {
        return;
    };
    let opposing = state.setup(side.opposite()).completed.is_some();
    let setup = state.setup_mut(side);

    if setup.completed.is_some() {
        setup.perf_price = perfection_price(history, config, side);
    }
    // An opposite completion cancels any pending perfection.
    if opposing {
        setup.perf_mask = Mask::Unset;
        return;
    }

    let extreme = side.extreme_price(&current.bar);
    let newly_qualified = if setup.completed.is_some() {
        let pre_completion = value_when(
            history,
            0,
            |r| r.setup_count(side) == Some(config.setup_bars as u32 - 1),
            |r| side.extreme_price(&r.bar),
        );
        let hit = setup.perf_price.is_some_and(|price| {
            pre_completion.is_some_and(|e| side.reaches(e, price)) || side.reaches(extreme, price)
        });
        setup.perf_mask = if hit { Mask::Qualified } else { Mask::Deferred };
        hit
    } else if setup.perf_mask == Mask::Deferred {
        let hit = setup.perf_price.is_some_and(|price| side.reaches(extreme, price));
        if hit {
            setup.perf_mask = Mask::Qualified;
        }
        hit
    } else {
        false
    };

    if newly_qualified {
        setup.perfected = Some(current.source);
        debug!(?side, price = current.source, "setup perfected");
    }
}

/// TDST: sell setups set support from lows, buy setups set resistance from highs.
fn update_trend_level(
    state: &mut EngineState,
    history: &RollingWindow<BarRecord>,
    config: &TdConfig,
    side: Side,
) {
    if state.setup(side).completed.is_none() {
        return;
    }

    let n = config.setup_bars;
    let mut window = n;
    if config.setup_trend_extend {
        // Still the prior bar's distance: ages are refreshed after this stage.
        let previous = state.setup(side).bars_since_completed;
        if let Some(c) = previous.filter(|c| *c > 0) {
            window = (c / n + 1) * n;
        }
    }

    let level = match side {
        Side::Sell => lowest(history, window, |r| r.bar.low),
        Side::Buy => highest(history, window, |r| r.bar.high),
    };
    if let Some(level) = level {
        state.setup_mut(side).trend_level = Some(level.value);
        debug!(?side, level = level.value, window, "trend level set");
    }
}

fn update_recycle(
    state: &mut EngineState,
    history: &RollingWindow<BarRecord>,
    config: &TdConfig,
    side: Side,
) {
    let Some(current) = history.current() else {
        return;
    };
    let setup = state.setup_mut(side);
    if setup.count == Some(2 * config.setup_bars as u32) {
        setup.recycle = Some(current.source);
        debug!(?side, price = current.source, "setup count recycled");
    }
}
