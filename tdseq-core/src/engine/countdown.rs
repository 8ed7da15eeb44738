//! Countdown stage: counters, important samples, qualification and events.
//!
//! Reads setup results committed earlier in the same bar. A side's counter is
//! frozen (held, never advanced) when the opposite setup completes, when the
//! source breaches the side's TDST level, or when either setup count recycles.
//! A same-side setup completion arms a new cycle.

use tracing::debug;

use super::state::{BarRecord, EngineState, Mask, Side};
use crate::config::TdConfig;
use crate::history::RollingWindow;

pub(crate) fn update(
    state: &mut EngineState,
    history: &RollingWindow<BarRecord>,
    config: &TdConfig,
) {
    let Some(current) = history.current() else {
        return;
    };
    for side in Side::BOTH {
        let price_hit = price_condition(history, config, side);
        let important = update_count(state, current, side, price_hit);
        if important {
            qualify(state, current, config, side);
        }
    }
}

/// Directional countdown condition against the bar `countdown_lookback_bars`
/// back. `None` until that bar exists.
fn price_condition(history: &RollingWindow<BarRecord>, config: &TdConfig, side: Side) -> Option<bool> {
    let current = history.current()?;
    let past = history.get(config.countdown_lookback_bars)?;
    let price = if config.countdown_aggressive {
        side.extreme_price(&current.bar)
    } else {
        current.source
    };
    Some(side.reaches(price, side.extreme_price(&past.bar)))
}

fn is_guarded(state: &EngineState, current: &BarRecord, side: Side) -> bool {
    let breached = match (side, state.setup(side).trend_level) {
        (Side::Sell, Some(support)) => current.source < support,
        (Side::Buy, Some(resistance)) => current.source > resistance,
        (_, None) => false,
    };
    state.setup(side.opposite()).completed.is_some() || breached || state.any_recycle()
}

/// Advance or arm the counter. Returns true when the bar is important: the
/// price condition fired and the counter moved.
fn update_count(state: &mut EngineState, current: &BarRecord, side: Side, price_hit: Option<bool>) -> bool {
    let Some(hit) = price_hit else {
        return false;
    };
    if is_guarded(state, current, side) {
        return false;
    }

    let armed = state.setup(side).completed.is_some();
    let countdown = state.countdown_mut(side);
    if armed {
        countdown.count = Some(u32::from(hit));
        countdown.qual_mask = Mask::Unset;
    } else if let Some(count) = countdown.count {
        if hit {
            countdown.count = Some(count + 1);
        }
    } else {
        return false;
    }

    if hit {
        countdown.count_imp = countdown.count;
    }
    hit
}

fn qualify(state: &mut EngineState, current: &BarRecord, config: &TdConfig, side: Side) {
    let countdown = state.countdown_mut(side);
    let Some(imp) = countdown.count_imp else {
        return;
    };
    let imp = imp as usize;
    let extreme = side.extreme_price(&current.bar);

    let newly_qualified = if config.qualification_enabled() {
        if imp == config.countdown_qual_bar {
            countdown.qual_price = Some(current.source);
        }
        if imp == config.countdown_bars {
            let hit = countdown.qual_price.is_some_and(|q| side.reaches(extreme, q));
            countdown.qual_mask = if hit { Mask::Qualified } else { Mask::Deferred };
            hit
        } else if imp > config.countdown_bars && countdown.qual_mask == Mask::Deferred {
            let hit = countdown.qual_price.is_some_and(|q| side.reaches(extreme, q));
            if hit {
                countdown.qual_mask = Mask::Qualified;
            }
            hit
        } else {
            false
        }
    } else if imp == config.countdown_bars {
        countdown.qual_mask = Mask::Qualified;
        true
    } else {
        false
    };

    if newly_qualified {
        countdown.completed = Some(current.source);
        debug!(?side, price = current.source, count = imp, "countdown completed");
    } else if countdown.qual_mask == Mask::Deferred {
        countdown.deferred = Some(current.source);
        debug!(?side, price = current.source, count = imp, "countdown deferred");
    }
}
