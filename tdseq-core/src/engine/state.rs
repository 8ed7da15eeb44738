//! Mutable engine state, history records, and the sell/buy mirror helpers.
//!
//! Every field that is "unset until first written" is an `Option`. Fields
//! documented as *fresh* hold a value only on the bar their event fired and
//! are cleared by [`EngineState::clear_events`] before each bar; every other
//! field is a latched level that carries forward until its trigger recurs.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;

/// Progress of a perfection or qualification test within one cycle.
///
/// Within a cycle the mask only moves forward: `Unset → Deferred → Qualified`
/// or `Unset → Qualified`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mask {
    #[default]
    Unset,
    Deferred,
    Qualified,
}

/// Which half of the indicator a piece of state belongs to.
///
/// `Sell` is driven by upward price flips (setup `count_up`, countdown
/// `count_up`) and tests highs; `Buy` mirrors it with downward flips and lows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Sell,
    Buy,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Sell, Side::Buy];

    pub fn opposite(self) -> Side {
        match self {
            Side::Sell => Side::Buy,
            Side::Buy => Side::Sell,
        }
    }

    /// High for the sell side, low for the buy side.
    pub fn extreme_price(self, bar: &Bar) -> f64 {
        match self {
            Side::Sell => bar.high,
            Side::Buy => bar.low,
        }
    }

    /// Whether `price` reaches `level` in this side's direction (`>=` / `<=`).
    /// NaN on either side never reaches.
    pub fn reaches(self, price: f64, level: f64) -> bool {
        match self {
            Side::Sell => price >= level,
            Side::Buy => price <= level,
        }
    }

    /// Strict price flip against the lookback price (`>` / `<`).
    pub fn flips(self, price: f64, prior: f64) -> bool {
        match self {
            Side::Sell => price > prior,
            Side::Buy => price < prior,
        }
    }

    /// The more extreme of two prices in this side's direction.
    pub fn more_extreme(self, a: f64, b: f64) -> f64 {
        match self {
            Side::Sell => a.max(b),
            Side::Buy => a.min(b),
        }
    }
}

/// One bar of history plus the derived series the lookback primitives read.
#[derive(Debug, Clone)]
pub struct BarRecord {
    pub bar: Bar,
    pub source: f64,
    pub true_range: f64,
    pub sell_count: Option<u32>,
    pub buy_count: Option<u32>,
    pub sell_setup: bool,
    pub buy_setup: bool,
}

impl BarRecord {
    pub fn new(bar: Bar, source: f64, true_range: f64) -> Self {
        Self {
            bar,
            source,
            true_range,
            sell_count: None,
            buy_count: None,
            sell_setup: false,
            buy_setup: false,
        }
    }

    pub fn setup_count(&self, side: Side) -> Option<u32> {
        match side {
            Side::Sell => self.sell_count,
            Side::Buy => self.buy_count,
        }
    }

    pub fn set_setup_count(&mut self, side: Side, count: Option<u32>) {
        match side {
            Side::Sell => self.sell_count = count,
            Side::Buy => self.buy_count = count,
        }
    }

    pub fn setup_fired(&self, side: Side) -> bool {
        match side {
            Side::Sell => self.sell_setup,
            Side::Buy => self.buy_setup,
        }
    }

    pub fn mark_setup(&mut self, side: Side) {
        match side {
            Side::Sell => self.sell_setup = true,
            Side::Buy => self.buy_setup = true,
        }
    }
}

/// Setup state for one side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetupSide {
    /// Consecutive flip count; unset on bars where the run is broken.
    pub count: Option<u32>,
    /// Fresh: source price on the completion bar.
    pub completed: Option<f64>,
    /// Latched perfection threshold.
    pub perf_price: Option<f64>,
    pub perf_mask: Mask,
    /// Fresh: source price on the bar perfection first qualifies.
    pub perfected: Option<f64>,
    /// Bars since this side's last completion, as of the end of the last bar.
    pub bars_since_completed: Option<usize>,
    /// Latched TDST level: support for the sell side, resistance for the buy side.
    pub trend_level: Option<f64>,
    /// Fresh: source price when the count reaches twice the setup length.
    pub recycle: Option<f64>,
}

/// Countdown state for one side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountdownSide {
    pub count: Option<u32>,
    /// Count sampled on bars where the price condition fired and the counter advanced.
    pub count_imp: Option<u32>,
    /// Latched source price at the qualifier bar.
    pub qual_price: Option<f64>,
    pub qual_mask: Mask,
    /// Fresh: source price on the bar the completion first qualifies.
    pub completed: Option<f64>,
    /// Fresh: source price on each important bar the completion reads deferred.
    pub deferred: Option<f64>,
}

/// Mutable state that evolves bar by bar for one symbol/timeframe stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineState {
    pub sell_setup: SetupSide,
    pub buy_setup: SetupSide,
    pub sell_countdown: CountdownSide,
    pub buy_countdown: CountdownSide,
    /// Latched trailing risk level; never unset again once written.
    pub risk_level: Option<f64>,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn setup(&self, side: Side) -> &SetupSide {
        match side {
            Side::Sell => &self.sell_setup,
            Side::Buy => &self.buy_setup,
        }
    }

    pub fn setup_mut(&mut self, side: Side) -> &mut SetupSide {
        match side {
            Side::Sell => &mut self.sell_setup,
            Side::Buy => &mut self.buy_setup,
        }
    }

    pub fn countdown(&self, side: Side) -> &CountdownSide {
        match side {
            Side::Sell => &self.sell_countdown,
            Side::Buy => &self.buy_countdown,
        }
    }

    pub fn countdown_mut(&mut self, side: Side) -> &mut CountdownSide {
        match side {
            Side::Sell => &mut self.sell_countdown,
            Side::Buy => &mut self.buy_countdown,
        }
    }

    /// Whether either side's setup count hit the recycle threshold this bar.
    pub fn any_recycle(&self) -> bool {
        self.sell_setup.recycle.is_some() || self.buy_setup.recycle.is_some()
    }

    /// Drop every fresh (single-bar) event before a new bar is processed.
    pub fn clear_events(&mut self) {
        for side in Side::BOTH {
            let setup = self.setup_mut(side);
            setup.completed = None;
            setup.perfected = None;
            setup.recycle = None;

            let countdown = self.countdown_mut(side);
            countdown.completed = None;
            countdown.deferred = None;
        }
    }
}
