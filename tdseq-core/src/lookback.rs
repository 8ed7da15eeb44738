//! Lookback primitives over a `RollingWindow`.
//!
//! All functions are pure: they read the window and nothing else. Distances
//! are measured in bars back from the current entry (0 = current). A NaN
//! condition or value never matches.

use crate::history::RollingWindow;

/// An extreme value and how many bars back it sits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extreme {
    pub value: f64,
    pub bars_ago: usize,
}

/// Distance to the `occurrence`-th most recent entry (0 = most recent) for
/// which `cond` holds. `None` if there are not that many matches in the window.
pub fn bars_since<T>(
    window: &RollingWindow<T>,
    occurrence: usize,
    cond: impl Fn(&T) -> bool,
) -> Option<usize> {
    window
        .iter()
        .enumerate()
        .filter(|(_, item)| cond(item))
        .nth(occurrence)
        .map(|(ago, _)| ago)
}

/// `value` at the entry located by [`bars_since`].
pub fn value_when<T, V>(
    window: &RollingWindow<T>,
    occurrence: usize,
    cond: impl Fn(&T) -> bool,
    value: impl Fn(&T) -> V,
) -> Option<V> {
    let ago = bars_since(window, occurrence, cond)?;
    window.get(ago).map(value)
}

fn extreme<T>(
    window: &RollingWindow<T>,
    length: usize,
    value: impl Fn(&T) -> f64,
    better: impl Fn(f64, f64) -> bool,
) -> Option<Extreme> {
    let mut best: Option<Extreme> = None;
    for (ago, item) in window.iter().take(length).enumerate() {
        let v = value(item);
        if v.is_nan() {
            continue;
        }
        // Strict comparison: on ties the most recent bar wins.
        match best {
            Some(b) if !better(v, b.value) => {}
            _ => best = Some(Extreme { value: v, bars_ago: ago }),
        }
    }
    best
}

/// Maximum of `value` over the last `length` entries (current included).
pub fn highest<T>(
    window: &RollingWindow<T>,
    length: usize,
    value: impl Fn(&T) -> f64,
) -> Option<Extreme> {
    extreme(window, length, value, |candidate, best| candidate > best)
}

/// Minimum of `value` over the last `length` entries (current included).
pub fn lowest<T>(
    window: &RollingWindow<T>,
    length: usize,
    value: impl Fn(&T) -> f64,
) -> Option<Extreme> {
    extreme(window, length, value, |candidate, best| candidate < best)
}

/// Bars back to the highest `value` over the last `length` entries.
pub fn highest_bars<T>(
    window: &RollingWindow<T>,
    length: usize,
    value: impl Fn(&T) -> f64,
) -> Option<usize> {
    highest(window, length, value).map(|e| e.bars_ago)
}

/// Bars back to the lowest `value` over the last `length` entries.
pub fn lowest_bars<T>(
    window: &RollingWindow<T>,
    length: usize,
    value: impl Fn(&T) -> f64,
) -> Option<usize> {
    lowest(window, length, value).map(|e| e.bars_ago)
}
