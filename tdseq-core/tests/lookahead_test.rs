//! Look-ahead contamination and determinism tests.
//!
//! No output at bar t may depend on bar t+1 or later. Method: compute on a
//! truncated series and on the full series and require the shared prefix to
//! be identical. Any difference means future data leaked into past values.

use chrono::NaiveDate;
use tdseq_core::indicators::{Indicator, TdLine, TdOutput};
use tdseq_core::{compute_series, Bar, PriceSource, Signal, TdConfig};

/// Deterministic pseudo-random walk using a simple LCG.
fn make_test_bars(n: usize) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed >> 33) % 200) as f64 * 0.05 - 5.0; // -5.0 to +5.0
        price = (price + change).max(10.0);

        let open = price - 0.5;
        let close = price + 0.3;
        let high = open.max(close) + 2.0;
        let low = open.min(close) - 2.0;
        bars.push(Bar::new(
            base + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
        ));
    }
    bars
}

fn assert_no_lookahead(indicator: &dyn Indicator, full_bars: &[Bar], truncated_len: usize) {
    let truncated = &full_bars[..truncated_len];
    let full_result = indicator.compute(full_bars);
    let truncated_result = indicator.compute(truncated);

    assert_eq!(
        truncated_result.len(),
        truncated_len,
        "{}: truncated result length mismatch",
        indicator.name()
    );
    assert_eq!(
        full_result.len(),
        full_bars.len(),
        "{}: full result length mismatch",
        indicator.name()
    );

    for i in 0..truncated_len {
        let t = truncated_result[i];
        let f = full_result[i];

        if t.is_nan() && f.is_nan() {
            continue;
        }

        assert!(
            !t.is_nan() && !f.is_nan(),
            "{}: NaN mismatch at bar {i} (truncated={t}, full={f})",
            indicator.name()
        );

        assert!(
            (t - f).abs() < 1e-10,
            "{}: look-ahead contamination at bar {i}: truncated={t}, full={f}",
            indicator.name()
        );
    }
}

fn all_outputs() -> Vec<TdOutput> {
    let mut outputs = vec![
        TdOutput::RiskLevel,
        TdOutput::TrendSupport,
        TdOutput::TrendResistance,
        TdOutput::SetupSellPerfPrice,
        TdOutput::SetupBuyPerfPrice,
        TdOutput::SetupUp,
        TdOutput::SetupDown,
        TdOutput::CountdownUp,
        TdOutput::CountdownDown,
    ];
    outputs.extend(Signal::ALL.into_iter().map(TdOutput::Flag));
    outputs
}

#[test]
fn lookahead_default_config() {
    let bars = make_test_bars(200);
    for output in all_outputs() {
        let line = TdLine::new(TdConfig::default(), output).unwrap();
        assert_no_lookahead(&line, &bars, 100);
    }
}

#[test]
fn lookahead_aggressive_extended_config() {
    let config = TdConfig {
        data_source: PriceSource::High,
        setup_bars: 6,
        setup_lookback_bars: 2,
        setup_equal_enable: true,
        setup_trend_extend: true,
        countdown_bars: 8,
        countdown_qual_bar: 5,
        countdown_aggressive: true,
        ..TdConfig::default()
    };
    let bars = make_test_bars(200);
    for output in all_outputs() {
        let line = TdLine::new(config.clone(), output).unwrap();
        assert_no_lookahead(&line, &bars, 137);
    }
}

#[test]
fn lookahead_beyond_history_capacity() {
    // Longer than the 200-bar rolling window.
    let bars = make_test_bars(600);
    let full = compute_series(&TdConfig::default(), &bars).unwrap();
    let truncated = compute_series(&TdConfig::default(), &bars[..450]).unwrap();
    assert_eq!(&full[..450], &truncated[..]);
}

#[test]
fn replay_is_deterministic() {
    let bars = make_test_bars(300);
    let config = TdConfig::default();
    let first = compute_series(&config, &bars).unwrap();
    let second = compute_series(&config, &bars).unwrap();
    assert_eq!(first, second);
}

#[test]
fn walk_produces_events() {
    // Guard against a vacuous look-ahead test: the walk must exercise setups.
    let config = TdConfig {
        setup_bars: 4,
        ..TdConfig::default()
    };
    let bars = make_test_bars(200);
    let snaps = compute_series(&config, &bars).unwrap();
    let setups = snaps
        .iter()
        .filter(|s| s.signals.setup_sell || s.signals.setup_buy)
        .count();
    assert!(setups > 0, "random walk produced no setups");
}
