//! Engine configuration.
//!
//! `TdConfig` is an immutable value validated once, before the engine accepts
//! its first bar. It is serde-deserializable from TOML with every field
//! optional (missing fields fall back to the traditional TD Sequential
//! parameters), and carries a blake3 fingerprint so that output produced by a
//! run can be traced back to the exact parameters that generated it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const SETUP_BARS_RANGE: RangeInclusive<usize> = 4..=31;
pub const SETUP_LOOKBACK_BARS_RANGE: RangeInclusive<usize> = 1..=14;
pub const SETUP_PERF_LOOKBACK_RANGE: RangeInclusive<usize> = 1..=14;
pub const COUNTDOWN_BARS_RANGE: RangeInclusive<usize> = 3..=31;
pub const COUNTDOWN_LOOKBACK_BARS_RANGE: RangeInclusive<usize> = 1..=30;
pub const COUNTDOWN_QUAL_BAR_RANGE: RangeInclusive<usize> = 3..=30;

/// Which bar field feeds the price-flip and countdown comparisons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    #[default]
    Close,
    High,
    Low,
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PriceSource::Close => "close",
            PriceSource::High => "high",
            PriceSource::Low => "low",
        };
        f.write_str(s)
    }
}

impl FromStr for PriceSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "close" => Ok(PriceSource::Close),
            "high" => Ok(PriceSource::High),
            "low" => Ok(PriceSource::Low),
            other => Err(ConfigError::UnknownSource(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} = {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },

    #[error("unknown data source '{0}' (expected close, high or low)")]
    UnknownSource(String),

    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// TD Sequential parameters.
///
/// Defaults are the traditional values: 9-bar setups compared 4 bars back,
/// 13-bar countdowns compared 2 bars back and qualified at bar 8.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TdConfig {
    /// Price used for flips and countdown comparisons.
    pub data_source: PriceSource,
    /// Setup count that completes a Buy/Sell Setup.
    pub setup_bars: usize,
    /// Bars back to compare for each price flip.
    pub setup_lookback_bars: usize,
    /// Perfection compares counts `setup_bars - n` and `setup_bars - n + 1`.
    pub setup_perf_lookback: usize,
    /// Let an equal price continue a running setup.
    pub setup_equal_enable: bool,
    /// Stretch the TDST window back to the previous setup of the same side.
    pub setup_trend_extend: bool,
    /// Countdown count that completes a Buy/Sell Countdown.
    pub countdown_bars: usize,
    /// Bars back to compare for each countdown increment.
    pub countdown_lookback_bars: usize,
    /// Countdown bar whose price qualifies the completion bar.
    /// Qualification is disabled when this is >= `countdown_bars`.
    pub countdown_qual_bar: usize,
    /// Compare high/low against high/low instead of the source price.
    pub countdown_aggressive: bool,
}

impl Default for TdConfig {
    fn default() -> Self {
        Self {
            data_source: PriceSource::Close,
            setup_bars: 9,
            setup_lookback_bars: 4,
            setup_perf_lookback: 3,
            setup_equal_enable: false,
            setup_trend_extend: false,
            countdown_bars: 13,
            countdown_lookback_bars: 2,
            countdown_qual_bar: 8,
            countdown_aggressive: false,
        }
    }
}

fn check_range(
    field: &'static str,
    value: usize,
    range: &RangeInclusive<usize>,
) -> Result<(), ConfigError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

impl TdConfig {
    /// Reject any parameter outside its documented range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("setup_bars", self.setup_bars, &SETUP_BARS_RANGE)?;
        check_range(
            "setup_lookback_bars",
            self.setup_lookback_bars,
            &SETUP_LOOKBACK_BARS_RANGE,
        )?;
        check_range(
            "setup_perf_lookback",
            self.setup_perf_lookback,
            &SETUP_PERF_LOOKBACK_RANGE,
        )?;
        check_range("countdown_bars", self.countdown_bars, &COUNTDOWN_BARS_RANGE)?;
        check_range(
            "countdown_lookback_bars",
            self.countdown_lookback_bars,
            &COUNTDOWN_LOOKBACK_BARS_RANGE,
        )?;
        check_range(
            "countdown_qual_bar",
            self.countdown_qual_bar,
            &COUNTDOWN_QUAL_BAR_RANGE,
        )?;
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: TdConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Bars needed before the first output is ready.
    pub fn warmup_bars(&self) -> usize {
        self.setup_lookback_bars + 1
    }

    /// Whether the countdown completion bar is price-qualified.
    pub fn qualification_enabled(&self) -> bool {
        self.countdown_qual_bar < self.countdown_bars
    }

    /// Deterministic content hash of every parameter.
    ///
    /// Two configs with identical values always share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("TdConfig must serialize");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
