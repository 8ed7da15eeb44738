//! tdseq CLI: replay bar files through the TD Sequential engine.
//!
//! Commands:
//! - `run`: replay a CSV bar file through one engine and print per-bar output
//! - `config`: validate a config file (or the defaults) and print it with its fingerprint
//!
//! Data goes to stdout; logs and the run summary go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tdseq_core::data::read_bars_csv;
use tdseq_core::{run_stream, PriceSource, RunSummary, Signal, TdConfig, TdSequential, TdSnapshot};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tdseq", about = "TD Sequential signal engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a CSV bar file (timestamp,open,high,low,close[,volume]).
    Run {
        /// Path to the CSV bar file.
        #[arg(long)]
        input: PathBuf,

        /// Path to a TOML config file. Defaults to the traditional parameters.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the config's data source: close, high or low.
        #[arg(long)]
        source: Option<PriceSource>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Only print bars on which at least one event fired.
        #[arg(long, default_value_t = false)]
        events_only: bool,
    },
    /// Validate a config and print it as TOML with its fingerprint.
    Config {
        /// Path to a TOML config file. Defaults to the traditional parameters.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
    Jsonl,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            config,
            source,
            format,
            events_only,
        } => run_replay(&input, config.as_deref(), source, format, events_only),
        Commands::Config { config } => run_config(config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<TdConfig> {
    match path {
        Some(path) => TdConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(TdConfig::default()),
    }
}

fn run_replay(
    input: &Path,
    config_path: Option<&Path>,
    source: Option<PriceSource>,
    format: OutputFormat,
    events_only: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(source) = source {
        config.data_source = source;
    }
    let fingerprint = config.fingerprint();
    let mut engine = TdSequential::new(config).context("invalid configuration")?;

    let bars = read_bars_csv(input).with_context(|| format!("reading bars from {}", input.display()))?;
    tracing::info!(input = %input.display(), bars = bars.len(), config = &fingerprint[..12], "replaying");

    let mut snapshots: Vec<TdSnapshot> = Vec::with_capacity(bars.len());
    let summary = run_stream(&mut engine, bars, &mut snapshots).context("engine rejected input")?;

    let rows = snapshots
        .iter()
        .filter(|s| !events_only || s.signals.any());
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Table => write_table(&mut out, rows)?,
        OutputFormat::Csv => write_csv(&mut out, rows)?,
        OutputFormat::Jsonl => write_jsonl(&mut out, rows)?,
    }
    out.flush()?;

    print_summary(&summary, &fingerprint);
    Ok(())
}

fn run_config(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    config.validate()?;
    print!("{}", config.to_toml_string()?);
    println!("# fingerprint: {}", config.fingerprint());
    Ok(())
}

// ── Output ───────────────────────────────────────────────────────────

fn fmt_price(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".into())
}

fn fmt_count(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}

fn write_table<'a>(out: &mut impl Write, rows: impl Iterator<Item = &'a TdSnapshot>) -> Result<()> {
    writeln!(
        out,
        "{:>6} {:<19} {:>4} {:>4} {:>4} {:>4} {:>12} {:>12} {:>12}  {}",
        "Bar", "Timestamp", "SU", "SD", "CU", "CD", "Support", "Resistance", "Risk", "Events"
    )?;
    writeln!(out, "{}", "-".repeat(110))?;
    for snap in rows {
        let events: Vec<&str> = snap.signals.fired().map(Signal::name).collect();
        writeln!(
            out,
            "{:>6} {:<19} {:>4} {:>4} {:>4} {:>4} {:>12} {:>12} {:>12}  {}",
            snap.index,
            snap.timestamp.format("%Y-%m-%d %H:%M:%S"),
            fmt_count(snap.counts.setup_up),
            fmt_count(snap.counts.setup_down),
            fmt_count(snap.counts.countdown_up),
            fmt_count(snap.counts.countdown_down),
            fmt_price(snap.prices.trend_support),
            fmt_price(snap.prices.trend_resistance),
            fmt_price(snap.prices.risk_level),
            if snap.ready { events.join(",") } else { "(warm-up)".into() },
        )?;
    }
    Ok(())
}

/// Flat CSV row: counts, flags as 0/1, then prices. Unset values are empty.
#[derive(Serialize)]
struct CsvRow {
    index: usize,
    timestamp: String,
    ready: bool,
    setup_up: Option<u32>,
    setup_down: Option<u32>,
    countdown_up: Option<u32>,
    countdown_down: Option<u32>,
    setup_sell: u8,
    setup_buy: u8,
    setup_sell_perf: u8,
    setup_buy_perf: u8,
    countdown_sell: u8,
    countdown_buy: u8,
    countdown_sell_defer: u8,
    countdown_buy_defer: u8,
    countdown_count_up_recycle: u8,
    countdown_count_down_recycle: u8,
    setup_sell_price: Option<f64>,
    setup_buy_price: Option<f64>,
    setup_sell_perf_price: Option<f64>,
    setup_buy_perf_price: Option<f64>,
    trend_support: Option<f64>,
    trend_resistance: Option<f64>,
    countdown_sell_price: Option<f64>,
    countdown_buy_price: Option<f64>,
    countdown_sell_defer_price: Option<f64>,
    countdown_buy_defer_price: Option<f64>,
    risk_level: Option<f64>,
}

impl From<&TdSnapshot> for CsvRow {
    fn from(snap: &TdSnapshot) -> Self {
        let flag = |signal: Signal| u8::from(snap.signals.get(signal));
        let (counts, prices) = (&snap.counts, &snap.prices);
        Self {
            index: snap.index,
            timestamp: snap.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
            ready: snap.ready,
            setup_up: counts.setup_up,
            setup_down: counts.setup_down,
            countdown_up: counts.countdown_up,
            countdown_down: counts.countdown_down,
            setup_sell: flag(Signal::SetupSell),
            setup_buy: flag(Signal::SetupBuy),
            setup_sell_perf: flag(Signal::SetupSellPerf),
            setup_buy_perf: flag(Signal::SetupBuyPerf),
            countdown_sell: flag(Signal::CountdownSell),
            countdown_buy: flag(Signal::CountdownBuy),
            countdown_sell_defer: flag(Signal::CountdownSellDefer),
            countdown_buy_defer: flag(Signal::CountdownBuyDefer),
            countdown_count_up_recycle: flag(Signal::CountdownCountUpRecycle),
            countdown_count_down_recycle: flag(Signal::CountdownCountDownRecycle),
            setup_sell_price: prices.setup_sell_price,
            setup_buy_price: prices.setup_buy_price,
            setup_sell_perf_price: prices.setup_sell_perf_price,
            setup_buy_perf_price: prices.setup_buy_perf_price,
            trend_support: prices.trend_support,
            trend_resistance: prices.trend_resistance,
            countdown_sell_price: prices.countdown_sell_price,
            countdown_buy_price: prices.countdown_buy_price,
            countdown_sell_defer_price: prices.countdown_sell_defer_price,
            countdown_buy_defer_price: prices.countdown_buy_defer_price,
            risk_level: prices.risk_level,
        }
    }
}

fn write_csv<'a>(out: &mut impl Write, rows: impl Iterator<Item = &'a TdSnapshot>) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for snap in rows {
        wtr.serialize(CsvRow::from(snap))?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_jsonl<'a>(out: &mut impl Write, rows: impl Iterator<Item = &'a TdSnapshot>) -> Result<()> {
    for snap in rows {
        serde_json::to_writer(&mut *out, snap)?;
        writeln!(out)?;
    }
    Ok(())
}

fn print_summary(summary: &RunSummary, fingerprint: &str) {
    eprintln!();
    eprintln!("=== Replay Summary ===");
    eprintln!("Config:     {}", &fingerprint[..12]);
    eprintln!("Bars:       {}", summary.bars);
    eprintln!("Ready bars: {}", summary.ready_bars);
    if summary.events.is_empty() {
        eprintln!("Events:     none");
        return;
    }
    eprintln!("Events:");
    for (signal, count) in &summary.events {
        eprintln!("  {:<30} {count}", signal.name());
    }
}
