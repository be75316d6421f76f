//! tickreplay CLI: run and inspect commands.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config file and save artifacts
//! - `inspect`: load and align CSV bars, report the shared calendar per symbol

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tickreplay_core::data::{CsvSource, MarketDataFeed};
use tickreplay_runner::{run_from_config, save_artifacts, BacktestConfig, BacktestResult};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tickreplay",
    about = "tickreplay CLI: event-driven backtester over daily bars"
)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the summary only; write no artifacts.
        #[arg(long, default_value_t = false)]
        no_save: bool,

        /// Print the full result as JSON instead of the summary table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Load and align CSV bars without running a strategy.
    Inspect {
        /// Symbols to load (e.g., AAPL CVX).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Directory holding `<SYMBOL>.csv` files.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Drop rows before this date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            output_dir,
            no_save,
            json,
        } => run_backtest_cmd(config, output_dir, no_save, json),
        Commands::Inspect {
            symbols,
            data_dir,
            start,
        } => run_inspect(symbols, data_dir, start),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn run_backtest_cmd(config_path: PathBuf, output_dir: PathBuf, no_save: bool, json: bool) -> Result<()> {
    if !config_path.is_file() {
        bail!("config file not found: {}", config_path.display());
    }
    let config = BacktestConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let (result, ledger) = run_from_config(&config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    if !no_save {
        let run_dir = save_artifacts(&result, &ledger, &output_dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_inspect(symbols: Vec<String>, data_dir: PathBuf, start: Option<String>) -> Result<()> {
    let start = start
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("--start must be YYYY-MM-DD")?;

    let source = CsvSource::new(&data_dir);
    let mut feed = MarketDataFeed::load_since(&symbols, &source, start)?;
    let calendar_len = feed.calendar().len();
    let (first, last) = match (feed.calendar().first(), feed.calendar().last()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => bail!("no bars loaded from {}", data_dir.display()),
    };

    // Release everything so the whole aligned series is visible.
    while feed.advance() {}

    println!();
    println!("=== Aligned Calendar ===");
    println!("Source:     {}", data_dir.display());
    println!("Dates:      {calendar_len} ({first} to {last})");
    println!();
    println!("{:<10} {:>8} {:>8} {:>12} {:>12}", "Symbol", "Bars", "Void", "First", "Last Close");
    for symbol in feed.symbols() {
        let bars = feed.latest(symbol, usize::MAX);
        let void = bars.iter().filter(|b| b.is_void()).count();
        let first_real = bars
            .iter()
            .find(|b| !b.is_void())
            .map(|b| b.date.to_string())
            .unwrap_or_else(|| "-".into());
        let last_close = feed
            .latest_close(symbol)
            .map(|c| format!("{c:.2}"))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<10} {:>8} {:>8} {:>12} {:>12}",
            symbol,
            bars.len(),
            void,
            first_real,
            last_close
        );
    }
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    println!();
    println!("=== Backtest Result ===");
    println!("Run:            {}", &result.run_id[..12.min(result.run_id.len())]);
    println!("Strategy:       {}", result.strategy);
    println!("Symbols:        {}", result.symbols.join(", "));
    if let (Some(start), Some(end)) = (result.start_date, result.end_date) {
        println!("Period:         {start} to {end}");
    }
    println!(
        "Events:         {} ticks, {} signals, {} orders, {} fills",
        result.counters.ticks, result.counters.signals, result.counters.orders, result.counters.fills
    );
    if result.counters.dropped > 0 {
        println!("Dropped:        {} (see log)", result.counters.dropped);
    }
    println!("Final Cash:     {:.2}", result.final_cash);
    println!("Final Total:    {:.2}", result.final_total);
    println!();
    println!("--- Performance ---");
    for (label, value) in &result.summary {
        println!("{:<16}{value}", format!("{label}:"));
    }
}
