//! ReplayLab CLI: replay and inspect commands.
//!
//! Commands:
//! - `run`: replay a TOML config, print a summary, and write artifacts
//! - `inspect`: load a bar CSV and report row count, range and sanity

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use replaylab_core::data::{CsvSource, CsvSourceConfig};
use replaylab_runner::export::sparkline;
use replaylab_runner::{run_backtest, save_artifacts, BacktestConfig, BacktestResult};

#[derive(Parser)]
#[command(name = "replaylab", about = "ReplayLab CLI: event-driven bar replay")]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. info, debug, replaylab_core=trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay bars under a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Override `backtest.max_bars`.
        #[arg(long)]
        max_bars: Option<usize>,

        /// Write result.json, equity.csv and report.md under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Load a bar CSV and report what was parsed.
    Inspect {
        /// Path to the CSV file.
        #[arg(long)]
        csv: PathBuf,

        /// Symbol to tag the bars with.
        #[arg(long, default_value = "SPY")]
        symbol: String,

        /// Timestamp column name.
        #[arg(long, default_value = "timestamp")]
        ts_col: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let outcome = match cli.command {
        Commands::Run {
            config,
            max_bars,
            output_dir,
        } => run_cmd(&config, max_bars, output_dir.as_deref()),
        Commands::Inspect { csv, symbol, ts_col } => inspect_cmd(&csv, &symbol, &ts_col),
    };
    if let Err(err) = &outcome {
        tracing::error!(error = %format!("{err:#}"), "command failed");
    }
    outcome
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    Ok(())
}

fn run_cmd(config_path: &Path, max_bars: Option<usize>, output_dir: Option<&Path>) -> Result<()> {
    let mut config = BacktestConfig::from_file(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if max_bars.is_some() {
        tracing::info!(?max_bars, "overriding backtest.max_bars");
        config.backtest.max_bars = max_bars;
    }

    let result = run_backtest(&config)?;
    print_summary(&result);

    if let Some(output_dir) = output_dir {
        let run_dir = save_artifacts(&result, output_dir)
            .with_context(|| format!("saving artifacts under {}", output_dir.display()))?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let s = &result.summary;
    let m = &result.metrics;

    println!();
    println!("=== Replay: {} / {} ===", result.symbol, result.strategy);
    if result.has_synthetic {
        println!("  ** SYNTHETIC DATA **");
    }
    println!("Run ID:        {}", result.run_id);
    println!("Dataset:       {}", result.dataset_hash);
    if let (Some(start), Some(end)) = (result.start_ts, result.end_ts) {
        println!("Period:        {} to {}", start.to_rfc3339(), end.to_rfc3339());
    }
    println!(
        "Events:        {} bars, {} signals, {} orders, {} fills ({} rejected)",
        s.bars, s.signals, s.orders, s.fills, s.rejected_fills
    );
    println!("Fees:          {:.2}", s.total_fees);
    println!("Cash:          {:.2} -> {:.2}", s.initial_cash, s.final_cash);
    println!("Final equity:  {:.2}", s.final_equity);
    println!("Total return:  {:.2}%", m.total_return * 100.0);
    println!("Max drawdown:  {:.2}%", m.max_drawdown * 100.0);
    println!("Volatility:    {:.2}%", m.volatility * 100.0);
    println!("Sharpe:        {:.3}", m.sharpe);

    let equity: Vec<f64> = s.equity_history.iter().map(|p| p.equity).collect();
    if !equity.is_empty() {
        println!("Equity:        {}", sparkline(&equity, 60));
    }

    let tail = s.equity_history.len().saturating_sub(10);
    if tail < s.equity_history.len() {
        println!();
        println!("{:<27} {:>14} {:>14}", "ts", "equity", "cash");
        for p in &s.equity_history[tail..] {
            println!("{:<27} {:>14.2} {:>14.2}", p.ts.to_rfc3339(), p.equity, p.cash);
        }
    }
    println!();
}

fn inspect_cmd(path: &Path, symbol: &str, ts_col: &str) -> Result<()> {
    let config = CsvSourceConfig::new(symbol).with_ts_col(ts_col);
    let source = CsvSource::load(path, &config)?;
    let report = source.report();
    tracing::info!(path = %path.display(), bars = report.bars, "csv loaded");

    println!("File:     {}", path.display());
    println!("Symbol:   {}", report.symbol);
    println!("Bars:     {}", report.bars);
    match (report.first_ts, report.last_ts) {
        (Some(first), Some(last)) => println!("Range:    {} to {}", first.to_rfc3339(), last.to_rfc3339()),
        _ => println!("Range:    (empty)"),
    }
    if report.is_sane() {
        println!("OHLC:     ok");
    } else {
        println!("OHLC:     {} bars with low > min(open, close) or high < max(open, close)", report.insane_ohlc);
    }

    let closes: Vec<f64> = source.bars().iter().map(|b| b.close()).collect();
    if !closes.is_empty() {
        println!("Close:    {}", sparkline(&closes, 60));
    }
    Ok(())
}
