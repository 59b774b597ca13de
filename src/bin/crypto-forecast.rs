//! crypto-forecast CLI - fetch chart data, compute indicators, train the regressor
//!
//! ## Example Usage
//!
//! ```bash
//! # Download 100 days of 5-minute BTC_ETH candles
//! crypto-forecast fetch --output candles.csv
//!
//! # Moving averages only
//! crypto-forecast indicators --input candles.csv
//!
//! # Full run from a stored range, or straight from the exchange
//! crypto-forecast train --input candles.csv --epochs 30
//! crypto-forecast train --pair USDT_BTC --period 1800 --days 30
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use crypto_forecast::config::PipelineConfig;
use crypto_forecast::data::{read_candles, write_candles};
use crypto_forecast::pipeline::{Pipeline, RunSummary};
use crypto_forecast::types::{Candle, ChartPeriod};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

/// crypto-forecast: moving averages and an LSTM next-close regressor
#[derive(Parser)]
#[command(name = "crypto-forecast")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Moving averages and an LSTM next-close regressor for exchange chart data", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download candles and store them as CSV
    Fetch {
        /// Destination CSV file
        #[arg(short, long, default_value = "candles.csv")]
        output: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Compute the short and long moving averages
    Indicators {
        /// Candle CSV written by `fetch` (downloads when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Run the full pipeline: indicators, training and predictions
    Train {
        /// Candle CSV written by `fetch` (downloads when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Number of training epochs
        #[arg(short, long)]
        epochs: Option<usize>,

        /// Seed for weight initialisation, dropout and shuffling
        #[arg(long)]
        seed: Option<u64>,

        /// Do not print the per-epoch table
        #[arg(short, long)]
        quiet: bool,

        #[command(flatten)]
        overrides: Overrides,
    },
}

/// Settings that override the configuration file
#[derive(Args)]
struct Overrides {
    /// Currency pair, e.g. BTC_ETH
    #[arg(long)]
    pair: Option<String>,

    /// Candle period in seconds (300, 900, 1800, 7200, 14400, 86400)
    #[arg(long)]
    period: Option<u32>,

    /// Days of history to download
    #[arg(long)]
    days: Option<u32>,

    /// Output directory for charts and logs
    #[arg(short = 'O', long)]
    out_dir: Option<PathBuf>,
}

impl Overrides {
    fn apply(&self, config: &mut PipelineConfig) -> Result<()> {
        if let Some(pair) = &self.pair {
            config.pair = pair.parse()?;
        }
        if let Some(period) = self.period {
            config.period = ChartPeriod::from_secs(period)?;
        }
        if let Some(days) = self.days {
            config.lookback_days = days;
        }
        if let Some(out_dir) = &self.out_dir {
            config.out_dir = out_dir.clone();
        }
        Ok(())
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".crypto-forecast").join("config.toml"))
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    if let Some(config_path) = path {
        return PipelineConfig::load(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()));
    }

    if let Some(default_config) = default_config_path().filter(|p| p.exists()) {
        match PipelineConfig::load(&default_config) {
            Ok(config) => return Ok(config),
            Err(e) => eprintln!(
                "{} Ignoring {}: {}",
                "Warning:".yellow(),
                default_config.display(),
                e
            ),
        }
    }

    Ok(PipelineConfig::default())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

/// Log filter used when `RUST_LOG` is unset
fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "warn,crypto_forecast=debug"
    } else {
        "warn,crypto_forecast=info"
    }
}

fn init_logging(verbose: bool) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_log_filter(verbose)))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;

    if cli.verbose {
        println!(
            "{} v{}",
            "crypto-forecast".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        );
    }

    match cli.command {
        Commands::Fetch { output, overrides } => {
            overrides.apply(&mut config)?;
            let pipeline = Pipeline::new(config)?;
            let candles = fetch_with_spinner(&pipeline).await?;
            write_candles(&output, &candles)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "{} {} candles written to {}",
                "✓".green().bold(),
                candles.len(),
                output.display().to_string().bright_green()
            );
        }

        Commands::Indicators { input, overrides } => {
            overrides.apply(&mut config)?;
            let pipeline = Pipeline::new(config)?;
            let candles = load_candles(&pipeline, input.as_deref()).await?;
            let frame = pipeline.indicators(&candles)?;

            let (short, long) = frame.windows();
            println!("{}", "Moving Averages".bold());
            println!("{}", "===============".dimmed());
            println!("  {} {}", "Candles:".bold(), frame.len());
            println!("  {} {} samples", "Short window:".bold(), short);
            println!("  {} {} samples", "Long window:".bold(), long);
            if let Some((index, direction)) = frame.latest_crossover() {
                println!("  {} {:?} at sample {}", "Latest crossover:".bold(), direction, index);
            }
            println!(
                "  {} {}",
                "Chart data:".bold(),
                pipeline.artifacts().indicators.display()
            );
        }

        Commands::Train {
            input,
            epochs,
            seed,
            quiet,
            overrides,
        } => {
            overrides.apply(&mut config)?;
            if let Some(epochs) = epochs {
                config.epochs = epochs;
            }
            if let Some(seed) = seed {
                config.seed = seed;
            }

            let pipeline = Pipeline::new(config)?.with_print_report(!quiet);
            let candles = load_candles(&pipeline, input.as_deref()).await?;
            let summary = pipeline.run_offline(&candles)?;
            print_summary(&summary);
        }
    }

    Ok(())
}

async fn load_candles(pipeline: &Pipeline, input: Option<&Path>) -> Result<Vec<Candle>> {
    match input {
        Some(path) => read_candles(path).with_context(|| format!("Failed to read {}", path.display())),
        None => fetch_with_spinner(pipeline).await,
    }
}

async fn fetch_with_spinner(pipeline: &Pipeline) -> Result<Vec<Candle>> {
    let cfg = pipeline.config();
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!(
        "Fetching {} days of {} ({}s candles)",
        cfg.lookback_days,
        cfg.pair,
        cfg.period.as_secs()
    ));

    let result = pipeline.fetch().await;
    pb.finish_and_clear();
    result.with_context(|| format!("Failed to fetch chart data for {}", cfg.pair))
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("{}", "Run Summary".green().bold());
    println!("{}", "===========".green());
    println!("  {} {}", "Candles:".bold(), summary.candles);
    println!(
        "  {} {} ({} train / {} test)",
        "Samples:".bold(),
        summary.samples,
        summary.train_samples,
        summary.test_samples
    );
    println!("  {} {}", "Parameters:".bold(), summary.parameters);

    if let Some(entry) = summary.final_entry() {
        println!("  {} {:.6}", "Final train loss:".bold(), entry.main_loss);
        if let Some(v) = entry.validation_loss {
            println!("  {} {:.6}", "Final validation loss:".bold(), v);
        }
    }
    if let Some(m) = &summary.test_metrics {
        println!("  {} {:.6} / {:.6}", "Test RMSE / MAE:".bold(), m.rmse, m.mae);
    }
    println!();

    println!("{}", "Chart data".bold());
    println!("{}", "==========".dimmed());
    let artifacts = &summary.artifacts;
    for path in [
        &artifacts.indicators,
        &artifacts.predictions_train,
        &artifacts.predictions_test,
        &artifacts.predictions_test_zoom,
        &artifacts.log,
        &artifacts.summary,
    ] {
        println!("  {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_raises_crate_log_level() {
        let cli = Cli::parse_from(["crypto-forecast", "--verbose", "indicators"]);
        assert!(cli.verbose);
        assert_eq!(default_log_filter(cli.verbose), "warn,crypto_forecast=debug");

        let cli = Cli::parse_from(["crypto-forecast", "train", "--epochs", "3"]);
        assert!(!cli.verbose);
        assert_eq!(default_log_filter(cli.verbose), "warn,crypto_forecast=info");
    }
}
