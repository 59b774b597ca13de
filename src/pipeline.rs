//! End-to-end run: candles in, indicator and prediction charts out
//!
//! Stages run once, in order:
//!
//! 1. fetch chart data (async feature) or take candles from the caller
//! 2. short and long moving averages of the close, exported as a chart table
//! 3. windowed dataset and train/test split
//! 4. training with per-epoch validation
//! 5. predictions for both splits, exported as chart tables

use crate::config::PipelineConfig;
use crate::dataset::WindowedDataset;
use crate::error::{ForecastError, Result};
use crate::evaluation::{ErrorMetrics, Predictions};
use crate::indicators::{Crossover, MovingAverageFrame};
use crate::model::LstmRegressor;
use crate::optimizer::Adam;
use crate::training::{LogEntry, Trainer, TrainerConfig};
use crate::types::{closes, Candle};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// Files written by a run
#[derive(Debug, Clone, Serialize)]
pub struct Artifacts {
    pub indicators: PathBuf,
    pub log: PathBuf,
    pub predictions_train: PathBuf,
    pub predictions_test: PathBuf,
    pub predictions_test_zoom: PathBuf,
    pub summary: PathBuf,
}

impl Artifacts {
    fn under(dir: &std::path::Path) -> Self {
        Self {
            indicators: dir.join("indicators.csv"),
            log: dir.join("log"),
            predictions_train: dir.join("predictions_train.csv"),
            predictions_test: dir.join("predictions_test.csv"),
            predictions_test_zoom: dir.join("predictions_test_zoom.csv"),
            summary: dir.join("summary.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub candles: usize,
    pub samples: usize,
    pub train_samples: usize,
    pub test_samples: usize,
    pub parameters: usize,
    pub latest_crossover: Option<(usize, Crossover)>,
    pub log: Vec<LogEntry>,
    pub train_metrics: Option<ErrorMetrics>,
    pub test_metrics: Option<ErrorMetrics>,
    pub artifacts: Artifacts,
}

impl RunSummary {
    pub fn final_entry(&self) -> Option<&LogEntry> {
        self.log.last()
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    print_report: bool,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            print_report: true,
        })
    }

    /// Whether the trainer prints its per-epoch table to stdout
    pub fn with_print_report(mut self, enabled: bool) -> Self {
        self.print_report = enabled;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn artifacts(&self) -> Artifacts {
        Artifacts::under(&self.config.out_dir)
    }

    /// Download the configured lookback window from the exchange
    #[cfg(feature = "async")]
    pub async fn fetch(&self) -> Result<Vec<Candle>> {
        use crate::data::sources::PoloniexSource;

        let source = PoloniexSource::with_base_url(&self.config.base_url)?;
        let candles = source
            .fetch_lookback(&self.config.pair, self.config.period, self.config.lookback_days)
            .await?;
        crate::data::normalize_candles(candles)
    }

    /// Moving averages of the close, written to `indicators.csv`
    pub fn indicators(&self, candles: &[Candle]) -> Result<MovingAverageFrame> {
        if candles.is_empty() {
            return Err(ForecastError::InsufficientData {
                required: 1,
                available: 0,
            });
        }

        let frame =
            MovingAverageFrame::from_candles(candles, self.config.short_window, self.config.long_window)?;

        fs::create_dir_all(&self.config.out_dir)?;
        let path = self.artifacts().indicators;
        frame.write_csv(&path)?;
        log::info!(
            "Moving averages ({} / {} samples) written to {}",
            self.config.short_window,
            self.config.long_window,
            path.display()
        );
        Ok(frame)
    }

    /// Run every stage after fetching on the given candles
    pub fn run_offline(&self, candles: &[Candle]) -> Result<RunSummary> {
        let cfg = &self.config;
        let artifacts = self.artifacts();

        let frame = self.indicators(candles)?;
        let latest_crossover = frame.latest_crossover();
        if let Some((index, direction)) = latest_crossover {
            log::info!("Latest moving-average crossover: {:?} at sample {}", direction, index);
        }

        let series = closes(candles);
        let dataset = WindowedDataset::from_series(&series, cfg.window)?;
        let (train, test) = dataset.split(cfg.train_ratio)?;
        log::info!(
            "{} windows of {} closes: {} train / {} test",
            dataset.len(),
            cfg.window,
            train.len(),
            test.len()
        );

        let mut model = LstmRegressor::new(cfg.window, cfg.n_units, 1, cfg.dropout, cfg.seed)?;
        let trainer = Trainer::new(
            TrainerConfig {
                epochs: cfg.epochs,
                batch_size: cfg.batch_size,
                seed: cfg.seed,
                out_dir: Some(cfg.out_dir.clone()),
                print_report: self.print_report,
            },
            Adam::default(),
        )?;
        let log = trainer.run(&mut model, &train, &test)?;

        let train_predictions = Predictions::compute(&mut model, &train)?;
        let test_predictions = Predictions::compute(&mut model, &test)?;
        train_predictions.write_csv(&artifacts.predictions_train, None)?;
        test_predictions.write_csv(&artifacts.predictions_test, None)?;
        test_predictions.write_csv(&artifacts.predictions_test_zoom, Some(cfg.zoom.0..cfg.zoom.1))?;

        let train_metrics = train_predictions.metrics();
        let test_metrics = test_predictions.metrics();
        if let Some(m) = &test_metrics {
            log::info!("Test RMSE {:.6}, MAE {:.6}", m.rmse, m.mae);
        }

        let summary = RunSummary {
            candles: candles.len(),
            samples: dataset.len(),
            train_samples: train.len(),
            test_samples: test.len(),
            parameters: model.parameter_count(),
            latest_crossover,
            log,
            train_metrics,
            test_metrics,
            artifacts,
        };
        fs::write(&summary.artifacts.summary, serde_json::to_string_pretty(&summary)?)?;

        Ok(summary)
    }
}
