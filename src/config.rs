//! Pipeline configuration
//!
//! Every knob of the run lives here with the defaults of the original analysis:
//! five-minute BTC_ETH candles over the last 100 days, a one-day and a five-day
//! moving average, 30-sample input windows and a 30-unit LSTM trained for 30
//! epochs. Values load from TOML; missing fields fall back to the defaults.

use crate::error::{ForecastError, Result};
use crate::types::{ChartPeriod, CurrencyPair};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://poloniex.com";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub pair: CurrencyPair,
    pub period: ChartPeriod,
    /// Days of history to request, counted back from now
    pub lookback_days: u32,
    pub short_window: usize,
    pub long_window: usize,
    /// Trailing closes per training sample
    pub window: usize,
    pub train_ratio: f64,
    pub n_units: usize,
    pub dropout: f32,
    pub batch_size: usize,
    pub epochs: usize,
    pub seed: u64,
    /// Test rows exported to the zoomed prediction chart
    pub zoom: (usize, usize),
    pub out_dir: PathBuf,
    pub base_url: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let period = ChartPeriod::FiveMinutes;
        let per_day = period.samples_per_day();
        Self {
            pair: CurrencyPair::default(),
            period,
            lookback_days: 100,
            short_window: per_day,
            long_window: per_day * 5,
            window: 30,
            train_ratio: 0.7,
            n_units: 30,
            dropout: 0.05,
            batch_size: 20,
            epochs: 30,
            seed: 1,
            zoom: (200, 300),
            out_dir: PathBuf::from("result"),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| ForecastError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no run could use
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(ForecastError::ConfigError(msg));

        if self.lookback_days == 0 {
            return fail("lookback_days must be greater than 0".to_string());
        }
        if self.short_window == 0 || self.long_window == 0 {
            return fail("Moving-average windows must be greater than 0".to_string());
        }
        if self.window == 0 {
            return fail("window must be greater than 0".to_string());
        }
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            return fail(format!(
                "train_ratio must be in (0, 1), got {}",
                self.train_ratio
            ));
        }
        if self.n_units == 0 {
            return fail("n_units must be greater than 0".to_string());
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return fail(format!("dropout must be in [0, 1), got {}", self.dropout));
        }
        if self.batch_size == 0 {
            return fail("batch_size must be greater than 0".to_string());
        }
        if self.epochs == 0 {
            return fail("epochs must be greater than 0".to_string());
        }
        if self.zoom.0 >= self.zoom.1 {
            return fail(format!(
                "zoom range must be increasing, got {}..{}",
                self.zoom.0, self.zoom.1
            ));
        }
        Ok(())
    }
}
