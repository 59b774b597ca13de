//! # crypto_forecast
//!
//! Moving-average indicators and an LSTM next-close regressor for exchange
//! chart data.
//!
//! Candles are fetched from the exchange (or replayed from CSV), the close is
//! smoothed with a short and a long moving average, and a single-layer LSTM is
//! trained to predict each close from the 30 that precede it. Every stage
//! writes a chart-ready table to the output directory.
//!
//! ## Example
//!
//! ```rust,no_run
//! use crypto_forecast::prelude::*;
//! use std::path::Path;
//!
//! fn main() -> Result<()> {
//!     let candles = crypto_forecast::data::read_candles(Path::new("candles.csv"))?;
//!     let pipeline = Pipeline::new(PipelineConfig::default())?;
//!     let summary = pipeline.run_offline(&candles)?;
//!     println!("test metrics: {:?}", summary.test_metrics);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod data;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod indicators;
pub mod model;
pub mod optimizer;
pub mod pipeline;
pub mod training;
pub mod types;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::config::PipelineConfig;
    pub use crate::dataset::{SerialIterator, WindowedDataset};
    pub use crate::error::{ForecastError, Result};
    pub use crate::evaluation::{ErrorMetrics, Predictions};
    pub use crate::indicators::{MovingAverageFrame, SimpleMovingAverage};
    pub use crate::model::LstmRegressor;
    pub use crate::optimizer::{Adam, AdamConfig};
    pub use crate::pipeline::{Pipeline, RunSummary};
    pub use crate::training::{LogEntry, Trainer, TrainerConfig};
    pub use crate::types::*;
}
