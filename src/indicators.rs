//! Moving-average indicators over closing prices

use crate::error::{ForecastError, Result};
use crate::types::{Candle, Timestamp};
use serde::Serialize;
use std::collections::VecDeque;
use std::path::Path;

/// Simple Moving Average (SMA)
///
/// Trailing mean over a fixed number of samples. Nothing is emitted until the
/// window is full, so the first `window - 1` outputs of [`compute`] are `None`.
///
/// [`compute`]: SimpleMovingAverage::compute
#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    window: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl SimpleMovingAverage {
    /// Create new SMA with given window size
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(ForecastError::ConfigError(
                "Window size must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            window,
            values: VecDeque::with_capacity(window),
            sum: 0.0,
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Add a value and compute current SMA
    pub fn update(&mut self, value: f64) -> Option<f64> {
        self.values.push_back(value);
        self.sum += value;

        if self.values.len() > self.window {
            if let Some(old) = self.values.pop_front() {
                self.sum -= old;
            }
        }

        self.current()
    }

    /// Compute SMA for a slice of values
    pub fn compute(window: usize, values: &[f64]) -> Result<Vec<Option<f64>>> {
        let mut sma = Self::new(window)?;
        Ok(values.iter().map(|&v| sma.update(v)).collect())
    }

    /// Get current value (if window is full)
    pub fn current(&self) -> Option<f64> {
        if self.values.len() == self.window {
            Some(self.sum / self.window as f64)
        } else {
            None
        }
    }
}

/// Direction of a short/long moving-average crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Crossover {
    /// Short average moves above the long one
    Golden,
    /// Short average moves below the long one
    Death,
}

/// Close price with its short and long moving averages, one row per candle
#[derive(Debug, Clone)]
pub struct MovingAverageFrame {
    pub dates: Vec<Timestamp>,
    pub close: Vec<f64>,
    pub short: Vec<Option<f64>>,
    pub long: Vec<Option<f64>>,
    short_window: usize,
    long_window: usize,
}

#[derive(Serialize)]
struct FrameRow {
    date: i64,
    close: f64,
    ma_short: Option<f64>,
    ma_long: Option<f64>,
}

impl MovingAverageFrame {
    pub fn from_candles(candles: &[Candle], short_window: usize, long_window: usize) -> Result<Self> {
        let close: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let short = SimpleMovingAverage::compute(short_window, &close)?;
        let long = SimpleMovingAverage::compute(long_window, &close)?;

        if candles.len() < long_window {
            log::warn!(
                "Only {} candles, long moving average ({} samples) never fills",
                candles.len(),
                long_window
            );
        }

        Ok(Self {
            dates: candles.iter().map(|c| c.date).collect(),
            close,
            short,
            long,
            short_window,
            long_window,
        })
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn windows(&self) -> (usize, usize) {
        (self.short_window, self.long_window)
    }

    /// Most recent index where the short average crosses the long one
    pub fn latest_crossover(&self) -> Option<(usize, Crossover)> {
        let spread: Vec<Option<f64>> = self
            .short
            .iter()
            .zip(&self.long)
            .map(|(s, l)| Some((*s)? - (*l)?))
            .collect();

        (1..spread.len()).rev().find_map(|i| match (spread[i - 1], spread[i]) {
            (Some(prev), Some(cur)) if prev <= 0.0 && cur > 0.0 => Some((i, Crossover::Golden)),
            (Some(prev), Some(cur)) if prev >= 0.0 && cur < 0.0 => Some((i, Crossover::Death)),
            _ => None,
        })
    }

    /// Write `date,close,ma_short,ma_long`; unfilled averages are empty fields
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for i in 0..self.len() {
            writer.serialize(FrameRow {
                date: self.dates[i].timestamp(),
                close: self.close[i],
                ma_short: self.short[i],
                ma_long: self.long[i],
            })?;
        }
        writer.flush()?;
        Ok(())
    }
}
