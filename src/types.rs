//! Core types and constants

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timestamp type used throughout the library
pub type Timestamp = DateTime<Utc>;

/// Price type (using f64 for precision)
pub type Price = f64;

/// Quantity/volume type
pub type Quantity = f64;

/// Seconds in one day
pub const SECONDS_PER_DAY: i64 = 86_400;

/// One chart-data sample (candle) for a fixed period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub date: Timestamp,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    /// Volume in the quote currency
    pub volume: Quantity,
    /// Volume in the base currency
    pub quote_volume: Quantity,
    pub weighted_average: Price,
}

impl Candle {
    /// Create a candle whose open, high, low and weighted average all equal `close`
    pub fn flat(date: Timestamp, close: Price) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
            quote_volume: 0.0,
            weighted_average: close,
        }
    }
}

/// Closing prices in single precision, the form the model consumes
pub fn closes(candles: &[Candle]) -> Vec<f32> {
    candles.iter().map(|c| c.close as f32).collect()
}

/// Exchange currency pair in `BASE_QUOTE` form, e.g. `BTC_ETH`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyPair {
    base: String,
    quote: String,
}

impl CurrencyPair {
    pub fn new(base: &str, quote: &str) -> Result<Self> {
        let valid = |leg: &str| {
            !leg.is_empty()
                && leg
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        };
        if !valid(base) || !valid(quote) {
            return Err(ForecastError::ConfigError(format!(
                "Invalid currency pair legs: '{}' / '{}'",
                base, quote
            )));
        }
        Ok(Self {
            base: base.to_string(),
            quote: quote.to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }
}

impl Default for CurrencyPair {
    fn default() -> Self {
        Self {
            base: "BTC".to_string(),
            quote: "ETH".to_string(),
        }
    }
}

impl FromStr for CurrencyPair {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('_') {
            Some((base, quote)) => Self::new(base, quote),
            None => Err(ForecastError::ConfigError(format!(
                "Currency pair must look like BASE_QUOTE, got '{}'",
                s
            ))),
        }
    }
}

impl TryFrom<String> for CurrencyPair {
    type Error = ForecastError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CurrencyPair> for String {
    fn from(pair: CurrencyPair) -> Self {
        pair.to_string()
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.base, self.quote)
    }
}

/// Candle periods accepted by the chart-data endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ChartPeriod {
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    TwoHours,
    FourHours,
    OneDay,
}

impl ChartPeriod {
    pub const ALL: [ChartPeriod; 6] = [
        ChartPeriod::FiveMinutes,
        ChartPeriod::FifteenMinutes,
        ChartPeriod::ThirtyMinutes,
        ChartPeriod::TwoHours,
        ChartPeriod::FourHours,
        ChartPeriod::OneDay,
    ];

    pub fn from_secs(secs: u32) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_secs() == secs)
            .ok_or_else(|| {
                ForecastError::ConfigError(format!(
                    "Unsupported chart period {}s (expected one of 300, 900, 1800, 7200, 14400, 86400)",
                    secs
                ))
            })
    }

    pub fn as_secs(&self) -> u32 {
        match self {
            ChartPeriod::FiveMinutes => 300,
            ChartPeriod::FifteenMinutes => 900,
            ChartPeriod::ThirtyMinutes => 1800,
            ChartPeriod::TwoHours => 7200,
            ChartPeriod::FourHours => 14400,
            ChartPeriod::OneDay => 86400,
        }
    }

    /// Number of candles covering one day
    pub fn samples_per_day(&self) -> usize {
        (SECONDS_PER_DAY as u32 / self.as_secs()) as usize
    }
}

impl TryFrom<u32> for ChartPeriod {
    type Error = ForecastError;

    fn try_from(value: u32) -> Result<Self> {
        Self::from_secs(value)
    }
}

impl From<ChartPeriod> for u32 {
    fn from(period: ChartPeriod) -> Self {
        period.as_secs()
    }
}
