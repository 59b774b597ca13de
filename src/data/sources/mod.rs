//! External chart data sources
//!
//! This module provides the exchange integration used by the fetch stage:
//! - Poloniex: public `returnChartData` candles, no API key required

#[cfg(feature = "async")]
pub mod poloniex;

#[cfg(feature = "async")]
pub use poloniex::PoloniexSource;

#[cfg(feature = "async")]
use crate::error::Result;
#[cfg(feature = "async")]
use crate::types::{Candle, ChartPeriod, CurrencyPair, Timestamp};

/// Trait for exchange chart data sources
#[cfg(feature = "async")]
pub trait ChartDataSource: Send + Sync {
    /// Fetch candles for a pair over `[start, end]` at the given period
    fn fetch_chart_data(
        &self,
        pair: &CurrencyPair,
        period: ChartPeriod,
        start: Timestamp,
        end: Timestamp,
    ) -> impl std::future::Future<Output = Result<Vec<Candle>>> + Send;

    /// Get the source name
    fn name(&self) -> &str;
}
