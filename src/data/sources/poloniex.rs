//! Poloniex public chart data
//!
//! Wraps the `returnChartData` command of the public HTTP API. Prices arrive
//! either as JSON numbers or as decimal strings depending on the API
//! generation, so both forms are accepted.

use super::ChartDataSource;
use crate::error::{ForecastError, Result};
use crate::types::{Candle, ChartPeriod, CurrencyPair, Timestamp, SECONDS_PER_DAY};
use chrono::{Duration, TimeZone, Utc};
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::time::Duration as StdDuration;

const POLONIEX_BASE_URL: &str = "https://poloniex.com";

/// Poloniex chart data source (no API key required)
pub struct PoloniexSource {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChartResponse {
    Candles(Vec<RawCandle>),
    Error { error: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCandle {
    date: i64,
    #[serde(deserialize_with = "number_or_string")]
    high: f64,
    #[serde(deserialize_with = "number_or_string")]
    low: f64,
    #[serde(deserialize_with = "number_or_string")]
    open: f64,
    #[serde(deserialize_with = "number_or_string")]
    close: f64,
    #[serde(deserialize_with = "number_or_string")]
    volume: f64,
    #[serde(deserialize_with = "number_or_string")]
    quote_volume: f64,
    #[serde(deserialize_with = "number_or_string")]
    weighted_average: f64,
}

fn number_or_string<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(v) => Ok(v),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

impl PoloniexSource {
    /// Create a source against the public Poloniex endpoint
    pub fn new() -> Result<Self> {
        Self::with_base_url(POLONIEX_BASE_URL)
    }

    /// Create a source against another host, e.g. a mirror or a test server
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(StdDuration::from_secs(30))
            .user_agent(concat!("crypto_forecast/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ForecastError::DataError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the last `days` days of candles up to now
    pub async fn fetch_lookback(
        &self,
        pair: &CurrencyPair,
        period: ChartPeriod,
        days: u32,
    ) -> Result<Vec<Candle>> {
        let end = Utc::now();
        let start = Duration::try_seconds(SECONDS_PER_DAY * i64::from(days))
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(|| {
                ForecastError::ConfigError(format!(
                    "Lookback of {} days reaches past the earliest representable date",
                    days
                ))
            })?;
        self.fetch_chart_data(pair, period, start, end).await
    }

    /// Decode a `returnChartData` response body
    pub fn parse_chart_data(body: &str) -> Result<Vec<Candle>> {
        let response: ChartResponse = serde_json::from_str(body)
            .map_err(|e| ForecastError::ParseError(format!("Unexpected chart data: {}", e)))?;

        let raw = match response {
            ChartResponse::Candles(raw) => raw,
            ChartResponse::Error { error } => return Err(ForecastError::ApiError(error)),
        };

        let mut candles = Vec::with_capacity(raw.len());
        let mut placeholders = 0usize;

        for row in raw {
            // An empty range comes back as a single all-zero candle
            if row.date == 0 {
                placeholders += 1;
                continue;
            }

            let date = Utc.timestamp_opt(row.date, 0).single().ok_or_else(|| {
                ForecastError::ParseError(format!("Invalid candle timestamp: {}", row.date))
            })?;

            candles.push(Candle {
                date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
                quote_volume: row.quote_volume,
                weighted_average: row.weighted_average,
            });
        }

        if placeholders > 0 {
            log::warn!("Dropped {} placeholder candle(s) with date 0", placeholders);
        }

        Ok(candles)
    }
}

impl ChartDataSource for PoloniexSource {
    async fn fetch_chart_data(
        &self,
        pair: &CurrencyPair,
        period: ChartPeriod,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<Candle>> {
        if start >= end {
            return Err(ForecastError::DataError(format!(
                "Empty chart range: {} .. {}",
                start, end
            )));
        }

        let url = format!("{}/public", self.base_url);
        log::debug!(
            "GET {} returnChartData {} period={} start={} end={}",
            url,
            pair,
            period.as_secs(),
            start.timestamp(),
            end.timestamp()
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("command", "returnChartData".to_string()),
                ("currencyPair", pair.to_string()),
                ("start", start.timestamp().to_string()),
                ("end", end.timestamp().to_string()),
                ("period", period.as_secs().to_string()),
            ])
            .send()
            .await
            .map_err(|e| ForecastError::DataError(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ForecastError::DataError(format!(
                "Poloniex returned error: {}",
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ForecastError::DataError(format!("Failed to read response: {}", e)))?;

        let candles = Self::parse_chart_data(&text)?;
        log::info!(
            "Fetched {} candles for {} ({}s period)",
            candles.len(),
            pair,
            period.as_secs()
        );
        Ok(candles)
    }

    fn name(&self) -> &str {
        "poloniex"
    }
}
