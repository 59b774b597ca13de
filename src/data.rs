//! Chart data handling
//!
//! Candles come either from an exchange source (behind the `async` feature)
//! or from a CSV file written by an earlier fetch.

pub mod sources;
pub mod store;

pub use store::{read_candles, write_candles};

use crate::error::{ForecastError, Result};
use crate::types::Candle;

/// Sort candles by date and reject repeated timestamps
pub fn normalize_candles(mut candles: Vec<Candle>) -> Result<Vec<Candle>> {
    candles.sort_by_key(|c| c.date);

    if let Some(pair) = candles.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(ForecastError::DataError(format!(
            "Duplicate candle at {}",
            pair[0].date
        )));
    }

    Ok(candles)
}
