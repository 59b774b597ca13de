//! Candle CSV store
//!
//! Lets a fetched range be replayed offline. One row per candle with the date
//! as unix seconds:
//!
//! ```text
//! date,open,high,low,close,volume,quote_volume,weighted_average
//! ```

use super::normalize_candles;
use crate::error::Result;
use crate::types::Candle;
use std::path::Path;

/// Write candles to a CSV file, replacing any existing file
pub fn write_candles(path: &Path, candles: &[Candle]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for candle in candles {
        writer.serialize(candle)?;
    }
    writer.flush()?;

    log::debug!("Wrote {} candles to {}", candles.len(), path.display());
    Ok(())
}

/// Read candles from a CSV file, sorted by date
pub fn read_candles(path: &Path) -> Result<Vec<Candle>> {
    let mut reader = csv::Reader::from_path(path)?;
    let candles = reader
        .deserialize()
        .collect::<std::result::Result<Vec<Candle>, csv::Error>>()?;

    log::debug!("Read {} candles from {}", candles.len(), path.display());
    normalize_candles(candles)
}
