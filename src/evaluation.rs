//! Predictions over whole splits and their chart exports

use crate::dataset::WindowedDataset;
use crate::error::Result;
use crate::model::LstmRegressor;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::ops::Range;
use std::path::Path;

/// Error summary of one split
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
}

/// Actual and predicted next closes for every sample of a split
#[derive(Debug, Clone, PartialEq)]
pub struct Predictions {
    /// Series index of the first target
    pub offset: usize,
    pub actual: Vec<f32>,
    pub predicted: Vec<f32>,
}

#[derive(Serialize)]
struct PredictionRow {
    index: usize,
    series_index: usize,
    actual: f32,
    predicted: f32,
}

impl Predictions {
    /// Predict the whole split in a single step from a cleared state
    pub fn compute(model: &mut LstmRegressor, dataset: &WindowedDataset) -> Result<Self> {
        let actual: Vec<f32> = dataset.targets().column(0).to_vec();
        let predicted = if dataset.is_empty() {
            Vec::new()
        } else {
            model.reset_state();
            model.predict(dataset.inputs(), false)?.column(0).to_vec()
        };

        Ok(Self {
            offset: dataset.target_offset(),
            actual,
            predicted,
        })
    }

    pub fn len(&self) -> usize {
        self.actual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actual.is_empty()
    }

    /// `None` when there is nothing to compare
    pub fn metrics(&self) -> Option<ErrorMetrics> {
        if self.is_empty() {
            return None;
        }

        let errors: Vec<f64> = self
            .predicted
            .iter()
            .zip(&self.actual)
            .map(|(&y, &t)| (y - t) as f64)
            .collect();
        let mse = errors.iter().map(|e| e * e).mean();
        let mae = errors.iter().map(|e| e.abs()).mean();

        Some(ErrorMetrics {
            mse,
            rmse: mse.sqrt(),
            mae,
        })
    }

    /// Write `index,series_index,actual,predicted`, optionally limited to `rows`
    pub fn write_csv(&self, path: &Path, rows: Option<Range<usize>>) -> Result<()> {
        let rows = rows.unwrap_or(0..self.len());
        let rows = rows.start.min(self.len())..rows.end.min(self.len());

        let mut writer = csv::Writer::from_path(path)?;
        for i in rows {
            writer.serialize(PredictionRow {
                index: i,
                series_index: self.offset + i,
                actual: self.actual[i],
                predicted: self.predicted[i],
            })?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn predictions() -> Predictions {
        Predictions {
            offset: 30,
            actual: vec![1.0, 2.0, 3.0, 4.0],
            predicted: vec![1.5, 2.0, 2.0, 4.0],
        }
    }

    #[test]
    fn test_metrics() {
        let m = predictions().metrics().unwrap();
        assert_relative_eq!(m.mse, (0.25 + 1.0) / 4.0);
        assert_relative_eq!(m.rmse, ((0.25 + 1.0) / 4.0f64).sqrt());
        assert_relative_eq!(m.mae, 1.5 / 4.0);
    }

    #[test]
    fn test_metrics_empty() {
        let empty = Predictions {
            offset: 0,
            actual: vec![],
            predicted: vec![],
        };
        assert!(empty.metrics().is_none());
    }

    #[test]
    fn test_write_csv_range_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zoom.csv");
        predictions().write_csv(&path, Some(2..10)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "index,series_index,actual,predicted");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "2,32,3.0,2.0");
    }

    #[test]
    fn test_compute_matches_targets() {
        let series: Vec<f32> = (0..50).map(|i| (i as f32 / 10.0).cos()).collect();
        let dataset = WindowedDataset::from_series(&series, 5).unwrap();
        let mut model = LstmRegressor::new(5, 3, 1, 0.5, 1).unwrap();

        let first = Predictions::compute(&mut model, &dataset).unwrap();
        let second = Predictions::compute(&mut model, &dataset).unwrap();
        assert_eq!(first.len(), 45);
        assert_eq!(first.offset, 5);
        assert_eq!(first.actual[0], series[5]);
        // Evaluation mode with a cleared state is deterministic
        assert_eq!(first, second);
    }
}
