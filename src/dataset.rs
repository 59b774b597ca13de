//! Windowed supervised dataset and minibatch iteration
//!
//! Each sample pairs `window` consecutive closes with the close that follows
//! them. Samples are kept as two matrices so a batch is a row selection.

use crate::error::{ForecastError, Result};
use ndarray::{s, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

#[derive(Debug, Clone)]
pub struct WindowedDataset {
    /// Inputs, shape `(samples, window)`
    x: Array2<f32>,
    /// Targets, shape `(samples, 1)`
    t: Array2<f32>,
    window: usize,
    /// Length of the series the samples were cut from
    series_len: usize,
    /// Series index of the first sample's target
    target_offset: usize,
}

impl WindowedDataset {
    /// Build `(series[n - window..n], series[n])` for every `n` in `window..len`
    pub fn from_series(series: &[f32], window: usize) -> Result<Self> {
        if window == 0 {
            return Err(ForecastError::ConfigError(
                "Window size must be greater than 0".to_string(),
            ));
        }
        if series.len() <= window {
            return Err(ForecastError::InsufficientData {
                required: window,
                available: series.len(),
            });
        }

        let n_samples = series.len() - window;
        let mut x = Array2::<f32>::zeros((n_samples, window));
        let mut t = Array2::<f32>::zeros((n_samples, 1));

        for (row, n) in (window..series.len()).enumerate() {
            x.row_mut(row)
                .iter_mut()
                .zip(&series[n - window..n])
                .for_each(|(dst, &src)| *dst = src);
            t[[row, 0]] = series[n];
        }

        Ok(Self {
            x,
            t,
            window,
            series_len: series.len(),
            target_offset: window,
        })
    }

    pub fn len(&self) -> usize {
        self.x.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn target_offset(&self) -> usize {
        self.target_offset
    }

    pub fn inputs(&self) -> &Array2<f32> {
        &self.x
    }

    pub fn targets(&self) -> &Array2<f32> {
        &self.t
    }

    pub fn sample(&self, index: usize) -> Option<(ArrayView1<'_, f32>, f32)> {
        if index >= self.len() {
            return None;
        }
        Some((self.x.row(index), self.t[[index, 0]]))
    }

    /// Train/test split at `floor(series_len * train_ratio)`
    ///
    /// The cut is measured on the raw series, not on the sample count, and is
    /// clamped to the number of samples.
    pub fn split(&self, train_ratio: f64) -> Result<(WindowedDataset, WindowedDataset)> {
        if !(0.0..=1.0).contains(&train_ratio) {
            return Err(ForecastError::ConfigError(format!(
                "train_ratio must be in [0, 1], got {}",
                train_ratio
            )));
        }

        let cut = ((self.series_len as f64 * train_ratio).floor() as usize).min(self.len());
        let part = |rows: std::ops::Range<usize>| WindowedDataset {
            x: self.x.slice(s![rows.clone(), ..]).to_owned(),
            t: self.t.slice(s![rows.clone(), ..]).to_owned(),
            window: self.window,
            series_len: self.series_len,
            target_offset: self.target_offset + rows.start,
        };

        Ok((part(0..cut), part(cut..self.len())))
    }

    /// Stack the selected samples into `(x, t)` batch matrices
    pub fn batch(&self, indices: &[usize]) -> Result<(Array2<f32>, Array2<f32>)> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(ForecastError::DataError(format!(
                "Sample index {} out of range for {} samples",
                bad,
                self.len()
            )));
        }
        Ok((
            self.x.select(Axis(0), indices),
            self.t.select(Axis(0), indices),
        ))
    }
}

/// Minibatch iterator over sample indices
///
/// With `repeat` the iterator never ends: an epoch that runs out mid-batch is
/// topped up from the start of the next epoch's order. Without it a single
/// pass is made and the last batch may be short.
#[derive(Debug, Clone)]
pub struct SerialIterator {
    len: usize,
    batch_size: usize,
    repeat: bool,
    shuffle: bool,
    rng: StdRng,
    order: Vec<usize>,
    position: usize,
    epoch: usize,
    is_new_epoch: bool,
}

impl SerialIterator {
    pub fn new(len: usize, batch_size: usize, repeat: bool, shuffle: bool, seed: u64) -> Result<Self> {
        if batch_size == 0 {
            return Err(ForecastError::ConfigError(
                "batch_size must be greater than 0".to_string(),
            ));
        }

        let mut iter = Self {
            len,
            batch_size,
            repeat,
            shuffle,
            rng: StdRng::seed_from_u64(seed),
            order: (0..len).collect(),
            position: 0,
            epoch: 0,
            is_new_epoch: false,
        };
        iter.reorder();
        Ok(iter)
    }

    fn reorder(&mut self) {
        if self.shuffle {
            self.order.shuffle(&mut self.rng);
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Completed passes over the data
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Whether the last batch finished an epoch
    pub fn is_new_epoch(&self) -> bool {
        self.is_new_epoch
    }

    /// Fractional epoch count
    pub fn epoch_detail(&self) -> f64 {
        if self.len == 0 {
            return self.epoch as f64;
        }
        self.epoch as f64 + self.position as f64 / self.len as f64
    }

    /// Rewind to the first batch of the first epoch
    pub fn reset(&mut self) {
        self.position = 0;
        self.epoch = 0;
        self.is_new_epoch = false;
        self.reorder();
    }
}

impl Iterator for SerialIterator {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.len == 0 || (!self.repeat && self.epoch > 0) {
            return None;
        }

        let start = self.position;
        let end = start + self.batch_size;
        let mut batch = self.order[start..end.min(self.len)].to_vec();

        if end >= self.len {
            if self.repeat {
                let rest = end - self.len;
                self.reorder();
                batch.extend_from_slice(&self.order[..rest.min(self.len)]);
                self.position = rest.min(self.len);
            } else {
                self.position = 0;
            }
            self.epoch += 1;
            self.is_new_epoch = true;
        } else {
            self.position = end;
            self.is_new_epoch = false;
        }

        Some(batch)
    }
}
