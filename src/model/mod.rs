//! Sequence regressor: one stateful LSTM layer followed by a linear readout
//!
//! Gradients are derived by hand for this fixed architecture. Every layer
//! caches what its backward pass needs during the forward pass, and
//! gradients accumulate until [`LstmRegressor::clear_grads`].

pub mod linear;
pub mod lstm;
pub mod regressor;

pub use linear::{Dropout, Linear};
pub use lstm::Lstm;
pub use regressor::LstmRegressor;

use crate::error::{ForecastError, Result};
use ndarray::Array2;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// A trainable matrix and its accumulated gradient
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub data: Array2<f32>,
    pub grad: Array2<f32>,
}

impl Parameter {
    pub fn new(name: &str, data: Array2<f32>) -> Self {
        let grad = Array2::zeros(data.raw_dim());
        Self {
            name: name.to_string(),
            data,
            grad,
        }
    }

    pub fn zeros(name: &str, rows: usize, cols: usize) -> Self {
        Self::new(name, Array2::zeros((rows, cols)))
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn clear_grad(&mut self) {
        self.grad.fill(0.0);
    }
}

/// LeCun-normal initialisation: `N(0, 1 / fan_in)`
pub fn lecun_normal<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Result<Array2<f32>> {
    let std = (1.0 / rows.max(1) as f32).sqrt();
    let normal = Normal::new(0.0f32, std)
        .map_err(|e| ForecastError::ConfigError(format!("Invalid initialiser scale: {}", e)))?;
    Ok(Array2::from_shape_fn((rows, cols), |_| normal.sample(rng)))
}

/// Mean squared error over every element
pub fn mean_squared_error(y: &Array2<f32>, t: &Array2<f32>) -> Result<f32> {
    if y.shape() != t.shape() {
        return Err(ForecastError::shape("mean_squared_error", t.shape(), y.shape()));
    }
    if y.is_empty() {
        return Err(ForecastError::TrainingError(
            "mean_squared_error of an empty batch".to_string(),
        ));
    }
    let diff = y - t;
    Ok(diff.mapv(|d| d * d).sum() / diff.len() as f32)
}

pub(crate) fn sigmoid(v: f32) -> f32 {
    1.0 / (1.0 + (-v).exp())
}
