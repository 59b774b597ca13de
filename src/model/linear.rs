//! Dense readout and inverted dropout

use super::{lecun_normal, Parameter};
use crate::error::{ForecastError, Result};
use ndarray::{Array2, Axis};
use rand::Rng;

/// Fully connected layer `y = x·W + b`
#[derive(Debug, Clone)]
pub struct Linear {
    /// `(n_in, n_out)`
    pub w: Parameter,
    /// `(1, n_out)`
    pub b: Parameter,
    input: Option<Array2<f32>>,
}

impl Linear {
    pub fn new<R: Rng + ?Sized>(n_in: usize, n_out: usize, rng: &mut R) -> Result<Self> {
        if n_in == 0 || n_out == 0 {
            return Err(ForecastError::ConfigError(format!(
                "Linear sizes must be positive, got {} -> {}",
                n_in, n_out
            )));
        }
        Ok(Self {
            w: Parameter::new("l2/W", lecun_normal(n_in, n_out, rng)?),
            b: Parameter::zeros("l2/b", 1, n_out),
            input: None,
        })
    }

    pub fn forward(&mut self, x: &Array2<f32>) -> Result<Array2<f32>> {
        if x.ncols() != self.w.data.nrows() {
            return Err(ForecastError::shape(
                "Linear::forward",
                &[x.nrows(), self.w.data.nrows()],
                x.shape(),
            ));
        }
        let y = x.dot(&self.w.data) + &self.b.data;
        self.input = Some(x.clone());
        Ok(y)
    }

    /// Accumulate gradients and return `dL/dx`
    pub fn backward(&mut self, dy: &Array2<f32>) -> Result<Array2<f32>> {
        let x = self.input.as_ref().ok_or_else(|| {
            ForecastError::TrainingError("Linear::backward called before forward".to_string())
        })?;
        if dy.nrows() != x.nrows() || dy.ncols() != self.w.data.ncols() {
            return Err(ForecastError::shape(
                "Linear::backward",
                &[x.nrows(), self.w.data.ncols()],
                dy.shape(),
            ));
        }

        self.w.grad += &x.t().dot(dy);
        self.b.grad += &dy.sum_axis(Axis(0)).insert_axis(Axis(0));
        Ok(dy.dot(&self.w.data.t()))
    }

    pub fn parameters(&self) -> Vec<&Parameter> {
        vec![&self.w, &self.b]
    }

    pub fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        vec![&mut self.w, &mut self.b]
    }
}

/// Inverted dropout: kept activations are scaled by `1 / (1 - ratio)`
#[derive(Debug, Clone)]
pub struct Dropout {
    ratio: f32,
    mask: Option<Array2<f32>>,
}

impl Dropout {
    pub fn new(ratio: f32) -> Result<Self> {
        if !(0.0..1.0).contains(&ratio) {
            return Err(ForecastError::ConfigError(format!(
                "Dropout ratio must be in [0, 1), got {}",
                ratio
            )));
        }
        Ok(Self { ratio, mask: None })
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Identity unless `train` is set
    pub fn forward<R: Rng + ?Sized>(&mut self, x: &Array2<f32>, train: bool, rng: &mut R) -> Array2<f32> {
        if !train || self.ratio == 0.0 {
            self.mask = None;
            return x.clone();
        }

        let scale = 1.0 / (1.0 - self.ratio);
        let ratio = self.ratio;
        let mask = Array2::from_shape_fn(x.raw_dim(), |_| {
            if rng.gen::<f32>() < ratio {
                0.0
            } else {
                scale
            }
        });
        let y = x * &mask;
        self.mask = Some(mask);
        y
    }

    pub fn backward(&self, dy: &Array2<f32>) -> Array2<f32> {
        match &self.mask {
            Some(mask) => dy * mask,
            None => dy.clone(),
        }
    }
}
