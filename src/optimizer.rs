//! Adam optimizer over the regressor's parameters
//!
//! Step size follows the bias-corrected form
//! `lr = alpha * sqrt(1 - beta2^t) / (1 - beta1^t)` with the update
//! `p -= lr * m / (sqrt(v) + eps)`.

use crate::error::{ForecastError, Result};
use crate::model::{LstmRegressor, Parameter};
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdamConfig {
    pub alpha: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub eps: f32,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            alpha: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
        }
    }
}

#[derive(Debug, Clone)]
struct Moments {
    m: Array2<f32>,
    v: Array2<f32>,
}

#[derive(Debug, Clone)]
pub struct Adam {
    config: AdamConfig,
    /// One entry per parameter, in `parameters()` order
    state: Vec<Moments>,
    t: u64,
}

impl Adam {
    pub fn new(config: AdamConfig) -> Self {
        Self {
            config,
            state: Vec::new(),
            t: 0,
        }
    }

    pub fn config(&self) -> &AdamConfig {
        &self.config
    }

    /// Number of updates applied so far
    pub fn timestep(&self) -> u64 {
        self.t
    }

    /// Allocate zeroed moments for every parameter of `model`
    pub fn setup(&mut self, model: &LstmRegressor) {
        self.state = model
            .parameters()
            .iter()
            .map(|p| Moments {
                m: Array2::zeros(p.data.raw_dim()),
                v: Array2::zeros(p.data.raw_dim()),
            })
            .collect();
        self.t = 0;
    }

    /// Current bias-corrected step size
    pub fn lr(&self) -> f32 {
        let t = self.t.max(1) as i32;
        let fix1 = 1.0 - self.config.beta1.powi(t);
        let fix2 = 1.0 - self.config.beta2.powi(t);
        self.config.alpha * fix2.sqrt() / fix1
    }

    /// Apply one update from the gradients accumulated in `model`
    pub fn update(&mut self, model: &mut LstmRegressor) -> Result<()> {
        let mut params = model.parameters_mut();
        if params.len() != self.state.len() {
            return Err(ForecastError::TrainingError(format!(
                "Optimizer set up for {} parameters, model has {}",
                self.state.len(),
                params.len()
            )));
        }

        self.t += 1;
        let lr = self.lr();
        let AdamConfig {
            beta1, beta2, eps, ..
        } = self.config;

        for (param, moments) in params.iter_mut().zip(self.state.iter_mut()) {
            update_one(param, moments, lr, beta1, beta2, eps)?;
        }
        Ok(())
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::new(AdamConfig::default())
    }
}

fn update_one(
    param: &mut Parameter,
    moments: &mut Moments,
    lr: f32,
    beta1: f32,
    beta2: f32,
    eps: f32,
) -> Result<()> {
    if param.data.shape() != moments.m.shape() {
        return Err(ForecastError::shape(
            &format!("Adam update of {}", param.name),
            moments.m.shape(),
            param.data.shape(),
        ));
    }

    Zip::from(&mut param.data)
        .and(&param.grad)
        .and(&mut moments.m)
        .and(&mut moments.v)
        .for_each(|p, &g, m, v| {
            *m += (1.0 - beta1) * (g - *m);
            *v += (1.0 - beta2) * (g * g - *v);
            *p -= lr * *m / (v.sqrt() + eps);
        });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    #[test]
    fn test_first_step_moves_by_alpha() {
        let mut model = LstmRegressor::new(2, 2, 1, 0.0, 1).unwrap();
        let mut adam = Adam::default();
        adam.setup(&model);

        let before = model.l2.b.data[[0, 0]];
        model.l2.b.grad.fill(0.5);
        adam.update(&mut model).unwrap();

        // With a constant gradient the first bias-corrected step is alpha
        assert_relative_eq!(model.l2.b.data[[0, 0]], before - 0.001, epsilon = 1e-6);
        assert_eq!(adam.timestep(), 1);
    }

    #[test]
    fn test_zero_gradient_leaves_parameters() {
        let mut model = LstmRegressor::new(3, 2, 1, 0.0, 1).unwrap();
        let snapshot: Vec<Array2<f32>> = model.parameters().iter().map(|p| p.data.clone()).collect();

        let mut adam = Adam::default();
        adam.setup(&model);
        adam.update(&mut model).unwrap();

        for (p, before) in model.parameters().iter().zip(&snapshot) {
            assert_eq!(&p.data, before);
        }
    }

    #[test]
    fn test_update_without_setup_fails() {
        let mut model = LstmRegressor::new(2, 2, 1, 0.0, 1).unwrap();
        let mut adam = Adam::default();
        assert!(adam.update(&mut model).is_err());
    }

    #[test]
    fn test_lr_bias_correction() {
        let adam = Adam::default();
        // t = 1: alpha * sqrt(0.001) / 0.1
        assert_relative_eq!(adam.lr(), 0.001 * 0.001f32.sqrt() / 0.1, epsilon = 1e-7);
    }
}
