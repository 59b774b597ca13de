//! Stateful LSTM layer
//!
//! Pre-activations are laid out as four blocks `[a | i | f | o]`:
//!
//! ```text
//! z = x·W + b + h_prev·U
//! a = tanh(z_a)   i = σ(z_i)   f = σ(z_f)   o = σ(z_o)
//! c = a ⊙ i + f ⊙ c_prev
//! h = o ⊙ tanh(c)
//! ```
//!
//! `(h, c)` persist between calls to [`Lstm::step`] until
//! [`Lstm::reset_state`]. A step with fewer rows than the stored state updates
//! the leading rows and keeps the rest. The backward pass stops at the
//! previous state.

use super::{lecun_normal, sigmoid, Parameter};
use crate::error::{ForecastError, Result};
use ndarray::{concatenate, s, Array2, Axis};
use rand::Rng;

#[derive(Debug, Clone)]
struct StepCache {
    x: Array2<f32>,
    prev: Option<(Array2<f32>, Array2<f32>)>,
    a: Array2<f32>,
    i: Array2<f32>,
    f: Array2<f32>,
    o: Array2<f32>,
    c: Array2<f32>,
}

#[derive(Debug, Clone)]
pub struct Lstm {
    n_in: usize,
    n_units: usize,
    /// Input to gates, `(n_in, 4 * n_units)`
    pub upward_w: Parameter,
    /// Gate bias, `(1, 4 * n_units)`
    pub upward_b: Parameter,
    /// Previous hidden state to gates, `(n_units, 4 * n_units)`, no bias
    pub lateral_w: Parameter,
    h: Option<Array2<f32>>,
    c: Option<Array2<f32>>,
    cache: Option<StepCache>,
}

impl Lstm {
    /// Forget-gate bias starts at 1, every other bias at 0
    pub fn new<R: Rng + ?Sized>(n_in: usize, n_units: usize, rng: &mut R) -> Result<Self> {
        if n_in == 0 || n_units == 0 {
            return Err(ForecastError::ConfigError(format!(
                "LSTM sizes must be positive, got {} -> {}",
                n_in, n_units
            )));
        }

        let mut bias = Array2::zeros((1, 4 * n_units));
        bias.slice_mut(s![.., 2 * n_units..3 * n_units]).fill(1.0);

        Ok(Self {
            n_in,
            n_units,
            upward_w: Parameter::new("l1/upward/W", lecun_normal(n_in, 4 * n_units, rng)?),
            upward_b: Parameter::new("l1/upward/b", bias),
            lateral_w: Parameter::new("l1/lateral/W", lecun_normal(n_units, 4 * n_units, rng)?),
            h: None,
            c: None,
            cache: None,
        })
    }

    pub fn n_in(&self) -> usize {
        self.n_in
    }

    pub fn n_units(&self) -> usize {
        self.n_units
    }

    pub fn reset_state(&mut self) {
        self.h = None;
        self.c = None;
    }

    pub fn state(&self) -> Option<(&Array2<f32>, &Array2<f32>)> {
        Some((self.h.as_ref()?, self.c.as_ref()?))
    }

    pub fn set_state(&mut self, h: Array2<f32>, c: Array2<f32>) -> Result<()> {
        let expected = [h.nrows(), self.n_units];
        if h.shape() != &expected[..] || c.shape() != &expected[..] {
            return Err(ForecastError::shape("Lstm::set_state", &expected, c.shape()));
        }
        self.h = Some(h);
        self.c = Some(c);
        Ok(())
    }

    /// Advance one time step for a batch `x` of shape `(batch, n_in)`
    pub fn step(&mut self, x: &Array2<f32>) -> Result<Array2<f32>> {
        if x.ncols() != self.n_in {
            return Err(ForecastError::shape(
                "Lstm::step input",
                &[x.nrows(), self.n_in],
                x.shape(),
            ));
        }

        let batch = x.nrows();
        if let Some(h) = &self.h {
            if h.nrows() < batch {
                return Err(ForecastError::shape(
                    "Lstm::step state batch",
                    &[h.nrows(), self.n_in],
                    x.shape(),
                ));
            }
        }

        let mut z = x.dot(&self.upward_w.data) + &self.upward_b.data;

        let (prev, rest) = match (self.h.take(), self.c.take()) {
            (Some(h), Some(c)) => {
                let (h, h_rest) = split_rows(h, batch);
                let (c, c_rest) = split_rows(c, batch);
                z += &h.dot(&self.lateral_w.data);
                (Some((h, c)), h_rest.zip(c_rest))
            }
            _ => (None, None),
        };

        let n = self.n_units;
        let a = z.slice(s![.., 0..n]).mapv(f32::tanh);
        let i = z.slice(s![.., n..2 * n]).mapv(sigmoid);
        let f = z.slice(s![.., 2 * n..3 * n]).mapv(sigmoid);
        let o = z.slice(s![.., 3 * n..4 * n]).mapv(sigmoid);

        let mut c = &a * &i;
        if let Some((_, c_prev)) = &prev {
            c += &(&f * c_prev);
        }
        let h = &o * &c.mapv(f32::tanh);

        match rest {
            Some((h_rest, c_rest)) => {
                let stack = |top: &Array2<f32>, bottom: Array2<f32>| {
                    concatenate(Axis(0), &[top.view(), bottom.view()]).map_err(|e| {
                        ForecastError::TrainingError(format!("LSTM state layout: {}", e))
                    })
                };
                self.h = Some(stack(&h, h_rest)?);
                self.c = Some(stack(&c, c_rest)?);
            }
            None => {
                self.h = Some(h.clone());
                self.c = Some(c.clone());
            }
        }
        self.cache = Some(StepCache {
            x: x.clone(),
            prev,
            a,
            i,
            f,
            o,
            c,
        });

        Ok(h)
    }

    /// Accumulate parameter gradients for the last step given `dL/dh`
    pub fn backward(&mut self, dh: &Array2<f32>) -> Result<()> {
        let cache = self.cache.as_ref().ok_or_else(|| {
            ForecastError::TrainingError("Lstm::backward called before step".to_string())
        })?;
        if dh.shape() != cache.c.shape() {
            return Err(ForecastError::shape("Lstm::backward", cache.c.shape(), dh.shape()));
        }

        let tanh_c = cache.c.mapv(f32::tanh);
        let d_o = dh * &tanh_c;
        let dc = dh * &cache.o * &tanh_c.mapv(|t| 1.0 - t * t);

        let dz_a = &dc * &cache.i * &cache.a.mapv(|a| 1.0 - a * a);
        let dz_i = &dc * &cache.a * &cache.i.mapv(|i| i * (1.0 - i));
        let dz_f = match &cache.prev {
            Some((_, c_prev)) => &dc * c_prev * &cache.f.mapv(|f| f * (1.0 - f)),
            None => Array2::zeros(dc.raw_dim()),
        };
        let dz_o = &d_o * &cache.o.mapv(|o| o * (1.0 - o));

        let dz = concatenate(
            Axis(1),
            &[dz_a.view(), dz_i.view(), dz_f.view(), dz_o.view()],
        )
        .map_err(|e| ForecastError::TrainingError(format!("Gate gradient layout: {}", e)))?;

        self.upward_w.grad += &cache.x.t().dot(&dz);
        self.upward_b.grad += &dz.sum_axis(Axis(0)).insert_axis(Axis(0));
        if let Some((h_prev, _)) = &cache.prev {
            self.lateral_w.grad += &h_prev.t().dot(&dz);
        }

        Ok(())
    }

    pub fn parameters(&self) -> Vec<&Parameter> {
        vec![&self.upward_w, &self.upward_b, &self.lateral_w]
    }

    pub fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        vec![&mut self.upward_w, &mut self.upward_b, &mut self.lateral_w]
    }
}

/// Leading `at` rows, plus the remainder when there is one
fn split_rows(m: Array2<f32>, at: usize) -> (Array2<f32>, Option<Array2<f32>>) {
    if m.nrows() == at {
        return (m, None);
    }
    (
        m.slice(s![..at, ..]).to_owned(),
        Some(m.slice(s![at.., ..]).to_owned()),
    )
}
