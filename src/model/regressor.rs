//! LSTM regressor: `y = l2(dropout(l1(x)))`

use super::{mean_squared_error, Dropout, Linear, Lstm, Parameter};
use crate::error::{ForecastError, Result};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone)]
pub struct LstmRegressor {
    pub l1: Lstm,
    pub l2: Linear,
    dropout: Dropout,
    rng: StdRng,
    /// `y - t` of the last loss, scaled into `dL/dy` by backward
    residual: Option<Array2<f32>>,
}

impl LstmRegressor {
    /// Build the network with weights drawn from a generator seeded with `seed`
    pub fn new(n_in: usize, n_units: usize, n_output: usize, dropout: f32, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let l1 = Lstm::new(n_in, n_units, &mut rng)?;
        let l2 = Linear::new(n_units, n_output, &mut rng)?;
        Ok(Self {
            l1,
            l2,
            dropout: Dropout::new(dropout)?,
            rng,
            residual: None,
        })
    }

    pub fn reset_state(&mut self) {
        self.l1.reset_state();
    }

    /// Forward pass; dropout is applied only when `train` is set
    pub fn predict(&mut self, x: &Array2<f32>, train: bool) -> Result<Array2<f32>> {
        let h1 = self.l1.step(x)?;
        let h1 = self.dropout.forward(&h1, train, &mut self.rng);
        self.l2.forward(&h1)
    }

    /// Mean squared error of the prediction for `x` against `t`
    pub fn loss(&mut self, x: &Array2<f32>, t: &Array2<f32>, train: bool) -> Result<f32> {
        let y = self.predict(x, train)?;
        let loss = mean_squared_error(&y, t)?;
        self.residual = Some(y - t);
        Ok(loss)
    }

    /// Accumulate gradients of the last [`loss`](Self::loss) into every parameter
    pub fn backward(&mut self) -> Result<()> {
        let residual = self.residual.take().ok_or_else(|| {
            ForecastError::TrainingError("backward called before loss".to_string())
        })?;

        let dy = residual.mapv(|r| r * 2.0) / residual.len() as f32;
        let dh1 = self.l2.backward(&dy)?;
        let dh1 = self.dropout.backward(&dh1);
        self.l1.backward(&dh1)
    }

    pub fn clear_grads(&mut self) {
        for p in self.parameters_mut() {
            p.clear_grad();
        }
    }

    pub fn parameters(&self) -> Vec<&Parameter> {
        let mut params = self.l1.parameters();
        params.extend(self.l2.parameters());
        params
    }

    pub fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        let mut params = self.l1.parameters_mut();
        params.extend(self.l2.parameters_mut());
        params
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters().iter().map(|p| p.size()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn random_batch(rng: &mut StdRng, batch: usize, n_in: usize) -> (Array2<f32>, Array2<f32>) {
        let x = Array2::from_shape_fn((batch, n_in), |_| rng.gen_range(-1.0f32..1.0));
        let t = Array2::from_shape_fn((batch, 1), |_| rng.gen_range(-1.0f32..1.0));
        (x, t)
    }

    /// Central-difference check of every gradient entry with the state held fixed
    fn check_gradients(model: &mut LstmRegressor, x: &Array2<f32>, t: &Array2<f32>) {
        let state = model
            .l1
            .state()
            .map(|(h, c)| (h.clone(), c.clone()));
        let restore = |m: &mut LstmRegressor| match &state {
            Some((h, c)) => m.l1.set_state(h.clone(), c.clone()).unwrap(),
            None => m.reset_state(),
        };

        model.clear_grads();
        restore(model);
        model.loss(x, t, false).unwrap();
        model.backward().unwrap();

        let analytic: Vec<Array2<f32>> = model.parameters().iter().map(|p| p.grad.clone()).collect();
        let eps = 5e-3f32;

        for (k, grad) in analytic.iter().enumerate() {
            for idx in 0..grad.len() {
                let (r, c) = (idx / grad.ncols(), idx % grad.ncols());
                let original = model.parameters()[k].data[[r, c]];

                model.parameters_mut()[k].data[[r, c]] = original + eps;
                restore(model);
                let plus = model.loss(x, t, false).unwrap();

                model.parameters_mut()[k].data[[r, c]] = original - eps;
                restore(model);
                let minus = model.loss(x, t, false).unwrap();

                model.parameters_mut()[k].data[[r, c]] = original;

                let numeric = (plus - minus) / (2.0 * eps);
                let expected = grad[[r, c]];
                assert!(
                    (numeric - expected).abs() <= 1e-3 + 1e-2 * expected.abs(),
                    "{}[{}, {}]: numeric {} vs analytic {}",
                    model.parameters()[k].name,
                    r,
                    c,
                    numeric,
                    expected
                );
            }
        }
    }

    #[test]
    fn test_predict_shape() {
        let mut model = LstmRegressor::new(30, 30, 1, 0.05, 1).unwrap();
        let x = Array2::zeros((20, 30));
        assert_eq!(model.predict(&x, true).unwrap().shape(), &[20, 1]);
        assert_eq!(model.parameter_count(), 30 * 120 + 120 + 30 * 120 + 30 + 1);
    }

    #[test]
    fn test_same_seed_same_weights() {
        let a = LstmRegressor::new(4, 3, 1, 0.0, 42).unwrap();
        let b = LstmRegressor::new(4, 3, 1, 0.0, 42).unwrap();
        for (pa, pb) in a.parameters().iter().zip(b.parameters()) {
            assert_eq!(pa.data, pb.data);
        }
    }

    #[test]
    fn test_gradients_from_fresh_state() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut model = LstmRegressor::new(4, 3, 1, 0.0, 5).unwrap();
        let (x, t) = random_batch(&mut rng, 5, 4);
        check_gradients(&mut model, &x, &t);
    }

    #[test]
    fn test_gradients_with_carried_state() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut model = LstmRegressor::new(4, 3, 1, 0.0, 6).unwrap();
        let (x0, _) = random_batch(&mut rng, 5, 4);
        model.predict(&x0, false).unwrap();

        let (x, t) = random_batch(&mut rng, 5, 4);
        check_gradients(&mut model, &x, &t);
    }

    #[test]
    fn test_backward_requires_loss() {
        let mut model = LstmRegressor::new(2, 2, 1, 0.0, 1).unwrap();
        assert!(matches!(model.backward(), Err(ForecastError::TrainingError(_))));
    }

    #[test]
    fn test_target_shape_checked() {
        let mut model = LstmRegressor::new(2, 2, 1, 0.0, 1).unwrap();
        let x = Array2::zeros((3, 2));
        let t = Array2::zeros((2, 1));
        assert!(model.loss(&x, &t, true).is_err());
    }
}
