//! Single training iterations and validation passes

use crate::dataset::{SerialIterator, WindowedDataset};
use crate::error::{ForecastError, Result};
use crate::model::LstmRegressor;
use crate::optimizer::Adam;

/// Runs one optimisation step per call
///
/// Each step starts from a fresh recurrent state, so samples never see the
/// state left behind by another batch.
#[derive(Debug, Clone)]
pub struct Updater {
    iterator: SerialIterator,
    optimizer: Adam,
    iteration: usize,
}

impl Updater {
    pub fn new(iterator: SerialIterator, optimizer: Adam) -> Self {
        Self {
            iterator,
            optimizer,
            iteration: 0,
        }
    }

    /// Train on the next batch and return its loss
    pub fn update(&mut self, model: &mut LstmRegressor, dataset: &WindowedDataset) -> Result<f32> {
        let indices = self.iterator.next().ok_or_else(|| {
            ForecastError::TrainingError("Training iterator yielded no batch".to_string())
        })?;
        let (x, t) = dataset.batch(&indices)?;

        model.reset_state();
        model.clear_grads();
        let loss = model.loss(&x, &t, true)?;
        model.backward()?;
        self.optimizer.update(model)?;

        self.iteration += 1;
        Ok(loss)
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn epoch(&self) -> usize {
        self.iterator.epoch()
    }

    pub fn epoch_detail(&self) -> f64 {
        self.iterator.epoch_detail()
    }

    pub fn is_new_epoch(&self) -> bool {
        self.iterator.is_new_epoch()
    }

    pub fn optimizer(&self) -> &Adam {
        &self.optimizer
    }
}

/// Mean loss over a dataset in evaluation mode
///
/// The recurrent state is not cleared: the first batch continues from the
/// state the last training step left, and each batch continues from the one
/// before it.
#[derive(Debug, Clone)]
pub struct Evaluator {
    iterator: SerialIterator,
}

impl Evaluator {
    pub fn new(iterator: SerialIterator) -> Self {
        Self { iterator }
    }

    /// Mean of the per-batch losses, `None` for an empty dataset
    pub fn evaluate(&mut self, model: &mut LstmRegressor, dataset: &WindowedDataset) -> Result<Option<f32>> {
        self.iterator.reset();

        let mut total = 0.0f32;
        let mut batches = 0usize;
        for indices in self.iterator.by_ref() {
            let (x, t) = dataset.batch(&indices)?;
            total += model.loss(&x, &t, false)?;
            batches += 1;
        }

        Ok((batches > 0).then(|| total / batches as f32))
    }
}
