//! Epoch-driven training with per-epoch validation and reporting

use super::report::{LogEntry, LogReport, PrintReport};
use super::updater::{Evaluator, Updater};
use crate::dataset::{SerialIterator, WindowedDataset};
use crate::error::{ForecastError, Result};
use crate::model::LstmRegressor;
use crate::optimizer::Adam;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub epochs: usize,
    pub batch_size: usize,
    /// Seeds the shuffling of the training batches
    pub seed: u64,
    /// Directory receiving the JSON `log`
    pub out_dir: Option<PathBuf>,
    /// Print the report table to stdout
    pub print_report: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epochs: 30,
            batch_size: 20,
            seed: 1,
            out_dir: None,
            print_report: true,
        }
    }
}

pub struct Trainer {
    config: TrainerConfig,
    optimizer: Adam,
}

impl Trainer {
    pub fn new(config: TrainerConfig, optimizer: Adam) -> Result<Self> {
        if config.epochs == 0 {
            return Err(ForecastError::ConfigError(
                "epochs must be greater than 0".to_string(),
            ));
        }
        if config.batch_size == 0 {
            return Err(ForecastError::ConfigError(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        Ok(Self { config, optimizer })
    }

    /// Train `model` on `train` until the configured number of epochs has
    /// passed, validating on `test` at the end of every epoch
    pub fn run(
        &self,
        model: &mut LstmRegressor,
        train: &WindowedDataset,
        test: &WindowedDataset,
    ) -> Result<Vec<LogEntry>> {
        if train.is_empty() {
            return Err(ForecastError::TrainingError(
                "Training set is empty".to_string(),
            ));
        }

        let mut optimizer = self.optimizer.clone();
        optimizer.setup(model);

        let train_iter = SerialIterator::new(
            train.len(),
            self.config.batch_size,
            true,
            true,
            self.config.seed,
        )?;
        let mut updater = Updater::new(train_iter, optimizer);

        let mut evaluator = if test.is_empty() {
            log::warn!("Test set is empty, validation loss will not be reported");
            None
        } else {
            Some(Evaluator::new(SerialIterator::new(
                test.len(),
                self.config.batch_size,
                false,
                false,
                self.config.seed,
            )?))
        };

        let mut log_report = match &self.config.out_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                LogReport::with_output(dir.join("log"))
            }
            None => LogReport::new(),
        };
        let printer = PrintReport;

        log::info!(
            "Training on {} samples ({} for validation), {} epochs of batch {}",
            train.len(),
            test.len(),
            self.config.epochs,
            self.config.batch_size
        );
        if self.config.print_report {
            println!("{}", printer.header());
        }

        let start = Instant::now();
        while updater.epoch() < self.config.epochs {
            let loss = updater.update(model, train)?;
            if !loss.is_finite() {
                return Err(ForecastError::TrainingError(format!(
                    "Loss diverged at iteration {}",
                    updater.iteration()
                )));
            }
            log_report.observe(loss);

            if updater.is_new_epoch() {
                let validation = match evaluator.as_mut() {
                    Some(evaluator) => evaluator.evaluate(model, test)?,
                    None => None,
                };
                let entry = log_report.commit(
                    updater.epoch(),
                    updater.iteration(),
                    validation,
                    start.elapsed().as_secs_f64(),
                )?;

                log::debug!(
                    "epoch {} iteration {} loss {:.6} validation {:?}",
                    entry.epoch,
                    entry.iteration,
                    entry.main_loss,
                    entry.validation_loss
                );
                if self.config.print_report {
                    println!("{}", printer.row(entry));
                }
            }
        }

        Ok(log_report.entries().to_vec())
    }
}
