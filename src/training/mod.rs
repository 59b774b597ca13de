//! Training loop
//!
//! The [`Updater`] performs one optimisation step per minibatch, the
//! [`Evaluator`] measures the validation loss, and the [`Trainer`] drives both
//! for a fixed number of epochs while the reports record each epoch.

pub mod report;
pub mod trainer;
pub mod updater;

pub use report::{LogEntry, LogReport, PrintReport};
pub use trainer::{Trainer, TrainerConfig};
pub use updater::{Evaluator, Updater};
