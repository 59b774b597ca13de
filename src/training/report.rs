//! Per-epoch training reports
//!
//! [`LogReport`] keeps one [`LogEntry`] per epoch and mirrors them to a JSON
//! file; [`PrintReport`] renders the same entries as a fixed-width table.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub epoch: usize,
    pub iteration: usize,
    /// Mean training loss over the iterations since the previous entry
    #[serde(rename = "main/loss")]
    pub main_loss: f32,
    #[serde(
        rename = "validation/main/loss",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub validation_loss: Option<f32>,
    /// Seconds since training started
    pub elapsed_time: f64,
}

#[derive(Debug, Clone, Default)]
pub struct LogReport {
    entries: Vec<LogEntry>,
    pending: Vec<f32>,
    path: Option<PathBuf>,
}

impl LogReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also write the full log as JSON to `path` after every entry
    pub fn with_output(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn output(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record one iteration's training loss
    pub fn observe(&mut self, loss: f32) {
        self.pending.push(loss);
    }

    /// Close the current epoch and append its entry
    pub fn commit(
        &mut self,
        epoch: usize,
        iteration: usize,
        validation_loss: Option<f32>,
        elapsed_time: f64,
    ) -> Result<&LogEntry> {
        let main_loss = if self.pending.is_empty() {
            f32::NAN
        } else {
            self.pending.iter().sum::<f32>() / self.pending.len() as f32
        };
        self.pending.clear();

        self.entries.push(LogEntry {
            epoch,
            iteration,
            main_loss,
            validation_loss,
            elapsed_time,
        });

        if let Some(path) = &self.path {
            fs::write(path, serde_json::to_string_pretty(&self.entries)?)?;
        }

        let index = self.entries.len() - 1;
        Ok(&self.entries[index])
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Read back a log written by [`LogReport::with_output`]
    pub fn load(path: &Path) -> Result<Vec<LogEntry>> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

const COLUMNS: [&str; 4] = ["epoch", "main/loss", "validation/main/loss", "elapsed_time"];

/// Fixed-width table of log entries
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintReport;

impl PrintReport {
    fn width(column: &str) -> usize {
        column.len().max(10)
    }

    pub fn header(&self) -> String {
        COLUMNS
            .iter()
            .map(|c| format!("{:<w$}", c, w = Self::width(c)))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    }

    pub fn row(&self, entry: &LogEntry) -> String {
        let cells = [
            entry.epoch.to_string(),
            format!("{:.6}", entry.main_loss),
            entry
                .validation_loss
                .map(|v| format!("{:.6}", v))
                .unwrap_or_default(),
            format!("{:.4}", entry.elapsed_time),
        ];

        COLUMNS
            .iter()
            .zip(cells.iter())
            .map(|(c, v)| format!("{:<w$}", v, w = Self::width(c)))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    }
}
