// ============================================================
// Layer 6 — Checkpoint Metrics Observers
// ============================================================
// Two TrainingObserver implementations:
//
//   MetricsLogger  appends one CSV row per checkpoint
//   LogObserver    publishes the same values through tracing
//
// Example CSV output:
//   epoch,train_free_energy,validation_free_energy,divergence,train_misclassified,validation_misclassified,reconstruction_error
//   1,-41.207713,-40.998120,0.209593,12,5,3.412500
//   51,-63.550014,-61.037411,2.512603,3,2,0.912500
//
// How to read the metrics:
//   - Free energy should fall on both sets while the model learns
//   - A widening gap between the two means the model is fitting
//     the training set at the expense of unseen data
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::progress::CheckpointMetrics;
use crate::domain::traits::TrainingObserver;

pub const CSV_HEADER: &str = "epoch,train_free_energy,validation_free_energy,divergence,\
train_misclassified,validation_misclassified,reconstruction_error";

/// Logs checkpoint metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet, so a
    /// resumed run keeps appending to the same log.
    pub fn new(csv_path: impl Into<PathBuf>) -> Result<Self> {
        let csv_path = csv_path.into();
        if let Some(parent) = csv_path.parent() {
            fs::create_dir_all(parent)?;
        }
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "{CSV_HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }
        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &CheckpointMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{},{},{:.6}",
            m.epoch,
            m.train_free_energy,
            m.validation_free_energy,
            m.divergence(),
            m.train_misclassified,
            m.validation_misclassified,
            m.reconstruction_error,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

impl TrainingObserver for MetricsLogger {
    /// A failed write must not stop training; it is only reported.
    fn on_checkpoint(&mut self, metrics: &CheckpointMetrics) {
        if let Err(e) = self.log(metrics) {
            tracing::warn!("Could not append to '{}': {:#}", self.csv_path.display(), e);
        }
    }
}

/// Publishes every checkpoint at info level.
#[derive(Debug, Default)]
pub struct LogObserver;

impl TrainingObserver for LogObserver {
    fn on_checkpoint(&mut self, m: &CheckpointMetrics) {
        tracing::info!(
            "Epoch {:>5} | F_train {:>10.4} | F_val {:>10.4} | Δ {:>8.4} | miss train {} val {} | recon {:.4}",
            m.epoch,
            m.train_free_energy,
            m.validation_free_energy,
            m.divergence(),
            m.train_misclassified,
            m.validation_misclassified,
            m.reconstruction_error,
        );
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(epoch: usize) -> CheckpointMetrics {
        CheckpointMetrics {
            epoch,
            train_free_energy:        -10.0,
            validation_free_energy:   -8.5,
            train_misclassified:      3,
            validation_misclassified: 1,
            reconstruction_error:     0.25,
        }
    }

    #[test]
    fn test_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = MetricsLogger::new(dir.path().join("metrics.csv")).unwrap();
        logger.on_checkpoint(&metrics(1));
        logger.on_checkpoint(&metrics(51));

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "1,-10.000000,-8.500000,1.500000,3,1,0.250000");
        assert!(lines[2].starts_with("51,"));
    }

    #[test]
    fn test_appends_across_loggers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("metrics.csv");
        MetricsLogger::new(&path).unwrap().log(&metrics(1)).unwrap();
        MetricsLogger::new(&path).unwrap().log(&metrics(2)).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().filter(|l| *l == CSV_HEADER).count(), 1);
        assert_eq!(text.lines().count(), 3);
    }
}
