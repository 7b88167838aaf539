// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The two seams between the core and its collaborators:
//
//   ExampleSource    — anything that can supply a labelled,
//                      class-grouped dataset
//                      (DatasetFileLoader today)
//
//   TrainingObserver — anything that wants the per-checkpoint
//                      metrics of a training run
//                      (CSV logger, tracing log, event channel)
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::data::dataset::RawDataset;
use crate::domain::progress::CheckpointMetrics;

// ─── ExampleSource ────────────────────────────────────────────────────────────
/// Any component that can load a labelled dataset.
pub trait ExampleSource {
    /// Load every example, grouped by class.
    fn load_all(&self) -> Result<RawDataset>;
}

// ─── TrainingObserver ─────────────────────────────────────────────────────────
/// Receives checkpoint metrics from the training engine.
///
/// Called synchronously on the training worker. The call has no
/// return value and cannot stop the run; implementations that
/// need another thread (a UI, a chart) should forward the value
/// and return quickly.
pub trait TrainingObserver: Send {
    fn on_checkpoint(&mut self, metrics: &CheckpointMetrics);
}

/// Closures work as observers, which keeps tests short.
impl<F> TrainingObserver for F
where
    F: FnMut(&CheckpointMetrics) + Send,
{
    fn on_checkpoint(&mut self, metrics: &CheckpointMetrics) {
        self(metrics)
    }
}
