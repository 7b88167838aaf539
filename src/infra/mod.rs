// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Concerns used by several layers but owned by none:
//
//   checkpoint.rs — model snapshots (bincode) and the run
//                   config (JSON) in a checkpoint directory
//
//   metrics.rs    — checkpoint observers: CSV file and
//                   tracing log
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Model snapshot and config persistence
pub mod checkpoint;

/// Checkpoint metrics CSV logger and log observer
pub mod metrics;
