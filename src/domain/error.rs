// ============================================================
// Layer 3 — Core Error Type
// ============================================================
// Every fallible operation below the application layer returns
// RbmError. The application and CLI layers wrap it in anyhow
// with file-path context.
//
// The variants fall into four families:
//   - construction errors   (InvalidArgument, UnsupportedOperation)
//   - missing training state (MissingTrainingState)
//   - dimension checks       (DimensionMismatch, UnequalClassPartitions)
//   - persistence            (Persistence, IncompatibleSnapshot, Io)

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RbmError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A neuron layer's length is fixed at construction.
    #[error("trying to change dimensions of a neuron layer from {expected} to {actual}")]
    UnsupportedOperation { expected: usize, actual: usize },

    /// A weight or bias update was requested before the buffers of a
    /// Gibbs step were recorded. This is a bug in the calling code.
    #[error("no Gibbs step was performed: {0}")]
    MissingTrainingState(&'static str),

    #[error("incompatible dimensions: expected a vector of length {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("{examples} examples cannot be divided into {classes} equal class partitions")]
    UnequalClassPartitions { examples: usize, classes: usize },

    #[error("a training run is already active on this control handle")]
    AlreadyRunning,

    #[error("training worker panicked")]
    WorkerPanicked,

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("incompatible snapshot: format version {found}, expected {expected}")]
    IncompatibleSnapshot { found: u32, expected: u32 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type RbmResult<T> = Result<T, RbmError>;
