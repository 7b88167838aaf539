// ============================================================
// Layer 3 — Training Progress Types
// ============================================================
// Plain data published by the training engine at every
// checkpoint. Observers (CSV log, tracing, channel, tests)
// receive these by reference.

use serde::{Deserialize, Serialize};

/// Diagnostics computed at one checkpoint of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetrics {
    /// 1-based epoch after which the checkpoint was taken
    pub epoch: usize,

    /// Average free energy over the training set
    pub train_free_energy: f64,

    /// Average free energy over the validation set
    pub validation_free_energy: f64,

    /// Examples whose reconstructed label differs from the true one
    pub train_misclassified: usize,
    pub validation_misclassified: usize,

    /// Average squared reconstruction error over the epoch just finished
    pub reconstruction_error: f64,
}

impl CheckpointMetrics {
    /// |validation − train| free energy. A growing gap signals overfitting.
    pub fn divergence(&self) -> f64 {
        (self.validation_free_energy - self.train_free_energy).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divergence_is_absolute() {
        let mut m = CheckpointMetrics {
            epoch: 1,
            train_free_energy: -10.0,
            validation_free_energy: -4.0,
            train_misclassified: 0,
            validation_misclassified: 0,
            reconstruction_error: 0.0,
        };
        assert_eq!(m.divergence(), 6.0);
        m.validation_free_energy = -16.0;
        assert_eq!(m.divergence(), 6.0);
    }
}
