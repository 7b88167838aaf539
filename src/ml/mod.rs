// ============================================================
// Layer 5 — ML / Model Layer
// ============================================================
// All sampling and parameter-update math lives here. Other
// layers only call into it.
//
//   rbm.rs        — The binary RBM: layers, weights, biases,
//                   Gibbs sampling, CD-1 update equations,
//                   free energy
//
//   trainer.rs    — The training engine: round-robin CD-1
//                   epochs, checkpoints, early stopping,
//                   observers and event channel
//
//   control.rs    — Pause / resume signal shared with the
//                   training worker
//
//   inferencer.rs — Reconstruction, classification and the
//                   set-level diagnostics
//
// Reference: Hinton (2010) A Practical Guide to Training RBMs

/// Binary restricted Boltzmann machine
pub mod rbm;

/// CD-1 training engine
pub mod trainer;

/// Run state machine and pause/resume handle
pub mod control;

/// Generation and classification with a trained model
pub mod inferencer;
