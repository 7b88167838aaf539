// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training, classifying, evaluating).
//
// Rules for this layer:
//   - No sampling or update math here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// Classify single input vectors with a saved model
pub mod classify_use_case;

// Score a saved model on a dataset file; model summaries
pub mod evaluate_use_case;
