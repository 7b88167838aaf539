// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between a dataset file on disk and the three
// class-grouped sets the training engine consumes:
//
//   dataset file (.txt)
//       │
//       ▼
//   DatasetFileLoader   → parses header + binary vectors
//       │
//       ▼
//   RawDataset          → all examples, grouped by class
//       │
//       ▼
//   split_by_class      → per-class train/test/validation split
//       │
//       ▼
//   TrainingData        → three ClassPartitionedSets
//
// statistics.rs supplies the activation probabilities used to
// initialise visible biases, and the dataset entropy.
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Parses dataset files and single input vectors
pub mod loader;

/// Class-partitioned example sets
pub mod dataset;

/// Shuffles and splits data per class into three subsets
pub mod splitter;

/// Activation probabilities, visible-bias log-odds, entropy
pub mod statistics;
