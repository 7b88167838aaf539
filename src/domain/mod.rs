// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types shared by every other layer:
//
//   neuron_layer.rs — fixed-size binary unit vector
//   label.rs        — one-hot class label suffix codec
//   progress.rs     — checkpoint metrics published during training
//   traits.rs       — ExampleSource and TrainingObserver seams
//   error.rs        — RbmError, the typed error of the core
//
// Rules for this layer:
//   - NO file I/O or threads
//   - NO numerical training code
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

pub mod error;

pub mod label;

pub mod neuron_layer;

pub mod progress;

pub mod traits;
