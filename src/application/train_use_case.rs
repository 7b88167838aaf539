// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the dataset file      (Layer 4 - data)
//   Step 2: Split per class            (Layer 4 - data)
//   Step 3: Build or resume the model  (Layer 5 - ml / Layer 6 - infra)
//   Step 4: Save config                (Layer 6 - infra)
//   Step 5: Run the training engine    (Layer 5 - ml)
//   Step 6: Save the trained model     (Layer 6 - infra)
//
// Reference: Rust Book §16 (Fearless Concurrency)

use anyhow::{bail, Context, Result};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{
    loader::DatasetFileLoader,
    splitter::{split_by_class, SplitFractions},
    statistics::{entropy, initial_visible_biases},
};
use crate::domain::neuron_layer::NeuronLayer;
use crate::domain::traits::ExampleSource;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{LogObserver, MetricsLogger},
};
use crate::ml::{
    control::TrainingControl,
    rbm::{HiddenBiasInit, InitPolicy, RbmModel},
    trainer::{TrainingConfig, TrainingEngine, TrainingReport},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Every parameter of a training run. Saved next to the model so
// classify/evaluate can recover the label width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub dataset:               PathBuf,
    pub checkpoint_dir:        PathBuf,
    pub hidden_units:          usize,
    pub learning_rate:         f64,
    pub epochs:                usize,
    pub error_check_interval:  usize,
    pub termination_threshold: f64,
    pub train_fraction:        f64,
    pub test_fraction:         f64,
    pub validation_fraction:   f64,
    pub hidden_bias_init:      HiddenBiasInit,
    pub weight_std_dev:        f64,
    pub seed:                  Option<u64>,
    pub resume:                bool,
    pub interactive:           bool,
    /// Filled in from the dataset header when training starts
    #[serde(default)]
    pub num_classes:           usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            dataset:               PathBuf::from("data/dataset.txt"),
            checkpoint_dir:        PathBuf::from("checkpoints"),
            hidden_units:          400,
            learning_rate:         0.001,
            epochs:                1000,
            error_check_interval:  50,
            termination_threshold: 50.0,
            train_fraction:        0.6,
            test_fraction:         0.2,
            validation_fraction:   0.2,
            hidden_bias_init:      HiddenBiasInit::Negative,
            weight_std_dev:        0.01,
            seed:                  None,
            resume:                false,
            interactive:           false,
            num_classes:           0,
        }
    }
}

impl TrainConfig {
    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            learning_rate:         self.learning_rate,
            epochs:                self.epochs,
            error_check_interval:  self.error_check_interval,
            termination_threshold: self.termination_threshold,
            seed:                  self.seed,
        }
    }

    pub fn init_policy(&self) -> InitPolicy {
        InitPolicy { weight_std_dev: self.weight_std_dev, hidden_bias: self.hidden_bias_init }
    }

    pub fn split_fractions(&self) -> SplitFractions {
        SplitFractions {
            train:      self.train_fraction,
            test:       self.test_fraction,
            validation: self.validation_fraction,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config:  TrainConfig,
    control: TrainingControl,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config, control: TrainingControl::new() }
    }

    /// Drive pause/resume of the run through `control`.
    pub fn with_control(mut self, control: TrainingControl) -> Self {
        self.control = control;
        self
    }

    pub fn execute(&self) -> Result<TrainingReport> {
        let mut cfg = self.config.clone();
        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };

        // ── Step 1: Load the dataset ──────────────────────────────────────────
        let raw = DatasetFileLoader::new(&cfg.dataset).load_all()?;
        let vector_len = raw.vector_len();
        cfg.num_classes = raw.num_classes;
        tracing::info!(
            "Dataset entropy: {:.4} bits",
            entropy(raw.examples.iter().map(Vec::as_slice))
        );

        // ── Step 2: Per-class train/test/validation split ─────────────────────
        let data = split_by_class(raw, cfg.split_fractions(), &mut rng)
            .context("Cannot split dataset")?;
        tracing::info!(
            "Split: {} train, {} validation, {} test",
            data.train.len(),
            data.validation.len(),
            data.test.len()
        );

        // ── Step 3: Fresh or resumed model ────────────────────────────────────
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir)?;
        let model = if cfg.resume && ckpt.has_model() {
            let model = ckpt.load_model()?;
            if model.visible_size() != vector_len {
                bail!(
                    "Saved model has {} visible units but the dataset vectors have {}",
                    model.visible_size(),
                    vector_len
                );
            }
            model
        } else {
            if cfg.resume {
                tracing::warn!("No saved model in '{}'; starting fresh", ckpt.dir().display());
            }
            let mut model = RbmModel::new(
                NeuronLayer::zeros(vector_len),
                NeuronLayer::zeros(cfg.hidden_units),
                cfg.init_policy(),
                &mut rng,
            )?;
            model.set_visible_biases(initial_visible_biases(data.train.iter()))?;
            model
        };

        // ── Step 4: Save config for classify/evaluate ─────────────────────────
        ckpt.save_config(&cfg)?;

        // ── Step 5: Run the engine on its worker thread ───────────────────────
        let mut engine = TrainingEngine::new(cfg.training_config())?
            .with_control(self.control.clone());
        engine.subscribe(MetricsLogger::new(ckpt.metrics_path())?);
        engine.subscribe(LogObserver);

        let (model, report) = engine.spawn(model, data)?.join()?;
        let report = report.context("Training aborted")?;

        // ── Step 6: Persist ───────────────────────────────────────────────────
        ckpt.save_model(&model)?;
        tracing::info!(
            "Finished after {} epochs ({:?}), {} updates",
            report.epochs_run,
            report.stop_reason,
            report.updates_applied
        );
        Ok(report)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// 2 classes × 5 examples of 2×2 images.
    fn write_dataset(dir: &std::path::Path) -> PathBuf {
        let mut text = String::from("2 2 2\n");
        for _ in 0..5 {
            text.push_str("[1, 1, 0, 0, 1, 0]\n");
        }
        for _ in 0..5 {
            text.push_str("[0, 0, 1, 1, 0, 1]\n");
        }
        let path = dir.join("toy.txt");
        fs::write(&path, text).unwrap();
        path
    }

    fn config(dir: &std::path::Path) -> TrainConfig {
        TrainConfig {
            dataset:              write_dataset(dir),
            checkpoint_dir:       dir.join("ckpt"),
            hidden_units:         4,
            learning_rate:        0.1,
            epochs:               3,
            error_check_interval: 1,
            termination_threshold: 1e9,
            seed:                 Some(1),
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_default_config_values() {
        let c = TrainConfig::default();
        assert_eq!(c.hidden_units, 400);
        assert_eq!(c.learning_rate, 0.001);
        assert_eq!(c.epochs, 1000);
        assert_eq!(c.error_check_interval, 50);
        assert_eq!(c.termination_threshold, 50.0);
        assert_eq!(c.split_fractions(), SplitFractions::default());
    }

    #[test]
    fn test_train_writes_model_config_and_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let report = TrainUseCase::new(cfg.clone()).execute().unwrap();

        // round(10 * 0.6 / 2) = 3 per class
        assert_eq!(report.updates_applied, 3 * 6);
        let ckpt = CheckpointManager::open(&cfg.checkpoint_dir);
        assert!(ckpt.has_model());
        assert_eq!(ckpt.load_config().unwrap().num_classes, 2);
        let csv = fs::read_to_string(ckpt.metrics_path()).unwrap();
        assert_eq!(csv.lines().count(), 1 + 3);
    }

    #[test]
    fn test_resume_continues_saved_model() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        TrainUseCase::new(cfg.clone()).execute().unwrap();
        let first = CheckpointManager::open(&cfg.checkpoint_dir).load_model().unwrap();

        let resumed = TrainConfig { resume: true, hidden_units: 99, ..cfg.clone() };
        TrainUseCase::new(resumed).execute().unwrap();
        let second = CheckpointManager::open(&cfg.checkpoint_dir).load_model().unwrap();

        assert_eq!(second.hidden_size(), first.hidden_size());
        assert_ne!(second.weights(), first.weights());
    }

    #[test]
    fn test_missing_dataset_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { dataset: dir.path().join("absent.txt"), ..config(dir.path()) };
        assert!(TrainUseCase::new(cfg).execute().is_err());
    }
}
