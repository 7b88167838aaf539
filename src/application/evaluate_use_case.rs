// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a saved model against a labelled dataset file, and
// summarises a saved model's parameters for `inspect`.
//
//   Step 1: Load model + config    (Layer 6 - infra)
//   Step 2: Load the dataset       (Layer 4 - data)
//   Step 3: Misclassification and average free energy (Layer 5 - ml)

use anyhow::{bail, Result};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::data::{dataset::ClassPartitionedSet, loader::DatasetFileLoader};
use crate::domain::label::LabelCodec;
use crate::domain::traits::ExampleSource;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{inferencer, rbm::RbmModel};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub examples:            usize,
    pub misclassified:       usize,
    pub average_free_energy: f64,
}

impl Evaluation {
    pub fn accuracy(&self) -> f64 {
        if self.examples == 0 {
            return 0.0;
        }
        1.0 - self.misclassified as f64 / self.examples as f64
    }
}

pub struct EvaluateUseCase {
    checkpoint_dir: PathBuf,
    seed:           Option<u64>,
}

impl EvaluateUseCase {
    pub fn new(checkpoint_dir: impl Into<PathBuf>, seed: Option<u64>) -> Self {
        Self { checkpoint_dir: checkpoint_dir.into(), seed }
    }

    pub fn execute(&self, dataset: &Path) -> Result<Evaluation> {
        let ckpt      = CheckpointManager::open(&self.checkpoint_dir);
        let config    = ckpt.load_config()?;
        let mut model = ckpt.load_model()?;

        let raw = DatasetFileLoader::new(dataset).load_all()?;
        if raw.num_classes != config.num_classes {
            bail!(
                "Dataset has {} classes but the model was trained on {}",
                raw.num_classes,
                config.num_classes
            );
        }
        let set = ClassPartitionedSet::new(raw.examples, raw.num_classes)?;

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };
        evaluate(&mut model, &LabelCodec::new(config.num_classes), &set, &mut rng)
    }
}

pub fn evaluate(
    model: &mut RbmModel,
    codec: &LabelCodec,
    set:   &ClassPartitionedSet,
    rng:   &mut StdRng,
) -> Result<Evaluation> {
    let misclassified       = inferencer::count_misclassified(model, codec, set, rng)?;
    let average_free_energy = inferencer::average_free_energy(model, set, rng)?;
    tracing::info!(
        "Evaluated {} examples: {} misclassified, average free energy {:.4}",
        set.len(),
        misclassified,
        average_free_energy
    );
    Ok(Evaluation { examples: set.len(), misclassified, average_free_energy })
}

// ─── Model summary ────────────────────────────────────────────────────────────

/// Min / mean / max of one parameter group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Range {
    pub min:  f64,
    pub mean: f64,
    pub max:  f64,
}

impl Range {
    fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let min  = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max  = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(Self { min, mean, max })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub visible_units:  usize,
    pub hidden_units:   usize,
    pub weights:        Option<Range>,
    pub weight_std_dev: f64,
    pub visible_biases: Option<Range>,
    pub hidden_biases:  Option<Range>,
}

impl ModelSummary {
    pub fn of(model: &RbmModel) -> Self {
        let w = model.weights();
        let weight_std_dev = match Range::of(w) {
            Some(r) => (w.iter().map(|x| (x - r.mean).powi(2)).sum::<f64>() / w.len() as f64).sqrt(),
            None    => 0.0,
        };
        Self {
            visible_units:  model.visible_size(),
            hidden_units:   model.hidden_size(),
            weights:        Range::of(w),
            weight_std_dev,
            visible_biases: Range::of(model.visible_biases()),
            hidden_biases:  Range::of(model.hidden_biases()),
        }
    }

    pub fn load(checkpoint_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::of(&CheckpointManager::open(checkpoint_dir).load_model()?))
    }
}
