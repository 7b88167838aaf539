// ============================================================
// Layer 2 — ClassifyUseCase
// ============================================================
// Loads a trained model once and classifies input vectors:
//
//   Step 1: Load model + config    (Layer 6 - infra)
//   Step 2: Read the input vector  (Layer 4 - data)
//   Step 3: Reconstruct + decode   (Layer 5 - ml)

use anyhow::{Context, Result};
use rand::{rngs::StdRng, SeedableRng};
use std::path::{Path, PathBuf};

use crate::data::loader::read_vector_file;
use crate::domain::label::LabelCodec;
use crate::domain::neuron_layer::UnitState;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::{self, Classification};
use crate::ml::rbm::RbmModel;

pub struct ClassifyUseCase {
    model: RbmModel,
    codec: LabelCodec,
    rng:   StdRng,
}

impl ClassifyUseCase {
    pub fn new(checkpoint_dir: impl Into<PathBuf>, seed: Option<u64>) -> Result<Self> {
        let ckpt   = CheckpointManager::open(checkpoint_dir);
        let config = ckpt.load_config()?;
        let model  = ckpt.load_model()?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };
        Ok(Self::from_parts(model, LabelCodec::new(config.num_classes), rng))
    }

    pub fn from_parts(model: RbmModel, codec: LabelCodec, rng: StdRng) -> Self {
        Self { model, codec, rng }
    }

    pub fn classify(&mut self, input: &[UnitState]) -> Result<Classification> {
        let c = inferencer::classify(&mut self.model, &self.codec, input, &mut self.rng)
            .context("Cannot classify input")?;
        tracing::debug!("Active label bits: {:?}", c.classes);
        Ok(c)
    }

    pub fn classify_file(&mut self, path: &Path) -> Result<Classification> {
        let input = read_vector_file(path)?;
        self.classify(&input)
            .with_context(|| format!("Input '{}' does not fit the model", path.display()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::rbm::RbmState;

    fn use_case() -> ClassifyUseCase {
        // visible biases force label bit 0 (class A) on
        let model = RbmModel::from_state(RbmState {
            visible_size:   5,
            hidden_size:    1,
            weights:        vec![0.0; 5],
            hidden_biases:  vec![0.0],
            visible_biases: vec![0.0, 0.0, 0.0, 40.0, -40.0],
            visible_states: vec![0; 5],
            hidden_states:  vec![0],
        })
        .unwrap();
        ClassifyUseCase::from_parts(model, LabelCodec::new(2), StdRng::seed_from_u64(4))
    }

    #[test]
    fn test_classify_vector() {
        let mut uc = use_case();
        let c = uc.classify(&[1, 0, 1]).unwrap();
        assert_eq!(c.names, "A");
    }

    #[test]
    fn test_classify_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        std::fs::write(&path, "[1, 0, 1, 0, 0]\n").unwrap();
        let c = use_case().classify_file(&path).unwrap();
        assert_eq!(c.classes, vec![0]);
    }

    #[test]
    fn test_wrong_width_rejected() {
        let mut uc = use_case();
        assert!(uc.classify(&[1, 0, 1, 1, 1, 1, 1]).is_err());
    }
}
