// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores a trained RBM as a full-state snapshot.
//
// Snapshot bytes (bincode):
//   format_version: u32      ← checked before anything else
//   state:          RbmState ← dimensions, W, b, c, both layers
//
// Files in the checkpoint directory:
//   checkpoints/
//     rbm.bin                ← latest model snapshot
//     train_config.json      ← run parameters (num classes, …)
//     metrics.csv            ← one row per checkpoint
//
// A snapshot is written to a temporary file and renamed into
// place, so a failed save never leaves a truncated rbm.bin.
//
// Reference: Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::domain::error::{RbmError, RbmResult};
use crate::ml::rbm::{RbmModel, RbmState};

/// Bump when the layout of RbmState changes.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

pub const MODEL_FILE:   &str = "rbm.bin";
pub const CONFIG_FILE:  &str = "train_config.json";
pub const METRICS_FILE: &str = "metrics.csv";

#[derive(Serialize)]
struct SnapshotRef<'a> {
    format_version: u32,
    state:          &'a RbmState,
}

#[derive(Deserialize)]
struct Snapshot {
    format_version: u32,
    state:          RbmState,
}

#[derive(Deserialize)]
struct SnapshotHeader {
    format_version: u32,
}

// ─── Byte-level persistence ───────────────────────────────────────────────────

/// Serialise the complete model state.
pub fn encode_snapshot(model: &RbmModel) -> RbmResult<Vec<u8>> {
    let state = model.state();
    bincode::serialize(&SnapshotRef { format_version: SNAPSHOT_FORMAT_VERSION, state: &state })
        .map_err(|e| RbmError::Persistence(e.to_string()))
}

/// Rebuild a model from `encode_snapshot` output. The version is read
/// first so an old or foreign snapshot fails with IncompatibleSnapshot
/// rather than a decode error.
pub fn decode_snapshot(bytes: &[u8]) -> RbmResult<RbmModel> {
    let header: SnapshotHeader =
        bincode::deserialize(bytes).map_err(|e| RbmError::Persistence(e.to_string()))?;
    if header.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(RbmError::IncompatibleSnapshot {
            found:    header.format_version,
            expected: SNAPSHOT_FORMAT_VERSION,
        });
    }
    let snapshot: Snapshot =
        bincode::deserialize(bytes).map_err(|e| RbmError::Persistence(e.to_string()))?;
    RbmModel::from_state(snapshot.state)
        .map_err(|e| RbmError::Persistence(format!("inconsistent snapshot: {e}")))
}

/// Write a snapshot to `path` via a sibling temporary file.
pub fn write_snapshot(model: &RbmModel, path: &Path) -> RbmResult<()> {
    let bytes = encode_snapshot(model)?;
    let tmp = path.with_extension("bin.tmp");
    fs::write(&tmp, &bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn read_snapshot(path: &Path) -> RbmResult<RbmModel> {
    decode_snapshot(&fs::read(path)?)
}

// ─── Directory manager ────────────────────────────────────────────────────────

/// Manages the files of one checkpoint directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Open an existing directory without creating it.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.dir.join(METRICS_FILE)
    }

    pub fn has_model(&self) -> bool {
        self.model_path().is_file()
    }

    pub fn save_model(&self, model: &RbmModel) -> Result<()> {
        let path = self.model_path();
        write_snapshot(model, &path)
            .with_context(|| format!("Failed to save model to '{}'", path.display()))?;
        tracing::info!(
            "Saved {}×{} model to '{}'",
            model.visible_size(),
            model.hidden_size(),
            path.display()
        );
        Ok(())
    }

    pub fn load_model(&self) -> Result<RbmModel> {
        let path = self.model_path();
        let model = read_snapshot(&path).with_context(|| {
            format!(
                "Cannot load model '{}'. Have you trained the model first?",
                path.display()
            )
        })?;
        tracing::info!(
            "Loaded {}×{} model from '{}'",
            model.visible_size(),
            model.hidden_size(),
            path.display()
        );
        Ok(model)
    }

    /// Written before training starts so classify/evaluate can
    /// recover the number of label bits.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. \
                 Make sure you have run 'train' first.",
                path.display()
            )
        })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config in '{}'", path.display()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::neuron_layer::NeuronLayer;
    use crate::ml::rbm::InitPolicy;
    use rand::{rngs::StdRng, SeedableRng};

    fn model() -> RbmModel {
        let mut rng = StdRng::seed_from_u64(11);
        let mut m = RbmModel::new(NeuronLayer::zeros(6), NeuronLayer::zeros(3), InitPolicy::default(), &mut rng)
            .unwrap();
        m.set_visible(&[1, 0, 1, 1, 0, 0]).unwrap();
        m.sample_hidden_given_visible(&mut rng);
        m.set_visible_biases(vec![0.5, -0.25, 7.0, -7.0, 0.0, 1e-9]).unwrap();
        m
    }

    #[test]
    fn test_snapshot_round_trip_is_exact() {
        let m = model();
        let restored = decode_snapshot(&encode_snapshot(&m).unwrap()).unwrap();
        assert_eq!(restored.state(), m.state());
        for (a, b) in restored.weights().iter().zip(m.weights()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_garbage_bytes_fail() {
        let err = decode_snapshot(&[1, 2]).unwrap_err();
        assert!(matches!(err, RbmError::Persistence(_)));
    }

    #[test]
    fn test_truncated_snapshot_fails() {
        let bytes = encode_snapshot(&model()).unwrap();
        let err = decode_snapshot(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, RbmError::Persistence(_)));
    }

    #[test]
    fn test_huge_dimensions_rejected_without_panic() {
        let state = RbmState {
            visible_size:   1 << 33,
            hidden_size:    1 << 33,
            weights:        Vec::new(),
            hidden_biases:  Vec::new(),
            visible_biases: Vec::new(),
            visible_states: Vec::new(),
            hidden_states:  Vec::new(),
        };
        let bytes = bincode::serialize(&SnapshotRef {
            format_version: SNAPSHOT_FORMAT_VERSION,
            state:          &state,
        })
        .unwrap();
        let err = decode_snapshot(&bytes).unwrap_err();
        assert!(matches!(err, RbmError::Persistence(_)));
    }

    #[test]
    fn test_inconsistent_lengths_rejected() {
        let mut state = model().state();
        state.hidden_biases.pop();
        let bytes = bincode::serialize(&SnapshotRef {
            format_version: SNAPSHOT_FORMAT_VERSION,
            state:          &state,
        })
        .unwrap();
        assert!(matches!(decode_snapshot(&bytes), Err(RbmError::Persistence(_))));
    }

    #[test]
    fn test_wrong_version_rejected() {
        let mut bytes = encode_snapshot(&model()).unwrap();
        bytes[..4].copy_from_slice(&99u32.to_le_bytes());
        let err = decode_snapshot(&bytes).unwrap_err();
        assert!(matches!(err, RbmError::IncompatibleSnapshot { found: 99, expected: 1 }));
    }

    #[test]
    fn test_manager_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(dir.path().join("ckpt")).unwrap();
        assert!(!mgr.has_model());

        let m = model();
        mgr.save_model(&m).unwrap();
        assert!(mgr.has_model());
        assert_eq!(mgr.load_model().unwrap().state(), m.state());
    }

    #[test]
    fn test_missing_model_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::open(dir.path());
        assert!(mgr.load_model().is_err());
    }

    #[test]
    fn test_failed_load_keeps_existing_model() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(dir.path()).unwrap();
        fs::write(mgr.model_path(), b"not a model").unwrap();

        let m = model();
        let before = m.state();
        assert!(mgr.load_model().is_err());
        assert_eq!(m.state(), before);
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(dir.path()).unwrap();
        let cfg = TrainConfig { hidden_units: 17, seed: Some(3), ..TrainConfig::default() };
        mgr.save_config(&cfg).unwrap();
        assert_eq!(mgr.load_config().unwrap(), cfg);
    }
}
