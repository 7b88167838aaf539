// ============================================================
// Layer 4 — Train/Test/Validation Splitter
// ============================================================
// Randomly divides a class-grouped dataset into three subsets:
//   - Training set:   drives the CD-1 weight updates
//   - Test set:       scored once when training finishes
//   - Validation set: free energy compared against the training
//                     set at every checkpoint (early stopping)
//
// Every class contributes the same number of examples to each
// subset, so all three stay grouped into equal class partitions
// — the training engine's round-robin walk relies on that.
//
// Per-class subset size = round(total * fraction / num_classes)
// Default ratio: 60% training, 20% test, 20% validation.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom on each
// class block, driven by a caller-supplied (seedable) RNG.
//
// Reference: Rust Book §8 (Vectors)
//            rand crate documentation

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::dataset::{ClassPartitionedSet, Example, RawDataset, TrainingData};
use crate::domain::error::{RbmError, RbmResult};

/// Fractions of the dataset assigned to each subset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitFractions {
    pub train:      f64,
    pub test:       f64,
    pub validation: f64,
}

impl Default for SplitFractions {
    fn default() -> Self {
        Self { train: 0.6, test: 0.2, validation: 0.2 }
    }
}

impl SplitFractions {
    fn validate(&self) -> RbmResult<()> {
        let all = [self.train, self.test, self.validation];
        if all.iter().any(|f| !(0.0..=1.0).contains(f)) || all.iter().sum::<f64>() > 1.0 + 1e-9 {
            return Err(RbmError::InvalidArgument(format!(
                "split fractions must lie in [0, 1] and sum to at most 1, got {self:?}"
            )));
        }
        Ok(())
    }
}

/// Shuffle each class block and split it into (train, test, validation).
pub fn split_by_class<R: Rng + ?Sized>(
    raw:       RawDataset,
    fractions: SplitFractions,
    rng:       &mut R,
) -> RbmResult<TrainingData> {
    fractions.validate()?;
    let num_classes = raw.num_classes;
    if num_classes == 0 {
        return Err(RbmError::InvalidArgument("a dataset needs at least one class".to_string()));
    }
    let total = raw.examples.len();
    if total % num_classes != 0 {
        return Err(RbmError::UnequalClassPartitions { examples: total, classes: num_classes });
    }
    let per_class = total / num_classes;

    // Round the per-class sizes, then clamp so they never exceed the class size
    let share = |f: f64| ((total as f64) * f / num_classes as f64).round() as usize;
    let train_n = share(fractions.train).min(per_class);
    let test_n  = share(fractions.test).min(per_class - train_n);
    let val_n   = share(fractions.validation).min(per_class - train_n - test_n);

    let mut train      = Vec::with_capacity(train_n * num_classes);
    let mut test       = Vec::with_capacity(test_n * num_classes);
    let mut validation = Vec::with_capacity(val_n * num_classes);

    let mut examples = raw.examples.into_iter();
    for _ in 0..num_classes {
        let mut block: Vec<Example> = examples.by_ref().take(per_class).collect();
        block.shuffle(rng);

        let mut block = block.into_iter();
        train.extend(block.by_ref().take(train_n));
        test.extend(block.by_ref().take(test_n));
        validation.extend(block.by_ref().take(val_n));
    }

    tracing::debug!(
        "Dataset split per class: {} training, {} test, {} validation ({} classes)",
        train_n,
        test_n,
        val_n,
        num_classes,
    );

    Ok(TrainingData {
        train:      ClassPartitionedSet::new(train, num_classes)?,
        validation: ClassPartitionedSet::new(validation, num_classes)?,
        test:       ClassPartitionedSet::new(test, num_classes)?,
        num_classes,
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    /// 2 classes x `per_class` examples; element 0 holds the class id.
    fn dataset(per_class: usize) -> RawDataset {
        let examples = (0..2u8)
            .flat_map(|c| (0..per_class).map(move |i| vec![c, (i % 2) as u8]))
            .collect();
        RawDataset { num_classes: 2, width: 1, height: 1, examples }
    }

    #[test]
    fn test_correct_split_sizes() {
        let mut rng = StdRng::seed_from_u64(7);
        let data = split_by_class(dataset(50), SplitFractions::default(), &mut rng).unwrap();
        assert_eq!(data.train.len(), 60);
        assert_eq!(data.test.len(), 20);
        assert_eq!(data.validation.len(), 20);
    }

    #[test]
    fn test_subsets_stay_grouped_by_class() {
        let mut rng = StdRng::seed_from_u64(7);
        let data = split_by_class(dataset(10), SplitFractions::default(), &mut rng).unwrap();
        for set in [&data.train, &data.test, &data.validation] {
            for c in 0..2 {
                for i in 0..set.per_class() {
                    assert_eq!(set.get(i, c).unwrap()[0], c as u8);
                }
            }
        }
    }

    #[test]
    fn test_all_items_preserved_with_full_fractions() {
        let mut rng = StdRng::seed_from_u64(1);
        let fr = SplitFractions { train: 0.5, test: 0.25, validation: 0.25 };
        let data = split_by_class(dataset(8), fr, &mut rng).unwrap();
        assert_eq!(data.train.len() + data.test.len() + data.validation.len(), 16);
    }

    #[test]
    fn test_full_training_split() {
        let mut rng = StdRng::seed_from_u64(1);
        let fr = SplitFractions { train: 1.0, test: 0.0, validation: 0.0 };
        let data = split_by_class(dataset(5), fr, &mut rng).unwrap();
        assert_eq!(data.train.len(), 10);
        assert!(data.validation.is_empty());
        assert!(data.test.is_empty());
    }

    #[test]
    fn test_invalid_fractions() {
        let mut rng = StdRng::seed_from_u64(1);
        let fr = SplitFractions { train: 0.8, test: 0.2, validation: 0.2 };
        assert!(split_by_class(dataset(5), fr, &mut rng).is_err());
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = split_by_class(dataset(20), SplitFractions::default(), &mut StdRng::seed_from_u64(3)).unwrap();
        let b = split_by_class(dataset(20), SplitFractions::default(), &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a.train, b.train);
    }
}
