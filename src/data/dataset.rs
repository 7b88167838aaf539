use serde::{Deserialize, Serialize};

use crate::domain::error::{RbmError, RbmResult};
use crate::domain::neuron_layer::UnitState;

/// A binary example: image bits followed by the one-hot label suffix.
pub type Example = Vec<UnitState>;

/// Everything read from a dataset file, before splitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDataset {
    pub num_classes: usize,
    pub width:       usize,
    pub height:      usize,
    /// Grouped by class: equal-size contiguous blocks, class 0 first
    pub examples:    Vec<Example>,
}

impl RawDataset {
    /// Length every example must have: image pixels plus label suffix.
    pub fn vector_len(&self) -> usize {
        self.width * self.height + self.num_classes
    }
}

/// Examples grouped into `num_classes` equal, contiguous partitions.
///
/// Training walks the set by `(example_index_within_class, class_index)`
/// so consecutive examples cycle through the classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassPartitionedSet {
    num_classes: usize,
    per_class:   usize,
    examples:    Vec<Example>,
}

impl ClassPartitionedSet {
    pub fn new(examples: Vec<Example>, num_classes: usize) -> RbmResult<Self> {
        if num_classes == 0 {
            return Err(RbmError::InvalidArgument(
                "a dataset needs at least one class".to_string(),
            ));
        }
        if examples.len() % num_classes != 0 {
            return Err(RbmError::UnequalClassPartitions {
                examples: examples.len(),
                classes:  num_classes,
            });
        }
        if let Some(first) = examples.first() {
            if let Some(bad) = examples.iter().find(|e| e.len() != first.len()) {
                return Err(RbmError::DimensionMismatch {
                    expected: first.len(),
                    actual:   bad.len(),
                });
            }
        }
        let per_class = examples.len() / num_classes;
        Ok(Self { num_classes, per_class, examples })
    }

    /// An empty set (used when a split leaves no validation/test data).
    pub fn empty(num_classes: usize) -> Self {
        Self { num_classes: num_classes.max(1), per_class: 0, examples: Vec::new() }
    }

    /// The `example_index`-th example of class `class_index`.
    pub fn get(&self, example_index: usize, class_index: usize) -> Option<&[UnitState]> {
        if example_index >= self.per_class || class_index >= self.num_classes {
            return None;
        }
        self.examples
            .get(class_index * self.per_class + example_index)
            .map(Vec::as_slice)
    }

    /// Examples in round-robin class order:
    /// (0,0), (0,1), …, (0,k-1), (1,0), (1,1), …
    pub fn round_robin(&self) -> impl Iterator<Item = &[UnitState]> + '_ {
        (0..self.per_class).flat_map(move |i| {
            (0..self.num_classes)
                .map(move |c| self.examples[c * self.per_class + i].as_slice())
        })
    }

    /// Examples in storage (class-grouped) order.
    pub fn iter(&self) -> impl Iterator<Item = &[UnitState]> + '_ {
        self.examples.iter().map(Vec::as_slice)
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn per_class(&self) -> usize {
        self.per_class
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}

/// The three subsets a training run consumes.
#[derive(Debug, Clone)]
pub struct TrainingData {
    pub train:      ClassPartitionedSet,
    pub validation: ClassPartitionedSet,
    pub test:       ClassPartitionedSet,
    /// Width of the one-hot label suffix at the end of every example
    pub num_classes: usize,
}

impl TrainingData {
    /// Every example in every subset, for width checks.
    pub fn all_examples(&self) -> impl Iterator<Item = &[UnitState]> + '_ {
        self.train.iter().chain(self.validation.iter()).chain(self.test.iter())
    }
}
