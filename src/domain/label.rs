// ============================================================
// Layer 3 — One-Hot Label Codec
// ============================================================
// Labelled examples are image vectors followed by a fixed-width
// one-hot suffix, one bit per class:
//
//   [ pixel_0 … pixel_{n-1} | class_0 … class_{k-1} ]
//
// Class i is named by the letter 'A' + i.
//
// Reference: Rust Book §8 (Vectors and Slices)

use crate::domain::error::{RbmError, RbmResult};
use crate::domain::neuron_layer::UnitState;

/// First letter used to name classes.
const ENCODING_BEGIN: u8 = b'A';

/// Width and position of the label suffix inside a visible vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelCodec {
    num_classes: usize,
}

impl LabelCodec {
    pub fn new(num_classes: usize) -> Self {
        Self { num_classes }
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Append a one-hot encoding of `class_index`.
    pub fn encode(&self, image: &[UnitState], class_index: usize) -> RbmResult<Vec<UnitState>> {
        if class_index >= self.num_classes {
            return Err(RbmError::InvalidArgument(format!(
                "class index {class_index} out of range for {} classes",
                self.num_classes
            )));
        }
        let mut out = self.encode_empty(image);
        out[image.len() + class_index] = 1;
        Ok(out)
    }

    /// Append an all-zero label suffix (the input form used for classification).
    pub fn encode_empty(&self, image: &[UnitState]) -> Vec<UnitState> {
        let mut out = Vec::with_capacity(image.len() + self.num_classes);
        out.extend_from_slice(image);
        out.resize(image.len() + self.num_classes, 0);
        out
    }

    /// The label suffix of the vector.
    pub fn segment<'a>(&self, encoded: &'a [UnitState]) -> &'a [UnitState] {
        &encoded[self.image_len(encoded)..]
    }

    /// Copy of the vector with every label bit cleared.
    pub fn cleared_copy(&self, encoded: &[UnitState]) -> Vec<UnitState> {
        let mut out = encoded.to_vec();
        let start = self.image_len(encoded);
        out[start..].iter_mut().for_each(|b| *b = 0);
        out
    }

    /// Indices of every active label bit.
    pub fn active_classes(&self, encoded: &[UnitState]) -> Vec<usize> {
        self.segment(encoded)
            .iter()
            .enumerate()
            .filter(|(_, &bit)| bit == 1)
            .map(|(i, _)| i)
            .collect()
    }

    /// Letters of every active class, space separated. Empty when no
    /// label bit is set.
    pub fn class_names(&self, encoded: &[UnitState]) -> String {
        self.active_classes(encoded)
            .into_iter()
            .map(class_name)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// True when both vectors carry exactly the same label bits.
    pub fn labels_match(&self, a: &[UnitState], b: &[UnitState]) -> bool {
        self.segment(a) == self.segment(b)
    }

    fn image_len(&self, encoded: &[UnitState]) -> usize {
        encoded.len().saturating_sub(self.num_classes)
    }
}

/// Letter naming the class at `index` ('A', 'B', …).
pub fn class_name(index: usize) -> String {
    match u8::try_from(index).ok().and_then(|i| ENCODING_BEGIN.checked_add(i)) {
        Some(c) if c.is_ascii_uppercase() => (c as char).to_string(),
        _ => format!("#{index}"),
    }
}
