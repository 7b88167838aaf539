// ============================================================
// Layer 3 — NeuronLayer Domain Type
// ============================================================
// One visible or hidden layer of a binary RBM: a fixed-length
// vector of unit states, each 0 or 1.
//
// The length is decided at construction and never changes.
// The layer itself does not check that written values are
// binary; the model only ever writes 0 or 1.
//
// Reference: Rust Book §8 (Vectors)

use serde::{Deserialize, Serialize};

use crate::domain::error::{RbmError, RbmResult};

/// State of a single binary unit.
pub type UnitState = u8;

/// A fixed-size, mutable vector of binary unit states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeuronLayer {
    values: Vec<UnitState>,
}

impl NeuronLayer {
    /// Create a layer holding a copy of `values`.
    pub fn new(values: &[UnitState]) -> Self {
        Self { values: values.to_vec() }
    }

    /// Create a layer of `size` inactive units.
    pub fn zeros(size: usize) -> Self {
        Self { values: vec![0; size] }
    }

    /// State of the unit at `index`, or None when out of range.
    pub fn get(&self, index: usize) -> Option<UnitState> {
        self.values.get(index).copied()
    }

    /// Overwrite the state of the unit at `index`.
    pub fn set(&mut self, index: usize, value: UnitState) -> RbmResult<()> {
        let size = self.values.len();
        let slot = self.values.get_mut(index).ok_or_else(|| {
            RbmError::InvalidArgument(format!(
                "unit index {index} out of range for a layer of {size} units"
            ))
        })?;
        *slot = value;
        Ok(())
    }

    /// Copy of the current states, in order.
    pub fn as_vector(&self) -> Vec<UnitState> {
        self.values.clone()
    }

    /// Borrow the current states without copying.
    pub fn as_slice(&self) -> &[UnitState] {
        &self.values
    }

    /// Replace every state with a copy of `values`.
    /// Fails if the length differs from the layer's size.
    pub fn replace_all(&mut self, values: &[UnitState]) -> RbmResult<()> {
        if values.len() != self.values.len() {
            return Err(RbmError::UnsupportedOperation {
                expected: self.values.len(),
                actual:   values.len(),
            });
        }
        self.values.copy_from_slice(values);
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Crate-internal fast path used by the sampling loops. The index
    /// is still bounds-checked by the slice.
    pub(crate) fn states_mut(&mut self) -> &mut [UnitState] {
        &mut self.values
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_matches_construction() {
        let l = NeuronLayer::new(&[0, 1, 1]);
        assert_eq!(l.size(), 3);
        assert_eq!(NeuronLayer::zeros(7).size(), 7);
    }

    #[test]
    fn test_get_first_and_last() {
        let l = NeuronLayer::new(&[0, 1, 1]);
        assert_eq!(l.get(0), Some(0));
        assert_eq!(l.get(2), Some(1));
    }

    #[test]
    fn test_get_out_of_range() {
        let l = NeuronLayer::new(&[0, 1]);
        assert_eq!(l.get(2), None);
    }

    #[test]
    fn test_set() {
        let mut l = NeuronLayer::zeros(3);
        l.set(1, 1).unwrap();
        assert_eq!(l.as_vector(), vec![0, 1, 0]);
        assert!(l.set(3, 1).is_err());
    }

    #[test]
    fn test_constructor_makes_a_copy() {
        let mut source = vec![1, 0, 1];
        let l = NeuronLayer::new(&source);
        source[0] = 0;
        assert_eq!(l.get(0), Some(1));
    }

    #[test]
    fn test_as_vector_is_a_copy() {
        let l = NeuronLayer::new(&[1, 0]);
        let mut v = l.as_vector();
        v[0] = 0;
        assert_eq!(l.as_vector(), vec![1, 0]);
    }

    #[test]
    fn test_replace_all_same_length() {
        let mut l = NeuronLayer::zeros(4);
        l.replace_all(&[1, 0, 1, 1]).unwrap();
        assert_eq!(l.as_vector(), vec![1, 0, 1, 1]);
        assert_eq!(l.size(), 4);
    }

    #[test]
    fn test_replace_all_rejects_other_lengths() {
        let mut l = NeuronLayer::zeros(4);
        for len in [0, 3, 5] {
            let err = l.replace_all(&vec![1; len]).unwrap_err();
            assert!(matches!(
                err,
                RbmError::UnsupportedOperation { expected: 4, actual } if actual == len
            ));
        }
        // contents untouched after a rejected replace
        assert_eq!(l.as_vector(), vec![0, 0, 0, 0]);
    }
}
