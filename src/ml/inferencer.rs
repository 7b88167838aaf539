// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Deterministic-as-possible use of a trained model:
//
//   reconstruct   clamp visible → sample hidden once →
//                 settle visible once (mean-field) → read visible
//
//   classify      reconstruct an input whose label suffix is
//                 zero-filled, then read the label bits back
//
// plus the two set-level diagnostics the training engine
// reports at every checkpoint (average free energy and
// misclassification count).

use rand::Rng;

use crate::data::dataset::ClassPartitionedSet;
use crate::domain::error::RbmResult;
use crate::domain::label::LabelCodec;
use crate::domain::neuron_layer::UnitState;
use crate::ml::rbm::RbmModel;

/// Outcome of classifying one input vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Full reconstructed visible vector (image + label suffix)
    pub reconstruction: Vec<UnitState>,
    /// Indices of every active label bit
    pub classes: Vec<usize>,
    /// Letters of the active classes, empty when none fired
    pub names: String,
}

impl Classification {
    pub fn is_decided(&self) -> bool {
        !self.classes.is_empty()
    }
}

/// Reconstruct `input` through one hidden sample and one mean-field
/// visible update. Rejects inputs whose width differs from the
/// visible layer before touching the model.
pub fn reconstruct<R: Rng + ?Sized>(
    model: &mut RbmModel,
    input: &[UnitState],
    rng:   &mut R,
) -> RbmResult<Vec<UnitState>> {
    model.set_visible(input)?;
    model.sample_hidden_given_visible(rng);
    model.settle_visible_given_hidden();
    Ok(model.visible().as_vector())
}

/// Classify an input. `input` may carry a label suffix (it is
/// cleared first) or be the bare image (a zero suffix is appended).
pub fn classify<R: Rng + ?Sized>(
    model: &mut RbmModel,
    codec: &LabelCodec,
    input: &[UnitState],
    rng:   &mut R,
) -> RbmResult<Classification> {
    let clamped = if input.len() + codec.num_classes() == model.visible_size() {
        codec.encode_empty(input)
    } else {
        codec.cleared_copy(input)
    };
    let reconstruction = reconstruct(model, &clamped, rng)?;
    let classes = codec.active_classes(&reconstruction);
    let names   = codec.class_names(&reconstruction);
    Ok(Classification { reconstruction, classes, names })
}

/// Mean free energy over a set: clamp each example, sample the
/// hidden layer once, read F(v). NaN for an empty set.
pub fn average_free_energy<R: Rng + ?Sized>(
    model: &mut RbmModel,
    set:   &ClassPartitionedSet,
    rng:   &mut R,
) -> RbmResult<f64> {
    if set.is_empty() {
        return Ok(f64::NAN);
    }
    let mut total = 0.0;
    for example in set.iter() {
        model.set_visible(example)?;
        model.sample_hidden_given_visible(rng);
        total += model.free_energy();
    }
    Ok(total / set.len() as f64)
}

/// Number of examples whose reconstructed label suffix differs from
/// the true one in any bit. The label is zero-filled before
/// reconstruction so the model has to supply it.
pub fn count_misclassified<R: Rng + ?Sized>(
    model: &mut RbmModel,
    codec: &LabelCodec,
    set:   &ClassPartitionedSet,
    rng:   &mut R,
) -> RbmResult<usize> {
    let mut wrong = 0;
    for example in set.iter() {
        let reconstruction = reconstruct(model, &codec.cleared_copy(example), rng)?;
        if !codec.labels_match(&reconstruction, example) {
            wrong += 1;
        }
    }
    Ok(wrong)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::RbmError;
    use crate::ml::rbm::RbmState;
    use rand::{rngs::StdRng, SeedableRng};

    /// 2 image bits + 2 label bits. Visible biases pin the image bits
    /// off and label bit 1 on, so every reconstruction reads class B.
    fn biased_model() -> RbmModel {
        RbmModel::from_state(RbmState {
            visible_size:   4,
            hidden_size:    2,
            weights:        vec![0.0; 8],
            hidden_biases:  vec![0.0; 2],
            visible_biases: vec![-50.0, -50.0, -50.0, 50.0],
            visible_states: vec![0; 4],
            hidden_states:  vec![0; 2],
        })
        .unwrap()
    }

    #[test]
    fn test_reconstruct_rejects_wrong_width() {
        let mut m = biased_model();
        let mut rng = StdRng::seed_from_u64(1);
        let err = reconstruct(&mut m, &[1, 0, 1], &mut rng).unwrap_err();
        assert!(matches!(err, RbmError::DimensionMismatch { expected: 4, actual: 3 }));
    }

    #[test]
    fn test_classify_bare_image() {
        let mut m = biased_model();
        let mut rng = StdRng::seed_from_u64(1);
        let codec = LabelCodec::new(2);
        let c = classify(&mut m, &codec, &[1, 1], &mut rng).unwrap();
        assert_eq!(c.reconstruction, vec![0, 0, 0, 1]);
        assert_eq!(c.classes, vec![1]);
        assert_eq!(c.names, "B");
        assert!(c.is_decided());
    }

    #[test]
    fn test_classify_clears_given_label() {
        let mut m = biased_model();
        let mut rng = StdRng::seed_from_u64(1);
        let codec = LabelCodec::new(2);
        let c = classify(&mut m, &codec, &[1, 1, 1, 0], &mut rng).unwrap();
        assert_eq!(c.classes, vec![1]);
    }

    #[test]
    fn test_misclassification_count() {
        let mut m = biased_model();
        let mut rng = StdRng::seed_from_u64(1);
        let codec = LabelCodec::new(2);
        // one example of class A, one of class B
        let set = ClassPartitionedSet::new(vec![vec![1, 0, 1, 0], vec![0, 1, 0, 1]], 2).unwrap();
        assert_eq!(count_misclassified(&mut m, &codec, &set, &mut rng).unwrap(), 1);
    }

    #[test]
    fn test_average_free_energy_of_empty_set_is_nan() {
        let mut m = biased_model();
        let mut rng = StdRng::seed_from_u64(1);
        let set = ClassPartitionedSet::empty(2);
        assert!(average_free_energy(&mut m, &set, &mut rng).unwrap().is_nan());
    }

    #[test]
    fn test_average_free_energy_is_mean() {
        let mut m = biased_model();
        let mut rng = StdRng::seed_from_u64(1);
        let a = vec![0, 0, 0, 1];
        let b = vec![0, 0, 1, 0];
        m.set_visible(&a).unwrap();
        let fa = m.free_energy();
        m.set_visible(&b).unwrap();
        let fb = m.free_energy();
        let set = ClassPartitionedSet::new(vec![a, b], 1).unwrap();
        let avg = average_free_energy(&mut m, &set, &mut rng).unwrap();
        assert!((avg - (fa + fb) / 2.0).abs() < 1e-9);
    }
}
