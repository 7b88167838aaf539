// ============================================================
// Layer 5 — Binary Restricted Boltzmann Machine
// ============================================================
// Two layers of binary units, fully connected between layers
// and unconnected within a layer.
//
//   energy of hidden j  = Σ_i v_i·W[i][j] + c_j
//   energy of visible i = Σ_j h_j·W[i][j] + b_i
//   activation          = sigmoid(energy) = 1 / (1 + e^−energy)
//
// One CD-1 step, as driven by the training engine:
//
//   rbm.record_original_input(x)?;
//   rbm.set_visible(x)?;
//   let h0 = rbm.sample_hidden_given_visible(rng);
//   rbm.record_initial_hidden_probabilities(h0)?;
//   let vn = rbm.settle_visible_given_hidden();
//   rbm.record_final_visible_probabilities(vn)?;
//   let hn = rbm.sample_hidden_given_visible(rng);
//   rbm.record_final_hidden_probabilities(hn)?;
//   rbm.apply_weight_update(lr)?;
//   rbm.apply_bias_update(lr)?;
//
// Sampling never records anything on its own: a caller may run
// extra Gibbs steps between recording h(0) and h(n) (CD-k).
//
// Hidden units fire when `random < p`, visible units when
// `random <= p`. The asymmetry is kept as-is.
//
// W is stored row-major: W[i][j] lives at i * hidden_size + j.
//
// Reference: Hinton (2010) A Practical Guide to Training RBMs

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::domain::error::{RbmError, RbmResult};
use crate::domain::neuron_layer::{NeuronLayer, UnitState};

/// Hidden bias value of the `Negative` init policy; discourages
/// states with every hidden unit on.
pub const NEGATIVE_HIDDEN_BIAS: f64 = -1.0;

/// Starting value of every hidden bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HiddenBiasInit {
    #[default]
    Negative,
    Zero,
}

impl HiddenBiasInit {
    pub fn value(self) -> f64 {
        match self {
            HiddenBiasInit::Negative => NEGATIVE_HIDDEN_BIAS,
            HiddenBiasInit::Zero     => 0.0,
        }
    }
}

/// How a fresh model's parameters are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitPolicy {
    /// Scale of the zero-mean Gaussian the weights are drawn from
    pub weight_std_dev: f64,
    pub hidden_bias:    HiddenBiasInit,
}

impl Default for InitPolicy {
    fn default() -> Self {
        Self { weight_std_dev: 0.01, hidden_bias: HiddenBiasInit::Negative }
    }
}

/// Buffers of one Gibbs step, consumed by the parameter updates.
#[derive(Debug, Clone, Default)]
struct GibbsRecord {
    original:       Option<Vec<UnitState>>, // v(0)
    initial_hidden: Option<Vec<f64>>,       // h(0)
    final_hidden:   Option<Vec<f64>>,       // h(n)
    final_visible:  Option<Vec<f64>>,       // v(n)
}

impl GibbsRecord {
    /// Borrow all four buffers, or fail naming the update that needed them.
    fn buffers(&self, update: &'static str) -> RbmResult<(&[UnitState], &[f64], &[f64], &[f64])> {
        match self {
            GibbsRecord {
                original:       Some(v0),
                initial_hidden: Some(h0),
                final_hidden:   Some(hn),
                final_visible:  Some(vn),
            } => Ok((v0, h0, hn, vn)),
            _ => Err(RbmError::MissingTrainingState(update)),
        }
    }
}

/// Complete parameter and unit state of a model, without the
/// transient Gibbs buffers. This is what gets persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RbmState {
    pub visible_size:   usize,
    pub hidden_size:    usize,
    pub weights:        Vec<f64>,
    pub hidden_biases:  Vec<f64>,
    pub visible_biases: Vec<f64>,
    pub visible_states: Vec<UnitState>,
    pub hidden_states:  Vec<UnitState>,
}

#[derive(Debug, Clone)]
pub struct RbmModel {
    weights:        Vec<f64>,
    hidden_biases:  Vec<f64>,
    visible_biases: Vec<f64>,
    visible:        NeuronLayer,
    hidden:         NeuronLayer,
    record:         GibbsRecord,
}

#[inline]
fn sigmoid(energy: f64) -> f64 {
    1.0 / (1.0 + (-energy).exp())
}

/// ln(1 + e^x) without overflow for large x.
#[inline]
fn softplus(x: f64) -> f64 {
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

impl RbmModel {
    /// Build a model over the given layers. Weights are drawn from
    /// N(0, weight_std_dev²), hidden biases follow the policy and
    /// visible biases start at zero.
    pub fn new<R: Rng + ?Sized>(
        visible: NeuronLayer,
        hidden:  NeuronLayer,
        policy:  InitPolicy,
        rng:     &mut R,
    ) -> RbmResult<Self> {
        if visible.size() == 0 || hidden.size() == 0 {
            return Err(RbmError::InvalidArgument(
                "layers of the RBM cannot be empty".to_string(),
            ));
        }
        let normal = Normal::new(0.0, policy.weight_std_dev).map_err(|e| {
            RbmError::InvalidArgument(format!(
                "invalid weight standard deviation {}: {e}",
                policy.weight_std_dev
            ))
        })?;

        let (nv, nh) = (visible.size(), hidden.size());
        let weights = (0..nv * nh).map(|_| normal.sample(rng)).collect();

        Ok(Self {
            weights,
            hidden_biases:  vec![policy.hidden_bias.value(); nh],
            visible_biases: vec![0.0; nv],
            visible,
            hidden,
            record: GibbsRecord::default(),
        })
    }

    /// Rebuild a model from a persisted state, checking every dimension.
    pub fn from_state(state: RbmState) -> RbmResult<Self> {
        let RbmState {
            visible_size: nv,
            hidden_size: nh,
            weights,
            hidden_biases,
            visible_biases,
            visible_states,
            hidden_states,
        } = state;

        if nv == 0 || nh == 0 {
            return Err(RbmError::InvalidArgument("layers of the RBM cannot be empty".to_string()));
        }
        let num_weights = nv.checked_mul(nh).ok_or_else(|| {
            RbmError::InvalidArgument(format!("{nv} × {nh} weights overflow the address space"))
        })?;
        let checks = [
            (num_weights, weights.len()),
            (nh, hidden_biases.len()),
            (nv, visible_biases.len()),
            (nv, visible_states.len()),
            (nh, hidden_states.len()),
        ];
        if let Some(&(expected, actual)) = checks.iter().find(|(e, a)| e != a) {
            return Err(RbmError::DimensionMismatch { expected, actual });
        }

        Ok(Self {
            weights,
            hidden_biases,
            visible_biases,
            visible: NeuronLayer::new(&visible_states),
            hidden:  NeuronLayer::new(&hidden_states),
            record:  GibbsRecord::default(),
        })
    }

    /// Snapshot of parameters and unit states.
    pub fn state(&self) -> RbmState {
        RbmState {
            visible_size:   self.visible_size(),
            hidden_size:    self.hidden_size(),
            weights:        self.weights.clone(),
            hidden_biases:  self.hidden_biases.clone(),
            visible_biases: self.visible_biases.clone(),
            visible_states: self.visible.as_vector(),
            hidden_states:  self.hidden.as_vector(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn visible_size(&self) -> usize {
        self.visible.size()
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden.size()
    }

    pub fn visible(&self) -> &NeuronLayer {
        &self.visible
    }

    pub fn hidden(&self) -> &NeuronLayer {
        &self.hidden
    }

    /// All weights, row-major (visible × hidden).
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn hidden_biases(&self) -> &[f64] {
        &self.hidden_biases
    }

    pub fn visible_biases(&self) -> &[f64] {
        &self.visible_biases
    }

    pub fn set_visible_biases(&mut self, biases: Vec<f64>) -> RbmResult<()> {
        if biases.len() != self.visible_biases.len() {
            return Err(RbmError::InvalidArgument(format!(
                "invalid length of visible biases vector: {} expected, but {} given",
                self.visible_biases.len(),
                biases.len()
            )));
        }
        self.visible_biases = biases;
        Ok(())
    }

    /// Clamp the visible layer to `values`.
    pub fn set_visible(&mut self, values: &[UnitState]) -> RbmResult<()> {
        self.check_visible_len(values.len())?;
        self.visible.replace_all(values)
    }

    /// Clamp the hidden layer to `values`.
    pub fn set_hidden(&mut self, values: &[UnitState]) -> RbmResult<()> {
        if values.len() != self.hidden_size() {
            return Err(RbmError::DimensionMismatch {
                expected: self.hidden_size(),
                actual:   values.len(),
            });
        }
        self.hidden.replace_all(values)
    }

    /// Reject an example whose width does not match the visible layer.
    pub fn check_visible_len(&self, len: usize) -> RbmResult<()> {
        if len != self.visible_size() {
            return Err(RbmError::DimensionMismatch { expected: self.visible_size(), actual: len });
        }
        Ok(())
    }

    // ── Activation probabilities ──────────────────────────────────────────────

    /// p(h_j = 1 | v) for the current visible layer.
    pub fn hidden_probabilities(&self) -> Vec<f64> {
        let nh = self.hidden_size();
        let mut energies = vec![0.0; nh];
        for (i, &v) in self.visible.as_slice().iter().enumerate() {
            if v == 0 {
                continue;
            }
            let row = &self.weights[i * nh..(i + 1) * nh];
            for (e, &w) in energies.iter_mut().zip(row) {
                *e += f64::from(v) * w;
            }
        }
        energies
            .iter()
            .zip(&self.hidden_biases)
            .map(|(&e, &c)| sigmoid(e + c))
            .collect()
    }

    /// p(v_i = 1 | h) for the current hidden layer.
    pub fn visible_probabilities(&self) -> Vec<f64> {
        let nh = self.hidden_size();
        let hidden = self.hidden.as_slice();
        self.weights
            .chunks_exact(nh)
            .zip(&self.visible_biases)
            .map(|(row, &b)| {
                let energy: f64 = row
                    .iter()
                    .zip(hidden)
                    .map(|(&w, &h)| f64::from(h) * w)
                    .sum();
                sigmoid(energy + b)
            })
            .collect()
    }

    // ── Gibbs sampling ────────────────────────────────────────────────────────

    /// Stochastically set every hidden unit from the current visible
    /// layer (`random < p`). Returns the probabilities, not the states.
    pub fn sample_hidden_given_visible<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<f64> {
        let probabilities = self.hidden_probabilities();
        for (unit, &p) in self.hidden.states_mut().iter_mut().zip(&probabilities) {
            let random: f64 = rng.gen();
            *unit = UnitState::from(random < p);
        }
        probabilities
    }

    /// Stochastically set every visible unit from the current hidden
    /// layer (`random <= p`). Returns the probabilities.
    pub fn sample_visible_given_hidden<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<f64> {
        let probabilities = self.visible_probabilities();
        for (unit, &p) in self.visible.states_mut().iter_mut().zip(&probabilities) {
            let random: f64 = rng.gen();
            *unit = UnitState::from(random <= p);
        }
        probabilities
    }

    /// Mean-field visible update: every visible unit becomes its
    /// probability rounded to the nearest integer. Deterministic.
    pub fn settle_visible_given_hidden(&mut self) -> Vec<f64> {
        let probabilities = self.visible_probabilities();
        for (unit, &p) in self.visible.states_mut().iter_mut().zip(&probabilities) {
            *unit = p.round() as UnitState;
        }
        probabilities
    }

    // ── Recorded Gibbs-step buffers ───────────────────────────────────────────

    pub fn record_original_input(&mut self, input: &[UnitState]) -> RbmResult<()> {
        self.check_visible_len(input.len())?;
        self.record.original = Some(input.to_vec());
        Ok(())
    }

    pub fn record_initial_hidden_probabilities(&mut self, p: Vec<f64>) -> RbmResult<()> {
        self.check_hidden_len(p.len())?;
        self.record.initial_hidden = Some(p);
        Ok(())
    }

    pub fn record_final_hidden_probabilities(&mut self, p: Vec<f64>) -> RbmResult<()> {
        self.check_hidden_len(p.len())?;
        self.record.final_hidden = Some(p);
        Ok(())
    }

    pub fn record_final_visible_probabilities(&mut self, p: Vec<f64>) -> RbmResult<()> {
        self.check_visible_len(p.len())?;
        self.record.final_visible = Some(p);
        Ok(())
    }

    fn check_hidden_len(&self, len: usize) -> RbmResult<()> {
        if len != self.hidden_size() {
            return Err(RbmError::DimensionMismatch { expected: self.hidden_size(), actual: len });
        }
        Ok(())
    }

    // ── Parameter updates ─────────────────────────────────────────────────────

    /// W[i][j] += lr · (h0_j·v0_i − hn_j·vn_i)
    pub fn apply_weight_update(&mut self, learning_rate: f64) -> RbmResult<()> {
        let nh = self.hidden_size();
        let (v0, h0, hn, vn) = self.record.buffers("unable to update weights")?;

        for (i, row) in self.weights.chunks_exact_mut(nh).enumerate() {
            let v0_i = f64::from(v0[i]);
            let vn_i = vn[i];
            for (j, w) in row.iter_mut().enumerate() {
                *w += learning_rate * (h0[j] * v0_i - hn[j] * vn_i);
            }
        }
        Ok(())
    }

    /// b_i += lr · (v0_i − vn_i);  c_j += lr · (h0_j − hn_j)
    pub fn apply_bias_update(&mut self, learning_rate: f64) -> RbmResult<()> {
        let (v0, h0, hn, vn) = self.record.buffers("unable to update biases")?;

        for ((b, &a), &r) in self.visible_biases.iter_mut().zip(v0).zip(vn) {
            *b += learning_rate * (f64::from(a) - r);
        }
        for ((c, &a), &r) in self.hidden_biases.iter_mut().zip(h0).zip(hn) {
            *c += learning_rate * (a - r);
        }
        Ok(())
    }

    /// Forget the buffers of the last Gibbs step.
    pub fn clear_record(&mut self) {
        self.record = GibbsRecord::default();
    }

    // ── Diagnostics ───────────────────────────────────────────────────────────

    /// F(v) = −( Σ_i b_i·v_i + Σ_j ln(1 + e^{c_j + Σ_i W[i][j]·v_i}) )
    /// of the current visible layer. Only meaningful relative to other
    /// configurations under the same parameters; lower is more probable.
    pub fn free_energy(&self) -> f64 {
        let nh = self.hidden_size();
        let visible = self.visible.as_slice();

        let visible_term: f64 = self
            .visible_biases
            .iter()
            .zip(visible)
            .map(|(&b, &v)| b * f64::from(v))
            .sum();

        let mut x = self.hidden_biases.clone();
        for (i, &v) in visible.iter().enumerate() {
            if v == 0 {
                continue;
            }
            for (xj, &w) in x.iter_mut().zip(&self.weights[i * nh..(i + 1) * nh]) {
                *xj += w * f64::from(v);
            }
        }
        let hidden_term: f64 = x.into_iter().map(softplus).sum();

        -(visible_term + hidden_term)
    }

    /// Σ_i (target_i − v_i)² against the current visible layer.
    pub fn reconstruction_error(&self, target: &[UnitState]) -> f64 {
        target
            .iter()
            .zip(self.visible.as_slice())
            .map(|(&t, &v)| {
                let d = f64::from(t) - f64::from(v);
                d * d
            })
            .sum()
    }
}
