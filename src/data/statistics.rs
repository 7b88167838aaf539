// ============================================================
// Layer 4 — Dataset Statistics
// ============================================================
// Per-position activation statistics of a set of binary vectors:
//
//   p_i            = fraction of examples with bit i set
//   visible bias_i = ln(p_i / (1 - p_i))       (clamped)
//   entropy        = Σ_i −p_i · log2(p_i)
//
// Initialising visible biases to the log-odds of the empirical
// activation makes the model's visible marginals match the data
// before the first epoch.

use crate::domain::neuron_layer::UnitState;

/// Magnitude bound for visible biases derived from always-on or
/// always-off positions, where the log-odds are infinite.
pub const VISIBLE_BIAS_CLAMP: f64 = 7.0;

/// Fraction of examples with each position set. Empty input gives
/// an empty vector.
pub fn activation_probabilities<'a, I>(examples: I) -> Vec<f64>
where
    I: IntoIterator<Item = &'a [UnitState]>,
{
    let mut counts: Vec<f64> = Vec::new();
    let mut n = 0usize;
    for example in examples {
        if counts.is_empty() {
            counts = vec![0.0; example.len()];
        }
        for (c, &bit) in counts.iter_mut().zip(example) {
            if bit == 1 {
                *c += 1.0;
            }
        }
        n += 1;
    }
    counts.iter_mut().for_each(|c| *c /= n.max(1) as f64);
    counts
}

/// Log-odds of each activation probability. Constant positions
/// (p = 0 or p = 1) get ∓VISIBLE_BIAS_CLAMP instead of ∓∞.
pub fn initial_visible_biases<'a, I>(examples: I) -> Vec<f64>
where
    I: IntoIterator<Item = &'a [UnitState]>,
{
    let probabilities = activation_probabilities(examples);
    let saturated = probabilities.iter().filter(|&&p| p <= 0.0 || p >= 1.0).count();
    if saturated > 0 {
        tracing::debug!(
            "{} of {} visible positions are constant; clamping their bias to ±{}",
            saturated,
            probabilities.len(),
            VISIBLE_BIAS_CLAMP,
        );
    }
    probabilities.into_iter().map(log_odds).collect()
}

fn log_odds(p: f64) -> f64 {
    if p <= 0.0 {
        -VISIBLE_BIAS_CLAMP
    } else if p >= 1.0 {
        VISIBLE_BIAS_CLAMP
    } else {
        (p / (1.0 - p)).ln()
    }
}

/// Σ −p·log2(p) over positions; constant-off positions contribute 0.
pub fn entropy<'a, I>(examples: I) -> f64
where
    I: IntoIterator<Item = &'a [UnitState]>,
{
    activation_probabilities(examples)
        .into_iter()
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.log2())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Vec<u8>> {
        vec![vec![1, 0, 1, 1], vec![1, 0, 0, 1], vec![1, 0, 1, 0], vec![1, 0, 0, 0]]
    }

    #[test]
    fn test_activation_probabilities() {
        let r = rows();
        let p = activation_probabilities(r.iter().map(Vec::as_slice));
        assert_eq!(p, vec![1.0, 0.0, 0.5, 0.5]);
    }

    #[test]
    fn test_biases_are_log_odds_with_clamp() {
        let r = rows();
        let b = initial_visible_biases(r.iter().map(Vec::as_slice));
        assert_eq!(b[0], VISIBLE_BIAS_CLAMP);
        assert_eq!(b[1], -VISIBLE_BIAS_CLAMP);
        assert!(b[2].abs() < 1e-12);
        assert!(b.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_rare_positions_keep_exact_log_odds() {
        // p = 1/2000 is not saturated, so its bias goes past the clamp
        let mut r = vec![vec![0u8, 1]; 2000];
        r[0][0] = 1;
        let b = initial_visible_biases(r.iter().map(Vec::as_slice));
        let p: f64 = 1.0 / 2000.0;
        assert!((b[0] - (p / (1.0 - p)).ln()).abs() < 1e-12);
        assert!(b[0] < -VISIBLE_BIAS_CLAMP);
        assert_eq!(b[1], VISIBLE_BIAS_CLAMP);
    }

    #[test]
    fn test_entropy_ignores_constant_positions() {
        let r = rows();
        // two positions with p = 0.5 contribute 0.5 bit each
        let h = entropy(r.iter().map(Vec::as_slice));
        assert!((h - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input() {
        let empty: Vec<&[u8]> = Vec::new();
        assert!(activation_probabilities(empty).is_empty());
    }
}
