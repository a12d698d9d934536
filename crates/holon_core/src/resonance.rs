//! Pairwise resonance between agents.
//!
//! Every agent maps its (energy, depth, phase) state onto a fixed-length
//! "phase fingerprint": each component wraps a linear combination of energy
//! and depth around the unit interval using an irrational stride, then
//! projects that onto a sine. Resonance is the cosine similarity of two
//! fingerprints.
//!
//! The metric is a trait so experiment code can swap in a variant, but
//! [`PhaseFingerprint`] is the single canonical definition and the one
//! [`Agent::resonance`](crate::agent::Agent::resonance) uses.

use crate::agent::Agent;
use std::f64::consts::{E, LN_2, PI, SQRT_2, TAU};
use std::fmt::Debug;

/// Number of components in a phase fingerprint.
pub const FINGERPRINT_DIM: usize = 8;

const PHI: f64 = 1.618_033_988_749_895;
const SQRT_3: f64 = 1.732_050_807_568_877_2;
const SQRT_5: f64 = 2.236_067_977_499_79;
const SQRT_7: f64 = 2.645_751_311_064_590_7;

/// Irrational strides, one per fingerprint component.
const STRIDES: [f64; FINGERPRINT_DIM] = [PHI, SQRT_2, SQRT_3, SQRT_5, E, PI, LN_2, SQRT_7];

/// Similarity score used as the composition eligibility test.
pub trait ResonanceMetric: Debug + Send + Sync {
    /// Returns a score in `[-1, 1]`. Must return exactly `0.0` when either
    /// side has no defined direction.
    fn resonance(&self, a: &Agent, b: &Agent) -> f64;
}

/// Canonical fingerprint-cosine metric.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseFingerprint;

impl ResonanceMetric for PhaseFingerprint {
    fn resonance(&self, a: &Agent, b: &Agent) -> f64 {
        if a.population_index() != b.population_index() {
            return 0.0;
        }
        cosine_similarity(&a.fingerprint(), &b.fingerprint())
    }
}

/// Wraps `x` into `[0, 1)`.
fn wrap_unit(x: f64) -> f64 {
    x.rem_euclid(1.0)
}

/// Computes the phase fingerprint for a raw state triple.
///
/// A zero-energy agent at depth 0 with zero phase yields the zero vector.
pub fn fingerprint(energy: f64, depth: usize, phase: f64) -> [f64; FINGERPRINT_DIM] {
    let depth = depth as f64;
    let mut out = [0.0; FINGERPRINT_DIM];
    for (i, slot) in out.iter_mut().enumerate() {
        let stride = STRIDES[i];
        let cross = STRIDES[(i + 3) % FINGERPRINT_DIM];
        let turn = wrap_unit(energy * stride + depth * cross);
        *slot = (TAU * turn + phase).sin();
    }
    out
}

/// Cosine similarity clamped to `[-1, 1]`.
///
/// Zero-magnitude or non-finite input yields `0.0`.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let sim = dot / (norm_a * norm_b);
    if sim.is_finite() {
        sim.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_state_fingerprint_is_zero_vector() {
        assert!(fingerprint(0.0, 0, 0.0).iter().all(|c| *c == 0.0));
    }

    #[test]
    fn test_zero_vectors_resonate_at_exactly_zero() {
        let z = [0.0; FINGERPRINT_DIM];
        assert_eq!(cosine_similarity(&z, &z), 0.0);
    }

    #[test]
    fn test_one_zero_side_is_zero() {
        let z = [0.0; FINGERPRINT_DIM];
        let f = fingerprint(1.0, 0, 0.0);
        assert_eq!(cosine_similarity(&z, &f), 0.0);
        assert_eq!(cosine_similarity(&f, &z), 0.0);
    }

    #[test]
    fn test_identical_state_resonates_fully() {
        let a = fingerprint(1.0, 0, 0.0);
        let b = fingerprint(1.0, 0, 0.0);
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_metric_ignores_cross_depth_pairs() {
        use crate::population::PopulationStore;
        let mut store = PopulationStore::new(2).unwrap();
        store.add_agent(Agent::new("a", 1.0), 0).unwrap();
        store.add_agent(Agent::new("b", 1.0), 1).unwrap();
        let a = store.agent(&"a".into()).unwrap();
        let b = store.agent(&"b".into()).unwrap();
        assert_eq!(PhaseFingerprint.resonance(a, b), 0.0);
    }

    proptest! {
        #[test]
        fn prop_resonance_in_unit_range(
            e1 in 0.0f64..50.0, e2 in 0.0f64..50.0,
            d in 0usize..6, p1 in -10.0f64..10.0, p2 in -10.0f64..10.0
        ) {
            let r = cosine_similarity(&fingerprint(e1, d, p1), &fingerprint(e2, d, p2));
            prop_assert!((-1.0..=1.0).contains(&r));
        }
    }
}
