//! Per-depth parameter schedules.

use serde::{Deserialize, Serialize};

/// A scalar that may vary with depth.
///
/// Used for recharge, decay and decomposition thresholds, so experiments
/// can, for example, lower the split threshold at higher depths without
/// changing the algorithm.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum DepthSchedule {
    /// Same value at every depth.
    Uniform(f64),
    /// Explicit value per depth; the last entry extends to deeper levels.
    PerDepth(Vec<f64>),
    /// `base * ratio^depth`.
    Geometric { base: f64, ratio: f64 },
}

impl Default for DepthSchedule {
    fn default() -> Self {
        Self::Uniform(0.0)
    }
}

impl DepthSchedule {
    pub fn value_at(&self, depth: usize) -> f64 {
        match self {
            DepthSchedule::Uniform(v) => *v,
            DepthSchedule::PerDepth(values) => values
                .get(depth)
                .or_else(|| values.last())
                .copied()
                .unwrap_or(0.0),
            DepthSchedule::Geometric { base, ratio } => {
                let exp = i32::try_from(depth).unwrap_or(i32::MAX);
                base * ratio.powi(exp)
            }
        }
    }

    /// True when every value the schedule can produce over `depths` levels
    /// is finite and non-negative.
    pub fn is_valid(&self, depths: usize) -> bool {
        match self {
            DepthSchedule::PerDepth(values) if values.is_empty() => false,
            _ => (0..depths.max(1)).all(|d| {
                let v = self.value_at(d);
                v.is_finite() && v >= 0.0
            }),
        }
    }
}
