//! Priority scoring: three additive components, each clamped to [0,1] before
//! combining, final score clamped to [0,1].

const GAP_BOOST_MAX: f64 = 0.3;
const PROBLEM_CLUSTER_PENALTY: f64 = -0.2;

#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityInputs {
    /// Structural prior from URL shape: shorter depth and matches to known
    /// hub patterns score higher. Caller computes this; frontier only clamps
    /// and combines.
    pub structural_prior: f64,
    /// Unresolved coverage gap whose target matches this URL, already scaled
    /// into [0, GAP_BOOST_MAX] by the caller.
    pub gap_boost: f64,
    /// Whether a cluster of prior failures on a sibling URL is active.
    pub problem_cluster_active: bool,
}

pub fn compute_priority_score(inputs: PriorityInputs) -> f64 {
    let structural = inputs.structural_prior.clamp(0.0, 1.0);
    let gap = inputs.gap_boost.clamp(0.0, GAP_BOOST_MAX);
    let problem = if inputs.problem_cluster_active { PROBLEM_CLUSTER_PENALTY } else { 0.0 };
    (structural + gap + problem).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_structural_prior_passes_through() {
        let score = compute_priority_score(PriorityInputs { structural_prior: 0.6, gap_boost: 0.0, problem_cluster_active: false });
        assert_eq!(score, 0.6);
    }

    #[test]
    fn gap_boost_is_capped_at_0_3() {
        let score = compute_priority_score(PriorityInputs { structural_prior: 0.5, gap_boost: 10.0, problem_cluster_active: false });
        assert_eq!(score, 0.8);
    }

    #[test]
    fn problem_cluster_penalty_reduces_score() {
        let score = compute_priority_score(PriorityInputs { structural_prior: 0.5, gap_boost: 0.0, problem_cluster_active: true });
        assert!((score - 0.3).abs() < 1e-9);
    }

    #[test]
    fn final_score_never_exceeds_one() {
        let score = compute_priority_score(PriorityInputs { structural_prior: 1.0, gap_boost: 1.0, problem_cluster_active: false });
        assert_eq!(score, 1.0);
    }

    #[test]
    fn final_score_never_goes_below_zero() {
        let score = compute_priority_score(PriorityInputs { structural_prior: 0.0, gap_boost: 0.0, problem_cluster_active: true });
        assert_eq!(score, 0.0);
    }
}
