use crate::core::{ClassificationResult, StateLabel};

/// Reduces a label distribution to a single reported state.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionMapper;

impl DecisionMapper {
    pub fn new() -> Self {
        Self
    }

    /// Highest-scoring label. The first label is the baseline and a later
    /// label only wins when strictly greater, so ties go to the lower index.
    pub fn decide(&self, result: &ClassificationResult) -> StateLabel {
        let mut scores = result.scores.iter().enumerate();
        let Some((mut best_ix, mut best)) = scores.next() else {
            return StateLabel::anomaly();
        };

        for (ix, score) in scores {
            if score.value > best.value {
                best_ix = ix;
                best = score;
            }
        }

        StateLabel::trained(best_ix, best.label.clone())
    }
}
