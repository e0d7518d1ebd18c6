// Risk estimation: the seam that replaces random "validation" scores.
//
// A RiskEstimator turns a classification (and its sentiment) into a bounded
// 0.0-1.0 estimate. The pipeline compares it against the profile's verify
// threshold to decide whether a post counts as verified. Implementations
// must be deterministic for identical input.

use super::hazard::{ClassificationResult, Urgency};
use super::sentiment::SentimentResult;

pub trait RiskEstimator: Send + Sync {
    /// Estimate risk for a classified post. Must return a value in [0, 1].
    fn estimate(&self, classification: &ClassificationResult, sentiment: &SentimentResult) -> f64;
}

/// Default estimator: the classifier's confidence, nudged up for
/// high-urgency posts. Unmatched (General) text is always zero.
#[derive(Debug, Clone)]
pub struct ConfidenceEstimator {
    pub high_urgency_boost: f64,
}

impl Default for ConfidenceEstimator {
    fn default() -> Self {
        Self {
            high_urgency_boost: 0.1,
        }
    }
}

impl RiskEstimator for ConfidenceEstimator {
    fn estimate(&self, classification: &ClassificationResult, _sentiment: &SentimentResult) -> f64 {
        if classification.is_general() {
            return 0.0;
        }
        let boost = if classification.urgency == Urgency::High {
            self.high_urgency_boost
        } else {
            0.0
        };
        (classification.confidence + boost).clamp(0.0, 1.0)
    }
}
