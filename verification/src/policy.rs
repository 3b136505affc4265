//! Reward policy.
//!
//! A verdict is accepted when something was detected and the confidence is
//! at least the threshold (inclusive). Accepted collections always earn at
//! least one reward unit.

use ecobuild_vision::ClassificationVerdict;

pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.7;

#[derive(Clone, Debug, PartialEq)]
pub enum RewardDecision {
    Accepted { reward_units: u64, category_code: u8 },
    Rejected { reason: String },
}

impl RewardDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, RewardDecision::Accepted { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RewardPolicy {
    min_confidence: f64,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONFIDENCE)
    }
}

impl RewardPolicy {
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    pub fn decide(&self, verdict: &ClassificationVerdict) -> RewardDecision {
        if !verdict.detected {
            return RewardDecision::Rejected {
                reason: format!(
                    "no waste detected in image (confidence {})",
                    verdict.confidence
                ),
            };
        }
        if verdict.confidence < self.min_confidence {
            return RewardDecision::Rejected {
                reason: format!(
                    "confidence {} is below the {} threshold",
                    verdict.confidence, self.min_confidence
                ),
            };
        }
        RewardDecision::Accepted {
            reward_units: reward_units(verdict.estimated_quantity),
            category_code: verdict.category.category_code(),
        }
    }
}

/// `max(1, round(estimated))`; non-finite estimates earn the floor.
pub fn reward_units(estimated: f64) -> u64 {
    if !estimated.is_finite() || estimated <= 0.0 {
        return 1;
    }
    // `as` saturates at u64::MAX for huge estimates.
    (estimated.round() as u64).max(1)
}
