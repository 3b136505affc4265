use crate::state::VerificationStage;
use ecobuild_attestation::AttestationError;
use ecobuild_ledger::LedgerError;
use ecobuild_types::AttestationId;
use ecobuild_vision::{ClassificationVerdict, VisionError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RewardError {
    /// Caller-fixable: every violated rule.
    #[error("invalid request: {}", .0.join("; "))]
    Invalid(Vec<String>),

    /// The caller could not be authenticated.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The classifier could not assess the image.
    #[error("classification failed: {0}")]
    ClassificationFailed(String),

    /// Classification succeeded and the policy accepted, but the ledger did
    /// not mint. Verified but not rewarded.
    #[error("verified but minting failed: {error}")]
    MintFailed {
        error: LedgerError,
        verdict: ClassificationVerdict,
        reward_units: u64,
        attestation_id: AttestationId,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RewardError {
    /// Terminal stage of the verification pipeline, for the variants that
    /// end one.
    pub fn stage(&self) -> Option<VerificationStage> {
        match self {
            RewardError::Invalid(_) => Some(VerificationStage::Invalid),
            RewardError::ClassificationFailed(_) => Some(VerificationStage::ClassificationFailed),
            RewardError::MintFailed { .. } => Some(VerificationStage::MintFailed),
            RewardError::Unauthenticated(_) | RewardError::Ledger(_) | RewardError::Internal(_) => {
                None
            }
        }
    }
}

impl From<AttestationError> for RewardError {
    fn from(e: AttestationError) -> Self {
        match e {
            AttestationError::Invalid { violations, .. } => RewardError::Invalid(violations),
            AttestationError::Serialization(detail) => RewardError::Internal(detail),
        }
    }
}

impl From<VisionError> for RewardError {
    fn from(e: VisionError) -> Self {
        RewardError::ClassificationFailed(e.to_string())
    }
}
