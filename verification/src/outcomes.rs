//! Successful verification outcomes.
//!
//! A rejection is an outcome, not an error: the classifier ran and the
//! policy said no.

use crate::state::VerificationStage;
use ecobuild_types::{Address, AttestationId, TransactionRef};
use ecobuild_vision::ClassificationVerdict;

#[derive(Clone, Debug, PartialEq)]
pub enum VerificationOutcome {
    Rejected {
        actor: Address,
        verdict: ClassificationVerdict,
        reason: String,
        attestation_id: AttestationId,
    },
    Minted {
        actor: Address,
        verdict: ClassificationVerdict,
        reward_units: u64,
        category_code: u8,
        transaction: TransactionRef,
        attestation_id: AttestationId,
    },
}

impl VerificationOutcome {
    pub fn stage(&self) -> VerificationStage {
        match self {
            VerificationOutcome::Rejected { .. } => VerificationStage::Rejected,
            VerificationOutcome::Minted { .. } => VerificationStage::Minted,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationOutcome::Minted { .. })
    }

    pub fn actor(&self) -> &Address {
        match self {
            VerificationOutcome::Rejected { actor, .. } | VerificationOutcome::Minted { actor, .. } => {
                actor
            }
        }
    }

    pub fn verdict(&self) -> &ClassificationVerdict {
        match self {
            VerificationOutcome::Rejected { verdict, .. }
            | VerificationOutcome::Minted { verdict, .. } => verdict,
        }
    }

    pub fn attestation_id(&self) -> &AttestationId {
        match self {
            VerificationOutcome::Rejected { attestation_id, .. }
            | VerificationOutcome::Minted { attestation_id, .. } => attestation_id,
        }
    }
}
