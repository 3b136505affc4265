//! Attestation validation for both call surfaces.

use crate::claim::{canonicalize, CanonicalClaim, Capability};
use crate::identity::attestation_id;
use crate::normalize::normalize;
use crate::AttestationError;
use ecobuild_types::{Address, AttestationId, MaterialType, TimestampMs, WasteType};
use serde_json::{json, Value};

/// Ten minutes either side of server time.
pub const DEFAULT_WINDOW_MS: u64 = 600_000;

/// A manual claim that passed every rule.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedAttestation {
    pub claim: CanonicalClaim,
    pub material: MaterialType,
    pub attestation_id: AttestationId,
    pub server_timestamp: TimestampMs,
}

/// Validates legacy (manual) claims against the shared rule set plus the
/// symmetric time window.
#[derive(Clone, Copy, Debug)]
pub struct AttestationValidator {
    window_ms: u64,
}

impl Default for AttestationValidator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_MS)
    }
}

impl AttestationValidator {
    pub fn new(window_ms: u64) -> Self {
        Self { window_ms }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Validate `raw` as observed at server time `now`.
    ///
    /// Every violated rule is reported. The window bound is inclusive and is
    /// only checked once the timestamp itself parsed.
    pub fn validate(
        &self,
        raw: &Value,
        now: TimestampMs,
    ) -> Result<ValidatedAttestation, AttestationError> {
        let normalized = normalize(raw);

        let mut violations = match canonicalize(&normalized, Capability::Manual) {
            Ok(claim) => {
                if self.within_window(claim.timestamp, now) {
                    let material = claim.material().ok_or_else(|| AttestationError::Invalid {
                        violations: vec![format!(
                            "{} is not a ledger material",
                            normalized.material_type.label
                        )],
                        server_timestamp: now,
                    })?;
                    let attestation_id = attestation_id(&claim)?;
                    return Ok(ValidatedAttestation {
                        claim,
                        material,
                        attestation_id,
                        server_timestamp: now,
                    });
                }
                Vec::new()
            }
            Err(violations) => violations,
        };

        if let Some(ts) = normalized.timestamp.value {
            if !self.within_window(ts, now) {
                violations.push(format!(
                    "{} must be within {}ms of server time",
                    normalized.timestamp.label, self.window_ms
                ));
            }
        }

        Err(AttestationError::Invalid {
            violations,
            server_timestamp: now,
        })
    }

    fn within_window(&self, claimed: f64, now: TimestampMs) -> bool {
        (now.as_millis() as f64 - claimed).abs() <= self.window_ms as f64
    }
}

/// The image-path claim: built from a classification rather than supplied
/// by the caller, then run through the same canonicalization as manual
/// claims with zone and location omitted.
#[derive(Clone, Debug, PartialEq)]
pub struct VerifiedImageClaim {
    pub actor: Address,
    pub category: WasteType,
    pub reward_units: u64,
    /// Lowercase hex SHA-256 of the uploaded image.
    pub image_digest: String,
    pub timestamp: TimestampMs,
}

impl VerifiedImageClaim {
    pub fn canonical(&self) -> Result<CanonicalClaim, AttestationError> {
        let raw = json!({
            "playerPubkey": self.actor.to_base58(),
            "materialType": self.category.as_str(),
            "quantity": self.reward_units,
            "photoHash": self.image_digest,
            "timestamp": self.timestamp.as_millis(),
        });
        canonicalize(&normalize(&raw), Capability::Image).map_err(|violations| {
            AttestationError::Invalid {
                violations,
                server_timestamp: self.timestamp,
            }
        })
    }

    pub fn attestation_id(&self) -> Result<AttestationId, AttestationError> {
        attestation_id(&self.canonical()?)
    }
}
