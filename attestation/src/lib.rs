//! Attestation claims: normalization, validation and identity.
//!
//! A claim arrives as untyped JSON (manual path) or is assembled from a
//! classification verdict (image path). Both surfaces go through the same
//! pipeline:
//!
//! 1. [`normalize`] trims, lowercases and coerces the raw fields.
//! 2. [`canonicalize`] enforces the field rules for the surface's
//!    [`Capability`] and yields a [`CanonicalClaim`].
//! 3. [`attestation_id`] hashes the canonical serialization.
//!
//! The manual surface additionally bounds the claimed timestamp against
//! server time ([`AttestationValidator`]). Upload checks for the image surface
//! live in [`upload`].

pub mod claim;
pub mod error;
pub mod identity;
pub mod normalize;
pub mod upload;
pub mod validation;

pub use claim::{canonicalize, CanonicalClaim, Capability, GeoPoint};
pub use error::AttestationError;
pub use identity::{attestation_id, canonical_bytes};
pub use normalize::{normalize, NormalizedClaim};
pub use upload::{validate_upload, ImageUpload, VerificationRequest};
pub use validation::{
    AttestationValidator, ValidatedAttestation, VerifiedImageClaim, DEFAULT_WINDOW_MS,
};
