//! Content-addressed attestation identity.
//!
//! `AttestationId = sha256(canonical_bytes(claim))`, where the canonical bytes
//! are compact JSON with keys in [`CanonicalClaim`] field order. Equal
//! canonical claims always produce equal ids, so the id can serve as an
//! idempotency key for callers. Nothing here remembers previously seen ids.

use crate::{AttestationError, CanonicalClaim};
use ecobuild_crypto::sha256;
use ecobuild_types::AttestationId;

/// Byte-stable serialization of a canonical claim.
pub fn canonical_bytes(claim: &CanonicalClaim) -> Result<Vec<u8>, AttestationError> {
    serde_json::to_vec(claim).map_err(|e| AttestationError::Serialization(e.to_string()))
}

pub fn attestation_id(claim: &CanonicalClaim) -> Result<AttestationId, AttestationError> {
    Ok(AttestationId::new(sha256(&canonical_bytes(claim)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{canonicalize, normalize, Capability};
    use serde_json::json;

    fn claim(raw: serde_json::Value) -> CanonicalClaim {
        canonicalize(&normalize(&raw), Capability::Manual).unwrap()
    }

    fn base() -> serde_json::Value {
        json!({
            "playerPubkey": "TestPlayer1111111111111111111111111111111",
            "materialType": "Plastic",
            "quantity": 4,
            "zoneId": "zone-17",
            "photoHash": "photo-hash-abc",
            "gps": { "lat": 37.7749, "lon": -122.4194 },
            "timestamp": 1_700_000_000_000i64,
        })
    }

    #[test]
    fn canonical_bytes_use_fixed_key_order() {
        let bytes = canonical_bytes(&claim(base())).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            concat!(
                r#"{"playerPubkey":"TestPlayer1111111111111111111111111111111","#,
                r#""materialType":"plastic","quantity":4,"zoneId":"zone-17","#,
                r#""photoHash":"photo-hash-abc","gps":{"lat":37.7749,"lon":-122.4194},"#,
                r#""timestamp":1700000000000}"#
            )
        );
    }

    #[test]
    fn id_is_sha256_of_canonical_bytes() {
        let c = claim(base());
        let expected = ecobuild_crypto::sha256_hex(&canonical_bytes(&c).unwrap());
        assert_eq!(attestation_id(&c).unwrap().to_hex(), expected);
    }

    #[test]
    fn key_order_of_input_does_not_matter() {
        let reordered = json!({
            "timestamp": 1_700_000_000_000i64,
            "gps": { "lon": -122.4194, "lat": 37.7749 },
            "photoHash": "photo-hash-abc",
            "zoneId": "zone-17",
            "quantity": "4",
            "materialType": "  PLASTIC",
            "playerPubkey": "TestPlayer1111111111111111111111111111111 ",
        });
        assert_eq!(
            attestation_id(&claim(base())).unwrap(),
            attestation_id(&claim(reordered)).unwrap()
        );
    }

    #[test]
    fn perturbations_change_the_id() {
        let original = attestation_id(&claim(base())).unwrap();
        for (key, value) in [
            ("materialType", json!("glass")),
            ("quantity", json!(5)),
            ("timestamp", json!(1_700_000_000_001i64)),
            ("zoneId", json!("zone-18")),
        ] {
            let mut raw = base();
            raw[key] = value;
            assert_ne!(original, attestation_id(&claim(raw)).unwrap(), "{key}");
        }
    }
}
