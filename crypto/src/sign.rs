//! Ed25519 signature verification against ledger addresses.

use ecobuild_types::Address;
use ed25519_dalek::VerifyingKey;

/// Verify a signature against a message and the address's public key.
///
/// Rejects non-canonical signatures and small-order keys. Returns `false` for
/// addresses that are not valid curve points (derived accounts can never sign).
pub fn verify_signature(message: &[u8], signature: &[u8; 64], signer: &Address) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(signer.as_bytes()) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(signature);
    verifying_key.verify_strict(message, &dalek_sig).is_ok()
}
