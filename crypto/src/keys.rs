//! Authority keypair loading and signing.
//!
//! Keypairs are stored in the common wallet format: a JSON array of 64 byte
//! values (32-byte secret seed followed by the 32-byte public key). Three
//! sources are supported, in precedence order: a base64-encoded copy of that
//! JSON (for secret stores), a path to the JSON file, or raw seed bytes (tests).

use crate::CryptoError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ecobuild_types::Address;
use ed25519_dalek::{Signer, SigningKey};
use std::fmt;
use std::path::Path;

/// The service authority: the only key allowed to mint.
#[derive(Clone)]
pub struct AuthorityKeypair {
    signing_key: SigningKey,
}

impl AuthorityKeypair {
    /// Deterministic keypair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Parse the 64-byte JSON array format. The embedded public key must
    /// match the one derived from the secret half.
    pub fn from_json(json: &str) -> Result<Self, CryptoError> {
        let bytes: Vec<u8> = serde_json::from_str(json)
            .map_err(|e| CryptoError::InvalidKeypair(format!("not a JSON byte array: {e}")))?;
        let keypair_bytes: [u8; 64] = bytes.try_into().map_err(|v: Vec<u8>| {
            CryptoError::InvalidKeypair(format!("expected 64 bytes, got {}", v.len()))
        })?;
        let signing_key = SigningKey::from_keypair_bytes(&keypair_bytes)
            .map_err(|e| CryptoError::InvalidKeypair(e.to_string()))?;
        Ok(Self { signing_key })
    }

    /// Parse base64-encoded keypair JSON.
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let decoded = BASE64
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidKeypair(format!("invalid base64: {e}")))?;
        let json = String::from_utf8(decoded)
            .map_err(|e| CryptoError::InvalidKeypair(format!("invalid utf-8: {e}")))?;
        Self::from_json(&json)
    }

    /// Read a keypair JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CryptoError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| CryptoError::KeypairFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&contents)
    }

    /// Serialize back into the 64-byte JSON array format.
    pub fn to_json(&self) -> String {
        let bytes = self.signing_key.to_keypair_bytes();
        serde_json::Value::from(bytes.to_vec()).to_string()
    }

    pub fn address(&self) -> Address {
        Address::new(self.signing_key.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl fmt::Debug for AuthorityKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorityKeypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn json_roundtrip_preserves_address() {
        let kp = AuthorityKeypair::from_seed(&[42u8; 32]);
        let restored = AuthorityKeypair::from_json(&kp.to_json()).unwrap();
        assert_eq!(restored.address(), kp.address());
    }

    #[test]
    fn base64_source_matches_json_source() {
        let kp = AuthorityKeypair::from_seed(&[7u8; 32]);
        let encoded = BASE64.encode(kp.to_json());
        let restored = AuthorityKeypair::from_base64(&encoded).unwrap();
        assert_eq!(restored.address(), kp.address());
    }

    #[test]
    fn mismatched_public_half_is_rejected() {
        let kp = AuthorityKeypair::from_seed(&[7u8; 32]);
        let mut bytes: Vec<u8> = serde_json::from_str(&kp.to_json()).unwrap();
        bytes[63] ^= 0xff;
        let tampered = serde_json::Value::from(bytes).to_string();
        assert!(matches!(
            AuthorityKeypair::from_json(&tampered),
            Err(CryptoError::InvalidKeypair(_))
        ));
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert!(AuthorityKeypair::from_json("[1,2,3]").is_err());
        assert!(AuthorityKeypair::from_json("not json").is_err());
    }

    #[test]
    fn loads_from_file() {
        let kp = AuthorityKeypair::from_seed(&[3u8; 32]);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(kp.to_json().as_bytes()).unwrap();
        let restored = AuthorityKeypair::from_file(file.path()).unwrap();
        assert_eq!(restored.address(), kp.address());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AuthorityKeypair::from_file("/nonexistent/id.json").unwrap_err();
        assert!(matches!(err, CryptoError::KeypairFile { .. }));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = AuthorityKeypair::from_seed(&[1u8; 32]);
        let rendered = format!("{kp:?}");
        assert!(rendered.contains(&kp.address().to_base58()));
        assert!(!rendered.contains("signing_key"));
    }
}
