//! Ledger account address (base58-encoded 32-byte public key).

use crate::TypeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A ledger account address.
///
/// Wallets, program ids and derived accounts all share this shape: 32 raw
/// bytes, displayed as base58 (43 or 44 characters).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 32]);

impl Address {
    /// Length of the raw address in bytes.
    pub const LEN: usize = 32;

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a base58 address, rejecting anything that does not decode to
    /// exactly 32 bytes.
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TypeError::InvalidAddress("empty address".into()));
        }
        let decoded = bs58::decode(trimmed)
            .into_vec()
            .map_err(|e| TypeError::InvalidAddress(format!("{trimmed}: {e}")))?;
        let bytes: [u8; 32] = decoded.try_into().map_err(|v: Vec<u8>| {
            TypeError::InvalidAddress(format!("{trimmed}: decodes to {} bytes", v.len()))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_base58())
    }
}

impl FromStr for Address {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_program_id() {
        let addr = Address::parse("HcENn31gno9LMse5iERziSpLGjMdtLZAxLQo9Ff4xn5b").unwrap();
        assert_eq!(
            addr.to_base58(),
            "HcENn31gno9LMse5iERziSpLGjMdtLZAxLQo9Ff4xn5b"
        );
    }

    #[test]
    fn display_roundtrips_through_parse() {
        let addr = Address::new([9u8; 32]);
        let parsed: Address = addr.to_string().parse().unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn rejects_wrong_length() {
        let short = bs58::encode([1u8; 31]).into_string();
        assert!(matches!(
            Address::parse(&short),
            Err(TypeError::InvalidAddress(_))
        ));
    }

    #[test]
    fn rejects_non_base58_characters() {
        // '0', 'O', 'I' and 'l' are outside the base58 alphabet.
        assert!(Address::parse("0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OI").is_err());
        assert!(Address::parse("").is_err());
        assert!(Address::parse("   ").is_err());
    }

    #[test]
    fn serde_uses_base58_string() {
        let addr = Address::new([3u8; 32]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.to_base58()));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
