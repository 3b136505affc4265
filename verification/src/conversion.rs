//! Conversion authentication.
//!
//! In `authority` mode the service converts the authority's own balance and
//! no caller proof is taken. In `actor` mode the caller signs
//! `ecobuild:convert:<player_wallet>:<timestamp>` with the wallet's key; the
//! signature is base58 and the timestamp must sit within the conversion
//! window of server time.
//!
//! No nonce is tracked: a captured signed request can be replayed until its
//! timestamp leaves the window, and each replay converts another brick's
//! worth of the signer's balance. The window is therefore kept much shorter
//! than the claim window ([`DEFAULT_CONVERSION_WINDOW_MS`]).

use crate::RewardError;
use ecobuild_crypto::verify_signature;
use ecobuild_types::{Address, TimestampMs};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Allowed skew for conversion signatures.
pub const DEFAULT_CONVERSION_WINDOW_MS: u64 = 60_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionMode {
    #[default]
    Authority,
    Actor,
}

impl ConversionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionMode::Authority => "authority",
            ConversionMode::Actor => "actor",
        }
    }
}

impl fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "authority" => Ok(ConversionMode::Authority),
            "actor" => Ok(ConversionMode::Actor),
            other => Err(format!(
                "unknown conversion mode '{other}' (expected authority or actor)"
            )),
        }
    }
}

/// Body of an actor-signed conversion.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConversionRequest {
    pub player_wallet: Option<String>,
    pub timestamp: Option<i64>,
    pub signature: Option<String>,
}

/// The exact bytes an actor signs to authorise a conversion.
pub fn conversion_message(wallet: &Address, timestamp: TimestampMs) -> String {
    format!("ecobuild:convert:{}:{}", wallet, timestamp.as_millis())
}

/// Check a conversion request and return the authenticated owner.
///
/// Malformed fields are reported together as [`RewardError::Invalid`]; a
/// stale timestamp or a signature that does not verify is
/// [`RewardError::Unauthenticated`].
pub fn authenticate(
    request: &ConversionRequest,
    now: TimestampMs,
    window_ms: u64,
) -> Result<Address, RewardError> {
    let mut violations = Vec::new();

    let wallet = match request.player_wallet.as_deref().map(str::trim) {
        None | Some("") => {
            violations.push("player_wallet is required".to_string());
            None
        }
        Some(raw) => match Address::parse(raw) {
            Ok(address) => Some(address),
            Err(_) => {
                violations.push(format!("player_wallet is not a valid address (got '{raw}')"));
                None
            }
        },
    };

    let timestamp = match request.timestamp {
        Some(ms) => Some(TimestampMs::new(ms)),
        None => {
            violations.push("timestamp is required".to_string());
            None
        }
    };

    let signature = match request.signature.as_deref().map(str::trim) {
        None | Some("") => {
            violations.push("signature is required".to_string());
            None
        }
        Some(raw) => match decode_signature(raw) {
            Some(sig) => Some(sig),
            None => {
                violations.push("signature must be 64 base58-encoded bytes".to_string());
                None
            }
        },
    };

    let (Some(wallet), Some(timestamp), Some(signature)) = (wallet, timestamp, signature) else {
        return Err(RewardError::Invalid(violations));
    };

    if now.abs_diff(timestamp) > window_ms {
        return Err(RewardError::Unauthenticated(format!(
            "timestamp must be within {window_ms}ms of server time"
        )));
    }

    let message = conversion_message(&wallet, timestamp);
    if !verify_signature(message.as_bytes(), &signature, &wallet) {
        return Err(RewardError::Unauthenticated(
            "signature does not match player_wallet".to_string(),
        ));
    }

    Ok(wallet)
}

fn decode_signature(raw: &str) -> Option<[u8; 64]> {
    let bytes = bs58::decode(raw).into_vec().ok()?;
    bytes.try_into().ok()
}
