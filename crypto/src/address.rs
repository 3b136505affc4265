//! Program-derived account addresses.
//!
//! A derived address is `sha256(seeds ‖ bump ‖ program_id ‖ "ProgramDerivedAddress")`
//! for the highest `bump` (255 downward) whose digest is *not* a valid Ed25519
//! point, so no private key can ever sign for it.
//!
//! The same actor and seeds always derive the same account.

use crate::CryptoError;
use ecobuild_types::Address;
use ed25519_dalek::VerifyingKey;
use sha2::{Digest, Sha256};

/// The system program (all zero bytes).
pub const SYSTEM_PROGRAM_ID: Address = Address::new([0u8; 32]);

/// SPL token program (`TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`).
pub const TOKEN_PROGRAM_ID: Address = Address::new([
    6, 221, 246, 225, 215, 101, 161, 147, 217, 203, 225, 70, 206, 235, 121, 172, 28, 180, 133,
    237, 95, 91, 55, 145, 58, 140, 245, 133, 126, 255, 0, 169,
]);

/// Associated token account program (`ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL`).
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Address = Address::new([
    140, 151, 37, 143, 78, 36, 137, 241, 187, 61, 16, 41, 20, 142, 13, 131, 11, 90, 19, 153,
    218, 255, 16, 132, 4, 142, 123, 216, 219, 233, 248, 89,
]);

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";
const MAX_SEEDS: usize = 16;
const MAX_SEED_LEN: usize = 32;

/// Whether `bytes` decompress to a point on the Ed25519 curve.
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    VerifyingKey::from_bytes(bytes).is_ok()
}

/// Derive the address for an explicit seed list (bump included).
///
/// Fails when the digest lands on the curve or the seeds are out of bounds.
pub fn create_program_address(seeds: &[&[u8]], program_id: &Address) -> Result<Address, CryptoError> {
    if seeds.len() > MAX_SEEDS {
        return Err(CryptoError::InvalidSeeds(format!(
            "{} seeds, at most {MAX_SEEDS} allowed",
            seeds.len()
        )));
    }
    if let Some(seed) = seeds.iter().find(|s| s.len() > MAX_SEED_LEN) {
        return Err(CryptoError::InvalidSeeds(format!(
            "seed of {} bytes exceeds {MAX_SEED_LEN}",
            seed.len()
        )));
    }

    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(program_id.as_bytes());
    hasher.update(PDA_MARKER);
    let digest: [u8; 32] = hasher.finalize().into();

    if is_on_curve(&digest) {
        return Err(CryptoError::OnCurve);
    }
    Ok(Address::new(digest))
}

/// Find the canonical derived address and its bump for `seeds`.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &Address,
) -> Result<(Address, u8), CryptoError> {
    if seeds.len() >= MAX_SEEDS {
        return Err(CryptoError::InvalidSeeds(format!(
            "{} seeds leaves no room for the bump",
            seeds.len()
        )));
    }
    for bump in (0..=u8::MAX).rev() {
        let bump_seed = [bump];
        let mut with_bump: Vec<&[u8]> = seeds.to_vec();
        with_bump.push(&bump_seed);
        match create_program_address(&with_bump, program_id) {
            Ok(address) => return Ok((address, bump)),
            Err(CryptoError::OnCurve) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(CryptoError::NoViableBump)
}

/// Token account holding `mint` tokens for `wallet`.
pub fn associated_token_address(wallet: &Address, mint: &Address) -> Result<Address, CryptoError> {
    find_program_address(
        &[
            wallet.as_bytes(),
            TOKEN_PROGRAM_ID.as_bytes(),
            mint.as_bytes(),
        ],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .map(|(address, _)| address)
}
