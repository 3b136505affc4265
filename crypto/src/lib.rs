//! Cryptographic primitives for the EcoBuild verifier.
//!
//! - **SHA-256** for attestation identity, program-address derivation and
//!   instruction discriminators
//! - **Blake2b** for locally generated transaction references
//! - **Ed25519** for the authority keypair and actor-signed requests

pub mod address;
pub mod error;
pub mod hash;
pub mod keys;
pub mod sign;

pub use address::{
    associated_token_address, create_program_address, find_program_address, is_on_curve,
    ASSOCIATED_TOKEN_PROGRAM_ID, SYSTEM_PROGRAM_ID, TOKEN_PROGRAM_ID,
};
pub use error::CryptoError;
pub use hash::{
    account_discriminator, blake2b_256, blake2b_256_multi, instruction_discriminator, sha256,
    sha256_hex,
};
pub use keys::AuthorityKeypair;
pub use sign::verify_signature;
