//! SHA-256 and Blake2b helpers.

use blake2::digest::consts::U32;
use blake2::Blake2b;
use sha2::{Digest, Sha256};

type Blake2b256 = Blake2b<U32>;

/// Compute SHA-256 of arbitrary data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 of `data` as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Eight-byte instruction selector: `sha256("global:<name>")[..8]`.
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    let digest = sha256(format!("global:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

/// Eight-byte account type tag: `sha256("account:<Name>")[..8]`.
pub fn account_discriminator(name: &str) -> [u8; 8] {
    let digest = sha256(format!("account:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn blake2b_deterministic() {
        let h1 = blake2b_256(b"hello ecobuild");
        let h2 = blake2b_256(b"hello ecobuild");
        assert_eq!(h1, h2);
        assert_ne!(h1, blake2b_256(b"hello world"));
    }

    #[test]
    fn blake2b_multi_equivalent() {
        let single = blake2b_256(b"helloworld");
        let multi = blake2b_256_multi(&[b"hello", b"world"]);
        assert_eq!(single, multi);
    }

    #[test]
    fn discriminators_differ_per_instruction() {
        let mint = instruction_discriminator("mint_blocks");
        let convert = instruction_discriminator("convert_to_brick");
        assert_ne!(mint, convert);
        assert_eq!(&mint[..], &sha256(b"global:mint_blocks")[..8]);
    }

    #[test]
    fn account_tags_use_their_own_namespace() {
        assert_ne!(
            account_discriminator("PlayerProfile"),
            instruction_discriminator("PlayerProfile")
        );
        assert_eq!(
            &account_discriminator("GlobalConfig")[..],
            &sha256(b"account:GlobalConfig")[..8]
        );
    }
}
