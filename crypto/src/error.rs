use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid seeds: {0}")]
    InvalidSeeds(String),

    #[error("derived address lies on the ed25519 curve")]
    OnCurve,

    #[error("no bump produces an off-curve address")]
    NoViableBump,

    #[error("invalid keypair: {0}")]
    InvalidKeypair(String),

    #[error("failed to read keypair file {path}: {reason}")]
    KeypairFile { path: String, reason: String },
}
