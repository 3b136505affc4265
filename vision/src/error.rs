use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VisionError {
    #[error("classifier unreachable: {0}")]
    Unreachable(String),

    #[error("classifier request failed: {0}")]
    RequestFailed(String),

    #[error("classifier returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("invalid classifier response: {0}")]
    InvalidResponse(String),
}
