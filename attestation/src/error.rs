use ecobuild_types::TimestampMs;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AttestationError {
    /// Caller-fixable: every violated rule, in evaluation order.
    #[error("invalid claim: {}", .violations.join("; "))]
    Invalid {
        violations: Vec<String>,
        server_timestamp: TimestampMs,
    },

    #[error("canonical serialization failed: {0}")]
    Serialization(String),
}

impl AttestationError {
    pub fn violations(&self) -> &[String] {
        match self {
            AttestationError::Invalid { violations, .. } => violations,
            AttestationError::Serialization(_) => &[],
        }
    }
}
