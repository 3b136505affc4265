//! Gateway errors and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ecobuild_ledger::LedgerError;
use ecobuild_types::TimestampMs;
use ecobuild_verification::RewardError;
use ecobuild_vision::ClassificationVerdict;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid request: {}", .0.join("; "))]
    Invalid(Vec<String>),

    /// A manual claim failed validation. Carries server time for skew
    /// diagnosis.
    #[error("invalid claim: {}", .errors.join("; "))]
    InvalidClaim {
        errors: Vec<String>,
        server_timestamp: TimestampMs,
    },

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("classification failed: {0}")]
    ClassificationFailed(String),

    #[error("verified but minting failed: {detail}")]
    MintFailed {
        detail: String,
        classification: ClassificationVerdict,
        reward_units: u64,
    },

    #[error("conversion failed: {0}")]
    ConversionFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("ledger error: {0}")]
    Ledger(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RpcError {
    pub fn status(&self) -> StatusCode {
        match self {
            RpcError::Invalid(_) | RpcError::InvalidClaim { .. } => StatusCode::BAD_REQUEST,
            RpcError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            RpcError::NotFound(_) => StatusCode::NOT_FOUND,
            RpcError::Config(_)
            | RpcError::ClassificationFailed(_)
            | RpcError::MintFailed { .. }
            | RpcError::ConversionFailed(_)
            | RpcError::Ledger(_)
            | RpcError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a conversion failure. Ledger refusals keep their raw detail.
    pub fn from_conversion(error: RewardError) -> Self {
        match error {
            RewardError::Ledger(e) => RpcError::ConversionFailed(e.to_string()),
            other => other.into(),
        }
    }
}

impl From<LedgerError> for RpcError {
    fn from(e: LedgerError) -> Self {
        if e.is_not_found() {
            RpcError::NotFound(e.to_string())
        } else {
            RpcError::Ledger(e.to_string())
        }
    }
}

impl From<RewardError> for RpcError {
    fn from(e: RewardError) -> Self {
        match e {
            RewardError::Invalid(errors) => RpcError::Invalid(errors),
            RewardError::Unauthenticated(detail) => RpcError::Unauthenticated(detail),
            RewardError::ClassificationFailed(detail) => RpcError::ClassificationFailed(detail),
            RewardError::MintFailed {
                error,
                verdict,
                reward_units,
                ..
            } => RpcError::MintFailed {
                detail: error.to_string(),
                classification: verdict,
                reward_units,
            },
            RewardError::Ledger(e) => e.into(),
            RewardError::Internal(detail) => RpcError::Internal(detail),
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            RpcError::Invalid(errors) => json!({
                "ok": false,
                "error": "Invalid request",
                "errors": errors,
            }),
            RpcError::InvalidClaim {
                errors,
                server_timestamp,
            } => json!({
                "ok": false,
                "errors": errors,
                "serverTimestamp": server_timestamp,
            }),
            RpcError::Unauthenticated(detail) => json!({
                "ok": false,
                "error": "Unauthenticated",
                "detail": detail,
            }),
            RpcError::ClassificationFailed(detail) => json!({
                "ok": false,
                "error": "Classification failed",
                "detail": detail,
            }),
            RpcError::MintFailed {
                detail,
                classification,
                reward_units,
            } => json!({
                "ok": false,
                "verified": true,
                "error": "Verified but minting failed",
                "detail": detail,
                "classification": classification,
                "rewardUnits": reward_units,
            }),
            RpcError::ConversionFailed(detail) => json!({
                "ok": false,
                "error": "Conversion failed",
                "detail": detail,
            }),
            RpcError::NotFound(detail) => json!({
                "ok": false,
                "error": "Not found",
                "detail": detail,
            }),
            RpcError::Ledger(detail) => json!({
                "ok": false,
                "error": "Ledger error",
                "detail": detail,
            }),
            RpcError::Config(detail) | RpcError::Internal(detail) => json!({
                "ok": false,
                "error": "Internal error",
                "detail": detail,
            }),
        };
        (status, Json(body)).into_response()
    }
}
