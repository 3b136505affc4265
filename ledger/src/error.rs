use ecobuild_crypto::CryptoError;
use thiserror::Error;

/// Ledger refusals and transport failures.
///
/// Refusals carry the raw ledger detail (message plus program logs) so an
/// operator can diagnose them without re-running the call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("arithmetic overflow: {0}")]
    Overflow(String),

    #[error("account not found: {0}")]
    NotFound(String),

    #[error("ledger rejected the transaction: {0}")]
    Rejected(String),

    #[error("ledger unreachable: {0}")]
    Unreachable(String),

    #[error("invalid ledger response: {0}")]
    InvalidResponse(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl LedgerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound(_))
    }

    /// Classify a refusal by the markers the ledger program and runtime
    /// put in error messages and logs.
    pub fn classify(message: &str, logs: &[String]) -> Self {
        let detail = if logs.is_empty() {
            message.to_string()
        } else {
            format!("{message} | logs: {}", logs.join(" | "))
        };
        let haystack = detail.to_ascii_lowercase();
        let has = |marker: &str| haystack.contains(marker);

        if has("insufficientblocks") || has("insufficient funds") || has("insufficient balance") {
            LedgerError::InsufficientBalance(detail)
        } else if has("unauthorized")
            || has("constrainthasone")
            || has("missing required signature")
            || has("signature verification failed")
        {
            LedgerError::Unauthorized(detail)
        } else if has("overflow") {
            LedgerError::Overflow(detail)
        } else if has("accountnotinitialized")
            || has("accountnotfound")
            || has("could not find account")
        {
            LedgerError::NotFound(detail)
        } else {
            LedgerError::Rejected(detail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_program_errors_from_logs() {
        let logs = vec![
            "Program log: Instruction: ConvertToBrick".to_string(),
            "Program log: AnchorError occurred. Error Code: InsufficientBlocks. Error Number: 6001."
                .to_string(),
        ];
        let err = LedgerError::classify(
            "Transaction simulation failed: Error processing Instruction 0: custom program error: 0x1771",
            &logs,
        );
        match err {
            LedgerError::InsufficientBalance(detail) => {
                assert!(detail.contains("custom program error"));
                assert!(detail.contains("InsufficientBlocks"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn classifies_runtime_errors() {
        assert!(matches!(
            LedgerError::classify("Error Code: Unauthorized", &[]),
            LedgerError::Unauthorized(_)
        ));
        assert!(matches!(
            LedgerError::classify("Error Code: Overflow", &[]),
            LedgerError::Overflow(_)
        ));
        assert!(matches!(
            LedgerError::classify("AccountNotInitialized", &[]),
            LedgerError::NotFound(_)
        ));
        assert!(matches!(
            LedgerError::classify("Blockhash not found", &[]),
            LedgerError::Rejected(_)
        ));
    }
}
