//! Reward orchestration.
//!
//! Pipeline for the image surface:
//! `Received → Validated → Classified → {Rejected | Accepted} → {Minted | MintFailed}`.
//!
//! - [`RewardPolicy`] gates verdicts on detection and a fixed confidence
//!   threshold and sizes the reward.
//! - [`RewardOrchestrator`] drives one request through the pipeline against
//!   a [`Classifier`](ecobuild_vision::Classifier) and a
//!   [`LedgerAdapter`](ecobuild_ledger::LedgerAdapter) supplied at
//!   construction, and handles conversion and stats reads.
//! - [`conversion`] authenticates actor-signed conversions.

pub mod conversion;
pub mod error;
pub mod orchestrator;
pub mod outcomes;
pub mod policy;
pub mod state;

pub use conversion::{
    conversion_message, ConversionMode, ConversionRequest, DEFAULT_CONVERSION_WINDOW_MS,
};
pub use error::RewardError;
pub use orchestrator::{
    LedgerOp, OrchestratorConfig, PipelineObserver, RewardOrchestrator, DEFAULT_CLASSIFIER_TIMEOUT,
    DEFAULT_LEDGER_TIMEOUT, DEFAULT_MAX_IMAGE_BYTES,
};
pub use outcomes::VerificationOutcome;
pub use policy::{reward_units, RewardDecision, RewardPolicy, DEFAULT_MIN_CONFIDENCE};
pub use state::{StageTracker, VerificationStage};
