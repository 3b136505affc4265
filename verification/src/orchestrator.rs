//! Reward orchestrator: validate, classify, decide, mint.
//!
//! The orchestrator holds no mutable state of its own. Balances live in the
//! ledger; the threshold, window and timeouts are fixed at construction.
//! The only suspension points are the classifier call and the ledger calls,
//! each bounded by its own timeout. Minting is always the last step and is
//! never retried here.

use crate::conversion::{self, ConversionMode, ConversionRequest, DEFAULT_CONVERSION_WINDOW_MS};
use crate::outcomes::VerificationOutcome;
use crate::policy::{reward_units, RewardDecision, RewardPolicy, DEFAULT_MIN_CONFIDENCE};
use crate::state::{StageTracker, VerificationStage};
use crate::RewardError;

use ecobuild_attestation::{
    validate_upload, AttestationError, AttestationValidator, ImageUpload, ValidatedAttestation,
    VerifiedImageClaim, DEFAULT_WINDOW_MS,
};
use ecobuild_ledger::{
    ConversionReceipt, GlobalStats, LedgerAccounts, LedgerAdapter, LedgerError, LedgerMode,
    PlayerStats,
};
use ecobuild_types::{Address, Clock, TimestampMs};
use ecobuild_vision::{ClassificationVerdict, Classifier, ClassifierMode};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_LEDGER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    pub min_confidence: f64,
    pub window_ms: u64,
    pub max_image_bytes: usize,
    pub classifier_timeout: Duration,
    pub ledger_timeout: Duration,
    pub conversion_mode: ConversionMode,
    /// Skew allowed on signed conversion requests.
    pub conversion_window_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            window_ms: DEFAULT_WINDOW_MS,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            classifier_timeout: DEFAULT_CLASSIFIER_TIMEOUT,
            ledger_timeout: DEFAULT_LEDGER_TIMEOUT,
            conversion_mode: ConversionMode::Authority,
            conversion_window_ms: DEFAULT_CONVERSION_WINDOW_MS,
        }
    }
}

/// Ledger operation names as reported to a [`PipelineObserver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerOp {
    Mint,
    Convert,
    PlayerStats,
    GlobalStats,
}

impl LedgerOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerOp::Mint => "mint",
            LedgerOp::Convert => "convert",
            LedgerOp::PlayerStats => "player_stats",
            LedgerOp::GlobalStats => "global_stats",
        }
    }
}

/// Hooks for instrumenting the two external dependencies.
pub trait PipelineObserver: Send + Sync {
    fn classification(&self, _mode: ClassifierMode, _elapsed: Duration, _ok: bool) {}
    fn ledger_call(&self, _op: LedgerOp, _elapsed: Duration, _ok: bool) {}
}

struct NoopObserver;

impl PipelineObserver for NoopObserver {}

pub struct RewardOrchestrator {
    classifier: Arc<dyn Classifier>,
    ledger: Arc<dyn LedgerAdapter>,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn PipelineObserver>,
    policy: RewardPolicy,
    validator: AttestationValidator,
    config: OrchestratorConfig,
}

impl RewardOrchestrator {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        ledger: Arc<dyn LedgerAdapter>,
        clock: Arc<dyn Clock>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            classifier,
            ledger,
            clock,
            observer: Arc::new(NoopObserver),
            policy: RewardPolicy::new(config.min_confidence),
            validator: AttestationValidator::new(config.window_ms),
            config,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn classifier_mode(&self) -> ClassifierMode {
        self.classifier.mode()
    }

    pub fn ledger_mode(&self) -> LedgerMode {
        self.ledger.mode()
    }

    pub fn ledger_accounts(&self) -> &LedgerAccounts {
        self.ledger.accounts()
    }

    pub fn authority(&self) -> Address {
        self.ledger.authority()
    }

    pub fn conversion_mode(&self) -> ConversionMode {
        self.config.conversion_mode
    }

    pub fn now(&self) -> TimestampMs {
        self.clock.now()
    }

    /// Run one image through the pipeline.
    ///
    /// Returns an outcome for both acceptance and rejection. Errors are the
    /// terminal failure stages: invalid input, a classifier that could not
    /// assess the image, or a ledger that did not mint.
    pub async fn verify(
        &self,
        player_wallet: Option<&str>,
        image: Option<ImageUpload>,
    ) -> Result<VerificationOutcome, RewardError> {
        let mut stage = StageTracker::new();
        let result = self.run_verification(&mut stage, player_wallet, image).await;
        let reported = match &result {
            Ok(outcome) => Some(outcome.stage()),
            Err(e) => e.stage(),
        };
        if let Some(reported) = reported {
            debug_assert!(reported.is_terminal(), "{reported} is not terminal");
            debug_assert_eq!(reported, stage.current());
        }
        result
    }

    async fn run_verification(
        &self,
        stage: &mut StageTracker,
        player_wallet: Option<&str>,
        image: Option<ImageUpload>,
    ) -> Result<VerificationOutcome, RewardError> {
        let received_at = self.clock.now();
        let request = match validate_upload(player_wallet, image, self.config.max_image_bytes) {
            Ok(request) => request,
            Err(violations) => {
                stage.advance(VerificationStage::Invalid);
                warn!(
                    stage = %stage.current(),
                    errors = ?violations,
                    "verification request rejected"
                );
                return Err(RewardError::Invalid(violations));
            }
        };
        let actor = request.actor;
        stage.advance(VerificationStage::Validated);
        debug!(
            stage = %stage.current(),
            actor = %actor,
            bytes = request.image.len(),
            media_type = %request.media_type,
            "upload validated"
        );

        let verdict = self
            .classify(stage, &request.image, &request.media_type, &actor)
            .await?;
        let decision = self.policy.decide(&verdict);

        let units = match &decision {
            RewardDecision::Accepted { reward_units, .. } => *reward_units,
            RewardDecision::Rejected { .. } => reward_units(verdict.estimated_quantity),
        };
        let attestation_id = VerifiedImageClaim {
            actor,
            category: verdict.category,
            reward_units: units,
            image_digest: request.image_digest(),
            timestamp: received_at,
        }
        .attestation_id()?;

        let (reward_units, category_code) = match decision {
            RewardDecision::Rejected { reason } => {
                stage.advance(VerificationStage::Rejected);
                info!(
                    stage = %stage.current(),
                    actor = %actor,
                    attestation_id = %attestation_id,
                    confidence = verdict.confidence,
                    reason = %reason,
                    "verification rejected"
                );
                return Ok(VerificationOutcome::Rejected {
                    actor,
                    verdict,
                    reason,
                    attestation_id,
                });
            }
            RewardDecision::Accepted {
                reward_units,
                category_code,
            } => (reward_units, category_code),
        };
        stage.advance(VerificationStage::Accepted);
        debug!(
            stage = %stage.current(),
            actor = %actor,
            attestation_id = %attestation_id,
            reward_units,
            category_code,
            "reward accepted"
        );

        let minted = self
            .ledger_call(LedgerOp::Mint, self.ledger.mint(&actor, reward_units, category_code))
            .await;
        match minted {
            Ok(transaction) => {
                stage.advance(VerificationStage::Minted);
                info!(
                    stage = %stage.current(),
                    actor = %actor,
                    attestation_id = %attestation_id,
                    reward_units,
                    transaction = %transaction,
                    "blocks minted"
                );
                Ok(VerificationOutcome::Minted {
                    actor,
                    verdict,
                    reward_units,
                    category_code,
                    transaction,
                    attestation_id,
                })
            }
            Err(error) => {
                stage.advance(VerificationStage::MintFailed);
                warn!(
                    stage = %stage.current(),
                    actor = %actor,
                    attestation_id = %attestation_id,
                    reward_units,
                    error = %error,
                    "verified but minting failed"
                );
                Err(RewardError::MintFailed {
                    error,
                    verdict,
                    reward_units,
                    attestation_id,
                })
            }
        }
    }

    /// Validate a manual claim. No ledger interaction.
    pub fn attest(&self, raw: &Value) -> Result<ValidatedAttestation, AttestationError> {
        let result = self.validator.validate(raw, self.clock.now());
        match &result {
            Ok(validated) => info!(
                actor = %validated.claim.player_pubkey,
                attestation_id = %validated.attestation_id,
                "attestation accepted"
            ),
            Err(e) => warn!(errors = ?e.violations(), "attestation rejected"),
        }
        result
    }

    /// Convert according to the configured mode.
    ///
    /// Authority mode ignores `request` and converts the authority's own
    /// balance. Actor mode requires a signed request.
    pub async fn convert(
        &self,
        request: Option<&ConversionRequest>,
    ) -> Result<ConversionReceipt, RewardError> {
        let owner = match self.config.conversion_mode {
            ConversionMode::Authority => self.ledger.authority(),
            ConversionMode::Actor => {
                let request = request.ok_or_else(|| {
                    RewardError::Invalid(vec!["request body is required".to_string()])
                })?;
                self.authenticate_conversion(request)?
            }
        };
        self.convert_for(&owner).await
    }

    pub fn authenticate_conversion(
        &self,
        request: &ConversionRequest,
    ) -> Result<Address, RewardError> {
        conversion::authenticate(request, self.clock.now(), self.config.conversion_window_ms)
    }

    /// Convert `owner`'s blocks. The ledger alone decides whether the
    /// balance suffices.
    pub async fn convert_for(&self, owner: &Address) -> Result<ConversionReceipt, RewardError> {
        match self
            .ledger_call(LedgerOp::Convert, self.ledger.convert(owner))
            .await
        {
            Ok(receipt) => {
                info!(
                    owner = %owner,
                    transaction = %receipt.transaction,
                    blocks_converted = receipt.blocks_converted,
                    "blocks converted"
                );
                Ok(receipt)
            }
            Err(error) => {
                warn!(owner = %owner, error = %error, "conversion failed");
                Err(error.into())
            }
        }
    }

    pub async fn player_stats(&self, actor: &Address) -> Result<PlayerStats, RewardError> {
        Ok(self
            .ledger_call(LedgerOp::PlayerStats, self.ledger.player_stats(actor))
            .await?)
    }

    pub async fn global_stats(&self) -> Result<GlobalStats, RewardError> {
        Ok(self
            .ledger_call(LedgerOp::GlobalStats, self.ledger.global_stats())
            .await?)
    }

    async fn classify(
        &self,
        stage: &mut StageTracker,
        image: &[u8],
        media_type: &str,
        actor: &Address,
    ) -> Result<ClassificationVerdict, RewardError> {
        let mode = self.classifier.mode();
        let started = Instant::now();
        let result = tokio::time::timeout(
            self.config.classifier_timeout,
            self.classifier.classify(image, media_type),
        )
        .await;
        let result = match result {
            Ok(inner) => inner.map_err(RewardError::from),
            Err(_) => Err(RewardError::ClassificationFailed(format!(
                "classifier timed out after {}ms",
                self.config.classifier_timeout.as_millis()
            ))),
        };
        self.observer
            .classification(mode, started.elapsed(), result.is_ok());

        match &result {
            Ok(verdict) => {
                stage.advance(VerificationStage::Classified);
                if mode == ClassifierMode::Mock {
                    info!(actor = %actor, "mock classification returned");
                }
                debug!(
                    stage = %stage.current(),
                    actor = %actor,
                    mode = %mode,
                    detected = verdict.detected,
                    category = %verdict.category,
                    confidence = verdict.confidence,
                    "image classified"
                );
            }
            Err(e) => {
                stage.advance(VerificationStage::ClassificationFailed);
                warn!(
                    stage = %stage.current(),
                    actor = %actor,
                    mode = %mode,
                    error = %e,
                    "classification failed"
                );
            }
        }
        result
    }

    async fn ledger_call<T>(
        &self,
        op: LedgerOp,
        call: impl Future<Output = Result<T, LedgerError>>,
    ) -> Result<T, LedgerError> {
        let started = Instant::now();
        let result = match tokio::time::timeout(self.config.ledger_timeout, call).await {
            Ok(inner) => inner,
            Err(_) => Err(LedgerError::Unreachable(format!(
                "ledger {} timed out after {}ms",
                op.as_str(),
                self.config.ledger_timeout.as_millis()
            ))),
        };
        // A missing account is an answer, not a failed call.
        let ok = match &result {
            Ok(_) => true,
            Err(e) => e.is_not_found(),
        };
        self.observer.ledger_call(op, started.elapsed(), ok);
        result
    }
}
