//! Scenario tests for the reward pipeline against nullable dependencies.

use ecobuild_attestation::ImageUpload;
use ecobuild_crypto::AuthorityKeypair;
use ecobuild_ledger::{LedgerAdapter, LedgerError};
use ecobuild_nullables::{LedgerCall, NullClassifier, NullClock, NullLedger};
use ecobuild_types::{Address, TimestampMs, WasteType};
use ecobuild_verification::{
    conversion_message, ConversionMode, ConversionRequest, OrchestratorConfig, RewardError,
    RewardOrchestrator, VerificationOutcome, VerificationStage,
};
use ecobuild_vision::{ClassificationVerdict, VisionError};
use std::sync::Arc;
use std::time::Duration;

const NOW: i64 = 1_700_000_000_000;

fn actor() -> Address {
    Address::new([0x42; 32])
}

fn jpeg(bytes: &[u8]) -> Option<ImageUpload> {
    Some(ImageUpload {
        bytes: bytes.to_vec(),
        content_type: Some("image/jpeg".into()),
    })
}

fn verdict(detected: bool, category: WasteType, quantity: f64, confidence: f64) -> ClassificationVerdict {
    ClassificationVerdict {
        detected,
        category,
        estimated_quantity: quantity,
        confidence,
        description: "test".into(),
    }
}

struct Harness {
    classifier: Arc<NullClassifier>,
    ledger: Arc<NullLedger>,
    clock: Arc<NullClock>,
    orchestrator: RewardOrchestrator,
}

fn harness_with(
    classifier: NullClassifier,
    ledger: NullLedger,
    config: OrchestratorConfig,
) -> Harness {
    let classifier = Arc::new(classifier);
    let ledger = Arc::new(ledger);
    let clock = Arc::new(NullClock::new(NOW));
    let orchestrator =
        RewardOrchestrator::new(classifier.clone(), ledger.clone(), clock.clone(), config);
    Harness {
        classifier,
        ledger,
        clock,
        orchestrator,
    }
}

fn harness(classifier: NullClassifier) -> Harness {
    harness_with(classifier, NullLedger::new(), OrchestratorConfig::default())
}

#[tokio::test]
async fn mock_verdict_mints_five_blocks() {
    let h = harness(NullClassifier::new());
    let wallet = actor().to_base58();

    let outcome = h
        .orchestrator
        .verify(Some(&wallet), jpeg(b"plastic bottles"))
        .await
        .unwrap();

    match &outcome {
        VerificationOutcome::Minted {
            reward_units,
            category_code,
            transaction,
            ..
        } => {
            assert_eq!(*reward_units, 5);
            assert_eq!(*category_code, 0);
            assert!(!transaction.as_str().is_empty());
        }
        other => panic!("expected mint, got {other:?}"),
    }
    assert_eq!(outcome.stage(), VerificationStage::Minted);
    assert_eq!(
        h.ledger.calls(),
        vec![LedgerCall::Mint {
            actor: actor(),
            amount: 5,
            category_code: 0
        }]
    );
}

#[tokio::test]
async fn mock_mode_is_stable_across_images() {
    let h = harness(NullClassifier::new());
    let wallet = actor().to_base58();

    let first = h.orchestrator.verify(Some(&wallet), jpeg(b"one")).await.unwrap();
    let second = h.orchestrator.verify(Some(&wallet), jpeg(b"two")).await.unwrap();

    assert_eq!(first.verdict(), second.verdict());
    assert_eq!(first.verdict(), &ClassificationVerdict::mock());
    assert_eq!(h.ledger.mint_count(), 2);
    assert_eq!(
        h.ledger.player_stats(&actor()).await.unwrap().blocks_minted,
        10
    );
}

#[tokio::test]
async fn invalid_input_never_reaches_classifier() {
    let h = harness(NullClassifier::new());

    let err = h.orchestrator.verify(Some("not-base58!"), None).await.unwrap_err();

    match &err {
        RewardError::Invalid(violations) => assert_eq!(violations.len(), 2),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(err.stage(), Some(VerificationStage::Invalid));
    assert_eq!(h.classifier.call_count(), 0);
    assert!(h.ledger.calls().is_empty());
}

#[tokio::test]
async fn oversized_image_is_invalid() {
    let config = OrchestratorConfig {
        max_image_bytes: 4,
        ..OrchestratorConfig::default()
    };
    let h = harness_with(NullClassifier::new(), NullLedger::new(), config);
    let wallet = actor().to_base58();

    assert!(h
        .orchestrator
        .verify(Some(&wallet), jpeg(b"1234"))
        .await
        .is_ok());
    let err = h
        .orchestrator
        .verify(Some(&wallet), jpeg(b"12345"))
        .await
        .unwrap_err();
    assert!(matches!(err, RewardError::Invalid(_)));
    assert_eq!(h.classifier.call_count(), 1);
}

#[tokio::test]
async fn confidence_gate_is_inclusive() {
    let classifier = NullClassifier::new();
    classifier.push(Ok(verdict(true, WasteType::Glass, 2.0, 0.7)));
    classifier.push(Ok(verdict(true, WasteType::Glass, 2.0, 0.699)));
    let h = harness(classifier);
    let wallet = actor().to_base58();

    let accepted = h.orchestrator.verify(Some(&wallet), jpeg(b"a")).await.unwrap();
    assert!(accepted.is_verified());

    let rejected = h.orchestrator.verify(Some(&wallet), jpeg(b"b")).await.unwrap();
    match rejected {
        VerificationOutcome::Rejected { reason, .. } => {
            assert!(reason.contains("0.699"), "{reason}");
            assert!(reason.contains("0.7"), "{reason}");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(h.ledger.mint_count(), 1);
}

#[tokio::test]
async fn nothing_detected_is_a_rejection_not_an_error() {
    let h = harness(NullClassifier::returning(verdict(
        false,
        WasteType::Mixed,
        0.0,
        0.95,
    )));
    let wallet = actor().to_base58();

    let outcome = h.orchestrator.verify(Some(&wallet), jpeg(b"selfie")).await.unwrap();

    assert_eq!(outcome.stage(), VerificationStage::Rejected);
    assert!(!outcome.is_verified());
    assert!(h.ledger.calls().is_empty());
}

#[tokio::test]
async fn classifier_failure_is_distinct_from_rejection() {
    let h = harness(NullClassifier::failing(VisionError::Upstream {
        status: 529,
        body: "overloaded".into(),
    }));
    let wallet = actor().to_base58();

    let err = h.orchestrator.verify(Some(&wallet), jpeg(b"img")).await.unwrap_err();

    match &err {
        RewardError::ClassificationFailed(detail) => assert!(detail.contains("529")),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(err.stage(), Some(VerificationStage::ClassificationFailed));
    assert!(h.ledger.calls().is_empty());
}

#[tokio::test]
async fn slow_classifier_times_out() {
    let config = OrchestratorConfig {
        classifier_timeout: Duration::from_millis(20),
        ..OrchestratorConfig::default()
    };
    let h = harness_with(
        NullClassifier::new().with_delay(Duration::from_millis(500)),
        NullLedger::new(),
        config,
    );
    let wallet = actor().to_base58();

    let err = h.orchestrator.verify(Some(&wallet), jpeg(b"img")).await.unwrap_err();

    match err {
        RewardError::ClassificationFailed(detail) => assert!(detail.contains("timed out")),
        other => panic!("unexpected {other:?}"),
    }
    assert!(h.ledger.calls().is_empty());
}

#[tokio::test]
async fn mint_failure_keeps_the_verdict() {
    let ledger = NullLedger::new();
    ledger.fail_next_mint(LedgerError::Unauthorized("ConstraintHasOne".into()));
    let h = harness_with(NullClassifier::new(), ledger, OrchestratorConfig::default());
    let wallet = actor().to_base58();

    let err = h.orchestrator.verify(Some(&wallet), jpeg(b"img")).await.unwrap_err();

    assert_eq!(err.stage(), Some(VerificationStage::MintFailed));
    match err {
        RewardError::MintFailed {
            error,
            verdict,
            reward_units,
            ..
        } => {
            assert!(matches!(error, LedgerError::Unauthorized(_)));
            assert_eq!(verdict, ClassificationVerdict::mock());
            assert_eq!(reward_units, 5);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn slow_ledger_is_reported_as_mint_failure() {
    let config = OrchestratorConfig {
        ledger_timeout: Duration::from_millis(20),
        ..OrchestratorConfig::default()
    };
    let h = harness_with(
        NullClassifier::new(),
        NullLedger::new().with_delay(Duration::from_millis(500)),
        config,
    );
    let wallet = actor().to_base58();

    let err = h.orchestrator.verify(Some(&wallet), jpeg(b"img")).await.unwrap_err();

    match err {
        RewardError::MintFailed {
            error: LedgerError::Unreachable(detail),
            ..
        } => assert!(detail.contains("timed out")),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn rejected_outcomes_still_carry_an_attestation_id() {
    let classifier = NullClassifier::new();
    classifier.push(Ok(verdict(true, WasteType::Paper, 3.0, 0.1)));
    classifier.push(Ok(verdict(true, WasteType::Paper, 3.0, 0.1)));
    let h = harness(classifier);
    let wallet = actor().to_base58();

    let first = h.orchestrator.verify(Some(&wallet), jpeg(b"same")).await.unwrap();
    let second = h.orchestrator.verify(Some(&wallet), jpeg(b"same")).await.unwrap();
    assert_eq!(first.attestation_id(), second.attestation_id());

    h.clock.advance(1);
    h.classifier.push(Ok(verdict(true, WasteType::Paper, 3.0, 0.1)));
    let later = h.orchestrator.verify(Some(&wallet), jpeg(b"same")).await.unwrap();
    assert_ne!(first.attestation_id(), later.attestation_id());
}

#[tokio::test]
async fn authority_conversion_exhausts_balance() {
    let h = harness(NullClassifier::returning(verdict(
        true,
        WasteType::Metal,
        10.0,
        0.9,
    )));
    let authority = h.orchestrator.authority().to_base58();
    h.orchestrator
        .verify(Some(&authority), jpeg(b"cans"))
        .await
        .unwrap();

    let receipt = h.orchestrator.convert(None).await.unwrap();
    assert_eq!(receipt.blocks_converted, 10);
    assert_eq!(receipt.bricks_received, 1);

    let err = h.orchestrator.convert(None).await.unwrap_err();
    assert!(matches!(
        err,
        RewardError::Ledger(LedgerError::InsufficientBalance(_))
    ));
    assert_eq!(err.stage(), None);
}

#[tokio::test]
async fn actor_conversion_requires_a_valid_signature() {
    let config = OrchestratorConfig {
        conversion_mode: ConversionMode::Actor,
        ..OrchestratorConfig::default()
    };
    let h = harness_with(
        NullClassifier::returning(verdict(true, WasteType::Plastic, 12.0, 0.9)),
        NullLedger::new(),
        config,
    );
    let keypair = AuthorityKeypair::from_seed(&[9; 32]);
    let wallet = keypair.address();
    h.orchestrator
        .verify(Some(&wallet.to_base58()), jpeg(b"bags"))
        .await
        .unwrap();

    assert!(matches!(
        h.orchestrator.convert(None).await,
        Err(RewardError::Invalid(_))
    ));

    let ts = TimestampMs::new(NOW);
    let forged = ConversionRequest {
        player_wallet: Some(wallet.to_base58()),
        timestamp: Some(NOW),
        signature: Some(
            bs58::encode(AuthorityKeypair::from_seed(&[1; 32]).sign(b"other")).into_string(),
        ),
    };
    assert!(matches!(
        h.orchestrator.convert(Some(&forged)).await,
        Err(RewardError::Unauthenticated(_))
    ));

    let signed = ConversionRequest {
        signature: Some(
            bs58::encode(keypair.sign(conversion_message(&wallet, ts).as_bytes())).into_string(),
        ),
        ..forged
    };
    let receipt = h.orchestrator.convert(Some(&signed)).await.unwrap();
    assert_eq!(receipt.blocks_converted, 10);
    assert_eq!(
        h.ledger.calls().last(),
        Some(&LedgerCall::Convert { owner: wallet })
    );
    assert_eq!(
        h.orchestrator
            .player_stats(&wallet)
            .await
            .unwrap()
            .current_block_balance,
        2
    );
}

#[tokio::test]
async fn stats_distinguish_missing_profiles() {
    let h = harness(NullClassifier::new());

    let err = h.orchestrator.player_stats(&actor()).await.unwrap_err();
    assert!(matches!(err, RewardError::Ledger(ref e) if e.is_not_found()));

    let global = h.orchestrator.global_stats().await.unwrap();
    assert_eq!(global.total_blocks_minted, 0);
}

#[tokio::test]
async fn uninitialized_ledger_reports_not_found() {
    let h = harness_with(
        NullClassifier::new(),
        NullLedger::uninitialized(),
        OrchestratorConfig::default(),
    );
    let err = h.orchestrator.global_stats().await.unwrap_err();
    assert!(matches!(err, RewardError::Ledger(ref e) if e.is_not_found()));
}

#[test]
fn attest_uses_injected_clock() {
    let h = harness(NullClassifier::new());
    let claim = serde_json::json!({
        "playerPubkey": "  Alice ",
        "materialType": "GLASS",
        "quantity": "2.5",
        "zoneId": "zone-1",
        "photoHash": "abc",
        "gps": { "lat": 1.0, "lon": 2.0 },
        "timestamp": NOW - 600_000,
    });

    let ok = h.orchestrator.attest(&claim).unwrap();
    assert_eq!(ok.server_timestamp, TimestampMs::new(NOW));

    h.clock.advance(1);
    let err = h.orchestrator.attest(&claim).unwrap_err();
    assert_eq!(err.violations().len(), 1);
}

#[tokio::test]
async fn conversion_signatures_expire_before_claims_do() {
    let config = OrchestratorConfig {
        conversion_mode: ConversionMode::Actor,
        ..OrchestratorConfig::default()
    };
    let h = harness_with(NullClassifier::new(), NullLedger::new(), config);
    let keypair = AuthorityKeypair::from_seed(&[9; 32]);
    let wallet = keypair.address();
    let signed_at = |ts: i64| ConversionRequest {
        player_wallet: Some(wallet.to_base58()),
        timestamp: Some(ts),
        signature: Some(
            bs58::encode(keypair.sign(conversion_message(&wallet, TimestampMs::new(ts)).as_bytes()))
                .into_string(),
        ),
    };

    // Inside the 10-minute claim window but outside the conversion window.
    assert!(matches!(
        h.orchestrator.authenticate_conversion(&signed_at(NOW - 120_000)),
        Err(RewardError::Unauthenticated(_))
    ));
    assert_eq!(
        h.orchestrator
            .authenticate_conversion(&signed_at(NOW - 60_000))
            .unwrap(),
        wallet
    );
}
