//! Prometheus metrics for the gateway.
//!
//! [`GatewayMetrics`] owns a dedicated [`Registry`] that `/metrics` encodes
//! into the text exposition format. It also observes the orchestrator's
//! classifier and ledger calls.

use crate::RpcError;
use ecobuild_verification::{LedgerOp, PipelineObserver};
use ecobuild_vision::ClassifierMode;
use prometheus::{
    register_histogram_vec_with_registry, register_histogram_with_registry,
    register_int_counter_vec_with_registry, Encoder, Histogram, HistogramOpts, HistogramVec,
    IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

pub struct GatewayMetrics {
    pub registry: Registry,

    /// `/verify` outcomes, labelled by terminal stage.
    pub verify_requests: IntCounterVec,
    /// `/attest` outcomes: `accepted` or `invalid`.
    pub attest_requests: IntCounterVec,
    /// Classifier calls by mode (`mock` | `live`).
    pub classifications: IntCounterVec,
    /// Ledger calls by operation and result.
    pub ledger_calls: IntCounterVec,

    pub classification_latency_ms: Histogram,
    pub ledger_latency_ms: HistogramVec,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let verify_requests = register_int_counter_vec_with_registry!(
            Opts::new(
                "ecobuild_verify_requests_total",
                "Image verification requests by outcome"
            ),
            &["outcome"],
            registry
        )
        .expect("failed to register verify_requests counter");

        let attest_requests = register_int_counter_vec_with_registry!(
            Opts::new(
                "ecobuild_attest_requests_total",
                "Manual attestation requests by outcome"
            ),
            &["outcome"],
            registry
        )
        .expect("failed to register attest_requests counter");

        let classifications = register_int_counter_vec_with_registry!(
            Opts::new(
                "ecobuild_classifications_total",
                "Classifier calls by mode"
            ),
            &["mode"],
            registry
        )
        .expect("failed to register classifications counter");

        let ledger_calls = register_int_counter_vec_with_registry!(
            Opts::new("ecobuild_ledger_calls_total", "Ledger calls by operation and result"),
            &["op", "result"],
            registry
        )
        .expect("failed to register ledger_calls counter");

        let classification_latency_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "ecobuild_classification_latency_ms",
                "Classifier call latency in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(1.0, 2.0, 16).unwrap()),
            registry
        )
        .expect("failed to register classification_latency_ms histogram");

        let ledger_latency_ms = register_histogram_vec_with_registry!(
            HistogramOpts::new(
                "ecobuild_ledger_latency_ms",
                "Ledger call latency in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(1.0, 2.0, 16).unwrap()),
            &["op"],
            registry
        )
        .expect("failed to register ledger_latency_ms histogram");

        Self {
            registry,
            verify_requests,
            attest_requests,
            classifications,
            ledger_calls,
            classification_latency_ms,
            ledger_latency_ms,
        }
    }

    pub fn record_verify(&self, outcome: &str) {
        self.verify_requests.with_label_values(&[outcome]).inc();
    }

    pub fn record_attest(&self, outcome: &str) {
        self.attest_requests.with_label_values(&[outcome]).inc();
    }

    /// Encode every registered metric in the text exposition format.
    pub fn encode(&self) -> Result<String, RpcError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| RpcError::Internal(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| RpcError::Internal(e.to_string()))
    }
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineObserver for GatewayMetrics {
    fn classification(&self, mode: ClassifierMode, elapsed: Duration, _ok: bool) {
        self.classifications
            .with_label_values(&[mode.as_str()])
            .inc();
        self.classification_latency_ms
            .observe(elapsed.as_secs_f64() * 1000.0);
    }

    fn ledger_call(&self, op: LedgerOp, elapsed: Duration, ok: bool) {
        let result = if ok { "ok" } else { "error" };
        self.ledger_calls
            .with_label_values(&[op.as_str(), result])
            .inc();
        self.ledger_latency_ms
            .with_label_values(&[op.as_str()])
            .observe(elapsed.as_secs_f64() * 1000.0);
    }
}
