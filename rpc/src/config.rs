//! Gateway configuration with TOML file support.

use crate::RpcError;
use axum::http::HeaderValue;
use ecobuild_attestation::DEFAULT_WINDOW_MS;
use ecobuild_ledger::{RpcLedgerConfig, DEFAULT_RPC_URL};
use ecobuild_types::Address;
use ecobuild_utils::LogFormat;
use ecobuild_verification::{
    ConversionMode, OrchestratorConfig, DEFAULT_CONVERSION_WINDOW_MS, DEFAULT_MIN_CONFIDENCE,
};
use ecobuild_vision::client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use ecobuild_vision::VisionConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PROGRAM_ID: &str = "HcENn31gno9LMse5iERziSpLGjMdtLZAxLQo9Ff4xn5b";

/// Configuration for the verifier gateway.
///
/// Every field has a default, so an empty file (or no file) runs the service
/// fully offline: mock classifier, in-process ledger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Address to bind the HTTP listener to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed clock skew for manual claims.
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Allowed clock skew for signed conversions. A signed request can be
    /// replayed while it is inside this window.
    #[serde(default = "default_conversion_window_ms")]
    pub conversion_window_ms: u64,

    /// Classifier confidence needed to mint, inclusive.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Blocks burned per brick on the offline ledger.
    #[serde(default = "default_blocks_per_brick")]
    pub blocks_per_brick: u64,

    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Classifier credential. Absent selects mock classification.
    #[serde(default)]
    pub classifier_api_key: Option<String>,

    #[serde(default = "default_classifier_model")]
    pub classifier_model: String,

    #[serde(default = "default_classifier_base_url")]
    pub classifier_base_url: String,

    #[serde(default = "default_timeout_ms")]
    pub classifier_timeout_ms: u64,

    /// Ledger JSON-RPC endpoint.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Reward program id (base58).
    #[serde(default = "default_program_id")]
    pub program_id: String,

    /// Authority keypair as base64 of the JSON byte array.
    #[serde(default)]
    pub authority_keypair_base64: Option<String>,

    /// Authority keypair file (JSON byte array).
    #[serde(default)]
    pub authority_keypair_path: Option<PathBuf>,

    #[serde(default = "default_timeout_ms")]
    pub ledger_timeout_ms: u64,

    #[serde(default)]
    pub conversion_mode: ConversionMode,

    /// Reported by `/health`.
    #[serde(default = "default_version")]
    pub version: String,

    /// Reported by `/health`.
    #[serde(default = "default_commit")]
    pub commit: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_window_ms() -> u64 {
    DEFAULT_WINDOW_MS
}

fn default_conversion_window_ms() -> u64 {
    DEFAULT_CONVERSION_WINDOW_MS
}

fn default_min_confidence() -> f64 {
    DEFAULT_MIN_CONFIDENCE
}

fn default_blocks_per_brick() -> u64 {
    10
}

fn default_max_image_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_max_body_bytes() -> usize {
    12 * 1024 * 1024
}

fn default_classifier_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_classifier_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.to_string()
}

fn default_program_id() -> String {
    DEFAULT_PROGRAM_ID.to_string()
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_commit() -> String {
    "dev".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl GatewayConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, RpcError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| RpcError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, RpcError> {
        toml::from_str(s).map_err(|e| RpcError::Config(e.to_string()))
    }

    /// Check the values that defaults cannot make safe.
    pub fn validate(&self) -> Result<(), RpcError> {
        let mut problems = Vec::new();

        if !self.min_confidence.is_finite() || !(0.0..=1.0).contains(&self.min_confidence) {
            problems.push(format!(
                "min_confidence must be within [0, 1] (got {})",
                self.min_confidence
            ));
        }
        if self.window_ms == 0 {
            problems.push("window_ms must be greater than zero".to_string());
        }
        if self.conversion_window_ms == 0 {
            problems.push("conversion_window_ms must be greater than zero".to_string());
        }
        if self.blocks_per_brick == 0 {
            problems.push("blocks_per_brick must be greater than zero".to_string());
        }
        if self.max_image_bytes == 0 {
            problems.push("max_image_bytes must be greater than zero".to_string());
        }
        if self.max_body_bytes == 0 {
            problems.push("max_body_bytes must be greater than zero".to_string());
        }
        if self.max_image_bytes > self.max_body_bytes {
            problems.push(format!(
                "max_image_bytes ({}) must not exceed max_body_bytes ({})",
                self.max_image_bytes, self.max_body_bytes
            ));
        }
        if self.classifier_timeout_ms == 0 || self.ledger_timeout_ms == 0 {
            problems.push("timeouts must be greater than zero".to_string());
        }
        if let Err(e) = Address::parse(&self.program_id) {
            problems.push(format!("program_id: {e}"));
        }
        for origin in &self.cors_origins {
            if HeaderValue::from_str(origin).is_err() {
                problems.push(format!("cors origin '{origin}' is not a valid header value"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(RpcError::Config(problems.join("; ")))
        }
    }

    pub fn program_id(&self) -> Result<Address, RpcError> {
        Address::parse(&self.program_id).map_err(|e| RpcError::Config(format!("program_id: {e}")))
    }

    pub fn has_authority_keypair(&self) -> bool {
        self.authority_keypair_base64
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
            || self.authority_keypair_path.is_some()
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            min_confidence: self.min_confidence,
            window_ms: self.window_ms,
            max_image_bytes: self.max_image_bytes,
            classifier_timeout: Duration::from_millis(self.classifier_timeout_ms),
            ledger_timeout: Duration::from_millis(self.ledger_timeout_ms),
            conversion_mode: self.conversion_mode,
            conversion_window_ms: self.conversion_window_ms,
        }
    }

    pub fn vision_config(&self) -> VisionConfig {
        VisionConfig {
            api_key: self.classifier_api_key.clone(),
            model: self.classifier_model.clone(),
            base_url: self.classifier_base_url.clone(),
            timeout: Duration::from_millis(self.classifier_timeout_ms),
        }
    }

    pub fn ledger_config(&self) -> RpcLedgerConfig {
        RpcLedgerConfig {
            url: self.rpc_url.clone(),
            timeout: Duration::from_millis(self.ledger_timeout_ms),
            blocks_per_brick: self.blocks_per_brick,
            ..RpcLedgerConfig::default()
        }
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, RpcError> {
        toml::to_string_pretty(self).map_err(|e| RpcError::Config(e.to_string()))
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            window_ms: default_window_ms(),
            conversion_window_ms: default_conversion_window_ms(),
            min_confidence: default_min_confidence(),
            blocks_per_brick: default_blocks_per_brick(),
            max_image_bytes: default_max_image_bytes(),
            max_body_bytes: default_max_body_bytes(),
            cors_origins: Vec::new(),
            classifier_api_key: None,
            classifier_model: default_classifier_model(),
            classifier_base_url: default_classifier_base_url(),
            classifier_timeout_ms: default_timeout_ms(),
            rpc_url: default_rpc_url(),
            program_id: default_program_id(),
            authority_keypair_base64: None,
            authority_keypair_path: None,
            ledger_timeout_ms: default_timeout_ms(),
            conversion_mode: ConversionMode::default(),
            version: default_version(),
            commit: default_commit(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_uses_defaults() {
        let config = GatewayConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.port, 3000);
        assert_eq!(config.window_ms, 600_000);
        assert_eq!(config.conversion_window_ms, 60_000);
        assert_eq!(config.min_confidence, 0.7);
        assert_eq!(config.conversion_mode, ConversionMode::Authority);
        assert!(config.classifier_api_key.is_none());
        assert!(!config.has_authority_keypair());
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            port = 8080
            conversion_mode = "actor"
            cors_origins = ["https://app.ecobuild.example"]
        "#;
        let config = GatewayConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.port, 8080);
        assert_eq!(config.conversion_mode, ConversionMode::Actor);
        assert_eq!(config.cors_origins.len(), 1);
        assert_eq!(config.max_body_bytes, 12 * 1024 * 1024);
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = GatewayConfig::default();
        let parsed = GatewayConfig::from_toml_str(&config.to_toml_string().unwrap()).unwrap();
        assert_eq!(parsed.port, config.port);
        assert_eq!(parsed.program_id, config.program_id);
    }

    #[test]
    fn validation_reports_every_problem() {
        let config = GatewayConfig {
            min_confidence: 1.5,
            window_ms: 0,
            conversion_window_ms: 0,
            max_image_bytes: 20,
            max_body_bytes: 10,
            program_id: "nope".into(),
            ..GatewayConfig::default()
        };
        let RpcError::Config(message) = config.validate().unwrap_err() else {
            panic!("expected a config error");
        };
        assert!(message.contains("min_confidence"), "{message}");
        assert!(message.contains("window_ms"), "{message}");
        assert!(message.contains("conversion_window_ms"), "{message}");
        assert!(message.contains("max_image_bytes"), "{message}");
        assert!(message.contains("program_id"), "{message}");
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "min_confidence = 0.9\nblocks_per_brick = 4").unwrap();
        let config = GatewayConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.min_confidence, 0.9);
        assert_eq!(config.ledger_config().blocks_per_brick, 4);
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = GatewayConfig::from_toml_file("/nonexistent/ecobuild.toml");
        assert!(matches!(result, Err(RpcError::Config(_))));
    }
}
