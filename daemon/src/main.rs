//! EcoBuild verifier daemon: entry point for running the HTTP gateway.

use anyhow::Context;
use clap::Parser;
use ecobuild_crypto::{sha256, AuthorityKeypair};
use ecobuild_ledger::{LedgerAccounts, LedgerAdapter, MemoryLedger, RpcLedger};
use ecobuild_rpc::{AppState, GatewayConfig};
use ecobuild_types::{Address, SystemClock};
use ecobuild_utils::{init_logging, LogFormat};
use ecobuild_verification::ConversionMode;
use ecobuild_vision::{Classifier, ClassifierMode, VisionClient};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ecobuild-verifier", about = "EcoBuild waste verification gateway")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "ECOBUILD_CONFIG")]
    config: Option<PathBuf>,

    /// Listening port.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Bind address.
    #[arg(long, env = "BIND_ADDRESS")]
    bind_address: Option<String>,

    /// Allowed clock skew for manual claims, in milliseconds.
    #[arg(long, env = "ATTESTATION_WINDOW_MS")]
    window_ms: Option<u64>,

    /// Allowed clock skew for signed conversions, in milliseconds.
    #[arg(long, env = "CONVERSION_WINDOW_MS")]
    conversion_window_ms: Option<u64>,

    /// Classifier confidence needed to mint.
    #[arg(long, env = "MIN_CONFIDENCE")]
    min_confidence: Option<f64>,

    /// Blocks per brick on the offline ledger.
    #[arg(long, env = "BLOCKS_PER_BRICK")]
    blocks_per_brick: Option<u64>,

    #[arg(long, env = "MAX_IMAGE_BYTES")]
    max_image_bytes: Option<usize>,

    #[arg(long, env = "MAX_BODY_BYTES")]
    max_body_bytes: Option<usize>,

    /// Allowed CORS origins (comma-separated). Empty allows any origin.
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Vec<String>,

    /// Classifier credential. Without one the classifier runs in mock mode.
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    classifier_api_key: Option<String>,

    #[arg(long, env = "CLASSIFIER_MODEL")]
    classifier_model: Option<String>,

    #[arg(long, env = "CLASSIFIER_BASE_URL")]
    classifier_base_url: Option<String>,

    #[arg(long, env = "CLASSIFIER_TIMEOUT_MS")]
    classifier_timeout_ms: Option<u64>,

    /// Ledger JSON-RPC endpoint.
    #[arg(long, env = "SOLANA_RPC_URL")]
    rpc_url: Option<String>,

    /// Reward program id (base58).
    #[arg(long, env = "PROGRAM_ID")]
    program_id: Option<String>,

    /// Authority keypair: base64 of the JSON byte array.
    #[arg(long, env = "AUTHORITY_KEYPAIR_BASE64", hide_env_values = true)]
    authority_keypair_base64: Option<String>,

    /// Authority keypair file (JSON byte array).
    #[arg(long, env = "PROGRAM_AUTHORITY_KEYPAIR")]
    authority_keypair_path: Option<PathBuf>,

    #[arg(long, env = "LEDGER_TIMEOUT_MS")]
    ledger_timeout_ms: Option<u64>,

    /// "authority" or "actor".
    #[arg(long, env = "CONVERSION_MODE")]
    conversion_mode: Option<ConversionMode>,

    #[arg(long, env = "VERIFIER_VERSION")]
    version_label: Option<String>,

    #[arg(long, env = "COMMIT_SHA")]
    commit: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Run the gateway (default).
    Serve,
    /// Print the effective configuration as TOML and exit.
    Config,
}

impl Cli {
    /// Overlay every flag or env value that was given onto `base`.
    fn apply(self, base: GatewayConfig) -> GatewayConfig {
        let cors_origins = if self.cors_origins.is_empty() {
            base.cors_origins
        } else {
            self.cors_origins
                .into_iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect()
        };
        GatewayConfig {
            bind_address: self.bind_address.unwrap_or(base.bind_address),
            port: self.port.unwrap_or(base.port),
            window_ms: self.window_ms.unwrap_or(base.window_ms),
            conversion_window_ms: self
                .conversion_window_ms
                .unwrap_or(base.conversion_window_ms),
            min_confidence: self.min_confidence.unwrap_or(base.min_confidence),
            blocks_per_brick: self.blocks_per_brick.unwrap_or(base.blocks_per_brick),
            max_image_bytes: self.max_image_bytes.unwrap_or(base.max_image_bytes),
            max_body_bytes: self.max_body_bytes.unwrap_or(base.max_body_bytes),
            cors_origins,
            classifier_api_key: self.classifier_api_key.or(base.classifier_api_key),
            classifier_model: self.classifier_model.unwrap_or(base.classifier_model),
            classifier_base_url: self.classifier_base_url.unwrap_or(base.classifier_base_url),
            classifier_timeout_ms: self
                .classifier_timeout_ms
                .unwrap_or(base.classifier_timeout_ms),
            rpc_url: self.rpc_url.unwrap_or(base.rpc_url),
            program_id: self.program_id.unwrap_or(base.program_id),
            authority_keypair_base64: self
                .authority_keypair_base64
                .or(base.authority_keypair_base64),
            authority_keypair_path: self.authority_keypair_path.or(base.authority_keypair_path),
            ledger_timeout_ms: self.ledger_timeout_ms.unwrap_or(base.ledger_timeout_ms),
            conversion_mode: self.conversion_mode.unwrap_or(base.conversion_mode),
            version: self.version_label.unwrap_or(base.version),
            commit: self.commit.unwrap_or(base.commit),
            log_format: self.log_format.unwrap_or(base.log_format),
            log_level: self.log_level.unwrap_or(base.log_level),
        }
    }
}

/// Stand-in authority for the offline ledger.
fn offline_authority() -> Address {
    Address::new(sha256(b"ecobuild:offline-authority"))
}

fn load_authority(config: &GatewayConfig) -> anyhow::Result<Option<AuthorityKeypair>> {
    if let Some(encoded) = config
        .authority_keypair_base64
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        let keypair = AuthorityKeypair::from_base64(encoded.trim())
            .context("failed to decode AUTHORITY_KEYPAIR_BASE64")?;
        return Ok(Some(keypair));
    }
    if let Some(path) = &config.authority_keypair_path {
        let keypair = AuthorityKeypair::from_file(path)
            .with_context(|| format!("failed to load authority keypair from {}", path.display()))?;
        return Ok(Some(keypair));
    }
    Ok(None)
}

fn build_ledger(config: &GatewayConfig) -> anyhow::Result<Arc<dyn LedgerAdapter>> {
    let accounts = LedgerAccounts::derive(config.program_id()?)?;
    match load_authority(config)? {
        Some(keypair) => {
            tracing::info!(
                rpc_url = %config.rpc_url,
                authority = %keypair.address(),
                program_id = %accounts.program_id,
                "using RPC ledger"
            );
            Ok(Arc::new(RpcLedger::new(
                config.ledger_config(),
                accounts,
                keypair,
            )))
        }
        None => {
            tracing::warn!(
                "no authority keypair configured, using the offline in-process ledger"
            );
            Ok(Arc::new(MemoryLedger::new(
                accounts,
                offline_authority(),
                config.blocks_per_brick,
            )))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received, draining connections");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => GatewayConfig::from_toml_file(path)?,
        None => GatewayConfig::default(),
    };
    let command = cli.command.take().unwrap_or(Command::Serve);
    let config = cli.apply(file_config);

    if command == Command::Config {
        println!("{}", config.to_toml_string()?);
        return Ok(());
    }

    init_logging(config.log_format, &config.log_level).map_err(anyhow::Error::msg)?;
    config.validate()?;

    let classifier: Arc<dyn Classifier> = Arc::new(VisionClient::new(config.vision_config()));
    let ledger = build_ledger(&config)?;

    if classifier.mode() == ClassifierMode::Mock {
        tracing::warn!("classifier running in mock mode: every image gets the fixed verdict");
    }
    if config.conversion_mode == ConversionMode::Authority {
        tracing::warn!(
            "conversion mode is 'authority': /convert burns the authority's own balance without caller proof"
        );
    }

    let bind = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;

    tracing::info!(
        address = %bind,
        version = %config.version,
        commit = %config.commit,
        classifier_mode = %classifier.mode(),
        ledger_mode = %ledger.mode(),
        conversion_mode = %config.conversion_mode,
        "EcoBuild verifier listening"
    );

    let state = AppState::new(config, classifier, ledger, Arc::new(SystemClock));
    ecobuild_rpc::serve(listener, state, shutdown_signal()).await?;

    tracing::info!("EcoBuild verifier exited cleanly");
    Ok(())
}
