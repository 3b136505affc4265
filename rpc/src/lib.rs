//! HTTP gateway for the EcoBuild verifier.
//!
//! Endpoints:
//! - `GET /health`: versions, modes and ledger identifiers
//! - `POST /verify`: multipart image verification and minting
//! - `POST /attest`: legacy manual claim validation (no ledger interaction)
//! - `POST /convert`: blocks → brick conversion
//! - `GET /stats/:address`, `GET /global-stats`: ledger counters
//! - `GET /metrics`: Prometheus text exposition

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod server;

pub use config::{GatewayConfig, DEFAULT_PROGRAM_ID};
pub use error::RpcError;
pub use metrics::GatewayMetrics;
pub use server::{router, serve, AppState, REQUEST_ID_HEADER};
