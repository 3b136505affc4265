//! Shared utilities for the EcoBuild verifier.

pub mod logging;

pub use logging::{init_logging, LogFormat};
