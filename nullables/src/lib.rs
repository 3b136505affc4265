//! Nullable infrastructure for deterministic testing.
//!
//! Every outbound dependency of the verifier (clock, classifier, ledger) sits
//! behind a trait. This crate provides implementations that:
//! - Return deterministic values
//! - Can be scripted and inspected programmatically
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod classifier;
pub mod clock;
pub mod ledger;

pub use classifier::NullClassifier;
pub use clock::NullClock;
pub use ledger::{LedgerCall, NullLedger, NULL_AUTHORITY, NULL_PROGRAM_ID};
