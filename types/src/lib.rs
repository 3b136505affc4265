//! Fundamental types for the EcoBuild verifier.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! ledger addresses, collection categories, attestation identifiers, transaction
//! references, and millisecond timestamps.

pub mod address;
pub mod category;
pub mod error;
pub mod hash;
pub mod time;

pub use address::Address;
pub use category::{MaterialType, WasteType};
pub use error::TypeError;
pub use hash::{AttestationId, TransactionRef};
pub use time::{Clock, SystemClock, TimestampMs};
