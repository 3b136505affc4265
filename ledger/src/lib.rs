//! Reward ledger adapter.
//!
//! The reward ledger owns every balance and counter. This crate derives the
//! accounts it needs, submits `mint_blocks` / `convert_to_brick`, and reads
//! player and global counters back as [`PlayerStats`] / [`GlobalStats`].
//!
//! Two implementations of [`LedgerAdapter`]:
//! - [`RpcLedger`] talks JSON-RPC to a live cluster and signs with the
//!   configured authority keypair.
//! - [`MemoryLedger`] keeps the same rules in process, for running without
//!   any external configuration.

pub mod accounts;
pub mod adapter;
pub mod error;
pub mod instructions;
pub mod memory;
pub mod rpc;
pub mod state;
pub mod stats;
pub mod transaction;

pub use accounts::{LedgerAccounts, PlayerAccounts};
pub use adapter::{LedgerAdapter, LedgerMode};
pub use error::LedgerError;
pub use memory::MemoryLedger;
pub use rpc::{RpcLedger, RpcLedgerConfig, DEFAULT_RPC_URL};
pub use state::{GlobalConfigAccount, PlayerProfileAccount};
pub use stats::{ConversionReceipt, GlobalStats, PlayerStats};
