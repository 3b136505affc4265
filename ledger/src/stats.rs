//! Read projections and receipts.

use ecobuild_types::{Address, TransactionRef};
use serde::{Deserialize, Serialize};

/// Per-actor counters as held by the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub wallet: Address,
    pub total_credits: u64,
    pub blocks_minted: u64,
    pub brick_count: u64,
    pub collections_count: u64,
    /// Zero when the token account does not exist yet.
    pub current_block_balance: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub authority: Address,
    pub block_mint: Address,
    pub total_blocks_minted: u64,
    pub total_bricks_created: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReceipt {
    pub transaction: TransactionRef,
    pub blocks_converted: u64,
    pub bricks_received: u64,
}
