use crate::{ConversionReceipt, GlobalStats, LedgerAccounts, LedgerError, PlayerStats};
use async_trait::async_trait;
use ecobuild_types::{Address, TransactionRef};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerMode {
    /// Live JSON-RPC ledger.
    Rpc,
    /// In-process ledger.
    Offline,
}

impl LedgerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerMode::Rpc => "rpc",
            LedgerMode::Offline => "offline",
        }
    }
}

impl fmt::Display for LedgerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The external reward ledger.
///
/// The ledger is the sole owner of balances and counters. Implementations
/// never pre-check balances locally; the ledger's own checks decide, and
/// refusals come back as a typed [`LedgerError`] with no partial state.
#[async_trait]
pub trait LedgerAdapter: Send + Sync {
    fn mode(&self) -> LedgerMode;

    fn accounts(&self) -> &LedgerAccounts;

    /// Address that signs mints (and conversions in authority mode).
    fn authority(&self) -> Address;

    /// Exchange rate: reward units burned per crafted unit.
    fn blocks_per_brick(&self) -> u64;

    /// Mint `amount` reward units to `actor`, tagged with `category_code`.
    async fn mint(
        &self,
        actor: &Address,
        amount: u64,
        category_code: u8,
    ) -> Result<TransactionRef, LedgerError>;

    /// Burn one exchange-rate worth of `owner`'s units for one crafted unit.
    async fn convert(&self, owner: &Address) -> Result<ConversionReceipt, LedgerError>;

    /// `NotFound` when the actor has no profile yet.
    async fn player_stats(&self, actor: &Address) -> Result<PlayerStats, LedgerError>;

    /// `NotFound` when the program has not been initialised.
    async fn global_stats(&self) -> Result<GlobalStats, LedgerError>;
}
