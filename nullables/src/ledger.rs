//! Nullable ledger — records calls, injects failures, keeps real state.
//!
//! Balances and counters come from an in-process [`MemoryLedger`], so
//! conversion and stats behave like the real thing; on top of that every call
//! is recorded and failures or delays can be injected per operation.

use async_trait::async_trait;
use ecobuild_ledger::{
    ConversionReceipt, GlobalStats, LedgerAccounts, LedgerAdapter, LedgerError, LedgerMode,
    MemoryLedger, PlayerStats,
};
use ecobuild_types::{Address, TransactionRef};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

pub const NULL_PROGRAM_ID: Address = Address::new([0xEC; 32]);
pub const NULL_AUTHORITY: Address = Address::new([0xA1; 32]);

/// A call as seen by the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerCall {
    Mint {
        actor: Address,
        amount: u64,
        category_code: u8,
    },
    Convert {
        owner: Address,
    },
}

pub struct NullLedger {
    inner: MemoryLedger,
    calls: Mutex<Vec<LedgerCall>>,
    mint_failures: Mutex<VecDeque<LedgerError>>,
    convert_failures: Mutex<VecDeque<LedgerError>>,
    delay: Option<Duration>,
}

impl NullLedger {
    pub fn new() -> Self {
        Self::with_rate(10)
    }

    pub fn with_rate(blocks_per_brick: u64) -> Self {
        Self {
            inner: MemoryLedger::new(null_accounts(), NULL_AUTHORITY, blocks_per_brick),
            calls: Mutex::new(Vec::new()),
            mint_failures: Mutex::new(VecDeque::new()),
            convert_failures: Mutex::new(VecDeque::new()),
            delay: None,
        }
    }

    /// A ledger whose program was never initialised.
    pub fn uninitialized() -> Self {
        Self {
            inner: MemoryLedger::uninitialized(null_accounts(), NULL_AUTHORITY, 10),
            ..Self::new()
        }
    }

    /// Sleep this long before every mutating call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail the next mint with `error`.
    pub fn fail_next_mint(&self, error: LedgerError) {
        self.mint_failures.lock().unwrap().push_back(error);
    }

    /// Fail the next conversion with `error`.
    pub fn fail_next_convert(&self, error: LedgerError) {
        self.convert_failures.lock().unwrap().push_back(error);
    }

    /// Every call received, in order, including failed ones.
    pub fn calls(&self) -> Vec<LedgerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mint_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, LedgerCall::Mint { .. }))
            .count()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for NullLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn null_accounts() -> LedgerAccounts {
    LedgerAccounts {
        program_id: NULL_PROGRAM_ID,
        global_config: Address::new([0xC0; 32]),
        block_mint: Address::new([0xB0; 32]),
    }
}

#[async_trait]
impl LedgerAdapter for NullLedger {
    fn mode(&self) -> LedgerMode {
        LedgerMode::Offline
    }

    fn accounts(&self) -> &LedgerAccounts {
        self.inner.accounts()
    }

    fn authority(&self) -> Address {
        self.inner.authority()
    }

    fn blocks_per_brick(&self) -> u64 {
        self.inner.blocks_per_brick()
    }

    async fn mint(
        &self,
        actor: &Address,
        amount: u64,
        category_code: u8,
    ) -> Result<TransactionRef, LedgerError> {
        self.calls.lock().unwrap().push(LedgerCall::Mint {
            actor: *actor,
            amount,
            category_code,
        });
        self.pause().await;
        let injected = self.mint_failures.lock().unwrap().pop_front();
        match injected {
            Some(error) => Err(error),
            None => self.inner.mint(actor, amount, category_code).await,
        }
    }

    async fn convert(&self, owner: &Address) -> Result<ConversionReceipt, LedgerError> {
        self.calls
            .lock()
            .unwrap()
            .push(LedgerCall::Convert { owner: *owner });
        self.pause().await;
        let injected = self.convert_failures.lock().unwrap().pop_front();
        match injected {
            Some(error) => Err(error),
            None => self.inner.convert(owner).await,
        }
    }

    async fn player_stats(&self, actor: &Address) -> Result<PlayerStats, LedgerError> {
        self.inner.player_stats(actor).await
    }

    async fn global_stats(&self) -> Result<GlobalStats, LedgerError> {
        self.inner.global_stats().await
    }
}
