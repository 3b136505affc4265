//! In-process reward ledger.
//!
//! Used when no authority keypair is configured, so the service runs with
//! zero external configuration. It enforces the same rules as the reward
//! program: profiles are created on first mint, every counter uses checked
//! arithmetic, and conversion fails on insufficient balance. Updates are
//! computed in full before any counter is written.

use crate::{
    ConversionReceipt, GlobalStats, LedgerAccounts, LedgerAdapter, LedgerError, LedgerMode,
    PlayerStats,
};
use async_trait::async_trait;
use ecobuild_crypto::blake2b_256_multi;
use ecobuild_types::{Address, TransactionRef};
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Clone, Debug, Default)]
struct PlayerEntry {
    total_credits: u64,
    blocks_minted: u64,
    brick_count: u64,
    collections_count: u64,
    balance: u64,
}

#[derive(Debug, Default)]
struct LedgerState {
    initialized: bool,
    players: HashMap<Address, PlayerEntry>,
    total_blocks_minted: u64,
    total_bricks_created: u64,
    sequence: u64,
}

pub struct MemoryLedger {
    accounts: LedgerAccounts,
    authority: Address,
    blocks_per_brick: u64,
    state: Mutex<LedgerState>,
}

impl MemoryLedger {
    pub fn new(accounts: LedgerAccounts, authority: Address, blocks_per_brick: u64) -> Self {
        Self {
            accounts,
            authority,
            blocks_per_brick,
            state: Mutex::new(LedgerState {
                initialized: true,
                ..LedgerState::default()
            }),
        }
    }

    /// A ledger whose program config was never initialised; every call
    /// that needs it fails with `NotFound`.
    pub fn uninitialized(accounts: LedgerAccounts, authority: Address, blocks_per_brick: u64) -> Self {
        Self {
            accounts,
            authority,
            blocks_per_brick,
            state: Mutex::new(LedgerState::default()),
        }
    }

    fn transaction_ref(op: &str, actor: &Address, sequence: u64) -> TransactionRef {
        let digest = blake2b_256_multi(&[
            b"ecobuild-offline",
            op.as_bytes(),
            actor.as_bytes(),
            &sequence.to_le_bytes(),
        ]);
        TransactionRef::new(bs58::encode(digest).into_string())
    }
}

fn overflow(what: &str) -> LedgerError {
    LedgerError::Overflow(format!("{what} would overflow"))
}

fn not_initialized() -> LedgerError {
    LedgerError::NotFound("global config is not initialised".into())
}

#[async_trait]
impl LedgerAdapter for MemoryLedger {
    fn mode(&self) -> LedgerMode {
        LedgerMode::Offline
    }

    fn accounts(&self) -> &LedgerAccounts {
        &self.accounts
    }

    fn authority(&self) -> Address {
        self.authority
    }

    fn blocks_per_brick(&self) -> u64 {
        self.blocks_per_brick
    }

    async fn mint(
        &self,
        actor: &Address,
        amount: u64,
        category_code: u8,
    ) -> Result<TransactionRef, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::Rejected("amount must be greater than zero".into()));
        }
        let mut state = self.state.lock().await;
        if !state.initialized {
            return Err(not_initialized());
        }

        let total_blocks_minted = state
            .total_blocks_minted
            .checked_add(amount)
            .ok_or_else(|| overflow("total blocks minted"))?;
        let current = state.players.get(actor).cloned().unwrap_or_default();
        let updated = PlayerEntry {
            total_credits: current
                .total_credits
                .checked_add(amount)
                .ok_or_else(|| overflow("total credits"))?,
            blocks_minted: current
                .blocks_minted
                .checked_add(amount)
                .ok_or_else(|| overflow("blocks minted"))?,
            collections_count: current
                .collections_count
                .checked_add(1)
                .ok_or_else(|| overflow("collections count"))?,
            balance: current
                .balance
                .checked_add(amount)
                .ok_or_else(|| overflow("token balance"))?,
            brick_count: current.brick_count,
        };

        state.total_blocks_minted = total_blocks_minted;
        state.players.insert(*actor, updated);
        state.sequence += 1;
        let tx = Self::transaction_ref("mint", actor, state.sequence);
        tracing::info!(%actor, amount, category_code, transaction = %tx, "offline mint");
        Ok(tx)
    }

    async fn convert(&self, owner: &Address) -> Result<ConversionReceipt, LedgerError> {
        let mut state = self.state.lock().await;
        if !state.initialized {
            return Err(not_initialized());
        }
        let current = state
            .players
            .get(owner)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("no player profile for {owner}")))?;
        if current.balance < self.blocks_per_brick {
            return Err(LedgerError::InsufficientBalance(format!(
                "InsufficientBlocks: balance {} is below the {} needed for a brick",
                current.balance, self.blocks_per_brick
            )));
        }

        let total_bricks_created = state
            .total_bricks_created
            .checked_add(1)
            .ok_or_else(|| overflow("total bricks created"))?;
        let updated = PlayerEntry {
            balance: current.balance - self.blocks_per_brick,
            brick_count: current
                .brick_count
                .checked_add(1)
                .ok_or_else(|| overflow("brick count"))?,
            ..current
        };

        state.total_bricks_created = total_bricks_created;
        state.players.insert(*owner, updated);
        state.sequence += 1;
        let transaction = Self::transaction_ref("convert", owner, state.sequence);
        tracing::info!(%owner, transaction = %transaction, "offline conversion");
        Ok(ConversionReceipt {
            transaction,
            blocks_converted: self.blocks_per_brick,
            bricks_received: 1,
        })
    }

    async fn player_stats(&self, actor: &Address) -> Result<PlayerStats, LedgerError> {
        let state = self.state.lock().await;
        let entry = state
            .players
            .get(actor)
            .ok_or_else(|| LedgerError::NotFound(format!("no player profile for {actor}")))?;
        Ok(PlayerStats {
            wallet: *actor,
            total_credits: entry.total_credits,
            blocks_minted: entry.blocks_minted,
            brick_count: entry.brick_count,
            collections_count: entry.collections_count,
            current_block_balance: entry.balance,
        })
    }

    async fn global_stats(&self) -> Result<GlobalStats, LedgerError> {
        let state = self.state.lock().await;
        if !state.initialized {
            return Err(not_initialized());
        }
        Ok(GlobalStats {
            authority: self.authority,
            block_mint: self.accounts.block_mint,
            total_blocks_minted: state.total_blocks_minted,
            total_bricks_created: state.total_bricks_created,
        })
    }
}
