//! Deterministic account derivation.
//!
//! Every account the reward program touches is derived from fixed seeds and,
//! for per-actor accounts, the actor's address. The same actor always maps to
//! the same profile and token account.

use crate::LedgerError;
use ecobuild_crypto::{associated_token_address, find_program_address};
use ecobuild_types::Address;
use serde::Serialize;

pub const GLOBAL_CONFIG_SEED: &[u8] = b"global_config";
pub const BLOCK_MINT_SEED: &[u8] = b"block_mint";
pub const PLAYER_SEED: &[u8] = b"player";

/// Program-wide accounts, derived once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerAccounts {
    pub program_id: Address,
    pub global_config: Address,
    pub block_mint: Address,
}

/// Accounts belonging to one actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerAccounts {
    pub wallet: Address,
    pub profile: Address,
    pub token_account: Address,
}

impl LedgerAccounts {
    pub fn derive(program_id: Address) -> Result<Self, LedgerError> {
        let (global_config, _) = find_program_address(&[GLOBAL_CONFIG_SEED], &program_id)?;
        let (block_mint, _) = find_program_address(&[BLOCK_MINT_SEED], &program_id)?;
        Ok(Self {
            program_id,
            global_config,
            block_mint,
        })
    }

    pub fn player(&self, wallet: &Address) -> Result<PlayerAccounts, LedgerError> {
        let (profile, _) =
            find_program_address(&[PLAYER_SEED, wallet.as_bytes()], &self.program_id)?;
        let token_account = associated_token_address(wallet, &self.block_mint)?;
        Ok(PlayerAccounts {
            wallet: *wallet,
            profile,
            token_account,
        })
    }
}
