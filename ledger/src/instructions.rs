//! Reward program instructions.

use crate::accounts::{LedgerAccounts, PlayerAccounts};
use crate::transaction::{AccountMeta, Instruction};
use ecobuild_crypto::{
    instruction_discriminator, ASSOCIATED_TOKEN_PROGRAM_ID, SYSTEM_PROGRAM_ID, TOKEN_PROGRAM_ID,
};
use ecobuild_types::Address;

/// `mint_blocks(amount: u64, waste_type: u8)`, signed by the authority.
///
/// Creates the player profile and token account on first use.
pub fn mint_blocks(
    accounts: &LedgerAccounts,
    authority: &Address,
    player: &PlayerAccounts,
    amount: u64,
    waste_type: u8,
) -> Instruction {
    let mut data = instruction_discriminator("mint_blocks").to_vec();
    data.extend_from_slice(&amount.to_le_bytes());
    data.push(waste_type);

    Instruction {
        program_id: accounts.program_id,
        accounts: vec![
            AccountMeta::writable(*authority, true),
            AccountMeta::writable(accounts.global_config, false),
            AccountMeta::writable(accounts.block_mint, false),
            AccountMeta::writable(player.profile, false),
            AccountMeta::writable(player.token_account, false),
            AccountMeta::readonly(player.wallet, false),
            AccountMeta::readonly(TOKEN_PROGRAM_ID, false),
            AccountMeta::readonly(ASSOCIATED_TOKEN_PROGRAM_ID, false),
            AccountMeta::readonly(SYSTEM_PROGRAM_ID, false),
        ],
        data,
    }
}

/// `convert_to_brick()`, signed by the token owner.
pub fn convert_to_brick(accounts: &LedgerAccounts, owner: &PlayerAccounts) -> Instruction {
    Instruction {
        program_id: accounts.program_id,
        accounts: vec![
            AccountMeta::writable(owner.wallet, true),
            AccountMeta::writable(accounts.global_config, false),
            AccountMeta::writable(accounts.block_mint, false),
            AccountMeta::writable(owner.profile, false),
            AccountMeta::writable(owner.token_account, false),
            AccountMeta::readonly(TOKEN_PROGRAM_ID, false),
        ],
        data: instruction_discriminator("convert_to_brick").to_vec(),
    }
}
