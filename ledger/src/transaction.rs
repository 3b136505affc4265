//! Legacy transaction encoding.
//!
//! Wire layout:
//!
//! ```text
//! transaction = compact(n_sigs) ‖ sig[64]* ‖ message
//! message     = header[3] ‖ compact(n_keys) ‖ key[32]* ‖ blockhash[32]
//!               ‖ compact(n_ix) ‖ instruction*
//! instruction = program_index ‖ compact(n) ‖ account_index* ‖ compact(len) ‖ data
//! ```
//!
//! Keys are ordered writable signers, read-only signers, writable
//! non-signers, read-only non-signers, with the fee payer first.

use crate::LedgerError;
use ecobuild_crypto::AuthorityKeypair;
use ecobuild_types::Address;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountMeta {
    pub address: Address,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn writable(address: Address, is_signer: bool) -> Self {
        Self {
            address,
            is_signer,
            is_writable: true,
        }
    }

    pub fn readonly(address: Address, is_signer: bool) -> Self {
        Self {
            address,
            is_signer,
            is_writable: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Address,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// A compiled, unsigned message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub num_required_signatures: u8,
    pub num_readonly_signed: u8,
    pub num_readonly_unsigned: u8,
    pub account_keys: Vec<Address>,
    pub recent_blockhash: [u8; 32],
    instructions: Vec<CompiledInstruction>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct CompiledInstruction {
    program_index: u8,
    accounts: Vec<u8>,
    data: Vec<u8>,
}

impl Message {
    pub fn compile(
        payer: &Address,
        instructions: &[Instruction],
        recent_blockhash: [u8; 32],
    ) -> Result<Self, LedgerError> {
        let mut metas: Vec<AccountMeta> = vec![AccountMeta::writable(*payer, true)];
        let mut merge = |meta: AccountMeta| {
            match metas.iter_mut().find(|m| m.address == meta.address) {
                Some(existing) => {
                    existing.is_signer |= meta.is_signer;
                    existing.is_writable |= meta.is_writable;
                }
                None => metas.push(meta),
            }
        };
        for ix in instructions {
            for meta in &ix.accounts {
                merge(meta.clone());
            }
            merge(AccountMeta::readonly(ix.program_id, false));
        }

        // Stable sort keeps the payer first within its class.
        metas.sort_by_key(|m| match (m.is_signer, m.is_writable) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        });

        if metas.len() > u8::MAX as usize {
            return Err(LedgerError::Rejected(format!(
                "transaction references {} accounts",
                metas.len()
            )));
        }

        let count = |signer: bool, writable: bool| {
            metas
                .iter()
                .filter(|m| m.is_signer == signer && m.is_writable == writable)
                .count() as u8
        };
        let num_readonly_signed = count(true, false);
        let num_required_signatures = count(true, true) + num_readonly_signed;
        let num_readonly_unsigned = count(false, false);

        let account_keys: Vec<Address> = metas.iter().map(|m| m.address).collect();
        let index_of = |address: &Address| {
            account_keys
                .iter()
                .position(|k| k == address)
                .map(|i| i as u8)
                .unwrap_or_default()
        };
        let compiled = instructions
            .iter()
            .map(|ix| CompiledInstruction {
                program_index: index_of(&ix.program_id),
                accounts: ix.accounts.iter().map(|m| index_of(&m.address)).collect(),
                data: ix.data.clone(),
            })
            .collect();

        Ok(Self {
            num_required_signatures,
            num_readonly_signed,
            num_readonly_unsigned,
            account_keys,
            recent_blockhash,
            instructions: compiled,
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = vec![
            self.num_required_signatures,
            self.num_readonly_signed,
            self.num_readonly_unsigned,
        ];
        write_compact_u16(&mut out, self.account_keys.len());
        for key in &self.account_keys {
            out.extend_from_slice(key.as_bytes());
        }
        out.extend_from_slice(&self.recent_blockhash);
        write_compact_u16(&mut out, self.instructions.len());
        for ix in &self.instructions {
            out.push(ix.program_index);
            write_compact_u16(&mut out, ix.accounts.len());
            out.extend_from_slice(&ix.accounts);
            write_compact_u16(&mut out, ix.data.len());
            out.extend_from_slice(&ix.data);
        }
        out
    }

    /// Sign with the only required signer and return the wire bytes together
    /// with the signature, which doubles as the transaction id.
    pub fn sign(&self, signer: &AuthorityKeypair) -> Result<(Vec<u8>, [u8; 64]), LedgerError> {
        if self.num_required_signatures != 1 || self.account_keys.first() != Some(&signer.address())
        {
            return Err(LedgerError::Unauthorized(format!(
                "message needs {} signatures, only {} can sign",
                self.num_required_signatures,
                signer.address()
            )));
        }
        let message = self.serialize();
        let signature = signer.sign(&message);
        let mut out = Vec::with_capacity(1 + 64 + message.len());
        write_compact_u16(&mut out, 1);
        out.extend_from_slice(&signature);
        out.extend_from_slice(&message);
        Ok((out, signature))
    }
}

/// Variable-length u16: seven bits per byte, high bit set on continuation.
fn write_compact_u16(out: &mut Vec<u8>, value: usize) {
    let mut rem = value as u16;
    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem == 0 {
            out.push(byte);
            return;
        }
        byte |= 0x80;
        out.push(byte);
    }
}
