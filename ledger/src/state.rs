//! On-ledger account layouts.
//!
//! Accounts are an 8-byte type tag followed by little-endian fields in
//! declaration order. Trailing bytes (bumps, padding) are ignored.

use crate::LedgerError;
use ecobuild_crypto::account_discriminator;
use ecobuild_types::Address;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerProfileAccount {
    pub authority: Address,
    pub bump: u8,
    pub total_credits: u64,
    pub blocks_minted: u64,
    pub brick_count: u64,
    pub collections_count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalConfigAccount {
    pub authority: Address,
    pub block_mint: Address,
    pub total_blocks_minted: u64,
    pub total_bricks_created: u64,
}

impl PlayerProfileAccount {
    pub const NAME: &'static str = "PlayerProfile";

    pub fn decode(data: &[u8]) -> Result<Self, LedgerError> {
        let mut reader = Reader::new(Self::NAME, data)?;
        Ok(Self {
            authority: reader.address()?,
            bump: reader.u8()?,
            total_credits: reader.u64()?,
            blocks_minted: reader.u64()?,
            brick_count: reader.u64()?,
            collections_count: reader.u64()?,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = account_discriminator(Self::NAME).to_vec();
        out.extend_from_slice(self.authority.as_bytes());
        out.push(self.bump);
        for field in [
            self.total_credits,
            self.blocks_minted,
            self.brick_count,
            self.collections_count,
        ] {
            out.extend_from_slice(&field.to_le_bytes());
        }
        out
    }
}

impl GlobalConfigAccount {
    pub const NAME: &'static str = "GlobalConfig";

    pub fn decode(data: &[u8]) -> Result<Self, LedgerError> {
        let mut reader = Reader::new(Self::NAME, data)?;
        Ok(Self {
            authority: reader.address()?,
            block_mint: reader.address()?,
            total_blocks_minted: reader.u64()?,
            total_bricks_created: reader.u64()?,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = account_discriminator(Self::NAME).to_vec();
        out.extend_from_slice(self.authority.as_bytes());
        out.extend_from_slice(self.block_mint.as_bytes());
        out.extend_from_slice(&self.total_blocks_minted.to_le_bytes());
        out.extend_from_slice(&self.total_bricks_created.to_le_bytes());
        out
    }
}

struct Reader<'a> {
    name: &'static str,
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(name: &'static str, data: &'a [u8]) -> Result<Self, LedgerError> {
        if data.len() < 8 || data[..8] != account_discriminator(name) {
            return Err(LedgerError::InvalidResponse(format!(
                "account is not a {name}"
            )));
        }
        Ok(Self {
            name,
            data: &data[8..],
        })
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], LedgerError> {
        if self.data.len() < n {
            return Err(LedgerError::InvalidResponse(format!(
                "{} account data truncated",
                self.name
            )));
        }
        let (head, rest) = self.data.split_at(n);
        self.data = rest;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8, LedgerError> {
        Ok(self.take(1)?[0])
    }

    fn u64(&mut self) -> Result<u64, LedgerError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(buf))
    }

    fn address(&mut self) -> Result<Address, LedgerError> {
        let mut buf = [0u8; 32];
        buf.copy_from_slice(self.take(32)?);
        Ok(Address::new(buf))
    }
}
