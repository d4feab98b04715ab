//! Token program resolution.
//!
//! A mint belongs either to the original SPL Token program or to Token-2022.
//! Every instruction touching the mint's accounts must name the right one, so
//! the owner is read from chain on each call.

use serde::Serialize;
use solana_sdk::{instruction::Instruction, pubkey::Pubkey};
use spl_associated_token_account::{
    get_associated_token_address_with_program_id, instruction::create_associated_token_account,
};

use crate::error::{Error, Result};
use crate::gateway::LedgerGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenProgram {
    /// `TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`
    Standard,
    /// `TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb`
    Extended,
}

impl TokenProgram {
    pub fn id(self) -> Pubkey {
        match self {
            TokenProgram::Standard => spl_token::ID,
            TokenProgram::Extended => spl_token_2022::ID,
        }
    }

    /// Classify a program id; `None` for anything that is not a token program.
    pub fn from_owner(owner: &Pubkey) -> Option<Self> {
        if *owner == spl_token::ID {
            Some(TokenProgram::Standard)
        } else if *owner == spl_token_2022::ID {
            Some(TokenProgram::Extended)
        } else {
            None
        }
    }
}

/// Read `mint` and classify its owning program.
pub async fn resolve_token_program(gateway: &dyn LedgerGateway, mint: &Pubkey) -> Result<TokenProgram> {
    let account = gateway
        .get_account(mint)
        .await?
        .ok_or_else(|| Error::not_found("Mint", mint))?;
    TokenProgram::from_owner(&account.owner)
        .ok_or(Error::UnsupportedMintProgram { mint: *mint, owner: account.owner })
}

/// Resolve both mints of a pool. Each is classified independently.
pub async fn resolve_pair(
    gateway: &dyn LedgerGateway,
    mint_a:  &Pubkey,
    mint_b:  &Pubkey,
) -> Result<(TokenProgram, TokenProgram)> {
    let (a, b) = futures::try_join!(
        resolve_token_program(gateway, mint_a),
        resolve_token_program(gateway, mint_b),
    )?;
    Ok((a, b))
}

/// Associated token account of `owner` for `mint` under `program`. Pure derivation.
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey, program: TokenProgram) -> Pubkey {
    get_associated_token_address_with_program_id(owner, mint, &program.id())
}

/// Create `owner`'s associated account for `mint`, funded by `payer`.
pub fn create_associated_account_ix(
    payer:   &Pubkey,
    owner:   &Pubkey,
    mint:    &Pubkey,
    program: TokenProgram,
) -> Instruction {
    create_associated_token_account(payer, owner, mint, &program.id())
}

/// Move a single NFT unit (0 decimals) with `transfer_checked`.
///
/// The Token-2022 builder accepts either program id and encodes the same
/// instruction for both.
pub fn transfer_nft_ix(
    program:     TokenProgram,
    source:      &Pubkey,
    mint:        &Pubkey,
    destination: &Pubkey,
    authority:   &Pubkey,
) -> Result<Instruction> {
    spl_token_2022::instruction::transfer_checked(
        &program.id(), source, mint, destination, authority, &[], 1, 0,
    )
    .map_err(|e| Error::Instruction(format!("transfer_checked: {e}")))
}
