//! Protocol instruction seam.
//!
//! The workflows never assemble protocol instruction bytes themselves; they
//! describe what they want with the request structs below and hand them to a
//! [`ProtocolSdk`]. [`crate::instructions::MeteoraSdk`] is the implementation
//! for the deployed Meteora programs.

use solana_sdk::{instruction::Instruction, pubkey::Pubkey};

use crate::error::Result;
use crate::state::{CpAmmPoolState, CpAmmPositionState};
use crate::token_program::TokenProgram;
use crate::types::{ClaimBounds, FeeAmounts, Pool, PoolSummary, Position};

// ─── Requests ─────────────────────────────────────────────────────────────────

/// Partner or creator fee claim on a bonding-curve pool.
#[derive(Debug, Clone)]
pub struct BondingCurveClaim<'a> {
    pub pool:          &'a Pool,
    /// Signer receiving the fees (fee claimer or creator).
    pub claimant:      Pubkey,
    pub base_program:  TokenProgram,
    pub quote_program: TokenProgram,
    pub bounds:        ClaimBounds,
}

/// Fee claim on a constant-product position.
#[derive(Debug, Clone)]
pub struct PositionClaim<'a> {
    pub position: &'a Position,
    pub pool:     &'a PoolSummary,
    pub owner:    Pubkey,
    /// Carried for parity with the bonding-curve claims; cp-amm pays out the
    /// full unclaimed amount and does not take bounds.
    pub bounds:   ClaimBounds,
}

/// Open an empty position whose NFT is minted to `owner`.
#[derive(Debug, Clone, Copy)]
pub struct CreatePosition {
    pub pool:     Pubkey,
    pub owner:    Pubkey,
    pub payer:    Pubkey,
    /// Fresh keypair address; the mint must co-sign the transaction.
    pub nft_mint: Pubkey,
}

/// Move `numerator / SPLIT_POSITION_DENOMINATOR` of the first position into the second.
#[derive(Debug, Clone, Copy)]
pub struct SplitPosition {
    pub pool:               Pubkey,
    pub first_position:     Pubkey,
    pub first_nft_account:  Pubkey,
    pub second_position:    Pubkey,
    pub second_nft_account: Pubkey,
    pub first_owner:        Pubkey,
    pub second_owner:       Pubkey,
    pub numerator:          u32,
}

// ─── Traits ───────────────────────────────────────────────────────────────────

/// Versioned unclaimed-fee computation for constant-product positions.
pub trait FeeAccounting: Send + Sync {
    /// Bumped whenever the accounting formula changes.
    fn version(&self) -> u32;

    fn unclaimed_fees(&self, pool: &CpAmmPoolState, position: &CpAmmPositionState) -> Result<FeeAmounts>;
}

pub trait ProtocolSdk: Send + Sync {
    /// Program owning bonding-curve pools and configurations.
    fn bonding_curve_program(&self) -> Pubkey;

    /// Program owning constant-product pools and positions.
    fn constant_product_program(&self) -> Pubkey;

    /// Position account backing the NFT `nft_mint`.
    fn position_address(&self, nft_mint: &Pubkey) -> Pubkey;

    /// Token account the position NFT is minted into on creation.
    fn position_nft_account(&self, nft_mint: &Pubkey) -> Pubkey;

    /// Constant-product pool a graduated bonding-curve pool migrated to.
    fn migrated_pool_address(
        &self,
        migration_fee_option: u8,
        base_mint: &Pubkey,
        quote_mint: &Pubkey,
    ) -> Result<Pubkey>;

    fn claim_partner_fee(&self, request: &BondingCurveClaim<'_>) -> Result<Vec<Instruction>>;

    fn claim_creator_fee(&self, request: &BondingCurveClaim<'_>) -> Result<Vec<Instruction>>;

    fn claim_position_fee(&self, request: &PositionClaim<'_>) -> Result<Vec<Instruction>>;

    fn create_position(&self, request: &CreatePosition) -> Result<Vec<Instruction>>;

    fn split_position(&self, request: &SplitPosition) -> Result<Vec<Instruction>>;

    /// `None` when this SDK cannot compute unclaimed fees.
    fn fee_accounting(&self) -> Option<&dyn FeeAccounting>;
}
