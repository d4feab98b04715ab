//! Meteora instruction builders.
//!
//! [`MeteoraSdk`] implements [`ProtocolSdk`] for the Dynamic Bonding Curve
//! and DAMM v2 (cp-amm) programs. Account order mirrors the programs'
//! `#[derive(Accounts)]` structs exactly.
//!
//! Anchor instruction discriminators: `sha256("global:{name}")[..8]`.

use solana_sdk::{
    hash::hash,
    instruction::{AccountMeta, Instruction},
    pubkey,
    pubkey::Pubkey,
    system_program,
};
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;

use crate::error::{Error, Result};
use crate::math::unclaimed_position_fees;
use crate::protocol::{
    BondingCurveClaim, CreatePosition, FeeAccounting, PositionClaim, ProtocolSdk, SplitPosition,
};
use crate::state::{CpAmmPoolState, CpAmmPositionState};
use crate::token_program::{associated_token_address, TokenProgram};
use crate::types::FeeAmounts;

// ─── Program IDs ──────────────────────────────────────────────────────────────

pub const DBC_PROGRAM_ID:    Pubkey = pubkey!("dbcij3LWUppWqq96dh6gJWwBifmcGfLSB5D4DuSMaqN");
pub const CP_AMM_PROGRAM_ID: Pubkey = pubkey!("cpamdpZCGKUy5JxQXB4dcpGPiikHawvSWAd6mEn1sGG");

/// DAMM v2 configurations a graduated DBC pool migrates into, indexed by the
/// DBC config's `migration_fee_option`.
pub const DAMM_V2_MIGRATION_CONFIGS: [Pubkey; 7] = [
    pubkey!("7F6dnUcRuyM2TwR8myT1dYypFXpPSxqwKNSFNkxyNESd"), // 0.25%
    pubkey!("2nHK1kju6XjphBLbNxpM5XRGFj7p9U8vvNzyZiha1z6k"), // 0.3%
    pubkey!("Hv8Lmzmnju6m7kcokVKvwqz7QPmdX9XfKjJsXz8RXcjp"), // 1%
    pubkey!("2c4cYd4reUYVRAB9kUUkrq55VPyy2FNQ3FDL4o12JXmq"), // 2%
    pubkey!("AkmQWebAwFvWk55wBoCr5D62C6VVDTzi84NJuD9H7cFD"), // 4%
    pubkey!("DbCRBj8McvPYHJG1ukj8RE15h2dCNUdTAESG49XpQ44u"), // 6%
    pubkey!("A8gMrEPJkacWkcb3DGwtJwTe16HktSEfvwtuDh2MCtck"), // customizable
];

// ─── PDA seeds ────────────────────────────────────────────────────────────────

pub const POOL_SEED:                 &[u8] = b"pool";
pub const POOL_AUTHORITY_SEED:       &[u8] = b"pool_authority";
pub const POSITION_SEED:             &[u8] = b"position";
pub const POSITION_NFT_ACCOUNT_SEED: &[u8] = b"position_nft_account";
pub const EVENT_AUTHORITY_SEED:      &[u8] = b"__event_authority";

// ─── PDA derivation helpers ───────────────────────────────────────────────────

/// Pool authority PDA that signs for vault transfers.
pub fn derive_pool_authority(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[POOL_AUTHORITY_SEED], program_id).0
}

/// Anchor `#[event_cpi]` authority.
pub fn derive_event_authority(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[EVENT_AUTHORITY_SEED], program_id).0
}

pub fn derive_position(nft_mint: &Pubkey, program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[POSITION_SEED, nft_mint.as_ref()], program_id).0
}

pub fn derive_position_nft_account(nft_mint: &Pubkey, program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[POSITION_NFT_ACCOUNT_SEED, nft_mint.as_ref()], program_id).0
}

/// cp-amm pool for a config and mint pair. The larger mint goes first.
pub fn derive_cp_amm_pool(config: &Pubkey, mint_a: &Pubkey, mint_b: &Pubkey, program_id: &Pubkey) -> Pubkey {
    let (first, second) = if mint_a > mint_b { (mint_a, mint_b) } else { (mint_b, mint_a) };
    Pubkey::find_program_address(
        &[POOL_SEED, config.as_ref(), first.as_ref(), second.as_ref()],
        program_id,
    )
    .0
}

// ─── Discriminator ────────────────────────────────────────────────────────────

pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    let h = hash(format!("global:{name}").as_bytes()).to_bytes();
    let mut out = [0u8; 8];
    out.copy_from_slice(&h[..8]);
    out
}

// ─── Fee accounting ───────────────────────────────────────────────────────────

/// Accumulator-based fee accounting of cp-amm positions.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpAmmFeeAccounting;

impl FeeAccounting for CpAmmFeeAccounting {
    fn version(&self) -> u32 {
        1
    }

    fn unclaimed_fees(&self, pool: &CpAmmPoolState, position: &CpAmmPositionState) -> Result<FeeAmounts> {
        unclaimed_position_fees(pool, position)
    }
}

// ─── SDK ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MeteoraSdk {
    dbc_program:    Pubkey,
    cp_amm_program: Pubkey,
    accounting:     CpAmmFeeAccounting,
}

impl Default for MeteoraSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl MeteoraSdk {
    /// Builders for the mainnet program deployments.
    pub fn new() -> Self {
        Self::with_program_ids(DBC_PROGRAM_ID, CP_AMM_PROGRAM_ID)
    }

    /// Override the program IDs (useful for locally deployed programs).
    pub fn with_program_ids(dbc_program: Pubkey, cp_amm_program: Pubkey) -> Self {
        Self { dbc_program, cp_amm_program, accounting: CpAmmFeeAccounting }
    }

    fn bonding_curve_claim(
        &self,
        name:    &str,
        request: &BondingCurveClaim<'_>,
        config:  Option<Pubkey>,
    ) -> Result<Vec<Instruction>> {
        let pool = request.pool;
        let claimant = request.claimant;
        let token_a_account = associated_token_address(&claimant, &pool.base_mint, request.base_program);
        let token_b_account = associated_token_address(&claimant, &pool.quote_mint, request.quote_program);

        let mut data = instruction_discriminator(name).to_vec();
        data.extend_from_slice(&request.bounds.max_base_amount.to_le_bytes());
        data.extend_from_slice(&request.bounds.max_quote_amount.to_le_bytes());

        let mut accounts = vec![AccountMeta::new_readonly(derive_pool_authority(&self.dbc_program), false)];
        if let Some(config) = config {
            accounts.push(AccountMeta::new_readonly(config, false));
        }
        accounts.extend([
            AccountMeta::new(pool.address,       false),  // mut
            AccountMeta::new(token_a_account,    false),  // mut
            AccountMeta::new(token_b_account,    false),  // mut
            AccountMeta::new(pool.base_vault,    false),  // mut
            AccountMeta::new(pool.quote_vault,   false),  // mut
            AccountMeta::new_readonly(pool.base_mint,  false),
            AccountMeta::new_readonly(pool.quote_mint, false),
            AccountMeta::new_readonly(claimant,  true),   // signer
            AccountMeta::new_readonly(request.base_program.id(),  false),
            AccountMeta::new_readonly(request.quote_program.id(), false),
            AccountMeta::new_readonly(derive_event_authority(&self.dbc_program), false),
            AccountMeta::new_readonly(self.dbc_program, false),
        ]);

        Ok(vec![
            create_associated_token_account_idempotent(
                &claimant, &claimant, &pool.base_mint, &request.base_program.id(),
            ),
            create_associated_token_account_idempotent(
                &claimant, &claimant, &pool.quote_mint, &request.quote_program.id(),
            ),
            Instruction { program_id: self.dbc_program, accounts, data },
        ])
    }
}

impl ProtocolSdk for MeteoraSdk {
    fn bonding_curve_program(&self) -> Pubkey {
        self.dbc_program
    }

    fn constant_product_program(&self) -> Pubkey {
        self.cp_amm_program
    }

    fn position_address(&self, nft_mint: &Pubkey) -> Pubkey {
        derive_position(nft_mint, &self.cp_amm_program)
    }

    fn position_nft_account(&self, nft_mint: &Pubkey) -> Pubkey {
        derive_position_nft_account(nft_mint, &self.cp_amm_program)
    }

    fn migrated_pool_address(
        &self,
        migration_fee_option: u8,
        base_mint: &Pubkey,
        quote_mint: &Pubkey,
    ) -> Result<Pubkey> {
        let config = DAMM_V2_MIGRATION_CONFIGS
            .get(migration_fee_option as usize)
            .ok_or_else(|| {
                Error::Validation(format!("unknown migration fee option {migration_fee_option}"))
            })?;
        Ok(derive_cp_amm_pool(config, base_mint, quote_mint, &self.cp_amm_program))
    }

    // ── claim_trading_fee ────────────────────────────────────────────────────

    fn claim_partner_fee(&self, request: &BondingCurveClaim<'_>) -> Result<Vec<Instruction>> {
        let config = request
            .pool
            .config
            .ok_or_else(|| Error::Instruction("bonding-curve pool has no config".into()))?;
        self.bonding_curve_claim("claim_trading_fee", request, Some(config))
    }

    // ── claim_creator_trading_fee ────────────────────────────────────────────

    fn claim_creator_fee(&self, request: &BondingCurveClaim<'_>) -> Result<Vec<Instruction>> {
        self.bonding_curve_claim("claim_creator_trading_fee", request, None)
    }

    // ── claim_position_fee ───────────────────────────────────────────────────

    fn claim_position_fee(&self, request: &PositionClaim<'_>) -> Result<Vec<Instruction>> {
        let pool = request.pool;
        let owner = request.owner;
        let token_a_account = associated_token_address(&owner, &pool.token_a_mint, pool.token_a_program);
        let token_b_account = associated_token_address(&owner, &pool.token_b_mint, pool.token_b_program);

        let ix = Instruction {
            program_id: self.cp_amm_program,
            accounts: vec![
                AccountMeta::new_readonly(derive_pool_authority(&self.cp_amm_program), false),
                AccountMeta::new_readonly(pool.address,          false),
                AccountMeta::new(request.position.address,       false),  // mut
                AccountMeta::new(token_a_account,                false),  // mut
                AccountMeta::new(token_b_account,                false),  // mut
                AccountMeta::new(pool.token_a_vault,             false),  // mut
                AccountMeta::new(pool.token_b_vault,             false),  // mut
                AccountMeta::new_readonly(pool.token_a_mint,     false),
                AccountMeta::new_readonly(pool.token_b_mint,     false),
                AccountMeta::new_readonly(request.position.nft_account, false),
                AccountMeta::new_readonly(owner,                 true),   // signer
                AccountMeta::new_readonly(pool.token_a_program.id(), false),
                AccountMeta::new_readonly(pool.token_b_program.id(), false),
                AccountMeta::new_readonly(derive_event_authority(&self.cp_amm_program), false),
                AccountMeta::new_readonly(self.cp_amm_program,   false),
            ],
            data: instruction_discriminator("claim_position_fee").to_vec(),
        };

        Ok(vec![
            create_associated_token_account_idempotent(
                &owner, &owner, &pool.token_a_mint, &pool.token_a_program.id(),
            ),
            create_associated_token_account_idempotent(
                &owner, &owner, &pool.token_b_mint, &pool.token_b_program.id(),
            ),
            ix,
        ])
    }

    // ── create_position ──────────────────────────────────────────────────────

    fn create_position(&self, request: &CreatePosition) -> Result<Vec<Instruction>> {
        let program = self.cp_amm_program;
        Ok(vec![Instruction {
            program_id: program,
            accounts: vec![
                AccountMeta::new_readonly(request.owner, false),
                AccountMeta::new(request.nft_mint,       true),   // mut + signer (init)
                AccountMeta::new(derive_position_nft_account(&request.nft_mint, &program), false),
                AccountMeta::new(request.pool,           false),  // mut
                AccountMeta::new(derive_position(&request.nft_mint, &program), false),
                AccountMeta::new_readonly(derive_pool_authority(&program), false),
                AccountMeta::new(request.payer,          true),   // mut + signer
                AccountMeta::new_readonly(TokenProgram::Extended.id(), false),
                AccountMeta::new_readonly(system_program::ID, false),
                AccountMeta::new_readonly(derive_event_authority(&program), false),
                AccountMeta::new_readonly(program,       false),
            ],
            data: instruction_discriminator("create_position").to_vec(),
        }])
    }

    // ── split_position2 ──────────────────────────────────────────────────────

    fn split_position(&self, request: &SplitPosition) -> Result<Vec<Instruction>> {
        let program = self.cp_amm_program;
        let mut data = instruction_discriminator("split_position2").to_vec();
        data.extend_from_slice(&request.numerator.to_le_bytes());

        Ok(vec![Instruction {
            program_id: program,
            accounts: vec![
                AccountMeta::new(request.pool,                        false),  // mut
                AccountMeta::new(request.first_position,              false),  // mut
                AccountMeta::new_readonly(request.first_nft_account,  false),
                AccountMeta::new(request.second_position,             false),  // mut
                AccountMeta::new_readonly(request.second_nft_account, false),
                AccountMeta::new_readonly(request.first_owner,        true),   // signer
                AccountMeta::new_readonly(request.second_owner,       true),   // signer
                AccountMeta::new_readonly(derive_event_authority(&program), false),
                AccountMeta::new_readonly(program,                    false),
            ],
            data,
        }])
    }

    fn fee_accounting(&self) -> Option<&dyn FeeAccounting> {
        Some(&self.accounting)
    }
}
