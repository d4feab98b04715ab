//! On-chain account deserialization.
//!
//! Parses raw account bytes for the DBC `VirtualPool` / `PoolConfig` and the
//! cp-amm `Pool` / `Position` accounts, plus packed SPL token accounts. Byte
//! offsets include the 8-byte Anchor discriminator. Only the fields the client
//! reads are decoded; trailing padding and reserved space are ignored.

use solana_sdk::{hash::hash, pubkey::Pubkey};

use crate::error::{Error, Result};

// ─── Discriminators ───────────────────────────────────────────────────────────

/// Anchor account discriminator: `sha256("account:{TypeName}")[..8]`.
pub fn account_discriminator(type_name: &str) -> [u8; 8] {
    let h = hash(format!("account:{type_name}").as_bytes()).to_bytes();
    let mut out = [0u8; 8];
    out.copy_from_slice(&h[..8]);
    out
}

pub const VIRTUAL_POOL_ACCOUNT: &str = "VirtualPool";
pub const POOL_CONFIG_ACCOUNT:  &str = "PoolConfig";
pub const CP_AMM_POOL_ACCOUNT:  &str = "Pool";
pub const POSITION_ACCOUNT:     &str = "Position";

/// `true` when `data` starts with the discriminator of `type_name`.
pub fn has_discriminator(data: &[u8], type_name: &str) -> bool {
    data.len() >= 8 && data[..8] == account_discriminator(type_name)
}

// ─── DBC VirtualPool ──────────────────────────────────────────────────────────

pub const VIRTUAL_POOL_LEN: usize = 368;
/// Offset of `base_mint`, used for program-account scans by mint.
pub const VIRTUAL_POOL_BASE_MINT_OFFSET: usize = 136;

/// Deserialized DBC `VirtualPool` state.
///
/// ```text
/// disc(8) volatility_tracker(64) config(32) creator(32) base_mint(32)
/// base_vault(32) quote_vault(32) base_reserve(8) quote_reserve(8)
/// protocol_base_fee(8) protocol_quote_fee(8) partner_base_fee(8)
/// partner_quote_fee(8) sqrt_price(16) activation_point(8) pool_type(1)
/// is_migrated(1) .. migration_progress(1) .. metrics(32)
/// finish_curve_timestamp(8) creator_base_fee(8) creator_quote_fee(8)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualPoolState {
    pub config:              Pubkey,
    pub creator:             Pubkey,
    pub base_mint:           Pubkey,
    pub base_vault:          Pubkey,
    pub quote_vault:         Pubkey,
    pub base_reserve:        u64,
    pub quote_reserve:       u64,
    pub protocol_base_fee:   u64,
    pub protocol_quote_fee:  u64,
    pub partner_base_fee:    u64,
    pub partner_quote_fee:   u64,
    pub sqrt_price:          u128,
    pub activation_point:    u64,
    pub pool_type:           u8,
    pub is_migrated:         bool,
    pub migration_progress:  u8,
    pub total_trading_base_fee:  u64,
    pub total_trading_quote_fee: u64,
    pub finish_curve_timestamp:  u64,
    pub creator_base_fee:    u64,
    pub creator_quote_fee:   u64,
}

pub fn parse_virtual_pool(data: &[u8]) -> Result<VirtualPoolState> {
    require_len(data, VIRTUAL_POOL_LEN, VIRTUAL_POOL_ACCOUNT)?;
    Ok(VirtualPoolState {
        config:                  read_pubkey(data, 72)?,
        creator:                 read_pubkey(data, 104)?,
        base_mint:               read_pubkey(data, VIRTUAL_POOL_BASE_MINT_OFFSET)?,
        base_vault:              read_pubkey(data, 168)?,
        quote_vault:             read_pubkey(data, 200)?,
        base_reserve:            read_u64(data, 232)?,
        quote_reserve:           read_u64(data, 240)?,
        protocol_base_fee:       read_u64(data, 248)?,
        protocol_quote_fee:      read_u64(data, 256)?,
        partner_base_fee:        read_u64(data, 264)?,
        partner_quote_fee:       read_u64(data, 272)?,
        sqrt_price:              read_u128(data, 280)?,
        activation_point:        read_u64(data, 296)?,
        pool_type:               read_u8(data, 304)?,
        is_migrated:             read_u8(data, 305)? != 0,
        migration_progress:      read_u8(data, 308)?,
        total_trading_base_fee:  read_u64(data, 328)?,
        total_trading_quote_fee: read_u64(data, 336)?,
        finish_curve_timestamp:  read_u64(data, 344)?,
        creator_base_fee:        read_u64(data, 352)?,
        creator_quote_fee:       read_u64(data, 360)?,
    })
}

// ─── DBC PoolConfig ───────────────────────────────────────────────────────────

pub const POOL_CONFIG_LEN: usize = 272;

/// Deserialized DBC `PoolConfig` state (the fields the client needs).
///
/// ```text
/// disc(8) quote_mint(32) fee_claimer(32) leftover_receiver(32)
/// pool_fees(128) collect_fee_mode(1) migration_option(1) activation_type(1)
/// token_decimal(1) version(1) token_type(1) quote_token_flag(1)
/// partner_locked_lp_percentage(1) partner_lp_percentage(1)
/// creator_locked_lp_percentage(1) creator_lp_percentage(1)
/// migration_fee_option(1) .. swap_base_amount(8) migration_quote_threshold(8)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfigState {
    pub quote_mint:                Pubkey,
    pub fee_claimer:               Pubkey,
    pub leftover_receiver:         Pubkey,
    pub migration_fee_option:      u8,
    pub swap_base_amount:          u64,
    pub migration_quote_threshold: u64,
}

pub fn parse_pool_config(data: &[u8]) -> Result<PoolConfigState> {
    require_len(data, POOL_CONFIG_LEN, POOL_CONFIG_ACCOUNT)?;
    Ok(PoolConfigState {
        quote_mint:                read_pubkey(data, 8)?,
        fee_claimer:               read_pubkey(data, 40)?,
        leftover_receiver:         read_pubkey(data, 72)?,
        migration_fee_option:      read_u8(data, 243)?,
        swap_base_amount:          read_u64(data, 256)?,
        migration_quote_threshold: read_u64(data, 264)?,
    })
}

// ─── cp-amm Pool ──────────────────────────────────────────────────────────────

pub const CP_AMM_POOL_LEN: usize = 680;

/// Deserialized cp-amm `Pool` state.
///
/// Fee accumulators are 256-bit little-endian values; they are kept as raw
/// bytes and widened in [`crate::math`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpAmmPoolState {
    pub token_a_mint:      Pubkey,
    pub token_b_mint:      Pubkey,
    pub token_a_vault:     Pubkey,
    pub token_b_vault:     Pubkey,
    pub whitelisted_vault: Pubkey,
    pub partner:           Pubkey,
    pub liquidity:         u128,
    pub protocol_a_fee:    u64,
    pub protocol_b_fee:    u64,
    pub partner_a_fee:     u64,
    pub partner_b_fee:     u64,
    pub sqrt_price:        u128,
    pub fee_a_per_liquidity: [u8; 32],
    pub fee_b_per_liquidity: [u8; 32],
    pub permanent_lock_liquidity: u128,
    pub creator:           Pubkey,
}

pub fn parse_cp_amm_pool(data: &[u8]) -> Result<CpAmmPoolState> {
    require_len(data, CP_AMM_POOL_LEN, CP_AMM_POOL_ACCOUNT)?;
    Ok(CpAmmPoolState {
        token_a_mint:             read_pubkey(data, 168)?,
        token_b_mint:             read_pubkey(data, 200)?,
        token_a_vault:            read_pubkey(data, 232)?,
        token_b_vault:            read_pubkey(data, 264)?,
        whitelisted_vault:        read_pubkey(data, 296)?,
        partner:                  read_pubkey(data, 328)?,
        liquidity:                read_u128(data, 360)?,
        protocol_a_fee:           read_u64(data, 392)?,
        protocol_b_fee:           read_u64(data, 400)?,
        partner_a_fee:            read_u64(data, 408)?,
        partner_b_fee:            read_u64(data, 416)?,
        sqrt_price:               read_u128(data, 456)?,
        fee_a_per_liquidity:      read_bytes32(data, 488)?,
        fee_b_per_liquidity:      read_bytes32(data, 520)?,
        permanent_lock_liquidity: read_u128(data, 552)?,
        creator:                  read_pubkey(data, 648)?,
    })
}

// ─── cp-amm Position ──────────────────────────────────────────────────────────

pub const POSITION_LEN: usize = 216;

/// Deserialized cp-amm `Position` state.
///
/// ```text
/// disc(8) pool(32) nft_mint(32) fee_a_per_token_checkpoint(32)
/// fee_b_per_token_checkpoint(32) fee_a_pending(8) fee_b_pending(8)
/// unlocked_liquidity(16) vested_liquidity(16) permanent_locked_liquidity(16)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpAmmPositionState {
    pub pool:     Pubkey,
    pub nft_mint: Pubkey,
    pub fee_a_per_token_checkpoint: [u8; 32],
    pub fee_b_per_token_checkpoint: [u8; 32],
    /// Fees accrued at the last sync but not yet claimed.
    pub fee_a_pending: u64,
    pub fee_b_pending: u64,
    pub unlocked_liquidity:         u128,
    pub vested_liquidity:           u128,
    pub permanent_locked_liquidity: u128,
}

impl CpAmmPositionState {
    /// Liquidity that earns fees: unlocked, vested and permanently locked.
    pub fn total_liquidity(&self) -> u128 {
        self.unlocked_liquidity
            .saturating_add(self.vested_liquidity)
            .saturating_add(self.permanent_locked_liquidity)
    }
}

pub fn parse_cp_amm_position(data: &[u8]) -> Result<CpAmmPositionState> {
    require_len(data, POSITION_LEN, POSITION_ACCOUNT)?;
    Ok(CpAmmPositionState {
        pool:                       read_pubkey(data, 8)?,
        nft_mint:                   read_pubkey(data, 40)?,
        fee_a_per_token_checkpoint: read_bytes32(data, 72)?,
        fee_b_per_token_checkpoint: read_bytes32(data, 104)?,
        fee_a_pending:              read_u64(data, 136)?,
        fee_b_pending:              read_u64(data, 144)?,
        unlocked_liquidity:         read_u128(data, 152)?,
        vested_liquidity:           read_u128(data, 168)?,
        permanent_locked_liquidity: read_u128(data, 184)?,
    })
}

// ─── SPL token account ────────────────────────────────────────────────────────

/// Base length of a packed token account; Token-2022 accounts may be longer.
pub const TOKEN_ACCOUNT_LEN: usize = 165;
pub const TOKEN_ACCOUNT_OWNER_OFFSET: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAccountState {
    pub mint:   Pubkey,
    pub owner:  Pubkey,
    pub amount: u64,
}

/// Token account layout: `mint(32) owner(32) amount(8) …`
pub fn parse_token_account(data: &[u8]) -> Result<TokenAccountState> {
    require_len(data, TOKEN_ACCOUNT_LEN, "Token account")?;
    Ok(TokenAccountState {
        mint:   read_pubkey(data, 0)?,
        owner:  read_pubkey(data, TOKEN_ACCOUNT_OWNER_OFFSET)?,
        amount: read_u64(data, 64)?,
    })
}

// ─── Byte-slice primitives ────────────────────────────────────────────────────

fn require_len(data: &[u8], expected: usize, what: &str) -> Result<()> {
    if data.len() < expected {
        return Err(Error::ParseError {
            offset: 0,
            reason: format!("{what} account is {} bytes; expected {expected}", data.len()),
        });
    }
    Ok(())
}

fn field<const N: usize>(data: &[u8], offset: usize, ty: &str) -> Result<[u8; N]> {
    data.get(offset..offset + N)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| Error::ParseError {
            offset,
            reason: format!("slice too short for {ty} ({N} bytes)"),
        })
}

pub(crate) fn read_pubkey(data: &[u8], offset: usize) -> Result<Pubkey> {
    Ok(Pubkey::from(field::<32>(data, offset, "Pubkey")?))
}

pub(crate) fn read_bytes32(data: &[u8], offset: usize) -> Result<[u8; 32]> {
    field::<32>(data, offset, "u256")
}

pub(crate) fn read_u8(data: &[u8], offset: usize) -> Result<u8> {
    Ok(field::<1>(data, offset, "u8")?[0])
}

pub(crate) fn read_u64(data: &[u8], offset: usize) -> Result<u64> {
    Ok(u64::from_le_bytes(field(data, offset, "u64")?))
}

pub(crate) fn read_u128(data: &[u8], offset: usize) -> Result<u128> {
    Ok(u128::from_le_bytes(field(data, offset, "u128")?))
}
