//! Split and fee arithmetic.
//!
//! Mirrors the on-chain arithmetic so off-chain figures match what the
//! programs will compute.

use num_bigint::BigUint;

use crate::error::{Error, Result};
use crate::state::{CpAmmPoolState, CpAmmPositionState};
use crate::types::FeeAmounts;

// ─── Constants ────────────────────────────────────────────────────────────────

/// Denominator of the `split_position2` numerator: 1e9 means "everything".
pub const SPLIT_POSITION_DENOMINATOR: u32 = 1_000_000_000;

/// Fee-per-liquidity accumulators are Q128 fixed-point.
const FEE_SCALE_BITS: u32 = 128;

// ─── Split ────────────────────────────────────────────────────────────────────

/// `floor(SPLIT_POSITION_DENOMINATOR × percent / 100)`.
///
/// `percent` must satisfy `0 < percent <= 100`; NaN and infinities are rejected.
pub fn split_numerator(percent: f64) -> Result<u32> {
    if !percent.is_finite() || percent <= 0.0 || percent > 100.0 {
        return Err(Error::Validation(format!(
            "split percentage must be in (0, 100], got {percent}"
        )));
    }
    let numerator = (SPLIT_POSITION_DENOMINATOR as f64 * percent / 100.0).floor();
    if numerator < 1.0 {
        return Err(Error::Validation(format!(
            "split percentage {percent} is too small to move any liquidity"
        )));
    }
    Ok(numerator as u32)
}

/// Liquidity moved by a split: `floor(liquidity × numerator / denominator)`.
pub fn split_liquidity(liquidity: u128, numerator: u32) -> Result<u128> {
    let moved = BigUint::from(liquidity) * numerator / SPLIT_POSITION_DENOMINATOR;
    u128::try_from(moved).map_err(|_| Error::MathOverflow)
}

// ─── Unclaimed fees ───────────────────────────────────────────────────────────

/// Fees a position has earned but not yet claimed.
///
/// `pending + total_liquidity × (fee_per_liquidity − checkpoint) >> 128`,
/// evaluated per token with 256-bit accumulators.
pub fn unclaimed_position_fees(
    pool:     &CpAmmPoolState,
    position: &CpAmmPositionState,
) -> Result<FeeAmounts> {
    let liquidity = position.total_liquidity();
    let base = accrued(
        liquidity,
        &pool.fee_a_per_liquidity,
        &position.fee_a_per_token_checkpoint,
        position.fee_a_pending,
    )?;
    let quote = accrued(
        liquidity,
        &pool.fee_b_per_liquidity,
        &position.fee_b_per_token_checkpoint,
        position.fee_b_pending,
    )?;
    Ok(FeeAmounts { base, quote })
}

fn accrued(liquidity: u128, global: &[u8; 32], checkpoint: &[u8; 32], pending: u64) -> Result<u128> {
    let global = BigUint::from_bytes_le(global);
    let checkpoint = BigUint::from_bytes_le(checkpoint);
    // Accumulators only grow; a checkpoint ahead of the pool means stale pool data.
    let delta = if global > checkpoint { global - checkpoint } else { BigUint::default() };
    let new_fees = (BigUint::from(liquidity) * delta) >> FEE_SCALE_BITS;
    let total = new_fees + pending;
    u128::try_from(total).map_err(|_| Error::MathOverflow)
}

// ─── Curve progress ───────────────────────────────────────────────────────────

/// `quote_reserve / migration_quote_threshold`, clamped to `[0, 1]`.
pub fn curve_progress(quote_reserve: u64, migration_quote_threshold: u64) -> f64 {
    if migration_quote_threshold == 0 {
        return 0.0;
    }
    (quote_reserve as f64 / migration_quote_threshold as f64).clamp(0.0, 1.0)
}
