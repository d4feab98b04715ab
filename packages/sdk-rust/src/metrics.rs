//! Bonding-curve fee counters.

use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::error::{Error, Result};
use crate::locator::{Locator, PoolAccount};
use crate::state::VirtualPoolState;
use crate::types::{CurrentFees, FeeMetricsSnapshot, TotalFees};

/// Current (unclaimed) partner/creator fees and lifetime trading fees.
///
/// Constant-product pools carry no partner/creator counters and are rejected.
pub async fn pool_fee_metrics(locator: &Locator<'_>, identifier: &Pubkey) -> Result<FeeMetricsSnapshot> {
    match locator.resolve_pool_account(identifier).await? {
        PoolAccount::BondingCurve { address, state } => {
            let snapshot = snapshot_from(&state);
            debug!(pool = %address, ?snapshot, "fee metrics");
            Ok(snapshot)
        }
        other => Err(Error::Validation(format!(
            "fee metrics are only available for bonding-curve pools; {} is a constant-product pool",
            other.address()
        ))),
    }
}

pub fn snapshot_from(state: &VirtualPoolState) -> FeeMetricsSnapshot {
    FeeMetricsSnapshot {
        current: CurrentFees {
            partner_base_fee:  state.partner_base_fee as u128,
            partner_quote_fee: state.partner_quote_fee as u128,
            creator_base_fee:  state.creator_base_fee as u128,
            creator_quote_fee: state.creator_quote_fee as u128,
        },
        total: TotalFees {
            total_trading_base_fee:  state.total_trading_base_fee as u128,
            total_trading_quote_fee: state.total_trading_quote_fee as u128,
        },
    }
}
