//! Fee-claimer authorization.

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::gateway::LedgerGateway;
use crate::state::parse_pool_config;
use crate::types::{AuthorizationBypass, Pool, PoolKind};

/// Outcome of a fee-claimer check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Authorization {
    pub permitted: bool,
    /// Fee claimer declared on chain; `None` when it could not be determined.
    pub expected:  Option<Pubkey>,
    pub actual:    Pubkey,
    pub skipped:   bool,
}

impl Authorization {
    /// Turn a denial into [`Error::Authorization`].
    pub fn into_result(self, pool: Pubkey) -> Result<Self> {
        if self.permitted {
            Ok(self)
        } else {
            Err(Error::Authorization { pool, expected: self.expected, actual: self.actual })
        }
    }
}

/// Compare `caller` with the fee claimer declared for `pool`.
///
/// For bonding-curve pools the claimer is re-read from the pool's
/// configuration account. A missing or unreadable configuration denies.
pub async fn check_fee_claimer(
    gateway: &dyn LedgerGateway,
    pool:    &Pool,
    caller:  Pubkey,
    bypass:  AuthorizationBypass,
) -> Result<Authorization> {
    if bypass == AuthorizationBypass::Skip {
        warn!(pool = %pool.address, %caller, "fee-claimer validation skipped");
        return Ok(Authorization { permitted: true, expected: None, actual: caller, skipped: true });
    }

    let expected = match pool.kind {
        PoolKind::BondingCurve => declared_fee_claimer(gateway, pool.config.as_ref()).await?,
        PoolKind::ConstantProduct => pool.fee_claimer,
    };
    let permitted = expected == Some(caller);
    debug!(pool = %pool.address, %caller, ?expected, permitted, "fee-claimer check");
    Ok(Authorization { permitted, expected, actual: caller, skipped: false })
}

async fn declared_fee_claimer(gateway: &dyn LedgerGateway, config: Option<&Pubkey>) -> Result<Option<Pubkey>> {
    let Some(config) = config else {
        return Ok(None);
    };
    let Some(account) = gateway.get_account(config).await? else {
        warn!(%config, "pool config account missing");
        return Ok(None);
    };
    match parse_pool_config(&account.data) {
        Ok(state) if state.fee_claimer != Pubkey::default() => Ok(Some(state.fee_claimer)),
        Ok(_) => Ok(None),
        Err(e) => {
            warn!(%config, error = %e, "pool config unreadable");
            Ok(None)
        }
    }
}
