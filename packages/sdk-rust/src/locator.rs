//! Pool and position lookup.
//!
//! Everything here is read fresh from the ledger on each call.

use std::sync::Arc;

use futures::future::try_join_all;
use solana_sdk::{account::Account, pubkey::Pubkey};
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use crate::error::{Error, Result};
use crate::gateway::{AccountFilter, LedgerGateway};
use crate::math::curve_progress;
use crate::protocol::{FeeAccounting, ProtocolSdk};
use crate::state::{
    account_discriminator, has_discriminator, parse_cp_amm_pool, parse_cp_amm_position,
    parse_pool_config, parse_token_account, parse_virtual_pool, CpAmmPoolState,
    CpAmmPositionState, PoolConfigState, VirtualPoolState, CP_AMM_POOL_ACCOUNT,
    POSITION_ACCOUNT, TOKEN_ACCOUNT_OWNER_OFFSET, VIRTUAL_POOL_ACCOUNT,
    VIRTUAL_POOL_BASE_MINT_OFFSET,
};
use crate::token_program::{resolve_pair, TokenProgram};
use crate::types::{FeeAmounts, FeeSource, Pool, PoolKind, PoolSummary, Position, PositionInfo};

/// Default bound on concurrent enrichment reads.
pub const DEFAULT_FAN_OUT: usize = 8;

/// A pool account as found on chain.
#[derive(Debug, Clone)]
pub enum PoolAccount {
    BondingCurve { address: Pubkey, state: VirtualPoolState },
    ConstantProduct { address: Pubkey, state: CpAmmPoolState },
}

impl PoolAccount {
    pub fn address(&self) -> Pubkey {
        match self {
            PoolAccount::BondingCurve { address, .. } | PoolAccount::ConstantProduct { address, .. } => *address,
        }
    }
}

pub struct Locator<'a> {
    gateway: &'a dyn LedgerGateway,
    sdk:     &'a dyn ProtocolSdk,
    fan_out: usize,
}

impl<'a> Locator<'a> {
    pub fn new(gateway: &'a dyn LedgerGateway, sdk: &'a dyn ProtocolSdk, fan_out: usize) -> Self {
        Self { gateway, sdk, fan_out: fan_out.max(1) }
    }

    // ── Pools ────────────────────────────────────────────────────────────────

    /// Find a pool by its address (either kind) or by a bonding-curve base mint.
    pub async fn resolve_pool_account(&self, identifier: &Pubkey) -> Result<PoolAccount> {
        if let Some(account) = self.gateway.get_account(identifier).await? {
            if let Some(pool) = self.classify_pool(identifier, &account)? {
                return Ok(pool);
            }
        }

        // Not a pool address; treat it as a base mint.
        let filters = vec![
            AccountFilter::memcmp(0, account_discriminator(VIRTUAL_POOL_ACCOUNT)),
            AccountFilter::memcmp(VIRTUAL_POOL_BASE_MINT_OFFSET, identifier.to_bytes()),
        ];
        let matches = self
            .gateway
            .get_program_accounts(&self.sdk.bonding_curve_program(), filters)
            .await?;
        if matches.len() > 1 {
            warn!(mint = %identifier, count = matches.len(), "several pools share a base mint; using the first");
        }
        match matches.into_iter().next() {
            Some((address, account)) => Ok(PoolAccount::BondingCurve {
                address,
                state: parse_virtual_pool(&account.data)?,
            }),
            None => Err(Error::not_found("Pool", identifier)),
        }
    }

    fn classify_pool(&self, address: &Pubkey, account: &Account) -> Result<Option<PoolAccount>> {
        if account.owner == self.sdk.bonding_curve_program()
            && has_discriminator(&account.data, VIRTUAL_POOL_ACCOUNT)
        {
            let state = parse_virtual_pool(&account.data)?;
            return Ok(Some(PoolAccount::BondingCurve { address: *address, state }));
        }
        if account.owner == self.sdk.constant_product_program()
            && has_discriminator(&account.data, CP_AMM_POOL_ACCOUNT)
        {
            let state = parse_cp_amm_pool(&account.data)?;
            return Ok(Some(PoolAccount::ConstantProduct { address: *address, state }));
        }
        Ok(None)
    }

    /// A bonding-curve pool and its configuration.
    pub async fn bonding_curve(&self, identifier: &Pubkey) -> Result<(Pubkey, VirtualPoolState, PoolConfigState)> {
        match self.resolve_pool_account(identifier).await? {
            PoolAccount::BondingCurve { address, state } => {
                let config = self.pool_config(&state.config).await?;
                Ok((address, state, config))
            }
            PoolAccount::ConstantProduct { address, .. } => Err(Error::Validation(format!(
                "{address} is a constant-product pool; a bonding-curve pool is required"
            ))),
        }
    }

    async fn pool_config(&self, config: &Pubkey) -> Result<PoolConfigState> {
        let account = self
            .gateway
            .get_account(config)
            .await?
            .ok_or_else(|| Error::not_found("Pool config", config))?;
        parse_pool_config(&account.data)
    }

    #[instrument(skip_all, fields(identifier = %identifier))]
    pub async fn get_pool(&self, identifier: &Pubkey) -> Result<Pool> {
        match self.resolve_pool_account(identifier).await? {
            PoolAccount::BondingCurve { address, state } => {
                let config = self.pool_config(&state.config).await?;
                Ok(Pool {
                    address,
                    kind:        PoolKind::BondingCurve,
                    base_mint:   state.base_mint,
                    quote_mint:  config.quote_mint,
                    base_vault:  state.base_vault,
                    quote_vault: state.quote_vault,
                    config:      Some(state.config),
                    fee_claimer: non_default(config.fee_claimer),
                    creator:     non_default(state.creator),
                    curve_progress: Some(curve_progress(
                        state.quote_reserve,
                        config.migration_quote_threshold,
                    )),
                })
            }
            PoolAccount::ConstantProduct { address, state } => Ok(Pool {
                address,
                kind:        PoolKind::ConstantProduct,
                base_mint:   state.token_a_mint,
                quote_mint:  state.token_b_mint,
                base_vault:  state.token_a_vault,
                quote_vault: state.token_b_vault,
                config:      None,
                fee_claimer: non_default(state.partner),
                creator:     non_default(state.creator),
                curve_progress: None,
            }),
        }
    }

    /// Constant-product pool a bonding-curve pool migrates (or migrated) to.
    pub async fn migrated_pool_address(&self, identifier: &Pubkey) -> Result<Pubkey> {
        let (_, state, config) = self.bonding_curve(identifier).await?;
        self.sdk
            .migrated_pool_address(config.migration_fee_option, &state.base_mint, &config.quote_mint)
    }

    async fn cp_amm_pool(&self, address: &Pubkey) -> Result<CpAmmPoolState> {
        let account = self
            .gateway
            .get_account(address)
            .await?
            .filter(|a| a.owner == self.sdk.constant_product_program())
            .ok_or_else(|| Error::not_found("Pool", address))?;
        parse_cp_amm_pool(&account.data)
    }

    async fn pool_summary(&self, address: &Pubkey, state: &CpAmmPoolState) -> Result<PoolSummary> {
        let (token_a_program, token_b_program) =
            resolve_pair(self.gateway, &state.token_a_mint, &state.token_b_mint).await?;
        Ok(PoolSummary {
            address:       *address,
            token_a_mint:  state.token_a_mint,
            token_b_mint:  state.token_b_mint,
            token_a_vault: state.token_a_vault,
            token_b_vault: state.token_b_vault,
            token_a_program,
            token_b_program,
        })
    }

    // ── Positions ────────────────────────────────────────────────────────────

    /// Positions held by `owner`, optionally limited to one pool, with their
    /// raw state. Sorted by liquidity, largest first.
    pub async fn discover_positions(
        &self,
        owner: &Pubkey,
        pool:  Option<&Pubkey>,
    ) -> Result<Vec<(Position, CpAmmPositionState)>> {
        // cp-amm always mints position NFTs under Token-2022, so that is the
        // only program scanned. Transfers still resolve the mint's program.
        let filters = vec![AccountFilter::memcmp(TOKEN_ACCOUNT_OWNER_OFFSET, owner.to_bytes())];
        let token_accounts = self
            .gateway
            .get_program_accounts(&TokenProgram::Extended.id(), filters)
            .await?;

        // Position NFTs are the unit-balance holdings.
        let holdings: Vec<(Pubkey, Pubkey)> = token_accounts
            .iter()
            .filter_map(|(address, account)| {
                let token = parse_token_account(&account.data).ok()?;
                (token.owner == *owner && token.amount == 1).then_some((*address, token.mint))
            })
            .collect();
        if holdings.is_empty() {
            return Ok(Vec::new());
        }

        let addresses: Vec<Pubkey> = holdings
            .iter()
            .map(|(_, mint)| self.sdk.position_address(mint))
            .collect();
        let accounts = self.gateway.get_multiple_accounts(&addresses).await?;

        let mut positions = Vec::new();
        for (((nft_account, _), address), account) in holdings.iter().zip(&addresses).zip(accounts) {
            let Some(account) = account else { continue };
            if account.owner != self.sdk.constant_product_program()
                || !has_discriminator(&account.data, POSITION_ACCOUNT)
            {
                continue;
            }
            let state = parse_cp_amm_position(&account.data)?;
            if pool.is_some_and(|p| *p != state.pool) {
                continue;
            }
            positions.push((position_from(*address, *nft_account, *owner, &state), state));
        }
        positions.sort_by(|(a, _), (b, _)| {
            b.liquidity.cmp(&a.liquidity).then_with(|| a.address.cmp(&b.address))
        });
        debug!(%owner, count = positions.len(), "positions discovered");
        Ok(positions)
    }

    /// A single position, which `owner` must hold.
    pub async fn owned_position(
        &self,
        address: &Pubkey,
        owner:   &Pubkey,
    ) -> Result<(Position, CpAmmPositionState, PoolSummary)> {
        let account = self
            .gateway
            .get_account(address)
            .await?
            .filter(|a| {
                a.owner == self.sdk.constant_product_program()
                    && has_discriminator(&a.data, POSITION_ACCOUNT)
            })
            .ok_or_else(|| Error::not_found("Position", address))?;
        let state = parse_cp_amm_position(&account.data)?;

        let filters = vec![
            AccountFilter::memcmp(0, state.nft_mint.to_bytes()),
            AccountFilter::memcmp(TOKEN_ACCOUNT_OWNER_OFFSET, owner.to_bytes()),
        ];
        let nft_account = self
            .gateway
            .get_program_accounts(&TokenProgram::Extended.id(), filters)
            .await?
            .into_iter()
            .find(|(_, acc)| parse_token_account(&acc.data).is_ok_and(|t| t.amount == 1))
            .map(|(address, _)| address)
            .ok_or_else(|| Error::not_found("Position NFT held by wallet", state.nft_mint))?;

        let pool_state = self.cp_amm_pool(&state.pool).await?;
        let summary = self.pool_summary(&state.pool, &pool_state).await?;
        Ok((position_from(*address, nft_account, *owner, &state), state, summary))
    }

    /// Every position `owner` holds, enriched with pool data and unclaimed fees.
    #[instrument(skip_all, fields(owner = %owner))]
    pub async fn list_positions(&self, owner: &Pubkey) -> Result<Vec<PositionInfo>> {
        let positions = self.discover_positions(owner, None).await?;
        self.enrich(positions).await
    }

    #[instrument(skip_all, fields(pool = %pool, owner = %owner))]
    pub async fn list_positions_in_pool(&self, pool: &Pubkey, owner: &Pubkey) -> Result<Vec<PositionInfo>> {
        let positions = self.discover_positions(owner, Some(pool)).await?;
        self.enrich(positions).await
    }

    async fn enrich(&self, positions: Vec<(Position, CpAmmPositionState)>) -> Result<Vec<PositionInfo>> {
        let semaphore = Arc::new(Semaphore::new(self.fan_out));
        let mut tasks = Vec::with_capacity(positions.len());
        for (position, state) in positions {
            let sem = semaphore.clone();
            tasks.push(async move {
                let _permit = sem
                    .acquire()
                    .await
                    .map_err(|_| Error::Config("enrichment semaphore closed".into()))?;
                self.enrich_one(position, state).await
            });
        }
        try_join_all(tasks).await
    }

    async fn enrich_one(&self, position: Position, state: CpAmmPositionState) -> Result<PositionInfo> {
        let pool_state = self.cp_amm_pool(&position.pool).await?;
        let pool = self.pool_summary(&position.pool, &pool_state).await?;
        let (unclaimed, fee_source) = unclaimed_fees(
            self.sdk.fee_accounting(),
            &pool_state,
            &state,
            position.recorded_fees,
        );
        Ok(PositionInfo { position, pool, unclaimed, fee_source })
    }
}

/// Unclaimed fees of a position, with graceful degradation.
///
/// Computed through `accounting` when available; otherwise the record's
/// pending fees; otherwise zero, flagged [`FeeSource::Degraded`].
pub fn unclaimed_fees(
    accounting: Option<&dyn FeeAccounting>,
    pool:       &CpAmmPoolState,
    position:   &CpAmmPositionState,
    recorded:   Option<FeeAmounts>,
) -> (FeeAmounts, FeeSource) {
    match accounting {
        Some(accounting) => match accounting.unclaimed_fees(pool, position) {
            Ok(fees) => return (fees, FeeSource::Computed),
            Err(e) => warn!(
                nft_mint = %position.nft_mint,
                version = accounting.version(),
                error = %e,
                "fee accounting failed; falling back to recorded fees"
            ),
        },
        None => warn!(nft_mint = %position.nft_mint, "no fee accounting available; falling back to recorded fees"),
    }
    match recorded {
        Some(fees) => (fees, FeeSource::Recorded),
        None => {
            warn!(nft_mint = %position.nft_mint, "no recorded fees; reporting zero");
            (FeeAmounts::default(), FeeSource::Degraded)
        }
    }
}

fn position_from(address: Pubkey, nft_account: Pubkey, owner: Pubkey, state: &CpAmmPositionState) -> Position {
    Position {
        address,
        nft_account,
        nft_mint: state.nft_mint,
        owner,
        pool: state.pool,
        liquidity: state.unlocked_liquidity,
        locked_liquidity: state.vested_liquidity.saturating_add(state.permanent_locked_liquidity),
        recorded_fees: Some(FeeAmounts {
            base:  state.fee_a_pending as u128,
            quote: state.fee_b_pending as u128,
        }),
    }
}

fn non_default(key: Pubkey) -> Option<Pubkey> {
    (key != Pubkey::default()).then_some(key)
}
