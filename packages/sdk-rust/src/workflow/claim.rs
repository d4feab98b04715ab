//! Partner, creator and position fee claims.
//!
//! Each claim is a single transaction: resolve the target fresh, authorize
//! (partner claims only), resolve both token programs, build, submit.

use solana_sdk::pubkey::Pubkey;
use tracing::{info, instrument};

use crate::access::Role;
use crate::auth::check_fee_claimer;
use crate::error::{Error, Result, StepContext};
use crate::protocol::{BondingCurveClaim, PositionClaim};
use crate::token_program::resolve_pair;
use crate::types::{
    ClaimBounds, ClaimResult, CreatorClaimParams, PartnerClaimParams, Pool, PoolKind, PositionClaimParams, Step,
};
use crate::workflow::Env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BondingCurveClaimant {
    Partner,
    Creator,
}

#[instrument(skip_all, fields(pool = %params.pool))]
pub(crate) async fn claim_partner_fee(env: &Env<'_>, params: PartnerClaimParams) -> Result<ClaimResult> {
    env.require_role(Role::Claim)?;
    let caller = env.wallet.pubkey();
    let pool = resolve_bonding_curve(env, &params.pool).await?;

    let decision = check_fee_claimer(env.gateway, &pool, caller, params.bypass)
        .await
        .at_step(Step::Authorize)?;
    decision.into_result(pool.address)?;

    claim_bonding_curve(env, &pool, BondingCurveClaimant::Partner, params.bounds.unwrap_or_default()).await
}

#[instrument(skip_all, fields(pool = %params.pool))]
pub(crate) async fn claim_creator_fee(env: &Env<'_>, params: CreatorClaimParams) -> Result<ClaimResult> {
    env.require_role(Role::Claim)?;
    let pool = resolve_bonding_curve(env, &params.pool).await?;
    claim_bonding_curve(env, &pool, BondingCurveClaimant::Creator, params.bounds.unwrap_or_default()).await
}

#[instrument(skip_all, fields(position = %params.position))]
pub(crate) async fn claim_position_fee(env: &Env<'_>, params: PositionClaimParams) -> Result<ClaimResult> {
    env.require_role(Role::Claim)?;
    let owner = env.wallet.pubkey();
    let bounds = params.bounds.unwrap_or_default();

    // Pool summary carries both mints' token programs.
    let (position, _, pool) = env
        .locator()
        .owned_position(&params.position, &owner)
        .await
        .at_step(Step::ResolvePosition)?;

    let instructions = env
        .sdk
        .claim_position_fee(&PositionClaim { position: &position, pool: &pool, owner, bounds })
        .at_step(Step::Build)?;

    let mut submitter = env.submitter();
    let signature = submitter.submit(Step::Claim, instructions, &[]).await?;
    info!(%signature, position = %position.address, "position fee claimed");

    Ok(ClaimResult {
        signature: signature.to_string(),
        pool:      pool.address,
        position:  Some(position.address),
        claimant:  owner,
        bounds,
    })
}

async fn resolve_bonding_curve(env: &Env<'_>, identifier: &Pubkey) -> Result<Pool> {
    let pool = env.locator().get_pool(identifier).await.at_step(Step::ResolvePool)?;
    if pool.kind != PoolKind::BondingCurve {
        return Err::<Pool, _>(Error::Validation(format!(
            "{} is a {} pool; partner and creator fees are claimed from bonding-curve pools",
            pool.address, pool.kind
        )))
        .at_step(Step::ResolvePool);
    }
    Ok(pool)
}

async fn claim_bonding_curve(
    env:      &Env<'_>,
    pool:     &Pool,
    claimant: BondingCurveClaimant,
    bounds:   ClaimBounds,
) -> Result<ClaimResult> {
    let caller = env.wallet.pubkey();
    let (base_program, quote_program) = resolve_pair(env.gateway, &pool.base_mint, &pool.quote_mint)
        .await
        .at_step(Step::ResolveTokenPrograms)?;

    let request = BondingCurveClaim { pool, claimant: caller, base_program, quote_program, bounds };
    let instructions = match claimant {
        BondingCurveClaimant::Partner => env.sdk.claim_partner_fee(&request),
        BondingCurveClaimant::Creator => env.sdk.claim_creator_fee(&request),
    }
    .at_step(Step::Build)?;

    let mut submitter = env.submitter();
    let signature = submitter.submit(Step::Claim, instructions, &[]).await?;
    info!(%signature, pool = %pool.address, ?claimant, "trading fees claimed");

    Ok(ClaimResult {
        signature: signature.to_string(),
        pool:      pool.address,
        position:  None,
        claimant:  caller,
        bounds,
    })
}
