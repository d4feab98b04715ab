//! Split a share of a position into a second position and hand it over.
//!
//! The steps settle as separate transactions, so a run can stop half-way.
//! Every step re-reads chain state. An empty position in the pool is reused
//! instead of minting another one, and a failure after the split settled is
//! reported as [`Error::Interrupted`] so the caller can resume with
//! `SplitParams::resume_position` instead of splitting again.

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use tracing::{info, instrument, warn};

use crate::access::Role;
use crate::error::{Error, Result, StepContext};
use crate::math::split_numerator;
use crate::protocol::{CreatePosition, SplitPosition};
use crate::state::{has_discriminator, parse_cp_amm_position, CpAmmPositionState, POSITION_ACCOUNT};
use crate::token_program::{
    associated_token_address, create_associated_account_ix, resolve_token_program, transfer_nft_ix,
};
use crate::types::{Position, SplitParams, Step, WorkflowResult};
use crate::workflow::{poll, Env, Submitter};

#[instrument(skip_all, fields(pool = %params.pool, recipient = %params.recipient, percent = params.percent))]
pub(crate) async fn split_position_to_recipient(env: &Env<'_>, params: SplitParams) -> Result<WorkflowResult> {
    let numerator = split_numerator(params.percent)?;
    env.require_role(Role::Split)?;

    let owner = env.wallet.pubkey();
    let pool = params.pool;
    let mut submitter = env.submitter();

    // ── 1. locate ────────────────────────────────────────────────────────────
    let positions = env
        .locator()
        .discover_positions(&owner, Some(&pool))
        .await
        .at_step(Step::LocatePosition)?;

    let (primary, second, reused_position) = match params.resume_position {
        Some(resume) => {
            let (primary, second) = resumed_positions(&positions, &pool, &resume).at_step(Step::LocatePosition)?;
            info!(first = %primary.address, second = %second.address, "resuming after a settled split");
            (primary, second, true)
        }
        None => {
            let primary = positions
                .first()
                .map(|(p, _)| p.clone())
                .filter(|p| p.liquidity > 0)
                .ok_or_else(|| Error::not_found("Position to split", pool))
                .at_step(Step::LocatePosition)?;
            let spare = positions
                .iter()
                .map(|(p, _)| p)
                .find(|p| p.address != primary.address && is_empty(p))
                .cloned();

            // ── 2 + 3. second position ───────────────────────────────────────
            let (second, reused) = match spare {
                Some(spare) => {
                    warn!(position = %spare.address, "reusing an empty position in the pool instead of creating one");
                    (spare, true)
                }
                None => {
                    let nft_mint = Keypair::new();
                    let instructions = env
                        .sdk
                        .create_position(&CreatePosition { pool, owner, payer: owner, nft_mint: nft_mint.pubkey() })
                        .at_step(Step::Build)?;
                    submitter.submit(Step::CreatePosition, instructions, &[&nft_mint]).await?;
                    (locate_new_position(env, &owner, &pool, &nft_mint.pubkey()).await?, false)
                }
            };
            info!(first = %primary.address, second = %second.address, reused, "positions ready");

            // ── 4. split ─────────────────────────────────────────────────────
            let instructions = env
                .sdk
                .split_position(&SplitPosition {
                    pool,
                    first_position:     primary.address,
                    first_nft_account:  primary.nft_account,
                    second_position:    second.address,
                    second_nft_account: second.nft_account,
                    first_owner:        owner,
                    second_owner:       owner,
                    numerator,
                })
                .at_step(Step::Build)?;
            submitter.submit(Step::Split, instructions, &[]).await?;
            (primary, second, reused)
        }
    };

    // From here on the split has settled; failures carry the second position.
    let handover = hand_over(env, &mut submitter, &second, &params.recipient)
        .await
        .map_err(|e| Error::Interrupted { second_position: second.address, source: Box::new(e) })?;

    Ok(WorkflowResult {
        receipts: submitter.into_receipts(),
        signature: handover.signature,
        first_position: primary.address,
        second_position: second.address,
        nft_mint: handover.nft_mint,
        recipient_account: handover.recipient_account,
        reused_position,
    })
}

struct Handover {
    signature:         String,
    nft_mint:          Pubkey,
    recipient_account: Pubkey,
}

/// Steps 5 to 8: resolve the NFT, make sure the recipient can hold it, send it.
async fn hand_over(
    env:       &Env<'_>,
    submitter: &mut Submitter<'_>,
    second:    &Position,
    recipient: &Pubkey,
) -> Result<Handover> {
    let owner = env.wallet.pubkey();

    // ── 5. NFT mint and its program ──────────────────────────────────────────
    let nft_mint = fetch_position_mint(env, &second.address)
        .await
        .at_step(Step::ResolvePositionMint)?;
    let program = resolve_token_program(env.gateway, &nft_mint)
        .await
        .at_step(Step::ResolvePositionMint)?;

    // ── 6 + 7. recipient account ─────────────────────────────────────────────
    let recipient_account = associated_token_address(recipient, &nft_mint, program);
    let exists = env
        .gateway
        .get_account(&recipient_account)
        .await
        .at_step(Step::EnsureRecipientAccount)?
        .is_some();
    if !exists {
        let create = create_associated_account_ix(&owner, recipient, &nft_mint, program);
        submitter.submit(Step::EnsureRecipientAccount, vec![create], &[]).await?;
        let gateway = env.gateway;
        let visible = poll(&env.poll, move |_| async move {
            Ok(gateway.get_account(&recipient_account).await?.map(|_| ()))
        })
        .await
        .at_step(Step::EnsureRecipientAccount)?;
        if visible.is_none() {
            return Err(Error::AccountCreationTimeout {
                account:  recipient_account,
                attempts: env.poll.max_attempts,
                waited:   env.poll.budget(),
            });
        }
    }

    // ── 8. transfer ──────────────────────────────────────────────────────────
    let transfer = transfer_nft_ix(program, &second.nft_account, &nft_mint, &recipient_account, &owner)
        .at_step(Step::Transfer)?;
    let signature = submitter.submit(Step::Transfer, vec![transfer], &[]).await?;
    info!(%signature, %nft_mint, %recipient, "position transferred");

    Ok(Handover { signature: signature.to_string(), nft_mint, recipient_account })
}

/// The position to resume with and the largest other position it was split from.
fn resumed_positions(
    positions: &[(Position, CpAmmPositionState)],
    pool:      &Pubkey,
    resume:    &Pubkey,
) -> Result<(Position, Position)> {
    let second = positions
        .iter()
        .map(|(p, _)| p)
        .find(|p| p.address == *resume)
        .cloned()
        .ok_or_else(|| Error::not_found("Position to resume (held by wallet)", resume))?;
    let primary = positions
        .iter()
        .map(|(p, _)| p)
        .find(|p| p.address != *resume)
        .cloned()
        .ok_or_else(|| Error::not_found("Position the split came from", pool))?;
    Ok((primary, second))
}

/// A position holding no liquidity at all.
fn is_empty(position: &Position) -> bool {
    position.liquidity == 0 && position.locked_liquidity == 0
}

/// Wait for the position minted as `nft_mint` to show up among the owner's positions.
async fn locate_new_position(env: &Env<'_>, owner: &Pubkey, pool: &Pubkey, nft_mint: &Pubkey) -> Result<Position> {
    let locator = env.locator();
    let locator = &locator;
    let found = poll(&env.poll, move |attempt| async move {
        let positions = locator.discover_positions(owner, Some(pool)).await?;
        let hit = positions.into_iter().map(|(p, _)| p).find(|p| p.nft_mint == *nft_mint);
        if hit.is_none() {
            info!(attempt, "new position not indexed yet");
        }
        Ok(hit)
    })
    .await
    .at_step(Step::LocateNewPosition)?;

    found.ok_or(Error::IndexingTimeout {
        pool:     *pool,
        attempts: env.poll.max_attempts,
        waited:   env.poll.budget(),
    })
}

async fn fetch_position_mint(env: &Env<'_>, position: &Pubkey) -> Result<Pubkey> {
    let account = env
        .gateway
        .get_account(position)
        .await?
        .filter(|a| {
            a.owner == env.sdk.constant_product_program() && has_discriminator(&a.data, POSITION_ACCOUNT)
        })
        .ok_or_else(|| Error::not_found("Position", position))?;
    Ok(parse_cp_amm_position(&account.data)?.nft_mint)
}
