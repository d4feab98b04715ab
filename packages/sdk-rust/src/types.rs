//! Public parameter and result types.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::token_program::TokenProgram;

// ─── Pools ────────────────────────────────────────────────────────────────────

/// Which of the two Meteora pool families a pool belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    /// Dynamic Bonding Curve (pre-graduation launch pool).
    BondingCurve,
    /// DAMM v2 constant-product pool (cp-amm).
    ConstantProduct,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKind::BondingCurve    => f.write_str("bonding-curve"),
            PoolKind::ConstantProduct => f.write_str("constant-product"),
        }
    }
}

/// Query-time snapshot of a pool. Never cached across workflow steps.
#[derive(Debug, Clone, Serialize)]
pub struct Pool {
    pub address:     Pubkey,
    pub kind:        PoolKind,
    /// Token A for constant-product pools.
    pub base_mint:   Pubkey,
    /// Token B for constant-product pools.
    pub quote_mint:  Pubkey,
    pub base_vault:  Pubkey,
    pub quote_vault: Pubkey,
    /// Pool configuration account (bonding-curve pools only).
    pub config:      Option<Pubkey>,
    /// Fee claimer declared by the configuration (bonding curve) or the
    /// `partner` field (constant product). `None` when unset.
    pub fee_claimer: Option<Pubkey>,
    pub creator:     Option<Pubkey>,
    /// Fraction of the migration quote threshold reached, in `[0, 1]`.
    pub curve_progress: Option<f64>,
}

// ─── Positions ────────────────────────────────────────────────────────────────

/// Fee amounts in minor units of token A/base and token B/quote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeeAmounts {
    pub base:  u128,
    pub quote: u128,
}

/// A DAMM v2 position owned through its NFT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    pub address:     Pubkey,
    /// Token account holding the position NFT.
    pub nft_account: Pubkey,
    pub nft_mint:    Pubkey,
    pub owner:       Pubkey,
    pub pool:        Pubkey,
    /// Unlocked liquidity, the share that can be split.
    pub liquidity:   u128,
    /// Vested plus permanently locked liquidity.
    pub locked_liquidity: u128,
    /// Pending fees stored on the position record at its last sync.
    pub recorded_fees: Option<FeeAmounts>,
}

/// Where an unclaimed-fee figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeSource {
    /// Computed from pool and position accumulators.
    Computed,
    /// Read from the position record's pending-fee fields.
    Recorded,
    /// No way to compute fees; the figure is zero and should not be trusted.
    Degraded,
}

/// Token accounts and programs of the pool a position belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct PoolSummary {
    pub address:       Pubkey,
    pub token_a_mint:  Pubkey,
    pub token_b_mint:  Pubkey,
    pub token_a_vault: Pubkey,
    pub token_b_vault: Pubkey,
    pub token_a_program: TokenProgram,
    pub token_b_program: TokenProgram,
}

/// A position enriched with its pool and a fresh unclaimed-fee figure.
#[derive(Debug, Clone, Serialize)]
pub struct PositionInfo {
    pub position:   Position,
    pub pool:       PoolSummary,
    pub unclaimed:  FeeAmounts,
    pub fee_source: FeeSource,
}

// ─── Fee metrics ──────────────────────────────────────────────────────────────

/// Unclaimed partner/creator fees of a bonding-curve pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CurrentFees {
    pub partner_base_fee:  u128,
    pub partner_quote_fee: u128,
    pub creator_base_fee:  u128,
    pub creator_quote_fee: u128,
}

/// Lifetime trading fees of a bonding-curve pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TotalFees {
    pub total_trading_base_fee:  u128,
    pub total_trading_quote_fee: u128,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeeMetricsSnapshot {
    pub current: CurrentFees,
    pub total:   TotalFees,
}

// ─── Claims ───────────────────────────────────────────────────────────────────

/// Default quote ceiling: one unit of a 9-decimal quote asset (1 SOL).
pub const DEFAULT_MAX_QUOTE_AMOUNT: u64 = 1_000_000_000;

/// Upper bounds passed to claim instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClaimBounds {
    pub max_base_amount:  u64,
    pub max_quote_amount: u64,
}

impl Default for ClaimBounds {
    fn default() -> Self {
        Self { max_base_amount: 0, max_quote_amount: DEFAULT_MAX_QUOTE_AMOUNT }
    }
}

/// Whether the partner-fee authorization check runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthorizationBypass {
    #[default]
    Enforce,
    /// Skip the fee-claimer comparison. The on-chain program still rejects a
    /// wrong signer; this only removes the pre-flight check.
    Skip,
}

#[derive(Debug, Clone, Default)]
pub struct PartnerClaimParams {
    /// Pool address or bonding-curve base mint.
    pub pool:   Pubkey,
    pub bounds: Option<ClaimBounds>,
    pub bypass: AuthorizationBypass,
}

#[derive(Debug, Clone, Default)]
pub struct CreatorClaimParams {
    /// Pool address or bonding-curve base mint.
    pub pool:   Pubkey,
    pub bounds: Option<ClaimBounds>,
}

#[derive(Debug, Clone, Default)]
pub struct PositionClaimParams {
    pub position: Pubkey,
    pub bounds:   Option<ClaimBounds>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClaimResult {
    pub signature: String,
    pub pool:      Pubkey,
    /// Position address for position-fee claims.
    pub position:  Option<Pubkey>,
    pub claimant:  Pubkey,
    pub bounds:    ClaimBounds,
}

// ─── Split ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct SplitParams {
    pub pool:      Pubkey,
    pub recipient: Pubkey,
    /// Share of the primary position's liquidity to move, `0 < percent <= 100`.
    pub percent:   f64,
    /// Second position of an earlier run whose split already settled
    /// (see [`crate::Error::resume_position`]). Creation and the split are
    /// skipped; only the hand-over to `recipient` runs.
    pub resume_position: Option<Pubkey>,
}

/// Bounded poll used while waiting for freshly created accounts to appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Wait before the first look.
    pub settle_delay: Duration,
    /// Wait between further looks.
    pub interval:     Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(2),
            interval:     Duration::from_secs(1),
            max_attempts: 10,
        }
    }
}

impl PollConfig {
    /// Upper bound on the time the poll may wait.
    pub fn budget(&self) -> Duration {
        self.settle_delay + self.interval * self.max_attempts.saturating_sub(1)
    }
}

// ─── Workflow bookkeeping ─────────────────────────────────────────────────────

/// A named step of a claim or split workflow. Used in receipts and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    ResolvePool,
    ResolvePosition,
    Authorize,
    ResolveTokenPrograms,
    Build,
    Claim,
    LocatePosition,
    CreatePosition,
    LocateNewPosition,
    Split,
    ResolvePositionMint,
    EnsureRecipientAccount,
    Transfer,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::ResolvePool            => "resolve pool",
            Step::ResolvePosition        => "resolve position",
            Step::Authorize              => "authorize",
            Step::ResolveTokenPrograms   => "resolve token programs",
            Step::Build                  => "build",
            Step::Claim                  => "claim",
            Step::LocatePosition         => "locate position",
            Step::CreatePosition         => "create position",
            Step::LocateNewPosition      => "locate new position",
            Step::Split                  => "split",
            Step::ResolvePositionMint    => "resolve position mint",
            Step::EnsureRecipientAccount => "ensure recipient account",
            Step::Transfer               => "transfer",
        };
        f.write_str(s)
    }
}

/// A settled transaction of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReceipt {
    pub step:      Step,
    pub signature: String,
}

/// Outcome of the split-and-transfer workflow.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    /// Every settled step, in order.
    pub receipts:  Vec<StepReceipt>,
    /// Signature of the terminal transfer.
    pub signature: String,
    pub first_position:  Pubkey,
    pub second_position: Pubkey,
    pub nft_mint:        Pubkey,
    pub recipient_account: Pubkey,
    /// `true` when no position was created: an empty one was reused, or the
    /// run resumed after a settled split.
    pub reused_position: bool,
}
