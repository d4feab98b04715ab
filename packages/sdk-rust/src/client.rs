//! [`FeeClaimerClient`], the main entry point.

use std::sync::Arc;

use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};

use crate::{
    access::{self, AccessList},
    error::Result,
    gateway::{LedgerGateway, RpcGateway},
    instructions::MeteoraSdk,
    locator::{Locator, DEFAULT_FAN_OUT},
    metrics::pool_fee_metrics,
    protocol::ProtocolSdk,
    types::{
        ClaimResult, CreatorClaimParams, FeeMetricsSnapshot, PartnerClaimParams, PollConfig, Pool,
        PositionClaimParams, PositionInfo, SplitParams, WorkflowResult,
    },
    wallet::Wallet,
    workflow::{claim, split, Env},
};

// ─── Constants ────────────────────────────────────────────────────────────────

const DEVNET_RPC:  &str = "https://api.devnet.solana.com";
const MAINNET_RPC: &str = "https://api.mainnet-beta.solana.com";

// ─── Client ───────────────────────────────────────────────────────────────────

/// Async fee-claim and position-transfer client.
///
/// ```rust,no_run
/// # use fee_claimer_sdk::{FeeClaimerClient, KeypairWallet, PartnerClaimParams};
/// # use solana_sdk::{pubkey::Pubkey, signature::Keypair};
/// # use std::str::FromStr;
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = FeeClaimerClient::mainnet();
/// let wallet = KeypairWallet::new(Keypair::new()); // use the fee claimer's keypair
/// let pool   = Pubkey::from_str("So11111111111111111111111111111111111111112")?;
/// let claim  = client.claim_partner_fee(&wallet, PartnerClaimParams {
///     pool, ..Default::default()
/// }).await?;
/// println!("Claimed! tx: {}", claim.signature);
/// # Ok(())
/// # }
/// ```
pub struct FeeClaimerClient {
    gateway:    Arc<dyn LedgerGateway>,
    sdk:        Arc<dyn ProtocolSdk>,
    commitment: CommitmentConfig,
    poll:       PollConfig,
    fan_out:    usize,
    access:     Option<Arc<AccessList>>,
}

impl FeeClaimerClient {
    /// Create a client pointing at any RPC endpoint.
    pub fn new(rpc_url: impl Into<String>) -> Self {
        let commitment = CommitmentConfig::confirmed();
        Self::with_parts(
            Arc::new(RpcGateway::new(rpc_url, commitment)),
            Arc::new(MeteoraSdk::new()),
        )
    }

    /// Pre-configured client for Solana devnet.
    pub fn devnet() -> Self {
        Self::new(DEVNET_RPC)
    }

    /// Pre-configured client for Solana mainnet-beta.
    pub fn mainnet() -> Self {
        Self::new(MAINNET_RPC)
    }

    /// Assemble a client from explicit collaborators.
    ///
    /// Picks up the process-wide access list if one is installed.
    pub fn with_parts(gateway: Arc<dyn LedgerGateway>, sdk: Arc<dyn ProtocolSdk>) -> Self {
        Self {
            gateway,
            sdk,
            commitment: CommitmentConfig::confirmed(),
            poll:       PollConfig::default(),
            fan_out:    DEFAULT_FAN_OUT,
            access:     access::installed(),
        }
    }

    /// Settlement level awaited after each submission.
    pub fn with_commitment(mut self, commitment: CommitmentConfig) -> Self {
        self.commitment = commitment;
        self
    }

    /// Timing of the waits for freshly created accounts.
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Bound on concurrent reads when enriching positions.
    pub fn with_fan_out(mut self, fan_out: usize) -> Self {
        self.fan_out = fan_out.max(1);
        self
    }

    /// Use `list` instead of the process-wide access list.
    pub fn with_access_list(mut self, list: Arc<AccessList>) -> Self {
        self.access = Some(list);
        self
    }

    // ── Write operations ──────────────────────────────────────────────────────

    /// Claim partner trading fees from a bonding-curve pool.
    ///
    /// Only the pool configuration's fee claimer may call this; any other
    /// wallet gets [`crate::Error::Authorization`] without a transaction
    /// being sent.
    pub async fn claim_partner_fee(&self, wallet: &dyn Wallet, params: PartnerClaimParams) -> Result<ClaimResult> {
        claim::claim_partner_fee(&self.env(wallet), params).await
    }

    /// Claim creator trading fees from a bonding-curve pool.
    pub async fn claim_creator_fee(&self, wallet: &dyn Wallet, params: CreatorClaimParams) -> Result<ClaimResult> {
        claim::claim_creator_fee(&self.env(wallet), params).await
    }

    /// Claim the fees accrued by a DAMM v2 position the wallet holds.
    pub async fn claim_position_fee(&self, wallet: &dyn Wallet, params: PositionClaimParams) -> Result<ClaimResult> {
        claim::claim_position_fee(&self.env(wallet), params).await
    }

    /// Split `percent` of the wallet's largest position in `pool` into a new
    /// position and transfer that position's NFT to `recipient`.
    ///
    /// An empty position already in the pool is reused. A failure after the
    /// split settled returns `Error::Interrupted`; pass its second position as
    /// `SplitParams::resume_position` to finish without splitting again.
    pub async fn split_position_to_recipient(&self, wallet: &dyn Wallet, params: SplitParams) -> Result<WorkflowResult> {
        split::split_position_to_recipient(&self.env(wallet), params).await
    }

    // ── Read operations ───────────────────────────────────────────────────────

    /// Pool by address (either kind) or by bonding-curve base mint.
    pub async fn get_pool(&self, identifier: &Pubkey) -> Result<Pool> {
        self.locator().get_pool(identifier).await
    }

    /// Current and lifetime fee counters of a bonding-curve pool.
    pub async fn get_pool_fee_metrics(&self, identifier: &Pubkey) -> Result<FeeMetricsSnapshot> {
        pool_fee_metrics(&self.locator(), identifier).await
    }

    /// All DAMM v2 positions held by `owner`, with unclaimed fees.
    pub async fn list_positions(&self, owner: &Pubkey) -> Result<Vec<PositionInfo>> {
        self.locator().list_positions(owner).await
    }

    /// DAMM v2 positions held by `owner` in one pool.
    pub async fn list_positions_in_pool(&self, pool: &Pubkey, owner: &Pubkey) -> Result<Vec<PositionInfo>> {
        self.locator().list_positions_in_pool(pool, owner).await
    }

    /// DAMM v2 pool a bonding-curve pool migrates to on graduation.
    pub async fn migrated_pool_address(&self, identifier: &Pubkey) -> Result<Pubkey> {
        self.locator().migrated_pool_address(identifier).await
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn locator(&self) -> Locator<'_> {
        Locator::new(self.gateway.as_ref(), self.sdk.as_ref(), self.fan_out)
    }

    fn env<'a>(&'a self, wallet: &'a dyn Wallet) -> Env<'a> {
        Env {
            gateway:    self.gateway.as_ref(),
            sdk:        self.sdk.as_ref(),
            wallet,
            commitment: self.commitment,
            poll:       self.poll,
            fan_out:    self.fan_out,
            access:     self.access.as_deref(),
        }
    }
}
