//! State-mutating workflows and the submission pipeline they share.
//!
//! Every transaction goes through [`Submitter::submit`]: build, stamp with a
//! fresh blockhash and the caller as fee payer, sign (wallet first, then any
//! generated keypairs), submit and wait for settlement.

pub mod claim;
pub mod split;

use std::future::Future;

use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    signature::{Keypair, Signature},
    transaction::Transaction,
};
use tracing::{debug, info};

use crate::access::{AccessList, Role};
use crate::error::{Error, Result, StepContext};
use crate::gateway::LedgerGateway;
use crate::locator::Locator;
use crate::protocol::ProtocolSdk;
use crate::types::{PollConfig, Step, StepReceipt};
use crate::wallet::Wallet;

/// Collaborators and settings one workflow invocation runs with.
pub(crate) struct Env<'a> {
    pub gateway:    &'a dyn LedgerGateway,
    pub sdk:        &'a dyn ProtocolSdk,
    pub wallet:     &'a dyn Wallet,
    pub commitment: CommitmentConfig,
    pub poll:       PollConfig,
    pub fan_out:    usize,
    pub access:     Option<&'a AccessList>,
}

impl<'a> Env<'a> {
    pub(crate) fn locator(&self) -> Locator<'a> {
        Locator::new(self.gateway, self.sdk, self.fan_out)
    }

    pub(crate) fn submitter(&self) -> Submitter<'a> {
        Submitter::new(self.gateway, self.wallet, self.commitment)
    }

    /// Consult the access list, when one is installed.
    pub(crate) fn require_role(&self, role: Role) -> Result<()> {
        match self.access {
            Some(list) => list.require(&self.wallet.pubkey(), role),
            None => Ok(()),
        }
    }
}

pub(crate) struct Submitter<'a> {
    gateway:    &'a dyn LedgerGateway,
    wallet:     &'a dyn Wallet,
    commitment: CommitmentConfig,
    receipts:   Vec<StepReceipt>,
}

impl<'a> Submitter<'a> {
    pub(crate) fn new(gateway: &'a dyn LedgerGateway, wallet: &'a dyn Wallet, commitment: CommitmentConfig) -> Self {
        Self { gateway, wallet, commitment, receipts: Vec::new() }
    }

    /// Stamp, sign and submit `instructions`, waiting for settlement.
    ///
    /// Any failure is reported as [`Error::Submission`] for `step`.
    pub(crate) async fn submit(
        &mut self,
        step:         Step,
        instructions: Vec<Instruction>,
        extra:        &[&Keypair],
    ) -> Result<Signature> {
        let signature = self.stamp_sign_send(&instructions, extra).await.submitting(step)?;
        info!(%step, %signature, "settled");
        self.receipts.push(StepReceipt { step, signature: signature.to_string() });
        Ok(signature)
    }

    async fn stamp_sign_send(&self, instructions: &[Instruction], extra: &[&Keypair]) -> Result<Signature> {
        let blockhash = self.gateway.get_latest_blockhash().await?;
        let mut tx = Transaction::new_with_payer(instructions, Some(&self.wallet.pubkey()));
        tx.message.recent_blockhash = blockhash;

        let mut tx = self.wallet.sign_transaction(tx).await?;
        if !extra.is_empty() {
            tx.try_partial_sign(extra, blockhash)
                .map_err(|e| Error::Signing(e.to_string()))?;
        }
        if !tx.is_signed() {
            return Err(Error::Signing("transaction is missing required signatures".into()));
        }
        debug!(instructions = instructions.len(), %blockhash, "submitting transaction");
        self.gateway.send_and_confirm(&tx, self.commitment).await
    }

    pub(crate) fn into_receipts(self) -> Vec<StepReceipt> {
        self.receipts
    }
}

/// Check until it yields a value or the poll budget runs out.
///
/// Waits `settle_delay` before the first check and `interval` between the
/// rest. `Ok(None)` means the budget ran out.
pub(crate) async fn poll<T, F, Fut>(config: &PollConfig, mut check: F) -> Result<Option<T>>
where
    F:   FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    tokio::time::sleep(config.settle_delay).await;
    for attempt in 1..=config.max_attempts.max(1) {
        if attempt > 1 {
            tokio::time::sleep(config.interval).await;
        }
        if let Some(found) = check(attempt).await? {
            return Ok(Some(found));
        }
        debug!(attempt, max = config.max_attempts, "not visible yet");
    }
    Ok(None)
}
