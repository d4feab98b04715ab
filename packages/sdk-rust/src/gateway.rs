//! Ledger access seam.
//!
//! Everything the client reads from or submits to the chain goes through
//! [`LedgerGateway`]. [`RpcGateway`] is the JSON-RPC implementation; tests
//! substitute an in-memory ledger.

use async_trait::async_trait;
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig},
    rpc_filter::{Memcmp, MemcmpEncodedBytes, RpcFilterType},
};
use solana_sdk::{
    account::Account,
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};
use tracing::debug;

use crate::error::Result;

/// Server-side filter for program-account scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountFilter {
    DataSize(u64),
    Memcmp { offset: usize, bytes: Vec<u8> },
}

impl AccountFilter {
    pub fn memcmp(offset: usize, bytes: impl Into<Vec<u8>>) -> Self {
        AccountFilter::Memcmp { offset, bytes: bytes.into() }
    }

    /// Evaluate the filter against raw account data.
    pub fn matches(&self, data: &[u8]) -> bool {
        match self {
            AccountFilter::DataSize(len) => data.len() as u64 == *len,
            AccountFilter::Memcmp { offset, bytes } => data
                .get(*offset..offset + bytes.len())
                .is_some_and(|window| window == bytes.as_slice()),
        }
    }
}

impl From<AccountFilter> for RpcFilterType {
    fn from(filter: AccountFilter) -> Self {
        match filter {
            AccountFilter::DataSize(len) => RpcFilterType::DataSize(len),
            AccountFilter::Memcmp { offset, bytes } => {
                RpcFilterType::Memcmp(Memcmp::new(offset, MemcmpEncodedBytes::Bytes(bytes)))
            }
        }
    }
}

#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// `None` when the account does not exist.
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>>;

    /// One slot per requested address, in request order.
    async fn get_multiple_accounts(&self, addresses: &[Pubkey]) -> Result<Vec<Option<Account>>>;

    async fn get_program_accounts(
        &self,
        program: &Pubkey,
        filters: Vec<AccountFilter>,
    ) -> Result<Vec<(Pubkey, Account)>>;

    async fn get_latest_blockhash(&self) -> Result<Hash>;

    /// Submit a signed transaction and wait until it settles at `commitment`.
    async fn send_and_confirm(
        &self,
        transaction: &Transaction,
        commitment: CommitmentConfig,
    ) -> Result<Signature>;
}

// ─── JSON-RPC implementation ──────────────────────────────────────────────────

pub struct RpcGateway {
    rpc: RpcClient,
}

impl RpcGateway {
    pub fn new(rpc_url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        Self { rpc: RpcClient::new_with_commitment(rpc_url.into(), commitment) }
    }

    pub fn url(&self) -> String {
        self.rpc.url()
    }
}

/// `getMultipleAccounts` accepts at most this many keys per request.
const MAX_MULTIPLE_ACCOUNTS: usize = 100;

#[async_trait]
impl LedgerGateway for RpcGateway {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>> {
        let response = self
            .rpc
            .get_account_with_commitment(address, self.rpc.commitment())
            .await?;
        Ok(response.value)
    }

    async fn get_multiple_accounts(&self, addresses: &[Pubkey]) -> Result<Vec<Option<Account>>> {
        let mut out = Vec::with_capacity(addresses.len());
        for chunk in addresses.chunks(MAX_MULTIPLE_ACCOUNTS) {
            out.extend(self.rpc.get_multiple_accounts(chunk).await?);
        }
        Ok(out)
    }

    async fn get_program_accounts(
        &self,
        program: &Pubkey,
        filters: Vec<AccountFilter>,
    ) -> Result<Vec<(Pubkey, Account)>> {
        debug!(%program, filters = filters.len(), "getProgramAccounts");
        let config = RpcProgramAccountsConfig {
            filters: Some(filters.into_iter().map(RpcFilterType::from).collect()),
            account_config: RpcAccountInfoConfig {
                commitment: Some(self.rpc.commitment()),
                ..Default::default()
            },
            ..Default::default()
        };
        Ok(self.rpc.get_program_accounts_with_config(program, config).await?)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        Ok(self.rpc.get_latest_blockhash().await?)
    }

    async fn send_and_confirm(
        &self,
        transaction: &Transaction,
        commitment: CommitmentConfig,
    ) -> Result<Signature> {
        Ok(self
            .rpc
            .send_and_confirm_transaction_with_spinner_and_commitment(transaction, commitment)
            .await?)
    }
}
