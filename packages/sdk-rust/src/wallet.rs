//! Signing seam.

use std::sync::Arc;

use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};

use crate::error::{Error, Result};

/// An identity that can sign transactions.
///
/// Signing is mandatory: a wallet without the capability returns
/// [`Error::WalletNotCapable`] instead of passing the transaction through.
#[async_trait]
pub trait Wallet: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    /// Add this wallet's signature. Signatures already present are kept.
    async fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction>;

    async fn sign_all_transactions(&self, transactions: Vec<Transaction>) -> Result<Vec<Transaction>> {
        let mut signed = Vec::with_capacity(transactions.len());
        for tx in transactions {
            signed.push(self.sign_transaction(tx).await?);
        }
        Ok(signed)
    }
}

// ─── Keypair ──────────────────────────────────────────────────────────────────

/// Local keypair wallet, used by the CLI.
#[derive(Clone)]
pub struct KeypairWallet {
    keypair: Arc<Keypair>,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair: Arc::new(keypair) }
    }
}

#[async_trait]
impl Wallet for KeypairWallet {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(&self, mut transaction: Transaction) -> Result<Transaction> {
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_partial_sign(&[self.keypair.as_ref()], blockhash)
            .map_err(|e| Error::Signing(e.to_string()))?;
        Ok(transaction)
    }
}

// ─── Read-only ────────────────────────────────────────────────────────────────

/// An identity without signing capability. Good for read operations only.
#[derive(Debug, Clone, Copy)]
pub struct ReadOnlyWallet {
    pubkey: Pubkey,
}

impl ReadOnlyWallet {
    pub fn new(pubkey: Pubkey) -> Self {
        Self { pubkey }
    }
}

#[async_trait]
impl Wallet for ReadOnlyWallet {
    fn pubkey(&self) -> Pubkey {
        self.pubkey
    }

    async fn sign_transaction(&self, _transaction: Transaction) -> Result<Transaction> {
        Err(Error::WalletNotCapable("transaction signing"))
    }
}
