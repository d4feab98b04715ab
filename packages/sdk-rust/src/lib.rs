//! Fee Claimer Rust SDK
//!
//! Claims trading fees from Meteora Dynamic Bonding Curve and DAMM v2 pools,
//! and splits a share of a DAMM v2 position off to another wallet.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use fee_claimer_sdk::{FeeClaimerClient, KeypairWallet, SplitParams};
//! use solana_sdk::{pubkey::Pubkey, signature::Keypair};
//! use std::str::FromStr;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FeeClaimerClient::mainnet();
//!     let wallet = KeypairWallet::new(Keypair::new()); // use your funded keypair
//!     let owner  = Pubkey::from_str("7xtnVLHTkLcSXHvfbFFyv1FdTNov3LfP4yFxwYbXotj1")?;
//!
//!     // 1. See what the wallet holds
//!     for info in client.list_positions(&owner).await? {
//!         println!("{}  unclaimed {}/{}", info.position.address, info.unclaimed.base, info.unclaimed.quote);
//!     }
//!
//!     // 2. Hand half of a position to a partner
//!     let result = client.split_position_to_recipient(&wallet, SplitParams {
//!         pool:      Pubkey::from_str("So11111111111111111111111111111111111111112")?,
//!         recipient: Pubkey::from_str("FG75GTSYMimybJUBEcu6LkcNqm7fkga1iMp3v4nKnDQS")?,
//!         percent:   50.0,
//!         ..Default::default()
//!     }).await?;
//!     println!("Transferred! tx: {}", result.signature);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Feature Overview
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`FeeClaimerClient::claim_partner_fee`] | Partner fees of a bonding-curve pool (fee claimer only) |
//! | [`FeeClaimerClient::claim_creator_fee`] | Creator fees of a bonding-curve pool |
//! | [`FeeClaimerClient::claim_position_fee`] | Fees accrued by a DAMM v2 position |
//! | [`FeeClaimerClient::split_position_to_recipient`] | Split a position and transfer the new one |
//! | [`FeeClaimerClient::list_positions`] | Positions held by a wallet, with unclaimed fees |
//! | [`FeeClaimerClient::get_pool_fee_metrics`] | Partner/creator and lifetime fee counters |
//! | [`FeeClaimerClient::get_pool`] | Pool by address or base mint |
//! | [`FeeClaimerClient::migrated_pool_address`] | DAMM v2 pool a curve graduates into |

pub mod access;
pub mod auth;
pub mod client;
pub mod error;
pub mod gateway;
pub mod instructions;
pub mod locator;
pub mod math;
pub mod metrics;
pub mod protocol;
pub mod state;
pub mod token_program;
pub mod types;
pub mod wallet;
mod workflow;

pub use access::{AccessList, Role};
pub use client::FeeClaimerClient;
pub use error::{Error, Result};
pub use gateway::{AccountFilter, LedgerGateway, RpcGateway};
pub use instructions::MeteoraSdk;
pub use protocol::{FeeAccounting, ProtocolSdk};
pub use token_program::TokenProgram;
pub use types::*;
pub use wallet::{KeypairWallet, ReadOnlyWallet, Wallet};
