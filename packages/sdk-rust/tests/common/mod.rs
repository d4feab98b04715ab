//! In-memory ledger and fixtures for workflow tests.
//!
//! [`FakeLedger`] keeps an account map and applies the real Meteora, SPL
//! Token and associated-token-account instructions it receives, so the
//! workflows run end to end against real instruction encodings.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use fee_claimer_sdk::{
    instructions::{instruction_discriminator, CP_AMM_PROGRAM_ID, DBC_PROGRAM_ID},
    math::split_liquidity,
    state::{
        account_discriminator, parse_cp_amm_position, parse_pool_config, parse_token_account,
        CP_AMM_POOL_ACCOUNT, CP_AMM_POOL_LEN, POOL_CONFIG_ACCOUNT, POOL_CONFIG_LEN,
        POSITION_ACCOUNT, POSITION_LEN, TOKEN_ACCOUNT_LEN, VIRTUAL_POOL_ACCOUNT, VIRTUAL_POOL_LEN,
    },
    AccountFilter, Error, FeeClaimerClient, KeypairWallet, LedgerGateway, MeteoraSdk, PollConfig,
    ProtocolSdk, Result,
};
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_sdk::{
    account::Account,
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    transaction::Transaction,
};

pub const MINT_LEN: usize = 82;

// ─── Ledger ───────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeLedger {
    accounts:    Mutex<HashMap<Pubkey, Account>>,
    submissions: Mutex<Vec<Transaction>>,
    /// Scans each freshly created position NFT account stays invisible for.
    scan_lag:    AtomicU32,
    unindexed:   Mutex<HashMap<Pubkey, u32>>,
    /// Accept associated-account creations without materializing the account.
    drop_account_creation: AtomicBool,
    /// Reject the next transaction that calls this instruction.
    fail_instruction: Mutex<Option<[u8; 8]>>,
}

impl FakeLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put(&self, address: Pubkey, owner: Pubkey, data: Vec<u8>) {
        let account = Account { lamports: 1_000_000, data, owner, executable: false, rent_epoch: 0 };
        self.accounts.lock().unwrap().insert(address, account);
    }

    pub fn account(&self, address: &Pubkey) -> Option<Account> {
        self.accounts.lock().unwrap().get(address).cloned()
    }

    pub fn set_scan_lag(&self, scans: u32) {
        self.scan_lag.store(scans, Ordering::SeqCst);
    }

    pub fn drop_account_creation(&self) {
        self.drop_account_creation.store(true, Ordering::SeqCst);
    }

    pub fn restore_account_creation(&self) {
        self.drop_account_creation.store(false, Ordering::SeqCst);
    }

    pub fn fail_next(&self, instruction: &str) {
        *self.fail_instruction.lock().unwrap() = Some(instruction_discriminator(instruction));
    }

    pub fn submissions(&self) -> Vec<Transaction> {
        self.submissions.lock().unwrap().clone()
    }

    /// How many settled transactions called the named Anchor instruction.
    pub fn calls(&self, instruction: &str) -> usize {
        let disc = instruction_discriminator(instruction);
        self.submissions()
            .iter()
            .flat_map(|tx| tx.message.instructions.clone())
            .filter(|ix| ix.data.len() >= 8 && ix.data[..8] == disc)
            .count()
    }

    pub fn token_amount(&self, address: &Pubkey) -> Option<u64> {
        self.account(address).and_then(|a| parse_token_account(&a.data).ok()).map(|t| t.amount)
    }

    pub fn position_liquidity(&self, address: &Pubkey) -> u128 {
        let account = self.account(address).expect("position exists");
        parse_cp_amm_position(&account.data).expect("position parses").unlocked_liquidity
    }

    fn execute(&self, tx: &Transaction) -> std::result::Result<(), String> {
        tx.verify().map_err(|e| format!("signature verification failed: {e}"))?;

        let fail = *self.fail_instruction.lock().unwrap();
        let keys = &tx.message.account_keys;
        let mut staged = self.accounts.lock().unwrap().clone();
        let mut created_nft_accounts = Vec::new();

        for compiled in &tx.message.instructions {
            let program = keys[compiled.program_id_index as usize];
            let accounts: Vec<Pubkey> = compiled.accounts.iter().map(|i| keys[*i as usize]).collect();
            let data = compiled.data.as_slice();

            if let Some(disc) = fail {
                if data.len() >= 8 && data[..8] == disc {
                    *self.fail_instruction.lock().unwrap() = None;
                    return Err("injected failure".into());
                }
            }

            if program == spl_associated_token_account::ID {
                self.create_associated_account(&mut staged, &accounts, data)?;
            } else if program == spl_token::ID || program == spl_token_2022::ID {
                transfer_checked(&mut staged, &accounts, data)?;
            } else if program == CP_AMM_PROGRAM_ID {
                if let Some(nft_account) = cp_amm(&mut staged, &accounts, data)? {
                    created_nft_accounts.push(nft_account);
                }
            } else if program == DBC_PROGRAM_ID {
                dbc(&mut staged, &accounts, data)?;
            } else {
                return Err(format!("unknown program {program}"));
            }
        }

        *self.accounts.lock().unwrap() = staged;
        let lag = self.scan_lag.load(Ordering::SeqCst);
        if lag > 0 {
            let mut unindexed = self.unindexed.lock().unwrap();
            for account in created_nft_accounts {
                unindexed.insert(account, lag);
            }
        }
        Ok(())
    }

    fn create_associated_account(
        &self,
        staged:   &mut HashMap<Pubkey, Account>,
        accounts: &[Pubkey],
        data:     &[u8],
    ) -> std::result::Result<(), String> {
        // funding, associated account, wallet, mint, system program, token program
        let (address, wallet, mint, token_program) = (accounts[1], accounts[2], accounts[3], accounts[5]);
        let idempotent = data.first() == Some(&1);
        if staged.contains_key(&address) {
            return if idempotent { Ok(()) } else { Err(format!("account {address} already in use")) };
        }
        if self.drop_account_creation.load(Ordering::SeqCst) {
            return Ok(());
        }
        staged.insert(address, account(token_program, token_account(&mint, &wallet, 0)));
        Ok(())
    }
}

fn account(owner: Pubkey, data: Vec<u8>) -> Account {
    Account { lamports: 1_000_000, data, owner, executable: false, rent_epoch: 0 }
}

fn transfer_checked(
    staged:   &mut HashMap<Pubkey, Account>,
    accounts: &[Pubkey],
    data:     &[u8],
) -> std::result::Result<(), String> {
    if data.first() != Some(&12) {
        return Err(format!("unsupported token instruction {:?}", data.first()));
    }
    let amount = u64::from_le_bytes(data[1..9].try_into().map_err(|_| "short data")?);
    let (source, mint, destination, authority) = (accounts[0], accounts[1], accounts[2], accounts[3]);

    let src = parse_token_account(&staged.get(&source).ok_or("missing source")?.data)
        .map_err(|e| e.to_string())?;
    let dst = parse_token_account(&staged.get(&destination).ok_or("missing destination")?.data)
        .map_err(|e| e.to_string())?;
    if src.owner != authority {
        return Err("authority does not own the source account".into());
    }
    if src.mint != mint || dst.mint != mint {
        return Err("mint mismatch".into());
    }
    if src.amount < amount {
        return Err("insufficient funds".into());
    }
    set_token_amount(staged, &source, src.amount - amount);
    set_token_amount(staged, &destination, dst.amount + amount);
    Ok(())
}

fn set_token_amount(staged: &mut HashMap<Pubkey, Account>, address: &Pubkey, amount: u64) {
    if let Some(acc) = staged.get_mut(address) {
        acc.data[64..72].copy_from_slice(&amount.to_le_bytes());
    }
}

/// Apply a cp-amm instruction. Returns the NFT account a new position was minted into.
fn cp_amm(
    staged:   &mut HashMap<Pubkey, Account>,
    accounts: &[Pubkey],
    data:     &[u8],
) -> std::result::Result<Option<Pubkey>, String> {
    let disc: [u8; 8] = data[..8].try_into().map_err(|_| "short data")?;
    if disc == instruction_discriminator("create_position") {
        // owner, nft mint, nft account, pool, position, ...
        let (owner, nft_mint, nft_account, pool, position) =
            (accounts[0], accounts[1], accounts[2], accounts[3], accounts[4]);
        if staged.contains_key(&position) {
            return Err("position already exists".into());
        }
        staged.insert(nft_mint, account(spl_token_2022::ID, mint_data(0)));
        staged.insert(nft_account, account(spl_token_2022::ID, token_account(&nft_mint, &owner, 1)));
        staged.insert(position, account(CP_AMM_PROGRAM_ID, position_data(&pool, &nft_mint, 0)));
        return Ok(Some(nft_account));
    }
    if disc == instruction_discriminator("split_position2") {
        let (first, second) = (accounts[1], accounts[3]);
        let numerator = u32::from_le_bytes(data[8..12].try_into().map_err(|_| "short data")?);
        let first_liq = read_liquidity(staged, &first)?;
        let second_liq = read_liquidity(staged, &second)?;
        let moved = split_liquidity(first_liq, numerator).map_err(|e| e.to_string())?;
        write_liquidity(staged, &first, first_liq - moved);
        write_liquidity(staged, &second, second_liq + moved);
        return Ok(None);
    }
    if disc == instruction_discriminator("claim_position_fee") {
        let position = accounts[2];
        let acc = staged.get_mut(&position).ok_or("missing position")?;
        acc.data[136..152].fill(0);
        return Ok(None);
    }
    Err("unknown cp-amm instruction".into())
}

fn dbc(
    staged:   &mut HashMap<Pubkey, Account>,
    accounts: &[Pubkey],
    data:     &[u8],
) -> std::result::Result<(), String> {
    let disc: [u8; 8] = data[..8].try_into().map_err(|_| "short data")?;
    if disc == instruction_discriminator("claim_trading_fee") {
        let (config, pool, claimant) = (accounts[1], accounts[2], accounts[9]);
        let config = parse_pool_config(&staged.get(&config).ok_or("missing config")?.data)
            .map_err(|e| e.to_string())?;
        if config.fee_claimer != claimant {
            return Err("NotPermitToDoThisAction".into());
        }
        let acc = staged.get_mut(&pool).ok_or("missing pool")?;
        acc.data[264..280].fill(0);
        return Ok(());
    }
    if disc == instruction_discriminator("claim_creator_trading_fee") {
        let pool = accounts[1];
        let acc = staged.get_mut(&pool).ok_or("missing pool")?;
        acc.data[352..368].fill(0);
        return Ok(());
    }
    Err("unknown dbc instruction".into())
}

fn read_liquidity(staged: &HashMap<Pubkey, Account>, position: &Pubkey) -> std::result::Result<u128, String> {
    let acc = staged.get(position).ok_or("missing position")?;
    Ok(parse_cp_amm_position(&acc.data).map_err(|e| e.to_string())?.unlocked_liquidity)
}

fn write_liquidity(staged: &mut HashMap<Pubkey, Account>, position: &Pubkey, liquidity: u128) {
    if let Some(acc) = staged.get_mut(position) {
        acc.data[152..168].copy_from_slice(&liquidity.to_le_bytes());
    }
}

fn rpc_error(message: String) -> Error {
    Error::Rpc(ClientError::from(ClientErrorKind::Custom(message)))
}

#[async_trait]
impl LedgerGateway for FakeLedger {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>> {
        Ok(self.account(address))
    }

    async fn get_multiple_accounts(&self, addresses: &[Pubkey]) -> Result<Vec<Option<Account>>> {
        Ok(addresses.iter().map(|a| self.account(a)).collect())
    }

    async fn get_program_accounts(
        &self,
        program: &Pubkey,
        filters: Vec<AccountFilter>,
    ) -> Result<Vec<(Pubkey, Account)>> {
        let mut unindexed = self.unindexed.lock().unwrap();
        let accounts = self.accounts.lock().unwrap();
        let mut out: Vec<(Pubkey, Account)> = accounts
            .iter()
            .filter(|(address, acc)| {
                acc.owner == *program
                    && !unindexed.contains_key(*address)
                    && filters.iter().all(|f| f.matches(&acc.data))
            })
            .map(|(k, v)| (*k, v.clone()))
            .collect();
        out.sort_by_key(|(k, _)| *k);
        unindexed.retain(|_, remaining| {
            *remaining = remaining.saturating_sub(1);
            *remaining > 0
        });
        Ok(out)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        Ok(Hash::new_unique())
    }

    async fn send_and_confirm(&self, transaction: &Transaction, _: CommitmentConfig) -> Result<Signature> {
        self.execute(transaction).map_err(rpc_error)?;
        self.submissions.lock().unwrap().push(transaction.clone());
        Ok(transaction.signatures[0])
    }
}

// ─── Account encoders ─────────────────────────────────────────────────────────

fn put_bytes(buf: &mut [u8], offset: usize, bytes: &[u8]) {
    buf[offset..offset + bytes.len()].copy_from_slice(bytes);
}

pub fn mint_data(decimals: u8) -> Vec<u8> {
    let mut data = vec![0u8; MINT_LEN];
    data[44] = decimals;
    data[45] = 1; // is_initialized
    data
}

pub fn token_account(mint: &Pubkey, owner: &Pubkey, amount: u64) -> Vec<u8> {
    let mut data = vec![0u8; TOKEN_ACCOUNT_LEN];
    put_bytes(&mut data, 0, mint.as_ref());
    put_bytes(&mut data, 32, owner.as_ref());
    put_bytes(&mut data, 64, &amount.to_le_bytes());
    data[108] = 1; // initialized
    data
}

pub fn position_data(pool: &Pubkey, nft_mint: &Pubkey, liquidity: u128) -> Vec<u8> {
    let mut data = vec![0u8; POSITION_LEN];
    put_bytes(&mut data, 0, &account_discriminator(POSITION_ACCOUNT));
    put_bytes(&mut data, 8, pool.as_ref());
    put_bytes(&mut data, 40, nft_mint.as_ref());
    put_bytes(&mut data, 152, &liquidity.to_le_bytes());
    data
}

pub struct CurveFixture {
    pub fee_claimer:   Pubkey,
    pub creator:       Pubkey,
    pub base_mint:     Pubkey,
    pub quote_mint:    Pubkey,
    pub quote_reserve: u64,
    pub migration_quote_threshold: u64,
    pub partner_fees:  (u64, u64),
    pub creator_fees:  (u64, u64),
    pub total_fees:    (u64, u64),
}

impl CurveFixture {
    /// A pool with nothing traded yet.
    pub fn new(fee_claimer: Pubkey, creator: Pubkey, base_mint: Pubkey, quote_mint: Pubkey) -> Self {
        Self {
            fee_claimer,
            creator,
            base_mint,
            quote_mint,
            quote_reserve: 0,
            migration_quote_threshold: 0,
            partner_fees: (0, 0),
            creator_fees: (0, 0),
            total_fees: (0, 0),
        }
    }
}

pub fn virtual_pool_data(curve: &CurveFixture, config: &Pubkey) -> Vec<u8> {
    let mut data = vec![0u8; VIRTUAL_POOL_LEN];
    put_bytes(&mut data, 0, &account_discriminator(VIRTUAL_POOL_ACCOUNT));
    put_bytes(&mut data, 72, config.as_ref());
    put_bytes(&mut data, 104, curve.creator.as_ref());
    put_bytes(&mut data, 136, curve.base_mint.as_ref());
    put_bytes(&mut data, 168, Pubkey::new_unique().as_ref());
    put_bytes(&mut data, 200, Pubkey::new_unique().as_ref());
    put_bytes(&mut data, 240, &curve.quote_reserve.to_le_bytes());
    put_bytes(&mut data, 264, &curve.partner_fees.0.to_le_bytes());
    put_bytes(&mut data, 272, &curve.partner_fees.1.to_le_bytes());
    put_bytes(&mut data, 328, &curve.total_fees.0.to_le_bytes());
    put_bytes(&mut data, 336, &curve.total_fees.1.to_le_bytes());
    put_bytes(&mut data, 352, &curve.creator_fees.0.to_le_bytes());
    put_bytes(&mut data, 360, &curve.creator_fees.1.to_le_bytes());
    data
}

pub fn pool_config_data(curve: &CurveFixture, migration_fee_option: u8) -> Vec<u8> {
    let mut data = vec![0u8; POOL_CONFIG_LEN];
    put_bytes(&mut data, 0, &account_discriminator(POOL_CONFIG_ACCOUNT));
    put_bytes(&mut data, 8, curve.quote_mint.as_ref());
    put_bytes(&mut data, 40, curve.fee_claimer.as_ref());
    data[243] = migration_fee_option;
    put_bytes(&mut data, 264, &curve.migration_quote_threshold.to_le_bytes());
    data
}

pub fn cp_amm_pool_data(mint_a: &Pubkey, mint_b: &Pubkey, fee_a_per_liquidity: u128) -> Vec<u8> {
    let mut data = vec![0u8; CP_AMM_POOL_LEN];
    put_bytes(&mut data, 0, &account_discriminator(CP_AMM_POOL_ACCOUNT));
    put_bytes(&mut data, 168, mint_a.as_ref());
    put_bytes(&mut data, 200, mint_b.as_ref());
    put_bytes(&mut data, 232, Pubkey::new_unique().as_ref());
    put_bytes(&mut data, 264, Pubkey::new_unique().as_ref());
    // Q128: the u128 goes in the upper half, one unit of fee per unit of liquidity each.
    put_bytes(&mut data, 488 + 16, &fee_a_per_liquidity.to_le_bytes());
    data
}

// ─── Fixtures ─────────────────────────────────────────────────────────────────

pub fn instant_poll() -> PollConfig {
    PollConfig { settle_delay: Duration::ZERO, interval: Duration::ZERO, max_attempts: 3 }
}

pub fn client(ledger: &Arc<FakeLedger>) -> FeeClaimerClient {
    FeeClaimerClient::with_parts(ledger.clone(), Arc::new(MeteoraSdk::new()))
        .with_poll_config(instant_poll())
}

pub fn wallet() -> KeypairWallet {
    KeypairWallet::new(Keypair::new())
}

pub fn put_mint(ledger: &FakeLedger, program: Pubkey) -> Pubkey {
    let mint = Pubkey::new_unique();
    ledger.put(mint, program, mint_data(6));
    mint
}

/// A bonding-curve pool with its configuration. Returns `(pool, config)`.
pub fn put_dbc_pool(ledger: &FakeLedger, curve: &CurveFixture) -> (Pubkey, Pubkey) {
    let pool = Pubkey::new_unique();
    let config = Pubkey::new_unique();
    ledger.put(config, DBC_PROGRAM_ID, pool_config_data(curve, 1));
    ledger.put(pool, DBC_PROGRAM_ID, virtual_pool_data(curve, &config));
    (pool, config)
}

pub fn put_cp_amm_pool(ledger: &FakeLedger, mint_a: &Pubkey, mint_b: &Pubkey, fee_a_per_liquidity: u128) -> Pubkey {
    let pool = Pubkey::new_unique();
    ledger.put(pool, CP_AMM_PROGRAM_ID, cp_amm_pool_data(mint_a, mint_b, fee_a_per_liquidity));
    pool
}

pub struct PositionFixture {
    pub address:     Pubkey,
    pub nft_mint:    Pubkey,
    pub nft_account: Pubkey,
}

/// A position held by `owner` the way `create_position` leaves it.
pub fn put_position(ledger: &FakeLedger, pool: &Pubkey, owner: &Pubkey, liquidity: u128) -> PositionFixture {
    let sdk = MeteoraSdk::new();
    let nft_mint = Pubkey::new_unique();
    let address = sdk.position_address(&nft_mint);
    let nft_account = sdk.position_nft_account(&nft_mint);
    ledger.put(nft_mint, spl_token_2022::ID, mint_data(0));
    ledger.put(nft_account, spl_token_2022::ID, token_account(&nft_mint, owner, 1));
    ledger.put(address, CP_AMM_PROGRAM_ID, position_data(pool, &nft_mint, liquidity));
    PositionFixture { address, nft_mint, nft_account }
}

/// Standard mint A, Token-2022 mint B, a cp-amm pool over them.
pub fn cp_amm_setup(ledger: &FakeLedger) -> (Pubkey, Pubkey, Pubkey) {
    let mint_a = put_mint(ledger, spl_token::ID);
    let mint_b = put_mint(ledger, spl_token_2022::ID);
    let pool = put_cp_amm_pool(ledger, &mint_a, &mint_b, 0);
    (pool, mint_a, mint_b)
}
