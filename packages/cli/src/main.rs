use anyhow::{anyhow, bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use fee_claimer_sdk::{
    access, AccessList, AuthorizationBypass, ClaimBounds, CreatorClaimParams, FeeClaimerClient,
    KeypairWallet, PartnerClaimParams, PoolKind, PositionClaimParams, SplitParams,
    DEFAULT_MAX_QUOTE_AMOUNT,
};
use serde_json::json;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair, Signer},
};
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ─── Token symbol registry (mainnet-beta) ────────────────────────────────────

const KNOWN_TOKENS: &[(&str, &str)] = &[
    ("SOL",  "So11111111111111111111111111111111111111112"),
    ("USDC", "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"),
    ("USDT", "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB"),
];

/// Resolve a symbol (SOL, USDC, USDT) or raw base-58 address to a Pubkey.
fn resolve_mint(symbol_or_address: &str) -> Result<Pubkey> {
    let upper = symbol_or_address.to_uppercase();
    for (sym, addr) in KNOWN_TOKENS {
        if upper == *sym {
            return Ok(Pubkey::from_str(addr)?);
        }
    }
    Pubkey::from_str(symbol_or_address)
        .map_err(|_| anyhow!(
            "Unknown token or address '{}'. Use a built-in symbol ({}) or a base-58 address.",
            symbol_or_address,
            KNOWN_TOKENS.iter().map(|(s, _)| *s).collect::<Vec<_>>().join(", ")
        ))
}

/// Reverse-lookup: mint address → symbol, or shortened address for unknowns.
fn resolve_symbol(mint: &Pubkey) -> String {
    let addr = mint.to_string();
    for (sym, known) in KNOWN_TOKENS {
        if addr == *known {
            return sym.to_string();
        }
    }
    format!("{}…{}", &addr[..4], &addr[addr.len() - 4..])
}

/// Expand `~/` to `$HOME/` in file paths.
fn expand_home(path: &str) -> String {
    if path.starts_with("~/") {
        format!("{}{}", std::env::var("HOME").unwrap_or_default(), &path[1..])
    } else {
        path.to_string()
    }
}

fn load_keypair(path: &str) -> Result<Keypair> {
    let expanded = expand_home(path);
    read_keypair_file(&expanded)
        .map_err(|e| anyhow!(
            "Cannot load keypair from '{}': {}\n  \
             Set FEE_CLAIMER_KEYPAIR or pass --keypair to specify a different path.",
            expanded, e
        ))
}

fn parse_commitment(level: &str) -> Result<CommitmentConfig> {
    match level {
        "processed" => Ok(CommitmentConfig::processed()),
        "confirmed" => Ok(CommitmentConfig::confirmed()),
        "finalized" => Ok(CommitmentConfig::finalized()),
        other => bail!("Unknown commitment '{other}'. Use processed, confirmed or finalized."),
    }
}

fn opt_key(key: Option<Pubkey>) -> String {
    key.map(|k| k.to_string()).unwrap_or_else(|| "-".into())
}

// ─── Version banner ───────────────────────────────────────────────────────────

fn print_banner() {
    let ver = env!("CARGO_PKG_VERSION");
    println!();
    println!("  fee-claimer  v{ver}  ·  Meteora fee claims and position hand-over");
    println!("  {}", "─".repeat(62));
    println!("  DBC       {}", fee_claimer_sdk::instructions::DBC_PROGRAM_ID);
    println!("  DAMM v2   {}", fee_claimer_sdk::instructions::CP_AMM_PROGRAM_ID);
    println!();
}

// ─── CLI definition ───────────────────────────────────────────────────────────

/// fee-claimer: claim Meteora pool fees and hand DAMM v2 positions over.
///
/// Every command supports --json for machine-readable output.
#[derive(Parser)]
#[command(
    name    = "fee-claimer",
    version = env!("CARGO_PKG_VERSION"),
    about   = "Claim Meteora bonding-curve and DAMM v2 fees; split and transfer DAMM v2 positions.",
    after_help = "\
ENVIRONMENT:
  FEE_CLAIMER_RPC_URL      Solana JSON-RPC endpoint  [default: https://api.mainnet-beta.solana.com]
  FEE_CLAIMER_KEYPAIR      Path to Ed25519 keypair JSON  [default: ~/.config/solana/id.json]
  FEE_CLAIMER_ACCESS_LIST  Path to the wallet access list JSON (optional)
  RUST_LOG                 Log filter; overrides --log-level

QUICK START:
  fee-claimer pool-info          --pool <POOL_OR_BASE_MINT>
  fee-claimer fee-metrics        --pool <POOL_OR_BASE_MINT>
  fee-claimer claim-partner-fee  --pool <POOL_OR_BASE_MINT>
  fee-claimer my-positions
  fee-claimer split-position     --pool <POOL> --recipient <WALLET> --percent 50"
)]
struct Cli {
    /// Solana JSON-RPC endpoint
    #[arg(
        long,
        global     = true,
        value_name = "URL",
        default_value = "https://api.mainnet-beta.solana.com",
        env = "FEE_CLAIMER_RPC_URL"
    )]
    rpc_url: String,

    /// Path to the signing wallet's Ed25519 keypair JSON file
    #[arg(
        long,
        global     = true,
        value_name = "PATH",
        default_value = "~/.config/solana/id.json",
        env = "FEE_CLAIMER_KEYPAIR"
    )]
    keypair: String,

    /// Path to the wallet access list JSON; without one every wallet may act
    #[arg(long, global = true, value_name = "PATH", env = "FEE_CLAIMER_ACCESS_LIST")]
    access_list: Option<String>,

    /// Settlement level to wait for: processed, confirmed or finalized
    #[arg(long, global = true, value_name = "LEVEL", default_value = "confirmed")]
    commitment: String,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, global = true, value_name = "FILTER", default_value = "warn,fee_claimer_sdk=info")]
    log_level: String,

    /// Output machine-readable JSON instead of human-readable text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a pool: kind, mints, vaults, fee claimer, creator, curve progress
    ///
    /// Accepts a pool address of either kind, or the base mint of a
    /// bonding-curve pool. Read-only.
    #[command(
        after_help = "\
EXAMPLES:
  fee-claimer pool-info --pool <POOL_ADDRESS>
  fee-claimer pool-info --pool <BASE_MINT> --json"
    )]
    PoolInfo {
        /// Pool address or bonding-curve base mint
        #[arg(long, value_name = "POOL")]
        pool: String,
    },

    /// Show unclaimed partner/creator fees and lifetime trading fees
    ///
    /// Bonding-curve pools only. Amounts are in atomic units.
    #[command(
        name = "fee-metrics",
        after_help = "\
EXAMPLES:
  fee-claimer fee-metrics --pool <POOL_OR_BASE_MINT>"
    )]
    FeeMetrics {
        #[arg(long, value_name = "POOL")]
        pool: String,
    },

    /// List DAMM v2 positions held by the keypair (or --owner) with unclaimed fees
    #[command(
        name = "my-positions",
        after_help = "\
EXAMPLES:
  fee-claimer my-positions
  fee-claimer my-positions --pool <POOL> --json
  fee-claimer my-positions --owner <WALLET>"
    )]
    MyPositions {
        /// Only positions in this pool
        #[arg(long, value_name = "POOL")]
        pool: Option<String>,

        /// Wallet to inspect instead of the keypair's
        #[arg(long, value_name = "WALLET")]
        owner: Option<String>,
    },

    /// Claim partner trading fees from a bonding-curve pool
    ///
    /// Only the fee claimer named in the pool configuration may claim.
    #[command(
        name = "claim-partner-fee",
        after_help = "\
EXAMPLES:
  fee-claimer claim-partner-fee --pool <POOL_OR_BASE_MINT>
  fee-claimer claim-partner-fee --pool <POOL> --max-base 0 --max-quote 5000000

NOTES:
  --skip-validation sends the claim without the local fee-claimer check;
  the program still rejects wallets that are not the fee claimer."
    )]
    ClaimPartnerFee {
        #[arg(long, value_name = "POOL")]
        pool: String,

        /// Upper bound on base tokens claimed (atomic units)
        #[arg(long, value_name = "AMOUNT", default_value_t = 0)]
        max_base: u64,

        /// Upper bound on quote tokens claimed (atomic units)
        #[arg(long, value_name = "AMOUNT", default_value_t = DEFAULT_MAX_QUOTE_AMOUNT)]
        max_quote: u64,

        /// Skip the local fee-claimer check
        #[arg(long, default_value_t = false)]
        skip_validation: bool,
    },

    /// Claim creator trading fees from a bonding-curve pool
    #[command(
        name = "claim-creator-fee",
        after_help = "\
EXAMPLES:
  fee-claimer claim-creator-fee --pool <POOL_OR_BASE_MINT>"
    )]
    ClaimCreatorFee {
        #[arg(long, value_name = "POOL")]
        pool: String,

        #[arg(long, value_name = "AMOUNT", default_value_t = 0)]
        max_base: u64,

        #[arg(long, value_name = "AMOUNT", default_value_t = DEFAULT_MAX_QUOTE_AMOUNT)]
        max_quote: u64,
    },

    /// Claim the fees accrued by one DAMM v2 position the keypair holds
    #[command(
        name = "claim-position-fee",
        after_help = "\
EXAMPLES:
  fee-claimer claim-position-fee --position <POSITION>

  # See positions and unclaimed amounts first:
  fee-claimer my-positions"
    )]
    ClaimPositionFee {
        #[arg(long, value_name = "POSITION")]
        position: String,
    },

    /// Split a share of your largest position in a pool and transfer it
    ///
    /// Creates a second position (or reuses an empty one from an earlier,
    /// interrupted run), moves PERCENT of the liquidity into it, and sends
    /// its NFT to RECIPIENT. Four transactions at most.
    #[command(
        name = "split-position",
        after_help = "\
EXAMPLES:
  fee-claimer split-position --pool <POOL> --recipient <WALLET> --percent 50
  fee-claimer split-position --pool <POOL> --recipient <WALLET> --percent 12.5 --json

  fee-claimer split-position --pool <POOL> --recipient <WALLET> --percent 50 --resume-position <POSITION>

NOTES:
  An empty position already in the pool is reused instead of creating one.
  If a run fails after the split settled, the error names the second position;
  pass it as --resume-position to finish the transfer without splitting again."
    )]
    SplitPosition {
        /// DAMM v2 pool address
        #[arg(long, value_name = "POOL")]
        pool: String,

        /// Wallet that receives the new position
        #[arg(long, value_name = "WALLET")]
        recipient: String,

        /// Share of liquidity to hand over, in (0, 100]
        #[arg(long, value_name = "PCT")]
        percent: f64,

        /// Second position of an earlier run whose split already settled;
        /// only the transfer to RECIPIENT is performed
        #[arg(long, value_name = "POSITION")]
        resume_position: Option<String>,
    },

    /// Derive the DAMM v2 pool a bonding-curve pool migrates to
    #[command(
        name = "migrated-pool",
        after_help = "\
EXAMPLES:
  fee-claimer migrated-pool --pool <POOL_OR_BASE_MINT>"
    )]
    MigratedPool {
        #[arg(long, value_name = "POOL")]
        pool: String,
    },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    // When invoked with no arguments, show banner + full help and exit cleanly.
    if std::env::args().len() == 1 {
        print_banner();
        Cli::command().print_long_help().ok();
        println!();
        return Ok(());
    }

    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let client = build_client(&cli)?;

    match &cli.command {
        Commands::PoolInfo { pool } => cmd_pool_info(&client, pool, cli.json).await,
        Commands::FeeMetrics { pool } => cmd_fee_metrics(&client, pool, cli.json).await,
        Commands::MyPositions { pool, owner } => {
            cmd_my_positions(&client, &cli.keypair, pool.as_deref(), owner.as_deref(), cli.json).await
        }
        Commands::ClaimPartnerFee { pool, max_base, max_quote, skip_validation } => {
            let bounds = ClaimBounds { max_base_amount: *max_base, max_quote_amount: *max_quote };
            cmd_claim_partner_fee(&client, &cli.keypair, pool, bounds, *skip_validation, cli.json).await
        }
        Commands::ClaimCreatorFee { pool, max_base, max_quote } => {
            let bounds = ClaimBounds { max_base_amount: *max_base, max_quote_amount: *max_quote };
            cmd_claim_creator_fee(&client, &cli.keypair, pool, bounds, cli.json).await
        }
        Commands::ClaimPositionFee { position } => {
            cmd_claim_position_fee(&client, &cli.keypair, position, cli.json).await
        }
        Commands::SplitPosition { pool, recipient, percent, resume_position } => {
            cmd_split_position(
                &client,
                &cli.keypair,
                pool,
                recipient,
                *percent,
                resume_position.as_deref(),
                cli.json,
            )
            .await
        }
        Commands::MigratedPool { pool } => cmd_migrated_pool(&client, pool, cli.json).await,
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_client(cli: &Cli) -> Result<FeeClaimerClient> {
    let commitment = parse_commitment(&cli.commitment)?;

    // Installed before the client is built so the client picks it up.
    match &cli.access_list {
        Some(path) => {
            let expanded = expand_home(path);
            let list = AccessList::load(Path::new(&expanded))
                .with_context(|| format!("Cannot load access list from '{expanded}'"))?;
            info!(wallets = list.len(), path = %expanded, "access list loaded");
            access::install(list)?;
        }
        None => warn!("no access list configured; every wallet may claim and split"),
    }

    Ok(FeeClaimerClient::new(cli.rpc_url.clone()).with_commitment(commitment))
}

fn wallet(keypair_path: &str) -> Result<KeypairWallet> {
    Ok(KeypairWallet::new(load_keypair(keypair_path)?))
}

// ─── pool-info ────────────────────────────────────────────────────────────────

async fn cmd_pool_info(client: &FeeClaimerClient, pool: &str, json_output: bool) -> Result<()> {
    let identifier = resolve_mint(pool)?;
    let pool = client
        .get_pool(&identifier)
        .await
        .with_context(|| format!("Cannot resolve pool '{identifier}'"))?;

    if json_output {
        println!("{}", json!({
            "status":         "ok",
            "command":        "pool-info",
            "pool":           pool.address.to_string(),
            "kind":           pool.kind.to_string(),
            "base_mint":      pool.base_mint.to_string(),
            "base_vault":     pool.base_vault.to_string(),
            "quote_mint":     pool.quote_mint.to_string(),
            "quote_vault":    pool.quote_vault.to_string(),
            "config":         pool.config.map(|k| k.to_string()),
            "fee_claimer":    pool.fee_claimer.map(|k| k.to_string()),
            "creator":        pool.creator.map(|k| k.to_string()),
            "curve_progress": pool.curve_progress,
        }));
    } else {
        println!("─── Pool Info ────────────────────────────────────────────────────");
        println!("  Pool             {}", pool.address);
        println!("  Kind             {}", pool.kind);
        println!();
        println!("  Base mint        {}  ({})", resolve_symbol(&pool.base_mint), pool.base_mint);
        println!("  Base vault       {}", pool.base_vault);
        println!("  Quote mint       {}  ({})", resolve_symbol(&pool.quote_mint), pool.quote_mint);
        println!("  Quote vault      {}", pool.quote_vault);
        println!();
        if pool.kind == PoolKind::BondingCurve {
            println!("  Config           {}", opt_key(pool.config));
        }
        println!("  Fee claimer      {}", opt_key(pool.fee_claimer));
        println!("  Creator          {}", opt_key(pool.creator));
        if let Some(progress) = pool.curve_progress {
            println!("  Curve progress   {:.2}%", progress * 100.0);
        }
    }
    Ok(())
}

// ─── fee-metrics ──────────────────────────────────────────────────────────────

async fn cmd_fee_metrics(client: &FeeClaimerClient, pool: &str, json_output: bool) -> Result<()> {
    let identifier = resolve_mint(pool)?;
    let metrics = client
        .get_pool_fee_metrics(&identifier)
        .await
        .with_context(|| format!("Cannot read fee metrics of '{identifier}'"))?;

    if json_output {
        println!("{}", json!({
            "status":  "ok",
            "command": "fee-metrics",
            "pool":    identifier.to_string(),
            "current": {
                "partner_base_fee":  metrics.current.partner_base_fee.to_string(),
                "partner_quote_fee": metrics.current.partner_quote_fee.to_string(),
                "creator_base_fee":  metrics.current.creator_base_fee.to_string(),
                "creator_quote_fee": metrics.current.creator_quote_fee.to_string(),
            },
            "total": {
                "total_trading_base_fee":  metrics.total.total_trading_base_fee.to_string(),
                "total_trading_quote_fee": metrics.total.total_trading_quote_fee.to_string(),
            },
        }));
    } else {
        let current = &metrics.current;
        let total = &metrics.total;
        println!("─── Fee Metrics ──────────────────────────────────────────────────");
        println!("  Pool             {identifier}");
        println!();
        println!("  Unclaimed (atomic units)           base                quote");
        println!("  Partner          {:>20} {:>20}", current.partner_base_fee, current.partner_quote_fee);
        println!("  Creator          {:>20} {:>20}", current.creator_base_fee, current.creator_quote_fee);
        println!();
        println!("  Lifetime trading {:>20} {:>20}", total.total_trading_base_fee, total.total_trading_quote_fee);
    }
    Ok(())
}

// ─── my-positions ─────────────────────────────────────────────────────────────

async fn cmd_my_positions(
    client:       &FeeClaimerClient,
    keypair_path: &str,
    pool:         Option<&str>,
    owner:        Option<&str>,
    json_output:  bool,
) -> Result<()> {
    let owner = match owner {
        Some(owner) => Pubkey::from_str(owner).with_context(|| format!("Invalid owner '{owner}'"))?,
        None => load_keypair(keypair_path)?.pubkey(),
    };
    let positions = match pool {
        Some(pool) => {
            let pool = Pubkey::from_str(pool).with_context(|| format!("Invalid pool '{pool}'"))?;
            client.list_positions_in_pool(&pool, &owner).await?
        }
        None => client.list_positions(&owner).await?,
    };

    if json_output {
        // u128 amounts are emitted as strings; JSON numbers lose precision past 2^53.
        let items: Vec<_> = positions.iter().map(|info| json!({
            "position":         info.position.address.to_string(),
            "pool":             info.pool.address.to_string(),
            "nft_mint":         info.position.nft_mint.to_string(),
            "nft_account":      info.position.nft_account.to_string(),
            "token_a_mint":     info.pool.token_a_mint.to_string(),
            "token_b_mint":     info.pool.token_b_mint.to_string(),
            "liquidity":        info.position.liquidity.to_string(),
            "locked_liquidity": info.position.locked_liquidity.to_string(),
            "unclaimed_a":      info.unclaimed.base.to_string(),
            "unclaimed_b":      info.unclaimed.quote.to_string(),
            "fee_source":       format!("{:?}", info.fee_source).to_lowercase(),
        })).collect();
        println!("{}", json!({
            "status":    "ok",
            "command":   "my-positions",
            "owner":     owner.to_string(),
            "positions": items,
        }));
        return Ok(());
    }

    println!("─── My Positions ─────────────────────────────────────────────────");
    println!("  Owner   {owner}");
    println!();
    if positions.is_empty() {
        println!("  No DAMM v2 positions found.");
        return Ok(());
    }
    for (i, info) in positions.iter().enumerate() {
        let pair = format!(
            "{}-{}",
            resolve_symbol(&info.pool.token_a_mint),
            resolve_symbol(&info.pool.token_b_mint)
        );
        println!("  [{i:>2}]  Pair        {pair}");
        println!("        Position    {}", info.position.address);
        println!("        Pool        {}", info.pool.address);
        println!("        NFT mint    {}", info.position.nft_mint);
        println!("        Liquidity   {:>24}", info.position.liquidity);
        if info.position.locked_liquidity > 0 {
            println!("        Locked      {:>24}", info.position.locked_liquidity);
        }
        println!("        Unclaimed A {:>24}", info.unclaimed.base);
        println!("        Unclaimed B {:>24}  ({:?})", info.unclaimed.quote, info.fee_source);
        println!();
    }
    println!("  Total: {} position(s)  ·  run `claim-position-fee --position <ADDR>` to claim", positions.len());
    Ok(())
}

// ─── claims ───────────────────────────────────────────────────────────────────

async fn cmd_claim_partner_fee(
    client:          &FeeClaimerClient,
    keypair_path:    &str,
    pool:            &str,
    bounds:          ClaimBounds,
    skip_validation: bool,
    json_output:     bool,
) -> Result<()> {
    let wallet = wallet(keypair_path)?;
    let bypass = if skip_validation { AuthorizationBypass::Skip } else { AuthorizationBypass::Enforce };
    let result = client
        .claim_partner_fee(&wallet, PartnerClaimParams {
            pool: resolve_mint(pool)?,
            bounds: Some(bounds),
            bypass,
        })
        .await
        .context("claim-partner-fee failed")?;
    print_claim("claim-partner-fee", "Partner Fees Claimed", &result, json_output);
    Ok(())
}

async fn cmd_claim_creator_fee(
    client:       &FeeClaimerClient,
    keypair_path: &str,
    pool:         &str,
    bounds:       ClaimBounds,
    json_output:  bool,
) -> Result<()> {
    let wallet = wallet(keypair_path)?;
    let result = client
        .claim_creator_fee(&wallet, CreatorClaimParams { pool: resolve_mint(pool)?, bounds: Some(bounds) })
        .await
        .context("claim-creator-fee failed")?;
    print_claim("claim-creator-fee", "Creator Fees Claimed", &result, json_output);
    Ok(())
}

async fn cmd_claim_position_fee(
    client:       &FeeClaimerClient,
    keypair_path: &str,
    position:     &str,
    json_output:  bool,
) -> Result<()> {
    let wallet = wallet(keypair_path)?;
    let position = Pubkey::from_str(position).with_context(|| format!("Invalid position '{position}'"))?;
    let result = client
        .claim_position_fee(&wallet, PositionClaimParams { position, bounds: None })
        .await
        .context("claim-position-fee failed")?;
    print_claim("claim-position-fee", "Position Fees Claimed", &result, json_output);
    Ok(())
}

fn print_claim(command: &str, title: &str, result: &fee_claimer_sdk::ClaimResult, json_output: bool) {
    if json_output {
        println!("{}", json!({
            "status":    "ok",
            "command":   command,
            "pool":      result.pool.to_string(),
            "position":  result.position.map(|k| k.to_string()),
            "claimant":  result.claimant.to_string(),
            "max_base":  result.bounds.max_base_amount,
            "max_quote": result.bounds.max_quote_amount,
            "tx":        result.signature,
        }));
        return;
    }
    println!("─── {title} {}", "─".repeat(60usize.saturating_sub(title.len())));
    println!("  Pool             {}", result.pool);
    if let Some(position) = result.position {
        println!("  Position         {position}");
    }
    println!("  Claimant         {}", result.claimant);
    println!("  Max base         {:>20}", result.bounds.max_base_amount);
    println!("  Max quote        {:>20}", result.bounds.max_quote_amount);
    println!("  Transaction      {}", result.signature);
}

// ─── split-position ───────────────────────────────────────────────────────────

async fn cmd_split_position(
    client:       &FeeClaimerClient,
    keypair_path: &str,
    pool:         &str,
    recipient:    &str,
    percent:      f64,
    resume:       Option<&str>,
    json_output:  bool,
) -> Result<()> {
    let wallet = wallet(keypair_path)?;
    let pool = Pubkey::from_str(pool).with_context(|| format!("Invalid pool '{pool}'"))?;
    let recipient = Pubkey::from_str(recipient).with_context(|| format!("Invalid recipient '{recipient}'"))?;
    let resume_position = resume
        .map(|p| Pubkey::from_str(p).with_context(|| format!("Invalid resume position '{p}'")))
        .transpose()?;

    let params = SplitParams { pool, recipient, percent, resume_position };
    let result = match client.split_position_to_recipient(&wallet, params).await {
        Ok(result) => result,
        Err(e) => {
            let hint = e
                .resume_position()
                .map(|p| format!("; the split settled, re-run with --resume-position {p} to finish the transfer"))
                .unwrap_or_default();
            return Err(anyhow::Error::new(e).context(format!("split-position failed{hint}")));
        }
    };

    if json_output {
        let receipts: Vec<_> = result.receipts.iter().map(|r| json!({
            "step": r.step.to_string(),
            "tx":   r.signature,
        })).collect();
        println!("{}", json!({
            "status":            "ok",
            "command":           "split-position",
            "pool":              pool.to_string(),
            "recipient":         recipient.to_string(),
            "percent":           percent,
            "first_position":    result.first_position.to_string(),
            "second_position":   result.second_position.to_string(),
            "nft_mint":          result.nft_mint.to_string(),
            "recipient_account": result.recipient_account.to_string(),
            "reused_position":   result.reused_position,
            "receipts":          receipts,
            "tx":                result.signature,
        }));
        return Ok(());
    }
    println!("─── Position Transferred ─────────────────────────────────────────");
    println!("  Pool             {pool}");
    println!("  Kept position    {}", result.first_position);
    println!("  New position     {}{}", result.second_position,
             if result.reused_position { "  (existing position, none created)" } else { "" });
    println!("  NFT mint         {}", result.nft_mint);
    println!("  Recipient        {recipient}");
    println!("  Recipient acct   {}", result.recipient_account);
    println!("  Share            {percent}%");
    println!();
    for receipt in &result.receipts {
        println!("  {:<16} {}", receipt.step, receipt.signature);
    }
    Ok(())
}

// ─── migrated-pool ────────────────────────────────────────────────────────────

async fn cmd_migrated_pool(client: &FeeClaimerClient, pool: &str, json_output: bool) -> Result<()> {
    let identifier = resolve_mint(pool)?;
    let migrated = client
        .migrated_pool_address(&identifier)
        .await
        .with_context(|| format!("Cannot derive the migrated pool of '{identifier}'"))?;

    if json_output {
        println!("{}", json!({
            "status":        "ok",
            "command":       "migrated-pool",
            "pool":          identifier.to_string(),
            "migrated_pool": migrated.to_string(),
        }));
    } else {
        println!("─── Migrated Pool ────────────────────────────────────────────────");
        println!("  Bonding curve    {identifier}");
        println!("  DAMM v2 pool     {migrated}");
    }
    Ok(())
}
