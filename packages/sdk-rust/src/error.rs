//! SDK error type.

use std::time::Duration;

use solana_sdk::pubkey::Pubkey;

use crate::types::Step;

/// All errors returned by the fee-claimer SDK.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ── RPC / network ────────────────────────────────────────────────────────
    /// A Solana JSON-RPC call failed.
    #[error("RPC error: {0}")]
    Rpc(#[from] solana_client::client_error::ClientError),

    // ── Lookup ───────────────────────────────────────────────────────────────
    /// A pool, position or account does not exist at the given address.
    #[error("{what} not found: {address}")]
    NotFound { what: &'static str, address: String },

    // ── Authorization ────────────────────────────────────────────────────────
    /// The caller is not the fee claimer declared in the pool's configuration.
    #[error(
        "Only the designated fee claimer can claim partner fees for pool {pool}. \
         Expected: {}, connected wallet: {actual}",
        .expected.map(|k| k.to_string()).unwrap_or_else(|| "unknown".into())
    )]
    Authorization {
        pool:     Pubkey,
        expected: Option<Pubkey>,
        actual:   Pubkey,
    },

    /// The wallet is not on the access list for this kind of operation.
    #[error("Wallet {wallet} is not authorized for '{role}' operations")]
    AccessDenied { wallet: Pubkey, role: String },

    // ── Token programs ───────────────────────────────────────────────────────
    /// The mint is owned by neither SPL Token nor Token-2022.
    #[error("Mint {mint} is owned by unsupported program {owner}")]
    UnsupportedMintProgram { mint: Pubkey, owner: Pubkey },

    // ── Bounded polls ────────────────────────────────────────────────────────
    /// A freshly created position never became visible to position queries.
    #[error("New position in pool {pool} not visible after {attempts} attempts ({waited:?})")]
    IndexingTimeout { pool: Pubkey, attempts: u32, waited: Duration },

    /// An associated token account was submitted for creation but never appeared.
    #[error("Token account {account} still missing after {attempts} attempts ({waited:?})")]
    AccountCreationTimeout { account: Pubkey, attempts: u32, waited: Duration },

    // ── Validation ───────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    Validation(String),

    // ── Signing / submission ─────────────────────────────────────────────────
    /// The wallet cannot perform the requested capability (e.g. read-only).
    #[error("Wallet does not support {0}")]
    WalletNotCapable(&'static str),

    /// The wallet refused or failed to sign.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Signing or submitting the transaction of a workflow step failed.
    #[error("Step '{step}' failed to settle: {source}")]
    Submission {
        step:   Step,
        #[source]
        source: Box<Error>,
    },

    /// A read performed by a workflow step failed.
    #[error("Step '{step}' failed: {source}")]
    Step {
        step:   Step,
        #[source]
        source: Box<Error>,
    },

    /// A step after the split failed. The second position already holds the
    /// split liquidity; pass it back as `SplitParams::resume_position`.
    #[error("{source} (split already settled; resume with second position {second_position})")]
    Interrupted {
        second_position: Pubkey,
        #[source]
        source:          Box<Error>,
    },

    // ── Instruction building ─────────────────────────────────────────────────
    #[error("Failed to build instruction: {0}")]
    Instruction(String),

    // ── Arithmetic ───────────────────────────────────────────────────────────
    #[error("Integer overflow in fee math")]
    MathOverflow,

    // ── Account parsing ──────────────────────────────────────────────────────
    /// Raw account bytes could not be deserialized.
    #[error("Account parse error at offset {offset}: {reason}")]
    ParseError { offset: usize, reason: String },

    // ── Configuration ────────────────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn not_found(what: &'static str, address: impl ToString) -> Self {
        Error::NotFound { what, address: address.to_string() }
    }

    /// Strip `Step` / `Submission` / `Interrupted` wrappers and return the
    /// underlying error.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Step { source, .. }
            | Error::Submission { source, .. }
            | Error::Interrupted { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// The workflow step this error was raised in, if any.
    pub fn step(&self) -> Option<Step> {
        match self {
            Error::Step { step, .. } | Error::Submission { step, .. } => Some(*step),
            Error::Interrupted { source, .. } => source.step(),
            _ => None,
        }
    }

    /// Position to resume an interrupted split with, when the split itself settled.
    pub fn resume_position(&self) -> Option<Pubkey> {
        match self {
            Error::Interrupted { second_position, .. } => Some(*second_position),
            _ => None,
        }
    }
}

/// Convenience alias so every module can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Attach workflow-step context to a collaborator failure.
///
/// Errors that already carry their own context (`Step`, `Submission`,
/// `Authorization`, `Interrupted`) pass through; everything else is wrapped.
pub(crate) trait StepContext<T> {
    fn at_step(self, step: Step) -> Result<T>;
    fn submitting(self, step: Step) -> Result<T>;
}

impl<T> StepContext<T> for Result<T> {
    fn at_step(self, step: Step) -> Result<T> {
        self.map_err(|e| match e {
            e @ (Error::Step { .. }
            | Error::Submission { .. }
            | Error::Authorization { .. }
            | Error::Interrupted { .. }) => e,
            e => Error::Step { step, source: Box::new(e) },
        })
    }

    fn submitting(self, step: Step) -> Result<T> {
        self.map_err(|e| match e {
            e @ Error::Submission { .. } => e,
            e => Error::Submission { step, source: Box::new(e) },
        })
    }
}
