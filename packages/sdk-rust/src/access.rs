//! Process-wide wallet access list.
//!
//! Loaded once at start-up and read-only afterwards:
//!
//! ```json
//! { "wallets": { "7xtnVLHTkLcSXHvfbFFyv1FdTNov3LfP4yFxwYbXotj1": ["claim", "split"] } }
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Claim,
    Split,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Claim => f.write_str("claim"),
            Role::Split => f.write_str("split"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AccessListFile {
    wallets: HashMap<String, Vec<Role>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessList {
    wallets: HashMap<Pubkey, HashSet<Role>>,
}

impl AccessList {
    pub fn new(entries: impl IntoIterator<Item = (Pubkey, Vec<Role>)>) -> Self {
        Self {
            wallets: entries
                .into_iter()
                .map(|(wallet, roles)| (wallet, roles.into_iter().collect()))
                .collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: AccessListFile = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("access list: {e}")))?;
        let mut wallets = HashMap::with_capacity(file.wallets.len());
        for (key, roles) in file.wallets {
            let wallet = Pubkey::from_str(&key)
                .map_err(|e| Error::Config(format!("access list wallet '{key}': {e}")))?;
            wallets.insert(wallet, roles.into_iter().collect());
        }
        Ok(Self { wallets })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn permits(&self, wallet: &Pubkey, role: Role) -> bool {
        self.wallets.get(wallet).is_some_and(|roles| roles.contains(&role))
    }

    /// `Ok` when `wallet` holds `role`, [`Error::AccessDenied`] otherwise.
    pub fn require(&self, wallet: &Pubkey, role: Role) -> Result<()> {
        if self.permits(wallet, role) {
            Ok(())
        } else {
            Err(Error::AccessDenied { wallet: *wallet, role: role.to_string() })
        }
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}

// ─── Global ───────────────────────────────────────────────────────────────────

static ACCESS_LIST: OnceLock<Arc<AccessList>> = OnceLock::new();

/// Install the process-wide access list. Fails if one is already installed.
pub fn install(list: AccessList) -> Result<()> {
    ACCESS_LIST
        .set(Arc::new(list))
        .map_err(|_| Error::Config("access list already installed".into()))
}

/// The installed access list, if any.
pub fn installed() -> Option<Arc<AccessList>> {
    ACCESS_LIST.get().cloned()
}
