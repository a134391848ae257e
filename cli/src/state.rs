//! # Harness State
//!
//! The harness persists one deployment -- a ledger snapshot plus the
//! vault's identity -- as a single JSON file between invocations. Loading
//! rebuilds the live ledger and vault; saving re-captures both. The file
//! is the harness's whole world: there is no daemon and no database.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use dai_vault::{AssetLedger, LedgerSnapshot, TokenLedger, Vault, VaultSnapshot};

/// One persisted deployment: the network it was created for, the vault's
/// identity, and the full ledger book.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HarnessState {
    /// Network name the deployment was created with (`local`, `rinkeby`, ...).
    pub network: String,

    /// The vault's immutable identity.
    pub vault: VaultSnapshot,

    /// The complete asset-ledger state.
    pub ledger: LedgerSnapshot,
}

impl HarnessState {
    /// Reads and parses a snapshot file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read state file: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse state file: {}", path.display()))
    }

    /// Serializes the snapshot to pretty-printed JSON and writes it out.
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self).context("failed to serialize state")?;
        fs::write(path, raw)
            .with_context(|| format!("failed to write state file: {}", path.display()))
    }

    /// Rebuilds the live ledger and vault from this snapshot.
    pub fn into_runtime(self) -> Result<(Vault, Arc<TokenLedger>)> {
        let ledger = Arc::new(TokenLedger::from_snapshot(self.ledger));
        let vault = Vault::restore(self.vault, Arc::clone(&ledger) as Arc<dyn AssetLedger>)
            .context("state file is inconsistent: vault does not match ledger")?;
        Ok((vault, ledger))
    }

    /// Captures the current live state back into a snapshot.
    pub fn capture(network: &str, vault: &Vault, ledger: &TokenLedger) -> Self {
        Self {
            network: network.to_string(),
            vault: vault.snapshot(),
            ledger: ledger.snapshot(),
        }
    }
}
