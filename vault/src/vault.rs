//! # The Vault -- a Pass-Through Authorization Layer
//!
//! The vault custodies a reserve of one fungible asset. It holds no
//! balances of its own: the reserve is simply the asset ledger's recorded
//! balance for the vault's address, read through on every query so there
//! is no second set of books to drift out of sync.
//!
//! There is exactly one state-mutating operation, [`Vault::withdraw`], and
//! it is deliberately open: any caller may drain up to the full reserve,
//! owner or not. The vault is a faucet, not a per-user entitlement ledger
//! -- the `owner` recorded at deployment is advisory, never a gate. Adding
//! caller gating here would change the product, not fix a bug.
//!
//! Funding is equally hands-off: value enters the reserve through ordinary
//! ledger-level mints and transfers into the vault's address. There is no
//! deposit entry point.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;
use crate::ledger::{Amount, AssetLedger, LedgerError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during vault operations.
///
/// Every failure is local to the single call and leaves all balances
/// unchanged. The vault never retries; retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The requested withdrawal exceeds the current reserve.
    #[error("insufficient reserve: available {available}, requested {requested}")]
    InsufficientReserve {
        /// The reserve balance at the time of the attempt.
        available: Amount,
        /// The amount that was requested.
        requested: Amount,
    },

    /// The asset ledger rejected the transfer for a reason other than
    /// insufficiency (frozen account, arithmetic limits, ...).
    #[error("asset ledger rejected the transfer: {0}")]
    TransferFailure(LedgerError),

    /// A snapshot was restored against a ledger other than the one it
    /// was captured from.
    #[error("snapshot references asset {expected}, but the ledger is deployed at {actual}")]
    AssetMismatch {
        /// The asset address recorded in the snapshot.
        expected: Address,
        /// The address of the ledger supplied at restore time.
        actual: Address,
    },
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// A custodial vault over one external asset ledger.
///
/// Construction fixes three identities for the lifetime of the vault: the
/// deployer (recorded as `owner`), the asset ledger it custodies, and the
/// vault's own address, under which the reserve is held on that ledger.
/// None of them ever change; there is no pause switch and no destruction
/// operation.
///
/// # Thread Safety
///
/// `Vault` is `Send + Sync` -- it holds no mutable state. Atomicity of
/// withdrawals comes from the ledger's own mutual-exclusion boundary: a
/// withdrawal either fully commits the balance moves or fully fails.
pub struct Vault {
    /// The deployer, recorded once at construction. Advisory only.
    owner: Address,

    /// The vault's own address; the reserve is the ledger's balance entry
    /// for this address.
    address: Address,

    /// Cached address of the asset ledger, fixed at construction.
    asset_address: Address,

    /// Handle to the external system of record.
    asset: Arc<dyn AssetLedger>,
}

impl Vault {
    /// Deploys a new vault against the given asset ledger.
    ///
    /// The deployer becomes the immutable `owner`. The vault's own address
    /// is derived contract-style from `(deployer, nonce)` so repeated
    /// deployments by the same identity land at distinct addresses.
    pub fn deploy(deployer: Address, nonce: u64, asset: Arc<dyn AssetLedger>) -> Self {
        let address = Address::derive_contract(&deployer, nonce);
        let asset_address = asset.address();

        tracing::info!(
            owner = %deployer,
            vault = %address,
            asset = %asset_address,
            "vault deployed"
        );

        Self {
            owner: deployer,
            address,
            asset_address,
            asset,
        }
    }

    /// Reconstructs a previously deployed vault from its snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::AssetMismatch`] if the supplied ledger is not
    /// the deployment the snapshot was captured against.
    pub fn restore(snapshot: VaultSnapshot, asset: Arc<dyn AssetLedger>) -> Result<Self, VaultError> {
        let actual = asset.address();
        if snapshot.asset_address != actual {
            return Err(VaultError::AssetMismatch {
                expected: snapshot.asset_address,
                actual,
            });
        }

        Ok(Self {
            owner: snapshot.owner,
            address: snapshot.address,
            asset_address: snapshot.asset_address,
            asset,
        })
    }

    /// Returns the immutable deployment-time owner address.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Returns the vault's own address (where the reserve is held).
    pub fn address(&self) -> Address {
        self.address
    }

    /// Returns the immutable address of the custodied asset's ledger.
    pub fn asset_address(&self) -> Address {
        self.asset_address
    }

    /// Returns `account`'s balance as recorded by the asset ledger.
    ///
    /// A read-through query: the vault performs no transformation and
    /// caches nothing. `account` may be any address, including the
    /// vault's own (to inspect the reserve) or an arbitrary third party.
    pub fn get_balance(&self, account: Address) -> Amount {
        self.asset.balance_of(account)
    }

    /// Returns the current reserve: the ledger's balance for the vault's
    /// own address.
    pub fn reserve(&self) -> Amount {
        self.asset.balance_of(self.address)
    }

    /// Withdraws `amount` from the reserve to `caller`.
    ///
    /// Open access: any caller identity may withdraw up to the full
    /// reserve. The transfer is atomic -- the ledger validates and applies
    /// both balance moves under its own lock, so no partial transfer is
    /// ever observable and the validated reserve cannot change between
    /// check and apply.
    ///
    /// Returns the remaining reserve on success.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InsufficientReserve`] if `amount` exceeds the
    /// reserve, and [`VaultError::TransferFailure`] for any other
    /// ledger-side rejection. Either way, no balances move.
    pub fn withdraw(&self, caller: Address, amount: Amount) -> Result<Amount, VaultError> {
        self.asset
            .transfer(self.address, caller, amount)
            .map_err(|err| match err {
                LedgerError::InsufficientBalance {
                    available,
                    requested,
                    ..
                } => VaultError::InsufficientReserve {
                    available,
                    requested,
                },
                other => VaultError::TransferFailure(other),
            })?;

        let remaining = self.reserve();
        tracing::info!(
            caller = %caller,
            amount,
            remaining,
            "withdrawal"
        );
        Ok(remaining)
    }

    /// Captures the vault's immutable identity for persistence.
    pub fn snapshot(&self) -> VaultSnapshot {
        VaultSnapshot {
            owner: self.owner,
            address: self.address,
            asset_address: self.asset_address,
        }
    }
}

// ---------------------------------------------------------------------------
// VaultSnapshot
// ---------------------------------------------------------------------------

/// The serializable identity of a deployed vault.
///
/// The reserve is deliberately absent: it lives on the ledger and is
/// re-read after restore, never persisted alongside the vault.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSnapshot {
    /// The deployment-time owner.
    pub owner: Address,

    /// The vault's own address.
    pub address: Address,

    /// The custodied asset's ledger address.
    pub asset_address: Address,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
