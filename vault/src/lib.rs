//! # DAI Vault — Core Library
//!
//! A custodial vault over an external fungible-asset ledger. The vault
//! holds a reserve of one asset -- DAI, by configuration -- and lets any
//! caller withdraw from that reserve. That's the whole product: a
//! pass-through authorization layer over the ledger's transfer primitive.
//! The vault never mints, never burns, never keeps its own books.
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the actual concerns:
//!
//! - **address** — 20-byte account identifiers with deterministic derivation.
//! - **config** — Asset metadata, well-known deployments, unit conversion.
//! - **ledger** — The asset-ledger boundary and the in-memory system of record.
//! - **vault** — The vault itself: three fixed identities, one mutation.
//!
//! ## Design Philosophy
//!
//! 1. The ledger is the single source of truth. The vault reads through on
//!    every query; there is no mirror to desynchronize.
//! 2. Checked arithmetic everywhere money moves.
//! 3. One mutual-exclusion boundary per ledger instance stands in for the
//!    chain's total transaction order; every call commits fully or not at all.
//! 4. If it touches money, it has tests. Plural.

pub mod address;
pub mod config;
pub mod ledger;
pub mod vault;

pub use address::Address;
pub use ledger::{AccountEntry, Amount, AssetLedger, LedgerError, LedgerSnapshot, TokenLedger};
pub use vault::{Vault, VaultError, VaultSnapshot};
