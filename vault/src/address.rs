//! # Addresses
//!
//! 20-byte account identifiers, the same width the asset's native chain
//! uses. An [`Address`] names anything that can hold a balance on the
//! ledger: an externally-owned account, the ledger deployment itself, or
//! the vault's own reserve account.
//!
//! Addresses are displayed as `0x`-prefixed lowercase hex and parsed
//! case-insensitively, so checksummed literals copied from block explorers
//! round-trip without manual lowering.
//!
//! Deterministic derivation uses BLAKE3: contract addresses are derived
//! from `(deployer, nonce)` and test identities from a human-readable
//! label. Same inputs, same address -- no registry, no coordination.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 20-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    /// The all-zeroes address. Never a valid recipient; useful as a
    /// sentinel in tests.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Creates an `Address` from raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Returns the raw 20-byte identifier.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns the `0x`-prefixed lowercase hex representation.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parses a hex-encoded address. The `0x` prefix is optional and
    /// letter case is ignored.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let stripped = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        let bytes = hex::decode(stripped)?;
        if bytes.len() != 20 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Derives the address of a contract deployed by `deployer` with the
    /// given deployment nonce.
    ///
    /// Computed as the first 20 bytes of
    /// `BLAKE3(deployer || 0x00 || nonce_le)`. The separator byte prevents
    /// ambiguity between the fixed-width deployer and the nonce encoding.
    pub fn derive_contract(deployer: &Address, nonce: u64) -> Self {
        let mut preimage = Vec::with_capacity(29);
        preimage.extend_from_slice(deployer.as_bytes());
        preimage.push(0x00);
        preimage.extend_from_slice(&nonce.to_le_bytes());
        Self::truncate_digest(*blake3::hash(&preimage).as_bytes())
    }

    /// Derives a stable address from a human-readable label.
    ///
    /// Intended for harness and test identities ("alice", "issuer", ...)
    /// where the same label must always map to the same address.
    pub fn from_label(label: &str) -> Self {
        Self::truncate_digest(*blake3::hash(label.as_bytes()).as_bytes())
    }

    /// Generates a random address. Used for fresh caller identities in
    /// the harness; collision probability at 160 bits is not a concern.
    pub fn random() -> Self {
        Self(rand::random())
    }

    fn truncate_digest(digest: [u8; 32]) -> Self {
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&digest[..20]);
        Self(arr)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}...)", &self.to_hex()[..10])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// ---------------------------------------------------------------------------
// Serde helper: serialize HashMap<Address, V> with hex-string keys
// ---------------------------------------------------------------------------

/// Serde helper module for serializing/deserializing `HashMap<Address, V>`
/// as a JSON object with hex-encoded string keys.
///
/// JSON requires map keys to be strings, but `Address` wraps `[u8; 20]`
/// which serde would serialize as an array. This module converts keys
/// to/from their hex representation so the map serializes correctly.
///
/// # Usage
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct MyStruct {
///     #[serde(with = "dai_vault::address::address_map")]
///     accounts: HashMap<Address, SomeValue>,
/// }
/// ```
pub mod address_map {
    use super::Address;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    pub fn serialize<V, S>(map: &HashMap<Address, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        V: Serialize,
        S: Serializer,
    {
        use serde::ser::SerializeMap;
        let mut ser_map = serializer.serialize_map(Some(map.len()))?;
        for (key, value) in map {
            ser_map.serialize_entry(&key.to_hex(), value)?;
        }
        ser_map.end()
    }

    pub fn deserialize<'de, V, D>(deserializer: D) -> Result<HashMap<Address, V>, D::Error>
    where
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let string_map: HashMap<String, V> = HashMap::deserialize(deserializer)?;
        string_map
            .into_iter()
            .map(|(key, value)| {
                Address::from_hex(&key)
                    .map(|addr| (addr, value))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let addr = Address::from_label("roundtrip");
        let recovered = Address::from_hex(&addr.to_hex()).unwrap();
        assert_eq!(addr, recovered);
    }

    #[test]
    fn parses_without_prefix() {
        let addr = Address::from_label("no-prefix");
        let bare = addr.to_hex()[2..].to_string();
        assert_eq!(Address::from_hex(&bare).unwrap(), addr);
    }

    #[test]
    fn parsing_is_case_insensitive() {
        // Checksummed literal as it appears in block explorers.
        let mixed = "0x5592EC0cfb4dbc12D3aB100b257153436a1f0FEa";
        let lower = mixed.to_lowercase();
        assert_eq!(
            Address::from_hex(mixed).unwrap(),
            Address::from_hex(&lower).unwrap()
        );
    }

    #[test]
    fn wrong_length_rejected() {
        assert!(Address::from_hex("0x1234").is_err());
        assert!(Address::from_hex(&"ab".repeat(32)).is_err());
    }

    #[test]
    fn label_derivation_is_deterministic() {
        assert_eq!(Address::from_label("alice"), Address::from_label("alice"));
        assert_ne!(Address::from_label("alice"), Address::from_label("bob"));
    }

    #[test]
    fn contract_derivation_varies_by_nonce() {
        let deployer = Address::from_label("deployer");
        let a = Address::derive_contract(&deployer, 0);
        let b = Address::derive_contract(&deployer, 1);
        assert_ne!(a, b);
        assert_eq!(a, Address::derive_contract(&deployer, 0));
    }

    #[test]
    fn contract_derivation_varies_by_deployer() {
        let a = Address::derive_contract(&Address::from_label("alice"), 0);
        let b = Address::derive_contract(&Address::from_label("bob"), 0);
        assert_ne!(a, b);
    }

    #[test]
    fn random_addresses_are_distinct() {
        assert_ne!(Address::random(), Address::random());
    }

    #[test]
    fn display_is_prefixed_lowercase() {
        let addr = Address::from_label("display");
        let shown = addr.to_string();
        assert!(shown.starts_with("0x"));
        assert_eq!(shown, shown.to_lowercase());
        assert_eq!(shown.len(), 42);
    }
}
