//! # DAI Vault Harness
//!
//! Entry point for the `dai-vault` binary. Parses CLI arguments,
//! initializes logging, and executes one command against the persisted
//! deployment snapshot.
//!
//! The binary supports six subcommands:
//!
//! - `deploy`   — create a fresh ledger + vault and write the snapshot
//! - `fund`     — mint whole DAI into the vault's reserve
//! - `withdraw` — withdraw whole DAI from the reserve to a caller
//! - `balance`  — query an account's balance (default: the reserve)
//! - `status`   — print the deployment summary
//! - `version`  — print build version information

mod cli;
mod logging;
mod state;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::sync::Arc;

use dai_vault::config;
use dai_vault::{Address, AssetLedger, TokenLedger, Vault};

use cli::{Commands, VaultCli};
use logging::LogFormat;
use state::HarnessState;

fn main() -> Result<()> {
    let cli = VaultCli::parse();

    let format = LogFormat::from_str_lossy(
        &std::env::var("DAI_VAULT_LOG_FORMAT").unwrap_or_default(),
    );
    logging::init_logging("dai_vault=info,dai_vault_cli=info", format);

    match cli.command {
        Commands::Deploy(args) => deploy(args),
        Commands::Fund(args) => fund(args),
        Commands::Withdraw(args) => withdraw(args),
        Commands::Balance(args) => balance(args),
        Commands::Status(args) => status(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Creates a fresh ledger and vault and writes the initial snapshot.
fn deploy(args: cli::DeployArgs) -> Result<()> {
    let owner = match &args.owner {
        Some(hex) => parse_address(hex)?,
        None => Address::random(),
    };

    // Named networks pin the ledger at the well-known DAI deployment so
    // that `asset_address` matches what external tooling asserts on; the
    // local network derives its own.
    let ledger = match config::dai_address_for(&args.network) {
        Some(addr) => TokenLedger::at(
            addr,
            config::ASSET_NAME,
            config::ASSET_SYMBOL,
            config::ASSET_DECIMALS,
        ),
        None if args.network == config::NETWORK_LOCAL => TokenLedger::new(
            config::ASSET_NAME,
            config::ASSET_SYMBOL,
            config::ASSET_DECIMALS,
        ),
        None => return Err(anyhow!("unknown network: {}", args.network)),
    };
    let ledger = Arc::new(ledger);

    let vault = Vault::deploy(owner, 0, Arc::clone(&ledger) as Arc<dyn AssetLedger>);
    HarnessState::capture(&args.network, &vault, &ledger).save(&args.state.state)?;

    println!("Vault deployed.");
    println!("  Network : {}", args.network);
    println!("  Owner   : {}", vault.owner());
    println!("  Vault   : {}", vault.address());
    println!("  Asset   : {}", vault.asset_address());
    println!("  State   : {}", args.state.state.display());

    Ok(())
}

/// Mints whole DAI into the vault's reserve.
fn fund(args: cli::AmountArgs) -> Result<()> {
    let persisted = HarnessState::load(&args.state.state)?;
    let network = persisted.network.clone();
    let (vault, ledger) = persisted.into_runtime()?;

    let units = parse_amount(args.amount)?;
    ledger
        .mint(vault.address(), units)
        .context("funding failed")?;

    HarnessState::capture(&network, &vault, &ledger).save(&args.state.state)?;
    println!(
        "Reserve funded with {} DAI; reserve is now {} DAI.",
        args.amount,
        config::format_units(vault.reserve())
    );
    Ok(())
}

/// Withdraws whole DAI from the reserve to the caller identity.
fn withdraw(args: cli::WithdrawArgs) -> Result<()> {
    let persisted = HarnessState::load(&args.state.state)?;
    let network = persisted.network.clone();
    let (vault, ledger) = persisted.into_runtime()?;

    let caller = match &args.caller {
        Some(hex) => parse_address(hex)?,
        None => vault.owner(),
    };

    let units = parse_amount(args.amount)?;
    let remaining = vault.withdraw(caller, units).context("withdrawal failed")?;

    HarnessState::capture(&network, &vault, &ledger).save(&args.state.state)?;
    println!(
        "Withdrew {} DAI to {}; reserve is now {} DAI.",
        args.amount,
        caller,
        config::format_units(remaining)
    );
    Ok(())
}

/// Prints an account's balance; without an account, prints the reserve.
fn balance(args: cli::BalanceArgs) -> Result<()> {
    let (vault, _ledger) = HarnessState::load(&args.state.state)?.into_runtime()?;

    let account = match &args.account {
        Some(hex) => parse_address(hex)?,
        None => vault.address(),
    };

    println!("{}", config::format_units(vault.get_balance(account)));
    Ok(())
}

/// Prints the deployment summary.
fn status(args: cli::StateArgs) -> Result<()> {
    let persisted = HarnessState::load(&args.state)?;
    let network = persisted.network.clone();
    let (vault, ledger) = persisted.into_runtime()?;

    println!("Network      : {}", network);
    println!("Owner        : {}", vault.owner());
    println!("Vault        : {}", vault.address());
    println!("Asset        : {}", vault.asset_address());
    println!(
        "Asset token  : {} ({})",
        ledger.name(),
        ledger.symbol()
    );
    println!("Reserve      : {} DAI", config::format_units(vault.reserve()));
    println!(
        "Total supply : {} DAI",
        config::format_units(ledger.total_supply())
    );
    println!("Accounts     : {}", ledger.account_count());
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("dai-vault {}", env!("CARGO_PKG_VERSION"));
    println!(
        "asset     {} ({}), {} decimals",
        config::ASSET_NAME,
        config::ASSET_SYMBOL,
        config::ASSET_DECIMALS
    );
}

/// Parses a hex address argument with a readable error.
fn parse_address(hex: &str) -> Result<Address> {
    Address::from_hex(hex).map_err(|e| anyhow!("invalid address {:?}: {}", hex, e))
}

/// Converts a whole-DAI argument into smallest units.
fn parse_amount(whole: u64) -> Result<u128> {
    config::parse_units(whole)
        .ok_or_else(|| anyhow!("amount {} DAI overflows the asset's native width", whole))
}
