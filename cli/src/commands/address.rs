//! Display the wallet's standard address

use anyhow::Result;
use colored::Colorize;

use crate::config::{load_keys, Paths};

pub fn run(paths: &Paths) -> Result<()> {
    let stored_keys = load_keys(paths)?;
    let keys = stored_keys.to_wallet()?;

    println!();
    println!("{}", "Your Monero Address".yellow().bold());
    println!();
    println!("{}", keys.address(stored_keys.network));
    println!();
    println!("{}:", "Components".dimmed());
    println!("  Spend pubkey: {}", hex::encode(keys.spend_public));
    println!("  View pubkey:  {}", hex::encode(keys.view_public));
    println!();
    println!(
        "{}",
        "LPs publish this pair on the ledger; users pay to it.".dimmed()
    );

    Ok(())
}
