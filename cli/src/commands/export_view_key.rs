//! Export view key (scan-only capability)

use anyhow::Result;
use colored::Colorize;

use crate::config::{load_keys, Paths};

pub fn run(paths: &Paths) -> Result<()> {
    let stored_keys = load_keys(paths)?;

    println!();
    println!("{}", "View Key Export".yellow().bold());
    println!();
    println!(
        "{}",
        "The view key detects incoming outputs and decrypts their amounts.".dimmed()
    );
    println!(
        "{}",
        "It cannot produce the transaction secret a mint proof needs.".dimmed()
    );
    println!();
    println!("{}:", "View Key (view secret + spend pubkey)".yellow());
    println!();
    println!("  {}:{}", stored_keys.view_secret, stored_keys.spend_pubkey);
    println!();

    println!(
        "{}",
        "WARNING: Anyone with this key can see all your incoming payments!".red()
    );
    println!("{}", "         They CANNOT spend your funds.".green());

    Ok(())
}
