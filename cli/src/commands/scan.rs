//! Check a single output against the wallet's view key

use anyhow::Result;
use colored::Colorize;

use crate::config::{load_keys, parse_hex32, parse_hex8, Paths};
use crate::crypto::{scan_output, OwnedOutput};

pub fn scan(
    paths: &Paths,
    tx_pub: &str,
    index: u64,
    output_key: &str,
    ecdh: Option<&str>,
) -> Result<Option<OwnedOutput>> {
    let keys = load_keys(paths)?.to_wallet()?;
    let ephemeral = parse_hex32(tx_pub)?;
    let output_key = parse_hex32(output_key)?;
    let ecdh = ecdh.map(parse_hex8).transpose()?;
    Ok(scan_output(&keys, &ephemeral, index, &output_key, ecdh.as_ref()))
}

pub fn run(
    paths: &Paths,
    tx_pub: &str,
    index: u64,
    output_key: &str,
    ecdh: Option<&str>,
) -> Result<()> {
    println!();
    match scan(paths, tx_pub, index, output_key, ecdh)? {
        Some(owned) => {
            println!("{}", "Output belongs to this wallet".green().bold());
            println!("  Output key: {}", hex::encode(owned.output_key));
            println!("  Amount key: {}", hex::encode(owned.amount_key));
            if let Some(amount) = owned.amount {
                println!("  Amount:     {} atomic units", amount);
            }
        }
        None => {
            println!("{}", "Output does not belong to this wallet".dimmed());
        }
    }
    Ok(())
}
