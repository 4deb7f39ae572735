//! Derive the one-time output key a payment lands on

use anyhow::{bail, Result};
use colored::Colorize;
use tracing::debug;

use settlement::crypto::stealth::encrypt_amount;

use crate::config::{load_config, parse_hex32, Paths};
use crate::crypto::{
    decode_address, derive_output, random_scalar, DerivedOutput, Network, SecretBytes,
};

/// Recipient public keys, from an address or given directly
pub struct Recipient {
    pub view_pub: String,
    pub spend_pub: String,
    /// Network of the address, when one was given
    pub network: Option<Network>,
}

impl Recipient {
    pub fn resolve(to: Option<String>, view_pub: Option<String>, spend_pub: Option<String>) -> Result<Self> {
        match (to, view_pub, spend_pub) {
            (Some(address), _, _) => {
                let decoded = decode_address(&address)?;
                let keys = decoded.deposit_keys()?;
                Ok(Self {
                    view_pub: hex::encode(keys.view_pubkey),
                    spend_pub: hex::encode(keys.spend_pubkey),
                    network: Some(decoded.network),
                })
            }
            (None, Some(view_pub), Some(spend_pub)) => Ok(Self {
                view_pub,
                spend_pub,
                network: None,
            }),
            _ => bail!("Give either --to or both --view-pub and --spend-pub"),
        }
    }
}

/// Transaction secret from hex, or a fresh random one
pub fn tx_secret_or_random(tx_secret: Option<&str>) -> Result<SecretBytes> {
    match tx_secret {
        Some(hex_secret) => Ok(SecretBytes::from_bytes(parse_hex32(hex_secret)?)),
        None => Ok(SecretBytes::from_bytes(random_scalar().to_bytes())),
    }
}

pub fn derive(
    view_pub: &str,
    spend_pub: &str,
    index: u64,
    tx_secret: &SecretBytes,
) -> Result<DerivedOutput> {
    let view_public = parse_hex32(view_pub)?;
    let spend_public = parse_hex32(spend_pub)?;
    let output = derive_output(&view_public, &spend_public, index, tx_secret)?;
    debug!(index, output_key = %hex::encode(output.output_key), "derived output");
    Ok(output)
}

pub fn run(
    paths: &Paths,
    recipient: &Recipient,
    index: u64,
    tx_secret: Option<&str>,
    amount: Option<u64>,
) -> Result<()> {
    if let Some(network) = recipient.network {
        let configured = load_config(paths)?.network;
        if network != configured {
            bail!("Address is for {:?} but config targets {:?}", network, configured);
        }
    }
    let secret = tx_secret_or_random(tx_secret)?;
    let output = derive(&recipient.view_pub, &recipient.spend_pub, index, &secret)?;

    println!();
    println!("{}", "Derived Output".yellow().bold());
    println!();
    if tx_secret.is_none() {
        println!("{}:", "Transaction Secret r (keep this, the mint proof needs it)".red());
        println!("  {}", hex::encode(secret.as_bytes()));
        println!();
    }
    println!("  Tx public key R:   {}", hex::encode(output.ephemeral));
    println!("  Shared input rA:   {}", hex::encode(output.shared_input));
    println!("  Shared secret 8rA: {}", hex::encode(output.shared_secret));
    println!("  Output key P:      {}", hex::encode(output.output_key));
    println!("  Amount key:        {}", hex::encode(output.amount_key));
    if let Some(amount) = amount {
        println!(
            "  Encrypted amount:  {}",
            hex::encode(encrypt_amount(amount, &output.amount_key))
        );
    }
    println!();
    println!(
        "{}",
        "Output key cross-checked against the settlement curve.".dimmed()
    );

    Ok(())
}
