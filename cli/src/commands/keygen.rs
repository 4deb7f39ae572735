//! Wallet key generation

use anyhow::{bail, Result};
use colored::Colorize;
use tracing::info;
use zeroize::Zeroize;

use crate::config::{load_config, parse_hex32, save_config, save_keys, Paths, StoredKeys};
use crate::crypto::WalletKeys;

/// Options for key generation
pub struct KeygenOptions {
    /// Force overwrite existing keys
    pub force: bool,
    /// Restore from this spend secret instead of generating
    pub spend_secret: Option<String>,
}

/// Create (or restore) the wallet and write it to the keys file
pub fn generate(paths: &Paths, options: &KeygenOptions) -> Result<WalletKeys> {
    if paths.keys_exist() && !options.force {
        bail!(
            "Wallet keys already exist. Use --force to overwrite.\n\
             Warning: Overwriting keys will make outputs paid to the old address unspendable!"
        );
    }

    let keys = match &options.spend_secret {
        Some(hex_secret) => {
            let mut secret = parse_hex32(hex_secret)?;
            let keys = WalletKeys::from_spend_secret(&secret);
            secret.zeroize();
            keys
        }
        None => WalletKeys::generate(),
    };

    if !keys.cross_check() {
        bail!("Generated keys disagree with the settlement curve arithmetic");
    }

    let config = load_config(paths)?;
    if !paths.config_file().exists() {
        save_config(paths, &config)?;
    }
    save_keys(paths, &StoredKeys::from_wallet(&keys, config.network))?;
    info!(path = %paths.keys_file().display(), "wallet keys saved");
    Ok(keys)
}

pub fn run(paths: &Paths, options: KeygenOptions) -> Result<()> {
    println!("{}", "=== zeroxmr Key Generation ===".cyan().bold());
    println!();

    if options.spend_secret.is_some() {
        println!("{}", "Restoring wallet from spend secret...".cyan());
    } else {
        println!("{}", "Generating random wallet keys...".cyan());
    }

    let keys = generate(paths, &options)?;
    let network = load_config(paths)?.network;

    println!();
    println!("{}", "Keys generated successfully!".green().bold());
    println!();
    println!("{}:", "Spend Public Key".yellow());
    println!("  {}", hex::encode(keys.spend_public));
    println!();
    println!("{}:", "View Public Key".yellow());
    println!("  {}", hex::encode(keys.view_public));
    println!();
    println!("{}:", "Address (share this to receive payments)".yellow());
    println!("  {}", keys.address(network));
    println!();
    println!(
        "{}",
        format!("Keys saved to: {}", paths.keys_file().display()).dimmed()
    );
    println!(
        "{}",
        "Keys are stored unencrypted. Back up the spend secret offline.".red()
    );

    Ok(())
}
