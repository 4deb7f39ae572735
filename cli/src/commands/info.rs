//! Show configuration and key info

use anyhow::Result;
use colored::Colorize;

use crate::config::{load_config, load_keys, Paths};

pub fn run(paths: &Paths) -> Result<()> {
    let config = load_config(paths)?;

    println!();
    println!("{}", "zeroxmr Configuration".yellow().bold());
    println!();

    println!("{}:", "Directory".cyan());
    println!("  {}", paths.root().display());
    println!();

    println!("{}:", "Proof Settings".cyan());
    println!("  Network:          {:?}", config.network);
    println!("  Byte order:       {:?}", config.byte_order);
    println!("  Coinbase leaf:    {:?}", config.tx_tree.coinbase);
    println!("  Leaf hash order:  {:?}", config.tx_tree.leaf_order);
    println!("  Max Merkle depth: {}", config.max_merkle_depth);
    if !paths.config_file().exists() {
        println!("  {}", "(defaults; no config.json saved)".dimmed());
    }
    println!();

    match load_keys(paths) {
        Ok(stored_keys) => {
            println!("{}", "Wallet Keys: CONFIGURED".green());
            let keys = stored_keys.to_wallet()?;
            println!("  Created: {}", stored_keys.created_at);
            println!("  Address: {}", keys.address(stored_keys.network));
            if stored_keys.network != config.network {
                println!(
                    "  {}",
                    format!(
                        "Keys were created for {:?} but config targets {:?}",
                        stored_keys.network, config.network
                    )
                    .yellow()
                );
            }
        }
        Err(_) => {
            println!("{}", "Wallet Keys: NOT CONFIGURED".red());
            println!("  Run 'zeroxmr keygen' to generate keys");
        }
    }
    println!();

    println!("{}:", "File Locations".cyan());
    println!("  Config: {}", paths.config_file().display());
    println!("  Keys:   {}", paths.keys_file().display());

    Ok(())
}
