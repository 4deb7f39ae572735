//! zeroxmr - proof construction helper for Monero-backed settlement

// op_ref warnings are common with curve25519-dalek ergonomics
#![allow(clippy::op_ref)]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod crypto;




use commands::*;
use config::Paths;

#[derive(Parser)]
#[command(name = "zeroxmr")]
#[command(version = "0.1.0")]
#[command(about = "Build and check the proofs a Monero-backed mint consumes")]
#[command(long_about = r#"
zeroxmr prepares everything a user hands the settlement ledger when minting
against a Monero payment: the one-time output key, the DLEQ proof binding
R = r*G to rA = r*A, and Merkle paths into the relayed block roots.

Quick Start:
  1. zeroxmr keygen                 Generate wallet keys
  2. zeroxmr derive ...             Derive the output paid to an LP
  3. zeroxmr dleq prove ...         Prove the shared secret
  4. zeroxmr merkle tx-path ...     Path to the relayed transaction root
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding config.json and keys.json (default: ~/.zeroxmr)
    #[arg(long, global = true)]
    home: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new wallet (spend + view keys)
    Keygen {
        /// Force overwrite existing keys
        #[arg(short, long)]
        force: bool,

        /// Restore from an existing spend secret (hex)
        #[arg(long)]
        spend_secret: Option<String>,
    },

    /// Show your standard address
    Address,

    /// Export the view key (scan-only, no spending capability)
    ExportViewKey,

    /// Derive the one-time output key for a payment
    Derive {
        /// Recipient standard address (instead of --view-pub/--spend-pub)
        #[arg(long, conflicts_with_all = ["view_pub", "spend_pub"])]
        to: Option<String>,

        /// Recipient view public key (hex)
        #[arg(long, requires = "spend_pub")]
        view_pub: Option<String>,

        /// Recipient spend public key (hex)
        #[arg(long, requires = "view_pub")]
        spend_pub: Option<String>,

        /// Output index inside the transaction
        #[arg(long, default_value_t = 0)]
        index: u64,

        /// Transaction secret r (hex, random when omitted)
        #[arg(long)]
        tx_secret: Option<String>,

        /// Amount in atomic units to encrypt for the output
        #[arg(long)]
        amount: Option<u64>,
    },

    /// Check whether an output pays your wallet
    Scan {
        /// Transaction public key R (hex)
        #[arg(long)]
        tx_pub: String,

        /// Output index inside the transaction
        #[arg(long)]
        index: u64,

        /// Output public key (hex)
        #[arg(long)]
        output_key: String,

        /// Encrypted amount (8 bytes hex)
        #[arg(long)]
        ecdh: Option<String>,
    },

    /// Build or check DLEQ proofs
    #[command(subcommand)]
    Dleq(dleq::DleqCommand),

    /// Compute Merkle roots, paths and output leaves
    #[command(subcommand)]
    Merkle(merkle::MerkleCommand),

    /// Show configuration and key info
    Info,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let paths = Paths::resolve(cli.home)?;

    match cli.command {
        Commands::Keygen { force, spend_secret } => {
            keygen::run(&paths, keygen::KeygenOptions { force, spend_secret })?;
        }
        Commands::Address => {
            address::run(&paths)?;
        }
        Commands::ExportViewKey => {
            export_view_key::run(&paths)?;
        }
        Commands::Derive {
            to,
            view_pub,
            spend_pub,
            index,
            tx_secret,
            amount,
        } => {
            let recipient = derive::Recipient::resolve(to, view_pub, spend_pub)?;
            derive::run(&paths, &recipient, index, tx_secret.as_deref(), amount)?;
        }
        Commands::Scan {
            tx_pub,
            index,
            output_key,
            ecdh,
        } => {
            scan::run(&paths, &tx_pub, index, &output_key, ecdh.as_deref())?;
        }
        Commands::Dleq(command) => {
            dleq::run(&paths, command)?;
        }
        Commands::Merkle(command) => {
            merkle::run(&paths, command)?;
        }
        Commands::Info => {
            info::run(&paths)?;
        }
    }

    Ok(())
}
