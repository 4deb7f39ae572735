//! Merkle roots and paths for transaction and output trees

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;
use tracing::warn;

use settlement::crypto::{
    CoinbasePolicy, HashInputOrder, MerkleProof, MerkleTree, OutputRecord, Sha256Nodes,
    TxTreeConvention,
};

use crate::config::{load_config, parse_hex32, parse_hex8, CliConfig, Paths};

#[derive(Subcommand)]
pub enum MerkleCommand {
    /// Transaction tree root of a block
    TxRoot {
        /// Transaction hashes in block order (hex, repeatable)
        #[arg(long = "tx", required = true)]
        txs: Vec<String>,

        /// Miner transaction hash (needed with --coinbase)
        #[arg(long)]
        miner: Option<String>,

        /// Include the miner transaction as leaf 0
        #[arg(long)]
        coinbase: bool,

        /// Byte-reverse each hash before it becomes a leaf
        #[arg(long)]
        reverse_leaves: bool,
    },

    /// Inclusion path of one transaction
    TxPath {
        #[arg(long = "tx", required = true)]
        txs: Vec<String>,

        /// Position of the transaction among --tx
        #[arg(long)]
        position: usize,

        #[arg(long)]
        miner: Option<String>,

        #[arg(long)]
        coinbase: bool,

        #[arg(long)]
        reverse_leaves: bool,
    },

    /// Output-tree leaf of one output
    OutputLeaf {
        #[arg(long)]
        tx_hash: String,

        #[arg(long)]
        index: u64,

        /// Encrypted amount (8 bytes hex)
        #[arg(long)]
        ecdh: String,

        #[arg(long)]
        output_key: String,

        #[arg(long)]
        commitment: String,
    },

    /// Output tree root and path from precomputed leaves
    OutputPath {
        /// Output leaves in tree order (hex, repeatable)
        #[arg(long = "leaf", required = true)]
        leaves: Vec<String>,

        #[arg(long)]
        position: usize,
    },
}

/// Config convention with per-command overrides applied
pub fn convention(config: &CliConfig, coinbase: bool, reverse_leaves: bool) -> TxTreeConvention {
    let mut convention = config.tx_tree;
    if coinbase {
        convention.coinbase = CoinbasePolicy::Include;
    }
    if reverse_leaves {
        convention.leaf_order = HashInputOrder::Reversed;
    }
    convention
}

fn parse_all(hashes: &[String]) -> Result<Vec<[u8; 32]>> {
    hashes.iter().map(|h| parse_hex32(h)).collect()
}

fn miner_hash(convention: &TxTreeConvention, miner: Option<&str>) -> Result<[u8; 32]> {
    match (convention.coinbase, miner) {
        (CoinbasePolicy::Include, None) => bail!("--miner is required when the miner transaction is a leaf"),
        (_, Some(hash)) => parse_hex32(hash),
        (CoinbasePolicy::Exclude, None) => Ok([0u8; 32]),
    }
}

pub fn tx_root(convention: &TxTreeConvention, miner: Option<&str>, txs: &[String]) -> Result<[u8; 32]> {
    let miner = miner_hash(convention, miner)?;
    Ok(convention.build(&miner, &parse_all(txs)?).root())
}

/// Path and root for `txs[position]`
pub fn tx_path(
    convention: &TxTreeConvention,
    miner: Option<&str>,
    txs: &[String],
    position: usize,
) -> Result<(MerkleProof, [u8; 32])> {
    if position >= txs.len() {
        bail!("Position {} is outside a block of {} transactions", position, txs.len());
    }
    let miner = miner_hash(convention, miner)?;
    let tree = convention.build(&miner, &parse_all(txs)?);
    match tree.proof(convention.leaf_index(position)) {
        Some(proof) => Ok((proof, tree.root())),
        None => bail!("No leaf at position {}", position),
    }
}

pub fn output_leaf(
    tx_hash: &str,
    index: u64,
    ecdh: &str,
    output_key: &str,
    commitment: &str,
) -> Result<[u8; 32]> {
    let record = OutputRecord {
        tx_hash: parse_hex32(tx_hash)?,
        output_index: index,
        ecdh_amount: parse_hex8(ecdh)?,
        output_pub_key: parse_hex32(output_key)?,
        commitment: parse_hex32(commitment)?,
    };
    Ok(record.leaf())
}

pub fn output_path(leaves: &[String], position: usize) -> Result<(MerkleProof, [u8; 32])> {
    let tree = MerkleTree::<Sha256Nodes>::build(parse_all(leaves)?);
    match tree.proof(position) {
        Some(proof) => Ok((proof, tree.root())),
        None => bail!("Position {} is outside a tree of {} leaves", position, leaves.len()),
    }
}

fn print_path(proof: &MerkleProof, root: &[u8; 32], config: &CliConfig) -> Result<()> {
    if proof.validate(config.max_merkle_depth).is_err() {
        warn!(
            depth = proof.depth(),
            max = config.max_merkle_depth,
            "path is deeper than the ledger accepts"
        );
    }
    println!("{}:", "Root".yellow());
    println!("  {}", hex::encode(root));
    println!("{}:", "Path".yellow());
    println!("{}", serde_json::to_string_pretty(proof)?);
    Ok(())
}

pub fn run(paths: &Paths, command: MerkleCommand) -> Result<()> {
    let config = load_config(paths)?;

    match command {
        MerkleCommand::TxRoot {
            txs,
            miner,
            coinbase,
            reverse_leaves,
        } => {
            let convention = convention(&config, coinbase, reverse_leaves);
            let root = tx_root(&convention, miner.as_deref(), &txs)?;
            println!("{}", hex::encode(root));
        }
        MerkleCommand::TxPath {
            txs,
            position,
            miner,
            coinbase,
            reverse_leaves,
        } => {
            let convention = convention(&config, coinbase, reverse_leaves);
            let (proof, root) = tx_path(&convention, miner.as_deref(), &txs, position)?;
            print_path(&proof, &root, &config)?;
        }
        MerkleCommand::OutputLeaf {
            tx_hash,
            index,
            ecdh,
            output_key,
            commitment,
        } => {
            let leaf = output_leaf(&tx_hash, index, &ecdh, &output_key, &commitment)?;
            println!("{}", hex::encode(leaf));
        }
        MerkleCommand::OutputPath { leaves, position } => {
            let (proof, root) = output_path(&leaves, position)?;
            print_path(&proof, &root, &config)?;
        }
    }

    Ok(())
}
