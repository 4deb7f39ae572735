//! Binary Merkle trees over 32-byte nodes
//!
//! Two trees are committed per relayed block:
//! - the transaction tree, Keccak-256 nodes over transaction hashes
//! - the output tree, SHA-256 nodes over packed output leaves
//!
//! Both duplicate the last node of any odd-sized level. A single leaf is its
//! own root and an empty tree has the all-zero root.
//!
//! ## Transaction tree convention
//!
//! Whether the miner transaction is a leaf, and whether leaf bytes are fed to
//! the hash as displayed or reversed, is a [`TxTreeConvention`] rather than a
//! constant. Independently computed roots have disagreed with relay-posted
//! ones on exactly these two axes.

use std::marker::PhantomData;

use constant_time_eq::constant_time_eq_32;
use serde::{Deserialize, Serialize};

use super::hash::{keccak256_concat, sha256_concat, u256_be};
use crate::error::ProofError;

pub type Hash32 = [u8; 32];

pub const EMPTY_ROOT: Hash32 = [0u8; 32];

/// Hash applied to an ordered pair of child nodes
pub trait NodeHasher {
    fn hash_nodes(left: &Hash32, right: &Hash32) -> Hash32;
}

#[derive(Debug, Clone, Copy)]
pub struct Keccak256Nodes;

impl NodeHasher for Keccak256Nodes {
    fn hash_nodes(left: &Hash32, right: &Hash32) -> Hash32 {
        keccak256_concat(&[left, right])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Sha256Nodes;

impl NodeHasher for Sha256Nodes {
    fn hash_nodes(left: &Hash32, right: &Hash32) -> Hash32 {
        sha256_concat(&[left, right])
    }
}

/// Fold `leaf` up `path`; bit `i` of `index` set means the node is a right child
pub fn compute_root<H: NodeHasher>(leaf: &Hash32, path: &[Hash32], index: u64) -> Hash32 {
    let mut current = *leaf;
    let mut index = index;
    for sibling in path {
        current = if index & 1 == 0 {
            H::hash_nodes(&current, sibling)
        } else {
            H::hash_nodes(sibling, &current)
        };
        index >>= 1;
    }
    current
}

/// Inclusion check; rejects indices with bits above the path depth
pub fn verify<H: NodeHasher>(leaf: &Hash32, root: &Hash32, path: &[Hash32], index: u64) -> bool {
    if !index_fits(index, path.len()) {
        return false;
    }
    constant_time_eq_32(&compute_root::<H>(leaf, path, index), root)
}

fn index_fits(index: u64, depth: usize) -> bool {
    depth >= 64 || index >> depth == 0
}

/// Sibling path plus leaf position
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MerkleProof {
    pub siblings: Vec<Hash32>,
    pub index: u64,
}

impl MerkleProof {
    pub fn new(siblings: Vec<Hash32>, index: u64) -> Self {
        Self { siblings, index }
    }

    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// Shape check, run before any hashing
    pub fn validate(&self, max_depth: usize) -> Result<(), ProofError> {
        if self.depth() > max_depth {
            return Err(ProofError::MerklePathTooDeep {
                depth: self.depth(),
                max: max_depth,
            });
        }
        if !index_fits(self.index, self.depth()) {
            return Err(ProofError::MerkleIndexOutOfRange {
                index: self.index,
                depth: self.depth(),
            });
        }
        Ok(())
    }

    pub fn root<H: NodeHasher>(&self, leaf: &Hash32) -> Hash32 {
        compute_root::<H>(leaf, &self.siblings, self.index)
    }

    pub fn verify<H: NodeHasher>(&self, leaf: &Hash32, root: &Hash32) -> bool {
        verify::<H>(leaf, root, &self.siblings, self.index)
    }
}

/// Fully materialized tree, leaves at level 0
#[derive(Debug, Clone)]
pub struct MerkleTree<H> {
    levels: Vec<Vec<Hash32>>,
    _hasher: PhantomData<H>,
}

impl<H: NodeHasher> MerkleTree<H> {
    pub fn build(leaves: Vec<Hash32>) -> Self {
        let mut levels = vec![leaves];
        while let Some(level) = levels.last() {
            if level.len() <= 1 {
                break;
            }
            let next = level
                .chunks(2)
                .map(|pair| {
                    let right = pair.get(1).unwrap_or(&pair[0]);
                    H::hash_nodes(&pair[0], right)
                })
                .collect();
            levels.push(next);
        }
        Self {
            levels,
            _hasher: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn root(&self) -> Hash32 {
        self.levels
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or(EMPTY_ROOT)
    }

    pub fn leaf(&self, index: usize) -> Option<&Hash32> {
        self.levels[0].get(index)
    }

    /// Path for leaf `index`; a duplicated odd node is its own sibling
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.len() {
            return None;
        }
        let mut siblings = Vec::with_capacity(self.depth());
        let mut position = index;
        for level in &self.levels[..self.depth()] {
            let sibling = if position % 2 == 0 {
                level.get(position + 1).unwrap_or(&level[position])
            } else {
                &level[position - 1]
            };
            siblings.push(*sibling);
            position /= 2;
        }
        Some(MerkleProof::new(siblings, index as u64))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoinbasePolicy {
    /// Block `tx_hashes` only
    #[default]
    Exclude,
    /// Miner transaction as leaf 0
    Include,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashInputOrder {
    #[default]
    Natural,
    Reversed,
}

impl HashInputOrder {
    pub fn apply(self, hash: &Hash32) -> Hash32 {
        let mut out = *hash;
        if self == HashInputOrder::Reversed {
            out.reverse();
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TxTreeConvention {
    pub coinbase: CoinbasePolicy,
    pub leaf_order: HashInputOrder,
}

impl TxTreeConvention {
    pub fn leaves(&self, miner_tx: &Hash32, tx_hashes: &[Hash32]) -> Vec<Hash32> {
        let mut leaves = Vec::with_capacity(tx_hashes.len() + 1);
        if self.coinbase == CoinbasePolicy::Include {
            leaves.push(self.leaf_order.apply(miner_tx));
        }
        leaves.extend(tx_hashes.iter().map(|h| self.leaf_order.apply(h)));
        leaves
    }

    pub fn build(&self, miner_tx: &Hash32, tx_hashes: &[Hash32]) -> MerkleTree<Keccak256Nodes> {
        MerkleTree::build(self.leaves(miner_tx, tx_hashes))
    }

    /// Leaf position of `tx_hashes[i]` under this convention
    pub fn leaf_index(&self, tx_position: usize) -> usize {
        match self.coinbase {
            CoinbasePolicy::Exclude => tx_position,
            CoinbasePolicy::Include => tx_position + 1,
        }
    }
}

/// One source-chain output as committed in the output tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub tx_hash: Hash32,
    /// Position of the output inside its transaction
    pub output_index: u64,
    /// Encrypted amount bytes exactly as they appear on chain
    pub ecdh_amount: [u8; 8],
    pub output_pub_key: [u8; 32],
    pub commitment: [u8; 32],
}

impl OutputRecord {
    /// `ecdh_amount` right-aligned in a 32-byte word
    pub fn ecdh_word(&self) -> Hash32 {
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&self.ecdh_amount);
        word
    }

    /// keccak256(txHash ‖ uint256(outputIndex) ‖ ecdhAmount ‖ outputPubKey ‖ commitment)
    pub fn leaf(&self) -> Hash32 {
        keccak256_concat(&[
            &self.tx_hash,
            &u256_be(u128::from(self.output_index)),
            &self.ecdh_word(),
            &self.output_pub_key,
            &self.commitment,
        ])
    }
}

pub fn output_tree(outputs: &[OutputRecord]) -> MerkleTree<Sha256Nodes> {
    MerkleTree::build(outputs.iter().map(OutputRecord::leaf).collect())
}
