//! Monero-backed pegged token settlement
//!
//! Liquidity providers post collateral on the ledger and receive Monero
//! from users. A user who paid an LP proves the payment and mints pegged
//! tokens against that LP's collateral. Burning the tokens asks the LP to pay
//! Monero back, with the LP's collateral locked until it does.
//!
//! ## Mint authentication
//! 1. Transaction and output inclusion against relayed block roots
//! 2. DLEQ proof that `R = r*G` and `rA = r*A` share one secret, where `A`
//!    is the view key of the LP's deposit address
//! 3. Stealth replay of the Monero output key from `rA` and the LP's spend key
//! 4. Succinct proof of amount decryption, bound to the replayed output
//!
//! ## Modules
//! - [`crypto`]: Ed25519 arithmetic, encodings, addresses, hashing, Merkle,
//!   DLEQ, stealth
//! - [`zk`]: succinct proof boundary and public-signal binding
//! - [`state`]: records, balances, valuation and the block/price caches
//! - [`ledger`]: transactional core shared by every entry point
//! - [`instructions`]: the entry points and query surface

pub mod config;
pub mod crypto;
pub mod error;
pub mod instructions;
pub mod ledger;
pub mod state;
pub mod zk;

pub use config::{ConfigError, LedgerConfig};
pub use error::{
    AddressError, CurveError, InvariantViolation, PreconditionError, ProofError, Result, SettlementError,
};
pub use instructions::{LpSnapshot, MintReceipt, MintRequest};
pub use ledger::{Ledger, LedgerEvent};

mod tests;
