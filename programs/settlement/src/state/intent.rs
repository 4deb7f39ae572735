//! Mint intents
//!
//! ## Flow
//!
//! 1. User reserves LP capacity with an anti-griefing deposit
//! 2. User pays the LP on the source chain
//! 3. `mint` fulfils the intent and refunds the deposit
//! 4. Otherwise, after the timeout, the user cancels and recovers the deposit

use serde::{Deserialize, Serialize};

use super::account::Address;
use crate::crypto::hash::{keccak256_concat, u256_be};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentStatus {
    Open,
    Fulfilled,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintIntent {
    pub id: [u8; 32],
    pub user: Address,
    pub lp: Address,
    /// Piconero the user will send and mint
    pub expected_amount: u128,
    pub deposit: u128,
    pub created_at: u64,
    pub status: IntentStatus,
}

impl MintIntent {
    /// One-shot commitment over (user, lp, amount, createdAt)
    pub fn derive_id(user: &Address, lp: &Address, amount: u128, created_at: u64) -> [u8; 32] {
        keccak256_concat(&[
            user.as_bytes(),
            lp.as_bytes(),
            &u256_be(amount),
            &u256_be(u128::from(created_at)),
        ])
    }

    pub fn is_open(&self) -> bool {
        self.status == IntentStatus::Open
    }

    pub fn expires_at(&self, timeout: u64) -> u64 {
        self.created_at.saturating_add(timeout)
    }

    /// Mintable strictly before the deadline, cancellable from it on
    pub fn is_expired(&self, now: u64, timeout: u64) -> bool {
        now >= self.expires_at(timeout)
    }
}
