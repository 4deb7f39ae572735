//! Burn requests
//!
//! Tokens are burned and LP collateral is locked when the request is made.
//! From `Pending`, exactly one of `Fulfilled` (LP delivered inside the window)
//! or `Defaulted` (window elapsed, requester takes the collateral) is
//! reachable, and both are terminal.

use serde::{Deserialize, Serialize};

use super::account::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BurnStatus {
    Pending,
    Fulfilled,
    Defaulted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnRequest {
    pub id: u64,
    pub user: Address,
    pub lp: Address,
    /// Tokens taken from the user, fee included
    pub amount: u128,
    /// Part of `amount` paid to the LP as fee
    pub fee: u128,
    pub deposit: u128,
    /// Source-chain address the LP must pay `amount - fee` to
    pub destination: String,
    pub request_time: u64,
    pub collateral_locked: u128,
    pub status: BurnStatus,
    /// Source-chain transaction the LP reported on fulfilment
    pub fulfilment_tx: Option<[u8; 32]>,
}

impl BurnRequest {
    /// Amount the LP owes on the source chain
    pub fn net_amount(&self) -> u128 {
        self.amount - self.fee
    }

    pub fn is_pending(&self) -> bool {
        self.status == BurnStatus::Pending
    }

    pub fn deadline(&self, timeout: u64) -> u64 {
        self.request_time.saturating_add(timeout)
    }

    /// LP may fulfil up to and including the deadline
    pub fn can_fulfil(&self, now: u64, timeout: u64) -> bool {
        now <= self.deadline(timeout)
    }

    /// Requester may claim strictly after the deadline
    pub fn can_claim_default(&self, now: u64, timeout: u64) -> bool {
        now > self.deadline(timeout)
    }
}
