//! Liquidity provider records
//!
//! ## Collateral buckets
//!
//! `collateral` is everything the LP has posted, including liquidator
//! top-ups. `locked_collateral` is the part pinned by pending burn requests.
//! Only the remainder, [`LpRecord::free_collateral`], backs issued and
//! reserved tokens.

use serde::{Deserialize, Serialize};

use super::account::Address;
use crate::crypto::keys::AddressKeys;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LpRecord {
    /// Account that registered and operates this LP
    pub owner: Address,

    /// Posted collateral, smallest collateral unit
    pub collateral: u128,

    /// Collateral pinned by pending burns
    pub locked_collateral: u128,

    /// Pegged tokens in circulation against this LP
    pub backed_amount: u128,

    /// Capacity held by open mint intents
    pub reserved_amount: u128,

    pub mint_fee_bps: u16,
    pub burn_fee_bps: u16,

    /// Source-chain address the LP receives deposits at
    pub destination: String,

    /// Keys decoded from `destination`; every minted payment must be derived from them
    pub deposit_keys: AddressKeys,

    pub active: bool,

    pub registered_at: u64,
}

impl LpRecord {
    pub const MAX_FEE_BPS: u16 = 10_000;

    pub fn new(
        owner: Address,
        mint_fee_bps: u16,
        burn_fee_bps: u16,
        destination: String,
        deposit_keys: AddressKeys,
        now: u64,
    ) -> Self {
        Self {
            owner,
            collateral: 0,
            locked_collateral: 0,
            backed_amount: 0,
            reserved_amount: 0,
            mint_fee_bps,
            burn_fee_bps,
            destination,
            deposit_keys,
            active: true,
            registered_at: now,
        }
    }

    pub fn free_collateral(&self) -> u128 {
        self.collateral.saturating_sub(self.locked_collateral)
    }

    /// Tokens the free collateral must cover: issued plus reserved
    pub fn committed_amount(&self) -> u128 {
        self.backed_amount.saturating_add(self.reserved_amount)
    }
}

/// Optional field changes for `update_lp`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LpUpdate {
    pub mint_fee_bps: Option<u16>,
    pub burn_fee_bps: Option<u16>,
    pub destination: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub mint_fee_bps: u16,
    pub burn_fee_bps: u16,
}

/// Capacity figures at the current price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LpCapacity {
    /// Most tokens the free collateral supports at the safe ratio
    pub max_backed: u128,
    pub backed: u128,
    pub reserved: u128,
    /// `max_backed - backed - reserved`, floored at zero
    pub available: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LpHealth {
    /// At or above the safe ratio, or backing nothing
    Healthy,
    /// Below the safe ratio; open to liquidation top-ups
    UnderCollateralized,
    /// Below the liquidation threshold
    Liquidatable,
}
