//! Ledger parameters
//!
//! Deserializable from JSON with every field optional; missing fields take
//! the defaults below. [`LedgerConfig::validate`] runs when a ledger is
//! constructed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::address::Network;
use crate::crypto::encoding::ByteOrder;
use crate::crypto::merkle::HashInputOrder;

/// 150%
pub const DEFAULT_SAFE_RATIO_BPS: u32 = 15_000;
/// 120%
pub const DEFAULT_LIQUIDATION_THRESHOLD_BPS: u32 = 12_000;
/// 0.001 XMR in piconero
pub const DEFAULT_MIN_MINT_AMOUNT: u64 = 1_000_000_000;
pub const DEFAULT_INTENT_TIMEOUT_SECS: u64 = 2 * 60 * 60;
pub const DEFAULT_BURN_TIMEOUT_SECS: u64 = 48 * 60 * 60;
/// 10% of available capacity
pub const DEFAULT_MIN_INTENT_FRACTION_BPS: u32 = 1_000;
/// 0.001 native units at 18 decimals
pub const DEFAULT_MIN_DEPOSIT: u128 = 1_000_000_000_000_000;
pub const DEFAULT_MAX_PRICE_AGE_SECS: u64 = 60 * 60;
pub const DEFAULT_MAX_MERKLE_DEPTH: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("liquidation threshold {threshold} bps must be below the safe ratio {safe} bps")]
    ThresholdAboveSafeRatio { threshold: u32, safe: u32 },

    #[error("liquidation threshold {0} bps must be at least 100%")]
    ThresholdBelowPar(u32),

    #[error("{name} must be at most 10000 bps, got {value}")]
    BpsOutOfRange { name: &'static str, value: u32 },

    #[error("{0} must be non-zero")]
    ZeroValue(&'static str),

    #[error("max Merkle depth {0} exceeds 64")]
    DepthTooLarge(usize),

    #[error("decimals {0} exceed 38")]
    DecimalsTooLarge(u8),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub safe_ratio_bps: u32,
    pub liquidation_threshold_bps: u32,
    /// Smallest mint, piconero
    pub min_mint_amount: u64,
    pub intent_timeout_secs: u64,
    pub burn_timeout_secs: u64,
    /// Smallest intent as a fraction of the LP's available capacity
    pub min_intent_fraction_bps: u32,
    pub min_intent_deposit: u128,
    pub min_burn_deposit: u128,
    pub max_price_age_secs: u64,
    pub max_merkle_depth: usize,
    /// Network every LP and burn destination address must belong to
    pub network: Network,
    /// Byte order of every encoded point and scalar in mint proofs
    pub byte_order: ByteOrder,
    /// Applied to the claimed transaction hash before the inclusion check
    pub tx_leaf_order: HashInputOrder,
    pub collateral_decimals: u8,
    pub token_decimals: u8,
    /// Weight of a new price quote in the smoothed price
    pub price_smoothing_bps: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            safe_ratio_bps: DEFAULT_SAFE_RATIO_BPS,
            liquidation_threshold_bps: DEFAULT_LIQUIDATION_THRESHOLD_BPS,
            min_mint_amount: DEFAULT_MIN_MINT_AMOUNT,
            intent_timeout_secs: DEFAULT_INTENT_TIMEOUT_SECS,
            burn_timeout_secs: DEFAULT_BURN_TIMEOUT_SECS,
            min_intent_fraction_bps: DEFAULT_MIN_INTENT_FRACTION_BPS,
            min_intent_deposit: DEFAULT_MIN_DEPOSIT,
            min_burn_deposit: DEFAULT_MIN_DEPOSIT,
            max_price_age_secs: DEFAULT_MAX_PRICE_AGE_SECS,
            max_merkle_depth: DEFAULT_MAX_MERKLE_DEPTH,
            network: Network::Mainnet,
            byte_order: ByteOrder::BigEndian,
            tx_leaf_order: HashInputOrder::Natural,
            collateral_decimals: 18,
            token_decimals: 12,
            price_smoothing_bps: 1_000,
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.liquidation_threshold_bps < 10_000 {
            return Err(ConfigError::ThresholdBelowPar(self.liquidation_threshold_bps));
        }
        if self.liquidation_threshold_bps >= self.safe_ratio_bps {
            return Err(ConfigError::ThresholdAboveSafeRatio {
                threshold: self.liquidation_threshold_bps,
                safe: self.safe_ratio_bps,
            });
        }
        for (name, value) in [
            ("min_intent_fraction_bps", self.min_intent_fraction_bps),
            ("price_smoothing_bps", self.price_smoothing_bps),
        ] {
            if value > 10_000 {
                return Err(ConfigError::BpsOutOfRange { name, value });
            }
        }
        for (name, value) in [
            ("intent_timeout_secs", self.intent_timeout_secs),
            ("burn_timeout_secs", self.burn_timeout_secs),
            ("max_price_age_secs", self.max_price_age_secs),
            ("min_mint_amount", self.min_mint_amount),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroValue(name));
            }
        }
        if self.price_smoothing_bps == 0 {
            return Err(ConfigError::ZeroValue("price_smoothing_bps"));
        }
        if self.max_merkle_depth > 64 {
            return Err(ConfigError::DepthTooLarge(self.max_merkle_depth));
        }
        for decimals in [self.collateral_decimals, self.token_decimals] {
            if decimals > 38 {
                return Err(ConfigError::DecimalsTooLarge(decimals));
            }
        }
        Ok(())
    }
}
