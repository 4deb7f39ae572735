//! Collateral and token valuation at the current price pair
//!
//! Both prices share the same decimals, so they cancel. Intermediate products
//! are computed in arbitrary precision and only the final figure must fit
//! `u128`.

use num_bigint::BigUint;

use super::oracle::PriceState;
use crate::error::PreconditionError;

pub const BPS_DENOMINATOR: u128 = 10_000;

#[derive(Debug, Clone)]
pub struct Valuation {
    /// USD price of one pegged-asset unit (XMR)
    base_usd: BigUint,
    /// USD price of one collateral unit
    quote_usd: BigUint,
    token_scale: BigUint,
    collateral_scale: BigUint,
}

fn big(value: u128) -> BigUint {
    BigUint::from(value)
}

fn narrow(value: BigUint) -> Result<u128, PreconditionError> {
    u128::try_from(value).map_err(|_| PreconditionError::ArithmeticOverflow)
}

fn div_ceil(numerator: BigUint, denominator: &BigUint) -> BigUint {
    let quotient = &numerator / denominator;
    if &quotient * denominator == numerator {
        quotient
    } else {
        quotient + 1u8
    }
}

impl Valuation {
    pub fn new(price: &PriceState, collateral_decimals: u8, token_decimals: u8) -> Self {
        Self {
            base_usd: big(price.base_usd),
            quote_usd: big(price.quote_usd),
            token_scale: BigUint::from(10u8).pow(u32::from(token_decimals)),
            collateral_scale: BigUint::from(10u8).pow(u32::from(collateral_decimals)),
        }
    }

    /// Most tokens `free_collateral` supports at `ratio_bps`, rounded down
    pub fn max_backed(&self, free_collateral: u128, ratio_bps: u32) -> Result<u128, PreconditionError> {
        let numerator = big(free_collateral) * &self.quote_usd * &self.token_scale * big(BPS_DENOMINATOR);
        let denominator = &self.base_usd * &self.collateral_scale * BigUint::from(ratio_bps);
        narrow(numerator / denominator)
    }

    /// Collateral needed to back `tokens` at `ratio_bps`, rounded up
    pub fn required_collateral(&self, tokens: u128, ratio_bps: u32) -> Result<u128, PreconditionError> {
        let numerator = big(tokens) * &self.base_usd * &self.collateral_scale * BigUint::from(ratio_bps);
        let denominator = &self.quote_usd * &self.token_scale * big(BPS_DENOMINATOR);
        narrow(div_ceil(numerator, &denominator))
    }

    /// `value(collateral) / value(backed)` in basis points, `None` when nothing is backed
    pub fn ratio_bps(&self, collateral: u128, backed: u128) -> Option<u128> {
        if backed == 0 {
            return None;
        }
        let numerator = big(collateral) * &self.quote_usd * &self.token_scale * big(BPS_DENOMINATOR);
        let denominator = big(backed) * &self.base_usd * &self.collateral_scale;
        Some(u128::try_from(numerator / denominator).unwrap_or(u128::MAX))
    }

    /// Whether `collateral` covers `backed` at `ratio_bps` or better
    pub fn covers(&self, collateral: u128, backed: u128, ratio_bps: u32) -> bool {
        match self.ratio_bps(collateral, backed) {
            None => true,
            Some(ratio) => ratio >= u128::from(ratio_bps),
        }
    }
}

/// `amount * bps / 10_000`, rounded down; the remainder stays with the payer
pub fn fee_for(amount: u128, bps: u16) -> u128 {
    let fee = big(amount) * BigUint::from(bps) / big(BPS_DENOMINATOR);
    // bps <= 10_000 keeps the fee within `amount`
    u128::try_from(fee).unwrap_or(amount).min(amount)
}
