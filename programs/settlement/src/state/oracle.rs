//! Block and price caches
//!
//! Each cache is written by one trusted service and read by the ledger. The
//! ledger depends only on the [`BlockOracle`] and [`PriceOracle`] traits, so
//! a quorum-backed writer can replace the single-writer implementations here
//! without touching it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::account::Address;
use crate::config::LedgerConfig;
use crate::error::{InvariantViolation, PreconditionError, Result};

/// Roots committed for one source-chain block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub height: u64,
    pub block_hash: [u8; 32],
    pub tx_root: [u8; 32],
    pub output_root: [u8; 32],
    pub posted_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceState {
    /// USD price of the pegged asset, 8 decimals
    pub base_usd: u128,
    /// USD price of the collateral asset, 8 decimals
    pub quote_usd: u128,
    pub last_update: u64,
}

impl PriceState {
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_update)
    }
}

pub trait BlockOracle {
    fn block(&self, height: u64) -> Option<BlockRecord>;

    fn latest_height(&self) -> Option<u64>;

    fn post_block(
        &mut self,
        writer: &Address,
        height: u64,
        block_hash: [u8; 32],
        tx_root: [u8; 32],
        output_root: [u8; 32],
        now: u64,
    ) -> Result<BlockRecord>;
}

pub trait PriceOracle {
    fn price(&self) -> Option<PriceState>;

    fn update_price(
        &mut self,
        writer: &Address,
        base_usd: u128,
        quote_usd: u128,
        as_of: u64,
        now: u64,
    ) -> Result<PriceState>;
}

/// Append-only block cache fed by one relay
#[derive(Debug, Clone)]
pub struct RelayBlockCache {
    relay: Address,
    blocks: BTreeMap<u64, BlockRecord>,
}

impl RelayBlockCache {
    pub fn new(relay: Address) -> Self {
        Self {
            relay,
            blocks: BTreeMap::new(),
        }
    }

    pub fn relay(&self) -> &Address {
        &self.relay
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl BlockOracle for RelayBlockCache {
    fn block(&self, height: u64) -> Option<BlockRecord> {
        self.blocks.get(&height).copied()
    }

    fn latest_height(&self) -> Option<u64> {
        self.blocks.keys().next_back().copied()
    }

    fn post_block(
        &mut self,
        writer: &Address,
        height: u64,
        block_hash: [u8; 32],
        tx_root: [u8; 32],
        output_root: [u8; 32],
        now: u64,
    ) -> Result<BlockRecord> {
        if writer != &self.relay {
            warn!(%writer, height, "block post from untrusted writer");
            return Err(PreconditionError::Unauthorized.into());
        }
        if self.blocks.contains_key(&height) {
            return Err(InvariantViolation::BlockAlreadyPosted(height).into());
        }
        if let Some(latest) = self.latest_height() {
            if height < latest {
                return Err(PreconditionError::NonMonotonicHeight { latest, height }.into());
            }
        }

        let record = BlockRecord {
            height,
            block_hash,
            tx_root,
            output_root,
            posted_at: now,
        };
        self.blocks.insert(height, record);
        info!(height, block_hash = %hex::encode(block_hash), "block posted");
        Ok(record)
    }
}

/// Exponentially smoothed price pair fed by one writer
#[derive(Debug, Clone)]
pub struct SmoothedPriceFeed {
    writer: Address,
    max_age: u64,
    /// Weight of a new quote, basis points
    quote_weight_bps: u32,
    state: Option<PriceState>,
}

impl SmoothedPriceFeed {
    /// 90/10 smoothing
    pub const DEFAULT_QUOTE_WEIGHT_BPS: u32 = 1_000;

    pub fn new(writer: Address, max_age: u64) -> Self {
        Self::with_weight(writer, max_age, Self::DEFAULT_QUOTE_WEIGHT_BPS)
    }

    /// Staleness bound and quote weight taken from the ledger config
    pub fn from_config(writer: Address, config: &LedgerConfig) -> Self {
        Self::with_weight(writer, config.max_price_age_secs, config.price_smoothing_bps)
    }

    pub fn with_weight(writer: Address, max_age: u64, quote_weight_bps: u32) -> Self {
        Self {
            writer,
            max_age,
            quote_weight_bps: quote_weight_bps.min(10_000),
            state: None,
        }
    }

    fn smooth(&self, old: u128, quote: u128) -> u128 {
        let w = u128::from(self.quote_weight_bps);
        // (old * (1 - w) + quote * w) without overflowing on large prices
        let keep = old / 10_000 * (10_000 - w) + old % 10_000 * (10_000 - w) / 10_000;
        let take = quote / 10_000 * w + quote % 10_000 * w / 10_000;
        keep + take
    }
}

impl PriceOracle for SmoothedPriceFeed {
    fn price(&self) -> Option<PriceState> {
        self.state
    }

    fn update_price(
        &mut self,
        writer: &Address,
        base_usd: u128,
        quote_usd: u128,
        as_of: u64,
        now: u64,
    ) -> Result<PriceState> {
        if writer != &self.writer {
            warn!(%writer, "price update from untrusted writer");
            return Err(PreconditionError::Unauthorized.into());
        }
        if base_usd == 0 || quote_usd == 0 {
            return Err(PreconditionError::InvalidPrice.into());
        }
        let too_old = now.saturating_sub(as_of) > self.max_age;
        let regressed = self.state.is_some_and(|s| as_of < s.last_update);
        if as_of > now || too_old || regressed {
            return Err(PreconditionError::PriceOutOfWindow { as_of }.into());
        }

        let next = match self.state {
            None => PriceState {
                base_usd,
                quote_usd,
                last_update: as_of,
            },
            Some(old) => PriceState {
                base_usd: self.smooth(old.base_usd, base_usd).max(1),
                quote_usd: self.smooth(old.quote_usd, quote_usd).max(1),
                last_update: as_of,
            },
        };
        self.state = Some(next);
        info!(base_usd = next.base_usd, quote_usd = next.quote_usd, as_of, "price updated");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SettlementError;

    #[test]
    fn test_block_heights_strictly_increase() {
        let relay = Address::from_label("relay");
        let mut cache = RelayBlockCache::new(relay);
        cache.post_block(&relay, 10, [1; 32], [2; 32], [3; 32], 100).unwrap();

        assert_eq!(
            cache.post_block(&relay, 10, [1; 32], [2; 32], [3; 32], 101),
            Err(SettlementError::Invariant(InvariantViolation::BlockAlreadyPosted(10)))
        );
        assert_eq!(
            cache.post_block(&relay, 9, [1; 32], [2; 32], [3; 32], 101),
            Err(SettlementError::Precondition(PreconditionError::NonMonotonicHeight {
                latest: 10,
                height: 9,
            }))
        );
        cache.post_block(&relay, 11, [4; 32], [5; 32], [6; 32], 102).unwrap();
        assert_eq!(cache.latest_height(), Some(11));
        assert_eq!(cache.block(10).unwrap().posted_at, 100);
    }

    #[test]
    fn test_untrusted_relay_rejected() {
        let mut cache = RelayBlockCache::new(Address::from_label("relay"));
        let err = cache
            .post_block(&Address::from_label("eve"), 1, [0; 32], [0; 32], [0; 32], 0)
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_price_smoothing_90_10() {
        let writer = Address::from_label("feed");
        let mut feed = SmoothedPriceFeed::new(writer, 3_600);
        feed.update_price(&writer, 100_00000000, 1_00000000, 1_000, 1_000).unwrap();
        let next = feed.update_price(&writer, 200_00000000, 1_00000000, 1_100, 1_100).unwrap();
        assert_eq!(next.base_usd, 110_00000000);
        assert_eq!(next.quote_usd, 1_00000000);
    }

    #[test]
    fn test_feed_follows_config() {
        let writer = Address::from_label("feed");
        let config = LedgerConfig {
            max_price_age_secs: 60,
            price_smoothing_bps: 5_000,
            ..Default::default()
        };
        let mut feed = SmoothedPriceFeed::from_config(writer, &config);
        feed.update_price(&writer, 100, 10, 1_000, 1_000).unwrap();
        let next = feed.update_price(&writer, 300, 30, 1_010, 1_010).unwrap();
        assert_eq!((next.base_usd, next.quote_usd), (200, 20));
        assert_eq!(
            feed.update_price(&writer, 300, 30, 1_020, 1_081),
            Err(SettlementError::Precondition(PreconditionError::PriceOutOfWindow { as_of: 1_020 }))
        );
    }

    #[test]
    fn test_price_rejections() {
        let writer = Address::from_label("feed");
        let mut feed = SmoothedPriceFeed::new(writer, 3_600);
        assert_eq!(
            feed.update_price(&writer, 0, 1, 10, 10),
            Err(SettlementError::Precondition(PreconditionError::InvalidPrice))
        );
        assert_eq!(
            feed.update_price(&writer, 1, 1, 20, 10),
            Err(SettlementError::Precondition(PreconditionError::PriceOutOfWindow { as_of: 20 }))
        );
        assert_eq!(
            feed.update_price(&writer, 1, 1, 0, 4_000),
            Err(SettlementError::Precondition(PreconditionError::PriceOutOfWindow { as_of: 0 }))
        );
        feed.update_price(&writer, 1, 1, 500, 600).unwrap();
        assert_eq!(
            feed.update_price(&writer, 1, 1, 400, 600),
            Err(SettlementError::Precondition(PreconditionError::PriceOutOfWindow { as_of: 400 }))
        );
    }
}
