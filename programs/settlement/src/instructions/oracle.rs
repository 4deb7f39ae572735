//! Trusted writer entry points for the block and price caches

use crate::error::{PreconditionError, Result};
use crate::ledger::{Ledger, LedgerEvent};
use crate::state::{BlockOracle, BlockRecord, CallContext, PriceOracle, PriceState};
use crate::zk::ProofVerifier;

impl<B, P, V> Ledger<B, P, V>
where
    B: BlockOracle,
    P: PriceOracle,
    V: ProofVerifier,
{
    pub fn post_block(
        &mut self,
        ctx: &CallContext,
        height: u64,
        block_hash: [u8; 32],
        tx_root: [u8; 32],
        output_root: [u8; 32],
    ) -> Result<BlockRecord> {
        self.guarded(ctx, "post_block", |ledger| {
            if ctx.value != 0 {
                return Err(PreconditionError::UnexpectedValue(ctx.value).into());
            }
            let record = ledger
                .blocks
                .post_block(&ctx.caller, height, block_hash, tx_root, output_root, ctx.now)?;
            ledger.events.push(LedgerEvent::BlockPosted { height });
            Ok(record)
        })
    }

    /// Smoothed into the running price; see [`PriceOracle::update_price`]
    pub fn update_price(
        &mut self,
        ctx: &CallContext,
        base_usd: u128,
        quote_usd: u128,
        as_of: u64,
    ) -> Result<PriceState> {
        self.guarded(ctx, "update_price", |ledger| {
            if ctx.value != 0 {
                return Err(PreconditionError::UnexpectedValue(ctx.value).into());
            }
            let price = ledger
                .prices
                .update_price(&ctx.caller, base_usd, quote_usd, as_of, ctx.now)?;
            ledger.events.push(LedgerEvent::PriceUpdated {
                base_usd: price.base_usd,
                quote_usd: price.quote_usd,
            });
            Ok(price)
        })
    }
}
