//! Read-only surface used off-ledger to assemble mint and burn calls

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ledger::{capacity, fresh_price, health, valuation, Ledger};
use crate::state::{
    Address, Asset, BlockOracle, BlockRecord, BurnRequest, FeeSchedule, LpCapacity, LpHealth,
    LpRecord, MintIntent, PriceOracle, PriceState, Valuation,
};
use crate::zk::ProofVerifier;

/// One LP as seen at a given time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LpSnapshot {
    pub record: LpRecord,
    pub capacity: LpCapacity,
    pub ratio_bps: Option<u128>,
    pub health: LpHealth,
    /// Collateral owed to liquidators
    pub claims: u128,
}

impl<B, P, V> Ledger<B, P, V>
where
    B: BlockOracle,
    P: PriceOracle,
    V: ProofVerifier,
{
    fn valuation_at(&self, now: u64) -> Result<Valuation> {
        Ok(valuation(&fresh_price(&self.prices, &self.config, now)?, &self.config))
    }

    pub fn lp(&self, owner: &Address) -> Option<&LpRecord> {
        self.state.lps.get(owner)
    }

    pub fn lps(&self) -> impl Iterator<Item = &LpRecord> {
        self.state.lps.values()
    }

    pub fn lp_capacity(&self, owner: &Address, now: u64) -> Result<LpCapacity> {
        let lp = self.state.lp(owner)?;
        capacity(lp, &self.valuation_at(now)?, &self.config)
    }

    /// `None` while the LP backs no tokens
    pub fn collateral_ratio_bps(&self, owner: &Address, now: u64) -> Result<Option<u128>> {
        let lp = self.state.lp(owner)?;
        Ok(self
            .valuation_at(now)?
            .ratio_bps(lp.free_collateral(), lp.backed_amount))
    }

    pub fn lp_health(&self, owner: &Address, now: u64) -> Result<LpHealth> {
        let lp = self.state.lp(owner)?;
        Ok(health(lp, &self.valuation_at(now)?, &self.config))
    }

    pub fn lp_snapshot(&self, owner: &Address, now: u64) -> Result<LpSnapshot> {
        let lp = self.state.lp(owner)?;
        let valuation = self.valuation_at(now)?;
        Ok(LpSnapshot {
            record: lp.clone(),
            capacity: capacity(lp, &valuation, &self.config)?,
            ratio_bps: valuation.ratio_bps(lp.free_collateral(), lp.backed_amount),
            health: health(lp, &valuation, &self.config),
            claims: self.state.claims_on(owner),
        })
    }

    pub fn fee_schedule(&self, owner: &Address) -> Result<FeeSchedule> {
        let lp = self.state.lp(owner)?;
        Ok(FeeSchedule {
            mint_fee_bps: lp.mint_fee_bps,
            burn_fee_bps: lp.burn_fee_bps,
        })
    }

    pub fn intent(&self, id: &[u8; 32]) -> Option<&MintIntent> {
        self.state.intents.get(id)
    }

    pub fn burn(&self, id: u64) -> Option<&BurnRequest> {
        self.state.burns.get(&id)
    }

    pub fn block(&self, height: u64) -> Option<BlockRecord> {
        self.blocks.block(height)
    }

    pub fn latest_height(&self) -> Option<u64> {
        self.blocks.latest_height()
    }

    /// Last accepted quote, stale or not
    pub fn price(&self) -> Option<PriceState> {
        self.prices.price()
    }

    pub fn is_spent(&self, tx_hash: &[u8; 32], output_index: u64) -> bool {
        self.state.nullifiers.contains(tx_hash, output_index)
    }

    pub fn balance(&self, account: &Address, asset: Asset) -> u128 {
        self.state.bank.balance(account, asset)
    }

    pub fn total_supply(&self) -> u128 {
        self.state.total_supply
    }

    /// Sum of `backed_amount` over all LPs; equals [`Ledger::total_supply`]
    pub fn total_backed(&self) -> u128 {
        self.state.lps.values().map(|lp| lp.backed_amount).sum()
    }

    pub fn liquidation_claim(&self, lp: &Address, liquidator: &Address) -> u128 {
        self.state
            .claims
            .get(&(*lp, *liquidator))
            .copied()
            .unwrap_or(0)
    }
}
