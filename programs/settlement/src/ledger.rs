//! Settlement ledger core
//!
//! ## Execution model
//!
//! Calls are serialized: each public entry point takes `&mut self` and runs
//! to completion. Inside [`Ledger::transact`] a call
//!
//! 1. refuses to start while another call is in flight
//! 2. clones the state into a draft
//! 3. moves the caller's attached native value into escrow
//! 4. runs the operation against the draft, queueing payouts and events
//! 5. flushes queued payouts from escrow once the operation has finished
//! 6. commits the draft, or drops it on any error
//!
//! A rejected call therefore leaves no trace in ledger state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{ConfigError, LedgerConfig};
use crate::error::{InvariantViolation, PreconditionError, Result};
use crate::state::{
    Address, Asset, Bank, BlockOracle, BurnRequest, CallContext, LpCapacity, LpHealth, LpRecord,
    MintIntent, NullifierSet, PriceOracle, PriceState, RelayBlockCache, SmoothedPriceFeed,
    Valuation,
};
use crate::zk::ProofVerifier;

/// Everything a call may mutate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerState {
    pub(crate) lps: BTreeMap<Address, LpRecord>,
    pub(crate) intents: BTreeMap<[u8; 32], MintIntent>,
    pub(crate) burns: BTreeMap<u64, BurnRequest>,
    pub(crate) next_burn_id: u64,
    pub(crate) nullifiers: NullifierSet,
    /// Liquidator top-ups keyed by (lp, liquidator)
    pub(crate) claims: BTreeMap<(Address, Address), u128>,
    pub(crate) bank: Bank,
    pub(crate) total_supply: u128,
}

impl LedgerState {
    pub(crate) fn lp(&self, owner: &Address) -> Result<&LpRecord> {
        self.lps
            .get(owner)
            .ok_or_else(|| PreconditionError::UnknownLp.into())
    }

    pub(crate) fn lp_mut(&mut self, owner: &Address) -> Result<&mut LpRecord> {
        self.lps
            .get_mut(owner)
            .ok_or_else(|| PreconditionError::UnknownLp.into())
    }

    /// Sum of liquidator claims against one LP
    pub(crate) fn claims_on(&self, lp: &Address) -> u128 {
        self.claims
            .iter()
            .filter(|((owner, _), _)| owner == lp)
            .map(|(_, amount)| *amount)
            .sum()
    }

    pub(crate) fn mint_tokens(&mut self, to: &Address, amount: u128) -> Result<()> {
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(PreconditionError::ArithmeticOverflow)?;
        self.bank.credit(to, Asset::Token, amount)?;
        Ok(())
    }

    pub(crate) fn burn_tokens(&mut self, from: &Address, amount: u128) -> Result<()> {
        self.bank.debit(from, Asset::Token, amount)?;
        self.total_supply = self
            .total_supply
            .checked_sub(amount)
            .ok_or(PreconditionError::ArithmeticOverflow)?;
        Ok(())
    }
}

/// Transfer out of escrow, applied after the operation finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    pub to: Address,
    pub asset: Asset,
    pub amount: u128,
}

/// Record of every committed state transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    LpRegistered { lp: Address },
    LpUpdated { lp: Address },
    CollateralDeposited { lp: Address, amount: u128 },
    CollateralWithdrawn { lp: Address, amount: u128 },
    IntentCreated { id: [u8; 32], user: Address, lp: Address, amount: u128 },
    IntentCancelled { id: [u8; 32] },
    Minted {
        intent_id: [u8; 32],
        tx_hash: [u8; 32],
        output_index: u64,
        recipient: Address,
        lp: Address,
        amount: u128,
        fee: u128,
    },
    BurnRequested { id: u64, user: Address, lp: Address, amount: u128, fee: u128, collateral_locked: u128 },
    BurnFulfilled { id: u64 },
    BurnDefaulted { id: u64, collateral: u128 },
    Liquidated { lp: Address, liquidator: Address, amount: u128 },
    ClaimRedeemed { lp: Address, liquidator: Address, amount: u128 },
    BlockPosted { height: u64 },
    PriceUpdated { base_usd: u128, quote_usd: u128 },
}

#[derive(Debug, Default)]
pub(crate) struct Effects {
    payouts: Vec<Payout>,
    events: Vec<LedgerEvent>,
}

impl Effects {
    pub(crate) fn pay(&mut self, to: Address, asset: Asset, amount: u128) {
        if amount > 0 {
            self.payouts.push(Payout { to, asset, amount });
        }
    }

    pub(crate) fn emit(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }
}

/// Read-only view handed to an operation
pub(crate) struct Env<'a, B, P, V> {
    pub config: &'a LedgerConfig,
    pub blocks: &'a B,
    pub prices: &'a P,
    pub verifier: &'a V,
    pub ctx: CallContext,
}

impl<B: BlockOracle, P: PriceOracle, V> Env<'_, B, P, V> {
    pub fn fresh_price(&self) -> Result<PriceState> {
        fresh_price(self.prices, self.config, self.ctx.now)
    }

    pub fn valuation(&self) -> Result<Valuation> {
        Ok(valuation(&self.fresh_price()?, self.config))
    }
}

pub(crate) fn fresh_price<P: PriceOracle>(prices: &P, config: &LedgerConfig, now: u64) -> Result<PriceState> {
    let price = prices.price().ok_or(PreconditionError::PriceUnavailable)?;
    let age = price.age(now);
    if age > config.max_price_age_secs {
        return Err(PreconditionError::StalePrice {
            age,
            max: config.max_price_age_secs,
        }
        .into());
    }
    Ok(price)
}

pub(crate) fn valuation(price: &PriceState, config: &LedgerConfig) -> Valuation {
    Valuation::new(price, config.collateral_decimals, config.token_decimals)
}

pub(crate) fn capacity(lp: &LpRecord, valuation: &Valuation, config: &LedgerConfig) -> Result<LpCapacity> {
    let max_backed = valuation.max_backed(lp.free_collateral(), config.safe_ratio_bps)?;
    Ok(LpCapacity {
        max_backed,
        backed: lp.backed_amount,
        reserved: lp.reserved_amount,
        available: max_backed.saturating_sub(lp.committed_amount()),
    })
}

pub(crate) fn health(lp: &LpRecord, valuation: &Valuation, config: &LedgerConfig) -> LpHealth {
    match valuation.ratio_bps(lp.free_collateral(), lp.backed_amount) {
        None => LpHealth::Healthy,
        Some(ratio) if ratio >= u128::from(config.safe_ratio_bps) => LpHealth::Healthy,
        Some(ratio) if ratio >= u128::from(config.liquidation_threshold_bps) => {
            LpHealth::UnderCollateralized
        }
        Some(_) => LpHealth::Liquidatable,
    }
}

pub struct Ledger<B, P, V> {
    pub(crate) config: LedgerConfig,
    pub(crate) state: LedgerState,
    pub(crate) blocks: B,
    pub(crate) prices: P,
    pub(crate) verifier: V,
    pub(crate) events: Vec<LedgerEvent>,
    pub(crate) entered: bool,
}

impl<V: ProofVerifier> Ledger<RelayBlockCache, SmoothedPriceFeed, V> {
    /// Single relay and single price writer, with the feed configured from `config`
    pub fn with_feeds(
        config: LedgerConfig,
        relay: Address,
        price_writer: Address,
        verifier: V,
    ) -> std::result::Result<Self, ConfigError> {
        let prices = SmoothedPriceFeed::from_config(price_writer, &config);
        Self::new(config, RelayBlockCache::new(relay), prices, verifier)
    }
}

impl<B, P, V> Ledger<B, P, V>
where
    B: BlockOracle,
    P: PriceOracle,
    V: ProofVerifier,
{
    pub fn new(config: LedgerConfig, blocks: B, prices: P, verifier: V) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: LedgerState::default(),
            blocks,
            prices,
            verifier,
            events: Vec::new(),
            entered: false,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    /// For verifiers with their own write surface, such as attestation
    pub fn verifier_mut(&mut self) -> &mut V {
        &mut self.verifier
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Credit native or collateral arriving from outside the ledger
    pub fn fund(&mut self, account: &Address, asset: Asset, amount: u128) -> Result<()> {
        if asset == Asset::Token {
            return Err(PreconditionError::Unauthorized.into());
        }
        self.state.bank.fund(account, asset, amount)?;
        Ok(())
    }

    /// Single-flight guard shared by every entry point
    pub(crate) fn guarded<T>(
        &mut self,
        ctx: &CallContext,
        op: &'static str,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        if self.entered {
            warn!(op, caller = %ctx.caller, "re-entrant call rejected");
            return Err(InvariantViolation::Reentrancy.into());
        }
        self.entered = true;
        let result = f(self);
        self.entered = false;

        match &result {
            Ok(_) => debug!(op, caller = %ctx.caller, "call committed"),
            Err(err) => warn!(
                op,
                caller = %ctx.caller,
                retryable = err.is_retryable(),
                attack = err.is_attack_signal(),
                error = %err,
                "call rejected"
            ),
        }
        result
    }

    /// Run `f` against a draft of the state and commit only on success
    pub(crate) fn transact<T>(
        &mut self,
        ctx: &CallContext,
        op: &'static str,
        accepts_value: bool,
        f: impl FnOnce(&Env<'_, B, P, V>, &mut LedgerState, &mut Effects) -> Result<T>,
    ) -> Result<T> {
        self.guarded(ctx, op, |ledger| {
            if !accepts_value && ctx.value != 0 {
                return Err(PreconditionError::UnexpectedValue(ctx.value).into());
            }

            let mut draft = ledger.state.clone();
            let mut effects = Effects::default();
            draft
                .bank
                .transfer(&ctx.caller, &Address::ESCROW, Asset::Native, ctx.value)?;

            let env = Env {
                config: &ledger.config,
                blocks: &ledger.blocks,
                prices: &ledger.prices,
                verifier: &ledger.verifier,
                ctx: *ctx,
            };
            let output = f(&env, &mut draft, &mut effects)?;

            for payout in &effects.payouts {
                draft
                    .bank
                    .transfer(&Address::ESCROW, &payout.to, payout.asset, payout.amount)?;
            }

            ledger.state = draft;
            ledger.events.extend(effects.events);
            Ok(output)
        })
    }
}
