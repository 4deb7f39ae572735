//! LP lifecycle: registration, collateral and liquidation
//!
//! ## Liquidation
//!
//! Any account may top up the collateral of an LP below the safe ratio. The
//! top-up is recorded as a claim against that LP and can be redeemed once the
//! LP is back at or above the safe ratio, limited to collateral the LP can
//! release without dropping below it again.

use tracing::{info, warn};

use crate::crypto::address::{decode_address_on, Network};
use crate::crypto::keys::AddressKeys;
use crate::error::{PreconditionError, Result};
use crate::ledger::{health, Ledger, LedgerEvent};
use crate::state::{
    Address, Asset, BlockOracle, CallContext, LpHealth, LpRecord, LpUpdate, PriceOracle,
};
use crate::zk::ProofVerifier;

fn check_fee(bps: u16) -> Result<()> {
    if bps > LpRecord::MAX_FEE_BPS {
        return Err(PreconditionError::InvalidFee(bps).into());
    }
    Ok(())
}

/// Keys of a standard or integrated address on the ledger's network
fn deposit_keys(destination: &str, network: Network) -> Result<AddressKeys> {
    let keys = decode_address_on(destination, network)
        .and_then(|address| address.deposit_keys())
        .map_err(PreconditionError::InvalidDestination)?;
    Ok(keys)
}

impl<B, P, V> Ledger<B, P, V>
where
    B: BlockOracle,
    P: PriceOracle,
    V: ProofVerifier,
{
    pub fn register_lp(
        &mut self,
        ctx: &CallContext,
        mint_fee_bps: u16,
        burn_fee_bps: u16,
        destination: String,
    ) -> Result<()> {
        self.transact(ctx, "register_lp", false, |env, state, effects| {
            let owner = env.ctx.caller;
            if state.lps.contains_key(&owner) {
                return Err(PreconditionError::LpAlreadyRegistered.into());
            }
            check_fee(mint_fee_bps)?;
            check_fee(burn_fee_bps)?;
            let keys = deposit_keys(&destination, env.config.network)?;

            state.lps.insert(
                owner,
                LpRecord::new(owner, mint_fee_bps, burn_fee_bps, destination, keys, env.ctx.now),
            );
            info!(lp = %owner, mint_fee_bps, burn_fee_bps, "LP registered");
            effects.emit(LedgerEvent::LpRegistered { lp: owner });
            Ok(())
        })
    }

    pub fn update_lp(&mut self, ctx: &CallContext, update: LpUpdate) -> Result<()> {
        self.transact(ctx, "update_lp", false, |env, state, effects| {
            let owner = env.ctx.caller;
            let lp = state.lp_mut(&owner)?;

            if let Some(bps) = update.mint_fee_bps {
                check_fee(bps)?;
                lp.mint_fee_bps = bps;
            }
            if let Some(bps) = update.burn_fee_bps {
                check_fee(bps)?;
                lp.burn_fee_bps = bps;
            }
            if let Some(destination) = update.destination {
                lp.deposit_keys = deposit_keys(&destination, env.config.network)?;
                lp.destination = destination;
            }
            if let Some(active) = update.active {
                lp.active = active;
            }

            info!(lp = %owner, active = lp.active, "LP updated");
            effects.emit(LedgerEvent::LpUpdated { lp: owner });
            Ok(())
        })
    }

    /// Move collateral from the caller's balance into their LP position
    pub fn deposit_collateral(&mut self, ctx: &CallContext, amount: u128) -> Result<u128> {
        self.transact(ctx, "deposit_collateral", false, |env, state, effects| {
            if amount == 0 {
                return Err(PreconditionError::ZeroAmount.into());
            }
            let owner = env.ctx.caller;
            state.lp(&owner)?;
            state
                .bank
                .transfer(&owner, &Address::ESCROW, Asset::Collateral, amount)?;

            let lp = state.lp_mut(&owner)?;
            lp.collateral = lp
                .collateral
                .checked_add(amount)
                .ok_or(PreconditionError::ArithmeticOverflow)?;

            info!(lp = %owner, amount, total = lp.collateral, "collateral deposited");
            effects.emit(LedgerEvent::CollateralDeposited { lp: owner, amount });
            Ok(lp.collateral)
        })
    }

    /// Withdraw free collateral not needed at the safe ratio and not owed to liquidators
    pub fn withdraw_collateral(&mut self, ctx: &CallContext, amount: u128) -> Result<()> {
        self.transact(ctx, "withdraw_collateral", false, |env, state, effects| {
            if amount == 0 {
                return Err(PreconditionError::ZeroAmount.into());
            }
            let owner = env.ctx.caller;
            let claimed = state.claims_on(&owner);
            let lp = state.lp(&owner)?;

            let required = if lp.committed_amount() > 0 {
                env.valuation()?
                    .required_collateral(lp.committed_amount(), env.config.safe_ratio_bps)?
            } else {
                0
            };
            let withdrawable = lp
                .free_collateral()
                .saturating_sub(required)
                .saturating_sub(claimed);
            if amount > withdrawable {
                return Err(PreconditionError::InsufficientCollateral {
                    needed: amount,
                    available: withdrawable,
                }
                .into());
            }

            let lp = state.lp_mut(&owner)?;
            lp.collateral -= amount;
            effects.pay(owner, Asset::Collateral, amount);

            info!(lp = %owner, amount, remaining = lp.collateral, "collateral withdrawn");
            effects.emit(LedgerEvent::CollateralWithdrawn { lp: owner, amount });
            Ok(())
        })
    }

    /// Top up an under-collateralized LP in exchange for a claim
    pub fn liquidate(&mut self, ctx: &CallContext, lp_owner: &Address, amount: u128) -> Result<u128> {
        self.transact(ctx, "liquidate", false, |env, state, effects| {
            if amount == 0 {
                return Err(PreconditionError::ZeroAmount.into());
            }
            let liquidator = env.ctx.caller;
            let valuation = env.valuation()?;
            let lp = state.lp(lp_owner)?;

            let status = health(lp, &valuation, env.config);
            if status == LpHealth::Healthy {
                return Err(PreconditionError::LpHealthy.into());
            }
            if status == LpHealth::Liquidatable {
                warn!(lp = %lp_owner, "LP below liquidation threshold");
            }

            state
                .bank
                .transfer(&liquidator, &Address::ESCROW, Asset::Collateral, amount)?;
            let lp = state.lp_mut(lp_owner)?;
            lp.collateral = lp
                .collateral
                .checked_add(amount)
                .ok_or(PreconditionError::ArithmeticOverflow)?;

            let claim = state.claims.entry((*lp_owner, liquidator)).or_insert(0);
            *claim = claim
                .checked_add(amount)
                .ok_or(PreconditionError::ArithmeticOverflow)?;
            let total_claim = *claim;

            info!(lp = %lp_owner, %liquidator, amount, total_claim, "liquidation top-up");
            effects.emit(LedgerEvent::Liquidated {
                lp: *lp_owner,
                liquidator,
                amount,
            });
            Ok(total_claim)
        })
    }

    /// Return as much of the caller's claim as the LP can release at the safe ratio
    pub fn redeem_liquidation_claim(&mut self, ctx: &CallContext, lp_owner: &Address) -> Result<u128> {
        self.transact(ctx, "redeem_liquidation_claim", false, |env, state, effects| {
            let liquidator = env.ctx.caller;
            let key = (*lp_owner, liquidator);
            let claim = state
                .claims
                .get(&key)
                .copied()
                .ok_or(PreconditionError::NoLiquidationClaim)?;

            let valuation = env.valuation()?;
            let safe = env.config.safe_ratio_bps;
            let lp = state.lp(lp_owner)?;
            if !valuation.covers(lp.free_collateral(), lp.backed_amount, safe) {
                return Err(PreconditionError::RatioTooLow {
                    ratio_bps: valuation
                        .ratio_bps(lp.free_collateral(), lp.backed_amount)
                        .unwrap_or(u128::MAX),
                    required_bps: u128::from(safe),
                }
                .into());
            }

            let required = valuation.required_collateral(lp.committed_amount(), safe)?;
            let releasable = lp.free_collateral().saturating_sub(required);
            let paid = claim.min(releasable);
            if paid == 0 {
                return Err(PreconditionError::InsufficientCollateral {
                    needed: claim,
                    available: 0,
                }
                .into());
            }

            state.lp_mut(lp_owner)?.collateral -= paid;
            if paid == claim {
                state.claims.remove(&key);
            } else {
                state.claims.insert(key, claim - paid);
            }
            effects.pay(liquidator, Asset::Collateral, paid);

            info!(lp = %lp_owner, %liquidator, paid, outstanding = claim - paid, "liquidation claim redeemed");
            effects.emit(LedgerEvent::ClaimRedeemed {
                lp: *lp_owner,
                liquidator,
                amount: paid,
            });
            Ok(paid)
        })
    }
}
