//! Burn requests and their two terminal transitions

use tracing::{info, warn};

use crate::crypto::address::decode_address_on;
use crate::error::{InvariantViolation, PreconditionError, Result};
use crate::ledger::{Ledger, LedgerEvent};
use crate::state::{
    fee_for, Address, Asset, BlockOracle, BurnRequest, BurnStatus, CallContext, PriceOracle,
};
use crate::zk::ProofVerifier;

impl<B, P, V> Ledger<B, P, V>
where
    B: BlockOracle,
    P: PriceOracle,
    V: ProofVerifier,
{
    /// Burn tokens and lock LP collateral until the LP pays out on the
    /// source chain. The attached value is the anti-griefing deposit.
    pub fn request_burn(
        &mut self,
        ctx: &CallContext,
        lp_owner: &Address,
        amount: u128,
        destination: String,
    ) -> Result<u64> {
        self.transact(ctx, "request_burn", true, |env, state, effects| {
            let config = env.config;
            let user = env.ctx.caller;
            if amount == 0 {
                return Err(PreconditionError::ZeroAmount.into());
            }
            decode_address_on(&destination, config.network)
                .map_err(PreconditionError::InvalidDestination)?;
            if env.ctx.value < config.min_burn_deposit {
                return Err(PreconditionError::DepositTooSmall {
                    required: config.min_burn_deposit,
                    provided: env.ctx.value,
                }
                .into());
            }

            let lp = state.lp(lp_owner)?;
            let fee = fee_for(amount, lp.burn_fee_bps);
            let net = amount - fee;
            if net == 0 {
                return Err(PreconditionError::ZeroAmount.into());
            }
            if net > lp.backed_amount {
                return Err(PreconditionError::InsufficientBacking {
                    requested: net,
                    backed: lp.backed_amount,
                }
                .into());
            }
            let locked = env
                .valuation()?
                .required_collateral(net, config.safe_ratio_bps)?;
            if locked > lp.free_collateral() {
                return Err(PreconditionError::InsufficientCollateral {
                    needed: locked,
                    available: lp.free_collateral(),
                }
                .into());
            }

            state.bank.transfer(&user, lp_owner, Asset::Token, fee)?;
            state.burn_tokens(&user, net)?;
            let lp = state.lp_mut(lp_owner)?;
            lp.backed_amount -= net;
            lp.locked_collateral += locked;

            let id = state.next_burn_id;
            state.next_burn_id += 1;
            state.burns.insert(
                id,
                BurnRequest {
                    id,
                    user,
                    lp: *lp_owner,
                    amount,
                    fee,
                    deposit: env.ctx.value,
                    destination,
                    request_time: env.ctx.now,
                    collateral_locked: locked,
                    status: BurnStatus::Pending,
                    fulfilment_tx: None,
                },
            );

            info!(id, %user, lp = %lp_owner, amount, fee, locked, "burn requested");
            effects.emit(LedgerEvent::BurnRequested {
                id,
                user,
                lp: *lp_owner,
                amount,
                fee,
                collateral_locked: locked,
            });
            Ok(id)
        })
    }

    /// LP attests delivery; releases the lock and refunds the requester's deposit
    pub fn fulfill_burn(&mut self, ctx: &CallContext, id: u64, source_tx: [u8; 32]) -> Result<()> {
        self.transact(ctx, "fulfill_burn", false, |env, state, effects| {
            let burn = state
                .burns
                .get(&id)
                .cloned()
                .ok_or(PreconditionError::BurnNotFound(id))?;
            if !burn.is_pending() {
                return Err(InvariantViolation::BurnAlreadySettled(id).into());
            }
            if env.ctx.caller != burn.lp {
                return Err(PreconditionError::Unauthorized.into());
            }
            if !burn.can_fulfil(env.ctx.now, env.config.burn_timeout_secs) {
                return Err(PreconditionError::BurnExpired(id).into());
            }

            let lp = state.lp_mut(&burn.lp)?;
            lp.locked_collateral = lp.locked_collateral.saturating_sub(burn.collateral_locked);
            if let Some(stored) = state.burns.get_mut(&id) {
                stored.status = BurnStatus::Fulfilled;
                stored.fulfilment_tx = Some(source_tx);
            }
            effects.pay(burn.user, Asset::Native, burn.deposit);

            info!(id, lp = %burn.lp, tx = %hex::encode(source_tx), "burn fulfilled");
            effects.emit(LedgerEvent::BurnFulfilled { id });
            Ok(())
        })
    }

    /// Requester takes the locked collateral once the LP missed the window
    pub fn claim_default(&mut self, ctx: &CallContext, id: u64) -> Result<u128> {
        self.transact(ctx, "claim_default", false, |env, state, effects| {
            let burn = state
                .burns
                .get(&id)
                .cloned()
                .ok_or(PreconditionError::BurnNotFound(id))?;
            if !burn.is_pending() {
                return Err(InvariantViolation::BurnAlreadySettled(id).into());
            }
            if env.ctx.caller != burn.user {
                return Err(PreconditionError::Unauthorized.into());
            }
            if !burn.can_claim_default(env.ctx.now, env.config.burn_timeout_secs) {
                return Err(PreconditionError::BurnNotExpired(id).into());
            }

            let lp = state.lp_mut(&burn.lp)?;
            lp.locked_collateral = lp.locked_collateral.saturating_sub(burn.collateral_locked);
            lp.collateral = lp.collateral.saturating_sub(burn.collateral_locked);
            if let Some(stored) = state.burns.get_mut(&id) {
                stored.status = BurnStatus::Defaulted;
            }
            effects.pay(burn.user, Asset::Collateral, burn.collateral_locked);
            effects.pay(burn.user, Asset::Native, burn.deposit);

            warn!(id, lp = %burn.lp, collateral = burn.collateral_locked, "burn defaulted");
            effects.emit(LedgerEvent::BurnDefaulted {
                id,
                collateral: burn.collateral_locked,
            });
            Ok(burn.collateral_locked)
        })
    }
}
