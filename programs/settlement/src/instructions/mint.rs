//! Mint intents and proof-gated minting
//!
//! ## Mint pipeline
//!
//! 1. LP active, intent open and unexpired, output not yet spent
//! 2. Relayed block present; Merkle paths within the depth limit
//! 3. Transaction in the block's transaction tree
//! 4. Output in the block's output tree
//! 5. DLEQ proof ties `R` and `rA` to one secret, with `A` the LP's view key
//! 6. Stealth replay: `S = 8*rA`, `P = Hs*G + B`, `P` is the proven output
//!    key and `B` the LP's spend key
//! 7. Succinct proof verified, then its signals bound to steps 4-6
//! 8. Amount above the minimum and matching the intent commitment
//! 9. Safe ratio holds after issuance
//!
//! Each stage fails with its own error, and nothing is written unless every
//! stage passes.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::crypto::dleq::{self, DleqProof, DleqStatement};
use crate::crypto::merkle::{Keccak256Nodes, MerkleProof, OutputRecord, Sha256Nodes};
use crate::crypto::stealth::{self, PointProof};
use crate::error::{InvariantViolation, PreconditionError, ProofError, Result};
use crate::ledger::{capacity, Ledger, LedgerEvent};
use crate::state::{
    Address, Asset, BlockOracle, CallContext, IntentStatus, MintIntent, PriceOracle,
    fee_for, BPS_DENOMINATOR,
};
use crate::zk::{bind_signals, PlonkProof, ProofVerifier, PublicSignals};

/// Arguments of a mint call, assembled off-ledger by the prover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintRequest {
    pub intent_id: [u8; 32],
    pub lp: Address,
    pub recipient: Address,
    pub block_height: u64,
    pub tx_hash: [u8; 32],
    pub tx_proof: MerkleProof,
    pub output: OutputRecord,
    pub output_proof: MerkleProof,
    pub dleq_statement: DleqStatement,
    pub dleq_proof: DleqProof,
    pub points: PointProof,
    pub proof: PlonkProof,
    pub signals: PublicSignals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintReceipt {
    pub amount: u128,
    pub fee: u128,
    /// Tokens credited to the recipient
    pub net: u128,
}

impl<B, P, V> Ledger<B, P, V>
where
    B: BlockOracle,
    P: PriceOracle,
    V: ProofVerifier,
{
    /// Reserve LP capacity; the attached value is the anti-griefing deposit
    pub fn create_mint_intent(&mut self, ctx: &CallContext, lp_owner: &Address, amount: u128) -> Result<[u8; 32]> {
        self.transact(ctx, "create_mint_intent", true, |env, state, effects| {
            let config = env.config;
            let user = env.ctx.caller;
            let lp = state.lp(lp_owner)?;
            if !lp.active {
                return Err(PreconditionError::LpInactive.into());
            }
            if amount == 0 {
                return Err(PreconditionError::ZeroAmount.into());
            }
            let minimum = u128::from(config.min_mint_amount);
            if amount < minimum {
                return Err(PreconditionError::AmountBelowMinimum { amount, minimum }.into());
            }
            if env.ctx.value < config.min_intent_deposit {
                return Err(PreconditionError::DepositTooSmall {
                    required: config.min_intent_deposit,
                    provided: env.ctx.value,
                }
                .into());
            }

            let cap = capacity(lp, &env.valuation()?, config)?;
            let floor = cap.available * u128::from(config.min_intent_fraction_bps) / BPS_DENOMINATOR;
            if amount < floor {
                return Err(PreconditionError::IntentBelowMinimum {
                    requested: amount,
                    minimum: floor,
                }
                .into());
            }
            if amount > cap.available {
                return Err(PreconditionError::InsufficientCapacity {
                    requested: amount,
                    available: cap.available,
                }
                .into());
            }

            let id = MintIntent::derive_id(&user, lp_owner, amount, env.ctx.now);
            if state.intents.contains_key(&id) {
                return Err(InvariantViolation::DuplicateIntent.into());
            }

            state.lp_mut(lp_owner)?.reserved_amount += amount;
            state.intents.insert(
                id,
                MintIntent {
                    id,
                    user,
                    lp: *lp_owner,
                    expected_amount: amount,
                    deposit: env.ctx.value,
                    created_at: env.ctx.now,
                    status: IntentStatus::Open,
                },
            );

            info!(id = %hex::encode(id), %user, lp = %lp_owner, amount, "mint intent created");
            effects.emit(LedgerEvent::IntentCreated {
                id,
                user,
                lp: *lp_owner,
                amount,
            });
            Ok(id)
        })
    }

    /// Creator-only, once the intent timeout has elapsed; refunds the deposit
    pub fn cancel_mint_intent(&mut self, ctx: &CallContext, intent_id: &[u8; 32]) -> Result<()> {
        self.transact(ctx, "cancel_mint_intent", false, |env, state, effects| {
            let intent = state
                .intents
                .get(intent_id)
                .cloned()
                .ok_or(PreconditionError::IntentNotFound)?;
            if !intent.is_open() {
                return Err(InvariantViolation::IntentClosed.into());
            }
            if intent.user != env.ctx.caller {
                return Err(PreconditionError::Unauthorized.into());
            }
            if !intent.is_expired(env.ctx.now, env.config.intent_timeout_secs) {
                return Err(PreconditionError::IntentNotExpired.into());
            }

            let lp = state.lp_mut(&intent.lp)?;
            lp.reserved_amount = lp.reserved_amount.saturating_sub(intent.expected_amount);
            if let Some(stored) = state.intents.get_mut(intent_id) {
                stored.status = IntentStatus::Cancelled;
            }
            effects.pay(intent.user, Asset::Native, intent.deposit);

            info!(id = %hex::encode(intent_id), "mint intent cancelled");
            effects.emit(LedgerEvent::IntentCancelled { id: *intent_id });
            Ok(())
        })
    }

    /// Verify a source-chain payment and issue tokens against the LP
    pub fn mint(&mut self, ctx: &CallContext, request: &MintRequest) -> Result<MintReceipt> {
        self.transact(ctx, "mint", false, |env, state, effects| {
            let config = env.config;
            let order = config.byte_order;

            // Stage 1: ledger preconditions
            let lp = state.lp(&request.lp)?;
            if !lp.active {
                return Err(PreconditionError::LpInactive.into());
            }
            let intent = state
                .intents
                .get(&request.intent_id)
                .cloned()
                .ok_or(PreconditionError::IntentNotFound)?;
            if !intent.is_open() {
                return Err(InvariantViolation::IntentClosed.into());
            }
            if intent.is_expired(env.ctx.now, config.intent_timeout_secs) {
                return Err(PreconditionError::IntentExpired.into());
            }
            if intent.lp != request.lp || intent.user != request.recipient {
                return Err(ProofError::IntentMismatch.into());
            }

            let output = &request.output;
            state
                .nullifiers
                .check_unspent(&request.tx_hash, output.output_index)?;

            // Stage 2: block and proof shape
            let block = env
                .blocks
                .block(request.block_height)
                .ok_or(PreconditionError::MissingBlock(request.block_height))?;
            request.tx_proof.validate(config.max_merkle_depth)?;
            request.output_proof.validate(config.max_merkle_depth)?;

            // Stage 3-4: inclusion
            let tx_leaf = config.tx_leaf_order.apply(&request.tx_hash);
            if !request.tx_proof.verify::<Keccak256Nodes>(&tx_leaf, &block.tx_root) {
                return Err(ProofError::TxInclusion.into());
            }
            if output.tx_hash != request.tx_hash {
                return Err(ProofError::OutputMismatch.into());
            }
            if !request
                .output_proof
                .verify::<Sha256Nodes>(&output.leaf(), &block.output_root)
            {
                return Err(ProofError::OutputInclusion.into());
            }
            debug!(height = block.height, "inclusion proofs verified");

            // Stage 5-6: curve replay against the LP's deposit address
            let verified = dleq::verify(&request.dleq_statement, &request.dleq_proof, order)?;
            if verified.view_key.compress() != lp.deposit_keys.view_pubkey {
                return Err(ProofError::LpViewKeyMismatch.into());
            }
            let replayed = stealth::replay(
                &verified,
                &request.points,
                output.output_index,
                &output.output_pub_key,
                order,
            )?;
            if replayed.spend_key.compress() != lp.deposit_keys.spend_pubkey {
                return Err(ProofError::LpSpendKeyMismatch.into());
            }
            debug!("DLEQ and stealth replay verified");

            // Stage 7: succinct proof, amount read only after acceptance
            if !env.verifier.verify(&request.proof, &request.signals) {
                return Err(ProofError::SuccinctProofRejected.into());
            }
            let amount = u128::from(bind_signals(&request.signals, output, &replayed)?);

            // Stage 8: amount and intent commitment
            let minimum = u128::from(config.min_mint_amount);
            if amount < minimum {
                return Err(PreconditionError::AmountBelowMinimum { amount, minimum }.into());
            }
            let commitment =
                MintIntent::derive_id(&request.recipient, &request.lp, amount, intent.created_at);
            if commitment != request.intent_id {
                return Err(ProofError::IntentMismatch.into());
            }

            // Stage 9: ratio after issuance
            let valuation = env.valuation()?;
            let backed_after = lp
                .backed_amount
                .checked_add(amount)
                .ok_or(PreconditionError::ArithmeticOverflow)?;
            if !valuation.covers(lp.free_collateral(), backed_after, config.safe_ratio_bps) {
                return Err(PreconditionError::RatioTooLow {
                    ratio_bps: valuation
                        .ratio_bps(lp.free_collateral(), backed_after)
                        .unwrap_or(u128::MAX),
                    required_bps: u128::from(config.safe_ratio_bps),
                }
                .into());
            }

            let fee = fee_for(amount, lp.mint_fee_bps);
            let net = amount - fee;

            state.nullifiers.insert(&request.tx_hash, output.output_index)?;
            let lp = state.lp_mut(&request.lp)?;
            lp.backed_amount = backed_after;
            lp.reserved_amount = lp.reserved_amount.saturating_sub(intent.expected_amount);
            let lp_owner = lp.owner;
            state.mint_tokens(&request.recipient, net)?;
            state.mint_tokens(&lp_owner, fee)?;
            if let Some(stored) = state.intents.get_mut(&request.intent_id) {
                stored.status = IntentStatus::Fulfilled;
            }
            effects.pay(intent.user, Asset::Native, intent.deposit);

            info!(
                tx = %hex::encode(request.tx_hash),
                output_index = output.output_index,
                recipient = %request.recipient,
                lp = %request.lp,
                amount,
                fee,
                "minted"
            );
            effects.emit(LedgerEvent::Minted {
                intent_id: request.intent_id,
                tx_hash: request.tx_hash,
                output_index: output.output_index,
                recipient: request.recipient,
                lp: request.lp,
                amount,
                fee,
            });
            Ok(MintReceipt { amount, fee, net })
        })
    }
}
