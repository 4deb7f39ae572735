//! Proof verifiers and public-signal binding
//!
//! Verification modes:
//! - any `Fn(&PlonkProof, &PublicSignals) -> bool`, for an in-process
//!   verifier or a test double
//! - [`AttestedProofVerifier`], accepting digests a trusted proving service
//!   has attested to

use std::collections::HashSet;

use tracing::{debug, info};

use super::types::*;
use crate::crypto::encoding::ByteOrder;
use crate::crypto::merkle::OutputRecord;
use crate::crypto::stealth::{decrypt_amount, ReplayedStealth};
use crate::crypto::hash::u256_be;
use crate::error::{PreconditionError, ProofError, SignalField};
use crate::state::Address;

pub trait ProofVerifier {
    fn verify(&self, proof: &PlonkProof, signals: &PublicSignals) -> bool;
}

impl<F> ProofVerifier for F
where
    F: Fn(&PlonkProof, &PublicSignals) -> bool,
{
    fn verify(&self, proof: &PlonkProof, signals: &PublicSignals) -> bool {
        self(proof, signals)
    }
}

/// Allow-list of `proof_digest` values signed off by one attester
#[derive(Debug, Clone)]
pub struct AttestedProofVerifier {
    attester: Address,
    attested: HashSet<[u8; 32]>,
}

impl AttestedProofVerifier {
    pub fn new(attester: Address) -> Self {
        Self {
            attester,
            attested: HashSet::new(),
        }
    }

    pub fn attester(&self) -> &Address {
        &self.attester
    }

    pub fn attest(
        &mut self,
        caller: &Address,
        proof: &PlonkProof,
        signals: &PublicSignals,
    ) -> Result<[u8; 32], PreconditionError> {
        if caller != &self.attester {
            return Err(PreconditionError::Unauthorized);
        }
        let digest = proof_digest(proof, signals);
        self.attested.insert(digest);
        info!(digest = %hex::encode(digest), "proof attested");
        Ok(digest)
    }

    pub fn is_attested(&self, digest: &[u8; 32]) -> bool {
        self.attested.contains(digest)
    }
}

impl ProofVerifier for AttestedProofVerifier {
    fn verify(&self, proof: &PlonkProof, signals: &PublicSignals) -> bool {
        self.is_attested(&proof_digest(proof, signals))
    }
}

fn expect_signal(
    signals: &PublicSignals,
    index: usize,
    expected: &[u8; 32],
    field: SignalField,
) -> Result<(), ProofError> {
    if signals.word(index) != expected {
        debug!(?field, "public signal mismatch");
        return Err(ProofError::SignalMismatch(field));
    }
    Ok(())
}

/// Tie verified signals to the proven output and return the amount
///
/// Call only after the verifier accepted the proof.
pub fn bind_signals(
    signals: &PublicSignals,
    output: &OutputRecord,
    replayed: &ReplayedStealth,
) -> Result<u64, ProofError> {
    let be = ByteOrder::BigEndian;

    expect_signal(signals, COMMITMENT_SIGNAL, &output.commitment, SignalField::Commitment)?;
    expect_signal(signals, CIPHERTEXT_SIGNAL, &output.ecdh_word(), SignalField::Ciphertext)?;

    let key = u64::from_le_bytes(replayed.amount_key);
    for i in 0..KEY_BITS {
        let bit = u256_be(u128::from((key >> i) & 1));
        expect_signal(signals, KEY_BITS_START + i, &bit, SignalField::AmountKeyBit(i))?;
    }

    expect_signal(
        signals,
        EPHEMERAL_X_SIGNAL,
        &be.write_field(replayed.ephemeral.x()),
        SignalField::EphemeralX,
    )?;
    expect_signal(
        signals,
        SHARED_SECRET_X_SIGNAL,
        &be.write_field(replayed.shared_secret.x()),
        SignalField::SharedSecretX,
    )?;
    expect_signal(
        signals,
        OUTPUT_KEY_X_SIGNAL,
        &be.write_field(replayed.output_key.x()),
        SignalField::OutputKeyX,
    )?;

    let amount = signals.amount()?;
    if decrypt_amount(&output.ecdh_amount, &replayed.amount_key) != amount {
        debug!("claimed amount does not decrypt the on-chain ciphertext");
        return Err(ProofError::SignalMismatch(SignalField::Ciphertext));
    }
    Ok(amount)
}

/// Signals an honest prover would publish for `output`
pub fn expected_signals(amount: u64, output: &OutputRecord, replayed: &ReplayedStealth) -> PublicSignals {
    let be = ByteOrder::BigEndian;
    SignalBuilder::new(amount, output.commitment, output.ecdh_word())
        .amount_key(&replayed.amount_key)
        .x_coordinates(
            be.write_field(replayed.ephemeral.x()),
            be.write_field(replayed.shared_secret.x()),
            be.write_field(replayed.output_key.x()),
        )
        .build()
}
