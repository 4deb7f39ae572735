//! Proof and public-signal containers

use serde::{Deserialize, Serialize};

use crate::crypto::hash::{keccak256_concat, u256_be};
use crate::error::ProofError;

/// Words in a PLONK proof
pub const PROOF_WORDS: usize = 24;

pub const SIGNAL_COUNT: usize = 70;
pub const AMOUNT_SIGNAL: usize = 0;
pub const COMMITMENT_SIGNAL: usize = 1;
pub const CIPHERTEXT_SIGNAL: usize = 2;
pub const KEY_BITS_START: usize = 3;
pub const KEY_BITS: usize = 64;
pub const EPHEMERAL_X_SIGNAL: usize = 67;
pub const SHARED_SECRET_X_SIGNAL: usize = 68;
pub const OUTPUT_KEY_X_SIGNAL: usize = 69;

/// PLONK proof as 24 big-endian field words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlonkProof(pub [[u8; 32]; PROOF_WORDS]);

impl PlonkProof {
    pub fn words(&self) -> &[[u8; 32]; PROOF_WORDS] {
        &self.0
    }
}

/// Exactly [`SIGNAL_COUNT`] big-endian words
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<[u8; 32]>", into = "Vec<[u8; 32]>")]
pub struct PublicSignals(Vec<[u8; 32]>);

impl PublicSignals {
    pub fn new(words: Vec<[u8; 32]>) -> Result<Self, ProofError> {
        if words.len() != SIGNAL_COUNT {
            return Err(ProofError::SignalCount {
                expected: SIGNAL_COUNT,
                found: words.len(),
            });
        }
        Ok(Self(words))
    }

    pub fn words(&self) -> &[[u8; 32]] {
        &self.0
    }

    pub fn word(&self, index: usize) -> &[u8; 32] {
        &self.0[index]
    }

    /// Claimed amount; only meaningful after the proof verified
    pub fn amount(&self) -> Result<u64, ProofError> {
        let word = self.word(AMOUNT_SIGNAL);
        if word[..24].iter().any(|&b| b != 0) {
            return Err(ProofError::AmountOutOfRange);
        }
        let mut low = [0u8; 8];
        low.copy_from_slice(&word[24..]);
        Ok(u64::from_be_bytes(low))
    }

    /// Signal word holding bit `i` of the amount key
    pub fn key_bit(&self, i: usize) -> &[u8; 32] {
        self.word(KEY_BITS_START + i)
    }
}

impl TryFrom<Vec<[u8; 32]>> for PublicSignals {
    type Error = ProofError;

    fn try_from(words: Vec<[u8; 32]>) -> Result<Self, Self::Error> {
        Self::new(words)
    }
}

impl From<PublicSignals> for Vec<[u8; 32]> {
    fn from(signals: PublicSignals) -> Self {
        signals.0
    }
}

/// Builds the signal vector in circuit order
#[derive(Debug, Clone)]
pub struct SignalBuilder {
    words: Vec<[u8; 32]>,
}

impl SignalBuilder {
    pub fn new(amount: u64, commitment: [u8; 32], ciphertext: [u8; 32]) -> Self {
        let mut words = vec![[0u8; 32]; SIGNAL_COUNT];
        words[AMOUNT_SIGNAL] = u256_be(u128::from(amount));
        words[COMMITMENT_SIGNAL] = commitment;
        words[CIPHERTEXT_SIGNAL] = ciphertext;
        Self { words }
    }

    pub fn amount_key(mut self, key: &[u8; 8]) -> Self {
        let key = u64::from_le_bytes(*key);
        for i in 0..KEY_BITS {
            self.words[KEY_BITS_START + i] = u256_be(u128::from((key >> i) & 1));
        }
        self
    }

    pub fn x_coordinates(mut self, ephemeral: [u8; 32], shared: [u8; 32], output: [u8; 32]) -> Self {
        self.words[EPHEMERAL_X_SIGNAL] = ephemeral;
        self.words[SHARED_SECRET_X_SIGNAL] = shared;
        self.words[OUTPUT_KEY_X_SIGNAL] = output;
        self
    }

    pub fn build(self) -> PublicSignals {
        PublicSignals(self.words)
    }
}

/// keccak256(proof words ‖ signal words), the attestation key
pub fn proof_digest(proof: &PlonkProof, signals: &PublicSignals) -> [u8; 32] {
    let parts: Vec<&[u8]> = proof
        .words()
        .iter()
        .chain(signals.words())
        .map(|word| word.as_slice())
        .collect();
    keccak256_concat(&parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_signal_count_rejected() {
        assert_eq!(
            PublicSignals::new(vec![[0u8; 32]; 69]),
            Err(ProofError::SignalCount { expected: 70, found: 69 })
        );
    }

    #[test]
    fn test_amount_must_fit_u64() {
        let mut signals = SignalBuilder::new(5, [0; 32], [0; 32]).build();
        assert_eq!(signals.amount(), Ok(5));
        signals.0[AMOUNT_SIGNAL][23] = 1;
        assert_eq!(signals.amount(), Err(ProofError::AmountOutOfRange));
    }

    #[test]
    fn test_key_bits_lsb_first() {
        let key = 0b101u64.to_le_bytes();
        let signals = SignalBuilder::new(0, [0; 32], [0; 32]).amount_key(&key).build();
        assert_eq!(signals.key_bit(0)[31], 1);
        assert_eq!(signals.key_bit(1)[31], 0);
        assert_eq!(signals.key_bit(2)[31], 1);
    }

    #[test]
    fn test_signals_deserialize_checks_length() {
        let json = serde_json::to_string(&vec![[0u8; 32]; 3]).unwrap();
        assert!(serde_json::from_str::<PublicSignals>(&json).is_err());
    }

    #[test]
    fn test_digest_covers_signals() {
        let proof = PlonkProof([[1u8; 32]; PROOF_WORDS]);
        let a = SignalBuilder::new(1, [0; 32], [0; 32]).build();
        let b = SignalBuilder::new(2, [0; 32], [0; 32]).build();
        assert_ne!(proof_digest(&proof, &a), proof_digest(&proof, &b));
    }
}
