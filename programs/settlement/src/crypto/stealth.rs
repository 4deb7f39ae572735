//! Monero one-time output keys
//!
//! ## Derivation
//!
//! - Sender: `rA = r*A`; recipient: `rA = a*R`
//! - Shared secret `S = 8*rA`
//! - `Hs = hash_to_scalar(compress(S) ‖ varint(output_index))`
//! - Output key `P = Hs*G + B`
//! - Amount key = first 8 bytes of `keccak256("amount" ‖ Hs)`, and the
//!   on-chain `ecdhAmount` is the little-endian amount XOR that key
//!
//! [`replay`] runs the same steps against a verified DLEQ statement and the
//! Merkle-proven output, failing at the first stage that disagrees.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::curve::EdwardsPoint;
use super::dleq::VerifiedDleq;
use super::encoding::{ByteOrder, EncodedPoint};
use super::field::{Scalar, SecretScalar};
use super::hash::{encode_varint, hash_to_scalar, keccak256_concat};
use super::keys::{admit_point, admit_public_key};
use crate::error::{PointRole, ProofError};

const AMOUNT_DOMAIN: &[u8] = b"amount";

pub fn shared_secret(shared_input: &EdwardsPoint) -> EdwardsPoint {
    shared_input.mul_by_cofactor()
}

pub fn derivation_scalar(shared_secret: &EdwardsPoint, output_index: u64) -> Scalar {
    let mut data = shared_secret.compress().to_vec();
    data.extend_from_slice(&encode_varint(output_index));
    hash_to_scalar(&data)
}

pub fn output_key(derivation: &Scalar, spend_key: &EdwardsPoint) -> EdwardsPoint {
    EdwardsPoint::mul_base(derivation).add(spend_key)
}

pub fn amount_key(derivation: &Scalar) -> [u8; 8] {
    let digest = keccak256_concat(&[AMOUNT_DOMAIN, &derivation.to_bytes_le()]);
    let mut key = [0u8; 8];
    key.copy_from_slice(&digest[..8]);
    key
}

pub fn encrypt_amount(amount: u64, key: &[u8; 8]) -> [u8; 8] {
    let mut out = amount.to_le_bytes();
    for (byte, k) in out.iter_mut().zip(key) {
        *byte ^= k;
    }
    out
}

pub fn decrypt_amount(ecdh_amount: &[u8; 8], key: &[u8; 8]) -> u64 {
    let mut plain = *ecdh_amount;
    for (byte, k) in plain.iter_mut().zip(key) {
        *byte ^= k;
    }
    u64::from_le_bytes(plain)
}

/// Everything the sender learns when paying to an address
#[derive(Debug, Clone)]
pub struct StealthOutput {
    pub ephemeral: EdwardsPoint,
    pub shared_input: EdwardsPoint,
    pub shared_secret: EdwardsPoint,
    pub derivation: Scalar,
    pub output_key: EdwardsPoint,
    pub amount_key: [u8; 8],
}

impl StealthOutput {
    /// Sender side, from the transaction secret `r`
    pub fn derive(
        tx_secret: &SecretScalar,
        view_key: &EdwardsPoint,
        spend_key: &EdwardsPoint,
        output_index: u64,
    ) -> Self {
        let r = tx_secret.to_scalar();
        let ephemeral = EdwardsPoint::mul_base(&r);
        let shared_input = view_key.scalar_mul(&r);
        Self::from_shared_input(ephemeral, shared_input, spend_key, output_index)
    }

    /// Recipient side, from the view secret `a` and the published `R`
    pub fn scan(
        view_secret: &SecretScalar,
        ephemeral: &EdwardsPoint,
        spend_key: &EdwardsPoint,
        output_index: u64,
    ) -> Self {
        let shared_input = ephemeral.scalar_mul(&view_secret.to_scalar());
        Self::from_shared_input(ephemeral.clone(), shared_input, spend_key, output_index)
    }

    fn from_shared_input(
        ephemeral: EdwardsPoint,
        shared_input: EdwardsPoint,
        spend_key: &EdwardsPoint,
        output_index: u64,
    ) -> Self {
        let shared_secret = shared_secret(&shared_input);
        let derivation = derivation_scalar(&shared_secret, output_index);
        let output_key = output_key(&derivation, spend_key);
        let amount_key = amount_key(&derivation);
        Self {
            ephemeral,
            shared_input,
            shared_secret,
            derivation,
            output_key,
            amount_key,
        }
    }
}

/// Claimed points supplied alongside the DLEQ proof
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointProof {
    pub shared_secret: EncodedPoint,
    pub output_key: EncodedPoint,
    pub spend_key: EncodedPoint,
}

impl PointProof {
    pub fn from_output(output: &StealthOutput, spend_key: &EdwardsPoint, order: ByteOrder) -> Self {
        Self {
            shared_secret: EncodedPoint::encode(&output.shared_secret, order),
            output_key: EncodedPoint::encode(&output.output_key, order),
            spend_key: EncodedPoint::encode(spend_key, order),
        }
    }
}

/// Values recomputed by a successful replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayedStealth {
    pub ephemeral: EdwardsPoint,
    pub shared_secret: EdwardsPoint,
    pub output_key: EdwardsPoint,
    /// Spend key the output was derived for
    pub spend_key: EdwardsPoint,
    pub derivation: Scalar,
    pub amount_key: [u8; 8],
}

/// Check claimed points against a verified DLEQ and the on-chain output key
pub fn replay(
    dleq: &VerifiedDleq,
    points: &PointProof,
    output_index: u64,
    output_pub_key: &[u8; 32],
    order: ByteOrder,
) -> Result<ReplayedStealth, ProofError> {
    let claimed_secret = points
        .shared_secret
        .decode(order)
        .map_err(ProofError::point(PointRole::SharedSecret))?;
    let claimed_output = points
        .output_key
        .decode(order)
        .map_err(ProofError::point(PointRole::OutputKey))?;
    let spend_key = points
        .spend_key
        .decode(order)
        .map_err(ProofError::point(PointRole::SpendKey))?;
    admit_point(&spend_key).map_err(ProofError::point(PointRole::SpendKey))?;

    let secret = shared_secret(&dleq.shared_input);
    if secret != claimed_secret {
        debug!("shared secret is not 8*rA");
        return Err(ProofError::SharedSecretMismatch);
    }

    let derivation = derivation_scalar(&secret, output_index);
    let derived = output_key(&derivation, &spend_key);
    if derived != claimed_output {
        debug!(output_index, "derived stealth key differs from claimed key");
        return Err(ProofError::StealthKeyMismatch);
    }

    let on_chain = admit_public_key(output_pub_key).map_err(ProofError::point(PointRole::OutputKey))?;
    if on_chain != derived {
        debug!("stealth key differs from the proven output key");
        return Err(ProofError::OutputKeyMismatch);
    }

    Ok(ReplayedStealth {
        ephemeral: dleq.ephemeral.clone(),
        shared_secret: secret,
        output_key: derived,
        spend_key,
        amount_key: amount_key(&derivation),
        derivation,
    })
}
