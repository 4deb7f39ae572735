//! Discrete-log equality proof for `R = r*G` and `rA = r*A`
//!
//! ## Flow
//!
//! 1. Prover picks a nonce `k`, publishes `K1 = k*G` and `K2 = k*A`
//! 2. `c = keccak256(G ‖ A ‖ R ‖ rA ‖ K1 ‖ K2) mod L` over uncompressed points
//!    in the pipeline byte order
//! 3. `s = k + c*r mod L`
//! 4. Verifier recomputes `c` and checks `s*G == K1 + c*R` and
//!    `s*A == K2 + c*rA`
//!
//! Any failed step is a hard reject.

use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::curve::{basepoint, EdwardsPoint};
use super::encoding::{ByteOrder, EncodedPoint, EncodedScalar};
use super::field::{Scalar, SecretScalar};
use super::hash::keccak256_concat;
use crate::error::{PointRole, ProofError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DleqProof {
    pub c: EncodedScalar,
    pub s: EncodedScalar,
    pub k1: EncodedPoint,
    pub k2: EncodedPoint,
}

/// Public side of the relation: `A`, `R = r*G`, `rA = r*A`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DleqStatement {
    pub view_key: EncodedPoint,
    pub ephemeral: EncodedPoint,
    pub shared_input: EncodedPoint,
}

/// Points recovered by a successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedDleq {
    pub view_key: EdwardsPoint,
    pub ephemeral: EdwardsPoint,
    pub shared_input: EdwardsPoint,
}

fn challenge(points: [&EdwardsPoint; 6], order: ByteOrder) -> Scalar {
    let encoded = points.map(|p| EncodedPoint::encode(p, order).to_bytes());
    let parts: Vec<&[u8]> = encoded.iter().map(|bytes| bytes.as_slice()).collect();
    let digest = keccak256_concat(&parts);
    let value = match order {
        ByteOrder::BigEndian => BigUint::from_bytes_be(&digest),
        ByteOrder::LittleEndian => BigUint::from_bytes_le(&digest),
    };
    Scalar::from_uint(value)
}

/// Prove knowledge of `r` behind both `r*G` and `r*A`
pub fn prove<R: RngCore + CryptoRng>(
    rng: &mut R,
    secret: &SecretScalar,
    view_key: &EdwardsPoint,
    order: ByteOrder,
) -> (DleqStatement, DleqProof) {
    let g = basepoint();
    let r = secret.to_scalar();
    let ephemeral = g.scalar_mul(&r);
    let shared_input = view_key.scalar_mul(&r);

    let nonce = SecretScalar::random(rng);
    let k = nonce.to_scalar();
    let k1 = g.scalar_mul(&k);
    let k2 = view_key.scalar_mul(&k);

    let c = challenge([g, view_key, &ephemeral, &shared_input, &k1, &k2], order);
    let s = &k + &(&c * &r);

    let statement = DleqStatement {
        view_key: EncodedPoint::encode(view_key, order),
        ephemeral: EncodedPoint::encode(&ephemeral, order),
        shared_input: EncodedPoint::encode(&shared_input, order),
    };
    let proof = DleqProof {
        c: EncodedScalar::encode(&c, order),
        s: EncodedScalar::encode(&s, order),
        k1: EncodedPoint::encode(&k1, order),
        k2: EncodedPoint::encode(&k2, order),
    };
    (statement, proof)
}

fn admit(
    encoded: &EncodedPoint,
    order: ByteOrder,
    role: PointRole,
) -> Result<EdwardsPoint, ProofError> {
    encoded.decode(order).map_err(ProofError::point(role))
}

fn admit_key(
    encoded: &EncodedPoint,
    order: ByteOrder,
    role: PointRole,
) -> Result<EdwardsPoint, ProofError> {
    let point = admit(encoded, order, role)?;
    super::keys::admit_point(&point).map_err(ProofError::point(role))?;
    Ok(point)
}

pub fn verify(
    statement: &DleqStatement,
    proof: &DleqProof,
    order: ByteOrder,
) -> Result<VerifiedDleq, ProofError> {
    let view_key = admit_key(&statement.view_key, order, PointRole::ViewKey)?;
    let ephemeral = admit_key(&statement.ephemeral, order, PointRole::Ephemeral)?;
    let shared_input = admit_key(&statement.shared_input, order, PointRole::SharedInput)?;
    let k1 = admit(&proof.k1, order, PointRole::DleqNonceBase)?;
    let k2 = admit(&proof.k2, order, PointRole::DleqNonceShared)?;

    let c = proof.c.decode(order).map_err(ProofError::InvalidScalar)?;
    let s = proof.s.decode(order).map_err(ProofError::InvalidScalar)?;

    let g = basepoint();
    let expected = challenge([g, &view_key, &ephemeral, &shared_input, &k1, &k2], order);
    if expected != c {
        debug!("DLEQ challenge mismatch");
        return Err(ProofError::DleqChallenge);
    }

    if g.scalar_mul(&s) != k1.add(&ephemeral.scalar_mul(&c)) {
        debug!("DLEQ base equation failed");
        return Err(ProofError::DleqBaseEquation);
    }

    if view_key.scalar_mul(&s) != k2.add(&shared_input.scalar_mul(&c)) {
        debug!("DLEQ shared equation failed");
        return Err(ProofError::DleqSharedEquation);
    }

    Ok(VerifiedDleq {
        view_key,
        ephemeral,
        shared_input,
    })
}
