//! Byte-order-tagged encodings for points and scalars
//!
//! Every encoded value carries the byte order it was written in, and decodes
//! only against the order the pipeline is configured for. A prover that
//! serializes little-endian against a big-endian verifier fails loudly with
//! `CurveError::EncodingMismatch` instead of hashing the wrong transcript.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use super::curve::EdwardsPoint;
use super::field::{FieldElement, Scalar};
use crate::error::CurveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    #[default]
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    /// Write a field element as 32 bytes in this order
    pub fn write_field(self, value: &FieldElement) -> [u8; 32] {
        match self {
            ByteOrder::BigEndian => value.to_bytes_be(),
            ByteOrder::LittleEndian => value.to_bytes_le(),
        }
    }

    pub fn write_scalar(self, value: &Scalar) -> [u8; 32] {
        let mut bytes = value.to_bytes_le();
        if self == ByteOrder::BigEndian {
            bytes.reverse();
        }
        bytes
    }

    fn read_uint(self, bytes: &[u8; 32]) -> BigUint {
        match self {
            ByteOrder::BigEndian => BigUint::from_bytes_be(bytes),
            ByteOrder::LittleEndian => BigUint::from_bytes_le(bytes),
        }
    }

    fn check(self, expected: ByteOrder) -> Result<(), CurveError> {
        if self != expected {
            return Err(CurveError::EncodingMismatch { expected, found: self });
        }
        Ok(())
    }
}

/// Uncompressed point: x and y, each 32 bytes in `order`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedPoint {
    pub order: ByteOrder,
    pub x: [u8; 32],
    pub y: [u8; 32],
}

impl EncodedPoint {
    pub fn encode(point: &EdwardsPoint, order: ByteOrder) -> Self {
        Self {
            order,
            x: order.write_field(point.x()),
            y: order.write_field(point.y()),
        }
    }

    /// x ‖ y, the 64-byte transcript form
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.x);
        out[32..].copy_from_slice(&self.y);
        out
    }

    pub fn decode(&self, expected: ByteOrder) -> Result<EdwardsPoint, CurveError> {
        self.order.check(expected)?;
        let x = FieldElement::from_canonical(self.order.read_uint(&self.x))
            .ok_or(CurveError::NonCanonical)?;
        let y = FieldElement::from_canonical(self.order.read_uint(&self.y))
            .ok_or(CurveError::NonCanonical)?;
        EdwardsPoint::from_affine(x, y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedScalar {
    pub order: ByteOrder,
    pub bytes: [u8; 32],
}

impl EncodedScalar {
    pub fn encode(scalar: &Scalar, order: ByteOrder) -> Self {
        Self {
            order,
            bytes: order.write_scalar(scalar),
        }
    }

    /// Decodes only reduced scalars
    pub fn decode(&self, expected: ByteOrder) -> Result<Scalar, CurveError> {
        self.order.check(expected)?;
        let mut le = self.bytes;
        if self.order == ByteOrder::BigEndian {
            le.reverse();
        }
        Scalar::from_canonical_bytes(le).ok_or(CurveError::NonCanonicalScalar)
    }
}
