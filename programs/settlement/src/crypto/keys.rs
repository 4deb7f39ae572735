//! Admission of externally supplied public keys
//!
//! Compressed keys are decompressed with canonicality checks, and every key
//! is rejected if it lies in the torsion subgroup (identity included).

use serde::{Deserialize, Serialize};

use super::curve::EdwardsPoint;
use super::encoding::{ByteOrder, EncodedPoint};
use crate::error::CurveError;

/// Reject the identity and the other small-order points
pub fn admit_point(point: &EdwardsPoint) -> Result<(), CurveError> {
    if point.is_small_order() {
        return Err(CurveError::SmallOrder);
    }
    Ok(())
}

/// Decompress a Monero-encoded key and run [`admit_point`]
pub fn admit_public_key(bytes: &[u8; 32]) -> Result<EdwardsPoint, CurveError> {
    // All-zero bytes decode to a valid torsion point; skip the square root
    if bytes.iter().all(|&b| b == 0) {
        return Err(CurveError::SmallOrder);
    }
    let point = EdwardsPoint::decompress(bytes)?;
    admit_point(&point)?;
    Ok(point)
}

/// Recipient address keys: view key `A = a*G` and spend key `B = b*G`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressKeys {
    pub view_pubkey: [u8; 32],
    pub spend_pubkey: [u8; 32],
}

impl AddressKeys {
    pub fn new(view_pubkey: [u8; 32], spend_pubkey: [u8; 32]) -> Result<Self, CurveError> {
        admit_public_key(&view_pubkey)?;
        admit_public_key(&spend_pubkey)?;
        Ok(Self {
            view_pubkey,
            spend_pubkey,
        })
    }

    /// Spend key followed by view key, the order Monero addresses use
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&self.spend_pubkey);
        bytes[32..].copy_from_slice(&self.view_pubkey);
        bytes
    }

    pub fn from_bytes(bytes: &[u8; 64]) -> Result<Self, CurveError> {
        let mut spend_pubkey = [0u8; 32];
        let mut view_pubkey = [0u8; 32];
        spend_pubkey.copy_from_slice(&bytes[..32]);
        view_pubkey.copy_from_slice(&bytes[32..]);
        Self::new(view_pubkey, spend_pubkey)
    }

    pub fn view_point(&self) -> Result<EdwardsPoint, CurveError> {
        EdwardsPoint::decompress(&self.view_pubkey)
    }

    pub fn spend_point(&self) -> Result<EdwardsPoint, CurveError> {
        EdwardsPoint::decompress(&self.spend_pubkey)
    }

    /// Uncompressed spend key in the pipeline order
    pub fn encoded_spend(&self, order: ByteOrder) -> Result<EncodedPoint, CurveError> {
        Ok(EncodedPoint::encode(&self.spend_point()?, order))
    }
}
