//! Wallet keys for the zeroxmr CLI
//!
//! Keys are generated and used with curve25519-dalek. Every public key and
//! every derived output key is also recomputed with the settlement crate's
//! own curve arithmetic, so a disagreement between the two shows up here
//! rather than as a rejected mint.
//!
//! Security features:
//! - Secrets zeroized on drop
//! - Constant-time comparison of derived output keys
//! - View secret derived from the spend secret (Monero deterministic wallets)

use curve25519_dalek::{
    constants::ED25519_BASEPOINT_POINT,
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use settlement::crypto::hash::{encode_varint, keccak256};
use settlement::crypto::stealth::{amount_key, decrypt_amount};
use settlement::crypto::{EdwardsPoint as LedgerPoint, Scalar as LedgerScalar};

pub use settlement::crypto::address::{decode_address, encode_address, Network};

// ============================================================================
// Zeroizing Secret
// ============================================================================

/// 32 secret bytes, zeroized on drop
#[derive(Clone)]
pub struct SecretBytes {
    bytes: [u8; 32],
}

impl SecretBytes {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    pub fn to_scalar(&self) -> Scalar {
        Scalar::from_bytes_mod_order(self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

// ============================================================================
// Wallet Keys
// ============================================================================

/// Spend and view key pairs of one wallet
///
/// Clone is not derived so secrets are not copied by accident.
pub struct WalletKeys {
    spend_secret: SecretBytes,
    view_secret: SecretBytes,
    pub spend_public: [u8; 32],
    pub view_public: [u8; 32],
}

impl WalletKeys {
    /// Fresh wallet from OS entropy
    pub fn generate() -> Self {
        let mut wide = [0u8; 64];
        rand::rngs::OsRng.fill_bytes(&mut wide);
        let spend = Scalar::from_bytes_mod_order_wide(&wide);
        wide.zeroize();
        Self::from_spend_secret(&spend.to_bytes())
    }

    /// Deterministic wallet: view secret = Hs(spend secret)
    pub fn from_spend_secret(spend_secret: &[u8; 32]) -> Self {
        let spend = Scalar::from_bytes_mod_order(*spend_secret);
        let view = hash_to_scalar(spend.as_bytes());
        Self::from_scalars(&spend, &view)
    }

    pub fn from_secrets(spend_secret: &[u8; 32], view_secret: &[u8; 32]) -> Self {
        Self::from_scalars(
            &Scalar::from_bytes_mod_order(*spend_secret),
            &Scalar::from_bytes_mod_order(*view_secret),
        )
    }

    fn from_scalars(spend: &Scalar, view: &Scalar) -> Self {
        let g = ED25519_BASEPOINT_POINT;
        Self {
            spend_public: (spend * g).compress().to_bytes(),
            view_public: (view * g).compress().to_bytes(),
            spend_secret: SecretBytes::from_bytes(spend.to_bytes()),
            view_secret: SecretBytes::from_bytes(view.to_bytes()),
        }
    }

    pub fn address(&self, network: Network) -> String {
        encode_address(network, &self.spend_public, &self.view_public)
    }

    /// Export secrets as bytes; handle with care
    pub fn export_secrets(&self) -> ([u8; 32], [u8; 32]) {
        (*self.spend_secret.as_bytes(), *self.view_secret.as_bytes())
    }

    pub(crate) fn view_scalar(&self) -> Scalar {
        self.view_secret.to_scalar()
    }

    /// Whether both public keys match the settlement crate's own curve
    pub fn cross_check(&self) -> bool {
        let pairs = [
            (&self.spend_secret, &self.spend_public),
            (&self.view_secret, &self.view_public),
        ];
        pairs.iter().all(|(secret, public)| {
            let scalar = LedgerScalar::from_bytes_mod_order(*secret.as_bytes());
            LedgerPoint::mul_base(&scalar).compress() == **public
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

pub fn random_scalar() -> Scalar {
    let mut wide = [0u8; 64];
    rand::rngs::OsRng.fill_bytes(&mut wide);
    let scalar = Scalar::from_bytes_mod_order_wide(&wide);
    wide.zeroize();
    scalar
}

/// keccak256 reduced mod L
pub fn hash_to_scalar(data: &[u8]) -> Scalar {
    Scalar::from_bytes_mod_order(keccak256(data))
}

pub fn decompress_point(bytes: &[u8; 32]) -> Option<EdwardsPoint> {
    CompressedEdwardsY(*bytes).decompress()
}

/// `Hs(8*rA ‖ varint(index))`
fn derivation(shared_input: &EdwardsPoint, output_index: u64) -> Scalar {
    let mut data = shared_input.mul_by_cofactor().compress().to_bytes().to_vec();
    data.extend_from_slice(&encode_varint(output_index));
    hash_to_scalar(&data)
}

// ============================================================================
// Output Derivation (Sender Side)
// ============================================================================

/// Points of one derived output, all compressed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedOutput {
    pub output_index: u64,
    pub ephemeral: [u8; 32],
    pub shared_input: [u8; 32],
    pub shared_secret: [u8; 32],
    pub output_key: [u8; 32],
    pub amount_key: [u8; 8],
}

/// Derive an output key with dalek and confirm it against the settlement
/// crate's replay of the same derivation
pub fn derive_output(
    view_public: &[u8; 32],
    spend_public: &[u8; 32],
    output_index: u64,
    tx_secret: &SecretBytes,
) -> anyhow::Result<DerivedOutput> {
    let view = decompress_point(view_public).ok_or_else(|| anyhow::anyhow!("view key is not a curve point"))?;
    let spend = decompress_point(spend_public).ok_or_else(|| anyhow::anyhow!("spend key is not a curve point"))?;
    if view.is_small_order() || spend.is_small_order() {
        anyhow::bail!("recipient key has small order");
    }

    let r = tx_secret.to_scalar();
    let shared_input = r * view;
    let hs = derivation(&shared_input, output_index);
    let output_key = (hs * ED25519_BASEPOINT_POINT + spend).compress();

    let ledger_view = LedgerPoint::decompress(view_public)?;
    let ledger_spend = LedgerPoint::decompress(spend_public)?;
    let replayed = settlement::crypto::stealth::StealthOutput::derive(
        &settlement::crypto::SecretScalar::from_bytes(*tx_secret.as_bytes()),
        &ledger_view,
        &ledger_spend,
        output_index,
    );
    if !bool::from(output_key.as_bytes().ct_eq(&replayed.output_key.compress())) {
        anyhow::bail!("output key derivation disagrees with the settlement curve");
    }

    Ok(DerivedOutput {
        output_index,
        ephemeral: (r * ED25519_BASEPOINT_POINT).compress().to_bytes(),
        shared_input: shared_input.compress().to_bytes(),
        shared_secret: shared_input.mul_by_cofactor().compress().to_bytes(),
        output_key: output_key.to_bytes(),
        amount_key: amount_key(&LedgerScalar::from_bytes_mod_order(hs.to_bytes())),
    })
}

// ============================================================================
// Output Scanning (Recipient Side)
// ============================================================================

/// An output found to belong to the wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedOutput {
    pub output_key: [u8; 32],
    pub amount_key: [u8; 8],
    /// Present when the encrypted amount was supplied
    pub amount: Option<u64>,
}

/// Check whether `output_key` at `output_index` of a transaction with
/// ephemeral key `R` pays this wallet
pub fn scan_output(
    keys: &WalletKeys,
    ephemeral: &[u8; 32],
    output_index: u64,
    output_key: &[u8; 32],
    ecdh_amount: Option<&[u8; 8]>,
) -> Option<OwnedOutput> {
    let r_point = decompress_point(ephemeral)?;
    let spend = decompress_point(&keys.spend_public)?;

    // rA = a*R
    let shared_input = keys.view_scalar() * r_point;
    let hs = derivation(&shared_input, output_index);
    let expected = (hs * ED25519_BASEPOINT_POINT + spend).compress().to_bytes();

    if !bool::from(expected.ct_eq(output_key)) {
        return None;
    }
    let key = amount_key(&LedgerScalar::from_bytes_mod_order(hs.to_bytes()));
    Some(OwnedOutput {
        output_key: *output_key,
        amount_key: key,
        amount: ecdh_amount.map(|ecdh| decrypt_amount(ecdh, &key)),
    })
}
