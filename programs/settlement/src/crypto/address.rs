//! Monero addresses
//!
//! An address is `base58(prefix ‖ spend ‖ view [‖ payment id] ‖ checksum)`
//! where the checksum is the first four bytes of keccak256 over everything
//! before it. Monero's base58 is block-wise: the payload is cut into 8-byte
//! blocks and every block encodes to a fixed width, so the address length
//! depends only on the payload length.
//!
//! Only standard and integrated addresses can receive mint payments. A
//! subaddress payment publishes `R = r*D` rather than `R = r*G`, which the
//! DLEQ statement does not cover.

use serde::{Deserialize, Serialize};

use super::hash::keccak256;
use super::keys::AddressKeys;
use crate::error::AddressError;

const BASE58_ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Encoded length of a block of 0..=8 bytes
const ENCODED_BLOCK_SIZES: [usize; 9] = [0, 2, 3, 5, 6, 7, 9, 10, 11];
const FULL_BLOCK: usize = 8;
const FULL_ENCODED_BLOCK: usize = 11;

const CHECKSUM_BYTES: usize = 4;
const PAYMENT_ID_BYTES: usize = 8;

/// prefix + spend key + view key + checksum
pub const STANDARD_ADDRESS_BYTES: usize = 1 + 32 + 32 + CHECKSUM_BYTES;
pub const INTEGRATED_ADDRESS_BYTES: usize = STANDARD_ADDRESS_BYTES + PAYMENT_ID_BYTES;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Network {
    #[default]
    Mainnet,
    Stagenet,
    Testnet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressKind {
    Standard,
    Integrated,
    Subaddress,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Mainnet, Network::Stagenet, Network::Testnet];

    pub fn prefix(self, kind: AddressKind) -> u8 {
        match (self, kind) {
            (Network::Mainnet, AddressKind::Standard) => 18,
            (Network::Mainnet, AddressKind::Integrated) => 19,
            (Network::Mainnet, AddressKind::Subaddress) => 42,
            (Network::Stagenet, AddressKind::Standard) => 24,
            (Network::Stagenet, AddressKind::Integrated) => 25,
            (Network::Stagenet, AddressKind::Subaddress) => 36,
            (Network::Testnet, AddressKind::Standard) => 53,
            (Network::Testnet, AddressKind::Integrated) => 54,
            (Network::Testnet, AddressKind::Subaddress) => 63,
        }
    }

    pub fn from_prefix(byte: u8) -> Result<(Self, AddressKind), AddressError> {
        let kinds = [AddressKind::Standard, AddressKind::Integrated, AddressKind::Subaddress];
        Self::ALL
            .iter()
            .flat_map(|&network| kinds.map(|kind| (network, kind)))
            .find(|&(network, kind)| network.prefix(kind) == byte)
            .ok_or(AddressError::UnknownPrefix(byte))
    }
}

// ============================================================================
// Base58
// ============================================================================

fn encode_block(block: &[u8], out: &mut String) {
    let mut value = block.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
    let size = ENCODED_BLOCK_SIZES[block.len()];
    let mut digits = vec![BASE58_ALPHABET[0]; size];
    let mut i = size;
    while value > 0 && i > 0 {
        i -= 1;
        digits[i] = BASE58_ALPHABET[(value % 58) as usize];
        value /= 58;
    }
    out.extend(digits.iter().map(|&c| char::from(c)));
}

fn decode_block(block: &[u8], out: &mut Vec<u8>) -> Result<(), AddressError> {
    let width = ENCODED_BLOCK_SIZES
        .iter()
        .position(|&size| size == block.len())
        .ok_or(AddressError::InvalidBlockLength(block.len()))?;

    // 11 digits of base 58 overflow u64
    let mut value: u128 = 0;
    for &c in block {
        let digit = BASE58_ALPHABET
            .iter()
            .position(|&a| a == c)
            .ok_or(AddressError::InvalidCharacter(char::from(c)))?;
        value = value * 58 + digit as u128;
    }
    if value >> (8 * width) != 0 {
        return Err(AddressError::BlockOverflow);
    }
    out.extend_from_slice(&value.to_be_bytes()[16 - width..]);
    Ok(())
}

pub fn base58_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() / FULL_BLOCK * FULL_ENCODED_BLOCK + FULL_ENCODED_BLOCK);
    for block in data.chunks(FULL_BLOCK) {
        encode_block(block, &mut out);
    }
    out
}

pub fn base58_decode(encoded: &str) -> Result<Vec<u8>, AddressError> {
    let mut out = Vec::with_capacity(encoded.len() / FULL_ENCODED_BLOCK * FULL_BLOCK + FULL_BLOCK);
    for block in encoded.as_bytes().chunks(FULL_ENCODED_BLOCK) {
        decode_block(block, &mut out)?;
    }
    Ok(out)
}

// ============================================================================
// Addresses
// ============================================================================

fn encode_payload(prefix: u8, spend_public: &[u8; 32], view_public: &[u8; 32], payment_id: Option<&[u8; 8]>) -> String {
    let mut data = Vec::with_capacity(INTEGRATED_ADDRESS_BYTES);
    data.push(prefix);
    data.extend_from_slice(spend_public);
    data.extend_from_slice(view_public);
    if let Some(id) = payment_id {
        data.extend_from_slice(id);
    }
    let checksum = keccak256(&data);
    data.extend_from_slice(&checksum[..CHECKSUM_BYTES]);
    base58_encode(&data)
}

/// Standard address for a pair of compressed public keys
pub fn encode_address(network: Network, spend_public: &[u8; 32], view_public: &[u8; 32]) -> String {
    encode_payload(network.prefix(AddressKind::Standard), spend_public, view_public, None)
}

/// A decoded address whose keys passed admission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneroAddress {
    pub network: Network,
    pub kind: AddressKind,
    pub keys: AddressKeys,
    /// Present exactly for integrated addresses
    pub payment_id: Option<[u8; 8]>,
}

impl MoneroAddress {
    pub fn encode(&self) -> String {
        encode_payload(
            self.network.prefix(self.kind),
            &self.keys.spend_pubkey,
            &self.keys.view_pubkey,
            self.payment_id.as_ref(),
        )
    }

    /// Keys a sender derives outputs from with `R = r*G`
    pub fn deposit_keys(&self) -> Result<AddressKeys, AddressError> {
        match self.kind {
            AddressKind::Standard | AddressKind::Integrated => Ok(self.keys),
            AddressKind::Subaddress => Err(AddressError::Subaddress),
        }
    }
}

pub fn decode_address(address: &str) -> Result<MoneroAddress, AddressError> {
    let data = base58_decode(address)?;
    if data.len() != STANDARD_ADDRESS_BYTES && data.len() != INTEGRATED_ADDRESS_BYTES {
        return Err(AddressError::InvalidLength(data.len()));
    }
    let (body, checksum) = data.split_at(data.len() - CHECKSUM_BYTES);
    if keccak256(body)[..CHECKSUM_BYTES] != *checksum {
        return Err(AddressError::Checksum);
    }

    let (network, kind) = Network::from_prefix(body[0])?;
    let expected_len = match kind {
        AddressKind::Integrated => INTEGRATED_ADDRESS_BYTES,
        AddressKind::Standard | AddressKind::Subaddress => STANDARD_ADDRESS_BYTES,
    };
    if data.len() != expected_len {
        return Err(AddressError::InvalidLength(data.len()));
    }

    let mut spend_public = [0u8; 32];
    let mut view_public = [0u8; 32];
    spend_public.copy_from_slice(&body[1..33]);
    view_public.copy_from_slice(&body[33..65]);
    let keys = AddressKeys::new(view_public, spend_public).map_err(AddressError::InvalidKey)?;

    let payment_id = match kind {
        AddressKind::Integrated => {
            let mut id = [0u8; PAYMENT_ID_BYTES];
            id.copy_from_slice(&body[65..]);
            Some(id)
        }
        _ => None,
    };

    Ok(MoneroAddress {
        network,
        kind,
        keys,
        payment_id,
    })
}

/// Decode an address that must belong to `network`
pub fn decode_address_on(address: &str, network: Network) -> Result<MoneroAddress, AddressError> {
    let decoded = decode_address(address)?;
    if decoded.network != network {
        return Err(AddressError::WrongNetwork {
            expected: network,
            found: decoded.network,
        });
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::curve::EdwardsPoint;
    use crate::crypto::field::Scalar;
    use crate::error::CurveError;

    fn keys() -> AddressKeys {
        let view = EdwardsPoint::mul_base(&Scalar::from_u64(0xa11ce)).compress();
        let spend = EdwardsPoint::mul_base(&Scalar::from_u64(0xb0b)).compress();
        AddressKeys::new(view, spend).unwrap()
    }

    #[test]
    fn test_standard_address_shape() {
        let keys = keys();
        let mainnet = encode_address(Network::Mainnet, &keys.spend_pubkey, &keys.view_pubkey);
        assert_eq!(mainnet.len(), 95);
        assert!(mainnet.starts_with('4'));

        let stagenet = encode_address(Network::Stagenet, &keys.spend_pubkey, &keys.view_pubkey);
        assert!(stagenet.starts_with('5'));
    }

    #[test]
    fn test_standard_address_decodes_to_keys() {
        let keys = keys();
        let address = encode_address(Network::Testnet, &keys.spend_pubkey, &keys.view_pubkey);
        let decoded = decode_address(&address).unwrap();

        assert_eq!(decoded.network, Network::Testnet);
        assert_eq!(decoded.kind, AddressKind::Standard);
        assert_eq!(decoded.keys, keys);
        assert_eq!(decoded.payment_id, None);
        assert_eq!(decoded.encode(), address);
    }

    #[test]
    fn test_integrated_address_carries_payment_id() {
        let address = MoneroAddress {
            network: Network::Mainnet,
            kind: AddressKind::Integrated,
            keys: keys(),
            payment_id: Some(*b"pay-id-8"),
        };
        let encoded = address.encode();
        assert_eq!(encoded.len(), 106);
        assert_eq!(decode_address(&encoded).unwrap(), address);
        assert_eq!(address.deposit_keys(), Ok(keys()));
    }

    #[test]
    fn test_subaddress_cannot_take_deposits() {
        let address = MoneroAddress {
            network: Network::Mainnet,
            kind: AddressKind::Subaddress,
            keys: keys(),
            payment_id: None,
        };
        let decoded = decode_address(&address.encode()).unwrap();
        assert!(decoded.encode().starts_with('8'));
        assert_eq!(decoded.deposit_keys(), Err(AddressError::Subaddress));
    }

    #[test]
    fn test_wrong_network_rejected() {
        let keys = keys();
        let address = encode_address(Network::Stagenet, &keys.spend_pubkey, &keys.view_pubkey);
        assert_eq!(
            decode_address_on(&address, Network::Mainnet),
            Err(AddressError::WrongNetwork {
                expected: Network::Mainnet,
                found: Network::Stagenet,
            })
        );
        assert!(decode_address_on(&address, Network::Stagenet).is_ok());
    }

    #[test]
    fn test_corrupted_address_rejected() {
        let keys = keys();
        let address = encode_address(Network::Mainnet, &keys.spend_pubkey, &keys.view_pubkey);
        let mut chars: Vec<char> = address.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == '1' { '2' } else { '1' };
        let corrupted: String = chars.into_iter().collect();

        assert!(decode_address(&corrupted).is_err());
        assert_eq!(decode_address("11"), Err(AddressError::InvalidLength(1)));
    }

    #[test]
    fn test_small_order_key_rejected() {
        let keys = keys();
        let identity = EdwardsPoint::identity().compress();
        let address = encode_address(Network::Mainnet, &keys.spend_pubkey, &identity);
        assert_eq!(
            decode_address(&address),
            Err(AddressError::InvalidKey(CurveError::SmallOrder))
        );
    }

    #[test]
    fn test_base58_blocks() {
        assert_eq!(base58_encode(&[]), "");
        assert_eq!(base58_encode(&[0u8; 8]), "11111111111");
        assert_eq!(base58_encode(&[0u8; 1]), "11");
        assert_eq!(base58_decode("11111111111").unwrap(), vec![0u8; 8]);
        assert_eq!(base58_decode("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_base58_rejects_bad_input() {
        assert_eq!(base58_decode("1110000"), Err(AddressError::InvalidCharacter('0')));
        assert_eq!(base58_decode("1111"), Err(AddressError::InvalidBlockLength(4)));
        // 57*58 + 57 does not fit one byte
        assert_eq!(base58_decode("zz"), Err(AddressError::BlockOverflow));
    }
}
