//! Field and scalar arithmetic for Ed25519
//!
//! Two prime moduli are in play:
//! - p = 2^255 - 19, the base field the curve coordinates live in
//! - L = 2^252 + 27742317777372353535851937790883648493, the prime group order
//!
//! Both are handled with `num-bigint`, replaying the 256-bit modular
//! arithmetic used by the source chain bit for bit. Values are always kept
//! fully reduced.

use std::ops::{Add, Mul, Neg, Sub};
use std::sync::OnceLock;

use hex_literal::hex;
use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

/// p = 2^255 - 19 (big-endian)
const FIELD_PRIME_BE: [u8; 32] =
    hex!("7fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffed");

/// L, the order of the prime-order subgroup (big-endian)
const GROUP_ORDER_BE: [u8; 32] =
    hex!("1000000000000000000000000000000014def9dea2f79cd65812631a5cf5d3ed");

/// sqrt(-1) mod p (big-endian)
const SQRT_M1_BE: [u8; 32] =
    hex!("2b8324804fc1df0b2b4d00993dfbd7a72f431806ad2fe478c4ee1b274a0ea0b0");

pub fn field_prime() -> &'static BigUint {
    static P: OnceLock<BigUint> = OnceLock::new();
    P.get_or_init(|| BigUint::from_bytes_be(&FIELD_PRIME_BE))
}

pub fn group_order() -> &'static BigUint {
    static L: OnceLock<BigUint> = OnceLock::new();
    L.get_or_init(|| BigUint::from_bytes_be(&GROUP_ORDER_BE))
}

fn sqrt_m1() -> &'static FieldElement {
    static I: OnceLock<FieldElement> = OnceLock::new();
    I.get_or_init(|| FieldElement(BigUint::from_bytes_be(&SQRT_M1_BE)))
}

/// Modular inverse for a prime modulus via Fermat's little theorem
///
/// Returns `None` when `value` is congruent to zero.
pub fn mod_inverse(value: &BigUint, modulus: &BigUint) -> Option<BigUint> {
    let reduced = value % modulus;
    if reduced == BigUint::from(0u8) {
        return None;
    }
    let exponent = modulus - 2u8;
    Some(reduced.modpow(&exponent, modulus))
}

/// Square root in F_p
///
/// p = 5 mod 8, so a candidate root is a^((p+3)/8); if its square is -a the
/// root is the candidate times sqrt(-1). Returns `None` for non-residues.
pub fn mod_sqrt(value: &FieldElement) -> Option<FieldElement> {
    let exponent = (field_prime() + 3u8) >> 3;
    let candidate = value.pow(&exponent);
    let square = candidate.square();

    if square == *value {
        Some(candidate)
    } else if square == -value {
        Some(&candidate * sqrt_m1())
    } else {
        None
    }
}

/// Write a reduced integer into a fixed 32-byte little-endian buffer
pub(crate) fn to_fixed_le(value: &BigUint) -> [u8; 32] {
    let bytes = value.to_bytes_le();
    let mut out = [0u8; 32];
    let len = bytes.len().min(32);
    out[..len].copy_from_slice(&bytes[..len]);
    out
}

/// Element of F_p, always reduced
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldElement(BigUint);

impl FieldElement {
    pub fn zero() -> Self {
        Self(BigUint::from(0u8))
    }

    pub fn one() -> Self {
        Self(BigUint::from(1u8))
    }

    pub fn from_u64(value: u64) -> Self {
        Self(BigUint::from(value))
    }

    /// Reduce an arbitrary integer into the field
    pub fn from_uint(value: BigUint) -> Self {
        Self(value % field_prime())
    }

    /// Accept only values already below p
    pub fn from_canonical(value: BigUint) -> Option<Self> {
        if &value < field_prime() {
            Some(Self(value))
        } else {
            None
        }
    }

    pub(crate) fn from_be_const(bytes: &[u8; 32]) -> Self {
        Self::from_uint(BigUint::from_bytes_be(bytes))
    }

    pub fn as_uint(&self) -> &BigUint {
        &self.0
    }

    pub fn to_bytes_le(&self) -> [u8; 32] {
        to_fixed_le(&self.0)
    }

    pub fn to_bytes_be(&self) -> [u8; 32] {
        let mut bytes = self.to_bytes_le();
        bytes.reverse();
        bytes
    }

    pub fn is_zero(&self) -> bool {
        self.0 == BigUint::from(0u8)
    }

    /// Sign bit used by the compressed encoding
    pub fn is_odd(&self) -> bool {
        self.0.bit(0)
    }

    pub fn square(&self) -> Self {
        self * self
    }

    pub fn pow(&self, exponent: &BigUint) -> Self {
        Self(self.0.modpow(exponent, field_prime()))
    }

    pub fn invert(&self) -> Option<Self> {
        mod_inverse(&self.0, field_prime()).map(Self)
    }

    pub fn sqrt(&self) -> Option<Self> {
        mod_sqrt(self)
    }
}

impl Add for &FieldElement {
    type Output = FieldElement;

    fn add(self, rhs: &FieldElement) -> FieldElement {
        FieldElement((&self.0 + &rhs.0) % field_prime())
    }
}

impl Sub for &FieldElement {
    type Output = FieldElement;

    fn sub(self, rhs: &FieldElement) -> FieldElement {
        FieldElement((&self.0 + field_prime() - &rhs.0) % field_prime())
    }
}

impl Mul for &FieldElement {
    type Output = FieldElement;

    fn mul(self, rhs: &FieldElement) -> FieldElement {
        FieldElement((&self.0 * &rhs.0) % field_prime())
    }
}

impl Neg for &FieldElement {
    type Output = FieldElement;

    fn neg(self) -> FieldElement {
        FieldElement((field_prime() - &self.0) % field_prime())
    }
}

/// Element of Z_L, always reduced
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Scalar(BigUint);

impl Scalar {
    pub fn zero() -> Self {
        Self(BigUint::from(0u8))
    }

    pub fn one() -> Self {
        Self(BigUint::from(1u8))
    }

    pub fn from_u64(value: u64) -> Self {
        Self(BigUint::from(value) % group_order())
    }

    pub fn from_uint(value: BigUint) -> Self {
        Self(value % group_order())
    }

    /// Interpret 32 little-endian bytes and reduce mod L (Monero `sc_reduce32`)
    pub fn from_bytes_mod_order(bytes: [u8; 32]) -> Self {
        Self::from_uint(BigUint::from_bytes_le(&bytes))
    }

    /// Accept only little-endian encodings already below L
    pub fn from_canonical_bytes(bytes: [u8; 32]) -> Option<Self> {
        let value = BigUint::from_bytes_le(&bytes);
        if &value < group_order() {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Uniform scalar from 64 bytes of entropy
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut wide = [0u8; 64];
        rng.fill_bytes(&mut wide);
        let scalar = Self::from_uint(BigUint::from_bytes_le(&wide));
        wide.zeroize();
        scalar
    }

    pub fn as_uint(&self) -> &BigUint {
        &self.0
    }

    pub fn to_bytes_le(&self) -> [u8; 32] {
        to_fixed_le(&self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == BigUint::from(0u8)
    }

    /// Bit `index` of the reduced value, least significant first
    pub fn bit(&self, index: u64) -> bool {
        self.0.bit(index)
    }

    pub fn invert(&self) -> Option<Self> {
        mod_inverse(&self.0, group_order()).map(Self)
    }
}

impl Add for &Scalar {
    type Output = Scalar;

    fn add(self, rhs: &Scalar) -> Scalar {
        Scalar((&self.0 + &rhs.0) % group_order())
    }
}

impl Sub for &Scalar {
    type Output = Scalar;

    fn sub(self, rhs: &Scalar) -> Scalar {
        Scalar((&self.0 + group_order() - &rhs.0) % group_order())
    }
}

impl Mul for &Scalar {
    type Output = Scalar;

    fn mul(self, rhs: &Scalar) -> Scalar {
        Scalar((&self.0 * &rhs.0) % group_order())
    }
}

/// Secret scalar held as bytes so it can be wiped on drop
///
/// Arithmetic converts to a [`Scalar`] on demand; the big-integer copy is
/// short-lived and never stored.
#[derive(Clone)]
pub struct SecretScalar {
    bytes: [u8; 32],
}

impl SecretScalar {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self {
            bytes: Scalar::from_bytes_mod_order(bytes).to_bytes_le(),
        }
    }

    pub fn from_scalar(scalar: &Scalar) -> Self {
        Self { bytes: scalar.to_bytes_le() }
    }

    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::from_scalar(&Scalar::random(rng))
    }

    pub fn to_scalar(&self) -> Scalar {
        Scalar::from_bytes_mod_order(self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

impl Drop for SecretScalar {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SecretScalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretScalar").finish_non_exhaustive()
    }
}
