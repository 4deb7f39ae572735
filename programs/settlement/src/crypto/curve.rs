//! Ed25519 group operations
//!
//! Twisted Edwards form `-x^2 + y^2 = 1 + d*x^2*y^2` over F_p. Points are
//! stored in affine coordinates; addition and scalar multiplication run in
//! projective coordinates and normalize once at the end.
//!
//! ## Admission
//!
//! Every externally supplied point enters through [`EdwardsPoint::from_affine`]
//! or [`EdwardsPoint::decompress`]; both reject off-curve input with
//! `CurveError::PointNotOnCurve` rather than substituting the identity.

use std::sync::OnceLock;

use hex_literal::hex;
use num_bigint::BigUint;

use super::field::{field_prime, FieldElement, Scalar};
use crate::error::CurveError;

/// Edwards d = -121665/121666 (big-endian)
const EDWARDS_D_BE: [u8; 32] =
    hex!("52036cee2b6ffe738cc740797779e89800700a4d4141d8ab75eb4dca135978a3");

/// Base point G (big-endian affine coordinates)
const BASEPOINT_X_BE: [u8; 32] =
    hex!("216936d3cd6e53fec0a4e231fdd6dc5c692cc7609525a7b2c9562d608f25d51a");
const BASEPOINT_Y_BE: [u8; 32] =
    hex!("6666666666666666666666666666666666666666666666666666666666666658");

/// Bit length of the scalar loop; covers every reduced scalar
const SCALAR_BITS: u64 = 256;

fn edwards_d() -> &'static FieldElement {
    static D: OnceLock<FieldElement> = OnceLock::new();
    D.get_or_init(|| FieldElement::from_be_const(&EDWARDS_D_BE))
}

/// The standard Ed25519 generator
pub fn basepoint() -> &'static EdwardsPoint {
    static G: OnceLock<EdwardsPoint> = OnceLock::new();
    G.get_or_init(|| EdwardsPoint {
        x: FieldElement::from_be_const(&BASEPOINT_X_BE),
        y: FieldElement::from_be_const(&BASEPOINT_Y_BE),
    })
}

/// Curve equation check on raw coordinates
pub fn is_on_curve(x: &FieldElement, y: &FieldElement) -> bool {
    let xx = x.square();
    let yy = y.square();
    let lhs = &yy - &xx;
    let rhs = &FieldElement::one() + &(&(edwards_d() * &xx) * &yy);
    lhs == rhs
}

/// Affine point known to satisfy the curve equation
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EdwardsPoint {
    x: FieldElement,
    y: FieldElement,
}

impl EdwardsPoint {
    pub fn identity() -> Self {
        Self {
            x: FieldElement::zero(),
            y: FieldElement::one(),
        }
    }

    pub fn from_affine(x: FieldElement, y: FieldElement) -> Result<Self, CurveError> {
        if !is_on_curve(&x, &y) {
            return Err(CurveError::PointNotOnCurve);
        }
        Ok(Self { x, y })
    }

    pub fn x(&self) -> &FieldElement {
        &self.x
    }

    pub fn y(&self) -> &FieldElement {
        &self.y
    }

    pub fn is_identity(&self) -> bool {
        self.x.is_zero() && self.y == FieldElement::one()
    }

    /// Monero compressed form: little-endian y, sign of x in bit 255
    pub fn compress(&self) -> [u8; 32] {
        let mut bytes = self.y.to_bytes_le();
        if self.x.is_odd() {
            bytes[31] |= 0x80;
        }
        bytes
    }

    pub fn decompress(bytes: &[u8; 32]) -> Result<Self, CurveError> {
        let sign = bytes[31] >> 7 == 1;
        let mut y_bytes = *bytes;
        y_bytes[31] &= 0x7f;

        let y = FieldElement::from_canonical(BigUint::from_bytes_le(&y_bytes))
            .ok_or(CurveError::NonCanonical)?;

        // x^2 = (y^2 - 1) / (d*y^2 + 1)
        let yy = y.square();
        let numerator = &yy - &FieldElement::one();
        let denominator = &(edwards_d() * &yy) + &FieldElement::one();
        let inverse = denominator.invert().ok_or(CurveError::PointNotOnCurve)?;
        let xx = &numerator * &inverse;

        let mut x = xx.sqrt().ok_or(CurveError::PointNotOnCurve)?;
        if x.is_zero() && sign {
            return Err(CurveError::NonCanonical);
        }
        if x.is_odd() != sign {
            x = -&x;
        }

        Self::from_affine(x, y)
    }

    pub fn add(&self, other: &Self) -> Self {
        ProjectivePoint::from(self)
            .add(&ProjectivePoint::from(other))
            .to_affine()
    }

    pub fn double(&self) -> Self {
        self.add(self)
    }

    pub fn negate(&self) -> Self {
        Self {
            x: -&self.x,
            y: self.y.clone(),
        }
    }

    /// `k * self` with a fixed 256-step double-and-add-always ladder
    pub fn scalar_mul(&self, k: &Scalar) -> Self {
        let base = ProjectivePoint::from(self);
        let mut acc = ProjectivePoint::identity();

        for i in (0..SCALAR_BITS).rev() {
            acc = acc.double();
            let sum = acc.add(&base);
            // Both branches are computed every round
            acc = if k.bit(i) { sum } else { acc };
        }

        acc.to_affine()
    }

    pub fn mul_base(k: &Scalar) -> Self {
        basepoint().scalar_mul(k)
    }

    pub fn mul_by_cofactor(&self) -> Self {
        let mut p = ProjectivePoint::from(self);
        for _ in 0..3 {
            p = p.double();
        }
        p.to_affine()
    }

    /// Identity and the other seven torsion points
    pub fn is_small_order(&self) -> bool {
        self.mul_by_cofactor().is_identity()
    }
}

/// Projective (X:Y:Z) with x = X/Z, y = Y/Z
#[derive(Clone, Debug)]
struct ProjectivePoint {
    x: FieldElement,
    y: FieldElement,
    z: FieldElement,
}

impl From<&EdwardsPoint> for ProjectivePoint {
    fn from(p: &EdwardsPoint) -> Self {
        Self {
            x: p.x.clone(),
            y: p.y.clone(),
            z: FieldElement::one(),
        }
    }
}

impl ProjectivePoint {
    fn identity() -> Self {
        Self {
            x: FieldElement::zero(),
            y: FieldElement::one(),
            z: FieldElement::one(),
        }
    }

    /// Unified addition for a = -1 (add-2008-bbjlp); complete on Ed25519
    fn add(&self, other: &Self) -> Self {
        let a = &self.z * &other.z;
        let b = a.square();
        let c = &self.x * &other.x;
        let d = &self.y * &other.y;
        let e = &(edwards_d() * &c) * &d;
        let f = &b - &e;
        let g = &b + &e;

        let cross = &(&self.x + &self.y) * &(&other.x + &other.y);
        let x3 = &(&a * &f) * &(&(&cross - &c) - &d);
        let y3 = &(&a * &g) * &(&d + &c);
        let z3 = &f * &g;

        Self { x: x3, y: y3, z: z3 }
    }

    fn double(&self) -> Self {
        self.add(self)
    }

    fn to_affine(&self) -> EdwardsPoint {
        // Z is never zero under complete addition
        let exponent = field_prime() - 2u8;
        let z_inv = self.z.pow(&exponent);
        EdwardsPoint {
            x: &self.x * &z_inv,
            y: &self.y * &z_inv,
        }
    }
}
