//! Canonical scalar/point newtypes for the `BlakeSHA256Ed25519` suite.
//!
//! A `Scalar` wraps a field element modulo the prime subgroup order; a
//! `Point` wraps a curve point that has been checked to lie in that
//! subgroup. Both encode to a fixed 32-byte little-endian representation.

use curve25519_dalek::{
    constants::ED25519_BASEPOINT_POINT,
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar as ScalarRepr,
    traits::IsIdentity,
};
use rand::{CryptoRng, RngCore};

use crate::error::{Error, Result};

/// Identifies the suite used to produce a given key or signature. Only one
/// variant is registered in the default build; the string form is what
/// travels in the on-disk key format and is checked on decode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SuiteId {
    BlakeSha256Ed25519,
}

impl SuiteId {
    pub const NAME: &'static str = "BlakeSHA256Ed25519";

    pub fn as_str(&self) -> &'static str {
        match self {
            SuiteId::BlakeSha256Ed25519 => Self::NAME,
        }
    }
}

impl std::str::FromStr for SuiteId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            Self::NAME => Ok(SuiteId::BlakeSha256Ed25519),
            _ => Err(Error::MalformedEncoding),
        }
    }
}

impl std::fmt::Display for SuiteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scalar in the prime subgroup field, encoded canonically in 32 bytes.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Scalar(pub ScalarRepr);

impl Scalar {
    pub const ENCODED_LEN: usize = 32;

    /// Draws a uniformly random scalar from the given CSPRNG.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
        Scalar(ScalarRepr::random(rng))
    }

    pub fn zero() -> Scalar {
        Scalar(ScalarRepr::zero())
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Scalar> {
        if bytes.len() != Self::ENCODED_LEN {
            return Err(Error::MalformedEncoding);
        }
        let mut buf = [0u8; 32];
        buf.copy_from_slice(bytes);
        // Reject non-canonical encodings rather than silently reducing them.
        ScalarRepr::from_canonical_bytes(buf)
            .map(Scalar)
            .ok_or(Error::MalformedEncoding)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_hex(s: &str) -> Result<Scalar> {
        let bytes = hex::decode(s).map_err(|_| Error::MalformedEncoding)?;
        Scalar::from_bytes(&bytes)
    }
}

impl std::ops::Add for Scalar {
    type Output = Scalar;
    fn add(self, rhs: Scalar) -> Scalar {
        Scalar(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Scalar {
    type Output = Scalar;
    fn sub(self, rhs: Scalar) -> Scalar {
        Scalar(self.0 - rhs.0)
    }
}

impl std::ops::Mul for Scalar {
    type Output = Scalar;
    fn mul(self, rhs: Scalar) -> Scalar {
        Scalar(self.0 * rhs.0)
    }
}

impl std::iter::Sum for Scalar {
    fn sum<I: Iterator<Item = Scalar>>(iter: I) -> Scalar {
        iter.fold(Scalar::zero(), |acc, x| acc + x)
    }
}

// The secret scalar is the one thing in this crate that must never reach a
// log line or a debug dump.
impl std::fmt::Debug for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Scalar(..)")
    }
}

lazy_static::lazy_static! {
    // Order of the Ed25519 prime-order subgroup, l = 2^252 +
    // 27742317777372353535851937790883648493, as an unreduced scalar bit
    // pattern. Multiplying by it is how a torsion-free check is done in
    // this version of curve25519-dalek, which has no built-in one.
    static ref GROUP_ORDER: ScalarRepr = ScalarRepr::from_bits([
        0xed, 0xd3, 0xf5, 0x5c, 0x1a, 0x63, 0x12, 0x58,
        0xd6, 0x9c, 0xf7, 0xa2, 0xde, 0xf9, 0xde, 0x14,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10,
    ]);
}

/// A group element, guaranteed (on construction via `decode`) to lie in the
/// prime-order subgroup generated by `G`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Point(pub EdwardsPoint);

impl Point {
    pub const ENCODED_LEN: usize = 32;

    pub fn generator() -> Point {
        Point(ED25519_BASEPOINT_POINT)
    }

    pub fn identity() -> Point {
        Point(EdwardsPoint::default())
    }

    pub fn mul_base(scalar: &Scalar) -> Point {
        Point(&scalar.0 * &ED25519_BASEPOINT_POINT)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.compress().to_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Decodes and subgroup-checks a point. Never returns a low-order (twist
    /// or small-subgroup) element: it either yields a genuine prime-order
    /// point or fails with `MalformedEncoding`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Point> {
        if bytes.len() != Self::ENCODED_LEN {
            return Err(Error::MalformedEncoding);
        }
        let mut buf = [0u8; 32];
        buf.copy_from_slice(bytes);
        let point = CompressedEdwardsY(buf)
            .decompress()
            .ok_or(Error::MalformedEncoding)?;
        if !is_torsion_free(&point) {
            return Err(Error::MalformedEncoding);
        }
        Ok(Point(point))
    }

    pub fn from_hex(s: &str) -> Result<Point> {
        let bytes = hex::decode(s).map_err(|_| Error::MalformedEncoding)?;
        Point::from_bytes(&bytes)
    }
}

fn is_torsion_free(point: &EdwardsPoint) -> bool {
    (point * *GROUP_ORDER).is_identity()
}

impl std::ops::Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point(self.0 - rhs.0)
    }
}

impl std::ops::Mul<Scalar> for Point {
    type Output = Point;
    fn mul(self, rhs: Scalar) -> Point {
        Point(self.0 * rhs.0)
    }
}

impl std::iter::Sum for Point {
    fn sum<I: Iterator<Item = Point>>(iter: I) -> Point {
        iter.fold(Point::identity(), |acc, x| acc + x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trip() {
        let mut rng = rand::thread_rng();
        let s = Scalar::random(&mut rng);
        let decoded = Scalar::from_bytes(&s.to_bytes()).unwrap();
        assert!(s == decoded);
    }

    #[test]
    fn point_round_trip() {
        let mut rng = rand::thread_rng();
        let s = Scalar::random(&mut rng);
        let p = Point::mul_base(&s);
        let decoded = Point::from_bytes(&p.to_bytes()).unwrap();
        assert!(p == decoded);
    }

    #[test]
    fn rejects_low_order_point() {
        // A handful of the eight points of order dividing 8 in compressed
        // form; the subgroup check must reject all of them.
        let small_order_compressed: [[u8; 32]; 3] = [
            [
                0x01, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
                0, 0, 0, 0, 0, 0,
            ],
            [
                0x26, 0xe8, 0x95, 0x8f, 0xc2, 0xb2, 0x27, 0xb0, 0x45, 0xc3, 0xf4, 0x89, 0xf2,
                0xef, 0x98, 0xf0, 0xd5, 0xdf, 0xac, 0x05, 0xd3, 0xc6, 0x33, 0x39, 0xb1, 0x38,
                0x02, 0x88, 0x6d, 0x53, 0xfc, 0x05,
            ],
            [
                0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
                0, 0, 0, 0, 0x80,
            ],
        ];
        for bytes in small_order_compressed.iter() {
            match Point::from_bytes(bytes) {
                Err(Error::MalformedEncoding) => {}
                other => panic!("expected MalformedEncoding, got {:?}", other),
            }
        }
    }
}
