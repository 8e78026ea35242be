//! The hash-to-scalar transcript used by every scheme in this crate.
//!
//! A single primitive, `hash_to_scalar`, feeds a caller-ordered
//! concatenation of byte strings through BLAKE2b-512 and reduces the
//! 64-byte digest modulo the scalar field order. The three named
//! transcripts below are thin wrappers that fix the input order for a
//! given protocol step.

use blake2::{digest::Digest, Blake2b};

use crate::common::{Point, Scalar};

/// `H(parts[0] || parts[1] || ... )`, reduced mod the scalar field order.
///
/// Reduction (not truncation) is used so the output is unbiased within
/// cryptographic tolerance: the full 512-bit digest is folded down rather
/// than chopped to 256 bits.
pub fn hash_to_scalar(parts: &[&[u8]]) -> Scalar {
    let mut hasher = Blake2b::default();
    for part in parts {
        hasher.input(part);
    }
    let digest = hasher.result();
    let mut wide = [0u8; 64];
    wide.copy_from_slice(&digest);
    Scalar(curve25519_dalek::scalar::Scalar::from_bytes_mod_order_wide(&wide))
}

/// The plain-Schnorr and multi-signature challenge transcript: `H(R || m)`.
pub fn h_sig(r: &Point, msg: &[u8]) -> Scalar {
    hash_to_scalar(&[&r.to_bytes(), msg])
}

/// The user's blinded-challenge transcript: `H(alpha || beta || Z || m)`.
pub fn h_blind_cli(alpha: &Point, beta: &Point, z: &Point, msg: &[u8]) -> Scalar {
    hash_to_scalar(&[&alpha.to_bytes(), &beta.to_bytes(), &z.to_bytes(), msg])
}

/// The verifier's recomputed-challenge transcript: `H(P1 || P2 || Z || m)`.
///
/// Same shape as `h_blind_cli` under a different name because the two sides
/// of the protocol hash different points into the same slots - see
/// `blind::verify`.
pub fn h_blind_ver(p1: &Point, p2: &Point, z: &Point, msg: &[u8]) -> Scalar {
    hash_to_scalar(&[&p1.to_bytes(), &p2.to_bytes(), &z.to_bytes(), msg])
}

/// Derives the partial-blind tag point `Z = F(info) * G`.
///
/// `F(info)` is itself `hash_to_scalar(info)`, so the discrete log of `Z`
/// relative to `G` is `F(info)` - known to anyone who knows `info`. This is
/// a deliberate deviation from the textbook scheme's requirement that `Z`
/// have unknown discrete log; see the design notes.
pub fn generate_z(info: &[u8]) -> Point {
    let f = hash_to_scalar(&[info]);
    Point::mul_base(&f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_z_is_deterministic() {
        let a = generate_z(b"shared context");
        let b = generate_z(b"shared context");
        assert!(a == b);
    }

    #[test]
    fn generate_z_is_sensitive_to_info() {
        let a = generate_z(b"shared context");
        let b = generate_z(b"different context");
        assert!(a != b);
    }

    #[test]
    fn h_sig_is_sensitive_to_message() {
        let r = Point::generator();
        let e1 = h_sig(&r, b"message one");
        let e2 = h_sig(&r, b"message two");
        assert!(e1 != e2);
    }
}
