//! Plain Schnorr signatures: `sign(sk, m) -> (s, e)`, `verify(pk, m, sig)`.
//!
//!         Signer(x, Y)
//!         ------------
//! k <- F
//! R := kG
//! e := H(R || m)
//! s := k - xe
//! return (s, e)
//!
//! Verify(Y, m, (s, e)):
//!   R' := sG + eY
//!   e' := H(R' || m)
//!   return e' == e

use rand::{CryptoRng, RngCore};

use crate::common::{Point, Scalar};
use crate::error::{Error, Result};
use crate::hash::h_sig;
use crate::keys::{PublicKey, SecretKey};

/// A Schnorr signature `(s, e)`. Encodes to 64 bytes: `s || e`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Signature {
    pub s: Scalar,
    pub e: Scalar,
}

impl Signature {
    pub const ENCODED_LEN: usize = 2 * Scalar::ENCODED_LEN;

    pub fn to_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[..32].copy_from_slice(&self.s.to_bytes());
        out[32..].copy_from_slice(&self.e.to_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Signature> {
        if bytes.len() != Self::ENCODED_LEN {
            return Err(Error::MalformedEncoding);
        }
        Ok(Signature {
            s: Scalar::from_bytes(&bytes[..32])?,
            e: Scalar::from_bytes(&bytes[32..])?,
        })
    }
}

/// Signs `msg` under `sk`. Never returns an error: the only way to fail is
/// to draw a zero nonce, which is astronomically unlikely with a CSPRNG and
/// is not specially handled here, matching the source.
pub fn sign<R: RngCore + CryptoRng>(rng: &mut R, sk: &SecretKey, msg: &[u8]) -> Signature {
    let k = Scalar::random(rng);
    let r = Point::mul_base(&k);
    let e = h_sig(&r, msg);
    let s = k - *sk.scalar() * e;
    Signature { s, e }
}

/// Verifies `sig` against `pk` and `msg`. A `false` result is a normal
/// outcome, not a fault - this function never returns an error.
pub fn verify(pk: &PublicKey, msg: &[u8], sig: &Signature) -> bool {
    let r_prime = Point::mul_base(&sig.s) + *pk.point() * sig.e;
    let e_prime = h_sig(&r_prime, msg);
    e_prime == sig.e
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_succeeds() {
        let mut rng = rand::thread_rng();
        let sk = SecretKey::generate(&mut rng);
        let msg = b"This is a test";
        let sig = sign(&mut rng, &sk, msg);
        assert!(verify(&sk.public(), msg, &sig));
    }

    #[test]
    fn verify_rejects_wrong_message() {
        let mut rng = rand::thread_rng();
        let sk = SecretKey::generate(&mut rng);
        let sig = sign(&mut rng, &sk, b"This is a test");
        assert!(!verify(&sk.public(), b"This is a different test", &sig));
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let mut rng = rand::thread_rng();
        let sk = SecretKey::generate(&mut rng);
        let other = SecretKey::generate(&mut rng);
        let msg = b"This is a test";
        let sig = sign(&mut rng, &sk, msg);
        assert!(!verify(&other.public(), msg, &sig));
    }

    #[test]
    fn signature_round_trips() {
        let mut rng = rand::thread_rng();
        let sk = SecretKey::generate(&mut rng);
        let sig = sign(&mut rng, &sk, b"round trip");
        let decoded = Signature::from_bytes(&sig.to_bytes()).unwrap();
        assert_eq!(decoded, sig);
    }
}
