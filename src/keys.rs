//! Key-pair generation and the canonical on-disk key formats.

use std::str::FromStr;

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::common::{Point, Scalar, SuiteId};
use crate::error::{Error, Result};

/// A secret key: `x` never leaves this record except to be consumed by a
/// signing operation. `Debug` redacts it; it is never logged.
#[derive(Clone)]
pub struct SecretKey {
    suite: SuiteId,
    x: Scalar,
    y: Point,
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("suite", &self.suite)
            .field("x", &"..")
            .field("y", &self.y)
            .finish()
    }
}

/// A public key: `Y`, checked on construction/decode to lie in the
/// prime-order subgroup.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    suite: SuiteId,
    y: Point,
}

impl SecretKey {
    /// Generates a fresh keypair: `x <- F`, `Y = x . G`.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> SecretKey {
        let x = Scalar::random(rng);
        let y = Point::mul_base(&x);
        SecretKey {
            suite: SuiteId::BlakeSha256Ed25519,
            x,
            y,
        }
    }

    pub fn scalar(&self) -> &Scalar {
        &self.x
    }

    pub fn public_point(&self) -> &Point {
        &self.y
    }

    pub fn public(&self) -> PublicKey {
        PublicKey {
            suite: self.suite,
            y: self.y,
        }
    }

    /// Serialises to the on-disk record: `{suite, s: hex, p: hex}`.
    pub fn to_disk_repr(&self) -> SecretKeyDiskRepr {
        SecretKeyDiskRepr {
            suite: self.suite.to_string(),
            s: self.x.to_hex(),
            p: self.y.to_hex(),
        }
    }

    /// Parses the on-disk record, recomputing `P = s . G` and rejecting the
    /// record if the stored `P` disagrees - a hardening check absent from
    /// the source this crate was ported from.
    pub fn from_disk_repr(repr: &SecretKeyDiskRepr) -> Result<SecretKey> {
        let suite = SuiteId::from_str(&repr.suite)?;
        let x = Scalar::from_hex(&repr.s)?;
        let stored_y = Point::from_hex(&repr.p)?;
        let derived_y = Point::mul_base(&x);
        if stored_y != derived_y {
            return Err(Error::KeyConsistencyMismatch);
        }
        Ok(SecretKey {
            suite,
            x,
            y: derived_y,
        })
    }
}

impl PublicKey {
    /// Builds a public key directly from a point, used for the joint key
    /// produced by summing a cohort's individual public keys - there is no
    /// single secret scalar behind it.
    pub fn from_aggregate(y: Point) -> PublicKey {
        PublicKey {
            suite: SuiteId::BlakeSha256Ed25519,
            y,
        }
    }

    pub fn point(&self) -> &Point {
        &self.y
    }

    pub fn suite(&self) -> SuiteId {
        self.suite
    }

    /// Serialises to the single-line on-disk form `<suite>;<hex-point>`.
    pub fn to_disk_repr(&self) -> String {
        format!("{};{}", self.suite, self.y.to_hex())
    }

    pub fn from_disk_repr(s: &str) -> Result<PublicKey> {
        let mut parts = s.trim().splitn(2, ';');
        let suite = parts.next().ok_or(Error::MalformedEncoding)?;
        let point = parts.next().ok_or(Error::MalformedEncoding)?;
        Ok(PublicKey {
            suite: SuiteId::from_str(suite)?,
            y: Point::from_hex(point)?,
        })
    }
}

/// The structured JSON shape of a secret key on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretKeyDiskRepr {
    #[serde(rename = "Suite")]
    pub suite: String,
    #[serde(rename = "S")]
    pub s: String,
    #[serde(rename = "P")]
    pub p: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_key_disk_round_trip() {
        let mut rng = rand::thread_rng();
        let sk = SecretKey::generate(&mut rng);
        let repr = sk.to_disk_repr();
        let decoded = SecretKey::from_disk_repr(&repr).unwrap();
        assert!(decoded.x == sk.x);
        assert!(decoded.y == sk.y);
    }

    #[test]
    fn public_key_disk_round_trip() {
        let mut rng = rand::thread_rng();
        let sk = SecretKey::generate(&mut rng);
        let pk = sk.public();
        let line = pk.to_disk_repr();
        let decoded = PublicKey::from_disk_repr(&line).unwrap();
        assert_eq!(decoded, pk);
    }

    #[test]
    fn tampered_secret_key_is_rejected() {
        let mut rng = rand::thread_rng();
        let sk = SecretKey::generate(&mut rng);
        let mut repr = sk.to_disk_repr();
        let other = SecretKey::generate(&mut rng);
        repr.p = other.public().point().to_hex();
        match SecretKey::from_disk_repr(&repr) {
            Err(Error::KeyConsistencyMismatch) => {}
            other => panic!("expected KeyConsistencyMismatch, got {:?}", other),
        }
    }
}
