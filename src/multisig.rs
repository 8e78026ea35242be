//! Two-round n-of-n Schnorr multi-signature primitives.
//!
//! Round 1: each signer produces a commitment `(v, T = vG)` and publishes
//! `T`. The coordinator sums the published `T`s into `T_hat` and computes
//! the joint challenge `c = H(T_hat, m)`.
//!
//! Round 2: each signer responds with `r_i = v_i - c*x_i`, consuming its
//! commitment so it cannot be reused. The coordinator sums the responses
//! into `r_hat`; `(r_hat, c)` is a valid plain-Schnorr signature under the
//! aggregate public key `Y_hat = sum(Y_i)`.

use rand::{CryptoRng, RngCore};

use crate::common::{Point, Scalar};
use crate::error::{Error, Result};
use crate::hash::h_sig;
use crate::keys::{PublicKey, SecretKey};
use crate::schnorr::Signature;

/// A signer's private round-1 state. Consumed by `respond`, so the type
/// system rules out reusing it across sessions.
pub struct Commitment {
    v: Scalar,
    t: Point,
}

/// The public half of a `Commitment`, as published to the coordinator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PublicCommitment {
    pub t: Point,
}

impl PublicCommitment {
    pub const ENCODED_LEN: usize = Point::ENCODED_LEN;

    pub fn to_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        self.t.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<PublicCommitment> {
        Ok(PublicCommitment {
            t: Point::from_bytes(bytes)?,
        })
    }
}

/// Generates a fresh per-session commitment `(v, T = vG)`.
pub fn generate_commitment<R: RngCore + CryptoRng>(rng: &mut R) -> Commitment {
    let v = Scalar::random(rng);
    let t = Point::mul_base(&v);
    Commitment { v, t }
}

impl Commitment {
    pub fn public(&self) -> PublicCommitment {
        PublicCommitment { t: self.t }
    }

    /// Responds to the joint challenge `c`, consuming this commitment.
    pub fn respond(self, c: Scalar, sk: &SecretKey) -> Scalar {
        self.v - c * *sk.scalar()
    }
}

/// Sums public commitments into the aggregate `T_hat`. Order-independent.
pub fn aggregate_commitments(commitments: &[PublicCommitment]) -> PublicCommitment {
    PublicCommitment {
        t: commitments.iter().map(|c| c.t).sum(),
    }
}

/// Sums member public keys into the joint key `Y_hat = sum(Y_i)`.
/// Order-independent.
pub fn aggregate_public_keys(keys: &[PublicKey]) -> PublicKey {
    let y_hat: Point = keys.iter().map(|k| *k.point()).sum();
    PublicKey::from_aggregate(y_hat)
}

/// Checks that the aggregate key equals `(sum x_i) . G`, recomputed from
/// the member secret keys. Only possible when secret keys are available,
/// i.e. in tests - production coordinators only ever see public keys.
pub fn check_key_aggregation(joint: &PublicKey, members: &[SecretKey]) -> Result<()> {
    let sum_x: Scalar = members.iter().map(|k| *k.scalar()).sum();
    if Point::mul_base(&sum_x) != *joint.point() {
        return Err(Error::KeyAggregationMismatch);
    }
    Ok(())
}

/// The joint challenge `c = H(T_hat, m)`.
pub fn compute_challenge(aggregate_commitment: &PublicCommitment, msg: &[u8]) -> Scalar {
    h_sig(&aggregate_commitment.t, msg)
}

/// Sums per-signer responses into `r_hat`. Order-independent.
pub fn aggregate_responses(responses: &[Scalar]) -> Scalar {
    responses.iter().copied().sum()
}

/// Assembles the final signature `(r_hat, c)`, verifiable with
/// `schnorr::verify` against the joint public key.
pub fn finalize_signature(aggregate_response: Scalar, challenge: Scalar) -> Signature {
    Signature {
        s: aggregate_response,
        e: challenge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schnorr;

    fn run_session(n: usize, msg: &[u8]) -> (PublicKey, Vec<u8>, Signature) {
        let mut rng = rand::thread_rng();
        let secrets: Vec<SecretKey> = (0..n).map(|_| SecretKey::generate(&mut rng)).collect();
        let publics: Vec<PublicKey> = secrets.iter().map(|s| s.public()).collect();
        let joint = aggregate_public_keys(&publics);
        check_key_aggregation(&joint, &secrets).unwrap();

        let commitments: Vec<Commitment> =
            (0..n).map(|_| generate_commitment(&mut rng)).collect();
        let public_commitments: Vec<PublicCommitment> =
            commitments.iter().map(|c| c.public()).collect();
        let aggregate = aggregate_commitments(&public_commitments);
        let c = compute_challenge(&aggregate, msg);

        let responses: Vec<Scalar> = commitments
            .into_iter()
            .zip(secrets.iter())
            .map(|(commitment, sk)| commitment.respond(c, sk))
            .collect();
        let r_hat = aggregate_responses(&responses);
        let sig = finalize_signature(r_hat, c);
        (joint, msg.to_vec(), sig)
    }

    #[test]
    fn two_signers_produce_a_valid_signature() {
        let (joint, msg, sig) = run_session(2, b"randomdata");
        assert!(schnorr::verify(&joint, &msg, &sig));
    }

    #[test]
    fn large_cohorts_still_produce_a_64_byte_signature() {
        for n in [5, 100] {
            let (joint, msg, sig) = run_session(n, b"randomdata");
            assert!(schnorr::verify(&joint, &msg, &sig));
            assert_eq!(sig.to_bytes().len(), Signature::ENCODED_LEN);
        }
    }

    #[test]
    fn aggregation_is_order_independent() {
        let mut rng = rand::thread_rng();
        let secrets: Vec<SecretKey> = (0..4).map(|_| SecretKey::generate(&mut rng)).collect();
        let publics: Vec<PublicKey> = secrets.iter().map(|s| s.public()).collect();

        let forward = aggregate_public_keys(&publics);
        let mut reversed_publics = publics.clone();
        reversed_publics.reverse();
        let backward = aggregate_public_keys(&reversed_publics);

        assert_eq!(forward, backward);
    }
}
