//! Abe's witness-indistinguishable partially-blind Schnorr signature.
//!
//!         Signer(x, Y)                         User(Y, info, msg)
//!         ------------                         ------------------
//! Z := F(info) . G                             Z := F(info) . G   (same)
//! u, s, d <- F
//! A := uG
//! B := sG + dZ
//!                           A, B
//!                         ------->
//!                                              t1, t2, t3, t4 <- F
//!                                              alpha := A + t1 G + t2 Y
//!                                              beta  := B + t3 G + t4 Z
//!                                              eps   := H(alpha, beta, Z, msg)
//!                                              e     := eps - t2 - t4
//!                            e
//!                         <-------
//! c := e - d
//! r := u - cx
//!                          r, c, s, d
//!                         --------->
//!                                              rho   := r + t1
//!                                              omega := c + t2
//!                                              sigma := s + t3
//!                                              delta := d + t4
//!                                              check: H(rho G + omega Y,
//!                                                        sigma G + delta Z,
//!                                                        Z, msg) == omega + delta
//!
//! `info` is seen by the signer; the final `(rho, omega, sigma, delta)` is
//! seen only by the user - the signer cannot link its transcript to the
//! signature it helped produce.

use rand::{CryptoRng, RngCore};

use crate::common::{Point, Scalar};
use crate::error::{Error, Result};
use crate::hash::{generate_z, h_blind_cli, h_blind_ver};
use crate::keys::{PublicKey, SecretKey};

/// The signer's private round-1 state `(u, s, d, Z)`. Consumed by
/// `SignerParams::respond`.
pub struct SignerParams {
    u: Scalar,
    s: Scalar,
    d: Scalar,
    z: Point,
}

/// The public half of `SignerParams`, transmitted to the user: `(A, B)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PublicParams {
    pub a: Point,
    pub b: Point,
}

impl PublicParams {
    pub const ENCODED_LEN: usize = 2 * Point::ENCODED_LEN;

    pub fn to_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[..32].copy_from_slice(&self.a.to_bytes());
        out[32..].copy_from_slice(&self.b.to_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<PublicParams> {
        if bytes.len() != Self::ENCODED_LEN {
            return Err(Error::MalformedEncoding);
        }
        Ok(PublicParams {
            a: Point::from_bytes(&bytes[..32])?,
            b: Point::from_bytes(&bytes[32..])?,
        })
    }
}

/// Generates the signer's private parameters for a session bound to
/// `info`.
pub fn signer_setup<R: RngCore + CryptoRng>(rng: &mut R, info: &[u8]) -> SignerParams {
    let z = generate_z(info);
    let u = Scalar::random(rng);
    let s = Scalar::random(rng);
    let d = Scalar::random(rng);
    SignerParams { u, s, d, z }
}

impl SignerParams {
    pub fn public(&self) -> PublicParams {
        PublicParams {
            a: Point::mul_base(&self.u),
            b: Point::mul_base(&self.s) + self.z * self.d,
        }
    }

    /// Answers the user's challenge, consuming the private parameters: `c =
    /// e - d`, `r = u - cx`.
    pub fn respond(self, e: Scalar, sk: &SecretKey) -> Response {
        let c = e - self.d;
        let r = self.u - c * *sk.scalar();
        Response {
            r,
            c,
            s: self.s,
            d: self.d,
        }
    }
}

/// The user's private round state, kept only by the user.
pub struct ClientState {
    t1: Scalar,
    t2: Scalar,
    t3: Scalar,
    t4: Scalar,
    z: Point,
}

/// The challenge the user sends to the signer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Challenge(pub Scalar);

impl Challenge {
    pub const ENCODED_LEN: usize = Scalar::ENCODED_LEN;

    pub fn to_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        self.0.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Challenge> {
        Ok(Challenge(Scalar::from_bytes(bytes)?))
    }
}

/// The signer's response to a `Challenge`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub r: Scalar,
    pub c: Scalar,
    pub s: Scalar,
    pub d: Scalar,
}

impl Response {
    pub const ENCODED_LEN: usize = 4 * Scalar::ENCODED_LEN;

    pub fn to_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[0..32].copy_from_slice(&self.r.to_bytes());
        out[32..64].copy_from_slice(&self.c.to_bytes());
        out[64..96].copy_from_slice(&self.s.to_bytes());
        out[96..128].copy_from_slice(&self.d.to_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Response> {
        if bytes.len() != Self::ENCODED_LEN {
            return Err(Error::MalformedEncoding);
        }
        Ok(Response {
            r: Scalar::from_bytes(&bytes[0..32])?,
            c: Scalar::from_bytes(&bytes[32..64])?,
            s: Scalar::from_bytes(&bytes[64..96])?,
            d: Scalar::from_bytes(&bytes[96..128])?,
        })
    }
}

/// The finished partial-blind signature `(rho, omega, sigma, delta)`. Never
/// seen by the signer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub rho: Scalar,
    pub omega: Scalar,
    pub sigma: Scalar,
    pub delta: Scalar,
}

/// Begins the user's side of a session: picks the blinding scalars and
/// derives the blinded challenge to send to the signer.
pub fn client_challenge<R: RngCore + CryptoRng>(
    rng: &mut R,
    pk: &PublicKey,
    info: &[u8],
    msg: &[u8],
    signer_params: &PublicParams,
) -> (ClientState, Challenge) {
    let z = generate_z(info);
    let t1 = Scalar::random(rng);
    let t2 = Scalar::random(rng);
    let t3 = Scalar::random(rng);
    let t4 = Scalar::random(rng);

    let alpha = signer_params.a + Point::mul_base(&t1) + *pk.point() * t2;
    let beta = signer_params.b + Point::mul_base(&t3) + z * t4;
    let eps = h_blind_cli(&alpha, &beta, &z, msg);
    let e = eps - t2 - t4;

    (ClientState { t1, t2, t3, t4, z }, Challenge(e))
}

/// Finishes the user's side: unblinds the signer's response and checks
/// consistency before handing back a usable signature. Returns `None` if
/// the signer's response does not check out, matching the source's
/// behaviour of rejecting rather than producing a signature that would
/// fail `verify`.
pub fn client_finalize(
    pk: &PublicKey,
    state: &ClientState,
    msg: &[u8],
    response: &Response,
) -> Option<Signature> {
    let sig = Signature {
        rho: response.r + state.t1,
        omega: response.c + state.t2,
        sigma: response.s + state.t3,
        delta: response.d + state.t4,
    };

    if verify_with_z(pk, &sig, &state.z, msg) {
        Some(sig)
    } else {
        None
    }
}

/// Verifies a finished signature against `pk`, `info`, and `msg`.
pub fn verify(pk: &PublicKey, sig: &Signature, info: &[u8], msg: &[u8]) -> bool {
    let z = generate_z(info);
    verify_with_z(pk, sig, &z, msg)
}

fn verify_with_z(pk: &PublicKey, sig: &Signature, z: &Point, msg: &[u8]) -> bool {
    let p1 = Point::mul_base(&sig.rho) + *pk.point() * sig.omega;
    let p2 = Point::mul_base(&sig.sigma) + *z * sig.delta;
    h_blind_ver(&p1, &p2, z, msg) == sig.omega + sig.delta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_session(info: &[u8], msg: &[u8]) -> (PublicKey, Signature) {
        let mut rng = rand::thread_rng();
        let sk = SecretKey::generate(&mut rng);
        let pk = sk.public();

        let signer_params = signer_setup(&mut rng, info);
        let public_params = signer_params.public();

        let (client_state, challenge) =
            client_challenge(&mut rng, &pk, info, msg, &public_params);
        let response = signer_params.respond(challenge.0, &sk);
        let sig = client_finalize(&pk, &client_state, msg, &response).unwrap();

        (pk, sig)
    }

    #[test]
    fn happy_path_verifies() {
        let (pk, sig) = run_session(b"0123456789abcdef", b"sixteen byte msg");
        assert!(verify(&pk, &sig, b"0123456789abcdef", b"sixteen byte msg"));
    }

    #[test]
    fn wrong_info_fails_verification() {
        let (pk, sig) = run_session(b"0123456789abcdef", b"sixteen byte msg");
        assert!(!verify(&pk, &sig, b"fedcba9876543210", b"sixteen byte msg"));
    }

    #[test]
    fn wrong_message_fails_verification() {
        let (pk, sig) = run_session(b"0123456789abcdef", b"sixteen byte msg");
        assert!(!verify(&pk, &sig, b"0123456789abcdef", b"a different msg"));
    }

    #[test]
    fn signer_never_sees_the_final_signature() {
        // Structural guarantee, not a runtime one: `SignerParams::respond`
        // only ever returns a `Response`, never a `Signature`.
        let mut rng = rand::thread_rng();
        let sk = SecretKey::generate(&mut rng);
        let params = signer_setup(&mut rng, b"info");
        let response: Response = params.respond(Scalar::random(&mut rng), &sk);
        let _ = response;
    }
}
