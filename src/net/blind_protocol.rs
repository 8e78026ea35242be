//! Wire state machine for the partial-blind signature protocol.
//!
//! Per connection: `SendPubParams -> AwaitChallenge -> SendResponse ->
//! Closed`. The signer's public params are written eagerly on accept (no
//! request from the client is needed to trigger them).

use std::net::TcpStream;

use rand::rngs::OsRng;
use tracing::{info, warn};

use crate::blind::{self, Challenge, PublicParams, Response, Signature};
use crate::common::Point;
use crate::error::Result;
use crate::keys::{PublicKey, SecretKey};
use crate::net::{read_exact, write_padded_frame};

const PUB_PARAMS_FRAME_LEN: usize = 1028;
const CHALLENGE_FRAME_LEN: usize = 1026;
const RESPONSE_FRAME_LEN: usize = 1024;

/// Server side: services exactly one partial-blind session, bound to
/// `info`, on `stream`.
pub fn handle_connection(mut stream: TcpStream, sk: &SecretKey, info: &[u8]) {
    let mut rng = OsRng;

    let signer_params = blind::signer_setup(&mut rng, info);
    let public_params = signer_params.public();
    if let Err(e) =
        write_padded_frame(&mut stream, &public_params.to_bytes(), PUB_PARAMS_FRAME_LEN)
    {
        warn!(error = %e, "failed to write public params");
        return;
    }
    info!("sent public params, awaiting challenge");

    let mut challenge_frame = [0u8; CHALLENGE_FRAME_LEN];
    if let Err(e) = read_exact(&mut stream, &mut challenge_frame) {
        warn!(error = %e, "failed to read challenge frame");
        return;
    }
    let challenge = match Challenge::from_bytes(&challenge_frame[..Challenge::ENCODED_LEN]) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "malformed challenge");
            return;
        }
    };

    let response = signer_params.respond(challenge.0, sk);
    if let Err(e) = write_padded_frame(&mut stream, &response.to_bytes(), RESPONSE_FRAME_LEN) {
        warn!(error = %e, "failed to write response");
        return;
    }
    info!("session complete");
}

/// Client side: connects to `addr`, runs the user's half of the protocol
/// for `msg` under `info`, and returns the finished, verified signature.
pub fn request_signature(
    addr: &str,
    pk: &PublicKey,
    info: &[u8],
    msg: &[u8],
) -> Result<Option<Signature>> {
    let mut rng = OsRng;
    let mut stream = TcpStream::connect(addr)?;

    let mut pub_params_frame = [0u8; PUB_PARAMS_FRAME_LEN];
    read_exact(&mut stream, &mut pub_params_frame)?;
    let public_params = PublicParams::from_bytes(&pub_params_frame[..2 * Point::ENCODED_LEN])?;

    let (client_state, challenge) =
        blind::client_challenge(&mut rng, pk, info, msg, &public_params);
    write_padded_frame(&mut stream, &challenge.to_bytes(), CHALLENGE_FRAME_LEN)?;

    let mut response_frame = [0u8; RESPONSE_FRAME_LEN];
    read_exact(&mut stream, &mut response_frame)?;
    let response = Response::from_bytes(&response_frame[..Response::ENCODED_LEN])?;

    Ok(blind::client_finalize(pk, &client_state, msg, &response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn end_to_end_over_loopback() {
        let mut rng = rand::thread_rng();
        let sk = SecretKey::generate(&mut rng);
        let pk = sk.public();
        let info = b"a shared blinding tag".to_vec();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server_sk = sk.clone();
        let server_info = info.clone();
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handle_connection(stream, &server_sk, &server_info);
        });

        let msg = b"message to be blindly signed";
        let sig = request_signature(&addr.to_string(), &pk, &info, msg)
            .unwrap()
            .expect("signer response should pass the consistency check");
        assert!(blind::verify(&pk, &sig, &info, msg));
    }
}
