//! Wire state machine for the n-of-n threshold multi-signature protocol.
//!
//! Per connection the signer moves `AwaitMessage -> AwaitCommitment ->
//! Closed`. Frames are tag-prefixed and fixed-size: a 1026-byte frame
//! (2-byte header + 1024-byte payload) going to the signer in both rounds,
//! and a 1024-byte unframed reply coming back in each.

use std::net::TcpStream;
use std::sync::mpsc::{sync_channel, Receiver, Sender};

use rand::rngs::OsRng;
use tracing::{info, warn};

use crate::common::Point;
use crate::error::{Error, Result};
use crate::group_config::GroupConfig;
use crate::keys::SecretKey;
use crate::multisig::{
    self, aggregate_commitments, aggregate_responses, compute_challenge, finalize_signature,
    PublicCommitment,
};
use crate::net::{
    read_exact, write_padded_frame, write_tagged_frame, TAG_COMMITMENT, TAG_MESSAGE,
};
use crate::schnorr::Signature;

const READ_FRAME_LEN: usize = 1026;
const REPLY_FRAME_LEN: usize = 1024;

/// Server side: services exactly one multi-sig session on `stream`.
pub fn handle_connection(mut stream: TcpStream, sk: &SecretKey) {
    let mut rng = OsRng;

    let msg = match await_tagged_payload(&mut stream, TAG_MESSAGE) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "failed to read MESSAGE frame");
            return;
        }
    };

    let commitment = multisig::generate_commitment(&mut rng);
    let public_commitment = commitment.public();
    if let Err(e) = write_padded_frame(&mut stream, &public_commitment.to_bytes(), REPLY_FRAME_LEN)
    {
        warn!(error = %e, "failed to write commitment reply");
        return;
    }
    info!("sent public commitment, awaiting aggregate");

    let agg_bytes = match await_tagged_payload(&mut stream, TAG_COMMITMENT) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "failed to read COMMITMENT frame");
            return;
        }
    };
    let aggregate = match PublicCommitment::from_bytes(&agg_bytes[..Point::ENCODED_LEN]) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "malformed aggregate commitment");
            return;
        }
    };

    let c = compute_challenge(&aggregate, &msg);
    let r = commitment.respond(c, sk);
    if let Err(e) = write_padded_frame(&mut stream, &r.to_bytes(), REPLY_FRAME_LEN) {
        warn!(error = %e, "failed to write response reply");
        return;
    }
    info!("session complete");
}

/// Reads framed messages until one carries `expected_tag`, silently
/// discarding any other tag - matching the source's "ignore and keep
/// waiting" transition rule rather than treating it as a protocol error.
fn await_tagged_payload(stream: &mut TcpStream, expected_tag: u8) -> Result<Vec<u8>> {
    loop {
        let mut frame = [0u8; READ_FRAME_LEN];
        read_exact(stream, &mut frame)?;
        if frame[0] == expected_tag {
            return Ok(frame[2..].to_vec());
        }
    }
}

/// One cohort member's report back to the coordinator: which member, and
/// the raw payload bytes read from the wire.
struct MemberReport {
    index: usize,
    payload: Vec<u8>,
}

/// Client-side worker: dials one cohort member, drives its half of the
/// state machine, and reports back through `report_tx` twice (once per
/// round), waiting on `agg_rx` for the coordinator's barrier in between.
fn worker(
    index: usize,
    host: String,
    port: u16,
    msg: Vec<u8>,
    report_tx: Sender<MemberReport>,
    agg_rx: Receiver<Vec<u8>>,
) -> Result<()> {
    let hostspec = format!("{}:{}", host, port);
    let mut stream = TcpStream::connect(&hostspec)?;

    write_tagged_frame(&mut stream, TAG_MESSAGE, &msg, REPLY_FRAME_LEN)?;

    let mut commit_buf = [0u8; REPLY_FRAME_LEN];
    read_exact(&mut stream, &mut commit_buf)?;
    report_tx
        .send(MemberReport {
            index,
            payload: commit_buf.to_vec(),
        })
        .map_err(|_| Error::SessionAborted {
            peer: index,
            cause: "coordinator channel closed".into(),
        })?;

    let aggregate_bytes = agg_rx.recv().map_err(|_| Error::SessionAborted {
        peer: index,
        cause: "sync channel closed".into(),
    })?;

    write_tagged_frame(&mut stream, TAG_COMMITMENT, &aggregate_bytes, REPLY_FRAME_LEN)?;

    let mut resp_buf = [0u8; REPLY_FRAME_LEN];
    read_exact(&mut stream, &mut resp_buf)?;
    report_tx
        .send(MemberReport {
            index,
            payload: resp_buf.to_vec(),
        })
        .map_err(|_| Error::SessionAborted {
            peer: index,
            cause: "coordinator channel closed".into(),
        })?;

    Ok(())
}

/// Coordinates a full multi-sig session across every member of `config`,
/// producing a signature over `msg` verifiable under the joint key.
///
/// Spawns one worker thread per member, collects their round-1 public
/// commitments over a shared report channel, then hands each worker the
/// aggregate commitment back over its own unbuffered rendez-vous channel -
/// the barrier between round 1 and round 2 the design calls for.
pub fn run_cohort(config: &GroupConfig, msg: &[u8]) -> Result<Signature> {
    let n = config.members.len();
    let (report_tx, report_rx): (Sender<MemberReport>, Receiver<MemberReport>) =
        std::sync::mpsc::channel();
    let mut agg_txs = Vec::with_capacity(n);
    let mut handles = Vec::with_capacity(n);

    for (i, member) in config.members.iter().enumerate() {
        let (agg_tx, agg_rx) = sync_channel::<Vec<u8>>(0);
        agg_txs.push(agg_tx);
        let report_tx = report_tx.clone();
        let host = member.host_name.clone();
        let port = member.port;
        let msg = msg.to_vec();
        handles.push(std::thread::spawn(move || {
            worker(i, host, port, msg, report_tx, agg_rx)
        }));
    }
    drop(report_tx);

    let mut commitments: Vec<Option<PublicCommitment>> = vec![None; n];
    let mut received = 0;
    while received < n {
        let report = report_rx.recv().map_err(|_| Error::SessionAborted {
            peer: usize::MAX,
            cause: "all workers disconnected before round 1 completed".into(),
        })?;
        let commitment = PublicCommitment::from_bytes(&report.payload[..Point::ENCODED_LEN])
            .map_err(|e| Error::SessionAborted {
                peer: report.index,
                cause: e.to_string(),
            })?;
        commitments[report.index] = Some(commitment);
        received += 1;
    }
    let commitments: Vec<PublicCommitment> = commitments.into_iter().flatten().collect();

    let aggregate = aggregate_commitments(&commitments);
    let challenge = compute_challenge(&aggregate, msg);
    for tx in &agg_txs {
        tx.send(aggregate.to_bytes().to_vec())
            .map_err(|_| Error::SessionAborted {
                peer: usize::MAX,
                cause: "a worker disappeared before the round-2 barrier".into(),
            })?;
    }

    let mut responses: Vec<Option<crate::common::Scalar>> = vec![None; n];
    let mut received = 0;
    while received < n {
        let report = report_rx.recv().map_err(|_| Error::SessionAborted {
            peer: usize::MAX,
            cause: "all workers disconnected before round 2 completed".into(),
        })?;
        let response = crate::common::Scalar::from_bytes(
            &report.payload[..crate::common::Scalar::ENCODED_LEN],
        )
        .map_err(|e| Error::SessionAborted {
            peer: report.index,
            cause: e.to_string(),
        })?;
        responses[report.index] = Some(response);
        received += 1;
    }
    let responses: Vec<crate::common::Scalar> = responses.into_iter().flatten().collect();

    for handle in handles {
        let _ = handle.join();
    }

    let r_hat = aggregate_responses(&responses);
    Ok(finalize_signature(r_hat, challenge))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group_config::Member;
    use crate::keys::PublicKey;
    use crate::multisig::aggregate_public_keys;
    use crate::schnorr;
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn spawn_signer(sk: SecretKey) -> (u16, Arc<AtomicBool>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let stopped = Arc::new(AtomicBool::new(false));
        let stopped_clone = stopped.clone();
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handle_connection(stream, &sk);
            stopped_clone.store(true, Ordering::SeqCst);
        });
        (port, stopped)
    }

    #[test]
    fn three_signer_cohort_produces_a_verifiable_signature() {
        let mut rng = rand::thread_rng();
        let secrets: Vec<SecretKey> = (0..3).map(|_| SecretKey::generate(&mut rng)).collect();
        let publics: Vec<PublicKey> = secrets.iter().map(|s| s.public()).collect();

        let mut members = Vec::new();
        let mut flags = Vec::new();
        for sk in secrets.iter() {
            let (port, stopped) = spawn_signer(sk.clone());
            members.push(Member::new("127.0.0.1", port, &sk.public()));
            flags.push(stopped);
        }

        let config = GroupConfig::new(members).unwrap();
        let msg = vec![9u8; 1024];
        let sig = run_cohort(&config, &msg).unwrap();

        let joint = aggregate_public_keys(&publics);
        assert!(schnorr::verify(&joint, &msg, &sig));
        for flag in flags {
            assert!(flag.load(Ordering::SeqCst));
        }
    }
}
