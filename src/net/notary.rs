//! The notary protocol: one exchange per connection. The client sends 1024
//! bytes; the server replies with a 64-byte Schnorr signature over them.

use std::io::{Read, Write};
use std::net::TcpStream;

use rand::rngs::OsRng;
use tracing::{info, warn};

use crate::error::Result;
use crate::keys::{PublicKey, SecretKey};
use crate::schnorr::{self, Signature};

pub const MESSAGE_LEN: usize = 1024;

/// Server-side handler: reads exactly 1024 bytes, signs them under `sk`,
/// writes back the 64-byte signature. Any I/O failure just closes the
/// connection - there is no response to send an error back with.
pub fn handle_connection(mut stream: TcpStream, sk: &SecretKey) {
    let mut message = [0u8; MESSAGE_LEN];
    if let Err(e) = stream.read_exact(&mut message) {
        warn!(error = %e, "failed to read notary request");
        return;
    }

    let mut rng = OsRng;
    let sig = schnorr::sign(&mut rng, sk, &message);

    if let Err(e) = stream.write_all(&sig.to_bytes()) {
        warn!(error = %e, "failed to write notary response");
        return;
    }
    info!("signed and responded to message");
}

/// Client side: connects to `addr`, sends `message` (must be exactly 1024
/// bytes), and returns the verified signature.
pub fn request_signature(
    addr: &str,
    pk: &PublicKey,
    message: &[u8; MESSAGE_LEN],
) -> Result<Signature> {
    let mut stream = TcpStream::connect(addr)?;
    stream.write_all(message)?;

    let mut buf = [0u8; Signature::ENCODED_LEN];
    stream.read_exact(&mut buf)?;
    let sig = Signature::from_bytes(&buf)?;

    if !schnorr::verify(pk, message, &sig) {
        warn!("notary signature failed to verify");
    }
    Ok(sig)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn end_to_end_over_loopback() {
        let mut rng = rand::thread_rng();
        let sk = SecretKey::generate(&mut rng);
        let pk = sk.public();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let stopped = Arc::new(AtomicBool::new(false));
        let stopped_server = stopped.clone();

        let server_sk = sk.clone();
        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handle_connection(stream, &server_sk);
            stopped_server.store(true, Ordering::SeqCst);
        });

        let message = [7u8; MESSAGE_LEN];
        let sig = request_signature(&addr.to_string(), &pk, &message).unwrap();
        assert!(schnorr::verify(&pk, &message, &sig));

        server.join().unwrap();
        assert!(stopped.load(Ordering::SeqCst));
    }
}
