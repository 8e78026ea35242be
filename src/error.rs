//! Crate-wide error type shared by the primitives and the network layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed encoding")]
    MalformedEncoding,

    #[error("stored public key does not match the key derived from the secret scalar")]
    KeyConsistencyMismatch,

    #[error("aggregated public key does not equal the sum of the member public keys")]
    KeyAggregationMismatch,

    #[error("session aborted: peer {peer} failed: {cause}")]
    SessionAborted { peer: usize, cause: String },

    #[error("failed to bind listener: {0}")]
    BindFailed(std::io::Error),

    #[error("accept failed: {0}")]
    AcceptFailed(std::io::Error),

    #[error("port must be in [1024, 65535]")]
    BadBindPort,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
