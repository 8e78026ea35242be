//! Notary client: sends a random 1024-byte blob and checks the signature
//! that comes back.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dedischallenge::keys::PublicKey;
use dedischallenge::net::notary::{self, MESSAGE_LEN};
use dedischallenge::schnorr;
use rand::RngCore;

#[derive(Parser)]
#[command(name = "notaryclient")]
struct Cli {
    #[arg(long, default_value = "localhost")]
    host: String,

    #[arg(long, default_value_t = 1111)]
    port: u16,

    #[arg(long)]
    keyfile: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let contents = fs::read_to_string(&cli.keyfile)
        .with_context(|| format!("reading {}", cli.keyfile.display()))?;
    let pk = PublicKey::from_disk_repr(&contents)?;

    let mut message = [0u8; MESSAGE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut message);

    let addr = format!("{}:{}", cli.host, cli.port);
    tracing::info!(%addr, "connecting");
    let sig = notary::request_signature(&addr, &pk, &message)?;

    if schnorr::verify(&pk, &message, &sig) {
        println!("Signature verified OK");
    } else {
        println!("Signature verify FAILED");
    }
    Ok(())
}
