//! Partial-blind signature client: requests a blind signature over a
//! random 1024-byte blob and checks it.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use dedischallenge::keys::PublicKey;
use dedischallenge::net::blind_protocol;
use rand::RngCore;

#[derive(Parser)]
#[command(name = "partialblindsigclient")]
struct Cli {
    pubkeyfile: PathBuf,
    infofile: PathBuf,
    hostspec: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let contents = fs::read_to_string(&cli.pubkeyfile)
        .with_context(|| format!("reading {}", cli.pubkeyfile.display()))?;
    let pk = PublicKey::from_disk_repr(&contents)?;
    let info =
        fs::read(&cli.infofile).with_context(|| format!("reading {}", cli.infofile.display()))?;

    let mut message = vec![0u8; 1024];
    rand::rngs::OsRng.fill_bytes(&mut message);

    tracing::info!(hostspec = %cli.hostspec, "connecting");
    let sig = blind_protocol::request_signature(&cli.hostspec, &pk, &info, &message)?;

    match sig {
        Some(sig) if dedischallenge::blind::verify(&pk, &sig, &info, &message) => {
            println!("Signature OK - {:?}", sig);
        }
        Some(_) => bail!("signature did not correctly verify"),
        None => bail!("error performing blind signature"),
    }
    Ok(())
}
