//! Multi-signature client: drives a full cohort session over a random
//! 1024-byte blob and verifies the resulting joint signature.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use dedischallenge::group_config::GroupConfig;
use dedischallenge::net::multisig_protocol;
use dedischallenge::schnorr;
use rand::RngCore;

#[derive(Parser)]
#[command(name = "sthresholdclient")]
struct Cli {
    groupconfig: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = GroupConfig::read_from_file(&cli.groupconfig)
        .with_context(|| format!("reading {}", cli.groupconfig.display()))?;

    let mut message = vec![0u8; 1024];
    rand::rngs::OsRng.fill_bytes(&mut message);

    tracing::info!(members = config.members.len(), "launching cohort workers");
    let sig = multisig_protocol::run_cohort(&config, &message)?;

    let joint = config.joint_public_key()?;
    if schnorr::verify(&joint, &message, &sig) {
        println!("Signature verified OK!");
    } else {
        bail!("verification of signature failed");
    }
    Ok(())
}
