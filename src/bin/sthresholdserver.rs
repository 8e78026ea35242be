//! Multi-signature cohort member: signs its share of a joint signature.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use clap::Parser;
use dedischallenge::keys::{SecretKey, SecretKeyDiskRepr};
use dedischallenge::net::multisig_protocol;
use dedischallenge::net::spawn_server;

#[derive(Parser)]
#[command(name = "sthresholdserver")]
struct Cli {
    #[arg(long, default_value_t = 1111)]
    port: u16,

    #[arg(long)]
    keyfile: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let repr: SecretKeyDiskRepr = serde_json::from_slice(
        &fs::read(&cli.keyfile).with_context(|| format!("reading {}", cli.keyfile.display()))?,
    )?;
    let sk = SecretKey::from_disk_repr(&repr)?;

    tracing::info!(port = cli.port, "sthresholdserver - listening");
    let (cancel, exit_rx) = spawn_server(cli.port, move |stream| {
        multisig_protocol::handle_connection(stream, &sk)
    });

    let cancel_for_handler = cancel.clone();
    ctrlc::set_handler(move || {
        cancel_for_handler.store(true, Ordering::SeqCst);
    })
    .context("failed to install SIGINT handler")?;

    exit_rx.recv().context("server thread disappeared")??;
    Ok(())
}
