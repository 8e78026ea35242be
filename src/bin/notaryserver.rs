//! Notary server: signs whatever 1024-byte blob a client sends it.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use clap::Parser;
use dedischallenge::keys::SecretKey;
use dedischallenge::net::{notary, spawn_server};

#[derive(Parser)]
#[command(name = "notaryserver")]
struct Cli {
    #[arg(long, default_value_t = 1111)]
    port: u16,

    #[arg(long)]
    keyfile: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let repr: dedischallenge::keys::SecretKeyDiskRepr = serde_json::from_slice(
        &fs::read(&cli.keyfile).with_context(|| format!("reading {}", cli.keyfile.display()))?,
    )?;
    let sk = SecretKey::from_disk_repr(&repr)?;

    tracing::info!(port = cli.port, "notary - listening");
    let (cancel, exit_rx) = spawn_server(cli.port, move |stream| {
        notary::handle_connection(stream, &sk)
    });

    let cancel_for_handler = cancel.clone();
    ctrlc::set_handler(move || {
        cancel_for_handler.store(true, Ordering::SeqCst);
    })
    .context("failed to install SIGINT handler")?;

    exit_rx.recv().context("server thread disappeared")??;
    tracing::info!("exiting server now");
    Ok(())
}
