//! Partial-blind signer: a signer bound to a fixed `info` blob, servicing
//! one session per connection.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use clap::Parser;
use dedischallenge::keys::{SecretKey, SecretKeyDiskRepr};
use dedischallenge::net::blind_protocol;
use dedischallenge::net::spawn_server;

#[derive(Parser)]
#[command(name = "partialblindsigserver")]
struct Cli {
    #[arg(long, default_value_t = 1111)]
    port: u16,

    #[arg(long)]
    keyfile: PathBuf,

    #[arg(long = "info-file")]
    info_file: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let repr: SecretKeyDiskRepr = serde_json::from_slice(
        &fs::read(&cli.keyfile).with_context(|| format!("reading {}", cli.keyfile.display()))?,
    )?;
    let sk = SecretKey::from_disk_repr(&repr)?;
    let info = fs::read(&cli.info_file)
        .with_context(|| format!("reading {}", cli.info_file.display()))?;

    tracing::info!(port = cli.port, "partialblindsigserver - listening");
    let (cancel, exit_rx) = spawn_server(cli.port, move |stream| {
        blind_protocol::handle_connection(stream, &sk, &info)
    });

    let cancel_for_handler = cancel.clone();
    ctrlc::set_handler(move || {
        cancel_for_handler.store(true, Ordering::SeqCst);
    })
    .context("failed to install SIGINT handler")?;

    exit_rx.recv().context("server thread disappeared")??;
    Ok(())
}
