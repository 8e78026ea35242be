//! Key-pair and group-config generation.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dedischallenge::group_config::{GroupConfig, Member};
use dedischallenge::keys::{PublicKey, SecretKey};

#[derive(Parser)]
#[command(name = "keytool", about = "Generate Schnorr keys and multi-sig group configs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generates a fresh keypair, writing `<path>.pri` (0600) and `<path>.pub` (0644).
    Genkey { path: PathBuf },

    /// Aggregates a list of member specs (`host:port:pubkeyfile`) into a group config.
    Mkgroup {
        #[arg(required = true)]
        members: Vec<String>,
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Genkey { path } => genkey(&path),
        Command::Mkgroup { members, output } => mkgroup(&members, &output),
    }
}

fn genkey(path: &std::path::Path) -> Result<()> {
    let mut rng = rand::rngs::OsRng;
    let sk = SecretKey::generate(&mut rng);

    let pri_path = path.with_extension("pri");
    let pub_path = path.with_extension("pub");

    let pri_json = serde_json::to_vec_pretty(&sk.to_disk_repr())?;
    fs::write(&pri_path, &pri_json).with_context(|| format!("writing {}", pri_path.display()))?;
    set_permissions(&pri_path, 0o600)?;

    fs::write(&pub_path, sk.public().to_disk_repr())
        .with_context(|| format!("writing {}", pub_path.display()))?;
    set_permissions(&pub_path, 0o644)?;

    tracing::info!(pri = %pri_path.display(), pub_ = %pub_path.display(), "wrote keypair");
    Ok(())
}

fn mkgroup(member_specs: &[String], output: &std::path::Path) -> Result<()> {
    let mut members = Vec::with_capacity(member_specs.len());
    for spec in member_specs {
        let mut parts = spec.splitn(3, ':');
        let host = parts
            .next()
            .with_context(|| format!("missing host in member spec {}", spec))?;
        let port: u16 = parts
            .next()
            .with_context(|| format!("missing port in member spec {}", spec))?
            .parse()
            .with_context(|| format!("invalid port in member spec {}", spec))?;
        let pubkey_path = parts
            .next()
            .with_context(|| format!("missing pubkey file in member spec {}", spec))?;

        let contents = fs::read_to_string(pubkey_path)
            .with_context(|| format!("reading {}", pubkey_path))?;
        let pk = PublicKey::from_disk_repr(&contents)?;
        members.push(Member::new(host, port, &pk));
    }

    let config = GroupConfig::new(members)?;
    config.write_to_file(output)?;
    tracing::info!(output = %output.display(), "wrote group config");
    Ok(())
}

#[cfg(unix)]
fn set_permissions(path: &std::path::Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_permissions(_path: &std::path::Path, _mode: u32) -> Result<()> {
    Ok(())
}
