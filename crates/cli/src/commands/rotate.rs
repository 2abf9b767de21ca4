//! Rotate a key chain.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use minerid_engine::{MinerIdConfig, MinerIdService};
use minerid_storage::{ChainKind, Storage};
use std::path::PathBuf;

#[derive(Args)]
pub struct RotateArgs {
    /// Identity name
    pub name: String,

    /// Rotate the revocation key chain instead of the MinerID chain
    #[arg(long)]
    pub revocation: bool,

    /// Directory to store identity data
    #[arg(short, long, default_value = "./data")]
    pub data_dir: PathBuf,
}

pub fn run(args: RotateArgs) -> Result<()> {
    let storage = Storage::open(&args.data_dir)
        .with_context(|| format!("Failed to open storage at {:?}", args.data_dir))?;
    let service = MinerIdService::new(&storage, MinerIdConfig::default());

    let kind = if args.revocation {
        ChainKind::RevocationKey
    } else {
        ChainKind::MinerId
    };
    let version = service
        .rotate(&args.name, kind)
        .with_context(|| format!("Failed to rotate {} chain for '{}'", kind, args.name))?;

    println!(
        "{}  Rotated {} chain of '{}' to version {}",
        "✓".green().bold(),
        kind,
        args.name.bright_yellow(),
        version.to_string().bright_cyan()
    );
    Ok(())
}
