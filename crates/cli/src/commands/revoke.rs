//! Revoke a compromised MinerID.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use minerid_engine::{MinerIdConfig, MinerIdService};
use minerid_storage::Storage;
use std::path::PathBuf;

#[derive(Args)]
pub struct RevokeArgs {
    /// Identity name
    pub name: String,

    /// Compromised MinerID public key (compressed hex)
    pub compromised_key: String,

    /// Complete revocation (back to the genesis key) instead of partial
    #[arg(long)]
    pub complete: bool,

    /// Directory to store identity data
    #[arg(short, long, default_value = "./data")]
    pub data_dir: PathBuf,
}

pub fn run(args: RevokeArgs) -> Result<()> {
    let storage = Storage::open(&args.data_dir)
        .with_context(|| format!("Failed to open storage at {:?}", args.data_dir))?;
    let service = MinerIdService::new(&storage, MinerIdConfig::default());

    let mode = if args.complete { "complete" } else { "partial" };
    let revoked = service
        .revoke(&args.name, &args.compromised_key, args.complete)
        .with_context(|| format!("Failed to revoke '{}'", args.name))?;

    if revoked {
        println!(
            "{}  {} revocation of '{}' recorded",
            "✓".green().bold(),
            mode,
            args.name.bright_yellow()
        );
    } else {
        println!(
            "{}  {} revocation refused: precondition not met",
            "✗".yellow().bold(),
            mode
        );
    }
    Ok(())
}
