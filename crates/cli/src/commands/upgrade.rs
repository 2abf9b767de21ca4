//! Upgrade a pre-revocation identity.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use minerid_engine::{MinerIdConfig, MinerIdService};
use minerid_storage::Storage;
use std::path::PathBuf;

#[derive(Args)]
pub struct UpgradeArgs {
    /// Identity name
    pub name: String,

    /// The identity's genesis MinerID public key (compressed hex)
    pub first_miner_id: String,

    /// Directory to store identity data
    #[arg(short, long, default_value = "./data")]
    pub data_dir: PathBuf,
}

pub fn run(args: UpgradeArgs) -> Result<()> {
    let storage = Storage::open(&args.data_dir)
        .with_context(|| format!("Failed to open storage at {:?}", args.data_dir))?;
    let service = MinerIdService::new(&storage, MinerIdConfig::default());

    if !service.can_upgrade_protocol(&args.name)? {
        anyhow::bail!("identity '{}' cannot be upgraded", args.name);
    }
    service
        .upgrade_protocol(&args.name, &args.first_miner_id)
        .with_context(|| format!("Failed to upgrade '{}'", args.name))?;

    println!(
        "{}  Upgraded '{}': revocation key chain created",
        "✓".green().bold(),
        args.name.bright_yellow()
    );
    Ok(())
}
