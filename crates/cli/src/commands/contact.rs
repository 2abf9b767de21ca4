//! Set the miner contact object.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use minerid_engine::{MinerIdConfig, MinerIdService};
use minerid_storage::Storage;
use std::path::PathBuf;

#[derive(Args)]
pub struct ContactArgs {
    /// Identity name
    pub name: String,

    /// Contact data as a JSON object
    pub json: String,

    /// Directory to store identity data
    #[arg(short, long, default_value = "./data")]
    pub data_dir: PathBuf,
}

pub fn run(args: ContactArgs) -> Result<()> {
    let contact: serde_json::Value =
        serde_json::from_str(&args.json).with_context(|| "Contact data is not valid JSON")?;
    if !contact.is_object() {
        anyhow::bail!("contact data must be a JSON object");
    }

    let storage = Storage::open(&args.data_dir)
        .with_context(|| format!("Failed to open storage at {:?}", args.data_dir))?;
    let service = MinerIdService::new(&storage, MinerIdConfig::default());

    service
        .set_miner_contact(&args.name, &contact)
        .with_context(|| format!("Failed to store contact data for '{}'", args.name))?;

    println!(
        "{}  Stored contact data for '{}'",
        "✓".green().bold(),
        args.name.bright_yellow()
    );
    Ok(())
}
