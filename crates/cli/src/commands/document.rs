//! Build and sign a miner-info document.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use minerid_engine::{MinerIdConfig, MinerIdService};
use minerid_storage::Storage;
use std::path::PathBuf;

#[derive(Args)]
pub struct DocumentArgs {
    /// Identity name
    pub name: String,

    /// Block height the document asserts
    pub height: u64,

    /// Directory to store identity data
    #[arg(short, long, default_value = "./data")]
    pub data_dir: PathBuf,
}

pub fn run(args: DocumentArgs) -> Result<()> {
    let storage = Storage::open(&args.data_dir)
        .with_context(|| format!("Failed to open storage at {:?}", args.data_dir))?;
    let service = MinerIdService::new(&storage, MinerIdConfig::default());

    let signed = service
        .create_miner_info_document(&args.name, args.height)
        .with_context(|| format!("Failed to build document for '{}'", args.name))?;

    println!("{}", "Miner-info document:".bold().cyan());
    println!();
    println!("{}", signed.json);
    println!();
    println!("  Signature: {}", signed.signature.to_hex().bright_black());
    Ok(())
}
