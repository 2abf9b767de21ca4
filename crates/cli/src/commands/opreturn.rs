//! Produce the miner-info OP_RETURN script.

use anyhow::{Context, Result};
use clap::Args;
use minerid_engine::{MinerIdConfig, MinerIdService};
use minerid_storage::Storage;
use std::path::PathBuf;

#[derive(Args)]
pub struct OpreturnArgs {
    /// Identity name
    pub name: String,

    /// Block height the document asserts
    pub height: u64,

    /// Directory to store identity data
    #[arg(short, long, default_value = "./data")]
    pub data_dir: PathBuf,
}

pub fn run(args: OpreturnArgs) -> Result<()> {
    let storage = Storage::open(&args.data_dir)
        .with_context(|| format!("Failed to open storage at {:?}", args.data_dir))?;
    let service = MinerIdService::new(&storage, MinerIdConfig::default());

    let script = service
        .create_miner_info_script(&args.name, args.height)
        .with_context(|| format!("Failed to build script for '{}'", args.name))?;

    println!("{}", hex::encode(script));
    Ok(())
}
