//! Extend a coinbase2 with the miner-info output.

use anyhow::{Context, Result};
use clap::Args;
use minerid_engine::{MinerIdConfig, MinerIdService};
use minerid_storage::Storage;
use std::path::PathBuf;

#[derive(Args)]
pub struct Coinbase2Args {
    /// Identity name
    pub name: String,

    /// Block height the document asserts
    pub height: u64,

    /// Previous block hash (display-order hex)
    pub prev_block_hash: String,

    /// Second part of the coinbase split (hex)
    pub coinbase2: String,

    /// Merkle branch (display-order hex); repeat in path order
    #[arg(short, long = "branch")]
    pub branches: Vec<String>,

    /// Directory to store identity data
    #[arg(short, long, default_value = "./data")]
    pub data_dir: PathBuf,
}

pub fn run(args: Coinbase2Args) -> Result<()> {
    let storage = Storage::open(&args.data_dir)
        .with_context(|| format!("Failed to open storage at {:?}", args.data_dir))?;
    let service = MinerIdService::new(&storage, MinerIdConfig::default());

    let extended = service
        .assemble_coinbase2(
            &args.name,
            args.height,
            &args.prev_block_hash,
            &args.branches,
            &args.coinbase2,
        )
        .with_context(|| format!("Failed to assemble coinbase2 for '{}'", args.name))?;

    println!("{}", extended);
    Ok(())
}
