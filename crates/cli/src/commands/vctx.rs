//! Set the validity-check transaction reference.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use minerid_core::VctxRef;
use minerid_engine::{MinerIdConfig, MinerIdService};
use minerid_storage::Storage;
use std::path::PathBuf;

#[derive(Args)]
pub struct VctxArgs {
    /// Identity name
    pub name: String,

    /// Validity-check transaction id (display-order hex)
    pub txid: String,

    /// Output index within the transaction
    pub vout: u32,

    /// Directory to store identity data
    #[arg(short, long, default_value = "./data")]
    pub data_dir: PathBuf,
}

pub fn run(args: VctxArgs) -> Result<()> {
    let decoded = hex::decode(&args.txid).with_context(|| "vctx txid is not valid hex")?;
    if decoded.len() != 32 {
        anyhow::bail!("vctx txid must be 32 bytes, got {}", decoded.len());
    }

    let storage = Storage::open(&args.data_dir)
        .with_context(|| format!("Failed to open storage at {:?}", args.data_dir))?;
    let service = MinerIdService::new(&storage, MinerIdConfig::default());

    service
        .set_vctx(
            &args.name,
            &VctxRef {
                tx_id: args.txid.clone(),
                vout: args.vout,
            },
        )
        .with_context(|| format!("Failed to store vctx for '{}'", args.name))?;

    println!(
        "{}  Stored vctx {}:{} for '{}'",
        "✓".green().bold(),
        args.txid.bright_black(),
        args.vout,
        args.name.bright_yellow()
    );
    Ok(())
}
