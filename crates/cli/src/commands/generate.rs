//! Create a new miner identity.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use minerid_engine::{MinerIdConfig, MinerIdService};
use minerid_storage::Storage;
use std::path::PathBuf;

#[derive(Args)]
pub struct GenerateArgs {
    /// Identity name
    pub name: String,

    /// Directory to store identity data
    #[arg(short, long, default_value = "./data")]
    pub data_dir: PathBuf,
}

pub fn run(args: GenerateArgs) -> Result<()> {
    let storage = Storage::open(&args.data_dir)
        .with_context(|| format!("Failed to open storage at {:?}", args.data_dir))?;
    let service = MinerIdService::new(&storage, MinerIdConfig::default());

    let miner_id = service
        .create_miner_id(&args.name)
        .with_context(|| format!("Failed to create identity '{}'", args.name))?;

    println!("{}", "Created new MinerID:".bold().cyan());
    println!();
    println!("  Name:    {}", args.name.bright_yellow());
    println!("  MinerID: {}", miner_id.to_hex().bright_yellow());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_creates_identity() {
        let dir = tempfile::tempdir().unwrap();
        let args = GenerateArgs {
            name: "alpha".to_string(),
            data_dir: dir.path().to_path_buf(),
        };
        run(args).unwrap();

        let storage = Storage::open(dir.path()).unwrap();
        let keys = minerid_storage::KeyChainStore::new(&storage);
        assert!(keys
            .exists("alpha", minerid_storage::ChainKind::MinerId)
            .unwrap());
    }

    #[test]
    fn test_generate_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let make_args = || GenerateArgs {
            name: "alpha".to_string(),
            data_dir: dir.path().to_path_buf(),
        };
        run(make_args()).unwrap();
        assert!(run(make_args()).is_err());
    }
}
