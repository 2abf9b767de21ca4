//! CLI commands module.

use anyhow::Result;
use clap::Subcommand;

mod coinbase2;
mod contact;
mod document;
mod generate;
mod opreturn;
mod revoke;
mod rotate;
mod upgrade;
mod vctx;

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new miner identity
    Generate(generate::GenerateArgs),
    /// Rotate a key chain
    Rotate(rotate::RotateArgs),
    /// Revoke a compromised MinerID
    Revoke(revoke::RevokeArgs),
    /// Upgrade a pre-revocation identity
    Upgrade(upgrade::UpgradeArgs),
    /// Build and sign a miner-info document
    Document(document::DocumentArgs),
    /// Produce the miner-info OP_RETURN script
    Opreturn(opreturn::OpreturnArgs),
    /// Extend a coinbase2 with the miner-info output
    Coinbase2(coinbase2::Coinbase2Args),
    /// Set the miner contact object
    Contact(contact::ContactArgs),
    /// Set the validity-check transaction reference
    Vctx(vctx::VctxArgs),
}

pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Generate(args) => generate::run(args),
        Commands::Rotate(args) => rotate::run(args),
        Commands::Revoke(args) => revoke::run(args),
        Commands::Upgrade(args) => upgrade::run(args),
        Commands::Document(args) => document::run(args),
        Commands::Opreturn(args) => opreturn::run(args),
        Commands::Coinbase2(args) => coinbase2::run(args),
        Commands::Contact(args) => contact::run(args),
        Commands::Vctx(args) => vctx::run(args),
    }
}
