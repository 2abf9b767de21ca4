//! Identity lifecycle orchestration for minerid.
//!
//! This crate brings together the storage layer and the core primitives:
//! signing over chain keys, document construction, the revocation state
//! machine, extension composition, and coinbase2 assembly. The
//! [`MinerIdService`] facade is the main entry point.

pub mod builder;
pub mod coinbase;
pub mod extensions;
pub mod revocation;
pub mod service;
pub mod signer;

use thiserror::Error;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] minerid_storage::StorageError),

    #[error("crypto error: {0}")]
    Crypto(#[from] minerid_core::CryptoError),

    #[error("script error: {0}")]
    Script(#[from] minerid_core::ScriptError),

    #[error("transaction error: {0}")]
    Tx(#[from] minerid_core::TxError),

    #[error("block bind error: {0}")]
    BlockBind(#[from] minerid_core::BlockBindError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed hex input: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("identity already exists: {0}")]
    IdentityExists(String),

    #[error("identity not found: {0}")]
    NotFound(String),

    #[error("protocol already upgraded for {0}")]
    AlreadyUpgraded(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

pub use builder::DocumentBuilder;
pub use coinbase::{CoinbaseAssembler, SignedDocument, COINBASE1_PLACEHOLDER};
pub use extensions::{BlockBindData, ExtensionComposer, ExtensionContext};
pub use revocation::RevocationEngine;
pub use service::{MinerIdConfig, MinerIdService};
pub use signer::{KeyRole, SigningService};
