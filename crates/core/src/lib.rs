//! Core MinerID primitives.
//!
//! This crate provides the fundamental types used throughout the system:
//! - Cryptographic primitives (SHA-256 hashing, secp256k1 signing)
//! - The miner-info document model and canonical JSON form
//! - Protocol OP_RETURN script encoding
//! - Block binding (modified Merkle root)
//! - Coinbase transaction codec

pub mod blockbind;
pub mod crypto;
pub mod document;
pub mod hash;
pub mod script;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use blockbind::{build_block_bind, build_merkle_root, BlockBindError};
pub use crypto::{CryptoError, Keypair, PublicKey, Signature};
pub use document::{
    MinerInfoDocument, NextDocData, RevocationKeyData, RevocationMessage, RevocationMessageSig,
    RevocationRecord, VctxRef, DOCUMENT_VERSION,
};
pub use hash::{sha256, sha256_concat, sha256d, Hash, H256};
pub use script::{ScriptError, PROTOCOL_ID_VERSION, PROTOCOL_NAME};
pub use transaction::{CoinbaseTx, TxError, TxInput, TxOutput};
