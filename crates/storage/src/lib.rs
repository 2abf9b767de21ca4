//! Persistent storage layer for minerid.
//!
//! Two stores over one sled database:
//! - [`KeyChainStore`]: the per-identity MinerID and revocation key chains
//! - [`RecordStore`]: the small auxiliary records (genesis anchor, revocation
//!   state, contact data, vctx reference)

pub mod db;
pub mod keychain;
pub mod records;

pub use db::{Result, Storage, StorageError};
pub use keychain::{ChainKind, KeyChainStore, KeyVersion};
pub use records::RecordStore;
