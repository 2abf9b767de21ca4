//! Append-only key chains, one MinerID chain and one revocation chain per
//! identity name.
//!
//! A chain is an arena of key-version records plus a length counter. Version
//! indices are 1-based and contiguous; "current" is the last version,
//! "previous" the one before it (or the current one on a length-1 chain).
//! Private key material never leaves this store except through
//! [`KeyChainStore::signing_key_bytes`], consumed by the signing service.

use crate::db::{Result, Storage, StorageError};
use minerid_core::{Keypair, PublicKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of an identity's two chains to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainKind {
    MinerId,
    RevocationKey,
}

impl ChainKind {
    /// Stable tag used in storage keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainKind::MinerId => "minerid",
            ChainKind::RevocationKey => "revocation",
        }
    }
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One key version as exposed to callers. Carries no private material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyVersion {
    /// 1-based sequence index.
    pub index: u32,
    pub public_key: PublicKey,
}

/// The persisted form of one key version.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeyVersionRecord {
    index: u32,
    public_key: String,
    private_key: [u8; 32],
}

/// Manages the per-identity key chains.
pub struct KeyChainStore<'a> {
    storage: &'a Storage,
}

impl<'a> KeyChainStore<'a> {
    /// Create a new KeyChainStore wrapping the given storage.
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a chain with a freshly generated version 1.
    pub fn create_chain(&self, name: &str, kind: ChainKind) -> Result<u32> {
        let len_key = Storage::chain_len_key(name, kind);
        if self.storage.contains(&len_key)? {
            return Err(StorageError::ChainExists(format!("{}:{}", kind, name)));
        }
        self.write_version(name, kind, 1)?;
        self.storage.put(&len_key, &1u32)?;
        Ok(1)
    }

    /// Append a freshly generated version to an existing chain.
    pub fn append_version(&self, name: &str, kind: ChainKind) -> Result<u32> {
        let len = self.version_count(name, kind)?;
        let new_index = len + 1;
        self.write_version(name, kind, new_index)?;
        self.storage
            .put(Storage::chain_len_key(name, kind), &new_index)?;
        Ok(new_index)
    }

    fn write_version(&self, name: &str, kind: ChainKind, index: u32) -> Result<()> {
        let keypair = Keypair::generate();
        let record = KeyVersionRecord {
            index,
            public_key: keypair.public_key.to_hex(),
            private_key: keypair.private_key(),
        };
        self.storage
            .put(Storage::key_version_key(name, kind, index), &record)
    }

    /// Check whether a chain exists.
    pub fn exists(&self, name: &str, kind: ChainKind) -> Result<bool> {
        self.storage.contains(Storage::chain_len_key(name, kind))
    }

    /// Number of versions in a chain.
    ///
    /// Validates the contiguity invariant: every index from 1 to the counter
    /// must be present.
    pub fn version_count(&self, name: &str, kind: ChainKind) -> Result<u32> {
        let len: u32 = self
            .storage
            .get(Storage::chain_len_key(name, kind))?
            .ok_or_else(|| StorageError::NotFound(format!("chain {}:{}", kind, name)))?;
        if len == 0 {
            return Err(StorageError::CorruptChain {
                name: name.to_string(),
                detail: "empty chain".to_string(),
            });
        }
        for index in 1..=len {
            if !self
                .storage
                .contains(Storage::key_version_key(name, kind, index))?
            {
                return Err(StorageError::CorruptChain {
                    name: name.to_string(),
                    detail: format!("missing version {} of {}", index, len),
                });
            }
        }
        Ok(len)
    }

    fn load_record(&self, name: &str, kind: ChainKind, index: u32) -> Result<KeyVersionRecord> {
        let record: KeyVersionRecord = self
            .storage
            .get(Storage::key_version_key(name, kind, index))?
            .ok_or_else(|| StorageError::NotFound(format!("key {}:{}:{}", kind, name, index)))?;
        Ok(record)
    }

    fn key_version(&self, name: &str, kind: ChainKind, index: u32) -> Result<KeyVersion> {
        let record = self.load_record(name, kind, index)?;
        let public_key =
            PublicKey::from_hex(&record.public_key).map_err(|e| StorageError::CorruptChain {
                name: name.to_string(),
                detail: format!("bad public key at version {}: {}", index, e),
            })?;
        Ok(KeyVersion {
            index: record.index,
            public_key,
        })
    }

    /// The chain's current (latest) key version.
    pub fn current(&self, name: &str, kind: ChainKind) -> Result<KeyVersion> {
        let len = self.version_count(name, kind)?;
        self.key_version(name, kind, len)
    }

    /// The chain's previous key version; on a length-1 chain this is the
    /// current version itself.
    pub fn previous(&self, name: &str, kind: ChainKind) -> Result<KeyVersion> {
        let len = self.version_count(name, kind)?;
        self.key_version(name, kind, len.max(2) - 1)
    }

    /// Raw private key bytes for a version. Only the signing service should
    /// call this; everything else passes payloads to be signed.
    pub fn signing_key_bytes(&self, name: &str, kind: ChainKind, index: u32) -> Result<[u8; 32]> {
        Ok(self.load_record(name, kind, index)?.private_key)
    }
}
