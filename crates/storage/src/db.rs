//! sled database wrapper with serialization helpers.

use crate::keychain::ChainKind;
use sled::Db;
use std::path::Path;
use thiserror::Error;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Corrupt key chain for {name}: {detail}")]
    CorruptChain { name: String, detail: String },

    #[error("Key chain already exists: {0}")]
    ChainExists(String),

    #[error("Record {0} is immutable once written")]
    ImmutableRecord(String),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Wrapper around sled database with serialization helpers.
pub struct Storage {
    db: Db,
}

impl Storage {
    /// Open a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open an in-memory database (for testing).
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Store a serializable value.
    pub fn put<K, V>(&self, key: K, value: &V) -> Result<()>
    where
        K: AsRef<[u8]>,
        V: serde::Serialize,
    {
        let encoded = bincode::serialize(value)?;
        self.db.insert(key, encoded)?;
        Ok(())
    }

    /// Retrieve and deserialize a value.
    pub fn get<K, V>(&self, key: K) -> Result<Option<V>>
    where
        K: AsRef<[u8]>,
        V: serde::de::DeserializeOwned,
    {
        match self.db.get(key)? {
            Some(bytes) => {
                let value = bincode::deserialize(&bytes)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Retrieve a value, returning error if not found.
    pub fn get_or_err<K, V>(&self, key: K) -> Result<V>
    where
        K: AsRef<[u8]> + std::fmt::Debug + Clone,
        V: serde::de::DeserializeOwned,
    {
        self.get(key.clone())?
            .ok_or_else(|| StorageError::NotFound(format!("{:?}", key)))
    }

    /// Delete a key.
    pub fn delete<K: AsRef<[u8]>>(&self, key: K) -> Result<()> {
        self.db.remove(key)?;
        Ok(())
    }

    /// Check if a key exists.
    pub fn contains<K: AsRef<[u8]>>(&self, key: K) -> Result<bool> {
        Ok(self.db.contains_key(key)?)
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    // =========================================================================
    // Key Construction Helpers
    // =========================================================================

    /// Key for a chain's version counter.
    /// Format: "chain:{kind}:{name}:len"
    pub fn chain_len_key(name: &str, kind: ChainKind) -> String {
        format!("chain:{}:{}:len", kind.as_str(), name)
    }

    /// Key for one key version in a chain.
    /// Format: "key:{kind}:{name}:{index}"
    pub fn key_version_key(name: &str, kind: ChainKind, index: u32) -> String {
        format!("key:{}:{}:{}", kind.as_str(), name, index)
    }

    /// Key for the genesis MinerID anchor.
    pub fn first_miner_id_key(name: &str) -> String {
        format!("record:first:{}", name)
    }

    /// Key for the revocation record.
    pub fn revocation_record_key(name: &str) -> String {
        format!("record:revocation:{}", name)
    }

    /// Key for the reusable revocation key data.
    pub fn revocation_key_data_key(name: &str) -> String {
        format!("record:revocation-key-data:{}", name)
    }

    /// Key for the optional miner contact object.
    pub fn contact_key(name: &str) -> String {
        format!("record:contact:{}", name)
    }

    /// Key for the optional validity-check transaction reference.
    pub fn vctx_key(name: &str) -> String {
        format!("record:vctx:{}", name)
    }
}
