//! Auxiliary per-identity records: the genesis anchor, revocation state,
//! reusable revocation key data, contact info, and the validity-check
//! transaction reference.
//!
//! Absent optional records (contact, vctx) read back as `None`, never as an
//! error.

use crate::db::{Result, Storage, StorageError};
use minerid_core::{RevocationKeyData, RevocationRecord, VctxRef};
use serde_json::Value;

/// Typed accessors for the small per-identity records.
pub struct RecordStore<'a> {
    storage: &'a Storage,
}

impl<'a> RecordStore<'a> {
    /// Create a new RecordStore wrapping the given storage.
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    // =========================================================================
    // Genesis anchor
    // =========================================================================

    /// The identity's recorded genesis MinerID key, if established.
    pub fn first_miner_id(&self, name: &str) -> Result<Option<String>> {
        self.storage.get(Storage::first_miner_id_key(name))
    }

    /// Record the genesis MinerID key. Immutable once written: rewriting the
    /// same value is a no-op, a differing value is rejected.
    pub fn set_first_miner_id(&self, name: &str, key_hex: &str) -> Result<()> {
        if let Some(existing) = self.first_miner_id(name)? {
            if existing != key_hex {
                return Err(StorageError::ImmutableRecord(format!(
                    "first_minerId for {}",
                    name
                )));
            }
            return Ok(());
        }
        self.storage
            .put(Storage::first_miner_id_key(name), &key_hex.to_string())
    }

    // =========================================================================
    // Revocation state
    // =========================================================================

    /// The identity's active revocation record, if any.
    pub fn revocation_record(&self, name: &str) -> Result<Option<RevocationRecord>> {
        self.storage.get(Storage::revocation_record_key(name))
    }

    /// Persist (or overwrite) the revocation record.
    pub fn set_revocation_record(&self, name: &str, record: &RevocationRecord) -> Result<()> {
        self.storage
            .put(Storage::revocation_record_key(name), record)
    }

    /// The precomputed revocation-key document fields, if any.
    pub fn revocation_key_data(&self, name: &str) -> Result<Option<RevocationKeyData>> {
        self.storage.get(Storage::revocation_key_data_key(name))
    }

    /// Persist (or refresh) the precomputed revocation-key document fields.
    pub fn set_revocation_key_data(&self, name: &str, data: &RevocationKeyData) -> Result<()> {
        self.storage
            .put(Storage::revocation_key_data_key(name), data)
    }

    // =========================================================================
    // Optional document inputs
    // =========================================================================

    /// The optional miner contact object.
    pub fn miner_contact(&self, name: &str) -> Result<Option<Value>> {
        match self.storage.get::<_, String>(Storage::contact_key(name))? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Store the miner contact object.
    pub fn set_miner_contact(&self, name: &str, contact: &Value) -> Result<()> {
        let json = serde_json::to_string(contact)?;
        self.storage.put(Storage::contact_key(name), &json)
    }

    /// The optional validity-check transaction reference.
    pub fn vctx(&self, name: &str) -> Result<Option<VctxRef>> {
        self.storage.get(Storage::vctx_key(name))
    }

    /// Store the validity-check transaction reference.
    pub fn set_vctx(&self, name: &str, vctx: &VctxRef) -> Result<()> {
        self.storage.put(Storage::vctx_key(name), vctx)
    }
}
