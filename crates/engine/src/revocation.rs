//! The revocation state machine.
//!
//! Two modes, each with its own precondition:
//! - complete: the compromised key must equal the identity's recorded genesis
//!   key; the next document collapses to a self-referential link.
//! - partial: the chain must have rotated at least once and the compromised
//!   key must equal the current key; the previous key remains the signer of
//!   provenance.
//!
//! Precondition failures are reported as `Ok(false)` so callers can branch on
//! the business outcome; only unknown identities and infrastructure faults
//! are hard errors. The mode split (partial targets the current key, complete
//! the genesis key) is a fixed protocol contract.

use crate::signer::{key_link_payload, KeyRole, SigningService};
use crate::{EngineError, Result};
use minerid_core::{
    sha256, NextDocData, PublicKey, RevocationMessage, RevocationMessageSig, RevocationRecord,
};
use minerid_storage::{ChainKind, KeyChainStore, RecordStore, Storage};
use tracing::{info, warn};

/// Executes revocations and persists the resulting record.
pub struct RevocationEngine<'a> {
    keys: KeyChainStore<'a>,
    records: RecordStore<'a>,
    signer: SigningService<'a>,
}

impl<'a> RevocationEngine<'a> {
    /// Create a new RevocationEngine over the given storage.
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            keys: KeyChainStore::new(storage),
            records: RecordStore::new(storage),
            signer: SigningService::new(storage),
        }
    }

    /// Revoke `compromised_miner_id` for `name`.
    ///
    /// Returns `Ok(true)` and persists a fresh revocation record on success,
    /// `Ok(false)` without any state change when a precondition is not met.
    /// Re-invocation recomputes the same record (signatures are
    /// deterministic).
    pub fn revoke(&self, name: &str, compromised_miner_id: &str, complete: bool) -> Result<bool> {
        if !self.keys.exists(name, ChainKind::MinerId)? {
            return Err(EngineError::NotFound(name.to_string()));
        }
        if !self.keys.exists(name, ChainKind::RevocationKey)? {
            warn!(name, "revocation refused: no revocation key chain");
            return Ok(false);
        }

        if complete {
            let anchor = match self.records.first_miner_id(name)? {
                Some(anchor) => anchor,
                None => {
                    warn!(name, "revocation refused: no genesis anchor recorded");
                    return Ok(false);
                }
            };
            if compromised_miner_id != anchor {
                info!(name, "complete revocation refused: key is not the genesis anchor");
                return Ok(false);
            }
        } else {
            let count = self.keys.version_count(name, ChainKind::MinerId)?;
            if count < 2 {
                info!(name, "partial revocation refused: chain has not rotated");
                return Ok(false);
            }
            let current = self.keys.current(name, ChainKind::MinerId)?;
            if compromised_miner_id != current.public_key.to_hex() {
                info!(name, "partial revocation refused: key is not the current MinerID");
                return Ok(false);
            }
        }

        // Preconditions hold, so the named key is a real compressed key.
        let compromised = PublicKey::from_hex(compromised_miner_id)?;
        let digest = sha256(&compromised.to_bytes());

        let sig1 = self
            .signer
            .sign_hash(name, ChainKind::RevocationKey, KeyRole::Current, &digest)?;
        let miner_id_role = if complete {
            KeyRole::Current
        } else {
            KeyRole::Previous
        };
        let sig2 = self
            .signer
            .sign_hash(name, ChainKind::MinerId, miner_id_role, &digest)?;

        let record = RevocationRecord {
            complete_revocation: complete,
            revocation_message: RevocationMessage {
                compromised_miner_id: compromised_miner_id.to_string(),
            },
            revocation_message_sig: RevocationMessageSig {
                sig1: sig1.to_hex(),
                sig2: sig2.to_hex(),
            },
            next_doc_data: self.next_doc_data(name, complete)?,
        };
        self.records.set_revocation_record(name, &record)?;

        info!(name, complete, "identity revoked");
        Ok(true)
    }

    /// Identity fields the next rendered document must carry.
    ///
    /// Complete mode collapses the link to the current key alone; partial mode
    /// keeps the previous key as the signer of provenance.
    fn next_doc_data(&self, name: &str, complete: bool) -> Result<NextDocData> {
        let current = self.keys.current(name, ChainKind::MinerId)?;

        if complete {
            let payload = key_link_payload(&current.public_key, &current.public_key);
            let sig = self
                .signer
                .sign(name, ChainKind::MinerId, KeyRole::Current, &payload)?;
            return Ok(NextDocData {
                prev_miner_id: current.public_key.to_hex(),
                prev_miner_id_sig: sig.to_hex(),
                miner_id: current.public_key.to_hex(),
            });
        }

        let previous = self.keys.previous(name, ChainKind::MinerId)?;
        let payload = key_link_payload(&previous.public_key, &current.public_key);
        let sig = self
            .signer
            .sign(name, ChainKind::MinerId, KeyRole::Previous, &payload)?;
        Ok(NextDocData {
            prev_miner_id: previous.public_key.to_hex(),
            prev_miner_id_sig: sig.to_hex(),
            miner_id: current.public_key.to_hex(),
        })
    }
}
