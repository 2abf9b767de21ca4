//! Miner-info document construction.
//!
//! A document is a pure function of the persisted chain state, the supplied
//! height, and the extension context; building one has no side effects.

use crate::extensions::{ExtensionComposer, ExtensionContext};
use crate::signer::{key_link_payload, KeyRole, SigningService};
use crate::Result;
use minerid_core::{MinerInfoDocument, RevocationKeyData};
use minerid_storage::{ChainKind, KeyChainStore, RecordStore, Storage};

/// Assembles signed miner-info documents from chain state.
pub struct DocumentBuilder<'a> {
    keys: KeyChainStore<'a>,
    records: RecordStore<'a>,
    signer: SigningService<'a>,
    version: String,
}

impl<'a> DocumentBuilder<'a> {
    /// Create a new DocumentBuilder over the given storage.
    pub fn new(storage: &'a Storage, version: String) -> Self {
        Self {
            keys: KeyChainStore::new(storage),
            records: RecordStore::new(storage),
            signer: SigningService::new(storage),
            version,
        }
    }

    /// Build the document for `(name, height)`.
    ///
    /// Identity fields come from the MinerID chain; the revocation-key triple
    /// is attached once the identity has a revocation chain; an active
    /// revocation record overrides the identity fields and attaches the
    /// revocation message verbatim.
    pub fn build(
        &self,
        name: &str,
        height: u64,
        ctx: &ExtensionContext,
        composer: &ExtensionComposer,
    ) -> Result<MinerInfoDocument> {
        let current = self.keys.current(name, ChainKind::MinerId)?;
        let previous = self.keys.previous(name, ChainKind::MinerId)?;

        let payload = key_link_payload(&previous.public_key, &current.public_key);
        let prev_miner_id_sig = self
            .signer
            .sign(name, ChainKind::MinerId, KeyRole::Previous, &payload)?;

        let mut doc = MinerInfoDocument {
            version: self.version.clone(),
            height,
            prev_miner_id: previous.public_key.to_hex(),
            prev_miner_id_sig: prev_miner_id_sig.to_hex(),
            miner_id: current.public_key.to_hex(),
            prev_revocation_key: None,
            prev_revocation_key_sig: None,
            revocation_key: None,
            revocation_message: None,
            revocation_message_sig: None,
            vctx: self.records.vctx(name)?,
            miner_contact: self.records.miner_contact(name)?,
            extensions: composer.compose(ctx),
        };

        if let Some(data) = self.revocation_key_data(name)? {
            doc.prev_revocation_key = Some(data.prev_revocation_key);
            doc.prev_revocation_key_sig = Some(data.prev_revocation_key_sig);
            doc.revocation_key = Some(data.revocation_key);
        }

        if let Some(record) = self.records.revocation_record(name)? {
            doc.prev_miner_id = record.next_doc_data.prev_miner_id;
            doc.prev_miner_id_sig = record.next_doc_data.prev_miner_id_sig;
            doc.miner_id = record.next_doc_data.miner_id;
            doc.revocation_message = Some(record.revocation_message);
            doc.revocation_message_sig = Some(record.revocation_message_sig);
        }

        Ok(doc)
    }

    /// The revocation-key document fields: the persisted reusable record when
    /// present, recomputed from the chain otherwise.
    fn revocation_key_data(&self, name: &str) -> Result<Option<RevocationKeyData>> {
        if let Some(data) = self.records.revocation_key_data(name)? {
            return Ok(Some(data));
        }
        if !self.keys.exists(name, ChainKind::RevocationKey)? {
            return Ok(None);
        }
        Ok(Some(compute_revocation_key_data(
            &self.keys,
            &self.signer,
            name,
        )?))
    }
}

/// Compute the revocation-key triple from current chain state.
pub(crate) fn compute_revocation_key_data(
    keys: &KeyChainStore<'_>,
    signer: &SigningService<'_>,
    name: &str,
) -> Result<RevocationKeyData> {
    let current = keys.current(name, ChainKind::RevocationKey)?;
    let previous = keys.previous(name, ChainKind::RevocationKey)?;
    let payload = key_link_payload(&previous.public_key, &current.public_key);
    let sig = signer.sign(name, ChainKind::RevocationKey, KeyRole::Previous, &payload)?;
    Ok(RevocationKeyData {
        prev_revocation_key: previous.public_key.to_hex(),
        revocation_key: current.public_key.to_hex(),
        prev_revocation_key_sig: sig.to_hex(),
    })
}
