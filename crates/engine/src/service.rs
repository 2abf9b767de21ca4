//! The MinerID service facade.
//!
//! Brings together the key chain store, record store, signing service,
//! document builder, revocation engine, and coinbase assembler behind one
//! entry point, the way a front end consumes them.

use crate::builder::{compute_revocation_key_data, DocumentBuilder};
use crate::coinbase::{CoinbaseAssembler, SignedDocument};
use crate::extensions::{ExtensionComposer, ExtensionContext};
use crate::revocation::RevocationEngine;
use crate::signer::SigningService;
use crate::{EngineError, Result};
use minerid_core::script::create_coinbase_op_return;
use minerid_core::{Hash, MinerInfoDocument, PublicKey, VctxRef, DOCUMENT_VERSION};
use minerid_storage::{ChainKind, KeyChainStore, RecordStore, Storage};
use serde_json::Value;
use tracing::info;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct MinerIdConfig {
    /// Document protocol version rendered in every document.
    pub document_version: String,
}

impl Default for MinerIdConfig {
    fn default() -> Self {
        Self {
            document_version: DOCUMENT_VERSION.to_string(),
        }
    }
}

/// Main service struct orchestrating the identity lifecycle.
pub struct MinerIdService<'a> {
    keys: KeyChainStore<'a>,
    records: RecordStore<'a>,
    signer: SigningService<'a>,
    builder: DocumentBuilder<'a>,
    revocation: RevocationEngine<'a>,
    assembler: CoinbaseAssembler<'a>,
    composer: ExtensionComposer,
}

impl<'a> MinerIdService<'a> {
    /// Create a new service over the given storage with the default
    /// extension providers.
    pub fn new(storage: &'a Storage, config: MinerIdConfig) -> Self {
        Self::with_composer(storage, config, ExtensionComposer::with_defaults())
    }

    /// Create a new service with a caller-supplied extension composer.
    pub fn with_composer(
        storage: &'a Storage,
        config: MinerIdConfig,
        composer: ExtensionComposer,
    ) -> Self {
        Self {
            keys: KeyChainStore::new(storage),
            records: RecordStore::new(storage),
            signer: SigningService::new(storage),
            builder: DocumentBuilder::new(storage, config.document_version.clone()),
            revocation: RevocationEngine::new(storage),
            assembler: CoinbaseAssembler::new(storage, config.document_version),
            composer,
        }
    }

    // =========================================================================
    // Identity lifecycle
    // =========================================================================

    /// Create a fresh identity: both chains, the genesis anchor, and the
    /// reusable revocation key data. Returns the new MinerID public key.
    pub fn create_miner_id(&self, name: &str) -> Result<PublicKey> {
        if self.keys.exists(name, ChainKind::MinerId)? {
            return Err(EngineError::IdentityExists(name.to_string()));
        }
        self.keys.create_chain(name, ChainKind::MinerId)?;
        self.keys.create_chain(name, ChainKind::RevocationKey)?;

        let current = self.keys.current(name, ChainKind::MinerId)?;
        self.records
            .set_first_miner_id(name, &current.public_key.to_hex())?;
        self.refresh_revocation_key_data(name)?;

        info!(name, miner_id = %current.public_key, "created MinerID");
        Ok(current.public_key)
    }

    /// Append a new key version to one of the identity's chains.
    pub fn rotate(&self, name: &str, kind: ChainKind) -> Result<u32> {
        let new_index = self.keys.append_version(name, kind)?;
        if kind == ChainKind::RevocationKey {
            self.refresh_revocation_key_data(name)?;
        }
        info!(name, chain = %kind, version = new_index, "rotated key");
        Ok(new_index)
    }

    /// True only while the identity has a MinerID chain but no revocation
    /// chain yet (pre-v0.3 identities).
    pub fn can_upgrade_protocol(&self, name: &str) -> Result<bool> {
        Ok(self.keys.exists(name, ChainKind::MinerId)?
            && !self.keys.exists(name, ChainKind::RevocationKey)?)
    }

    /// Upgrade a pre-v0.3 identity: record the declared genesis anchor,
    /// create the revocation chain, seed its reusable data.
    pub fn upgrade_protocol(&self, name: &str, declared_first_miner_id: &str) -> Result<()> {
        if !self.keys.exists(name, ChainKind::MinerId)? {
            return Err(EngineError::NotFound(name.to_string()));
        }
        if self.keys.exists(name, ChainKind::RevocationKey)? {
            return Err(EngineError::AlreadyUpgraded(name.to_string()));
        }
        self.records
            .set_first_miner_id(name, declared_first_miner_id)?;
        self.keys.create_chain(name, ChainKind::RevocationKey)?;
        self.refresh_revocation_key_data(name)?;

        info!(name, "upgraded identity to revocation-capable protocol");
        Ok(())
    }

    /// Revoke a compromised MinerID (see [`RevocationEngine::revoke`]).
    pub fn revoke(&self, name: &str, compromised_miner_id: &str, complete: bool) -> Result<bool> {
        self.revocation.revoke(name, compromised_miner_id, complete)
    }

    fn refresh_revocation_key_data(&self, name: &str) -> Result<()> {
        let data = compute_revocation_key_data(&self.keys, &self.signer, name)?;
        self.records.set_revocation_key_data(name, &data)?;
        Ok(())
    }

    // =========================================================================
    // Documents and scripts
    // =========================================================================

    /// Build the (unsigned) document for `(name, height)`.
    pub fn build_document(&self, name: &str, height: u64) -> Result<MinerInfoDocument> {
        self.builder
            .build(name, height, &ExtensionContext::default(), &self.composer)
    }

    /// Build the document with a caller-supplied extension context.
    pub fn build_document_with(
        &self,
        name: &str,
        height: u64,
        ctx: &ExtensionContext,
    ) -> Result<MinerInfoDocument> {
        self.builder.build(name, height, ctx, &self.composer)
    }

    /// Build and sign the document for `(name, height)`.
    pub fn create_miner_info_document(&self, name: &str, height: u64) -> Result<SignedDocument> {
        self.assembler.create_signed_document(
            name,
            height,
            &ExtensionContext::default(),
            &self.composer,
        )
    }

    /// The miner-info-transaction-side output script.
    pub fn create_miner_info_script(&self, name: &str, height: u64) -> Result<Vec<u8>> {
        self.assembler.create_miner_info_script(
            name,
            height,
            &ExtensionContext::default(),
            &self.composer,
        )
    }

    /// The plain coinbase-side output script referencing a miner-info
    /// transaction.
    pub fn create_coinbase_script(&self, miner_info_txid: &Hash) -> Result<Vec<u8>> {
        Ok(create_coinbase_op_return(miner_info_txid)?)
    }

    /// The coinbase-side output script with a signed block bind.
    pub fn create_coinbase_script_with_block_bind(
        &self,
        name: &str,
        miner_info_txid: &Hash,
        prev_block_hash: &str,
        merkle_branches: &[String],
    ) -> Result<Vec<u8>> {
        self.assembler.create_coinbase_script_with_block_bind(
            name,
            miner_info_txid,
            prev_block_hash,
            merkle_branches,
        )
    }

    /// Extend a coinbase second part with the signed miner-info output.
    pub fn assemble_coinbase2(
        &self,
        name: &str,
        height: u64,
        prev_block_hash: &str,
        merkle_branches: &[String],
        coinbase2_hex: &str,
    ) -> Result<String> {
        let result = self.assembler.assemble_coinbase2(
            name,
            height,
            prev_block_hash,
            merkle_branches,
            coinbase2_hex,
            &self.composer,
        )?;
        info!(name, height, "assembled coinbase2 with miner-info output");
        Ok(result)
    }

    // =========================================================================
    // Optional document inputs
    // =========================================================================

    /// Store the miner contact object rendered in documents.
    pub fn set_miner_contact(&self, name: &str, contact: &Value) -> Result<()> {
        Ok(self.records.set_miner_contact(name, contact)?)
    }

    /// Store the validity-check transaction reference rendered in documents.
    pub fn set_vctx(&self, name: &str, vctx: &VctxRef) -> Result<()> {
        Ok(self.records.set_vctx(name, vctx)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minerid_core::{sha256, Signature};

    fn setup() -> Storage {
        Storage::open_temporary().unwrap()
    }

    fn service(storage: &Storage) -> MinerIdService<'_> {
        MinerIdService::new(storage, MinerIdConfig::default())
    }

    #[test]
    fn test_create_miner_id() {
        let storage = setup();
        let service = service(&storage);

        let miner_id = service.create_miner_id("alpha").unwrap();

        let keys = KeyChainStore::new(&storage);
        assert!(keys.exists("alpha", ChainKind::MinerId).unwrap());
        assert!(keys.exists("alpha", ChainKind::RevocationKey).unwrap());

        let records = RecordStore::new(&storage);
        assert_eq!(
            records.first_miner_id("alpha").unwrap().unwrap(),
            miner_id.to_hex()
        );
        assert!(records.revocation_key_data("alpha").unwrap().is_some());
    }

    #[test]
    fn test_create_twice_fails() {
        let storage = setup();
        let service = service(&storage);

        service.create_miner_id("alpha").unwrap();
        assert!(matches!(
            service.create_miner_id("alpha"),
            Err(EngineError::IdentityExists(_))
        ));
    }

    #[test]
    fn test_rotate_miner_id() {
        let storage = setup();
        let service = service(&storage);

        service.create_miner_id("alpha").unwrap();
        assert_eq!(service.rotate("alpha", ChainKind::MinerId).unwrap(), 2);
        assert_eq!(service.rotate("alpha", ChainKind::MinerId).unwrap(), 3);

        let keys = KeyChainStore::new(&storage);
        assert_eq!(keys.version_count("alpha", ChainKind::MinerId).unwrap(), 3);
        assert_eq!(
            keys.version_count("alpha", ChainKind::RevocationKey).unwrap(),
            1
        );
    }

    #[test]
    fn test_rotating_revocation_chain_refreshes_data() {
        let storage = setup();
        let service = service(&storage);
        let records = RecordStore::new(&storage);

        service.create_miner_id("alpha").unwrap();
        let before = records.revocation_key_data("alpha").unwrap().unwrap();
        assert_eq!(before.prev_revocation_key, before.revocation_key);

        service.rotate("alpha", ChainKind::RevocationKey).unwrap();
        let after = records.revocation_key_data("alpha").unwrap().unwrap();
        assert_eq!(after.prev_revocation_key, before.revocation_key);
        assert_ne!(after.revocation_key, after.prev_revocation_key);
    }

    #[test]
    fn test_upgrade_lifecycle() {
        let storage = setup();
        let service = service(&storage);

        // A pre-v0.3 identity: MinerID chain only.
        let keys = KeyChainStore::new(&storage);
        keys.create_chain("legacy", ChainKind::MinerId).unwrap();
        let first = keys
            .current("legacy", ChainKind::MinerId)
            .unwrap()
            .public_key
            .to_hex();

        assert!(service.can_upgrade_protocol("legacy").unwrap());
        service.upgrade_protocol("legacy", &first).unwrap();
        assert!(!service.can_upgrade_protocol("legacy").unwrap());

        // The upgrade established the anchor and the revocation chain.
        let records = RecordStore::new(&storage);
        assert_eq!(records.first_miner_id("legacy").unwrap().unwrap(), first);
        assert!(keys.exists("legacy", ChainKind::RevocationKey).unwrap());

        // A second upgrade is refused.
        assert!(matches!(
            service.upgrade_protocol("legacy", &first),
            Err(EngineError::AlreadyUpgraded(_))
        ));
    }

    #[test]
    fn test_can_upgrade_is_false_for_fresh_and_unknown() {
        let storage = setup();
        let service = service(&storage);

        assert!(!service.can_upgrade_protocol("ghost").unwrap());
        service.create_miner_id("alpha").unwrap();
        assert!(!service.can_upgrade_protocol("alpha").unwrap());
    }

    #[test]
    fn test_upgrade_unknown_identity_fails() {
        let storage = setup();
        let service = service(&storage);
        assert!(matches!(
            service.upgrade_protocol("ghost", "02aa"),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn test_document_after_complete_revocation() {
        let storage = setup();
        let service = service(&storage);

        let first = service.create_miner_id("alpha").unwrap().to_hex();
        service.rotate("alpha", ChainKind::MinerId).unwrap();

        assert!(service.revoke("alpha", &first, true).unwrap());

        let keys = KeyChainStore::new(&storage);
        let current = keys
            .current("alpha", ChainKind::MinerId)
            .unwrap()
            .public_key
            .to_hex();

        // The reputation chain collapses to the current key alone.
        let doc = service.build_document("alpha", 500).unwrap();
        assert_eq!(doc.prev_miner_id, current);
        assert_eq!(doc.miner_id, current);
        let msg = doc.revocation_message.unwrap();
        assert_eq!(msg.compromised_miner_id, first);
        assert!(doc.revocation_message_sig.is_some());
    }

    #[test]
    fn test_document_after_partial_revocation() {
        let storage = setup();
        let service = service(&storage);

        service.create_miner_id("alpha").unwrap();
        service.rotate("alpha", ChainKind::MinerId).unwrap();

        let keys = KeyChainStore::new(&storage);
        let current = keys
            .current("alpha", ChainKind::MinerId)
            .unwrap()
            .public_key
            .to_hex();

        assert!(service.revoke("alpha", &current, false).unwrap());

        // Provenance keeps pointing at the still-trusted previous key.
        let doc = service.build_document("alpha", 500).unwrap();
        assert_ne!(doc.prev_miner_id, doc.miner_id);
        assert_eq!(doc.miner_id, current);
        assert_eq!(
            doc.revocation_message.unwrap().compromised_miner_id,
            current
        );
    }

    #[test]
    fn test_signed_document_roundtrip() {
        let storage = setup();
        let service = service(&storage);

        service.create_miner_id("alpha").unwrap();
        let signed = service.create_miner_info_document("alpha", 123).unwrap();

        let miner_id = PublicKey::from_hex(&signed.document.miner_id).unwrap();
        let digest = sha256(signed.json.as_bytes());
        assert!(miner_id.verify_hash(&digest, &signed.signature).is_ok());
    }

    #[test]
    fn test_coinbase_script_roundtrip() {
        let storage = setup();
        let service = service(&storage);
        service.create_miner_id("alpha").unwrap();

        let txid = sha256(b"miner info tx");
        let script = service.create_coinbase_script(&txid).unwrap();
        let decoded = minerid_core::script::decode_coinbase_op_return(&script).unwrap();
        assert_eq!(decoded.miner_info_txid, txid);
    }

    #[test]
    fn test_contact_and_vctx_flow_into_documents() {
        let storage = setup();
        let service = service(&storage);
        service.create_miner_id("alpha").unwrap();

        service
            .set_miner_contact("alpha", &serde_json::json!({"name": "Example"}))
            .unwrap();
        service
            .set_vctx(
                "alpha",
                &VctxRef {
                    tx_id: "ef".repeat(32),
                    vout: 2,
                },
            )
            .unwrap();

        let doc = service.build_document("alpha", 9).unwrap();
        assert_eq!(doc.miner_contact.unwrap()["name"], "Example");
        let vctx = doc.vctx.unwrap();
        assert_eq!(vctx.tx_id, "ef".repeat(32));
        assert_eq!(vctx.vout, 2);
    }

    #[test]
    fn test_revocation_sigs_in_rendered_document_verify() {
        let storage = setup();
        let service = service(&storage);

        let first = service.create_miner_id("alpha").unwrap().to_hex();
        assert!(service.revoke("alpha", &first, true).unwrap());

        let doc = service.build_document("alpha", 1).unwrap();
        let sigs = doc.revocation_message_sig.unwrap();
        let compromised = PublicKey::from_hex(&first).unwrap();
        let digest = sha256(&compromised.to_bytes());

        let keys = KeyChainStore::new(&storage);
        let revocation_key = keys
            .current("alpha", ChainKind::RevocationKey)
            .unwrap()
            .public_key;
        let sig1 = Signature::from_hex(&sigs.sig1).unwrap();
        assert!(revocation_key.verify_hash(&digest, &sig1).is_ok());
    }
}
