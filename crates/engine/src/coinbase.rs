//! Coinbase-side production: signed documents, miner-info output scripts,
//! and coinbase2 assembly.
//!
//! Callers only manage the second part of a two-part coinbase split, so
//! assembly reconstructs a full transaction from a fixed placeholder first
//! part, extends it, and strips the placeholder back off the result.

use crate::builder::DocumentBuilder;
use crate::extensions::{BlockBindData, ExtensionComposer, ExtensionContext};
use crate::signer::{KeyRole, SigningService};
use crate::Result;
use minerid_core::script::{
    create_coinbase_op_return_with_block_bind, create_miner_info_op_return,
};
use minerid_core::{build_block_bind, build_merkle_root, CoinbaseTx, Hash, MinerInfoDocument, Signature};
use minerid_storage::{ChainKind, Storage};
use tracing::debug;

/// Fixed placeholder first part of the coinbase split: version, one
/// null-prevout input with an empty script. The second part supplies the
/// sequence, outputs, and lock time.
pub const COINBASE1_PLACEHOLDER: &str =
    "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff00";

/// A document together with the exact bytes that were signed.
#[derive(Debug, Clone)]
pub struct SignedDocument {
    pub document: MinerInfoDocument,
    /// Canonical JSON — the bytes that were hashed and signed.
    pub json: String,
    pub signature: Signature,
}

/// Produces signed documents and the scripts that embed them.
pub struct CoinbaseAssembler<'a> {
    builder: DocumentBuilder<'a>,
    signer: SigningService<'a>,
}

impl<'a> CoinbaseAssembler<'a> {
    /// Create a new CoinbaseAssembler over the given storage.
    pub fn new(storage: &'a Storage, version: String) -> Self {
        Self {
            builder: DocumentBuilder::new(storage, version),
            signer: SigningService::new(storage),
        }
    }

    /// Build and sign the document for `(name, height)`.
    ///
    /// The signature is by the current MinerID key over the single SHA-256 of
    /// the canonical JSON bytes.
    pub fn create_signed_document(
        &self,
        name: &str,
        height: u64,
        ctx: &ExtensionContext,
        composer: &ExtensionComposer,
    ) -> Result<SignedDocument> {
        let document = self.builder.build(name, height, ctx, composer)?;
        let json = document.to_canonical_json()?;
        let signature =
            self.signer
                .sign(name, ChainKind::MinerId, KeyRole::Current, json.as_bytes())?;
        Ok(SignedDocument {
            document,
            json,
            signature,
        })
    }

    /// The miner-info-transaction-side output script for `(name, height)`.
    pub fn create_miner_info_script(
        &self,
        name: &str,
        height: u64,
        ctx: &ExtensionContext,
        composer: &ExtensionComposer,
    ) -> Result<Vec<u8>> {
        let signed = self.create_signed_document(name, height, ctx, composer)?;
        Ok(create_miner_info_op_return(
            signed.json.as_bytes(),
            &signed.signature,
        )?)
    }

    /// The coinbase-side output script carrying the block bind: computes the
    /// modified Merkle root and the bind digest, signs the digest with the
    /// current MinerID key.
    pub fn create_coinbase_script_with_block_bind(
        &self,
        name: &str,
        miner_info_txid: &Hash,
        prev_block_hash: &str,
        merkle_branches: &[String],
    ) -> Result<Vec<u8>> {
        let root = build_merkle_root(&miner_info_txid.to_hex(), merkle_branches)?;
        let bind = build_block_bind(&root, prev_block_hash)?;
        let sig = self
            .signer
            .sign_hash(name, ChainKind::MinerId, KeyRole::Current, &bind)?;
        Ok(create_coinbase_op_return_with_block_bind(
            miner_info_txid,
            &bind,
            &sig,
        )?)
    }

    /// Extend the second part of a coinbase split with a miner-info output.
    ///
    /// The coinbase is reconstructed from the placeholder first part plus
    /// `coinbase2_hex`; its txid and the supplied branches yield the modified
    /// Merkle root fed to the blockbind extension; the signed document is
    /// appended as a zero-value output; only the (extended) second part is
    /// returned.
    pub fn assemble_coinbase2(
        &self,
        name: &str,
        height: u64,
        prev_block_hash: &str,
        merkle_branches: &[String],
        coinbase2_hex: &str,
        composer: &ExtensionComposer,
    ) -> Result<String> {
        let mut raw = placeholder_bytes();
        raw.extend(hex::decode(coinbase2_hex)?);

        let mut tx = CoinbaseTx::from_bytes(&raw)?;
        let txid = tx.txid();
        let root = build_merkle_root(&txid.to_hex(), merkle_branches)?;
        debug!(name, txid = %txid, root = %root, "binding miner-info document");

        let ctx = ExtensionContext {
            block_bind: Some(BlockBindData {
                prev_block_hash: prev_block_hash.to_string(),
                modified_merkle_root: root,
            }),
            ..Default::default()
        };
        let signed = self.create_signed_document(name, height, &ctx, composer)?;
        let script = create_miner_info_op_return(signed.json.as_bytes(), &signed.signature)?;
        tx.append_data_output(script);

        let extended = hex::encode(tx.to_bytes());
        Ok(extended[COINBASE1_PLACEHOLDER.len()..].to_string())
    }
}

fn placeholder_bytes() -> Vec<u8> {
    hex::decode(COINBASE1_PLACEHOLDER).expect("placeholder is valid hex")
}
