//! MinerInfo document model and the persisted revocation data types.
//!
//! The canonical byte form of a document is the compact `serde_json`
//! serialization with fields in declaration order. Those exact bytes are
//! hashed, signed and transmitted; re-serializing the same document always
//! yields the same bytes.

use crate::hash::{sha256, Hash};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Document protocol version carried in every miner-info document.
pub const DOCUMENT_VERSION: &str = "0.3";

/// Reference to the validity-check transaction proving funds control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VctxRef {
    pub tx_id: String,
    pub vout: u32,
}

/// The revocation message naming the compromised key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationMessage {
    #[serde(rename = "compromised_minerId")]
    pub compromised_miner_id: String,
}

/// The two-signature authorization of a revocation message.
///
/// `sig1` is produced by the current revocation private key, `sig2` by the
/// designated MinerID private key (current for complete revocation, previous
/// for partial).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationMessageSig {
    pub sig1: String,
    pub sig2: String,
}

/// A miner-info document for a given block height.
///
/// Immutable once signed; built fresh per request from persisted chain state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinerInfoDocument {
    pub version: String,
    pub height: u64,
    pub prev_miner_id: String,
    pub prev_miner_id_sig: String,
    pub miner_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_revocation_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_revocation_key_sig: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_message: Option<RevocationMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_message_sig: Option<RevocationMessageSig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vctx: Option<VctxRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miner_contact: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

impl MinerInfoDocument {
    /// Serialize to the canonical JSON byte form that is hashed and signed.
    pub fn to_canonical_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a document back from its JSON form.
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Single SHA-256 over the canonical JSON bytes; this is what gets signed.
    pub fn signing_hash(&self) -> serde_json::Result<Hash> {
        Ok(sha256(self.to_canonical_json()?.as_bytes()))
    }
}

/// Identity-field values the next rendered document must carry after a
/// revocation (`nextDocData` carry-over).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextDocData {
    pub prev_miner_id: String,
    pub prev_miner_id_sig: String,
    pub miner_id: String,
}

/// Persisted revocation state for an identity.
///
/// Overwritten wholesale on each successful revocation call; no history kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationRecord {
    pub complete_revocation: bool,
    pub revocation_message: RevocationMessage,
    pub revocation_message_sig: RevocationMessageSig,
    pub next_doc_data: NextDocData,
}

/// Precomputed revocation-key fields reused across documents until the
/// revocation chain rotates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationKeyData {
    pub prev_revocation_key: String,
    pub revocation_key: String,
    pub prev_revocation_key_sig: String,
}
