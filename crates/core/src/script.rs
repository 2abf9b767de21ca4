//! Protocol-tagged OP_RETURN output scripts.
//!
//! All forms are unspendable data carriers: `OP_FALSE OP_RETURN` followed by
//! consecutive data pushes. Each field is individually length-prefixed per
//! standard push-data rules (direct push up to 75 bytes, OP_PUSHDATA1 up to
//! 255, OP_PUSHDATA2 up to 65535). Larger payloads exceed the protocol's size
//! assumptions and are rejected.

use crate::crypto::Signature;
use crate::hash::Hash;
use thiserror::Error;

/// Fixed 4-byte protocol tag identifying miner-info outputs.
pub const PROTOCOL_NAME: [u8; 4] = [0x60, 0x1d, 0xfa, 0xce];

/// Fixed 1-byte protocol version tag.
pub const PROTOCOL_ID_VERSION: u8 = 0x00;

const OP_FALSE: u8 = 0x00;
const OP_RETURN: u8 = 0x6a;
const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;

/// Largest payload a single push may carry.
pub const MAX_PUSH: usize = 0xffff;

/// Errors that can occur while encoding or decoding scripts.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("push payload of {0} bytes exceeds protocol size assumptions")]
    PayloadTooLarge(usize),
    #[error("script ended unexpectedly")]
    Truncated,
    #[error("script is not an OP_FALSE OP_RETURN data carrier")]
    NotDataCarrier,
    #[error("protocol tag mismatch")]
    ProtocolMismatch,
    #[error("unsupported protocol version {0:#04x}")]
    VersionMismatch(u8),
    #[error("unexpected field layout: {0}")]
    UnexpectedLayout(String),
}

/// Result type for script operations.
pub type Result<T> = std::result::Result<T, ScriptError>;

fn push_data(out: &mut Vec<u8>, data: &[u8]) -> Result<()> {
    match data.len() {
        n if n <= 0x4b => out.push(n as u8),
        n if n <= 0xff => {
            out.push(OP_PUSHDATA1);
            out.push(n as u8);
        }
        n if n <= MAX_PUSH => {
            out.push(OP_PUSHDATA2);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        n => return Err(ScriptError::PayloadTooLarge(n)),
    }
    out.extend_from_slice(data);
    Ok(())
}

fn read_push<'a>(bytes: &'a [u8], pos: &mut usize) -> Result<&'a [u8]> {
    let opcode = *bytes.get(*pos).ok_or(ScriptError::Truncated)?;
    *pos += 1;

    let len = match opcode {
        n @ 0x01..=0x4b => n as usize,
        OP_PUSHDATA1 => {
            let n = *bytes.get(*pos).ok_or(ScriptError::Truncated)?;
            *pos += 1;
            n as usize
        }
        OP_PUSHDATA2 => {
            let raw = bytes
                .get(*pos..*pos + 2)
                .ok_or(ScriptError::Truncated)?;
            *pos += 2;
            u16::from_le_bytes([raw[0], raw[1]]) as usize
        }
        other => {
            return Err(ScriptError::UnexpectedLayout(format!(
                "opcode {:#04x} is not a supported push",
                other
            )))
        }
    };

    let data = bytes.get(*pos..*pos + len).ok_or(ScriptError::Truncated)?;
    *pos += len;
    Ok(data)
}

fn script_header(out: &mut Vec<u8>) -> Result<()> {
    out.push(OP_FALSE);
    out.push(OP_RETURN);
    push_data(out, &PROTOCOL_NAME)?;
    push_data(out, &[PROTOCOL_ID_VERSION])?;
    Ok(())
}

fn read_header(bytes: &[u8], pos: &mut usize) -> Result<()> {
    if bytes.len() < 2 || bytes[0] != OP_FALSE || bytes[1] != OP_RETURN {
        return Err(ScriptError::NotDataCarrier);
    }
    *pos = 2;

    let tag = read_push(bytes, pos)?;
    if tag != PROTOCOL_NAME {
        return Err(ScriptError::ProtocolMismatch);
    }
    let version = read_push(bytes, pos)?;
    if version.len() != 1 {
        return Err(ScriptError::UnexpectedLayout("version push".to_string()));
    }
    if version[0] != PROTOCOL_ID_VERSION {
        return Err(ScriptError::VersionMismatch(version[0]));
    }
    Ok(())
}

/// Coinbase-side output referencing a miner-info transaction.
///
/// The transaction id is pushed in little-endian (byte-reversed) order.
pub fn create_coinbase_op_return(miner_info_txid: &Hash) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    script_header(&mut out)?;
    push_data(&mut out, miner_info_txid.reversed().as_bytes())?;
    Ok(out)
}

/// Coinbase-side output carrying the block bind and its signature in
/// addition to the miner-info transaction id.
pub fn create_coinbase_op_return_with_block_bind(
    miner_info_txid: &Hash,
    block_bind: &Hash,
    block_bind_sig: &Signature,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    script_header(&mut out)?;
    push_data(&mut out, miner_info_txid.reversed().as_bytes())?;
    push_data(&mut out, block_bind.as_bytes())?;
    push_data(&mut out, &block_bind_sig.to_der_bytes())?;
    Ok(out)
}

/// Miner-info-transaction-side output carrying the signed document itself.
pub fn create_miner_info_op_return(document: &[u8], signature: &Signature) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    script_header(&mut out)?;
    push_data(&mut out, document)?;
    push_data(&mut out, &signature.to_der_bytes())?;
    Ok(out)
}

/// Decoded coinbase-side output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinbaseOpReturn {
    /// Display-order miner-info transaction id.
    pub miner_info_txid: Hash,
    /// Block bind digest and DER signature, when present.
    pub block_bind: Option<(Hash, Vec<u8>)>,
}

/// Decode either coinbase-side form.
pub fn decode_coinbase_op_return(script: &[u8]) -> Result<CoinbaseOpReturn> {
    let mut pos = 0;
    read_header(script, &mut pos)?;

    let txid_le = read_push(script, &mut pos)?;
    if txid_le.len() != 32 {
        return Err(ScriptError::UnexpectedLayout("txid push".to_string()));
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(txid_le);
    let miner_info_txid = Hash(arr).reversed();

    if pos == script.len() {
        return Ok(CoinbaseOpReturn {
            miner_info_txid,
            block_bind: None,
        });
    }

    let bind = read_push(script, &mut pos)?;
    if bind.len() != 32 {
        return Err(ScriptError::UnexpectedLayout("block bind push".to_string()));
    }
    let mut bind_arr = [0u8; 32];
    bind_arr.copy_from_slice(bind);
    let sig = read_push(script, &mut pos)?.to_vec();
    if pos != script.len() {
        return Err(ScriptError::UnexpectedLayout("trailing bytes".to_string()));
    }

    Ok(CoinbaseOpReturn {
        miner_info_txid,
        block_bind: Some((Hash(bind_arr), sig)),
    })
}

/// Decoded miner-info-transaction-side output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinerInfoOpReturn {
    pub document: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Decode the document-carrying form.
pub fn decode_miner_info_op_return(script: &[u8]) -> Result<MinerInfoOpReturn> {
    let mut pos = 0;
    read_header(script, &mut pos)?;

    let document = read_push(script, &mut pos)?.to_vec();
    let signature = read_push(script, &mut pos)?.to_vec();
    if pos != script.len() {
        return Err(ScriptError::UnexpectedLayout("trailing bytes".to_string()));
    }

    Ok(MinerInfoOpReturn {
        document,
        signature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::hash::sha256;

    fn txid() -> Hash {
        sha256(b"some txid")
    }

    #[test]
    fn test_coinbase_op_return_roundtrip() {
        let script = create_coinbase_op_return(&txid()).unwrap();
        // Header: OP_FALSE OP_RETURN, 4-byte tag push, 1-byte version push.
        assert_eq!(&script[..2], &[0x00, 0x6a]);
        assert_eq!(&script[2..7], &[0x04, 0x60, 0x1d, 0xfa, 0xce]);
        assert_eq!(&script[7..9], &[0x01, 0x00]);

        let decoded = decode_coinbase_op_return(&script).unwrap();
        assert_eq!(decoded.miner_info_txid, txid());
        assert!(decoded.block_bind.is_none());
    }

    #[test]
    fn test_txid_is_pushed_little_endian() {
        let script = create_coinbase_op_return(&txid()).unwrap();
        // push opcode 0x20 then the reversed txid bytes
        assert_eq!(script[9], 0x20);
        assert_eq!(&script[10..42], txid().reversed().as_bytes());
    }

    #[test]
    fn test_coinbase_op_return_with_block_bind_roundtrip() {
        let kp = Keypair::generate();
        let bind = sha256(b"bind");
        let sig = kp.sign_hash(&bind).unwrap();

        let script = create_coinbase_op_return_with_block_bind(&txid(), &bind, &sig).unwrap();
        let decoded = decode_coinbase_op_return(&script).unwrap();
        assert_eq!(decoded.miner_info_txid, txid());
        let (decoded_bind, decoded_sig) = decoded.block_bind.unwrap();
        assert_eq!(decoded_bind, bind);
        assert_eq!(decoded_sig, sig.to_der_bytes());
    }

    #[test]
    fn test_miner_info_op_return_roundtrip() {
        let kp = Keypair::generate();
        let doc = br#"{"version":"0.3","height":1}"#.to_vec();
        let sig = kp.sign(&doc).unwrap();

        let script = create_miner_info_op_return(&doc, &sig).unwrap();
        let decoded = decode_miner_info_op_return(&script).unwrap();
        assert_eq!(decoded.document, doc);
        assert_eq!(decoded.signature, sig.to_der_bytes());
    }

    #[test]
    fn test_large_document_uses_pushdata2() {
        let kp = Keypair::generate();
        let doc = vec![0x41u8; 600];
        let sig = kp.sign(&doc).unwrap();

        let script = create_miner_info_op_return(&doc, &sig).unwrap();
        assert!(script.contains(&0x4d));
        let decoded = decode_miner_info_op_return(&script).unwrap();
        assert_eq!(decoded.document, doc);
    }

    #[test]
    fn test_oversize_payload_rejected() {
        let kp = Keypair::generate();
        let doc = vec![0u8; MAX_PUSH + 1];
        let sig = kp.sign(b"x").unwrap();
        let result = create_miner_info_op_return(&doc, &sig);
        assert!(matches!(result, Err(ScriptError::PayloadTooLarge(_))));
    }

    #[test]
    fn test_decode_rejects_wrong_tag() {
        let mut script = create_coinbase_op_return(&txid()).unwrap();
        script[3] ^= 0xff;
        assert!(matches!(
            decode_coinbase_op_return(&script),
            Err(ScriptError::ProtocolMismatch)
        ));
    }

    #[test]
    fn test_decode_rejects_wrong_version() {
        let mut script = create_coinbase_op_return(&txid()).unwrap();
        script[8] = 0x01;
        assert!(matches!(
            decode_coinbase_op_return(&script),
            Err(ScriptError::VersionMismatch(0x01))
        ));
    }

    #[test]
    fn test_decode_rejects_non_data_carrier() {
        assert!(matches!(
            decode_coinbase_op_return(&[0x51, 0x6a]),
            Err(ScriptError::NotDataCarrier)
        ));
    }

    #[test]
    fn test_decode_rejects_truncated() {
        let script = create_coinbase_op_return(&txid()).unwrap();
        assert!(matches!(
            decode_coinbase_op_return(&script[..script.len() - 4]),
            Err(ScriptError::Truncated)
        ));
    }
}
