//! Coinbase transaction codec.
//!
//! Just enough of the wire format to reconstruct a coinbase from its two
//! stratum halves, append a data-carrier output, and recompute the txid.
//! Values are little-endian; variable-length counts use Bitcoin varints.

use crate::hash::{sha256d, Hash, H256};
use thiserror::Error;

/// Errors that can occur while decoding a transaction.
#[derive(Debug, Error)]
pub enum TxError {
    #[error("transaction ended unexpectedly")]
    Truncated,
    #[error("{0} trailing bytes after transaction")]
    TrailingBytes(usize),
    #[error("varint length {0} exceeds supported range")]
    LengthOutOfRange(u64),
}

/// Result type for transaction operations.
pub type Result<T> = std::result::Result<T, TxError>;

/// A transaction input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    /// Previous output txid in wire (hashing) order.
    pub prev_txid: H256,
    /// Previous output index (0xffffffff for a coinbase).
    pub prev_index: u32,
    /// Input script.
    pub script: Vec<u8>,
    /// Sequence number.
    pub sequence: u32,
}

/// A transaction output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    /// Value in satoshis.
    pub value: u64,
    /// Output script.
    pub script: Vec<u8>,
}

/// A parsed coinbase transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinbaseTx {
    pub version: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub lock_time: u32,
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let slice = self
            .bytes
            .get(self.pos..self.pos + n)
            .ok_or(TxError::Truncated)?;
        self.pos += n;
        Ok(slice)
    }

    fn u32_le(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64_le(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn var_int(&mut self) -> Result<u64> {
        let first = self.take(1)?[0];
        Ok(match first {
            0xfd => {
                let b = self.take(2)?;
                u16::from_le_bytes([b[0], b[1]]) as u64
            }
            0xfe => self.u32_le()? as u64,
            0xff => self.u64_le()?,
            n => n as u64,
        })
    }

    fn var_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.var_int()?;
        if len > u32::MAX as u64 {
            return Err(TxError::LengthOutOfRange(len));
        }
        Ok(self.take(len as usize)?.to_vec())
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

fn write_var_int(out: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => out.push(n as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x10000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}

impl CoinbaseTx {
    /// Parse a complete serialized transaction. Trailing bytes are an error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);

        let version = r.u32_le()?;

        let input_count = r.var_int()?;
        let mut inputs = Vec::with_capacity(input_count.min(16) as usize);
        for _ in 0..input_count {
            let prev = r.take(32)?;
            let mut prev_txid = [0u8; 32];
            prev_txid.copy_from_slice(prev);
            let prev_index = r.u32_le()?;
            let script = r.var_bytes()?;
            let sequence = r.u32_le()?;
            inputs.push(TxInput {
                prev_txid,
                prev_index,
                script,
                sequence,
            });
        }

        let output_count = r.var_int()?;
        let mut outputs = Vec::with_capacity(output_count.min(16) as usize);
        for _ in 0..output_count {
            let value = r.u64_le()?;
            let script = r.var_bytes()?;
            outputs.push(TxOutput { value, script });
        }

        let lock_time = r.u32_le()?;

        if r.remaining() != 0 {
            return Err(TxError::TrailingBytes(r.remaining()));
        }

        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }

    /// Serialize back to wire bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.version.to_le_bytes());

        write_var_int(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            out.extend_from_slice(&input.prev_txid);
            out.extend_from_slice(&input.prev_index.to_le_bytes());
            write_var_int(&mut out, input.script.len() as u64);
            out.extend_from_slice(&input.script);
            out.extend_from_slice(&input.sequence.to_le_bytes());
        }

        write_var_int(&mut out, self.outputs.len() as u64);
        for output in &self.outputs {
            out.extend_from_slice(&output.value.to_le_bytes());
            write_var_int(&mut out, output.script.len() as u64);
            out.extend_from_slice(&output.script);
        }

        out.extend_from_slice(&self.lock_time.to_le_bytes());
        out
    }

    /// Transaction id in display order (byte-reversed double SHA-256).
    pub fn txid(&self) -> Hash {
        sha256d(&self.to_bytes()).reversed()
    }

    /// Append a zero-value data-carrier output.
    pub fn append_data_output(&mut self, script: Vec<u8>) {
        self.outputs.push(TxOutput { value: 0, script });
    }
}
