//! Block binding: the modified Merkle root and the block-bind digest.
//!
//! Transaction ids and hash outputs are stored byte-reversed relative to
//! hashing order, so every input is reversed before hashing and the final
//! accumulator is reversed back for display.

use crate::hash::{sha256_concat, Hash, H256};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors for malformed block-bind inputs.
#[derive(Debug, Error)]
pub enum BlockBindError {
    #[error("malformed hex input: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("expected a 32-byte hash, got {0} bytes")]
    InvalidLength(usize),
}

/// Result type for block-bind operations.
pub type Result<T> = std::result::Result<T, BlockBindError>;

fn decode_reversed(hex_str: &str) -> Result<H256> {
    let bytes = hex::decode(hex_str)?;
    if bytes.len() != 32 {
        return Err(BlockBindError::InvalidLength(bytes.len()));
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&bytes);
    arr.reverse();
    Ok(arr)
}

fn sha256d_pair(left: &[u8], right: &[u8]) -> H256 {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    let first = hasher.finalize();
    Sha256::digest(first).into()
}

/// Compute the modified Merkle root binding a miner-info coinbase to a
/// mining candidate.
///
/// Standard Merkle-path reconstruction: start from the byte-reversed coinbase
/// txid, fold in each branch (byte-reversed, concatenated on the right) with
/// double SHA-256, then reverse the accumulator back into display order.
/// An empty branch list returns the coinbase txid unchanged.
pub fn build_merkle_root(coinbase_txid: &str, merkle_branches: &[String]) -> Result<String> {
    let mut acc = decode_reversed(coinbase_txid)?;

    for branch in merkle_branches {
        let branch = decode_reversed(branch)?;
        acc = sha256d_pair(&acc, &branch);
    }

    acc.reverse();
    Ok(hex::encode(acc))
}

/// Compute the block-bind digest over the modified Merkle root and the
/// previous block hash (single SHA-256 over the reversed concatenation).
pub fn build_block_bind(modified_merkle_root: &str, prev_block_hash: &str) -> Result<Hash> {
    let root = decode_reversed(modified_merkle_root)?;
    let prev = decode_reversed(prev_block_hash)?;
    Ok(sha256_concat(&[&root, &prev]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha256;

    fn fake_txid(seed: u8) -> String {
        sha256(&[seed]).to_hex()
    }

    #[test]
    fn test_empty_branches_is_identity() {
        let txid = fake_txid(1);
        let root = build_merkle_root(&txid, &[]).unwrap();
        assert_eq!(root, txid);
    }

    #[test]
    fn test_single_branch_matches_manual_fold() {
        let txid = fake_txid(1);
        let branch = fake_txid(2);

        // Independent recomputation: reverse both, double-hash the
        // concatenation, reverse the result.
        let mut left = Hash::from_hex(&txid).unwrap().0;
        left.reverse();
        let mut right = Hash::from_hex(&branch).unwrap().0;
        right.reverse();
        let mut combined = Vec::new();
        combined.extend_from_slice(&left);
        combined.extend_from_slice(&right);
        let expected = crate::hash::sha256d(&combined).reversed().to_hex();

        let root = build_merkle_root(&txid, &[branch]).unwrap();
        assert_eq!(root, expected);
    }

    #[test]
    fn test_five_branches_matches_manual_fold() {
        let txid = fake_txid(0);
        let branches: Vec<String> = (1..=5).map(fake_txid).collect();

        let mut acc = Hash::from_hex(&txid).unwrap().0;
        acc.reverse();
        for b in &branches {
            let mut br = Hash::from_hex(b).unwrap().0;
            br.reverse();
            let mut combined = Vec::new();
            combined.extend_from_slice(&acc);
            combined.extend_from_slice(&br);
            acc = crate::hash::sha256d(&combined).0;
        }
        acc.reverse();

        let root = build_merkle_root(&txid, &branches).unwrap();
        assert_eq!(root, hex::encode(acc));
    }

    #[test]
    fn test_branch_order_matters() {
        let txid = fake_txid(0);
        let a = vec![fake_txid(1), fake_txid(2)];
        let b = vec![fake_txid(2), fake_txid(1)];
        assert_ne!(
            build_merkle_root(&txid, &a).unwrap(),
            build_merkle_root(&txid, &b).unwrap()
        );
    }

    #[test]
    fn test_root_is_deterministic() {
        let txid = fake_txid(7);
        let branches = vec![fake_txid(8), fake_txid(9)];
        let r1 = build_merkle_root(&txid, &branches).unwrap();
        let r2 = build_merkle_root(&txid, &branches).unwrap();
        assert_eq!(r1, r2);
    }

    #[test]
    fn test_invalid_hex_rejected() {
        assert!(matches!(
            build_merkle_root("not hex", &[]),
            Err(BlockBindError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_short_input_rejected() {
        assert!(matches!(
            build_merkle_root("abcd", &[]),
            Err(BlockBindError::InvalidLength(2))
        ));
    }

    #[test]
    fn test_block_bind_matches_manual() {
        let root = fake_txid(3);
        let prev = fake_txid(4);

        let mut r = Hash::from_hex(&root).unwrap().0;
        r.reverse();
        let mut p = Hash::from_hex(&prev).unwrap().0;
        p.reverse();
        let mut combined = Vec::new();
        combined.extend_from_slice(&r);
        combined.extend_from_slice(&p);
        let expected = sha256(&combined);

        assert_eq!(build_block_bind(&root, &prev).unwrap(), expected);
    }

    #[test]
    fn test_block_bind_sensitive_to_both_inputs() {
        let root = fake_txid(3);
        let prev = fake_txid(4);
        let bind = build_block_bind(&root, &prev).unwrap();
        assert_ne!(bind, build_block_bind(&prev, &root).unwrap());
        assert_ne!(bind, build_block_bind(&root, &fake_txid(5)).unwrap());
    }
}
