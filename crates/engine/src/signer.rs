//! Signing over chain key material.
//!
//! Callers never handle private keys: they name an identity, a chain, and a
//! role, and pass the payload to be signed. Signatures are deterministic
//! (RFC 6979), so re-signing the same inputs always yields the same bytes.

use crate::Result;
use minerid_core::{sha256, Hash, Keypair, PublicKey, Signature};
use minerid_storage::{ChainKind, KeyChainStore, Storage};

/// Which key version of a chain signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    Current,
    Previous,
}

/// Produces and verifies signatures against an identity's chain keys.
pub struct SigningService<'a> {
    keys: KeyChainStore<'a>,
}

impl<'a> SigningService<'a> {
    /// Create a new SigningService over the given storage.
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            keys: KeyChainStore::new(storage),
        }
    }

    fn keypair_for(&self, name: &str, kind: ChainKind, role: KeyRole) -> Result<Keypair> {
        let count = self.keys.version_count(name, kind)?;
        let index = match role {
            KeyRole::Current => count,
            KeyRole::Previous => count.max(2) - 1,
        };
        let secret = self.keys.signing_key_bytes(name, kind, index)?;
        Ok(Keypair::from_private_key(&secret)?)
    }

    /// Sign a payload: single SHA-256, then ECDSA over the digest.
    pub fn sign(
        &self,
        name: &str,
        kind: ChainKind,
        role: KeyRole,
        payload: &[u8],
    ) -> Result<Signature> {
        self.sign_hash(name, kind, role, &sha256(payload))
    }

    /// Sign a precomputed 32-byte digest.
    pub fn sign_hash(
        &self,
        name: &str,
        kind: ChainKind,
        role: KeyRole,
        digest: &Hash,
    ) -> Result<Signature> {
        let keypair = self.keypair_for(name, kind, role)?;
        Ok(keypair.sign_hash(digest)?)
    }

    /// Verify a signature over a digest against a public key.
    pub fn verify(digest: &Hash, signature: &Signature, public_key: &PublicKey) -> bool {
        public_key.verify_hash(digest, signature).is_ok()
    }
}

/// The byte payload certifying a key handover: the raw compressed encodings
/// of the previous and current keys, concatenated.
pub fn key_link_payload(previous: &PublicKey, current: &PublicKey) -> Vec<u8> {
    let mut payload = Vec::with_capacity(66);
    payload.extend_from_slice(&previous.to_bytes());
    payload.extend_from_slice(&current.to_bytes());
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Storage {
        Storage::open_temporary().unwrap()
    }

    #[test]
    fn test_sign_verifies_against_current_key() {
        let storage = setup();
        let keys = KeyChainStore::new(&storage);
        let signer = SigningService::new(&storage);

        keys.create_chain("alpha", ChainKind::MinerId).unwrap();
        let sig = signer
            .sign("alpha", ChainKind::MinerId, KeyRole::Current, b"payload")
            .unwrap();

        let current = keys.current("alpha", ChainKind::MinerId).unwrap();
        assert!(SigningService::verify(
            &sha256(b"payload"),
            &sig,
            &current.public_key
        ));
    }

    #[test]
    fn test_previous_role_on_fresh_chain_is_current() {
        let storage = setup();
        let keys = KeyChainStore::new(&storage);
        let signer = SigningService::new(&storage);

        keys.create_chain("alpha", ChainKind::MinerId).unwrap();
        let sig = signer
            .sign("alpha", ChainKind::MinerId, KeyRole::Previous, b"payload")
            .unwrap();

        let current = keys.current("alpha", ChainKind::MinerId).unwrap();
        assert!(SigningService::verify(
            &sha256(b"payload"),
            &sig,
            &current.public_key
        ));
    }

    #[test]
    fn test_previous_role_after_rotation() {
        let storage = setup();
        let keys = KeyChainStore::new(&storage);
        let signer = SigningService::new(&storage);

        keys.create_chain("alpha", ChainKind::MinerId).unwrap();
        let v1 = keys.current("alpha", ChainKind::MinerId).unwrap();
        keys.append_version("alpha", ChainKind::MinerId).unwrap();

        let sig = signer
            .sign("alpha", ChainKind::MinerId, KeyRole::Previous, b"payload")
            .unwrap();
        assert!(SigningService::verify(
            &sha256(b"payload"),
            &sig,
            &v1.public_key
        ));

        let current = keys.current("alpha", ChainKind::MinerId).unwrap();
        assert!(!SigningService::verify(
            &sha256(b"payload"),
            &sig,
            &current.public_key
        ));
    }

    #[test]
    fn test_signing_is_deterministic() {
        let storage = setup();
        let keys = KeyChainStore::new(&storage);
        let signer = SigningService::new(&storage);

        keys.create_chain("alpha", ChainKind::MinerId).unwrap();
        let s1 = signer
            .sign("alpha", ChainKind::MinerId, KeyRole::Current, b"same input")
            .unwrap();
        let s2 = signer
            .sign("alpha", ChainKind::MinerId, KeyRole::Current, b"same input")
            .unwrap();
        assert_eq!(s1.to_hex(), s2.to_hex());
    }

    #[test]
    fn test_sign_unknown_identity_fails() {
        let storage = setup();
        let signer = SigningService::new(&storage);
        assert!(signer
            .sign("ghost", ChainKind::MinerId, KeyRole::Current, b"x")
            .is_err());
    }

    #[test]
    fn test_key_link_payload_layout() {
        let storage = setup();
        let keys = KeyChainStore::new(&storage);

        keys.create_chain("alpha", ChainKind::MinerId).unwrap();
        keys.append_version("alpha", ChainKind::MinerId).unwrap();
        let prev = keys.previous("alpha", ChainKind::MinerId).unwrap();
        let cur = keys.current("alpha", ChainKind::MinerId).unwrap();

        let payload = key_link_payload(&prev.public_key, &cur.public_key);
        assert_eq!(payload.len(), 66);
        assert_eq!(&payload[..33], &prev.public_key.to_bytes());
        assert_eq!(&payload[33..], &cur.public_key.to_bytes());
    }
}
