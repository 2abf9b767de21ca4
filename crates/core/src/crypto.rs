//! Secp256k1 cryptographic primitives for signing and verification.
//!
//! Signatures are deterministic ECDSA (RFC 6979), so identical inputs always
//! produce identical signatures. Public keys use the 33-byte compressed SEC1
//! encoding, signatures the DER encoding, both carried as hex strings in
//! documents and scripts.

use crate::hash::{sha256, Hash};
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature as EcdsaSignature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("invalid signature encoding")]
    InvalidSignature,
    #[error("signing failed")]
    SigningFailed,
    #[error("signature verification failed")]
    VerificationFailed,
}

/// A compressed secp256k1 public key.
#[derive(Clone)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Get the 33-byte compressed SEC1 encoding.
    pub fn to_bytes(&self) -> [u8; 33] {
        let point = self.0.to_encoded_point(true);
        let mut arr = [0u8; 33];
        arr.copy_from_slice(point.as_bytes());
        arr
    }

    /// Convert to a compressed hex string (66 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parse from a compressed hex string.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidPublicKey)?;
        Self::from_sec1_bytes(&bytes)
    }

    /// Parse from SEC1-encoded bytes.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let key = VerifyingKey::from_sec1_bytes(bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(key))
    }

    /// Verify a signature over a 32-byte digest against this public key.
    pub fn verify_hash(&self, digest: &Hash, signature: &Signature) -> Result<(), CryptoError> {
        self.0
            .verify_prehash(digest.as_bytes(), &signature.0)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..8])
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PublicKey {}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PublicKey::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A DER-encoded ECDSA signature.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(EcdsaSignature);

impl Signature {
    /// Get the DER encoding.
    pub fn to_der_bytes(&self) -> Vec<u8> {
        self.0.to_der().as_bytes().to_vec()
    }

    /// Convert to a DER hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_der_bytes())
    }

    /// Parse from a DER hex string.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidSignature)?;
        Self::from_der_bytes(&bytes)
    }

    /// Parse from DER-encoded bytes.
    pub fn from_der_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let sig = EcdsaSignature::from_der(bytes).map_err(|_| CryptoError::InvalidSignature)?;
        Ok(Self(sig))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", &self.to_hex()[..16])
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A keypair for signing and verification.
pub struct Keypair {
    signing_key: SigningKey,
    pub public_key: PublicKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        let public_key = PublicKey(*signing_key.verifying_key());
        Self {
            signing_key,
            public_key,
        }
    }

    /// Create a keypair from a private key (32 bytes).
    pub fn from_private_key(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_slice(bytes).map_err(|_| CryptoError::InvalidPrivateKey)?;
        let public_key = PublicKey(*signing_key.verifying_key());
        Ok(Self {
            signing_key,
            public_key,
        })
    }

    /// Get the private key bytes.
    pub fn private_key(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }

    /// Sign a 32-byte digest directly.
    pub fn sign_hash(&self, digest: &Hash) -> Result<Signature, CryptoError> {
        let sig: EcdsaSignature = self
            .signing_key
            .sign_prehash(digest.as_bytes())
            .map_err(|_| CryptoError::SigningFailed)?;
        Ok(Signature(sig))
    }

    /// Sign a message (single SHA-256, then ECDSA over the digest).
    pub fn sign(&self, message: &[u8]) -> Result<Signature, CryptoError> {
        self.sign_hash(&sha256(message))
    }

    /// Verify a signature over a digest against our public key.
    pub fn verify_hash(&self, digest: &Hash, signature: &Signature) -> Result<(), CryptoError> {
        self.public_key.verify_hash(digest, signature)
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key.to_hex())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let kp = Keypair::generate();
        let bytes = kp.public_key.to_bytes();
        assert!(bytes[0] == 0x02 || bytes[0] == 0x03);
    }

    #[test]
    fn test_sign_and_verify() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"hello world").unwrap();
        assert!(kp.verify_hash(&sha256(b"hello world"), &sig).is_ok());
    }

    #[test]
    fn test_wrong_message_fails() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"hello").unwrap();
        assert!(kp.verify_hash(&sha256(b"world"), &sig).is_err());
    }

    #[test]
    fn test_wrong_key_fails() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::generate();
        let sig = kp1.sign(b"hello").unwrap();
        assert!(kp2.verify_hash(&sha256(b"hello"), &sig).is_err());
    }

    #[test]
    fn test_signatures_are_deterministic() {
        // RFC 6979: same key + same digest must give byte-identical signatures.
        let kp = Keypair::generate();
        let s1 = kp.sign(b"fixture input").unwrap();
        let s2 = kp.sign(b"fixture input").unwrap();
        assert_eq!(s1.to_hex(), s2.to_hex());
    }

    #[test]
    fn test_public_key_hex_roundtrip() {
        let kp = Keypair::generate();
        let hex_str = kp.public_key.to_hex();
        assert_eq!(hex_str.len(), 66);
        let parsed = PublicKey::from_hex(&hex_str).unwrap();
        assert_eq!(parsed, kp.public_key);
    }

    #[test]
    fn test_signature_hex_roundtrip() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"encode me").unwrap();
        let parsed = Signature::from_hex(&sig.to_hex()).unwrap();
        assert_eq!(parsed, sig);
    }

    #[test]
    fn test_keypair_from_private_key() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::from_private_key(&kp1.private_key()).unwrap();
        assert_eq!(kp1.public_key, kp2.public_key);
    }

    #[test]
    fn test_invalid_public_key_hex() {
        assert!(PublicKey::from_hex("zz").is_err());
        assert!(PublicKey::from_hex("0011").is_err());
    }
}
