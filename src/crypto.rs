//! Cryptographic primitives for the attendance ledger
//!
//! Keys are secp256k1. Public keys travel as PEM `PUBLIC KEY` blocks
//! (SubjectPublicKeyInfo), private keys as PEM `EC PRIVATE KEY` blocks (SEC1),
//! and signatures as hex of the 64-byte compact ECDSA signature over the
//! SHA-256 digest of the payload. PKCS#8 `PRIVATE KEY` blocks are accepted on
//! input as well.

use crate::error::LedgerError;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{
    constants::COMPACT_SIGNATURE_SIZE, ecdsa::Signature, All, Message, PublicKey, Secp256k1,
    SecretKey,
};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// A thread-safe, lazily initialized Secp256k1 context.
static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// Why a signature check did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// Key, signature or encoding could not be decoded.
    #[error("Malformed input: {0}")]
    Malformed(String),
    /// Everything decoded but the signature does not match.
    #[error("Signature verification failed")]
    Mismatch,
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generates a new random KeyPair using the OS random number generator.
    pub fn generate() -> Self {
        let secret_key = SecretKey::new(&mut OsRng);
        Self::from_secret_key(secret_key)
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        KeyPair {
            secret_key,
            public_key,
        }
    }

    /// Parses a PEM private key: SEC1 `EC PRIVATE KEY` (with or without the
    /// embedded public key) or PKCS#8 `PRIVATE KEY`.
    pub fn from_private_pem(pem: &str) -> Result<Self, LedgerError> {
        let key = match k256::SecretKey::from_sec1_pem(pem) {
            Ok(key) => key,
            Err(sec1_err) => k256::SecretKey::from_pkcs8_pem(pem).map_err(|pkcs8_err| {
                LedgerError::Crypto(format!(
                    "Private key is neither SEC1 ({}) nor PKCS#8 ({})",
                    sec1_err, pkcs8_err
                ))
            })?,
        };
        let secret_key = SecretKey::from_slice(&key.to_bytes())
            .map_err(|e| LedgerError::Crypto(format!("Invalid secret key bytes: {}", e)))?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// SEC1 `EC PRIVATE KEY` PEM, including the curve and public key.
    pub fn private_key_pem(&self) -> Result<String, LedgerError> {
        let key = k256::SecretKey::from_slice(&self.secret_key.secret_bytes())
            .map_err(|e| LedgerError::Crypto(format!("Invalid secret key bytes: {}", e)))?;
        let pem = key
            .to_sec1_pem(LineEnding::LF)
            .map_err(|e| LedgerError::Crypto(format!("Failed to encode private key: {}", e)))?;
        Ok(pem.as_str().to_owned())
    }

    pub fn public_key_pem(&self) -> Result<String, LedgerError> {
        public_key_to_pem(&self.public_key)
    }

    /// Signs a message (hashed with SHA-256 first) and returns the compact signature bytes.
    pub fn sign(&self, message: &[u8]) -> [u8; COMPACT_SIGNATURE_SIZE] {
        let message = Message::from_digest(Sha256::digest(message).into());
        SECP256K1_CONTEXT
            .sign_ecdsa(&message, &self.secret_key)
            .serialize_compact()
    }

    /// Signs a payload string and returns the hex signature carried by transactions.
    pub fn sign_payload(&self, payload: &str) -> String {
        hex::encode(self.sign(payload.as_bytes()))
    }
}

/// SubjectPublicKeyInfo PEM carrying the uncompressed point.
pub fn public_key_to_pem(public_key: &PublicKey) -> Result<String, LedgerError> {
    let key = k256::PublicKey::from_sec1_bytes(&public_key.serialize_uncompressed())
        .map_err(|e| LedgerError::Crypto(format!("Invalid public key: {}", e)))?;
    key.to_public_key_pem(LineEnding::LF)
        .map_err(|e| LedgerError::Crypto(format!("Failed to encode public key: {}", e)))
}

/// Accepts SPKI-wrapped secp256k1 keys in either point encoding.
pub fn public_key_from_pem(pem: &str) -> Result<PublicKey, SignatureError> {
    let key = k256::PublicKey::from_public_key_pem(pem)
        .map_err(|e| SignatureError::Malformed(format!("Invalid public key PEM: {}", e)))?;
    PublicKey::from_slice(key.to_encoded_point(false).as_bytes())
        .map_err(|e| SignatureError::Malformed(format!("Invalid public key: {}", e)))
}

/// Verifies an ECDSA signature over `message`.
pub fn verify_signature(
    public_key: &PublicKey,
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<(), SignatureError> {
    if signature_bytes.len() != COMPACT_SIGNATURE_SIZE {
        return Err(SignatureError::Malformed(format!(
            "Signature must be exactly {} bytes (compact), got {}",
            COMPACT_SIGNATURE_SIZE,
            signature_bytes.len()
        )));
    }

    let signature = Signature::from_compact(signature_bytes)
        .map_err(|e| SignatureError::Malformed(format!("Invalid signature: {}", e)))?;
    let message = Message::from_digest(Sha256::digest(message).into());

    SECP256K1_CONTEXT
        .verify_ecdsa(&message, &signature, public_key)
        .map_err(|_| SignatureError::Mismatch)
}
