//! Signature verification and admission policy, separated from type definitions
use crate::crypto::{self, SignatureError};
use crate::transaction::types::Transaction;
use serde_json::Value;

/// Metadata key carrying an identity claim from the attendance collaborator.
///
/// Transactions with a truthy value under this key are admitted without a
/// signature. The ledger trusts whoever sets it, so any caller able to submit
/// metadata can claim an identity. Hardening (e.g. an issuer signature over the
/// attestation) belongs here.
pub const ATTESTATION_KEY: &str = "student_id";

/// Outcome of checking a transaction's signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Authenticated,
    /// Key and signature decode, but the signature does not cover the payload.
    BadSignature,
    /// Missing or undecodable signature or public key.
    MalformedInput,
}

impl From<SignatureError> for Verification {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::Malformed(_) => Verification::MalformedInput,
            SignatureError::Mismatch => Verification::BadSignature,
        }
    }
}

impl Transaction {
    /// Detailed signature check. Never fails; every problem maps to a variant.
    pub fn verification(&self) -> Verification {
        if self.signature.is_empty() || self.public_key.is_empty() {
            return Verification::MalformedInput;
        }

        let public_key = match crypto::public_key_from_pem(&self.public_key) {
            Ok(key) => key,
            Err(e) => return e.into(),
        };
        let signature = match hex::decode(&self.signature) {
            Ok(bytes) => bytes,
            Err(_) => return Verification::MalformedInput,
        };

        match crypto::verify_signature(
            &public_key,
            self.canonical_signed_payload().as_bytes(),
            &signature,
        ) {
            Ok(()) => Verification::Authenticated,
            Err(e) => e.into(),
        }
    }

    /// Whether the signature verifies against the canonical payload.
    pub fn verify(&self) -> bool {
        self.verification() == Verification::Authenticated
    }

    /// Whether the transaction carries a truthy identity claim under [`ATTESTATION_KEY`].
    pub fn is_exempt(&self) -> bool {
        self.metadata.get(ATTESTATION_KEY).is_some_and(is_truthy)
    }

    /// Admission rule for the pending pool.
    pub fn is_admissible(&self) -> bool {
        self.verify() || self.is_exempt()
    }
}

/// Null, false, zero, and empty strings, arrays or objects are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
