//! Transactions: record types, canonical encodings and admission policy

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::{Verification, ATTESTATION_KEY};
