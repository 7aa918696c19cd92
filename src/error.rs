//! Error types for the attendance ledger

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Persisted chain exists but cannot be decoded. The ledger refuses to start.
    #[error("Corrupt chain state at {path}: {reason}")]
    CorruptState { path: String, reason: String },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Cryptographic error: {0}")]
    Crypto(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LedgerError>;
