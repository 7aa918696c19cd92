//! Attendance Ledger - a single-node, append-only proof-of-work ledger
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`transaction`] - Transactions, canonical payloads and signature policy
//! - [`blockchain`] - Blocks, the chain store and chain validation
//! - [`mempool`] - Pending-transaction pool
//! - [`ledger`] - Service façade used by callers
//!
//! ## Consensus
//! - [`miner`] - Proof-of-work mining
//!
//! ## Cryptography
//! - [`crypto`] - secp256k1 keys, PEM encoding, signing and verification
//!
//! ## State Management
//! - [`persistence`] - JSON file and in-memory storage
//!
//! ## Integration
//! - [`attendance`] - Geofence check producing attendance transactions
//! - [`api`] - HTTP endpoints (feature `api`)
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`logging`] - Tracing subscriber setup

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod ledger;
pub mod mempool;
pub mod transaction;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod miner;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// State Management
// ============================================================================
pub mod persistence;

// ============================================================================
// Integration
// ============================================================================
#[cfg(feature = "api")]
pub mod api;
pub mod attendance;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
pub mod logging;
