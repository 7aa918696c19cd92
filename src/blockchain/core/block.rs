use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest.
pub type BlockHash = String;

/// Length of a hex SHA-256 digest; no hash can carry more leading zeros.
pub const MAX_DIFFICULTY: usize = 64;

/// Digest over `index`, `timestamp`, `previous_hash` (empty for genesis), the
/// compact JSON list of transaction content records, and `nonce`, concatenated
/// in that order.
pub fn content_hash(
    index: u64,
    timestamp: u64,
    previous_hash: Option<&str>,
    transactions: &[Transaction],
    nonce: u64,
) -> BlockHash {
    let records: Vec<Value> = transactions.iter().map(Transaction::content_record).collect();
    let tx_json = serde_json::to_string(&records).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(index.to_string());
    hasher.update(timestamp.to_string());
    hasher.update(previous_hash.unwrap_or(""));
    hasher.update(tx_json);
    hasher.update(nonce.to_string());
    hex::encode(hasher.finalize())
}

/// True when `hash` starts with at least `difficulty` '0' characters.
pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

/// A block whose header is fixed but whose proof-of-work is still being searched.
///
/// Only the miner can turn this into a [`Block`], and only once the hash meets
/// the difficulty.
#[derive(Debug, Clone)]
pub struct UnminedBlock {
    index: u64,
    timestamp: u64,
    previous_hash: Option<BlockHash>,
    transactions: Vec<Transaction>,
    nonce: u64,
    hash: BlockHash,
}

impl UnminedBlock {
    /// Stamped with the current wall-clock time in epoch milliseconds.
    pub fn new(index: u64, previous_hash: Option<BlockHash>, transactions: Vec<Transaction>) -> Self {
        let timestamp = chrono::Utc::now().timestamp_millis() as u64;
        Self::with_timestamp(index, timestamp, previous_hash, transactions)
    }

    pub fn with_timestamp(
        index: u64,
        timestamp: u64,
        previous_hash: Option<BlockHash>,
        transactions: Vec<Transaction>,
    ) -> Self {
        let hash = content_hash(index, timestamp, previous_hash.as_deref(), &transactions, 0);
        UnminedBlock {
            index,
            timestamp,
            previous_hash,
            transactions,
            nonce: 0,
            hash,
        }
    }

    /// Index 0, no predecessor, no transactions.
    pub fn genesis() -> Self {
        Self::new(0, None, Vec::new())
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Advance to the next nonce and recompute the hash.
    pub(crate) fn next_nonce(&mut self) {
        self.nonce += 1;
        self.hash = content_hash(
            self.index,
            self.timestamp,
            self.previous_hash.as_deref(),
            &self.transactions,
            self.nonce,
        );
    }

    pub(crate) fn seal(self) -> Block {
        Block {
            index: self.index,
            timestamp: self.timestamp,
            previous_hash: self.previous_hash,
            transactions: self.transactions,
            nonce: self.nonce,
            hash: self.hash,
        }
    }
}

/// A mined block. The serde form is the persisted block record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub(crate) index: u64,
    pub(crate) timestamp: u64,
    pub(crate) previous_hash: Option<BlockHash>,
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) nonce: u64,
    pub(crate) hash: BlockHash,
}

impl Block {
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn previous_hash(&self) -> Option<&str> {
        self.previous_hash.as_deref()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// The stored hash, as mined or as loaded.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Recompute the digest from the stored fields.
    pub fn compute_hash(&self) -> BlockHash {
        content_hash(
            self.index,
            self.timestamp,
            self.previous_hash.as_deref(),
            &self.transactions,
            self.nonce,
        )
    }

    pub fn is_self_consistent(&self) -> bool {
        self.compute_hash() == self.hash
    }
}
