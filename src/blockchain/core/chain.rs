use crate::error::{LedgerError, Result};
use crate::mempool::Mempool;
use crate::miner::mine_block;
use crate::persistence::Persistence;
use crate::transaction::Transaction;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::block::{Block, UnminedBlock, MAX_DIFFICULTY};
use super::validation::{validate_chain, ChainFault};

/// The ordered chain plus the pending pool, backed by a [`Persistence`] store.
///
/// `submit` only takes the pool lock. `mine` holds the mining lock for its whole
/// run (snapshot, proof-of-work, append, persist, drain), so two mines never race
/// for the same index and transactions arriving mid-mine stay pending.
pub struct ChainStore {
    blocks: RwLock<Vec<Block>>,
    mempool: Mempool,
    difficulty: usize,
    persistence: Box<dyn Persistence>,
    mining: Mutex<()>,
}

impl ChainStore {
    /// Load the persisted chain, or mine and persist a genesis block when none exists.
    ///
    /// Stored state that cannot be decoded, or an empty stored chain, aborts start-up.
    pub fn initialize(difficulty: usize, persistence: Box<dyn Persistence>) -> Result<Self> {
        if difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::Config(format!(
                "difficulty {} exceeds the {} hex digits of a block hash",
                difficulty, MAX_DIFFICULTY
            )));
        }

        let blocks = match persistence.load_blocks()? {
            Some(blocks) if blocks.is_empty() => {
                return Err(LedgerError::CorruptState {
                    path: "<chain store>".to_string(),
                    reason: "persisted chain has no genesis block".to_string(),
                })
            }
            Some(blocks) => {
                info!(blocks = blocks.len(), difficulty, "Loaded persisted chain");
                blocks
            }
            None => {
                let genesis = mine_block(UnminedBlock::genesis(), difficulty);
                info!(hash = %genesis.hash(), difficulty, "Mined genesis block");
                let blocks = vec![genesis];
                persistence.save_blocks(&blocks)?;
                blocks
            }
        };

        Ok(ChainStore {
            blocks: RwLock::new(blocks),
            mempool: Mempool::new(),
            difficulty,
            persistence,
            mining: Mutex::new(()),
        })
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Queue a transaction if it is authenticated or exempt. Returns whether it was queued.
    pub fn submit(&self, tx: Transaction) -> bool {
        if !tx.is_admissible() {
            warn!(
                sender = %tx.sender,
                recipient = %tx.recipient,
                verification = ?tx.verification(),
                "Rejected transaction"
            );
            return false;
        }
        debug!(sender = %tx.sender, recipient = %tx.recipient, exempt = tx.is_exempt(), "Accepted transaction");
        self.mempool.add_transaction(tx);
        true
    }

    /// Mine the pending pool into the next block.
    ///
    /// `Ok(None)` when the pool is empty. On a persistence failure the new block is
    /// dropped and the pool left untouched.
    pub fn mine(&self) -> Result<Option<Block>> {
        let _guard = self.mining.lock();

        let pending = self.mempool.snapshot();
        if pending.is_empty() {
            return Ok(None);
        }
        let count = pending.len();

        let (index, previous_hash) = {
            let blocks = self.blocks.read();
            let tip = blocks.last().ok_or_else(|| {
                LedgerError::Storage("chain has no genesis block".to_string())
            })?;
            (tip.index() + 1, tip.hash().to_string())
        };

        let block = mine_block(UnminedBlock::new(index, Some(previous_hash), pending), self.difficulty);

        {
            let mut blocks = self.blocks.write();
            blocks.push(block.clone());
            if let Err(e) = self.persistence.save_blocks(&blocks) {
                blocks.pop();
                return Err(e);
            }
        }
        self.mempool.drain_front(count);

        info!(index, transactions = count, hash = %block.hash(), nonce = block.nonce(), "Mined block");
        Ok(Some(block))
    }

    /// Details of the first inconsistency, if any.
    pub fn check(&self) -> std::result::Result<(), ChainFault> {
        validate_chain(&self.blocks.read())
    }

    /// Whether every block after genesis matches its hash and links to its predecessor.
    pub fn validate(&self) -> bool {
        match self.check() {
            Ok(()) => true,
            Err(fault) => {
                warn!(%fault, "Chain validation failed");
                false
            }
        }
    }

    /// Write the current chain to storage.
    pub fn persist(&self) -> Result<()> {
        self.persistence.save_blocks(&self.blocks.read())
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.blocks.read().clone()
    }

    pub fn tip(&self) -> Option<Block> {
        self.blocks.read().last().cloned()
    }

    pub fn height(&self) -> usize {
        self.blocks.read().len()
    }

    pub fn pending(&self) -> Vec<Transaction> {
        self.mempool.snapshot()
    }

    pub fn pending_count(&self) -> usize {
        self.mempool.len()
    }
}
