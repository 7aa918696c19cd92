//! Ledger service: the entry point used by request handlers and the CLI.

use crate::blockchain::{Block, ChainStore};
use crate::config::LedgerConfig;
use crate::error::Result;
use crate::persistence::{JsonFilePersistence, Persistence};
use crate::transaction::Transaction;
use tracing::info;

/// Result of a mine request.
#[derive(Debug, Clone, PartialEq)]
pub enum MineOutcome {
    Mined(Block),
    NothingToMine,
}

/// Read the persisted chain without initialising a ledger. Nothing is mined or
/// written; `Ok(None)` when no chain file exists yet.
pub fn load_chain(config: &LedgerConfig) -> Result<Option<Vec<Block>>> {
    JsonFilePersistence::new(&config.chain_path).load_blocks()
}

/// Owns the single [`ChainStore`] for the process. Construct once at start-up,
/// share by reference (or `Arc`), and call [`LedgerService::shutdown`] on exit.
pub struct LedgerService {
    store: ChainStore,
}

impl LedgerService {
    pub fn new(store: ChainStore) -> Self {
        Self { store }
    }

    /// Initialise with an explicit persistence backend.
    pub fn with_persistence(difficulty: usize, persistence: Box<dyn Persistence>) -> Result<Self> {
        Ok(Self::new(ChainStore::initialize(difficulty, persistence)?))
    }

    /// Initialise from configuration, storing the chain as a JSON file.
    pub fn open(config: &LedgerConfig) -> Result<Self> {
        info!(path = %config.chain_path, difficulty = config.difficulty, "Opening ledger");
        Self::with_persistence(
            config.difficulty,
            Box::new(JsonFilePersistence::new(&config.chain_path)),
        )
    }

    /// `true` when the transaction was queued for mining.
    pub fn submit(&self, tx: Transaction) -> bool {
        self.store.submit(tx)
    }

    /// Blocks the calling thread for the whole proof-of-work search.
    pub fn mine(&self) -> Result<MineOutcome> {
        Ok(match self.store.mine()? {
            Some(block) => MineOutcome::Mined(block),
            None => MineOutcome::NothingToMine,
        })
    }

    pub fn chain(&self) -> Vec<Block> {
        self.store.blocks()
    }

    pub fn validate(&self) -> bool {
        self.store.validate()
    }

    pub fn pending(&self) -> Vec<Transaction> {
        self.store.pending()
    }

    pub fn difficulty(&self) -> usize {
        self.store.difficulty()
    }

    pub fn store(&self) -> &ChainStore {
        &self.store
    }

    /// Final persist before the process exits.
    pub fn shutdown(&self) -> Result<()> {
        self.store.persist()?;
        info!(blocks = self.store.height(), "Ledger persisted on shutdown");
        Ok(())
    }
}
