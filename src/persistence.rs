//! Durable storage for the chain

use crate::blockchain::Block;
use crate::error::{LedgerError, Result};
use parking_lot::Mutex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::debug;

/// Abstraction for persistence backends. `save_blocks` replaces the whole
/// stored chain; implementations must not leave a partially written chain behind.
pub trait Persistence: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet. Undecodable state is
    /// [`LedgerError::CorruptState`].
    fn load_blocks(&self) -> Result<Option<Vec<Block>>>;
    fn save_blocks(&self, blocks: &[Block]) -> Result<()>;
}

/// Pretty-printed JSON document holding the ordered list of block records.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt(&self, reason: impl ToString) -> LedgerError {
        LedgerError::CorruptState {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl Persistence for JsonFilePersistence {
    fn load_blocks(&self) -> Result<Option<Vec<Block>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| self.corrupt(e))?;
        let blocks: Vec<Block> = serde_json::from_str(&contents).map_err(|e| self.corrupt(e))?;
        debug!(path = %self.path.display(), blocks = blocks.len(), "chain.loaded");
        Ok(Some(blocks))
    }

    fn save_blocks(&self, blocks: &[Block]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        // Write beside the target and rename over it so readers never see a torn file.
        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, blocks)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| LedgerError::Storage(format!("Failed to replace {}: {}", self.path.display(), e)))?;

        debug!(path = %self.path.display(), blocks = blocks.len(), "chain.persisted");
        Ok(())
    }
}

/// Simple in-memory persistence implementation useful for tests and ephemeral runs.
#[derive(Clone, Default)]
pub struct InMemoryPersistence {
    pub blocks: Arc<Mutex<Option<Vec<Block>>>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for InMemoryPersistence {
    fn load_blocks(&self) -> Result<Option<Vec<Block>>> {
        Ok(self.blocks.lock().clone())
    }

    fn save_blocks(&self, blocks: &[Block]) -> Result<()> {
        *self.blocks.lock() = Some(blocks.to_vec());
        Ok(())
    }
}
