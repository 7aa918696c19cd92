//! Proof-of-work mining

use crate::blockchain::{meets_difficulty, Block, UnminedBlock};
use std::time::Instant;
use tracing::debug;

/// Search nonces until the block hash has `difficulty` leading hex zeros.
///
/// Single-threaded and unbounded: expected work is about 16^difficulty hashes
/// and there is no cancellation. Run it on a blocking worker when the caller
/// must stay responsive.
pub fn mine_block(mut block: UnminedBlock, difficulty: usize) -> Block {
    let start = Instant::now();
    while !meets_difficulty(block.hash(), difficulty) {
        block.next_nonce();
    }

    let elapsed = start.elapsed();
    debug!(
        index = block.index(),
        nonce = block.nonce(),
        difficulty,
        elapsed_ms = elapsed.as_millis() as u64,
        hash_rate = (block.nonce() + 1) as f64 / elapsed.as_secs_f64().max(1e-9),
        "pow.solved"
    );

    block.seal()
}
