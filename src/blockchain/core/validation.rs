use super::block::Block;
use thiserror::Error;

/// First inconsistency found while walking a chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainFault {
    #[error("Block {index}: stored hash does not match its contents")]
    HashMismatch { index: usize },
    #[error("Block {index}: previous_hash does not match the preceding block's hash")]
    BrokenLink { index: usize },
}

/// Re-hash every block after genesis and check its link to the predecessor.
///
/// Genesis is accepted as-is and proof-of-work is not re-checked. `index` in
/// the fault is the position in `blocks`.
pub fn validate_chain(blocks: &[Block]) -> Result<(), ChainFault> {
    for (index, pair) in blocks.windows(2).enumerate() {
        let (prev, curr) = (&pair[0], &pair[1]);
        let index = index + 1;

        if curr.compute_hash() != curr.hash {
            return Err(ChainFault::HashMismatch { index });
        }
        if curr.previous_hash.as_deref() != Some(prev.hash.as_str()) {
            return Err(ChainFault::BrokenLink { index });
        }
    }
    Ok(())
}
