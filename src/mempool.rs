//! Pending-transaction pool

use crate::transaction::Transaction;
use parking_lot::Mutex;

/// Ordered pool of accepted transactions awaiting inclusion in a block.
///
/// Every operation takes the pool lock, so a snapshot never observes a
/// half-finished append.
#[derive(Debug, Default)]
pub struct Mempool {
    transactions: Mutex<Vec<Transaction>>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_transaction(&self, tx: Transaction) {
        self.transactions.lock().push(tx);
    }

    /// Copy of the pool in arrival order.
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.transactions.lock().clone()
    }

    /// Remove the first `count` transactions, keeping anything appended after a snapshot.
    pub fn drain_front(&self, count: usize) {
        let mut pool = self.transactions.lock();
        let count = count.min(pool.len());
        pool.drain(..count);
    }

    pub fn len(&self) -> usize {
        self.transactions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Amount;
    use std::sync::Arc;
    use std::thread;

    fn tx(n: i64) -> Transaction {
        Transaction::new(format!("s{}", n), "r", Amount::from_tenths(n))
    }

    #[test]
    fn test_snapshot_preserves_order() {
        let pool = Mempool::new();
        for n in 0..3 {
            pool.add_transaction(tx(n));
        }
        let snapshot = pool.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].sender, "s0");
        assert_eq!(snapshot[2].sender, "s2");
    }

    #[test]
    fn test_drain_front_keeps_later_arrivals() {
        let pool = Mempool::new();
        pool.add_transaction(tx(1));
        pool.add_transaction(tx(2));
        let snapshot = pool.snapshot();

        pool.add_transaction(tx(3));
        pool.drain_front(snapshot.len());

        let remaining = pool.snapshot();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].sender, "s3");
    }

    #[test]
    fn test_drain_more_than_len() {
        let pool = Mempool::new();
        pool.add_transaction(tx(1));
        pool.drain_front(10);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_concurrent_appends_are_not_lost() {
        let pool = Arc::new(Mempool::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let pool = pool.clone();
                thread::spawn(move || {
                    for n in 0..50 {
                        pool.add_transaction(tx(t * 100 + n));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(pool.len(), 400);
    }
}
