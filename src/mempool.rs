//! Pending transactions awaiting inclusion in the next block

use crate::transaction::Transaction;

#[derive(Debug, Clone, Default)]
pub struct Mempool {
    transactions: Vec<Transaction>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a transaction behind everything already pending.
    pub fn add_transaction(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    /// Hand every pending transaction over, leaving the pool empty.
    pub fn drain_all(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.transactions)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order_and_empties() {
        let mut pool = Mempool::new();
        pool.add_transaction(Transaction::new("A", "B", 1.0));
        pool.add_transaction(Transaction::new("B", "C", 2.0));
        assert_eq!(pool.len(), 2);

        let drained = pool.drain_all();
        assert_eq!(drained[0].sender, "A");
        assert_eq!(drained[1].sender, "B");
        assert!(pool.is_empty());
        assert!(pool.drain_all().is_empty());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut pool = Mempool::new();
        let tx = Transaction::new("A", "B", 5.0);
        pool.add_transaction(tx.clone());
        pool.add_transaction(tx);
        assert_eq!(pool.drain_all().len(), 2);
    }
}
