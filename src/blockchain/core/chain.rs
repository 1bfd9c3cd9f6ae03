use serde::{Deserialize, Serialize};

use crate::crypto::hash_canonical;
use crate::error::ChainError;
use crate::mempool::Mempool;
use crate::transaction::Transaction;

/// `previous_hash` carried by the genesis block in place of a digest.
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// Proof carried by the genesis block.
pub const GENESIS_PROOF: u64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    /// SHA-256 over the canonical (key-sorted) JSON form of the block.
    pub fn hash(&self) -> String {
        hash_canonical(self)
    }
}

fn now_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// The local ledger together with the transactions waiting for the next block.
///
/// Both live behind one lock in [`crate::node::Node`], so draining the pool
/// and pushing the block it becomes happen as a single step.
#[derive(Debug, Clone)]
pub struct Blockchain {
    pub blocks: Vec<Block>,
    pub mempool: Mempool,
}

impl Blockchain {
    /// A ledger holding only the genesis block.
    pub fn new() -> Self {
        let genesis = Block {
            index: 1,
            timestamp: now_seconds(),
            transactions: Vec::new(),
            proof: GENESIS_PROOF,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
        };

        Blockchain {
            blocks: vec![genesis],
            mempool: Mempool::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn last_block(&self) -> Result<&Block, ChainError> {
        self.blocks.last().ok_or(ChainError::EmptyLedger)
    }

    /// Queue a transaction and return the index of the block that will hold it.
    pub fn new_transaction(&mut self, tx: Transaction) -> u64 {
        self.mempool.add_transaction(tx);
        self.blocks.len() as u64 + 1
    }

    /// Seal every pending transaction into a new block.
    ///
    /// When `previous_hash` is `None` it is computed from the current last
    /// block. Nothing changes if that lookup fails.
    pub fn new_block(
        &mut self,
        proof: u64,
        previous_hash: Option<String>,
    ) -> Result<Block, ChainError> {
        let previous_hash = match previous_hash {
            Some(hash) => hash,
            None => self.last_block()?.hash(),
        };

        let block = Block {
            index: self.blocks.len() as u64 + 1,
            timestamp: now_seconds(),
            transactions: self.mempool.drain_all(),
            proof,
            previous_hash,
        };

        self.blocks.push(block.clone());
        Ok(block)
    }

    /// Credit `reward` and append a block, provided the tip is still the block
    /// hashing to `expected_tip`.
    pub fn append_on_tip(
        &mut self,
        expected_tip: &str,
        proof: u64,
        reward: Transaction,
    ) -> Result<Block, ChainError> {
        if self.last_block()?.hash() != expected_tip {
            return Err(ChainError::StaleTip);
        }
        self.mempool.add_transaction(reward);
        self.new_block(proof, Some(expected_tip.to_string()))
    }

    /// Swap in a whole chain. The caller validates it first.
    pub fn replace_chain(&mut self, chain: Vec<Block>) {
        self.blocks = chain;
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}
