/// Transaction types for TallyChain
use serde::{Deserialize, Serialize};

/// Sender recorded on the transaction that credits a miner for a new block.
pub const REWARD_SENDER: &str = "0";

/// Amount credited to the miner of each block.
pub const MINING_REWARD: f64 = 1.0;

/// A transfer of `amount` from `sender` to `recipient`.
///
/// Identifiers are opaque strings and amounts are not range checked; a
/// transaction is only guaranteed to carry all three fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }

    /// The reward paid to `node_id` for mining a block.
    pub fn reward(node_id: impl Into<String>) -> Self {
        Self::new(REWARD_SENDER, node_id, MINING_REWARD)
    }

    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }
}
