use serde::Deserialize;

use super::types::Transaction;
use crate::error::ChainError;

/// Body of a transaction submission before presence checks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTransactionRequest {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub amount: Option<f64>,
}

impl NewTransactionRequest {
    /// Require all three fields; nothing else about them is checked.
    pub fn into_transaction(self) -> Result<Transaction, ChainError> {
        match (self.sender, self.recipient, self.amount) {
            (Some(sender), Some(recipient), Some(amount)) => {
                Ok(Transaction::new(sender, recipient, amount))
            }
            _ => Err(ChainError::ValidationError("Missing values".to_string())),
        }
    }
}
