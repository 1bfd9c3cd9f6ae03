//! Error types for TallyChain

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ChainError {
    /// Malformed caller input, surfaced to the boundary as a client error.
    #[error("{0}")]
    ValidationError(String),
    #[error("Peer {peer} unreachable: {reason}")]
    PeerUnreachable { peer: String, reason: String },
    #[error("Peer {0} served an invalid chain")]
    InvalidChain(String),
    #[error("Peer {peer} sent a malformed payload: {reason}")]
    MalformedPayload { peer: String, reason: String },
    #[error("Ledger has no blocks")]
    EmptyLedger,
    #[error("Chain tip changed while mining")]
    StaleTip,
    #[error("Invalid peer address: {0}")]
    InvalidPeerAddress(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Background task failed: {0}")]
    TaskError(String),
}

impl ChainError {
    /// Errors caused by a peer rather than by this node or its caller.
    pub fn is_peer_fault(&self) -> bool {
        matches!(
            self,
            ChainError::PeerUnreachable { .. }
                | ChainError::InvalidChain(_)
                | ChainError::MalformedPayload { .. }
        )
    }
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_fault_classification() {
        assert!(ChainError::InvalidChain("a:1".to_string()).is_peer_fault());
        assert!(ChainError::PeerUnreachable {
            peer: "a:1".to_string(),
            reason: "refused".to_string()
        }
        .is_peer_fault());
        assert!(!ChainError::TaskError("cancelled".to_string()).is_peer_fault());
        assert!(!ChainError::StaleTip.is_peer_fault());
    }
}
