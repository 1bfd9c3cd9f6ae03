//! Registry of known peers
//!
//! Peers are stored by network location (`host:port`). Any scheme, path,
//! query or fragment supplied at registration is dropped, so
//! `http://10.0.0.2:5000/` and `10.0.0.2:5000` name the same peer.

use std::collections::BTreeSet;

use crate::error::ChainError;

/// Reduce a peer address to its network-location form.
pub fn normalize_address(address: &str) -> Result<String, ChainError> {
    let trimmed = address.trim();
    let without_scheme = match trimmed.find("://") {
        Some(pos) => &trimmed[pos + 3..],
        None => trimmed.strip_prefix("//").unwrap_or(trimmed),
    };
    let location = without_scheme
        .split(|c| matches!(c, '/' | '?' | '#'))
        .next()
        .unwrap_or_default();

    if location.is_empty() {
        return Err(ChainError::InvalidPeerAddress(address.to_string()));
    }
    Ok(location.to_string())
}

/// Append-only set of peer locations.
#[derive(Debug, Clone, Default)]
pub struct PeerRegistry {
    peers: BTreeSet<String>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer; returns `false` when it was already known.
    pub fn register(&mut self, address: &str) -> Result<bool, ChainError> {
        let location = normalize_address(address)?;
        Ok(self.peers.insert(location))
    }

    pub fn peers(&self) -> Vec<String> {
        self.peers.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
