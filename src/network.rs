//! Peer-to-peer chain retrieval
//!
//! The only inter-node protocol is `GET http://{peer}/chain`, answered with a
//! [`ChainResponse`]. [`ChainFetcher`] is the seam the consensus resolver
//! talks through; [`HttpChainFetcher`] is the production implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::blockchain::Block;
use crate::error::ChainError;

/// Wire shape of a node's `/chain` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainResponse {
    pub chain: Vec<Block>,
    pub length: u64,
}

impl ChainResponse {
    pub fn from_blocks(chain: Vec<Block>) -> Self {
        let length = chain.len() as u64;
        Self { chain, length }
    }
}

#[async_trait]
pub trait ChainFetcher: Send + Sync {
    /// Retrieve the full chain served by `peer` (a `host:port` location).
    async fn fetch_chain(&self, peer: &str) -> Result<ChainResponse, ChainError>;
}

pub struct HttpChainFetcher {
    client: reqwest::Client,
}

impl HttpChainFetcher {
    /// `timeout` bounds each peer request end to end.
    pub fn new(timeout: Duration) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::ConfigError(format!("HTTP client error: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ChainFetcher for HttpChainFetcher {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainResponse, ChainError> {
        let url = format!("http://{}/chain", peer);
        debug!(%url, "peer.fetch_chain");

        let unreachable = |reason: String| ChainError::PeerUnreachable {
            peer: peer.to_string(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(unreachable(format!("HTTP {}", response.status())));
        }

        response.json::<ChainResponse>().await.map_err(|e| {
            if e.is_timeout() {
                unreachable(e.to_string())
            } else {
                ChainError::MalformedPayload {
                    peer: peer.to_string(),
                    reason: e.to_string(),
                }
            }
        })
    }
}
