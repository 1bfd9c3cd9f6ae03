//! Longest-valid-chain conflict resolution
//!
//! Every registered peer is asked for its chain concurrently. A peer that is
//! unreachable, slow, answers with an error status, sends a malformed payload
//! or serves a chain that fails validation is skipped. Among the rest, the
//! first chain to arrive whose reported length beats every length seen so far
//! (the local one included) wins, and replaces the local ledger wholesale.
//!
//! Fork choice uses the `length` a peer reports, with no cumulative-work
//! comparison. A short chain that passes the (vacuous) validation walk is
//! adopted if its reported length is larger; the disagreement is only logged.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::blockchain::{valid_chain, Block, Blockchain};
use crate::error::ChainError;
use crate::network::{ChainFetcher, ChainResponse};

/// Outcome of one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub replaced: bool,
    /// Local chain length once the pass finished.
    pub length: usize,
    /// Peer whose chain was adopted.
    pub source: Option<String>,
}

/// Stateless resolver; each call to [`ConsensusResolver::resolve`] stands alone.
#[derive(Clone)]
pub struct ConsensusResolver {
    fetcher: Arc<dyn ChainFetcher>,
    peer_timeout: Duration,
}

impl ConsensusResolver {
    pub fn new(fetcher: Arc<dyn ChainFetcher>, peer_timeout: Duration) -> Self {
        Self {
            fetcher,
            peer_timeout,
        }
    }

    pub async fn resolve(&self, blockchain: &RwLock<Blockchain>, peers: Vec<String>) -> Resolution {
        let local_length = blockchain.read().await.len();

        let mut queries = JoinSet::new();
        for peer in peers {
            let fetcher = self.fetcher.clone();
            let timeout = self.peer_timeout;
            queries.spawn(async move {
                let outcome = query_peer(fetcher.as_ref(), &peer, timeout, local_length).await;
                (peer, outcome)
            });
        }

        let mut max_length = local_length as u64;
        let mut best: Option<(String, Candidate)> = None;

        while let Some(joined) = queries.join_next().await {
            let (peer, outcome) = match joined {
                Ok(result) => result,
                Err(e) => {
                    warn!("Peer query task failed: {}", e);
                    continue;
                }
            };

            match outcome {
                Ok(Some(candidate)) if candidate.length > max_length => {
                    debug!(%peer, length = candidate.length, "consensus.candidate");
                    max_length = candidate.length;
                    best = Some((peer, candidate));
                }
                Ok(_) => {}
                Err(e) if e.is_peer_fault() => debug!(%peer, error = %e, "consensus.peer_skipped"),
                Err(e) => warn!("Querying {} failed locally: {}", peer, e),
            }
        }

        let Some((peer, candidate)) = best else {
            return Resolution {
                replaced: false,
                length: local_length,
                source: None,
            };
        };

        let mut bc = blockchain.write().await;
        if candidate.length <= bc.len() as u64 {
            warn!(
                "Local chain grew to {} blocks during resolution; keeping it over {}'s {}",
                bc.len(),
                peer,
                candidate.length
            );
            return Resolution {
                replaced: false,
                length: bc.len(),
                source: None,
            };
        }

        info!(
            "Replacing local chain ({} blocks) with {} blocks from {}",
            bc.len(),
            candidate.chain.len(),
            peer
        );
        bc.replace_chain(candidate.chain);
        Resolution {
            replaced: true,
            length: bc.len(),
            source: Some(peer),
        }
    }
}

/// A validated chain together with the length its peer reported for it.
struct Candidate {
    length: u64,
    chain: Vec<Block>,
}

/// Fetch and vet one peer's chain. `Ok(None)` means the peer answered but does
/// not claim to be ahead of `local_length`.
///
/// Fork choice follows the reported `length`, not the block count; a mismatch
/// is logged but not rejected.
async fn query_peer(
    fetcher: &dyn ChainFetcher,
    peer: &str,
    timeout: Duration,
    local_length: usize,
) -> Result<Option<Candidate>, ChainError> {
    let response = tokio::time::timeout(timeout, fetcher.fetch_chain(peer))
        .await
        .map_err(|_| ChainError::PeerUnreachable {
            peer: peer.to_string(),
            reason: format!("no answer within {:?}", timeout),
        })??;

    if response.length != response.chain.len() as u64 {
        warn!(
            "Peer {} reported length {} but sent {} blocks",
            peer,
            response.length,
            response.chain.len()
        );
    }

    if response.length <= local_length as u64 {
        return Ok(None);
    }

    let ChainResponse { chain, length } = response;
    let (chain, valid) = tokio::task::spawn_blocking(move || {
        let valid = valid_chain(&chain);
        (chain, valid)
    })
    .await
    .map_err(|e| ChainError::TaskError(format!("chain validation: {}", e)))?;

    if !valid {
        return Err(ChainError::InvalidChain(peer.to_string()));
    }

    Ok(Some(Candidate { length, chain }))
}
