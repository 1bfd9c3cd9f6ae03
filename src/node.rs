//! Application state for a single node
//!
//! A [`Node`] owns everything one ledger participant needs for the lifetime
//! of the process: the chain and its pending pool behind one async lock, the
//! peer registry, the mining engine and the consensus resolver. It is built
//! explicitly and handed to the HTTP layer, so several independent nodes can
//! share one process (as the integration tests do).

use parking_lot::RwLock as SyncRwLock;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::blockchain::{Block, Blockchain};
use crate::config::Config;
use crate::consensus::{ConsensusResolver, Resolution};
use crate::crypto::generate_node_id;
use crate::discovery::{normalize_address, PeerRegistry};
use crate::error::ChainError;
use crate::miner::Miner;
use crate::network::{ChainFetcher, HttpChainFetcher};
use crate::transaction::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Booting,
    Ready,
}

pub struct Node {
    pub config: Config,
    node_id: String,
    pub blockchain: Arc<RwLock<Blockchain>>,
    peers: SyncRwLock<PeerRegistry>,
    miner: Miner,
    resolver: ConsensusResolver,
    state: SyncRwLock<NodeState>,
}

impl Node {
    /// Build a node that reaches peers over HTTP.
    pub fn new(config: Config) -> Result<Self, ChainError> {
        let fetcher = HttpChainFetcher::new(config.consensus.peer_timeout())?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Build a node that reaches peers through `fetcher`.
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn ChainFetcher>) -> Result<Self, ChainError> {
        config.validate()?;

        let node_id = config
            .miner
            .node_id
            .clone()
            .unwrap_or_else(generate_node_id);

        let mut peers = PeerRegistry::new();
        for peer in &config.network.bootstrap_peers {
            if let Err(e) = peers.register(peer) {
                warn!("Ignoring bootstrap peer: {}", e);
            }
        }

        let miner = Miner::new(config.miner.threads);
        info!(
            node_id = %node_id,
            peers = peers.len(),
            threads = miner.threads(),
            "node.init"
        );

        Ok(Self {
            miner,
            resolver: ConsensusResolver::new(fetcher, config.consensus.peer_timeout()),
            config,
            node_id,
            blockchain: Arc::new(RwLock::new(Blockchain::new())),
            peers: SyncRwLock::new(peers),
            state: SyncRwLock::new(NodeState::Booting),
        })
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn state(&self) -> NodeState {
        *self.state.read()
    }

    pub fn set_state(&self, state: NodeState) {
        *self.state.write() = state;
    }

    /// Queue a transaction; returns the index of the block that will hold it.
    pub async fn submit_transaction(&self, tx: Transaction) -> u64 {
        let index = self.blockchain.write().await.new_transaction(tx);
        info!(index, "transaction.queued");
        index
    }

    /// Mine one block: search a proof off the lock, then credit the reward
    /// and seal the pool under it.
    ///
    /// Transactions submitted during the search land in the block. If the tip
    /// moved meanwhile (another block mined, or the chain replaced) the search
    /// starts over against the new tip.
    pub async fn mine(&self) -> Result<Block, ChainError> {
        loop {
            let (tip_hash, last_proof) = {
                let bc = self.blockchain.read().await;
                let last = bc.last_block()?;
                (last.hash(), last.proof)
            };

            let miner = self.miner.clone();
            let proof = tokio::task::spawn_blocking(move || miner.search(last_proof))
                .await
                .map_err(|e| ChainError::TaskError(format!("proof search: {}", e)))?;

            let mut bc = self.blockchain.write().await;
            match bc.append_on_tip(&tip_hash, proof, Transaction::reward(self.node_id.as_str())) {
                Ok(block) => {
                    info!(
                        index = block.index,
                        proof = block.proof,
                        transactions = block.transactions.len(),
                        "block.forged"
                    );
                    return Ok(block);
                }
                Err(ChainError::StaleTip) => {
                    warn!("Chain tip moved while mining; searching again");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Snapshot of the full chain.
    pub async fn chain(&self) -> Vec<Block> {
        self.blockchain.read().await.blocks.clone()
    }

    /// Register every address, or none if any of them is unusable.
    /// Returns the registry contents afterwards.
    pub fn register_peers(&self, addresses: &[String]) -> Result<Vec<String>, ChainError> {
        let locations = addresses
            .iter()
            .map(|a| normalize_address(a))
            .collect::<Result<Vec<_>, _>>()?;

        let mut peers = self.peers.write();
        for location in locations {
            if peers.register(&location)? {
                info!(peer = %location, "peer.registered");
            }
        }
        Ok(peers.peers())
    }

    pub fn peers(&self) -> Vec<String> {
        self.peers.read().peers()
    }

    /// Adopt the longest valid chain among registered peers, if it beats ours.
    pub async fn resolve_conflicts(&self) -> Resolution {
        let peers = self.peers();
        let resolution = self.resolver.resolve(&self.blockchain, peers).await;
        info!(
            replaced = resolution.replaced,
            length = resolution.length,
            "consensus.resolved"
        );
        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::valid_chain;

    fn test_node() -> Node {
        let mut config = Config::default();
        config.miner.node_id = Some("test-node".to_string());
        Node::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_mine_on_fresh_node() {
        let node = test_node();
        let genesis_hash = node.chain().await[0].hash();

        let block = node.mine().await.unwrap();
        let chain = node.chain().await;

        assert_eq!(chain.len(), 2);
        assert_eq!(block.index, 2);
        assert_eq!(block.previous_hash, genesis_hash);
        assert_eq!(block.transactions, vec![Transaction::reward("test-node")]);
        assert!(valid_chain(&chain));
    }

    #[tokio::test]
    async fn test_pending_transactions_are_mined() {
        let node = test_node();
        let index = node.submit_transaction(Transaction::new("A", "B", 5.0)).await;
        assert_eq!(index, 2);

        let block = node.mine().await.unwrap();
        assert_eq!(block.transactions.len(), 2);
        assert_eq!(block.transactions[0], Transaction::new("A", "B", 5.0));
        assert!(node.blockchain.read().await.mempool.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_mining_keeps_chain_valid() {
        let node = Arc::new(test_node());
        let a = tokio::spawn({
            let node = node.clone();
            async move { node.mine().await }
        });
        let b = tokio::spawn({
            let node = node.clone();
            async move { node.mine().await }
        });
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let chain = node.chain().await;
        assert_eq!(chain.len(), 3);
        assert!(valid_chain(&chain));
    }

    #[test]
    fn test_register_peers_normalizes_and_dedupes() {
        let node = test_node();
        let peers = node
            .register_peers(&[
                "http://192.168.0.5:5000".to_string(),
                "192.168.0.5:5000".to_string(),
            ])
            .unwrap();
        assert_eq!(peers, vec!["192.168.0.5:5000".to_string()]);
    }

    #[test]
    fn test_bad_address_registers_nothing() {
        let node = test_node();
        let result = node.register_peers(&["10.0.0.1:5000".to_string(), "http://".to_string()]);
        assert!(matches!(result, Err(ChainError::InvalidPeerAddress(_))));
        assert!(node.peers().is_empty());
    }

    #[test]
    fn test_bootstrap_peers_and_identity() {
        let mut config = Config::default();
        config.network.bootstrap_peers = vec!["http://10.0.0.9:5000/".to_string()];
        let node = Node::new(config).unwrap();

        assert_eq!(node.peers(), vec!["10.0.0.9:5000".to_string()]);
        assert_eq!(node.node_id().len(), 32);
        assert_eq!(node.state(), NodeState::Booting);
    }

    #[tokio::test]
    async fn test_resolve_without_peers_is_authoritative() {
        let node = test_node();
        let resolution = node.resolve_conflicts().await;
        assert!(!resolution.replaced);
        assert_eq!(resolution.length, 1);
    }
}
