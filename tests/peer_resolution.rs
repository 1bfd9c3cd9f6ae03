//! End-to-end conflict resolution between nodes served on loopback ports

use axum::{routing::get, Json, Router};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tallychain::api::serve;
use tallychain::blockchain::Blockchain;
use tallychain::config::Config;
use tallychain::miner::find_proof;
use tallychain::network::ChainResponse;
use tallychain::node::Node;
use tallychain::transaction::Transaction;
use tokio::net::TcpListener;

async fn spawn_node(node_id: &str) -> (Arc<Node>, SocketAddr) {
    let mut config = Config::default();
    config.miner.node_id = Some(node_id.to_string());
    config.consensus.peer_timeout_secs = 2;

    let node = Arc::new(Node::new(config).expect("Failed to create node"));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(node.clone(), listener));
    (node, addr)
}

/// A server that answers `/chain` with whatever it is given.
async fn spawn_static_peer(response: ChainResponse) -> SocketAddr {
    let response = Arc::new(response);
    let app = Router::new().route(
        "/chain",
        get(move || {
            let response = response.clone();
            async move { Json((*response).clone()) }
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });
    addr
}

async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shorter_node_adopts_longer_chain() {
    tokio::time::timeout(Duration::from_secs(60), async {
        let (alpha, _) = spawn_node("alpha").await;
        let (beta, beta_addr) = spawn_node("beta").await;

        alpha.mine().await.unwrap();
        for _ in 0..3 {
            beta.mine().await.unwrap();
        }

        let dead = closed_port().await;
        alpha
            .register_peers(&[format!("http://{}", beta_addr), dead.to_string()])
            .unwrap();

        let resolution = alpha.resolve_conflicts().await;
        assert!(resolution.replaced);
        assert_eq!(resolution.length, 4);
        assert_eq!(resolution.source, Some(beta_addr.to_string()));
        assert_eq!(alpha.chain().await, beta.chain().await);

        // Already in agreement: nothing further to adopt.
        assert!(!alpha.resolve_conflicts().await.replaced);
    })
    .await
    .expect("test_shorter_node_adopts_longer_chain timed out");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_longer_node_stays_authoritative_over_http() {
    tokio::time::timeout(Duration::from_secs(60), async {
        let (alpha, alpha_addr) = spawn_node("alpha").await;
        let (beta, beta_addr) = spawn_node("beta").await;

        alpha.mine().await.unwrap();
        alpha.mine().await.unwrap();
        beta.mine().await.unwrap();
        alpha.register_peers(&[beta_addr.to_string()]).unwrap();

        let body: Value = reqwest::get(format!("http://{}/nodes/resolve", alpha_addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["message"], "Our chain is authoritative");
        assert_eq!(body["chain"].as_array().unwrap().len(), 3);
        assert_eq!(alpha.chain().await.len(), 3);
    })
    .await
    .expect("test_longer_node_stays_authoritative_over_http timed out");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tampered_peer_chain_is_rejected() {
    tokio::time::timeout(Duration::from_secs(60), async {
        let mut forged = Blockchain::new();
        for _ in 0..4 {
            let last = forged.last_block().unwrap().clone();
            forged
                .append_on_tip(&last.hash(), find_proof(last.proof), Transaction::reward("mallory"))
                .unwrap();
        }
        forged.blocks[2].previous_hash = "f".repeat(64);
        let peer = spawn_static_peer(ChainResponse::from_blocks(forged.blocks)).await;

        let (alpha, _) = spawn_node("alpha").await;
        alpha.mine().await.unwrap();
        let before = alpha.chain().await;
        alpha.register_peers(&[peer.to_string()]).unwrap();

        let resolution = alpha.resolve_conflicts().await;
        assert!(!resolution.replaced);
        assert_eq!(alpha.chain().await, before);
    })
    .await
    .expect("test_tampered_peer_chain_is_rejected timed out");
}
