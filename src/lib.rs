//! TallyChain - a minimal proof-of-work ledger kept in agreement across
//! peers by a longest-valid-chain rule
//!
//! # Architecture
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, the ledger, and chain validation
//! - [`transaction`] - Transaction records and submission checks
//! - [`mempool`] - Pending transaction pool
//! - [`crypto`] - Canonical hashing and node identity
//!
//! ## Consensus & Mining
//! - [`miner`] - Proof-of-work search and verification
//! - [`consensus`] - Longest-valid-chain conflict resolution
//!
//! ## Networking
//! - [`discovery`] - Peer registry
//! - [`network`] - Fetching chains from peers
//! - [`api`] - HTTP interface
//!
//! ## Node & Configuration
//! - [`node`] - Per-process application state
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod crypto;
pub mod mempool;
pub mod transaction;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod consensus;
pub mod miner;

// ============================================================================
// Networking
// ============================================================================
pub mod discovery;
pub mod network;

#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Node & Configuration
// ============================================================================
pub mod config;
pub mod error;
pub mod node;
