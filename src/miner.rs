//! Proof-of-work search and verification
//!
//! A proof `p` is valid for the previous proof `q` when
//! `SHA-256("{q}{p}")` begins with [`DIFFICULTY`] zero hex digits. The search
//! is a pure function of the previous proof, so the nonce space can be split
//! into windows and scanned on a rayon pool without changing the answer: the
//! smallest valid proof is always returned.

use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::crypto::sha256_hex;

/// Number of leading zero hex digits a proof digest must carry.
pub const DIFFICULTY: usize = 4;

/// Nonces examined per parallel round.
const SEARCH_WINDOW: u64 = 1 << 14;

/// Hex digest checked by [`valid_proof`].
pub fn proof_digest(previous_proof: u64, proof: u64) -> String {
    sha256_hex(format!("{}{}", previous_proof, proof).as_bytes())
}

pub fn valid_proof(previous_proof: u64, proof: u64) -> bool {
    let digest = Sha256::digest(format!("{}{}", previous_proof, proof).as_bytes());
    has_leading_zero_nibbles(&digest, DIFFICULTY)
}

fn has_leading_zero_nibbles(digest: &[u8], count: usize) -> bool {
    (0..count).all(|i| match digest.get(i / 2) {
        Some(byte) if i % 2 == 0 => byte >> 4 == 0,
        Some(byte) => byte & 0x0f == 0,
        None => false,
    })
}

/// Scan upward from zero until a valid proof turns up. Unbounded.
pub fn find_proof(previous_proof: u64) -> u64 {
    (0..)
        .find(|candidate| valid_proof(previous_proof, *candidate))
        .unwrap_or(u64::MAX)
}

/// Smallest valid proof inside `range`, if any.
pub fn find_proof_in_range(previous_proof: u64, range: Range<u64>) -> Option<u64> {
    range.into_iter().find(|candidate| valid_proof(previous_proof, *candidate))
}

/// Window-by-window parallel scan on the current rayon pool.
pub fn find_proof_parallel(previous_proof: u64) -> u64 {
    let mut start = 0u64;
    loop {
        let end = start.saturating_add(SEARCH_WINDOW);
        let found = (start..end)
            .into_par_iter()
            .find_first(|candidate| valid_proof(previous_proof, *candidate));
        if let Some(proof) = found {
            return proof;
        }
        if end == u64::MAX {
            return u64::MAX;
        }
        start = end;
    }
}

/// Proof-of-work engine configured with a worker count.
///
/// With more than one thread the engine owns a rayon pool, built once and
/// shared by clones.
#[derive(Debug, Clone)]
pub struct Miner {
    threads: usize,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl Miner {
    pub fn new(threads: usize) -> Self {
        let threads = threads.max(1);
        if threads == 1 {
            return Self { threads, pool: None };
        }

        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => Self {
                threads,
                pool: Some(Arc::new(pool)),
            },
            Err(e) => {
                warn!("Failed to build mining pool ({}); searching sequentially", e);
                Self {
                    threads: 1,
                    pool: None,
                }
            }
        }
    }

    /// Worker threads actually used by [`Miner::search`].
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Blocking search; call from a blocking-friendly context.
    pub fn search(&self, previous_proof: u64) -> u64 {
        match &self.pool {
            Some(pool) => {
                debug!(threads = self.threads, previous_proof, "miner.parallel_search");
                pool.install(|| find_proof_parallel(previous_proof))
            }
            None => find_proof(previous_proof),
        }
    }
}

impl Default for Miner {
    fn default() -> Self {
        Self::new(1)
    }
}
