use tracing::debug;

use super::chain::Block;
use crate::miner::valid_proof;

/// Walk `chain` pairwise, checking hash linkage and proof-of-work.
///
/// Chains of zero or one block pass trivially; the genesis block itself is
/// never inspected.
pub fn valid_chain(chain: &[Block]) -> bool {
    chain.windows(2).all(|pair| {
        let (prior, current) = (&pair[0], &pair[1]);

        if current.previous_hash != prior.hash() {
            debug!(index = current.index, "chain.invalid_linkage");
            return false;
        }

        if !valid_proof(prior.proof, current.proof) {
            debug!(index = current.index, proof = current.proof, "chain.invalid_proof");
            return false;
        }

        true
    })
}
