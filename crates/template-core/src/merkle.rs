//! Merkle tree computation over block transactions.

use crate::hash::double_sha256;
use crate::transaction::Transaction;

/// Compute the merkle root from a list of leaf hashes.
///
/// An empty list yields the all-zero sentinel; a single leaf is its own root.
/// Odd levels duplicate their last node before pairing.
pub fn compute_merkle_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    if leaves.is_empty() {
        return [0u8; 32];
    }

    let mut current_level: Vec<[u8; 32]> = leaves.to_vec();

    while current_level.len() > 1 {
        let mut next_level = Vec::with_capacity((current_level.len() + 1) / 2);

        for pair in current_level.chunks(2) {
            let left = pair[0];
            // If odd number of elements, duplicate the last one
            let right = if pair.len() == 2 { pair[1] } else { pair[0] };
            next_level.push(merkle_node_hash(&left, &right));
        }

        current_level = next_level;
    }

    current_level[0]
}

/// Hash of an interior node: SHA256d(left || right).
pub fn merkle_node_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut combined = [0u8; 64];
    combined[..32].copy_from_slice(left);
    combined[32..].copy_from_slice(right);
    double_sha256(&combined)
}

/// True when the first transaction's first input has a witness stack.
///
/// This decides whether the whole list is hashed by wtxid.
pub fn witness_mode(transactions: &[Transaction]) -> bool {
    transactions.first().map_or(false, Transaction::has_witness)
}

/// Merkle root for a block's transactions, coinbase first.
///
/// In witness mode the leaves are wtxids and the returned value is
/// SHA256d(root || witness reserved value of the first transaction).
pub fn transactions_merkle_root(transactions: &[Transaction]) -> [u8; 32] {
    if transactions.is_empty() {
        return [0u8; 32];
    }

    let for_witness = witness_mode(transactions);
    let leaves: Vec<[u8; 32]> = transactions
        .iter()
        .map(|tx| tx.hash(for_witness))
        .collect();
    let root = compute_merkle_root(&leaves);

    match transactions[0].witness_reserved_value() {
        Some(reserved) if for_witness => {
            let mut data = Vec::with_capacity(32 + reserved.len());
            data.extend_from_slice(&root);
            data.extend_from_slice(reserved);
            double_sha256(&data)
        }
        _ => root,
    }
}
