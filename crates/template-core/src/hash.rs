//! Hash primitives shared by the Merkle engine, header finalization and seed chain.

use sha2::{Digest, Sha256};
use sha3::Keccak256;

/// Double SHA256: SHA256(SHA256(data)).
///
/// Used for transaction ids, Merkle nodes and block header hashing.
#[inline]
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(&first);
    let mut result = [0u8; 32];
    result.copy_from_slice(&second);
    result
}

/// Keccak-256 (original Keccak padding, not FIPS SHA3-256).
#[inline]
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let hash = Keccak256::digest(data);
    let mut result = [0u8; 32];
    result.copy_from_slice(&hash);
    result
}

/// Reverse the byte order of a 32-byte array.
///
/// Hashes are usually displayed in reverse byte order.
#[inline]
pub fn reverse_bytes(bytes: &[u8; 32]) -> [u8; 32] {
    let mut reversed = *bytes;
    reversed.reverse();
    reversed
}

/// Convert a hash to its display format (reversed hex).
pub fn hash_to_display_hex(hash: &[u8; 32]) -> String {
    hex::encode(reverse_bytes(hash))
}
