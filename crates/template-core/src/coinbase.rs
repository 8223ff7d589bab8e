//! Coinbase transaction construction for pool templates.
//!
//! The coinbase carries the block height and a fixed-width placeholder that
//! the pool overwrites with a per-job extra nonce. Everything else about it
//! (outputs, witness commitment) is fixed when the template is built.

use crate::address::PoolAddress;
use crate::error::{Result, TemplateError};
use crate::hash::double_sha256;
use crate::serialize::encode_varint;

/// Filler byte of the extra-nonce placeholder.
pub const EXTRA_NONCE_PLACEHOLDER: u8 = 0xCC;

/// Width of the extra-nonce placeholder in the coinbase script.
pub const EXTRA_NONCE_SIZE: usize = 17;

/// Coinbase transaction version.
pub const COINBASE_TX_VERSION: u32 = 1;

/// Byte offset of the script inside the coinbase: version, input count,
/// prevout hash, prevout index, script length.
const SCRIPT_OFFSET: usize = 4 + 1 + 32 + 4 + 1;

/// Builder for the pool's coinbase transaction.
#[derive(Debug, Clone)]
pub struct CoinbaseBuilder {
    /// The block height (encoded at the start of the script).
    block_height: u32,
    /// Output script paying the pool.
    payout_script: Vec<u8>,
    /// Witness commitment script from the daemon, copied verbatim.
    witness_commitment: Option<Vec<u8>>,
}

impl CoinbaseBuilder {
    /// Create a new coinbase builder paying `pool_address`.
    pub fn new(block_height: u32, pool_address: &PoolAddress) -> Self {
        CoinbaseBuilder {
            block_height,
            payout_script: pool_address.script_pubkey(),
            witness_commitment: None,
        }
    }

    /// Add a zero-value output carrying the daemon's witness commitment.
    pub fn with_witness_commitment(mut self, commitment: Vec<u8>) -> Self {
        self.witness_commitment = Some(commitment);
        self
    }

    /// Build the coinbase transaction paying `value` to the pool.
    pub fn build(&self, value: u64) -> CoinbaseTransaction {
        let height_push = encode_height_push(self.block_height);
        let bytes_height = height_push.len() - 2;

        let mut script_sig = Vec::with_capacity(height_push.len() + EXTRA_NONCE_SIZE);
        script_sig.extend_from_slice(&height_push);
        script_sig.extend_from_slice(&[EXTRA_NONCE_PLACEHOLDER; EXTRA_NONCE_SIZE]);

        let mut raw_tx = Vec::with_capacity(SCRIPT_OFFSET + script_sig.len() + 128);

        // Version (4 bytes, little-endian)
        raw_tx.extend_from_slice(&COINBASE_TX_VERSION.to_le_bytes());

        // Input count (varint) - always 1 for coinbase
        raw_tx.push(0x01);

        // Input: Previous output (null for coinbase)
        raw_tx.extend_from_slice(&[0u8; 32]);
        raw_tx.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());

        // ScriptSig
        encode_varint(script_sig.len() as u64, &mut raw_tx);
        let script_start = raw_tx.len();
        raw_tx.extend_from_slice(&script_sig);

        // Sequence
        raw_tx.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());

        // Outputs: pool payout, then the optional witness commitment
        let output_count = 1 + usize::from(self.witness_commitment.is_some());
        encode_varint(output_count as u64, &mut raw_tx);

        raw_tx.extend_from_slice(&value.to_le_bytes());
        encode_varint(self.payout_script.len() as u64, &mut raw_tx);
        raw_tx.extend_from_slice(&self.payout_script);

        if let Some(commitment) = &self.witness_commitment {
            raw_tx.extend_from_slice(&0u64.to_le_bytes());
            encode_varint(commitment.len() as u64, &mut raw_tx);
            raw_tx.extend_from_slice(commitment);
        }

        // Locktime
        raw_tx.extend_from_slice(&0u32.to_le_bytes());

        let txid = double_sha256(&raw_tx);

        CoinbaseTransaction {
            raw_tx,
            txid,
            bytes_height,
            extra_nonce_offset: script_start + height_push.len(),
        }
    }
}

/// A constructed coinbase transaction.
#[derive(Debug, Clone)]
pub struct CoinbaseTransaction {
    /// Raw transaction (no witness serialization).
    pub raw_tx: Vec<u8>,
    /// Transaction ID (double SHA256 of raw_tx).
    pub txid: [u8; 32],
    /// Number of height bytes after the push-length byte.
    pub bytes_height: usize,
    /// Offset of the extra-nonce placeholder inside `raw_tx`.
    pub extra_nonce_offset: usize,
}

impl CoinbaseTransaction {
    /// Offset of the input script inside `raw_tx`.
    pub fn script_offset(&self) -> usize {
        SCRIPT_OFFSET
    }

    /// Length of the input script.
    pub fn script_len(&self) -> usize {
        self.bytes_height + 2 + EXTRA_NONCE_SIZE
    }
}

/// Number of bytes used to encode `height`: `ceil(bitlen(height * 2) / 8)`.
///
/// The doubling reserves room for the sign bit of a script number.
pub fn height_byte_len(height: u32) -> usize {
    let doubled = u64::from(height) << 1;
    let bits = (64 - doubled.leading_zeros() as usize).max(1);
    (bits + 7) / 8
}

/// Encode the height push: `len ‖ height (little-endian, len bytes) ‖ 0x00`.
///
/// Zero padding goes to the high-order end so the push still reads back as
/// `height`.
pub fn encode_height_push(height: u32) -> Vec<u8> {
    let bytes_height = height_byte_len(height);

    let mut push = Vec::with_capacity(bytes_height + 2);
    push.push(bytes_height as u8);
    push.extend_from_slice(&height.to_le_bytes()[..bytes_height.min(4)]);
    push.resize(1 + bytes_height, 0x00);
    push.push(0x00);
    push
}

/// Coinbase value from the daemon, truncated toward zero.
pub fn coinbase_amount(value: f64) -> Result<u64> {
    if !value.is_finite() || value < 0.0 || value >= u64::MAX as f64 {
        return Err(TemplateError::Validation(format!("coinbasevalue out of range: {}", value)));
    }
    Ok(value.floor() as u64)
}
