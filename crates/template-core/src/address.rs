//! Pool payout address decoding and scriptPubKey generation.
//!
//! Pools pay the coinbase to a legacy Base58Check address. Any version byte
//! is accepted (each coin family uses its own prefix); only the 20-byte
//! pubkey hash ends up in the output script.

use crate::error::{Result, TemplateError};

/// Length of a HASH160 payload.
pub const ADDRESS_HASH_LEN: usize = 20;

/// A decoded pool address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolAddress {
    version: u8,
    hash: [u8; ADDRESS_HASH_LEN],
    display: String,
}

impl PoolAddress {
    /// Decode a Base58Check address into its version byte and hash.
    pub fn decode(address: &str) -> Result<Self> {
        let trimmed = address.trim();
        let payload = bs58::decode(trimmed)
            .with_check(None)
            .into_vec()
            .map_err(|e| TemplateError::Config(format!("pool address {:?}: {}", trimmed, e)))?;

        // version byte + hash
        if payload.len() != 1 + ADDRESS_HASH_LEN {
            return Err(TemplateError::Config(format!(
                "pool address {:?} decodes to {} bytes, expected {}",
                trimmed,
                payload.len(),
                1 + ADDRESS_HASH_LEN
            )));
        }

        let mut hash = [0u8; ADDRESS_HASH_LEN];
        hash.copy_from_slice(&payload[1..]);

        Ok(PoolAddress {
            version: payload[0],
            hash,
            display: trimmed.to_string(),
        })
    }

    /// Build from a raw hash, for callers that already decoded the address.
    pub fn from_hash(version: u8, hash: [u8; ADDRESS_HASH_LEN]) -> Self {
        let mut payload = Vec::with_capacity(1 + ADDRESS_HASH_LEN);
        payload.push(version);
        payload.extend_from_slice(&hash);
        let display = bs58::encode(payload).with_check().into_string();

        PoolAddress {
            version,
            hash,
            display,
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn hash(&self) -> &[u8; ADDRESS_HASH_LEN] {
        &self.hash
    }

    /// The address string as configured.
    pub fn display(&self) -> &str {
        &self.display
    }

    /// P2PKH: OP_DUP OP_HASH160 <20-byte-hash> OP_EQUALVERIFY OP_CHECKSIG
    pub fn script_pubkey(&self) -> Vec<u8> {
        p2pkh_script(&self.hash)
    }
}

/// P2PKH output script for a pubkey hash.
pub fn p2pkh_script(hash: &[u8; ADDRESS_HASH_LEN]) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    script.push(0x76); // OP_DUP
    script.push(0xa9); // OP_HASH160
    script.push(0x14); // Push 20 bytes
    script.extend_from_slice(hash);
    script.push(0x88); // OP_EQUALVERIFY
    script.push(0xac); // OP_CHECKSIG
    script
}
