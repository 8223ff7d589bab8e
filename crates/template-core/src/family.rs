//! Coin families and their blob layouts.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TemplateError;

/// Size of a Raven-family block header in bytes.
pub const RAVEN_HEADER_SIZE: usize = 80;

/// Width of the Raven nonce slot.
pub const RAVEN_NONCE_SIZE: usize = 8;

/// Width of a mix-hash slot.
pub const MIX_HASH_SIZE: usize = 32;

/// Width of the Dero nonce slot.
pub const DERO_NONCE_SIZE: usize = 4;

/// Absolute offset of the Dero nonce.
pub const DERO_NONCE_OFFSET: usize = 39;

/// Coin families whose blobs this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinFamily {
    /// KAWPOW coins: bitcoin-style transactions, reversed 80-byte header,
    /// 8-byte nonce and 32-byte mix-hash after the header.
    Raven,
    /// 4-byte nonce at a fixed offset, no Merkle work.
    Dero,
}

/// Where the Merkle root lives and where the transactions start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MerkleSlots {
    /// Bytes hashed to identify the block.
    pub header_len: usize,
    /// Offset of the 32-byte Merkle root inside the header.
    pub root_offset: usize,
    /// Offset of the varint transaction count.
    pub transactions_offset: usize,
}

/// Fixed byte positions inside a family's work blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobLayout {
    pub nonce_offset: usize,
    pub nonce_len: usize,
    pub mix_hash_offset: Option<usize>,
    /// Present when the family's header commits to its transactions.
    pub merkle: Option<MerkleSlots>,
}

impl BlobLayout {
    pub const RAVEN: BlobLayout = BlobLayout {
        nonce_offset: RAVEN_HEADER_SIZE,
        nonce_len: RAVEN_NONCE_SIZE,
        mix_hash_offset: Some(RAVEN_HEADER_SIZE + RAVEN_NONCE_SIZE),
        merkle: Some(MerkleSlots {
            header_len: RAVEN_HEADER_SIZE,
            root_offset: 36,
            transactions_offset: RAVEN_HEADER_SIZE + RAVEN_NONCE_SIZE + MIX_HASH_SIZE,
        }),
    };

    pub const DERO: BlobLayout = BlobLayout {
        nonce_offset: DERO_NONCE_OFFSET,
        nonce_len: DERO_NONCE_SIZE,
        mix_hash_offset: None,
        merkle: None,
    };

    /// Whether mutation must refresh the Merkle root.
    pub fn recomputes_merkle(&self) -> bool {
        self.merkle.is_some()
    }

    /// Smallest blob that contains every fixed slot.
    pub fn min_len(&self) -> usize {
        let nonce_end = self.nonce_offset + self.nonce_len;
        let mix_end = self.mix_hash_offset.map_or(0, |offset| offset + MIX_HASH_SIZE);
        let merkle_end = self.merkle.map_or(0, |slots| slots.transactions_offset);
        nonce_end.max(mix_end).max(merkle_end)
    }
}

impl CoinFamily {
    /// The blob layout for this family.
    pub fn layout(&self) -> &'static BlobLayout {
        match self {
            CoinFamily::Raven => &BlobLayout::RAVEN,
            CoinFamily::Dero => &BlobLayout::DERO,
        }
    }

    /// Whether this crate assembles templates for the family, rather than
    /// only mutating blobs the daemon hands out.
    pub fn builds_templates(&self) -> bool {
        self.layout().recomputes_merkle()
    }

    /// Get family name as string.
    pub fn name(&self) -> &'static str {
        match self {
            CoinFamily::Raven => "raven",
            CoinFamily::Dero => "dero",
        }
    }
}

impl FromStr for CoinFamily {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "raven" | "rvn" | "ravencoin" | "kawpow" => Ok(CoinFamily::Raven),
            "dero" => Ok(CoinFamily::Dero),
            other => Err(TemplateError::Config(format!("unknown coin family {:?}", other))),
        }
    }
}

impl fmt::Display for CoinFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
