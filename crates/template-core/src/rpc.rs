//! Block data as returned by the daemon's `getblocktemplate`.

use serde::Deserialize;

use crate::coinbase::coinbase_amount;
use crate::difficulty::parse_target;
use crate::error::{Result, TemplateError};
use crate::header::RavenHeader;
use crate::transaction::Transaction;

/// One entry of the daemon's transaction list.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcTransaction {
    /// Raw transaction, hex encoded.
    pub data: String,
}

/// The daemon's block template. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcBlockData {
    pub height: u32,
    pub bits: String,
    pub curtime: u32,
    pub previousblockhash: String,
    pub version: u32,
    pub target: String,
    pub coinbasevalue: f64,
    #[serde(default)]
    pub default_witness_commitment: Option<String>,
    #[serde(default)]
    pub transactions: Vec<RpcTransaction>,
}

/// Block data after every field has been decoded and checked.
#[derive(Debug, Clone)]
pub struct BlockData {
    pub header: RavenHeader,
    /// `bits` exactly as the daemon sent it.
    pub bits_hex: String,
    pub target: [u8; 32],
    pub coinbase_value: u64,
    pub witness_commitment: Option<Vec<u8>>,
    pub transactions: Vec<Transaction>,
}

impl RpcBlockData {
    /// Parse a JSON `getblocktemplate` result.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TemplateError::Validation(format!("block data: {}", e)))
    }

    /// Decode and check every field before anything is built from them.
    pub fn validate(&self) -> Result<BlockData> {
        let bits: [u8; 4] = decode_fixed(&self.bits, "bits")?;
        let prev_block_hash: [u8; 32] = decode_fixed(&self.previousblockhash, "previousblockhash")?;
        let target = parse_target(&self.target)?;
        let coinbase_value = coinbase_amount(self.coinbasevalue)?;

        let witness_commitment = self
            .default_witness_commitment
            .as_deref()
            .map(|commitment| {
                hex::decode(commitment).map_err(|e| {
                    TemplateError::Validation(format!("default_witness_commitment: {}", e))
                })
            })
            .transpose()?;

        let transactions = self
            .transactions
            .iter()
            .enumerate()
            .map(|(index, tx)| {
                Transaction::from_hex(&tx.data).map_err(|e| {
                    TemplateError::Validation(format!("transaction {}: {}", index, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BlockData {
            header: RavenHeader {
                height: self.height,
                bits,
                curtime: self.curtime,
                prev_block_hash,
                version: self.version,
            },
            bits_hex: self.bits.clone(),
            target,
            coinbase_value,
            witness_commitment,
            transactions,
        })
    }
}

/// Decode a hex field that must be exactly `N` bytes.
fn decode_fixed<const N: usize>(value: &str, field: &str) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    hex::decode_to_slice(value, &mut out).map_err(|e| {
        TemplateError::Validation(format!("{} must be {} hex-encoded bytes: {}", field, N, e))
    })?;
    Ok(out)
}
