//! Work blob assembly.
//!
//! A Raven-family blob is
//! `header(80) ‖ nonce(8, 0xAA) ‖ mix-hash(32, 0xBB) ‖ varint(n + 1) ‖ coinbase ‖ txs`.
//! The pool writes its per-job extra nonce at `reserved_offset`, which
//! points into the coinbase input script just past the height push.

use log::debug;
use serde::Serialize;

use crate::address::PoolAddress;
use crate::coinbase::{CoinbaseBuilder, CoinbaseTransaction, EXTRA_NONCE_SIZE};
use crate::difficulty::difficulty_from_target;
use crate::error::{Result, TemplateError};
use crate::family::{BlobLayout, CoinFamily, MIX_HASH_SIZE};
use crate::rpc::{BlockData, RpcBlockData};
use crate::seed::SeedHashChain;
use crate::serialize::{encode_varint, varint_len};

/// Filler of the nonce slot in a fresh template.
pub const NONCE_PLACEHOLDER: u8 = 0xAA;

/// Filler of the mix-hash slot in a fresh template.
pub const MIX_HASH_PLACEHOLDER: u8 = 0xBB;

/// A block template ready to hand to the pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockTemplate {
    /// The work blob.
    #[serde(rename = "blocktemplate_blob", serialize_with = "hex_bytes")]
    pub blob: Vec<u8>,
    /// Offset of the extra-nonce placeholder inside `blob`.
    pub reserved_offset: usize,
    /// Seed hash of the block's epoch.
    #[serde(serialize_with = "hex_bytes")]
    pub seed_hash: [u8; 32],
    /// Pool difficulty of the network target.
    pub difficulty: f64,
    pub height: u32,
    /// Compact target as the daemon sent it.
    pub bits: String,
}

impl BlockTemplate {
    /// Blob as lowercase hex.
    pub fn blob_hex(&self) -> String {
        hex::encode(&self.blob)
    }

    /// JSON object handed to pool code.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| TemplateError::Validation(format!("template serialization: {}", e)))
    }
}

fn hex_bytes<S, T>(bytes: &T, serializer: S) -> core::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
    T: AsRef<[u8]>,
{
    serializer.serialize_str(&hex::encode(bytes.as_ref()))
}

/// Builds templates for one pool address and coin family.
#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    pool_address: PoolAddress,
    family: CoinFamily,
}

impl TemplateBuilder {
    /// Create a builder, validating the configuration up front.
    pub fn new(pool_address: &str, family: CoinFamily) -> Result<Self> {
        Self::with_address(PoolAddress::decode(pool_address)?, family)
    }

    /// Create a builder from an already-decoded address.
    pub fn with_address(pool_address: PoolAddress, family: CoinFamily) -> Result<Self> {
        if !family.builds_templates() {
            return Err(TemplateError::Config(format!(
                "templates for {} come from the daemon, not from this builder",
                family
            )));
        }
        Ok(TemplateBuilder {
            pool_address,
            family,
        })
    }

    pub fn pool_address(&self) -> &PoolAddress {
        &self.pool_address
    }

    pub fn family(&self) -> CoinFamily {
        self.family
    }

    /// Build a template from the daemon's block data.
    ///
    /// Everything that can fail runs before the seed chain is touched, so a
    /// rejected call leaves `seeds` as it was.
    pub fn build(&self, rpc: &RpcBlockData, seeds: &mut SeedHashChain) -> Result<BlockTemplate> {
        let data = rpc.validate()?;
        let difficulty = difficulty_from_target(&data.target)?;

        let mut coinbase_builder = CoinbaseBuilder::new(data.header.height, &self.pool_address);
        if let Some(commitment) = &data.witness_commitment {
            coinbase_builder = coinbase_builder.with_witness_commitment(commitment.clone());
        }
        let coinbase = coinbase_builder.build(data.coinbase_value);

        let (blob, reserved_offset) = assemble_blob(self.family.layout(), &data, &coinbase)?;
        let seed_hash = seeds.seed_for(u64::from(data.header.height));

        debug!(
            "assembled {} template at height {}: {} bytes, {} transactions, reserved offset {}",
            self.family,
            data.header.height,
            blob.len(),
            data.transactions.len() + 1,
            reserved_offset
        );

        Ok(BlockTemplate {
            blob,
            reserved_offset,
            seed_hash,
            difficulty,
            height: data.header.height,
            bits: data.bits_hex,
        })
    }
}

/// Concatenate header, reserved fields and transactions into one pre-sized
/// buffer. Returns the blob and its reserved offset.
pub fn assemble_blob(
    layout: &BlobLayout,
    data: &BlockData,
    coinbase: &CoinbaseTransaction,
) -> Result<(Vec<u8>, usize)> {
    let slots = layout.merkle.ok_or_else(|| {
        TemplateError::Config("layout has no transaction section".into())
    })?;
    let mix_hash_offset = layout.mix_hash_offset.unwrap_or(layout.nonce_offset + layout.nonce_len);

    let tx_count = data.transactions.len() as u64 + 1;
    let tx_bytes: usize = data.transactions.iter().map(|tx| tx.byte_len()).sum();
    let total = slots.transactions_offset + varint_len(tx_count) + coinbase.raw_tx.len() + tx_bytes;

    let mut blob = Vec::with_capacity(total);
    blob.extend_from_slice(&data.header.pack());
    blob.resize(layout.nonce_offset, 0x00);
    blob.resize(layout.nonce_offset + layout.nonce_len, NONCE_PLACEHOLDER);
    blob.resize(mix_hash_offset, 0x00);
    blob.resize(slots.transactions_offset.max(mix_hash_offset + MIX_HASH_SIZE), MIX_HASH_PLACEHOLDER);

    encode_varint(tx_count, &mut blob);
    let coinbase_offset = blob.len();
    blob.extend_from_slice(&coinbase.raw_tx);
    for tx in &data.transactions {
        blob.extend_from_slice(tx.raw());
    }
    debug_assert_eq!(blob.len(), total);

    let reserved_offset = coinbase_offset
        + 4 // tx version
        + 1 // input count
        + 32 // prevout hash
        + 4 // prevout index
        + 1 // script length
        + 1 // height push length
        + coinbase.bytes_height
        + 1; // trailing zero byte
    debug_assert_eq!(reserved_offset, coinbase_offset + coinbase.extra_nonce_offset);
    debug_assert!(reserved_offset + EXTRA_NONCE_SIZE <= blob.len());

    Ok((blob, reserved_offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coinbase::EXTRA_NONCE_PLACEHOLDER;
    use crate::hash::double_sha256;
    use crate::header::MERKLE_ROOT_PLACEHOLDER;
    use crate::mutator::{inject_nonce_and_mixhash, refresh_merkle_root};
    use crate::rpc::tests::sample_json;
    use crate::transaction::tests::sample_tx;
    use crate::transaction::Transaction;

    fn builder() -> TemplateBuilder {
        TemplateBuilder::with_address(PoolAddress::from_hash(0x3c, [0u8; 20]), CoinFamily::Raven).unwrap()
    }

    fn build(height: u32, txs: &[Vec<u8>]) -> BlockTemplate {
        let hexes: Vec<String> = txs.iter().map(hex::encode).collect();
        let rpc = RpcBlockData::from_json(&sample_json(height, &hexes)).unwrap();
        builder().build(&rpc, &mut SeedHashChain::new()).unwrap()
    }

    #[test]
    fn test_blob_layout() {
        let template = build(1, &[]);
        let blob = &template.blob;

        assert_eq!(&blob[36..68], &[MERKLE_ROOT_PLACEHOLDER; 32]);
        assert_eq!(&blob[80..88], &[NONCE_PLACEHOLDER; 8]);
        assert_eq!(&blob[88..120], &[MIX_HASH_PLACEHOLDER; 32]);
        assert_eq!(blob[120], 0x01);

        let coinbase = Transaction::parse(&blob[121..], 121).unwrap();
        assert_eq!(121 + coinbase.byte_len(), blob.len());
        assert!(coinbase.is_coinbase());
    }

    #[test]
    fn test_height_one_scenario() {
        let template = build(1, &[]);
        let blob = &template.blob;

        // script starts after version, input count, prevout and script length
        let script = 121 + 4 + 1 + 32 + 4 + 1;
        assert_eq!(&blob[script..script + 3], &[0x01, 0x01, 0x00]);
        assert_eq!(template.reserved_offset, script + 3);

        assert_eq!(template.height, 1);
        assert_eq!(template.bits, "1e00ffff");
        assert_eq!(template.difficulty, 1.0);
        assert_eq!(template.seed_hash, [0u8; 32]);

        // after mutation the Merkle slot holds the single coinbase txid
        let coinbase_txid = double_sha256(&blob[121..]);
        let mut mutated = template.blob.clone();
        refresh_merkle_root(&mut mutated, CoinFamily::Raven.layout()).unwrap();
        assert_eq!(&mutated[36..68], &coinbase_txid[..]);
    }

    #[test]
    fn test_height_256_scenario() {
        let template = build(256, &[]);
        let script = 121 + 4 + 1 + 32 + 4 + 1;

        assert_eq!(&template.blob[script..script + 4], &[0x02, 0x00, 0x01, 0x00]);
        assert_eq!(template.reserved_offset, script + 4);
    }

    #[test]
    fn test_reserved_window_stays_in_coinbase_script() {
        for height in [0u32, 1, 127, 128, 256, 32_768, 1_000_000, u32::MAX] {
            let template = build(height, &[sample_tx([0x11; 32], None)]);
            let blob = &template.blob;

            let script_len_at = 121 + 4 + 1 + 32 + 4;
            let script_start = script_len_at + 1;
            let script_end = script_start + blob[script_len_at] as usize;
            let height_push_end = script_start + 1 + blob[script_start] as usize + 1;

            assert_eq!(template.reserved_offset, height_push_end, "height {}", height);
            assert!(template.reserved_offset + EXTRA_NONCE_SIZE <= script_end, "height {}", height);
            assert_eq!(
                &blob[template.reserved_offset..template.reserved_offset + EXTRA_NONCE_SIZE],
                &[EXTRA_NONCE_PLACEHOLDER; EXTRA_NONCE_SIZE]
            );
        }
    }

    #[test]
    fn test_transactions_follow_coinbase_in_order() {
        let tx1 = sample_tx([0x11; 32], None);
        let tx2 = sample_tx([0x22; 32], Some(vec![vec![0x01]]));
        let template = build(10, &[tx1.clone(), tx2.clone()]);
        let blob = &template.blob;

        assert_eq!(blob[120], 0x03);
        let tail = [tx1, tx2].concat();
        assert_eq!(&blob[blob.len() - tail.len()..], &tail[..]);
    }

    #[test]
    fn test_extra_nonce_write_keeps_blob_parseable() {
        let template = build(500_000, &[sample_tx([0x11; 32], None)]);
        let mut blob = template.blob.clone();
        let offset = template.reserved_offset;
        blob[offset..offset + 8].copy_from_slice(&0x0102_0304_0506_0708u64.to_le_bytes());

        inject_nonce_and_mixhash(&mut blob, CoinFamily::Raven.layout(), &[0x01; 8], &[0x02; 32]).unwrap();

        // height push untouched
        assert_eq!(&blob[offset - 5..offset], &[0x03, 0x20, 0xA1, 0x07, 0x00]);
        assert_eq!(&blob[80..88], &[0x01; 8]);
    }

    #[test]
    fn test_seed_hash_tracks_epoch() {
        let rpc = RpcBlockData::from_json(&sample_json(7_500, &[])).unwrap();
        let mut seeds = SeedHashChain::new();
        let template = builder().build(&rpc, &mut seeds).unwrap();

        assert_eq!(
            hex::encode(template.seed_hash),
            "290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563"
        );
        assert_eq!(seeds.last_epoch(), Some(1));
    }

    #[test]
    fn test_failed_build_leaves_seed_chain_alone() {
        let mut rpc = RpcBlockData::from_json(&sample_json(7_500, &[])).unwrap();
        rpc.target = "0".repeat(64);
        let mut seeds = SeedHashChain::new();

        assert!(matches!(builder().build(&rpc, &mut seeds), Err(TemplateError::Arithmetic(_))));
        assert_eq!(seeds.last_epoch(), None);
    }

    #[test]
    fn test_witness_commitment_lands_in_coinbase() {
        let mut rpc = RpcBlockData::from_json(&sample_json(1, &[])).unwrap();
        rpc.default_witness_commitment =
            Some("6a24aa21a9ede2f61c3f71d1defd3fa999dfa36953755c690689799962b48bebd836974e8cf9".into());
        let template = builder().build(&rpc, &mut SeedHashChain::new()).unwrap();

        let blob_hex = template.blob_hex();
        assert!(blob_hex.contains(rpc.default_witness_commitment.as_deref().unwrap()));
    }

    #[test]
    fn test_json_output() {
        let template = build(1, &[]);
        let json: serde_json::Value = serde_json::from_str(&template.to_json().unwrap()).unwrap();

        assert_eq!(json["blocktemplate_blob"], template.blob_hex());
        assert_eq!(json["reserved_offset"], template.reserved_offset);
        assert_eq!(json["seed_hash"], "00".repeat(32));
        assert_eq!(json["difficulty"], 1.0);
        assert_eq!(json["height"], 1);
        assert_eq!(json["bits"], "1e00ffff");
    }

    #[test]
    fn test_dero_builder_is_config_error() {
        let address = PoolAddress::from_hash(0x3c, [0u8; 20]);
        assert!(matches!(
            TemplateBuilder::with_address(address, CoinFamily::Dero),
            Err(TemplateError::Config(_))
        ));
    }

    #[test]
    fn test_bad_pool_address_is_config_error() {
        assert!(matches!(
            TemplateBuilder::new("not-an-address", CoinFamily::Raven),
            Err(TemplateError::Config(_))
        ));
    }
}
