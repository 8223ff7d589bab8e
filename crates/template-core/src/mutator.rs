//! In-place mutation of emitted work blobs.
//!
//! All entry points validate and compute everything first and only then
//! write, so on error the caller's buffer is unchanged.

use log::trace;

use crate::error::{Result, TemplateError};
use crate::family::{BlobLayout, CoinFamily, MerkleSlots, MIX_HASH_SIZE};
use crate::hash::hash_to_display_hex;
use crate::header::header_hash;
use crate::merkle::transactions_merkle_root;
use crate::serialize::ByteReader;
use crate::transaction::Transaction;

/// Miner-supplied values to write into a blob.
#[derive(Debug, Clone, Copy)]
pub struct Solution<'a> {
    pub nonce: &'a [u8],
    pub mix_hash: Option<&'a [u8; MIX_HASH_SIZE]>,
}

/// Parse the transaction section of a blob.
///
/// Reads the varint count at the layout's transaction offset, then each
/// transaction, using its own length to find the next one.
pub fn parse_blob_transactions(blob: &[u8], slots: &MerkleSlots) -> Result<Vec<Transaction>> {
    let section = blob.get(slots.transactions_offset..).ok_or_else(|| {
        TemplateError::malformed(blob.len(), "blob ends before the transaction section")
    })?;
    let mut reader = ByteReader::new(section, slots.transactions_offset);
    let count = reader.read_len("transaction count")?;

    let mut offset = slots.transactions_offset + reader.position();
    let mut transactions = Vec::with_capacity(count);
    for _ in 0..count {
        let tx = Transaction::parse(&blob[offset..], offset)?;
        offset += tx.byte_len();
        transactions.push(tx);
    }

    Ok(transactions)
}

/// Merkle root of the transactions currently in `blob`.
pub fn blob_merkle_root(blob: &[u8], slots: &MerkleSlots) -> Result<[u8; 32]> {
    let transactions = parse_blob_transactions(blob, slots)?;
    Ok(transactions_merkle_root(&transactions))
}

/// Recompute the Merkle root and write it into the header.
///
/// A no-op for layouts without a Merkle slot.
pub fn refresh_merkle_root(blob: &mut [u8], layout: &BlobLayout) -> Result<()> {
    apply(blob, layout, None)
}

/// Refresh the Merkle root, then write the nonce and mix-hash.
pub fn inject_nonce_and_mixhash(
    blob: &mut [u8],
    layout: &BlobLayout,
    nonce: &[u8],
    mix_hash: &[u8; MIX_HASH_SIZE],
) -> Result<()> {
    let solution = Solution {
        nonce,
        mix_hash: Some(mix_hash),
    };
    apply(blob, layout, Some(&solution))
}

/// Write a nonce at the layout's fixed offset.
pub fn inject_nonce_fixed_offset(blob: &mut [u8], layout: &BlobLayout, nonce: &[u8]) -> Result<()> {
    if layout.recomputes_merkle() {
        return Err(TemplateError::Validation(
            "layout needs a Merkle refresh, use inject_nonce_and_mixhash".into(),
        ));
    }
    let solution = Solution {
        nonce,
        mix_hash: None,
    };
    apply(blob, layout, Some(&solution))
}

/// Write a solution using `family`'s layout.
pub fn inject_solution(blob: &mut [u8], family: CoinFamily, solution: &Solution<'_>) -> Result<()> {
    apply(blob, family.layout(), Some(solution))
}

/// Refresh the Merkle root and return the block hash in display order.
pub fn finalize_block_hash(blob: &mut [u8], layout: &BlobLayout) -> Result<[u8; 32]> {
    let slots = layout.merkle.ok_or_else(|| {
        TemplateError::Validation("layout has no header to hash".into())
    })?;
    refresh_merkle_root(blob, layout)?;
    Ok(header_hash(&blob[..slots.header_len]))
}

fn apply(blob: &mut [u8], layout: &BlobLayout, solution: Option<&Solution<'_>>) -> Result<()> {
    if blob.len() < layout.min_len() {
        return Err(TemplateError::Validation(format!(
            "blob is {} bytes, layout needs at least {}",
            blob.len(),
            layout.min_len()
        )));
    }

    let mix_hash = match solution {
        Some(solution) => {
            if solution.nonce.len() != layout.nonce_len {
                return Err(TemplateError::Validation(format!(
                    "nonce is {} bytes, layout expects {}",
                    solution.nonce.len(),
                    layout.nonce_len
                )));
            }
            match (layout.mix_hash_offset, solution.mix_hash) {
                (Some(offset), Some(mix_hash)) => Some((offset, mix_hash)),
                (None, None) => None,
                (Some(_), None) => {
                    return Err(TemplateError::Validation("layout requires a mix-hash".into()))
                }
                (None, Some(_)) => {
                    return Err(TemplateError::Validation("layout has no mix-hash slot".into()))
                }
            }
        }
        None => None,
    };

    let merkle_root = match &layout.merkle {
        Some(slots) => Some((slots.root_offset, blob_merkle_root(blob, slots)?)),
        None => None,
    };

    // Nothing below can fail.
    if let Some((offset, root)) = merkle_root {
        trace!("merkle root {} written at {}", hash_to_display_hex(&root), offset);
        blob[offset..offset + 32].copy_from_slice(&root);
    }
    if let Some(solution) = solution {
        let offset = layout.nonce_offset;
        blob[offset..offset + layout.nonce_len].copy_from_slice(solution.nonce);
    }
    if let Some((offset, mix_hash)) = mix_hash {
        blob[offset..offset + MIX_HASH_SIZE].copy_from_slice(mix_hash);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::double_sha256;
    use crate::merkle::merkle_node_hash;
    use crate::serialize::encode_varint;
    use crate::transaction::tests::sample_tx;

    const RAVEN: &BlobLayout = &BlobLayout::RAVEN;
    const DERO: &BlobLayout = &BlobLayout::DERO;

    fn raven_blob(txs: &[Vec<u8>]) -> Vec<u8> {
        let mut blob = vec![0x5Au8; 80];
        blob.extend_from_slice(&[0xAA; 8]);
        blob.extend_from_slice(&[0xBB; 32]);
        encode_varint(txs.len() as u64, &mut blob);
        for tx in txs {
            blob.extend_from_slice(tx);
        }
        blob
    }

    #[test]
    fn test_parse_blob_transactions() {
        let coinbase = sample_tx([0u8; 32], None);
        let spend = sample_tx([0x11; 32], Some(vec![vec![0x01]]));
        let blob = raven_blob(&[coinbase.clone(), spend.clone()]);

        let txs = parse_blob_transactions(&blob, RAVEN.merkle.as_ref().unwrap()).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].raw(), &coinbase[..]);
        assert_eq!(txs[1].raw(), &spend[..]);
    }

    #[test]
    fn test_refresh_writes_root_into_header() {
        let coinbase = sample_tx([0u8; 32], None);
        let spend = sample_tx([0x11; 32], None);
        let mut blob = raven_blob(&[coinbase.clone(), spend.clone()]);

        refresh_merkle_root(&mut blob, RAVEN).unwrap();

        let expected = merkle_node_hash(&double_sha256(&coinbase), &double_sha256(&spend));
        assert_eq!(&blob[36..68], &expected[..]);
        assert_eq!(&blob[..36], &[0x5A; 36]);
        assert_eq!(&blob[68..80], &[0x5A; 12]);
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let mut blob = raven_blob(&[sample_tx([0u8; 32], None), sample_tx([0x11; 32], None)]);

        refresh_merkle_root(&mut blob, RAVEN).unwrap();
        let first = blob.clone();
        refresh_merkle_root(&mut blob, RAVEN).unwrap();

        assert_eq!(blob, first);
    }

    #[test]
    fn test_empty_transaction_section_gives_zero_root() {
        let mut blob = raven_blob(&[]);
        refresh_merkle_root(&mut blob, RAVEN).unwrap();
        assert_eq!(&blob[36..68], &[0u8; 32]);
    }

    #[test]
    fn test_inject_nonce_and_mixhash() {
        let mut blob = raven_blob(&[sample_tx([0u8; 32], None)]);
        let nonce = 0x1122_3344_5566_7788u64.to_le_bytes();

        inject_nonce_and_mixhash(&mut blob, RAVEN, &nonce, &[0x99; 32]).unwrap();

        assert_eq!(&blob[80..88], &nonce);
        assert_eq!(&blob[88..120], &[0x99; 32]);
        assert_eq!(&blob[36..68], &double_sha256(&sample_tx([0u8; 32], None))[..]);
    }

    #[test]
    fn test_truncated_transaction_leaves_blob_untouched() {
        let mut blob = raven_blob(&[sample_tx([0u8; 32], None), sample_tx([0x11; 32], None)]);
        blob.truncate(blob.len() - 3);
        let before = blob.clone();

        let result = inject_nonce_and_mixhash(&mut blob, RAVEN, &[0x01; 8], &[0x02; 32]);

        assert!(matches!(result, Err(TemplateError::MalformedTransaction { .. })));
        assert_eq!(blob, before);
    }

    #[test]
    fn test_overstated_count_is_malformed() {
        let mut blob = raven_blob(&[sample_tx([0u8; 32], None)]);
        blob[120] = 0x02;
        let before = blob.clone();

        assert!(matches!(
            refresh_merkle_root(&mut blob, RAVEN),
            Err(TemplateError::MalformedTransaction { .. })
        ));
        assert_eq!(blob, before);
    }

    #[test]
    fn test_short_blob_is_rejected() {
        let mut blob = vec![0u8; 100];
        assert!(matches!(
            refresh_merkle_root(&mut blob, RAVEN),
            Err(TemplateError::Validation(_))
        ));
    }

    #[test]
    fn test_nonce_width_must_match_layout() {
        let mut blob = raven_blob(&[sample_tx([0u8; 32], None)]);
        assert!(matches!(
            inject_nonce_and_mixhash(&mut blob, RAVEN, &[0x01; 4], &[0x02; 32]),
            Err(TemplateError::Validation(_))
        ));
    }

    #[test]
    fn test_finalize_block_hash() {
        let mut blob = raven_blob(&[sample_tx([0u8; 32], None)]);
        let hash = finalize_block_hash(&mut blob, RAVEN).unwrap();

        let mut expected = double_sha256(&blob[..80]);
        expected.reverse();
        assert_eq!(hash, expected);
        assert_eq!(&blob[36..68], &double_sha256(&sample_tx([0u8; 32], None))[..]);
    }

    #[test]
    fn test_dero_fixed_offset_nonce() {
        let mut blob: Vec<u8> = (0..76u8).collect();
        let before = blob.clone();

        inject_nonce_fixed_offset(&mut blob, DERO, &[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();

        assert_eq!(&blob[39..43], &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(&blob[..39], &before[..39]);
        assert_eq!(&blob[43..], &before[43..]);
    }

    #[test]
    fn test_dero_rejects_mix_hash_and_hashing() {
        let mut blob = vec![0u8; 76];
        let solution = Solution {
            nonce: &[0x01; 4],
            mix_hash: Some(&[0x02; 32]),
        };

        assert!(inject_solution(&mut blob, CoinFamily::Dero, &solution).is_err());
        assert!(finalize_block_hash(&mut blob, DERO).is_err());
        assert!(inject_nonce_fixed_offset(&mut blob, RAVEN, &[0x01; 8]).is_err());
        assert_eq!(blob, vec![0u8; 76]);
    }

    #[test]
    fn test_inject_solution_dispatches_on_family() {
        let mut raven = raven_blob(&[sample_tx([0u8; 32], None)]);
        let solution = Solution {
            nonce: &[0x07; 8],
            mix_hash: Some(&[0x08; 32]),
        };
        inject_solution(&mut raven, CoinFamily::Raven, &solution).unwrap();
        assert_eq!(&raven[80..88], &[0x07; 8]);

        let mut dero = vec![0u8; 50];
        let solution = Solution {
            nonce: &[0x09; 4],
            mix_hash: None,
        };
        inject_solution(&mut dero, CoinFamily::Dero, &solution).unwrap();
        assert_eq!(&dero[39..43], &[0x09; 4]);
    }
}
