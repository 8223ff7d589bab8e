//! Raven-family block header packing.

use crate::family::RAVEN_HEADER_SIZE;
use crate::hash::{double_sha256, reverse_bytes};

/// Filler written into the Merkle root slot until the blob is mutated.
pub const MERKLE_ROOT_PLACEHOLDER: u8 = 0xDD;

/// Header fields as delivered by the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RavenHeader {
    /// Block height.
    pub height: u32,
    /// Compact target, in the byte order of the daemon's hex string.
    pub bits: [u8; 4],
    /// Block timestamp (Unix time).
    pub curtime: u32,
    /// Previous block hash, in the byte order of the daemon's hex string.
    pub prev_block_hash: [u8; 32],
    /// Block version.
    pub version: u32,
}

impl RavenHeader {
    /// Pack the header into 80 bytes.
    ///
    /// Fields are first laid out as
    /// `height(BE) ‖ bits ‖ curtime(BE) ‖ merkle ‖ prev hash ‖ version(BE)`
    /// and the whole buffer is then reversed end to end, which yields the
    /// little-endian wire header with the Merkle slot at bytes 36..68.
    pub fn pack(&self) -> [u8; RAVEN_HEADER_SIZE] {
        let mut header = [0u8; RAVEN_HEADER_SIZE];

        header[0..4].copy_from_slice(&self.height.to_be_bytes());
        header[4..8].copy_from_slice(&self.bits);
        header[8..12].copy_from_slice(&self.curtime.to_be_bytes());
        header[12..44].fill(MERKLE_ROOT_PLACEHOLDER);
        header[44..76].copy_from_slice(&self.prev_block_hash);
        header[76..80].copy_from_slice(&self.version.to_be_bytes());

        header.reverse();
        header
    }
}

/// Block hash of a packed header, in display (reversed) byte order.
pub fn header_hash(header: &[u8]) -> [u8; 32] {
    reverse_bytes(&double_sha256(header))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> RavenHeader {
        let mut prev_block_hash = [0u8; 32];
        for (i, byte) in prev_block_hash.iter_mut().enumerate() {
            *byte = i as u8;
        }
        RavenHeader {
            height: 0x0102_0304,
            bits: [0x1b, 0x00, 0xff, 0xff],
            curtime: 1_700_000_000,
            prev_block_hash,
            version: 0x2000_0000,
        }
    }

    #[test]
    fn test_pack_is_little_endian_wire_order() {
        let header = sample_header();
        let packed = header.pack();

        // version (LE)
        assert_eq!(&packed[0..4], &0x2000_0000u32.to_le_bytes());

        // prev hash, byte-reversed as a whole
        let mut prev = header.prev_block_hash;
        prev.reverse();
        assert_eq!(&packed[4..36], &prev[..]);

        // merkle placeholder
        assert_eq!(&packed[36..68], &[MERKLE_ROOT_PLACEHOLDER; 32]);

        // time (LE), bits reversed, height (LE)
        assert_eq!(&packed[68..72], &1_700_000_000u32.to_le_bytes());
        assert_eq!(&packed[72..76], &[0xff, 0xff, 0x00, 0x1b]);
        assert_eq!(&packed[76..80], &0x0102_0304u32.to_le_bytes());
    }

    #[test]
    fn test_header_hash_is_reversed_sha256d() {
        let packed = sample_header().pack();
        let mut expected = double_sha256(&packed);
        expected.reverse();
        assert_eq!(header_hash(&packed), expected);
    }
}
