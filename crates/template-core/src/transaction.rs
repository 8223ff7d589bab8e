//! Raw transaction parsing.
//!
//! Transactions inside a blob are opaque bytes to the pool; the only things
//! needed from them are their length (to find the next one), whether the
//! first input carries a witness stack, and their legacy / witness hashes.
//! Those are captured once at parse time.

use core::ops::Range;

use crate::error::{Result, TemplateError};
use crate::hash::double_sha256;
use crate::serialize::ByteReader;

/// A transaction parsed from raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    raw: Vec<u8>,
    /// Span from the input count through the last output.
    body: Range<usize>,
    has_witness: bool,
    witness_reserved_value: Option<Vec<u8>>,
    is_coinbase: bool,
}

impl Transaction {
    /// Parse a single transaction from the start of `bytes`.
    ///
    /// Trailing bytes after the transaction are left alone; use
    /// [`Transaction::byte_len`] to step to the next one. `base` is the
    /// absolute offset of `bytes` in the enclosing blob and is only used in
    /// error reports.
    pub fn parse(bytes: &[u8], base: usize) -> Result<Self> {
        let mut reader = ByteReader::new(bytes, base);

        reader.skip(4, "version")?;

        // Segwit marker (0x00) and flag (0x01)
        let segwit = reader.peek() == Some(0x00) && bytes.get(5) == Some(&0x01);
        if segwit {
            reader.skip(2, "witness marker")?;
        }
        let body_start = reader.position();

        let input_count = reader.read_len("input count")?;
        let mut is_coinbase = input_count == 1;
        for _ in 0..input_count {
            let prev_hash = reader.read_bytes(32, "input prevout hash")?;
            if input_count == 1 && prev_hash.iter().any(|b| *b != 0) {
                is_coinbase = false;
            }
            reader.skip(4, "input prevout index")?;
            reader.read_var_bytes("input script")?;
            reader.skip(4, "input sequence")?;
        }

        let output_count = reader.read_len("output count")?;
        for _ in 0..output_count {
            reader.skip(8, "output value")?;
            reader.read_var_bytes("output script")?;
        }
        let body_end = reader.position();

        let mut has_witness = false;
        let mut witness_reserved_value = None;
        if segwit {
            let mut any_witness = false;
            for input in 0..input_count {
                let items = reader.read_len("witness item count")?;
                any_witness |= items > 0;
                for item in 0..items {
                    let data = reader.read_var_bytes("witness item")?;
                    if input == 0 && item == 0 {
                        has_witness = true;
                        witness_reserved_value = Some(data.to_vec());
                    }
                }
            }
            if !any_witness {
                return Err(TemplateError::malformed(
                    base + body_end,
                    "witness marker set but no witness data",
                ));
            }
        }

        reader.skip(4, "lock time")?;

        Ok(Transaction {
            raw: bytes[..reader.position()].to_vec(),
            body: body_start..body_end,
            has_witness,
            witness_reserved_value,
            is_coinbase,
        })
    }

    /// Parse a complete hex-encoded transaction, rejecting trailing bytes.
    pub fn from_hex(data: &str) -> Result<Self> {
        let bytes = hex::decode(data)
            .map_err(|e| TemplateError::Validation(format!("transaction hex: {}", e)))?;
        let tx = Transaction::parse(&bytes, 0)?;
        if tx.byte_len() != bytes.len() {
            return Err(TemplateError::malformed(tx.byte_len(), "trailing bytes after transaction"));
        }
        Ok(tx)
    }

    /// The full serialization as it appeared in the input.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn byte_len(&self) -> usize {
        self.raw.len()
    }

    /// True iff the first input carries a non-empty witness stack.
    pub fn has_witness(&self) -> bool {
        self.has_witness
    }

    /// First item of the first input's witness stack.
    pub fn witness_reserved_value(&self) -> Option<&[u8]> {
        self.witness_reserved_value.as_deref()
    }

    /// Single input spending the null outpoint.
    pub fn is_coinbase(&self) -> bool {
        self.is_coinbase
    }

    /// Serialization without segwit marker, flag and witnesses.
    pub fn legacy_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.body.len() + 4);
        out.extend_from_slice(&self.raw[..4]);
        out.extend_from_slice(&self.raw[self.body.clone()]);
        out.extend_from_slice(&self.raw[self.raw.len() - 4..]);
        out
    }

    /// Transaction hash in internal byte order.
    ///
    /// With `witness` set this is the wtxid, which is all zeros for a
    /// coinbase transaction.
    pub fn hash(&self, witness: bool) -> [u8; 32] {
        if witness {
            if self.is_coinbase {
                return [0u8; 32];
            }
            double_sha256(&self.raw)
        } else {
            double_sha256(&self.legacy_bytes())
        }
    }
}
