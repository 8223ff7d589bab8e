//! Boundary to the per-coin native blob conversion.
//!
//! Some families need their blob rewritten into the coin's own wire format
//! before it can be hashed or submitted. That conversion lives outside this
//! crate; it sees the blob by shared reference and returns a fresh buffer.

use crate::error::Result;
use crate::family::CoinFamily;
use crate::mutator::{inject_solution, Solution};

/// Converts a mutated blob into a coin's canonical form.
pub trait BlobCanonicalizer {
    fn canonicalize(&self, blob: &[u8], family: CoinFamily) -> Result<Vec<u8>>;
}

impl<F> BlobCanonicalizer for F
where
    F: Fn(&[u8], CoinFamily) -> Result<Vec<u8>>,
{
    fn canonicalize(&self, blob: &[u8], family: CoinFamily) -> Result<Vec<u8>> {
        self(blob, family)
    }
}

/// Returns the blob unchanged, for families with no native format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl BlobCanonicalizer for Identity {
    fn canonicalize(&self, blob: &[u8], _family: CoinFamily) -> Result<Vec<u8>> {
        Ok(blob.to_vec())
    }
}

/// Apply a solution to a copy of `template_blob` and canonicalize the result.
///
/// The template itself is left untouched so it can serve further shares.
pub fn submit_blob<C>(
    template_blob: &[u8],
    family: CoinFamily,
    solution: &Solution<'_>,
    canonicalizer: &C,
) -> Result<Vec<u8>>
where
    C: BlobCanonicalizer + ?Sized,
{
    let mut blob = template_blob.to_vec();
    inject_solution(&mut blob, family, solution)?;
    canonicalizer.canonicalize(&blob, family)
}
