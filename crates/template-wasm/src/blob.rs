//! Blob mutation entry points for share submission.
//!
//! Each export mutates the caller's buffer in place and also returns the
//! resulting bytes, mirroring the Node module this replaces.

use template_core::family::{DERO_NONCE_SIZE, MIX_HASH_SIZE, RAVEN_NONCE_SIZE};
use template_core::{
    finalize_block_hash, inject_nonce_and_mixhash, inject_nonce_fixed_offset, BlobLayout, Result,
};
use wasm_bindgen::prelude::*;

use crate::convert::{fixed, to_js_error};

/// Refresh the Merkle root and return the block hash (display order).
#[wasm_bindgen(js_name = convertRavenBlob)]
pub fn convert_raven_blob(blob: &mut [u8]) -> std::result::Result<Vec<u8>, JsValue> {
    raven_block_hash(blob).map_err(to_js_error)
}

/// Refresh the Merkle root and write the miner's nonce and mix-hash.
#[wasm_bindgen(js_name = constructNewRavenBlob)]
pub fn construct_new_raven_blob(
    blob: &mut [u8],
    nonce: &[u8],
    mixhash: &[u8],
) -> std::result::Result<Vec<u8>, JsValue> {
    raven_solution(blob, nonce, mixhash).map_err(to_js_error)
}

/// Write the miner's 4-byte nonce.
#[wasm_bindgen(js_name = constructNewDeroBlob)]
pub fn construct_new_dero_blob(blob: &mut [u8], nonce: &[u8]) -> std::result::Result<Vec<u8>, JsValue> {
    dero_solution(blob, nonce).map_err(to_js_error)
}

pub(crate) fn raven_block_hash(blob: &mut [u8]) -> Result<Vec<u8>> {
    Ok(finalize_block_hash(blob, &BlobLayout::RAVEN)?.to_vec())
}

pub(crate) fn raven_solution(blob: &mut [u8], nonce: &[u8], mixhash: &[u8]) -> Result<Vec<u8>> {
    let nonce: [u8; RAVEN_NONCE_SIZE] = fixed(nonce, "nonce")?;
    let mixhash: [u8; MIX_HASH_SIZE] = fixed(mixhash, "mixhash")?;
    inject_nonce_and_mixhash(blob, &BlobLayout::RAVEN, &nonce, &mixhash)?;
    Ok(blob.to_vec())
}

pub(crate) fn dero_solution(blob: &mut [u8], nonce: &[u8]) -> Result<Vec<u8>> {
    let nonce: [u8; DERO_NONCE_SIZE] = fixed(nonce, "nonce")?;
    inject_nonce_fixed_offset(blob, &BlobLayout::DERO, &nonce)?;
    Ok(blob.to_vec())
}
