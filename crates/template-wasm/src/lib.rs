//! WebAssembly bindings for pool block template assembly.
//!
//! This crate provides JavaScript-accessible APIs for:
//! - Building Raven-family block templates from daemon data
//! - Refreshing the Merkle root and hashing a submitted blob
//! - Writing miner nonces and mix-hashes into work blobs

use wasm_bindgen::prelude::*;

pub mod blob;
pub mod convert;
pub mod factory;

// Re-export main types for JS access
pub use blob::{construct_new_dero_blob, construct_new_raven_blob, convert_raven_blob};
pub use factory::TemplateFactory;

/// Initialize the WASM module with better panic messages.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
