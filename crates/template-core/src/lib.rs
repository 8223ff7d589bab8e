//! Block template assembly for mining pools.
//!
//! This crate provides pure Rust implementations of:
//! - Coinbase transaction building with an embedded extra-nonce placeholder
//! - Raven-family header packing and work blob assembly
//! - Merkle roots with witness-commitment handling
//! - The epoch-keyed seed hash chain
//! - Pool difficulty from a network target
//! - In-place blob mutation (Merkle refresh, nonce / mix-hash injection)

pub mod address;
pub mod canonical;
pub mod coinbase;
pub mod difficulty;
pub mod error;
pub mod family;
pub mod hash;
pub mod header;
pub mod merkle;
pub mod mutator;
pub mod rpc;
pub mod seed;
pub mod serialize;
pub mod template;
pub mod transaction;

pub use address::PoolAddress;
pub use canonical::{submit_blob, BlobCanonicalizer, Identity};
pub use coinbase::{CoinbaseBuilder, CoinbaseTransaction};
pub use difficulty::pool_difficulty;
pub use error::{Result, TemplateError};
pub use family::{BlobLayout, CoinFamily};
pub use hash::double_sha256;
pub use merkle::{compute_merkle_root, transactions_merkle_root};
pub use mutator::{
    finalize_block_hash, inject_nonce_and_mixhash, inject_nonce_fixed_offset, inject_solution,
    refresh_merkle_root, Solution,
};
pub use rpc::RpcBlockData;
pub use seed::{SeedHashChain, SharedSeedHashChain};
pub use template::{BlockTemplate, TemplateBuilder};
pub use transaction::Transaction;
