//! Epoch-keyed seed hash chain.
//!
//! The seed for epoch `n` is Keccak-256 applied `n` times to 32 zero bytes.
//! Consecutive templates almost always stay in the same epoch or step to the
//! next one, so the chain caches the last seed and only rehashes from
//! scratch after a jump.

use std::sync::{Mutex, PoisonError};

use log::debug;

use crate::hash::keccak256;

/// Number of blocks per proof-of-work epoch.
pub const EPOCH_LENGTH: u64 = 7500;

/// Epoch number for a block height.
pub fn epoch_for(height: u64) -> u64 {
    height / EPOCH_LENGTH
}

/// Cached seed hash state. `last_seed_hash` is only meaningful for `last_epoch`.
#[derive(Debug, Clone, Default)]
pub struct SeedHashChain {
    last_epoch: Option<u64>,
    last_seed_hash: [u8; 32],
}

impl SeedHashChain {
    /// Create an empty chain; the first lookup recomputes from zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Epoch of the cached seed, if any lookup has happened yet.
    pub fn last_epoch(&self) -> Option<u64> {
        self.last_epoch
    }

    /// Seed hash for the epoch containing `height`.
    ///
    /// A cold lookup or an epoch jump rehashes from scratch on the caller's
    /// thread, one Keccak round per epoch. Block heights are `u32`, so this
    /// is bounded by `u32::MAX / EPOCH_LENGTH` (about 572k) rounds.
    pub fn seed_for(&mut self, height: u64) -> [u8; 32] {
        let epoch = epoch_for(height);

        match self.last_epoch {
            Some(last) if last == epoch => {}
            Some(last) if last.checked_add(1) == Some(epoch) => {
                self.last_seed_hash = keccak256(&self.last_seed_hash);
                self.last_epoch = Some(epoch);
            }
            _ => {
                debug!(
                    "recomputing seed hash for epoch {} from scratch ({} rounds, cached epoch {:?})",
                    epoch, epoch, self.last_epoch
                );
                self.last_seed_hash = seed_from_scratch(epoch);
                self.last_epoch = Some(epoch);
            }
        }

        self.last_seed_hash
    }
}

/// Apply Keccak-256 `epoch` times to 32 zero bytes. Epoch 0 is the zero buffer.
pub fn seed_from_scratch(epoch: u64) -> [u8; 32] {
    let mut seed = [0u8; 32];
    for _ in 0..epoch {
        seed = keccak256(&seed);
    }
    seed
}

/// A [`SeedHashChain`] behind a mutex, for template builds issued from
/// several threads against one process-wide cache.
#[derive(Debug, Default)]
pub struct SharedSeedHashChain {
    inner: Mutex<SeedHashChain>,
}

impl SharedSeedHashChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed hash for `height`, serialized against other callers.
    pub fn seed_for(&self, height: u64) -> [u8; 32] {
        // The chain is always left consistent, so a poisoned lock is still usable.
        let mut chain = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        chain.seed_for(height)
    }

    /// Run `f` with exclusive access to the chain.
    pub fn with_chain<T>(&self, f: impl FnOnce(&mut SeedHashChain) -> T) -> T {
        let mut chain = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut chain)
    }
}
