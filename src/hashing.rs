//! Deterministic key-to-position assignment.
//!
//! Every key is mapped to `k` distinct positions in the sparse range
//! `[0, m)` by `k` independently keyed PRFs (blake3 in keyed XOF mode), plus
//! optionally one coordinate in a dense auxiliary band appended after the
//! sparse range. The assignment is a pure function of the key and the
//! seeds, which is what makes decoding of never-encoded keys land on
//! effectively uniform position tuples.
use blake3::Hasher;
use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Retry cap for drawing distinct positions for a single key.
pub(crate) const RESAMPLE_CAP: usize = 100;

/// Maximum number of positions per key (3 sparse + 1 dense).
pub(crate) const MAX_POSITIONS: usize = 4;

/// Keyed-PRF seeds of a store: one 32-byte seed per sparse hash function
/// and one for the dense band coordinate.
///
/// Stores built from identical seeds assign identical positions, so two
/// parties sharing seeds can encode and decode against each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seeds {
    sparse: Vec<[u8; 32]>,
    dense: [u8; 32],
}

impl Seeds {
    /// Seeds from explicit per-hash keys. `sparse` must hold one seed per
    /// hash function; `dense` is only used by the dense-band strategy.
    pub fn new(sparse: Vec<[u8; 32]>, dense: [u8; 32]) -> Self {
        Self { sparse, dense }
    }

    /// Derive `hash_count` sparse seeds and the dense seed from one master
    /// seed via the blake3 XOF.
    pub fn expand(master: &[u8; 32], hash_count: usize) -> Self {
        let mut hasher = Hasher::new_keyed(master);
        hasher.update(b"okvs position seeds");
        let mut reader = hasher.finalize_xof();
        let mut sparse = vec![[0; 32]; hash_count];
        for seed in &mut sparse {
            reader.fill(seed);
        }
        let mut dense = [0; 32];
        reader.fill(&mut dense);
        Self { sparse, dense }
    }

    /// Sample fresh random seeds for `hash_count` hash functions.
    pub fn random<R: Rng + CryptoRng>(rng: &mut R, hash_count: usize) -> Self {
        let mut master = [0; 32];
        rng.fill_bytes(&mut master);
        Self::expand(&master, hash_count)
    }

    /// Number of sparse hash functions these seeds drive.
    pub fn hash_count(&self) -> usize {
        self.sparse.len()
    }
}

/// An ordered set of distinct storage positions assigned to one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PositionSet {
    idx: [u32; MAX_POSITIONS],
    len: u8,
}

impl PositionSet {
    pub(crate) fn new() -> Self {
        Self {
            idx: [0; MAX_POSITIONS],
            len: 0,
        }
    }

    /// Build a set from explicit positions. Test helper for exercising the
    /// solver layers with hand-picked constraint layouts.
    #[cfg(test)]
    pub(crate) fn from_slice(positions: &[u32]) -> Self {
        let mut set = Self::new();
        for &p in positions {
            set.push(p);
        }
        set
    }

    pub(crate) fn push(&mut self, position: u32) {
        debug_assert!((self.len as usize) < MAX_POSITIONS);
        self.idx[self.len as usize] = position;
        self.len += 1;
    }

    pub(crate) fn contains(&self, position: u32) -> bool {
        self.as_slice().contains(&position)
    }

    pub(crate) fn as_slice(&self) -> &[u32] {
        &self.idx[..self.len as usize]
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.as_slice().iter().copied()
    }
}

/// Maps keys to position sets for one store configuration.
pub(crate) struct PositionHasher<'a> {
    seeds: &'a Seeds,
    /// Size of the sparse range.
    sparse: u64,
    /// Width of the dense band appended after the sparse range, 0 if the
    /// configuration has no dense coordinate.
    band: u64,
}

impl<'a> PositionHasher<'a> {
    pub(crate) fn new(seeds: &'a Seeds, sparse: usize, band: usize) -> Self {
        Self {
            seeds,
            sparse: sparse as u64,
            band: band as u64,
        }
    }

    /// Positions of `key`: `hash_count` distinct sparse positions, then the
    /// dense coordinate if the store has a band.
    ///
    /// Collisions among the sparse draws are rejected and resampled from
    /// the PRF output stream, bounded by [`RESAMPLE_CAP`].
    pub(crate) fn positions(&self, key: &[u8]) -> Result<PositionSet, Error> {
        let mut set = PositionSet::new();
        for seed in &self.seeds.sparse {
            let mut hasher = Hasher::new_keyed(seed);
            hasher.update(key);
            let mut reader = hasher.finalize_xof();
            let mut attempts = 0;
            loop {
                let mut draw = [0; 8];
                reader.fill(&mut draw);
                let candidate = (u64::from_le_bytes(draw) % self.sparse) as u32;
                if !set.contains(candidate) {
                    set.push(candidate);
                    break;
                }
                attempts += 1;
                if attempts >= RESAMPLE_CAP {
                    return Err(Error::ResampleExhausted(RESAMPLE_CAP));
                }
            }
        }
        if self.band > 0 {
            let mut hasher = Hasher::new_keyed(&self.seeds.dense);
            hasher.update(key);
            let mut reader = hasher.finalize_xof();
            let mut draw = [0; 8];
            reader.fill(&mut draw);
            set.push((self.sparse + u64::from_le_bytes(draw) % self.band) as u32);
        }
        Ok(set)
    }

    /// Positions for a batch of keys. Hash evaluation carries no shared
    /// mutable state, so with the `rayon` feature the batch is sharded
    /// across the thread pool.
    #[cfg(feature = "rayon")]
    pub(crate) fn positions_for_all<K: AsRef<[u8]> + Sync>(
        &self,
        keys: &[K],
    ) -> Result<Vec<PositionSet>, Error> {
        use rayon::prelude::*;
        keys.par_iter()
            .map(|key| self.positions(key.as_ref()))
            .collect()
    }

    /// Positions for a batch of keys.
    #[cfg(not(feature = "rayon"))]
    pub(crate) fn positions_for_all<K: AsRef<[u8]> + Sync>(
        &self,
        keys: &[K],
    ) -> Result<Vec<PositionSet>, Error> {
        keys.iter().map(|key| self.positions(key.as_ref())).collect()
    }
}
