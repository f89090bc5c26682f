//! The encode/decode engine.
//!
//! [`Okvs`] owns one store configuration: the value algebra, the hash
//! seeds, the declared capacity and the storage geometry. Encoding runs
//! the full pipeline (position hashing, hypergraph construction, peeling,
//! back-substitution) and either returns a complete storage array or
//! fails without exposing a partial one. Decoding recomputes a key's
//! positions and folds the stored values at them; it never inspects
//! whether the key was part of the encoded map.
//!
//! The engine is stateless across calls: one `encode` per map, then any
//! number of independent `decode` calls against the resulting array, from
//! any number of threads.
use rand::SeedableRng;
use tracing::debug;

use crate::{
    algebra::ValueAlgebra,
    block::Block,
    crypto::AesRng,
    error::Error,
    graph::{self, Hypergraph},
    hashing::{PositionHasher, Seeds},
    params,
    peel::{Peeler, ResidualStrategy},
    solve,
};

/// What happens to storage slots no key constraint ever assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    /// Leave them at the algebra's identity element.
    Identity,
    /// Fill them with pseudorandom values from an AES-CTR stream seeded by
    /// the given block, so the published array carries no visible holes.
    /// Deterministic per seed.
    Random {
        /// PRG seed for the fill stream.
        seed: Block,
    },
}

/// An oblivious key-value store: encodes a key→value map into a flat value
/// array decodable per key from a small, key-determined set of slots.
///
/// Values live in the injected [`ValueAlgebra`]; the solver only ever uses
/// the algebra's identity/combine/invert capability.
#[derive(Debug, Clone)]
pub struct Okvs<A: ValueAlgebra> {
    algebra: A,
    seeds: Seeds,
    capacity: usize,
    sparse: usize,
    band: usize,
    strategy: ResidualStrategy,
    fill: FillMode,
}

impl<A: ValueAlgebra> Okvs<A> {
    /// An engine for up to `capacity` keys with default storage sizing
    /// from [`params`].
    ///
    /// The number of hash functions is taken from `seeds` and must be 2 or
    /// 3. The dense-band strategy additionally requires a self-inverse
    /// algebra.
    pub fn new(
        algebra: A,
        seeds: Seeds,
        capacity: usize,
        strategy: ResidualStrategy,
    ) -> Result<Self, Error> {
        let sparse = params::sparse_size(capacity, seeds.hash_count());
        let band = params::band_width(capacity, strategy);
        Self::with_storage(algebra, seeds, capacity, strategy, sparse, band)
    }

    /// An engine with explicit storage sizing: `sparse` slots for the
    /// hashed positions plus a `band` wide dense range (0 unless the
    /// dense-band strategy is configured).
    pub fn with_storage(
        algebra: A,
        seeds: Seeds,
        capacity: usize,
        strategy: ResidualStrategy,
        sparse: usize,
        band: usize,
    ) -> Result<Self, Error> {
        let hash_count = seeds.hash_count();
        if !(2..=3).contains(&hash_count) {
            return Err(Error::Configuration(format!(
                "expected 2 or 3 hash functions, got {hash_count}"
            )));
        }
        if sparse < hash_count {
            return Err(Error::Configuration(format!(
                "{sparse} slots cannot hold {hash_count} distinct positions"
            )));
        }
        match strategy {
            ResidualStrategy::DenseBand => {
                if band == 0 {
                    return Err(Error::Configuration(
                        "the dense-band strategy needs a non-empty band".into(),
                    ));
                }
                if !algebra.self_inverse() {
                    return Err(Error::Configuration(
                        "the dense-band strategy requires a self-inverse value domain".into(),
                    ));
                }
            }
            _ => {
                if band != 0 {
                    return Err(Error::Configuration(
                        "a dense band requires the dense-band strategy".into(),
                    ));
                }
            }
        }
        Ok(Self {
            algebra,
            seeds,
            capacity,
            sparse,
            band,
            strategy,
            fill: FillMode::Identity,
        })
    }

    /// Set the fill mode for never-assigned slots.
    pub fn with_fill(mut self, fill: FillMode) -> Self {
        self.fill = fill;
        self
    }

    /// Enforce a minimum value bit-width, e.g. a statistical-security
    /// floor required by the calling protocol.
    pub fn require_value_bits(self, floor: u32) -> Result<Self, Error> {
        let bits = self.algebra.value_bits();
        if bits < floor {
            return Err(Error::Configuration(format!(
                "value domain of {bits} bits is below the required floor of {floor}"
            )));
        }
        Ok(self)
    }

    /// Total storage length produced by [`encode`](Self::encode) and
    /// expected by [`decode`](Self::decode).
    pub fn storage_len(&self) -> usize {
        self.sparse + self.band
    }

    /// Declared capacity n.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Encode a key→value map into a storage array of
    /// [`storage_len`](Self::storage_len) values.
    ///
    /// Keys must be pairwise distinct and at most [`capacity`](Self::capacity)
    /// many. On any error no storage is returned; construction failures are
    /// recoverable by retrying with fresh seeds or more storage.
    pub fn encode<K: AsRef<[u8]> + Sync>(
        &self,
        pairs: &[(K, A::Value)],
    ) -> Result<Vec<A::Value>, Error> {
        let keys: Vec<&[u8]> = pairs.iter().map(|(k, _)| k.as_ref()).collect();
        graph::validate_keys(&keys, self.capacity)?;

        let hasher = PositionHasher::new(&self.seeds, self.sparse, self.band);
        let positions = hasher.positions_for_all(&keys)?;
        let graph = Hypergraph::build(positions, self.storage_len());

        let elim = Peeler::new(&graph).run(self.strategy)?;
        debug!(
            keys = pairs.len(),
            peeled = elim.order.len() - elim.verify.len(),
            walked = elim.verify.len(),
            gaussian = elim.gaussian.len(),
            "computed elimination order"
        );

        let targets: Vec<A::Value> = pairs.iter().map(|(_, v)| v.clone()).collect();
        // Filling happens before solving, so every slot no constraint pins
        // down ends up random, including never-pivoted slots inside the
        // graph. The solve phases read current slot contents either way.
        let mut storage = match self.fill {
            FillMode::Identity => vec![self.algebra.identity(); self.storage_len()],
            FillMode::Random { seed } => {
                let mut rng = AesRng::from_seed(seed);
                (0..self.storage_len())
                    .map(|_| self.algebra.random(&mut rng))
                    .collect()
            }
        };
        solve::gaussian_solve(&self.algebra, &mut storage, &graph, &elim.gaussian, &targets)?;
        solve::back_substitute(&self.algebra, &mut storage, &graph, &elim.order, &targets);

        let broken = elim
            .verify
            .iter()
            .filter(|&&e| {
                solve::combine_positions(&self.algebra, &storage, &graph, e)
                    != targets[e as usize]
            })
            .count();
        if broken > 0 {
            debug!(broken, "cycle closing constraints inconsistent");
            return Err(Error::ConstructionFailure { residual: broken });
        }

        Ok(storage)
    }

    /// Decode one key against a storage array.
    ///
    /// For keys of the encoded map this returns their value exactly; for
    /// any other key it returns the fold of the slots the key hashes to,
    /// which is statistically close to a uniform domain element. The only
    /// failure mode is a storage array of the wrong length.
    pub fn decode(&self, storage: &[A::Value], key: &[u8]) -> Result<A::Value, Error> {
        if storage.len() != self.storage_len() {
            return Err(Error::Configuration(format!(
                "storage of length {} does not match the configured {}",
                storage.len(),
                self.storage_len()
            )));
        }
        let hasher = PositionHasher::new(&self.seeds, self.sparse, self.band);
        let positions = hasher.positions(key)?;
        let mut acc = self.algebra.identity();
        for p in positions.iter() {
            acc = self.algebra.combine(&acc, &storage[p as usize]);
        }
        Ok(acc)
    }
}
