//! An oblivious key-value store (OKVS) encode/decode engine.
//!
//! An OKVS encodes a key→value map into a flat array of `m` values such
//! that any key's value can be recovered by combining a small,
//! key-determined subset of slots, while keys outside the map decode to
//! values statistically indistinguishable from random. This is the data
//! structure at the core of hashing-based private set intersection,
//! private set membership and related protocols (garbled Bloom filters and
//! garbled cuckoo tables, see e.g. [PSI from PaXoS](https://eprint.iacr.org/2020/193)).
//!
//! ## Main components
//!
//! * [`Okvs`]: the engine, with a one-shot `encode` and a stateless
//!   `decode`.
//! * [`algebra`]: the value domains (128-bit blocks and byte strings under
//!   XOR, two prime fields, the Ristretto group), injected as a small
//!   identity/combine/invert capability.
//! * [`ResidualStrategy`]: how the 2-core left over by degree-1 peeling is
//!   resolved (fail-and-reseed, dense band + Gaussian fallback, or DFS
//!   cycle walking).
//!
//! ## Basic usage
//!
//! ```
//! use okvs::{Okvs, ResidualStrategy, Seeds, algebra::BlockAlgebra, block::Block};
//!
//! # fn main() -> Result<(), okvs::Error> {
//! let seeds = Seeds::expand(&[7; 32], 3);
//! let okvs = Okvs::new(BlockAlgebra, seeds, 100, ResidualStrategy::DenseBand)?;
//!
//! let pairs = vec![
//!     (b"alice".to_vec(), Block::from(1_u128)),
//!     (b"bob".to_vec(), Block::from(2_u128)),
//! ];
//! let storage = okvs.encode(&pairs)?;
//!
//! assert_eq!(Block::from(1_u128), okvs.decode(&storage, b"alice")?);
//! assert_eq!(Block::from(2_u128), okvs.decode(&storage, b"bob")?);
//! // Unknown keys decode to pseudorandom values, not errors.
//! let _ = okvs.decode(&storage, b"carol")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure model
//!
//! `encode` either returns a fully consistent array or a typed [`Error`];
//! construction failures are recoverable by re-encoding with fresh seeds
//! or more storage. `decode` is a pure read with no failure mode beyond a
//! storage-length mismatch.
//!
//! ## Concurrency
//!
//! The engine holds no mutable state: every `encode` builds its solver
//! state per call, and `decode` only reads. Arbitrarily many decodes (and
//! independent encodes) may run concurrently. With the `rayon` feature,
//! position hashing inside a single encode is sharded across a thread
//! pool; peeling and back-substitution stay single-threaded, as each step
//! depends on the previous one.
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod algebra;
pub mod block;
pub mod params;

mod crypto;
mod error;
mod graph;
mod hashing;
mod okvs;
mod peel;
mod solve;

pub use crate::{
    crypto::AesRng,
    error::Error,
    hashing::Seeds,
    okvs::{FillMode, Okvs},
    peel::ResidualStrategy,
};
